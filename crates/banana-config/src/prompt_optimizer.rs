use secrecy::SecretString;
use serde::Deserialize;

/// Text model that rewrites prompts before image generation
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptOptimizerConfig {
    /// Gemini text model (e.g. "gemini-2.0-flash")
    #[serde(default = "default_model")]
    pub model: String,
    /// API key
    pub api_key: SecretString,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Upper bound on the rewritten prompt, in words (or characters for CJK text)
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    /// Rewrite every generation prompt unless the caller asks for it verbatim
    #[serde(default)]
    pub before_generation: bool,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

const fn default_max_words() -> usize {
    150
}
