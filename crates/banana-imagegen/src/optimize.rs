//! Model-backed prompt rewriting
//!
//! A Gemini text model expands short prompts with visual detail, or
//! translates them literally when the prompt itself asks for a translation.
//! The optimizer never fails a request: any upstream failure or unusable
//! reply falls back to the original prompt.

use banana_config::PromptOptimizerConfig;
use reqwest::Client;
use secrecy::SecretString;
use serde::Serialize;

use crate::{
    protocol::gemini::{
        GeminiContent, GeminiGenerationConfig, GeminiPart, GeminiRequest, GeminiResponse,
    },
    provider::{DEFAULT_BASE_URL, model_url, post_json},
    retry::RetryPolicy,
    types::Modality,
};

const NAME: &str = "prompt_optimizer";

/// Phrases that turn the request into a literal translation
const TRANSLATION_MARKERS: &[&str] = &["请将以下中文", "翻译成英文", "仅直译", "不要扩展"];

/// Lines containing these are commentary around the prompt, not the prompt
const COMMENTARY_MARKERS: &[&str] = &[
    "prompt",
    "optimized",
    "original",
    "here is",
    "answer",
    "提示词",
    "优化",
    "原始",
    "以下是",
    "如下",
];

const SENTENCE_PUNCTUATION: &[char] = &['。', '，', '、', '；', '！', '？', '.', ',', ';', '!', '?'];

/// Outcome of one optimization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizedPrompt {
    pub original_prompt: String,
    pub optimized_prompt: String,
    /// False when the original prompt came back unchanged after a failure
    pub optimized: bool,
    pub is_translation: bool,
}

impl OptimizedPrompt {
    fn unchanged(prompt: &str, is_translation: bool) -> Self {
        Self {
            original_prompt: prompt.to_string(),
            optimized_prompt: prompt.to_string(),
            optimized: false,
            is_translation,
        }
    }
}

/// Rewrites prompts with a Gemini text model
pub struct PromptOptimizer {
    client: Client,
    url: String,
    api_key: SecretString,
    retry: RetryPolicy,
    max_words: usize,
    before_generation: bool,
}

impl PromptOptimizer {
    pub fn new(client: Client, config: &PromptOptimizerConfig, retry: RetryPolicy) -> Self {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);

        Self {
            client,
            url: model_url(base_url, &config.model, "generateContent"),
            api_key: config.api_key.clone(),
            retry,
            max_words: config.max_words,
            before_generation: config.before_generation,
        }
    }

    /// Whether generation prompts are rewritten before dispatch
    pub const fn runs_before_generation(&self) -> bool {
        self.before_generation
    }

    /// Rewrite `prompt`, falling back to it unchanged on any failure
    pub async fn optimize(&self, prompt: &str) -> OptimizedPrompt {
        let is_translation = is_translation_request(prompt);
        let body = build_request(prompt, is_translation, self.max_words);

        let (client, url, api_key, body) = (&self.client, self.url.as_str(), &self.api_key, &body);
        let outcome = self
            .retry
            .run(move |attempt| {
                tracing::debug!(attempt, is_translation, "calling prompt optimizer");
                post_json::<_, GeminiResponse>(client, NAME, url, api_key, body)
            })
            .await;

        let reply = match outcome {
            Ok(response) => response_text(response),
            Err(failure) => {
                tracing::warn!(
                    kind = %failure.kind,
                    detail = failure.detail.as_deref().unwrap_or_default(),
                    "prompt optimization failed, using the original prompt"
                );
                return OptimizedPrompt::unchanged(prompt, is_translation);
            }
        };

        let Some(optimized_prompt) = clean_reply(&reply, self.max_words) else {
            tracing::warn!(reply_len = reply.len(), "prompt optimizer reply unusable, using the original prompt");
            return OptimizedPrompt::unchanged(prompt, is_translation);
        };

        tracing::debug!(
            original_len = prompt.len(),
            optimized_len = optimized_prompt.len(),
            is_translation,
            "prompt optimized"
        );

        OptimizedPrompt {
            original_prompt: prompt.to_string(),
            optimized_prompt,
            optimized: true,
            is_translation,
        }
    }
}

/// Whether the prompt asks for a literal translation instead of a rewrite
pub(crate) fn is_translation_request(prompt: &str) -> bool {
    let lower = prompt.to_lowercase();
    TRANSLATION_MARKERS.iter().any(|marker| prompt.contains(marker))
        || lower.contains("translate")
        || lower.contains("translation")
}

fn build_request(prompt: &str, is_translation: bool, max_words: usize) -> GeminiRequest {
    // Translations go through verbatim with near-deterministic sampling
    let (text, temperature, top_p, top_k) = if is_translation {
        (prompt.to_string(), Some(0.0), Some(0.7), Some(20))
    } else {
        (rewrite_instruction(prompt, max_words), None, None, None)
    };

    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart::Text(text)],
        }],
        generation_config: GeminiGenerationConfig {
            response_modalities: vec![Modality::Text],
            candidate_count: 1,
            temperature,
            top_p,
            top_k,
            image_config: None,
        },
    }
}

fn rewrite_instruction(prompt: &str, max_words: usize) -> String {
    format!(
        "You are an expert at writing prompts for image generation models. Rewrite the user's prompt below so that \
         it is more detailed, specific and vivid, adding visual detail such as lighting, color, composition, style \
         and materials, so an image model can produce a higher-quality picture.\n\n\
         Rules:\n\
         1. Keep the original meaning; only refine and enrich it.\n\
         2. Output a complete prompt that can be used for image generation as is.\n\
         3. Output only the rewritten prompt, with no explanation.\n\
         4. Answer in the language of the original prompt.\n\
         5. Stay within {max_words} words (or {max_words} characters for Chinese).\n\n\
         Original prompt: {prompt}\n\n\
         Rewritten prompt:"
    )
}

/// Text of the first candidate, skipping thought summaries
fn response_text(response: GeminiResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| part.thought != Some(true))
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Strip commentary around the rewritten prompt and bound its length
///
/// `None` means the reply cannot stand in for the original prompt.
pub(crate) fn clean_reply(reply: &str, max_words: usize) -> Option<String> {
    let reply = reply.trim();

    let candidate = if reply.contains('\n') {
        let lines: Vec<&str> = reply.lines().map(str::trim).collect();
        lines
            .iter()
            .find(|line| line.chars().count() > 5 && !is_commentary(line))
            .or_else(|| lines.first().filter(|line| line.chars().count() > 10))
            .copied()
            .unwrap_or(reply)
    } else {
        reply
    };

    if candidate.chars().count() < 3 {
        return None;
    }

    // Unfilled template slots such as "[style]"
    if candidate.contains(']') && candidate.matches('[').count() > 2 {
        return None;
    }

    Some(limit_length(candidate, max_words))
}

fn is_commentary(line: &str) -> bool {
    let lower = line.to_lowercase();
    COMMENTARY_MARKERS.iter().any(|marker| lower.contains(marker))
}

const fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}')
}

/// Mostly-CJK text is bounded by characters, anything else by words
fn limit_length(text: &str, max_words: usize) -> String {
    let total = text.chars().count();
    let cjk = text.chars().filter(|&c| is_cjk(c)).count();

    if cjk * 10 > total * 3 {
        truncate_chars(text, max_words)
    } else {
        truncate_words(text, max_words)
    }
}

/// Keep `max` characters, ending on punctuation when one falls in the last 30%
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max).collect();
    let floor = max * 7 / 10;

    let cut = truncated
        .char_indices()
        .enumerate()
        .filter(|(n, (_, c))| *n > floor && SENTENCE_PUNCTUATION.contains(c))
        .map(|(_, (i, c))| i + c.len_utf8())
        .last();

    match cut {
        Some(end) => truncated[..end].to_string(),
        None => truncated,
    }
}

/// Keep the first `max` words and any punctuation that directly follows
fn truncate_words(text: &str, max: usize) -> String {
    let mut words = 0;
    let mut in_word = false;

    for (i, c) in text.char_indices() {
        let word_char = c.is_alphanumeric() || c == '_';
        if word_char && !in_word {
            words += 1;
            if words > max {
                return text[..i].trim_end().to_string();
            }
        }
        in_word = word_char;
    }

    text.to_string()
}
