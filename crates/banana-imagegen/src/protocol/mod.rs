//! Wire format types for the Google image generation APIs
//!
//! Pure serde structs matching each endpoint's JSON. They are only used at
//! the adapter boundary; everything past it works on `RawProviderResponse`.

pub mod gemini;
pub mod imagen;
