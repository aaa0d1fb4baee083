//! Language detection and translation helpers.
//!
//! Detection runs locally through `whatlang` and only distinguishes the languages the knowledge
//! base is expected to contain; anything else counts as English. Translation goes through the
//! chat model and keeps the configured [`Glossary`] terms untouched.

mod glossary;

pub use glossary::Glossary;

use crate::openai::{ChatClient, ChatMessage, OpenAiError};
use serde::{Deserialize, Serialize};
use std::fmt;
use whatlang::Lang;

/// Languages recognized by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English, the language records are stored in.
    English,
    /// Dutch.
    Dutch,
    /// German.
    German,
    /// French.
    French,
    /// Spanish.
    Spanish,
}

impl Language {
    /// Human readable name, also used in prompts and record metadata.
    pub const fn name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Dutch => "Dutch",
            Self::German => "German",
            Self::French => "French",
            Self::Spanish => "Spanish",
        }
    }

    /// Whether this is English.
    pub const fn is_english(self) -> bool {
        matches!(self, Self::English)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detect the language of `text`, defaulting to English when unsure or unsupported.
pub fn detect_language(text: &str) -> Language {
    if text.trim().is_empty() {
        return Language::English;
    }
    match whatlang::detect(text).map(|info| info.lang()) {
        // Short Dutch passages are regularly reported as Afrikaans.
        Some(Lang::Nld | Lang::Afr) => Language::Dutch,
        Some(Lang::Deu) => Language::German,
        Some(Lang::Fra) => Language::French,
        Some(Lang::Spa) => Language::Spanish,
        Some(Lang::Eng) => Language::English,
        Some(other) => {
            tracing::trace!(detected = ?other, "Unsupported language; treating as English");
            Language::English
        }
        None => Language::English,
    }
}

/// Translate `text` into `target`, leaving blank or already matching text untouched.
pub async fn translate_text(
    chat: &dyn ChatClient,
    text: &str,
    target: Language,
    glossary: &Glossary,
) -> Result<String, OpenAiError> {
    if text.trim().is_empty() {
        return Ok(text.to_string());
    }

    let detected = detect_language(text);
    if detected == target {
        return Ok(text.to_string());
    }

    tracing::debug!(from = %detected, to = %target, chars = text.len(), "Translating text");
    let messages = vec![
        ChatMessage::system(translation_prompt(target, glossary)),
        ChatMessage::user(text),
    ];
    let translated = chat.chat(messages).await?;
    Ok(translated.trim().to_string())
}

fn translation_prompt(target: Language, glossary: &Glossary) -> String {
    let mut prompt = format!(
        "You are a translator. Translate the text to {target}, keeping its meaning and intent. \
         Reply with the translation only."
    );
    if !glossary.is_empty() {
        prompt.push_str(" Never translate these company terms; keep them exactly as written: ");
        prompt.push_str(&glossary.terms().join(", "));
        prompt.push('.');
    }
    prompt
}
