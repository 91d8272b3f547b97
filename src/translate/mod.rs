pub mod google;

pub use google::{parse_translation_payload, GoogleTranslator};

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Language and correction settings for a single translation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    pub source_lang: String,
    pub target_lang: String,
    /// Interface language; the target language is used when unset.
    pub ui_lang: Option<String>,
    pub no_autocorrect: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            source_lang: "auto".to_string(),
            target_lang: "en".to_string(),
            ui_lang: None,
            no_autocorrect: false,
        }
    }
}

impl TranslateOptions {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            ..Self::default()
        }
    }

    pub fn with_ui_lang(mut self, ui_lang: impl Into<String>) -> Self {
        self.ui_lang = Some(ui_lang.into());
        self
    }

    pub fn with_no_autocorrect(mut self, no_autocorrect: bool) -> Self {
        self.no_autocorrect = no_autocorrect;
        self
    }

    pub fn ui_lang(&self) -> &str {
        self.ui_lang.as_deref().unwrap_or(&self.target_lang)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationResult {
    pub translation: String,
    pub original: String,
    pub src_lang: Option<String>,
    pub alternatives: Vec<String>,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, options: &TranslateOptions) -> Result<TranslationResult>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TranslateOptions::default();
        assert_eq!(options.source_lang, "auto");
        assert_eq!(options.target_lang, "en");
        assert_eq!(options.ui_lang(), "en");
        assert!(!options.no_autocorrect);
    }

    #[test]
    fn test_ui_lang_override() {
        let options = TranslateOptions::new("es", "fr").with_ui_lang("de");
        assert_eq!(options.ui_lang(), "de");
        assert_eq!(options.target_lang, "fr");
    }
}
