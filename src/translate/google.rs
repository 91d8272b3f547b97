//! Client for the unofficial Google Translate JSON endpoint.
//!
//! The endpoint answers with loosely typed nested arrays whose layout is not
//! documented, so every position is read defensively: anything missing or of
//! the wrong shape is treated as absent.

use crate::config::{Config, DEFAULT_TRANSLATE_HOST, DEFAULT_TRANSLATE_TIMEOUT_SECS};
use crate::error::{FrankError, Result};
use crate::translate::{TranslateOptions, TranslationResult, Translator};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use urlencoding::encode;

/// Response detail flags requested on every call, besides the autocorrect flag.
const DETAIL_FLAGS: [&str; 10] = ["bd", "ex", "ld", "md", "rw", "rm", "ss", "t", "at", "gt"];

const WEB_TRANSLATE_URL: &str = "https://translate.google.com/translate";

/// Translator backed by `translate_a/single`.
pub struct GoogleTranslator {
    client: Client,
    scheme: &'static str,
    host: String,
    timeout: Duration,
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTranslator {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            scheme: "https",
            host: DEFAULT_TRANSLATE_HOST.to_string(),
            timeout: Duration::from_secs(DEFAULT_TRANSLATE_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_host(config.translate_host.clone())
            .with_https(config.translate_https)
            .with_timeout(Duration::from_secs(config.translate_timeout_secs))
    }

    /// Point the client at another host, optionally including a port.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_https(mut self, https: bool) -> Self {
        self.scheme = if https { "https" } else { "http" };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the `translate_a/single` URL. Pure; performs no I/O.
    pub fn build_request_url(
        text: &str,
        options: &TranslateOptions,
        scheme: &str,
        host: &str,
    ) -> String {
        let autocorrect = if options.no_autocorrect { "qc" } else { "qca" };
        let details: String = DETAIL_FLAGS.iter().map(|flag| format!("&dt={flag}")).collect();

        format!(
            "{scheme}://{host}/translate_a/single?client=gtx&ie=UTF-8&oe=UTF-8{details}&dt={autocorrect}&sl={}&tl={}&hl={}&q={}",
            encode(&options.source_lang),
            encode(&options.target_lang),
            encode(options.ui_lang()),
            encode(text),
        )
    }

    fn request_url(&self, text: &str, options: &TranslateOptions) -> String {
        Self::build_request_url(text, options, self.scheme, &self.host)
    }

    /// Text-to-speech URL for `text` spoken in `target_lang`.
    pub fn tts_url(&self, text: &str, target_lang: &str) -> String {
        format!(
            "{}://{}/translate_tts?ie=UTF-8&client=gtx&tl={}&q={}",
            self.scheme,
            self.host,
            encode(target_lang),
            encode(text)
        )
    }

    /// Human-facing URL that opens `url_to_translate` in the web translator.
    pub fn web_translate_url(&self, url_to_translate: &str, options: &TranslateOptions) -> String {
        format!(
            "{WEB_TRANSLATE_URL}?hl={}&sl={}&tl={}&u={}",
            encode(options.ui_lang()),
            encode(&options.source_lang),
            encode(&options.target_lang),
            encode(url_to_translate)
        )
    }
}

/// Flatten a `translate_a/single` payload into a [`TranslationResult`].
///
/// Layout: element 0 holds `[translated, original, ...]` segments, element 2
/// the detected source language, element 5 groups of alternatives whose third
/// element lists entries starting with the alternative text.
pub fn parse_translation_payload(data: &Value, fallback_text: &str) -> TranslationResult {
    let segments = data.get(0).and_then(Value::as_array);

    let mut translation = String::new();
    let mut original = String::new();
    for segment in segments.into_iter().flatten() {
        if let Some(chunk) = segment.get(0).and_then(Value::as_str) {
            translation.push_str(chunk);
        }
        if let Some(chunk) = segment.get(1).and_then(Value::as_str) {
            original.push_str(chunk);
        }
    }
    if original.is_empty() {
        original = fallback_text.to_string();
    }

    let src_lang = data.get(2).and_then(Value::as_str).map(str::to_string);

    let mut alternatives = Vec::new();
    let mut seen = HashSet::new();
    let groups = data.get(5).and_then(Value::as_array);
    for group in groups.into_iter().flatten() {
        let Some(entries) = group.get(2).and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            if let Some(alt) = entry.get(0).and_then(Value::as_str) {
                if seen.insert(alt) {
                    alternatives.push(alt.to_string());
                }
            }
        }
    }

    TranslationResult {
        translation,
        original,
        src_lang,
        alternatives,
        raw: data.clone(),
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, options: &TranslateOptions) -> Result<TranslationResult> {
        let url = self.request_url(text, options);
        debug!(
            "Translating {} chars ({} -> {})",
            text.chars().count(),
            options.source_lang,
            options.target_lang
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .header("Accept", "*/*")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FrankError::Transport(format!(
                "Translation endpoint returned {status}"
            )));
        }

        let body = response.text().await?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| FrankError::Decode(format!("Translation payload is not JSON: {e}")))?;

        let result = parse_translation_payload(&data, text);
        debug!(
            "Detected source language: {}",
            result.src_lang.as_deref().unwrap_or("unknown")
        );
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}
