//! Crisis phrase detection.
//!
//! A deliberately literal scan: the input is lower-cased and checked for any
//! configured phrase as a substring. There is no stemming, negation handling
//! or punctuation folding, so `"can’t go on"` (curly apostrophe) does not
//! match `"can't go on"`.

use serde::{Deserialize, Serialize};

/// Phrases that raise the crisis-resources banner.
pub const DEFAULT_CRISIS_PHRASES: &[&str] = &[
    "kill myself",
    "suicide",
    "end my life",
    "want to die",
    "self harm",
    "hurt myself",
    "cutting",
    "worthless",
    "can't go on",
    "don't want to live",
    "no reason to live",
];

/// Returns true if `text` contains any of the default crisis phrases.
pub fn detect(text: &str) -> bool {
    let normalized = text.to_lowercase();
    DEFAULT_CRISIS_PHRASES
        .iter()
        .any(|phrase| normalized.contains(phrase))
}

/// Detector over the default phrase list plus any configured extras.
#[derive(Debug, Clone)]
pub struct CrisisDetector {
    phrases: Vec<String>,
}

impl Default for CrisisDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CrisisDetector {
    pub fn new() -> Self {
        Self {
            phrases: DEFAULT_CRISIS_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Adds phrases on top of the defaults. Blank entries are ignored.
    pub fn with_extra_phrases<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in extra {
            let phrase = phrase.as_ref().trim().to_lowercase();
            if !phrase.is_empty() && !self.phrases.contains(&phrase) {
                self.phrases.push(phrase);
            }
        }
        self
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn detect(&self, text: &str) -> bool {
        let normalized = text.to_lowercase();
        self.phrases.iter().any(|phrase| normalized.contains(phrase.as_str()))
    }
}

/// What the banner offers once a crisis phrase is seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrisisResources {
    pub headline: String,
    pub message: String,
    pub hotline_label: String,
    pub hotline_number: String,
    /// `tel:` link for the hotline button
    pub hotline_tel: String,
    pub dismiss_label: String,
}

impl Default for CrisisResources {
    fn default() -> Self {
        Self::with_hotline("988")
    }
}

impl CrisisResources {
    pub fn with_hotline(number: &str) -> Self {
        Self {
            headline: "You're not alone in this 💙".to_string(),
            message: "If you're going through a really difficult time, talking to someone \
                      who can help might make things feel a bit lighter."
                .to_string(),
            hotline_label: format!("Crisis Line: {}", number),
            hotline_number: number.to_string(),
            hotline_tel: tel_uri(number),
            dismiss_label: "I'm okay for now".to_string(),
        }
    }
}

/// Dialable form of a hotline number: digits and a leading `+` only.
fn tel_uri(number: &str) -> String {
    let dialable: String = number
        .chars()
        .enumerate()
        .filter(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
        .map(|(_, c)| c)
        .collect();
    format!("tel:{}", dialable)
}
