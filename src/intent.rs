//! Keyword intent classification for short free-text messages.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Coarse category of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Greeting,
    Help,
    About,
    HowItWorks,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Help => "help",
            Intent::About => "about",
            Intent::HowItWorks => "howItWorks",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword groups in match order. Matching is plain substring search on the
/// lowercased text, so short keys such as `sa` and `hi` also hit inside words.
const INTENT_PATTERNS: &[(Intent, &str)] = &[
    (Intent::Greeting, r"merhaba|selam|hey|sa|hello|hi|hola"),
    (Intent::Help, r"yardım|yardim|help|destek|nasıl|assist"),
    (
        Intent::About,
        r"kimsin|nedir|nesin|adın|adin|ismin|hakkında|about|sen",
    ),
    (
        Intent::HowItWorks,
        r"nasıl çalış|nasil calis|how|sistem|çalışma|calisma|işleyiş|isleyis",
    ),
];

fn compiled_patterns() -> &'static [(Intent, Regex)] {
    static PATTERNS: OnceLock<Vec<(Intent, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        INTENT_PATTERNS
            .iter()
            .filter_map(|(intent, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((*intent, re)),
                Err(e) => {
                    tracing::error!("Invalid intent pattern for {}: {}", intent, e);
                    None
                }
            })
            .collect()
    })
}

/// Classify a message. First matching group wins; `Unknown` otherwise.
pub fn classify(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    compiled_patterns()
        .iter()
        .find(|(_, re)| re.is_match(&lowered))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify("merhaba"), Intent::Greeting);
        assert_eq!(classify("yardım lütfen"), Intent::Help);
        assert_eq!(classify("asdkjfh"), Intent::Unknown);
        assert_eq!(classify("kimsin"), Intent::About);
        assert_eq!(classify("isleyis"), Intent::HowItWorks);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("MERHABA"), Intent::Greeting);
        assert_eq!(classify("Yardim"), Intent::Help);
        assert_eq!(classify("ABOUT"), Intent::About);
    }

    #[test]
    fn test_group_order_wins() {
        // "nasıl çalış" is a how-it-works key, but "nasıl" alone already matches help.
        assert_eq!(classify("nasıl çalışıyor"), Intent::Help);
        // "sa" inside "isaret" hits the greeting group before anything else.
        assert_eq!(classify("isaret sistemi"), Intent::Greeting);
        // "help" and "about" both present: help is checked first.
        assert_eq!(classify("help about"), Intent::Help);
    }

    #[test]
    fn test_classify_is_deterministic() {
        for _ in 0..5 {
            assert_eq!(classify("destek"), Intent::Help);
        }
    }
}
