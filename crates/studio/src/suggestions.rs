//! Remediation hints for failed generations.
//!
//! Keyword rules are checked in order against the lowercased failure text
//! and the first match wins, so the order of `RULES` is part of the
//! behaviour. Keywords cover both the Portuguese wording users paste from
//! the web app and the English messages the Gemini client produces.

use shared::mockup::GenerationSlot;

/// One keyword rule
#[derive(Debug)]
pub struct SuggestionRule {
    pub category: &'static str,
    pub keywords: &'static [&'static str],
    pub suggestion: &'static str,
}

pub const FALLBACK_SUGGESTION: &str =
    "Try changing the category or adding more detail to the description.";

pub static RULES: &[SuggestionRule] = &[
    // Safety and policy
    SuggestionRule {
        category: "Content Blocked",
        keywords: &["bloqueada", "blocked", "safety", "violat", "policy"],
        suggestion: "Content blocked. Avoid real faces, adult content or protected brands.",
    },
    // Model refused or answered with text instead of an image
    SuggestionRule {
        category: "Model Refusal",
        keywords: &[
            "texto",
            "returned text",
            "conversar",
            "language model",
            "cannot create",
            "cannot use",
            "capabilities",
            "dosen't seem",
            "doesn't seem",
        ],
        suggestion: "The model hesitated to use this image. Try again or pick a different category (e.g. Camiseta, Caneca).",
    },
    SuggestionRule {
        category: "Too Generic",
        keywords: &["genéric", "generic", "específ", "specific"],
        suggestion: "The instruction is too broad. Add details such as background colour, material or lighting.",
    },
    SuggestionRule {
        category: "Ambiguous Description",
        keywords: &["ambígu", "ambigu", "unclear"],
        suggestion: "The description is confusing. Try separating the main object from the setting.",
    },
    // Limits and network
    SuggestionRule {
        category: "Rate Limited",
        keywords: &["quota", "limit", "429", "resource exhausted", "resource_exhausted"],
        suggestion: "Too many simultaneous requests. Wait 30 seconds and try again.",
    },
    SuggestionRule {
        category: "Connection Error",
        keywords: &["network", "fetch", "connect", "timed out", "dns"],
        suggestion: "Connection error. Check your internet connection.",
    },
    SuggestionRule {
        category: "No Image",
        keywords: &["nenhuma imagem", "no image", "carregar", "render"],
        suggestion: "Generation or display failed. Try switching the category to 'Desktop' or 'Papelaria'.",
    },
];

/// First rule matching the message, if any
pub fn matching_rule(error_text: &str) -> Option<&'static SuggestionRule> {
    let error_lower = error_text.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| error_lower.contains(k)))
}

/// Suggestion for a raw failure message. Never empty.
pub fn suggest_fix(error_text: &str) -> &'static str {
    matching_rule(error_text)
        .map(|rule| rule.suggestion)
        .unwrap_or(FALLBACK_SUGGESTION)
}

/// Suggestion for a failed slot; `None` while it has no error
pub fn suggestion_for(slot: &GenerationSlot) -> Option<&'static str> {
    slot.error().map(suggest_fix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::generation::GenerationError;

    fn category(msg: &str) -> Option<&'static str> {
        matching_rule(msg).map(|r| r.category)
    }

    #[test]
    fn test_blocked_generation() {
        let msg = GenerationError::Blocked {
            reason: "SAFETY".into(),
        }
        .to_string();
        assert_eq!(category(&msg), Some("Content Blocked"));
        assert_eq!(
            category("Geração bloqueada pelo modelo. Motivo: OTHER"),
            Some("Content Blocked")
        );
    }

    #[test]
    fn test_text_instead_of_image() {
        let msg = GenerationError::TextOnly {
            message: "I can only help with that if...".into(),
        }
        .to_string();
        assert_eq!(category(&msg), Some("Model Refusal"));
        assert_eq!(
            category("I'm a language model and can't edit images"),
            Some("Model Refusal")
        );
    }

    #[test]
    fn test_description_quality_rules() {
        assert_eq!(category("The prompt is too generic"), Some("Too Generic"));
        assert_eq!(category("descrição ambígua"), Some("Ambiguous Description"));
        assert_eq!(category("request is unclear"), Some("Ambiguous Description"));
    }

    #[test]
    fn test_quota_and_network() {
        let http = GenerationError::Http {
            status: 429,
            body: "RESOURCE_EXHAUSTED".into(),
        }
        .to_string();
        assert_eq!(category(&http), Some("Rate Limited"));
        assert_eq!(
            category(&GenerationError::Network("connection reset".into()).to_string()),
            Some("Connection Error")
        );
        // A garbled 2xx body is not a connectivity problem
        let garbled =
            GenerationError::InvalidResponse("expected value at line 1 column 1".into()).to_string();
        assert_eq!(category(&garbled), None);
        assert_eq!(suggest_fix(&garbled), FALLBACK_SUGGESTION);
    }

    #[test]
    fn test_first_match_wins() {
        // quota is checked before network
        assert_eq!(
            suggest_fix("quota exceeded after network retry"),
            "Too many simultaneous requests. Wait 30 seconds and try again."
        );
        // policy beats everything else
        assert_eq!(
            category("policy violation: no image returned, quota ok"),
            Some("Content Blocked")
        );
    }

    #[test]
    fn test_no_image_and_render_failures() {
        assert_eq!(
            category(&GenerationError::NoImage.to_string()),
            Some("No Image")
        );
        assert_eq!(
            category("Failed to render the generated image."),
            Some("No Image")
        );
    }

    #[test]
    fn test_fallback_and_determinism() {
        let msg = GenerationError::EmptyResponse.to_string();
        assert_eq!(category(&msg), None);
        assert_eq!(suggest_fix(&msg), FALLBACK_SUGGESTION);
        assert_eq!(suggest_fix(""), FALLBACK_SUGGESTION);
        assert_eq!(suggest_fix("QUOTA"), suggest_fix("QUOTA"));
    }

    #[test]
    fn test_every_rule_has_text() {
        for rule in RULES {
            assert!(!rule.suggestion.is_empty());
            assert!(rule.keywords.iter().all(|k| *k == k.to_lowercase()));
        }
    }

    #[test]
    fn test_suggestion_for_slot() {
        let mut slot = GenerationSlot::with_id("s");
        assert_eq!(suggestion_for(&slot), None);
        slot.fail("network error: dns failure".into());
        assert_eq!(
            suggestion_for(&slot),
            Some("Connection error. Check your internet connection.")
        );
    }
}
