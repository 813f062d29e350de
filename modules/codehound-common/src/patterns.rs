//! Pattern library for promo code detection.
//!
//! Plain data: ordered pattern tables and word lists. Order is priority,
//! the first matching entry of a table wins.

use regex::Regex;
use std::sync::LazyLock;

/// Accepted code length, in characters, inclusive on both ends.
pub const MIN_CODE_LEN: usize = 4;
pub const MAX_CODE_LEN: usize = 20;

/// Characters of context kept on each side of a matched code.
pub const CONTEXT_RADIUS: usize = 150;

/// Base confidence when the text contains a promotional keyword.
pub const KEYWORD_CONFIDENCE: f64 = 0.7;
/// Base confidence for codes found without any promotional keyword.
pub const BARE_CONFIDENCE: f64 = 0.3;
/// Added once per inferred attribute (brand, product, discount).
pub const ATTRIBUTE_BONUS: f64 = 0.1;

/// A regex tagged with what it recognises.
pub struct LabeledPattern {
    pub label: &'static str,
    pub regex: &'static LazyLock<Regex>,
}

// =============================================================================
// Code markers
// =============================================================================

// Group 1 is the whole alphanumeric run after the marker. Length is checked
// afterwards so that over-long runs are rejected, not truncated.
static RE_MARKER_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CODE[:\s-]+([A-Z0-9]+)").unwrap());
static RE_MARKER_PROMO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PROMO[:\s-]+([A-Z0-9]+)").unwrap());
static RE_MARKER_COUPON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)COUPON[:\s-]+([A-Z0-9]+)").unwrap());
static RE_MARKER_REDUCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bR[EÉ]DUCTION[:\s-]+([A-Z0-9]+)").unwrap());

pub static CODE_MARKERS: &[LabeledPattern] = &[
    LabeledPattern {
        label: "code",
        regex: &RE_MARKER_CODE,
    },
    LabeledPattern {
        label: "promo",
        regex: &RE_MARKER_PROMO,
    },
    LabeledPattern {
        label: "coupon",
        regex: &RE_MARKER_COUPON,
    },
    LabeledPattern {
        label: "reduction",
        regex: &RE_MARKER_REDUCTION,
    },
];

// =============================================================================
// Keywords and deny lists
// =============================================================================

/// Lower-case phrases that signal a sponsored segment.
pub const PROMO_KEYWORDS: &[&str] = &[
    "code promo",
    "code de réduction",
    "code réduction",
    "partenariat",
    "lien affilié",
    "lien en description",
    "sponsorisé par",
    "sponsor",
    "offre spéciale",
    "réduction exclusive",
    "promotion",
    "bénéficier",
    "réduction",
    "avec le code",
];

/// Upper-case tokens that follow a marker word without being codes.
pub const FALSE_POSITIVE_TOKENS: &[&str] = &[
    "HTTP", "HTTPS", "HTML", "VIDEO", "AUDIO", "IMAGE", "YOUTUBE", "GOOGLE", "FACEBOOK",
    "TWITTER", "INSTAGRAM",
    // marker words: "code promo XYZ" must not yield PROMO
    "CODE", "CODES", "PROMO", "PROMOS", "COUPON", "COUPONS", "REDUCTION",
];

/// Words that follow a brand trigger without naming a brand. Compared
/// case-insensitively, so "promo CODE" does not yield a brand.
pub const GENERIC_BRAND_WORDS: &[&str] = &[
    "code", "codes", "promo", "coupon", "reduction", "réduction", "video", "vidéo", "youtube",
];

/// Product categories, lower-case, matched as substrings.
pub const PRODUCT_KEYWORDS: &[&str] = &[
    "vpn",
    "hébergement",
    "hosting",
    "serveur",
    "cloud",
    "formation",
    "cours",
    "livre",
    "ebook",
    "logiciel",
    "software",
    "app",
    "application",
    "abonnement",
    "subscription",
];

// =============================================================================
// Attribute patterns
// =============================================================================

/// Trigger word, then a capitalised word: group 1 is the brand candidate.
pub static BRAND_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:code|promo|chez|sur)\s+([A-Z][a-zA-Z0-9]{2,20})").unwrap()
});

static RE_DISCOUNT_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d{1,2}%").unwrap());
static RE_DISCOUNT_EURO_SIGN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+€").unwrap());
static RE_DISCOUNT_EUROS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s?euros?").unwrap());
static RE_DISCOUNT_DOLLARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s?dollars?").unwrap());

pub static DISCOUNT_PATTERNS: &[LabeledPattern] = &[
    LabeledPattern {
        label: "percent",
        regex: &RE_DISCOUNT_PERCENT,
    },
    LabeledPattern {
        label: "euro_sign",
        regex: &RE_DISCOUNT_EURO_SIGN,
    },
    LabeledPattern {
        label: "euros",
        regex: &RE_DISCOUNT_EUROS,
    },
    LabeledPattern {
        label: "dollars",
        regex: &RE_DISCOUNT_DOLLARS,
    },
];

// Groups 1-3: day, month, year.
static RE_EXPIRY_UNTIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)jusqu['’]au\s+(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})").unwrap()
});
static RE_EXPIRY_VALID_UNTIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)valable\s+jusqu['’]au\s+(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})").unwrap()
});
static RE_EXPIRY_EXPIRES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)expire\s+le\s+(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})").unwrap()
});
static RE_EXPIRY_ENDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)fin\s+le\s+(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})").unwrap()
});

pub static EXPIRY_PATTERNS: &[LabeledPattern] = &[
    LabeledPattern {
        label: "jusqu_au",
        regex: &RE_EXPIRY_UNTIL,
    },
    LabeledPattern {
        label: "valable_jusqu_au",
        regex: &RE_EXPIRY_VALID_UNTIL,
    },
    LabeledPattern {
        label: "expire_le",
        regex: &RE_EXPIRY_EXPIRES,
    },
    LabeledPattern {
        label: "fin_le",
        regex: &RE_EXPIRY_ENDS,
    },
];

// =============================================================================
// Lookups
// =============================================================================

/// `lower` must already be lower-cased.
pub fn has_promo_keyword(lower: &str) -> bool {
    PROMO_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Deny-listed tokens and tokens outside the accepted length range.
pub fn is_false_positive(token: &str) -> bool {
    let len = token.chars().count();
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
        return true;
    }
    let upper = token.to_uppercase();
    FALSE_POSITIVE_TOKENS.contains(&upper.as_str())
}

pub fn is_generic_brand_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    GENERIC_BRAND_WORDS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        for p in CODE_MARKERS.iter().chain(DISCOUNT_PATTERNS).chain(EXPIRY_PATTERNS) {
            assert!(!p.regex.as_str().is_empty(), "{} has an empty regex", p.label);
        }
        assert!(BRAND_TRIGGER.is_match("chez Ledger"));
    }

    #[test]
    fn marker_captures_whole_alphanumeric_run() {
        let caps = RE_MARKER_CODE
            .captures("CODE: ABCDEFGHIJKLMNOPQRSTU fin")
            .unwrap();
        assert_eq!(&caps[1], "ABCDEFGHIJKLMNOPQRSTU");
    }

    #[test]
    fn marker_requires_a_separator() {
        assert!(RE_MARKER_PROMO.captures("une promotion folle").is_none());
        assert!(RE_MARKER_PROMO.captures("PROMO-SUMMER25").is_some());
    }

    #[test]
    fn accented_reduction_marker_matches() {
        let caps = RE_MARKER_REDUCTION.captures("Réduction : HIVER30").unwrap();
        assert_eq!(&caps[1], "HIVER30");
    }

    #[test]
    fn false_positive_length_bounds() {
        assert!(is_false_positive("ABC"));
        assert!(!is_false_positive("ABCD"));
        assert!(!is_false_positive("ABCDEFGHIJKLMNOPQRST"));
        assert!(is_false_positive("ABCDEFGHIJKLMNOPQRSTU"));
    }

    #[test]
    fn false_positive_tokens_are_case_insensitive() {
        assert!(is_false_positive("youtube"));
        assert!(is_false_positive("Https"));
        assert!(is_false_positive("promo"));
        assert!(!is_false_positive("NORD20"));
    }

    #[test]
    fn generic_brand_words_ignore_case() {
        assert!(is_generic_brand_word("Code"));
        assert!(is_generic_brand_word("CODE"));
        assert!(is_generic_brand_word("Coupon"));
        assert!(is_generic_brand_word("REDUCTION"));
        assert!(!is_generic_brand_word("NordVPN"));
    }

    #[test]
    fn keyword_lookup_expects_lowercase() {
        assert!(has_promo_keyword("profitez de notre partenariat"));
        assert!(has_promo_keyword("sponsorisé par nordvpn"));
        assert!(!has_promo_keyword("nouvelle vidéo sur rust"));
    }

    #[test]
    fn expiry_accepts_typographic_apostrophe() {
        let caps = RE_EXPIRY_UNTIL.captures("valable jusqu’au 01-12-2025").unwrap();
        assert_eq!((&caps[1], &caps[2], &caps[3]), ("01", "12", "2025"));
    }
}
