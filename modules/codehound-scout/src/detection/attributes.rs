// Attribute inference over a context window.
//
// Every function here sees only the window around one matched code, never
// the full description, so a sponsor named elsewhere is not attributed to it.

use chrono::NaiveDate;

use codehound_common::patterns::{
    is_generic_brand_word, BRAND_TRIGGER, DISCOUNT_PATTERNS, EXPIRY_PATTERNS, PRODUCT_KEYWORDS,
};

/// Optional attributes inferred around one code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub brand: Option<String>,
    pub product: Option<String>,
    pub discount: Option<String>,
    pub expires_at: Option<NaiveDate>,
}

impl Attributes {
    pub fn infer(context: &str, code: &str) -> Self {
        Self {
            brand: infer_brand(context, code),
            product: infer_product(context),
            discount: infer_discount(context),
            expires_at: infer_expiry(context),
        }
    }

    /// How many of brand, product and discount were found. Expiry does not count.
    pub fn scoring_hits(&self) -> u32 {
        [
            self.brand.is_some(),
            self.product.is_some(),
            self.discount.is_some(),
        ]
        .into_iter()
        .filter(|hit| *hit)
        .count() as u32
    }
}

/// First capitalised word after a trigger word that is neither generic nor the code itself.
pub fn infer_brand(context: &str, code: &str) -> Option<String> {
    BRAND_TRIGGER
        .captures_iter(context)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|word| !is_generic_brand_word(word) && !word.eq_ignore_ascii_case(code))
        .map(str::to_string)
}

pub fn infer_product(context: &str) -> Option<String> {
    let lower = context.to_lowercase();
    PRODUCT_KEYWORDS
        .iter()
        .find(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string())
}

pub fn infer_discount(context: &str) -> Option<String> {
    DISCOUNT_PATTERNS
        .iter()
        .find_map(|p| p.regex.find(context))
        .map(|m| m.as_str().to_string())
}

/// First expiry phrase whose date is valid. An impossible date (31/13/25)
/// falls through to the next pattern and ends as `None`.
pub fn infer_expiry(context: &str) -> Option<NaiveDate> {
    EXPIRY_PATTERNS.iter().find_map(|p| {
        let caps = p.regex.captures(context)?;
        parse_day_month_year(&caps[1], &caps[2], &caps[3])
    })
}

/// `d/m/y` with two-digit years read as 20yy.
pub fn parse_day_month_year(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    let year = if year < 100 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_follows_trigger_word() {
        assert_eq!(
            infer_brand("Retrouvez l'offre chez Ledger dès maintenant", "LEDGER10").as_deref(),
            Some("Ledger")
        );
    }

    #[test]
    fn brand_skips_generic_words_and_the_code_itself() {
        assert_eq!(infer_brand("le code Promo puis sur Youtube", "XYZ1"), None);
        assert_eq!(infer_brand("avec le code NORD20", "NORD20"), None);
        assert_eq!(
            infer_brand("code Video puis chez Hostinger", "HOST10").as_deref(),
            Some("Hostinger")
        );
    }

    #[test]
    fn upper_case_marker_words_are_not_brands() {
        assert_eq!(infer_brand("code promo CODE: X1234", "X1234"), None);
        assert_eq!(infer_brand("le code PROMO: X1234", "X1234"), None);
        assert_eq!(infer_brand("sur COUPON: X1234", "X1234"), None);
    }

    #[test]
    fn brand_must_be_capitalised() {
        assert_eq!(infer_brand("disponible sur votre espace", "ABCD"), None);
    }

    #[test]
    fn product_list_order_is_priority() {
        // "cloud" appears first in the text but "hosting" ranks higher.
        assert_eq!(
            infer_product("Cloud et Hosting pas chers").as_deref(),
            Some("hosting")
        );
        assert_eq!(infer_product("rien à voir"), None);
    }

    #[test]
    fn percentage_wins_over_currency() {
        assert_eq!(
            infer_discount("10€ offerts ou -15% sur tout").as_deref(),
            Some("-15%")
        );
        assert_eq!(infer_discount("5 euros offerts").as_deref(), Some("5 euros"));
        assert_eq!(infer_discount("30 dollars off").as_deref(), Some("30 dollars"));
        assert_eq!(infer_discount("gratuit"), None);
    }

    #[test]
    fn expiry_two_digit_year() {
        assert_eq!(
            infer_expiry("offre valable jusqu'au 15/03/25 seulement"),
            NaiveDate::from_ymd_opt(2025, 3, 15)
        );
    }

    #[test]
    fn expiry_four_digit_year_and_dashes() {
        assert_eq!(
            infer_expiry("L'offre expire le 1-12-2026"),
            NaiveDate::from_ymd_opt(2026, 12, 1)
        );
    }

    #[test]
    fn invalid_dates_are_dropped() {
        assert_eq!(infer_expiry("jusqu'au 31/13/25"), None);
        assert_eq!(infer_expiry("jusqu'au 30/02/25"), None);
        assert_eq!(infer_expiry("jusqu'au 00/01/25"), None);
    }

    #[test]
    fn scoring_hits_ignores_expiry() {
        let attrs = Attributes {
            expires_at: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        assert_eq!(attrs.scoring_hits(), 0);
    }
}
