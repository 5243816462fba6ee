//! Locale negotiation from the Accept-Language request header.
//!
//! Picks the best supported locale for a request that carries no locale in
//! its URL. Parsing is deliberately forgiving: a malformed header never
//! fails, it just contributes fewer candidates and the default wins.

use crate::i18n::Locale;
use std::cmp::Ordering;

/// One parsed language range from the header, e.g. `es-ES;q=0.9`.
#[derive(Debug, Clone, PartialEq)]
struct LanguagePreference {
    tag: String,
    quality: f32,
}

/// Parse an Accept-Language value into preferences ordered by descending
/// quality. Entries with `q=0` mean "not acceptable" and are dropped;
/// unparsable quality values are read as 1.0. The sort is stable, so equal
/// qualities keep their header order.
fn parse_preferences(header: &str) -> Vec<LanguagePreference> {
    let mut preferences = Vec::new();

    for part in header.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let mut pieces = part.split(';');
        let tag = pieces.next().unwrap_or_default().trim();
        if tag.is_empty() {
            continue;
        }

        let mut quality = 1.0f32;
        for parameter in pieces {
            let parameter = parameter.trim();
            if let Some(value) = parameter
                .strip_prefix("q=")
                .or_else(|| parameter.strip_prefix("Q="))
            {
                quality = value.trim().parse().unwrap_or(1.0);
            }
        }

        if quality <= 0.0 {
            continue;
        }

        preferences.push(LanguagePreference {
            tag: tag.to_string(),
            quality,
        });
    }

    preferences.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(Ordering::Equal)
    });
    preferences
}

/// Select the best-matching supported locale for a language preference
/// header.
///
/// Candidates are tried in descending quality order; each is matched first
/// by its exact tag, then by its primary subtag (`es-ES` → `es`), both
/// case-insensitively. When nothing matches, including an empty or
/// malformed header, the fallback is returned. Deterministic for a given
/// header and supported set.
pub fn negotiate(header: &str, supported: &[Locale], fallback: Locale) -> Locale {
    for preference in parse_preferences(header) {
        if let Some(locale) = supported
            .iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(&preference.tag))
        {
            return *locale;
        }

        let primary = preference
            .tag
            .split('-')
            .next()
            .unwrap_or(preference.tag.as_str());
        if let Some(locale) = supported
            .iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(primary))
        {
            return *locale;
        }
    }

    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SUPPORTED: [Locale; 2] = [Locale::SPANISH, Locale::ENGLISH];

    // ==================== parse_preferences Tests ====================

    #[test]
    fn test_parse_single_tag() {
        let preferences = parse_preferences("en");
        assert_eq!(preferences.len(), 1);
        assert_eq!(preferences[0].tag, "en");
        assert_eq!(preferences[0].quality, 1.0);
    }

    #[test]
    fn test_parse_weighted_tags_sorted_by_quality() {
        let preferences = parse_preferences("en;q=0.5,es-ES,fr;q=0.8");
        let tags: Vec<&str> = preferences.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags, vec!["es-ES", "fr", "en"]);
    }

    #[test]
    fn test_parse_equal_quality_keeps_header_order() {
        let preferences = parse_preferences("fr;q=0.8,de;q=0.8,en;q=0.8");
        let tags: Vec<&str> = preferences.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags, vec!["fr", "de", "en"]);
    }

    #[test]
    fn test_parse_drops_q_zero() {
        let preferences = parse_preferences("en;q=0,es;q=0.5");
        assert_eq!(preferences.len(), 1);
        assert_eq!(preferences[0].tag, "es");
    }

    #[test]
    fn test_parse_malformed_quality_reads_as_one() {
        let preferences = parse_preferences("en;q=banana,es;q=0.5");
        assert_eq!(preferences[0].tag, "en");
        assert_eq!(preferences[0].quality, 1.0);
    }

    #[test]
    fn test_parse_empty_and_whitespace() {
        assert!(parse_preferences("").is_empty());
        assert!(parse_preferences("   ").is_empty());
        assert!(parse_preferences(",,,").is_empty());
    }

    #[test]
    fn test_parse_tolerates_spacing() {
        let preferences = parse_preferences(" es-ES , es ; q=0.9 , en ; q=0.8 ");
        let tags: Vec<&str> = preferences.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags, vec!["es-ES", "es", "en"]);
    }

    // ==================== negotiate Tests ====================

    #[test]
    fn test_negotiate_primary_subtag_match() {
        let locale = negotiate("es-ES,es;q=0.9,en;q=0.8", &SUPPORTED, Locale::SPANISH);
        assert_eq!(locale, Locale::SPANISH);
    }

    #[test]
    fn test_negotiate_exact_match_wins() {
        let locale = negotiate("en,es;q=0.9", &SUPPORTED, Locale::SPANISH);
        assert_eq!(locale, Locale::ENGLISH);
    }

    #[test]
    fn test_negotiate_empty_header_yields_fallback() {
        assert_eq!(negotiate("", &SUPPORTED, Locale::SPANISH), Locale::SPANISH);
    }

    #[test]
    fn test_negotiate_no_supported_match_yields_fallback() {
        assert_eq!(
            negotiate("fr-FR", &SUPPORTED, Locale::SPANISH),
            Locale::SPANISH
        );
        assert_eq!(
            negotiate("fr-FR,de;q=0.9", &SUPPORTED, Locale::ENGLISH),
            Locale::ENGLISH
        );
    }

    #[test]
    fn test_negotiate_case_insensitive() {
        assert_eq!(
            negotiate("EN-us", &SUPPORTED, Locale::SPANISH),
            Locale::ENGLISH
        );
    }

    #[test]
    fn test_negotiate_quality_orders_candidates() {
        // English is preferred even though Spanish appears first.
        let locale = negotiate("es;q=0.3,en;q=0.9", &SUPPORTED, Locale::SPANISH);
        assert_eq!(locale, Locale::ENGLISH);
    }

    #[test]
    fn test_negotiate_skips_unacceptable_languages() {
        let locale = negotiate("es;q=0,en;q=0.1", &SUPPORTED, Locale::SPANISH);
        assert_eq!(locale, Locale::ENGLISH);
    }

    #[test]
    fn test_negotiate_malformed_header_yields_fallback() {
        assert_eq!(
            negotiate(";;;q=;,,", &SUPPORTED, Locale::SPANISH),
            Locale::SPANISH
        );
    }

    #[test]
    fn test_negotiate_is_deterministic() {
        let header = "en-GB;q=0.7,es;q=0.7,fr";
        let first = negotiate(header, &SUPPORTED, Locale::SPANISH);
        for _ in 0..10 {
            assert_eq!(negotiate(header, &SUPPORTED, Locale::SPANISH), first);
        }
    }

    proptest! {
        /// Any header string at all negotiates without panicking and lands
        /// on a supported locale or the fallback.
        #[test]
        fn prop_negotiate_never_panics(header in ".{0,200}") {
            let locale = negotiate(&header, &SUPPORTED, Locale::SPANISH);
            prop_assert!(SUPPORTED.contains(&locale));
        }

        /// Parsing never yields an unacceptable (q<=0) preference.
        #[test]
        fn prop_preferences_are_acceptable(header in ".{0,200}") {
            for preference in parse_preferences(&header) {
                prop_assert!(preference.quality > 0.0);
            }
        }
    }
}
