//! Locale resolution for endpoints that are not path-localised.

use crate::domain::locale::{Locale, LocaleSet};

/// The outcome of resolving a request's locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequestContext {
    pub locale: Locale,
    /// Set only when a query parameter named a supported locale.
    pub explicitly_requested: bool,
}

/// Language tags from an `Accept-Language` value, in header order.
///
/// Quality weights are dropped; position alone decides preference.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    header
        .split(',')
        .filter_map(|part| {
            let tag = part.trim().split(';').next().unwrap_or("").trim();
            (!tag.is_empty()).then(|| tag.to_ascii_lowercase())
        })
        .collect()
}

/// Match header candidates against the supported set: exact tag first,
/// then the primary subtag, first candidate wins.
pub fn match_accept_language<'a>(locales: &'a LocaleSet, header: &str) -> Option<&'a Locale> {
    parse_accept_language(header).iter().find_map(|candidate| {
        locales.get(candidate).or_else(|| {
            let primary = candidate.split('-').next().unwrap_or(candidate);
            locales.get(primary)
        })
    })
}

/// Resolve the query parameter (`locale`, or `lang` when `locale` is absent),
/// then `Accept-Language`, then the default.
///
/// The parameter must name a supported tag exactly; anything else falls
/// through to the header.
pub fn resolve_locale(
    locales: &LocaleSet,
    locale_param: Option<&str>,
    lang_param: Option<&str>,
    accept_language: Option<&str>,
) -> FeedRequestContext {
    let explicit = locale_param
        .or(lang_param)
        .and_then(|value| locales.iter().find(|locale| locale.as_str() == value));

    if let Some(locale) = explicit {
        return FeedRequestContext {
            locale: locale.clone(),
            explicitly_requested: true,
        };
    }

    let locale = accept_language
        .and_then(|header| match_accept_language(locales, header))
        .unwrap_or_else(|| locales.default_locale());

    FeedRequestContext {
        locale: locale.clone(),
        explicitly_requested: false,
    }
}
