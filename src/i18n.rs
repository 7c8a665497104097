use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::SharedString;

pub const DEFAULT_LOCALE: &str = "en";

const LOCALES: &[(&str, &[(&str, &str)])] = &[
    (
        "en",
        &[
            ("validation.required", "{field} is required"),
            ("validation.alphabetic", "{field} must be alphabetic"),
            ("validation.numeric", "{field} must be numeric"),
            ("validation.alpha_numeric", "{field} must be alphanumeric"),
            (
                "validation.length_greater_than",
                "{field} must be longer than {length} characters",
            ),
            (
                "validation.length_less_than",
                "{field} cannot be longer than {length} characters",
            ),
            ("validation.matches_field", "{field} must match {other}"),
        ],
    ),
    (
        "de",
        &[
            ("validation.required", "{field} ist erforderlich"),
            ("validation.alphabetic", "{field} darf nur Buchstaben enthalten"),
            ("validation.numeric", "{field} muss numerisch sein"),
            (
                "validation.alpha_numeric",
                "{field} darf nur Buchstaben und Ziffern enthalten",
            ),
            (
                "validation.length_greater_than",
                "{field} muss länger als {length} Zeichen sein",
            ),
            (
                "validation.length_less_than",
                "{field} darf nicht länger als {length} Zeichen sein",
            ),
            (
                "validation.matches_field",
                "{field} muss mit {other} übereinstimmen",
            ),
        ],
    ),
    (
        "zh-CN",
        &[
            ("validation.required", "{field}为必填项"),
            ("validation.alphabetic", "{field}只能包含字母"),
            ("validation.numeric", "{field}必须是数字"),
            ("validation.alpha_numeric", "{field}只能包含字母和数字"),
            (
                "validation.length_greater_than",
                "{field}长度必须大于{length}个字符",
            ),
            (
                "validation.length_less_than",
                "{field}长度不能超过{length}个字符",
            ),
            ("validation.matches_field", "{field}必须与{other}一致"),
        ],
    ),
];

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub enum Locale {
    #[default]
    System,
    Tag(String),
}

impl From<String> for Locale {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("system") {
            return Self::System;
        }
        Self::Tag(value.trim().to_string())
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

/// Resolves message templates for the built-in validation rules.
#[derive(Clone)]
pub struct I18nManager {
    catalog: Arc<I18nCatalog>,
    locale: Arc<RwLock<Locale>>,
}

impl Default for I18nManager {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nManager {
    pub fn new() -> Self {
        Self::with_locale(Locale::System)
    }

    pub fn with_locale(locale: impl Into<Locale>) -> Self {
        Self {
            catalog: I18nCatalog::shared(),
            locale: Arc::new(RwLock::new(locale.into())),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_locale(&self, locale: impl Into<Locale>) {
        *self.locale.write().unwrap_or_else(PoisonError::into_inner) = locale.into();
    }

    pub fn default_locale(&self) -> &'static str {
        self.catalog.default_locale
    }

    pub fn resolved_locale(&self) -> &'static str {
        self.catalog
            .resolve_locale(self.requested_locale().as_deref())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn t(&self, key: &str) -> SharedString {
        if let Some(value) = self.lookup(key) {
            value.into()
        } else {
            key.into()
        }
    }

    /// Like [`I18nManager::t`], with `{name}` placeholders replaced. An unknown
    /// key is itself used as the template.
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> SharedString {
        let template = self.lookup(key);
        if params.is_empty() {
            return template.unwrap_or(key).into();
        }

        let raw = template.unwrap_or(key);
        format_template(raw, params).into()
    }

    fn requested_locale(&self) -> Option<String> {
        match self.locale() {
            Locale::System => system_locale(),
            Locale::Tag(tag) => Some(tag),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        let resolved = self.resolved_locale();
        self.catalog
            .lookup(resolved, key)
            .or_else(|| self.catalog.lookup(self.catalog.default_locale, key))
    }
}

#[cfg(feature = "i18n")]
fn system_locale() -> Option<String> {
    sys_locale::get_locale()
}

#[cfg(not(feature = "i18n"))]
fn system_locale() -> Option<String> {
    None
}

struct I18nCatalog {
    default_locale: &'static str,
    locales: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    normalized_locale_lookup: HashMap<String, &'static str>,
    language_lookup: HashMap<String, &'static str>,
}

impl I18nCatalog {
    /// The built-in catalogs are static, so every manager shares one index.
    fn shared() -> Arc<Self> {
        static CATALOG: OnceLock<Arc<I18nCatalog>> = OnceLock::new();
        CATALOG.get_or_init(|| Arc::new(Self::load())).clone()
    }

    fn load() -> Self {
        let mut locales = HashMap::new();
        let mut normalized_locale_lookup = HashMap::new();
        let mut language_lookup = HashMap::new();
        let mut ambiguous_languages = HashSet::new();

        for (locale, entries) in LOCALES.iter().copied() {
            let normalized = normalize_locale_tag(locale);
            normalized_locale_lookup.insert(normalized.clone(), locale);

            let language = normalized.split('-').next().unwrap_or_default().to_string();
            if let Some(existing) = language_lookup.get(&language) {
                if *existing != locale {
                    ambiguous_languages.insert(language.clone());
                }
            } else {
                language_lookup.insert(language, locale);
            }

            locales.insert(locale, entries.iter().copied().collect::<HashMap<_, _>>());
        }

        for language in ambiguous_languages {
            language_lookup.remove(&language);
        }

        Self {
            default_locale: DEFAULT_LOCALE,
            locales,
            normalized_locale_lookup,
            language_lookup,
        }
    }

    fn resolve_locale(&self, requested: Option<&str>) -> &'static str {
        let Some(requested) = requested else {
            return self.default_locale;
        };

        let normalized = normalize_locale_tag(requested);
        if let Some(locale) = self.normalized_locale_lookup.get(&normalized) {
            return locale;
        }

        let language = normalized.split('-').next().unwrap_or_default();
        if let Some(locale) = self.language_lookup.get(language) {
            return locale;
        }

        self.default_locale
    }

    fn lookup(&self, locale: &'static str, key: &str) -> Option<&'static str> {
        self.locales
            .get(locale)
            .and_then(|entries| entries.get(key).copied())
    }
}

fn normalize_locale_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    let without_encoding = trimmed.split('.').next().unwrap_or(trimmed);
    let without_variant = without_encoding
        .split('@')
        .next()
        .unwrap_or(without_encoding);
    without_variant
        .replace('_', "-")
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn format_template(template: &str, params: &[(&str, &str)]) -> String {
    let values = params.iter().copied().collect::<HashMap<&str, &str>>();
    let mut output = String::with_capacity(template.len());
    let mut cursor = 0;

    while cursor < template.len() {
        let tail = &template[cursor..];
        let Some(open_rel) = tail.find('{') else {
            output.push_str(tail);
            break;
        };

        let open = cursor + open_rel;
        output.push_str(&template[cursor..open]);

        let token_start = open + 1;
        let Some(close_rel) = template[token_start..].find('}') else {
            output.push_str(&template[open..]);
            break;
        };
        let close = token_start + close_rel;
        let token = &template[token_start..close];

        if let Some(value) = values.get(token) {
            output.push_str(value);
        } else {
            output.push_str(&template[open..=close]);
        }

        cursor = close + 1;
    }

    output
}
