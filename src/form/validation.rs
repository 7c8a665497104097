use std::sync::Arc;

use crate::SharedString;
use crate::i18n::{DEFAULT_LOCALE, I18nManager};

use super::schema::{SchemaError, SchemaValidator};
use super::value::{FieldErrors, FieldKey, FieldValue, FormValues};

/// A rule that rejected a value: a message key plus its template parameters.
///
/// The `{field}` parameter is filled in by the [`FieldValidator`] that owns the
/// rule. Keys missing from the catalog are used as the template itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuleFailure {
    message_key: SharedString,
    params: Vec<(&'static str, String)>,
}

impl RuleFailure {
    pub fn new(message_key: impl Into<SharedString>) -> Self {
        Self {
            message_key: message_key.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    pub fn message_key(&self) -> &str {
        &self.message_key
    }

    fn render(&self, label: &str, messages: &I18nManager) -> SharedString {
        let mut params = Vec::with_capacity(self.params.len() + 1);
        params.push(("field", label));
        params.extend(self.params.iter().map(|(name, value)| (*name, value.as_str())));
        messages.t_with(&self.message_key, &params)
    }
}

pub trait FieldRule: Send + Sync {
    fn check(&self, value: &FieldValue, values: &FormValues) -> Option<RuleFailure>;
}

impl<F> FieldRule for F
where
    F: Fn(&FieldValue, &FormValues) -> Option<RuleFailure> + Send + Sync,
{
    fn check(&self, value: &FieldValue, values: &FormValues) -> Option<RuleFailure> {
        (self)(value, values)
    }
}

#[derive(Clone)]
pub struct Rule(Arc<dyn FieldRule>);

impl Rule {
    pub fn new(rule: impl FieldRule + 'static) -> Self {
        Self(Arc::new(rule))
    }

    pub fn check(&self, value: &FieldValue, values: &FormValues) -> Option<RuleFailure> {
        self.0.check(value, values)
    }
}

/// Builds a rule from a predicate over present values. Blank values pass, so
/// only [`is_required`] rejects an empty field.
pub fn create_validator<P>(message_key: &'static str, predicate: P) -> Rule
where
    P: Fn(&FieldValue) -> bool + Send + Sync + 'static,
{
    Rule::new(move |value: &FieldValue, _values: &FormValues| {
        if value.is_blank() || predicate(value) {
            None
        } else {
            Some(RuleFailure::new(message_key))
        }
    })
}

pub fn is_required() -> Rule {
    Rule::new(|value: &FieldValue, _values: &FormValues| {
        value
            .is_blank()
            .then(|| RuleFailure::new("validation.required"))
    })
}

pub fn is_alphabetic() -> Rule {
    create_validator("validation.alphabetic", |value| {
        value
            .as_text()
            .is_some_and(|text| text.chars().all(|ch| ch.is_ascii_alphabetic()))
    })
}

pub fn is_numeric() -> Rule {
    create_validator("validation.numeric", |value| match value {
        FieldValue::Number(number) => is_digits(&number.to_string()),
        FieldValue::Text(text) => is_digits(text),
        FieldValue::Null | FieldValue::Bool(_) => false,
    })
}

// Numbers are held to the same digits-only form as typed text.
fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|ch| ch.is_ascii_digit())
}

pub fn is_alpha_numeric() -> Rule {
    create_validator("validation.alpha_numeric", |value| {
        value
            .as_text()
            .is_some_and(|text| text.chars().all(|ch| ch.is_ascii_alphanumeric()))
    })
}

pub fn has_length_greater_than(length: usize) -> Rule {
    Rule::new(move |value: &FieldValue, _values: &FormValues| {
        let text = value.as_text()?;
        (!text.is_empty() && text.chars().count() <= length).then(|| {
            RuleFailure::new("validation.length_greater_than").param("length", length)
        })
    })
}

pub fn has_length_less_than(length: usize) -> Rule {
    Rule::new(move |value: &FieldValue, _values: &FormValues| {
        let text = value.as_text()?;
        (text.chars().count() >= length).then(|| {
            RuleFailure::new("validation.length_less_than").param("length", length.saturating_sub(1))
        })
    })
}

pub fn matches_field(other: impl Into<FieldKey>, other_label: impl Into<String>) -> Rule {
    let other = other.into();
    let other_label = other_label.into();
    Rule::new(move |value: &FieldValue, values: &FormValues| {
        (value != values.get_or_null(other.as_str())).then(|| {
            RuleFailure::new("validation.matches_field").param("other", other_label.as_str())
        })
    })
}

/// An ordered rule chain awaiting the label used in its messages.
#[derive(Clone)]
pub struct ComposedRules {
    rules: Vec<Rule>,
}

impl ComposedRules {
    pub fn label(self, label: impl Into<SharedString>) -> FieldValidator {
        FieldValidator {
            label: label.into(),
            rules: self.rules,
            messages: I18nManager::with_locale(DEFAULT_LOCALE),
        }
    }
}

pub fn compose_validators(rules: impl IntoIterator<Item = Rule>) -> ComposedRules {
    ComposedRules {
        rules: rules.into_iter().collect(),
    }
}

/// A labelled rule chain for one field. The first failing rule wins.
#[derive(Clone)]
pub struct FieldValidator {
    label: SharedString,
    rules: Vec<Rule>,
    messages: I18nManager,
}

impl FieldValidator {
    pub fn with_messages(mut self, messages: I18nManager) -> Self {
        self.messages = messages;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn validate(&self, value: &FieldValue, values: &FormValues) -> Option<SharedString> {
        self.rules
            .iter()
            .find_map(|rule| rule.check(value, values))
            .map(|failure| failure.render(&self.label, &self.messages))
    }
}

/// Schema validator assembled from per-field validators.
#[derive(Clone, Default)]
pub struct CombinedValidator {
    fields: Vec<(FieldKey, FieldValidator)>,
}

impl CombinedValidator {
    pub fn field(mut self, key: impl Into<FieldKey>, validator: FieldValidator) -> Self {
        self.fields.push((key.into(), validator));
        self
    }

    pub fn with_messages(mut self, messages: I18nManager) -> Self {
        for (_, validator) in &mut self.fields {
            validator.messages = messages.clone();
        }
        self
    }
}

impl SchemaValidator for CombinedValidator {
    fn validate(&self, values: &FormValues) -> Result<FieldErrors, SchemaError> {
        let mut errors = FieldErrors::new();
        for (key, validator) in &self.fields {
            if errors.contains_key(key.as_str()) {
                continue;
            }
            if let Some(message) = validator.validate(values.get_or_null(key.as_str()), values) {
                errors.insert(key.clone(), message);
            }
        }
        Ok(errors)
    }
}

pub fn combine_validators<K>(
    fields: impl IntoIterator<Item = (K, FieldValidator)>,
) -> CombinedValidator
where
    K: Into<FieldKey>,
{
    CombinedValidator {
        fields: fields
            .into_iter()
            .map(|(key, validator)| (key.into(), validator))
            .collect(),
    }
}
