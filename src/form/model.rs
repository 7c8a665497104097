use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use super::value::{FieldKey, FieldValue, FormValues};

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ModelError {
    #[error("field `{field}` {reason}")]
    InvalidField { field: FieldKey, reason: String },
}

/// A struct whose named fields map one-to-one onto form fields.
///
/// Usually implemented with `#[derive(FormModel)]`, which also generates a
/// `<Model>Fields` accessor returning each field's [`FieldKey`].
pub trait FormModel: Sized {
    type Fields;

    fn fields() -> Self::Fields;
    fn field_keys() -> Vec<FieldKey>;
    fn to_values(&self) -> FormValues;
    fn from_values(values: &FormValues) -> Result<Self, ModelError>;
}

pub trait FieldType: Sized {
    fn to_field_value(&self) -> FieldValue;
    fn from_field_value(value: &FieldValue) -> Result<Self, String>;
}

impl FieldType for FieldValue {
    fn to_field_value(&self) -> FieldValue {
        self.clone()
    }

    fn from_field_value(value: &FieldValue) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FieldType for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }

    fn from_field_value(value: &FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Null => Err("expected text, found null".to_string()),
            other => Ok(other.to_string()),
        }
    }
}

impl FieldType for Option<String> {
    fn to_field_value(&self) -> FieldValue {
        self.clone().into()
    }

    fn from_field_value(value: &FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Null => Ok(None),
            other => String::from_field_value(other).map(Some),
        }
    }
}

impl FieldType for Decimal {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Number(*self)
    }

    fn from_field_value(value: &FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Number(number) => Ok(*number),
            FieldValue::Text(text) => Decimal::from_str(text.trim())
                .map_err(|error| format!("expected a number, found `{text}`: {error}")),
            other => Err(format!("expected a number, found {other}")),
        }
    }
}

impl FieldType for Option<Decimal> {
    fn to_field_value(&self) -> FieldValue {
        (*self).into()
    }

    fn from_field_value(value: &FieldValue) -> Result<Self, String> {
        if value.is_blank() {
            return Ok(None);
        }
        Decimal::from_field_value(value).map(Some)
    }
}

impl FieldType for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_field_value(value: &FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Bool(value) => Ok(*value),
            FieldValue::Null => Ok(false),
            FieldValue::Text(text) => text
                .trim()
                .parse::<bool>()
                .map_err(|_| format!("expected true or false, found `{text}`")),
            FieldValue::Number(number) => Err(format!("expected true or false, found {number}")),
        }
    }
}
