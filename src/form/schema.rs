use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use thiserror::Error;

use super::value::{FieldErrors, FieldKey, FormValues};

#[derive(Debug, Clone, Copy, Error, Eq, PartialEq)]
pub enum ConfigurationError {
    #[error("form schema requires a model")]
    MissingModel,
    #[error("form schema requires a validator")]
    MissingValidator,
}

/// A validator that could not produce an error mapping.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum SchemaError {
    #[error("schema validator failed: {0}")]
    Validator(String),
    #[error("schema validator panicked: {0}")]
    Panicked(String),
}

impl SchemaError {
    pub fn validator(message: impl Into<String>) -> Self {
        Self::Validator(message.into())
    }
}

/// Maps the current values to errors for the invalid fields only.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, values: &FormValues) -> Result<FieldErrors, SchemaError>;
}

impl<F> SchemaValidator for F
where
    F: Fn(&FormValues) -> FieldErrors + Send + Sync,
{
    fn validate(&self, values: &FormValues) -> Result<FieldErrors, SchemaError> {
        Ok((self)(values))
    }
}

/// Adapts a closure that can fail instead of returning an error mapping.
pub struct TryValidator<F>(F);

pub fn try_validator<F>(validator: F) -> TryValidator<F>
where
    F: Fn(&FormValues) -> Result<FieldErrors, SchemaError> + Send + Sync,
{
    TryValidator(validator)
}

impl<F> SchemaValidator for TryValidator<F>
where
    F: Fn(&FormValues) -> Result<FieldErrors, SchemaError> + Send + Sync,
{
    fn validate(&self, values: &FormValues) -> Result<FieldErrors, SchemaError> {
        (self.0)(values)
    }
}

/// Immutable pairing of the form's model and its validator.
///
/// The model's keys are the recognized fields. Cloning shares the validator.
#[derive(Clone)]
pub struct FormSchema {
    model: FormValues,
    validator: Arc<dyn SchemaValidator>,
}

impl FormSchema {
    pub fn new(model: FormValues, validator: impl SchemaValidator + 'static) -> Self {
        Self {
            model,
            validator: Arc::new(validator),
        }
    }

    pub fn builder() -> FormSchemaBuilder {
        FormSchemaBuilder::default()
    }

    pub fn initial_values(&self) -> &FormValues {
        &self.model
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.model.keys()
    }

    /// Same validator over a different model, e.g. one fetched from a query.
    pub fn with_model(&self, model: FormValues) -> Self {
        Self {
            model,
            validator: self.validator.clone(),
        }
    }

    /// Runs the validator. A panicking validator is reported as
    /// [`SchemaError::Panicked`] rather than unwinding into the caller.
    pub fn validate(&self, values: &FormValues) -> Result<FieldErrors, SchemaError> {
        catch_unwind(AssertUnwindSafe(|| self.validator.validate(values)))
            .unwrap_or_else(|payload| Err(SchemaError::Panicked(panic_message(payload.as_ref()))))
    }
}

impl Debug for FormSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSchema")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct FormSchemaBuilder {
    model: Option<FormValues>,
    validator: Option<Arc<dyn SchemaValidator>>,
}

impl FormSchemaBuilder {
    pub fn model(mut self, model: FormValues) -> Self {
        self.model = Some(model);
        self
    }

    pub fn validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn build(self) -> Result<FormSchema, ConfigurationError> {
        let model = self.model.ok_or(ConfigurationError::MissingModel)?;
        let validator = self.validator.ok_or(ConfigurationError::MissingValidator)?;
        Ok(FormSchema { model, validator })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
