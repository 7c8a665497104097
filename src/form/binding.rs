use std::sync::Arc;

use tracing::warn;

use crate::SharedString;
use crate::contracts::{FieldLike, InputLike};

use super::controller::{FormController, FormError, FormResult};
use super::value::{FieldKey, FieldValue};

/// Presentation hint for the bound element. Validation ignores it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum InputType {
    #[default]
    Text,
    Number,
    Email,
    Password,
    Textarea,
    Checkbox,
}

impl InputType {
    pub const fn as_str(self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::Email => "email",
            InputType::Password => "password",
            InputType::Textarea => "textarea",
            InputType::Checkbox => "checkbox",
        }
    }
}

/// What one field looks like at render time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldBinding {
    pub key: FieldKey,
    pub value: FieldValue,
    pub error_message: Option<SharedString>,
    pub input_type: InputType,
}

pub type ChangeHandler = Arc<dyn Fn(FieldValue) + Send + Sync>;

/// Read/dispatch adapter between one field of a form and an element.
#[derive(Clone)]
pub struct FieldBinder {
    controller: FormController,
    key: FieldKey,
    input_type: InputType,
}

impl FormController {
    pub fn field(&self, key: impl Into<FieldKey>, input_type: InputType) -> FormResult<FieldBinder> {
        let key = key.into();
        if !self.contains_field(key.as_str())? {
            return Err(FormError::UnknownField(key));
        }
        Ok(FieldBinder {
            controller: self.clone(),
            key,
            input_type,
        })
    }

    pub fn text_field(&self, key: impl Into<FieldKey>) -> FormResult<FieldBinder> {
        self.field(key, InputType::Text)
    }
}

impl FieldBinder {
    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    pub fn value(&self) -> FormResult<FieldValue> {
        self.controller
            .field_value(self.key.as_str())?
            .ok_or_else(|| FormError::UnknownField(self.key.clone()))
    }

    pub fn error_message(&self) -> FormResult<Option<SharedString>> {
        self.controller.field_error(self.key.as_str())
    }

    pub fn on_change(&self, value: impl Into<FieldValue>) -> FormResult<()> {
        self.controller.set_field_value(self.key.clone(), value)
    }

    pub fn binding(&self) -> FormResult<FieldBinding> {
        Ok(FieldBinding {
            key: self.key.clone(),
            value: self.value()?,
            error_message: self.error_message()?,
            input_type: self.input_type,
        })
    }

    /// Handler for element callbacks, which have nowhere to return an error.
    pub fn change_handler(&self) -> ChangeHandler {
        let controller = self.controller.clone();
        let key = self.key.clone();
        Arc::new(move |next: FieldValue| {
            if let Err(error) = controller.set_field_value(key.clone(), next) {
                warn!(field = %key, %error, "dropped field change");
            }
        })
    }

    /// Feeds the element the field's value, input type and change handler.
    pub fn with_input<C>(&self, element: C) -> FormResult<C>
    where
        C: InputLike,
    {
        let handler = self.change_handler();
        Ok(element
            .value(self.value()?)
            .input_type(self.input_type)
            .on_change(move |next| handler(next)))
    }

    /// Attaches the field's validation message, if it has one.
    pub fn with_validation_message<C>(&self, element: C) -> FormResult<C>
    where
        C: FieldLike,
    {
        Ok(match self.error_message()? {
            Some(message) => element.error(message),
            None => element,
        })
    }

    /// Input binding first, then the validation message.
    pub fn bind<C>(&self, element: C) -> FormResult<C>
    where
        C: InputLike + FieldLike,
    {
        let element = self.with_input(element)?;
        self.with_validation_message(element)
    }
}
