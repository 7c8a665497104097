use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::SharedString;
use crate::contracts::{FieldLike, InputLike};
use crate::form::{FieldValue, InputType};

type ChangeHandler = Arc<dyn Fn(FieldValue) + Send + Sync>;

/// Headless text input: the props a renderer needs to draw one field.
#[derive(Clone, Default)]
pub struct TextInput {
    value: FieldValue,
    input_type: InputType,
    placeholder: Option<SharedString>,
    label: Option<SharedString>,
    description: Option<SharedString>,
    error: Option<SharedString>,
    required: bool,
    disabled: bool,
    on_change: Option<ChangeHandler>,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(mut self, value: impl Into<SharedString>) -> Self {
        self.placeholder = Some(value.into());
        self
    }

    pub fn disabled(mut self, value: bool) -> Self {
        self.disabled = value;
        self
    }

    pub fn current_value(&self) -> &FieldValue {
        &self.value
    }

    pub fn display_text(&self) -> SharedString {
        self.value.display_text()
    }

    pub fn current_input_type(&self) -> InputType {
        self.input_type
    }

    pub fn current_placeholder(&self) -> Option<&SharedString> {
        self.placeholder.as_ref()
    }

    pub fn current_label(&self) -> Option<&SharedString> {
        self.label.as_ref()
    }

    pub fn current_description(&self) -> Option<&SharedString> {
        self.description.as_ref()
    }

    pub fn current_error(&self) -> Option<&SharedString> {
        self.error.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Feeds an edit from the host event loop. Disabled inputs ignore edits.
    pub fn change(&self, value: impl Into<FieldValue>) {
        if self.disabled {
            return;
        }
        if let Some(handler) = &self.on_change {
            handler(value.into());
        }
    }
}

impl InputLike for TextInput {
    fn value(mut self, value: FieldValue) -> Self {
        self.value = value;
        self
    }

    fn input_type(mut self, value: InputType) -> Self {
        self.input_type = value;
        self
    }

    fn on_change(mut self, handler: impl Fn(FieldValue) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(handler));
        self
    }
}

impl FieldLike for TextInput {
    fn label(mut self, value: impl Into<SharedString>) -> Self {
        self.label = Some(value.into());
        self
    }

    fn description(mut self, value: impl Into<SharedString>) -> Self {
        self.description = Some(value.into());
        self
    }

    fn error(mut self, value: impl Into<SharedString>) -> Self {
        self.error = Some(value.into());
        self
    }

    fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }
}

impl Debug for TextInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextInput")
            .field("value", &self.value)
            .field("input_type", &self.input_type)
            .field("label", &self.label)
            .field("error", &self.error)
            .field("required", &self.required)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}
