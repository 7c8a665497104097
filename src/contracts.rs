use crate::SharedString;
use crate::form::{FieldValue, InputType};

/// An element that displays and edits a single value.
pub trait InputLike: Sized {
    fn value(self, value: FieldValue) -> Self;
    fn input_type(self, value: InputType) -> Self;
    fn on_change(self, handler: impl Fn(FieldValue) + Send + Sync + 'static) -> Self;
}

/// An element with field chrome around its control.
pub trait FieldLike: Sized {
    fn label(self, value: impl Into<SharedString>) -> Self;
    fn description(self, value: impl Into<SharedString>) -> Self;
    fn error(self, value: impl Into<SharedString>) -> Self;
    fn required(self, value: bool) -> Self;
}
