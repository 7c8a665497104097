extern crate self as calmform;

pub mod components;
pub mod contracts;
pub mod form;
pub mod i18n;
pub mod prelude;

pub use crate::i18n::{I18nManager, Locale};

/// Cheaply clonable immutable string used for labels and messages.
pub type SharedString = std::sync::Arc<str>;

#[cfg(test)]
mod test_public_api;
