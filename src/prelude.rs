pub use crate::SharedString;
pub use crate::components::TextInput;
pub use crate::contracts::{FieldLike, InputLike};
pub use crate::form::{
    FieldErrors, FieldKey, FieldValue, FormCallbacks, FormConfig, FormController, FormError,
    FormModel, FormMount, FormMutation, FormOptions, FormResult, FormSchema, FormValues,
    InputType, MountStatus, MutationError, QueryResult, SubmitError, ValidationMode,
    combine_validators, compose_validators, is_alphabetic, is_numeric, is_required,
};
pub use crate::i18n::{I18nManager, Locale};
