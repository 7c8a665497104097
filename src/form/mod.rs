mod binding;
mod controller;
mod draft;
mod hydration;
mod model;
mod mutation;
mod schema;
mod validation;
mod value;

#[cfg(test)]
mod tests;

pub use calmform_derive::FormModel;
pub use binding::{ChangeHandler, FieldBinder, FieldBinding, InputType};
pub use controller::{
    FormConfig, FormController, FormError, FormId, FormOptions, FormResult, FormSnapshot,
    SubmitState, ValidationMode,
};
pub use draft::{FormDraftStore, InMemoryDraftStore};
pub use hydration::{BoxedQueryFuture, FormMount, HydrationSource, MountStatus, QueryResult};
pub use model::{FieldType, FormModel, ModelError};
pub use mutation::{
    BoxedMutationFuture, FormCallbacks, FormMutation, MutationError, MutationExecutor,
    MutationRequest, SubmitError, SubmitOutcome,
};
pub use schema::{
    ConfigurationError, FormSchema, FormSchemaBuilder, SchemaError, SchemaValidator, TryValidator,
    try_validator,
};
pub use validation::{
    CombinedValidator, ComposedRules, FieldRule, FieldValidator, Rule, RuleFailure,
    combine_validators, compose_validators, create_validator, has_length_greater_than,
    has_length_less_than, is_alpha_numeric, is_alphabetic, is_numeric, is_required,
    matches_field,
};
pub use value::{FieldErrors, FieldKey, FieldValue, FormValues};
