use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{debug, warn};

use crate::SharedString;

use super::model::{FormModel, ModelError};
use super::mutation::{FormCallbacks, FormMutation, SubmitError, SubmitOutcome};
use super::schema::FormSchema;
use super::value::{FieldErrors, FieldKey, FieldValue, FormValues};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidationMode {
    /// Errors are computed only when the form is submitted.
    #[default]
    OnSubmit,
    /// Every edit re-runs the schema and records the edited field's error.
    OnChange,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormOptions {
    pub validation_mode: ValidationMode,
    /// Key under which drafts of this form are cached.
    pub form_name: Option<SharedString>,
}

impl FormOptions {
    pub fn named(form_name: impl Into<SharedString>) -> Self {
        Self {
            form_name: Some(form_name.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormSnapshot {
    pub id: FormId,
    pub values: FormValues,
    pub errors: FieldErrors,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub submitting: bool,
    pub is_dirty: bool,
    pub is_valid: bool,
    pub mounted: bool,
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("unknown form field `{0}`")]
    UnknownField(FieldKey),
    #[error("form submit is already in progress")]
    AlreadySubmitting,
    #[error("form has been unmounted")]
    Unmounted,
    #[error("form has no name to store drafts under")]
    MissingFormName,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("failed to load draft: {0}")]
    DraftLoadFailed(String),
    #[error("failed to save draft: {0}")]
    DraftSaveFailed(String),
    #[error("failed to clear draft: {0}")]
    DraftClearFailed(String),
}

pub type FormResult<T> = Result<T, FormError>;

/// Everything a form needs besides its values.
#[derive(Clone)]
pub struct FormConfig {
    pub(super) schema: FormSchema,
    pub(super) mutation: FormMutation,
    pub(super) callbacks: FormCallbacks,
    pub(super) options: FormOptions,
}

impl FormConfig {
    pub fn new(schema: FormSchema, mutation: FormMutation) -> Self {
        Self {
            schema,
            mutation,
            callbacks: FormCallbacks::default(),
            options: FormOptions::default(),
        }
    }

    pub fn callbacks(mut self, callbacks: FormCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }
}

pub(super) struct FormState {
    pub(super) id: FormId,
    pub(super) initial_values: FormValues,
    pub(super) values: FormValues,
    pub(super) errors: FieldErrors,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) mounted: bool,
}

/// Owns one form's state and runs its submit protocol.
///
/// Clones are handles to the same form. The state lock is never held across
/// the mutation's await point or while callbacks run.
#[derive(Clone)]
pub struct FormController {
    pub(super) config: Arc<FormConfig>,
    pub(super) state: Arc<RwLock<FormState>>,
}

impl FormController {
    /// Starts a form from hydrated values when they are present and non-empty,
    /// otherwise from the schema's model.
    pub fn initialize(config: FormConfig, hydrated: Option<FormValues>) -> Self {
        let values = match hydrated {
            Some(values) if !values.is_empty() => values,
            _ => config.schema.initial_values().clone(),
        };
        let id = FormId::next();
        debug!(
            form_id = id.0,
            form_name = config.options.form_name.as_deref(),
            fields = values.len(),
            "initialized form"
        );
        Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(FormState {
                id,
                initial_values: values.clone(),
                values,
                errors: FieldErrors::new(),
                submit_state: SubmitState::Idle,
                submit_count: 0,
                mounted: true,
            })),
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn options(&self) -> &FormOptions {
        &self.config.options
    }

    pub fn schema(&self) -> &FormSchema {
        &self.config.schema
    }

    /// Stores `value` and clears the field's error. Keys outside the current
    /// values are rejected, as is any edit after unmount.
    pub fn set_field_value(
        &self,
        key: impl Into<FieldKey>,
        value: impl Into<FieldValue>,
    ) -> FormResult<()> {
        let key = key.into();
        let value = value.into();
        let live_values = {
            let mut state = write_lock(&self.state, "writing field value")?;
            if !state.mounted {
                return Err(FormError::Unmounted);
            }
            let Some(slot) = state.values.get_mut(key.as_str()) else {
                return Err(FormError::UnknownField(key));
            };
            *slot = value;
            state.errors.remove(key.as_str());
            (self.config.options.validation_mode == ValidationMode::OnChange)
                .then(|| state.values.clone())
        };

        if let Some(values) = live_values {
            self.revalidate_field(&key, &values)?;
        }
        Ok(())
    }

    pub fn field_value(&self, key: &str) -> FormResult<Option<FieldValue>> {
        Ok(read_lock(&self.state, "reading field value")?
            .values
            .get(key)
            .cloned())
    }

    pub fn field_error(&self, key: &str) -> FormResult<Option<SharedString>> {
        Ok(read_lock(&self.state, "reading field error")?
            .errors
            .get(key)
            .cloned())
    }

    pub fn contains_field(&self, key: &str) -> FormResult<bool> {
        Ok(read_lock(&self.state, "checking field key")?
            .values
            .contains_key(key))
    }

    pub fn values(&self) -> FormResult<FormValues> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    pub fn errors(&self) -> FormResult<FieldErrors> {
        Ok(read_lock(&self.state, "reading form errors")?.errors.clone())
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(is_in_flight(
            read_lock(&self.state, "reading submitting flag")?.submit_state,
        ))
    }

    pub fn is_mounted(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading mounted flag")?.mounted)
    }

    pub fn decode<T: FormModel>(&self) -> FormResult<T> {
        let state = read_lock(&self.state, "decoding form values")?;
        Ok(T::from_values(&state.values)?)
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            id: state.id,
            values: state.values.clone(),
            errors: state.errors.clone(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            submitting: is_in_flight(state.submit_state),
            is_dirty: state.values != state.initial_values,
            is_valid: state.errors.is_empty(),
            mounted: state.mounted,
        })
    }

    /// Validates, then runs the mutation and reports the outcome through the
    /// configured callbacks. Validation and mutation failures are delivered to
    /// the callbacks and leave the form idle, so the call itself only fails for
    /// misuse (`AlreadySubmitting`, `Unmounted`) or a poisoned lock.
    pub async fn submit(&self) -> FormResult<()> {
        let (id, values) = {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if !state.mounted {
                return Err(FormError::Unmounted);
            }
            if is_in_flight(state.submit_state) {
                debug!(form_id = state.id.0, "rejected re-entrant submit");
                return Err(FormError::AlreadySubmitting);
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
            (state.id, state.values.clone())
        };
        let mut guard = SubmitGuard::new(&self.state, id);

        let errors = match self.config.schema.validate(&values) {
            Ok(errors) => errors,
            Err(error) => {
                warn!(form_id = id.0, %error, "form validator failed");
                guard.disarm();
                self.finish_submit(SubmitState::Failed, None)?;
                self.config
                    .callbacks
                    .dispatch(SubmitOutcome::Error(SubmitError::Schema(error)));
                return Ok(());
            }
        };

        if !errors.is_empty() {
            debug!(form_id = id.0, invalid_fields = errors.len(), "form validation failed");
            guard.disarm();
            self.finish_submit(SubmitState::Failed, Some(errors.clone()))?;
            self.config
                .callbacks
                .dispatch(SubmitOutcome::ValidationFailure(errors));
            return Ok(());
        }

        {
            let mut state = write_lock(&self.state, "moving submit state to submitting")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            state.errors.clear();
        }
        debug!(
            form_id = id.0,
            input_shape = self.config.mutation.input_shape(),
            "running form mutation"
        );
        let result = self.config.mutation.execute(values).await;
        guard.disarm();

        {
            let mut state = write_lock(&self.state, "completing submit")?;
            if !state.mounted {
                debug!(form_id = id.0, "dropping mutation result for unmounted form");
                state.submit_state = SubmitState::Idle;
                return Ok(());
            }
        }

        match result {
            Ok(()) => {
                self.finish_submit(SubmitState::Succeeded, None)?;
                self.config.callbacks.dispatch(SubmitOutcome::Success);
            }
            Err(error) => {
                warn!(form_id = id.0, %error, "form mutation failed");
                self.finish_submit(SubmitState::Failed, None)?;
                self.config
                    .callbacks
                    .dispatch(SubmitOutcome::Error(SubmitError::Mutation(error)));
            }
        }
        Ok(())
    }

    /// Marks the form as gone. A mutation still in flight completes without
    /// touching state or invoking callbacks.
    pub fn unmount(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "unmounting form")?;
        if state.mounted {
            debug!(form_id = state.id.0, "unmounted form");
        }
        state.mounted = false;
        Ok(())
    }

    pub fn reset_to_initial(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        if is_in_flight(state.submit_state) {
            return Err(FormError::AlreadySubmitting);
        }
        state.values = state.initial_values.clone();
        state.errors.clear();
        Ok(())
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        write_lock(&self.state, "clearing all field errors")?
            .errors
            .clear();
        Ok(())
    }

    fn finish_submit(&self, outcome: SubmitState, errors: Option<FieldErrors>) -> FormResult<()> {
        let mut state = write_lock(&self.state, "completing submit")?;
        transition_submit_state(&mut state, outcome)?;
        if let Some(errors) = errors {
            state.errors = errors;
        }
        transition_submit_state(&mut state, SubmitState::Idle)
    }

    fn revalidate_field(&self, key: &FieldKey, values: &FormValues) -> FormResult<()> {
        let message = match self.config.schema.validate(values) {
            Ok(mut errors) => errors.remove(key.as_str()),
            Err(error) => {
                warn!(field = %key, %error, "live validation failed");
                return Ok(());
            }
        };

        let mut state = write_lock(&self.state, "writing live validation result")?;
        if state.values.get(key.as_str()) != values.get(key.as_str()) {
            return Ok(());
        }
        match message {
            Some(message) => state.errors.insert(key.clone(), message),
            None => {
                state.errors.remove(key.as_str());
            }
        }
        Ok(())
    }
}

/// Returns the form to idle if a submit future is dropped before it finishes.
/// No callback fires for a cancelled submit.
struct SubmitGuard {
    state: Arc<RwLock<FormState>>,
    id: FormId,
    armed: bool,
}

impl SubmitGuard {
    fn new(state: &Arc<RwLock<FormState>>, id: FormId) -> Self {
        Self {
            state: state.clone(),
            id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if is_in_flight(state.submit_state) {
            debug!(form_id = self.id.0, from = ?state.submit_state, "submit cancelled");
            state.submit_state = SubmitState::Idle;
        }
    }
}

pub(super) fn is_in_flight(submit_state: SubmitState) -> bool {
    matches!(
        submit_state,
        SubmitState::Validating | SubmitState::Submitting
    )
}

pub(super) fn transition_submit_state(
    state: &mut FormState,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Idle)
            | (SubmitState::Failed, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    debug!(form_id = state.id.0, from = ?current, to = ?next, "submit state transition");
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
