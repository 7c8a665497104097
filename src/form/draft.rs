use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::SharedString;

use super::controller::{FormController, FormError, FormResult, is_in_flight, write_lock};
use super::value::FormValues;

/// Cache for in-progress form values, keyed by form name.
pub trait FormDraftStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save(&self, form_name: &str, values: &FormValues) -> Result<(), Self::Error>;
    fn load(&self, form_name: &str) -> Result<Option<FormValues>, Self::Error>;
    fn clear(&self, form_name: &str) -> Result<(), Self::Error>;
}

#[derive(Clone, Default)]
pub struct InMemoryDraftStore {
    state: Arc<RwLock<BTreeMap<SharedString, FormValues>>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormDraftStore for InMemoryDraftStore {
    type Error = Infallible;

    fn save(&self, form_name: &str, values: &FormValues) -> Result<(), Self::Error> {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.insert(form_name.into(), values.clone());
        Ok(())
    }

    fn load(&self, form_name: &str) -> Result<Option<FormValues>, Self::Error> {
        let state = match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(state.get(form_name).cloned())
    }

    fn clear(&self, form_name: &str) -> Result<(), Self::Error> {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.remove(form_name);
        Ok(())
    }
}

impl FormController {
    pub fn save_draft<S>(&self, store: &S) -> FormResult<()>
    where
        S: FormDraftStore,
    {
        let form_name = self.draft_name()?;
        let values = self.values()?;
        store
            .save(&form_name, &values)
            .map_err(|error| FormError::DraftSaveFailed(error.to_string()))
    }

    /// Applies a cached draft. Only fields the form knows are taken; errors are
    /// cleared. Returns whether a draft was found.
    pub fn load_draft<S>(&self, store: &S) -> FormResult<bool>
    where
        S: FormDraftStore,
    {
        let form_name = self.draft_name()?;
        let Some(draft) = store
            .load(&form_name)
            .map_err(|error| FormError::DraftLoadFailed(error.to_string()))?
        else {
            return Ok(false);
        };

        let mut state = write_lock(&self.state, "loading draft into form")?;
        if !state.mounted {
            return Err(FormError::Unmounted);
        }
        if is_in_flight(state.submit_state) {
            return Err(FormError::AlreadySubmitting);
        }
        let mut applied = 0usize;
        for (key, value) in draft {
            if let Some(slot) = state.values.get_mut(key.as_str()) {
                *slot = value;
                applied += 1;
            }
        }
        state.errors.clear();
        debug!(form_name = %form_name, applied, "loaded form draft");
        Ok(true)
    }

    pub fn clear_draft<S>(&self, store: &S) -> FormResult<()>
    where
        S: FormDraftStore,
    {
        let form_name = self.draft_name()?;
        store
            .clear(&form_name)
            .map_err(|error| FormError::DraftClearFailed(error.to_string()))
    }

    fn draft_name(&self) -> FormResult<SharedString> {
        self.config
            .options
            .form_name
            .clone()
            .ok_or(FormError::MissingFormName)
    }
}
