use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::SharedString;

use super::model::{FormModel, ModelError};
use super::schema::SchemaError;
use super::value::{FieldErrors, FormValues};

pub type BoxedMutationFuture = Pin<Box<dyn Future<Output = Result<(), MutationError>> + Send>>;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("{message}")]
pub struct MutationError {
    message: String,
}

impl MutationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Payload handed to the mutation collaborator on submit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MutationRequest {
    pub input_shape: SharedString,
    pub input: FormValues,
}

impl MutationRequest {
    pub fn decode<T: FormModel>(&self) -> Result<T, ModelError> {
        T::from_values(&self.input)
    }
}

pub trait MutationExecutor: Send + Sync {
    fn execute(&self, request: MutationRequest) -> BoxedMutationFuture;
}

impl<F> MutationExecutor for F
where
    F: Fn(MutationRequest) -> BoxedMutationFuture + Send + Sync,
{
    fn execute(&self, request: MutationRequest) -> BoxedMutationFuture {
        (self)(request)
    }
}

#[derive(Clone)]
pub struct FormMutation {
    input_shape: SharedString,
    executor: Arc<dyn MutationExecutor>,
}

impl FormMutation {
    pub fn new(input_shape: impl Into<SharedString>, executor: impl MutationExecutor + 'static) -> Self {
        Self {
            input_shape: input_shape.into(),
            executor: Arc::new(executor),
        }
    }

    pub fn from_async<F, Fut>(input_shape: impl Into<SharedString>, executor: F) -> Self
    where
        F: Fn(MutationRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), MutationError>> + Send + 'static,
    {
        Self::new(
            input_shape,
            move |request: MutationRequest| -> BoxedMutationFuture { Box::pin(executor(request)) },
        )
    }

    pub fn input_shape(&self) -> &str {
        &self.input_shape
    }

    pub(super) fn execute(&self, input: FormValues) -> BoxedMutationFuture {
        self.executor.execute(MutationRequest {
            input_shape: self.input_shape.clone(),
            input,
        })
    }
}

/// Reason delivered to `on_error`.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum SubmitError {
    #[error("mutation failed: {0}")]
    Mutation(#[from] MutationError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result of one submit attempt. Handed to the matching callback and dropped.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SubmitOutcome {
    Success,
    Error(SubmitError),
    ValidationFailure(FieldErrors),
}

type SuccessHandler = Arc<dyn Fn() + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(&SubmitError) + Send + Sync>;
type ErrorMessageHandler = Arc<dyn Fn(&FieldErrors) + Send + Sync>;

#[derive(Clone, Default)]
pub struct FormCallbacks {
    on_success: Option<SuccessHandler>,
    on_error: Option<ErrorHandler>,
    on_error_message: Option<ErrorMessageHandler>,
}

impl FormCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl Fn(&SubmitError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Receives the full error mapping; choosing which message to surface is
    /// left to the handler.
    pub fn on_error_message(
        mut self,
        handler: impl Fn(&FieldErrors) + Send + Sync + 'static,
    ) -> Self {
        self.on_error_message = Some(Arc::new(handler));
        self
    }

    pub(super) fn dispatch(&self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Success => {
                if let Some(handler) = &self.on_success {
                    handler();
                }
            }
            SubmitOutcome::Error(reason) => {
                if let Some(handler) = &self.on_error {
                    handler(&reason);
                }
            }
            SubmitOutcome::ValidationFailure(errors) => {
                if let Some(handler) = &self.on_error_message {
                    handler(&errors);
                }
            }
        }
    }
}
