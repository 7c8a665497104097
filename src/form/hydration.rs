use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_timer::Delay;
use tracing::debug;

use super::controller::{FormConfig, FormController, FormResult};
use super::value::FormValues;

/// One observation of the hydration query.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryResult {
    pub loading: bool,
    pub data: Option<FormValues>,
}

impl QueryResult {
    pub fn loading() -> Self {
        Self {
            loading: true,
            data: None,
        }
    }

    pub fn ready(data: Option<FormValues>) -> Self {
        Self {
            loading: false,
            data,
        }
    }
}

pub type BoxedQueryFuture<'a> = Pin<Box<dyn Future<Output = QueryResult> + Send + 'a>>;

pub trait HydrationSource: Send + Sync {
    type Fut<'a>: Future<Output = QueryResult> + Send + 'a
    where
        Self: 'a;

    fn fetch(&self) -> Self::Fut<'_>;
}

impl<F> HydrationSource for F
where
    F: Fn() -> BoxedQueryFuture<'static> + Send + Sync,
{
    type Fut<'a>
        = BoxedQueryFuture<'static>
    where
        Self: 'a;

    fn fetch(&self) -> Self::Fut<'_> {
        (self)()
    }
}

#[derive(Clone)]
pub enum MountStatus {
    /// Hydration is still loading; nothing may be bound yet.
    Pending,
    Mounted(FormController),
}

impl MountStatus {
    pub fn controller(&self) -> Option<&FormController> {
        match self {
            MountStatus::Pending => None,
            MountStatus::Mounted(controller) => Some(controller),
        }
    }
}

/// Defers creating a form until its hydration query stops loading.
///
/// Dropping the mount unmounts the form it created.
pub struct FormMount {
    config: FormConfig,
    controller: Option<FormController>,
}

impl FormMount {
    pub fn new(config: FormConfig) -> Self {
        Self {
            config,
            controller: None,
        }
    }

    /// Initializes the form on the first non-loading result; later results
    /// are ignored and return the existing form.
    pub fn observe(&mut self, result: QueryResult) -> MountStatus {
        if self.controller.is_none() && result.loading {
            debug!(form_name = self.config.options.form_name.as_deref(), "hydration pending");
            return MountStatus::Pending;
        }
        MountStatus::Mounted(self.mount_with(result.data))
    }

    /// Mounts from the schema's model without a hydration query.
    pub fn mount(&mut self) -> FormController {
        self.mount_with(None)
    }

    fn mount_with(&mut self, hydrated: Option<FormValues>) -> FormController {
        if let Some(controller) = &self.controller {
            return controller.clone();
        }
        let controller = FormController::initialize(self.config.clone(), hydrated);
        self.controller = Some(controller.clone());
        controller
    }

    /// Polls `source` until it stops loading, waiting `interval` between
    /// loading results.
    pub async fn hydrate<S>(&mut self, source: &S, interval: Duration) -> FormController
    where
        S: HydrationSource,
    {
        loop {
            let result = source.fetch().await;
            if let MountStatus::Mounted(controller) = self.observe(result) {
                return controller;
            }
            if !interval.is_zero() {
                Delay::new(interval).await;
            }
        }
    }

    pub fn controller(&self) -> Option<&FormController> {
        self.controller.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.controller.is_some()
    }

    pub fn unmount(&mut self) -> FormResult<()> {
        match self.controller.take() {
            Some(controller) => controller.unmount(),
            None => Ok(()),
        }
    }
}

impl Drop for FormMount {
    fn drop(&mut self) {
        drop(self.unmount());
    }
}
