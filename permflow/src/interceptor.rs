//! Interceptor and callback hooks
//!
//! The interceptor sits between the request cycle and the host. Its start hook
//! drives the prompts (the default delegates to the orchestrator's dispatch);
//! its end hook receives the final classification and forwards it to the
//! caller's callback.

use async_trait::async_trait;
use permflow_api::RequestCode;

use crate::description::PermissionDescription;
use crate::host::RequestHost;
use crate::orchestrator::{self, DispatchPlan};
use crate::permission::Permission;
use crate::platform::Platform;
use crate::resolution::Resolution;

/// Receives the final classification of a request cycle
pub trait PermissionCallback: Send {
    fn on_result(&mut self, granted: &[Permission], denied: &[Permission]);
}

impl<F> PermissionCallback for F
where
    F: FnMut(&[Permission], &[Permission]) + Send,
{
    fn on_result(&mut self, granted: &[Permission], denied: &[Permission]) {
        self(granted, denied)
    }
}

/// Everything the start hook needs to drive one cycle
#[derive(Clone, Copy)]
pub struct RequestStart<'a> {
    pub host: &'a dyn RequestHost,
    pub platform: &'a dyn Platform,
    /// Batch after legacy substitution
    pub permissions: &'a [Permission],
    pub plan: DispatchPlan,
    pub description: &'a dyn PermissionDescription,
    pub request_code: RequestCode,
}

/// Final state handed to the end hook
#[derive(Clone, Copy)]
pub struct RequestEnd<'a> {
    pub host: &'a dyn RequestHost,
    pub platform: &'a dyn Platform,
    /// Whether nothing was denied
    pub all_granted: bool,
    /// Batch as submitted by the caller
    pub original: &'a [Permission],
    pub granted: &'a [Permission],
    pub denied: &'a [Permission],
}

/// Hooks around the dispatch of a request cycle
///
/// A fresh instance is created for every cycle, so implementations may keep
/// per-cycle state in fields.
#[async_trait]
pub trait PermissionInterceptor: Send + Sync {
    /// Drive prompts and settings pages
    ///
    /// Returns the final classification, or `None` when the host became
    /// unusable and the cycle must be discarded.
    async fn on_start(&self, start: RequestStart<'_>) -> Option<Resolution> {
        orchestrator::dispatch(&start).await
    }

    /// Deliver the classification
    fn on_end(&self, end: &RequestEnd<'_>, callback: Option<&mut dyn PermissionCallback>) {
        if let Some(callback) = callback {
            callback.on_result(end.granted, end.denied);
        }
    }
}

/// Dispatches through the orchestrator and forwards the result unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInterceptor;

impl PermissionInterceptor for DefaultInterceptor {}
