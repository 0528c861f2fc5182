//! Public request builder
//!
//! # Example
//!
//! ```ignore
//! use permflow::{catalog, PermissionRequest};
//!
//! let outcome = PermissionRequest::with_host(&platform, &host)
//!     .add_permission(catalog::camera())
//!     .add_permission(catalog::record_audio())
//!     .execute(|granted: &[Permission], denied: &[Permission]| {
//!         println!("granted {granted:?}, denied {denied:?}");
//!     })
//!     .await?;
//! ```

use permflow_api::{ManifestSnapshot, RequestCode};

use crate::batch::PermissionBatch;
use crate::config;
use crate::description::PermissionDescription;
use crate::error::Result;
use crate::host::RequestHost;
use crate::interceptor::{PermissionCallback, PermissionInterceptor};
use crate::orchestrator::{CycleOutcome, RequestCycle};
use crate::permission::Permission;
use crate::platform::Platform;

/// Builder for one request cycle against one host
pub struct PermissionRequest<'a> {
    platform: &'a dyn Platform,
    host: &'a dyn RequestHost,
    batch: PermissionBatch,
    interceptor: Option<Box<dyn PermissionInterceptor>>,
    description: Option<Box<dyn PermissionDescription>>,
    compliance_disabled: bool,
    manifest: Option<&'a ManifestSnapshot>,
    request_code: Option<u32>,
}

impl<'a> PermissionRequest<'a> {
    /// Start a request bound to `host`
    pub fn with_host(platform: &'a dyn Platform, host: &'a dyn RequestHost) -> Self {
        Self {
            platform,
            host,
            batch: PermissionBatch::new(),
            interceptor: None,
            description: None,
            compliance_disabled: false,
            manifest: None,
            request_code: None,
        }
    }

    /// Add a right; a repeated right moves to the end
    pub fn add_permission(mut self, permission: Permission) -> Self {
        self.batch.push(permission);
        self
    }

    pub fn add_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.batch.extend(permissions);
        self
    }

    /// Use this interceptor instead of the global factory
    pub fn interceptor(mut self, interceptor: impl PermissionInterceptor + 'static) -> Self {
        self.interceptor = Some(Box::new(interceptor));
        self
    }

    /// Use this description provider instead of the global factory
    pub fn description(mut self, description: impl PermissionDescription + 'static) -> Self {
        self.description = Some(Box::new(description));
        self
    }

    /// Skip compliance checks for this request only
    pub fn disable_compliance_mode(mut self) -> Self {
        self.compliance_disabled = true;
        self
    }

    /// Declarations checked by the compliance checker
    pub fn manifest(mut self, manifest: &'a ManifestSnapshot) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Code used for prompts and settings pages (1..=65535)
    pub fn request_code(mut self, request_code: u32) -> Self {
        self.request_code = Some(request_code);
        self
    }

    pub fn permissions(&self) -> &[Permission] {
        self.batch.as_slice()
    }

    /// Run the cycle and deliver the classification to `callback`
    ///
    /// The callback is invoked at most once; never when the cycle is
    /// discarded or a configuration error is returned.
    pub async fn execute(self, mut callback: impl PermissionCallback) -> Result<CycleOutcome> {
        self.run(Some(&mut callback)).await
    }

    /// Run the cycle without a callback
    pub async fn execute_silently(self) -> Result<CycleOutcome> {
        self.run(None).await
    }

    async fn run(self, callback: Option<&mut dyn PermissionCallback>) -> Result<CycleOutcome> {
        let request_code = self
            .request_code
            .map(RequestCode::new)
            .transpose()?
            .unwrap_or_default();
        let compliance = !self.compliance_disabled && config::is_compliance_enabled(self.platform);
        let interceptor = self.interceptor.unwrap_or_else(config::interceptor);
        let description = self.description.unwrap_or_else(config::description);

        let outcome = RequestCycle::new(
            self.platform,
            self.host,
            self.batch.into_vec(),
            interceptor,
            description,
        )
        .with_compliance(compliance)
        .with_manifest(self.manifest)
        .with_request_code(request_code)
        .run(callback)
        .await?;
        Ok(outcome)
    }
}
