//! # permflow: runtime permission resolution and request orchestration
//!
//! Decides, for a batch of mobile runtime rights, which are already held, how
//! each missing one must be obtained (runtime prompt, settings page, or
//! automatic grant), and in which order and timing the host should ask.
//!
//! ## Core Principles
//!
//! - **Descriptors own the branching**: every right is a type; OS-version and
//!   vendor quirks live inside it
//! - **Fail early on integration mistakes**: compliance errors name the exact
//!   fix before any prompt is shown
//! - **Fixed order**: foreground prompts, then background prompts, then
//!   settings pages
//! - **Host agnostic**: the engine drives a [`RequestHost`], it never renders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use permflow::{catalog, Permission, PermissionRequest};
//!
//! let outcome = PermissionRequest::with_host(&platform, &host)
//!     .add_permission(catalog::access_fine_location())
//!     .add_permission(catalog::access_background_location())
//!     .execute(|granted: &[Permission], denied: &[Permission]| {
//!         if denied.is_empty() {
//!             start_tracking();
//!         }
//!     })
//!     .await?;
//! ```
//!
//! ## Static queries
//!
//! ```rust
//! use permflow::{catalog, is_granted, platform::MemoryPlatform};
//! use permflow_api::version;
//!
//! let platform = MemoryPlatform::new(version::ANDROID_13).with_granted(catalog::names::CAMERA);
//! assert!(is_granted(&platform, &catalog::camera()));
//! assert!(!is_granted(&platform, &catalog::record_audio()));
//! ```

pub mod batch;
pub mod catalog;
pub mod compliance;
pub mod config;
pub mod description;
pub mod error;
pub mod host;
pub mod interceptor;
pub mod orchestrator;
pub mod permission;
pub mod platform;
pub mod request;
pub mod resolution;
pub mod settings;

#[cfg(feature = "subscriber")]
pub mod tracing_support;

pub use permflow_api as api;

// Re-export commonly used items
pub use batch::PermissionBatch;
pub use catalog::PermissionCatalog;
pub use config::{ComplianceMode, EngineConfig};
pub use description::{DefaultDescription, PermissionDescription, StaticDescription};
pub use error::{ConfigurationError, Error, HostError, Result};
pub use host::RequestHost;
pub use interceptor::{DefaultInterceptor, PermissionCallback, PermissionInterceptor};
pub use orchestrator::{CycleOutcome, CycleState};
pub use permission::{Permission, PermissionDescriptor, PermissionName};
pub use platform::Platform;
pub use request::PermissionRequest;
pub use resolution::Resolution;

// Static helpers
pub use permission::{contains_permission, equals_permission, is_health_permission};
pub use resolution::{
    contains_settings_page, get_denied, get_granted, is_granted, is_granted_all,
    is_permanently_denied, is_permanently_denied_any,
};
pub use settings::{open_settings, open_settings_with_callback};

#[cfg(feature = "subscriber")]
pub use tracing_support::{init_subscriber, init_subscriber_with_config, TracingConfig, TracingFormat};
