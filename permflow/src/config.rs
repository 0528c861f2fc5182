//! Global configuration
//!
//! Process-wide defaults read by every request cycle: the compliance mode and
//! the factories producing the interceptor and the description provider.
//! Set them once at start-up, before the first request cycle begins.
//!
//! # Example
//!
//! ```
//! use permflow::config::{ComplianceMode, EngineConfig};
//!
//! EngineConfig::builder()
//!     .compliance_mode(ComplianceMode::Enabled)
//!     .build()
//!     .install();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::description::{DefaultDescription, PermissionDescription};
use crate::interceptor::{DefaultInterceptor, PermissionInterceptor};
use crate::platform::Platform;

/// Produces a fresh interceptor for each request cycle
pub type InterceptorFactory = Arc<dyn Fn() -> Box<dyn PermissionInterceptor> + Send + Sync>;

/// Produces a fresh description provider for each request cycle
pub type DescriptionFactory = Arc<dyn Fn() -> Box<dyn PermissionDescription> + Send + Sync>;

/// When the compliance checker runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceMode {
    /// Enabled for debug builds, decided on first use
    #[default]
    Auto,
    Enabled,
    Disabled,
}

// ============================================================================
// Global state
// ============================================================================

struct GlobalState {
    compliance_mode: ComplianceMode,
    /// `Auto` resolved against the first platform that asked
    resolved_auto: Option<bool>,
    interceptor: Option<InterceptorFactory>,
    description: Option<DescriptionFactory>,
}

impl GlobalState {
    const fn new() -> Self {
        Self {
            compliance_mode: ComplianceMode::Auto,
            resolved_auto: None,
            interceptor: None,
            description: None,
        }
    }

    fn compliance_enabled(&mut self, debug_build: bool) -> bool {
        match self.compliance_mode {
            ComplianceMode::Enabled => true,
            ComplianceMode::Disabled => false,
            ComplianceMode::Auto => *self.resolved_auto.get_or_insert(debug_build),
        }
    }
}

static GLOBAL: RwLock<GlobalState> = RwLock::new(GlobalState::new());

fn read() -> RwLockReadGuard<'static, GlobalState> {
    GLOBAL.read().unwrap_or_else(|e| e.into_inner())
}

fn write() -> RwLockWriteGuard<'static, GlobalState> {
    GLOBAL.write().unwrap_or_else(|e| e.into_inner())
}

/// Set the process-wide compliance mode
pub fn set_compliance_mode(mode: ComplianceMode) {
    let mut state = write();
    state.compliance_mode = mode;
    state.resolved_auto = None;
}

/// Configured compliance mode, before `Auto` is resolved
pub fn compliance_mode() -> ComplianceMode {
    read().compliance_mode
}

/// Whether request cycles should run the compliance checker
///
/// `Auto` is decided from the debug-build flag of the first platform that
/// asks, then kept for the rest of the process.
pub fn is_compliance_enabled(platform: &dyn Platform) -> bool {
    {
        let state = read();
        match (state.compliance_mode, state.resolved_auto) {
            (ComplianceMode::Enabled, _) => return true,
            (ComplianceMode::Disabled, _) => return false,
            (ComplianceMode::Auto, Some(resolved)) => return resolved,
            (ComplianceMode::Auto, None) => {}
        }
    }
    let debug_build = platform.is_debug_build();
    write().compliance_enabled(debug_build)
}

/// Set the process-wide interceptor factory
pub fn set_interceptor_factory<F>(factory: F)
where
    F: Fn() -> Box<dyn PermissionInterceptor> + Send + Sync + 'static,
{
    write().interceptor = Some(Arc::new(factory));
}

/// Set the process-wide description factory
pub fn set_description_factory<F>(factory: F)
where
    F: Fn() -> Box<dyn PermissionDescription> + Send + Sync + 'static,
{
    write().description = Some(Arc::new(factory));
}

/// A fresh interceptor from the configured factory
pub fn interceptor() -> Box<dyn PermissionInterceptor> {
    let factory = read().interceptor.clone();
    match factory {
        Some(factory) => factory(),
        None => Box::new(DefaultInterceptor),
    }
}

/// A fresh description provider from the configured factory
pub fn description() -> Box<dyn PermissionDescription> {
    let factory = read().description.clone();
    match factory {
        Some(factory) => factory(),
        None => Box::new(DefaultDescription),
    }
}

/// Restore every global to its initial value
pub fn reset_global_config() {
    *write() = GlobalState::new();
}

// ============================================================================
// Engine config bundle
// ============================================================================

/// All global settings as one value
#[derive(Clone, Default)]
pub struct EngineConfig {
    pub compliance_mode: ComplianceMode,
    pub interceptor: Option<InterceptorFactory>,
    pub description: Option<DescriptionFactory>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("compliance_mode", &self.compliance_mode)
            .field("interceptor", &self.interceptor.is_some())
            .field("description", &self.description.is_some())
            .finish()
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Compliance checks always on
    pub fn development() -> Self {
        Self {
            compliance_mode: ComplianceMode::Enabled,
            ..Self::default()
        }
    }

    /// Compliance checks always off
    pub fn release() -> Self {
        Self {
            compliance_mode: ComplianceMode::Disabled,
            ..Self::default()
        }
    }

    /// Publish as the global configuration
    ///
    /// Unset factories fall back to the defaults.
    pub fn install(self) {
        let mut state = write();
        state.compliance_mode = self.compliance_mode;
        state.resolved_auto = None;
        state.interceptor = self.interceptor;
        state.description = self.description;
        tracing::debug!(compliance_mode = ?state.compliance_mode, "Installed engine config");
    }
}

/// Builder for [`EngineConfig`]
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn compliance_mode(mut self, mode: ComplianceMode) -> Self {
        self.config.compliance_mode = mode;
        self
    }

    pub fn interceptor<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn PermissionInterceptor> + Send + Sync + 'static,
    {
        self.config.interceptor = Some(Arc::new(factory));
        self
    }

    pub fn description<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn PermissionDescription> + Send + Sync + 'static,
    {
        self.config.description = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
