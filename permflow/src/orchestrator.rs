//! Request orchestrator
//!
//! A request cycle moves through
//! `Idle -> Validating -> Classifying -> (AlreadySatisfied | Dispatching) -> Completed`,
//! with `Discarded` as the terminal state when the host is unusable before the
//! fast path or goes away mid-cycle.
//! Configuration errors abort in `Validating` before the host is touched.

use permflow_api::{ManifestSnapshot, PermissionChannel, RequestCode};
use std::time::Duration;
use tracing::Instrument;

use crate::compliance::ComplianceChecker;
use crate::description::PermissionDescription;
use crate::error::{ConfigurationError, HostError};
use crate::host::RequestHost;
use crate::interceptor::{PermissionCallback, PermissionInterceptor, RequestEnd, RequestStart};
use crate::permission::Permission;
use crate::platform::Platform;
use crate::resolution::{self, Resolution};
use crate::settings::SettingsNavigator;

/// How often grant state is re-read while waiting after a settings page
const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// State of a request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleState {
    Idle,
    Validating,
    Classifying,
    /// Everything was already held; nothing was shown
    AlreadySatisfied,
    Dispatching,
    /// Classification delivered
    Completed,
    /// Host became unusable; nothing delivered
    Discarded,
}

impl CycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::AlreadySatisfied | Self::Completed | Self::Discarded)
    }
}

/// Terminal state of a cycle and, when delivered, its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub state: CycleState,
    pub resolution: Option<Resolution>,
}

impl CycleOutcome {
    fn discarded() -> Self {
        Self {
            state: CycleState::Discarded,
            resolution: None,
        }
    }

    pub fn is_discarded(&self) -> bool {
        self.state == CycleState::Discarded
    }

    /// Whether a classification was delivered and nothing was denied
    pub fn all_granted(&self) -> bool {
        self.resolution.as_ref().is_some_and(Resolution::all_granted)
    }
}

/// Timing computed for a batch before dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchPlan {
    /// Pause between dependent prompt groups
    pub request_interval: Duration,
    /// Longest wait for a settings switch to become observable
    pub result_wait: Duration,
}

impl DispatchPlan {
    pub fn for_batch(platform: &dyn Platform, permissions: &[Permission]) -> Self {
        Self {
            request_interval: resolution::max_request_interval(platform, permissions),
            result_wait: resolution::max_result_wait(platform, permissions),
        }
    }
}

// ============================================================================
// Request cycle
// ============================================================================

/// One run of the state machine against one host
pub struct RequestCycle<'a> {
    platform: &'a dyn Platform,
    host: &'a dyn RequestHost,
    batch: Vec<Permission>,
    compliance: bool,
    manifest: Option<&'a ManifestSnapshot>,
    interceptor: Box<dyn PermissionInterceptor>,
    description: Box<dyn PermissionDescription>,
    request_code: RequestCode,
    state: CycleState,
}

impl<'a> RequestCycle<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        host: &'a dyn RequestHost,
        batch: Vec<Permission>,
        interceptor: Box<dyn PermissionInterceptor>,
        description: Box<dyn PermissionDescription>,
    ) -> Self {
        Self {
            platform,
            host,
            batch,
            compliance: false,
            manifest: None,
            interceptor,
            description,
            request_code: RequestCode::DEFAULT,
            state: CycleState::Idle,
        }
    }

    pub fn with_compliance(mut self, compliance: bool) -> Self {
        self.compliance = compliance;
        self
    }

    pub fn with_manifest(mut self, manifest: Option<&'a ManifestSnapshot>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_request_code(mut self, request_code: RequestCode) -> Self {
        self.request_code = request_code;
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Run to a terminal state
    ///
    /// The callback is invoked at most once, and never for a discarded cycle.
    pub async fn run(
        mut self,
        callback: Option<&mut dyn PermissionCallback>,
    ) -> Result<CycleOutcome, ConfigurationError> {
        let span = tracing::info_span!(
            "request_cycle",
            request_code = %self.request_code,
            batch = self.batch.len()
        );
        async move { self.drive(callback).await }.instrument(span).await
    }

    async fn drive(
        &mut self,
        callback: Option<&mut dyn PermissionCallback>,
    ) -> Result<CycleOutcome, ConfigurationError> {
        self.transition(CycleState::Validating);
        if self.compliance {
            let mut checker = ComplianceChecker::new(self.platform);
            if let Some(manifest) = self.manifest {
                checker = checker.with_manifest(manifest);
            }
            checker.check(&self.batch)?;
        }

        self.transition(CycleState::Classifying);
        let augmented = resolution::add_legacy_permissions(self.platform, &self.batch);

        if !self.host.is_usable() {
            return Ok(self.discard());
        }

        if resolution::is_granted_all(self.platform, &augmented) {
            self.transition(CycleState::AlreadySatisfied);
            tracing::debug!("All permissions already granted");
            let end = RequestEnd {
                host: self.host,
                platform: self.platform,
                all_granted: true,
                original: &self.batch,
                granted: &augmented,
                denied: &[],
            };
            self.interceptor.on_end(&end, callback);
            return Ok(CycleOutcome {
                state: self.state,
                resolution: Some(Resolution {
                    granted: augmented,
                    denied: Vec::new(),
                }),
            });
        }

        self.transition(CycleState::Dispatching);
        let start = RequestStart {
            host: self.host,
            platform: self.platform,
            permissions: &augmented,
            plan: DispatchPlan::for_batch(self.platform, &augmented),
            description: &*self.description,
            request_code: self.request_code,
        };
        let Some(resolution) = self.interceptor.on_start(start).await else {
            return Ok(self.discard());
        };
        if !self.host.is_usable() {
            return Ok(self.discard());
        }

        self.transition(CycleState::Completed);
        tracing::info!(
            granted = resolution.granted.len(),
            denied = resolution.denied.len(),
            "Request cycle completed"
        );
        let end = RequestEnd {
            host: self.host,
            platform: self.platform,
            all_granted: resolution.all_granted(),
            original: &self.batch,
            granted: &resolution.granted,
            denied: &resolution.denied,
        };
        self.interceptor.on_end(&end, callback);

        Ok(CycleOutcome {
            state: self.state,
            resolution: Some(resolution),
        })
    }

    fn transition(&mut self, next: CycleState) {
        tracing::trace!(from = ?self.state, to = ?next, "Cycle state");
        self.state = next;
    }

    fn discard(&mut self) -> CycleOutcome {
        tracing::warn!(state = ?self.state, "Host unusable, discarding request cycle");
        self.transition(CycleState::Discarded);
        CycleOutcome::discarded()
    }
}

// ============================================================================
// Default dispatch
// ============================================================================

/// Default dispatch sequence
///
/// 1. rationale text, if the description provides one
/// 2. every foreground runtime prompt in one call
/// 3. each background right whose foreground right is now held, after the
///    request interval
/// 4. each settings-page right through the settings navigator, waiting up to
///    the result-wait delay for the switch to become observable
///
/// Returns `None` as soon as the host is unusable.
pub async fn dispatch(start: &RequestStart<'_>) -> Option<Resolution> {
    let RequestStart {
        host,
        platform,
        permissions,
        plan,
        description,
        request_code,
    } = *start;

    if !host.is_usable() {
        return None;
    }

    let mut foreground: Vec<&Permission> = Vec::new();
    let mut background: Vec<&Permission> = Vec::new();
    let mut settings: Vec<&Permission> = Vec::new();
    for permission in permissions {
        if permission.is_granted(platform, true) || !permission.is_requestable(platform) {
            continue;
        }
        match permission.channel(platform) {
            PermissionChannel::AlwaysGranted => {}
            PermissionChannel::RuntimePrompt if permission.is_background(platform) => {
                background.push(permission)
            }
            PermissionChannel::RuntimePrompt => foreground.push(permission),
            PermissionChannel::SettingsPage => settings.push(permission),
        }
    }

    let pending: Vec<Permission> = foreground
        .iter()
        .chain(background.iter())
        .chain(settings.iter())
        .map(|p| (*p).clone())
        .collect();
    if let Some(text) = description.describe(platform, &pending) {
        host.show_description(&text).await;
    }

    let mut prompted = false;
    if !foreground.is_empty() {
        prompt(host, platform, &foreground, request_code).await?;
        prompted = true;
    }

    for permission in background {
        let foreground_held = permission
            .foreground_permissions(platform)
            .iter()
            .any(|p| p.is_granted(platform, true));
        if !foreground_held {
            tracing::debug!(permission = %permission, "Skipping background permission without foreground");
            continue;
        }
        if prompted && !plan.request_interval.is_zero() {
            tokio::time::sleep(plan.request_interval).await;
        }
        prompt(host, platform, &[permission], request_code).await?;
        prompted = true;
    }

    let navigator = SettingsNavigator::new(platform, host);
    for permission in settings {
        if permission.is_granted(platform, true) {
            continue;
        }
        let destinations = permission.settings_destinations(platform, true);
        navigator.navigate(&destinations, Some(request_code)).await;
        if !host.is_usable() {
            return None;
        }
        wait_for_grant(platform, permission, plan.result_wait).await;
    }

    if !host.is_usable() {
        return None;
    }
    Some(resolution::classify(platform, permissions))
}

/// Show one runtime prompt; `None` when the host went away
async fn prompt(
    host: &dyn RequestHost,
    platform: &dyn Platform,
    permissions: &[&Permission],
    request_code: RequestCode,
) -> Option<()> {
    let mut names: Vec<String> = Vec::with_capacity(permissions.len());
    for permission in permissions {
        let name = permission.request_name(platform);
        if !names.contains(&name) {
            names.push(name);
        }
    }

    tracing::debug!(names = ?names, request_code = %request_code, "Requesting runtime permissions");
    match host.request_runtime_prompt(&names, request_code).await {
        Err(HostError::Detached) => return None,
        Err(e) => tracing::debug!(error = %e, "Runtime prompt did not complete"),
        Ok(()) => {}
    }
    host.is_usable().then_some(())
}

/// Wait until the right is observable as held, at most `wait`
async fn wait_for_grant(platform: &dyn Platform, permission: &Permission, wait: Duration) {
    let poll = async {
        while !permission.is_granted(platform, true) {
            tokio::time::sleep(RESULT_POLL_INTERVAL).await;
        }
    };
    if tokio::time::timeout(wait, poll).await.is_err() {
        tracing::debug!(permission = %permission, wait = ?wait, "Result wait elapsed");
    }
}
