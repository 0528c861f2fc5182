//! Platform context abstraction
//!
//! Everything a descriptor needs to know about the running system goes through
//! [`Platform`]: API levels, vendor fork, grant state, app-op modes, special
//! access switches and capability probes. Probes are tri-state instead of
//! reflective lookups; [`Support::Unknown`] is always read as unsupported.

use permflow_api::{version, DeviceOs, ManifestSnapshot};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Result of a capability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Support {
    Supported,
    Unsupported,
    /// The platform could not answer
    #[default]
    Unknown,
}

impl Support {
    /// `Unknown` counts as unsupported
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Supported)
    }
}

/// A question about what the running system offers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CapabilityProbe {
    /// The named right exists and has dangerous protection level
    DangerousPermissionDefined(String),
    /// The vendor app-op with this field name exists
    AppOpDefined(String),
    /// The secure setting with this key is set to 1
    SecureSettingEnabled(String),
}

/// App-op mode of an operation for the calling package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpMode {
    Allowed,
    Ignored,
    Errored,
    Default,
    /// The op could not be checked
    #[default]
    Unknown,
}

/// Special access switches that are toggled on settings pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialAccess {
    NotificationPolicy,
    NotificationsEnabled,
    DrawOverlays,
    WriteSettings,
    ExternalStorageManager,
    InstallPackages,
    ScheduleExactAlarms,
}

/// Read-only view of the running system
///
/// Implemented by the host platform binding. All methods must be cheap and
/// side-effect free; they are called repeatedly during one request cycle.
pub trait Platform: Send + Sync {
    /// API level of the running system
    fn sdk_version(&self) -> u32;

    /// Target API level the application was built against
    fn target_sdk_version(&self) -> u32;

    /// Minimum API level the application supports, when the system reports it
    fn min_sdk_version(&self) -> Option<u32>;

    /// Vendor fork of the running system
    fn device_os(&self) -> DeviceOs;

    /// Package name of the application
    fn package_name(&self) -> &str;

    /// Whether the application is a debuggable build
    fn is_debug_build(&self) -> bool;

    /// Whether the named right is currently held
    fn check_self_permission(&self, name: &str) -> bool;

    /// Whether the system would show a rationale for the named right
    fn should_show_rationale(&self, name: &str) -> bool;

    /// App-op mode for an op name or vendor op field
    fn app_op_mode(&self, op: &str) -> OpMode;

    /// State of a special access switch, `None` when it cannot be determined
    fn special_access(&self, access: SpecialAccess) -> Option<bool>;

    /// Answer a capability probe
    fn probe(&self, probe: &CapabilityProbe) -> Support;
}

/// Check an app-op, answering `default_granted` when the mode is unknown
pub fn check_op(platform: &dyn Platform, op: &str, default_granted: bool) -> bool {
    match platform.app_op_mode(op) {
        OpMode::Unknown => default_granted,
        mode => mode == OpMode::Allowed,
    }
}

/// Effective minimum API level of the application
///
/// The system value wins; the manifest `<uses-sdk>` is the fallback and
/// Android 4.2 the floor.
pub fn min_sdk_version(platform: &dyn Platform, manifest: Option<&ManifestSnapshot>) -> u32 {
    platform
        .min_sdk_version()
        .or_else(|| manifest.and_then(|m| m.uses_sdk).map(|sdk| sdk.min_sdk_version))
        .unwrap_or(version::ANDROID_4_2)
}

// ============================================================================
// In-memory platform
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    sdk_version: u32,
    target_sdk_version: u32,
    min_sdk_version: Option<u32>,
    device_os: DeviceOs,
    debug_build: bool,
    granted: HashSet<String>,
    rationale: HashSet<String>,
    ops: HashMap<String, OpMode>,
    special: HashMap<SpecialAccess, bool>,
    probes: HashMap<CapabilityProbe, Support>,
}

/// In-memory platform with scripted state
///
/// Useful for host-side tests and simulations. Grants can be changed while a
/// request cycle is running, which is how [`crate::host::RecordingHost`]
/// answers prompts.
#[derive(Debug)]
pub struct MemoryPlatform {
    package_name: String,
    state: RwLock<MemoryState>,
}

impl MemoryPlatform {
    /// Stock system at `sdk_version`, targeting the same level, debug build
    pub fn new(sdk_version: u32) -> Self {
        Self {
            package_name: "com.example.app".to_string(),
            state: RwLock::new(MemoryState {
                sdk_version,
                target_sdk_version: sdk_version,
                debug_build: true,
                ..MemoryState::default()
            }),
        }
    }

    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    pub fn with_target_sdk(self, target_sdk_version: u32) -> Self {
        self.write().target_sdk_version = target_sdk_version;
        self
    }

    pub fn with_min_sdk(self, min_sdk_version: u32) -> Self {
        self.write().min_sdk_version = Some(min_sdk_version);
        self
    }

    pub fn with_device_os(self, device_os: DeviceOs) -> Self {
        self.write().device_os = device_os;
        self
    }

    pub fn with_debug_build(self, debug_build: bool) -> Self {
        self.write().debug_build = debug_build;
        self
    }

    pub fn with_granted(self, name: impl Into<String>) -> Self {
        self.grant(name);
        self
    }

    pub fn with_probe(self, probe: CapabilityProbe, support: Support) -> Self {
        self.write().probes.insert(probe, support);
        self
    }

    pub fn with_op_mode(self, op: impl Into<String>, mode: OpMode) -> Self {
        self.write().ops.insert(op.into(), mode);
        self
    }

    pub fn with_special_access(self, access: SpecialAccess, enabled: bool) -> Self {
        self.set_special_access(access, enabled);
        self
    }

    /// Mark a right as held
    pub fn grant(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.write();
        state.rationale.remove(&name);
        state.granted.insert(name);
    }

    /// Mark a right as not held
    pub fn revoke(&self, name: &str) {
        self.write().granted.remove(name);
    }

    /// Set whether a rationale would be shown for a right
    pub fn set_rationale(&self, name: impl Into<String>, show: bool) {
        let name = name.into();
        let mut state = self.write();
        if show {
            state.rationale.insert(name);
        } else {
            state.rationale.remove(&name);
        }
    }

    pub fn set_special_access(&self, access: SpecialAccess, enabled: bool) {
        self.write().special.insert(access, enabled);
    }

    pub fn set_op_mode(&self, op: impl Into<String>, mode: OpMode) {
        self.write().ops.insert(op.into(), mode);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Platform for MemoryPlatform {
    fn sdk_version(&self) -> u32 {
        self.read().sdk_version
    }

    fn target_sdk_version(&self) -> u32 {
        self.read().target_sdk_version
    }

    fn min_sdk_version(&self) -> Option<u32> {
        self.read().min_sdk_version
    }

    fn device_os(&self) -> DeviceOs {
        self.read().device_os.clone()
    }

    fn package_name(&self) -> &str {
        &self.package_name
    }

    fn is_debug_build(&self) -> bool {
        self.read().debug_build
    }

    fn check_self_permission(&self, name: &str) -> bool {
        self.read().granted.contains(name)
    }

    fn should_show_rationale(&self, name: &str) -> bool {
        self.read().rationale.contains(name)
    }

    fn app_op_mode(&self, op: &str) -> OpMode {
        self.read().ops.get(op).copied().unwrap_or_default()
    }

    fn special_access(&self, access: SpecialAccess) -> Option<bool> {
        self.read().special.get(&access).copied()
    }

    fn probe(&self, probe: &CapabilityProbe) -> Support {
        self.read().probes.get(probe).copied().unwrap_or_default()
    }
}
