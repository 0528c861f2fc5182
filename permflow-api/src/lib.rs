//! permflow-api: Shared types for the permflow permission engine
//!
//! This crate defines the data exchanged between the engine, the UI host that
//! shows prompts, and the producer of the manifest catalog snapshot. It carries
//! no behavior beyond constructors and small lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU16;
use thiserror::Error;

pub mod manifest;

pub use manifest::{
    DeclaredPermission, ManifestError, ManifestSnapshot, UsesSdk, DEFAULT_MAX_SDK_VERSION,
};

/// Platform API levels referenced by the permission catalog
pub mod version {
    pub const ANDROID_4_2: u32 = 17;
    pub const ANDROID_4_4: u32 = 19;
    pub const ANDROID_5: u32 = 21;
    pub const ANDROID_6: u32 = 23;
    pub const ANDROID_7: u32 = 24;
    pub const ANDROID_8: u32 = 26;
    pub const ANDROID_9: u32 = 28;
    pub const ANDROID_10: u32 = 29;
    pub const ANDROID_11: u32 = 30;
    pub const ANDROID_12: u32 = 31;
    pub const ANDROID_12_L: u32 = 32;
    pub const ANDROID_13: u32 = 33;
    pub const ANDROID_14: u32 = 34;
    pub const ANDROID_15: u32 = 35;
    pub const ANDROID_16: u32 = 36;
}

/// Vendor fork of the operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsKind {
    /// Stock platform behavior
    #[default]
    Stock,
    Miui,
    HyperOs,
    HarmonyOs,
    MagicOs,
    Emui,
    OneUi,
    ColorOs,
    OriginOs,
}

/// Description of the vendor fork the engine is running on
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceOs {
    /// Vendor fork
    pub kind: OsKind,

    /// Whether this is the mainland China build of the fork
    #[serde(default)]
    pub china_build: bool,

    /// Whether the user switched off the vendor's permission optimization
    /// (MIUI / HyperOS developer option)
    #[serde(default)]
    pub optimization_disabled: bool,
}

impl DeviceOs {
    /// Stock platform
    pub fn stock() -> Self {
        Self::default()
    }

    /// A specific vendor fork, global build, optimization on
    pub fn new(kind: OsKind) -> Self {
        Self {
            kind,
            china_build: false,
            optimization_disabled: false,
        }
    }

    /// Mark as the mainland China build
    pub fn china_build(mut self) -> Self {
        self.china_build = true;
        self
    }

    /// Mark the vendor optimization as switched off
    pub fn without_optimization(mut self) -> Self {
        self.optimization_disabled = true;
        self
    }

    pub fn is_miui(&self) -> bool {
        self.kind == OsKind::Miui
    }

    pub fn is_hyper_os(&self) -> bool {
        self.kind == OsKind::HyperOs
    }

    pub fn is_harmony_os(&self) -> bool {
        self.kind == OsKind::HarmonyOs
    }

    pub fn is_magic_os(&self) -> bool {
        self.kind == OsKind::MagicOs
    }

    pub fn is_emui(&self) -> bool {
        self.kind == OsKind::Emui
    }

    pub fn is_one_ui(&self) -> bool {
        self.kind == OsKind::OneUi
    }

    /// Xiaomi forks (MIUI or HyperOS)
    pub fn is_xiaomi(&self) -> bool {
        self.is_miui() || self.is_hyper_os()
    }

    /// Huawei / Honor forks
    pub fn is_huawei_family(&self) -> bool {
        self.is_harmony_os() || self.is_magic_os() || self.is_emui()
    }

    /// Whether the vendor permission optimization is in effect
    pub fn is_optimization_enabled(&self) -> bool {
        !self.optimization_disabled
    }
}

/// Mechanism through which a right is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionChannel {
    /// Held automatically, nothing to request
    AlwaysGranted,
    /// Interactive runtime prompt
    RuntimePrompt,
    /// Navigation to an out-of-band settings page
    SettingsPage,
}

/// Kind of page that hosts a settings-page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// Full-screen settings page
    #[default]
    Opaque,
    /// Transparent pass-through page over the caller
    Transparent,
}

/// Well-known settings actions
pub mod actions {
    pub const APPLICATION_DETAILS_SETTINGS: &str = "android.settings.APPLICATION_DETAILS_SETTINGS";
    pub const MANAGE_APPLICATIONS_SETTINGS: &str = "android.settings.MANAGE_APPLICATIONS_SETTINGS";
    pub const APPLICATION_SETTINGS: &str = "android.settings.APPLICATION_SETTINGS";
    pub const SETTINGS: &str = "android.settings.SETTINGS";
    pub const APP_NOTIFICATION_SETTINGS: &str = "android.settings.APP_NOTIFICATION_SETTINGS";
    pub const NOTIFICATION_POLICY_ACCESS_SETTINGS: &str =
        "android.settings.NOTIFICATION_POLICY_ACCESS_SETTINGS";
    pub const NOTIFICATION_POLICY_ACCESS_DETAIL_SETTINGS: &str =
        "android.settings.NOTIFICATION_POLICY_ACCESS_DETAIL_SETTINGS";
    pub const MANAGE_OVERLAY_PERMISSION: &str = "android.settings.action.MANAGE_OVERLAY_PERMISSION";
    pub const MANAGE_WRITE_SETTINGS: &str = "android.settings.action.MANAGE_WRITE_SETTINGS";
    pub const MANAGE_UNKNOWN_APP_SOURCES: &str = "android.settings.MANAGE_UNKNOWN_APP_SOURCES";
    pub const REQUEST_SCHEDULE_EXACT_ALARM: &str = "android.settings.REQUEST_SCHEDULE_EXACT_ALARM";
    pub const MANAGE_APP_ALL_FILES_ACCESS_PERMISSION: &str =
        "android.settings.MANAGE_APP_ALL_FILES_ACCESS_PERMISSION";
    pub const MANAGE_ALL_FILES_ACCESS_PERMISSION: &str =
        "android.settings.MANAGE_ALL_FILES_ACCESS_PERMISSION";
    pub const XIAOMI_PERMISSION_EDITOR: &str = "miui.intent.action.APP_PERM_EDITOR";
}

/// A navigable settings page
///
/// Two destinations are the same page iff action and package both match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettingsDestination {
    /// Settings action to open
    pub action: String,

    /// Package the page is scoped to, if any
    #[serde(default)]
    pub package: Option<String>,
}

impl SettingsDestination {
    /// A page not scoped to any package
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            package: None,
        }
    }

    /// A page scoped to a package
    pub fn for_package(action: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            package: Some(package.into()),
        }
    }

    /// The application details page: the universal fallback
    pub fn application_details(package: impl Into<String>) -> Self {
        Self::for_package(actions::APPLICATION_DETAILS_SETTINGS, package)
    }

    pub fn manage_applications() -> Self {
        Self::new(actions::MANAGE_APPLICATIONS_SETTINGS)
    }

    pub fn application_settings() -> Self {
        Self::new(actions::APPLICATION_SETTINGS)
    }

    pub fn android_settings() -> Self {
        Self::new(actions::SETTINGS)
    }

    /// Xiaomi's per-app permission editor
    pub fn xiaomi_permission_editor(package: impl Into<String>) -> Self {
        Self::for_package(actions::XIAOMI_PERMISSION_EDITOR, package)
    }

    /// Generic tail appended to every destination list, most specific first
    pub fn common(package: &str) -> Vec<Self> {
        vec![
            Self::application_details(package),
            Self::manage_applications(),
            Self::application_settings(),
            Self::android_settings(),
        ]
    }
}

impl fmt::Display for SettingsDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(package) => write!(f, "{} (package:{})", self.action, package),
            None => f.write_str(&self.action),
        }
    }
}

/// Error for request codes outside [1, 65535]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Request code must be within 1..=65535, got {0}")]
pub struct RequestCodeError(pub u32);

/// Correlation code handed to the host for prompts and settings pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RequestCode(NonZeroU16);

impl RequestCode {
    /// Code used when the caller does not pick one
    pub const DEFAULT: RequestCode = match NonZeroU16::new(1024 + 1) {
        Some(code) => RequestCode(code),
        None => unreachable!(),
    };

    /// Validate a raw code
    pub fn new(code: u32) -> Result<Self, RequestCodeError> {
        u16::try_from(code)
            .ok()
            .and_then(NonZeroU16::new)
            .map(Self)
            .ok_or(RequestCodeError(code))
    }

    pub fn get(self) -> u16 {
        self.0.get()
    }
}

impl Default for RequestCode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for RequestCode {
    type Error = RequestCodeError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::new(code)
    }
}

impl From<RequestCode> for u32 {
    fn from(code: RequestCode) -> Self {
        u32::from(code.get())
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
