//! Special access rights toggled on dedicated settings pages

use permflow_api::{version, ManifestSnapshot, PermissionChannel, SettingsDestination, DEFAULT_MAX_SDK_VERSION};
use std::time::Duration;

use super::base;
use super::{ComplianceContext, Permission, PermissionDescriptor};
use crate::error::ConfigurationError;
use crate::platform::{Platform, SpecialAccess};

/// A settings page specific to one special right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialPage {
    /// Page scoped to the application's package
    App(&'static str),
    /// Page listing every application
    Global(&'static str),
}

impl SpecialPage {
    fn destination(self, package: &str) -> SettingsDestination {
        match self {
            Self::App(action) => SettingsDestination::for_package(action, package),
            Self::Global(action) => SettingsDestination::new(action),
        }
    }
}

/// A right held iff a special access switch is on
///
/// These rights are never permanently denied: the settings page can always
/// be opened again.
#[derive(Debug, Clone)]
pub struct SpecialPermission {
    name: &'static str,
    group: Option<&'static str>,
    from_version: u32,
    access: SpecialAccess,
    default_granted: bool,
    pages: &'static [SpecialPage],
    xiaomi_editor_first: bool,
    legacy: &'static [&'static str],
    legacy_declared_below: Option<u32>,
}

impl SpecialPermission {
    pub const fn new(
        name: &'static str,
        from_version: u32,
        access: SpecialAccess,
        pages: &'static [SpecialPage],
    ) -> Self {
        Self {
            name,
            group: None,
            from_version,
            access,
            default_granted: false,
            pages,
            xiaomi_editor_first: false,
            legacy: &[],
            legacy_declared_below: None,
        }
    }

    pub const fn group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    /// Grant state to assume when the switch cannot be read
    pub const fn default_granted(mut self, granted: bool) -> Self {
        self.default_granted = granted;
        self
    }

    /// Put the Xiaomi permission editor ahead of the specific pages
    pub const fn xiaomi_editor_first(mut self) -> Self {
        self.xiaomi_editor_first = true;
        self
    }

    pub const fn legacy(mut self, legacy: &'static [&'static str]) -> Self {
        self.legacy = legacy;
        self
    }

    /// Require the legacy rights in the manifest while the minimum API level
    /// is below `min_sdk`
    pub const fn legacy_declared_below(mut self, min_sdk: u32) -> Self {
        self.legacy_declared_below = Some(min_sdk);
        self
    }
}

impl PermissionDescriptor for SpecialPermission {
    fn name(&self) -> &str {
        self.name
    }

    fn group(&self) -> Option<&str> {
        self.group
    }

    fn from_version(&self, _platform: &dyn Platform) -> u32 {
        self.from_version
    }

    fn legacy_permissions(&self, _platform: &dyn Platform) -> Vec<Permission> {
        base::lookup_all(self.legacy)
    }

    fn channel(&self, platform: &dyn Platform) -> PermissionChannel {
        if self.is_requestable(platform) {
            PermissionChannel::SettingsPage
        } else {
            PermissionChannel::AlwaysGranted
        }
    }

    fn is_granted(&self, platform: &dyn Platform, skip_side_effects: bool) -> bool {
        if !self.is_requestable(platform) {
            return base::lookup_all(self.legacy)
                .iter()
                .all(|p| p.is_granted(platform, skip_side_effects));
        }
        platform
            .special_access(self.access)
            .unwrap_or(self.default_granted)
    }

    fn is_permanently_denied(&self, _platform: &dyn Platform) -> bool {
        false
    }

    fn settings_destinations(
        &self,
        platform: &dyn Platform,
        _skip_side_effects: bool,
    ) -> Vec<SettingsDestination> {
        let package = platform.package_name();
        let mut specific = Vec::new();
        if self.xiaomi_editor_first && base::prefers_xiaomi_editor(platform) {
            specific.push(SettingsDestination::xiaomi_permission_editor(package));
        }
        if self.is_requestable(platform) {
            specific.extend(self.pages.iter().map(|page| page.destination(package)));
        }
        base::with_common_tail(platform, specific)
    }

    fn result_wait(&self, platform: &dyn Platform) -> Duration {
        base::settings_result_wait(platform, self.is_requestable(platform))
    }

    fn must_declare(&self) -> bool {
        true
    }

    fn check_manifest(
        &self,
        ctx: &ComplianceContext<'_>,
        manifest: &ManifestSnapshot,
    ) -> Result<(), ConfigurationError> {
        base::require_declared(manifest, self.name, DEFAULT_MAX_SDK_VERSION)?;
        let Some(below) = self.legacy_declared_below else {
            return Ok(());
        };
        if ctx.min_sdk_version() >= below {
            return Ok(());
        }
        for legacy in self.legacy {
            base::require_declared(manifest, legacy, version::ANDROID_10)?;
        }
        Ok(())
    }
}
