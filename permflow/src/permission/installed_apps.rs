//! Installed applications list
//!
//! Stock Android has no such right. Some vendors expose one: as a dangerous
//! right defined by the system (or flagged through a secure setting), as a
//! OneUI-specific dangerous right, or as a MIUI app-op. Where none of those
//! exist the list is readable without asking and the right counts as held.

use permflow_api::{version, ManifestSnapshot, PageType, PermissionChannel, SettingsDestination};

use super::base;
use super::{ComplianceContext, PermissionDescriptor};
use crate::catalog::names;
use crate::error::ConfigurationError;
use crate::platform::{self, CapabilityProbe, Platform};

const MIUI_OP_GET_INSTALLED_APPS: &str = "OP_GET_INSTALLED_APPS";
const ONE_UI_GET_APP_LIST: &str = "com.samsung.android.permission.GET_APP_LIST";
const OEM_RUNTIME_PERMISSION_SETTING: &str = "oem_installed_apps_runtime_permission_enable";

#[derive(Debug, Clone, Copy, Default)]
pub struct GetInstalledAppsPermission;

impl GetInstalledAppsPermission {
    fn supported_by_system(platform: &dyn Platform) -> bool {
        platform
            .probe(&CapabilityProbe::DangerousPermissionDefined(
                names::GET_INSTALLED_APPS.to_string(),
            ))
            .is_supported()
            || platform
                .probe(&CapabilityProbe::SecureSettingEnabled(
                    OEM_RUNTIME_PERMISSION_SETTING.to_string(),
                ))
                .is_supported()
    }

    fn supported_by_one_ui(platform: &dyn Platform) -> bool {
        platform.device_os().is_one_ui()
            && platform
                .probe(&CapabilityProbe::DangerousPermissionDefined(
                    ONE_UI_GET_APP_LIST.to_string(),
                ))
                .is_supported()
    }

    fn supported_by_miui(platform: &dyn Platform) -> bool {
        platform.sdk_version() >= version::ANDROID_4_4
            && platform.device_os().is_miui()
            && platform
                .probe(&CapabilityProbe::AppOpDefined(
                    MIUI_OP_GET_INSTALLED_APPS.to_string(),
                ))
                .is_supported()
    }

    fn supported_by_runtime_prompt(platform: &dyn Platform) -> bool {
        platform.sdk_version() >= version::ANDROID_6
            && (Self::supported_by_system(platform) || Self::supported_by_one_ui(platform))
    }
}

impl PermissionDescriptor for GetInstalledAppsPermission {
    fn name(&self) -> &str {
        names::GET_INSTALLED_APPS
    }

    fn from_version(&self, _platform: &dyn Platform) -> u32 {
        version::ANDROID_4_2
    }

    fn request_name(&self, platform: &dyn Platform) -> String {
        if platform.sdk_version() >= version::ANDROID_6
            && !Self::supported_by_system(platform)
            && Self::supported_by_one_ui(platform)
        {
            return ONE_UI_GET_APP_LIST.to_string();
        }
        names::GET_INSTALLED_APPS.to_string()
    }

    fn channel(&self, platform: &dyn Platform) -> PermissionChannel {
        if Self::supported_by_runtime_prompt(platform) {
            PermissionChannel::RuntimePrompt
        } else {
            PermissionChannel::SettingsPage
        }
    }

    fn page_type(&self, platform: &dyn Platform) -> PageType {
        if self.channel(platform) == PermissionChannel::RuntimePrompt {
            PageType::Transparent
        } else {
            PageType::Opaque
        }
    }

    fn is_requestable(&self, platform: &dyn Platform) -> bool {
        if platform.sdk_version() < self.from_version(platform) {
            return false;
        }
        if Self::supported_by_runtime_prompt(platform) {
            return true;
        }
        if Self::supported_by_miui(platform) {
            return platform.device_os().is_optimization_enabled();
        }
        true
    }

    fn is_granted(&self, platform: &dyn Platform, _skip_side_effects: bool) -> bool {
        if Self::supported_by_runtime_prompt(platform) {
            return platform.check_self_permission(&self.request_name(platform));
        }
        if Self::supported_by_miui(platform) {
            // without the optimization the editor toggle is not reflected in the op
            if !platform.device_os().is_optimization_enabled() {
                return true;
            }
            return platform::check_op(platform, MIUI_OP_GET_INSTALLED_APPS, true);
        }
        // nothing to ask for: reading the list just yields fewer entries
        true
    }

    fn is_permanently_denied(&self, platform: &dyn Platform) -> bool {
        if Self::supported_by_runtime_prompt(platform) {
            let request_name = self.request_name(platform);
            return !platform.check_self_permission(&request_name)
                && !platform.should_show_rationale(&request_name);
        }
        if Self::supported_by_miui(platform) {
            if !platform.device_os().is_optimization_enabled() {
                return false;
            }
            return !self.is_granted(platform, true);
        }
        false
    }

    fn settings_destinations(
        &self,
        platform: &dyn Platform,
        _skip_side_effects: bool,
    ) -> Vec<SettingsDestination> {
        if base::prefers_xiaomi_editor(platform) {
            return base::with_common_tail(
                platform,
                [SettingsDestination::xiaomi_permission_editor(platform.package_name())],
            );
        }
        SettingsDestination::common(platform.package_name())
    }

    fn must_declare(&self) -> bool {
        true
    }

    fn check_manifest(
        &self,
        ctx: &ComplianceContext<'_>,
        manifest: &ManifestSnapshot,
    ) -> Result<(), ConfigurationError> {
        base::check_declared_self(self, manifest)?;
        if ctx.platform.target_sdk_version() < version::ANDROID_11 {
            return Ok(());
        }
        if manifest.find(names::QUERY_ALL_PACKAGES).is_some() || !manifest.queries_packages.is_empty() {
            return Ok(());
        }
        Err(ConfigurationError::MissingPackageVisibility {
            permission: names::GET_INSTALLED_APPS.to_string(),
            required: names::QUERY_ALL_PACKAGES.to_string(),
        })
    }
}
