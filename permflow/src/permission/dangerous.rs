//! Rights obtained through the runtime prompt

use permflow_api::{version, ManifestSnapshot, PermissionChannel, SettingsDestination, DEFAULT_MAX_SDK_VERSION};

use super::base;
use super::{ComplianceContext, Permission, PermissionDescriptor};
use crate::error::ConfigurationError;
use crate::platform::Platform;

/// A right granted through the system's runtime prompt
///
/// Below Android 6 every such right is held from install. Below its own
/// from-version the right is represented by its legacy substitutes: it counts
/// as granted when all of them are (or when it has none).
#[derive(Debug, Clone)]
pub struct DangerousPermission {
    name: &'static str,
    group: Option<&'static str>,
    from_version: u32,
    legacy: &'static [&'static str],
    lowest_max_sdk: u32,
    settings_via_legacy: bool,
}

impl DangerousPermission {
    /// A right that exists from `from_version`
    pub const fn new(name: &'static str, from_version: u32) -> Self {
        Self {
            name,
            group: None,
            from_version,
            legacy: &[],
            lowest_max_sdk: DEFAULT_MAX_SDK_VERSION,
            settings_via_legacy: false,
        }
    }

    pub const fn group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    /// Older rights requested instead on systems predating this one
    pub const fn legacy(mut self, legacy: &'static [&'static str]) -> Self {
        self.legacy = legacy;
        self
    }

    /// Smallest `max_sdk_version` the manifest declaration may carry
    pub const fn lowest_max_sdk(mut self, lowest_max_sdk: u32) -> Self {
        self.lowest_max_sdk = lowest_max_sdk;
        self
    }

    /// Reuse the first legacy right's settings pages
    pub const fn settings_via_legacy(mut self) -> Self {
        self.settings_via_legacy = true;
        self
    }

    fn legacy_list(&self) -> Vec<Permission> {
        base::lookup_all(self.legacy)
    }
}

impl PermissionDescriptor for DangerousPermission {
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
        self.legacy_list()
    }

    fn channel(&self, platform: &dyn Platform) -> PermissionChannel {
        if platform.sdk_version() < version::ANDROID_6 {
            PermissionChannel::AlwaysGranted
        } else {
            PermissionChannel::RuntimePrompt
        }
    }

    fn is_granted(&self, platform: &dyn Platform, skip_side_effects: bool) -> bool {
        if platform.sdk_version() < version::ANDROID_6 {
            return true;
        }
        if platform.sdk_version() >= self.from_version {
            return platform.check_self_permission(self.name);
        }
        self.legacy_list()
            .iter()
            .all(|p| p.is_granted(platform, skip_side_effects))
    }

    fn is_permanently_denied(&self, platform: &dyn Platform) -> bool {
        if platform.sdk_version() < version::ANDROID_6 {
            return false;
        }
        if platform.sdk_version() >= self.from_version {
            return !platform.check_self_permission(self.name)
                && !platform.should_show_rationale(self.name);
        }
        self.legacy_list()
            .iter()
            .any(|p| p.is_permanently_denied(platform))
    }

    fn settings_destinations(
        &self,
        platform: &dyn Platform,
        skip_side_effects: bool,
    ) -> Vec<SettingsDestination> {
        if self.settings_via_legacy {
            if let Some(legacy) = self.legacy_list().first() {
                return legacy.settings_destinations(platform, skip_side_effects);
            }
        }
        SettingsDestination::common(platform.package_name())
    }

    fn must_declare(&self) -> bool {
        true
    }

    fn check_manifest(
        &self,
        _ctx: &ComplianceContext<'_>,
        manifest: &ManifestSnapshot,
    ) -> Result<(), ConfigurationError> {
        base::require_declared(manifest, self.name, self.lowest_max_sdk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, names};
    use crate::platform::MemoryPlatform;
    use permflow_api::actions;

    #[test]
    fn test_always_granted_before_android_6() {
        let platform = MemoryPlatform::new(version::ANDROID_5);
        let camera = catalog::camera();

        assert_eq!(camera.channel(&platform), PermissionChannel::AlwaysGranted);
        assert!(camera.is_granted(&platform, false));
        assert!(!camera.is_permanently_denied(&platform));
    }

    #[test]
    fn test_standard_grant_and_permanent_denial() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let camera = catalog::camera();

        assert!(!camera.is_granted(&platform, false));
        // never asked and no rationale looks the same as permanently denied
        assert!(camera.is_permanently_denied(&platform));

        platform.set_rationale(names::CAMERA, true);
        assert!(!camera.is_permanently_denied(&platform));

        platform.grant(names::CAMERA);
        assert!(camera.is_granted(&platform, false));
        assert!(!camera.is_permanently_denied(&platform));
    }

    #[test]
    fn test_media_follows_legacy_storage_on_old_systems() {
        let platform = MemoryPlatform::new(version::ANDROID_12);
        let images = catalog::read_media_images();

        assert!(!images.is_granted(&platform, false));
        platform.grant(names::READ_EXTERNAL_STORAGE);
        assert!(images.is_granted(&platform, false));
    }

    #[test]
    fn test_new_right_without_legacy_is_granted_on_old_systems() {
        let platform = MemoryPlatform::new(version::ANDROID_11);
        assert!(catalog::bluetooth_connect().is_granted(&platform, false));
    }

    #[test]
    fn test_post_notifications_settings_match_notification_service() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let post = catalog::post_notifications();
        let service = catalog::notification_service();

        let list = post.settings_destinations(&platform, true);
        assert_eq!(list, service.settings_destinations(&platform, true));
        assert_eq!(list[0].action, actions::APP_NOTIFICATION_SETTINGS);
    }

    #[test]
    fn test_lowest_max_sdk_rule() {
        let platform = MemoryPlatform::new(version::ANDROID_10);
        let write = catalog::write_external_storage();
        let batch = [write.clone()];
        let manifest = ManifestSnapshot::new()
            .declare_with_max_sdk(names::WRITE_EXTERNAL_STORAGE, version::ANDROID_10);
        let ctx = ComplianceContext {
            platform: &platform,
            batch: &batch,
            manifest: Some(&manifest),
        };
        assert!(write.check_compliance(&ctx).is_ok());

        let manifest = ManifestSnapshot::new().declare_with_max_sdk(names::WRITE_EXTERNAL_STORAGE, 28);
        let ctx = ComplianceContext {
            manifest: Some(&manifest),
            ..ctx
        };
        assert!(matches!(
            write.check_compliance(&ctx),
            Err(ConfigurationError::MaxSdkTooLow { required: 29, .. })
        ));
    }
}
