//! Background companions of foreground rights

use permflow_api::{version, ManifestSnapshot, PageType, PermissionChannel, SettingsDestination};
use std::time::Duration;

use super::base;
use super::{ComplianceContext, Permission, PermissionDescriptor};
use crate::error::ConfigurationError;
use crate::platform::Platform;

/// Pause between the foreground prompt and the background prompt
pub const BACKGROUND_REQUEST_INTERVAL: Duration = Duration::from_millis(150);

/// A right that is only meaningful once one of its foreground rights is held
///
/// Grant state never reports held while no foreground right is held, and the
/// permanently-denied state mirrors the foreground rights until one of them
/// is granted.
#[derive(Debug, Clone)]
pub struct BackgroundPermission {
    name: &'static str,
    group: Option<&'static str>,
    from_version: u32,
    foreground: &'static [&'static str],
    superseded: Option<(u32, &'static str)>,
}

impl BackgroundPermission {
    /// `foreground` lists the rights of which at least one must be held
    pub const fn new(name: &'static str, from_version: u32, foreground: &'static [&'static str]) -> Self {
        Self {
            name,
            group: None,
            from_version,
            foreground,
            superseded: None,
        }
    }

    pub const fn group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    /// From `target_sdk` on, `replacement` must be requested instead
    pub const fn superseded_at(mut self, target_sdk: u32, replacement: &'static str) -> Self {
        self.superseded = Some((target_sdk, replacement));
        self
    }

    fn any_foreground_granted(&self, platform: &dyn Platform, skip_side_effects: bool) -> bool {
        base::lookup_all(self.foreground)
            .iter()
            .any(|p| p.is_granted(platform, skip_side_effects))
    }
}

impl PermissionDescriptor for BackgroundPermission {
    fn name(&self) -> &str {
        self.name
    }

    fn group(&self) -> Option<&str> {
        self.group
    }

    fn from_version(&self, _platform: &dyn Platform) -> u32 {
        self.from_version
    }

    fn foreground_permissions(&self, _platform: &dyn Platform) -> Vec<Permission> {
        base::lookup_all(self.foreground)
    }

    fn is_background(&self, _platform: &dyn Platform) -> bool {
        true
    }

    fn channel(&self, platform: &dyn Platform) -> PermissionChannel {
        if platform.sdk_version() < version::ANDROID_6 {
            PermissionChannel::AlwaysGranted
        } else {
            PermissionChannel::RuntimePrompt
        }
    }

    fn page_type(&self, platform: &dyn Platform) -> PageType {
        if platform.device_os().is_xiaomi() {
            PageType::Transparent
        } else {
            PageType::Opaque
        }
    }

    fn is_granted(&self, platform: &dyn Platform, skip_side_effects: bool) -> bool {
        if platform.sdk_version() < version::ANDROID_6 {
            return true;
        }
        if !self.any_foreground_granted(platform, skip_side_effects) {
            return false;
        }
        if platform.sdk_version() < self.from_version {
            return true;
        }
        platform.check_self_permission(self.name)
    }

    fn is_permanently_denied(&self, platform: &dyn Platform) -> bool {
        if platform.sdk_version() < version::ANDROID_6 {
            return false;
        }
        if !self.any_foreground_granted(platform, true) {
            let foreground = base::lookup_all(self.foreground);
            return !foreground.is_empty() && foreground.iter().all(|p| p.is_permanently_denied(platform));
        }
        if platform.sdk_version() < self.from_version {
            return false;
        }
        !platform.check_self_permission(self.name) && !platform.should_show_rationale(self.name)
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

    fn request_interval(&self, platform: &dyn Platform) -> Duration {
        if self.is_requestable(platform) {
            BACKGROUND_REQUEST_INTERVAL
        } else {
            Duration::ZERO
        }
    }

    fn must_declare(&self) -> bool {
        true
    }

    fn check_target_sdk(&self, ctx: &ComplianceContext<'_>) -> Result<(), ConfigurationError> {
        if let Some((target_sdk, replacement)) = self.superseded {
            if ctx.platform.target_sdk_version() >= target_sdk {
                return Err(ConfigurationError::Superseded {
                    permission: self.name.to_string(),
                    replacement: replacement.to_string(),
                    target_sdk,
                });
            }
        }
        base::check_target_sdk(self, ctx)
    }

    fn check_manifest(
        &self,
        _ctx: &ComplianceContext<'_>,
        manifest: &ManifestSnapshot,
    ) -> Result<(), ConfigurationError> {
        base::check_declared_self(self, manifest)?;
        if self.foreground.iter().any(|name| manifest.find(name).is_some()) {
            return Ok(());
        }
        match self.foreground.first() {
            Some(first) => Err(ConfigurationError::NotDeclared {
                permission: (*first).to_string(),
            }),
            None => Ok(()),
        }
    }

    fn check_batch(&self, ctx: &ComplianceContext<'_>) -> Result<(), ConfigurationError> {
        base::require_prerequisite(ctx, self.name, self.foreground)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, names};
    use crate::platform::MemoryPlatform;
    use permflow_api::{DeviceOs, OsKind};

    #[test]
    fn test_never_granted_without_foreground() {
        let platform = MemoryPlatform::new(version::ANDROID_13).with_granted(names::ACCESS_BACKGROUND_LOCATION);
        let background = catalog::access_background_location();

        assert!(!background.is_granted(&platform, false));
        platform.grant(names::ACCESS_COARSE_LOCATION);
        assert!(background.is_granted(&platform, false));
    }

    #[test]
    fn test_follows_foreground_below_from_version() {
        let platform = MemoryPlatform::new(version::ANDROID_9);
        let background = catalog::access_background_location();

        assert!(!background.is_granted(&platform, false));
        platform.grant(names::ACCESS_FINE_LOCATION);
        assert!(background.is_granted(&platform, false));
    }

    #[test]
    fn test_permanent_denial_mirrors_foreground() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let background = catalog::body_sensors_background();

        platform.set_rationale(names::BODY_SENSORS, true);
        platform.set_rationale(names::BODY_SENSORS_BACKGROUND, false);
        // foreground can still be asked, so the pair is not stuck
        assert!(!background.is_permanently_denied(&platform));

        platform.set_rationale(names::BODY_SENSORS, false);
        assert!(background.is_permanently_denied(&platform));

        platform.grant(names::BODY_SENSORS);
        platform.set_rationale(names::BODY_SENSORS_BACKGROUND, true);
        assert!(!background.is_permanently_denied(&platform));
    }

    #[test]
    fn test_request_interval_only_when_requestable() {
        let background = catalog::access_background_location();
        assert_eq!(
            background.request_interval(&MemoryPlatform::new(version::ANDROID_10)),
            BACKGROUND_REQUEST_INTERVAL
        );
        assert_eq!(
            background.request_interval(&MemoryPlatform::new(version::ANDROID_9)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_transparent_page_on_xiaomi() {
        let background = catalog::access_background_location();
        let platform = MemoryPlatform::new(version::ANDROID_13).with_device_os(DeviceOs::new(OsKind::HyperOs));
        assert_eq!(background.page_type(&platform), PageType::Transparent);
        assert_eq!(
            background.page_type(&MemoryPlatform::new(version::ANDROID_13)),
            PageType::Opaque
        );
    }

    #[test]
    fn test_superseded_on_new_targets() {
        let platform = MemoryPlatform::new(version::ANDROID_16);
        let batch = [catalog::body_sensors(), catalog::body_sensors_background()];
        let ctx = ComplianceContext {
            platform: &platform,
            batch: &batch,
            manifest: None,
        };

        let err = batch[1].check_compliance(&ctx).unwrap_err();
        assert!(matches!(err, ConfigurationError::Superseded { target_sdk: 36, .. }));
        assert!(err.to_string().contains(names::READ_HEALTH_DATA_IN_BACKGROUND));
    }

    #[test]
    fn test_foreground_must_be_declared() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let batch = [catalog::access_fine_location(), catalog::access_background_location()];
        let manifest = ManifestSnapshot::new().declare(names::ACCESS_BACKGROUND_LOCATION);
        let ctx = ComplianceContext {
            platform: &platform,
            batch: &batch,
            manifest: Some(&manifest),
        };

        assert_eq!(
            batch[1].check_compliance(&ctx),
            Err(ConfigurationError::NotDeclared {
                permission: names::ACCESS_FINE_LOCATION.into()
            })
        );

        let fixed = manifest.clone().declare(names::ACCESS_COARSE_LOCATION);
        let ctx = ComplianceContext {
            manifest: Some(&fixed),
            ..ctx
        };
        assert!(batch[1].check_compliance(&ctx).is_ok());
    }
}
