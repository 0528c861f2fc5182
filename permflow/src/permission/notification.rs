//! Notification switches obtained through settings pages

use permflow_api::{actions, version, PermissionChannel, SettingsDestination};
use std::time::Duration;

use super::base;
use super::PermissionDescriptor;
use crate::catalog::names;
use crate::platform::{Platform, SpecialAccess};

/// Whether the application may post notifications at all
///
/// A virtual right: nothing is declared, the switch lives on the app's
/// notification settings page. Notifications are on unless the user turned
/// them off, so an unreadable switch counts as held.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationServicePermission;

impl PermissionDescriptor for NotificationServicePermission {
    fn name(&self) -> &str {
        names::NOTIFICATION_SERVICE
    }

    fn group(&self) -> Option<&str> {
        Some(crate::catalog::groups::NOTIFICATIONS)
    }

    fn from_version(&self, _platform: &dyn Platform) -> u32 {
        version::ANDROID_4_4
    }

    fn channel(&self, platform: &dyn Platform) -> PermissionChannel {
        if self.is_requestable(platform) {
            PermissionChannel::SettingsPage
        } else {
            PermissionChannel::AlwaysGranted
        }
    }

    fn is_granted(&self, platform: &dyn Platform, _skip_side_effects: bool) -> bool {
        if !self.is_requestable(platform) {
            return true;
        }
        platform
            .special_access(SpecialAccess::NotificationsEnabled)
            .unwrap_or(true)
    }

    fn is_permanently_denied(&self, _platform: &dyn Platform) -> bool {
        false
    }

    fn settings_destinations(
        &self,
        platform: &dyn Platform,
        _skip_side_effects: bool,
    ) -> Vec<SettingsDestination> {
        let mut specific = Vec::new();
        if platform.sdk_version() >= version::ANDROID_8 {
            specific.push(SettingsDestination::for_package(
                actions::APP_NOTIFICATION_SETTINGS,
                platform.package_name(),
            ));
        }
        base::with_common_tail(platform, specific)
    }

    fn result_wait(&self, platform: &dyn Platform) -> Duration {
        base::settings_result_wait(platform, self.is_requestable(platform))
    }

    fn must_declare(&self) -> bool {
        false
    }
}

/// Do Not Disturb policy access
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationPolicyPermission;

impl PermissionDescriptor for NotificationPolicyPermission {
    fn name(&self) -> &str {
        names::ACCESS_NOTIFICATION_POLICY
    }

    fn group(&self) -> Option<&str> {
        Some(crate::catalog::groups::NOTIFICATIONS)
    }

    fn from_version(&self, _platform: &dyn Platform) -> u32 {
        version::ANDROID_6
    }

    fn channel(&self, platform: &dyn Platform) -> PermissionChannel {
        if self.is_requestable(platform) {
            PermissionChannel::SettingsPage
        } else {
            PermissionChannel::AlwaysGranted
        }
    }

    fn is_granted(&self, platform: &dyn Platform, _skip_side_effects: bool) -> bool {
        if !self.is_requestable(platform) {
            return true;
        }
        platform
            .special_access(SpecialAccess::NotificationPolicy)
            .unwrap_or(false)
    }

    fn is_permanently_denied(&self, _platform: &dyn Platform) -> bool {
        false
    }

    fn settings_destinations(
        &self,
        platform: &dyn Platform,
        _skip_side_effects: bool,
    ) -> Vec<SettingsDestination> {
        let mut specific = Vec::new();
        // the detail page is missing on Huawei-family forks
        if platform.sdk_version() >= version::ANDROID_10 && !platform.device_os().is_huawei_family() {
            specific.push(SettingsDestination::for_package(
                actions::NOTIFICATION_POLICY_ACCESS_DETAIL_SETTINGS,
                platform.package_name(),
            ));
        }
        if platform.sdk_version() >= version::ANDROID_6 {
            specific.push(SettingsDestination::new(actions::NOTIFICATION_POLICY_ACCESS_SETTINGS));
        }
        base::with_common_tail(platform, specific)
    }

    fn result_wait(&self, platform: &dyn Platform) -> Duration {
        base::settings_result_wait(platform, self.is_requestable(platform))
    }

    fn must_declare(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::platform::MemoryPlatform;
    use permflow_api::{DeviceOs, OsKind};

    #[test]
    fn test_notification_service_defaults_to_enabled() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let service = catalog::notification_service();

        assert_eq!(service.channel(&platform), PermissionChannel::SettingsPage);
        assert!(service.is_granted(&platform, false));
        platform.set_special_access(SpecialAccess::NotificationsEnabled, false);
        assert!(!service.is_granted(&platform, false));
        assert!(!service.is_permanently_denied(&platform));
    }

    #[test]
    fn test_notification_service_pages_by_version() {
        let service = catalog::notification_service();

        let old = MemoryPlatform::new(version::ANDROID_7);
        assert_eq!(
            service.settings_destinations(&old, false),
            SettingsDestination::common("com.example.app")
        );

        let new = MemoryPlatform::new(version::ANDROID_8);
        let list = service.settings_destinations(&new, false);
        assert_eq!(list.len(), 5);
        assert_eq!(list[0].action, actions::APP_NOTIFICATION_SETTINGS);
    }

    #[test]
    fn test_policy_detail_page_skipped_on_huawei_family() {
        let policy = catalog::access_notification_policy();

        let stock = MemoryPlatform::new(version::ANDROID_12);
        let list = policy.settings_destinations(&stock, false);
        assert_eq!(list[0].action, actions::NOTIFICATION_POLICY_ACCESS_DETAIL_SETTINGS);
        assert_eq!(list[1].action, actions::NOTIFICATION_POLICY_ACCESS_SETTINGS);

        let emui = MemoryPlatform::new(version::ANDROID_12).with_device_os(DeviceOs::new(OsKind::Emui));
        let list = policy.settings_destinations(&emui, false);
        assert_eq!(list[0].action, actions::NOTIFICATION_POLICY_ACCESS_SETTINGS);
        assert_eq!(policy.result_wait(&emui), Duration::from_millis(300));
    }

    #[test]
    fn test_policy_needs_switch() {
        let platform = MemoryPlatform::new(version::ANDROID_12);
        let policy = catalog::access_notification_policy();

        assert!(!policy.is_granted(&platform, false));
        platform.set_special_access(SpecialAccess::NotificationPolicy, true);
        assert!(policy.is_granted(&platform, false));
        assert!(policy.is_granted(&MemoryPlatform::new(version::ANDROID_5), false));
    }
}
