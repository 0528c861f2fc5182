//! Permission catalog
//!
//! One process-wide descriptor per right, created on first access and shared
//! afterwards. Descriptors never change once created.
//!
//! # Example
//!
//! ```
//! use permflow::catalog::{self, names};
//!
//! let camera = catalog::camera();
//! assert_eq!(camera, catalog::find(names::CAMERA).unwrap());
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use permflow_api::{actions, version};

use crate::permission::special::SpecialPage;
use crate::permission::{
    BackgroundPermission, DangerousPermission, GetInstalledAppsPermission,
    NotificationPolicyPermission, NotificationServicePermission, Permission, SpecialPermission,
};
use crate::platform::SpecialAccess;

/// Right names
pub mod names {
    pub const CAMERA: &str = "android.permission.CAMERA";
    pub const RECORD_AUDIO: &str = "android.permission.RECORD_AUDIO";
    pub const READ_CONTACTS: &str = "android.permission.READ_CONTACTS";
    pub const WRITE_CONTACTS: &str = "android.permission.WRITE_CONTACTS";
    pub const READ_CALENDAR: &str = "android.permission.READ_CALENDAR";
    pub const READ_PHONE_STATE: &str = "android.permission.READ_PHONE_STATE";

    pub const ACCESS_FINE_LOCATION: &str = "android.permission.ACCESS_FINE_LOCATION";
    pub const ACCESS_COARSE_LOCATION: &str = "android.permission.ACCESS_COARSE_LOCATION";
    pub const ACCESS_BACKGROUND_LOCATION: &str = "android.permission.ACCESS_BACKGROUND_LOCATION";

    pub const BODY_SENSORS: &str = "android.permission.BODY_SENSORS";
    pub const BODY_SENSORS_BACKGROUND: &str = "android.permission.BODY_SENSORS_BACKGROUND";
    pub const READ_HEALTH_DATA_IN_BACKGROUND: &str = "android.permission.health.READ_HEALTH_DATA_IN_BACKGROUND";

    pub const READ_EXTERNAL_STORAGE: &str = "android.permission.READ_EXTERNAL_STORAGE";
    pub const WRITE_EXTERNAL_STORAGE: &str = "android.permission.WRITE_EXTERNAL_STORAGE";
    pub const READ_MEDIA_IMAGES: &str = "android.permission.READ_MEDIA_IMAGES";
    pub const READ_MEDIA_VIDEO: &str = "android.permission.READ_MEDIA_VIDEO";
    pub const READ_MEDIA_AUDIO: &str = "android.permission.READ_MEDIA_AUDIO";
    pub const MANAGE_EXTERNAL_STORAGE: &str = "android.permission.MANAGE_EXTERNAL_STORAGE";

    pub const BLUETOOTH_SCAN: &str = "android.permission.BLUETOOTH_SCAN";
    pub const BLUETOOTH_CONNECT: &str = "android.permission.BLUETOOTH_CONNECT";

    pub const POST_NOTIFICATIONS: &str = "android.permission.POST_NOTIFICATIONS";
    /// Virtual right, never declared
    pub const NOTIFICATION_SERVICE: &str = "android.permission.NOTIFICATION_SERVICE";
    pub const ACCESS_NOTIFICATION_POLICY: &str = "android.permission.ACCESS_NOTIFICATION_POLICY";

    pub const GET_INSTALLED_APPS: &str = "com.android.permission.GET_INSTALLED_APPS";
    /// Not a catalog entry; only checked in the manifest
    pub const QUERY_ALL_PACKAGES: &str = "android.permission.QUERY_ALL_PACKAGES";

    pub const SYSTEM_ALERT_WINDOW: &str = "android.permission.SYSTEM_ALERT_WINDOW";
    pub const WRITE_SETTINGS: &str = "android.permission.WRITE_SETTINGS";
    pub const REQUEST_INSTALL_PACKAGES: &str = "android.permission.REQUEST_INSTALL_PACKAGES";
    pub const SCHEDULE_EXACT_ALARM: &str = "android.permission.SCHEDULE_EXACT_ALARM";
}

/// Logical categories
pub mod groups {
    pub const CAMERA: &str = "camera";
    pub const MICROPHONE: &str = "microphone";
    pub const CONTACTS: &str = "contacts";
    pub const CALENDAR: &str = "calendar";
    pub const PHONE: &str = "phone";
    pub const LOCATION: &str = "location";
    pub const SENSORS: &str = "sensors";
    pub const STORAGE: &str = "storage";
    pub const IMAGE_AND_VIDEO: &str = "image_and_video";
    pub const NEARBY_DEVICES: &str = "nearby_devices";
    pub const NOTIFICATIONS: &str = "notifications";
}

macro_rules! define_catalog {
    ($($(#[$meta:meta])* $accessor:ident => $descriptor:expr;)*) => {
        $(
            $(#[$meta])*
            pub fn $accessor() -> Permission {
                static CELL: OnceLock<Permission> = OnceLock::new();
                CELL.get_or_init(|| Permission::new($descriptor)).clone()
            }
        )*

        /// Every right in the catalog, in definition order
        pub fn all() -> Vec<Permission> {
            vec![$($accessor()),*]
        }
    };
}

define_catalog! {
    camera => DangerousPermission::new(names::CAMERA, version::ANDROID_6).group(groups::CAMERA);
    record_audio => DangerousPermission::new(names::RECORD_AUDIO, version::ANDROID_6).group(groups::MICROPHONE);
    read_contacts => DangerousPermission::new(names::READ_CONTACTS, version::ANDROID_6).group(groups::CONTACTS);
    write_contacts => DangerousPermission::new(names::WRITE_CONTACTS, version::ANDROID_6).group(groups::CONTACTS);
    read_calendar => DangerousPermission::new(names::READ_CALENDAR, version::ANDROID_6).group(groups::CALENDAR);
    read_phone_state => DangerousPermission::new(names::READ_PHONE_STATE, version::ANDROID_6).group(groups::PHONE);

    access_fine_location => DangerousPermission::new(names::ACCESS_FINE_LOCATION, version::ANDROID_6)
        .group(groups::LOCATION);
    access_coarse_location => DangerousPermission::new(names::ACCESS_COARSE_LOCATION, version::ANDROID_6)
        .group(groups::LOCATION);
    access_background_location => BackgroundPermission::new(
        names::ACCESS_BACKGROUND_LOCATION,
        version::ANDROID_10,
        &[names::ACCESS_FINE_LOCATION, names::ACCESS_COARSE_LOCATION],
    )
    .group(groups::LOCATION);

    body_sensors => DangerousPermission::new(names::BODY_SENSORS, version::ANDROID_6).group(groups::SENSORS);
    body_sensors_background => BackgroundPermission::new(
        names::BODY_SENSORS_BACKGROUND,
        version::ANDROID_13,
        &[names::BODY_SENSORS],
    )
    .group(groups::SENSORS)
    .superseded_at(version::ANDROID_16, names::READ_HEALTH_DATA_IN_BACKGROUND);

    read_external_storage => DangerousPermission::new(names::READ_EXTERNAL_STORAGE, version::ANDROID_6)
        .group(groups::STORAGE)
        .lowest_max_sdk(version::ANDROID_12_L);
    write_external_storage => DangerousPermission::new(names::WRITE_EXTERNAL_STORAGE, version::ANDROID_6)
        .group(groups::STORAGE)
        .lowest_max_sdk(version::ANDROID_10);
    read_media_images => DangerousPermission::new(names::READ_MEDIA_IMAGES, version::ANDROID_13)
        .group(groups::IMAGE_AND_VIDEO)
        .legacy(&[names::READ_EXTERNAL_STORAGE]);
    read_media_video => DangerousPermission::new(names::READ_MEDIA_VIDEO, version::ANDROID_13)
        .group(groups::IMAGE_AND_VIDEO)
        .legacy(&[names::READ_EXTERNAL_STORAGE]);
    read_media_audio => DangerousPermission::new(names::READ_MEDIA_AUDIO, version::ANDROID_13)
        .group(groups::MICROPHONE)
        .legacy(&[names::READ_EXTERNAL_STORAGE]);
    manage_external_storage => SpecialPermission::new(
        names::MANAGE_EXTERNAL_STORAGE,
        version::ANDROID_11,
        SpecialAccess::ExternalStorageManager,
        &[
            SpecialPage::App(actions::MANAGE_APP_ALL_FILES_ACCESS_PERMISSION),
            SpecialPage::Global(actions::MANAGE_ALL_FILES_ACCESS_PERMISSION),
        ],
    )
    .group(groups::STORAGE)
    .legacy(&[names::READ_EXTERNAL_STORAGE, names::WRITE_EXTERNAL_STORAGE])
    .legacy_declared_below(version::ANDROID_11);

    bluetooth_scan => DangerousPermission::new(names::BLUETOOTH_SCAN, version::ANDROID_12).group(groups::NEARBY_DEVICES);
    bluetooth_connect => DangerousPermission::new(names::BLUETOOTH_CONNECT, version::ANDROID_12)
        .group(groups::NEARBY_DEVICES);

    post_notifications => DangerousPermission::new(names::POST_NOTIFICATIONS, version::ANDROID_13)
        .group(groups::NOTIFICATIONS)
        .legacy(&[names::NOTIFICATION_SERVICE])
        .settings_via_legacy();
    notification_service => NotificationServicePermission;
    access_notification_policy => NotificationPolicyPermission;

    get_installed_apps => GetInstalledAppsPermission;

    system_alert_window => SpecialPermission::new(
        names::SYSTEM_ALERT_WINDOW,
        version::ANDROID_6,
        SpecialAccess::DrawOverlays,
        &[SpecialPage::App(actions::MANAGE_OVERLAY_PERMISSION)],
    )
    .xiaomi_editor_first();
    write_settings => SpecialPermission::new(
        names::WRITE_SETTINGS,
        version::ANDROID_6,
        SpecialAccess::WriteSettings,
        &[SpecialPage::App(actions::MANAGE_WRITE_SETTINGS)],
    );
    request_install_packages => SpecialPermission::new(
        names::REQUEST_INSTALL_PACKAGES,
        version::ANDROID_8,
        SpecialAccess::InstallPackages,
        &[SpecialPage::App(actions::MANAGE_UNKNOWN_APP_SOURCES)],
    );
    /// Exact alarms are pre-granted on Android 12, so an unreadable switch counts as held
    schedule_exact_alarm => SpecialPermission::new(
        names::SCHEDULE_EXACT_ALARM,
        version::ANDROID_12,
        SpecialAccess::ScheduleExactAlarms,
        &[SpecialPage::App(actions::REQUEST_SCHEDULE_EXACT_ALARM)],
    )
    .default_granted(true);
}

/// Look a right up by its exact name
pub fn find(name: &str) -> Option<Permission> {
    static INDEX: OnceLock<HashMap<String, Permission>> = OnceLock::new();
    INDEX
        .get_or_init(|| all().into_iter().map(|p| (p.name().to_string(), p)).collect())
        .get(name)
        .cloned()
}

/// Rights of a logical category, in definition order
pub fn group(group: &str) -> Vec<Permission> {
    all().into_iter().filter(|p| p.group() == Some(group)).collect()
}

/// Namespaced access to the catalog functions
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionCatalog;

impl PermissionCatalog {
    pub fn find(name: &str) -> Option<Permission> {
        find(name)
    }

    pub fn all() -> Vec<Permission> {
        all()
    }

    pub fn group(group: &str) -> Vec<Permission> {
        self::group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let all = all();
        let unique: HashSet<_> = all.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn test_find_every_entry() {
        for permission in all() {
            assert_eq!(find(permission.name()), Some(permission.clone()));
        }
        assert!(find(names::QUERY_ALL_PACKAGES).is_none());
        assert!(find("android.permission.camera").is_none());
    }

    #[test]
    fn test_legacy_and_foreground_names_resolve() {
        let platform = crate::platform::MemoryPlatform::new(version::ANDROID_5);
        for permission in all() {
            let legacy = permission.legacy_permissions(&platform);
            let foreground = permission.foreground_permissions(&platform);
            assert!(legacy.iter().chain(foreground.iter()).all(|p| find(p.name()).is_some()));
        }
        assert_eq!(read_media_images().legacy_permissions(&platform).len(), 1);
        assert_eq!(access_background_location().foreground_permissions(&platform).len(), 2);
    }

    #[test]
    fn test_group_lookup() {
        let location = PermissionCatalog::group(groups::LOCATION);
        assert_eq!(
            location,
            vec![access_fine_location(), access_coarse_location(), access_background_location()]
        );
    }
}
