//! Permission descriptors
//!
//! Each distinct right is a type implementing [`PermissionDescriptor`]. Version
//! and vendor branching lives inside the implementing type, so adding a right
//! never touches the resolution or orchestration code.
//!
//! Descriptors are shared through the cheap, clonable [`Permission`] handle.
//! Two handles are equal iff their names are equal (case-sensitive); a handle
//! also compares equal to a raw name.
//!
//! # Families
//!
//! | Type | Channel | Examples |
//! |------|---------|----------|
//! | [`DangerousPermission`] | runtime prompt | CAMERA, READ_MEDIA_IMAGES, POST_NOTIFICATIONS |
//! | [`BackgroundPermission`] | runtime prompt after foreground | ACCESS_BACKGROUND_LOCATION |
//! | [`GetInstalledAppsPermission`] | vendor dependent | GET_INSTALLED_APPS |
//! | [`NotificationServicePermission`] | settings page | NOTIFICATION_SERVICE |
//! | [`NotificationPolicyPermission`] | settings page | ACCESS_NOTIFICATION_POLICY |
//! | [`SpecialPermission`] | settings page | SYSTEM_ALERT_WINDOW, MANAGE_EXTERNAL_STORAGE |

use permflow_api::{ManifestSnapshot, PageType, PermissionChannel, SettingsDestination};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::platform::{self, Platform};

pub mod background;
pub mod base;
pub mod dangerous;
pub mod installed_apps;
pub mod notification;
pub mod special;

pub use background::BackgroundPermission;
pub use dangerous::DangerousPermission;
pub use installed_apps::GetInstalledAppsPermission;
pub use notification::{NotificationPolicyPermission, NotificationServicePermission};
pub use special::SpecialPermission;

/// Inputs to a descriptor's compliance rules
#[derive(Clone, Copy)]
pub struct ComplianceContext<'a> {
    /// Running system
    pub platform: &'a dyn Platform,
    /// Batch as submitted, before legacy substitution
    pub batch: &'a [Permission],
    /// Declared rights, when a snapshot is available
    pub manifest: Option<&'a ManifestSnapshot>,
}

impl ComplianceContext<'_> {
    /// Effective minimum API level of the application
    pub fn min_sdk_version(&self) -> u32 {
        platform::min_sdk_version(self.platform, self.manifest)
    }

    /// Position of a right in the batch
    pub fn position(&self, name: &str) -> Option<usize> {
        self.batch.iter().position(|p| p.name() == name)
    }
}

/// Capability interface of a single right
///
/// Only [`name`](Self::name), [`from_version`](Self::from_version),
/// [`is_granted`](Self::is_granted), [`is_permanently_denied`](Self::is_permanently_denied)
/// and [`must_declare`](Self::must_declare) are required; everything else has
/// the behavior of a plain right with no substitutes.
pub trait PermissionDescriptor: Send + Sync + fmt::Debug {
    /// Stable, globally unique name
    fn name(&self) -> &str;

    /// Logical category, e.g. "sensors"
    fn group(&self) -> Option<&str> {
        None
    }

    /// First API level on which the right exists
    fn from_version(&self, platform: &dyn Platform) -> u32;

    /// Older rights that stand in for this one below [`from_version`](Self::from_version)
    fn legacy_permissions(&self, _platform: &dyn Platform) -> Vec<Permission> {
        Vec::new()
    }

    /// Foreground rights a background right depends on
    fn foreground_permissions(&self, _platform: &dyn Platform) -> Vec<Permission> {
        Vec::new()
    }

    /// Whether this is the background companion of a foreground right
    fn is_background(&self, _platform: &dyn Platform) -> bool {
        false
    }

    /// How the right is obtained on the running system
    fn channel(&self, _platform: &dyn Platform) -> PermissionChannel {
        PermissionChannel::RuntimePrompt
    }

    /// Page kind used when the right is obtained through settings
    fn page_type(&self, _platform: &dyn Platform) -> PageType {
        PageType::Opaque
    }

    /// Name handed to the host's runtime prompt
    fn request_name(&self, _platform: &dyn Platform) -> String {
        self.name().to_string()
    }

    /// Whether the running system can actually ask for this right
    fn is_requestable(&self, platform: &dyn Platform) -> bool {
        platform.sdk_version() >= self.from_version(platform)
    }

    /// Whether the right is currently held
    ///
    /// `skip_side_effects` asks implementations not to trigger anything that
    /// could influence later state (used right before showing a prompt).
    fn is_granted(&self, platform: &dyn Platform, skip_side_effects: bool) -> bool;

    /// Whether the user refused the right in a way no prompt can undo
    ///
    /// Only meaningful after at least one prompt cycle.
    fn is_permanently_denied(&self, platform: &dyn Platform) -> bool;

    /// Settings pages for this right, most specific first
    fn settings_destinations(
        &self,
        platform: &dyn Platform,
        _skip_side_effects: bool,
    ) -> Vec<SettingsDestination> {
        SettingsDestination::common(platform.package_name())
    }

    /// Pause before requesting this right after the previous group
    fn request_interval(&self, _platform: &dyn Platform) -> Duration {
        Duration::ZERO
    }

    /// Longest wait for an asynchronous grant confirmation
    fn result_wait(&self, _platform: &dyn Platform) -> Duration {
        Duration::ZERO
    }

    /// Whether the right must be declared in the manifest
    fn must_declare(&self) -> bool;

    /// Lowest target API level that may request this right
    fn min_target_sdk(&self, platform: &dyn Platform) -> u32 {
        self.from_version(platform)
    }

    /// Validate target API level, manifest and batch shape
    fn check_compliance(&self, ctx: &ComplianceContext<'_>) -> Result<(), ConfigurationError> {
        self.check_target_sdk(ctx)?;
        if let Some(manifest) = ctx.manifest {
            self.check_manifest(ctx, manifest)?;
        }
        self.check_batch(ctx)
    }

    /// Target API level rule
    fn check_target_sdk(&self, ctx: &ComplianceContext<'_>) -> Result<(), ConfigurationError> {
        base::check_target_sdk(self, ctx)
    }

    /// Manifest declaration rules
    fn check_manifest(
        &self,
        _ctx: &ComplianceContext<'_>,
        manifest: &ManifestSnapshot,
    ) -> Result<(), ConfigurationError> {
        base::check_declared_self(self, manifest)
    }

    /// Rules about other rights in the same batch
    fn check_batch(&self, _ctx: &ComplianceContext<'_>) -> Result<(), ConfigurationError> {
        Ok(())
    }
}

/// Shared handle to a descriptor
#[derive(Clone)]
pub struct Permission(Arc<dyn PermissionDescriptor>);

impl Permission {
    pub fn new(descriptor: impl PermissionDescriptor + 'static) -> Self {
        Self(Arc::new(descriptor))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }
}

impl Deref for Permission {
    type Target = dyn PermissionDescriptor;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Permission {}

impl Hash for Permission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl PartialEq<str> for Permission {
    fn eq(&self, other: &str) -> bool {
        self.name() == other
    }
}

impl PartialEq<&str> for Permission {
    fn eq(&self, other: &&str) -> bool {
        self.name() == *other
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Permission").field(&self.name()).finish()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that identifies a right by name
pub trait PermissionName {
    fn permission_name(&self) -> &str;
}

impl PermissionName for Permission {
    fn permission_name(&self) -> &str {
        self.name()
    }
}

impl PermissionName for str {
    fn permission_name(&self) -> &str {
        self
    }
}

impl PermissionName for String {
    fn permission_name(&self) -> &str {
        self
    }
}

impl<T: PermissionName + ?Sized> PermissionName for &T {
    fn permission_name(&self) -> &str {
        (**self).permission_name()
    }
}

/// Name identity between two rights
pub fn equals_permission(a: &(impl PermissionName + ?Sized), b: &(impl PermissionName + ?Sized)) -> bool {
    a.permission_name() == b.permission_name()
}

/// Whether `permissions` holds a right with the given name
pub fn contains_permission(permissions: &[Permission], target: &(impl PermissionName + ?Sized)) -> bool {
    permissions
        .iter()
        .any(|p| p.name() == target.permission_name())
}

/// Health Connect rights share a name prefix
pub fn is_health_permission(permission: &(impl PermissionName + ?Sized)) -> bool {
    permission
        .permission_name()
        .starts_with("android.permission.health.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, names};
    use std::collections::HashSet;

    #[test]
    fn test_equality_is_by_name() {
        let camera = catalog::camera();
        let again = catalog::find(names::CAMERA).unwrap();

        assert_eq!(camera, again);
        assert!(camera == names::CAMERA);
        assert!(equals_permission(&camera, names::CAMERA));
        assert!(equals_permission(names::CAMERA, &String::from(names::CAMERA)));
        assert!(!equals_permission(&camera, "android.permission.camera"));
    }

    #[test]
    fn test_hash_set_membership() {
        let mut set = HashSet::new();
        set.insert(catalog::camera());
        set.insert(catalog::find(names::CAMERA).unwrap());
        set.insert(catalog::record_audio());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_contains_permission() {
        let list = vec![catalog::camera(), catalog::body_sensors()];
        assert!(contains_permission(&list, names::BODY_SENSORS));
        assert!(contains_permission(&list, &catalog::camera()));
        assert!(!contains_permission(&list, names::RECORD_AUDIO));
    }

    #[test]
    fn test_health_prefix() {
        assert!(is_health_permission("android.permission.health.READ_HEART_RATE"));
        assert!(!is_health_permission(&catalog::body_sensors()));
    }

    #[test]
    fn test_display_is_name() {
        assert_eq!(catalog::camera().to_string(), names::CAMERA);
    }
}
