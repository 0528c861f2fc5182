//! Building blocks shared by descriptor implementations

use permflow_api::{ManifestSnapshot, SettingsDestination, DEFAULT_MAX_SDK_VERSION};
use std::time::Duration;

use super::{ComplianceContext, Permission, PermissionDescriptor};
use crate::catalog;
use crate::error::ConfigurationError;
use crate::platform::Platform;

/// Fail when the application targets an API level below the right's minimum
pub fn check_target_sdk<D: PermissionDescriptor + ?Sized>(
    descriptor: &D,
    ctx: &ComplianceContext<'_>,
) -> Result<(), ConfigurationError> {
    let required = descriptor.min_target_sdk(ctx.platform);
    let actual = ctx.platform.target_sdk_version();
    if actual >= required {
        return Ok(());
    }
    Err(ConfigurationError::TargetSdkTooLow {
        permission: descriptor.name().to_string(),
        required,
        actual,
    })
}

/// Require the descriptor's own declaration when it must be declared
pub fn check_declared_self<D: PermissionDescriptor + ?Sized>(
    descriptor: &D,
    manifest: &ManifestSnapshot,
) -> Result<(), ConfigurationError> {
    if !descriptor.must_declare() {
        return Ok(());
    }
    require_declared(manifest, descriptor.name(), DEFAULT_MAX_SDK_VERSION)
}

/// Require a declaration whose `max_sdk_version` is at least `lowest_max_sdk`
pub fn require_declared(
    manifest: &ManifestSnapshot,
    name: &str,
    lowest_max_sdk: u32,
) -> Result<(), ConfigurationError> {
    let Some(info) = manifest.find(name) else {
        return Err(ConfigurationError::NotDeclared {
            permission: name.to_string(),
        });
    };
    if info.max_sdk_version < lowest_max_sdk {
        return Err(ConfigurationError::MaxSdkTooLow {
            permission: name.to_string(),
            declared: info.max_sdk_version,
            required: lowest_max_sdk,
        });
    }
    Ok(())
}

/// Require one of `prerequisites` in the batch, each placed before `permission`
pub fn require_prerequisite(
    ctx: &ComplianceContext<'_>,
    permission: &str,
    prerequisites: &[&str],
) -> Result<(), ConfigurationError> {
    let present: Vec<(&str, usize)> = prerequisites
        .iter()
        .filter_map(|name| ctx.position(name).map(|index| (*name, index)))
        .collect();

    if present.is_empty() {
        return Err(ConfigurationError::MissingPrerequisite {
            permission: permission.to_string(),
            prerequisite: prerequisites.join("\" or \""),
        });
    }

    let own = ctx.position(permission).unwrap_or(usize::MAX);
    match present.iter().find(|(_, index)| *index > own) {
        Some((name, _)) => Err(ConfigurationError::PrerequisiteOrder {
            permission: permission.to_string(),
            prerequisite: (*name).to_string(),
        }),
        None => Ok(()),
    }
}

/// Resolve catalog names into descriptors, skipping unknown names
pub fn lookup_all(names: &[&str]) -> Vec<Permission> {
    names.iter().filter_map(|name| catalog::find(name)).collect()
}

/// Whether the Xiaomi permission editor is the right first stop
pub fn prefers_xiaomi_editor(platform: &dyn Platform) -> bool {
    let os = platform.device_os();
    os.is_xiaomi() && os.china_build && os.is_optimization_enabled()
}

/// `specific` followed by the common settings tail
pub fn with_common_tail(
    platform: &dyn Platform,
    specific: impl IntoIterator<Item = SettingsDestination>,
) -> Vec<SettingsDestination> {
    let mut list: Vec<SettingsDestination> = specific.into_iter().collect();
    list.extend(SettingsDestination::common(platform.package_name()));
    list
}

/// Wait after returning from a settings page before the switch is observable
///
/// Huawei-family settings apps commit the toggle noticeably later.
pub fn settings_result_wait(platform: &dyn Platform, requestable: bool) -> Duration {
    if !requestable {
        return Duration::ZERO;
    }
    if platform.device_os().is_huawei_family() {
        Duration::from_millis(300)
    } else {
        Duration::from_millis(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::names;
    use crate::platform::MemoryPlatform;
    use permflow_api::version;

    fn ctx<'a>(
        platform: &'a MemoryPlatform,
        batch: &'a [Permission],
        manifest: Option<&'a ManifestSnapshot>,
    ) -> ComplianceContext<'a> {
        ComplianceContext {
            platform,
            batch,
            manifest,
        }
    }

    #[test]
    fn test_require_declared() {
        let manifest = ManifestSnapshot::new()
            .declare(names::CAMERA)
            .declare_with_max_sdk(names::WRITE_EXTERNAL_STORAGE, 28);

        assert!(require_declared(&manifest, names::CAMERA, DEFAULT_MAX_SDK_VERSION).is_ok());
        assert_eq!(
            require_declared(&manifest, names::RECORD_AUDIO, DEFAULT_MAX_SDK_VERSION),
            Err(ConfigurationError::NotDeclared {
                permission: names::RECORD_AUDIO.into()
            })
        );
        assert!(matches!(
            require_declared(&manifest, names::WRITE_EXTERNAL_STORAGE, version::ANDROID_10),
            Err(ConfigurationError::MaxSdkTooLow { declared: 28, .. })
        ));
    }

    #[test]
    fn test_require_prerequisite_any_of() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let batch = lookup_all(&[names::ACCESS_COARSE_LOCATION, names::ACCESS_BACKGROUND_LOCATION]);
        let prerequisites = [names::ACCESS_FINE_LOCATION, names::ACCESS_COARSE_LOCATION];

        assert!(require_prerequisite(
            &ctx(&platform, &batch, None),
            names::ACCESS_BACKGROUND_LOCATION,
            &prerequisites
        )
        .is_ok());

        let batch = lookup_all(&[names::ACCESS_BACKGROUND_LOCATION]);
        let err = require_prerequisite(
            &ctx(&platform, &batch, None),
            names::ACCESS_BACKGROUND_LOCATION,
            &prerequisites,
        )
        .unwrap_err();
        assert!(err.to_string().contains(names::ACCESS_FINE_LOCATION));
        assert!(err.to_string().contains(names::ACCESS_COARSE_LOCATION));
    }

    #[test]
    fn test_settings_result_wait() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        assert_eq!(settings_result_wait(&platform, false), Duration::ZERO);
        assert_eq!(settings_result_wait(&platform, true), Duration::from_millis(200));

        let platform = platform.with_device_os(permflow_api::DeviceOs::new(
            permflow_api::OsKind::HarmonyOs,
        ));
        assert_eq!(settings_result_wait(&platform, true), Duration::from_millis(300));
    }
}
