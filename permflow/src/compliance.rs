//! Compliance checker
//!
//! Diagnostic pass over a batch before any prompt is shown. It never mutates
//! the batch; the first violation is returned as a [`ConfigurationError`].

use permflow_api::ManifestSnapshot;

use crate::error::ConfigurationError;
use crate::permission::{ComplianceContext, Permission};
use crate::platform::Platform;

/// Validates a batch against the running system and the declared rights
pub struct ComplianceChecker<'a> {
    platform: &'a dyn Platform,
    manifest: Option<&'a ManifestSnapshot>,
}

impl<'a> ComplianceChecker<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self {
            platform,
            manifest: None,
        }
    }

    /// Enable the declaration rules
    pub fn with_manifest(mut self, manifest: &'a ManifestSnapshot) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Check every right in order, stopping at the first violation
    pub fn check(&self, batch: &[Permission]) -> Result<(), ConfigurationError> {
        if batch.is_empty() {
            tracing::warn!("Compliance failed: empty batch");
            return Err(ConfigurationError::EmptyBatch);
        }

        let ctx = ComplianceContext {
            platform: self.platform,
            batch,
            manifest: self.manifest,
        };

        for permission in batch {
            if let Err(e) = permission.check_compliance(&ctx) {
                tracing::warn!(permission = %permission, error = %e, "Compliance failed");
                return Err(e);
            }
        }

        tracing::debug!(
            count = batch.len(),
            manifest = self.manifest.is_some(),
            "Compliance passed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, names};
    use crate::platform::MemoryPlatform;
    use permflow_api::version;

    #[test]
    fn test_empty_batch_rejected() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        assert_eq!(
            ComplianceChecker::new(&platform).check(&[]),
            Err(ConfigurationError::EmptyBatch)
        );
    }

    #[test]
    fn test_background_before_foreground_fails() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let checker = ComplianceChecker::new(&platform);

        let wrong = [catalog::access_background_location(), catalog::access_fine_location()];
        let err = checker.check(&wrong).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::PrerequisiteOrder {
                permission: names::ACCESS_BACKGROUND_LOCATION.into(),
                prerequisite: names::ACCESS_FINE_LOCATION.into(),
            }
        );
        let message = err.to_string();
        assert!(message.contains(names::ACCESS_BACKGROUND_LOCATION));
        assert!(message.contains(names::ACCESS_FINE_LOCATION));

        let right = [catalog::access_fine_location(), catalog::access_background_location()];
        assert!(checker.check(&right).is_ok());
    }

    #[test]
    fn test_missing_foreground_fails() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let err = ComplianceChecker::new(&platform)
            .check(&[catalog::body_sensors_background()])
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingPrerequisite { .. }));
    }

    #[test]
    fn test_target_sdk_too_low() {
        let platform = MemoryPlatform::new(version::ANDROID_13).with_target_sdk(version::ANDROID_12);
        let err = ComplianceChecker::new(&platform)
            .check(&[catalog::post_notifications()])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::TargetSdkTooLow {
                permission: names::POST_NOTIFICATIONS.into(),
                required: version::ANDROID_13,
                actual: version::ANDROID_12,
            }
        );
    }

    #[test]
    fn test_manifest_rules_only_with_snapshot() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let batch = [catalog::camera()];

        assert!(ComplianceChecker::new(&platform).check(&batch).is_ok());

        let manifest = ManifestSnapshot::new();
        let err = ComplianceChecker::new(&platform)
            .with_manifest(&manifest)
            .check(&batch)
            .unwrap_err();
        assert_eq!(err.permission(), Some(names::CAMERA));
    }

    #[test]
    fn test_first_violation_wins() {
        let platform = MemoryPlatform::new(version::ANDROID_13);
        let manifest = ManifestSnapshot::new().declare(names::RECORD_AUDIO);
        let err = ComplianceChecker::new(&platform)
            .with_manifest(&manifest)
            .check(&[catalog::record_audio(), catalog::camera(), catalog::read_contacts()])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NotDeclared {
                permission: names::CAMERA.into()
            }
        );
    }
}
