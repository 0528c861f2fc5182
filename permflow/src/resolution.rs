//! Resolution engine
//!
//! Pure decision logic over a platform and a batch: legacy substitution, grant
//! classification, settings destination selection and timing.

use permflow_api::{PermissionChannel, SettingsDestination};
use std::time::Duration;

use crate::permission::{contains_permission, Permission};
use crate::platform::Platform;

/// Granted / denied split of a batch
///
/// Both lists keep the batch order and never share an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub granted: Vec<Permission>,
    pub denied: Vec<Permission>,
}

impl Resolution {
    /// Whether nothing was denied
    pub fn all_granted(&self) -> bool {
        self.denied.is_empty()
    }

    pub fn len(&self) -> usize {
        self.granted.len() + self.denied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Legacy substitution
// ============================================================================

/// Inline legacy substitutes right after every right newer than the system
///
/// Substitutes already in the batch are skipped, and substitutes are not
/// themselves expanded.
pub fn add_legacy_permissions(platform: &dyn Platform, batch: &[Permission]) -> Vec<Permission> {
    let sdk = platform.sdk_version();
    let mut augmented = batch.to_vec();
    let mut index = 0;

    while index < augmented.len() {
        let current = augmented[index].clone();
        index += 1;
        if current.from_version(platform) <= sdk {
            continue;
        }
        for legacy in current.legacy_permissions(platform) {
            if contains_permission(&augmented, &legacy) {
                continue;
            }
            tracing::debug!(permission = %current, legacy = %legacy, "Adding legacy permission");
            augmented.insert(index, legacy);
            index += 1;
        }
    }

    augmented
}

// ============================================================================
// Grant classification
// ============================================================================

/// Whether a single right is held
pub fn is_granted(platform: &dyn Platform, permission: &Permission) -> bool {
    permission.is_granted(platform, false)
}

/// Whether every right is held; an empty list never is
pub fn is_granted_all(platform: &dyn Platform, permissions: &[Permission]) -> bool {
    !permissions.is_empty() && permissions.iter().all(|p| is_granted(platform, p))
}

/// Held rights, in order
pub fn get_granted(platform: &dyn Platform, permissions: &[Permission]) -> Vec<Permission> {
    classify(platform, permissions).granted
}

/// Rights not held, in order
pub fn get_denied(platform: &dyn Platform, permissions: &[Permission]) -> Vec<Permission> {
    classify(platform, permissions).denied
}

/// Split into held and not held rights
pub fn classify(platform: &dyn Platform, permissions: &[Permission]) -> Resolution {
    let (granted, denied) = permissions
        .iter()
        .cloned()
        .partition(|p| is_granted(platform, p));
    Resolution { granted, denied }
}

/// Whether a single right is permanently denied
pub fn is_permanently_denied(platform: &dyn Platform, permission: &Permission) -> bool {
    permission.is_permanently_denied(platform)
}

/// Whether any right is permanently denied
pub fn is_permanently_denied_any(platform: &dyn Platform, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| p.is_permanently_denied(platform))
}

/// Whether any right goes through a settings page on this system
pub fn contains_settings_page(platform: &dyn Platform, permissions: &[Permission]) -> bool {
    permissions
        .iter()
        .any(|p| p.channel(platform) == PermissionChannel::SettingsPage)
}

// ============================================================================
// Settings destination
// ============================================================================

/// The one destination list that covers every right, if there is one
///
/// Rights the system does not know are ignored. Legacy substitutes of a right
/// that is handled through settings are dropped in favor of the newer right.
/// When the remaining rights disagree on their pages, the generic list is
/// returned instead of guessing.
pub fn best_settings_destinations(
    platform: &dyn Platform,
    permissions: &[Permission],
    skip_side_effects: bool,
) -> Vec<SettingsDestination> {
    let sdk = platform.sdk_version();
    let mut candidates: Vec<Permission> = permissions
        .iter()
        .filter(|p| p.from_version(platform) <= sdk)
        .cloned()
        .collect();

    // only rights that exist here may supersede their substitutes
    for permission in candidates.clone() {
        let legacy = permission.legacy_permissions(platform);
        if legacy.is_empty() {
            continue;
        }
        let via_settings = permission.channel(platform) == PermissionChannel::SettingsPage
            || legacy
                .iter()
                .any(|l| l.channel(platform) == PermissionChannel::SettingsPage);
        if via_settings {
            candidates.retain(|c| !legacy.contains(c));
        }
    }

    let common = || SettingsDestination::common(platform.package_name());
    match candidates.as_slice() {
        [] => common(),
        [only] => only.settings_destinations(platform, skip_side_effects),
        [first, rest @ ..] => {
            let shared = first.settings_destinations(platform, skip_side_effects);
            let converged = rest
                .iter()
                .all(|p| p.settings_destinations(platform, skip_side_effects) == shared);
            if converged {
                shared
            } else {
                common()
            }
        }
    }
}

// ============================================================================
// Timing
// ============================================================================

/// Longest pause any right asks for between request groups
pub fn max_request_interval(platform: &dyn Platform, permissions: &[Permission]) -> Duration {
    permissions
        .iter()
        .map(|p| p.request_interval(platform))
        .filter(|d| !d.is_zero())
        .max()
        .unwrap_or_default()
}

/// Longest wait any right asks for before its grant state is observable
pub fn max_result_wait(platform: &dyn Platform, permissions: &[Permission]) -> Duration {
    permissions
        .iter()
        .map(|p| p.result_wait(platform))
        .filter(|d| !d.is_zero())
        .max()
        .unwrap_or_default()
}
