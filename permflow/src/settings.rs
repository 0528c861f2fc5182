//! Settings navigator and the settings helpers of the public API

use permflow_api::{RequestCode, SettingsDestination};

use crate::error::{HostError, Result};
use crate::host::RequestHost;
use crate::interceptor::PermissionCallback;
use crate::permission::Permission;
use crate::platform::Platform;
use crate::resolution::{self, Resolution};

/// Opens the best settings page for a set of rights
pub struct SettingsNavigator<'a> {
    platform: &'a dyn Platform,
    host: &'a dyn RequestHost,
}

impl<'a> SettingsNavigator<'a> {
    pub fn new(platform: &'a dyn Platform, host: &'a dyn RequestHost) -> Self {
        Self { platform, host }
    }

    /// Pick destinations for `permissions` and open the first one that works
    ///
    /// An empty list opens the generic application pages.
    pub async fn open(
        &self,
        permissions: &[Permission],
        request_code: Option<RequestCode>,
    ) -> Option<SettingsDestination> {
        let destinations = resolution::best_settings_destinations(self.platform, permissions, false);
        self.navigate(&destinations, request_code).await
    }

    /// Try `destinations` in order, returning the one that opened
    ///
    /// Stops early when the host is detached.
    pub async fn navigate(
        &self,
        destinations: &[SettingsDestination],
        request_code: Option<RequestCode>,
    ) -> Option<SettingsDestination> {
        for destination in destinations {
            if !self.host.is_usable() {
                return None;
            }
            match self.host.navigate_to(destination, request_code).await {
                Ok(()) => {
                    tracing::debug!(destination = %destination, "Opened settings page");
                    return Some(destination.clone());
                }
                Err(HostError::Detached) => return None,
                Err(e) => {
                    tracing::debug!(destination = %destination, error = %e, "Settings page unavailable");
                }
            }
        }
        tracing::warn!(count = destinations.len(), "No settings page could be opened");
        None
    }
}

/// Open the settings page for `permissions`
///
/// `request_code` defaults to [`RequestCode::DEFAULT`] and must be within
/// 1..=65535.
pub async fn open_settings(
    platform: &dyn Platform,
    host: &dyn RequestHost,
    permissions: &[Permission],
    request_code: Option<u32>,
) -> Result<Option<SettingsDestination>> {
    let code = request_code.map(RequestCode::new).transpose()?.unwrap_or_default();
    Ok(SettingsNavigator::new(platform, host)
        .open(permissions, Some(code))
        .await)
}

/// Open the settings page for `permissions` and report what is held afterwards
///
/// Once the user is back, waits up to the rights' result-wait delay and then
/// delivers the classification of `permissions`. An empty list opens the
/// generic pages and invokes no callback. Nothing is delivered when the host
/// became unusable.
pub async fn open_settings_with_callback(
    platform: &dyn Platform,
    host: &dyn RequestHost,
    permissions: &[Permission],
    request_code: Option<u32>,
    mut callback: impl PermissionCallback,
) -> Result<Option<Resolution>> {
    let code = request_code.map(RequestCode::new).transpose()?.unwrap_or_default();
    let navigator = SettingsNavigator::new(platform, host);

    if permissions.is_empty() {
        let common = SettingsDestination::common(platform.package_name());
        navigator.navigate(&common, None).await;
        return Ok(None);
    }

    if navigator.open(permissions, Some(code)).await.is_none() && !host.is_usable() {
        return Ok(None);
    }

    let wait = resolution::max_result_wait(platform, permissions);
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
    if !host.is_usable() {
        return Ok(None);
    }

    let classification = resolution::classify(platform, permissions);
    callback.on_result(&classification.granted, &classification.denied);
    Ok(Some(classification))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::error::Error;
    use crate::host::RecordingHost;
    use crate::platform::{MemoryPlatform, SpecialAccess};
    use permflow_api::{actions, version};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_navigator_falls_through_unavailable_pages() {
        let platform = Arc::new(MemoryPlatform::new(version::ANDROID_13));
        let host = RecordingHost::new(platform.clone()).unavailable_destination(actions::MANAGE_WRITE_SETTINGS);

        let opened = SettingsNavigator::new(platform.as_ref(), &host)
            .open(&[catalog::write_settings()], None)
            .await;

        assert_eq!(opened, Some(SettingsDestination::application_details("com.example.app")));
        assert_eq!(host.navigations().len(), 1);
    }

    #[tokio::test]
    async fn test_open_settings_validates_code() {
        let platform = Arc::new(MemoryPlatform::new(version::ANDROID_13));
        let host = RecordingHost::new(platform.clone());

        let result = open_settings(platform.as_ref(), &host, &[], Some(0)).await;
        assert!(matches!(result, Err(Error::RequestCode(_))));
        assert!(host.events().is_empty());

        let opened = open_settings(platform.as_ref(), &host, &[], None).await.unwrap();
        assert_eq!(opened, Some(SettingsDestination::application_details("com.example.app")));
        assert_eq!(
            host.events(),
            vec![crate::host::HostEvent::Navigate {
                destination: SettingsDestination::application_details("com.example.app"),
                request_code: Some(RequestCode::DEFAULT),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_after_return() {
        let platform = Arc::new(MemoryPlatform::new(version::ANDROID_13));
        let host = RecordingHost::new(platform.clone()).enable_on_settings(SpecialAccess::WriteSettings);
        let mut delivered = Vec::new();

        let resolution = open_settings_with_callback(
            platform.as_ref(),
            &host,
            &[catalog::write_settings(), catalog::system_alert_window()],
            Some(42),
            |granted: &[Permission], denied: &[Permission]| {
                delivered.push((granted.to_vec(), denied.to_vec()));
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(resolution.granted, vec![catalog::write_settings()]);
        assert_eq!(resolution.denied, vec![catalog::system_alert_window()]);
        assert_eq!(delivered.len(), 1);
        assert_eq!(host.navigations()[0], SettingsDestination::application_details("com.example.app"));
    }

    #[tokio::test]
    async fn test_empty_list_has_no_callback() {
        let platform = Arc::new(MemoryPlatform::new(version::ANDROID_13));
        let host = RecordingHost::new(platform.clone());
        let mut calls = 0;

        let resolution = open_settings_with_callback(
            platform.as_ref(),
            &host,
            &[],
            None,
            |_: &[Permission], _: &[Permission]| calls += 1,
        )
        .await
        .unwrap();

        assert!(resolution.is_none());
        assert_eq!(calls, 0);
        assert_eq!(host.navigations()[0].package.as_deref(), Some("com.example.app"));
        assert!(!host.navigations()[0].action.is_empty());
    }
}
