//! Process-wide configuration
//!
//! Globals are shared by every test in this binary, so the whole lifecycle is
//! exercised from a single test.

use async_trait::async_trait;
use permflow::catalog::{self, names};
use permflow::config::{self, ComplianceMode, EngineConfig};
use permflow::host::{HostEvent, RecordingHost};
use permflow::interceptor::RequestStart;
use permflow::orchestrator;
use permflow::platform::MemoryPlatform;
use permflow::{
    ConfigurationError, Error, PermissionInterceptor, PermissionRequest, Resolution,
    StaticDescription,
};
use permflow_api::version;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static CREATED: AtomicUsize = AtomicUsize::new(0);

struct TrackedInterceptor;

impl TrackedInterceptor {
    fn create() -> Box<dyn PermissionInterceptor> {
        CREATED.fetch_add(1, Ordering::SeqCst);
        Box::new(TrackedInterceptor)
    }
}

#[async_trait]
impl PermissionInterceptor for TrackedInterceptor {
    async fn on_start(&self, start: RequestStart<'_>) -> Option<Resolution> {
        orchestrator::dispatch(&start).await
    }
}

fn release_platform() -> Arc<MemoryPlatform> {
    Arc::new(MemoryPlatform::new(version::ANDROID_13).with_debug_build(false))
}

#[tokio::test]
async fn test_global_config_lifecycle() {
    config::reset_global_config();
    assert_eq!(config::compliance_mode(), ComplianceMode::Auto);

    // Auto follows the first platform that asks, then sticks
    assert!(!config::is_compliance_enabled(release_platform().as_ref()));
    let debug_platform = MemoryPlatform::new(version::ANDROID_13);
    assert!(!config::is_compliance_enabled(&debug_platform));

    // release build with Auto: the empty batch is not rejected
    let platform = release_platform();
    let host = RecordingHost::new(platform.clone());
    let outcome = PermissionRequest::with_host(platform.as_ref(), &host)
        .execute_silently()
        .await
        .unwrap();
    assert_eq!(outcome.resolution.map(|r| r.len()), Some(0));

    // forcing the mode overrides the build flag
    config::set_compliance_mode(ComplianceMode::Enabled);
    let result = PermissionRequest::with_host(platform.as_ref(), &host)
        .execute_silently()
        .await;
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::EmptyBatch))
    ));

    // per-request override still wins
    let outcome = PermissionRequest::with_host(platform.as_ref(), &host)
        .disable_compliance_mode()
        .execute_silently()
        .await
        .unwrap();
    assert!(!outcome.is_discarded());

    // factories give a fresh instance per cycle
    EngineConfig::builder()
        .compliance_mode(ComplianceMode::Disabled)
        .interceptor(TrackedInterceptor::create)
        .description(|| {
            Box::new(StaticDescription::new().permission(names::CAMERA, "Take profile photos"))
        })
        .build()
        .install();
    assert_eq!(config::compliance_mode(), ComplianceMode::Disabled);

    let before = CREATED.load(Ordering::SeqCst);
    for _ in 0..2 {
        PermissionRequest::with_host(platform.as_ref(), &host)
            .add_permission(catalog::camera())
            .execute_silently()
            .await
            .unwrap();
    }
    assert_eq!(CREATED.load(Ordering::SeqCst) - before, 2);
    assert!(host
        .events()
        .contains(&HostEvent::Description("Take profile photos".to_string())));

    config::reset_global_config();
    assert_eq!(config::compliance_mode(), ComplianceMode::Auto);
    assert!(config::description()
        .describe(platform.as_ref(), &[catalog::camera()])
        .is_none());
}
