//! Compliance against manifest snapshots loaded from disk

use permflow::catalog::{self, names};
use permflow::host::{PromptAnswer, RecordingHost};
use permflow::platform::MemoryPlatform;
use permflow::{ConfigurationError, CycleState, Error, PermissionRequest};
use permflow_api::{version, ManifestSnapshot};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_manifest(json: &str) -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[tokio::test]
async fn test_undeclared_right_names_declaration() -> anyhow::Result<()> {
    let file = write_manifest(
        r#"{ "permissions": [ { "name": "android.permission.CAMERA" } ] }"#,
    )?;
    let manifest = ManifestSnapshot::from_path(file.path())?;
    let platform = Arc::new(MemoryPlatform::new(version::ANDROID_13));
    let host = RecordingHost::new(platform.clone());

    let result = PermissionRequest::with_host(platform.as_ref(), &host)
        .add_permission(catalog::camera())
        .add_permission(catalog::record_audio())
        .manifest(&manifest)
        .execute_silently()
        .await;

    let Err(Error::Configuration(err)) = result else {
        panic!("expected a configuration error");
    };
    assert_eq!(
        err,
        ConfigurationError::NotDeclared {
            permission: names::RECORD_AUDIO.to_string()
        }
    );
    assert!(err
        .to_string()
        .contains("<uses-permission android:name=\"android.permission.RECORD_AUDIO\" />"));
    assert_eq!(host.event_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_legacy_declarations_checked_against_min_sdk() -> anyhow::Result<()> {
    let file = write_manifest(
        r#"{
            "uses_sdk": { "min_sdk_version": 24 },
            "permissions": [
                { "name": "android.permission.MANAGE_EXTERNAL_STORAGE" },
                { "name": "android.permission.READ_EXTERNAL_STORAGE" },
                { "name": "android.permission.WRITE_EXTERNAL_STORAGE", "max_sdk_version": 28 }
            ]
        }"#,
    )?;
    let manifest = ManifestSnapshot::from_path(file.path())?;
    let platform = Arc::new(MemoryPlatform::new(version::ANDROID_13));
    let host = RecordingHost::new(platform.clone());

    let result = PermissionRequest::with_host(platform.as_ref(), &host)
        .add_permission(catalog::manage_external_storage())
        .manifest(&manifest)
        .execute_silently()
        .await;

    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::MaxSdkTooLow {
            declared: 28,
            required: 29,
            ..
        }))
    ));
    Ok(())
}

#[tokio::test]
async fn test_declared_batch_runs() -> anyhow::Result<()> {
    let file = write_manifest(
        r#"{
            "permissions": [
                { "name": "android.permission.CAMERA" },
                { "name": "android.permission.RECORD_AUDIO" }
            ]
        }"#,
    )?;
    let manifest = ManifestSnapshot::from_path(file.path())?;
    let platform = Arc::new(MemoryPlatform::new(version::ANDROID_13));
    let host = RecordingHost::new(platform.clone()).answer(names::CAMERA, PromptAnswer::Grant);

    let outcome = PermissionRequest::with_host(platform.as_ref(), &host)
        .add_permissions([catalog::camera(), catalog::record_audio()])
        .manifest(&manifest)
        .execute_silently()
        .await?;

    assert_eq!(outcome.state, CycleState::Completed);
    let resolution = outcome.resolution.expect("classification delivered");
    assert_eq!(resolution.granted, vec![catalog::camera()]);
    assert_eq!(resolution.denied, vec![catalog::record_audio()]);
    Ok(())
}

#[tokio::test]
async fn test_disabled_compliance_ignores_manifest() -> anyhow::Result<()> {
    let manifest = ManifestSnapshot::new();
    let platform = Arc::new(MemoryPlatform::new(version::ANDROID_13));
    let host = RecordingHost::new(platform.clone());

    let outcome = PermissionRequest::with_host(platform.as_ref(), &host)
        .add_permission(catalog::camera())
        .manifest(&manifest)
        .disable_compliance_mode()
        .execute_silently()
        .await?;

    assert_eq!(outcome.state, CycleState::Completed);
    assert_eq!(host.prompts().len(), 1);
    Ok(())
}

#[test]
fn test_malformed_snapshot_is_an_error() -> anyhow::Result<()> {
    let file = write_manifest("{ \"permissions\": [ { \"max_sdk_version\": 3 } ] }")?;
    let err = ManifestSnapshot::from_path(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse manifest snapshot"));
    Ok(())
}
