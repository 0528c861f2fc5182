//! Error types
//!
//! Configuration errors describe a mis-integrated host application and always
//! name the corrective action. Runtime ambiguities never become errors.

use permflow_api::{ManifestError, RequestCodeError, DEFAULT_MAX_SDK_VERSION};
use thiserror::Error;

/// The host application is integrated incorrectly
///
/// Raised only while compliance mode is active, before any prompt is shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("The requested permission list cannot be empty")]
    EmptyBatch,

    #[error(
        "Request \"{permission}\" permission, the targetSdkVersion must be {required} or more \
         (currently {actual}); if you do not want to upgrade targetSdkVersion, request the old permission instead"
    )]
    TargetSdkTooLow {
        permission: String,
        required: u32,
        actual: u32,
    },

    #[error(
        "Please register permissions in the AndroidManifest.xml file <uses-permission android:name=\"{permission}\" />"
    )]
    NotDeclared { permission: String },

    #[error(
        "The AndroidManifest.xml file <uses-permission android:name=\"{permission}\" android:maxSdkVersion=\"{declared}\" /> \
         does not meet the requirements, {}",
        max_sdk_advice(*declared, *required)
    )]
    MaxSdkTooLow {
        permission: String,
        declared: u32,
        required: u32,
    },

    #[error("Requesting \"{permission}\" must also request \"{prerequisite}\"")]
    MissingPrerequisite {
        permission: String,
        prerequisite: String,
    },

    #[error("Please place the \"{permission}\" permission after the \"{prerequisite}\" permission")]
    PrerequisiteOrder {
        permission: String,
        prerequisite: String,
    },

    #[error(
        "When the project targetSdkVersion is greater than or equal to {target_sdk}, the \"{permission}\" \
         permission cannot be requested, request the \"{replacement}\" permission instead"
    )]
    Superseded {
        permission: String,
        replacement: String,
        target_sdk: u32,
    },

    #[error(
        "Please register permissions in the AndroidManifest.xml file <uses-permission android:name=\"{required}\" />, \
         or add the app package name to the <queries> tag in the AndroidManifest.xml file (needed by \"{permission}\")"
    )]
    MissingPackageVisibility { permission: String, required: String },
}

fn max_sdk_advice(declared: u32, required: u32) -> String {
    if required == DEFAULT_MAX_SDK_VERSION {
        format!("please delete the android:maxSdkVersion=\"{declared}\" attribute")
    } else {
        format!("the minimum requirement for maxSdkVersion is {required}")
    }
}

impl ConfigurationError {
    /// Name of the right the error is about, if any
    pub fn permission(&self) -> Option<&str> {
        match self {
            Self::EmptyBatch => None,
            Self::TargetSdkTooLow { permission, .. }
            | Self::NotDeclared { permission }
            | Self::MaxSdkTooLow { permission, .. }
            | Self::MissingPrerequisite { permission, .. }
            | Self::PrerequisiteOrder { permission, .. }
            | Self::Superseded { permission, .. }
            | Self::MissingPackageVisibility { permission, .. } => Some(permission),
        }
    }
}

/// Failure reported by a request host
///
/// Host errors never reach the caller; they only change which classification
/// the cycle ends with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("Host is detached or destroyed")]
    Detached,

    #[error("No page can handle destination: {0}")]
    DestinationUnavailable(String),

    #[error("Prompt was cancelled")]
    Cancelled,
}

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    RequestCode(#[from] RequestCodeError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_declared_names_exact_declaration() {
        let err = ConfigurationError::NotDeclared {
            permission: "android.permission.CAMERA".into(),
        };
        assert!(err
            .to_string()
            .contains("<uses-permission android:name=\"android.permission.CAMERA\" />"));
        assert_eq!(err.permission(), Some("android.permission.CAMERA"));
    }

    #[test]
    fn test_max_sdk_advice() {
        let err = ConfigurationError::MaxSdkTooLow {
            permission: "android.permission.READ_EXTERNAL_STORAGE".into(),
            declared: 28,
            required: DEFAULT_MAX_SDK_VERSION,
        };
        assert!(err.to_string().contains("please delete"));

        let err = ConfigurationError::MaxSdkTooLow {
            permission: "android.permission.WRITE_EXTERNAL_STORAGE".into(),
            declared: 28,
            required: 29,
        };
        assert!(err.to_string().contains("minimum requirement for maxSdkVersion is 29"));
    }

    #[test]
    fn test_order_message_names_both() {
        let err = ConfigurationError::PrerequisiteOrder {
            permission: "android.permission.BODY_SENSORS_BACKGROUND".into(),
            prerequisite: "android.permission.BODY_SENSORS".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("BODY_SENSORS_BACKGROUND"));
        assert!(msg.contains("\"android.permission.BODY_SENSORS\""));
    }
}
