//! Sample records and provenance metadata
//!
//! A [`SampleRecord`] is the immutable result of one kernel run: the raw
//! value buffer plus the kernel, grid shape, capture time, and an opaque
//! provenance record describing the host and GPU that produced it. The core
//! never interprets provenance; it is carried verbatim into the corpus so
//! samples from different machines stay comparable.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::kernel::Kernel;

/// Host environment strings, browser-navigator shaped for corpus
/// compatibility. Unavailable fields are empty strings, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigator {
    /// Application name
    pub app_name: String,
    /// Application version
    pub app_version: String,
    /// Host platform (OS/arch)
    pub platform: String,
    /// Full user-agent-like string
    pub user_agent: String,
}

/// GPU identification strings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlInfo {
    /// Driver/backend vendor string
    pub vendor: String,
    /// Adapter/renderer name
    pub renderer: String,
}

/// Opaque provenance attached to every sample record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provenance {
    /// Host environment
    pub navigator: Navigator,
    /// GPU identification
    pub gl_info: GlInfo,
}

/// Collaborator contract: best-effort provenance collection.
///
/// Implementations must not fail; a field that cannot be determined is an
/// empty string.
pub trait ProvenanceCollector {
    /// Collect the current environment's provenance
    fn collect(&self) -> Provenance;
}

/// Host-process provenance: crate identity plus OS/arch, with optional GPU
/// strings supplied by the surface.
#[derive(Debug, Clone, Default)]
pub struct HostProvenance {
    gl_info: GlInfo,
}

impl HostProvenance {
    /// Provenance with empty GPU strings (e.g. host-baseline-only runs)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provenance carrying the surface's adapter strings
    #[must_use]
    pub fn with_gl_info(gl_info: GlInfo) -> Self {
        Self { gl_info }
    }
}

impl ProvenanceCollector for HostProvenance {
    fn collect(&self) -> Provenance {
        Provenance {
            navigator: Navigator {
                app_name: env!("CARGO_PKG_NAME").to_string(),
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
                user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            },
            gl_info: self.gl_info.clone(),
        }
    }
}

/// The sampled result of one kernel run. Append-only data: never mutated
/// after capture.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    /// Kernel name + source, carried for display and provenance
    pub kernel: Kernel,
    /// Grid width
    pub width: u32,
    /// Grid height
    pub height: u32,
    /// Row-major samples, `index = y*width + x`, nominally in [0,1)
    pub values: Vec<f32>,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
    /// Opaque environment record
    pub environment: Provenance,
}

impl SampleRecord {
    /// Construct a record, enforcing `values.len() == width*height`.
    ///
    /// # Errors
    ///
    /// [`CodecError::LengthMismatch`] if the buffer does not match the grid.
    pub fn new(
        kernel: Kernel,
        width: u32,
        height: u32,
        values: Vec<f32>,
        timestamp: i64,
        environment: Provenance,
    ) -> Result<Self, CodecError> {
        let expected = (width as usize) * (height as usize);
        if values.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            kernel,
            width,
            height,
            values,
            timestamp,
            environment,
        })
    }

    /// Construct a record stamped with the current time.
    ///
    /// # Errors
    ///
    /// [`CodecError::LengthMismatch`] if the buffer does not match the grid.
    pub fn capture(
        kernel: Kernel,
        width: u32,
        height: u32,
        values: Vec<f32>,
        environment: Provenance,
    ) -> Result<Self, CodecError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        Self::new(kernel, width, height, values, timestamp, environment)
    }

    /// Total sample count (`width * height`)
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;

    #[test]
    fn test_record_rejects_shape_mismatch() {
        let err = SampleRecord::new(
            Kernel::host_baseline("Javascript"),
            3,
            3,
            vec![0.0; 8],
            0,
            Provenance::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CodecError::LengthMismatch {
                expected: 9,
                actual: 8
            }
        ));
    }

    #[test]
    fn test_capture_stamps_current_time() {
        let before = chrono::Utc::now().timestamp_millis();
        let record = SampleRecord::capture(
            Kernel::host_baseline("Javascript"),
            2,
            2,
            vec![0.1, 0.2, 0.3, 0.4],
            Provenance::default(),
        )
        .unwrap();
        let after = chrono::Utc::now().timestamp_millis();
        assert!(record.timestamp >= before && record.timestamp <= after);
    }

    #[test]
    fn test_host_provenance_never_fails() {
        let provenance = HostProvenance::new().collect();
        assert!(!provenance.navigator.platform.is_empty());
        assert!(provenance.gl_info.vendor.is_empty());
        assert!(provenance.gl_info.renderer.is_empty());
    }

    #[test]
    fn test_navigator_wire_field_names() {
        let json = serde_json::to_value(Navigator::default()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["appName", "appVersion", "platform", "userAgent"]);
    }
}
