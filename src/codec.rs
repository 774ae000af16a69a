//! Sample codec: lossless conversion between raw and persistable records
//!
//! The persisted form replaces the f32 buffer with standard base64 over
//! consecutive little-endian IEEE-754 32-bit floats, row-major. Encoding is
//! exact: bit patterns round-trip unchanged, including NaN payloads, so a
//! decoded corpus is byte-for-byte the buffer the GPU produced.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::kernel::{Kernel, KernelSource};
use crate::sample::{GlInfo, Navigator, Provenance, SampleRecord};

/// Wire form of one corpus record. Field names are fixed by the persisted
/// corpus format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedSampleRecord {
    /// Kernel display name
    pub implementation_name: String,
    /// Kernel source (or the host-baseline sentinel)
    pub implementation: String,
    /// Grid width
    pub width: u32,
    /// Grid height
    pub height: u32,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
    /// Host environment strings
    pub navigator: Navigator,
    /// GPU identification strings
    pub gl_info: GlInfo,
    /// base64 of little-endian f32 samples, row-major
    #[serde(rename = "base64values")]
    pub base64_values: String,
}

/// Encode a record for persistence. Lossless by construction.
#[must_use]
pub fn encode(record: &SampleRecord) -> EncodedSampleRecord {
    let mut bytes = Vec::with_capacity(record.values.len() * 4);
    for value in &record.values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    EncodedSampleRecord {
        implementation_name: record.kernel.name.clone(),
        implementation: record.kernel.source.wire_source().to_string(),
        width: record.width,
        height: record.height,
        timestamp: record.timestamp,
        navigator: record.environment.navigator.clone(),
        gl_info: record.environment.gl_info.clone(),
        base64_values: BASE64.encode(&bytes),
    }
}

/// Decode a persisted record back to its raw form.
///
/// # Errors
///
/// - [`CodecError::InvalidBase64`] if `base64values` is not valid base64
/// - [`CodecError::ByteLengthNotAligned`] if the byte count is not a
///   multiple of 4
/// - [`CodecError::LengthMismatch`] if the sample count differs from
///   `width * height`
pub fn decode(encoded: &EncodedSampleRecord) -> Result<SampleRecord, CodecError> {
    let bytes = BASE64.decode(&encoded.base64_values)?;
    if bytes.len() % 4 != 0 {
        return Err(CodecError::ByteLengthNotAligned { len: bytes.len() });
    }

    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    let kernel = Kernel {
        name: encoded.implementation_name.clone(),
        source: KernelSource::from_wire(&encoded.implementation),
    };
    let environment = Provenance {
        navigator: encoded.navigator.clone(),
        gl_info: encoded.gl_info.clone(),
    };

    SampleRecord::new(
        kernel,
        encoded.width,
        encoded.height,
        values,
        encoded.timestamp,
        environment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Kernel, HOST_BASELINE_WIRE};

    fn record(values: Vec<f32>, width: u32, height: u32) -> SampleRecord {
        SampleRecord::new(
            Kernel::wgsl("test", "fn rand(co: vec2<f32>) -> f32 { return co.x; }"),
            width,
            height,
            values,
            1_234_567_890_123,
            Provenance::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_roundtrip_preserves_everything() {
        let original = record(vec![0.0, 0.25, 0.5, 0.999_999, 1.0e-6, 0.75], 3, 2);
        let decoded = decode(&encode(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_preserves_bit_patterns() {
        // NaN payloads and signed zero must survive: encoding is bit-exact,
        // not a decimal approximation.
        let weird = vec![
            f32::from_bits(0x7fc0_1234), // NaN with payload
            f32::from_bits(0x8000_0000), // -0.0
            f32::INFINITY,
            f32::MIN_POSITIVE,
        ];
        let original = record(weird.clone(), 4, 1);
        let decoded = decode(&encode(&original)).unwrap();
        for (d, w) in decoded.values.iter().zip(weird.iter()) {
            assert_eq!(d.to_bits(), w.to_bits());
        }
    }

    #[test]
    fn test_encoding_is_little_endian() {
        let original = record(vec![1.0], 1, 1);
        let encoded = encode(&original);
        let bytes = BASE64.decode(&encoded.base64_values).unwrap();
        assert_eq!(bytes, 1.0f32.to_le_bytes());
    }

    #[test]
    fn test_host_baseline_sentinel_roundtrips() {
        let original = SampleRecord::new(
            Kernel::host_baseline("Javascript"),
            2,
            1,
            vec![0.5, 0.25],
            0,
            Provenance::default(),
        )
        .unwrap();
        let encoded = encode(&original);
        assert_eq!(encoded.implementation, HOST_BASELINE_WIRE);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.kernel.source, KernelSource::HostBaseline);
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let mut encoded = encode(&record(vec![0.5; 4], 2, 2));
        encoded.base64_values = "!!!not base64!!!".to_string();
        assert!(matches!(
            decode(&encoded),
            Err(CodecError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_decode_rejects_unaligned_byte_length() {
        let mut encoded = encode(&record(vec![0.5; 4], 2, 2));
        // 3 bytes: valid base64, not a whole f32
        encoded.base64_values = BASE64.encode([1u8, 2, 3]);
        assert!(matches!(
            decode(&encoded),
            Err(CodecError::ByteLengthNotAligned { len: 3 })
        ));
    }

    #[test]
    fn test_decode_rejects_count_mismatch() {
        let mut encoded = encode(&record(vec![0.5; 4], 2, 2));
        encoded.width = 3; // header now disagrees with the buffer
        assert!(matches!(
            decode(&encoded),
            Err(CodecError::LengthMismatch {
                expected: 6,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_wire_field_names_are_exact() {
        let json = serde_json::to_value(encode(&record(vec![0.5], 1, 1))).unwrap();
        let object = json.as_object().unwrap();
        for key in [
            "implementationName",
            "implementation",
            "width",
            "height",
            "timestamp",
            "navigator",
            "glInfo",
            "base64values",
        ] {
            assert!(object.contains_key(key), "missing wire field {key}");
        }
    }
}
