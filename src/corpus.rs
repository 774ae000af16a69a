//! Corpus: the append-only sequence of persisted sample records
//!
//! Loaded once from a bundled JSON array at startup and optionally extended
//! in-memory with freshly captured records. Order is insertion order and
//! carries no meaning beyond display. A corrupt record is skipped and
//! reported, never fatal to the rest of the corpus.

use serde_json::Value;

use crate::codec::{self, EncodedSampleRecord};
use crate::error::{Error, Result};
use crate::sample::SampleRecord;

/// One rejected corpus entry
#[derive(Debug)]
pub struct SkippedRecord {
    /// Position in the source array
    pub index: usize,
    /// Why it was rejected
    pub error: Error,
}

/// Result of a corpus load: the valid records plus a report of skips
#[derive(Debug)]
pub struct CorpusLoad {
    /// The loaded corpus
    pub corpus: Corpus,
    /// Rejected entries, in source order
    pub skipped: Vec<SkippedRecord>,
}

/// Ordered, append-only collection of encoded sample records
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<EncodedSampleRecord>,
}

impl Corpus {
    /// Empty corpus
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a corpus from a JSON array of records.
    ///
    /// Each element is validated independently (JSON shape, base64, byte
    /// length against `width*height`); malformed entries are skipped,
    /// reported in [`CorpusLoad::skipped`], and logged.
    ///
    /// # Errors
    ///
    /// [`Error::CorpusShape`] only if the input is not a JSON array at all.
    pub fn load_json(json: &str) -> Result<CorpusLoad> {
        let raw: Vec<Value> = serde_json::from_str(json).map_err(Error::CorpusShape)?;

        let mut corpus = Self::new();
        let mut skipped = Vec::new();
        for (index, value) in raw.into_iter().enumerate() {
            let result = serde_json::from_value::<EncodedSampleRecord>(value)
                .map_err(|e| Error::Codec(e.into()))
                .and_then(|record| {
                    codec::decode(&record)?;
                    Ok(record)
                });
            match result {
                Ok(record) => corpus.records.push(record),
                Err(error) => {
                    tracing::warn!(index, %error, "skipping malformed corpus record");
                    skipped.push(SkippedRecord { index, error });
                }
            }
        }

        Ok(CorpusLoad { corpus, skipped })
    }

    /// Append a freshly captured record. Records are never edited or removed.
    pub fn append(&mut self, record: EncodedSampleRecord) {
        self.records.push(record);
    }

    /// Records in insertion order
    #[must_use]
    pub fn records(&self) -> &[EncodedSampleRecord] {
        &self.records
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the corpus holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode every record to its raw form.
    ///
    /// # Errors
    ///
    /// Propagates the first [`crate::error::CodecError`]; records appended
    /// after load are not pre-validated.
    pub fn decode_all(&self) -> Result<Vec<SampleRecord>> {
        self.records
            .iter()
            .map(|r| codec::decode(r).map_err(Error::from))
            .collect()
    }
}

/// Serialize freshly captured records as a pretty-printed JSON array,
/// suitable for appending to the persisted corpus file. How the text reaches
/// a human (clipboard, PR) is outside the core.
///
/// # Errors
///
/// Propagates JSON serialization failure.
pub fn export_json(records: &[SampleRecord]) -> Result<String> {
    let encoded: Vec<EncodedSampleRecord> = records.iter().map(codec::encode).collect();
    serde_json::to_string_pretty(&encoded).map_err(|e| Error::Codec(e.into()))
}
