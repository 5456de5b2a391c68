// src/provenance/mod.rs

//! Hash-chained record of what each pipeline stage produced.

use crate::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Represents a single record in the provenance chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub data_hash: String,
    pub software_version: String,
    pub previous_record_hash: Option<String>,
    pub metadata: serde_json::Value,
}

impl ProvenanceRecord {
    pub fn new(
        event_type: String,
        data: &[u8],
        previous_record_hash: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        ProvenanceRecord {
            timestamp: Utc::now(),
            event_type,
            data_hash: calculate_hash(data),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            previous_record_hash,
            metadata,
        }
    }

    /// Calculates the hash of the current record for linking.
    pub fn calculate_record_hash(&self) -> Result<String, PipelineError> {
        let serialized = serde_json::to_string(self).map_err(|e| PipelineError::Provenance(e.to_string()))?;
        Ok(calculate_hash(serialized.as_bytes()))
    }
}

/// Calculates the SHA256 hash of a byte slice.
pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Manages the chain of ProvenanceRecords.
#[derive(Debug, Default)]
pub struct ProvenanceChain {
    records: Vec<ProvenanceRecord>,
}

impl ProvenanceChain {
    pub fn new() -> Self {
        ProvenanceChain { records: Vec::new() }
    }

    /// Appends a record linked to the current tail of the chain.
    pub fn add_record(
        &mut self,
        event_type: &str,
        data: &[u8],
        metadata: serde_json::Value,
    ) -> Result<(), PipelineError> {
        let previous_record_hash = self.records.last().map(|r| r.calculate_record_hash()).transpose()?;
        let record = ProvenanceRecord::new(event_type.to_string(), data, previous_record_hash, metadata);
        log::debug!("Provenance: {} ({})", record.event_type, record.data_hash);
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[ProvenanceRecord] {
        &self.records
    }

    /// Checks that every record points at the hash of its predecessor.
    pub fn verify(&self) -> Result<bool, PipelineError> {
        if let Some(first) = self.records.first() {
            if first.previous_record_hash.is_some() {
                return Ok(false);
            }
        }
        for pair in self.records.windows(2) {
            let expected = pair[0].calculate_record_hash()?;
            if pair[1].previous_record_hash.as_deref() != Some(expected.as_str()) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Serializes the entire chain to a JSON string.
    pub fn to_json(&self) -> Result<String, PipelineError> {
        serde_json::to_string_pretty(&self.records)
            .map_err(|e| PipelineError::Provenance(format!("Failed to serialize provenance chain: {}", e)))
    }

    /// Deserializes a provenance chain from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, PipelineError> {
        let records = serde_json::from_str(json_str)
            .map_err(|e| PipelineError::Provenance(format!("Failed to deserialize provenance chain: {}", e)))?;
        Ok(ProvenanceChain { records })
    }

    /// Moves all records into a new chain, leaving this one empty.
    pub fn take(&mut self) -> ProvenanceChain {
        std::mem::take(self)
    }
}
