//! Candidate supply.
//!
//! Raw candidate records come from an external crawler as a JSON document
//! and are read once, when the pool is built.

use crate::models::{CandidateId, CandidateProfile, CandidateRecord};
use crate::pool::CandidatePool;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A candidate as delivered by the supply, before normalisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: String,
    /// Free-form facts; non-string values are stored as their JSON text.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl RawCandidate {
    /// Convert to a pool record. Returns `None` for nameless records.
    pub fn into_record(self) -> Option<CandidateRecord> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }

        let attributes = self
            .attributes
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();

        let profile = CandidateProfile {
            summary: self.summary.trim().to_string(),
            attributes,
        };

        let mut record = CandidateRecord::new(name, profile);
        if let Some(id) = self.id.as_deref().filter(|id| !id.trim().is_empty()) {
            record = record.with_id(CandidateId::new(id));
        }
        if let Some(url) = self.url.filter(|u| !u.trim().is_empty()) {
            record = record.with_url(url.trim());
        }
        Some(record)
    }
}

/// Accepted document shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SupplyDocument {
    List(Vec<RawCandidate>),
    Wrapped { candidates: Vec<RawCandidate> },
}

/// Source of raw candidates.
pub trait CandidateSupply {
    fn fetch_candidates(&self) -> Result<Vec<RawCandidate>>;
}

/// Reads candidates from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSupply {
    path: PathBuf,
}

impl JsonFileSupply {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CandidateSupply for JsonFileSupply {
    fn fetch_candidates(&self) -> Result<Vec<RawCandidate>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read candidates file: {}", self.path.display()))?;

        let document: SupplyDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse candidates file: {}", self.path.display()))?;

        let candidates = match document {
            SupplyDocument::List(list) => list,
            SupplyDocument::Wrapped { candidates } => candidates,
        };
        debug!("Read {} raw candidates from {}", candidates.len(), self.path.display());
        Ok(candidates)
    }
}

/// Build the pool from a supply. Nameless records are skipped; a duplicate
/// identity is fatal.
pub fn build_pool(supply: &dyn CandidateSupply) -> Result<CandidatePool> {
    let records = supply
        .fetch_candidates()?
        .into_iter()
        .enumerate()
        .filter_map(|(position, raw)| {
            let record = raw.into_record();
            if record.is_none() {
                warn!("Skipping candidate #{} without a name", position + 1);
            }
            record
        });

    let pool = CandidatePool::from_records(records)?;
    info!("Candidate pool ready with {} candidates", pool.len());
    Ok(pool)
}
