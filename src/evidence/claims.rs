//! Obligation records produced by the extraction step.
//!
//! The obligations file is JSON: either an array of records or an object
//! with an `obligations` array. Only `id`, `source_text` and
//! `source_location` feed verification; the other fields are carried
//! for display.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::types::AttributionClaim;

/// Errors reading an obligations file
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Failed to read obligations file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Obligations file is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("No obligation list found (expected an array or an object with an \"obligations\" array)")]
    NoObligationList,
}

/// Anything that carries a quotation to verify
pub trait SourceQuote {
    fn quote_id(&self) -> &str;
    fn source_text(&self) -> &str;
    fn source_location(&self) -> Option<&str>;

    fn to_claim(&self) -> AttributionClaim {
        AttributionClaim {
            claim_id: self.quote_id().to_string(),
            quoted_text: self.source_text().to_string(),
            location_hint: self.source_location().map(str::to_string),
        }
    }
}

impl SourceQuote for AttributionClaim {
    fn quote_id(&self) -> &str {
        &self.claim_id
    }

    fn source_text(&self) -> &str {
        &self.quoted_text
    }

    fn source_location(&self) -> Option<&str> {
        self.location_hint.as_deref()
    }
}

/// One extracted obligation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    #[serde(default)]
    pub source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub obligation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SourceQuote for Obligation {
    fn quote_id(&self) -> &str {
        &self.id
    }

    fn source_text(&self) -> &str {
        &self.source_text
    }

    fn source_location(&self) -> Option<&str> {
        self.source_location.as_deref()
    }
}

/// Record shape on the wire; every field may be missing or null
#[derive(Debug, Deserialize)]
struct RawObligation {
    id: Option<Value>,
    source_text: Option<String>,
    source_location: Option<String>,
    party: Option<String>,
    #[serde(rename = "type")]
    obligation_type: Option<String>,
    description: Option<String>,
}

/// Identifier given to records without one (1-based position)
pub fn generated_id(position: usize) -> String {
    format!("OBL-{:03}", position)
}

/// Read and parse an obligations file.
pub fn load_obligations(path: &Path) -> Result<Vec<Obligation>, ClaimsError> {
    let content = std::fs::read_to_string(path).map_err(|source| ClaimsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obligations(&content)
}

/// Parse obligations JSON.
///
/// A record that does not have the expected shape becomes an obligation
/// with empty source text, so it is reported as empty instead of
/// aborting the whole run.
pub fn parse_obligations(json: &str) -> Result<Vec<Obligation>, ClaimsError> {
    let value: Value = serde_json::from_str(json)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("obligations") {
            Some(Value::Array(items)) => items,
            _ => return Err(ClaimsError::NoObligationList),
        },
        _ => return Err(ClaimsError::NoObligationList),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, item)| obligation_from_value(i + 1, item))
        .collect())
}

fn obligation_from_value(position: usize, item: Value) -> Obligation {
    let raw: RawObligation = match serde_json::from_value(item) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Malformed obligation record #{}: {}", position, e);
            return Obligation {
                id: generated_id(position),
                ..Default::default()
            };
        }
    };

    let id = match raw.id {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => generated_id(position),
    };

    Obligation {
        id,
        source_text: raw.source_text.unwrap_or_default(),
        source_location: raw.source_location,
        party: raw.party,
        obligation_type: raw.obligation_type,
        description: raw.description,
    }
}

/// Convert any quote carriers into claims, preserving order
pub fn to_claims<T: SourceQuote>(records: &[T]) -> Vec<AttributionClaim> {
    records.iter().map(SourceQuote::to_claim).collect()
}
