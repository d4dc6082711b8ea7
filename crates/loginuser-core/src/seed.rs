//! # Seed Module
//!
//! JSON format for preloading sessions into a store at startup.
//!
//! This module only converts text into records (pure transformation).
//! Reading the file is the app layer's job.

use crate::error::SeedError;
use crate::principal::SessionUser;
use crate::session::{SessionId, SessionRecord, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Top-level seed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub sessions: Vec<SeedSession>,
}

/// One seeded session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSession {
    /// Fixed id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Lifetime override; the server default applies when absent.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    pub user: SessionUser,
}

/// Parse and validate a seed document into session records.
///
/// Records are returned in document order. Any invalid entry fails the whole
/// document, naming its zero-based index.
pub fn parse_seeds(
    text: &str,
    now: Timestamp,
    default_ttl_secs: u64,
) -> Result<Vec<SessionRecord>, SeedError> {
    let file: SeedFile = serde_json::from_str(text)?;
    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(file.sessions.len());

    for (index, seed) in file.sessions.into_iter().enumerate() {
        seed.user
            .validate()
            .map_err(|source| SeedError::InvalidUser { index, source })?;

        let id = match seed.id.as_deref() {
            Some(raw) => {
                SessionId::parse(raw).map_err(|source| SeedError::InvalidId { index, source })?
            }
            None => SessionId::generate(),
        };
        if !seen.insert(id.clone()) {
            return Err(SeedError::Duplicate {
                index,
                id: id.to_string(),
            });
        }

        let ttl = seed.ttl_secs.unwrap_or(default_ttl_secs);
        if ttl == 0 {
            return Err(SeedError::ZeroTtl { index });
        }

        records.push(SessionRecord::issue(id, seed.user, now, ttl));
    }

    Ok(records)
}
