//! Canonical CRM records shared by every surface of the suite.
//!
//! Each entity has one canonical type used by the board and the stores, plus a
//! `*Record` wire struct that mirrors the hosted record service. Conversions
//! between the two live next to the entity and nowhere else.

pub mod company;
pub mod contact;
pub mod deal;
pub mod stage;
pub mod wire;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

pub use company::{Company, CompanyPatch, CompanyRecord, NewCompany};
pub use contact::{
    Contact, ContactPatch, ContactRecord, ContactStatus, NewContact, UnknownStatus,
};
pub use deal::{Deal, DealPatch, DealRecord, NewDeal};
pub use stage::{Stage, UnknownStage};
pub use wire::{MAX_AMOUNT_CENTS, WireError};

/// Store-assigned identity. Positive, immutable, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RecordId(u64);

impl RecordId {
    /// Returns `None` for zero, which the record service never hands out.
    pub fn new(raw: u64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for RecordId {
    type Error = WireError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| WireError::InvalidId(raw.to_string()))
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(RecordId::new)
            .ok_or_else(|| WireError::InvalidId(s.to_string()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Binds an entity to its table, its draft and patch shapes, and its wire form.
///
/// Stores stay generic over this trait so the board never cares which one it
/// talks to.
pub trait Record: Clone + fmt::Debug + Send + Sync + 'static {
    const TABLE: &'static str;
    /// Field list sent with fetch requests.
    const FIELDS: &'static [&'static str];

    type Wire: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Draft: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static;
    type Patch: Serialize
        + DeserializeOwned
        + Clone
        + fmt::Debug
        + Default
        + Send
        + Sync
        + 'static;

    fn id(&self) -> RecordId;

    fn updated_at(&self) -> DateTime<Utc>;

    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Copies every field present in `patch`; absent fields stay untouched.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    fn validate(&self) -> Result<(), ValidationError>;

    fn into_wire(self) -> Self::Wire;

    fn from_wire(wire: Self::Wire) -> Result<Self, WireError>;
}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    message: &'static str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}
