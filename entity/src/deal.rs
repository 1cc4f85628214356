use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Record, RecordId, ValidationError, require_text,
    stage::Stage,
    wire::{self, MAX_AMOUNT_CENTS, WireError, cents_to_dollars, dollars_to_cents},
};

/// A sales opportunity, as the board and the stores see it.
#[derive(Clone, Debug, PartialEq)]
pub struct Deal {
    pub id: RecordId,
    pub name: String,
    pub tags: String,
    pub amount_cents: i64,
    pub stage: Stage,
    pub close_date: Option<NaiveDate>,
    pub contact_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
    pub owner_id: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a client may set when creating a deal. Serialises with the record
/// service's field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewDeal {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Tags", default)]
    pub tags: String,
    #[serde(rename = "amount", default, with = "wire::dollars")]
    pub amount_cents: i64,
    pub stage: Stage,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub contact_id: Option<RecordId>,
    #[serde(default)]
    pub company_id: Option<RecordId>,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub notes: String,
}

impl NewDeal {
    pub fn new(name: impl Into<String>, amount_cents: i64, stage: Stage) -> Self {
        Self {
            name: name.into(),
            tags: String::new(),
            amount_cents,
            stage,
            close_date: None,
            contact_id: None,
            company_id: None,
            owner_id: String::new(),
            notes: String::new(),
        }
    }
}

/// Partial update. Only the fields that are `Some` go over the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DealPatch {
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Tags", default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(
        rename = "amount",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire::dollars::option"
    )]
    pub amount_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire::double_option"
    )]
    pub close_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire::double_option"
    )]
    pub contact_id: Option<Option<RecordId>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire::double_option"
    )]
    pub company_id: Option<Option<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DealPatch {
    /// The single-field update issued by a board drop.
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Deal as stored by the hosted record service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub contact_id: Option<RecordId>,
    #[serde(default)]
    pub company_id: Option<RecordId>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl From<Deal> for DealRecord {
    fn from(deal: Deal) -> Self {
        Self {
            id: deal.id,
            name: Some(deal.name),
            tags: Some(deal.tags),
            amount: Some(cents_to_dollars(deal.amount_cents)),
            stage: Some(deal.stage.label().to_string()),
            close_date: deal.close_date,
            contact_id: deal.contact_id,
            company_id: deal.company_id,
            owner_id: Some(deal.owner_id),
            notes: Some(deal.notes),
            created_on: Some(deal.created_at),
            modified_on: Some(deal.updated_at),
        }
    }
}

impl TryFrom<DealRecord> for Deal {
    type Error = WireError;

    fn try_from(record: DealRecord) -> Result<Self, Self::Error> {
        let stage = record
            .stage
            .ok_or(WireError::MissingField("stage"))?
            .parse::<Stage>()?;
        let created_at = record.created_on.ok_or(WireError::MissingField("CreatedOn"))?;
        Ok(Self {
            id: record.id,
            name: wire::text(record.name),
            tags: wire::text(record.tags),
            amount_cents: dollars_to_cents("amount", record.amount.unwrap_or_default())?,
            stage,
            close_date: record.close_date,
            contact_id: record.contact_id,
            company_id: record.company_id,
            owner_id: wire::text(record.owner_id),
            notes: wire::text(record.notes),
            created_at,
            updated_at: record.modified_on.unwrap_or(created_at),
        })
    }
}

impl Record for Deal {
    const TABLE: &'static str = "deal";
    const FIELDS: &'static [&'static str] = &[
        "Name",
        "Tags",
        "Owner",
        "CreatedOn",
        "CreatedBy",
        "ModifiedOn",
        "ModifiedBy",
        "amount",
        "stage",
        "close_date",
        "contact_id",
        "company_id",
        "owner_id",
        "notes",
    ];

    type Wire = DealRecord;
    type Draft = NewDeal;
    type Patch = DealPatch;

    fn id(&self) -> RecordId {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: RecordId, draft: NewDeal, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            tags: draft.tags,
            amount_cents: draft.amount_cents,
            stage: draft.stage,
            close_date: draft.close_date,
            contact_id: draft.contact_id,
            company_id: draft.company_id,
            owner_id: draft.owner_id,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: DealPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(amount_cents) = patch.amount_cents {
            self.amount_cents = amount_cents;
        }
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if let Some(close_date) = patch.close_date {
            self.close_date = close_date;
        }
        if let Some(contact_id) = patch.contact_id {
            self.contact_id = contact_id;
        }
        if let Some(company_id) = patch.company_id {
            self.company_id = company_id;
        }
        if let Some(owner_id) = patch.owner_id {
            self.owner_id = owner_id;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.updated_at = now;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, "Deal name is required")?;
        if !(0..=MAX_AMOUNT_CENTS).contains(&self.amount_cents) {
            return Err(ValidationError::new("amount", "Valid amount is required"));
        }
        Ok(())
    }

    fn into_wire(self) -> DealRecord {
        self.into()
    }

    fn from_wire(wire: DealRecord) -> Result<Self, WireError> {
        wire.try_into()
    }
}
