use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Record, RecordId, ValidationError, require_text,
    wire::{self, MAX_AMOUNT_CENTS, WireError, cents_to_dollars, dollars_to_cents},
};

#[derive(Clone, Debug, PartialEq)]
pub struct Company {
    pub id: RecordId,
    pub name: String,
    pub industry: String,
    pub website: String,
    pub phone: String,
    pub address: String,
    pub revenue_cents: Option<i64>,
    pub notes: String,
    pub primary_contact_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCompany {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "revenue", default, with = "wire::dollars::option")]
    pub revenue_cents: Option<i64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub primary_contact_id: Option<RecordId>,
}

impl NewCompany {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            industry: String::new(),
            website: String::new(),
            phone: String::new(),
            address: String::new(),
            revenue_cents: None,
            notes: String::new(),
            primary_contact_id: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyPatch {
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        rename = "revenue",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire::dollars::option"
    )]
    pub revenue_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire::double_option"
    )]
    pub primary_contact_id: Option<Option<RecordId>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub primary_contact_id: Option<RecordId>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl From<Company> for CompanyRecord {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: Some(company.name),
            industry: wire::non_empty(company.industry),
            website: wire::non_empty(company.website),
            phone: wire::non_empty(company.phone),
            address: wire::non_empty(company.address),
            revenue: company.revenue_cents.map(cents_to_dollars),
            notes: Some(company.notes),
            primary_contact_id: company.primary_contact_id,
            created_on: Some(company.created_at),
            modified_on: Some(company.updated_at),
        }
    }
}

impl TryFrom<CompanyRecord> for Company {
    type Error = WireError;

    fn try_from(record: CompanyRecord) -> Result<Self, Self::Error> {
        let created_at = record.created_on.ok_or(WireError::MissingField("CreatedOn"))?;
        let revenue_cents = record
            .revenue
            .map(|value| dollars_to_cents("revenue", value))
            .transpose()?;
        Ok(Self {
            id: record.id,
            name: wire::text(record.name),
            industry: wire::text(record.industry),
            website: wire::text(record.website),
            phone: wire::text(record.phone),
            address: wire::text(record.address),
            revenue_cents,
            notes: wire::text(record.notes),
            primary_contact_id: record.primary_contact_id,
            created_at,
            updated_at: record.modified_on.unwrap_or(created_at),
        })
    }
}

impl Record for Company {
    const TABLE: &'static str = "company";
    const FIELDS: &'static [&'static str] = &[
        "Name",
        "Tags",
        "Owner",
        "CreatedOn",
        "CreatedBy",
        "ModifiedOn",
        "ModifiedBy",
        "industry",
        "website",
        "phone",
        "address",
        "revenue",
        "notes",
        "primary_contact_id",
    ];

    type Wire = CompanyRecord;
    type Draft = NewCompany;
    type Patch = CompanyPatch;

    fn id(&self) -> RecordId {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: RecordId, draft: NewCompany, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            industry: draft.industry,
            website: draft.website.trim().to_string(),
            phone: draft.phone,
            address: draft.address,
            revenue_cents: draft.revenue_cents,
            notes: draft.notes,
            primary_contact_id: draft.primary_contact_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: CompanyPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(industry) = patch.industry {
            self.industry = industry;
        }
        if let Some(website) = patch.website {
            self.website = website.trim().to_string();
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(revenue_cents) = patch.revenue_cents {
            self.revenue_cents = Some(revenue_cents);
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(primary_contact_id) = patch.primary_contact_id {
            self.primary_contact_id = primary_contact_id;
        }
        self.updated_at = now;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, "Company name is required")?;
        let website = self.website.as_str();
        if !website.is_empty() {
            let rest = website
                .strip_prefix("https://")
                .or_else(|| website.strip_prefix("http://"));
            if rest.is_none_or(str::is_empty) {
                return Err(ValidationError::new(
                    "website",
                    "Website must be a valid URL",
                ));
            }
        }
        if self
            .revenue_cents
            .is_some_and(|cents| !(0..=MAX_AMOUNT_CENTS).contains(&cents))
        {
            return Err(ValidationError::new("revenue", "Revenue must be a number"));
        }
        Ok(())
    }

    fn into_wire(self) -> CompanyRecord {
        self.into()
    }

    fn from_wire(wire: CompanyRecord) -> Result<Self, WireError> {
        wire.try_into()
    }
}
