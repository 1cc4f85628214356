use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Record, RecordId, ValidationError, require_text,
    wire::{self, WireError},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactStatus {
    #[default]
    Active,
    Lead,
    Prospect,
    Inactive,
}

impl ContactStatus {
    pub fn label(self) -> &'static str {
        match self {
            ContactStatus::Active => "Active",
            ContactStatus::Lead => "Lead",
            ContactStatus::Prospect => "Prospect",
            ContactStatus::Inactive => "Inactive",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        [
            ContactStatus::Active,
            ContactStatus::Lead,
            ContactStatus::Prospect,
            ContactStatus::Inactive,
        ]
        .into_iter()
        .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown contact status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for ContactStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContactStatus::parse(s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub job_title: String,
    pub status: ContactStatus,
    pub notes: String,
    pub company_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub company_id: Option<RecordId>,
}

impl NewContact {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: String::new(),
            job_title: String::new(),
            status: ContactStatus::default(),
            notes: String::new(),
            company_id: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContactStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire::double_option"
    )]
    pub company_id: Option<Option<RecordId>>,
}

/// Contact as stored by the hosted record service. `Name` is derived from
/// the first and last name on the way out and ignored on the way in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub company_id: Option<RecordId>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl From<Contact> for ContactRecord {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            name: Some(contact.full_name()),
            first_name: Some(contact.first_name),
            last_name: Some(contact.last_name),
            email: Some(contact.email),
            phone: wire::non_empty(contact.phone),
            job_title: wire::non_empty(contact.job_title),
            status: Some(contact.status.label().to_string()),
            notes: Some(contact.notes),
            company_id: contact.company_id,
            created_on: Some(contact.created_at),
            modified_on: Some(contact.updated_at),
        }
    }
}

impl TryFrom<ContactRecord> for Contact {
    type Error = WireError;

    fn try_from(record: ContactRecord) -> Result<Self, Self::Error> {
        let created_at = record.created_on.ok_or(WireError::MissingField("CreatedOn"))?;
        // Unrecognised statuses fall back to the form default.
        let status = record
            .status
            .as_deref()
            .and_then(ContactStatus::parse)
            .unwrap_or_default();
        Ok(Self {
            id: record.id,
            first_name: wire::text(record.first_name),
            last_name: wire::text(record.last_name),
            email: wire::text(record.email),
            phone: wire::text(record.phone),
            job_title: wire::text(record.job_title),
            status,
            notes: wire::text(record.notes),
            company_id: record.company_id,
            created_at,
            updated_at: record.modified_on.unwrap_or(created_at),
        })
    }
}

impl Record for Contact {
    const TABLE: &'static str = "contact";
    const FIELDS: &'static [&'static str] = &[
        "Name",
        "Tags",
        "Owner",
        "CreatedOn",
        "CreatedBy",
        "ModifiedOn",
        "ModifiedBy",
        "first_name",
        "last_name",
        "email",
        "phone",
        "job_title",
        "status",
        "notes",
        "company_id",
    ];

    type Wire = ContactRecord;
    type Draft = NewContact;
    type Patch = ContactPatch;

    fn id(&self) -> RecordId {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: RecordId, draft: NewContact, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone,
            job_title: draft.job_title,
            status: draft.status,
            notes: draft.notes,
            company_id: draft.company_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ContactPatch, now: DateTime<Utc>) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = email.trim().to_string();
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(job_title) = patch.job_title {
            self.job_title = job_title;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(company_id) = patch.company_id {
            self.company_id = company_id;
        }
        self.updated_at = now;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("first_name", &self.first_name, "First name is required")?;
        require_text("last_name", &self.last_name, "Last name is required")?;
        require_text("email", &self.email, "Email is required")?;
        if !looks_like_email(&self.email) {
            return Err(ValidationError::new(
                "email",
                "Please enter a valid email address",
            ));
        }
        Ok(())
    }

    fn into_wire(self) -> ContactRecord {
        self.into()
    }

    fn from_wire(wire: ContactRecord) -> Result<Self, WireError> {
        wire.try_into()
    }
}

/// `local@domain.tld` with no whitespace anywhere.
fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
