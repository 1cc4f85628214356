//! Envelopes exchanged with the hosted record service.
//!
//! Layout per table under `/api/tables/{table}`:
//!
//! | call       | method + path        | request            | response             |
//! |------------|----------------------|--------------------|----------------------|
//! | get_all    | `POST /fetch`        | [`FetchRequest`]   | [`FetchResponse`]    |
//! | get_by_id  | `GET /records/{id}`  | -                  | [`RecordResponse`]   |
//! | create     | `POST /records`      | [`RecordsRequest`] | [`MutationResponse`] |
//! | update     | `PATCH /records`     | [`RecordsRequest`] | [`MutationResponse`] |
//! | delete     | `POST /delete`       | [`DeleteRequest`]  | [`MutationResponse`] |
//!
//! Update rows are [`PatchEntry`] values: the id plus the changed fields.

use entity::RecordId;
use serde::{Deserialize, Serialize};

pub fn table_path(table: &str) -> String {
    format!("/api/tables/{table}")
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchResponse<W> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<Vec<W>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordResponse<W> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<W>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordsRequest<T> {
    pub records: Vec<T>,
}

/// One row of an update request: the id plus whichever fields change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatchEntry<P> {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub patch: P,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<RecordId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MutationResponse<W> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub results: Option<Vec<RecordResult<W>>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordResult<W> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<W>,
}

impl<W> MutationResponse<W> {
    pub fn single(data: Option<W>) -> Self {
        Self {
            success: true,
            message: None,
            results: Some(vec![RecordResult {
                success: true,
                message: None,
                data,
            }]),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            results: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::{DealPatch, Stage};
    use serde_json::json;

    #[test]
    fn patch_entry_flattens_fields_next_to_id() {
        let entry = PatchEntry {
            id: RecordId::new(2).unwrap(),
            patch: DealPatch::stage(Stage::Proposal),
        };
        let body = serde_json::to_value(RecordsRequest {
            records: vec![entry],
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "records": [{ "Id": 2, "stage": "Proposal" }] })
        );
    }

    #[test]
    fn patch_entry_decodes_back() {
        let entry: PatchEntry<DealPatch> =
            serde_json::from_value(json!({ "Id": 5, "stage": "Lead", "company_id": null }))
                .unwrap();
        assert_eq!(entry.id.get(), 5);
        assert_eq!(entry.patch.stage, Some(Stage::Lead));
        assert_eq!(entry.patch.company_id, Some(None));
        assert_eq!(entry.patch.name, None);
    }

    #[test]
    fn missing_data_decodes_as_none() {
        let body: FetchResponse<serde_json::Value> =
            serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(body.data.is_none());
    }
}
