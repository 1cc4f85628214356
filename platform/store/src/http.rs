use std::marker::PhantomData;

use async_trait::async_trait;
use entity::{Record, RecordId};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use tracing::{instrument, warn};

use crate::{
    RecordStore, StoreError, StoreResult, StoreSettings,
    protocol::{
        DeleteRequest, FetchRequest, FetchResponse, MutationResponse, PatchEntry, RecordResponse,
        RecordsRequest, table_path,
    },
};

const PROJECT_HEADER: HeaderName = HeaderName::from_static("x-project-id");

/// Client for one table of the hosted record service.
///
/// No request timeout is set: a hanging call resolves only when the service
/// answers or the connection drops.
pub struct HttpStore<R: Record> {
    http: Client,
    table_url: String,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for HttpStore<R> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            table_url: self.table_url.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> HttpStore<R> {
    pub fn new(settings: &StoreSettings) -> StoreResult<Self> {
        Ok(Self::with_client(http_client(settings)?, settings))
    }

    /// Shares one connection pool across tables; see [`http_client`].
    pub fn with_client(http: Client, settings: &StoreSettings) -> Self {
        Self {
            http,
            table_url: format!("{}{}", settings.trimmed_base_url(), table_path(R::TABLE)),
            _record: PhantomData,
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}", self.table_url, suffix)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        target: Option<RecordId>,
    ) -> StoreResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if let Some(id) = target.filter(|_| status == StatusCode::NOT_FOUND) {
            return Err(StoreError::NotFound {
                table: R::TABLE,
                id,
            });
        }
        // Rejected writes still carry an envelope with the reason.
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            return Ok(response);
        }
        Ok(response.error_for_status()?)
    }

    fn decode_all(wire: Vec<R::Wire>) -> StoreResult<Vec<R>> {
        wire.into_iter()
            .map(|record| R::from_wire(record).map_err(StoreError::from))
            .collect()
    }

    fn single_result(body: MutationResponse<R::Wire>, verb: &str) -> StoreResult<Option<R>> {
        if !body.success {
            let message = body
                .message
                .unwrap_or_else(|| format!("Failed to {verb} {}", R::TABLE));
            return Err(StoreError::Rejected(message));
        }
        let results = body.results.unwrap_or_default();
        let failed = results.iter().filter(|result| !result.success).count();
        if failed > 0 {
            let reasons: Vec<&str> = results
                .iter()
                .filter_map(|result| result.message.as_deref())
                .collect();
            warn!(table = R::TABLE, failed, ?reasons, "record service reported failed rows");
            return Err(StoreError::Rejected(format!("Some records failed to {verb}")));
        }
        results
            .into_iter()
            .find_map(|result| result.data)
            .map(R::from_wire)
            .transpose()
            .map_err(StoreError::from)
    }

    fn require(record: Option<R>, verb: &str) -> StoreResult<R> {
        record.ok_or_else(|| {
            StoreError::Rejected(format!("record service returned no {} to {verb}", R::TABLE))
        })
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for HttpStore<R> {
    #[instrument(name = "store.get_all", skip(self), fields(table = R::TABLE))]
    async fn get_all(&self) -> StoreResult<Vec<R>> {
        let request = self.http.post(self.url("/fetch")).json(&FetchRequest {
            fields: R::FIELDS.iter().map(|field| field.to_string()).collect(),
        });
        let body: FetchResponse<R::Wire> = self.send(request, None).await?.json().await?;
        if !body.success {
            return Err(StoreError::Rejected(
                body.message
                    .unwrap_or_else(|| format!("Failed to fetch {}", R::TABLE)),
            ));
        }
        Self::decode_all(body.data.unwrap_or_default())
    }

    #[instrument(name = "store.get_by_id", skip(self), fields(table = R::TABLE, %id))]
    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<R>> {
        let request = self.http.get(self.url(&format!("/records/{id}")));
        let body: RecordResponse<R::Wire> = self.send(request, None).await?.json().await?;
        if !body.success {
            return Err(StoreError::Rejected(
                body.message
                    .unwrap_or_else(|| format!("Failed to fetch {} {id}", R::TABLE)),
            ));
        }
        Ok(body.data.map(R::from_wire).transpose()?)
    }

    #[instrument(name = "store.create", skip(self, draft), fields(table = R::TABLE))]
    async fn create(&self, draft: R::Draft) -> StoreResult<R> {
        let request = self.http.post(self.url("/records")).json(&RecordsRequest {
            records: vec![draft],
        });
        let body: MutationResponse<R::Wire> = self.send(request, None).await?.json().await?;
        Self::require(Self::single_result(body, "create")?, "create")
    }

    #[instrument(name = "store.update", skip(self, patch), fields(table = R::TABLE, %id))]
    async fn update(&self, id: RecordId, patch: R::Patch) -> StoreResult<R> {
        let request = self.http.patch(self.url("/records")).json(&RecordsRequest {
            records: vec![PatchEntry { id, patch }],
        });
        let body: MutationResponse<R::Wire> = self.send(request, Some(id)).await?.json().await?;
        Self::require(Self::single_result(body, "update")?, "update")
    }

    #[instrument(name = "store.delete", skip(self), fields(table = R::TABLE, %id))]
    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        let request = self.http.post(self.url("/delete")).json(&DeleteRequest {
            record_ids: vec![id],
        });
        let body: MutationResponse<R::Wire> = self.send(request, Some(id)).await?.json().await?;
        Self::single_result(body, "delete")?;
        Ok(())
    }
}

/// Client carrying the credential headers every table request needs.
pub fn http_client(settings: &StoreSettings) -> StoreResult<Client> {
    Ok(Client::builder()
        .default_headers(credential_headers(settings)?)
        .build()?)
}

fn credential_headers(settings: &StoreSettings) -> StoreResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(project_id) = &settings.project_id {
        headers.insert(PROJECT_HEADER, header_value(project_id)?);
    }
    if let Some(public_key) = &settings.public_key {
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {public_key}"))?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> StoreResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|err| StoreError::Settings(format!("invalid header value: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::Deal;

    #[test]
    fn table_urls_follow_protocol_layout() {
        let store = HttpStore::<Deal>::new(&StoreSettings::new("http://crm.test/")).unwrap();
        assert_eq!(store.url("/fetch"), "http://crm.test/api/tables/deal/fetch");
    }

    #[test]
    fn credentials_become_headers() {
        let settings = StoreSettings::new("http://crm.test").with_credentials("proj-1", "pk-2");
        let headers = credential_headers(&settings).unwrap();
        assert_eq!(headers.get("x-project-id").unwrap(), "proj-1");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer pk-2");
    }

    #[test]
    fn control_characters_in_credentials_are_rejected() {
        let settings = StoreSettings::new("http://crm.test").with_credentials("bad\nid", "pk");
        assert!(matches!(
            credential_headers(&settings),
            Err(StoreError::Settings(_))
        ));
    }
}
