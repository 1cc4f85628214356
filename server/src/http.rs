use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use entity::{Company, Contact, Deal, Record, RecordId};
use platform_store::{
    RecordStore, StoreError,
    protocol::{
        DeleteRequest, FetchRequest, FetchResponse, MutationResponse, PatchEntry, RecordResponse,
        RecordResult, RecordsRequest, table_path,
    },
};
use products_crm::CrmStores;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub stores: CrmStores,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "crm record service listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            HeaderName::from_static("x-project-id"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .nest(&table_path(Deal::TABLE), table_routes(Arc::clone(&state.stores.deals)))
        .nest(
            &table_path(Contact::TABLE),
            table_routes(Arc::clone(&state.stores.contacts)),
        )
        .nest(
            &table_path(Company::TABLE),
            table_routes(Arc::clone(&state.stores.companies)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
}

type TableStore<R> = Arc<dyn RecordStore<R>>;

/// The five record calls for one table, mounted under its table path.
fn table_routes<R: Record>(store: TableStore<R>) -> Router {
    Router::new()
        .route("/fetch", post(fetch_handler::<R>))
        .route(
            "/records",
            post(create_handler::<R>).patch(update_handler::<R>),
        )
        .route("/records/{id}", get(get_handler::<R>))
        .route("/delete", post(delete_handler::<R>))
        .with_state(store)
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

type Envelope<T> = (StatusCode, Json<T>);

/// The field list is accepted for compatibility; full records are returned.
async fn fetch_handler<R: Record>(
    State(store): State<TableStore<R>>,
    Json(_request): Json<FetchRequest>,
) -> Envelope<FetchResponse<R::Wire>> {
    match store.get_all().await {
        Ok(records) => (
            StatusCode::OK,
            Json(FetchResponse {
                success: true,
                message: None,
                data: Some(records.into_iter().map(Record::into_wire).collect()),
            }),
        ),
        Err(err) => (
            status_for(&err),
            Json(FetchResponse {
                success: false,
                message: Some(err.to_string()),
                data: None,
            }),
        ),
    }
}

/// A missing record is a successful lookup with `data: null`.
async fn get_handler<R: Record>(
    State(store): State<TableStore<R>>,
    Path(raw_id): Path<String>,
) -> Envelope<RecordResponse<R::Wire>> {
    let failure = |status: StatusCode, message: String| {
        (
            status,
            Json(RecordResponse {
                success: false,
                message: Some(message),
                data: None,
            }),
        )
    };
    let id = match raw_id.parse::<RecordId>() {
        Ok(id) => id,
        Err(err) => return failure(StatusCode::BAD_REQUEST, err.to_string()),
    };
    match store.get_by_id(id).await {
        Ok(record) => (
            StatusCode::OK,
            Json(RecordResponse {
                success: true,
                message: None,
                data: record.map(Record::into_wire),
            }),
        ),
        Err(err) => failure(status_for(&err), err.to_string()),
    }
}

async fn create_handler<R: Record>(
    State(store): State<TableStore<R>>,
    Json(request): Json<RecordsRequest<R::Draft>>,
) -> Envelope<MutationResponse<R::Wire>> {
    let mut batch = Batch::default();
    for draft in request.records {
        batch.push(store.create(draft).await.map(Some));
    }
    batch.finish(R::TABLE, "create")
}

async fn update_handler<R: Record>(
    State(store): State<TableStore<R>>,
    Json(request): Json<RecordsRequest<PatchEntry<R::Patch>>>,
) -> Envelope<MutationResponse<R::Wire>> {
    let mut batch = Batch::default();
    for entry in request.records {
        batch.push(store.update(entry.id, entry.patch).await.map(Some));
    }
    batch.finish(R::TABLE, "update")
}

async fn delete_handler<R: Record>(
    State(store): State<TableStore<R>>,
    Json(request): Json<DeleteRequest>,
) -> Envelope<MutationResponse<R::Wire>> {
    let mut batch = Batch::default();
    for id in request.record_ids {
        batch.push(store.delete(id).await.map(|()| None::<R>));
    }
    batch.finish(R::TABLE, "delete")
}

/// Per-row results of a write; the response status reflects the worst row.
struct Batch<W> {
    results: Vec<RecordResult<W>>,
    status: StatusCode,
}

impl<W> Default for Batch<W> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            status: StatusCode::OK,
        }
    }
}

impl<W> Batch<W> {
    fn push<R: Record<Wire = W>>(&mut self, outcome: Result<Option<R>, StoreError>) {
        match outcome {
            Ok(record) => self.results.push(RecordResult {
                success: true,
                message: None,
                data: record.map(Record::into_wire),
            }),
            Err(err) => {
                let status = status_for(&err);
                if self.status == StatusCode::OK || status == StatusCode::NOT_FOUND {
                    self.status = status;
                }
                self.results.push(RecordResult {
                    success: false,
                    message: Some(err.to_string()),
                    data: None,
                });
            }
        }
    }

    fn finish(self, table: &'static str, verb: &'static str) -> Envelope<MutationResponse<W>> {
        let failed = self.results.iter().filter(|row| !row.success).count();
        if failed > 0 {
            warn!(table, verb, failed, "record write rejected");
        }
        (
            self.status,
            Json(MutationResponse {
                success: true,
                message: None,
                results: Some(self.results),
            }),
        )
    }
}

fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Validation(_) | StoreError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
