//! Shared fixtures for the end-to-end suites: a live record service on a
//! loopback port and a store wrapper that records and steers calls.

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use anyhow::Result;
use async_trait::async_trait;
use crm_server::{
    config::AppConfig,
    http::{AppState, build_router},
};
use entity::{Company, Contact, Deal, Record, RecordId};
use platform_store::{HttpStore, RecordStore, StoreError, StoreResult, StoreSettings};
use products_crm::{CrmStores, Notice, Notifier};
use tokio::{net::TcpListener, sync::Notify, task::JoinHandle};

/// Record service bound to `127.0.0.1:0`, backed by `stores`.
pub struct Backend {
    pub addr: SocketAddr,
    pub stores: CrmStores,
    task: JoinHandle<()>,
}

impl Backend {
    pub async fn spawn(stores: CrmStores) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = build_router(AppState {
            stores: stores.clone(),
            config: Arc::new(AppConfig::default()),
        });
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(Self { addr, stores, task })
    }

    pub fn settings(&self) -> StoreSettings {
        StoreSettings::new(format!("http://{}", self.addr))
            .with_credentials("test-project", "pk-test")
    }

    /// HTTP stores for all three tables. Proxies are bypassed for loopback.
    pub fn client_stores(&self) -> Result<CrmStores> {
        let settings = self.settings();
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(CrmStores {
            deals: Arc::new(HttpStore::<Deal>::with_client(client.clone(), &settings)),
            contacts: Arc::new(HttpStore::<Contact>::with_client(client.clone(), &settings)),
            companies: Arc::new(HttpStore::<Company>::with_client(client, &settings)),
        })
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Wraps a store, records every update, and can refuse or hold calls.
pub struct RecordingStore<R: Record> {
    inner: Arc<dyn RecordStore<R>>,
    updates: Mutex<Vec<(RecordId, R::Patch)>>,
    fetches: AtomicUsize,
    fail_updates: AtomicBool,
    fail_fetches: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
}

impl<R: Record> RecordingStore<R> {
    pub fn new(inner: Arc<dyn RecordStore<R>>) -> Self {
        Self {
            inner,
            updates: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            fail_updates: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
            gate: Mutex::new(None),
            fetch_gate: Mutex::new(None),
        }
    }

    pub fn updates(&self) -> Vec<(RecordId, R::Patch)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Later updates wait until the returned handle is notified.
    pub fn hold_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// The next fetch reads the inner store at once but does not return
    /// until the handle is notified, like a slow response.
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for RecordingStore<R> {
    async fn get_all(&self) -> StoreResult<Vec<R>> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::Rejected("fetch refused".into()));
        }
        let fetched = self.inner.get_all().await;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        fetched
    }

    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<R>> {
        self.inner.get_by_id(id).await
    }

    async fn create(&self, draft: R::Draft) -> StoreResult<R> {
        self.inner.create(draft).await
    }

    async fn update(&self, id: RecordId, patch: R::Patch) -> StoreResult<R> {
        self.updates.lock().unwrap().push((id, patch.clone()));
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("update refused".into()));
        }
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.inner.delete(id).await
    }
}

#[derive(Default)]
pub struct CollectingNotifier(Mutex<Vec<Notice>>);

impl CollectingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.0.lock().unwrap().push(notice);
    }
}

pub fn id(raw: u64) -> RecordId {
    RecordId::new(raw).unwrap()
}
