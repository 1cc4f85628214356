use std::sync::Arc;

use entity::{Company, Contact, Deal};
use platform_store::{
    HttpStore, InMemoryStore, RecordStore, StoreResult, StoreSettings, http_client,
};

/// One store per CRM table.
#[derive(Clone)]
pub struct CrmStores {
    pub deals: Arc<dyn RecordStore<Deal>>,
    pub contacts: Arc<dyn RecordStore<Contact>>,
    pub companies: Arc<dyn RecordStore<Company>>,
}

impl CrmStores {
    pub fn in_memory() -> Self {
        Self {
            deals: Arc::new(InMemoryStore::<Deal>::new()),
            contacts: Arc::new(InMemoryStore::<Contact>::new()),
            companies: Arc::new(InMemoryStore::<Company>::new()),
        }
    }

    /// All three tables share one connection pool.
    pub fn http(settings: &StoreSettings) -> StoreResult<Self> {
        let client = http_client(settings)?;
        Ok(Self {
            deals: Arc::new(HttpStore::<Deal>::with_client(client.clone(), settings)),
            contacts: Arc::new(HttpStore::<Contact>::with_client(client.clone(), settings)),
            companies: Arc::new(HttpStore::<Company>::with_client(client, settings)),
        })
    }
}
