//! Board session: the last snapshot the record service confirmed, plus the
//! drag controller that writes through to it.

use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use entity::{Company, Contact, Deal, RecordId, Stage};
use platform_store::StoreResult;
use tracing::{debug, error, info, warn};

use crate::{
    CrmStores,
    board::{BoardColumns, Lookups},
    drag::{DragController, DragError, DragOutcome, DragSignals, Gesture},
};

pub const STAGE_UPDATED: &str = "Deal stage updated successfully";
pub const STAGE_UPDATE_FAILED: &str = "Failed to update deal stage";
pub const LOAD_FAILED: &str = "Failed to load deals";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log. Used by the CLI.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(notice = %notice.message),
            NoticeLevel::Error => error!(notice = %notice.message),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BoardSnapshot {
    pub deals: Vec<Deal>,
    pub contacts: Vec<Contact>,
    pub companies: Vec<Company>,
    lookups: Lookups,
    /// `None` until the first successful load.
    pub loaded_at: Option<DateTime<Utc>>,
}

impl BoardSnapshot {
    pub fn new(deals: Vec<Deal>, contacts: Vec<Contact>, companies: Vec<Company>) -> Self {
        let lookups = Lookups::new(&contacts, &companies);
        Self {
            deals,
            contacts,
            companies,
            lookups,
            loaded_at: Some(Utc::now()),
        }
    }

    fn with_deals(&self, deals: Vec<Deal>) -> Self {
        Self {
            deals,
            contacts: self.contacts.clone(),
            companies: self.companies.clone(),
            lookups: self.lookups.clone(),
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn columns(&self) -> BoardColumns<'_> {
        BoardColumns::partition(&self.deals)
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    pub fn deal(&self, id: RecordId) -> Option<&Deal> {
        self.deals.iter().find(|deal| deal.id == id)
    }
}

/// The installed snapshot and the ticket of the fetch that produced it.
#[derive(Default)]
struct Installed {
    ticket: u64,
    snapshot: Arc<BoardSnapshot>,
}

pub struct PipelineBoard {
    stores: CrmStores,
    drag: DragController,
    notifier: Arc<dyn Notifier>,
    installed: RwLock<Installed>,
    /// Handed out when a fetch starts; a result older than the installed
    /// snapshot is dropped.
    tickets: AtomicU64,
}

impl PipelineBoard {
    pub fn new(stores: CrmStores, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            drag: DragController::new(Arc::clone(&stores.deals)),
            stores,
            notifier,
            installed: RwLock::new(Installed::default()),
            tickets: AtomicU64::new(0),
        }
    }

    pub fn with_signals(mut self, signals: Arc<dyn DragSignals>) -> Self {
        self.drag = self.drag.with_signals(signals);
        self
    }

    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        let installed = self.installed.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&installed.snapshot)
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub async fn load(&self) -> StoreResult<Arc<BoardSnapshot>> {
        let ticket = self.next_ticket();
        let fetched = futures::try_join!(
            self.stores.deals.get_all(),
            self.stores.contacts.get_all(),
            self.stores.companies.get_all()
        );
        match fetched {
            Ok((deals, contacts, companies)) => {
                info!(
                    deals = deals.len(),
                    contacts = contacts.len(),
                    companies = companies.len(),
                    "board loaded"
                );
                Ok(self.install(ticket, |_| BoardSnapshot::new(deals, contacts, companies)))
            }
            Err(err) => {
                warn!(error = %err, "board load failed");
                self.notifier.notify(Notice::error(LOAD_FAILED));
                Err(err)
            }
        }
    }

    /// Refetches the deal list only; contacts and companies are kept.
    ///
    /// When a fetch that started later has already been installed, the
    /// result is dropped and the current snapshot is returned.
    pub async fn reload_deals(&self) -> StoreResult<Arc<BoardSnapshot>> {
        let ticket = self.next_ticket();
        let deals = self.stores.deals.get_all().await?;
        Ok(self.install(ticket, |current| current.with_deals(deals)))
    }

    pub fn begin_drag(&self, deal_id: RecordId) -> Result<Gesture, DragError> {
        let origin = self
            .snapshot()
            .deal(deal_id)
            .map(|deal| deal.stage)
            .ok_or(DragError::UnknownDeal(deal_id))?;
        self.drag.pick_up(deal_id, origin)
    }

    pub async fn finish_drag(&self, destination: Option<Stage>) -> Result<DragOutcome, DragError> {
        let outcome = self.drag.drop(destination).await?;
        match &outcome {
            DragOutcome::Cancelled => {}
            DragOutcome::Moved(_) => {
                self.notifier.notify(Notice::success(STAGE_UPDATED));
                if let Err(err) = self.reload_deals().await {
                    warn!(error = %err, "reload after stage move failed");
                    self.notifier.notify(Notice::error(LOAD_FAILED));
                }
            }
            DragOutcome::Failed { .. } => {
                self.notifier.notify(Notice::error(STAGE_UPDATE_FAILED));
            }
        }
        Ok(outcome)
    }

    /// A whole gesture in one call, for callers without a pointer.
    pub async fn move_deal(
        &self,
        deal_id: RecordId,
        destination: Option<Stage>,
    ) -> Result<DragOutcome, DragError> {
        self.begin_drag(deal_id)?;
        self.finish_drag(destination).await
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn install(
        &self,
        ticket: u64,
        build: impl FnOnce(&BoardSnapshot) -> BoardSnapshot,
    ) -> Arc<BoardSnapshot> {
        let mut installed = self.installed.write().unwrap_or_else(PoisonError::into_inner);
        if ticket < installed.ticket {
            debug!(ticket, installed = installed.ticket, "dropping stale fetch");
            return Arc::clone(&installed.snapshot);
        }
        let next = Arc::new(build(&installed.snapshot));
        installed.ticket = ticket;
        installed.snapshot = Arc::clone(&next);
        next
    }
}
