//! Drag-and-drop of a deal card between stage columns.
//!
//! One gesture at a time. A drop onto any column, the origin included, issues
//! exactly one stage update; the controller never edits a cached deal, the
//! caller reloads on [`DragOutcome::Moved`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use entity::{Deal, DealPatch, RecordId, Stage};
use platform_store::RecordStore;
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gesture {
    pub deal_id: RecordId,
    pub origin: Stage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging(Gesture),
    /// The stage update is in flight.
    Resolving { gesture: Gesture, destination: Stage },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageMove {
    pub deal_id: RecordId,
    pub from: Stage,
    pub to: Stage,
}

impl StageMove {
    /// Dropped back onto the column it came from.
    pub fn is_same_stage(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// Released outside every column. Nothing was written.
    Cancelled,
    Moved(StageMove),
    Failed { attempted: StageMove, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DragError {
    #[error("another drag gesture is still in progress")]
    Busy,
    #[error("no deal is being dragged")]
    NotDragging,
    #[error("deal {0} is not on the board")]
    UnknownDeal(RecordId),
}

/// Hooks for the view layer. Both default to no-ops.
pub trait DragSignals: Send + Sync {
    fn on_drag_start(&self, _gesture: &Gesture) {}

    fn on_drag_end(&self, _outcome: &DragOutcome) {}
}

pub struct NoSignals;

impl DragSignals for NoSignals {}

pub struct DragController {
    store: Arc<dyn RecordStore<Deal>>,
    signals: Arc<dyn DragSignals>,
    phase: Mutex<DragPhase>,
}

impl DragController {
    pub fn new(store: Arc<dyn RecordStore<Deal>>) -> Self {
        Self {
            store,
            signals: Arc::new(NoSignals),
            phase: Mutex::new(DragPhase::Idle),
        }
    }

    pub fn with_signals(mut self, signals: Arc<dyn DragSignals>) -> Self {
        self.signals = signals;
        self
    }

    pub fn phase(&self) -> DragPhase {
        *self.lock()
    }

    pub fn pick_up(&self, deal_id: RecordId, origin: Stage) -> Result<Gesture, DragError> {
        let gesture = Gesture { deal_id, origin };
        {
            let mut phase = self.lock();
            if *phase != DragPhase::Idle {
                debug!(%deal_id, current = ?*phase, "pick-up rejected");
                return Err(DragError::Busy);
            }
            *phase = DragPhase::Dragging(gesture);
        }
        self.signals.on_drag_start(&gesture);
        Ok(gesture)
    }

    /// Releases the current gesture over `destination`, or over nothing when
    /// `None`. Store failures come back as [`DragOutcome::Failed`].
    pub async fn drop(&self, destination: Option<Stage>) -> Result<DragOutcome, DragError> {
        let (gesture, destination) = {
            let mut phase = self.lock();
            let gesture = match *phase {
                DragPhase::Dragging(gesture) => gesture,
                DragPhase::Idle => return Err(DragError::NotDragging),
                DragPhase::Resolving { .. } => return Err(DragError::Busy),
            };
            *phase = match destination {
                Some(destination) => DragPhase::Resolving {
                    gesture,
                    destination,
                },
                None => DragPhase::Idle,
            };
            (gesture, destination)
        };

        let outcome = match destination {
            None => {
                debug!(deal_id = %gesture.deal_id, "released outside the board");
                DragOutcome::Cancelled
            }
            Some(destination) => {
                let _idle = ResetOnDrop(&self.phase);
                self.persist(gesture, destination).await
            }
        };
        self.signals.on_drag_end(&outcome);
        Ok(outcome)
    }

    async fn persist(&self, gesture: Gesture, destination: Stage) -> DragOutcome {
        let attempted = StageMove {
            deal_id: gesture.deal_id,
            from: gesture.origin,
            to: destination,
        };
        let span = info_span!(
            "crm.dragDrop",
            deal_id = %attempted.deal_id,
            from = %attempted.from,
            to = %attempted.to
        );
        let result = self
            .store
            .update(gesture.deal_id, DealPatch::stage(destination))
            .instrument(span.clone())
            .await;
        let _entered = span.enter();
        match result {
            Ok(_) => {
                info!(same_stage = attempted.is_same_stage(), "deal stage updated");
                DragOutcome::Moved(attempted)
            }
            Err(err) => {
                warn!(error = %err, "deal stage update failed");
                DragOutcome::Failed {
                    attempted,
                    reason: err.to_string(),
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, DragPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the controller to `Idle` once the in-flight update settles, or if
/// the caller abandons the future.
struct ResetOnDrop<'a>(&'a Mutex<DragPhase>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = DragPhase::Idle;
    }
}
