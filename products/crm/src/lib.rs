//! CRM pipeline board.
//!
//! [`board`] and [`format`] are pure functions over the current deal list.
//! [`drag`] owns the single drag gesture and its one store write, and
//! [`session`] keeps the last server-confirmed snapshot, reloading it after
//! every successful move.

pub mod board;
pub mod dashboard;
pub mod drag;
pub mod filter;
pub mod format;
pub mod seed;
pub mod session;
mod stores;

pub use board::{
    BoardColumns, Card, Lookups, StageColumn, StageTotals, bucket, stage_breakdown, stage_value,
};
pub use dashboard::{Activity, ActivityKind, DashboardStats, StatCard, recent_activity};
pub use drag::{
    DragController, DragError, DragOutcome, DragPhase, DragSignals, Gesture, StageMove,
};
pub use filter::{CompanyFilter, ContactFilter, DealFilter, industries};
pub use seed::{SeededCrmRecords, seed_crm_demo};
pub use session::{BoardSnapshot, Notice, NoticeLevel, Notifier, PipelineBoard, TracingNotifier};
pub use stores::CrmStores;
