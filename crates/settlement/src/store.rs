//! Store boundary: the persistence interfaces the settlement core drives.
//!
//! Thin operations only — insert-with-generated-id, list/filter, status
//! update. Field defaulting (unset currency becomes the functional currency
//! `TRY`) is the adapter's job; business rules stay out of here. Every call
//! is an independently-committed network round trip.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use defter_invoicing::{Invoice, InvoiceDraft, InvoiceId, InvoiceStatus, NewInvoiceLine};
use defter_ledger::{
    BankMovement, CashMovement, NewBankMovement, NewCashMovement, NewPosBlock, PosBlock,
};

/// Persistence failure at the store boundary.
///
/// Any step can fail after earlier steps in the same sequence already
/// committed; callers must treat these as partial-failure markers, not
/// rollbacks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Network/transport failure before the write was acknowledged.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write (constraint violation, bad payload).
    #[error("write rejected: {0}")]
    Rejected(String),

    /// A conditional status write found a different current status.
    #[error("status conflict: expected {expected}, found {found}")]
    StatusConflict {
        expected: InvoiceStatus,
        found: InvoiceStatus,
    },

    #[error("not found")]
    NotFound,
}

/// Filter for listing invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    /// Matches invoices whose due date is set and `<=` this date.
    pub due_on_or_before: Option<NaiveDate>,
    /// Caps a single listing; the sweep uses this to bound run cost.
    pub limit: Option<usize>,
}

/// Invoice persistence operations.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Insert a header with a generated id and status `Draft`.
    async fn insert_invoice(&self, draft: InvoiceDraft) -> Result<Invoice, StoreError>;

    /// Insert the lines of an invoice. Not atomic with the header insert.
    async fn insert_lines(
        &self,
        invoice_id: InvoiceId,
        lines: Vec<NewInvoiceLine>,
    ) -> Result<(), StoreError>;

    /// List invoices matching the filter, in the store's natural order
    /// (unspecified; callers must not rely on it).
    async fn list_invoices(&self, filter: InvoiceFilter) -> Result<Vec<Invoice>, StoreError>;

    /// Unconditional status overwrite (`UPDATE … WHERE id = ?`).
    ///
    /// Kept for the best-effort sweep mode; prefer [`transition_status`]
    /// everywhere else.
    ///
    /// [`transition_status`]: InvoiceStore::transition_status
    async fn update_status(&self, id: InvoiceId, status: InvoiceStatus) -> Result<(), StoreError>;

    /// Conditional transition: writes `next` only if the stored status equals
    /// `expected`, otherwise fails with [`StoreError::StatusConflict`].
    async fn transition_status(
        &self,
        id: InvoiceId,
        expected: InvoiceStatus,
        next: InvoiceStatus,
    ) -> Result<(), StoreError>;
}

/// Cash ledger mutator: single-table, single-row append.
#[async_trait]
pub trait CashLedger: Send + Sync {
    async fn append(&self, entry: NewCashMovement) -> Result<CashMovement, StoreError>;
}

/// Bank ledger mutator: single-table, single-row append.
#[async_trait]
pub trait BankLedger: Send + Sync {
    async fn append(&self, entry: NewBankMovement) -> Result<BankMovement, StoreError>;
}

/// POS block mutator: single-table, single-row append.
#[async_trait]
pub trait PosLedger: Send + Sync {
    async fn append(&self, entry: NewPosBlock) -> Result<PosBlock, StoreError>;
}
