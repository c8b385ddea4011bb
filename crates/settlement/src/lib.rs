//! `defter-settlement` — invoice settlement and ledger posting.
//!
//! The orchestrator turns one invoice plus a chosen payment method into a
//! strictly-ordered sequence of store writes (header, lines, ledger entry,
//! status transition); the due-date sweep drives the same mapping over
//! overdue deferred invoices in batch.
//!
//! Every store call is an async round trip to an external data service.
//! There is no shared transaction across those calls: a failing step leaves
//! earlier steps committed, and errors say which step failed so an operator
//! can follow up.

pub mod memory;
pub mod orchestrator;
pub mod store;
pub mod sweep;


pub use orchestrator::{
    LedgerEntry, Settled, SettlementError, SettlementOrchestrator, SettlementStep,
};
pub use store::{BankLedger, CashLedger, InvoiceFilter, InvoiceStore, PosLedger, StoreError};
pub use sweep::{DueDateSweep, SweepMode, SweepSummary, DEFAULT_SWEEP_BATCH_SIZE};
