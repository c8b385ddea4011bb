//! Due-date sweep: batch settlement of overdue deferred invoices.
//!
//! An external scheduler triggers one run; there is no in-process timer.
//! Each invoice in the batch is processed independently — one failure is
//! logged and counted, never aborts the rest of the run.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use defter_core::Clock;
use defter_invoicing::{Invoice, InvoiceStatus};
use defter_ledger::NewCashMovement;

use crate::orchestrator::cash_kind_for;
use crate::store::{CashLedger, InvoiceFilter, InvoiceStore, StoreError};

/// Caps how many invoices one run will touch.
pub const DEFAULT_SWEEP_BATCH_SIZE: usize = 1000;

/// How a run guards against settling the same invoice twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepMode {
    /// Claim the invoice first via the conditional `draft → posted`
    /// transition, then write the cash movement. A conflict on the claim
    /// means another run got there first; the invoice is skipped and no
    /// second ledger row is written. An invoice claimed but not yet posted
    /// to cash (crash between the two writes) shows up as `posted` with no
    /// ledger entry and needs manual follow-up.
    #[default]
    StrictOnce,
    /// Write the cash movement first, then overwrite the status
    /// unconditionally. Matches the historical behavior; overlapping runs
    /// can double-settle, so the external scheduler must serialize runs.
    BestEffort,
}

/// Outcome counts for one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Invoices returned by the due-draft listing.
    pub scanned: usize,
    /// Advanced to `posted` with a cash movement written.
    pub settled: usize,
    /// Skipped because the gross total was not positive.
    pub skipped: usize,
    /// Lost the claim to a concurrent run (strict-once mode only).
    pub conflicts: usize,
    /// Failed on a store write; left for the next run.
    pub failed: usize,
}

/// Batch job settling deferred invoices whose due date has elapsed.
pub struct DueDateSweep {
    invoices: Arc<dyn InvoiceStore>,
    cash: Arc<dyn CashLedger>,
    mode: SweepMode,
    batch_size: usize,
}

impl DueDateSweep {
    pub fn new(invoices: Arc<dyn InvoiceStore>, cash: Arc<dyn CashLedger>) -> Self {
        Self {
            invoices,
            cash,
            mode: SweepMode::default(),
            batch_size: DEFAULT_SWEEP_BATCH_SIZE,
        }
    }

    pub fn with_mode(mut self, mode: SweepMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Scheduler entry point: sweep as of the clock's current date.
    pub async fn run(&self, clock: &dyn Clock) -> Result<SweepSummary, StoreError> {
        self.sweep_due_invoices(clock.today()).await
    }

    /// Settle every draft invoice with `due_date <= as_of`, bounded by the
    /// batch size. The listing failing aborts the run; per-invoice failures
    /// do not.
    pub async fn sweep_due_invoices(&self, as_of: NaiveDate) -> Result<SweepSummary, StoreError> {
        let due = self
            .invoices
            .list_invoices(InvoiceFilter {
                status: Some(InvoiceStatus::Draft),
                due_on_or_before: Some(as_of),
                limit: Some(self.batch_size),
            })
            .await?;

        let mut summary = SweepSummary {
            scanned: due.len(),
            ..SweepSummary::default()
        };

        for invoice in due {
            // Zero/negative totals are not settleable.
            if !invoice.gross_total.is_positive() {
                debug!(invoice_id = %invoice.id, gross = %invoice.gross_total, "skipping non-positive invoice");
                summary.skipped += 1;
                continue;
            }

            match self.settle_one(&invoice).await {
                Ok(true) => summary.settled += 1,
                Ok(false) => {
                    debug!(invoice_id = %invoice.id, "invoice already claimed by a concurrent run");
                    summary.conflicts += 1;
                }
                Err(err) => {
                    warn!(invoice_id = %invoice.id, error = %err, "due-date settlement failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            as_of = %as_of,
            scanned = summary.scanned,
            settled = summary.settled,
            skipped = summary.skipped,
            conflicts = summary.conflicts,
            failed = summary.failed,
            "due-date sweep finished"
        );
        Ok(summary)
    }

    /// Returns `Ok(false)` when the strict-once claim lost to a concurrent
    /// run; `Ok(true)` when the invoice was settled.
    async fn settle_one(&self, invoice: &Invoice) -> Result<bool, StoreError> {
        let kind = cash_kind_for(invoice.direction);
        let entry = NewCashMovement {
            kind,
            counterparty_id: Some(invoice.counterparty_id),
            amount: invoice.gross_total,
            description: Some(format!(
                "automatic due-date {}: {}",
                kind.as_str(),
                invoice.id,
            )),
        };

        match self.mode {
            SweepMode::StrictOnce => {
                match self
                    .invoices
                    .transition_status(invoice.id, InvoiceStatus::Draft, InvoiceStatus::Posted)
                    .await
                {
                    Ok(()) => {}
                    Err(StoreError::StatusConflict { .. }) => return Ok(false),
                    Err(err) => return Err(err),
                }
                self.cash.append(entry).await?;
            }
            SweepMode::BestEffort => {
                self.cash.append(entry).await?;
                self.invoices
                    .update_status(invoice.id, InvoiceStatus::Posted)
                    .await?;
            }
        }

        Ok(true)
    }
}
