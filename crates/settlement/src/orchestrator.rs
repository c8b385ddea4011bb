//! Settlement pipeline (application-level orchestration).
//!
//! Maps a `(invoice draft, payment method)` pair to a deterministic sequence
//! of store writes and a status transition:
//!
//! ```text
//! validate draft + lines          (no writes on failure)
//!   ↓
//! 1. insert header (status = draft)
//!   ↓
//! 2. insert lines
//!   ↓
//! 3. append ledger entry per method (cash / bank / POS; none for deferred)
//!   ↓
//! 4. guarded status transition draft → posted (skipped for deferred)
//! ```
//!
//! The steps are sequential awaits against independently-committed writes.
//! If a step fails, earlier steps stay committed: the invoice remains
//! queryable in `draft` with no ledger entry (or with one, if the status
//! write was the step that failed). The error names the failing step so the
//! caller can decide how to follow up; nothing is retried internally.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use defter_core::{DomainError, Money};
use defter_invoicing::{
    Invoice, InvoiceDirection, InvoiceDraft, InvoiceStatus, LifecycleEvent, NewInvoiceLine,
    PaymentMethod,
};
use defter_ledger::{
    BankMovement, BankMovementKind, CashMovement, CashMovementKind, NewBankMovement,
    NewCashMovement, NewPosBlock, PosBlock,
};

use crate::store::{BankLedger, CashLedger, InvoiceStore, PosLedger, StoreError};

/// Which step of the settlement sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStep {
    InsertHeader,
    InsertLines,
    AppendLedger,
    UpdateStatus,
}

impl SettlementStep {
    pub fn as_str(self) -> &'static str {
        match self {
            SettlementStep::InsertHeader => "insert_header",
            SettlementStep::InsertLines => "insert_lines",
            SettlementStep::AppendLedger => "append_ledger",
            SettlementStep::UpdateStatus => "update_status",
        }
    }
}

impl core::fmt::Display for SettlementStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement failure.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The draft or its lines failed validation; nothing was written.
    #[error("settlement validation failed: {0}")]
    Validation(#[from] DomainError),

    /// A store write failed. Steps before `step` are already committed.
    #[error("settlement step {step} failed: {source}")]
    Store {
        step: SettlementStep,
        source: StoreError,
    },

    /// A domain rule failed mid-sequence, after earlier steps already
    /// committed. Only reachable through a nonconforming store adapter
    /// (e.g. one handing back headers that are not `Draft`).
    #[error("settlement step {step} violated a domain rule: {source}")]
    Domain {
        step: SettlementStep,
        source: DomainError,
    },
}

impl SettlementError {
    fn at(step: SettlementStep) -> impl FnOnce(StoreError) -> SettlementError {
        move |source| SettlementError::Store { step, source }
    }

    fn domain_at(step: SettlementStep) -> impl FnOnce(DomainError) -> SettlementError {
        move |source| SettlementError::Domain { step, source }
    }

    /// The step that failed, if earlier steps may already be committed.
    pub fn failed_step(&self) -> Option<SettlementStep> {
        match self {
            SettlementError::Store { step, .. } | SettlementError::Domain { step, .. } => {
                Some(*step)
            }
            SettlementError::Validation(_) => None,
        }
    }
}

/// The ledger row a settlement produced, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Cash(CashMovement),
    Bank(BankMovement),
    Pos(PosBlock),
}

/// Result of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    /// The persisted invoice with the status it now holds.
    pub invoice: Invoice,
    /// `None` exactly for the deferred path.
    pub entry: Option<LedgerEntry>,
}

/// Maps `purchase → payment`, everything else (sales and both return kinds)
/// to `receipt`.
pub fn cash_kind_for(direction: InvoiceDirection) -> CashMovementKind {
    match direction {
        InvoiceDirection::Purchase => CashMovementKind::Payment,
        _ => CashMovementKind::Receipt,
    }
}

/// Maps `purchase → outflow`, everything else to `inflow`.
pub fn bank_kind_for(direction: InvoiceDirection) -> BankMovementKind {
    match direction {
        InvoiceDirection::Purchase => BankMovementKind::Outflow,
        _ => BankMovementKind::Inflow,
    }
}

/// Executes settlements against injected store handles.
///
/// Composes the invoice store and the three ledger mutators behind trait
/// objects, so tests run on in-memory adapters and production wires in the
/// network-backed ones. Holds no other state; concurrent settlements share
/// nothing in-process.
pub struct SettlementOrchestrator {
    invoices: Arc<dyn InvoiceStore>,
    cash: Arc<dyn CashLedger>,
    bank: Arc<dyn BankLedger>,
    pos: Arc<dyn PosLedger>,
}

impl SettlementOrchestrator {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        cash: Arc<dyn CashLedger>,
        bank: Arc<dyn BankLedger>,
        pos: Arc<dyn PosLedger>,
    ) -> Self {
        Self {
            invoices,
            cash,
            bank,
            pos,
        }
    }

    /// Settle a new invoice with the chosen payment method.
    ///
    /// On success the returned invoice is `Posted` (or still `Draft` for the
    /// deferred path) and `entry` holds the single ledger row written.
    pub async fn settle_new_invoice(
        &self,
        mut draft: InvoiceDraft,
        lines: Vec<NewInvoiceLine>,
        method: PaymentMethod,
    ) -> Result<Settled, SettlementError> {
        draft.validate_with_lines(&lines)?;

        // The deferred method owns the due date it defers to.
        if let Some(due_date) = method.due_date() {
            draft.due_date = Some(due_date);
        }

        let invoice = self
            .invoices
            .insert_invoice(draft)
            .await
            .map_err(SettlementError::at(SettlementStep::InsertHeader))?;
        debug!(invoice_id = %invoice.id, direction = invoice.direction.as_str(), "invoice header persisted");

        self.invoices
            .insert_lines(invoice.id, lines)
            .await
            .map_err(SettlementError::at(SettlementStep::InsertLines))?;

        let entry = self.append_ledger_entry(&invoice, method).await?;

        let invoice = if method.is_deferred() {
            debug!(invoice_id = %invoice.id, due_date = ?invoice.due_date, "settlement deferred to due date");
            invoice
        } else {
            let next = invoice
                .status
                .advance(LifecycleEvent::Post)
                .map_err(SettlementError::domain_at(SettlementStep::UpdateStatus))?;
            self.invoices
                .transition_status(invoice.id, InvoiceStatus::Draft, next)
                .await
                .map_err(SettlementError::at(SettlementStep::UpdateStatus))?;
            Invoice {
                status: next,
                ..invoice
            }
        };

        info!(
            invoice_id = %invoice.id,
            method = method.as_str(),
            status = invoice.status.as_str(),
            gross = %invoice.gross_total,
            "invoice settled"
        );
        Ok(Settled {
            invoice,
            entry,
        })
    }

    /// Step 3: exactly one ledger row per non-deferred settlement.
    async fn append_ledger_entry(
        &self,
        invoice: &Invoice,
        method: PaymentMethod,
    ) -> Result<Option<LedgerEntry>, SettlementError> {
        let entry = match method {
            PaymentMethod::Cash => {
                let kind = cash_kind_for(invoice.direction);
                let movement = self
                    .cash
                    .append(NewCashMovement {
                        kind,
                        counterparty_id: Some(invoice.counterparty_id),
                        amount: invoice.gross_total,
                        description: Some(format!("invoice {}: {}", kind.as_str(), invoice.id)),
                    })
                    .await
                    .map_err(SettlementError::at(SettlementStep::AppendLedger))?;
                Some(LedgerEntry::Cash(movement))
            }
            PaymentMethod::BankTransfer { bank_account_id } => {
                let kind = bank_kind_for(invoice.direction);
                let movement = self
                    .bank
                    .append(NewBankMovement {
                        bank_account_id,
                        kind,
                        counterparty_id: Some(invoice.counterparty_id),
                        amount: invoice.gross_total,
                        description: Some(format!("invoice {}: {}", kind.as_str(), invoice.id)),
                    })
                    .await
                    .map_err(SettlementError::at(SettlementStep::AppendLedger))?;
                Some(LedgerEntry::Bank(movement))
            }
            PaymentMethod::CardHold { bank_account_id } => {
                // Fee is reconciled manually later; the hold starts at zero.
                let block = NewPosBlock::new(
                    bank_account_id,
                    Some(format!("invoice {}", invoice.id)),
                    invoice.gross_total,
                    Money::ZERO,
                    invoice.due_date,
                )
                .map_err(SettlementError::domain_at(SettlementStep::AppendLedger))?;
                let block = self
                    .pos
                    .append(block)
                    .await
                    .map_err(SettlementError::at(SettlementStep::AppendLedger))?;
                Some(LedgerEntry::Pos(block))
            }
            PaymentMethod::Deferred { .. } => None,
        };
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_direction_pays_out() {
        assert_eq!(
            cash_kind_for(InvoiceDirection::Purchase),
            CashMovementKind::Payment,
        );
        assert_eq!(
            bank_kind_for(InvoiceDirection::Purchase),
            BankMovementKind::Outflow,
        );
    }

    #[test]
    fn all_other_directions_collect() {
        for direction in [
            InvoiceDirection::Sale,
            InvoiceDirection::SaleReturn,
            InvoiceDirection::PurchaseReturn,
        ] {
            assert_eq!(cash_kind_for(direction), CashMovementKind::Receipt);
            assert_eq!(bank_kind_for(direction), BankMovementKind::Inflow);
        }
    }

    #[test]
    fn store_errors_carry_the_failing_step() {
        let err = SettlementError::Store {
            step: SettlementStep::AppendLedger,
            source: StoreError::Unavailable("connection reset".to_string()),
        };
        assert_eq!(err.failed_step(), Some(SettlementStep::AppendLedger));
        assert!(err.to_string().contains("append_ledger"));

        let validation = SettlementError::Validation(DomainError::validation("bad draft"));
        assert_eq!(validation.failed_step(), None);
    }

    #[test]
    fn domain_errors_mid_sequence_carry_the_failing_step() {
        let err = SettlementError::Domain {
            step: SettlementStep::UpdateStatus,
            source: DomainError::conflict("cannot apply post to posted invoice"),
        };
        assert_eq!(err.failed_step(), Some(SettlementStep::UpdateStatus));
        assert!(err.to_string().contains("update_status"));
    }
}
