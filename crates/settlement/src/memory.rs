//! In-memory store adapters.
//!
//! Intended for tests/dev. Not optimized for performance. Each adapter can
//! be armed to fail its next call, which is how partial-failure paths are
//! exercised without a real network.

use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use defter_core::RecordId;
use defter_invoicing::{
    Invoice, InvoiceDraft, InvoiceId, InvoiceLine, InvoiceLineId, InvoiceStatus, NewInvoiceLine,
};
use defter_ledger::{
    BankMovement, BankMovementId, CashMovement, CashMovementId, NewBankMovement, NewCashMovement,
    NewPosBlock, PosBlock, PosBlockId, PosBlockStatus,
};

use crate::store::{
    BankLedger, CashLedger, InvoiceFilter, InvoiceStore, PosLedger, StoreError,
};

/// Functional currency applied when a draft leaves currency unset.
const DEFAULT_CURRENCY: &str = "TRY";

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

/// Single-shot fault slot shared by all adapters.
#[derive(Debug, Default)]
struct FaultSlot(Mutex<Option<StoreError>>);

impl FaultSlot {
    fn arm(&self, err: StoreError) {
        *self.0.lock().expect("fault slot lock") = Some(err);
    }

    fn trip(&self) -> Result<(), StoreError> {
        match self.0.lock().map_err(|_| poisoned())?.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory invoice store.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    invoices: RwLock<Vec<Invoice>>,
    lines: RwLock<Vec<InvoiceLine>>,
    fault: FaultSlot,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next store call with `err`.
    pub fn fail_next(&self, err: StoreError) {
        self.fault.arm(err);
    }

    /// Test helper: fetch one invoice by id.
    pub fn get(&self, id: InvoiceId) -> Option<Invoice> {
        self.invoices
            .read()
            .ok()?
            .iter()
            .find(|inv| inv.id == id)
            .cloned()
    }

    /// Test helper: lines belonging to one invoice.
    pub fn lines_for(&self, id: InvoiceId) -> Vec<InvoiceLine> {
        self.lines
            .read()
            .map(|lines| {
                lines
                    .iter()
                    .filter(|l| l.invoice_id == id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn insert_invoice(&self, draft: InvoiceDraft) -> Result<Invoice, StoreError> {
        self.fault.trip()?;
        let invoice = Invoice {
            id: InvoiceId::new(RecordId::new()),
            direction: draft.direction,
            status: InvoiceStatus::Draft,
            counterparty_id: draft.counterparty_id,
            invoice_date: draft.invoice_date,
            due_date: draft.due_date,
            currency: draft
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            net_total: draft.net_total,
            vat_total: draft.vat_total,
            gross_total: draft.gross_total,
            created_at: Utc::now(),
        };
        self.invoices
            .write()
            .map_err(|_| poisoned())?
            .push(invoice.clone());
        Ok(invoice)
    }

    async fn insert_lines(
        &self,
        invoice_id: InvoiceId,
        lines: Vec<NewInvoiceLine>,
    ) -> Result<(), StoreError> {
        self.fault.trip()?;
        if self.get(invoice_id).is_none() {
            return Err(StoreError::NotFound);
        }
        let mut stored = self.lines.write().map_err(|_| poisoned())?;
        for line in lines {
            stored.push(InvoiceLine {
                id: InvoiceLineId::new(RecordId::new()),
                invoice_id,
                item_id: line.item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                vat_rate: line.vat_rate,
                line_total: line.line_total,
            });
        }
        Ok(())
    }

    async fn list_invoices(&self, filter: InvoiceFilter) -> Result<Vec<Invoice>, StoreError> {
        self.fault.trip()?;
        let invoices = self.invoices.read().map_err(|_| poisoned())?;
        let mut matching: Vec<Invoice> = invoices
            .iter()
            .filter(|inv| filter.status.map(|s| inv.status == s).unwrap_or(true))
            .filter(|inv| match filter.due_on_or_before {
                Some(as_of) => inv.due_date.map(|due| due <= as_of).unwrap_or(false),
                None => true,
            })
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn update_status(&self, id: InvoiceId, status: InvoiceStatus) -> Result<(), StoreError> {
        self.fault.trip()?;
        let mut invoices = self.invoices.write().map_err(|_| poisoned())?;
        let invoice = invoices
            .iter_mut()
            .find(|inv| inv.id == id)
            .ok_or(StoreError::NotFound)?;
        invoice.status = status;
        Ok(())
    }

    async fn transition_status(
        &self,
        id: InvoiceId,
        expected: InvoiceStatus,
        next: InvoiceStatus,
    ) -> Result<(), StoreError> {
        self.fault.trip()?;
        let mut invoices = self.invoices.write().map_err(|_| poisoned())?;
        let invoice = invoices
            .iter_mut()
            .find(|inv| inv.id == id)
            .ok_or(StoreError::NotFound)?;
        if invoice.status != expected {
            return Err(StoreError::StatusConflict {
                expected,
                found: invoice.status,
            });
        }
        invoice.status = next;
        Ok(())
    }
}

/// In-memory cash ledger.
#[derive(Debug, Default)]
pub struct InMemoryCashLedger {
    rows: RwLock<Vec<CashMovement>>,
    fault: FaultSlot,
}

impl InMemoryCashLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, err: StoreError) {
        self.fault.arm(err);
    }

    pub fn entries(&self) -> Vec<CashMovement> {
        self.rows.read().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CashLedger for InMemoryCashLedger {
    async fn append(&self, entry: NewCashMovement) -> Result<CashMovement, StoreError> {
        self.fault.trip()?;
        let movement = CashMovement {
            id: CashMovementId::new(RecordId::new()),
            kind: entry.kind,
            counterparty_id: entry.counterparty_id,
            amount: entry.amount,
            description: entry.description,
            created_at: Utc::now(),
        };
        self.rows
            .write()
            .map_err(|_| poisoned())?
            .push(movement.clone());
        Ok(movement)
    }
}

/// In-memory bank ledger.
#[derive(Debug, Default)]
pub struct InMemoryBankLedger {
    rows: RwLock<Vec<BankMovement>>,
    fault: FaultSlot,
}

impl InMemoryBankLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, err: StoreError) {
        self.fault.arm(err);
    }

    pub fn entries(&self) -> Vec<BankMovement> {
        self.rows.read().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BankLedger for InMemoryBankLedger {
    async fn append(&self, entry: NewBankMovement) -> Result<BankMovement, StoreError> {
        self.fault.trip()?;
        let movement = BankMovement {
            id: BankMovementId::new(RecordId::new()),
            bank_account_id: entry.bank_account_id,
            kind: entry.kind,
            counterparty_id: entry.counterparty_id,
            amount: entry.amount,
            description: entry.description,
            created_at: Utc::now(),
        };
        self.rows
            .write()
            .map_err(|_| poisoned())?
            .push(movement.clone());
        Ok(movement)
    }
}

/// In-memory POS block store.
#[derive(Debug, Default)]
pub struct InMemoryPosLedger {
    rows: RwLock<Vec<PosBlock>>,
    fault: FaultSlot,
}

impl InMemoryPosLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, err: StoreError) {
        self.fault.arm(err);
    }

    pub fn entries(&self) -> Vec<PosBlock> {
        self.rows.read().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PosLedger for InMemoryPosLedger {
    async fn append(&self, entry: NewPosBlock) -> Result<PosBlock, StoreError> {
        self.fault.trip()?;
        let block = PosBlock {
            id: PosBlockId::new(RecordId::new()),
            bank_account_id: entry.bank_account_id(),
            reference: entry.reference().map(str::to_string),
            gross_amount: entry.gross_amount(),
            fee_amount: entry.fee_amount(),
            net_amount: entry.net_amount(),
            block_release_date: entry.block_release_date(),
            status: PosBlockStatus::Blocked,
            created_at: Utc::now(),
        };
        self.rows
            .write()
            .map_err(|_| poisoned())?
            .push(block.clone());
        Ok(block)
    }
}
