//! `defter-invoicing` — invoice model and status lifecycle.
//!
//! Invoices carry immutable totals and a forward-only status; how a
//! settlement turns them into ledger rows lives in `defter-settlement`.

pub mod invoice;
pub mod payment;

pub use invoice::{
    Invoice, InvoiceDirection, InvoiceDraft, InvoiceId, InvoiceLine, InvoiceLineId, InvoiceStatus,
    LifecycleEvent, NewInvoiceLine,
};
pub use payment::PaymentMethod;
