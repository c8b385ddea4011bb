//! `defter-ledger` — append-only financial effect rows.
//!
//! One module per table: cash movements, bank movements, POS blocks. Each
//! row represents one effect of a commercial event; none of them knows about
//! the others or about invoices.

pub mod bank;
pub mod cash;
pub mod pos;

pub use bank::{BankMovement, BankMovementId, BankMovementKind, NewBankMovement};
pub use cash::{CashMovement, CashMovementId, CashMovementKind, NewCashMovement};
pub use pos::{NewPosBlock, PosBlock, PosBlockEvent, PosBlockId, PosBlockStatus};
