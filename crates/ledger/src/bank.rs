//! Bank ledger rows, scoped to a bank account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use defter_core::{BankAccountId, CounterpartyId, Entity, Money, RecordId};

/// Bank movement identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankMovementId(pub RecordId);

impl BankMovementId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for BankMovementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Direction of a bank movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankMovementKind {
    Inflow,
    Outflow,
}

impl BankMovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BankMovementKind::Inflow => "inflow",
            BankMovementKind::Outflow => "outflow",
        }
    }
}

impl core::fmt::Display for BankMovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bank movement input, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBankMovement {
    pub bank_account_id: BankAccountId,
    pub kind: BankMovementKind,
    pub counterparty_id: Option<CounterpartyId>,
    pub amount: Money,
    pub description: Option<String>,
}

/// Bank movement as persisted. Append-only; settlement never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankMovement {
    pub id: BankMovementId,
    pub bank_account_id: BankAccountId,
    pub kind: BankMovementKind,
    pub counterparty_id: Option<CounterpartyId>,
    pub amount: Money,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for BankMovement {
    type Id = BankMovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
