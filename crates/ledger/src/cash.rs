//! Cash ledger rows (till movements).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use defter_core::{CounterpartyId, Entity, Money, RecordId};

/// Cash movement identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CashMovementId(pub RecordId);

impl CashMovementId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CashMovementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Direction/kind of a cash movement.
///
/// Settlement writes only `Receipt` and `Payment`; `Advance` and
/// `InternalTransfer` exist for the manual cash CRUD path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashMovementKind {
    Receipt,
    Payment,
    Advance,
    InternalTransfer,
}

impl CashMovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CashMovementKind::Receipt => "receipt",
            CashMovementKind::Payment => "payment",
            CashMovementKind::Advance => "advance",
            CashMovementKind::InternalTransfer => "internal_transfer",
        }
    }
}

impl core::fmt::Display for CashMovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cash movement input, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCashMovement {
    pub kind: CashMovementKind,
    pub counterparty_id: Option<CounterpartyId>,
    pub amount: Money,
    pub description: Option<String>,
}

/// Cash movement as persisted. Append-only; settlement never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashMovement {
    pub id: CashMovementId,
    pub kind: CashMovementKind,
    pub counterparty_id: Option<CounterpartyId>,
    pub amount: Money,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for CashMovement {
    type Id = CashMovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_to_store_literals() {
        assert_eq!(
            serde_json::to_string(&CashMovementKind::Receipt).unwrap(),
            "\"receipt\"",
        );
        assert_eq!(
            serde_json::to_string(&CashMovementKind::InternalTransfer).unwrap(),
            "\"internal_transfer\"",
        );
    }
}
