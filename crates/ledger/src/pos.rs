//! POS block rows: provisional card-settlement holds.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use defter_core::{BankAccountId, DomainError, DomainResult, Entity, Money, RecordId};

/// POS block identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PosBlockId(pub RecordId);

impl PosBlockId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PosBlockId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle of a POS block.
///
/// Settlement only ever creates `Blocked` rows; releasing or transferring a
/// hold is a manual workflow that still has to respect these transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosBlockStatus {
    Blocked,
    Released,
    Transferred,
}

impl PosBlockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PosBlockStatus::Blocked => "blocked",
            PosBlockStatus::Released => "released",
            PosBlockStatus::Transferred => "transferred",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, PosBlockStatus::Blocked)
    }

    /// Guarded transition; only `Blocked` holds can move.
    pub fn advance(self, event: PosBlockEvent) -> DomainResult<PosBlockStatus> {
        match (self, event) {
            (PosBlockStatus::Blocked, PosBlockEvent::Release) => Ok(PosBlockStatus::Released),
            (PosBlockStatus::Blocked, PosBlockEvent::Transfer) => Ok(PosBlockStatus::Transferred),
            (current, event) => Err(DomainError::conflict(format!(
                "cannot {event:?} a {} POS block",
                current.as_str(),
            ))),
        }
    }
}

impl core::fmt::Display for PosBlockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event applied to a POS block's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosBlockEvent {
    Release,
    Transfer,
}

/// POS block input, not yet persisted.
///
/// Constructed through [`NewPosBlock::new`] so that `net = gross − fee` holds
/// at write time; the fields stay private to keep the invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPosBlock {
    bank_account_id: BankAccountId,
    reference: Option<String>,
    gross_amount: Money,
    fee_amount: Money,
    net_amount: Money,
    block_release_date: Option<NaiveDate>,
}

impl NewPosBlock {
    pub fn new(
        bank_account_id: BankAccountId,
        reference: Option<String>,
        gross_amount: Money,
        fee_amount: Money,
        block_release_date: Option<NaiveDate>,
    ) -> DomainResult<Self> {
        if gross_amount.is_negative() {
            return Err(DomainError::validation(
                "POS block gross_amount must not be negative",
            ));
        }
        if fee_amount.is_negative() {
            return Err(DomainError::validation(
                "POS block fee_amount must not be negative",
            ));
        }
        if fee_amount > gross_amount {
            return Err(DomainError::invariant(
                "POS block fee_amount cannot exceed gross_amount",
            ));
        }

        let net_amount = gross_amount.checked_sub(fee_amount)?;
        Ok(Self {
            bank_account_id,
            reference,
            gross_amount,
            fee_amount,
            net_amount,
            block_release_date,
        })
    }

    pub fn bank_account_id(&self) -> BankAccountId {
        self.bank_account_id
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn gross_amount(&self) -> Money {
        self.gross_amount
    }

    pub fn fee_amount(&self) -> Money {
        self.fee_amount
    }

    pub fn net_amount(&self) -> Money {
        self.net_amount
    }

    pub fn block_release_date(&self) -> Option<NaiveDate> {
        self.block_release_date
    }
}

/// POS block as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosBlock {
    pub id: PosBlockId,
    pub bank_account_id: BankAccountId,
    pub reference: Option<String>,
    pub gross_amount: Money,
    pub fee_amount: Money,
    pub net_amount: Money,
    pub block_release_date: Option<NaiveDate>,
    pub status: PosBlockStatus,
    pub created_at: DateTime<Utc>,
}

impl Entity for PosBlock {
    type Id = PosBlockId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_account() -> BankAccountId {
        BankAccountId::new()
    }

    #[test]
    fn net_amount_is_gross_minus_fee() {
        let block = NewPosBlock::new(
            test_account(),
            None,
            Money::from_minor(1_000),
            Money::from_minor(25),
            None,
        )
        .unwrap();
        assert_eq!(block.net_amount(), Money::from_minor(975));
    }

    #[test]
    fn zero_fee_hold_keeps_full_gross() {
        let block = NewPosBlock::new(
            test_account(),
            Some("invoice ref".to_string()),
            Money::from_minor(100_000),
            Money::ZERO,
            NaiveDate::from_ymd_opt(2024, 3, 1),
        )
        .unwrap();
        assert_eq!(block.net_amount(), block.gross_amount());
        assert_eq!(block.reference(), Some("invoice ref"));
    }

    #[test]
    fn fee_exceeding_gross_is_rejected() {
        let err = NewPosBlock::new(
            test_account(),
            None,
            Money::from_minor(100),
            Money::from_minor(101),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn negative_fee_is_rejected() {
        let err = NewPosBlock::new(
            test_account(),
            None,
            Money::from_minor(100),
            Money::from_minor(-1),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blocked_holds_can_release_or_transfer_once() {
        assert_eq!(
            PosBlockStatus::Blocked.advance(PosBlockEvent::Release).unwrap(),
            PosBlockStatus::Released,
        );
        assert_eq!(
            PosBlockStatus::Blocked.advance(PosBlockEvent::Transfer).unwrap(),
            PosBlockStatus::Transferred,
        );
        assert!(PosBlockStatus::Released
            .advance(PosBlockEvent::Transfer)
            .is_err());
        assert!(PosBlockStatus::Transferred
            .advance(PosBlockEvent::Release)
            .is_err());
    }
}
