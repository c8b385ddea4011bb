//! Payment method selection for invoice settlement.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use defter_core::BankAccountId;

/// How a freshly issued invoice is settled.
///
/// Each variant carries exactly the parameters its method requires, so a
/// bank transfer without an account or a deferral without a due date is
/// unrepresentable rather than a runtime validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Immediate settlement through the cash ledger.
    Cash,
    /// Immediate settlement against a bank account.
    BankTransfer { bank_account_id: BankAccountId },
    /// Card settlement held as a provisional POS block.
    CardHold { bank_account_id: BankAccountId },
    /// No ledger effect now; the due-date sweep settles it later.
    Deferred { due_date: NaiveDate },
}

impl PaymentMethod {
    /// Due date this method imposes on the invoice, if any.
    pub fn due_date(&self) -> Option<NaiveDate> {
        match self {
            PaymentMethod::Deferred { due_date } => Some(*due_date),
            _ => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, PaymentMethod::Deferred { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer { .. } => "bank_transfer",
            PaymentMethod::CardHold { .. } => "card_hold",
            PaymentMethod::Deferred { .. } => "deferred",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_deferred_imposes_a_due_date() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            PaymentMethod::Deferred { due_date: due }.due_date(),
            Some(due),
        );
        assert_eq!(PaymentMethod::Cash.due_date(), None);
        assert!(!PaymentMethod::Cash.is_deferred());
        assert!(PaymentMethod::Deferred { due_date: due }.is_deferred());
    }

    #[test]
    fn serializes_with_method_tag() {
        let method = PaymentMethod::BankTransfer {
            bank_account_id: BankAccountId::new(),
        };
        let json = serde_json::to_value(&method).unwrap();
        assert_eq!(json["method"], "bank_transfer");
        assert!(json["bank_account_id"].is_string());
    }
}
