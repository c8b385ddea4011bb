use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use defter_core::{CounterpartyId, DomainError, DomainResult, Entity, ItemId, Money, RecordId};

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub RecordId);

impl InvoiceId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Invoice line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceLineId(pub RecordId);

impl InvoiceLineId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Commercial direction of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceDirection {
    Sale,
    Purchase,
    SaleReturn,
    PurchaseReturn,
}

impl InvoiceDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceDirection::Sale => "sale",
            InvoiceDirection::Purchase => "purchase",
            InvoiceDirection::SaleReturn => "sale_return",
            InvoiceDirection::PurchaseReturn => "purchase_return",
        }
    }
}

/// Invoice status lifecycle.
///
/// Only `Draft` can move; `Posted` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Posted,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Posted => "posted",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, InvoiceStatus::Draft)
    }

    /// Guarded transition: `advance(current, event) -> next | Conflict`.
    ///
    /// Callers pair this with a conditional store write so the stored status
    /// cannot be overwritten from a terminal state.
    pub fn advance(self, event: LifecycleEvent) -> DomainResult<InvoiceStatus> {
        match (self, event) {
            (InvoiceStatus::Draft, LifecycleEvent::Post) => Ok(InvoiceStatus::Posted),
            (InvoiceStatus::Draft, LifecycleEvent::Cancel) => Ok(InvoiceStatus::Cancelled),
            (current, event) => Err(DomainError::conflict(format!(
                "cannot apply {} to {} invoice",
                event.as_str(),
                current.as_str(),
            ))),
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event applied to an invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    Post,
    Cancel,
}

impl LifecycleEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::Post => "post",
            LifecycleEvent::Cancel => "cancel",
        }
    }
}

/// Invoice line input, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub item_id: ItemId,
    /// Quantity in the item's smallest stock unit.
    pub quantity: i64,
    pub unit_price: Money,
    /// VAT rate in whole percent (e.g. 20).
    pub vat_rate: u8,
    /// Gross line total, computed by the caller.
    pub line_total: Money,
}

/// Invoice line as persisted; owned by exactly one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub invoice_id: InvoiceId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Money,
    pub vat_rate: u8,
    pub line_total: Money,
}

impl Entity for InvoiceLine {
    type Id = InvoiceLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A fully-formed invoice header before persistence.
///
/// Totals are computed by the caller; `validate_with_lines` checks them and
/// fails closed before any write happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub direction: InvoiceDirection,
    pub counterparty_id: CounterpartyId,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// Store defaults an unset currency to the functional currency ("TRY").
    pub currency: Option<String>,
    pub net_total: Money,
    pub vat_total: Money,
    pub gross_total: Money,
}

impl InvoiceDraft {
    /// Validate the draft together with its lines.
    ///
    /// Invariants checked here and never re-validated later:
    /// - at least one line,
    /// - `gross = net + vat` (checked arithmetic),
    /// - gross equals the sum of line totals,
    /// - positive quantities, non-negative unit prices and line totals.
    pub fn validate_with_lines(&self, lines: &[NewInvoiceLine]) -> DomainResult<()> {
        if lines.is_empty() {
            return Err(DomainError::validation(
                "cannot create invoice without lines",
            ));
        }

        for line in lines {
            if line.quantity <= 0 {
                return Err(DomainError::validation(
                    "invoice line quantity must be positive",
                ));
            }
            if line.unit_price.is_negative() {
                return Err(DomainError::validation(
                    "invoice line unit_price must not be negative",
                ));
            }
            if line.line_total.is_negative() {
                return Err(DomainError::validation(
                    "invoice line total must not be negative",
                ));
            }
        }

        let computed_gross = self.net_total.checked_add(self.vat_total)?;
        if computed_gross != self.gross_total {
            return Err(DomainError::invariant(format!(
                "gross_total must equal net_total + vat_total ({} + {} != {})",
                self.net_total, self.vat_total, self.gross_total,
            )));
        }

        let line_sum = Money::checked_sum(lines.iter().map(|l| l.line_total))?;
        if line_sum != self.gross_total {
            return Err(DomainError::invariant(format!(
                "gross_total must equal sum of line totals ({} != {})",
                line_sum, self.gross_total,
            )));
        }

        Ok(())
    }
}

/// Invoice header as persisted.
///
/// Totals are immutable post-creation; only the status field moves, and only
/// through the settlement orchestrator or the due-date sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub direction: InvoiceDirection,
    pub status: InvoiceStatus,
    pub counterparty_id: CounterpartyId,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub net_total: Money,
    pub vat_total: Money,
    pub gross_total: Money,
    pub created_at: DateTime<Utc>,
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_draft(net: i64, vat: i64, gross: i64) -> InvoiceDraft {
        InvoiceDraft {
            direction: InvoiceDirection::Sale,
            counterparty_id: CounterpartyId::new(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            due_date: None,
            currency: None,
            net_total: Money::from_minor(net),
            vat_total: Money::from_minor(vat),
            gross_total: Money::from_minor(gross),
        }
    }

    fn line_totaling(total: i64) -> NewInvoiceLine {
        NewInvoiceLine {
            item_id: ItemId::new(),
            quantity: 1,
            unit_price: Money::from_minor(total),
            vat_rate: 20,
            line_total: Money::from_minor(total),
        }
    }

    #[test]
    fn draft_advances_to_posted_and_cancelled() {
        assert_eq!(
            InvoiceStatus::Draft.advance(LifecycleEvent::Post).unwrap(),
            InvoiceStatus::Posted,
        );
        assert_eq!(
            InvoiceStatus::Draft
                .advance(LifecycleEvent::Cancel)
                .unwrap(),
            InvoiceStatus::Cancelled,
        );
    }

    #[test]
    fn terminal_statuses_reject_every_event() {
        for status in [InvoiceStatus::Posted, InvoiceStatus::Cancelled] {
            for event in [LifecycleEvent::Post, LifecycleEvent::Cancel] {
                let err = status.advance(event).unwrap_err();
                match err {
                    DomainError::Conflict(_) => {}
                    _ => panic!("expected conflict for {status:?} + {event:?}"),
                }
            }
        }
    }

    #[test]
    fn valid_draft_passes_validation() {
        let draft = test_draft(100, 20, 120);
        draft
            .validate_with_lines(&[line_totaling(120)])
            .unwrap();
    }

    #[test]
    fn draft_without_lines_is_rejected() {
        let draft = test_draft(100, 20, 120);
        let err = draft.validate_with_lines(&[]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn gross_must_equal_net_plus_vat() {
        let draft = test_draft(100, 20, 121);
        let err = draft.validate_with_lines(&[line_totaling(121)]).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => {
                assert!(msg.contains("net_total + vat_total"));
            }
            _ => panic!("expected invariant violation"),
        }
    }

    #[test]
    fn gross_must_equal_sum_of_line_totals() {
        let draft = test_draft(100, 20, 120);
        let err = draft
            .validate_with_lines(&[line_totaling(60), line_totaling(70)])
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => {
                assert!(msg.contains("sum of line totals"));
            }
            _ => panic!("expected invariant violation"),
        }
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let draft = test_draft(100, 20, 120);
        let mut line = line_totaling(120);
        line.quantity = 0;
        let err = draft.validate_with_lines(&[line]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn status_serializes_to_store_literals() {
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Draft).unwrap(),
            "\"draft\"",
        );
        assert_eq!(
            serde_json::to_string(&InvoiceDirection::SaleReturn).unwrap(),
            "\"sale_return\"",
        );
    }

    proptest! {
        /// Property: any draft whose gross is net + vat and whose single line
        /// carries the full gross passes validation.
        #[test]
        fn consistent_totals_always_validate(
            net in 0i64..1_000_000_000i64,
            vat in 0i64..1_000_000_000i64,
        ) {
            let draft = test_draft(net, vat, net + vat);
            prop_assert!(draft.validate_with_lines(&[line_totaling(net + vat)]).is_ok());
        }

        /// Property: a terminal status never advances, whatever the event.
        #[test]
        fn terminal_statuses_never_advance(
            terminal in prop::sample::select(vec![InvoiceStatus::Posted, InvoiceStatus::Cancelled]),
            event in prop::sample::select(vec![LifecycleEvent::Post, LifecycleEvent::Cancel]),
        ) {
            prop_assert!(terminal.advance(event).is_err());
        }
    }
}
