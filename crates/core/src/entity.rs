//! Entity trait: identity + continuity across state changes.
//!
//! Rows in this system (invoices, ledger movements) are entities: two rows
//! with the same field values are still distinct if their ids differ.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
