//! Entity mutators - pure functions from a collection value and a command to
//! the next collection value.
//!
//! Mutators never perform I/O; callers apply the returned collection to the
//! state store, which handles mirroring and scheduling. Side effects across
//! collections (a paid entry adjusting its linked bank account) are expressed
//! as a second mutator invocation on the other collection, never hidden
//! inside the first.

pub mod accounts;
pub mod entries;

use crate::error::{Error, Result};
use crate::model::{BalanceTransaction, BankAccount, Debt, Expense, FinancialEntry, FixedBill, SavingsGoal};
use crate::RecordId;

/// A record addressable by its collection-scoped id.
pub trait LedgerRecord {
    fn id(&self) -> RecordId;
    fn set_id(&mut self, id: RecordId);
}

macro_rules! impl_ledger_record {
    ($($ty:ty),+ $(,)?) => {
        $(impl LedgerRecord for $ty {
            fn id(&self) -> RecordId {
                self.id
            }

            fn set_id(&mut self, id: RecordId) {
                self.id = id;
            }
        })+
    };
}

impl_ledger_record!(
    Expense,
    Debt,
    FixedBill,
    SavingsGoal,
    BankAccount,
    FinancialEntry,
    BalanceTransaction,
);

/// A record with a paid/unpaid flag.
pub trait Payable {
    fn is_paid(&self) -> bool;
    fn set_paid(&mut self, paid: bool);
}

macro_rules! impl_payable {
    ($($ty:ty),+ $(,)?) => {
        $(impl Payable for $ty {
            fn is_paid(&self) -> bool {
                self.is_paid
            }

            fn set_paid(&mut self, paid: bool) {
                self.is_paid = paid;
            }
        })+
    };
}

impl_payable!(Expense, Debt, FixedBill, FinancialEntry);

/// The id assigned to the next record added to `items`.
///
/// `max(existing ids) + 1`, or `1` for an empty collection, computed from the
/// locally visible collection only. Two devices editing offline can mint the
/// same id; the later remote write silently overwrites the earlier record.
/// That is accepted behavior, not something the mutators detect.
pub fn next_id<T: LedgerRecord>(items: &[T]) -> RecordId {
    items.iter().map(LedgerRecord::id).max().map_or(1, |max| max + 1)
}

/// Append `record` with a freshly assigned id.
///
/// Any id already set on `record` is overwritten.
pub fn add<T: LedgerRecord + Clone>(items: &[T], mut record: T) -> Vec<T> {
    record.set_id(next_id(items));

    let mut next = items.to_vec();
    next.push(record);
    next
}

/// Replace the record matching `id` with `record`, preserving the stored id
/// even if `record` carries a different one.
pub fn update<T: LedgerRecord + Clone>(items: &[T], id: RecordId, mut record: T) -> Result<Vec<T>> {
    let index = position(items, id)?;
    record.set_id(id);

    let mut next = items.to_vec();
    next[index] = record;
    Ok(next)
}

/// Remove the record matching `id`.
pub fn remove<T: LedgerRecord + Clone>(items: &[T], id: RecordId) -> Result<Vec<T>> {
    position(items, id)?;

    Ok(items
        .iter()
        .filter(|item| item.id() != id)
        .cloned()
        .collect())
}

/// Flip the paid flag of the record matching `id`.
pub fn toggle_paid<T: LedgerRecord + Payable + Clone>(
    items: &[T],
    id: RecordId,
) -> Result<Vec<T>> {
    let index = position(items, id)?;

    let mut next = items.to_vec();
    let paid = next[index].is_paid();
    next[index].set_paid(!paid);
    Ok(next)
}

pub(crate) fn position<T: LedgerRecord>(items: &[T], id: RecordId) -> Result<usize> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or(Error::RecordNotFound(id))
}
