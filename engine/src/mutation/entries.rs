//! Financial-entry mutators: installment tracking and the balance delta a
//! paid-status flip implies for the linked bank account.

use super::position;
use crate::error::{Error, Result};
use crate::model::{EntryKind, FinancialEntry};
use crate::RecordId;
use rust_decimal::Decimal;

/// Flip one installment's paid flag.
///
/// The entry-level `is_paid` is re-derived: an entry is paid when every
/// installment is. `current_installment` is left as the caller set it.
pub fn toggle_installment_paid(
    items: &[FinancialEntry],
    id: RecordId,
    index: usize,
) -> Result<Vec<FinancialEntry>> {
    let entry_index = position(items, id)?;

    let mut next = items.to_vec();
    let entry = &mut next[entry_index];

    let count = entry.installments.ok_or(Error::NoInstallmentPlan(id))?;
    let paid = entry
        .paid_installments
        .as_mut()
        .ok_or(Error::NoInstallmentPlan(id))?;

    if index >= paid.len() {
        return Err(Error::InstallmentOutOfRange { index, count });
    }

    paid[index] = !paid[index];
    entry.is_paid = paid.iter().all(|slot| *slot);

    Ok(next)
}

/// The balance delta the entry's *current* paid state implies for its linked
/// bank account.
///
/// Call after `toggle_paid`: an expense that just became paid debits the
/// account, an income credits it; flipping back inverts the sign. The caller
/// applies the delta with `accounts::adjust_balance` - a second mutator
/// invocation, never a hidden effect.
pub fn paid_delta(entry: &FinancialEntry) -> Decimal {
    let magnitude = match entry.kind {
        EntryKind::Income => entry.amount,
        EntryKind::Expense => -entry.amount,
    };

    if entry.is_paid {
        magnitude
    } else {
        -magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::toggle_paid;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn entry(id: RecordId, kind: EntryKind) -> FinancialEntry {
        FinancialEntry {
            id,
            description: "entry".into(),
            amount: dec!(300),
            kind,
            due_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            is_paid: false,
            bank_account_id: Some(1),
            installments: None,
            current_installment: None,
            paid_installments: None,
        }
    }

    fn installment_entry(id: RecordId, installments: u32) -> FinancialEntry {
        FinancialEntry {
            installments: Some(installments),
            current_installment: Some(1),
            paid_installments: Some(vec![false; installments as usize]),
            ..entry(id, EntryKind::Expense)
        }
    }

    #[test]
    fn toggle_installment_flips_one_slot() {
        let items = vec![installment_entry(1, 3)];
        let next = toggle_installment_paid(&items, 1, 1).unwrap();

        assert_eq!(
            next[0].paid_installments.as_deref(),
            Some(&[false, true, false][..])
        );
        assert!(!next[0].is_paid);
    }

    #[test]
    fn entry_paid_when_all_installments_paid() {
        let mut items = vec![installment_entry(1, 2)];
        items = toggle_installment_paid(&items, 1, 0).unwrap();
        items = toggle_installment_paid(&items, 1, 1).unwrap();

        assert!(items[0].is_paid);

        // Unpaying one installment clears the entry flag again.
        items = toggle_installment_paid(&items, 1, 0).unwrap();
        assert!(!items[0].is_paid);
    }

    #[test]
    fn toggle_installment_out_of_range() {
        let items = vec![installment_entry(1, 2)];
        let result = toggle_installment_paid(&items, 1, 2);
        assert_eq!(
            result,
            Err(Error::InstallmentOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn toggle_installment_without_plan() {
        let items = vec![entry(1, EntryKind::Expense)];
        let result = toggle_installment_paid(&items, 1, 0);
        assert_eq!(result, Err(Error::NoInstallmentPlan(1)));
    }

    #[test]
    fn paid_expense_debits_linked_account() {
        let items = vec![entry(1, EntryKind::Expense)];
        let next = toggle_paid(&items, 1).unwrap();
        assert_eq!(paid_delta(&next[0]), dec!(-300));
    }

    #[test]
    fn paid_income_credits_linked_account() {
        let items = vec![entry(1, EntryKind::Income)];
        let next = toggle_paid(&items, 1).unwrap();
        assert_eq!(paid_delta(&next[0]), dec!(300));
    }

    #[test]
    fn unpaying_inverts_the_delta() {
        let items = vec![entry(1, EntryKind::Expense)];
        let paid = toggle_paid(&items, 1).unwrap();
        let unpaid = toggle_paid(&paid, 1).unwrap();

        assert_eq!(paid_delta(&unpaid[0]), dec!(300));
    }
}
