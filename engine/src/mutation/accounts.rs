//! Bank account mutators and the account-balance transaction log.
//!
//! Bank accounts carry an invariant the generic mutators cannot express: a
//! non-empty collection has exactly one default account. Every operation here
//! re-derives the flag before returning.

use super::{next_id, position, LedgerRecord};
use crate::error::Result;
use crate::model::{AccountBalance, BalanceTransaction, BankAccount};
use crate::RecordId;
use rust_decimal::Decimal;

/// Append an account with a fresh id.
///
/// The first account becomes the default; an account added with
/// `is_default = true` takes the flag over from the previous holder.
pub fn add_account(items: &[BankAccount], mut account: BankAccount) -> Vec<BankAccount> {
    account.id = next_id(items);
    let prefer = account.is_default.then_some(account.id);

    let mut next = items.to_vec();
    next.push(account);
    normalize_default(&mut next, prefer);
    next
}

/// Replace the account matching `id`, preserving the stored id.
pub fn update_account(
    items: &[BankAccount],
    id: RecordId,
    mut account: BankAccount,
) -> Result<Vec<BankAccount>> {
    let index = position(items, id)?;
    account.id = id;
    let prefer = account.is_default.then_some(id);

    let mut next = items.to_vec();
    next[index] = account;
    normalize_default(&mut next, prefer);
    Ok(next)
}

/// Remove the account matching `id`.
///
/// If the removed account was the default, another remaining account is
/// promoted (arbitrarily, the first).
pub fn remove_account(items: &[BankAccount], id: RecordId) -> Result<Vec<BankAccount>> {
    position(items, id)?;

    let mut next: Vec<BankAccount> = items
        .iter()
        .filter(|account| account.id != id)
        .cloned()
        .collect();
    normalize_default(&mut next, None);
    Ok(next)
}

/// Make the account matching `id` the default.
pub fn set_default(items: &[BankAccount], id: RecordId) -> Result<Vec<BankAccount>> {
    position(items, id)?;

    let mut next = items.to_vec();
    normalize_default(&mut next, Some(id));
    Ok(next)
}

/// Move the balance of the account matching `id` by `delta`.
pub fn adjust_balance(
    items: &[BankAccount],
    id: RecordId,
    delta: Decimal,
) -> Result<Vec<BankAccount>> {
    let index = position(items, id)?;

    let mut next = items.to_vec();
    next[index].balance += delta;
    Ok(next)
}

/// Append a transaction to the balance log and move the running balance by
/// its signed amount. The transaction id follows the collection id rule.
pub fn apply_transaction(
    balance: &AccountBalance,
    mut transaction: BalanceTransaction,
) -> AccountBalance {
    transaction.set_id(next_id(&balance.transactions));

    let mut next = balance.clone();
    next.current_balance += transaction.amount;
    next.transactions.push(transaction);
    next
}

/// Re-establish the single-default invariant.
///
/// `prefer` names the account that should hold the flag; with no preference
/// the current holder keeps it, and with no holder the first account takes it.
fn normalize_default(items: &mut [BankAccount], prefer: Option<RecordId>) {
    if items.is_empty() {
        return;
    }

    let chosen = prefer
        .filter(|id| items.iter().any(|account| account.id == *id))
        .or_else(|| {
            items
                .iter()
                .find(|account| account.is_default)
                .map(|account| account.id)
        })
        .unwrap_or_else(|| items[0].id);

    for account in items.iter_mut() {
        account.is_default = account.id == chosen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn account(id: RecordId, name: &str, is_default: bool) -> BankAccount {
        BankAccount {
            id,
            name: name.into(),
            bank: "acme".into(),
            balance: dec!(100),
            color: None,
            is_default,
        }
    }

    fn default_count(items: &[BankAccount]) -> usize {
        items.iter().filter(|a| a.is_default).count()
    }

    #[test]
    fn first_account_becomes_default() {
        let next = add_account(&[], account(0, "checking", false));
        assert_eq!(next.len(), 1);
        assert!(next[0].is_default);
    }

    #[test]
    fn adding_non_default_keeps_existing_default() {
        let items = add_account(&[], account(0, "checking", false));
        let next = add_account(&items, account(0, "savings", false));

        assert!(next[0].is_default);
        assert!(!next[1].is_default);
    }

    #[test]
    fn adding_default_takes_over_flag() {
        let items = add_account(&[], account(0, "checking", false));
        let next = add_account(&items, account(0, "savings", true));

        assert!(!next[0].is_default);
        assert!(next[1].is_default);
        assert_eq!(default_count(&next), 1);
    }

    #[test]
    fn removing_default_promotes_remaining() {
        let items = add_account(&[], account(0, "checking", false));
        let items = add_account(&items, account(0, "savings", false));
        assert!(items[0].is_default);

        let next = remove_account(&items, items[0].id).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(default_count(&next), 1);
    }

    #[test]
    fn removing_last_account_leaves_empty_collection() {
        let items = add_account(&[], account(0, "checking", false));
        let next = remove_account(&items, 1).unwrap();
        assert!(next.is_empty());
    }

    #[test]
    fn clearing_default_flag_via_update_is_repaired() {
        let items = add_account(&[], account(0, "checking", false));
        let next = update_account(&items, 1, account(1, "checking", false)).unwrap();

        // The invariant wins over the caller's flag.
        assert_eq!(default_count(&next), 1);
    }

    #[test]
    fn set_default_moves_flag() {
        let items = add_account(&[], account(0, "checking", false));
        let items = add_account(&items, account(0, "savings", false));

        let next = set_default(&items, 2).unwrap();
        assert!(!next[0].is_default);
        assert!(next[1].is_default);
    }

    #[test]
    fn set_default_missing_account() {
        let items = add_account(&[], account(0, "checking", false));
        assert_eq!(set_default(&items, 9), Err(Error::RecordNotFound(9)));
    }

    #[test]
    fn adjust_balance_moves_only_target() {
        let items = add_account(&[], account(0, "checking", false));
        let items = add_account(&items, account(0, "savings", false));

        let next = adjust_balance(&items, 2, dec!(-25.50)).unwrap();
        assert_eq!(next[0].balance, dec!(100));
        assert_eq!(next[1].balance, dec!(74.50));
    }

    #[test]
    fn apply_transaction_appends_and_moves_balance() {
        let balance = AccountBalance::default();
        let tx = BalanceTransaction {
            id: 0,
            description: "salary".into(),
            amount: dec!(2500),
            date: Utc::now(),
        };

        let next = apply_transaction(&balance, tx);
        assert_eq!(next.current_balance, dec!(2500));
        assert_eq!(next.transactions.len(), 1);
        assert_eq!(next.transactions[0].id, 1);

        let tx2 = BalanceTransaction {
            id: 0,
            description: "rent".into(),
            amount: dec!(-900),
            date: Utc::now(),
        };
        let next = apply_transaction(&next, tx2);
        assert_eq!(next.current_balance, dec!(1600));
        assert_eq!(next.transactions[1].id, 2);
    }
}
