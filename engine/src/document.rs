//! The ledger document - the unit of synchronization.
//!
//! [`LedgerDocument`] is the wire form: one document per identity, every
//! field optional because the remote store merges at the document level and a
//! snapshot may carry only a subset of fields. [`Ledger`] is the concrete
//! in-memory form with every collection present.
//!
//! [`CollectionKind`] and [`CollectionValue`] give each collection a
//! statically known shape instead of string-keyed dynamic dispatch.

use crate::model::{
    AccountBalance, BankAccount, Debt, Expense, FinancialEntry, FixedBill, SavingsGoal,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the synchronized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionKind {
    Expenses,
    Debts,
    FixedBills,
    SavingsGoals,
    BankAccounts,
    FinancialEntries,
    AccountBalance,
}

impl CollectionKind {
    /// All collection kinds, in document field order.
    pub const ALL: [CollectionKind; 7] = [
        CollectionKind::Expenses,
        CollectionKind::Debts,
        CollectionKind::FixedBills,
        CollectionKind::SavingsGoals,
        CollectionKind::BankAccounts,
        CollectionKind::FinancialEntries,
        CollectionKind::AccountBalance,
    ];

    /// The document field name for this collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Expenses => "expenses",
            CollectionKind::Debts => "debts",
            CollectionKind::FixedBills => "fixedBills",
            CollectionKind::SavingsGoals => "savingsGoals",
            CollectionKind::BankAccounts => "bankAccounts",
            CollectionKind::FinancialEntries => "financialEntries",
            CollectionKind::AccountBalance => "accountBalance",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value for one collection.
///
/// Serializes as the bare inner value; deserialization goes through
/// [`CollectionValue::from_json`] because the JSON form alone cannot
/// distinguish, say, an empty expenses array from an empty debts array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CollectionValue {
    Expenses(Vec<Expense>),
    Debts(Vec<Debt>),
    FixedBills(Vec<FixedBill>),
    SavingsGoals(Vec<SavingsGoal>),
    BankAccounts(Vec<BankAccount>),
    FinancialEntries(Vec<FinancialEntry>),
    AccountBalance(AccountBalance),
}

impl CollectionValue {
    /// The collection this value belongs to.
    pub fn kind(&self) -> CollectionKind {
        match self {
            CollectionValue::Expenses(_) => CollectionKind::Expenses,
            CollectionValue::Debts(_) => CollectionKind::Debts,
            CollectionValue::FixedBills(_) => CollectionKind::FixedBills,
            CollectionValue::SavingsGoals(_) => CollectionKind::SavingsGoals,
            CollectionValue::BankAccounts(_) => CollectionKind::BankAccounts,
            CollectionValue::FinancialEntries(_) => CollectionKind::FinancialEntries,
            CollectionValue::AccountBalance(_) => CollectionKind::AccountBalance,
        }
    }

    /// Serialize the value for the local cache mirror.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Deserialize a cached value as the given collection.
    pub fn from_json(
        kind: CollectionKind,
        value: serde_json::Value,
    ) -> serde_json::Result<CollectionValue> {
        Ok(match kind {
            CollectionKind::Expenses => CollectionValue::Expenses(serde_json::from_value(value)?),
            CollectionKind::Debts => CollectionValue::Debts(serde_json::from_value(value)?),
            CollectionKind::FixedBills => {
                CollectionValue::FixedBills(serde_json::from_value(value)?)
            }
            CollectionKind::SavingsGoals => {
                CollectionValue::SavingsGoals(serde_json::from_value(value)?)
            }
            CollectionKind::BankAccounts => {
                CollectionValue::BankAccounts(serde_json::from_value(value)?)
            }
            CollectionKind::FinancialEntries => {
                CollectionValue::FinancialEntries(serde_json::from_value(value)?)
            }
            CollectionKind::AccountBalance => {
                CollectionValue::AccountBalance(serde_json::from_value(value)?)
            }
        })
    }
}

/// The wire form of the per-identity document.
///
/// Every field is optional: the remote store merges at the document level and
/// replaces at the field level, so absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expenses: Option<Vec<Expense>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debts: Option<Vec<Debt>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_bills: Option<Vec<FixedBill>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_goals: Option<Vec<SavingsGoal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_accounts: Option<Vec<BankAccount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_entries: Option<Vec<FinancialEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_balance: Option<AccountBalance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_attempt: Option<DateTime<Utc>>,
}

impl LedgerDocument {
    /// The default document written at first bootstrap: every collection
    /// present and empty, balance zeroed.
    pub fn default_for(name: &str, email: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            expenses: Some(Vec::new()),
            debts: Some(Vec::new()),
            fixed_bills: Some(Vec::new()),
            savings_goals: Some(Vec::new()),
            bank_accounts: Some(Vec::new()),
            financial_entries: Some(Vec::new()),
            account_balance: Some(AccountBalance::default()),
            last_updated: None,
            last_sync_attempt: None,
        }
    }

    /// Field-level merge: every field present in `other` replaces the
    /// corresponding field here. Absent fields are left untouched.
    pub fn merge_from(&mut self, other: &LedgerDocument) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if let Some(value) = src {
                *dst = Some(value.clone());
            }
        }

        take(&mut self.name, &other.name);
        take(&mut self.email, &other.email);
        take(&mut self.expenses, &other.expenses);
        take(&mut self.debts, &other.debts);
        take(&mut self.fixed_bills, &other.fixed_bills);
        take(&mut self.savings_goals, &other.savings_goals);
        take(&mut self.bank_accounts, &other.bank_accounts);
        take(&mut self.financial_entries, &other.financial_entries);
        take(&mut self.account_balance, &other.account_balance);
        take(&mut self.last_updated, &other.last_updated);
        take(&mut self.last_sync_attempt, &other.last_sync_attempt);
    }

    /// Set one collection field from a typed value.
    pub fn set_collection(&mut self, value: CollectionValue) {
        match value {
            CollectionValue::Expenses(items) => self.expenses = Some(items),
            CollectionValue::Debts(items) => self.debts = Some(items),
            CollectionValue::FixedBills(items) => self.fixed_bills = Some(items),
            CollectionValue::SavingsGoals(items) => self.savings_goals = Some(items),
            CollectionValue::BankAccounts(items) => self.bank_accounts = Some(items),
            CollectionValue::FinancialEntries(items) => self.financial_entries = Some(items),
            CollectionValue::AccountBalance(balance) => self.account_balance = Some(balance),
        }
    }

    /// The typed value of one collection field, if present.
    pub fn collection(&self, kind: CollectionKind) -> Option<CollectionValue> {
        match kind {
            CollectionKind::Expenses => self.expenses.clone().map(CollectionValue::Expenses),
            CollectionKind::Debts => self.debts.clone().map(CollectionValue::Debts),
            CollectionKind::FixedBills => self.fixed_bills.clone().map(CollectionValue::FixedBills),
            CollectionKind::SavingsGoals => {
                self.savings_goals.clone().map(CollectionValue::SavingsGoals)
            }
            CollectionKind::BankAccounts => {
                self.bank_accounts.clone().map(CollectionValue::BankAccounts)
            }
            CollectionKind::FinancialEntries => self
                .financial_entries
                .clone()
                .map(CollectionValue::FinancialEntries),
            CollectionKind::AccountBalance => self
                .account_balance
                .clone()
                .map(CollectionValue::AccountBalance),
        }
    }
}

/// The concrete in-memory ledger: every collection present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ledger {
    pub name: String,
    pub email: String,
    pub expenses: Vec<Expense>,
    pub debts: Vec<Debt>,
    pub fixed_bills: Vec<FixedBill>,
    pub savings_goals: Vec<SavingsGoal>,
    pub bank_accounts: Vec<BankAccount>,
    pub financial_entries: Vec<FinancialEntry>,
    pub account_balance: AccountBalance,
}

impl Ledger {
    /// Create an empty ledger for an identity.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Clone out the current value of one collection.
    pub fn collection(&self, kind: CollectionKind) -> CollectionValue {
        match kind {
            CollectionKind::Expenses => CollectionValue::Expenses(self.expenses.clone()),
            CollectionKind::Debts => CollectionValue::Debts(self.debts.clone()),
            CollectionKind::FixedBills => CollectionValue::FixedBills(self.fixed_bills.clone()),
            CollectionKind::SavingsGoals => {
                CollectionValue::SavingsGoals(self.savings_goals.clone())
            }
            CollectionKind::BankAccounts => {
                CollectionValue::BankAccounts(self.bank_accounts.clone())
            }
            CollectionKind::FinancialEntries => {
                CollectionValue::FinancialEntries(self.financial_entries.clone())
            }
            CollectionKind::AccountBalance => {
                CollectionValue::AccountBalance(self.account_balance.clone())
            }
        }
    }

    /// Replace one collection with a new value.
    pub fn set_collection(&mut self, value: CollectionValue) {
        match value {
            CollectionValue::Expenses(items) => self.expenses = items,
            CollectionValue::Debts(items) => self.debts = items,
            CollectionValue::FixedBills(items) => self.fixed_bills = items,
            CollectionValue::SavingsGoals(items) => self.savings_goals = items,
            CollectionValue::BankAccounts(items) => self.bank_accounts = items,
            CollectionValue::FinancialEntries(items) => self.financial_entries = items,
            CollectionValue::AccountBalance(balance) => self.account_balance = balance,
        }
    }

    /// Export the full document form, every collection field populated.
    ///
    /// `last_updated` / `last_sync_attempt` are left unset; the writer stamps
    /// them at flush time.
    pub fn to_document(&self) -> LedgerDocument {
        LedgerDocument {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            expenses: Some(self.expenses.clone()),
            debts: Some(self.debts.clone()),
            fixed_bills: Some(self.fixed_bills.clone()),
            savings_goals: Some(self.savings_goals.clone()),
            bank_accounts: Some(self.bank_accounts.clone()),
            financial_entries: Some(self.financial_entries.clone()),
            account_balance: Some(self.account_balance.clone()),
            last_updated: None,
            last_sync_attempt: None,
        }
    }

    /// Replace every collection field present in `doc`, remote-wins.
    ///
    /// Returns the kinds that were replaced so the caller can mirror them.
    pub fn apply_document(&mut self, doc: &LedgerDocument) -> Vec<CollectionKind> {
        if let Some(name) = &doc.name {
            self.name = name.clone();
        }
        if let Some(email) = &doc.email {
            self.email = email.clone();
        }

        let mut applied = Vec::new();
        for kind in CollectionKind::ALL {
            if let Some(value) = doc.collection(kind) {
                self.set_collection(value);
                applied.push(kind);
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Expense;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_expense(id: u32) -> Expense {
        Expense {
            id,
            description: "coffee".into(),
            amount: dec!(4.5),
            date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            category: None,
            is_paid: false,
        }
    }

    #[test]
    fn kind_names_match_document_fields() {
        assert_eq!(CollectionKind::FixedBills.as_str(), "fixedBills");
        assert_eq!(CollectionKind::AccountBalance.as_str(), "accountBalance");

        let json = serde_json::to_string(&CollectionKind::SavingsGoals).unwrap();
        assert_eq!(json, "\"savingsGoals\"");
    }

    #[test]
    fn default_document_has_empty_collections() {
        let doc = LedgerDocument::default_for("Alice", "alice@example.com");

        assert_eq!(doc.expenses.as_deref(), Some(&[][..]));
        assert_eq!(
            doc.account_balance.as_ref().map(|b| b.current_balance),
            Some(dec!(0))
        );
        assert_eq!(doc.last_updated, None);
    }

    #[test]
    fn document_skips_absent_fields_on_wire() {
        let doc = LedgerDocument {
            expenses: Some(vec![sample_expense(1)]),
            ..LedgerDocument::default()
        };

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("expenses"));
        assert!(!json.contains("debts"));
        assert!(!json.contains("accountBalance"));
    }

    #[test]
    fn merge_replaces_only_present_fields() {
        let mut base = LedgerDocument::default_for("Alice", "alice@example.com");
        base.expenses = Some(vec![sample_expense(1)]);

        let patch = LedgerDocument {
            debts: Some(Vec::new()),
            email: Some("new@example.com".into()),
            ..LedgerDocument::default()
        };

        base.merge_from(&patch);
        assert_eq!(base.email.as_deref(), Some("new@example.com"));
        assert_eq!(base.name.as_deref(), Some("Alice")); // untouched
        assert_eq!(base.expenses.as_ref().map(Vec::len), Some(1)); // untouched
    }

    #[test]
    fn ledger_document_roundtrip() {
        let mut ledger = Ledger::new("Alice", "alice@example.com");
        ledger.expenses = vec![sample_expense(1), sample_expense(2)];

        let doc = ledger.to_document();
        let mut restored = Ledger::default();
        let applied = restored.apply_document(&doc);

        assert_eq!(restored, ledger);
        assert_eq!(applied.len(), CollectionKind::ALL.len());
    }

    #[test]
    fn apply_document_replaces_only_present_collections() {
        let mut ledger = Ledger::new("Alice", "alice@example.com");
        ledger.expenses = vec![sample_expense(1)];
        ledger.debts = Vec::new();

        let doc = LedgerDocument {
            expenses: Some(Vec::new()),
            ..LedgerDocument::default()
        };

        let applied = ledger.apply_document(&doc);
        assert_eq!(applied, vec![CollectionKind::Expenses]);
        assert!(ledger.expenses.is_empty());
        assert_eq!(ledger.name, "Alice");
    }

    #[test]
    fn collection_value_json_roundtrip_is_kind_directed() {
        let value = CollectionValue::Debts(Vec::new());
        let json = value.to_json().unwrap();

        // The bare JSON is just an empty array; the kind disambiguates.
        assert_eq!(json, serde_json::json!([]));

        let restored = CollectionValue::from_json(CollectionKind::Debts, json).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn set_collection_dispatches_by_kind() {
        let mut ledger = Ledger::default();
        ledger.set_collection(CollectionValue::Expenses(vec![sample_expense(7)]));

        match ledger.collection(CollectionKind::Expenses) {
            CollectionValue::Expenses(items) => assert_eq!(items[0].id, 7),
            other => panic!("unexpected collection value: {other:?}"),
        }
    }
}
