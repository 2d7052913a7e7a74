//! Record types for the ledger collections.
//!
//! Amounts are `rust_decimal::Decimal` and serialize as plain JSON numbers,
//! matching the remote document format. Field names are camelCase on the wire.

use crate::RecordId;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A one-off expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Identifier unique within the expenses collection
    pub id: RecordId,
    pub description: String,
    pub amount: Decimal,
    /// Day the expense occurred
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub is_paid: bool,
}

/// An outstanding debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: RecordId,
    pub description: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub is_paid: bool,
}

/// A recurring bill due on a fixed day of the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedBill {
    pub id: RecordId,
    pub description: String,
    pub amount: Decimal,
    /// Day of month the bill is due (1-31)
    pub due_day: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub is_paid: bool,
}

/// A savings goal with accumulated progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: RecordId,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A bank account.
///
/// Invariant: in a non-empty collection exactly one account carries
/// `is_default = true`. The account mutators re-derive the flag on every
/// add/update/remove.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: RecordId,
    pub name: String,
    /// Institution label shown in the UI
    pub bank: String,
    pub balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub is_default: bool,
}

/// Direction of a financial entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

/// A scheduled financial entry, optionally paid in installments.
///
/// When `installments` is set, `paid_installments` is a vector of the same
/// length tracking which installments have been settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialEntry {
    pub id: RecordId,
    pub description: String,
    pub amount: Decimal,
    pub kind: EntryKind,
    pub due_date: NaiveDate,
    pub is_paid: bool,
    /// Bank account credited/debited when the entry's paid status flips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_installment: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_installments: Option<Vec<bool>>,
}

/// A transaction in the running account-balance ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceTransaction {
    pub id: RecordId,
    pub description: String,
    /// Signed amount; credits are positive, debits negative
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

/// The running account balance plus its transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub current_balance: Decimal,
    pub transactions: Vec<BalanceTransaction>,
}

impl Default for AccountBalance {
    fn default() -> Self {
        Self {
            current_balance: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }
}
