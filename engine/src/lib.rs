//! # Tally Engine
//!
//! The pure core of the Tally personal-finance ledger.
//!
//! This crate holds the entity model and the mutators that compute the next
//! value of a collection from a command. It is deliberately free of I/O:
//! no network, no storage, no clocks beyond values passed in. The async
//! machinery that persists and synchronizes this state lives in `tally-sync`.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or platform
//! - **Deterministic**: the same collection and command always produce the
//!   same next collection
//! - **Testable**: pure logic, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Records and collections
//!
//! The ledger holds seven collections: expenses, debts, fixed bills, savings
//! goals, bank accounts, financial entries, and the account balance. Each
//! list collection is an ordered sequence of records with a `u32` id unique
//! within that collection only. Ids are minted as `max(existing) + 1` from
//! the locally visible collection - two offline devices can mint the same id
//! and the later remote write wins silently; see [`mutation::next_id`].
//!
//! ### The document
//!
//! [`LedgerDocument`] is the wire form synchronized with the remote store:
//! one document per identity, every field optional so the store's
//! document-level merge semantics can be expressed. [`Ledger`] is the
//! concrete in-memory form.
//!
//! ### Mutators
//!
//! Changes are expressed as pure functions in [`mutation`]:
//! generic [`mutation::add`] / [`mutation::update`] / [`mutation::remove`]
//! plus collection-specific operations such as
//! [`mutation::accounts::set_default`] and
//! [`mutation::entries::toggle_installment_paid`]. Cross-collection effects
//! (a paid entry moving its linked account's balance) are a second mutator
//! invocation by the caller, never hidden inside the first.
//!
//! ## Quick Start
//!
//! ```rust
//! use tally_engine::{mutation, BankAccount, Ledger};
//! use rust_decimal::Decimal;
//!
//! let mut ledger = Ledger::new("Alice", "alice@example.com");
//!
//! let account = BankAccount {
//!     id: 0, // assigned by the mutator
//!     name: "checking".into(),
//!     bank: "acme".into(),
//!     balance: Decimal::ZERO,
//!     color: None,
//!     is_default: false,
//! };
//!
//! ledger.bank_accounts = mutation::accounts::add_account(&ledger.bank_accounts, account);
//! assert_eq!(ledger.bank_accounts[0].id, 1);
//! assert!(ledger.bank_accounts[0].is_default); // first account is the default
//! ```

pub mod document;
pub mod error;
pub mod model;
pub mod mutation;

// Re-export main types at crate root
pub use document::{CollectionKind, CollectionValue, Ledger, LedgerDocument};
pub use error::Error;
pub use model::{
    AccountBalance, BalanceTransaction, BankAccount, Debt, EntryKind, Expense, FinancialEntry,
    FixedBill, SavingsGoal,
};
pub use mutation::{LedgerRecord, Payable};

/// Identifier of a record, unique within one collection only.
pub type RecordId = u32;
