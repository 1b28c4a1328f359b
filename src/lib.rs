// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Fairsplit
//!
//! A household expense-splitting ledger. Credit-card invoices are itemized by
//! an external extraction service; this library computes the fair-share
//! settlement between two people across monthly processes, with unpaid
//! balances carried over into the next cycle.
//!
//! ## Core Components
//!
//! - [`Ledger`]: single owner of the process collection, carry-over linker
//! - [`Process`]: one billing cycle with its lifecycle state machine
//! - [`Settlement`]: pure balance calculator
//! - [`ProcessStore`]: persistence façade (local file or remote blob)
//! - [`DocumentExtractor`]: external extraction collaborator
//!
//! ## Example
//!
//! ```
//! use fairsplit::{Ledger, Person};
//! use rust_decimal_macros::dec;
//!
//! let mut ledger = Ledger::new();
//! let (october, offer) = ledger.create_process("October 2025");
//! assert!(offer.is_none());
//!
//! // ... transactions are added, then the month closes with an unpaid balance
//! # use fairsplit::{Assignment, Transaction, TransactionId, TransactionSource};
//! # ledger.add_manual_transaction(&october, Transaction {
//! #     id: TransactionId::new(),
//! #     date: chrono::Utc::now().date_naive(),
//! #     description: "Dinner".into(),
//! #     amount: dec!(300),
//! #     assignment: Assignment::Split,
//! #     payer: Person::PersonB,
//! #     source: TransactionSource::Manual,
//! #     source_invoice_id: None,
//! #     category: None,
//! # }).unwrap();
//! ledger.close_with_carry_over(&october, Person::PersonA, dec!(150)).unwrap();
//!
//! // The debt is offered when the next month is created.
//! let (november, offer) = ledger.create_process("November 2025");
//! let debt = offer.unwrap();
//! ledger.accept_pending_debt(&debt.process_id, &november).unwrap();
//! ```
//!
//! ## Concurrency
//!
//! Mutation is single-threaded and event-driven: each operation is one
//! synchronous update on the [`Ledger`]. Persistence is last-writer-wins with
//! no merge, sequenced explicitly by the caller after each mutation.

pub mod balance;
mod base;
pub mod error;
mod extract;
mod ledger;
mod person;
mod process;
pub mod report;
mod store;
mod transaction;

pub use balance::{PartyAmounts, Settlement, SETTLEMENT_TOLERANCE};
pub use base::{InvoiceId, ProcessId, TransactionId};
pub use error::{ExtractionError, LedgerError, StoreError};
pub use extract::{DocumentExtractor, ExtractedDocument, ExtractedTransaction};
pub use ledger::{Ledger, PendingDebt};
pub use person::{People, Person, PersonProfile};
pub use process::{ClosingBalance, Invoice, Process, ProcessStatus, ProofOfPayment};
pub use report::write_report;
pub use store::{FileStore, MemoryStore, ProcessStore};
pub use transaction::{Assignment, Transaction, TransactionSource, DEFAULT_CATEGORY};
