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

//! The process ledger.
//!
//! [`Ledger`] is the single owner of the in-memory process collection. All
//! mutation goes through it, one synchronous update at a time; it performs no
//! I/O of its own. Callers persist the collection afterwards as an explicit,
//! separate step:
//!
//! ```no_run
//! # use fairsplit::{Ledger, MemoryStore, ProcessStore};
//! let mut ledger = Ledger::new();
//! let store = MemoryStore::new();
//! let (_id, _offer) = ledger.create_process("October 2025");
//! store.save(ledger.processes())?;
//! # Ok::<(), fairsplit::StoreError>(())
//! ```
//!
//! # Invariants
//!
//! - A closed process with a closing balance is linked to at most one future
//!   process, and the link only exists together with the matching imported
//!   carry-over transaction.
//! - Deleting a process clears any link pointing at it in the same update,
//!   reopening that debt as pending.
//! - At most one pending debt is offered per process creation: the first one
//!   found in collection order (newest process first).

use crate::balance::Settlement;
use crate::base::{InvoiceId, ProcessId, TransactionId};
use crate::error::LedgerError;
use crate::extract::ExtractedDocument;
use crate::person::Person;
use crate::process::{Invoice, Process, ProofOfPayment};
use crate::transaction::{Assignment, Transaction, TransactionSource, DEFAULT_CATEGORY};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::de::IgnoredAny;

/// An unresolved debt from a closed process, offered for import when a new
/// process is created. Accepting or declining is the caller's decision; the
/// ledger never applies it automatically.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDebt {
    /// The closed process the debt originates from.
    pub process_id: ProcessId,
    pub process_name: String,
    pub debtor: Person,
    pub amount: Decimal,
}

/// Single-owner repository of the process collection.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Processes in display order, newest first.
    processes: Vec<Process>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
        }
    }

    /// Rebuilds a ledger from a previously persisted collection.
    pub fn from_processes(processes: Vec<Process>) -> Self {
        Self { processes }
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn get(&self, id: &ProcessId) -> Option<&Process> {
        self.processes.iter().find(|p| &p.id == id)
    }

    fn get_mut(&mut self, id: &ProcessId) -> Result<&mut Process, LedgerError> {
        self.processes
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or(LedgerError::ProcessNotFound)
    }

    /// Finds a process by id, or by exact name when no id matches.
    pub fn resolve(&self, key: &str) -> Option<&Process> {
        self.processes
            .iter()
            .find(|p| p.id.0 == key)
            .or_else(|| self.processes.iter().find(|p| p.name == key))
    }

    /// First unresolved pending debt in collection order, if any.
    ///
    /// Even when several closed processes carry unlinked balances, only this
    /// one is surfaced; the rest stay pending until it is resolved.
    pub fn pending_debt(&self) -> Option<PendingDebt> {
        self.processes
            .iter()
            .find(|p| p.is_pending_debt())
            .map(|p| {
                let balance = p.closing_balance.as_ref().expect("pending debt has balance");
                PendingDebt {
                    process_id: p.id.clone(),
                    process_name: p.name.clone(),
                    debtor: balance.debtor,
                    amount: balance.amount,
                }
            })
    }

    /// Creates a new open process at the front of the collection and returns
    /// its id together with the pending-debt offer, when one exists.
    ///
    /// The process is inserted unconditionally; the offer is informational
    /// and must be accepted via [`Ledger::accept_pending_debt`] to have any
    /// effect. Declining requires no call at all.
    pub fn create_process(&mut self, name: &str) -> (ProcessId, Option<PendingDebt>) {
        let offer = self.pending_debt();
        let process = Process::new(name);
        let id = process.id.clone();
        self.processes.insert(0, process);
        (id, offer)
    }

    /// Imports a pending debt into a target process.
    ///
    /// Synthesizes one carry-over transaction in the target (payer is the
    /// creditor, the cost assigned entirely to the debtor) and links the
    /// source to the target. Both processes are validated up front so the two
    /// mutations land as a single commit or not at all.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ProcessNotFound`] - source or target no longer exists.
    /// - [`LedgerError::NotPendingDebt`] - source has no closing balance.
    /// - [`LedgerError::DebtAlreadyLinked`] - source was already absorbed.
    /// - [`LedgerError::InvalidStateTransition`] - target is not open.
    pub fn accept_pending_debt(
        &mut self,
        source_id: &ProcessId,
        target_id: &ProcessId,
    ) -> Result<TransactionId, LedgerError> {
        let source = self.get(source_id).ok_or(LedgerError::ProcessNotFound)?;
        if source.closing_balance.is_none() {
            return Err(LedgerError::NotPendingDebt);
        }
        if source.carried_over_to_process_id.is_some() {
            return Err(LedgerError::DebtAlreadyLinked);
        }
        let balance = source.closing_balance.clone().expect("checked above");
        let description = format!("Previous balance ({})", source.name);

        let target = self.get(target_id).ok_or(LedgerError::ProcessNotFound)?;
        if !target.is_open() {
            return Err(LedgerError::InvalidStateTransition);
        }

        // All preconditions hold; from here on nothing can fail.
        let transaction = Transaction {
            id: TransactionId::new(),
            date: Utc::now().date_naive(),
            description,
            amount: balance.amount,
            assignment: Assignment::from(balance.debtor),
            payer: balance.debtor.opposite(),
            source: TransactionSource::CarryOver,
            source_invoice_id: None,
            category: Some(DEFAULT_CATEGORY.to_owned()),
        };
        let transaction_id = transaction.id.clone();

        let target = self.get_mut(target_id)?;
        target.transactions.insert(0, transaction);
        let source = self.get_mut(source_id)?;
        source.carried_over_to_process_id = Some(target_id.clone());

        Ok(transaction_id)
    }

    /// Deletes a process and repairs carry-over links in the same update.
    ///
    /// Any process whose `carried_over_to_process_id` pointed at the deleted
    /// one has the link cleared, reopening its debt as pending. The imported
    /// carry-over transaction disappears with the deleted process; the
    /// creditor's claim does not.
    pub fn delete_process(&mut self, id: &ProcessId) -> Result<(), LedgerError> {
        let position = self
            .processes
            .iter()
            .position(|p| &p.id == id)
            .ok_or(LedgerError::ProcessNotFound)?;
        self.processes.remove(position);

        for process in &mut self.processes {
            if process.carried_over_to_process_id.as_ref() == Some(id) {
                process.carried_over_to_process_id = None;
            }
        }
        Ok(())
    }

    /// Records an extracted invoice in an open process.
    ///
    /// The ledger assigns ids, the payer, a `Split` assignment, and the `Pdf`
    /// source to every extracted record; none of these are trusted from the
    /// extraction service. When the service detected no explicit total, the
    /// invoice total is the sum of the transaction amounts.
    ///
    /// Extraction runs before this call; if the target process was deleted
    /// while the upload was in flight this returns
    /// [`LedgerError::ProcessNotFound`] and nothing is applied.
    pub fn add_extracted_invoice(
        &mut self,
        process_id: &ProcessId,
        document: ExtractedDocument,
        payer: Person,
        payer_name: &str,
        original_name: &str,
        file_data: String,
    ) -> Result<InvoiceId, LedgerError> {
        let uploaded = Utc::now();
        let total = document
            .detected_total
            .unwrap_or_else(|| document.transactions.iter().map(|t| t.amount).sum());

        let invoice = Invoice {
            id: InvoiceId::new(),
            file_name: Invoice::generated_file_name(original_name, payer_name, uploaded),
            original_name: original_name.to_owned(),
            payer,
            upload_date: uploaded,
            total_amount: total,
            file_data,
        };
        let invoice_id = invoice.id.clone();

        let transactions: Vec<Transaction> = document
            .transactions
            .into_iter()
            .map(|record| Transaction {
                id: TransactionId::new(),
                date: record.date,
                description: record.description,
                amount: record.amount,
                assignment: Assignment::Split,
                payer,
                source: TransactionSource::Pdf,
                source_invoice_id: Some(invoice_id.clone()),
                category: record.category,
            })
            .collect();

        let process = self.get_mut(process_id)?;
        process.add_invoice(invoice, transactions)?;
        Ok(invoice_id)
    }

    /// Adds a manually entered transaction to an open process.
    pub fn add_manual_transaction(
        &mut self,
        process_id: &ProcessId,
        transaction: Transaction,
    ) -> Result<(), LedgerError> {
        self.get_mut(process_id)?.add_transaction(transaction)
    }

    pub fn update_assignment(
        &mut self,
        process_id: &ProcessId,
        transaction_id: &TransactionId,
        assignment: Assignment,
    ) -> Result<(), LedgerError> {
        self.get_mut(process_id)?
            .update_assignment(transaction_id, assignment)
    }

    pub fn delete_transaction(
        &mut self,
        process_id: &ProcessId,
        transaction_id: &TransactionId,
    ) -> Result<(), LedgerError> {
        self.get_mut(process_id)?.delete_transaction(transaction_id)
    }

    pub fn close_with_proof(
        &mut self,
        process_id: &ProcessId,
        proof: ProofOfPayment,
    ) -> Result<(), LedgerError> {
        self.get_mut(process_id)?.close_with_proof(proof)
    }

    pub fn close_with_carry_over(
        &mut self,
        process_id: &ProcessId,
        debtor: Person,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.get_mut(process_id)?.close_with_carry_over(debtor, amount)
    }

    /// Settlement for one process, recomputed from its current transactions.
    pub fn settlement(&self, process_id: &ProcessId) -> Result<Settlement, LedgerError> {
        self.get(process_id)
            .map(Process::settlement)
            .ok_or(LedgerError::ProcessNotFound)
    }

    /// Serializes the whole collection as a pretty JSON array.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.processes)
    }

    /// Replaces the whole collection with a parsed backup file.
    ///
    /// The payload must be a JSON array of processes; anything else is
    /// rejected with [`LedgerError::InvalidImportPayload`] and the current
    /// collection is left untouched.
    pub fn import_json(&mut self, payload: &str) -> Result<usize, LedgerError> {
        // Cheap shape check first so a scalar or object payload gets the
        // dedicated error rather than a field-level parse failure.
        if serde_json::from_str::<Vec<IgnoredAny>>(payload).is_err() {
            return Err(LedgerError::InvalidImportPayload);
        }
        let processes: Vec<Process> =
            serde_json::from_str(payload).map_err(|_| LedgerError::InvalidImportPayload)?;
        let count = processes.len();
        self.processes = processes;
        Ok(count)
    }

    /// Drops the entire collection.
    pub fn reset(&mut self) {
        self.processes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn manual_tx(amount: Decimal, payer: Person, assignment: Assignment) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            date: Utc::now().date_naive(),
            description: "manual".into(),
            amount,
            assignment,
            payer,
            source: TransactionSource::Manual,
            source_invoice_id: None,
            category: None,
        }
    }

    /// Closes a process with a real unsettled balance of 150 owed by `debtor`.
    fn close_with_debt(ledger: &mut Ledger, id: &ProcessId, debtor: Person) {
        ledger
            .add_manual_transaction(
                id,
                manual_tx(dec!(300), debtor.opposite(), Assignment::Split),
            )
            .unwrap();
        ledger.close_with_carry_over(id, debtor, dec!(150)).unwrap();
    }

    #[test]
    fn creation_without_debts_offers_nothing() {
        let mut ledger = Ledger::new();
        let (_, offer) = ledger.create_process("Month1");
        assert_eq!(offer, None);
    }

    #[test]
    fn newest_process_sits_first() {
        let mut ledger = Ledger::new();
        ledger.create_process("Month1");
        ledger.create_process("Month2");
        assert_eq!(ledger.processes()[0].name, "Month2");
        assert_eq!(ledger.processes()[1].name, "Month1");
    }

    #[test]
    fn pending_debt_is_offered_on_creation() {
        let mut ledger = Ledger::new();
        let (month1, _) = ledger.create_process("Month1");
        close_with_debt(&mut ledger, &month1, Person::PersonA);

        let (_, offer) = ledger.create_process("Month2");
        let offer = offer.unwrap();
        assert_eq!(offer.process_id, month1);
        assert_eq!(offer.debtor, Person::PersonA);
        assert_eq!(offer.amount, dec!(150));
    }

    #[test]
    fn declined_debt_is_offered_again() {
        let mut ledger = Ledger::new();
        let (month1, _) = ledger.create_process("Month1");
        close_with_debt(&mut ledger, &month1, Person::PersonA);

        // Decline is the absence of an accept call.
        let (_, first_offer) = ledger.create_process("Month2");
        assert!(first_offer.is_some());
        let source = ledger.get(&month1).unwrap();
        assert!(source.closing_balance.is_some());
        assert_eq!(source.carried_over_to_process_id, None);

        let (_, second_offer) = ledger.create_process("Month3");
        assert_eq!(second_offer.unwrap().process_id, month1);
    }

    #[test]
    fn only_first_pending_debt_is_offered() {
        let mut ledger = Ledger::new();
        let (month1, _) = ledger.create_process("Month1");
        close_with_debt(&mut ledger, &month1, Person::PersonA);
        let (month2, _) = ledger.create_process("Month2");
        close_with_debt(&mut ledger, &month2, Person::PersonB);

        // Both closed with unlinked balances; exactly one offer surfaces.
        // Collection order is newest first, so Month2 wins.
        let (_, offer) = ledger.create_process("Month3");
        assert_eq!(offer.unwrap().process_id, month2);
    }

    #[test]
    fn accept_links_and_synthesizes_in_one_commit() {
        let mut ledger = Ledger::new();
        let (month1, _) = ledger.create_process("Month1");
        close_with_debt(&mut ledger, &month1, Person::PersonA);
        let (month2, offer) = ledger.create_process("Month2");
        assert!(offer.is_some());

        ledger.accept_pending_debt(&month1, &month2).unwrap();

        let source = ledger.get(&month1).unwrap();
        assert_eq!(source.carried_over_to_process_id, Some(month2.clone()));

        let target = ledger.get(&month2).unwrap();
        let carried: Vec<_> = target
            .transactions
            .iter()
            .filter(|t| t.is_carry_over())
            .collect();
        assert_eq!(carried.len(), 1);
        assert_eq!(carried[0].amount, dec!(150));
        assert_eq!(carried[0].payer, Person::PersonB);
        assert_eq!(carried[0].assignment, Assignment::PersonA);
        assert!(carried[0].description.contains("Month1"));

        // The absorbed debt is no longer offered.
        let (_, offer) = ledger.create_process("Month3");
        assert_eq!(offer, None);
    }

    #[test]
    fn accept_twice_is_rejected() {
        let mut ledger = Ledger::new();
        let (month1, _) = ledger.create_process("Month1");
        close_with_debt(&mut ledger, &month1, Person::PersonA);
        let (month2, _) = ledger.create_process("Month2");
        ledger.accept_pending_debt(&month1, &month2).unwrap();

        let (month3, _) = ledger.create_process("Month3");
        assert_eq!(
            ledger.accept_pending_debt(&month1, &month3),
            Err(LedgerError::DebtAlreadyLinked)
        );
        // No second transaction appeared anywhere.
        let target = ledger.get(&month3).unwrap();
        assert!(target.transactions.is_empty());
    }

    #[test]
    fn accept_into_missing_target_mutates_nothing() {
        let mut ledger = Ledger::new();
        let (month1, _) = ledger.create_process("Month1");
        close_with_debt(&mut ledger, &month1, Person::PersonA);

        let gone = ProcessId::from("deleted-while-in-flight");
        assert_eq!(
            ledger.accept_pending_debt(&month1, &gone),
            Err(LedgerError::ProcessNotFound)
        );
        assert_eq!(
            ledger.get(&month1).unwrap().carried_over_to_process_id,
            None
        );
    }

    #[test]
    fn deleting_absorbing_process_reopens_debt() {
        let mut ledger = Ledger::new();
        let (month1, _) = ledger.create_process("Month1");
        close_with_debt(&mut ledger, &month1, Person::PersonA);
        let (month2, _) = ledger.create_process("Month2");
        ledger.accept_pending_debt(&month1, &month2).unwrap();

        ledger.delete_process(&month2).unwrap();

        let source = ledger.get(&month1).unwrap();
        assert_eq!(source.carried_over_to_process_id, None);
        assert!(source.is_pending_debt());

        // The claim survives and is offered to the next process.
        let (_, offer) = ledger.create_process("Month3");
        assert_eq!(offer.unwrap().process_id, month1);
    }

    #[test]
    fn import_rejects_non_array_payload() {
        let mut ledger = Ledger::new();
        ledger.create_process("Keep me");

        assert_eq!(
            ledger.import_json("{\"not\": \"an array\"}"),
            Err(LedgerError::InvalidImportPayload)
        );
        assert_eq!(
            ledger.import_json("plainly broken"),
            Err(LedgerError::InvalidImportPayload)
        );
        assert_eq!(ledger.processes().len(), 1);
    }

    #[test]
    fn export_import_round_trip() {
        let mut ledger = Ledger::new();
        let (month1, _) = ledger.create_process("Month1");
        close_with_debt(&mut ledger, &month1, Person::PersonA);

        let json = ledger.export_json().unwrap();
        let mut restored = Ledger::new();
        assert_eq!(restored.import_json(&json), Ok(1));
        assert_eq!(restored.processes(), ledger.processes());
    }
}
