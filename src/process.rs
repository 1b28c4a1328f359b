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

//! Billing-cycle processes and their lifecycle.
//!
//! Implemented state machine:
//!
//! ```text
//! Open ──close_with_proof──────► Closed(proof)
//!  │
//!  └────close_with_carry_over──► Closed(pendingBalance) ──accept──► linked
//! ```
//!
//! Both `Closed` variants are terminal: no reopening operation exists. The
//! only mutation permitted on a closed process afterwards is having its
//! carry-over link set by the ledger, or cleared when the linked process is
//! deleted.

use crate::balance::Settlement;
use crate::base::{InvoiceId, ProcessId, TransactionId};
use crate::error::LedgerError;
use crate::person::Person;
use crate::transaction::{Assignment, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single uploaded bill document, owned exclusively by its parent process.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    /// Generated name, e.g. `Statement_MARCO_837492.pdf`.
    pub file_name: String,
    pub original_name: String,
    pub payer: Person,
    pub upload_date: DateTime<Utc>,
    /// Sum of the invoice's transactions; adjusted independently when
    /// transactions are deleted, floored at zero.
    pub total_amount: Decimal,
    /// Raw document payload, base64-encoded.
    pub file_data: String,
}

impl Invoice {
    /// Builds the stored file name from the original upload name.
    ///
    /// The stem is stripped to `[A-Za-z0-9-_]` and suffixed with the payer
    /// name and the trailing digits of the upload timestamp, so two uploads
    /// of the same statement never collide.
    pub fn generated_file_name(original_name: &str, payer_name: &str, uploaded: DateTime<Utc>) -> String {
        let (stem, extension) = match original_name.rsplit_once('.') {
            Some((stem, ext)) if !ext.is_empty() => (stem, ext),
            _ => (original_name, "pdf"),
        };
        let safe_stem: String = stem
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        let millis = uploaded.timestamp_millis().to_string();
        let suffix = &millis[millis.len().saturating_sub(6)..];
        format!("{safe_stem}_{}_{suffix}.{extension}", payer_name.to_uppercase())
    }
}

/// Record of the bank-transfer receipt that closed a process.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOfPayment {
    pub file_name: String,
    pub date: DateTime<Utc>,
    pub file_data: String,
}

/// The unresolved balance a process was closed with.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClosingBalance {
    pub debtor: Person,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ProcessStatus {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "CLOSED")]
    Closed,
}

/// One billing cycle, e.g. a calendar month.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub status: ProcessStatus,
    pub transactions: Vec<Transaction>,
    pub invoices: Vec<Invoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_of_payment: Option<ProofOfPayment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_balance: Option<ClosingBalance>,
    /// Id of the future process that absorbed this process's closing balance.
    /// `None` while the debt is still pending.
    #[serde(default)]
    pub carried_over_to_process_id: Option<ProcessId>,
}

impl Process {
    /// Creates a new open process with no transactions or invoices.
    pub fn new(name: &str) -> Self {
        Self {
            id: ProcessId::new(),
            name: name.to_owned(),
            created_at: Utc::now(),
            closed_at: None,
            status: ProcessStatus::Open,
            transactions: Vec::new(),
            invoices: Vec::new(),
            proof_of_payment: None,
            closing_balance: None,
            carried_over_to_process_id: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ProcessStatus::Open
    }

    /// A closed process whose closing balance was never absorbed by a later
    /// process.
    pub fn is_pending_debt(&self) -> bool {
        self.status == ProcessStatus::Closed
            && self.closing_balance.is_some()
            && self.carried_over_to_process_id.is_none()
    }

    /// Recomputes the settlement from the current transaction list.
    pub fn settlement(&self) -> Settlement {
        Settlement::of(&self.transactions)
    }

    fn require_open(&self) -> Result<(), LedgerError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(LedgerError::InvalidStateTransition)
        }
    }

    /// Prepends a transaction. Newest entries sit at the front, matching the
    /// display order of the process history.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        self.require_open()?;
        self.transactions.insert(0, transaction);
        Ok(())
    }

    /// Appends an invoice together with its extracted transactions.
    pub fn add_invoice(
        &mut self,
        invoice: Invoice,
        transactions: Vec<Transaction>,
    ) -> Result<(), LedgerError> {
        self.require_open()?;
        self.invoices.push(invoice);
        self.transactions.extend(transactions);
        Ok(())
    }

    /// Changes who bears a transaction's cost.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidStateTransition`] - process is closed.
    /// - [`LedgerError::TransactionNotFound`] - unknown transaction id.
    /// - [`LedgerError::CarryOverImmutable`] - the line is an imported debt.
    pub fn update_assignment(
        &mut self,
        transaction_id: &TransactionId,
        assignment: Assignment,
    ) -> Result<(), LedgerError> {
        self.require_open()?;
        let tx = self
            .transactions
            .iter_mut()
            .find(|tx| &tx.id == transaction_id)
            .ok_or(LedgerError::TransactionNotFound)?;
        if tx.is_carry_over() {
            return Err(LedgerError::CarryOverImmutable);
        }
        tx.assignment = assignment;
        Ok(())
    }

    /// Deletes a transaction, reducing its source invoice's total (floored at
    /// zero) when one exists.
    pub fn delete_transaction(&mut self, transaction_id: &TransactionId) -> Result<(), LedgerError> {
        self.require_open()?;
        let position = self
            .transactions
            .iter()
            .position(|tx| &tx.id == transaction_id)
            .ok_or(LedgerError::TransactionNotFound)?;
        if self.transactions[position].is_carry_over() {
            return Err(LedgerError::CarryOverImmutable);
        }

        let tx = self.transactions.remove(position);
        if let Some(invoice_id) = &tx.source_invoice_id
            && let Some(invoice) = self.invoices.iter_mut().find(|inv| &inv.id == invoice_id)
        {
            invoice.total_amount = (invoice.total_amount - tx.amount).max(Decimal::ZERO);
        }
        Ok(())
    }

    /// `Open → Closed(proof)`: the parties settled directly and uploaded the
    /// transfer receipt. No balance fields are touched.
    pub fn close_with_proof(&mut self, proof: ProofOfPayment) -> Result<(), LedgerError> {
        self.require_open()?;
        self.status = ProcessStatus::Closed;
        self.closed_at = Some(Utc::now());
        self.proof_of_payment = Some(proof);
        Ok(())
    }

    /// `Open → Closed(pendingBalance)`: close without settling, recording the
    /// unpaid balance for import into a future process.
    ///
    /// The `{debtor, amount}` pair is not trusted from the caller: the
    /// settlement is recomputed here and the request is rejected when the
    /// balance is already settled or the pair disagrees with the computed
    /// value beyond the tolerance.
    pub fn close_with_carry_over(
        &mut self,
        debtor: Person,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.require_open()?;

        let settlement = self.settlement();
        if settlement.is_settled() {
            return Err(LedgerError::AlreadySettled);
        }
        let computed_debtor = settlement.debtor().ok_or(LedgerError::AlreadySettled)?;
        if computed_debtor != debtor
            || (settlement.amount_owed() - amount).abs() >= crate::balance::SETTLEMENT_TOLERANCE
        {
            return Err(LedgerError::BalanceMismatch);
        }

        self.status = ProcessStatus::Closed;
        self.closed_at = Some(Utc::now());
        self.closing_balance = Some(ClosingBalance { debtor, amount });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionSource;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(id: &str, amount: Decimal, payer: Person, assignment: Assignment) -> Transaction {
        Transaction {
            id: TransactionId::from(id),
            date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            description: "test".into(),
            amount,
            assignment,
            payer,
            source: TransactionSource::Manual,
            source_invoice_id: None,
            category: None,
        }
    }

    fn proof() -> ProofOfPayment {
        ProofOfPayment {
            file_name: "receipt.pdf".into(),
            date: Utc::now(),
            file_data: String::new(),
        }
    }

    #[test]
    fn new_process_is_open_and_empty() {
        let process = Process::new("October 2025");
        assert!(process.is_open());
        assert!(process.transactions.is_empty());
        assert!(process.invoices.is_empty());
        assert!(process.closing_balance.is_none());
        assert!(process.proof_of_payment.is_none());
    }

    #[test]
    fn close_with_proof_sets_no_balance_fields() {
        let mut process = Process::new("m");
        process
            .add_transaction(tx("t1", dec!(100), Person::PersonA, Assignment::Split))
            .unwrap();

        process.close_with_proof(proof()).unwrap();
        assert_eq!(process.status, ProcessStatus::Closed);
        assert!(process.closed_at.is_some());
        assert!(process.proof_of_payment.is_some());
        assert!(process.closing_balance.is_none());
        assert!(!process.is_pending_debt());
    }

    #[test]
    fn closing_twice_is_rejected_without_mutation() {
        let mut process = Process::new("m");
        process.close_with_proof(proof()).unwrap();
        let closed_at = process.closed_at;

        assert_eq!(
            process.close_with_proof(proof()),
            Err(LedgerError::InvalidStateTransition)
        );
        assert_eq!(
            process.close_with_carry_over(Person::PersonA, dec!(10)),
            Err(LedgerError::InvalidStateTransition)
        );
        assert_eq!(process.closed_at, closed_at);
        assert!(process.closing_balance.is_none());
    }

    #[test]
    fn carry_over_close_records_pending_debt() {
        let mut process = Process::new("m");
        process
            .add_transaction(tx("t1", dec!(100), Person::PersonB, Assignment::Split))
            .unwrap();

        process
            .close_with_carry_over(Person::PersonA, dec!(50))
            .unwrap();
        assert!(process.is_pending_debt());
        assert_eq!(
            process.closing_balance,
            Some(ClosingBalance {
                debtor: Person::PersonA,
                amount: dec!(50)
            })
        );
        assert!(process.proof_of_payment.is_none());
    }

    #[test]
    fn carry_over_on_settled_process_is_rejected() {
        let mut process = Process::new("m");
        process
            .add_transaction(tx("t1", dec!(40), Person::PersonA, Assignment::PersonA))
            .unwrap();

        assert_eq!(
            process.close_with_carry_over(Person::PersonB, dec!(40)),
            Err(LedgerError::AlreadySettled)
        );
        assert!(process.is_open());
    }

    #[test]
    fn carry_over_with_stale_amount_is_rejected() {
        let mut process = Process::new("m");
        process
            .add_transaction(tx("t1", dec!(100), Person::PersonA, Assignment::Split))
            .unwrap();

        // UI believed the balance was 80, but the list says 50.
        assert_eq!(
            process.close_with_carry_over(Person::PersonB, dec!(80)),
            Err(LedgerError::BalanceMismatch)
        );
        // Wrong debtor is rejected too.
        assert_eq!(
            process.close_with_carry_over(Person::PersonA, dec!(50)),
            Err(LedgerError::BalanceMismatch)
        );
        assert!(process.is_open());
        assert!(process.closing_balance.is_none());
    }

    #[test]
    fn closed_process_rejects_edits() {
        let mut process = Process::new("m");
        process
            .add_transaction(tx("t1", dec!(10), Person::PersonA, Assignment::Split))
            .unwrap();
        process.close_with_proof(proof()).unwrap();

        assert_eq!(
            process.add_transaction(tx("t2", dec!(5), Person::PersonA, Assignment::Split)),
            Err(LedgerError::InvalidStateTransition)
        );
        assert_eq!(
            process.update_assignment(&TransactionId::from("t1"), Assignment::PersonA),
            Err(LedgerError::InvalidStateTransition)
        );
        assert_eq!(
            process.delete_transaction(&TransactionId::from("t1")),
            Err(LedgerError::InvalidStateTransition)
        );
    }

    #[test]
    fn carry_over_transaction_is_immutable() {
        let mut process = Process::new("m");
        let mut carried = tx("carry-1", dec!(150), Person::PersonB, Assignment::PersonA);
        carried.source = TransactionSource::CarryOver;
        process.add_transaction(carried).unwrap();

        assert_eq!(
            process.update_assignment(&TransactionId::from("carry-1"), Assignment::Split),
            Err(LedgerError::CarryOverImmutable)
        );
        assert_eq!(
            process.delete_transaction(&TransactionId::from("carry-1")),
            Err(LedgerError::CarryOverImmutable)
        );
        assert_eq!(process.transactions.len(), 1);
    }

    #[test]
    fn deleting_invoice_transaction_adjusts_total() {
        let mut process = Process::new("m");
        let invoice = Invoice {
            id: InvoiceId::from("inv-1"),
            file_name: "f.pdf".into(),
            original_name: "f.pdf".into(),
            payer: Person::PersonA,
            upload_date: Utc::now(),
            total_amount: dec!(100),
            file_data: String::new(),
        };
        let mut t1 = tx("t1", dec!(40), Person::PersonA, Assignment::Split);
        t1.source_invoice_id = Some(InvoiceId::from("inv-1"));
        let mut t2 = tx("t2", dec!(150), Person::PersonA, Assignment::Split);
        t2.source_invoice_id = Some(InvoiceId::from("inv-1"));
        process.add_invoice(invoice, vec![t1, t2]).unwrap();

        process.delete_transaction(&TransactionId::from("t1")).unwrap();
        assert_eq!(process.invoices[0].total_amount, dec!(60));

        // Deleting more than the remaining total floors at zero.
        process.delete_transaction(&TransactionId::from("t2")).unwrap();
        assert_eq!(process.invoices[0].total_amount, Decimal::ZERO);
    }

    #[test]
    fn generated_file_name_is_sanitized() {
        let uploaded = DateTime::parse_from_rfc3339("2025-10-03T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let name = Invoice::generated_file_name("Statement (Oct)!.pdf", "Marco", uploaded);
        assert!(name.starts_with("StatementOct_MARCO_"));
        assert!(name.ends_with(".pdf"));

        // No extension falls back to pdf.
        let name = Invoice::generated_file_name("statement", "Rita", uploaded);
        assert!(name.ends_with(".pdf"));
        assert!(name.contains("_RITA_"));
    }
}
