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

//! Balance calculator.
//!
//! A pure, deterministic function of a transaction list. Nothing here is
//! cached: debtor and creditor roles are derived from the sign of the balance
//! at the moment the settlement is computed.
//!
//! # Example
//!
//! ```
//! use fairsplit::{Settlement, Person};
//! # use fairsplit::{Assignment, Transaction, TransactionId, TransactionSource};
//! # use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! # let tx = Transaction {
//! #     id: TransactionId::from("tx-1"),
//! #     date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
//! #     description: "Dinner".into(),
//! #     amount: dec!(100),
//! #     assignment: Assignment::Split,
//! #     payer: Person::PersonA,
//! #     source: TransactionSource::Manual,
//! #     source_invoice_id: None,
//! #     category: None,
//! # };
//! let settlement = Settlement::of(&[tx]);
//! assert_eq!(settlement.balance(Person::PersonA), dec!(50));
//! assert_eq!(settlement.balance(Person::PersonB), dec!(-50));
//! ```

use crate::person::Person;
use crate::transaction::{Assignment, Transaction};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Balances with an absolute value under this are treated as zero.
pub const SETTLEMENT_TOLERANCE: Decimal = dec!(0.01);

/// Amounts accumulated per party.
///
/// Keyed by [`Person`] instead of hardwired pair fields so the arithmetic
/// generalizes to any enumerated party set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartyAmounts(HashMap<Person, Decimal>);

impl PartyAmounts {
    fn add(&mut self, person: Person, amount: Decimal) {
        *self.0.entry(person).or_insert(Decimal::ZERO) += amount;
    }

    pub fn get(&self, person: Person) -> Decimal {
        self.0.get(&person).copied().unwrap_or(Decimal::ZERO)
    }
}

/// The fair-share settlement derived from a process's transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Sum of all amounts, credits included.
    pub total: Decimal,
    /// What each party actually paid (what landed on their invoices).
    pub paid: PartyAmounts,
    /// What each party consumed under the assignment rules.
    pub share: PartyAmounts,
}

impl Settlement {
    /// Computes the settlement for a list of transactions.
    ///
    /// Each amount is credited in full to the payer's `paid` bucket. The
    /// `share` bucket receives the full amount for a single-party assignment
    /// or half per party for a split. Credits are negative amounts and flow
    /// through both accumulators unchanged, so the partition is lossless.
    pub fn of(transactions: &[Transaction]) -> Self {
        let mut total = Decimal::ZERO;
        let mut paid = PartyAmounts::default();
        let mut share = PartyAmounts::default();

        for tx in transactions {
            total += tx.amount;
            paid.add(tx.payer, tx.amount);

            match tx.assignment {
                Assignment::PersonA => share.add(Person::PersonA, tx.amount),
                Assignment::PersonB => share.add(Person::PersonB, tx.amount),
                Assignment::Split => {
                    let half = tx.amount / dec!(2);
                    share.add(Person::PersonA, half);
                    share.add(Person::PersonB, half);
                }
            }
        }

        Settlement { total, paid, share }
    }

    /// Net balance for one party: `paid − share`.
    ///
    /// Positive means the party is owed money; negative means they owe. The
    /// balances of the two parties are always exact negatives of each other.
    pub fn balance(&self, person: Person) -> Decimal {
        self.paid.get(person) - self.share.get(person)
    }

    /// Whether the parties are even within [`SETTLEMENT_TOLERANCE`].
    pub fn is_settled(&self) -> bool {
        self.balance(Person::PersonA).abs() < SETTLEMENT_TOLERANCE
    }

    /// The party that owes money, or `None` when settled.
    pub fn debtor(&self) -> Option<Person> {
        if self.is_settled() {
            return None;
        }
        if self.balance(Person::PersonA) < Decimal::ZERO {
            Some(Person::PersonA)
        } else {
            Some(Person::PersonB)
        }
    }

    /// Absolute amount the debtor owes the creditor.
    pub fn amount_owed(&self) -> Decimal {
        self.balance(Person::PersonA).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TransactionId;
    use crate::transaction::TransactionSource;
    use chrono::NaiveDate;

    fn tx(amount: Decimal, payer: Person, assignment: Assignment) -> Transaction {
        Transaction {
            id: TransactionId::new(),
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

    #[test]
    fn split_expense_balances_are_exact_negatives() {
        let settlement = Settlement::of(&[tx(dec!(100), Person::PersonA, Assignment::Split)]);
        assert_eq!(settlement.balance(Person::PersonA), dec!(50));
        assert_eq!(settlement.balance(Person::PersonB), dec!(-50));
        assert_eq!(settlement.total, dec!(100));
    }

    #[test]
    fn credit_on_split_item_reduces_both_shares() {
        let settlement = Settlement::of(&[
            tx(dec!(100), Person::PersonA, Assignment::Split),
            tx(dec!(-40), Person::PersonA, Assignment::Split),
        ]);
        assert_eq!(settlement.total, dec!(60));
        assert_eq!(settlement.share.get(Person::PersonA), dec!(30));
        assert_eq!(settlement.balance(Person::PersonB), dec!(-30));
    }

    #[test]
    fn assignment_to_payer_is_neutral() {
        // A pays for something only A consumed: nobody owes anybody.
        let settlement = Settlement::of(&[tx(dec!(75), Person::PersonA, Assignment::PersonA)]);
        assert!(settlement.is_settled());
        assert_eq!(settlement.debtor(), None);
    }

    #[test]
    fn payer_differs_from_assignee() {
        // B's card was charged for something only A consumed.
        let settlement = Settlement::of(&[tx(dec!(30), Person::PersonB, Assignment::PersonA)]);
        assert_eq!(settlement.balance(Person::PersonB), dec!(30));
        assert_eq!(settlement.debtor(), Some(Person::PersonA));
        assert_eq!(settlement.amount_owed(), dec!(30));
    }

    #[test]
    fn tolerance_classifies_near_zero_as_settled() {
        let settlement = Settlement::of(&[tx(dec!(0.008), Person::PersonA, Assignment::Split)]);
        // Balance is 0.004, under the 0.01 tolerance.
        assert!(settlement.is_settled());

        let settlement = Settlement::of(&[tx(dec!(0.04), Person::PersonA, Assignment::Split)]);
        // Balance is 0.02, over the tolerance.
        assert!(!settlement.is_settled());
    }

    #[test]
    fn empty_list_is_settled() {
        let settlement = Settlement::of(&[]);
        assert_eq!(settlement.total, Decimal::ZERO);
        assert!(settlement.is_settled());
        assert_eq!(settlement.amount_owed(), Decimal::ZERO);
    }
}
