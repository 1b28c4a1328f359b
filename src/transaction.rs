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

//! Expense and credit lines.
//!
//! A negative amount is a credit/refund; adding it to an accumulator reduces
//! the total, which is exactly what the balance calculator relies on.

use crate::base::{InvoiceId, TransactionId};
use crate::person::Person;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fallback category for records the extraction service left unlabelled.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Which party(ies) bear a transaction's cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Assignment {
    #[serde(rename = "PERSON_A")]
    PersonA,
    #[serde(rename = "PERSON_B")]
    PersonB,
    /// Split 50/50.
    #[serde(rename = "SPLIT")]
    Split,
}

impl From<Person> for Assignment {
    fn from(person: Person) -> Self {
        match person {
            Person::PersonA => Assignment::PersonA,
            Person::PersonB => Assignment::PersonB,
        }
    }
}

/// Where a transaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TransactionSource {
    /// Extracted from an uploaded invoice document.
    #[serde(rename = "PDF")]
    Pdf,
    /// Entered by hand.
    #[serde(rename = "MANUAL")]
    Manual,
    /// Synthesized when an unpaid balance was imported from a closed process.
    /// Immutable through the normal editing surface.
    #[serde(rename = "CARRYOVER")]
    CarryOver,
}

/// One expense or credit line inside a process.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub description: String,
    /// Signed amount. Positive = expense, negative = credit/refund.
    pub amount: Decimal,
    pub assignment: Assignment,
    /// Whose invoice/account the line was billed against. May differ from who
    /// bears the cost.
    pub payer: Person,
    pub source: TransactionSource,
    /// Set when the transaction was extracted from an uploaded invoice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_invoice_id: Option<InvoiceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Transaction {
    /// Effective category, falling back to [`DEFAULT_CATEGORY`].
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn is_carry_over(&self) -> bool {
        self.source == TransactionSource::CarryOver
    }
}
