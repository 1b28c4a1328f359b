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

//! External document-extraction collaborator.
//!
//! The extraction service (a generative-AI API in production) owns all PDF
//! understanding; the ledger only consumes its itemized output. Nothing in
//! the payload besides date, description, amount, and category is trusted:
//! ids, payer, assignment, and source are assigned by the ledger.

use crate::error::ExtractionError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

/// One raw transaction record returned by the extraction service.
///
/// Amount sign convention: positive = expense, negative = credit/payment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractedTransaction {
    pub date: NaiveDate,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<String>,
}

/// The itemized result of extracting one invoice document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    /// Total the service found printed on the document. Advisory: when
    /// absent, the invoice total is the sum of the transaction amounts.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub detected_total: Option<Decimal>,
    pub transactions: Vec<ExtractedTransaction>,
}

impl ExtractedDocument {
    /// Parses and validates the service's JSON response.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::Malformed`] - not the expected JSON shape.
    /// - [`ExtractionError::Empty`] - no transactions in the payload.
    pub fn from_json(payload: &str) -> Result<Self, ExtractionError> {
        let document: ExtractedDocument = serde_json::from_str(payload)
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;
        if document.transactions.is_empty() {
            return Err(ExtractionError::Empty);
        }
        Ok(document)
    }
}

/// Capability of turning a binary document into itemized transactions.
///
/// Long-running; callers must not apply the result if the target process was
/// deleted while the extraction was in flight (the ledger re-checks the
/// process id on insert).
pub trait DocumentExtractor {
    fn extract(&self, document: &[u8]) -> Result<ExtractedDocument, ExtractionError>;
}
