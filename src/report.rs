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

//! CSV settlement report.
//!
//! One row per transaction followed by a trailing summary block with the
//! totals and the final settlement direction. Descriptions containing commas
//! or quotes are handled by the `csv` writer (internal quotes doubled).

use crate::person::{People, Person};
use crate::process::Process;
use crate::transaction::{Assignment, Transaction, TransactionSource};
use csv::WriterBuilder;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io;

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn source_label(source: TransactionSource) -> &'static str {
    match source {
        TransactionSource::Pdf => "Invoice PDF",
        TransactionSource::Manual => "Manual",
        TransactionSource::CarryOver => "Previous balance",
    }
}

/// Per-person halves of one row, matching the assignment rules.
fn row_shares(tx: &Transaction) -> (Decimal, Decimal) {
    match tx.assignment {
        Assignment::PersonA => (tx.amount, Decimal::ZERO),
        Assignment::PersonB => (Decimal::ZERO, tx.amount),
        Assignment::Split => (tx.amount / dec!(2), tx.amount / dec!(2)),
    }
}

/// Writes the settlement report for one process.
///
/// # Example output
///
/// ```csv
/// Date,Description,Category,Source,Paid By,Assigned To,Amount,Share Marco,Share Rita
/// 2025-10-02,"Market, downtown",Groceries,Invoice PDF,Marco,Split,100.00,50.00,50.00
/// ```
pub fn write_report<W: io::Write>(
    process: &Process,
    people: &People,
    writer: W,
) -> Result<(), csv::Error> {
    // The summary block has shorter records than the transaction rows.
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);
    let name_a = people.name(Person::PersonA);
    let name_b = people.name(Person::PersonB);

    wtr.write_record([
        "Date",
        "Description",
        "Category",
        "Source",
        "Paid By",
        "Assigned To",
        "Amount",
        &format!("Share {name_a}"),
        &format!("Share {name_b}"),
    ])?;

    for tx in &process.transactions {
        let assignee = match tx.assignment {
            Assignment::PersonA => name_a,
            Assignment::PersonB => name_b,
            Assignment::Split => "Split",
        };
        let (share_a, share_b) = row_shares(tx);
        wtr.write_record([
            tx.date.to_string().as_str(),
            &tx.description,
            tx.category(),
            source_label(tx.source),
            people.name(tx.payer),
            assignee,
            &money(tx.amount),
            &money(share_a),
            &money(share_b),
        ])?;
    }

    let settlement = process.settlement();
    wtr.write_record([""])?;
    wtr.write_record(["FINANCIAL SUMMARY"])?;
    wtr.write_record(["Total", &money(settlement.total)])?;
    wtr.write_record([
        &format!("Paid by {name_a}"),
        &money(settlement.paid.get(Person::PersonA)),
    ])?;
    wtr.write_record([
        &format!("Paid by {name_b}"),
        &money(settlement.paid.get(Person::PersonB)),
    ])?;
    wtr.write_record([
        &format!("Fair share {name_a}"),
        &money(settlement.share.get(Person::PersonA)),
    ])?;
    wtr.write_record([
        &format!("Fair share {name_b}"),
        &money(settlement.share.get(Person::PersonB)),
    ])?;

    // Direction derives from the sign at write time, never cached state.
    match settlement.debtor() {
        Some(debtor) => {
            wtr.write_record([
                &format!(
                    "{} pays {}",
                    people.name(debtor),
                    people.name(debtor.opposite())
                ),
                &money(settlement.amount_owed()),
            ])?;
        }
        None => {
            wtr.write_record(["Settled", &money(Decimal::ZERO)])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
