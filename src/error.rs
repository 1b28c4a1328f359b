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

//! Error types for the settlement ledger.
//!
//! Core invariant violations ([`LedgerError`]) are caller misuse and are
//! rejected by precondition checks with no partial mutation. Collaborator
//! failures ([`StoreError`], [`ExtractionError`]) are environmental and
//! recoverable: callers surface them as warnings and retry.

use thiserror::Error;

/// Rule violations in the settlement/carry-over core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Close or edit attempted on a process not in the required state
    #[error("invalid state transition: process is not open")]
    InvalidStateTransition,

    /// Carry-over requested while the balance is already settled
    #[error("balance is already settled; nothing to carry over")]
    AlreadySettled,

    /// Carry-over amount does not match the recomputed settlement
    #[error("carry-over request does not match the computed balance")]
    BalanceMismatch,

    /// Referenced process id does not exist
    #[error("process not found")]
    ProcessNotFound,

    /// Referenced transaction id does not exist in the process
    #[error("transaction not found")]
    TransactionNotFound,

    /// Carry-over transactions cannot be reassigned or deleted
    #[error("carry-over transactions cannot be edited or deleted")]
    CarryOverImmutable,

    /// The source process is not an unresolved pending debt
    #[error("process has no pending debt to import")]
    NotPendingDebt,

    /// The debt was already absorbed by another process
    #[error("debt was already carried over to another process")]
    DebtAlreadyLinked,

    /// Bulk import payload is not a valid array of processes
    #[error("import payload is not a valid process array")]
    InvalidImportPayload,
}

/// Persistence collaborator failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Local storage write failed for lack of space; non-fatal, the in-memory
    /// state is retained
    #[error("local storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Network or auth failure talking to the remote backup
    #[error("remote sync failed: {0}")]
    RemoteSync(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// External extraction service failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Service returned output that is not the expected JSON shape
    #[error("extraction service returned malformed output: {0}")]
    Malformed(String),

    /// Service returned no transactions at all
    #[error("extraction service returned no transactions")]
    Empty,
}
