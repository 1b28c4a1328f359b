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

//! The two settlement parties and their static configuration.
//!
//! The product surface exposes exactly two people, but the balance math in
//! [`crate::balance`] is keyed by [`Person`] rather than hardwired to a pair,
//! so the arithmetic stays generalizable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two settlement parties.
///
/// Serde spelling matches the backup format of the original application
/// (`PERSON_A` / `PERSON_B`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Person {
    #[serde(rename = "PERSON_A")]
    PersonA,
    #[serde(rename = "PERSON_B")]
    PersonB,
}

impl Person {
    /// All parties, in a fixed order.
    pub const ALL: [Person; 2] = [Person::PersonA, Person::PersonB];

    /// The other party. The creditor of a debt is the opposite of its debtor.
    pub fn opposite(self) -> Person {
        match self {
            Person::PersonA => Person::PersonB,
            Person::PersonB => Person::PersonA,
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Person::PersonA => write!(f, "PERSON_A"),
            Person::PersonB => write!(f, "PERSON_B"),
        }
    }
}

/// Display configuration for one party. Not part of the transactional model.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersonProfile {
    pub name: String,
    /// Accent color used by UI frontends; carried through untouched.
    #[serde(default)]
    pub color: Option<String>,
}

impl PersonProfile {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            color: None,
        }
    }
}

/// Static two-person configuration, supplied at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct People {
    pub person_a: PersonProfile,
    pub person_b: PersonProfile,
}

impl People {
    pub fn profile(&self, person: Person) -> &PersonProfile {
        match person {
            Person::PersonA => &self.person_a,
            Person::PersonB => &self.person_b,
        }
    }

    pub fn name(&self, person: Person) -> &str {
        &self.profile(person).name
    }
}

impl Default for People {
    fn default() -> Self {
        Self {
            person_a: PersonProfile::named("Person A"),
            person_b: PersonProfile::named("Person B"),
        }
    }
}
