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

use clap::{Parser, Subcommand};
use fairsplit::{
    FileStore, Ledger, People, ProcessStatus, ProcessStore, StoreError, write_report,
};
use std::fs;
use std::path::PathBuf;
use std::process;

/// Fairsplit - household expense-splitting ledger
///
/// Manages monthly settlement processes stored in a local JSON file and
/// exports per-process CSV settlement reports.
#[derive(Parser, Debug)]
#[command(name = "fairsplit")]
#[command(about = "A household expense-splitting ledger", long_about = None)]
struct Args {
    /// Path to the process collection file
    #[arg(long, value_name = "FILE", default_value = "processes.json")]
    data: PathBuf,

    /// Optional JSON file with the two person profiles
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all processes with status and live balance
    List,
    /// Create a new process; a pending debt, if any, is reported
    New {
        /// Name of the new billing cycle, e.g. "October 2025"
        name: String,
        /// Import the offered pending debt into the new process
        #[arg(long)]
        accept_debt: bool,
    },
    /// Write the CSV settlement report for one process to stdout
    Report {
        /// Process id or exact name
        process: String,
    },
    /// Write the whole collection as JSON to stdout
    Export,
    /// Replace the whole collection with a JSON backup file
    Import { file: PathBuf },
    /// Delete a process (pending debts pointing at it are reopened)
    Delete {
        /// Process id or exact name
        process: String,
    },
}

fn main() {
    let args = Args::parse();

    let people = match load_people(args.config.as_deref()) {
        Ok(people) => people,
        Err(e) => {
            eprintln!("Error reading config: {}", e);
            process::exit(1);
        }
    };

    let store = FileStore::new(&args.data);
    let mut ledger = match store.load() {
        Ok(processes) => Ledger::from_processes(processes),
        Err(e) => {
            eprintln!("Error loading '{}': {}", args.data.display(), e);
            process::exit(1);
        }
    };

    let mutated = match run(&args.command, &mut ledger, &people) {
        Ok(mutated) => mutated,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if mutated {
        match store.save(ledger.processes()) {
            Ok(()) => {}
            // Quota failures keep the in-memory state valid; warn, don't die.
            Err(StoreError::QuotaExceeded(detail)) => {
                eprintln!("Warning: local storage is full, changes were not persisted: {}", detail);
            }
            Err(e) => {
                eprintln!("Error saving '{}': {}", args.data.display(), e);
                process::exit(1);
            }
        }
    }
}

fn load_people(path: Option<&std::path::Path>) -> Result<People, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(People::default()),
    }
}

/// Runs one subcommand. Returns whether the collection was mutated.
fn run(
    command: &Command,
    ledger: &mut Ledger,
    people: &People,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Command::List => {
            for process in ledger.processes() {
                let settlement = process.settlement();
                let status = match process.status {
                    ProcessStatus::Open => "open",
                    ProcessStatus::Closed if process.is_pending_debt() => "closed (pending debt)",
                    ProcessStatus::Closed => "closed",
                };
                let balance = match settlement.debtor() {
                    Some(debtor) => format!(
                        "{} owes {} {:.2}",
                        people.name(debtor),
                        people.name(debtor.opposite()),
                        settlement.amount_owed()
                    ),
                    None => "settled".to_owned(),
                };
                println!(
                    "{}  {:<24} {:<22} {}",
                    process.id, process.name, status, balance
                );
            }
            Ok(false)
        }
        Command::New { name, accept_debt } => {
            let (id, offer) = ledger.create_process(name);
            println!("Created process '{}' ({})", name, id);
            if let Some(debt) = offer {
                if *accept_debt {
                    ledger.accept_pending_debt(&debt.process_id, &id)?;
                    println!(
                        "Imported pending debt of {:.2} owed by {} from '{}'",
                        debt.amount,
                        people.name(debt.debtor),
                        debt.process_name
                    );
                } else {
                    println!(
                        "Pending debt available: {:.2} owed by {} from '{}'. \
                         Re-run with --accept-debt on the next creation, or ignore it.",
                        debt.amount,
                        people.name(debt.debtor),
                        debt.process_name
                    );
                }
            }
            Ok(true)
        }
        Command::Report { process } => {
            let process = ledger
                .resolve(process)
                .ok_or(fairsplit::LedgerError::ProcessNotFound)?;
            write_report(process, people, std::io::stdout())?;
            Ok(false)
        }
        Command::Export => {
            println!("{}", ledger.export_json()?);
            Ok(false)
        }
        Command::Import { file } => {
            let payload = fs::read_to_string(file)?;
            let count = ledger.import_json(&payload)?;
            println!("Imported {} processes", count);
            Ok(true)
        }
        Command::Delete { process } => {
            let id = ledger
                .resolve(process)
                .ok_or(fairsplit::LedgerError::ProcessNotFound)?
                .id
                .clone();
            ledger.delete_process(&id)?;
            println!("Deleted process {}", id);
            Ok(true)
        }
    }
}
