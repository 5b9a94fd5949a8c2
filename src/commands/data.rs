use clap::Args;
use fintrack_core::models::{balance, total_invested};
use fintrack_core::{DebtHistoryEntry, Document, Encoding, JsonStore, StructureReport};
use serde::Serialize;

use super::OutputFormat;
use crate::config::Config;

/// Number of history entries shown by `inspect`.
const RECENT_HISTORY: usize = 5;

#[derive(Args)]
pub struct InitCommand {}

impl InitCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let store = config.store();
        if store.initialize()? {
            println!("Created data file: {}", store.path().display());
        } else {
            println!("Data file already exists: {}", store.path().display());
        }
        if !store.is_encrypted() {
            println!("Warning: no encryption key configured, data is stored in plaintext");
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct CheckCommand {
    /// Add missing collections to the data file
    #[arg(long)]
    pub repair: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl CheckCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let store = config.store();
        let mut report = store.check_structure()?;
        let missing = report.missing();

        if self.repair && !missing.is_empty() {
            report = store.repair_structure()?;
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                print_report(&store, &report);
                if missing.is_empty() {
                    println!("\nAll collections present.");
                } else if report.repaired {
                    let names: Vec<&str> = missing.iter().map(|t| t.name()).collect();
                    println!("\nAdded missing collections: {}", names.join(", "));
                } else {
                    println!(
                        "\n{} collection(s) missing. Run with --repair to add them.",
                        missing.len()
                    );
                }
            }
        }
        Ok(())
    }
}

fn print_report(store: &JsonStore, report: &StructureReport) {
    println!("Data file: {}", store.path().display());
    println!();
    for status in &report.tables {
        if !status.present {
            println!("  {:<14} missing", status.table.name());
        } else if status.table.is_sequence() {
            println!("  {:<14} {} records", status.table.name(), status.entries);
        } else {
            println!("  {:<14} {} keys", status.table.name(), status.entries);
        }
    }
}

#[derive(Args)]
pub struct InspectCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl InspectCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let store = config.store();
        let encoding = store.stored_encoding()?;
        let summary = Summary::from_document(&store.read()?, encoding);

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Text => {
                println!("Data file: {}", store.path().display());
                println!("Encoding: {:?}", summary.encoding);
                println!();
                println!("Users:          {}", summary.counts.users);
                println!("Debtors:        {}", summary.counts.debtors);
                println!("Transactions:   {}", summary.counts.transactions);
                println!("Investments:    {}", summary.counts.investments);
                println!("Debt history:   {}", summary.counts.debt_history);
                println!("Settings keys:  {}", summary.counts.settings);

                if !summary.users.is_empty() {
                    println!("\nUsers");
                    println!("-----");
                    for user in &summary.users {
                        println!("  {} <{}>  {}", user.name, user.email, user.id);
                    }
                }

                println!();
                println!("Balance:            {:.2}", summary.balance);
                println!("Total invested:     {:.2}", summary.total_invested);
                println!("Outstanding debts:  {:.2}", summary.outstanding_debts);

                if !summary.recent_history.is_empty() {
                    println!("\nRecent debt history");
                    println!("-------------------");
                    for entry in &summary.recent_history {
                        println!(
                            "  {}  {:<10} {}: {}",
                            entry.date.format("%Y-%m-%d %H:%M"),
                            entry.action.to_string().to_uppercase(),
                            entry.debtor_name,
                            entry.description
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Counts {
    users: usize,
    debtors: usize,
    transactions: usize,
    investments: usize,
    debt_history: usize,
    settings: usize,
}

#[derive(Debug, Serialize)]
struct UserLine {
    id: String,
    name: String,
    email: String,
}

/// Whole-file overview across all users.
#[derive(Debug, Serialize)]
struct Summary {
    encoding: Encoding,
    counts: Counts,
    users: Vec<UserLine>,
    balance: f64,
    total_invested: f64,
    outstanding_debts: f64,
    recent_history: Vec<DebtHistoryEntry>,
}

impl Summary {
    fn from_document(doc: &Document, encoding: Encoding) -> Self {
        let mut recent_history = doc.debt_history.clone();
        recent_history.sort_by(|a, b| b.date.cmp(&a.date));
        recent_history.truncate(RECENT_HISTORY);

        Self {
            encoding,
            counts: Counts {
                users: doc.users.len(),
                debtors: doc.debtors.len(),
                transactions: doc.transactions.len(),
                investments: doc.investments.len(),
                debt_history: doc.debt_history.len(),
                settings: doc.settings.len(),
            },
            users: doc
                .users
                .iter()
                .map(|u| UserLine {
                    id: u.id.clone(),
                    name: u.name.clone(),
                    email: u.email.clone(),
                })
                .collect(),
            balance: balance(&doc.transactions),
            total_invested: total_invested(&doc.investments),
            outstanding_debts: doc
                .debtors
                .iter()
                .filter(|d| d.is_outstanding())
                .map(|d| d.amount)
                .sum(),
            recent_history,
        }
    }
}
