use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kontera_core::{Money, MoneyError};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "kontera")]
#[command(about = "Swedish double-entry bookkeeping: post, close, import/export SIE, report")]
#[command(version)]
pub struct Cli {
    /// Path to the SQLite store file; created if it doesn't exist yet.
    #[arg(long, global = true, default_value = "kontera.db")]
    pub db: PathBuf,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tenant, account, and fiscal-year bootstrap
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Post and inspect verifications
    #[command(subcommand)]
    Verification(VerificationCommands),

    /// SIE4 import/export
    #[command(subcommand)]
    Sie(SieCommands),

    /// Close a fiscal year
    Close {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        fiscal_year: i64,
        /// Last day of the closing transaction, defaults to the fiscal year's end date
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Depreciation and accrual runs
    #[command(subcommand)]
    Rules(RuleCommands),

    /// Tax/VAT/payroll reports
    #[command(subcommand)]
    Report(ReportCommands),
}

#[derive(Subcommand)]
pub enum CompanyCommands {
    /// Register a new company
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        org_number: String,
    },
    /// Add an account to a company's chart of accounts
    AddAccount {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        number: String,
        #[arg(long)]
        name: String,
        /// Tillgång, Skuld, Eget kapital, Intäkt, or Kostnad
        #[arg(long)]
        account_type: String,
    },
    /// Seed a company's chart of accounts from a JSON file (§6 seed format)
    SeedAccounts {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        file: PathBuf,
    },
    /// Open a fiscal year
    AddFiscalYear {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

/// One verification line: `ACCOUNT:SIDE:AMOUNT`, e.g. `1930:debit:1250.00`.
#[derive(Debug, Clone)]
pub struct LineArg {
    pub account_number: String,
    pub debit: bool,
    pub amount: Money,
}

#[derive(Debug, Error)]
pub enum LineArgError {
    #[error("expected ACCOUNT:SIDE:AMOUNT, got `{0}`")]
    Shape(String),
    #[error("side must be debit/credit, got `{0}`")]
    Side(String),
    #[error(transparent)]
    Amount(#[from] MoneyError),
}

impl FromStr for LineArg {
    type Err = LineArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(3, ':').collect();
        let [account_number, side, amount] = parts[..] else {
            return Err(LineArgError::Shape(s.to_string()));
        };
        let debit = match side.to_lowercase().as_str() {
            "debit" | "d" => true,
            "credit" | "c" => false,
            other => return Err(LineArgError::Side(other.to_string())),
        };
        let amount = amount.parse::<Money>()?;
        Ok(LineArg { account_number: account_number.to_string(), debit, amount })
    }
}

#[derive(Subcommand)]
pub enum VerificationCommands {
    /// Post a balanced verification
    Post {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        fiscal_year: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        description: String,
        /// Repeatable: ACCOUNT:debit|credit:AMOUNT
        #[arg(long = "line", required = true)]
        lines: Vec<LineArg>,
    },
    /// List every verification of a fiscal year
    List {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        fiscal_year: i64,
    },
    /// Print a trial balance as of a date
    TrialBalance {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        as_of: NaiveDate,
    },
}

#[derive(Subcommand)]
pub enum SieCommands {
    /// Import a SIE4 file, creating a new company unless --company is given
    Import {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        company: Option<i64>,
    },
    /// Export one fiscal year as a SIE4 file
    Export {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        fiscal_year: i64,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// Run depreciation for every active asset up to a period date
    DepreciationRun {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        fiscal_year: i64,
        #[arg(long)]
        period: NaiveDate,
    },
    /// Run every active, auto-generating accrual up to a cutoff date
    AccrualRun {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        fiscal_year: i64,
        #[arg(long)]
        as_of: NaiveDate,
    },
    /// Seed the standard template catalog for a company
    TemplateSeed {
        #[arg(long)]
        company: i64,
    },
    /// Apply a template against a total amount and post the result
    TemplateApply {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        fiscal_year: i64,
        #[arg(long)]
        template: i64,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        description: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// VAT report (SKV 4700)
    Vat {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Employer report (AGI)
    Employer {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// INK2 corporate tax aggregation
    Ink2 {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}
