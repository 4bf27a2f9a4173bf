use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::account::{AccountId, CompanyId};
use crate::money::Money;
use crate::period::FiscalYearId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationId(pub i64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationLine {
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
    pub note: Option<String>,
}

impl VerificationLine {
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        VerificationLine { account_id, debit: amount, credit: Money::zero(), note: None }
    }

    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        VerificationLine { account_id, debit: Money::zero(), credit: amount, note: None }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Exactly one of {debit>0, credit>0}, or both zero (structural
    /// pass-through with no arithmetic contribution).
    pub fn is_structurally_valid(&self) -> bool {
        !(self.debit.is_positive() && self.credit.is_positive())
    }
}

/// A verification before it has been checked by the posting engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnvalidatedVerification {
    pub company_id: CompanyId,
    pub fiscal_year_id: FiscalYearId,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub lines: Vec<VerificationLine>,
}

impl UnvalidatedVerification {
    pub fn total_debits(&self) -> Money {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.lines.iter().map(|l| l.credit).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    pub fn non_zero_line_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.debit.is_positive() || l.credit.is_positive())
            .count()
    }
}

/// A verification that has passed posting-engine validation and been
/// assigned its dense per-(company, fiscal_year) number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub id: Option<VerificationId>,
    pub company_id: CompanyId,
    pub fiscal_year_id: FiscalYearId,
    pub number: i64,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub lines: Vec<VerificationLine>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Verification {
    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.debit).sum()
    }
}
