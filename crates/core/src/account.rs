use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Asset => write!(f, "Asset"),
            AccountType::Liability => write!(f, "Liability"),
            AccountType::Equity => write!(f, "Equity"),
            AccountType::Revenue => write!(f, "Revenue"),
            AccountType::Expense => write!(f, "Expense"),
        }
    }
}

impl AccountType {
    /// Maps the Swedish type strings used in the chart-of-accounts seed file.
    pub fn from_swedish(s: &str) -> Option<Self> {
        match s {
            "Tillgång" => Some(AccountType::Asset),
            "Skuld" => Some(AccountType::Liability),
            "Eget kapital" => Some(AccountType::Equity),
            "Intäkt" => Some(AccountType::Revenue),
            "Kostnad" => Some(AccountType::Expense),
            _ => None,
        }
    }

    /// Infers a type from a BAS account number when no explicit type is
    /// supplied (used by SIE import). Class 2 splits on the 20/21 prefix
    /// (equity) versus the rest of the class (liability).
    pub fn infer_from_number(number: &str) -> Self {
        match number.chars().next() {
            Some('1') => AccountType::Asset,
            Some('2') => {
                if number.starts_with("20") || number.starts_with("21") {
                    AccountType::Equity
                } else {
                    AccountType::Liability
                }
            }
            Some('3') => AccountType::Revenue,
            _ => AccountType::Expense,
        }
    }
}

/// First digit of a BAS account number, 1-8. Determines normal side and is
/// the primary classification used by the balance/closing/report engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AccountClass(pub u8);

impl AccountClass {
    pub fn of(number: &str) -> Option<Self> {
        number.chars().next()?.to_digit(10).map(|d| AccountClass(d as u8))
    }

    pub fn is_balance_sheet(self) -> bool {
        matches!(self.0, 1 | 2)
    }

    pub fn is_result(self) -> bool {
        matches!(self.0, 3..=8)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<AccountId>,
    pub company_id: CompanyId,
    pub number: String,
    pub name: String,
    pub account_type: AccountType,
    pub vat_code: Option<String>,
    pub is_active: bool,
    pub opening_balance: Money,
}

impl Account {
    pub fn new(company_id: CompanyId, number: &str, name: &str, account_type: AccountType) -> Self {
        Account {
            id: None,
            company_id,
            number: number.to_string(),
            name: name.to_string(),
            account_type,
            vat_code: None,
            is_active: true,
            opening_balance: Money::zero(),
        }
    }

    pub fn class(&self) -> Option<AccountClass> {
        AccountClass::of(&self.number)
    }
}

/// Seed record for the chart-of-accounts JSON file (§6).
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSeed {
    pub number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub vat_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartOfAccountsSeed {
    pub accounts: Vec<AccountSeed>,
}
