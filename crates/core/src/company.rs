use serde::{Deserialize, Serialize};

use crate::account::CompanyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountingStandard {
    K2,
    K3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Option<CompanyId>,
    pub name: String,
    pub org_number: String,
    pub accounting_standard: AccountingStandard,
    pub fiscal_year_start_month: u8,
    pub contact_email: Option<String>,
}

impl Company {
    pub fn new(name: &str, org_number: &str) -> Self {
        Company {
            id: None,
            name: name.to_string(),
            org_number: org_number.to_string(),
            accounting_standard: AccountingStandard::K2,
            fiscal_year_start_month: 1,
            contact_email: None,
        }
    }

    /// Accepts `NNNNNN-NNNN`, the canonical Swedish organisation-number
    /// format, normalising a bare 10-digit string to it.
    pub fn normalize_org_number(raw: &str) -> Option<String> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() != 10 {
            return None;
        }
        Some(format!("{}-{}", &digits[0..6], &digits[6..10]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bare_digits() {
        assert_eq!(
            Company::normalize_org_number("5561234567"),
            Some("556123-4567".to_string())
        );
    }

    #[test]
    fn leaves_already_formatted_number_equivalent() {
        assert_eq!(
            Company::normalize_org_number("556123-4567"),
            Some("556123-4567".to_string())
        );
    }
}
