use std::fmt::Write as _;

use kontera_core::{Account, Company, FiscalYear, Verification};

/// Quotes a string for a SIE tag field, inserting quotes whenever the value
/// contains whitespace (matching how the parser only special-cases quoted
/// fields that actually need them).
fn quote_if_needed(s: &str) -> String {
    if s.contains(char::is_whitespace) {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s)
}

/// Emits one company, its accounts, opening balances, and verifications as a
/// SIE4 document. Structural inverse of [`crate::parser::parse`] — round
/// tripping `parse(emit(x))` must reconstruct an equivalent ledger state.
pub fn emit(
    company: &Company,
    fiscal_year: &FiscalYear,
    accounts: &[Account],
    verifications: &[Verification],
) -> String {
    let mut out = String::new();

    writeln!(out, "#FLAGGA 0").unwrap();
    writeln!(out, "#FNAMN {}", quote(&company.name)).unwrap();
    writeln!(out, "#ORGNR {}", quote_if_needed(&company.org_number)).unwrap();
    writeln!(
        out,
        "#RAR 0 {} {}",
        fiscal_year.start_date().format("%Y%m%d"),
        fiscal_year.end_date().format("%Y%m%d"),
    )
    .unwrap();

    for account in accounts {
        writeln!(out, "#KONTO {} {}", account.number, quote(&account.name)).unwrap();
    }

    for account in accounts {
        if account.opening_balance.is_zero() {
            continue;
        }
        writeln!(out, "#IB 0 {} {}", account.number, account.opening_balance).unwrap();
    }

    let mut sorted = verifications.to_vec();
    sorted.sort_by_key(|v| v.number);

    for verification in &sorted {
        writeln!(
            out,
            "#VER A {} {} {}",
            verification.number,
            verification.transaction_date.format("%Y%m%d"),
            quote(&verification.description),
        )
        .unwrap();
        writeln!(out, "{{").unwrap();
        for line in &verification.lines {
            let signed = if line.debit.is_positive() { line.debit } else { -line.credit };
            writeln!(out, "#TRANS {} {{}} {}", account_number_of(accounts, line.account_id), signed)
                .unwrap();
        }
        writeln!(out, "}}").unwrap();
    }

    out
}

fn account_number_of(accounts: &[Account], account_id: kontera_core::AccountId) -> String {
    accounts
        .iter()
        .find(|a| a.id == Some(account_id))
        .map(|a| a.number.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kontera_core::{AccountId, AccountType, CompanyId, FiscalYearId, Money, VerificationLine};

    #[test]
    fn emits_header_and_verification_block() {
        let company = Company {
            id: Some(CompanyId(1)),
            name: "Testbolaget AB".to_string(),
            org_number: "556123-4567".to_string(),
            accounting_standard: kontera_core::AccountingStandard::K2,
            fiscal_year_start_month: 1,
            contact_email: None,
        };
        let fy = FiscalYear {
            id: Some(FiscalYearId(1)),
            company_id: CompanyId(1),
            range: kontera_core::DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            ),
            is_closed: false,
        };
        let bank = Account {
            id: Some(AccountId(1)),
            company_id: CompanyId(1),
            number: "1930".to_string(),
            name: "Företagskonto".to_string(),
            account_type: AccountType::Asset,
            vat_code: None,
            is_active: true,
            opening_balance: Money::zero(),
        };
        let sales = Account {
            id: Some(AccountId(2)),
            company_id: CompanyId(1),
            number: "3010".to_string(),
            name: "Försäljning".to_string(),
            account_type: AccountType::Revenue,
            vat_code: None,
            is_active: true,
            opening_balance: Money::zero(),
        };
        let verification = Verification {
            id: None,
            company_id: CompanyId(1),
            fiscal_year_id: FiscalYearId(1),
            number: 1,
            transaction_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: "Kontantförsäljning".to_string(),
            lines: vec![
                VerificationLine::debit(AccountId(1), Money::from_ore(100000)),
                VerificationLine::credit(AccountId(2), Money::from_ore(100000)),
            ],
            created_at: None,
        };

        let text = emit(&company, &fy, &[bank, sales], &[verification]);

        assert!(text.contains("#FNAMN \"Testbolaget AB\""));
        assert!(text.contains("#RAR 0 20240101 20241231"));
        assert!(text.contains("#KONTO 1930 \"Företagskonto\""));
        assert!(text.contains("#VER A 1 20240115 \"Kontantförsäljning\""));
        assert!(text.contains("#TRANS 1930 {} 1000.00"));
        assert!(text.contains("#TRANS 3010 {} -1000.00"));
    }
}
