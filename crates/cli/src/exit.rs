use kontera_ledger::LedgerError;
use kontera_rules::RuleError;
use kontera_sie::SieError;

/// Maps a crate-level error onto the five-code convention every subcommand
/// exits with: 0 ok, 2 validation, 3 store unavailable, 4 format/parse, 5
/// closed-year violation. Anything this function doesn't recognize (an
/// `anyhow` context error, an I/O error opening the database file) exits 1.
pub fn code_for(err: &anyhow::Error) -> i32 {
    if let Some(ledger_err) = err.downcast_ref::<LedgerError>() {
        return ledger_exit(ledger_err);
    }
    if let Some(sie_err) = err.downcast_ref::<SieError>() {
        return sie_exit(sie_err);
    }
    if let Some(rule_err) = err.downcast_ref::<RuleError>() {
        return rule_exit(rule_err);
    }
    if err.downcast_ref::<sqlx::Error>().is_some() {
        return 3;
    }
    1
}

fn ledger_exit(err: &LedgerError) -> i32 {
    match err {
        LedgerError::ClosedYear(_) => 5,
        LedgerError::Balance(_, _)
        | LedgerError::EmptyVerification
        | LedgerError::Account(_)
        | LedgerError::Period { .. }
        | LedgerError::VerificationNotFound(_)
        | LedgerError::NotFound => 2,
        LedgerError::Store(_) => 3,
    }
}

fn sie_exit(err: &SieError) -> i32 {
    match err {
        SieError::NoCompany => 2,
        SieError::Parse { .. } => 4,
        SieError::Store(_) => 3,
        SieError::Ledger(inner) => ledger_exit(inner),
    }
}

fn rule_exit(err: &RuleError) -> i32 {
    match err {
        RuleError::AssetNotFound | RuleError::AccrualNotFound | RuleError::TemplateNotFound => 2,
        RuleError::TemplateUnbalanced(_) | RuleError::TemplateInvalid(_) => 2,
        RuleError::Store(_) => 3,
        RuleError::Ledger(inner) => ledger_exit(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_sie_parse_error_exits_with_format_code() {
        let err: anyhow::Error = SieError::Parse { line: 3, tag: "VER".to_string() }.into();
        assert_eq!(code_for(&err), 4);
    }

    #[test]
    fn a_closed_year_violation_exits_with_closed_year_code() {
        let err: anyhow::Error = LedgerError::ClosedYear(kontera_core::FiscalYearId(1)).into();
        assert_eq!(code_for(&err), 5);
    }
}
