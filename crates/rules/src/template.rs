use kontera_core::{CompanyId, Money, VerificationLine};
use kontera_storage::{DbPool, LineKind, Side, Template, TemplateId, TemplateLine};
use rust_decimal::Decimal;

use crate::error::RuleError;

fn calculate_amount(kind: LineKind, total_amount: Money) -> Option<Money> {
    match kind {
        LineKind::Fixed(amount) => Some(amount),
        LineKind::Percentage(rate) => Some(total_amount.percentage(rate)),
        LineKind::Remainder => None,
    }
}

/// Resolves the one `Remainder` line's amount so the template's lines sum to
/// a balanced verification. The remainder is assigned `abs(running debit -
/// running credit)`; if that would come out negative (the fixed/percentage
/// lines alone already overshoot the balancing side), falls back to
/// `total_amount` minus what the other lines already account for.
fn resolve_remainder(fixed: &[(Side, Money)], remainder_side: Side, total_amount: Money) -> Money {
    let running_debit: Money = fixed.iter().filter(|(s, _)| *s == Side::Debit).map(|(_, m)| *m).sum();
    let running_credit: Money = fixed.iter().filter(|(s, _)| *s == Side::Credit).map(|(_, m)| *m).sum();

    let candidate = match remainder_side {
        Side::Debit => running_credit - running_debit,
        Side::Credit => running_debit - running_credit,
    };

    if candidate.is_negative() {
        let running_total: Money = fixed.iter().map(|(_, m)| *m).sum();
        total_amount - running_total
    } else {
        candidate
    }
}

/// Expands a template against one total amount into posting lines. Exactly
/// one `Remainder` line is expected; templates without one must already
/// balance on their own, or this returns [`RuleError::TemplateUnbalanced`].
pub fn apply_template(template: &Template, total_amount: Money) -> Result<Vec<VerificationLine>, RuleError> {
    let mut fixed = Vec::new();
    let mut remainder_line: Option<&TemplateLine> = None;

    for line in &template.lines {
        match calculate_amount(line.kind, total_amount) {
            Some(amount) => fixed.push((line.side, amount, line.account_id)),
            None if remainder_line.is_none() => remainder_line = Some(line),
            None => {
                return Err(RuleError::TemplateUnbalanced(
                    template.id.ok_or(RuleError::TemplateNotFound)?,
                ))
            }
        }
    }

    let fixed_amounts: Vec<(Side, Money)> = fixed.iter().map(|(s, m, _)| (*s, *m)).collect();

    let mut lines: Vec<VerificationLine> = fixed
        .iter()
        .map(|(side, amount, account_id)| match side {
            Side::Debit => VerificationLine::debit(*account_id, *amount),
            Side::Credit => VerificationLine::credit(*account_id, *amount),
        })
        .collect();

    match remainder_line {
        Some(line) => {
            let amount = resolve_remainder(&fixed_amounts, line.side, total_amount);
            lines.push(match line.side {
                Side::Debit => VerificationLine::debit(line.account_id, amount),
                Side::Credit => VerificationLine::credit(line.account_id, amount),
            });
        }
        None => {
            let debit: Money = lines.iter().map(|l| l.debit).sum();
            let credit: Money = lines.iter().map(|l| l.credit).sum();
            if debit != credit {
                return Err(RuleError::TemplateUnbalanced(template.id.ok_or(RuleError::TemplateNotFound)?));
            }
        }
    }

    Ok(lines)
}

struct StandardLine {
    account: &'static str,
    side: Side,
    kind: LineKind,
}

struct StandardTemplate {
    name: &'static str,
    category: &'static str,
    lines: &'static [StandardLine],
}

/// The built-in template catalog. Percentage rates are applied against the
/// verification's total amount, matching [`apply_template`].
fn standard_templates() -> Vec<StandardTemplate> {
    vec![
        StandardTemplate {
            name: "moms_25_inköp",
            category: "Moms",
            lines: &[
                StandardLine { account: "4000", side: Side::Debit, kind: LineKind::Percentage(Decimal::from(80)) },
                StandardLine { account: "2640", side: Side::Debit, kind: LineKind::Percentage(Decimal::from(20)) },
                StandardLine { account: "2440", side: Side::Credit, kind: LineKind::Remainder },
            ],
        },
        StandardTemplate {
            name: "moms_25_försäljning",
            category: "Moms",
            lines: &[
                StandardLine { account: "1510", side: Side::Debit, kind: LineKind::Remainder },
                StandardLine { account: "3000", side: Side::Credit, kind: LineKind::Percentage(Decimal::from(80)) },
                StandardLine { account: "2610", side: Side::Credit, kind: LineKind::Percentage(Decimal::from(20)) },
            ],
        },
        StandardTemplate {
            name: "lön_enkel",
            category: "Lön",
            lines: &[
                StandardLine { account: "7010", side: Side::Debit, kind: LineKind::Percentage(Decimal::from(100)) },
                StandardLine { account: "2710", side: Side::Credit, kind: LineKind::Percentage(Decimal::from(30)) },
                StandardLine { account: "1930", side: Side::Credit, kind: LineKind::Remainder },
            ],
        },
        StandardTemplate {
            name: "lön_komplett",
            category: "Lön",
            lines: &[
                StandardLine {
                    account: "7010",
                    side: Side::Debit,
                    kind: LineKind::Percentage(Decimal::from_str_exact("76.16").unwrap()),
                },
                StandardLine {
                    account: "7510",
                    side: Side::Debit,
                    kind: LineKind::Percentage(Decimal::from_str_exact("23.84").unwrap()),
                },
                StandardLine {
                    account: "2710",
                    side: Side::Credit,
                    kind: LineKind::Percentage(Decimal::from_str_exact("22.85").unwrap()),
                },
                StandardLine {
                    account: "2730",
                    side: Side::Credit,
                    kind: LineKind::Percentage(Decimal::from_str_exact("23.84").unwrap()),
                },
                StandardLine { account: "1930", side: Side::Credit, kind: LineKind::Remainder },
            ],
        },
        StandardTemplate {
            name: "hyra",
            category: "Lokalkostnader",
            lines: &[
                StandardLine { account: "5010", side: Side::Debit, kind: LineKind::Percentage(Decimal::from(100)) },
                StandardLine { account: "2440", side: Side::Credit, kind: LineKind::Remainder },
            ],
        },
        StandardTemplate {
            name: "kontant_inköp",
            category: "Inköp",
            lines: &[
                StandardLine { account: "4000", side: Side::Debit, kind: LineKind::Percentage(Decimal::from(80)) },
                StandardLine { account: "2640", side: Side::Debit, kind: LineKind::Percentage(Decimal::from(20)) },
                StandardLine { account: "1930", side: Side::Credit, kind: LineKind::Remainder },
            ],
        },
    ]
}

#[derive(Debug, Default, Clone)]
pub struct SeedStats {
    pub created: usize,
    pub skipped_existing: usize,
}

/// Seeds the standard template catalog for a company. A template whose name
/// already exists for the company is left untouched; a catalog line whose
/// account doesn't exist yet for the company is dropped from that template
/// rather than failing the whole seed.
pub async fn initialize_standard_templates(pool: &DbPool, company_id: CompanyId) -> Result<SeedStats, RuleError> {
    let mut stats = SeedStats::default();
    let existing: Vec<String> =
        kontera_storage::list_templates(pool, company_id).await?.into_iter().map(|t| t.name).collect();

    for catalog_entry in standard_templates() {
        if existing.contains(&catalog_entry.name.to_string()) {
            stats.skipped_existing += 1;
            continue;
        }

        let mut lines = Vec::new();
        for line in catalog_entry.lines {
            if let Some(account) = kontera_storage::get_account_by_number(pool, company_id, line.account).await? {
                lines.push(TemplateLine {
                    account_id: account.id.expect("fetched account always has an id"),
                    side: line.side,
                    kind: line.kind,
                });
            }
        }
        if lines.is_empty() {
            continue;
        }

        let template = Template {
            id: None,
            company_id,
            name: catalog_entry.name.to_string(),
            description: Some(catalog_entry.category.to_string()),
            lines,
        };
        kontera_storage::insert_template(pool, &template).await?;
        stats.created += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontera_core::{Account, AccountType, Company};

    async fn setup() -> (tempfile::TempDir, DbPool, CompanyId) {
        let dir = tempfile::tempdir().unwrap();
        let pool = kontera_storage::create_db(&dir.path().join("test.db")).await.unwrap();
        let company_id = kontera_storage::insert_company(&pool, &Company::new("Test AB", "556123-4567"))
            .await
            .unwrap();
        (dir, pool, company_id)
    }

    #[tokio::test]
    async fn percentage_lines_and_remainder_balance() {
        let (_dir, pool, company_id) = setup().await;
        let purchase = kontera_storage::insert_account(&pool, &Account::new(company_id, "4000", "Inköp", AccountType::Expense)).await.unwrap();
        let deductible_vat = kontera_storage::insert_account(&pool, &Account::new(company_id, "2640", "Ingående moms", AccountType::Asset)).await.unwrap();
        let payable = kontera_storage::insert_account(&pool, &Account::new(company_id, "2440", "Leverantörsskulder", AccountType::Liability)).await.unwrap();

        let template = Template {
            id: Some(TemplateId(1)),
            company_id,
            name: "moms_25_inköp".to_string(),
            description: None,
            lines: vec![
                TemplateLine { account_id: purchase, side: Side::Debit, kind: LineKind::Percentage(Decimal::from(80)) },
                TemplateLine { account_id: deductible_vat, side: Side::Debit, kind: LineKind::Percentage(Decimal::from(20)) },
                TemplateLine { account_id: payable, side: Side::Credit, kind: LineKind::Remainder },
            ],
        };

        let lines = apply_template(&template, Money::from_ore(100_000_00)).unwrap();

        let debit: Money = lines.iter().map(|l| l.debit).sum();
        let credit: Money = lines.iter().map(|l| l.credit).sum();
        assert_eq!(debit, credit);
        assert_eq!(debit, Money::from_ore(100_000_00));
    }

    #[test]
    fn a_second_remainder_line_is_rejected_not_dropped() {
        let template = Template {
            id: Some(TemplateId(7)),
            company_id: CompanyId(1),
            name: "malformed".to_string(),
            description: None,
            lines: vec![
                TemplateLine { account_id: kontera_core::AccountId(1), side: Side::Debit, kind: LineKind::Remainder },
                TemplateLine { account_id: kontera_core::AccountId(2), side: Side::Credit, kind: LineKind::Remainder },
            ],
        };

        let result = apply_template(&template, Money::from_ore(100_00));
        assert!(matches!(result, Err(RuleError::TemplateUnbalanced(TemplateId(7)))));
    }

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate_templates() {
        let (_dir, pool, company_id) = setup().await;
        for number_name in [
            ("4000", "Inköp", AccountType::Expense),
            ("2640", "Ingående moms", AccountType::Asset),
            ("2440", "Leverantörsskulder", AccountType::Liability),
            ("1510", "Kundfordringar", AccountType::Asset),
            ("3000", "Försäljning", AccountType::Revenue),
            ("2610", "Utgående moms", AccountType::Liability),
            ("7010", "Löner", AccountType::Expense),
            ("2710", "Personalens källskatt", AccountType::Liability),
            ("1930", "Företagskonto", AccountType::Asset),
            ("7510", "Arbetsgivaravgifter", AccountType::Expense),
            ("2730", "Arbetsgivaravgifter skuld", AccountType::Liability),
            ("5010", "Lokalhyra", AccountType::Expense),
        ] {
            let (number, name, account_type) = number_name;
            kontera_storage::insert_account(&pool, &Account::new(company_id, number, name, account_type)).await.unwrap();
        }

        let first = initialize_standard_templates(&pool, company_id).await.unwrap();
        let second = initialize_standard_templates(&pool, company_id).await.unwrap();

        assert_eq!(first.created, 6);
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped_existing, 6);
    }
}
