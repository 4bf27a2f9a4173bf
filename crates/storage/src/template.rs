use kontera_core::{AccountId, CompanyId, Money};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Debit,
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind {
    Fixed(Money),
    Percentage(Decimal),
    Remainder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateId(pub i64);

#[derive(Debug, Clone)]
pub struct TemplateLine {
    pub account_id: AccountId,
    pub side: Side,
    pub kind: LineKind,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub id: Option<TemplateId>,
    pub company_id: CompanyId,
    pub name: String,
    pub description: Option<String>,
    pub lines: Vec<TemplateLine>,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template must define at least two lines, got {0}")]
    TooFewLines(usize),

    #[error("template has {0} Remainder lines, at most one is allowed")]
    TooManyRemainders(usize),

    #[error("template has no Remainder line but its fixed/percentage lines do not balance")]
    Unbalanced,

    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}

impl Template {
    /// §4.7 definition-time validation: at least two lines, at most one
    /// Remainder, and if there is no Remainder the fixed/percentage lines
    /// must already balance for any total amount (their signed fixed
    /// amounts and signed percentage rates must each net to zero).
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.lines.len() < 2 {
            return Err(TemplateError::TooFewLines(self.lines.len()));
        }

        let remainder_count = self.lines.iter().filter(|l| l.kind == LineKind::Remainder).count();
        if remainder_count > 1 {
            return Err(TemplateError::TooManyRemainders(remainder_count));
        }

        if remainder_count == 0 {
            let mut fixed_signed = Money::zero();
            let mut percentage_signed = Decimal::ZERO;
            for line in &self.lines {
                match line.kind {
                    LineKind::Fixed(amount) => {
                        fixed_signed = match line.side {
                            Side::Debit => fixed_signed + amount,
                            Side::Credit => fixed_signed - amount,
                        };
                    }
                    LineKind::Percentage(rate) => {
                        percentage_signed += match line.side {
                            Side::Debit => rate,
                            Side::Credit => -rate,
                        };
                    }
                    LineKind::Remainder => unreachable!("counted above"),
                }
            }
            if !fixed_signed.is_zero() || !percentage_signed.is_zero() {
                return Err(TemplateError::Unbalanced);
            }
        }

        Ok(())
    }
}

fn side_to_str(s: Side) -> &'static str {
    match s {
        Side::Debit => "Debit",
        Side::Credit => "Credit",
    }
}

fn side_from_str(s: &str) -> Side {
    if s == "Credit" {
        Side::Credit
    } else {
        Side::Debit
    }
}

pub async fn insert_template(pool: &DbPool, template: &Template) -> Result<TemplateId, TemplateError> {
    template.validate()?;

    let mut tx = pool.begin().await?;

    let template_id = sqlx::query("INSERT INTO templates (company_id, name, description) VALUES (?, ?, ?)")
        .bind(template.company_id.0)
        .bind(&template.name)
        .bind(&template.description)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    for (order, line) in template.lines.iter().enumerate() {
        let (kind_str, fixed, pct) = match line.kind {
            LineKind::Fixed(amount) => ("Fixed", Some(amount.ore()), None),
            LineKind::Percentage(rate) => ("Percentage", None, Some(rate.to_string())),
            LineKind::Remainder => ("Remainder", None, None),
        };

        sqlx::query(
            "INSERT INTO template_lines (template_id, account_id, side, line_kind, fixed_amount_ore, percentage_rate, line_order) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(template_id)
        .bind(line.account_id.0)
        .bind(side_to_str(line.side))
        .bind(kind_str)
        .bind(fixed)
        .bind(pct)
        .bind(order as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(TemplateId(template_id))
}

pub async fn get_template(pool: &DbPool, id: TemplateId) -> Result<Option<Template>, sqlx::Error> {
    let header = sqlx::query_as::<_, (i64, i64, String, Option<String>)>(
        "SELECT id, company_id, name, description FROM templates WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    let Some((id, company_id, name, description)) = header else {
        return Ok(None);
    };

    let rows = sqlx::query_as::<_, (i64, String, String, Option<i64>, Option<String>)>(
        "SELECT account_id, side, line_kind, fixed_amount_ore, percentage_rate FROM template_lines WHERE template_id = ? ORDER BY line_order",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let lines = rows
        .into_iter()
        .map(|(account_id, side, kind, fixed, pct)| {
            let kind = match kind.as_str() {
                "Fixed" => LineKind::Fixed(Money::from_ore(fixed.unwrap_or(0))),
                "Percentage" => LineKind::Percentage(
                    pct.as_deref().and_then(|s| Decimal::from_str(s).ok()).unwrap_or_default(),
                ),
                _ => LineKind::Remainder,
            };
            TemplateLine { account_id: AccountId(account_id), side: side_from_str(&side), kind }
        })
        .collect();

    Ok(Some(Template { id: Some(TemplateId(id)), company_id: CompanyId(company_id), name, description, lines }))
}

pub async fn list_templates(pool: &DbPool, company_id: CompanyId) -> Result<Vec<Template>, sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM templates WHERE company_id = ? ORDER BY name")
        .bind(company_id.0)
        .fetch_all(pool)
        .await?;

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(t) = get_template(pool, TemplateId(id)).await? {
            out.push(t);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(lines: Vec<TemplateLine>) -> Template {
        Template { id: Some(TemplateId(1)), company_id: CompanyId(1), name: "t".to_string(), description: None, lines }
    }

    #[test]
    fn rejects_a_single_line_template() {
        let t = template(vec![TemplateLine { account_id: AccountId(1), side: Side::Debit, kind: LineKind::Remainder }]);
        assert!(matches!(t.validate(), Err(TemplateError::TooFewLines(1))));
    }

    #[test]
    fn rejects_two_remainder_lines() {
        let t = template(vec![
            TemplateLine { account_id: AccountId(1), side: Side::Debit, kind: LineKind::Remainder },
            TemplateLine { account_id: AccountId(2), side: Side::Credit, kind: LineKind::Remainder },
        ]);
        assert!(matches!(t.validate(), Err(TemplateError::TooManyRemainders(2))));
    }

    #[test]
    fn rejects_no_remainder_when_fixed_lines_do_not_balance() {
        let t = template(vec![
            TemplateLine { account_id: AccountId(1), side: Side::Debit, kind: LineKind::Fixed(Money::from_ore(1000)) },
            TemplateLine { account_id: AccountId(2), side: Side::Credit, kind: LineKind::Fixed(Money::from_ore(900)) },
        ]);
        assert!(matches!(t.validate(), Err(TemplateError::Unbalanced)));
    }

    #[test]
    fn accepts_no_remainder_when_percentage_lines_balance() {
        let t = template(vec![
            TemplateLine {
                account_id: AccountId(1),
                side: Side::Debit,
                kind: LineKind::Percentage(Decimal::from(100)),
            },
            TemplateLine {
                account_id: AccountId(2),
                side: Side::Credit,
                kind: LineKind::Percentage(Decimal::from(100)),
            },
        ]);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn accepts_a_single_remainder_with_unbalanced_fixed_lines() {
        let t = template(vec![
            TemplateLine { account_id: AccountId(1), side: Side::Debit, kind: LineKind::Fixed(Money::from_ore(1000)) },
            TemplateLine { account_id: AccountId(2), side: Side::Credit, kind: LineKind::Remainder },
        ]);
        assert!(t.validate().is_ok());
    }
}
