use std::collections::HashMap;

use chrono::NaiveDate;
use kontera_core::Money;

use crate::cp437;
use crate::error::SieError;

/// An account definition read from `#KONTO`.
#[derive(Debug, Clone)]
pub struct SieAccount {
    pub number: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SieVerificationLine {
    pub account_number: String,
    pub debit: Money,
    pub credit: Money,
}

#[derive(Debug, Clone)]
pub struct SieVerification {
    pub number: i64,
    pub date: NaiveDate,
    pub description: String,
    pub lines: Vec<SieVerificationLine>,
}

/// Everything recovered from one SIE4 file. The parser is tolerant of most
/// lines it cannot make sense of — they are dropped, not errors — except a
/// structurally malformed `#VER` header, which aborts the parse.
#[derive(Debug, Clone, Default)]
pub struct SieData {
    pub company_name: Option<String>,
    pub org_number: Option<String>,
    pub fiscal_year_start: Option<NaiveDate>,
    pub fiscal_year_end: Option<NaiveDate>,
    pub accounts: Vec<SieAccount>,
    pub opening_balances: HashMap<String, Money>,
    pub verifications: Vec<SieVerification>,
}

/// Decodes file bytes as UTF-8 when valid, otherwise as CP437 (the legacy
/// encoding SIE4 files commonly use). CP437 maps every byte, so this never
/// fails — genuinely undecodable input does not occur for this codec.
pub fn decode(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    cp437::decode(bytes)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<SieData, SieError> {
    parse(&decode(bytes))
}

/// Parses SIE4 text into [`SieData`]. Unknown tags are skipped; a `#VER`
/// header that fails to parse is a structural failure and aborts the parse
/// with [`SieError::Parse`] — everything else about a malformed occurrence
/// of a known tag is tolerated and the line is dropped.
pub fn parse(content: &str) -> Result<SieData, SieError> {
    let mut data = SieData::default();
    let mut current: Option<SieVerification> = None;

    for (line_no, raw_line) in content.replace("\r\n", "\n").replace('\r', "\n").lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if line.starts_with("#FNAMN") {
            parse_company_name(line, &mut data);
        } else if line.starts_with("#ORGNR") {
            parse_org_number(line, &mut data);
        } else if line.starts_with("#RAR") {
            parse_fiscal_year(line, &mut data);
        } else if line.starts_with("#KONTO") {
            parse_account(line, &mut data);
        } else if line.starts_with("#IB") {
            parse_opening_balance(line, &mut data);
        } else if line.starts_with("#VER") {
            current = Some(parse_verification_header(line).ok_or_else(|| SieError::Parse {
                line: line_no + 1,
                tag: "VER".to_string(),
            })?);
        } else if line.starts_with("#TRANS") {
            if let Some(ver) = current.as_mut() {
                parse_transaction_line(line, ver);
            }
        } else if line.starts_with('}') {
            if let Some(ver) = current.take() {
                if !ver.lines.is_empty() {
                    data.verifications.push(ver);
                }
            }
        }
        // '{' and anything else (including #FLAGGA, #PROGRAM, #GEN, ...) is
        // structurally inert for this importer's purposes.
    }

    if let Some(ver) = current.take() {
        if !ver.lines.is_empty() {
            data.verifications.push(ver);
        }
    }

    Ok(data)
}

fn quoted_field(line: &str) -> Option<&str> {
    let parts: Vec<&str> = line.splitn(3, '"').collect();
    parts.get(1).copied()
}

fn parse_company_name(line: &str, data: &mut SieData) {
    if let Some(name) = quoted_field(line) {
        data.company_name = Some(name.to_string());
    }
}

fn parse_org_number(line: &str, data: &mut SieData) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() >= 2 {
        data.org_number = Some(parts[1].trim_matches('"').to_string());
    }
}

fn parse_fiscal_year(line: &str, data: &mut SieData) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return;
    }
    if let (Some(start), Some(end)) = (parse_sie_date(parts[2]), parse_sie_date(parts[3])) {
        data.fiscal_year_start = Some(start);
        data.fiscal_year_end = Some(end);
    }
}

fn parse_account(line: &str, data: &mut SieData) {
    let parts: Vec<&str> = line.splitn(2, '"').collect();
    if parts.len() < 2 {
        return;
    }
    let number = parts[0].trim_start_matches("#KONTO").trim().to_string();
    let name = parts[1].trim_end_matches('"').to_string();
    if !number.is_empty() {
        data.accounts.push(SieAccount { number, name });
    }
}

fn parse_opening_balance(line: &str, data: &mut SieData) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return;
    }
    if let Ok(amount) = parts[3].parse::<Money>() {
        data.opening_balances.insert(parts[2].to_string(), amount);
    }
}

fn parse_verification_header(line: &str) -> Option<SieVerification> {
    let parts: Vec<&str> = line.splitn(2, '"').collect();
    let head = parts[0].trim_start_matches("#VER").trim();
    let tokens: Vec<&str> = head.split_whitespace().collect();

    let (number, date) = if tokens.len() >= 3 {
        let number = tokens[1].parse::<i64>().ok()?;
        let date = parse_sie_date(tokens[2])?;
        (number, date)
    } else {
        return None;
    };

    let description = parts
        .get(1)
        .map(|d| d.trim_end_matches('"').to_string())
        .unwrap_or_else(|| "Importerad".to_string());

    Some(SieVerification { number, date, description, lines: Vec::new() })
}

fn parse_transaction_line(line: &str, verification: &mut SieVerification) {
    let rest = line.trim_start_matches("#TRANS").trim();
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() < 3 {
        return;
    }

    let account_number = tokens[0].to_string();
    let Ok(amount) = tokens[tokens.len() - 1].parse::<Money>() else { return };

    let (debit, credit) = if amount.is_negative() {
        (Money::zero(), amount.abs())
    } else {
        (amount, Money::zero())
    };

    verification.lines.push(SieVerificationLine { account_number, debit, credit });
}

/// `YYYYMMDD` primary; falls back to `YYMMDD` with the century chosen so the
/// resulting year does not exceed `reference_year + 1` (otherwise subtract
/// 100 from the naive `20yy` guess).
pub fn parse_sie_date(s: &str) -> Option<NaiveDate> {
    parse_sie_date_with_reference(s, current_year())
}

pub fn parse_sie_date_with_reference(s: &str, reference_year: i32) -> Option<NaiveDate> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();

    if digits.len() >= 8 {
        let y: i32 = digits[0..4].parse().ok()?;
        let m: u32 = digits[4..6].parse().ok()?;
        let d: u32 = digits[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if digits.len() == 6 {
        let yy: i32 = digits[0..2].parse().ok()?;
        let m: u32 = digits[2..4].parse().ok()?;
        let d: u32 = digits[4..6].parse().ok()?;
        let mut year = 2000 + yy;
        if year > reference_year + 1 {
            year -= 100;
        }
        return NaiveDate::from_ymd_opt(year, m, d);
    }

    None
}

fn current_year() -> i32 {
    chrono::Local::now().date_naive().format("%Y").to_string().parse().unwrap_or(2000)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
#FLAGGA 0
#FNAMN "Testbolaget AB"
#ORGNR 556123-4567
#RAR 0 20240101 20241231
#KONTO 1930 "Företagskonto"
#KONTO 3010 "Försäljning"
#IB 0 1930 50000.00
#VER A 1 20240115 "Kontantförsäljning"
{
#TRANS 1930 {} 1000.00
#TRANS 3010 {} -1000.00
}
"#;

    #[test]
    fn parses_header_fields() {
        let data = parse(SAMPLE).unwrap();
        assert_eq!(data.company_name.as_deref(), Some("Testbolaget AB"));
        assert_eq!(data.org_number.as_deref(), Some("556123-4567"));
        assert_eq!(data.fiscal_year_start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(data.fiscal_year_end, NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn parses_accounts_and_opening_balances() {
        let data = parse(SAMPLE).unwrap();
        assert_eq!(data.accounts.len(), 2);
        assert_eq!(data.accounts[0].number, "1930");
        assert_eq!(data.opening_balances[&"1930".to_string()], Money::from_ore(5_000_000));
    }

    #[test]
    fn parses_verification_with_signed_transaction_lines() {
        let data = parse(SAMPLE).unwrap();
        assert_eq!(data.verifications.len(), 1);
        let ver = &data.verifications[0];
        assert_eq!(ver.number, 1);
        assert_eq!(ver.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(ver.lines.len(), 2);
        assert_eq!(ver.lines[0].debit, Money::from_ore(100000));
        assert_eq!(ver.lines[1].credit, Money::from_ore(100000));
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let content = "#FLAGGA 0\n#UNKNOWNTAG whatever\n#FNAMN \"X\"\n";
        let data = parse(content).unwrap();
        assert_eq!(data.company_name.as_deref(), Some("X"));
    }

    #[test]
    fn unterminated_verification_block_is_flushed_at_eof() {
        let content = "#VER A 1 20240115 \"No closing brace\"\n#TRANS 1930 {} 100.00\n#TRANS 3010 {} -100.00\n";
        let data = parse(content).unwrap();
        assert_eq!(data.verifications.len(), 1);
    }

    #[test]
    fn malformed_ver_header_is_a_parse_error() {
        let content = "#FNAMN \"X\"\n#VER A\n#TRANS 1930 {} 100.00\n}\n";
        let err = parse(content).unwrap_err();
        assert!(matches!(err, SieError::Parse { line: 2, ref tag } if tag == "VER"));
    }

    #[test]
    fn yymmdd_fallback_infers_century() {
        assert_eq!(
            parse_sie_date_with_reference("240115", 2024),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(
            parse_sie_date_with_reference("990615", 2024),
            NaiveDate::from_ymd_opt(1999, 6, 15)
        );
    }
}
