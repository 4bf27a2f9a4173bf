use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::account::CompanyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearId(pub i64);

/// A contiguous 1-24 month date range owned by a company. The range is
/// inclusive at both ends and never half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        assert!(start <= end, "date range start must not be after end");
        DateRange { start, end }
    }

    pub fn start(self) -> NaiveDate {
        self.start
    }

    pub fn end(self) -> NaiveDate {
        self.end
    }

    /// A date lies *in* the range iff start <= date <= end.
    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalYear {
    pub id: Option<FiscalYearId>,
    pub company_id: CompanyId,
    pub range: DateRange,
    pub is_closed: bool,
}

impl FiscalYear {
    pub fn new(company_id: CompanyId, start: NaiveDate, end: NaiveDate) -> Self {
        FiscalYear {
            id: None,
            company_id,
            range: DateRange::new(start, end),
            is_closed: false,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range.contains(date)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.range.start()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.range.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_is_inclusive_at_both_ends() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }
}
