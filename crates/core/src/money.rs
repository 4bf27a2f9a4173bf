use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Exact fixed-scale (2 dp, öre) signed money. Stored as an integer count of
/// öre so every arithmetic operation is a checked i64 operation; Decimal only
/// appears at the parse/format boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(i64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("money amount overflowed")]
    Overflow,
    #[error("could not parse money amount: {0}")]
    Parse(String),
}

impl Money {
    pub const fn from_ore(ore: i64) -> Self {
        Money(ore)
    }

    pub fn zero() -> Self {
        Money(0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn ore(self) -> i64 {
        self.0
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, MoneyError> {
        self.0.checked_add(rhs.0).map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, MoneyError> {
        self.0.checked_sub(rhs.0).map(Money).ok_or(MoneyError::Overflow)
    }

    /// The signed balance formula used uniformly across every account class:
    /// `ob + debit - credit`. No per-class branch — see SPEC_FULL §4.2/§9.
    pub fn balance(opening: Money, debit: Money, credit: Money) -> Self {
        Money(opening.0 + debit.0 - credit.0)
    }

    /// Splits a total into `periods` equal shares at öre granularity, rounding
    /// each share to nearest even and letting the final share absorb whatever
    /// residue the rounding left behind.
    pub fn split_periods(self, periods: u32) -> Vec<Money> {
        assert!(periods > 0, "split_periods requires at least one period");
        let n = periods as i64;
        let share = self.divide_round_even(n);
        let mut shares = vec![share; (periods - 1) as usize];
        let booked: i64 = shares.iter().map(|m| m.0).sum();
        shares.push(Money(self.0 - booked));
        shares
    }

    /// Round-half-to-even integer division, `self / n`.
    fn divide_round_even(self, n: i64) -> Money {
        let a = self.0;
        let q = a / n;
        let r = a % n;
        if r == 0 {
            return Money(q);
        }
        let twice_r = r.abs() * 2;
        let n_abs = n.abs();
        let bump = match twice_r.cmp(&n_abs) {
            std::cmp::Ordering::Less => 0,
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Equal => (q.abs() % 2 != 0) as i64,
        };
        let signed_bump = if (a >= 0) == (n >= 0) { bump } else { -bump };
        Money(q + signed_bump)
    }

    /// `round2(self * rate / 100)`, used by template percentage lines.
    pub fn percentage(self, rate: Decimal) -> Self {
        let amount = Decimal::from(self.0) * rate / Decimal::from(100);
        Money(amount.round_dp(0).to_i64().unwrap_or(0))
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(100)
    }

    pub fn from_decimal(decimal: Decimal) -> Result<Self, MoneyError> {
        let ore = (decimal.round_dp(2) * Decimal::from(100))
            .to_i64()
            .ok_or(MoneyError::Overflow)?;
        Ok(Money(ore))
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Accepts either `,` or `.` as the decimal separator, and embedded
    /// whitespace in the integer part, per the SIE decimal grammar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let decimal =
            Decimal::from_str(&cleaned).map_err(|_| MoneyError::Parse(s.to_string()))?;
        Money::from_decimal(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.checked_add(rhs).expect("money addition overflow")
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.checked_sub(rhs).expect("money subtraction overflow")
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_and_dot_decimals() {
        assert_eq!("1250,50".parse::<Money>().unwrap(), Money::from_ore(125050));
        assert_eq!("1250.50".parse::<Money>().unwrap(), Money::from_ore(125050));
    }

    #[test]
    fn parses_embedded_whitespace() {
        assert_eq!("1 250.50".parse::<Money>().unwrap(), Money::from_ore(125050));
    }

    #[test]
    fn balance_formula_is_uniform() {
        let ob = Money::from_ore(-5000);
        let debit = Money::from_ore(2000);
        let credit = Money::from_ore(500);
        assert_eq!(Money::balance(ob, debit, credit), Money::from_ore(-3500));
    }

    #[test]
    fn split_periods_absorbs_residue_in_last_period() {
        let total = Money::from_ore(10000); // 100.00 kr
        let shares = total.split_periods(3);
        assert_eq!(shares, vec![
            Money::from_ore(3333),
            Money::from_ore(3333),
            Money::from_ore(3334),
        ]);
        let sum: Money = shares.into_iter().sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn split_periods_divides_evenly() {
        let total = Money::from_ore(120000);
        let shares = total.split_periods(12);
        assert!(shares.iter().all(|m| *m == Money::from_ore(10000)));
    }

    #[test]
    fn percentage_rounds_to_nearest_ore() {
        let total = Money::from_ore(100000); // 1000.00 kr
        let vat = total.percentage(Decimal::from(25));
        assert_eq!(vat, Money::from_ore(25000));
    }
}
