//! Billing Periods
//!
//! Everything the engine compares is first brought onto a yearly footing, so
//! an app billed per month and a vendor quoting per year line up.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use thiserror::Error;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Error returned when parsing an unknown billing period.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown billing period: {0}")]
pub struct UnknownBillingPeriod(pub String);

/// How often a price is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BillingPeriod {
    /// Charged every month.
    Monthly,

    /// Charged once a year.
    #[default]
    Yearly,
}

impl BillingPeriod {
    /// Convert an amount charged per period into the yearly amount.
    pub fn to_year(self, amount: Decimal) -> Decimal {
        match self {
            BillingPeriod::Monthly => amount.saturating_mul(MONTHS_PER_YEAR),
            BillingPeriod::Yearly => amount,
        }
    }

    /// Convert a yearly amount back into the amount charged per period.
    pub fn from_year(self, amount_year: Decimal) -> Decimal {
        match self {
            BillingPeriod::Monthly => amount_year / MONTHS_PER_YEAR,
            BillingPeriod::Yearly => amount_year,
        }
    }

    /// Wire/fixture spelling of the period.
    pub const fn as_str(self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingPeriod {
    type Err = UnknownBillingPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Ok(BillingPeriod::Monthly),
            "yearly" | "year" | "annual" | "annually" => Ok(BillingPeriod::Yearly),
            _ => Err(UnknownBillingPeriod(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn monthly_amounts_are_multiplied_by_twelve() {
        assert_eq!(
            BillingPeriod::Monthly.to_year(Decimal::from(1000)),
            Decimal::from(12_000)
        );
    }

    #[test]
    fn yearly_amounts_are_unchanged() {
        assert_eq!(
            BillingPeriod::Yearly.to_year(Decimal::from(1000)),
            Decimal::from(1000)
        );
        assert_eq!(
            BillingPeriod::Yearly.from_year(Decimal::from(1000)),
            Decimal::from(1000)
        );
    }

    #[test]
    fn from_year_inverts_to_year() {
        let amounts = [
            Decimal::ZERO,
            Decimal::from(1000),
            Decimal::new(4_599, 2),
            Decimal::new(1, 3),
        ];

        for period in [BillingPeriod::Monthly, BillingPeriod::Yearly] {
            for amount in amounts {
                assert_eq!(
                    period.from_year(period.to_year(amount)),
                    amount,
                    "round trip through {period} changed {amount}"
                );
            }
        }

        assert_eq!(
            BillingPeriod::Monthly.from_year(Decimal::from(12_000)),
            Decimal::from(1000)
        );
    }

    #[test]
    fn parses_wire_spellings() -> TestResult {
        assert_eq!("monthly".parse::<BillingPeriod>()?, BillingPeriod::Monthly);
        assert_eq!(" Yearly ".parse::<BillingPeriod>()?, BillingPeriod::Yearly);
        assert_eq!(
            "weekly".parse::<BillingPeriod>(),
            Err(UnknownBillingPeriod("weekly".to_string()))
        );

        Ok(())
    }
}
