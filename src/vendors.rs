//! Vendor Pricing

use rust_decimal::Decimal;
use rusty_money::{Findable, iso::Currency};
use thiserror::Error;

use crate::{
    clusters::ClusterKey,
    keys::TypedKey,
    periods::BillingPeriod,
    pricing::{PricingMode, TierTable},
};

/// Marker for vendor identifiers.
#[derive(Debug)]
pub struct Vendor;

/// Vendor identifier.
pub type VendorId = TypedKey<Vendor>;

/// Errors raised while building vendor pricing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VendorPricingError {
    /// The currency code is not a known ISO 4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Look up an ISO 4217 currency by its alphabetic code.
///
/// # Errors
///
/// Returns [`VendorPricingError::UnknownCurrency`] when the code is not recognised.
pub fn currency(code: &str) -> Result<&'static Currency, VendorPricingError> {
    Currency::find(code.trim()).ok_or_else(|| VendorPricingError::UnknownCurrency(code.to_string()))
}

/// A candidate vendor contract for consolidating a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorPricing {
    /// Vendor identifier.
    pub vendor_id: VendorId,

    /// Vendor display name.
    pub vendor_name: String,

    /// Cluster this offer applies to.
    pub cluster_key: ClusterKey,

    /// How the tier table is applied.
    pub mode: PricingMode,

    /// Period the tier prices are quoted in.
    pub billing_period: BillingPeriod,

    /// Currency the tier prices are quoted in.
    pub currency: &'static Currency,

    /// Volume tiers, sorted and deduplicated.
    pub tiers: TierTable,
}

impl VendorPricing {
    /// Yearly cost of licensing `units` seats under this offer.
    pub fn licenses_year(&self, units: u64) -> Decimal {
        self.billing_period
            .to_year(self.tiers.cost(self.mode, units))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn finds_known_currencies() -> TestResult {
        assert_eq!(currency("EUR")?, EUR);
        assert_eq!(
            currency("XYZ"),
            Err(VendorPricingError::UnknownCurrency("XYZ".to_string()))
        );

        Ok(())
    }

    #[test]
    fn licenses_year_normalizes_monthly_quotes() {
        let pricing = VendorPricing {
            vendor_id: "figma".into(),
            vendor_name: "Figma".to_string(),
            cluster_key: "design".into(),
            mode: PricingMode::Piecewise,
            billing_period: BillingPeriod::Monthly,
            currency: EUR,
            tiers: TierTable::from_raw([
                (1, Decimal::from(600)),
                (50, Decimal::from(500)),
                (200, Decimal::from(400)),
            ]),
        };

        assert_eq!(pricing.licenses_year(100), Decimal::from(600_000));
        assert_eq!(pricing.licenses_year(0), Decimal::ZERO);
    }
}
