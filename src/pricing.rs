//! Tiered Pricing
//!
//! Converts a seat count and a tier table into a cost. Results are in the
//! table's own billing period; callers normalize them afterwards.

use std::{collections::BTreeMap, fmt, str::FromStr};

use rust_decimal::Decimal;
use smallvec::SmallVec;
use thiserror::Error;

use crate::clusters::total_year;

/// Error returned when parsing an unknown pricing mode.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown pricing mode: {0}")]
pub struct UnknownPricingMode(pub String);

/// How a tier table is applied to a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PricingMode {
    /// The whole purchase is priced at the rate unlocked by the total volume.
    Piecewise,

    /// Each unit is priced at the rate of the band it falls in, like tax brackets.
    Progressive,
}

impl PricingMode {
    /// Wire/fixture spelling of the mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            PricingMode::Piecewise => "piecewise",
            PricingMode::Progressive => "progressive",
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingMode {
    type Err = UnknownPricingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "piecewise" => Ok(PricingMode::Piecewise),
            "progressive" => Ok(PricingMode::Progressive),
            _ => Err(UnknownPricingMode(s.to_string())),
        }
    }
}

/// A single volume tier: from `threshold_qty` seats upwards, each seat costs `unit_price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingTier {
    /// Seat count at which this tier starts.
    pub threshold_qty: u64,

    /// Price per seat within this tier.
    pub unit_price: Decimal,
}

impl PricingTier {
    /// Create a new tier.
    pub const fn new(threshold_qty: u64, unit_price: Decimal) -> Self {
        Self {
            threshold_qty,
            unit_price,
        }
    }
}

/// A tier table sorted ascending by threshold with unique thresholds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierTable {
    tiers: SmallVec<[PricingTier; 4]>,
}

impl TierTable {
    /// Build a table from raw `(threshold, unit price)` pairs in source order.
    ///
    /// Negative thresholds count as zero. When a threshold appears more than
    /// once, the later entry replaces the earlier one.
    pub fn from_raw(raw: impl IntoIterator<Item = (i64, Decimal)>) -> Self {
        raw.into_iter()
            .map(|(threshold, unit_price)| {
                PricingTier::new(u64::try_from(threshold).unwrap_or(0), unit_price)
            })
            .collect()
    }

    /// The tiers in ascending threshold order.
    pub fn tiers(&self) -> &[PricingTier] {
        &self.tiers
    }

    /// Whether the table has no tiers.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// The tier that prices the whole purchase under [`PricingMode::Piecewise`].
    ///
    /// That is the tier with the largest threshold not above `units`, or the
    /// lowest tier when `units` falls below every threshold.
    pub fn applicable_tier(&self, units: u64) -> Option<&PricingTier> {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.threshold_qty <= units)
            .or_else(|| self.tiers.first())
    }

    /// Cost of `units` seats under the given mode.
    pub fn cost(&self, mode: PricingMode, units: u64) -> Decimal {
        match mode {
            PricingMode::Piecewise => piecewise_cost(units, self),
            PricingMode::Progressive => progressive_cost(units, self),
        }
    }
}

impl FromIterator<PricingTier> for TierTable {
    fn from_iter<I: IntoIterator<Item = PricingTier>>(iter: I) -> Self {
        let by_threshold: BTreeMap<u64, Decimal> = iter
            .into_iter()
            .map(|tier| (tier.threshold_qty, tier.unit_price))
            .collect();

        Self {
            tiers: by_threshold
                .into_iter()
                .map(|(threshold_qty, unit_price)| PricingTier::new(threshold_qty, unit_price))
                .collect(),
        }
    }
}

/// Piecewise cost: every seat is charged at the single rate unlocked by the total volume.
pub fn piecewise_cost(units: u64, tiers: &TierTable) -> Decimal {
    if units == 0 {
        return Decimal::ZERO;
    }

    tiers
        .applicable_tier(units)
        .map_or(Decimal::ZERO, |tier| Decimal::from(units).saturating_mul(tier.unit_price))
}

/// Progressive cost: seats are charged band by band.
///
/// Band `k` covers `[threshold_k, threshold_{k+1} - 1]`; the last band runs
/// up to `units`. Bands entirely above `units` contribute nothing.
pub fn progressive_cost(units: u64, tiers: &TierTable) -> Decimal {
    if units == 0 {
        return Decimal::ZERO;
    }

    let ends = tiers
        .tiers()
        .iter()
        .skip(1)
        .map(|next| Some(next.threshold_qty.saturating_sub(1)))
        .chain(std::iter::once(None));

    let bands = tiers
        .tiers()
        .iter()
        .zip(ends)
        .map(|(tier, band_end)| {
            let upper = band_end.map_or(units, |end| end.min(units));

            if upper < tier.threshold_qty {
                return Decimal::ZERO;
            }

            let in_band = Decimal::from(upper - tier.threshold_qty) + Decimal::ONE;

            in_band.saturating_mul(tier.unit_price)
        });

    total_year(bands)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn table(raw: &[(i64, i64)]) -> TierTable {
        TierTable::from_raw(
            raw.iter()
                .map(|&(threshold, price)| (threshold, Decimal::from(price))),
        )
    }

    #[test]
    fn zero_units_cost_nothing() {
        let tiers = table(&[(0, 100), (50, 80)]);

        assert_eq!(piecewise_cost(0, &tiers), Decimal::ZERO);
        assert_eq!(progressive_cost(0, &tiers), Decimal::ZERO);
    }

    #[test]
    fn empty_tables_cost_nothing() {
        let tiers = TierTable::default();

        assert_eq!(piecewise_cost(10, &tiers), Decimal::ZERO);
        assert_eq!(progressive_cost(10, &tiers), Decimal::ZERO);
        assert!(tiers.is_empty());
    }

    #[test]
    fn progressive_charges_each_band_at_its_rate() {
        let tiers = table(&[(0, 100), (50, 80)]);

        // [0, 49] -> 50 x 100, [50, 70] -> 21 x 80
        assert_eq!(progressive_cost(70, &tiers), Decimal::from(6680));
    }

    #[test]
    fn piecewise_uses_the_rate_unlocked_by_volume() {
        let tiers = table(&[(0, 100), (50, 80)]);

        assert_eq!(piecewise_cost(70, &tiers), Decimal::from(5600));
        assert_eq!(piecewise_cost(49, &tiers), Decimal::from(4900));
    }

    #[test]
    fn piecewise_falls_back_to_lowest_tier_below_every_threshold() -> TestResult {
        let tiers = table(&[(10, 30), (100, 20)]);
        let tier = tiers.applicable_tier(5).ok_or("expected a tier")?;

        assert_eq!(tier.threshold_qty, 10);
        assert_eq!(piecewise_cost(5, &tiers), Decimal::from(150));

        Ok(())
    }

    #[test]
    fn progressive_bands_below_the_first_threshold_contribute_nothing() {
        let tiers = table(&[(10, 30), (100, 20)]);

        assert_eq!(progressive_cost(5, &tiers), Decimal::ZERO);
        // [10, 12] -> 3 x 30
        assert_eq!(progressive_cost(12, &tiers), Decimal::from(90));
    }

    #[test]
    fn huge_volumes_saturate() {
        let tiers = table(&[(0, i64::MAX), (10, i64::MAX)]);

        assert_eq!(piecewise_cost(u64::MAX, &tiers), Decimal::MAX);
        assert_eq!(progressive_cost(u64::MAX, &tiers), Decimal::MAX);
    }

    #[test]
    fn tables_are_sorted_and_deduplicated_last_write_wins() {
        let tiers = table(&[(200, 400), (1, 600), (50, 550), (50, 500)]);

        assert_eq!(
            tiers.tiers(),
            &[
                PricingTier::new(1, Decimal::from(600)),
                PricingTier::new(50, Decimal::from(500)),
                PricingTier::new(200, Decimal::from(400)),
            ]
        );
    }

    #[test]
    fn negative_thresholds_are_treated_as_zero() {
        let tiers = table(&[(-5, 90), (10, 70)]);

        assert_eq!(tiers.tiers().first().map(|t| t.threshold_qty), Some(0));
        assert_eq!(tiers.len(), 2);
    }

    #[test]
    fn costs_are_never_negative() {
        let tiers = table(&[(1, 600), (50, 500), (200, 400)]);

        for units in 0..400 {
            assert!(
                piecewise_cost(units, &tiers) >= Decimal::ZERO,
                "negative piecewise cost at {units}"
            );
            assert!(
                progressive_cost(units, &tiers) >= Decimal::ZERO,
                "negative progressive cost at {units}"
            );
        }
    }

    #[test]
    fn piecewise_is_monotonic_within_a_tier() {
        let tiers = table(&[(1, 600), (50, 500), (200, 400)]);

        for units in 1..400 {
            let crosses_threshold = tiers.tiers().iter().any(|t| t.threshold_qty == units);

            if !crosses_threshold {
                assert!(
                    piecewise_cost(units, &tiers) >= piecewise_cost(units - 1, &tiers),
                    "piecewise cost dropped at {units}"
                );
            }
        }
    }

    #[test]
    fn piecewise_is_monotonic_when_rates_never_drop() {
        let tiers = table(&[(0, 10), (5, 10), (20, 12)]);
        let mut previous = Decimal::ZERO;

        for units in 0..100 {
            let cost = piecewise_cost(units, &tiers);

            assert!(cost >= previous, "piecewise cost dropped at {units}");

            previous = cost;
        }
    }

    #[test]
    fn progressive_is_monotonic() {
        let tiers = table(&[(1, 600), (50, 500), (200, 400)]);
        let mut previous = Decimal::ZERO;

        for units in 0..400 {
            let cost = progressive_cost(units, &tiers);

            assert!(cost >= previous, "progressive cost dropped at {units}");

            previous = cost;
        }
    }

    #[test]
    fn mode_dispatches_to_matching_cost_function() {
        let tiers = table(&[(0, 100), (50, 80)]);

        assert_eq!(tiers.cost(PricingMode::Piecewise, 70), Decimal::from(5600));
        assert_eq!(tiers.cost(PricingMode::Progressive, 70), Decimal::from(6680));
    }

    #[test]
    fn parses_modes() -> TestResult {
        assert_eq!("Progressive".parse::<PricingMode>()?, PricingMode::Progressive);
        assert!("flat".parse::<PricingMode>().is_err());

        Ok(())
    }
}
