//! Cluster Summary

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;

use crate::{
    clusters::{AppDetail, Cluster, total_units, total_year},
    savings::Proposal,
    switching::SwitchingPolicy,
    vendors::VendorPricing,
};

/// Headline figures for a cluster view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClusterSummary {
    /// Distinct applications counted.
    pub tools: usize,

    /// Seats counted.
    pub total_users: u64,

    /// Yearly spend of the counted seats.
    pub current_cost: Decimal,

    /// Saving from consolidating the counted seats, floored at zero.
    pub consolidation_potential: Decimal,
}

impl ClusterSummary {
    /// Summarise materialized detail rows only.
    pub fn from_rows(
        rows: &[AppDetail],
        pricing: Option<&VendorPricing>,
        policy: &SwitchingPolicy,
    ) -> Self {
        let tools = rows
            .iter()
            .map(|row| &row.app_id)
            .collect::<FxHashSet<_>>()
            .len();

        let total_users = total_units(rows.iter().map(|row| row.users));
        let current_cost = total_year(rows.iter().map(AppDetail::current_year));

        Self::with_potential(tools, total_users, current_cost, pricing, policy)
    }

    /// Summarise cluster-level aggregates, for views where no application is selected.
    pub fn from_cluster(
        cluster: &Cluster,
        pricing: Option<&VendorPricing>,
        policy: &SwitchingPolicy,
    ) -> Self {
        Self::with_potential(
            cluster.apps.len(),
            cluster.total_units(),
            cluster.current_year(),
            pricing,
            policy,
        )
    }

    fn with_potential(
        tools: usize,
        total_users: u64,
        current_cost: Decimal,
        pricing: Option<&VendorPricing>,
        policy: &SwitchingPolicy,
    ) -> Self {
        let proposal = Proposal::for_units(pricing, total_users, current_cost, policy);

        Self {
            tools,
            total_users,
            current_cost,
            consolidation_potential: proposal.saving(current_cost),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;

    use crate::{
        periods::BillingPeriod,
        pricing::{PricingMode, TierTable},
    };

    use super::*;

    fn row(app: &str, subsidiary: &str, users: u64, price: i64) -> AppDetail {
        AppDetail {
            app_id: app.into(),
            subsidiary: subsidiary.into(),
            users,
            price_per_seat: Decimal::from(price),
            billing_period: BillingPeriod::Monthly,
            cost_year: Decimal::from(price) * Decimal::from(users) * Decimal::from(12),
        }
    }

    fn offer() -> VendorPricing {
        VendorPricing {
            vendor_id: "figma".into(),
            vendor_name: "Figma".to_string(),
            cluster_key: "design".into(),
            mode: PricingMode::Piecewise,
            billing_period: BillingPeriod::Monthly,
            currency: USD,
            tiers: TierTable::from_raw([(1, Decimal::from(10))]),
        }
    }

    #[test]
    fn summarises_rows() {
        let rows = [row("sketch", "DE01", 10, 20), row("sketch", "FR02", 5, 20)];
        let summary = ClusterSummary::from_rows(&rows, Some(&offer()), &SwitchingPolicy::default());

        assert_eq!(summary.tools, 1);
        assert_eq!(summary.total_users, 15);
        assert_eq!(summary.current_cost, Decimal::from(3600));
        // 15 seats x 10 x 12 on the offer
        assert_eq!(summary.consolidation_potential, Decimal::from(1800));
    }

    #[test]
    fn empty_rows_summarise_to_zero() {
        let summary = ClusterSummary::from_rows(&[], Some(&offer()), &SwitchingPolicy::default());

        assert_eq!(summary, ClusterSummary::default());
    }

    #[test]
    fn potential_is_floored_at_zero() {
        let rows = [row("sketch", "DE01", 10, 1)];
        let summary = ClusterSummary::from_rows(&rows, Some(&offer()), &SwitchingPolicy::default());

        assert_eq!(summary.consolidation_potential, Decimal::ZERO);
    }
}
