//! Consolidation Savings
//!
//! Compares what a cluster costs today with what it would cost on a single
//! consolidated vendor contract, switching costs included.

use rust_decimal::Decimal;

use crate::{
    clusters::Cluster,
    switching::SwitchingPolicy,
    vendors::{VendorId, VendorPricing},
};

/// Picks the vendor offer a cluster is consolidated onto.
pub trait VendorSelector {
    /// Return the chosen offer among `candidates`, or `None` when there is
    /// nothing to propose.
    fn select<'a>(&self, candidates: &'a [VendorPricing]) -> Option<&'a VendorPricing>;
}

/// Chooses the first candidate the data service listed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl VendorSelector for FirstCandidate {
    fn select<'a>(&self, candidates: &'a [VendorPricing]) -> Option<&'a VendorPricing> {
        candidates.first()
    }
}

/// Chooses the candidate offered by a specific vendor.
#[derive(Debug, Clone)]
pub struct ByVendorId(pub VendorId);

impl VendorSelector for ByVendorId {
    fn select<'a>(&self, candidates: &'a [VendorPricing]) -> Option<&'a VendorPricing> {
        candidates
            .iter()
            .find(|pricing| pricing.vendor_id == self.0)
    }
}

/// Cost of a proposed consolidation for a given seat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    /// Yearly license cost on the consolidated contract.
    pub licenses_year: Decimal,

    /// One-time switching cost.
    pub switch_year: Decimal,
}

impl Proposal {
    /// Price `units` seats on `pricing` and add switching costs.
    ///
    /// Without an offer the license cost is zero; switching costs still apply.
    pub fn for_units(
        pricing: Option<&VendorPricing>,
        units: u64,
        current_year: Decimal,
        policy: &SwitchingPolicy,
    ) -> Self {
        Self {
            licenses_year: pricing.map_or(Decimal::ZERO, |pricing| pricing.licenses_year(units)),
            switch_year: policy.switch_year(units, current_year),
        }
    }

    /// Licenses plus switching.
    pub fn proposed_year(&self) -> Decimal {
        self.licenses_year.saturating_add(self.switch_year)
    }

    /// What is saved compared to `current_year`, never below zero.
    pub fn saving(&self, current_year: Decimal) -> Decimal {
        current_year.saturating_sub(self.proposed_year()).max(Decimal::ZERO)
    }
}

/// Savings figures for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSavings<'a> {
    /// Yearly spend across the cluster today.
    pub current_year: Decimal,

    /// Seats across the cluster.
    pub total_units: u64,

    /// The offer the figures were computed against.
    pub chosen_pricing: Option<&'a VendorPricing>,

    /// Yearly license cost on the chosen offer.
    pub licenses_year: Decimal,

    /// One-time switching cost.
    pub switch_year: Decimal,

    /// Licenses plus switching.
    pub proposed_year: Decimal,

    /// `current_year - proposed_year`, floored at zero.
    pub saving: Decimal,

    /// Saving as percent points of `current_year`; zero when nothing is spent.
    pub saving_pct: Decimal,
}

impl<'a> ClusterSavings<'a> {
    /// Calculate savings for `cluster` against the offer picked by `selector`.
    pub fn calculate(
        cluster: &'a Cluster,
        selector: &(impl VendorSelector + ?Sized),
        policy: &SwitchingPolicy,
    ) -> Self {
        let current_year = cluster.current_year();
        let total_units = cluster.total_units();
        let chosen_pricing = selector.select(&cluster.candidate_pricing);
        let proposal = Proposal::for_units(chosen_pricing, total_units, current_year, policy);
        let saving = proposal.saving(current_year);

        Self {
            current_year,
            total_units,
            chosen_pricing,
            licenses_year: proposal.licenses_year,
            switch_year: proposal.switch_year,
            proposed_year: proposal.proposed_year(),
            saving,
            saving_pct: saving_pct(saving, current_year),
        }
    }
}

/// `saving / current_year * 100`, or zero when `current_year` is zero.
pub fn saving_pct(saving: Decimal, current_year: Decimal) -> Decimal {
    if current_year.is_zero() {
        return Decimal::ZERO;
    }

    saving / current_year * Decimal::ONE_HUNDRED
}
