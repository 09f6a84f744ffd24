//! Seatwise prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    assembly::{
        AssemblyError, ClusterSession, FetchOutcome, FetchRequest, Notification, PendingFetch,
        Phase, Resolution,
    },
    clusters::{AppDetail, AppId, AppInCluster, Cluster, ClusterKey, Company, SubsidiaryCode},
    fixtures::{Fixture, FixtureError},
    periods::BillingPeriod,
    pricing::{PricingMode, PricingTier, TierTable, piecewise_cost, progressive_cost},
    report::{ReportError, SavingsReport, write_session},
    savings::{ByVendorId, ClusterSavings, FirstCandidate, Proposal, VendorSelector},
    summary::ClusterSummary,
    switching::SwitchingPolicy,
    vendors::{VendorId, VendorPricing, VendorPricingError},
};
