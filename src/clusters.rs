//! Clusters
//!
//! A cluster groups applications that do the same job, possibly bought from
//! different vendors by different subsidiaries.

use rust_decimal::Decimal;

use crate::{
    keys::TypedKey,
    periods::BillingPeriod,
    vendors::{VendorId, VendorPricing},
};

/// Cluster identifier.
pub type ClusterKey = TypedKey<Cluster>;

/// Application identifier.
pub type AppId = TypedKey<AppInCluster>;

/// Subsidiary (company) code.
pub type SubsidiaryCode = TypedKey<Company>;

/// A subsidiary known to the data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    /// Company code, used as the subsidiary filter.
    pub code: SubsidiaryCode,

    /// Display name.
    pub name: String,
}

/// Per-subsidiary licensing of one application.
#[derive(Debug, Clone, PartialEq)]
pub struct AppDetail {
    /// Application the row belongs to.
    pub app_id: AppId,

    /// Subsidiary holding the licenses.
    pub subsidiary: SubsidiaryCode,

    /// Seats held by the subsidiary.
    pub users: u64,

    /// Price per seat per billing period.
    pub price_per_seat: Decimal,

    /// Period the seat price is charged in.
    pub billing_period: BillingPeriod,

    /// Yearly cost reported by the data service.
    pub cost_year: Decimal,
}

impl AppDetail {
    /// Yearly cost of the row, recomputed from seats and seat price.
    pub fn current_year(&self) -> Decimal {
        seats_year(self.users, self.price_per_seat, self.billing_period)
    }
}

/// An application in a cluster, aggregated across subsidiaries.
#[derive(Debug, Clone, PartialEq)]
pub struct AppInCluster {
    /// Application identifier.
    pub app_id: AppId,

    /// Display name.
    pub name: String,

    /// Current vendor.
    pub vendor_id: VendorId,

    /// Current vendor display name.
    pub vendor_name: String,

    /// Seats across every subsidiary.
    pub users: u64,

    /// Price per seat per billing period.
    pub price_per_seat: Decimal,

    /// Period the seat price is charged in.
    pub billing_period: BillingPeriod,

    /// Subsidiaries using the application.
    pub subsidiaries: Vec<SubsidiaryCode>,

    /// Per-subsidiary breakdown, when the data service supplied one.
    pub details: Vec<AppDetail>,
}

impl AppInCluster {
    /// Yearly cost of the application across the cluster.
    pub fn current_year(&self) -> Decimal {
        seats_year(self.users, self.price_per_seat, self.billing_period)
    }
}

/// A group of functionally overlapping applications.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Unique cluster key.
    pub key: ClusterKey,

    /// Display name.
    pub name: String,

    /// What the cluster's applications have in common.
    pub description: String,

    /// Features shared by every application in the cluster.
    pub common_features: Vec<String>,

    /// Applications in the cluster.
    pub apps: Vec<AppInCluster>,

    /// Candidate consolidated contracts, in the order the data service listed them.
    pub candidate_pricing: Vec<VendorPricing>,

    /// Every subsidiary with any application in the cluster.
    pub subsidiaries: Vec<SubsidiaryCode>,
}

impl Cluster {
    /// Find an application by id.
    pub fn app(&self, app_id: &AppId) -> Option<&AppInCluster> {
        self.apps.iter().find(|app| &app.app_id == app_id)
    }

    /// Yearly spend across every application.
    pub fn current_year(&self) -> Decimal {
        total_year(self.apps.iter().map(AppInCluster::current_year))
    }

    /// Seats across every application.
    pub fn total_units(&self) -> u64 {
        total_units(self.apps.iter().map(|app| app.users))
    }
}

/// Yearly cost of `users` seats at `price_per_seat` per `period`.
pub fn seats_year(users: u64, price_per_seat: Decimal, period: BillingPeriod) -> Decimal {
    Decimal::from(users).saturating_mul(period.to_year(price_per_seat))
}

/// Sum of yearly amounts, saturating at [`Decimal::MAX`].
pub fn total_year(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Sum of seat counts, saturating at [`u64::MAX`].
pub fn total_units(units: impl IntoIterator<Item = u64>) -> u64 {
    units.into_iter().fold(0, u64::saturating_add)
}

/// Seat count from a signed source value; negative counts are treated as zero.
pub fn clamp_quantity(quantity: i64) -> u64 {
    u64::try_from(quantity).unwrap_or(0)
}
