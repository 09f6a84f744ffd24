//! Cluster Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    clusters::{AppDetail, AppId, AppInCluster, Cluster, ClusterKey, clamp_quantity, seats_year},
    fixtures::FixtureError,
    periods::BillingPeriod,
    pricing::{PricingMode, TierTable},
    switching::SwitchingPolicy,
    vendors::{VendorPricing, currency},
};

/// Top-level fixture document.
#[derive(Debug, Deserialize)]
pub struct ClustersFixture {
    /// Switching policy; every cost defaults to zero.
    #[serde(default)]
    pub policy: PolicyFixture,

    /// Known companies.
    #[serde(default)]
    pub companies: Vec<CompanyFixture>,

    /// Clusters.
    #[serde(default)]
    pub clusters: Vec<ClusterFixture>,
}

/// Switching policy fixture.
#[derive(Debug, Default, Deserialize)]
pub struct PolicyFixture {
    /// Training cost per migrated user.
    #[serde(default)]
    pub training_cost_per_user: Decimal,

    /// Flat migration cost.
    #[serde(default)]
    pub migration_flat_cost: Decimal,

    /// Contract break penalty as a fraction of current spend.
    #[serde(default)]
    pub early_termination_penalty_rate: Decimal,
}

impl From<PolicyFixture> for SwitchingPolicy {
    fn from(policy: PolicyFixture) -> Self {
        SwitchingPolicy::new(
            policy.training_cost_per_user,
            policy.migration_flat_cost,
            policy.early_termination_penalty_rate,
        )
    }
}

/// Company fixture.
#[derive(Debug, Deserialize)]
pub struct CompanyFixture {
    /// Company code.
    pub code: String,

    /// Display name.
    pub name: String,
}

/// Cluster fixture.
#[derive(Debug, Deserialize)]
pub struct ClusterFixture {
    /// Unique key.
    pub key: String,

    /// Display name.
    pub name: String,

    /// Description.
    #[serde(default)]
    pub description: String,

    /// Shared features.
    #[serde(default)]
    pub common_features: Vec<String>,

    /// Subsidiaries with any app in the cluster.
    #[serde(default)]
    pub subsidiaries: Vec<String>,

    /// Applications.
    #[serde(default)]
    pub apps: Vec<AppFixture>,

    /// Candidate vendor offers.
    #[serde(default)]
    pub pricing: Vec<PricingFixture>,
}

impl ClusterFixture {
    pub(crate) fn try_into_cluster(self) -> Result<Cluster, FixtureError> {
        let key = ClusterKey::from(self.key);

        let apps = self
            .apps
            .into_iter()
            .map(AppFixture::try_into_app)
            .collect::<Result<Vec<_>, _>>()?;

        let candidate_pricing = self
            .pricing
            .into_iter()
            .map(|pricing| pricing.try_into_pricing(&key))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cluster {
            key,
            name: self.name,
            description: self.description,
            common_features: self.common_features,
            apps,
            candidate_pricing,
            subsidiaries: self.subsidiaries.into_iter().map(Into::into).collect(),
        })
    }
}

/// Application fixture.
#[derive(Debug, Deserialize)]
pub struct AppFixture {
    /// Application id.
    pub app_id: String,

    /// Display name.
    pub name: String,

    /// Current vendor id.
    #[serde(default)]
    pub vendor_id: String,

    /// Current vendor name.
    #[serde(default)]
    pub vendor_name: String,

    /// Seats across the cluster.
    pub users: i64,

    /// Price per seat.
    pub price_per_seat: Decimal,

    /// Billing period of the seat price.
    pub billing_period: String,

    /// Subsidiaries using the app.
    #[serde(default)]
    pub subsidiaries: Vec<String>,

    /// Per-subsidiary rows.
    #[serde(default)]
    pub details: Vec<DetailFixture>,
}

impl AppFixture {
    fn try_into_app(self) -> Result<AppInCluster, FixtureError> {
        let app_id = AppId::from(self.app_id);

        let details = self
            .details
            .into_iter()
            .map(|detail| detail.try_into_detail(&app_id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AppInCluster {
            app_id,
            name: self.name,
            vendor_id: self.vendor_id.into(),
            vendor_name: self.vendor_name,
            users: clamp_quantity(self.users),
            price_per_seat: self.price_per_seat,
            billing_period: self.billing_period.parse()?,
            subsidiaries: self.subsidiaries.into_iter().map(Into::into).collect(),
            details,
        })
    }
}

/// Per-subsidiary row fixture.
#[derive(Debug, Deserialize)]
pub struct DetailFixture {
    /// Subsidiary code.
    pub subsidiary: String,

    /// Seats.
    pub users: i64,

    /// Price per seat.
    pub price_per_seat: Decimal,

    /// Billing period of the seat price.
    pub billing_period: String,

    /// Yearly cost; computed from seats and price when omitted.
    #[serde(default)]
    pub cost_year: Option<Decimal>,
}

impl DetailFixture {
    fn try_into_detail(self, app_id: &AppId) -> Result<AppDetail, FixtureError> {
        let users = clamp_quantity(self.users);
        let billing_period: BillingPeriod = self.billing_period.parse()?;

        Ok(AppDetail {
            app_id: app_id.clone(),
            subsidiary: self.subsidiary.into(),
            users,
            price_per_seat: self.price_per_seat,
            billing_period,
            cost_year: self
                .cost_year
                .unwrap_or_else(|| seats_year(users, self.price_per_seat, billing_period)),
        })
    }
}

/// Vendor offer fixture.
#[derive(Debug, Deserialize)]
pub struct PricingFixture {
    /// Vendor id.
    pub vendor_id: String,

    /// Vendor name.
    #[serde(default)]
    pub vendor_name: String,

    /// `piecewise` or `progressive`.
    pub pricing_mode: String,

    /// Billing period of the tier prices.
    pub billing_period: String,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Volume tiers in any order.
    #[serde(default)]
    pub tiers: Vec<TierFixture>,
}

impl PricingFixture {
    fn try_into_pricing(self, cluster_key: &ClusterKey) -> Result<VendorPricing, FixtureError> {
        let mode: PricingMode = self.pricing_mode.parse()?;

        Ok(VendorPricing {
            vendor_id: self.vendor_id.into(),
            vendor_name: self.vendor_name,
            cluster_key: cluster_key.clone(),
            mode,
            billing_period: self.billing_period.parse()?,
            currency: currency(&self.currency)?,
            tiers: TierTable::from_raw(
                self.tiers
                    .into_iter()
                    .map(|tier| (tier.threshold_qty, tier.unit_price)),
            ),
        })
    }
}

/// Tier fixture.
#[derive(Debug, Deserialize)]
pub struct TierFixture {
    /// Seat threshold.
    pub threshold_qty: i64,

    /// Price per seat.
    pub unit_price: Decimal,
}
