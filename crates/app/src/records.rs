//! Wire Records
//!
//! Shapes returned by the data service, and their conversion into engine
//! types. Negative seat counts and thresholds are treated as zero here so the
//! engine never sees them.

use rust_decimal::Decimal;
use seatwise::{
    clusters::{AppDetail, AppId, AppInCluster, Cluster, ClusterKey, Company, clamp_quantity, seats_year},
    periods::{BillingPeriod, UnknownBillingPeriod},
    pricing::{PricingMode, TierTable, UnknownPricingMode},
    vendors::{VendorPricing, VendorPricingError, currency},
};
use serde::Deserialize;
use thiserror::Error;

/// A record could not be turned into an engine type.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Unknown billing period.
    #[error(transparent)]
    BillingPeriod(#[from] UnknownBillingPeriod),

    /// Unknown pricing mode.
    #[error(transparent)]
    PricingMode(#[from] UnknownPricingMode),

    /// Unknown currency.
    #[error(transparent)]
    Currency(#[from] VendorPricingError),
}

/// Cluster Record
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterRecord {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub common_features: Vec<String>,
    #[serde(default)]
    pub subsidiaries: Vec<String>,
    #[serde(default)]
    pub apps: Vec<AppRecord>,
}

impl TryFrom<ClusterRecord> for Cluster {
    type Error = RecordError;

    fn try_from(record: ClusterRecord) -> Result<Self, Self::Error> {
        Ok(Cluster {
            key: record.key.into(),
            name: record.name,
            description: record.description,
            common_features: record.common_features,
            apps: record
                .apps
                .into_iter()
                .map(AppInCluster::try_from)
                .collect::<Result<_, _>>()?,
            candidate_pricing: Vec::new(),
            subsidiaries: record.subsidiaries.into_iter().map(Into::into).collect(),
        })
    }
}

/// App Record
#[derive(Debug, Clone, Deserialize)]
pub struct AppRecord {
    pub app_id: String,
    pub name: String,
    #[serde(default)]
    pub vendor_id: String,
    #[serde(default)]
    pub vendor_name: String,
    pub users: i64,
    pub price_per_seat: Decimal,
    pub billing_period: String,
    #[serde(default)]
    pub subsidiaries: Vec<String>,
    #[serde(default)]
    pub details: Vec<DetailRecord>,
}

impl TryFrom<AppRecord> for AppInCluster {
    type Error = RecordError;

    fn try_from(record: AppRecord) -> Result<Self, Self::Error> {
        let app_id = AppId::from(record.app_id);

        let details = record
            .details
            .into_iter()
            .map(|detail| detail.into_detail(Some(&app_id)))
            .collect::<Result<_, _>>()?;

        Ok(AppInCluster {
            app_id,
            name: record.name,
            vendor_id: record.vendor_id.into(),
            vendor_name: record.vendor_name,
            users: clamp_quantity(record.users),
            price_per_seat: record.price_per_seat,
            billing_period: record.billing_period.parse()?,
            subsidiaries: record.subsidiaries.into_iter().map(Into::into).collect(),
            details,
        })
    }
}

/// Detail Record
///
/// Nested under an app the `app_id` may be omitted; rows returned by a
/// detail fetch carry it.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailRecord {
    #[serde(default)]
    pub app_id: Option<String>,
    pub subsidiary: String,
    pub users: i64,
    pub price_per_seat: Decimal,
    pub billing_period: String,
    #[serde(default)]
    pub cost_year: Option<Decimal>,
}

impl DetailRecord {
    /// Convert into an engine row, tagging it with `parent` when the record
    /// does not name its application.
    ///
    /// # Errors
    ///
    /// Returns an error when the billing period is unknown.
    pub fn into_detail(self, parent: Option<&AppId>) -> Result<AppDetail, RecordError> {
        let users = clamp_quantity(self.users);
        let billing_period: BillingPeriod = self.billing_period.parse()?;

        let app_id = match (self.app_id, parent) {
            (Some(app_id), _) => AppId::from(app_id),
            (None, Some(parent)) => parent.clone(),
            (None, None) => AppId::from(String::new()),
        };

        Ok(AppDetail {
            app_id,
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

/// Body of a detail fetch.
///
/// The detail fetch shares the cluster search endpoint, so the service answers
/// with clusters whose apps carry the matching `details`. A bare array of rows
/// is accepted as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DetailResponse {
    /// Flat detail rows.
    Rows(Vec<DetailRecord>),

    /// Clusters with nested apps and details.
    Clusters(Vec<DetailClusterRecord>),
}

impl DetailResponse {
    /// Detail rows belonging to `app_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when a row has an unknown billing period.
    pub fn into_details(self, app_id: &AppId) -> Result<Vec<AppDetail>, RecordError> {
        match self {
            DetailResponse::Rows(rows) => rows
                .into_iter()
                .map(|row| row.into_detail(Some(app_id)))
                .collect(),
            DetailResponse::Clusters(clusters) => clusters
                .into_iter()
                .flat_map(|cluster| cluster.apps)
                .filter(|app| app.app_id == app_id.as_str())
                .flat_map(|app| app.details)
                .map(|row| row.into_detail(Some(app_id)))
                .collect(),
        }
    }
}

/// Cluster as returned by a detail fetch; only the apps matter.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailClusterRecord {
    pub apps: Vec<DetailAppRecord>,
}

/// App as returned by a detail fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailAppRecord {
    pub app_id: String,
    #[serde(default)]
    pub details: Vec<DetailRecord>,
}

/// Vendor Pricing Record
#[derive(Debug, Clone, Deserialize)]
pub struct PricingRecord {
    pub vendor_id: String,
    #[serde(default)]
    pub vendor_name: String,
    pub pricing_mode: String,
    pub billing_period: String,
    pub currency: String,
    #[serde(default)]
    pub tiers: Vec<TierRecord>,
}

impl PricingRecord {
    /// Convert into a vendor offer for `cluster_key`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown mode, period or currency.
    pub fn into_pricing(self, cluster_key: &ClusterKey) -> Result<VendorPricing, RecordError> {
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

/// Tier Record
#[derive(Debug, Clone, Deserialize)]
pub struct TierRecord {
    pub threshold_qty: i64,
    pub unit_price: Decimal,
}

/// Company Record
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRecord {
    pub code: String,
    pub name: String,
}

impl From<CompanyRecord> for Company {
    fn from(record: CompanyRecord) -> Self {
        Company {
            code: record.code.into(),
            name: record.name,
        }
    }
}
