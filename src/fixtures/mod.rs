//! Fixtures
//!
//! YAML descriptions of clusters, candidate vendor offers, companies and the
//! switching policy, for offline analysis and tests.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    clusters::{Cluster, ClusterKey, Company},
    fixtures::clusters::ClustersFixture,
    periods::UnknownBillingPeriod,
    pricing::UnknownPricingMode,
    switching::SwitchingPolicy,
    vendors::VendorPricingError,
};

pub mod clusters;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error(transparent)]
    Currency(#[from] VendorPricingError),

    /// Unknown billing period
    #[error(transparent)]
    BillingPeriod(#[from] UnknownBillingPeriod),

    /// Unknown pricing mode
    #[error(transparent)]
    PricingMode(#[from] UnknownPricingMode),

    /// The same cluster key appears twice
    #[error("Duplicate cluster key: {0}")]
    DuplicateCluster(String),
}

/// Fixture
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    clusters: Vec<Cluster>,
    companies: Vec<Company>,
    policy: SwitchingPolicy,
}

impl Fixture {
    /// Parse a fixture from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or references unknown
    /// currencies, billing periods or pricing modes.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        let fixture: ClustersFixture = serde_norway::from_str(contents)?;

        fixture.try_into()
    }

    /// Load a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&contents)
    }

    /// Load `./fixtures/{name}.yml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::load(Path::new("./fixtures").join(format!("{name}.yml")))
    }

    /// Clusters in file order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Look up a cluster by key.
    pub fn cluster(&self, key: &ClusterKey) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| &cluster.key == key)
    }

    /// Known companies.
    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    /// Switching policy.
    pub fn policy(&self) -> &SwitchingPolicy {
        &self.policy
    }
}

impl TryFrom<ClustersFixture> for Fixture {
    type Error = FixtureError;

    fn try_from(fixture: ClustersFixture) -> Result<Self, Self::Error> {
        let mut clusters: Vec<Cluster> = Vec::with_capacity(fixture.clusters.len());

        for cluster in fixture.clusters {
            let cluster = cluster.try_into_cluster()?;

            if clusters.iter().any(|existing| existing.key == cluster.key) {
                return Err(FixtureError::DuplicateCluster(cluster.key.into_string()));
            }

            clusters.push(cluster);
        }

        Ok(Self {
            clusters,
            companies: fixture
                .companies
                .into_iter()
                .map(|company| Company {
                    code: company.code.into(),
                    name: company.name,
                })
                .collect(),
            policy: fixture.policy.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{periods::BillingPeriod, pricing::PricingMode};

    use super::*;

    const YAML: &str = r#"
policy:
  training_cost_per_user: 500
  migration_flat_cost: 50000
  early_termination_penalty_rate: 0.1
companies:
  - code: DE01
    name: Acme Deutschland
clusters:
  - key: design
    name: Design Tools
    description: Interface design
    common_features: [prototyping]
    subsidiaries: [DE01]
    apps:
      - app_id: sketch
        name: Sketch
        vendor_id: bohemian
        vendor_name: Bohemian Coding
        users: 70
        price_per_seat: "450"
        billing_period: monthly
        subsidiaries: [DE01]
        details:
          - subsidiary: DE01
            users: 70
            price_per_seat: 450
            billing_period: monthly
    pricing:
      - vendor_id: figma
        vendor_name: Figma
        pricing_mode: piecewise
        billing_period: monthly
        currency: EUR
        tiers:
          - { threshold_qty: 200, unit_price: 400 }
          - { threshold_qty: 1, unit_price: 600 }
"#;

    #[test]
    fn parses_clusters_apps_and_pricing() -> TestResult {
        let fixture = Fixture::from_yaml(YAML)?;
        let cluster = fixture
            .cluster(&"design".into())
            .ok_or("design cluster missing")?;

        assert_eq!(cluster.apps.len(), 1);
        assert_eq!(cluster.current_year(), Decimal::from(378_000));

        let pricing = cluster.candidate_pricing.first().ok_or("pricing missing")?;

        assert_eq!(pricing.mode, PricingMode::Piecewise);
        assert_eq!(pricing.billing_period, BillingPeriod::Monthly);
        assert_eq!(pricing.cluster_key, cluster.key);
        assert_eq!(
            pricing.tiers.tiers().first().map(|tier| tier.threshold_qty),
            Some(1)
        );

        Ok(())
    }

    #[test]
    fn details_are_tagged_and_costed() -> TestResult {
        let fixture = Fixture::from_yaml(YAML)?;
        let cluster = fixture.clusters().first().ok_or("no clusters")?;
        let detail = cluster
            .apps
            .first()
            .and_then(|app| app.details.first())
            .ok_or("no details")?;

        assert_eq!(detail.app_id.as_str(), "sketch");
        assert_eq!(detail.cost_year, Decimal::from(378_000));

        Ok(())
    }

    #[test]
    fn parses_policy_and_companies() -> TestResult {
        let fixture = Fixture::from_yaml(YAML)?;

        assert_eq!(fixture.companies().len(), 1);
        assert_eq!(fixture.policy().migration_flat_cost(), Decimal::from(50_000));

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let yaml = YAML.replace("currency: EUR", "currency: ZZZ");

        assert!(matches!(
            Fixture::from_yaml(&yaml),
            Err(FixtureError::Currency(_))
        ));
    }

    #[test]
    fn unknown_billing_period_is_rejected() {
        let yaml = YAML.replace("billing_period: monthly\n        currency", "billing_period: weekly\n        currency");

        assert!(matches!(
            Fixture::from_yaml(&yaml),
            Err(FixtureError::BillingPeriod(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let result = Fixture::load("./does/not/exist.yml");

        assert!(matches!(result, Err(FixtureError::Io { .. })));
    }
}
