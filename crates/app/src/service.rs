//! Data service.

use async_trait::async_trait;
use mockall::automock;
use seatwise::{
    assembly::FetchRequest,
    clusters::{AppDetail, Cluster, ClusterKey, Company},
    vendors::VendorPricing,
};
use thiserror::Error;

use crate::records::RecordError;

/// Errors returned by a data service.
#[derive(Debug, Error)]
pub enum DataServiceError {
    /// An HTTP transport or decoding error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status it should not have.
    #[error("unexpected response from data service: {0}")]
    UnexpectedResponse(String),

    /// The service has no data for the requested scope.
    #[error("data service reported no data for the requested scope")]
    ReportedAbsence,

    /// A record could not be converted.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),
}

/// Read access to the cluster data service.
#[automock]
#[async_trait]
pub trait DataService: Send + Sync {
    /// Clusters containing an application matching `app_name`.
    ///
    /// Candidate pricing is not included; see [`DataService::vendor_pricing`].
    async fn search_clusters(&self, app_name: &str) -> Result<Vec<Cluster>, DataServiceError>;

    /// Candidate vendor offers for a cluster, in the order the service lists them.
    async fn vendor_pricing(
        &self,
        cluster_key: &ClusterKey,
    ) -> Result<Vec<VendorPricing>, DataServiceError>;

    /// Every known company.
    async fn companies(&self) -> Result<Vec<Company>, DataServiceError>;

    /// Detail rows for one application, filtered to the request's subsidiaries.
    async fn fetch_details(
        &self,
        request: &FetchRequest,
    ) -> Result<Vec<AppDetail>, DataServiceError>;
}
