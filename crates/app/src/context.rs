//! App Context

use std::{sync::Arc, time::Duration};

use rustc_hash::FxHashMap;
use seatwise::{
    assembly::{AssemblyError, ClusterSession, FetchRequest, Notification, Resolution},
    clusters::{AppId, Cluster, ClusterKey, SubsidiaryCode},
    switching::SwitchingPolicy,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    client::{DataServiceConfig, HttpDataService},
    orchestrator::FetchOrchestrator,
    service::{DataService, DataServiceError},
};

/// Shared application state: the data service, assembly sessions and the
/// switching policy.
#[derive(Clone)]
pub struct AppContext {
    pub data: Arc<dyn DataService>,
    pub sessions: Arc<SessionContext>,
    pub policy: SwitchingPolicy,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("sessions", &self.sessions)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build an application context over any data service.
    #[must_use]
    pub fn new(data: Arc<dyn DataService>, timeout: Duration, policy: SwitchingPolicy) -> Self {
        let orchestrator = FetchOrchestrator::new(Arc::clone(&data), timeout);

        Self {
            data,
            sessions: Arc::new(SessionContext::new(orchestrator)),
            policy,
        }
    }

    /// Build an application context talking to the HTTP data service.
    #[must_use]
    pub fn from_http(config: DataServiceConfig, timeout: Duration, policy: SwitchingPolicy) -> Self {
        Self::new(Arc::new(HttpDataService::new(config)), timeout, policy)
    }

    /// Search clusters by application name and attach each cluster's
    /// candidate vendor offers.
    ///
    /// # Errors
    ///
    /// Returns an error if the search or any pricing lookup fails.
    pub async fn clusters_with_pricing(
        &self,
        app_name: &str,
    ) -> Result<Vec<Cluster>, DataServiceError> {
        let mut clusters = self.data.search_clusters(app_name).await?;

        for cluster in &mut clusters {
            cluster.candidate_pricing = self.data.vendor_pricing(&cluster.key).await?;
        }

        info!(app_name, clusters = clusters.len(), "cluster search finished");

        Ok(clusters)
    }
}

type SharedSession = Arc<Mutex<ClusterSession>>;

/// One assembly session per cluster.
///
/// Every transition holds its cluster's lock from begin to resolve, so a
/// cluster never has two fetches in flight. Different clusters do not wait
/// on each other.
#[derive(Debug)]
pub struct SessionContext {
    orchestrator: FetchOrchestrator,
    sessions: Mutex<FxHashMap<ClusterKey, SharedSession>>,
}

impl SessionContext {
    /// Create an empty session registry fetching through `orchestrator`.
    #[must_use]
    pub fn new(orchestrator: FetchOrchestrator) -> Self {
        Self {
            orchestrator,
            sessions: Mutex::new(FxHashMap::default()),
        }
    }

    /// The session for `cluster_key`, created empty on first use.
    pub async fn session(&self, cluster_key: &ClusterKey) -> SharedSession {
        let mut sessions = self.sessions.lock().await;

        Arc::clone(
            sessions
                .entry(cluster_key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(ClusterSession::new(cluster_key.clone())))),
        )
    }

    /// Read the session for `cluster_key` once no transition is running on it.
    pub async fn view<R>(&self, cluster_key: &ClusterKey, read: impl FnOnce(&ClusterSession) -> R) -> R {
        let session = self.session(cluster_key).await;
        let guard = session.lock().await;

        read(&*guard)
    }

    /// Select an application and load its rows for every subsidiary.
    ///
    /// # Errors
    ///
    /// See [`ClusterSession::select_app`].
    pub async fn select_app(
        &self,
        cluster_key: &ClusterKey,
        app_id: AppId,
    ) -> Result<Resolution, AssemblyError> {
        info!(cluster = %cluster_key, %app_id, "selecting application");

        self.transition(cluster_key, |session| session.select_app(app_id))
            .await
    }

    /// Drop the selected application.
    pub async fn deselect_app(&self, cluster_key: &ClusterKey) {
        info!(cluster = %cluster_key, "deselecting application");

        let session = self.session(cluster_key).await;

        session.lock().await.deselect_app();
    }

    /// Add a subsidiary and reload the dataset.
    ///
    /// # Errors
    ///
    /// See [`ClusterSession::add_subsidiary`].
    pub async fn add_subsidiary(
        &self,
        cluster_key: &ClusterKey,
        subsidiary: SubsidiaryCode,
    ) -> Result<Resolution, AssemblyError> {
        info!(cluster = %cluster_key, %subsidiary, "adding subsidiary");

        self.transition(cluster_key, |session| session.add_subsidiary(subsidiary))
            .await
    }

    /// Remove a subsidiary and reload the dataset.
    ///
    /// # Errors
    ///
    /// See [`ClusterSession::remove_subsidiary`].
    pub async fn remove_subsidiary(
        &self,
        cluster_key: &ClusterKey,
        subsidiary: &SubsidiaryCode,
    ) -> Result<Resolution, AssemblyError> {
        info!(cluster = %cluster_key, %subsidiary, "removing subsidiary");

        self.transition(cluster_key, |session| session.remove_subsidiary(subsidiary))
            .await
    }

    async fn transition(
        &self,
        cluster_key: &ClusterKey,
        begin: impl FnOnce(&mut ClusterSession) -> Result<FetchRequest, AssemblyError>,
    ) -> Result<Resolution, AssemblyError> {
        let session = self.session(cluster_key).await;
        let mut guard = session.lock().await;

        let request = begin(&mut *guard).inspect_err(|error| {
            warn!(cluster = %cluster_key, %error, "transition rejected");
        })?;

        let outcome = self.orchestrator.fetch(&request).await;
        let resolution = guard.resolve(outcome)?;

        match &resolution.notification {
            Some(Notification::SubsidiaryEvicted { subsidiary }) => {
                warn!(cluster = %cluster_key, %subsidiary, "subsidiary has no data and was evicted");
            }
            Some(notification) => warn!(cluster = %cluster_key, %notification),
            None => info!(
                cluster = %cluster_key,
                previous_rows = resolution.previous_row_count,
                rows = resolution.row_count,
                "dataset updated"
            ),
        }

        Ok(resolution)
    }
}
