//! Dataset Assembly
//!
//! Builds the per-subsidiary dataset of one cluster incrementally: the
//! operator picks a single application, then adds or removes subsidiaries one
//! at a time. Every transition is split in two halves. The *begin* half
//! validates the request, records what is pending and returns the
//! [`FetchRequest`] to run; [`ClusterSession::resolve`] then applies the
//! classified [`FetchOutcome`]. Nothing speculative is written before the
//! outcome is known, so a failed fetch never has to be rolled back.

use std::fmt;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    clusters::{AppDetail, AppId, Cluster, ClusterKey, Company, SubsidiaryCode},
    summary::ClusterSummary,
    switching::SwitchingPolicy,
    vendors::VendorPricing,
};

/// Transitions rejected before any fetch is issued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// Subsidiaries can only be changed once an application is selected.
    #[error("no application selected")]
    NoApplicationSelected,

    /// The subsidiary is already part of the dataset.
    #[error("subsidiary {0} is already selected")]
    AlreadyActive(SubsidiaryCode),

    /// The subsidiary previously reported no data for this application.
    #[error("subsidiary {0} has no data for the selected application")]
    Blacklisted(SubsidiaryCode),

    /// The subsidiary is not part of the dataset.
    #[error("subsidiary {0} is not selected")]
    NotActive(SubsidiaryCode),

    /// Another fetch for this cluster has not been resolved yet.
    #[error("a fetch is already in flight for this cluster")]
    FetchPending,

    /// There is no fetch waiting for an outcome.
    #[error("no fetch is pending for this cluster")]
    NothingPending,
}

/// Detail query to run against the data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Cluster the request is made for.
    pub cluster_key: ClusterKey,

    /// Application whose detail rows are requested.
    pub app_id: AppId,

    /// Subsidiary filter; empty means every subsidiary.
    pub subsidiaries: Vec<SubsidiaryCode>,
}

/// Classified result of a detail fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Rows were returned.
    Success(Vec<AppDetail>),

    /// The request was valid but matched no rows.
    EmptySuccess,

    /// The service affirmatively has no data for the requested scope.
    ReportedAbsence,

    /// The fetch failed for reasons unrelated to data existence.
    TransientFailure(String),
}

/// The fetch a session is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingFetch {
    /// Loading every subsidiary of a newly selected application.
    SelectApp,

    /// Loading the dataset with this subsidiary added.
    AddSubsidiary(SubsidiaryCode),

    /// Loading the dataset with this subsidiary removed.
    RemoveSubsidiary(SubsidiaryCode),
}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No application selected.
    Empty,

    /// An application is selected but no rows are materialized.
    AppSelected,

    /// An application is selected and rows are materialized.
    Populated,
}

/// Operator-facing message raised by a resolved fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The subsidiary had no data and was dropped from the selection for good.
    SubsidiaryEvicted {
        /// Subsidiary that was dropped.
        subsidiary: SubsidiaryCode,
    },

    /// The selected application has no detail data at all.
    NoDataForApplication {
        /// Application that was selected.
        app_id: AppId,
    },

    /// The fetch failed; the dataset was left as it was.
    FetchFailed {
        /// Failure reason reported by the fetcher.
        reason: String,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::SubsidiaryEvicted { subsidiary } => write!(
                f,
                "No data for subsidiary {subsidiary}; it was removed from the selection"
            ),
            Notification::NoDataForApplication { app_id } => {
                write!(f, "No detail data available for application {app_id}")
            }
            Notification::FetchFailed { reason } => {
                write!(f, "Failed to load application details: {reason}")
            }
        }
    }
}

/// What applying an outcome did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Row count before the transition began.
    pub previous_row_count: usize,

    /// Row count after the outcome was applied.
    pub row_count: usize,

    /// Message to surface to the operator, if any.
    pub notification: Option<Notification>,
}

impl Resolution {
    /// Whether the transition grew the dataset.
    pub fn added_rows(&self) -> bool {
        self.row_count > self.previous_row_count
    }
}

/// Per-cluster assembly state.
#[derive(Debug, Clone)]
pub struct ClusterSession {
    cluster_key: ClusterKey,
    selected_app: Option<AppId>,
    active: SmallVec<[SubsidiaryCode; 8]>,
    blacklist: FxHashSet<SubsidiaryCode>,
    rows: Vec<AppDetail>,
    previous_row_count: usize,
    pending: Option<PendingFetch>,
}

impl ClusterSession {
    /// Create an empty session for a cluster.
    pub fn new(cluster_key: ClusterKey) -> Self {
        Self {
            cluster_key,
            selected_app: None,
            active: SmallVec::new(),
            blacklist: FxHashSet::default(),
            rows: Vec::new(),
            previous_row_count: 0,
            pending: None,
        }
    }

    /// Cluster this session belongs to.
    pub fn cluster_key(&self) -> &ClusterKey {
        &self.cluster_key
    }

    /// Currently selected application.
    pub fn selected_app(&self) -> Option<&AppId> {
        self.selected_app.as_ref()
    }

    /// Active subsidiaries in the order they were added.
    pub fn active_subsidiaries(&self) -> &[SubsidiaryCode] {
        &self.active
    }

    /// Whether a subsidiary is blacklisted for the selected application.
    pub fn is_blacklisted(&self, subsidiary: &SubsidiaryCode) -> bool {
        self.blacklist.contains(subsidiary)
    }

    /// Blacklisted subsidiaries, in no particular order.
    pub fn blacklisted_subsidiaries(&self) -> impl Iterator<Item = &SubsidiaryCode> {
        self.blacklist.iter()
    }

    /// Materialized detail rows.
    pub fn rows(&self) -> &[AppDetail] {
        &self.rows
    }

    /// Row count recorded before the last transition, kept across failed fetches.
    pub fn previous_row_count(&self) -> usize {
        self.previous_row_count
    }

    /// The fetch awaiting an outcome, if any.
    pub fn pending(&self) -> Option<&PendingFetch> {
        self.pending.as_ref()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        match (&self.selected_app, self.rows.is_empty()) {
            (None, _) => Phase::Empty,
            (Some(_), true) => Phase::AppSelected,
            (Some(_), false) => Phase::Populated,
        }
    }

    /// Companies that can still be offered for adding.
    pub fn addable<'a>(&'a self, companies: &'a [Company]) -> impl Iterator<Item = &'a Company> {
        companies
            .iter()
            .filter(|company| !self.active.contains(&company.code))
            .filter(|company| !self.blacklist.contains(&company.code))
    }

    /// Select an application, discarding everything scoped to the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::FetchPending`] while another fetch is unresolved.
    pub fn select_app(&mut self, app_id: AppId) -> Result<FetchRequest, AssemblyError> {
        self.ensure_idle()?;

        self.active.clear();
        self.blacklist.clear();
        self.rows.clear();
        self.previous_row_count = 0;
        self.selected_app = Some(app_id.clone());
        self.pending = Some(PendingFetch::SelectApp);

        Ok(self.request(app_id, Vec::new()))
    }

    /// Drop the selected application and every piece of state tied to it.
    ///
    /// Any unresolved fetch is abandoned.
    pub fn deselect_app(&mut self) {
        self.selected_app = None;
        self.active.clear();
        self.blacklist.clear();
        self.rows.clear();
        self.previous_row_count = 0;
        self.pending = None;
    }

    /// Begin adding a subsidiary to the dataset.
    ///
    /// The subsidiary only joins the active set once the fetch succeeds.
    ///
    /// # Errors
    ///
    /// Rejected without a fetch when a fetch is pending, no application is
    /// selected, or the subsidiary is already active or blacklisted.
    pub fn add_subsidiary(
        &mut self,
        subsidiary: SubsidiaryCode,
    ) -> Result<FetchRequest, AssemblyError> {
        self.ensure_idle()?;

        let app_id = self
            .selected_app
            .clone()
            .ok_or(AssemblyError::NoApplicationSelected)?;

        if self.blacklist.contains(&subsidiary) {
            return Err(AssemblyError::Blacklisted(subsidiary));
        }

        if self.active.contains(&subsidiary) {
            return Err(AssemblyError::AlreadyActive(subsidiary));
        }

        let mut scope = self.active.to_vec();
        scope.push(subsidiary.clone());

        self.previous_row_count = self.rows.len();
        self.pending = Some(PendingFetch::AddSubsidiary(subsidiary));

        Ok(self.request(app_id, scope))
    }

    /// Remove a subsidiary from the dataset and begin reloading the rest.
    ///
    /// A removed subsidiary is not blacklisted and may be added again.
    ///
    /// # Errors
    ///
    /// Rejected when a fetch is pending, no application is selected, or the
    /// subsidiary is not active.
    pub fn remove_subsidiary(
        &mut self,
        subsidiary: &SubsidiaryCode,
    ) -> Result<FetchRequest, AssemblyError> {
        self.ensure_idle()?;

        let app_id = self
            .selected_app
            .clone()
            .ok_or(AssemblyError::NoApplicationSelected)?;

        if !self.active.contains(subsidiary) {
            return Err(AssemblyError::NotActive(subsidiary.clone()));
        }

        self.active.retain(|code| code != subsidiary);
        self.previous_row_count = self.rows.len();
        self.pending = Some(PendingFetch::RemoveSubsidiary(subsidiary.clone()));

        Ok(self.request(app_id, self.active.to_vec()))
    }

    /// Apply the outcome of the pending fetch.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::NothingPending`] when no fetch was begun, or
    /// when it was abandoned by [`ClusterSession::deselect_app`].
    pub fn resolve(&mut self, outcome: FetchOutcome) -> Result<Resolution, AssemblyError> {
        let pending = self.pending.take().ok_or(AssemblyError::NothingPending)?;
        let previous_row_count = self.previous_row_count;

        let notification = match outcome {
            FetchOutcome::Success(rows) => {
                self.commit(&pending);
                self.replace_rows(rows);

                None
            }
            FetchOutcome::EmptySuccess => {
                self.commit(&pending);
                self.replace_rows(Vec::new());

                None
            }
            FetchOutcome::ReportedAbsence => self.absent(pending),
            FetchOutcome::TransientFailure(reason) => {
                self.failed(&pending);

                Some(Notification::FetchFailed { reason })
            }
        };

        Ok(Resolution {
            previous_row_count,
            row_count: self.rows.len(),
            notification,
        })
    }

    /// Summary of the current view.
    ///
    /// Once an application is selected only the materialized rows count;
    /// cluster-level aggregates are used when nothing is selected.
    pub fn summary(
        &self,
        cluster: &Cluster,
        pricing: Option<&VendorPricing>,
        policy: &SwitchingPolicy,
    ) -> ClusterSummary {
        if self.selected_app.is_some() {
            ClusterSummary::from_rows(&self.rows, pricing, policy)
        } else {
            ClusterSummary::from_cluster(cluster, pricing, policy)
        }
    }

    /// Whether the session's invariants hold.
    ///
    /// The blacklist and active set are disjoint, and while the active set is
    /// non-empty every row belongs to an active subsidiary. An empty active
    /// set is the unfiltered view.
    pub fn is_consistent(&self) -> bool {
        let disjoint = self.active.iter().all(|code| !self.blacklist.contains(code));
        let scoped = self.active.is_empty()
            || self
                .rows
                .iter()
                .all(|row| self.active.contains(&row.subsidiary));

        disjoint && scoped
    }

    fn ensure_idle(&self) -> Result<(), AssemblyError> {
        if self.pending.is_some() {
            return Err(AssemblyError::FetchPending);
        }

        Ok(())
    }

    fn request(&self, app_id: AppId, subsidiaries: Vec<SubsidiaryCode>) -> FetchRequest {
        FetchRequest {
            cluster_key: self.cluster_key.clone(),
            app_id,
            subsidiaries,
        }
    }

    fn commit(&mut self, pending: &PendingFetch) {
        if let PendingFetch::AddSubsidiary(code) = pending {
            self.active.push(code.clone());
        }
    }

    fn replace_rows(&mut self, mut rows: Vec<AppDetail>) {
        if !self.active.is_empty() {
            rows.retain(|row| self.active.contains(&row.subsidiary));
        }

        self.rows = rows;
        self.previous_row_count = self.rows.len();
    }

    fn absent(&mut self, pending: PendingFetch) -> Option<Notification> {
        match pending {
            PendingFetch::SelectApp => {
                self.rows.clear();

                self.selected_app
                    .clone()
                    .map(|app_id| Notification::NoDataForApplication { app_id })
            }
            PendingFetch::AddSubsidiary(subsidiary) => {
                self.blacklist.insert(subsidiary.clone());

                Some(Notification::SubsidiaryEvicted { subsidiary })
            }
            PendingFetch::RemoveSubsidiary(_) => {
                // Nothing exists for the narrower scope.
                self.replace_rows(Vec::new());

                None
            }
        }
    }

    fn failed(&mut self, pending: &PendingFetch) {
        match pending {
            PendingFetch::SelectApp => self.rows.clear(),
            PendingFetch::AddSubsidiary(_) => {}
            PendingFetch::RemoveSubsidiary(code) => {
                self.rows.retain(|row| &row.subsidiary != code);
            }
        }
    }
}
