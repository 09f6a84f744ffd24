//! Fetch Orchestrator
//!
//! Runs detail fetches against a [`DataService`] and classifies every result
//! into exactly one [`FetchOutcome`], so transport errors never reach the
//! assembly state machine.

use std::{sync::Arc, time::Duration};

use seatwise::assembly::{FetchOutcome, FetchRequest};
use tracing::{debug, warn};

use crate::service::{DataService, DataServiceError};

/// Default time a detail fetch may take before it counts as failed.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues detail fetches with a deadline.
#[derive(Clone)]
pub struct FetchOrchestrator {
    service: Arc<dyn DataService>,
    timeout: Duration,
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl FetchOrchestrator {
    /// Create an orchestrator over `service`.
    #[must_use]
    pub fn new(service: Arc<dyn DataService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// Run `request` and classify the result.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let result = tokio::time::timeout(self.timeout, self.service.fetch_details(request)).await;

        let outcome = match result {
            Ok(Ok(rows)) if rows.is_empty() => FetchOutcome::EmptySuccess,
            Ok(Ok(rows)) => FetchOutcome::Success(rows),
            Ok(Err(DataServiceError::ReportedAbsence)) => FetchOutcome::ReportedAbsence,
            Ok(Err(error)) => FetchOutcome::TransientFailure(error.to_string()),
            Err(_elapsed) => FetchOutcome::TransientFailure(format!(
                "fetch timed out after {} ms",
                self.timeout.as_millis()
            )),
        };

        match &outcome {
            FetchOutcome::TransientFailure(reason) => warn!(
                cluster = %request.cluster_key,
                app_id = %request.app_id,
                subsidiaries = request.subsidiaries.len(),
                %reason,
                "detail fetch failed"
            ),
            outcome => debug!(
                cluster = %request.cluster_key,
                app_id = %request.app_id,
                subsidiaries = request.subsidiaries.len(),
                outcome = outcome_name(outcome),
                "detail fetch classified"
            ),
        }

        outcome
    }
}

fn outcome_name(outcome: &FetchOutcome) -> &'static str {
    match outcome {
        FetchOutcome::Success(_) => "success",
        FetchOutcome::EmptySuccess => "empty",
        FetchOutcome::ReportedAbsence => "absent",
        FetchOutcome::TransientFailure(_) => "failed",
    }
}
