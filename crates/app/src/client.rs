//! HTTP client for the cluster data service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use seatwise::{
    assembly::FetchRequest,
    clusters::{AppDetail, Cluster, ClusterKey, Company},
    vendors::VendorPricing,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    records::{ClusterRecord, CompanyRecord, DetailResponse, PricingRecord},
    service::{DataService, DataServiceError},
};

/// Configuration for connecting to the data service.
#[derive(Debug, Clone)]
pub struct DataServiceConfig {
    /// Base URL, e.g. `"http://localhost:8000/api"`.
    pub base_url: String,

    /// Status the service uses to say it has no data for a scope.
    pub absence_status: StatusCode,
}

/// [`DataService`] backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpDataService {
    config: DataServiceConfig,
    http: Client,
}

impl HttpDataService {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: DataServiceConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DataServiceError> {
        let url = format!("{}/{path}", self.config.base_url.trim_end_matches('/'));

        debug!(%url, ?query, "requesting data service");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();

        if status == self.config.absence_status {
            return Err(DataServiceError::ReportedAbsence);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            return Err(DataServiceError::UnexpectedResponse(format!(
                "{path} request failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DataService for HttpDataService {
    async fn search_clusters(&self, app_name: &str) -> Result<Vec<Cluster>, DataServiceError> {
        let records: Vec<ClusterRecord> = self.get("clusters", &[("app_name", app_name)]).await?;

        records
            .into_iter()
            .map(|record| Cluster::try_from(record).map_err(Into::into))
            .collect()
    }

    async fn vendor_pricing(
        &self,
        cluster_key: &ClusterKey,
    ) -> Result<Vec<VendorPricing>, DataServiceError> {
        let records: Vec<PricingRecord> = self
            .get(
                "vendors/pricing-tiers",
                &[("cluster_key", cluster_key.as_str())],
            )
            .await?;

        records
            .into_iter()
            .map(|record| record.into_pricing(cluster_key).map_err(Into::into))
            .collect()
    }

    async fn companies(&self) -> Result<Vec<Company>, DataServiceError> {
        let records: Vec<CompanyRecord> = self.get("companies", &[]).await?;

        Ok(records.into_iter().map(Company::from).collect())
    }

    async fn fetch_details(
        &self,
        request: &FetchRequest,
    ) -> Result<Vec<AppDetail>, DataServiceError> {
        let query = detail_query(request);
        let response: DetailResponse = self.get("clusters", &query).await?;

        Ok(response.into_details(&request.app_id)?)
    }
}

/// `app_id` followed by one `subsidiaries` pair per code.
fn detail_query(request: &FetchRequest) -> Vec<(&str, &str)> {
    let mut query = Vec::with_capacity(request.subsidiaries.len() + 1);

    query.push(("app_id", request.app_id.as_str()));

    for code in &request.subsidiaries {
        query.push(("subsidiaries", code.as_str()));
    }

    query
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    use super::*;

    /// Serve one canned response and report the request line received.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> TestResult<(String, oneshot::Receiver<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let (sender, receiver) = oneshot::channel();

        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };

            let mut request = Vec::new();
            let mut buffer = [0_u8; 1024];

            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match stream.read(&mut buffer).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => request.extend_from_slice(&buffer[..read]),
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );

            _ = stream.write_all(response.as_bytes()).await;
            _ = stream.shutdown().await;

            let head = String::from_utf8_lossy(&request);
            _ = sender.send(head.lines().next().unwrap_or_default().to_string());
        });

        Ok((base_url, receiver))
    }

    fn service(base_url: String, absence_status: StatusCode) -> HttpDataService {
        HttpDataService::new(DataServiceConfig {
            base_url,
            absence_status,
        })
    }

    fn sketch_request(subsidiaries: &[&str]) -> FetchRequest {
        FetchRequest {
            cluster_key: "design".into(),
            app_id: "sketch".into(),
            subsidiaries: subsidiaries.iter().map(|&code| code.into()).collect(),
        }
    }

    #[tokio::test]
    async fn detail_fetch_sends_repeated_subsidiaries_and_reads_nested_rows() -> TestResult {
        let (base_url, request_line) = serve_once(
            "200 OK",
            r#"[{"key":"design","name":"Design","apps":[{"app_id":"sketch","details":[
                {"subsidiary":"DE01","users":40,"price_per_seat":450,"billing_period":"monthly"},
                {"subsidiary":"FR02","users":30,"price_per_seat":450,"billing_period":"monthly"}
            ]}]}]"#,
        )
        .await?;

        let rows = service(base_url, StatusCode::INTERNAL_SERVER_ERROR)
            .fetch_details(&sketch_request(&["DE01", "FR02"]))
            .await?;

        assert_eq!(rows.len(), 2);
        assert_eq!(
            request_line.await?,
            "GET /clusters?app_id=sketch&subsidiaries=DE01&subsidiaries=FR02 HTTP/1.1"
        );

        Ok(())
    }

    #[tokio::test]
    async fn absence_status_is_reported_as_absence() -> TestResult {
        let (base_url, _request_line) = serve_once("500 Internal Server Error", "").await?;

        let result = service(base_url, StatusCode::INTERNAL_SERVER_ERROR)
            .fetch_details(&sketch_request(&["IT03"]))
            .await;

        assert!(matches!(result, Err(DataServiceError::ReportedAbsence)));

        Ok(())
    }

    #[tokio::test]
    async fn other_error_statuses_are_unexpected() -> TestResult {
        let (base_url, _request_line) = serve_once("502 Bad Gateway", "upstream down").await?;

        let result = service(base_url, StatusCode::INTERNAL_SERVER_ERROR)
            .fetch_details(&sketch_request(&[]))
            .await;

        assert!(matches!(
            result,
            Err(DataServiceError::UnexpectedResponse(message)) if message.contains("502")
        ));

        Ok(())
    }

    #[tokio::test]
    async fn absence_status_is_configurable() -> TestResult {
        let (base_url, _request_line) = serve_once("500 Internal Server Error", "").await?;

        let result = service(base_url, StatusCode::NOT_FOUND)
            .fetch_details(&sketch_request(&[]))
            .await;

        assert!(matches!(result, Err(DataServiceError::UnexpectedResponse(_))));

        Ok(())
    }

    #[test]
    fn detail_query_repeats_subsidiaries() {
        let request = FetchRequest {
            cluster_key: "design".into(),
            app_id: "sketch".into(),
            subsidiaries: vec!["DE01".into(), "FR02".into()],
        };

        assert_eq!(
            detail_query(&request),
            [
                ("app_id", "sketch"),
                ("subsidiaries", "DE01"),
                ("subsidiaries", "FR02"),
            ]
        );
    }

    #[test]
    fn unfiltered_detail_query_only_names_the_app() {
        let request = FetchRequest {
            cluster_key: "design".into(),
            app_id: "xd".into(),
            subsidiaries: Vec::new(),
        };

        assert_eq!(detail_query(&request), [("app_id", "xd")]);
    }
}
