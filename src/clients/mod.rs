pub mod mutation;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::slackwatch::{
    schedule_text, Container, ImageUpdate, PodInfo, Settings, Workload,
};

pub use mutation::Mutation;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("backend base URL is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request failed: {method} {path} returned {status}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
    },
    #[error("decoding {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

/// Thin client for the Slackwatch backend REST API. One method per
/// endpoint, one round trip per call, no retries and no caching.
pub struct BackendClient {
    base_url: Option<String>,
    http: Client,
}

impl BackendClient {
    /// Every request is bounded by a 10 s timeout, so an unreachable backend
    /// surfaces as a `Transport` error instead of a hung page.
    pub fn new(base_url: Option<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            http,
        })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    // --- Reads ---

    pub async fn get_all_workloads(&self) -> Result<Vec<Workload>, ClientError> {
        self.get_list("/api/workloads").await
    }

    pub async fn get_containers(&self) -> Result<Vec<Container>, ClientError> {
        self.get_list("/api/containers").await
    }

    pub async fn get_image_updates(&self) -> Result<Vec<ImageUpdate>, ClientError> {
        self.get_list("/api/imageUpdates").await
    }

    pub async fn get_combined(&self) -> Result<Vec<Workload>, ClientError> {
        self.get_list("/api/data/combined").await
    }

    pub async fn fetch_pods(&self) -> Result<Vec<PodInfo>, ClientError> {
        self.get_list("/api/pods").await
    }

    pub async fn get_settings(&self) -> Result<Settings, ClientError> {
        self.get_json("/api/settings").await
    }

    pub async fn get_next_schedule_time(&self) -> Result<String, ClientError> {
        let body = self.get_text("/api/settings/next-schedule-time").await?;
        Ok(schedule_text(&body))
    }

    // --- Mutations ---

    pub async fn update_workload(&self, workload: &Workload) -> Result<(), ClientError> {
        self.submit(&Mutation::Refresh(workload)).await
    }

    pub async fn upgrade_workload(&self, workload: &Workload) -> Result<(), ClientError> {
        self.submit(&Mutation::Upgrade(workload)).await
    }

    pub async fn refresh_single(&self, workload: &Workload) -> Result<(), ClientError> {
        self.submit(&Mutation::RefreshSingle(workload)).await
    }

    pub async fn refresh_all(&self) -> Result<(), ClientError> {
        self.submit(&Mutation::RefreshAll).await
    }

    pub async fn submit(&self, mutation: &Mutation<'_>) -> Result<(), ClientError> {
        let base = self.require_base(mutation.path())?;
        let method = mutation.method();

        let mut req = self
            .http
            .request(method.clone(), format!("{}{}", base, mutation.path()))
            .header("Accept", "application/json");
        let query = mutation.query();
        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(body) = mutation.body() {
            req = req.json(body);
        }

        debug!("{} {} ({})", method, mutation.path(), mutation.target());
        let resp = req.send().await?;
        check_status(method, mutation.path(), resp.status())?;
        Ok(())
    }

    // --- Plumbing ---

    fn require_base(&self, path: &str) -> Result<&str, ClientError> {
        match self.base_url.as_deref() {
            Some(base) => Ok(base),
            None => {
                warn!("backend base URL is not configured, skipping {}", path);
                Err(ClientError::NotConfigured)
            }
        }
    }

    // Collections degrade to empty when the backend is not configured.
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        match self.get_json(path).await {
            Err(ClientError::NotConfigured) => Ok(Vec::new()),
            other => other,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let body = self.get_text(path).await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }

    async fn get_text(&self, path: &str) -> Result<String, ClientError> {
        let base = self.require_base(path)?;
        let resp = self
            .http
            .get(format!("{}{}", base, path))
            .header("Accept", "application/json")
            .send()
            .await?;

        check_status(Method::GET, path, resp.status())?;
        Ok(resp.text().await?)
    }
}

fn check_status(method: Method, path: &str, status: StatusCode) -> Result<(), ClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status {
            method,
            path: path.to_string(),
            status,
        })
    }
}
