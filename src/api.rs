use std::{io, time::Duration};

use crate::{
    config::AppConfig,
    curriculum::{FilterOption, LearningOutcome},
    questions::GenerateRequest,
    selection::FetchTarget,
    test_paper::{StrandEntry, TestCatalog, TestPaper, TestPaperRequest},
};
use reqwest::{Client, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: StatusCode,
        server_message: Option<String>,
    },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[from] io::Error),
}

impl ApiError {
    /// The `error` string the backend put in a failure body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }
}

/// HTTP access to the curriculum backend.
#[derive(Debug, Clone)]
pub struct CurriculumClient {
    client: Client,
    api_base: String,
}

impl CurriculumClient {
    pub fn new(api_base: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|err| {
            warn!("CurriculumClient: falling back to default HTTP client: {err}");
            Client::new()
        });
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// `GET /api/health`; returns the reported status string.
    pub async fn health(&self) -> Result<String, ApiError> {
        let body: Value = self.get_json("/api/health", &[]).await?;
        Ok(body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    /// Fetch the option list for a selector level.
    pub async fn fetch_options(&self, target: &FetchTarget) -> Result<Vec<FilterOption>, ApiError> {
        self.get_json(target.endpoint(), &target.query()).await
    }

    pub async fn fetch_learning_outcomes(
        &self,
        substrand_id: &str,
    ) -> Result<Vec<LearningOutcome>, ApiError> {
        let target = FetchTarget::LearningOutcomes {
            substrand_id: substrand_id.to_string(),
        };
        self.get_json(target.endpoint(), &target.query()).await
    }

    pub async fn generate_questions(
        &self,
        request: &GenerateRequest,
    ) -> Result<Vec<Value>, ApiError> {
        debug!(
            "CurriculumClient: generating {:?} {} question(s) for outcome {}",
            request.num_questions, request.question_type, request.learning_outcome_id
        );
        self.post_json("/api/questions/generate", request).await
    }

    /// `GET /api/strands?all=true`: every strand with its subject and grade.
    pub async fn fetch_all_strands(&self) -> Result<Vec<StrandEntry>, ApiError> {
        let target = FetchTarget::AllStrands;
        self.get_json(target.endpoint(), &target.query()).await
    }

    /// Subjects, grades and all strands, fetched concurrently.
    pub async fn fetch_test_catalog(&self) -> Result<TestCatalog, ApiError> {
        let (subjects, grades, strands) = tokio::try_join!(
            self.fetch_options(&FetchTarget::Subjects),
            self.fetch_options(&FetchTarget::Grades),
            self.fetch_all_strands(),
        )?;
        Ok(TestCatalog {
            subjects,
            grades,
            strands,
        })
    }

    /// `POST /api/tests/generate`.
    pub async fn generate_test(&self, request: &TestPaperRequest) -> Result<TestPaper, ApiError> {
        debug!(
            "CurriculumClient: generating a test paper with {} topic(s)",
            request.topics.len()
        );
        self.post_json("/api/tests/generate", request).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("CurriculumClient: POST {url}");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        decode_response(url, response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("CurriculumClient: GET {url} {query:?}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        decode_response(url, response).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    url: String,
    response: Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(|source| ApiError::Transport {
        url: url.clone(),
        source,
    })?;
    debug!("CurriculumClient: {url} answered {status}");
    interpret_body(url, status, &body)
}

fn interpret_body<T: DeserializeOwned>(
    url: String,
    status: StatusCode,
    body: &str,
) -> Result<T, ApiError> {
    if !status.is_success() {
        let server_message = server_error_message(body);
        warn!("CurriculumClient: {url} returned {status} with body: {body}");
        return Err(ApiError::Status {
            url,
            status,
            server_message,
        });
    }
    serde_json::from_str(body).map_err(|source| ApiError::Decode { url, source })
}

fn server_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
}
