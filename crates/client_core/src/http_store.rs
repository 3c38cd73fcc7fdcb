use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Candidate, CandidateId, CandidateStatus, NewCandidate},
    error::{ApiError, StoreError},
    protocol::{UpdateStatusRequest, ACCESS_KEY_HEADER},
};
use storage::CandidateStore;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;

/// Candidate store reached over the hosted REST service.
#[derive(Clone)]
pub struct HttpCandidateStore {
    http: Client,
    base_url: Url,
    access_key: String,
}

impl HttpCandidateStore {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.store_url.clone(),
            access_key: config.access_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).map_err(StoreError::unavailable)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StoreError> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "candidate store request");
        Ok(self
            .http
            .request(method, url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .bearer_auth(&self.access_key))
    }
}

#[async_trait]
impl CandidateStore for HttpCandidateStore {
    async fn list(&self) -> Result<Vec<Candidate>, StoreError> {
        let response = send(self.request(Method::GET, "/candidates")?).await?;
        read_json(response, None).await
    }

    async fn create(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let builder = self.request(Method::POST, "/candidates")?.json(&candidate);
        read_json(send(builder).await?, None).await
    }

    async fn update_status(
        &self,
        candidate_id: &CandidateId,
        status: CandidateStatus,
    ) -> Result<Candidate, StoreError> {
        let builder = self
            .request(Method::PATCH, &format!("/candidates/{candidate_id}"))?
            .json(&UpdateStatusRequest { status });
        read_json(send(builder).await?, Some(candidate_id)).await
    }

    async fn delete(&self, candidate_id: &CandidateId) -> Result<(), StoreError> {
        let builder = self.request(Method::DELETE, &format!("/candidates/{candidate_id}"))?;
        check_status(send(builder).await?, Some(candidate_id)).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        check_status(send(self.request(Method::GET, "/healthz")?).await?, None).await?;
        Ok(())
    }
}

async fn send(builder: RequestBuilder) -> Result<Response, StoreError> {
    builder.send().await.map_err(StoreError::unavailable)
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    candidate_id: Option<&CandidateId>,
) -> Result<T, StoreError> {
    check_status(response, candidate_id)
        .await?
        .json::<T>()
        .await
        .map_err(StoreError::unavailable)
}

async fn check_status(
    response: Response,
    candidate_id: Option<&CandidateId>,
) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };
    Err(match (status, candidate_id) {
        (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound(id.clone()),
        (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, _) => {
            StoreError::Rejected(message)
        }
        _ => StoreError::Unavailable(format!("{status}: {message}")),
    })
}

#[cfg(test)]
#[path = "tests/http_store_tests.rs"]
mod tests;
