use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::record::{
    Categories, NearbyQuery, NearbyResponse, RatingCreate, Sighting, SightingCreate, SightingFilter,
    Stats,
};
use crate::traits::SightingsApi;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP client for the sightings REST API.
///
/// Every call is a single attempt. Failures are returned to the caller,
/// which decides what to show; nothing here retries.
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&config.api_url)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        debug!("Using sightings API at {}", base_url);
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `base/segment/segment`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let url = self.endpoint(segments)?;
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!("POST {}", url);
        let response = self.client.post(url).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl SightingsApi for ApiClient {
    async fn list_sightings(&self, filter: &SightingFilter) -> Result<Vec<Sighting>, ApiError> {
        let url = self.endpoint(&["sightings"])?;
        debug!("GET {} {:?}", url, filter);
        let response = self
            .client
            .get(url)
            .query(&filter.query_pairs())
            .send()
            .await?;
        decode(response).await
    }

    async fn get_sighting(&self, id: &str) -> Result<Sighting, ApiError> {
        self.get(&["sightings", id]).await
    }

    async fn create_sighting(&self, report: &SightingCreate) -> Result<Sighting, ApiError> {
        self.post(&["sightings"], report).await
    }

    async fn rate_sighting(&self, id: &str, rating: &RatingCreate) -> Result<Sighting, ApiError> {
        self.post(&["sightings", id, "rate"], rating).await
    }

    async fn nearby(&self, query: &NearbyQuery) -> Result<NearbyResponse, ApiError> {
        self.post(&["sightings", "nearby"], query).await
    }

    async fn analyze(&self, id: &str) -> Result<Sighting, ApiError> {
        self.post_empty(&["sightings", id, "analyze"]).await
    }

    async fn categories(&self) -> Result<Categories, ApiError> {
        self.get(&["categories"]).await
    }

    async fn stats(&self) -> Result<Stats, ApiError> {
        self.get(&["stats"]).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("cannot be a base".to_string()));
    }
    Ok(url)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let detail = error_detail(&body);
        warn!("Server returned {}: {}", status, detail);
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Pull the message out of a FastAPI-style `{"detail": ...}` error body
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(message),
        }) => message,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
