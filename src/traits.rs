use crate::error::{ApiError, LocationError};
use crate::record::{
    Categories, Coordinate, NearbyQuery, NearbyResponse, RatingCreate, Sighting, SightingCreate,
    SightingFilter, Stats,
};
use async_trait::async_trait;

/// The remote sightings service. Every piece of domain logic (scoring,
/// AI analysis, distance search) lives behind this seam.
#[async_trait]
pub trait SightingsApi: Send + Sync {
    async fn list_sightings(&self, filter: &SightingFilter) -> Result<Vec<Sighting>, ApiError>;

    async fn get_sighting(&self, id: &str) -> Result<Sighting, ApiError>;

    /// Store a new report; the created record comes back analysed.
    async fn create_sighting(&self, report: &SightingCreate) -> Result<Sighting, ApiError>;

    /// Append a rating. The returned record is not relied upon; callers
    /// re-fetch the sighting afterwards.
    async fn rate_sighting(&self, id: &str, rating: &RatingCreate) -> Result<Sighting, ApiError>;

    async fn nearby(&self, query: &NearbyQuery) -> Result<NearbyResponse, ApiError>;

    async fn analyze(&self, id: &str) -> Result<Sighting, ApiError>;

    async fn categories(&self) -> Result<Categories, ApiError>;

    async fn stats(&self) -> Result<Stats, ApiError>;
}

/// Platform location service. One call, one answer; no retries.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}
