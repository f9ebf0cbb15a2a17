use crate::error::{CoordinateError, RadiusError};
use crate::rating::average;
use crate::util::flexible_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A validated position on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Location as stored by the backend. Not validated on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
}

impl Location {
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude, self.longitude).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: String,
    pub score: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    /// Parsed from model output on the server and never range-checked there
    pub credibility_score: i64,
    pub analysis_summary: String,
    #[serde(default)]
    pub similar_cases: Vec<String>,
    #[serde(default)]
    pub suggested_investigation_steps: Vec<String>,
    #[serde(with = "flexible_datetime")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: Location,
    #[serde(with = "flexible_datetime")]
    pub date_occurred: DateTime<Utc>,
    #[serde(default)]
    pub evidence_photos: Vec<String>,
    #[serde(default = "default_witness_count")]
    pub witness_count: i64,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub reporter_name: Option<String>,
    #[serde(default)]
    pub reporter_email: Option<String>,
}

fn default_witness_count() -> i64 {
    1
}

impl Default for Sighting {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            category: String::new(),
            location: Location::default(),
            date_occurred: DateTime::<Utc>::default(),
            evidence_photos: Vec::new(),
            witness_count: default_witness_count(),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
            ratings: Vec::new(),
            ai_analysis: None,
            verified: false,
            reporter_name: None,
            reporter_email: None,
        }
    }
}

/// Flat projection of a sighting for CSV export.
#[derive(Debug, Clone, Serialize)]
pub struct SightingRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date_occurred: String,
    pub witness_count: i64,
    pub verified: bool,
    pub rating_count: usize,
    pub rating_average: f64,
    pub credibility_score: Option<i64>,
}

impl From<&Sighting> for SightingRow {
    fn from(sighting: &Sighting) -> Self {
        Self {
            id: sighting.id.clone(),
            title: sighting.title.clone(),
            category: sighting.category.clone(),
            latitude: sighting.location.latitude,
            longitude: sighting.location.longitude,
            date_occurred: sighting.date_occurred.to_rfc3339(),
            witness_count: sighting.witness_count,
            verified: sighting.verified,
            rating_count: sighting.ratings.len(),
            rating_average: (average(&sighting.ratings) * 10.0).round() / 10.0,
            credibility_score: sighting.ai_analysis.as_ref().map(|a| a.credibility_score),
        }
    }
}

/// One entry of a proximity search. The backend sends whole sighting
/// documents; only these fields are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyResult {
    #[serde(rename = "id")]
    pub sighting_id: String,
    pub title: String,
    pub category: String,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyResponse {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub sightings: Vec<NearbyResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl NearbyQuery {
    pub fn new(center: Coordinate, radius: RadiusKm) -> Self {
        Self {
            latitude: center.latitude(),
            longitude: center.longitude(),
            radius_km: f64::from(radius.km()),
        }
    }
}

/// A new sighting report. The backend checks the category and runs the
/// AI analysis before storing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SightingCreate {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: Location,
    #[serde(with = "flexible_datetime")]
    pub date_occurred: DateTime<Utc>,
    pub witness_count: u32,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    pub evidence_photos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingCreate {
    pub user_id: String,
    pub score: u8,
    pub comment: Option<String>,
}

/// Search radii offered by the proximity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadiusKm {
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
    TwoHundredFifty,
}

impl RadiusKm {
    pub const ALL: [RadiusKm; 5] = [
        RadiusKm::Ten,
        RadiusKm::TwentyFive,
        RadiusKm::Fifty,
        RadiusKm::Hundred,
        RadiusKm::TwoHundredFifty,
    ];

    pub fn km(self) -> u32 {
        match self {
            RadiusKm::Ten => 10,
            RadiusKm::TwentyFive => 25,
            RadiusKm::Fifty => 50,
            RadiusKm::Hundred => 100,
            RadiusKm::TwoHundredFifty => 250,
        }
    }
}

impl TryFrom<u32> for RadiusKm {
    type Error = RadiusError;

    fn try_from(km: u32) -> Result<Self, Self::Error> {
        RadiusKm::ALL
            .into_iter()
            .find(|radius| radius.km() == km)
            .ok_or_else(|| RadiusError::Unsupported(km.to_string()))
    }
}

impl FromStr for RadiusKm {
    type Err = RadiusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches("km");
        trimmed
            .parse::<u32>()
            .map_err(|_| RadiusError::Unsupported(s.to_string()))
            .and_then(RadiusKm::try_from)
    }
}

impl fmt::Display for RadiusKm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}km", self.km())
    }
}

/// Query parameters for the sighting listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SightingFilter {
    pub category: Option<String>,
    pub verified: Option<bool>,
    pub limit: u32,
    pub skip: u32,
}

impl Default for SightingFilter {
    fn default() -> Self {
        Self {
            category: None,
            verified: None,
            limit: 100,
            skip: 0,
        }
    }
}

impl SightingFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(verified) = self.verified {
            pairs.push(("verified", verified.to_string()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("skip", self.skip.to_string()));
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Categories {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub haunting_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_sightings: u64,
    #[serde(default)]
    pub verified_sightings: u64,
    #[serde(default)]
    pub categories: BTreeMap<String, u64>,
    #[serde(default)]
    pub haunting_reports: u64,
    #[serde(default)]
    pub active_investigators: u64,
    #[serde(default)]
    pub equipment_reviews: u64,
}
