use crate::parse::Args;
use crate::session::SessionContext;
use log::warn;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const API_URL_VAR: &str = "PARA_API_URL";
pub const USER_ID_VAR: &str = "PARA_USER_ID";
pub const LATITUDE_VAR: &str = "PARA_LAT";
pub const LONGITUDE_VAR: &str = "PARA_LON";

/// Settings resolved from flags first, then environment, then defaults.
///
/// `position` is the best-effort device location and only comes from the
/// environment; `nearby --lat/--lon` is an explicit choice handled by the
/// command itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub user_id: Option<String>,
    pub position: Option<(f64, f64)>,
}

impl ClientConfig {
    pub fn from_args(args: &Args) -> Self {
        Self::resolve(args, |key| env::var(key).ok())
    }

    fn resolve(args: &Args, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = args
            .api_url
            .clone()
            .or_else(|| lookup(API_URL_VAR))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let user_id = args
            .user_id
            .clone()
            .or_else(|| lookup(USER_ID_VAR))
            .filter(|id| !id.trim().is_empty());

        let latitude = parse_env_float(&lookup, LATITUDE_VAR);
        let longitude = parse_env_float(&lookup, LONGITUDE_VAR);
        let position = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            (None, None) => None,
            _ => {
                warn!("Ignoring partial location: both latitude and longitude are required");
                None
            }
        };

        Self {
            api_url,
            timeout: Duration::from_secs(args.timeout),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            user_id,
            position,
        }
    }

    pub fn session(&self) -> SessionContext {
        match &self.user_id {
            Some(user_id) => SessionContext::logged_in(user_id.clone()),
            None => SessionContext::anonymous(),
        }
    }
}

fn parse_env_float(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
