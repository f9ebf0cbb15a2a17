use crate::error::LocationError;
use crate::record::Coordinate;
use crate::traits::LocationSource;
use async_trait::async_trait;

/// Position supplied up front (command-line flags or environment).
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    position: Option<(f64, f64)>,
}

impl FixedLocation {
    pub fn new(position: Option<(f64, f64)>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        let (latitude, longitude) = self.position.ok_or(LocationError::Unavailable)?;
        Ok(Coordinate::new(latitude, longitude)?)
    }
}
