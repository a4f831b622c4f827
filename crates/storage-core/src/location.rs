//! Geographic location storage
//!
//! A typed facade for persisting a single position fix. Negative accuracy,
//! course or speed values mean "not available", the usual convention for
//! position providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::BackendKind;
use crate::context::StorageContext;
use crate::error::{Result, StorageError};
use crate::storage::Storage;

/// A single position fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    /// Degrees, -90..=90
    pub latitude: f64,
    /// Degrees, -180..=180
    pub longitude: f64,
    /// Meters above sea level
    pub altitude: f64,
    /// Radius of uncertainty in meters
    pub horizontal_accuracy: f64,
    /// Altitude uncertainty in meters
    pub vertical_accuracy: f64,
    /// Heading in degrees from true north
    pub course: f64,
    /// Meters per second
    pub speed: f64,
    /// When the fix was taken
    pub timestamp: DateTime<Utc>,
}

impl GeoLocation {
    /// A fix with only a coordinate, taken now
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
            horizontal_accuracy: 0.0,
            vertical_accuracy: -1.0,
            course: -1.0,
            speed: -1.0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_altitude(mut self, altitude: f64, vertical_accuracy: f64) -> Self {
        self.altitude = altitude;
        self.vertical_accuracy = vertical_accuracy;
        self
    }

    pub fn with_horizontal_accuracy(mut self, accuracy: f64) -> Self {
        self.horizontal_accuracy = accuracy;
        self
    }

    pub fn with_motion(mut self, course: f64, speed: f64) -> Self {
        self.course = course;
        self.speed = speed;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether latitude and longitude are within range
    pub fn has_valid_coordinate(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// JSON has no NaN or infinity, so such fields would not read back
    fn check_finite(&self) -> Result<()> {
        let fields = [
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("altitude", self.altitude),
            ("horizontalAccuracy", self.horizontal_accuracy),
            ("verticalAccuracy", self.vertical_accuracy),
            ("course", self.course),
            ("speed", self.speed),
        ];

        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(StorageError::Encode(serde::ser::Error::custom(
                format!("{} is not finite ({})", field, value),
            ))),
            None => Ok(()),
        }
    }
}

/// Storage for the most recent [`GeoLocation`]
pub struct LocationStorage {
    storage: Storage<GeoLocation>,
}

impl LocationStorage {
    pub fn new(
        context: Arc<StorageContext>,
        kind: BackendKind,
        filename: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            storage: Storage::new(context, kind, filename)?,
        })
    }

    /// Replace the stored fix
    pub async fn save(&self, location: &GeoLocation) -> Result<()> {
        location.check_finite()?;
        self.storage.save(location).await
    }

    /// The stored fix, if any
    pub async fn stored_value(&self) -> Option<GeoLocation> {
        self.storage.stored_value().await
    }

    pub async fn clear(&self) {
        self.storage.clear().await
    }

    /// Underlying typed storage
    pub fn storage(&self) -> &Storage<GeoLocation> {
        &self.storage
    }
}
