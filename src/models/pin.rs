// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin model and coordinate handling.
//!
//! A pin's position is stored twice: as a GeoJSON `Point` in `location` and
//! as explicit `latitude`/`longitude` columns. Both are always written from
//! the same [`Coordinates`] value.

use chrono::{DateTime, Utc};
use geo::{coord, Intersects, Point, Rect};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

pub const DEFAULT_PIN_TYPE: &str = "plant";
pub const DEFAULT_PIN_STATUS: &str = "active";

/// A geotagged entity (usually a plant) inside a project.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// GeoJSON Point, `[longitude, latitude]`
    pub location: Json<geojson::Geometry>,
    pub latitude: f64,
    pub longitude: f64,
    pub pin_type: String,
    pub status: String,
    pub metadata: Option<Json<serde_json::Value>>,
    pub is_public: bool,
    pub is_active: bool,
    pub project_id: Uuid,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pin {
    /// Pin position as a `geo` point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validate a coordinate pair.
    ///
    /// Rejects missing or non-finite values, values outside the WGS84 range,
    /// and the exact `(0, 0)` pair, which almost always means the client
    /// never set a position.
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, AppError> {
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(AppError::Validation(
                "Invalid coordinates: latitude and longitude must be numbers".to_string(),
            ));
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(AppError::Validation(
                "Invalid coordinates: latitude and longitude must be numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::Validation(format!(
                "Invalid coordinates: ({}, {}) is out of range",
                latitude, longitude
            )));
        }
        if latitude == 0.0 && longitude == 0.0 {
            return Err(AppError::Validation(
                "Invalid coordinates: cannot create pin at coordinates (0, 0)".to_string(),
            ));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// GeoJSON geometry for the `location` column.
    pub fn to_geometry(self) -> geojson::Geometry {
        let point = Point::new(self.longitude, self.latitude);
        geojson::Geometry::new(geojson::Value::from(&point))
    }
}

/// Input for creating a pin.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePinInput {
    #[validate(length(min = 1, max = 255, message = "Pin name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(length(max = 100))]
    pub pin_type: Option<String>,
    #[validate(length(max = 50))]
    pub status: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub is_public: Option<bool>,
    pub project_id: Uuid,
}

impl CreatePinInput {
    /// Strip surrounding whitespace before validation.
    pub fn trimmed(mut self) -> Self {
        self.name = super::trimmed(self.name);
        self
    }
}

/// Partial update for a pin. Coordinates must be given together.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePinInput {
    #[validate(length(min = 1, max = 255, message = "Pin name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(length(max = 100))]
    pub pin_type: Option<String>,
    #[validate(length(max = 50))]
    pub status: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub is_public: Option<bool>,
}

impl UpdatePinInput {
    /// Strip surrounding whitespace before validation.
    pub fn trimmed(mut self) -> Self {
        self.name = self.name.map(super::trimmed);
        self
    }

    /// Coordinates carried by this patch, if any.
    ///
    /// Exactly one of latitude/longitude is a validation error.
    pub fn coordinates(&self) -> Result<Option<Coordinates>, AppError> {
        match (self.latitude, self.longitude) {
            (None, None) => Ok(None),
            (Some(_), Some(_)) => Coordinates::new(self.latitude, self.longitude).map(Some),
            _ => Err(AppError::Validation(
                "latitude and longitude must be updated together".to_string(),
            )),
        }
    }
}

/// Rectangular map viewport.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub project_id: Option<Uuid>,
}

impl MapBounds {
    /// Validate the bounds and convert them to a `geo` rectangle.
    ///
    /// Viewports crossing the antimeridian (`west > east`) are rejected.
    pub fn to_rect(&self) -> Result<Rect<f64>, AppError> {
        let values = [self.north, self.south, self.east, self.west];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Validation(
                "Map bounds must be finite numbers".to_string(),
            ));
        }
        if self.south > self.north {
            return Err(AppError::Validation(
                "Map bounds: south must not exceed north".to_string(),
            ));
        }
        if self.west > self.east {
            return Err(AppError::Validation(
                "Map bounds: west must not exceed east".to_string(),
            ));
        }
        if self.south < -90.0 || self.north > 90.0 || self.west < -180.0 || self.east > 180.0 {
            return Err(AppError::Validation(
                "Map bounds are outside the valid coordinate range".to_string(),
            ));
        }

        Ok(Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        ))
    }
}

/// True if the pin lies inside (or on the edge of) the rectangle.
pub fn pin_in_rect(rect: &Rect<f64>, pin: &Pin) -> bool {
    rect.intersects(&pin.point())
}
