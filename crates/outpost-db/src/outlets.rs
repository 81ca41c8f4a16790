//! Outlet persistence.
//!
//! One row per outlet, keyed by the unique brand-prefixed name. Features
//! are stored as a JSON array of their display labels; geocoding status
//! and location type use their snake_case names.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use outpost_core::{Coordinates, Feature, GeocodingStatus, LocationType, OutletDraft};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

const KM_PER_DEGREE: f64 = 111.32;

const SELECT_COLUMNS: &str = "SELECT id, name, address, operating_hours, phone, navigation_link, \
     latitude, longitude, features, geocoding_status, geocoding_confidence, location_type, \
     created_at, updated_at FROM outlets";

/// A stored outlet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletRecord {
    /// Row id
    pub id: i64,
    /// Brand-prefixed outlet name
    pub name: String,
    /// Free-text address
    pub address: String,
    /// Opening hours as listed
    pub operating_hours: Option<String>,
    /// Contact number
    pub phone: Option<String>,
    /// Navigation-service URL
    pub navigation_link: Option<String>,
    /// Latitude, when geocoded
    pub latitude: Option<f64>,
    /// Longitude, when geocoded
    pub longitude: Option<f64>,
    /// Amenity tags
    pub features: Vec<Feature>,
    /// Geocoding outcome
    pub geocoding_status: Option<GeocodingStatus>,
    /// Geocoding confidence
    pub geocoding_confidence: Option<f64>,
    /// Where the coordinates came from
    pub location_type: Option<LocationType>,
    /// Insert time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl OutletRecord {
    /// Stored coordinates, when both halves are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// An outlet together with its distance from a query point.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyOutlet {
    /// The stored outlet
    pub outlet: OutletRecord,
    /// Great-circle distance, kilometres
    pub distance_km: f64,
}

/// Check a draft before it is written.
///
/// Name and address must be non-empty, the name must start with
/// `required_prefix` when one is given, and coordinates must lie within
/// global bounds.
pub fn validate_outlet(draft: &OutletDraft, required_prefix: Option<&str>) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(DatabaseError::Invalid("name is empty".to_string()));
    }
    if draft.address.trim().is_empty() {
        return Err(DatabaseError::Invalid(format!(
            "address is empty for {}",
            draft.name
        )));
    }
    if let Some(prefix) = required_prefix {
        if !draft.name.starts_with(prefix) {
            return Err(DatabaseError::Invalid(format!(
                "name does not start with {prefix}: {}",
                draft.name
            )));
        }
    }
    if let Some(coordinates) = draft.coordinates() {
        if !coordinates.is_within_global_bounds() {
            return Err(DatabaseError::Invalid(format!(
                "coordinates out of bounds: {coordinates}"
            )));
        }
    }
    Ok(())
}

/// Insert an outlet and return its row id.
///
/// # Errors
/// Returns `DatabaseError::Duplicate` when the name is already stored.
pub async fn insert_outlet(pool: &Pool<Sqlite>, draft: &OutletDraft) -> Result<i64> {
    let features: Vec<Feature> = draft.features.iter().copied().collect();
    let features_json = serde_json::to_string(&features)
        .map_err(|e| DatabaseError::Query(format!("features not serializable: {e}")))?;
    let geocoding = draft.geocoding();
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO outlets (name, address, operating_hours, phone, navigation_link, \
         latitude, longitude, features, geocoding_status, geocoding_confidence, location_type, \
         created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&draft.name)
    .bind(&draft.address)
    .bind(&draft.operating_hours)
    .bind(&draft.phone)
    .bind(&draft.navigation_link)
    .bind(draft.latitude())
    .bind(draft.longitude())
    .bind(&features_json)
    .bind(geocoding.map(|g| g.status.to_string()))
    .bind(geocoding.map(|g| g.confidence))
    .bind(geocoding.map(|g| g.location_type.to_string()))
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(DatabaseError::Duplicate {
                name: draft.name.clone(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Whether an outlet with this exact name is stored.
pub async fn outlet_exists(pool: &Pool<Sqlite>, name: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM outlets WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Fetch one outlet by row id.
///
/// # Errors
/// Returns `DatabaseError::NotFound` if no row has this id.
pub async fn get_outlet(pool: &Pool<Sqlite>, id: i64) -> Result<OutletRecord> {
    let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;
    decode_row(&row)
}

/// Number of stored outlets.
pub async fn count_outlets(pool: &Pool<Sqlite>) -> Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM outlets")
        .fetch_one(pool)
        .await?)
}

/// Stored outlets in insertion order, at most `limit` of them.
pub async fn list_outlets(pool: &Pool<Sqlite>, limit: i64) -> Result<Vec<OutletRecord>> {
    let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id ASC LIMIT ?"))
        .bind(limit)
        .fetch_all(pool)
        .await?;
    rows.iter().map(decode_row).collect()
}

/// Geocoded outlets within `radius_km` of `center`, nearest first.
///
/// A bounding box narrows the scan in SQL; exact distances are then
/// computed with the haversine formula.
pub async fn nearby_outlets(
    pool: &Pool<Sqlite>,
    center: Coordinates,
    radius_km: f64,
    limit: usize,
) -> Result<Vec<NearbyOutlet>> {
    if radius_km <= 0.0 || limit == 0 {
        return Ok(Vec::new());
    }

    let lat_delta = radius_km / KM_PER_DEGREE;
    let lon_scale = center.latitude.to_radians().cos().abs().max(0.01);
    let lon_delta = (radius_km / (KM_PER_DEGREE * lon_scale)).min(180.0);

    let rows = sqlx::query(&format!(
        "{SELECT_COLUMNS} WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
         AND latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?"
    ))
    .bind(center.latitude - lat_delta)
    .bind(center.latitude + lat_delta)
    .bind(center.longitude - lon_delta)
    .bind(center.longitude + lon_delta)
    .fetch_all(pool)
    .await?;

    let mut nearby = Vec::new();
    for row in &rows {
        let outlet = decode_row(row)?;
        let Some(position) = outlet.coordinates() else {
            continue;
        };
        let distance_km = center.distance_km(&position);
        if distance_km <= radius_km {
            nearby.push(NearbyOutlet {
                outlet,
                distance_km,
            });
        }
    }

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby.truncate(limit);

    tracing::debug!(
        found = nearby.len(),
        radius_km,
        center = %center,
        "Nearby outlet query"
    );
    Ok(nearby)
}

fn decode_row(row: &SqliteRow) -> Result<OutletRecord> {
    let features_json: String = row.try_get("features")?;
    let features: Vec<Feature> = serde_json::from_str(&features_json)
        .map_err(|e| DatabaseError::Decode(format!("features: {e}")))?;

    let geocoding_status = row
        .try_get::<Option<String>, _>("geocoding_status")?
        .map(|s| parse_status(&s))
        .transpose()?;
    let location_type = row
        .try_get::<Option<String>, _>("location_type")?
        .map(|s| parse_location_type(&s))
        .transpose()?;

    Ok(OutletRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        operating_hours: row.try_get("operating_hours")?,
        phone: row.try_get("phone")?,
        navigation_link: row.try_get("navigation_link")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        features,
        geocoding_status,
        geocoding_confidence: row.try_get("geocoding_confidence")?,
        location_type,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

fn parse_status(value: &str) -> Result<GeocodingStatus> {
    match value {
        "success" => Ok(GeocodingStatus::Success),
        "failed" => Ok(GeocodingStatus::Failed),
        other => Err(DatabaseError::Decode(format!("geocoding status: {other}"))),
    }
}

fn parse_location_type(value: &str) -> Result<LocationType> {
    match value {
        "navigation_link" => Ok(LocationType::NavigationLink),
        "geocoded" => Ok(LocationType::Geocoded),
        "failed" => Ok(LocationType::Failed),
        other => Err(DatabaseError::Decode(format!("location type: {other}"))),
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Decode(format!("timestamp {value}: {e}")))
}
