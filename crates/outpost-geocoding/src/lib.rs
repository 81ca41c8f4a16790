//! Outpost Geocoding - coordinate resolution for scraped outlets.
//!
//! Resolves an outlet's GPS position in two stages: coordinates embedded in a
//! captured navigation-link URL, then a lookup against a Nominatim-compatible
//! geocoding service using progressively simpler address variants. Every
//! coordinate pair is checked against the metro bounding boxes before it is
//! accepted.
//!
//! # Example
//!
//! ```rust
//! use outpost_geocoding::{extract_coordinates, CoordinateValidator};
//!
//! let point = extract_coordinates("https://waze.com/ul?ll=3.1570,101.7123&navigate=yes")
//!     .expect("coordinates in link");
//! let report = CoordinateValidator::default().validate(point);
//! assert!(report.is_valid);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod error;
pub mod gate;
pub mod navlink;
pub mod normalizer;
pub mod pipeline;
pub mod validator;

// Re-export commonly used types
pub use client::{GeocodeHit, GeocodeOutcome, GeocodingClient, NominatimClient};
pub use error::{GeocodingError, Result};
pub use gate::RequestGate;
pub use navlink::extract_coordinates;
pub use normalizer::AddressNormalizer;
pub use pipeline::{GeocodingPipeline, PipelineReport};
pub use validator::{BoundingBox, CoordinateValidator, Validation};
