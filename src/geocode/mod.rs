// Geocoding: persistent per-board cache, geocoder port, and the sequential
// rate-limited pipeline that enriches cards with coordinates.

pub mod cache;
pub mod nominatim;
pub mod pipeline;

pub use cache::GeocodeCache;
pub use nominatim::{Geocoder, NominatimGeocoder};
pub use pipeline::{GeocodePipeline, GeocodeRunSummary, PipelineState};
