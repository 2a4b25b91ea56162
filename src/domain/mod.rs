// Domain data shapes shared across layers

pub mod card;
pub mod layout;
pub mod window;

pub use card::{creation_time_of, Card, Label, LatLng};
pub use layout::{Block, List, MarkerRule, OverrideKind};
pub use window::{Filters, TimeWindow};
