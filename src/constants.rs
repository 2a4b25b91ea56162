/// Engine-wide defaults shared between the CLI, facade, and pipeline.

/// Variant applied to a marker when no rule matches.
pub const DEFAULT_MARKER_COLOR: &str = "blue";
pub const DEFAULT_MARKER_ICON: &str = "pin";

/// Inter-request delay for the public geocoder. Sequential lookups spaced at
/// just over a second keep us under the service's one-request-per-second cap.
pub const GEOCODE_DELAY_MS: u64 = 1100;

/// Floor for the auto-refresh interval; anything lower would hammer the
/// board API for no benefit.
pub const MIN_REFRESH_SECS: u64 = 15;

/// Query parameter names the board API uses for credential auth.
pub const AUTH_KEY_PARAM: &str = "key";
pub const AUTH_TOKEN_PARAM: &str = "token";
