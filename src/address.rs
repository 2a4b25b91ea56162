//! Heuristic extraction of a geocodable query from free-text card
//! descriptions. Each matcher is pure and independently testable; `MATCHERS`
//! is the single source of truth for precedence (first match wins).

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::trace;

type Matcher = fn(&str) -> Option<String>;

/// Precedence-ordered matcher list. Earlier entries win.
const MATCHERS: &[(&str, Matcher)] = &[
    ("map_link_coords", match_map_link_coords),
    ("url_query_param", match_url_query_param),
    ("place_path", match_place_path),
    ("short_link", match_short_link),
    ("bare_coords", match_bare_coords),
    ("street_line", match_street_line),
    ("first_line", match_first_line),
];

/// Extracts a geocodable query (or raw "lat,lng") from a card description.
/// `None` means the card never geocodes until its description changes.
pub fn extract(description: &str) -> Option<String> {
    let text = description.trim();
    if text.is_empty() {
        return None;
    }
    for (name, matcher) in MATCHERS {
        if let Some(query) = matcher(text) {
            trace!(matcher = name, query = %query, "address matcher hit");
            return Some(query);
        }
    }
    None
}

/// Parses a "lat,lng" query into numeric coordinates, bounds-checked.
pub fn parse_latlng(query: &str) -> Option<(f64, f64)> {
    let caps = LATLNG_EXACT.captures(query)?;
    let lat: f64 = caps[1].parse().ok()?;
    let lng: f64 = caps[2].parse().ok()?;
    in_range(lat, lng).then_some((lat, lng))
}

fn in_range(lat: f64, lng: f64) -> bool {
    lat.abs() <= 90.0 && lng.abs() <= 180.0
}

static AT_COORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(-?\d{1,3}\.\d+),(-?\d{1,3}\.\d+)").unwrap());
static URL_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[?&](?:q|query)=([^&\s]+)").unwrap());
static LATLNG_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-?\d{1,3}(?:\.\d+)?)\s*,\s*(-?\d{1,3}(?:\.\d+)?)\s*$").unwrap());
static PLACE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/place/([^/\s?#]+)").unwrap());
static SHORT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:maps\.app\.goo\.gl|goo\.gl/maps|g\.co)/[^\s)>,]+").unwrap()
});
static BARE_COORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d{1,3}\.\d+)\s*,\s*(-?\d{1,3}\.\d+)").unwrap());
static STREET_NUMBER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\d+[a-z]?(?:\s*[-/]\s*\d+[a-z]?)?\s+.+\b(?:st|street|rd|road|ave|avenue|dr|drive|ct|court|pl|place|hwy|highway|ln|lane|blvd|boulevard|cres|crescent|pde|parade|tce|terrace|esplanade|way)\b",
    )
    .unwrap()
});
static CORNER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:corner\s+of|cnr\.?)\s+.+(?:&|\band\b).+").unwrap());
static SUBURB_STATE_POSTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:VIC|NSW|QLD|SA|WA|TAS|NT|ACT)\s+\d{4}\b").unwrap());
static REFERENCE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:S\d+|[A-Z]{2}\d+)").unwrap());

/// 1. Map-link "@lat,lng" embedded anywhere in the text.
fn match_map_link_coords(text: &str) -> Option<String> {
    AT_COORDS
        .captures(text)
        .map(|caps| format!("{},{}", &caps[1], &caps[2]))
}

/// 2. URL `q`/`query` parameter: coordinates verbatim, otherwise the decoded
///    free-text query.
fn match_url_query_param(text: &str) -> Option<String> {
    let caps = URL_QUERY.captures(text)?;
    let raw = &caps[1];
    if LATLNG_EXACT.is_match(raw) {
        return Some(raw.to_string());
    }
    Some(url_decode(raw))
}

/// 3. Place name encoded in a URL path segment.
fn match_place_path(text: &str) -> Option<String> {
    PLACE_PATH
        .captures(text)
        .map(|caps| url_decode(&caps[1]))
}

/// 4. Shortened map link, returned whole; the geocoder follows redirects.
fn match_short_link(text: &str) -> Option<String> {
    SHORT_LINK.find(text).map(|m| m.as_str().to_string())
}

/// 5. Bare "lat,lng" pair, accepted only inside geographic range so version
///    strings and phone numbers don't read as coordinates.
fn match_bare_coords(text: &str) -> Option<String> {
    for caps in BARE_COORDS.captures_iter(text) {
        let lat: f64 = caps[1].parse().ok()?;
        let lng: f64 = caps[2].parse().ok()?;
        if in_range(lat, lng) {
            return Some(format!("{},{}", &caps[1], &caps[2]));
        }
    }
    None
}

/// 6. Line shaped like a street address: leading street number + type suffix,
///    "corner of X & Y", or "<suburb> <STATE> <postcode>".
fn match_street_line(text: &str) -> Option<String> {
    text.lines().map(str::trim).find(|line| {
        STREET_NUMBER_LINE.is_match(line)
            || CORNER_LINE.is_match(line)
            || SUBURB_STATE_POSTCODE.is_match(line)
    })
    .map(str::to_string)
}

/// 7. Fallback: the first non-empty line, unless it is an internal reference
///    code or a URL the earlier matchers already rejected.
fn match_first_line(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    if REFERENCE_CODE.is_match(line) || line.starts_with("http") {
        return None;
    }
    Some(line.to_string())
}

fn url_decode(raw: &str) -> String {
    let plused = raw.replace('+', " ");
    percent_decode_str(&plused)
        .decode_utf8_lossy()
        .into_owned()
}
