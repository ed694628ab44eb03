//! Base pattern library shared by every decoder.
//!
//! Named regular-expression fragments that format templates reference as
//! `{IDENT}` placeholders, plus the helpers that go with them: decimal
//! coordinate parsing and the ICAO false-positive blocklist.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Named base patterns available to every format template.
pub static BASE_PATTERNS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Four-letter airport identifier. Any letter prefix is accepted;
        // candidates must still pass the blocklist check.
        ("ICAO", r"[A-Z]{4}"),
        ("LAT_DIR", r"[NS]"),
        ("LON_DIR", r"[EW]"),
        // Airline designator plus flight number, e.g. UAL123 or JST577A
        ("FLIGHT", r"[A-Z]{2,3}\d{1,4}[A-Z]?"),
        // Aviation fix identifier, e.g. BEGLA or NUPNI
        ("WAYPOINT", r"[A-Z0-9]{2,5}"),
        // Runway designator, e.g. 08, 22L
        ("RUNWAY", r"\d{2}[LRC]?"),
        // Transponder code
        ("SQUAWK", r"\d{4}"),
        // Standard instrument departure, e.g. DEEZZ5, ROBUC3A
        ("SID", r"[A-Z]{3,7}\d[A-Z]?"),
        // VHF frequency, e.g. 130.025
        ("FREQ", r"1\d{2}\.\d{1,3}"),
    ])
});

/// English words that match the ICAO pattern but are never airport codes.
/// Hand-curated from false positives observed in live traffic; sorted so
/// membership is a binary search.
static ICAO_BLOCKLIST: &[&str] = &[
    "ABLE", "ALSO", "AREA", "BEEN", "BEST", "CALL", "COME", "DATA", "DOWN", "EACH", "FROM",
    "FUEL", "GATE", "GOOD", "HAVE", "HERE", "HOLD", "INFO", "INTO", "LAST", "LINE", "MORE",
    "MUST", "NEXT", "NONE", "ONLY", "OVER", "PLAN", "PUSH", "SEND", "SOME", "STOP", "TAXI",
    "TEXT", "THAN", "THAT", "THEM", "THEN", "THEY", "THIS", "TIME", "UPON", "VERY", "WHEN",
    "WILL", "WIND", "WITH", "YOUR",
];

/// True if the token is a known non-airport word.
pub fn icao_blocklist_contains(token: &str) -> bool {
    ICAO_BLOCKLIST.binary_search(&token).is_ok()
}

/// Parse a decimal-degree coordinate string and apply the hemisphere:
/// `S` and `W` negate. Returns `None` for non-numeric input.
pub fn parse_decimal_coord(value: &str, dir: &str) -> Option<f64> {
    let v: f64 = value.trim().parse().ok()?;
    match dir {
        "S" | "W" => Some(-v),
        _ => Some(v),
    }
}
