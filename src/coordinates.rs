//! Coordinate-format decision tree.
//!
//! ACARS dialects encode latitude and longitude in at least six ways, and
//! several decoders need the same disambiguation logic. It lives here once:
//!
//! | Source form | Interpretation |
//! |---|---|
//! | `DDMMD` (5 digits) | degrees + (minutes*10 + tenths)/60 |
//! | `DDMMTT` (6 digits) | degrees + (minutes*100 + hundredths)/6000 |
//! | `DDDMMD` (6 digits) | 3-digit degrees variant, only when degrees > 90 |
//! | `DDDDDD` (6 digits, minute field >= 60) | `DD.DDDD` decimal degrees |
//! | `DDDDDDD` (7 digits) | `DDD.DDDD` decimal degrees |
//! | `DDMMSS` / `DDDMMSS` | degrees, minutes, seconds |

/// Negate for southern/western hemispheres.
pub fn apply_direction(value: f64, dir: &str) -> f64 {
    match dir {
        "S" | "W" => -value,
        _ => value,
    }
}

/// Parse a 5/6/7-digit degrees-and-decimal-minutes coordinate.
///
/// The digit width encodes the schema. Six digits are ambiguous between
/// `DDMMTT` and `DDDMMD`; `DDMMTT` is tried first, a minute field >= 60
/// means the value is actually packed decimal degrees (`467315` is
/// 46.7315°, not 46° 73.15'), and a degree field > 90 retries as `DDDMMD`.
/// Returns `None` when no reading yields valid degrees and minutes.
pub fn parse_dmm(s: &str) -> Option<f64> {
    match s.len() {
        5 => {
            // DDMMD: 2-digit degrees, 2-digit minutes, 1 digit tenths
            let deg: u32 = s.get(0..2)?.parse().ok()?;
            let min_whole: u32 = s.get(2..4)?.parse().ok()?;
            let min_tenths: u32 = s.get(4..5)?.parse().ok()?;
            let min = min_whole as f64 + min_tenths as f64 / 10.0;
            if min >= 60.0 {
                return None;
            }
            Some(deg as f64 + min / 60.0)
        }
        6 => {
            // DDMMTT: 2-digit degrees, 2-digit minutes, hundredths
            if let (Ok(deg), Ok(min_whole), Ok(hundredths)) = (
                s.get(0..2)?.parse::<u32>(),
                s.get(2..4)?.parse::<u32>(),
                s.get(4..6)?.parse::<u32>(),
            ) {
                let min = min_whole as f64 + hundredths as f64 / 100.0;
                if deg <= 180 && min < 60.0 {
                    return Some(deg as f64 + min / 60.0);
                }
                if deg <= 90 && min >= 60.0 {
                    // Minute overflow: the tail is a decimal fraction of a
                    // degree, not minutes.
                    let frac: u32 = s.get(2..6)?.parse().ok()?;
                    return Some(deg as f64 + frac as f64 / 10000.0);
                }
            }
            // DDDMMD: 3-digit degrees for longitudes past 99°
            let deg: u32 = s.get(0..3)?.parse().ok()?;
            if deg > 90 && deg <= 180 {
                let min_whole: u32 = s.get(3..5)?.parse().ok()?;
                let min_tenths: u32 = s.get(5..6)?.parse().ok()?;
                let min = min_whole as f64 + min_tenths as f64 / 10.0;
                if min < 60.0 {
                    return Some(deg as f64 + min / 60.0);
                }
            }
            None
        }
        7 => {
            // DDDDDDD: 3-digit degrees + 4-digit decimal fraction of a degree
            let deg: u32 = s.get(0..3)?.parse().ok()?;
            if deg > 180 {
                return None;
            }
            let frac: u32 = s.get(3..7)?.parse().ok()?;
            Some(deg as f64 + frac as f64 / 10000.0)
        }
        _ => None,
    }
}

/// Parse a degrees + tenths-of-minute group with a fixed degree width, the
/// form used by waypoint coordinates embedded in routes (`N31490E035327`:
/// latitude `31490` = 31° 49.0', longitude `035327` = 035° 32.7').
pub fn parse_ddmm_tenths(s: &str, deg_digits: usize) -> Option<f64> {
    if s.len() != deg_digits + 3 {
        return None;
    }
    let deg: u32 = s.get(0..deg_digits)?.parse().ok()?;
    let min_whole: u32 = s.get(deg_digits..deg_digits + 2)?.parse().ok()?;
    let min_tenths: u32 = s.get(deg_digits + 2..deg_digits + 3)?.parse().ok()?;
    let min = min_whole as f64 + min_tenths as f64 / 10.0;
    if min >= 60.0 {
        return None;
    }
    Some(deg as f64 + min / 60.0)
}

/// Parse a degrees-minutes-seconds group: `DDMMSS` (6 digits) or
/// `DDDMMSS` (7 digits).
pub fn parse_dms(s: &str) -> Option<f64> {
    let deg_digits = match s.len() {
        6 => 2,
        7 => 3,
        _ => return None,
    };
    let deg: u32 = s.get(0..deg_digits)?.parse().ok()?;
    let min: u32 = s.get(deg_digits..deg_digits + 2)?.parse().ok()?;
    let sec: u32 = s.get(deg_digits + 2..deg_digits + 4)?.parse().ok()?;
    if min >= 60 || sec >= 60 || deg > 180 {
        return None;
    }
    Some(deg as f64 + min as f64 / 60.0 + sec as f64 / 3600.0)
}

/// Parse a coordinate that is decimal degrees either with an explicit dot
/// ("44.038") or compacted to bare digits ("44038" => 44.038, "019408" =>
/// 19.408). For the compact form the dot is inserted after the degree
/// digits: two for latitude, two or three for longitude depending on width.
pub fn parse_compact_decimal(s: &str, dir: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.contains('.') {
        return crate::patterns::parse_decimal_coord(s, dir);
    }
    let deg_digits = if dir == "E" || dir == "W" {
        if s.len() <= 5 { 2 } else { 3 }
    } else {
        2
    };
    if s.len() <= deg_digits {
        return crate::patterns::parse_decimal_coord(s, dir);
    }
    let dotted = format!("{}.{}", s.get(0..deg_digits)?, s.get(deg_digits..)?);
    crate::patterns::parse_decimal_coord(&dotted, dir)
}
