//! Label 15 FST (flight status) decoder.
//!
//! Header carries sequence, origin/destination ICAO pair and a packed
//! coordinate whose digit width selects the schema; the tail is a run of
//! space-separated numeric fields: flight level, speed, then temperature
//! and wind somewhere in the remainder.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::coordinates;
use crate::decoded::Decoded;
use crate::grok::{Compiler, Format};
use crate::message::Message;
use crate::registry::{Parser, Registry};

/// Known FST header layouts. Longitude width varies (7, 6, 5 digits);
/// widest first so a long digit run is never split short.
const FORMATS: &[Format] = &[
    // FST01EGLLWSSSN452140E0249275330...
    Format {
        name: "fst_7digit_lon",
        pattern: r"FST(?P<seq>\d{2})(?P<origin>{ICAO})(?P<dest>{ICAO})(?P<lat_dir>{LAT_DIR})(?P<lat>\d{6})(?P<lon_dir>{LON_DIR})(?P<lon>\d{7})(?P<rest>.+)",
        fields: &["seq", "origin", "dest", "lat_dir", "lat", "lon_dir", "lon", "rest"],
    },
    Format {
        name: "fst_6digit_lon",
        pattern: r"FST(?P<seq>\d{2})(?P<origin>{ICAO})(?P<dest>{ICAO})(?P<lat_dir>{LAT_DIR})(?P<lat>\d{6})(?P<lon_dir>{LON_DIR})(?P<lon>\d{6})(?P<rest>.+)",
        fields: &["seq", "origin", "dest", "lat_dir", "lat", "lon_dir", "lon", "rest"],
    },
    // Older airframes send 5-digit coordinates on both axes
    Format {
        name: "fst_5digit_lon",
        pattern: r"FST(?P<seq>\d{2})(?P<origin>{ICAO})(?P<dest>{ICAO})(?P<lat_dir>{LAT_DIR})(?P<lat>\d{5})(?P<lon_dir>{LON_DIR})(?P<lon>\d{5})(?P<rest>.+)",
        fields: &["seq", "origin", "dest", "lat_dir", "lat", "lon_dir", "lon", "rest"],
    },
];

static COMPILER: Lazy<Option<Compiler>> = Lazy::new(|| match Compiler::compile(FORMATS, None) {
    Ok(compiler) => Some(compiler),
    Err(e) => {
        warn!("fst format compilation failed, decoder disabled: {e:#}");
        None
    }
});

/// Temperature token: M54C = -54 °C, P15C = +15 °C, trailing C optional
static TEMP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([MP])(\d{2,3})C?$").unwrap());

#[derive(Debug, Clone, Default, Serialize)]
pub struct FstReport {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_speed: Option<i32>,
    /// "knots" or "kmh"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_unit: Option<String>,
    /// Indicated airspeed in knots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ias: Option<i32>,
    /// How the speed field was classified: "GS", "IAS", "KMH", "IAS+GS",
    /// "IAS+KMH". Magnitude-based and best-effort; values near the class
    /// boundaries may be misread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<u32>,
    /// Remaining unparsed data after the coordinate block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}

pub struct FstParser;

impl Parser for FstParser {
    fn name(&self) -> &'static str {
        "fst"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["15"]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn quick_check(&self, text: &str) -> bool {
        text.trim_start().starts_with("FST") || text.contains("FST01") || text.contains("FST02")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        if msg.text.is_empty() {
            return None;
        }
        let mut text = msg.text.trim();

        // Strip any prefix before FST (like M51ABA0012)
        if let Some(idx) = text.find("FST") {
            text = &text[idx..];
        }

        let compiler = COMPILER.as_ref()?;
        let m = compiler.parse(text)?;

        let mut report = FstReport {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            sequence: m.get("seq").map(str::to_string),
            origin: m.get("origin").map(str::to_string),
            destination: m.get("dest").map(str::to_string),
            ..Default::default()
        };

        report.latitude = m
            .get("lat")
            .and_then(coordinates::parse_dmm)
            .map(|v| coordinates::apply_direction(v, m.get("lat_dir").unwrap_or("N")));
        report.longitude = m
            .get("lon")
            .and_then(coordinates::parse_dmm)
            .map(|v| coordinates::apply_direction(v, m.get("lon_dir").unwrap_or("E")));

        if let Some(rest) = m.get("rest").filter(|r| !r.is_empty()) {
            report.raw_data = Some(rest.to_string());
            parse_fields(rest, &mut report);
        }

        Some(Decoded::Fst(report))
    }
}

/// Extract the space-separated fields after the coordinate block.
/// Layout: flight level, speed, (skipped), then a temperature token with
/// wind packed into the field right after it. The exact position of
/// temperature varies by operator, so the remainder is scanned.
fn parse_fields(data: &str, report: &mut FstReport) {
    let parts: Vec<&str> = data.split_whitespace().collect();

    if let Some(fl) = parts.first().and_then(|p| p.parse::<i32>().ok()) {
        if (0..=600).contains(&fl) {
            report.flight_level = Some(fl);
        }
    }

    if let Some(&speed_str) = parts.get(1) {
        classify_speed(speed_str, parts.get(2).copied(), report);
    }

    // Temperature can sit at index 2, 3, or later
    for (i, part) in parts.iter().enumerate().skip(2) {
        if let Some(caps) = TEMP_RE.captures(part) {
            if let Ok(temp) = caps[2].parse::<i32>() {
                report.temperature = Some(if &caps[1] == "M" { -temp } else { temp });
            }
            if let Some(wind) = parts.get(i + 1).and_then(|w| parse_wind(w)) {
                report.wind_speed = Some(wind.0);
                report.wind_direction = Some(wind.1);
            }
            break;
        }
    }
}

/// Classify the speed field by magnitude and width.
///
/// Newer airframes concatenate IAS and km/h ground speed into a single
/// 7-digit token; older ones send IAS and ground speed as two separate
/// fields. Bare values are binned: 700-1000 km/h, 350-700 knots GS,
/// 100-350 IAS. The thresholds are inferred from observed traffic and are
/// intrinsically ambiguous near the boundaries.
fn classify_speed(speed_str: &str, next: Option<&str>, report: &mut FstReport) {
    let speed: i64 = match speed_str.parse() {
        Ok(v) if v > 0 => v,
        _ => return,
    };

    if speed_str.len() == 7 && speed > 1_000_000 {
        // IIIKKKK: IAS (3 digits) + km/h ground speed (4 digits)
        if let Some(ias) = speed_str.get(0..3).and_then(|s| s.parse().ok()) {
            report.ias = Some(ias);
            if let Some(kmh) = speed_str.get(3..7).and_then(|s| s.parse().ok()) {
                report.ground_speed = Some(kmh);
                report.speed_unit = Some("kmh".to_string());
                report.speed_type = Some("IAS+KMH".to_string());
            }
        }
    } else if speed > 1000 && speed_str.len() > 4 {
        if let Some(ias) = speed_str.get(0..3).and_then(|s| s.parse().ok()) {
            report.ias = Some(ias);
            report.speed_type = Some("IAS".to_string());
        }
    } else if (700..=1000).contains(&speed) {
        report.ground_speed = Some(speed as i32);
        report.speed_unit = Some("kmh".to_string());
        report.speed_type = Some("KMH".to_string());
    } else if (350..700).contains(&speed) {
        report.ground_speed = Some(speed as i32);
        report.speed_unit = Some("knots".to_string());
        report.speed_type = Some("GS".to_string());
    } else if (100..350).contains(&speed) {
        report.ias = Some(speed as i32);
        report.speed_type = Some("IAS".to_string());

        // Older airframes put ground speed in the very next field
        if let Some(next_speed) = next.and_then(|n| n.parse::<i32>().ok()) {
            if (700..1000).contains(&next_speed) {
                report.ground_speed = Some(next_speed);
                report.speed_unit = Some("kmh".to_string());
                report.speed_type = Some("IAS+KMH".to_string());
            } else if (100..700).contains(&next_speed) {
                report.ground_speed = Some(next_speed);
                report.speed_unit = Some("knots".to_string());
                report.speed_type = Some("IAS+GS".to_string());
            }
        }
    } else {
        report.ground_speed = Some(speed as i32);
        report.speed_unit = Some("knots".to_string());
        report.speed_type = Some("GS".to_string());
    }
}

/// Wind token: speed then direction, SSDDD or SSSDDD.
fn parse_wind(token: &str) -> Option<(u32, u32)> {
    if let (Some(ws), Some(wd)) = (token.get(0..2), token.get(2..5)) {
        if let (Ok(ws), Ok(wd)) = (ws.parse::<u32>(), wd.parse::<u32>()) {
            if ws > 0 && ws <= 99 && wd <= 360 {
                return Some((ws, wd));
            }
        }
    }
    if let (Some(ws), Some(wd)) = (token.get(0..3), token.get(3..6)) {
        if let (Ok(ws), Ok(wd)) = (ws.parse::<u32>(), wd.parse::<u32>()) {
            if (100..=999).contains(&ws) && wd <= 360 {
                return Some((ws, wd));
            }
        }
    }
    // Calm wind still carries a direction
    if let (Some(ws), Some(wd)) = (token.get(0..2), token.get(2..5)) {
        if let (Ok(ws), Ok(wd)) = (ws.parse::<u32>(), wd.parse::<u32>()) {
            if ws == 0 && wd <= 360 {
                return Some((ws, wd));
            }
        }
    }
    None
}

pub fn register(registry: &mut Registry) {
    registry.register(Arc::new(FstParser));
}
