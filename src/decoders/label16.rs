//! Label 16 position decoder.
//!
//! A family of CSV-flavoured dialects: plain and prefixed waypoint
//! reports, three CSV position layouts and the AUTPOS form. One format
//! table covers them all; the first match wins.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::coordinates;
use crate::decoded::Decoded;
use crate::grok::{Compiler, Format};
use crate::message::Message;
use crate::patterns::parse_decimal_coord;
use crate::registry::{Parser, Registry};

const FORMATS: &[Format] = &[
    // 221737,+20995,2233,9160,N 50.0547,E 8.2408,SXS67A  ,5,7,4,925760,/,
    // Tried before the plain CSV form, which would otherwise shadow it and
    // drop the flight number.
    Format {
        name: "csv_position_extended",
        pattern: r"^(?P<time>\d{6}),(?P<altitude>[+M]?\d+),(?P<speed>\d+),(?P<track>\d+),(?P<lat_dir>[NS])\s*(?P<lat>[\d.]+),(?P<lon_dir>[EW])\s*(?P<lon>[\d.]+),(?P<flight>\w+)",
        fields: &["time", "altitude", "speed", "track", "lat_dir", "lat", "lon_dir", "lon", "flight"],
    },
    // 221942,35989,2346, 118,N 47.983 E  9.626
    Format {
        name: "csv_position",
        pattern: r"^(?P<time>\d{6}),(?P<altitude>[+M]?\d+),(?P<speed>\d+),\s*(?P<track>\d+),(?P<lat_dir>[NS])\s*(?P<lat>[\d.]+)[,\s]+(?P<lon_dir>[EW])\s*(?P<lon>[\d.]+)",
        fields: &["time", "altitude", "speed", "track", "lat_dir", "lat", "lon_dir", "lon"],
    },
    // 221641,,2249,  84,N 46.753 W122.356 (altitude dropped, coords valid)
    Format {
        name: "csv_position_no_alt",
        pattern: r"^(?P<time>\d{6}),,(?P<speed>\d+),\s*(?P<track>\d+),(?P<lat_dir>[NS])\s*(?P<lat>[\d.]+)[,\s]+(?P<lon_dir>[EW])\s*(?P<lon>[\d.]+)",
        fields: &["time", "speed", "track", "lat_dir", "lat", "lon_dir", "lon"],
    },
    // M47AQR8416NUPNI  ,N 34.901,E 100.595,41098,0477,2033,042\TS180219,311225
    // M## is a message sequence; QR/8416 the airline and flight.
    Format {
        name: "waypoint_position_prefixed",
        pattern: r"^M(?P<msg_seq>\d{2})A(?P<prefix_airline>[A-Z0-9]{2})(?P<prefix_flight>[A-Z0-9]{4})(?P<waypoint>[A-Z][A-Z0-9]*)\s*,(?P<lat_dir>[NS])\s*(?P<lat>[\d.]+),(?P<lon_dir>[EW])\s*(?P<lon>[\d.]+),(?P<altitude>\d+),\s*(?P<ground_speed>\d+),(?P<eta>\d+),\s*(?P<track>\d+)",
        fields: &["msg_seq", "prefix_airline", "prefix_flight", "waypoint", "lat_dir", "lat", "lon_dir", "lon", "altitude", "ground_speed", "eta", "track"],
    },
    // BEGLA  ,N 47.555,E 18.028,40025,490,1934,030\TS180357,311225
    Format {
        name: "waypoint_position",
        pattern: r"^(?P<waypoint>[A-Z0-9]{2,8})\s*,(?P<lat_dir>[NS])\s*(?P<lat>[\d.]+),(?P<lon_dir>[EW])\s*(?P<lon>[\d.]+),(?P<altitude>\d+),\s*(?P<ground_speed>\d+),(?P<eta>\d+),\s*(?P<track>\d+)",
        fields: &["waypoint", "lat_dir", "lat", "lon_dir", "lon", "altitude", "ground_speed", "eta", "track"],
    },
    // 035234/AUTPOS/LLD N440853 W0915239 (DMS coordinates)
    Format {
        name: "autpos",
        pattern: r"^(?P<time>\d{6})/AUTPOS/LLD\s+(?P<lat_dir>[NS])(?P<lat>\d{6})\s+(?P<lon_dir>[EW])(?P<lon>\d{7})",
        fields: &["time", "lat_dir", "lat", "lon_dir", "lon"],
    },
];

static COMPILER: Lazy<Option<Compiler>> = Lazy::new(|| match Compiler::compile(FORMATS, None) {
    Ok(compiler) => Some(compiler),
    Err(e) => {
        warn!("label16 format compilation failed, decoder disabled: {e:#}");
        None
    }
});

#[derive(Debug, Clone, Default, Serialize)]
pub struct WaypointPosition {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight: Option<String>,
    /// Report time as transmitted (HHMMSS)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_speed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

pub struct Label16Parser;

impl Parser for Label16Parser {
    fn name(&self) -> &'static str {
        "label16"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["16"]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn quick_check(&self, text: &str) -> bool {
        text.contains(',') || text.contains("AUTPOS")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        if msg.text.is_empty() {
            return None;
        }
        let compiler = COMPILER.as_ref()?;
        let m = compiler.parse(msg.text.trim())?;

        let mut report = WaypointPosition {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            waypoint: m.get("waypoint").map(str::to_string),
            time: m.get("time").map(str::to_string),
            eta: m.get("eta").map(str::to_string),
            ..Default::default()
        };

        // Prefixed waypoint reports carry airline + flight number glued on
        report.flight = match (m.get("prefix_airline"), m.get("prefix_flight")) {
            (Some(airline), Some(number)) => Some(format!("{airline}{number}")),
            _ => m.get("flight").map(|f| f.trim().to_string()),
        };

        let lat_dir = m.get("lat_dir").unwrap_or("N");
        let lon_dir = m.get("lon_dir").unwrap_or("E");
        if m.format_name == "autpos" {
            report.latitude = m
                .get("lat")
                .and_then(coordinates::parse_dms)
                .map(|v| coordinates::apply_direction(v, lat_dir));
            report.longitude = m
                .get("lon")
                .and_then(coordinates::parse_dms)
                .map(|v| coordinates::apply_direction(v, lon_dir));
        } else {
            report.latitude = m.get("lat").and_then(|v| parse_decimal_coord(v, lat_dir));
            report.longitude = m.get("lon").and_then(|v| parse_decimal_coord(v, lon_dir));
        }

        report.altitude = m.get("altitude").and_then(parse_altitude);
        report.ground_speed = m
            .get("ground_speed")
            .or_else(|| m.get("speed"))
            .and_then(|s| s.parse().ok());
        report.track = m.get("track").and_then(|t| t.parse().ok());

        Some(Decoded::Label16Position(report))
    }
}

/// Altitude field may carry a sign prefix: `+20995`, or `M300` for below
/// mean sea level.
fn parse_altitude(s: &str) -> Option<i32> {
    if let Some(rest) = s.strip_prefix('M') {
        rest.parse::<i32>().ok().map(|v| -v)
    } else {
        s.strip_prefix('+').unwrap_or(s).parse().ok()
    }
}

pub fn register(registry: &mut Registry) {
    registry.register(Arc::new(Label16Parser));
}
