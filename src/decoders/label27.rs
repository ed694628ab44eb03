//! Label 27 POS decoder.
//!
//! Messages open with `POS01`, a flight number and a slash-prefixed time
//! block with the origin/destination ICAO pair glued on, followed by
//! labelled fields (FUEL, TEMP, WDIR, WSPD, LATN/LATS, LONE/LONW, ETA,
//! TUR, ALT). Whitespace between a field label and its value is optional;
//! the observed variants differ only there.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::airports;
use crate::decoded::Decoded;
use crate::grok::{Compiler, Format};
use crate::message::Message;
use crate::patterns::parse_decimal_coord;
use crate::registry::{Parser, Registry};

const FORMATS: &[Format] = &[
    // POS01AFL1866 /16180720UUEEUDYZ ...
    Format {
        name: "header",
        pattern: r"^POS01(?P<flight>{FLIGHT})\s*/(?P<time>\d{6,8})(?P<origin>{ICAO})(?P<dest>{ICAO})",
        fields: &["flight", "time", "origin", "dest"],
    },
    Format {
        name: "fuel",
        pattern: r"FUEL\s*(?P<fuel>\d+)",
        fields: &["fuel"],
    },
    // TEMP-55 and TEMP- 55 both occur
    Format {
        name: "temp",
        pattern: r"TEMP\s*(?P<sign>[-+])?\s*(?P<temp>\d{1,3})",
        fields: &["sign", "temp"],
    },
    // Direction in the first three digits; any trailing digits are the
    // wind speed (WDIR26631 = 266° at 31 kt)
    Format {
        name: "wdir",
        pattern: r"WDIR\s*(?P<wdir>\d{3})(?P<wdir_speed>\d*)",
        fields: &["wdir", "wdir_speed"],
    },
    Format {
        name: "wspd",
        pattern: r"WSPD\s*(?P<wspd>\d+)",
        fields: &["wspd"],
    },
    Format {
        name: "lat",
        pattern: r"LAT(?P<lat_dir>[NS])\s*(?P<lat>[\d.]+)",
        fields: &["lat_dir", "lat"],
    },
    Format {
        name: "lon",
        pattern: r"LON(?P<lon_dir>[EW])\s*(?P<lon>[\d.]+)",
        fields: &["lon_dir", "lon"],
    },
    Format {
        name: "eta",
        pattern: r"ETA\s*(?P<eta>\d{3,4})",
        fields: &["eta"],
    },
    Format {
        name: "turbulence",
        pattern: r"TUR\s*(?P<tur>[A-Z0-9]+)?\s*ALT",
        fields: &["tur"],
    },
    Format {
        name: "altitude",
        pattern: r"ALT\s*(?P<alt>\d+)",
        fields: &["alt"],
    },
];

static COMPILER: Lazy<Option<Compiler>> = Lazy::new(|| match Compiler::compile(FORMATS, None) {
    Ok(compiler) => Some(compiler),
    Err(e) => {
        warn!("label27 format compilation failed, decoder disabled: {e:#}");
        None
    }
});

#[derive(Debug, Clone, Default, Serialize)]
pub struct PosReport {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_num: Option<String>,
    /// Raw time block from the header (day + HHMM + extra digits vary by
    /// operator, so it is not normalised)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_icao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_icao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Feet as transmitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<i32>,
    /// Operator-reported units (kg or lb), not normalised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_dir: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turbulence: Option<String>,
}

pub struct Label27Parser;

impl Parser for Label27Parser {
    fn name(&self) -> &'static str {
        "label27"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["27"]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn quick_check(&self, text: &str) -> bool {
        text.contains("POS01")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        if msg.text.is_empty() {
            return None;
        }
        let compiler = COMPILER.as_ref()?;
        let text = msg.text.trim();

        let mut report = PosReport {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            ..Default::default()
        };

        let mut found_header = false;
        let mut wdir_speed: Option<u32> = None;
        let mut wspd_field: Option<u32> = None;

        for m in compiler.parse_all(text) {
            match m.format_name {
                "header" => {
                    found_header = true;
                    report.flight_num = m.get("flight").map(str::to_string);
                    report.report_time = m.get("time").map(str::to_string);
                    report.origin_icao = m.get("origin").map(str::to_string);
                    report.dest_icao = m.get("dest").map(str::to_string);
                    report.origin_name = m
                        .get("origin")
                        .and_then(airports::name_of)
                        .map(str::to_string);
                    report.dest_name = m
                        .get("dest")
                        .and_then(airports::name_of)
                        .map(str::to_string);
                }
                "fuel" => report.fuel = m.get("fuel").and_then(|f| f.parse().ok()),
                "temp" => {
                    if let Some(temp) = m.get("temp").and_then(|t| t.parse::<i32>().ok()) {
                        let negative = m.get("sign") == Some("-");
                        report.temperature = Some(if negative { -temp } else { temp });
                    }
                }
                "wdir" => {
                    report.wind_dir = m.get("wdir").and_then(|d| d.parse().ok());
                    wdir_speed = m
                        .get("wdir_speed")
                        .filter(|s| !s.is_empty())
                        .and_then(|s| s.parse().ok());
                }
                "wspd" => wspd_field = m.get("wspd").and_then(|s| s.parse().ok()),
                "lat" => {
                    report.latitude = m
                        .get("lat")
                        .and_then(|v| parse_decimal_coord(v, m.get("lat_dir").unwrap_or("N")));
                }
                "lon" => {
                    report.longitude = m
                        .get("lon")
                        .and_then(|v| parse_decimal_coord(v, m.get("lon_dir").unwrap_or("E")));
                }
                "eta" => report.eta = m.get("eta").map(str::to_string),
                "turbulence" => {
                    report.turbulence = m.get("tur").map(str::to_string);
                }
                "altitude" => report.altitude = m.get("alt").and_then(|a| a.parse().ok()),
                _ => {}
            }
        }

        if !found_header {
            return None;
        }

        // WDIR often packs the speed into its trailing digits; the separate
        // WSPD field only applies when it does not
        report.wind_speed = wdir_speed.or(wspd_field);

        Some(Decoded::Label27Position(report))
    }
}

pub fn register(registry: &mut Registry) {
    registry.register(Arc::new(Label27Parser));
}
