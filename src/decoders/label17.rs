//! Label 17 weather decoder.
//!
//! Bodies relay observational weather text (METAR/SPECI/TAF) requested by
//! the crew. The station and report are lifted out, and the standard wind,
//! temperature/dewpoint and pressure groups inside the report are decoded
//! into structured fields.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::airports;
use crate::decoded::Decoded;
use crate::grok::{Compiler, Format};
use crate::message::Message;
use crate::registry::{Parser, Registry};

const FORMATS: &[Format] = &[
    // METAR EGLL 181450Z 26012KT 9999 SCT030 12/08 Q1013
    Format {
        name: "report",
        pattern: r"(?P<kind>METAR|SPECI|TAF)\s+(?P<station>{ICAO})\s+(?P<report>.+)",
        fields: &["kind", "station", "report"],
    },
    Format {
        name: "wind",
        pattern: r"\b(?P<wdir>\d{3}|VRB)(?P<wspd>\d{2,3})(?:G(?P<gust>\d{2,3}))?KT\b",
        fields: &["wdir", "wspd", "gust"],
    },
    Format {
        name: "temp_dew",
        pattern: r"\s(?P<temp>M?\d{2})/(?P<dew>M?\d{2})\b",
        fields: &["temp", "dew"],
    },
    Format {
        name: "qnh",
        pattern: r"\bQ(?P<qnh>\d{4})\b",
        fields: &["qnh"],
    },
    Format {
        name: "altimeter",
        pattern: r"\bA(?P<altimeter>[23]\d{3})\b",
        fields: &["altimeter"],
    },
];

static COMPILER: Lazy<Option<Compiler>> = Lazy::new(|| match Compiler::compile(FORMATS, None) {
    Ok(compiler) => Some(compiler),
    Err(e) => {
        warn!("label17 format compilation failed, decoder disabled: {e:#}");
        None
    }
});

#[derive(Debug, Clone, Default, Serialize)]
pub struct WeatherReport {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    /// METAR, SPECI or TAF
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_name: Option<String>,
    /// Degrees, absent for variable wind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_dir: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_gust: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dewpoint: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qnh_hpa: Option<u32>,
    /// Inches of mercury times 100, as transmitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altimeter: Option<u32>,
    /// Report tail after the station identifier, verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

pub struct Label17Parser;

impl Parser for Label17Parser {
    fn name(&self) -> &'static str {
        "label17"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["17"]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn quick_check(&self, text: &str) -> bool {
        text.contains("METAR") || text.contains("SPECI") || text.contains("TAF")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        if msg.text.is_empty() {
            return None;
        }
        let compiler = COMPILER.as_ref()?;
        let text = msg.text.trim();

        let mut report = WeatherReport {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            ..Default::default()
        };
        let mut found_report = false;

        for m in compiler.parse_all(text) {
            match m.format_name {
                "report" => {
                    found_report = true;
                    report.report_type = m.get("kind").map(str::to_string);
                    report.station = m.get("station").map(str::to_string);
                    report.station_name = m
                        .get("station")
                        .and_then(airports::name_of)
                        .map(str::to_string);
                    report.report = m.get("report").map(|r| r.trim().to_string());
                }
                "wind" => {
                    report.wind_dir = m.get("wdir").and_then(|d| d.parse().ok());
                    report.wind_speed = m.get("wspd").and_then(|s| s.parse().ok());
                    report.wind_gust = m.get("gust").and_then(|g| g.parse().ok());
                }
                "temp_dew" => {
                    report.temperature = m.get("temp").and_then(parse_signed);
                    report.dewpoint = m.get("dew").and_then(parse_signed);
                }
                "qnh" => report.qnh_hpa = m.get("qnh").and_then(|q| q.parse().ok()),
                "altimeter" => {
                    report.altimeter = m.get("altimeter").and_then(|a| a.parse().ok())
                }
                _ => {}
            }
        }

        if !found_report {
            return None;
        }
        Some(Decoded::Weather(report))
    }
}

/// METAR temperatures prefix sub-zero values with M
fn parse_signed(s: &str) -> Option<i32> {
    if let Some(rest) = s.strip_prefix('M') {
        rest.parse::<i32>().ok().map(|v| -v)
    } else {
        s.parse().ok()
    }
}

pub fn register(registry: &mut Registry) {
    registry.register(Arc::new(Label17Parser));
}
