//! Label H1 decoders.
//!
//! Two dialects share the label. The ARINC 622/633 flight plan is a run of
//! colon-delimited sections (`:DA:` departure, `:AA:` arrival, `:F:`
//! route, and friends); the POS report is a freeform line of
//! comma-separated waypoint/time/level fields behind a packed coordinate.
//! The flight-plan parser runs first; a body that fits neither falls
//! through to later parsers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::airports;
use crate::coordinates;
use crate::decoded::Decoded;
use crate::grok::{Compiler, Format};
use crate::message::Message;
use crate::registry::{Parser, Registry};

/// Section marker, e.g. `:DA:` or `:F:`
static SECTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":([A-Z]{1,2}):").unwrap());

/// Waypoint with embedded coordinates, e.g. `N31490E035327`
static COORD_WAYPOINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<lat_dir>[NS])(?P<lat>\d{5})(?P<lon_dir>[EW])(?P<lon>\d{6})$").unwrap()
});

const POS_FORMATS: &[Format] = &[
    // POSN45209E023245,INVED,105718,330,LUGEB,112508,UDROS,M59,33450,1808/TS105718,010126904E
    Format {
        name: "pos_report",
        pattern: r"POS(?P<lat_dir>{LAT_DIR})(?P<lat>\d{5})(?P<lon_dir>{LON_DIR})(?P<lon>\d{6}),(?P<waypoint>[A-Z0-9-]+),(?P<time>\d{4,6}),(?P<level>\d{2,3}),(?P<next>[A-Z0-9-]+),(?P<eta>\d{4,6}),(?P<then>[A-Z0-9-]+),(?P<temp>[MP]\d{1,3})",
        fields: &["lat_dir", "lat", "lon_dir", "lon", "waypoint", "time", "level", "next", "eta", "then", "temp"],
    },
];

static POS_COMPILER: Lazy<Option<Compiler>> =
    Lazy::new(|| match Compiler::compile(POS_FORMATS, None) {
        Ok(compiler) => Some(compiler),
        Err(e) => {
            warn!("h1 pos format compilation failed, decoder disabled: {e:#}");
            None
        }
    });

/// One route element: a named fix, optionally with coordinates when the
/// plan embeds them inline.
#[derive(Debug, Clone, Serialize)]
pub struct RouteWaypoint {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FlightPlan {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approach: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runway: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<RouteWaypoint>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct H1PositionReport {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoint: Option<String>,
    /// Overhead time as transmitted (HHMMSS)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_waypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub then_waypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
}

/// Strip the transmission framing artefacts that land mid-field.
/// Idempotent.
pub fn normalise(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\r' | '\n' | '\t')).collect()
}

pub struct H1FlightPlanParser;

impl Parser for H1FlightPlanParser {
    fn name(&self) -> &'static str {
        "h1"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["H1"]
    }

    fn priority(&self) -> i32 {
        10
    }

    fn quick_check(&self, text: &str) -> bool {
        text.contains(":DA:") || text.contains(":AA:") || text.contains(":F:")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        if msg.text.is_empty() {
            return None;
        }
        let text = normalise(&msg.text);
        let sections = split_sections(&text);
        if sections.is_empty() {
            return None;
        }

        let mut plan = FlightPlan {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            ..Default::default()
        };

        for (marker, content) in &sections {
            let content = content.trim();
            if content.is_empty() {
                continue;
            }
            match marker.as_str() {
                "DA" => {
                    plan.origin = Some(content.to_string());
                    plan.origin_name = airports::name_of(content).map(str::to_string);
                }
                "AA" => {
                    plan.destination = Some(content.to_string());
                    plan.destination_name = airports::name_of(content).map(str::to_string);
                }
                "CR" => plan.company_route = Some(content.to_string()),
                "D" => plan.sid = Some(content.to_string()),
                "AP" => plan.approach = Some(content.to_string()),
                "R" => plan.runway = Some(content.to_string()),
                "F" => plan.route = parse_route(content),
                _ => {}
            }
        }

        if plan.origin.is_none() && plan.destination.is_none() && plan.route.is_empty() {
            return None;
        }
        Some(Decoded::FlightPlan(plan))
    }
}

/// Split a normalised body on `:XX:` markers into (marker, content) pairs.
/// Text before the first marker (the message preamble) is dropped.
fn split_sections(text: &str) -> Vec<(String, String)> {
    let markers: Vec<(usize, usize, String)> = SECTION_RE
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            (whole.start(), whole.end(), caps[1].to_string())
        })
        .collect();

    let mut sections = Vec::with_capacity(markers.len());
    for (i, (_, end, marker)) in markers.iter().enumerate() {
        let content_end = markers.get(i + 1).map(|m| m.0).unwrap_or(text.len());
        sections.push((marker.clone(), text[*end..content_end].to_string()));
    }
    sections
}

/// Route waypoints are separated by runs of dots; inline `N31490E035327`
/// entries become named coordinates.
fn parse_route(content: &str) -> Vec<RouteWaypoint> {
    content
        .split(['.', ',', ' '])
        .filter(|token| !token.is_empty())
        .map(|token| {
            if let Some(caps) = COORD_WAYPOINT_RE.captures(token) {
                let lat = coordinates::parse_ddmm_tenths(&caps["lat"], 2)
                    .map(|v| coordinates::apply_direction(v, &caps["lat_dir"]));
                let lon = coordinates::parse_ddmm_tenths(&caps["lon"], 3)
                    .map(|v| coordinates::apply_direction(v, &caps["lon_dir"]));
                RouteWaypoint {
                    name: token.to_string(),
                    latitude: lat,
                    longitude: lon,
                }
            } else {
                RouteWaypoint {
                    name: token.to_string(),
                    latitude: None,
                    longitude: None,
                }
            }
        })
        .collect()
}

pub struct H1PosParser;

impl Parser for H1PosParser {
    fn name(&self) -> &'static str {
        "h1_pos"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["H1"]
    }

    fn priority(&self) -> i32 {
        20
    }

    fn quick_check(&self, text: &str) -> bool {
        text.contains("POS")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        if msg.text.is_empty() {
            return None;
        }
        let compiler = POS_COMPILER.as_ref()?;
        let text = normalise(&msg.text);
        let m = compiler.parse(text.trim())?;

        let mut report = H1PositionReport {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            waypoint: m.get("waypoint").map(str::to_string),
            time: m.get("time").map(str::to_string),
            next_waypoint: m.get("next").map(str::to_string),
            eta: m.get("eta").map(str::to_string),
            then_waypoint: m.get("then").map(str::to_string),
            ..Default::default()
        };

        report.latitude = m
            .get("lat")
            .and_then(|v| coordinates::parse_ddmm_tenths(v, 2))
            .map(|v| coordinates::apply_direction(v, m.get("lat_dir").unwrap_or("N")));
        report.longitude = m
            .get("lon")
            .and_then(|v| coordinates::parse_ddmm_tenths(v, 3))
            .map(|v| coordinates::apply_direction(v, m.get("lon_dir").unwrap_or("E")));
        report.flight_level = m.get("level").and_then(|v| v.parse().ok());
        report.temperature = m.get("temp").and_then(parse_temperature);

        Some(Decoded::H1Position(report))
    }
}

/// `M59` = -59 °C, `P15` = +15 °C
fn parse_temperature(token: &str) -> Option<i32> {
    let (sign, digits) = token.split_at(1);
    let value: i32 = digits.parse().ok()?;
    match sign {
        "M" => Some(-value),
        "P" => Some(value),
        _ => None,
    }
}

pub fn register(registry: &mut Registry) {
    registry.register(Arc::new(H1FlightPlanParser));
    registry.register(Arc::new(H1PosParser));
}
