//! Label 80 position decoder.
//!
//! Bodies are a loose bag of slash-delimited fields around a free-form
//! header, so this decoder runs every format against the whole text
//! (`parse_all`) and assembles whatever matched. A result is only emitted
//! when the header matched: without the origin/destination frame the rest
//! is not worth reporting.

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

const FORMATS: &[Format] = &[
    // POSRPT 1519/06 UUEE UNNT .VQ-BDU/POS ...
    Format {
        name: "header_format",
        pattern: r"(?P<msg_type>[A-Z]{2,8})\s+(?P<hdr1>[A-Z0-9/]+)\s+(?P<origin>{ICAO})\s+(?P<dest>{ICAO})\s+(?P<tail>\.?[A-Z0-9-]{3,8})",
        fields: &["msg_type", "hdr1", "origin", "dest", "tail"],
    },
    // FLT UAE81 OMDB LAX... fallback when there is no report header
    Format {
        name: "alt_format",
        pattern: r"FLT\s*(?P<flight>{FLIGHT})\s+(?P<origin>{ICAO})\s*[/ ]?\s*(?P<dest>{ICAO})",
        fields: &["flight", "origin", "dest"],
    },
    // /POS N55164E038545 or /POS N44.038 W019.408
    Format {
        name: "position",
        pattern: r"/POS\s*(?P<lat_dir>[NS])\s*(?P<lat>\d+(?:\.\d+)?)[,\s]*(?P<lon_dir>[EW])\s*(?P<lon>\d+(?:\.\d+)?)",
        fields: &["lat_dir", "lat", "lon_dir", "lon"],
    },
    Format {
        name: "altitude",
        pattern: r"/ALT\s*\+?(?P<altitude>\d{1,5})",
        fields: &["altitude"],
    },
    Format {
        name: "mach",
        pattern: r"/MCH\s*\.?(?P<mach>\d{2,3})",
        fields: &["mach"],
    },
    Format {
        name: "tas",
        pattern: r"/TAS\s*(?P<tas>\d{3})",
        fields: &["tas"],
    },
    Format {
        name: "fob",
        pattern: r"/FOB\s*(?P<fob>\d{1,6})",
        fields: &["fob"],
    },
    Format {
        name: "eta",
        pattern: r"/ETA\s*(?P<eta>\d{3,4})",
        fields: &["eta"],
    },
    Format {
        name: "tme",
        pattern: r"/TME\s*(?P<tme>\d{3,4})",
        fields: &["tme"],
    },
    // /WND 26631: direction then speed in knots
    Format {
        name: "wind",
        pattern: r"/WND\s*(?P<wdir>\d{3})(?P<wspd>\d{2,3})",
        fields: &["wdir", "wspd"],
    },
    Format {
        name: "oat",
        pattern: r"/OAT\s*(?P<oat>[-M]?\d{1,3})",
        fields: &["oat"],
    },
    Format {
        name: "out_time",
        pattern: r"/OUT\s*(?P<out>\d{3,4})",
        fields: &["out"],
    },
    Format {
        name: "off_time",
        pattern: r"/OFF\s*(?P<off>\d{3,4})",
        fields: &["off"],
    },
    Format {
        name: "on_time",
        pattern: r"/ON\s*(?P<on>\d{3,4})",
        fields: &["on"],
    },
    Format {
        name: "in_time",
        pattern: r"/IN\s*(?P<in>\d{3,4})",
        fields: &["in"],
    },
];

static COMPILER: Lazy<Option<Compiler>> = Lazy::new(|| match Compiler::compile(FORMATS, None) {
    Ok(compiler) => Some(compiler),
    Err(e) => {
        warn!("label80 format compilation failed, decoder disabled: {e:#}");
        None
    }
});

/// Flight-number shape for the loose hdr1 header slot, e.g. UAE81 or 1234
/// but not 06WO/25
static FLIGHT_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Z]{2,3}\d{1,4}[A-Z]?|\d{1,4})$").unwrap());

#[derive(Debug, Clone, Default, Serialize)]
pub struct PositionUpdate {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_num: Option<String>,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mach: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_on_board: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    /// HH:MM, normalised from HHMM or HMM
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_dir: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_kts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_kmh: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oat_c: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub off_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_time: Option<String>,
}

pub struct Label80Parser;

impl Parser for Label80Parser {
    fn name(&self) -> &'static str {
        "label80"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["80"]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn quick_check(&self, _text: &str) -> bool {
        // The label alone is selective enough
        true
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        if msg.text.is_empty() {
            return None;
        }
        let compiler = COMPILER.as_ref()?;
        let text = msg.text.trim();

        let mut report = PositionUpdate {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            ..Default::default()
        };

        let mut found_header = false;

        for m in compiler.parse_all(text) {
            match m.format_name {
                "header_format" => {
                    report.msg_type = m.get("msg_type").map(str::to_string);
                    report.origin_icao = m.get("origin").map(str::to_string);
                    report.dest_icao = m.get("dest").map(str::to_string);
                    report.tail = m
                        .get("tail")
                        .map(|t| t.trim_start_matches('.').to_string());
                    resolve_airport_names(&mut report);

                    // hdr1 often carries the flight number (UAE81) but can
                    // be something else entirely (06WO/25)
                    if let Some(tok) = m.get("hdr1").map(str::trim) {
                        if FLIGHT_TOKEN_RE.is_match(tok) {
                            report.flight_num = Some(tok.to_string());
                        }
                    }
                    found_header = true;
                }
                "alt_format" => {
                    if !found_header {
                        report.flight_num = m.get("flight").map(str::to_string);
                        report.origin_icao = m.get("origin").map(str::to_string);
                        report.dest_icao = m.get("dest").map(str::to_string);
                        report.msg_type = Some("FLT".to_string());
                        resolve_airport_names(&mut report);
                        found_header = true;
                    }
                }
                "position" => {
                    report.latitude = m.get("lat").and_then(|v| {
                        coordinates::parse_compact_decimal(v, m.get("lat_dir").unwrap_or("N"))
                    });
                    report.longitude = m.get("lon").and_then(|v| {
                        coordinates::parse_compact_decimal(v, m.get("lon_dir").unwrap_or("E"))
                    });
                }
                "altitude" => {
                    if let Some(raw) = m.get("altitude").map(str::trim) {
                        if let Ok(alt) = raw.parse::<i32>() {
                            report.altitude = Some(scale_flight_level(raw, alt));
                        }
                    }
                }
                "mach" => report.mach = m.get("mach").map(str::to_string),
                "tas" => report.tas = m.get("tas").and_then(|v| v.parse().ok()),
                "fob" => report.fuel_on_board = m.get("fob").and_then(|v| v.parse().ok()),
                "eta" => report.eta = m.get("eta").map(str::to_string),
                "tme" => report.report_time = m.get("tme").and_then(format_hhmm),
                "wind" => {
                    if let Some(dir) = m.get("wdir").and_then(|v| v.parse::<u32>().ok()) {
                        report.wind_dir = Some(dir % 360);
                    }
                    if let Some(spd) = m.get("wspd").and_then(|v| v.parse::<u32>().ok()) {
                        report.wind_speed_kts = Some(spd);
                        report.wind_speed_kmh = Some((spd * 1852 + 500) / 1000);
                    }
                }
                "oat" => {
                    report.oat_c = m.get("oat").and_then(|v| {
                        if let Some(rest) = v.strip_prefix('M') {
                            rest.parse::<i32>().ok().map(|t| -t)
                        } else {
                            v.parse().ok()
                        }
                    });
                }
                "out_time" => report.out_time = m.get("out").map(str::to_string),
                "off_time" => report.off_time = m.get("off").map(str::to_string),
                "on_time" => report.on_time = m.get("on").map(str::to_string),
                "in_time" => report.in_time = m.get("in").map(str::to_string),
                _ => {}
            }
        }

        if !found_header {
            return None;
        }

        Some(Decoded::Label80Position(report))
    }
}

fn resolve_airport_names(report: &mut PositionUpdate) {
    report.origin_name = report
        .origin_icao
        .as_deref()
        .and_then(airports::name_of)
        .map(str::to_string);
    report.dest_name = report
        .dest_icao
        .as_deref()
        .and_then(airports::name_of)
        .map(str::to_string);
}

/// A bare 1-3 digit altitude is a flight level, scaled to feet. Real
/// flight levels are multiples of five up to FL600; anything else (501,
/// say) is taken as literal feet.
fn scale_flight_level(raw: &str, alt: i32) -> i32 {
    if raw.len() <= 3 && alt > 0 && (alt <= 500 || (alt <= 600 && alt % 5 == 0)) {
        alt * 100
    } else {
        alt
    }
}

/// "1037" -> "10:37", "937" -> "09:37"
fn format_hhmm(s: &str) -> Option<String> {
    let s = s.trim();
    let padded = match s.len() {
        3 => format!("0{s}"),
        4 => s.to_string(),
        _ => return None,
    };
    let h: u32 = padded.get(0..2)?.parse().ok()?;
    let m: u32 = padded.get(2..4)?.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(format!("{}:{}", &padded[0..2], &padded[2..4]))
}

pub fn register(registry: &mut Registry) {
    registry.register(Arc::new(Label80Parser));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> PositionUpdate {
        let msg = Message::new(1, "80", text);
        match Label80Parser.parse(&msg) {
            Some(Decoded::Label80Position(report)) => report,
            other => panic!("expected label 80 position, got {other:?}"),
        }
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|v| (v - b).abs() < 0.001).unwrap_or(false)
    }

    const FULL_REPORT: &str = "POSRPT 1519/06 UUEE UNNT .VQ-BDU/POS N55164E038545/ALT 350/MCH 781/TAS 459/FOB 0182/ETA 1013/WND 26631/OAT -54/TME 937/OUT 1410/OFF 1422";

    #[test]
    fn test_full_position_report() {
        let r = parse(FULL_REPORT);
        assert_eq!(r.msg_type.as_deref(), Some("POSRPT"));
        assert_eq!(r.origin_icao.as_deref(), Some("UUEE"));
        assert_eq!(r.origin_name.as_deref(), Some("Moscow Sheremetyevo"));
        assert_eq!(r.dest_icao.as_deref(), Some("UNNT"));
        assert_eq!(r.tail.as_deref(), Some("VQ-BDU"));
        assert!(r.flight_num.is_none()); // 1519/06 is not a flight number
        assert!(close(r.latitude, 55.164));
        assert!(close(r.longitude, 38.545));
        assert_eq!(r.altitude, Some(35000)); // FL350
        assert_eq!(r.mach.as_deref(), Some("781"));
        assert_eq!(r.tas, Some(459));
        assert_eq!(r.fuel_on_board, Some(182));
        assert_eq!(r.eta.as_deref(), Some("1013"));
        assert_eq!(r.wind_dir, Some(266));
        assert_eq!(r.wind_speed_kts, Some(31));
        assert_eq!(r.wind_speed_kmh, Some(57)); // round(31 * 1.852)
        assert_eq!(r.oat_c, Some(-54));
        assert_eq!(r.report_time.as_deref(), Some("09:37"));
        assert_eq!(r.out_time.as_deref(), Some("1410"));
        assert_eq!(r.off_time.as_deref(), Some("1422"));
    }

    #[test]
    fn test_header_with_flight_number() {
        let r = parse("POSRPT UAE81 OMDB KIAD .A6-EDK/POS N44.038 W019.408/ALT 37000");
        assert_eq!(r.flight_num.as_deref(), Some("UAE81"));
        assert_eq!(r.tail.as_deref(), Some("A6-EDK"));
        assert!(close(r.latitude, 44.038));
        assert!(close(r.longitude, -19.408));
        assert_eq!(r.altitude, Some(37000)); // already feet, not rescaled
    }

    #[test]
    fn test_flt_fallback_header() {
        let r = parse("FLT SU0245 UUEE/ULLI /ALT 310");
        assert_eq!(r.msg_type.as_deref(), Some("FLT"));
        assert_eq!(r.flight_num.as_deref(), Some("SU0245"));
        assert_eq!(r.origin_icao.as_deref(), Some("UUEE"));
        assert_eq!(r.dest_icao.as_deref(), Some("ULLI"));
        assert_eq!(r.altitude, Some(31000));
    }

    #[test]
    fn test_no_header_is_a_miss() {
        let msg = Message::new(1, "80", "/POS N44.038 W019.408/ALT 370");
        assert!(Label80Parser.parse(&msg).is_none());
    }

    #[test]
    fn test_flight_level_scaling() {
        assert_eq!(scale_flight_level("350", 350), 35000);
        assert_eq!(scale_flight_level("35000", 35000), 35000);
        assert_eq!(scale_flight_level("600", 600), 60000);
        assert_eq!(scale_flight_level("501", 501), 501);
        assert_eq!(scale_flight_level("0", 0), 0);
    }

    #[test]
    fn test_format_hhmm() {
        assert_eq!(format_hhmm("1037").as_deref(), Some("10:37"));
        assert_eq!(format_hhmm("937").as_deref(), Some("09:37"));
        assert_eq!(format_hhmm("2567"), None);
        assert_eq!(format_hhmm("12"), None);
    }

    #[test]
    fn test_wind_kmh_conversion_monotonic() {
        let mut last = 0;
        for kts in [0u32, 5, 31, 100, 250] {
            let kmh = (kts * 1852 + 500) / 1000;
            assert!(kmh >= last);
            last = kmh;
        }
        assert_eq!((31 * 1852 + 500) / 1000, 57);
    }
}
