//! Pre-departure clearance decoder.
//!
//! PDCs are freeform controller text, so this parser is content-based: it
//! runs for any label once the cheaper checks have missed. Extraction
//! leans on the shared clearance patterns (runway, SID, squawk, VHF
//! frequency) from the pattern library.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::airports;
use crate::decoded::Decoded;
use crate::grok::{Compiler, Format};
use crate::message::Message;
use crate::patterns::icao_blocklist_contains;
use crate::registry::{Parser, Registry};

/// Word-boundary confirmation that "PDC" is a standalone token, not part
/// of a route string like "..PDCRT..". quick_check only does substring
/// tests, so the precise check happens here.
static PDC_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bPDC\b").unwrap());

const FORMATS: &[Format] = &[
    Format {
        name: "clearance",
        pattern: r"(?P<flight>{FLIGHT})\s+(?:CLRD|CLEARED)\s+TO\s+(?P<dest>{ICAO})",
        fields: &["flight", "dest"],
    },
    // Issuing airport commonly leads the message body
    Format {
        name: "origin",
        pattern: r"^\W*(?P<origin>{ICAO})\b",
        fields: &["origin"],
    },
    Format {
        name: "runway",
        pattern: r"(?:RWY|RUNWAY|OFF)\s*(?P<runway>{RUNWAY})\b",
        fields: &["runway"],
    },
    Format {
        name: "sid",
        pattern: r"(?:VIA|SID)\s+(?P<sid>{SID})\b",
        fields: &["sid"],
    },
    Format {
        name: "squawk",
        pattern: r"(?:SQUAWK|SQK|XPDR)\s*(?P<squawk>{SQUAWK})\b",
        fields: &["squawk"],
    },
    Format {
        name: "cpdlc",
        pattern: r"(?:CPDLC|CTC|CONTACT|FREQ)[A-Z\s]*(?P<freq>{FREQ})",
        fields: &["freq"],
    },
    // Fallback when no CLRD TO phrasing is present
    Format {
        name: "flight",
        pattern: r"\b(?P<flight>{FLIGHT})\b",
        fields: &["flight"],
    },
];

static COMPILER: Lazy<Option<Compiler>> = Lazy::new(|| match Compiler::compile(FORMATS, None) {
    Ok(compiler) => Some(compiler),
    Err(e) => {
        warn!("pdc format compilation failed, decoder disabled: {e:#}");
        None
    }
});

#[derive(Debug, Clone, Default, Serialize)]
pub struct Clearance {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_runway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub squawk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpdlc_freq: Option<String>,
}

pub struct PdcParser;

impl Parser for PdcParser {
    fn name(&self) -> &'static str {
        "pdc"
    }

    fn priority(&self) -> i32 {
        500
    }

    fn quick_check(&self, text: &str) -> bool {
        if text.contains("NO PDC ON FILE") {
            return false;
        }
        text.starts_with("PDC") || text.contains(" PDC")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        if msg.text.is_empty() {
            return None;
        }
        let text = msg.text.trim();
        if !PDC_WORD_RE.is_match(text) {
            return None;
        }
        let compiler = COMPILER.as_ref()?;

        let mut clearance = Clearance {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            tail: super::tail_of(msg),
            ..Default::default()
        };

        for m in compiler.parse_all(text) {
            match m.format_name {
                "clearance" => {
                    clearance.flight = m.get("flight").map(str::to_string);
                    clearance.destination = m
                        .get("dest")
                        .filter(|d| !icao_blocklist_contains(d))
                        .map(str::to_string);
                }
                "origin" => {
                    clearance.origin = m
                        .get("origin")
                        .filter(|o| !icao_blocklist_contains(o))
                        .map(str::to_string);
                    clearance.origin_name = clearance
                        .origin
                        .as_deref()
                        .and_then(airports::name_of)
                        .map(str::to_string);
                }
                "runway" => {
                    clearance.departure_runway = m.get("runway").map(str::to_string)
                }
                "sid" => clearance.sid = m.get("sid").map(str::to_string),
                "squawk" => clearance.squawk = m.get("squawk").map(str::to_string),
                "cpdlc" => clearance.cpdlc_freq = m.get("freq").map(str::to_string),
                "flight" => {
                    if clearance.flight.is_none() {
                        clearance.flight = m.get("flight").map(str::to_string);
                    }
                }
                _ => {}
            }
        }

        // A clearance with no flight and no airports is just text that
        // happened to mention PDC
        if clearance.flight.is_none()
            && clearance.origin.is_none()
            && clearance.destination.is_none()
        {
            return None;
        }

        Some(Decoded::Pdc(clearance))
    }
}

pub fn register(registry: &mut Registry) {
    registry.register(Arc::new(PdcParser));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Clearance {
        let msg = Message::new(1, "4A", text);
        match PdcParser.parse(&msg) {
            Some(Decoded::Pdc(clearance)) => clearance,
            other => panic!("expected clearance, got {other:?}"),
        }
    }

    #[test]
    fn test_full_clearance() {
        let c = parse(
            "KSEA PDC 012 DAL879 CLRD TO MMUN OFF 16L VIA SUMMA2 SQUAWK 6343 CPDLC CTC 128.625",
        );
        assert_eq!(c.flight.as_deref(), Some("DAL879"));
        assert_eq!(c.origin.as_deref(), Some("KSEA"));
        assert_eq!(c.origin_name.as_deref(), Some("Seattle-Tacoma"));
        assert_eq!(c.destination.as_deref(), Some("MMUN"));
        assert_eq!(c.departure_runway.as_deref(), Some("16L"));
        assert_eq!(c.sid.as_deref(), Some("SUMMA2"));
        assert_eq!(c.squawk.as_deref(), Some("6343"));
        assert_eq!(c.cpdlc_freq.as_deref(), Some("128.625"));
    }

    #[test]
    fn test_minimal_pdc() {
        let c = parse("PDC UAL123 CLEARED TO KDEN RWY 28R");
        assert_eq!(c.flight.as_deref(), Some("UAL123"));
        assert_eq!(c.destination.as_deref(), Some("KDEN"));
        assert_eq!(c.departure_runway.as_deref(), Some("28R"));
        assert!(c.squawk.is_none());
    }

    #[test]
    fn test_no_pdc_on_file_rejected_cheaply() {
        assert!(!PdcParser.quick_check("NO PDC ON FILE"));
    }

    #[test]
    fn test_pdc_inside_route_token_is_a_miss() {
        // quick_check lets " PDCRT" through on the substring test; the
        // word-boundary check in parse has to reject it
        let msg = Message::new(1, "H1", "ROUTE ABC PDCRT DEF");
        assert!(PdcParser.parse(&msg).is_none());
    }

    #[test]
    fn test_blocklisted_word_is_not_an_origin() {
        let c = parse("WHEN READY PDC DAL879 CLRD TO MMUN");
        assert!(c.origin.is_none());
        assert_eq!(c.flight.as_deref(), Some("DAL879"));
    }

    #[test]
    fn test_quick_check_variants() {
        assert!(PdcParser.quick_check("PDC 012 DAL879..."));
        assert!(PdcParser.quick_check("KSEA PDC 012..."));
        assert!(!PdcParser.quick_check("ROUTEPDCRT"));
    }
}
