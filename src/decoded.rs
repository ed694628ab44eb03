//! The decoded-message union.
//!
//! Every decoder produces one of these variants. JSON output is a single
//! object: the payload's fields plus a `type` tag discriminating the
//! variant. Several decoders legitimately share the `"position"` tag; the
//! union is serialise-only, so the shared tag is not ambiguous anywhere.

use serde::{Serialize, Serializer};

use crate::decoders::adsc::AdscReport;
use crate::decoders::envelope::RawEnvelope;
use crate::decoders::fst::FstReport;
use crate::decoders::h1::{FlightPlan, H1PositionReport};
use crate::decoders::label16::WaypointPosition;
use crate::decoders::label17::WeatherReport;
use crate::decoders::label27::PosReport;
use crate::decoders::label80::PositionUpdate;
use crate::decoders::pdc::Clearance;

#[derive(Debug, Clone)]
pub enum Decoded {
    FlightPlan(FlightPlan),
    H1Position(H1PositionReport),
    Fst(FstReport),
    Label16Position(WaypointPosition),
    Weather(WeatherReport),
    Label27Position(PosReport),
    Label80Position(PositionUpdate),
    Adsc(AdscReport),
    Pdc(Clearance),
    Envelope(RawEnvelope),
}

impl Decoded {
    /// Stable string tag identifying the result shape in JSON output.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Decoded::FlightPlan(_) => "flight_plan",
            Decoded::H1Position(_)
            | Decoded::Label16Position(_)
            | Decoded::Label27Position(_)
            | Decoded::Label80Position(_) => "position",
            Decoded::Fst(_) => "fst",
            Decoded::Weather(_) => "weather",
            Decoded::Adsc(_) => "adsc",
            Decoded::Pdc(_) => "pdc",
            Decoded::Envelope(_) => "envelope",
        }
    }

    /// The originating message's identifier.
    pub fn message_id(&self) -> i64 {
        match self {
            Decoded::FlightPlan(r) => r.message_id,
            Decoded::H1Position(r) => r.message_id,
            Decoded::Fst(r) => r.message_id,
            Decoded::Label16Position(r) => r.message_id,
            Decoded::Weather(r) => r.message_id,
            Decoded::Label27Position(r) => r.message_id,
            Decoded::Label80Position(r) => r.message_id,
            Decoded::Adsc(r) => r.message_id,
            Decoded::Pdc(r) => r.message_id,
            Decoded::Envelope(r) => r.message_id,
        }
    }
}

/// Payload fields flattened next to the `type` tag.
#[derive(Serialize)]
struct Tagged<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

impl Serialize for Decoded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.type_tag();
        match self {
            Decoded::FlightPlan(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::H1Position(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::Fst(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::Label16Position(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::Weather(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::Label27Position(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::Label80Position(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::Adsc(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::Pdc(r) => Tagged { kind, body: r }.serialize(serializer),
            Decoded::Envelope(r) => Tagged { kind, body: r }.serialize(serializer),
        }
    }
}
