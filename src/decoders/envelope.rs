//! Catch-all envelope decoder.
//!
//! Terminal fallback: always produces a minimal result echoing the label,
//! tail and raw text, so dispatch never comes back empty-handed.

use serde::Serialize;
use std::sync::Arc;

use crate::decoded::Decoded;
use crate::message::Message;
use crate::registry::{Parser, Registry};

#[derive(Debug, Clone, Serialize)]
pub struct RawEnvelope {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    pub text: String,
}

pub struct EnvelopeParser;

impl Parser for EnvelopeParser {
    fn name(&self) -> &'static str {
        "envelope"
    }

    fn priority(&self) -> i32 {
        i32::MAX
    }

    fn quick_check(&self, _text: &str) -> bool {
        true
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        Some(Decoded::Envelope(RawEnvelope {
            message_id: msg.id,
            timestamp: super::timestamp_of(msg),
            label: msg.label.clone(),
            tail: super::tail_of(msg),
            text: msg.text.clone(),
        }))
    }
}

pub fn register(registry: &mut Registry) {
    registry.set_catch_all(Arc::new(EnvelopeParser));
}
