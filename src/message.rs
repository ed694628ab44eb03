use serde::{Deserialize, Serialize};

/// Airframe metadata attached to a message by the ingest layer.
///
/// Only consulted when the message itself carries no tail number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Airframe {
    /// Aircraft registration (e.g. "C-FGDT")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    /// 24-bit ICAO transponder address as hex (e.g. "C06AF2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icao_hex: Option<String>,
}

/// A single ACARS message as delivered by the transport layer.
///
/// Messages are immutable once dispatch begins; decoders only borrow them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    /// Externally assigned identifier
    pub id: i64,
    /// Receive timestamp in whatever format the source feed uses
    #[serde(default)]
    pub timestamp: String,
    /// Routing label, typically two characters ("H1", "B6", "15", "80", "27").
    /// Case-sensitive for dispatch.
    pub label: String,
    /// Raw message body. May contain transmission artefacts (`\r`, `\n`,
    /// `\t`, stray whitespace, continuation markers).
    pub text: String,
    /// Aircraft registration as reported on the link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    /// Airframe lookup data, used as fallback when `tail` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airframe: Option<Airframe>,
}

impl Message {
    pub fn new(id: i64, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// The tail number to report: the message's own, falling back to the
    /// airframe record when the message carries none.
    pub fn effective_tail(&self) -> Option<&str> {
        match self.tail.as_deref() {
            Some(t) if !t.is_empty() => Some(t),
            _ => self
                .airframe
                .as_ref()
                .and_then(|a| a.tail.as_deref())
                .filter(|t| !t.is_empty()),
        }
    }
}
