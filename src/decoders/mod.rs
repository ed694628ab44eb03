//! Per-label decoders.
//!
//! Each module owns one dialect: its format table, its result payload and
//! a `register` hook. `register_all` wires the full set into a registry in
//! one call, which is how the default registry is built.

pub mod adsc;
pub mod envelope;
pub mod fst;
pub mod h1;
pub mod label16;
pub mod label17;
pub mod label27;
pub mod label80;
pub mod pdc;

use crate::message::Message;
use crate::registry::Registry;

/// Register every built-in decoder plus the envelope catch-all.
pub fn register_all(registry: &mut Registry) {
    h1::register(registry);
    fst::register(registry);
    label16::register(registry);
    label17::register(registry);
    label27::register(registry);
    label80::register(registry);
    adsc::register(registry);
    pdc::register(registry);
    envelope::register(registry);
}

/// Receive timestamp for a result, omitted when the feed supplied none.
pub(crate) fn timestamp_of(msg: &Message) -> Option<String> {
    if msg.timestamp.is_empty() {
        None
    } else {
        Some(msg.timestamp.clone())
    }
}

/// Tail number for a result, with the airframe fallback applied.
pub(crate) fn tail_of(msg: &Message) -> Option<String> {
    msg.effective_tail().map(str::to_string)
}
