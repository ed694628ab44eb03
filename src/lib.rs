//! downlink - ACARS message decoding engine
//!
//! This library turns raw ACARS messages into structured records. A
//! registry dispatches each message through label-targeted decoders (FST,
//! CSV positions, POS reports, ADS-C, flight plans), then content-based
//! ones (pre-departure clearances), and finally a catch-all envelope, so
//! every message yields a result.

pub mod airports;
pub mod coordinates;
pub mod decoded;
pub mod decoders;
pub mod grok;
pub mod message;
pub mod patterns;
pub mod registry;

pub use decoded::Decoded;
pub use grok::{Compiler, Format, GrokMatch};
pub use message::{Airframe, Message};
pub use registry::{default_registry, Parser, Registry};
