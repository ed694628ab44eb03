//! Parser registry and dispatch.
//!
//! The registry holds every decoder and routes messages through them in a
//! deterministic order: label-targeted parsers first (priority ascending,
//! registration order breaking ties), then content-based parsers, then the
//! catch-all envelope. Indices are built during registration and read-only
//! afterwards, so dispatch needs no locking.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{trace, warn};

use crate::decoded::Decoded;
use crate::message::Message;

/// Contract every decoder implements.
///
/// `quick_check` must stay cheap: substring tests only, no regex work. The
/// registry consults it before paying for `parse`. Parsers must not mutate
/// shared state during `parse`; dispatch runs concurrently.
pub trait Parser: Send + Sync {
    /// Unique name across the registry.
    fn name(&self) -> &'static str;

    /// Labels this parser handles. Empty means content-based: eligible for
    /// every message regardless of label.
    fn labels(&self) -> &'static [&'static str] {
        &[]
    }

    /// Dispatch order within a label bucket; lower runs first.
    /// Convention: label-targeted decoders 10-100, content-based 500+.
    fn priority(&self) -> i32;

    /// Cheap pre-filter over the raw text.
    fn quick_check(&self, text: &str) -> bool;

    /// Attempt to decode. `None` is a routine miss, not an error.
    fn parse(&self, msg: &Message) -> Option<Decoded>;
}

/// Process-wide registry wired with every built-in decoder.
static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::new();
    crate::decoders::register_all(&mut registry);
    registry
});

/// The shared default registry. Tests that need isolation build their own
/// `Registry` instead.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

#[derive(Default)]
pub struct Registry {
    by_label: HashMap<&'static str, Vec<Arc<dyn Parser>>>,
    content_based: Vec<Arc<dyn Parser>>,
    catch_all: Option<Arc<dyn Parser>>,
    names: HashSet<&'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parser. Parsers with declared labels go into each label's
    /// bucket; parsers without labels are content-based. A duplicate name
    /// is logged and ignored; registration happens once at startup and a
    /// misconfiguration should not take the process down.
    pub fn register(&mut self, parser: Arc<dyn Parser>) {
        if !self.names.insert(parser.name()) {
            warn!(parser = parser.name(), "duplicate parser name, ignoring");
            return;
        }
        let labels = parser.labels();
        if labels.is_empty() {
            self.content_based.push(parser);
            self.content_based.sort_by_key(|p| p.priority());
        } else {
            for &label in labels {
                let bucket = self.by_label.entry(label).or_default();
                bucket.push(Arc::clone(&parser));
                bucket.sort_by_key(|p| p.priority());
            }
        }
    }

    /// Install the terminal fallback. It runs after every other parser and
    /// is expected to always produce a result.
    pub fn set_catch_all(&mut self, parser: Arc<dyn Parser>) {
        if self.catch_all.is_some() {
            warn!(parser = parser.name(), "catch-all already set, replacing");
        }
        self.catch_all = Some(parser);
    }

    /// Run parsers in dispatch order and return the first result. With a
    /// catch-all installed this never returns `None`.
    pub fn dispatch_first(&self, msg: &Message) -> Option<Decoded> {
        for parser in self.eligible(msg) {
            if let Some(result) = Self::try_parse(parser, msg) {
                return Some(result);
            }
        }
        self.catch_all
            .as_deref()
            .and_then(|p| Self::try_parse(p, msg))
    }

    /// Run every eligible parser and collect all results. The catch-all is
    /// visited last, so the final element echoes the raw message.
    pub fn dispatch_all(&self, msg: &Message) -> Vec<Decoded> {
        let mut results: Vec<Decoded> = self
            .eligible(msg)
            .filter_map(|p| Self::try_parse(p, msg))
            .collect();
        if let Some(catch_all) = self.catch_all.as_deref() {
            results.extend(Self::try_parse(catch_all, msg));
        }
        results
    }

    /// Label-targeted parsers for the message's label, then content-based
    /// parsers, each in priority order.
    fn eligible<'a>(&'a self, msg: &Message) -> impl Iterator<Item = &'a dyn Parser> {
        let labelled = if msg.label.is_empty() {
            None
        } else {
            self.by_label.get(msg.label.as_str())
        };
        labelled
            .into_iter()
            .flatten()
            .chain(self.content_based.iter())
            .map(|p| p.as_ref() as &dyn Parser)
    }

    fn try_parse(parser: &dyn Parser, msg: &Message) -> Option<Decoded> {
        if !parser.quick_check(&msg.text) {
            return None;
        }
        let result = parser.parse(msg);
        if result.is_some() {
            trace!(parser = parser.name(), id = msg.id, "decoded message");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::envelope::RawEnvelope;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Test parser that records the order it was invoked in.
    struct Probe {
        name: &'static str,
        labels: &'static [&'static str],
        priority: i32,
        pass_quick_check: bool,
        produce: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
        quick_checks: Arc<AtomicUsize>,
    }

    impl Parser for Probe {
        fn name(&self) -> &'static str {
            self.name
        }
        fn labels(&self) -> &'static [&'static str] {
            self.labels
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn quick_check(&self, _text: &str) -> bool {
            self.quick_checks.fetch_add(1, Ordering::SeqCst);
            self.pass_quick_check
        }
        fn parse(&self, msg: &Message) -> Option<Decoded> {
            self.calls.lock().unwrap().push(self.name);
            self.produce.then(|| {
                Decoded::Envelope(RawEnvelope {
                    message_id: msg.id,
                    timestamp: None,
                    label: msg.label.clone(),
                    tail: None,
                    text: self.name.to_string(),
                })
            })
        }
    }

    fn probe(
        name: &'static str,
        labels: &'static [&'static str],
        priority: i32,
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<Probe> {
        Arc::new(Probe {
            name,
            labels,
            priority,
            pass_quick_check: true,
            produce: false,
            calls: Arc::clone(calls),
            quick_checks: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[test]
    fn test_priority_order_with_registration_tie_break() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register(probe("second", &["XX"], 50, &calls));
        registry.register(probe("tie_a", &["XX"], 10, &calls));
        registry.register(probe("tie_b", &["XX"], 10, &calls));
        registry.register(probe("content", &[], 500, &calls));

        let msg = Message::new(1, "XX", "anything");
        assert!(registry.dispatch_first(&msg).is_none());
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["tie_a", "tie_b", "second", "content"]
        );
    }

    #[test]
    fn test_label_gating() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register(probe("only_h1", &["H1"], 10, &calls));
        registry.register(probe("content", &[], 500, &calls));

        let msg = Message::new(1, "15", "FST01...");
        registry.dispatch_first(&msg);
        assert_eq!(*calls.lock().unwrap(), vec!["content"]);
    }

    #[test]
    fn test_quick_check_gates_parse() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();
        let failing = Probe {
            name: "gated",
            labels: &["XX"],
            priority: 10,
            pass_quick_check: false,
            produce: true,
            calls: Arc::clone(&calls),
            quick_checks: Arc::new(AtomicUsize::new(0)),
        };
        let quick_checks = Arc::clone(&failing.quick_checks);
        registry.register(Arc::new(failing));

        let msg = Message::new(1, "XX", "anything");
        assert!(registry.dispatch_first(&msg).is_none());
        assert_eq!(quick_checks.load(Ordering::SeqCst), 1);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_first_producer_wins_and_stops_dispatch() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();
        let winner = Probe {
            name: "winner",
            labels: &["XX"],
            priority: 10,
            pass_quick_check: true,
            produce: true,
            calls: Arc::clone(&calls),
            quick_checks: Arc::new(AtomicUsize::new(0)),
        };
        registry.register(Arc::new(winner));
        registry.register(probe("never_runs", &["XX"], 20, &calls));

        let msg = Message::new(42, "XX", "anything");
        let result = registry.dispatch_first(&msg).unwrap();
        assert_eq!(result.message_id(), 42);
        assert_eq!(*calls.lock().unwrap(), vec!["winner"]);
    }

    #[test]
    fn test_duplicate_name_ignored() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register(probe("dup", &["XX"], 10, &calls));
        registry.register(probe("dup", &["XX"], 20, &calls));

        registry.dispatch_first(&Message::new(1, "XX", "x"));
        assert_eq!(*calls.lock().unwrap(), vec!["dup"]);
    }

    #[test]
    fn test_multi_label_parser_reachable_from_each_label() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register(probe("adsc_like", &["A6", "B6"], 100, &calls));

        registry.dispatch_first(&Message::new(1, "A6", "x"));
        registry.dispatch_first(&Message::new(2, "B6", "x"));
        assert_eq!(*calls.lock().unwrap(), vec!["adsc_like", "adsc_like"]);
    }
}
