//! End-to-end dispatch tests against the default registry.
//!
//! These exercise the full path a caller sees: a raw `Message` goes in,
//! a typed result comes out, with label routing, priority ordering and
//! the envelope fallback all in play.

use std::collections::HashMap;

use downlink::{default_registry, Decoded, Message};

#[test]
fn test_label_27_position() {
    let msg = Message::new(
        101,
        "27",
        "POS01AFL1866 /16180720UUEEUDYZ FUEL 140 TEMP- 32 WDIR26631 WSPD 36 LATN 55.164 LONE 38.545 ETA1013 TUR ALT 21728",
    );
    let result = default_registry().dispatch_first(&msg).unwrap();
    assert_eq!(result.type_tag(), "position");
    assert_eq!(result.message_id(), 101);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["flight_num"], "AFL1866");
    assert_eq!(json["origin_icao"], "UUEE");
    assert_eq!(json["dest_icao"], "UDYZ");
    assert!((json["latitude"].as_f64().unwrap() - 55.164).abs() < 0.001);
    assert!((json["longitude"].as_f64().unwrap() - 38.545).abs() < 0.001);
    assert_eq!(json["altitude"], 21728);
    assert_eq!(json["fuel"], 140);
    assert_eq!(json["temperature"], -32);
    assert_eq!(json["wind_dir"], 266);
    assert_eq!(json["wind_speed"], 31);
}

#[test]
fn test_label_15_fst_kmh() {
    let msg = Message::new(
        102,
        "15",
        "FST01EGLLWSSSN452140E0249275330 854 242 M54C 6235410711950911600009590004",
    );
    let result = default_registry().dispatch_first(&msg).unwrap();
    assert_eq!(result.type_tag(), "fst");

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["origin"], "EGLL");
    assert_eq!(json["destination"], "WSSS");
    assert!((json["latitude"].as_f64().unwrap() - 45.3567).abs() < 0.01);
    assert!((json["longitude"].as_f64().unwrap() - 24.9275).abs() < 0.01);
    assert_eq!(json["flight_level"], 330);
    assert_eq!(json["ground_speed"], 854);
    assert_eq!(json["speed_unit"], "kmh");
    assert_eq!(json["speed_type"], "KMH");
    assert_eq!(json["temperature"], -54);
    assert_eq!(json["wind_speed"], 62);
    assert_eq!(json["wind_direction"], 354);
}

#[test]
fn test_label_15_fst_ias_gs() {
    let msg = Message::new(
        103,
        "15",
        "FST01OBBIEGLLN453619E0230053400 192 312 M49C 6328629129843211600006220349",
    );
    let result = default_registry().dispatch_first(&msg).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["speed_type"], "IAS+GS");
    assert_eq!(json["ias"], 192);
    assert_eq!(json["ground_speed"], 312);
    assert_eq!(json["speed_unit"], "knots");
    assert_eq!(json["temperature"], -49);
    assert_eq!(json["wind_speed"], 63);
    assert_eq!(json["wind_direction"], 286);
}

#[test]
fn test_label_b6_adsc() {
    let msg = Message::new(
        104,
        "B6",
        "/NYCODYA.ADS.C-FGDT070EF0E6A6C28908B7001F0D0CCCCEB05B090885A90B1F6EB5060908800E35F0FE3FFC0F3749A33FFC0258",
    );
    let result = default_registry().dispatch_first(&msg).unwrap();
    assert_eq!(result.type_tag(), "adsc");

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["registration"], "C-FGDT");
    assert!(json["latitude"].as_f64().unwrap() != 0.0);
    assert!(json["longitude"].as_f64().unwrap() != 0.0);
    let alt = json["altitude"].as_i64().unwrap();
    assert!((alt - 34000).abs() <= 500, "altitude {alt}");
}

#[test]
fn test_label_16_waypoint() {
    let msg = Message::new(
        105,
        "16",
        r"BEGLA  ,N 47.555,E 18.028,40025,490,1934,030\TS180357,311225",
    );
    let result = default_registry().dispatch_first(&msg).unwrap();
    assert_eq!(result.type_tag(), "position");

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["waypoint"], "BEGLA");
    assert!((json["latitude"].as_f64().unwrap() - 47.555).abs() < 0.001);
    assert!((json["longitude"].as_f64().unwrap() - 18.028).abs() < 0.001);
    assert_eq!(json["altitude"], 40025);
    assert_eq!(json["ground_speed"], 490);
}

#[test]
fn test_unknown_label_falls_to_envelope() {
    let msg = Message::new(106, "ZZ", "ANY OLD TEXT").with_tail("N842VA");
    let result = default_registry().dispatch_first(&msg).unwrap();
    assert_eq!(result.type_tag(), "envelope");

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["label"], "ZZ");
    assert_eq!(json["tail"], "N842VA");
    assert_eq!(json["text"], "ANY OLD TEXT");
}

#[test]
fn test_empty_text_envelope_only() {
    let msg = Message::new(107, "15", "");
    let result = default_registry().dispatch_first(&msg).unwrap();
    assert_eq!(result.type_tag(), "envelope");
}

#[test]
fn test_message_id_always_propagated() {
    for (label, text) in [
        ("15", "FST01EGLLWSSSN452140E0249275330 854 242 M54C 623541"),
        ("ZZ", "UNKNOWN"),
        ("B6", "/NYCODYA.ADS.C-FGDT070EF0E6A6C28908B7001F0D0C"),
    ] {
        let msg = Message::new(4242, label, text);
        let result = default_registry().dispatch_first(&msg).unwrap();
        assert_eq!(result.message_id(), 4242, "label {label}");
    }
}

#[test]
fn test_dispatch_all_is_idempotent_and_ends_with_envelope() {
    let msg = Message::new(
        108,
        "27",
        "POS01AFL1866 /16180720UUEEUDYZ FUEL 140 TEMP- 32 WDIR26631 WSPD 36 LATN 55.164 LONE 38.545 ETA1013 TUR ALT 21728",
    );
    let registry = default_registry();
    let first = registry.dispatch_all(&msg);
    let second = registry.dispatch_all(&msg);

    assert_eq!(first.len(), second.len());
    let tags: Vec<&str> = first.iter().map(Decoded::type_tag).collect();
    let tags_again: Vec<&str> = second.iter().map(Decoded::type_tag).collect();
    assert_eq!(tags, tags_again);
    assert_eq!(tags.first().copied(), Some("position"));
    assert_eq!(tags.last().copied(), Some("envelope"));
}

#[test]
fn test_h1_flight_plan_beats_pos_parser() {
    // Both H1 parsers are registered for the label; the plan parser has
    // the lower priority value and must win for plan bodies
    let msg = Message::new(109, "H1", "FPN/RI:DA:KSFO:AA:KJFK:F:OAK..ROBUC");
    let result = default_registry().dispatch_first(&msg).unwrap();
    assert_eq!(result.type_tag(), "flight_plan");

    let msg = Message::new(
        110,
        "H1",
        "POSN45209E023245,INVED,105718,330,LUGEB,112508,UDROS,M59,33450,1808/TS105718,010126904E",
    );
    let result = default_registry().dispatch_first(&msg).unwrap();
    assert_eq!(result.type_tag(), "position");
}

#[test]
fn test_pdc_is_content_based() {
    // A PDC arrives on whatever label the airline uses; no label targets it
    for label in ["4A", "10", "ZZ"] {
        let msg = Message::new(111, label, "PDC UAL123 CLEARED TO KDEN RWY 28R SQUAWK 4317");
        let result = default_registry().dispatch_first(&msg).unwrap();
        assert_eq!(result.type_tag(), "pdc", "label {label}");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["flight"], "UAL123");
        assert_eq!(json["squawk"], "4317");
    }
}

#[test]
fn test_sample_corpus_decodes_cleanly() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/acars-messages.txt");
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));

    let registry = default_registry();
    let mut total = 0u64;
    let mut by_tag: HashMap<&str, u64> = HashMap::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (label, text) = line
            .split_once('\t')
            .unwrap_or_else(|| panic!("malformed corpus line {}", line_no + 1));

        let msg = Message::new(line_no as i64 + 1, label, text);
        let result = registry
            .dispatch_first(&msg)
            .unwrap_or_else(|| panic!("no result for corpus line {}", line_no + 1));
        assert_eq!(result.message_id(), line_no as i64 + 1);

        total += 1;
        *by_tag.entry(result.type_tag()).or_default() += 1;
    }

    assert_eq!(total, 19);
    // Only the deliberately-unknown line may fall through to the envelope
    assert_eq!(by_tag.get("envelope").copied(), Some(1));
    assert_eq!(by_tag.get("position").copied(), Some(10));
    assert_eq!(by_tag.get("fst").copied(), Some(3));
    assert_eq!(by_tag.get("adsc").copied(), Some(2));
    assert_eq!(by_tag.get("flight_plan").copied(), Some(1));
    assert_eq!(by_tag.get("weather").copied(), Some(1));
    assert_eq!(by_tag.get("pdc").copied(), Some(1));
}
