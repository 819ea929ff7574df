//! Integration tests for the query surface.
//!
//! These tests run realistic ADT and ORU messages through the engine with
//! its default configuration and with each policy switched off.

mod fixtures;

use hl7_query::{
    Field, LocationKey, Node, QueryConfig, QueryEngine, QueryError, Segment, Setting, Strategy,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn texts(nodes: &[Node<'_>]) -> Vec<String> {
    nodes.iter().map(|node| node.to_string()).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_component_of_composite_field() {
    init_tracing();
    let mut structure = fixtures::adt();
    let mut engine = QueryEngine::new(&mut structure);

    let id = engine.get("PID-3.1").unwrap().unwrap();
    assert_eq!(id.data(), Some("12345"));
    assert!(id.is_leaf());
}

#[test]
fn test_whole_composite_field() {
    let mut engine = QueryEngine::new(fixtures::adt());

    let field = engine.get("PID-3").unwrap().unwrap();
    assert!(field.as_field().is_some());
    assert!(!field.is_leaf());
    assert_eq!(field.to_string(), "12345^DOE^JOHN");
    assert_eq!(field.as_field().unwrap().components().len(), 3);
}

#[test]
fn test_get_all_across_segment_occurrences() {
    let mut engine = QueryEngine::new(fixtures::oru());

    let ids = engine.get_all("PID-3").unwrap();
    assert_eq!(texts(&ids), vec!["12345^DOE^JOHN", "67890^ROE^RICHARD"]);

    let second = engine.get("PID[1]-3.2").unwrap().unwrap();
    assert_eq!(second.data(), Some("ROE"));
}

#[test]
fn test_has_segment_occurrence() {
    let mut engine = QueryEngine::new(fixtures::oru());

    assert!(engine.has("OBX").unwrap());
    assert!(engine.has("OBX[2]").unwrap());
    assert!(!engine.has("OBX[3]").unwrap());
    assert!(!engine.has("NK1").unwrap());
}

#[test]
fn test_has_field_level() {
    let mut engine = QueryEngine::new(fixtures::adt());

    assert!(engine.has("PID-3.2").unwrap());
    assert!(!engine.has("PID-3.9").unwrap());
    assert!(!engine.has("PID-99").unwrap());
    assert!(!engine.has("ZZZ-1").unwrap());

    // An empty value is still a value
    assert!(engine.has("PID-2").unwrap());
}

#[test]
fn test_has_ignores_never_return_null() {
    for never_return_null in [true, false] {
        let config = QueryConfig::builder()
            .with_never_return_null(never_return_null)
            .build();
        let mut engine = QueryEngine::with_config(fixtures::adt(), config);
        assert!(!engine.has("ZZZ-1").unwrap());
        assert!(!engine.has("PID-3.9").unwrap());
        assert!(engine.has("PID-3.1").unwrap());
        assert!(engine.has("PID-5").unwrap());
    }
}

// ============================================================================
// Never-return-null
// ============================================================================

#[test]
fn test_missing_segment_yields_sentinel() {
    let mut engine = QueryEngine::new(fixtures::adt());

    let node = engine.get("ZZZ-1").unwrap().unwrap();
    assert!(node.is_empty_sentinel());
    assert_eq!(node.data(), Some(""));
    assert_eq!(node.to_string(), "");
}

#[test]
fn test_missing_segment_yields_none_when_disabled() {
    let config = QueryConfig::builder().with_never_return_null(false).build();
    let mut engine = QueryEngine::with_config(fixtures::adt(), config);

    assert!(engine.get("ZZZ-1").unwrap().is_none());
    assert!(engine.get("PID-3(4)").unwrap().is_none());
    assert!(engine.get("PID-3.2.2").unwrap().is_none());
}

#[test]
fn test_plural_lookup_is_empty_either_way() {
    let mut engine = QueryEngine::new(fixtures::adt());
    assert!(engine.get_all("ZZZ-1").unwrap().is_empty());

    engine.set(Setting::NeverReturnNull, false);
    assert!(engine.get_all("ZZZ-1").unwrap().is_empty());
}

#[test]
fn test_segment_only_get_is_not_a_node() {
    let mut engine = QueryEngine::new(fixtures::adt());
    assert!(engine.get("PID").unwrap().unwrap().is_empty_sentinel());
    assert!(engine.get_all("PID").unwrap().is_empty());
}

// ============================================================================
// Roll-up-dot-one
// ============================================================================

#[test]
fn test_roll_up_returns_base_field() {
    let mut engine = QueryEngine::new(fixtures::adt());

    let node = engine.get("PID-5.1").unwrap().unwrap();
    assert!(node.as_field().is_some());
    assert_eq!(node.data(), Some("SMITH"));
}

#[test]
fn test_roll_up_disabled_is_strict() {
    let config = QueryConfig::builder()
        .with_roll_up_dot_one(false)
        .with_never_return_null(false)
        .build();
    let mut engine = QueryEngine::with_config(fixtures::adt(), config);

    assert!(engine.get("PID-5.1").unwrap().is_none());
    assert!(engine.get_all("PID-5.1").unwrap().is_empty());

    engine.set(Setting::NeverReturnNull, true);
    assert!(engine.get("PID-5.1").unwrap().unwrap().is_empty_sentinel());
}

#[test]
fn test_roll_up_only_applies_to_component_one() {
    let mut engine = QueryEngine::new(fixtures::adt());
    assert!(engine.get("PID-5.2").unwrap().unwrap().is_empty_sentinel());
    assert!(engine.get("PID-5.1.1").unwrap().unwrap().is_empty_sentinel());
}

#[test]
fn test_roll_up_does_not_affect_composites() {
    let mut engine = QueryEngine::new(fixtures::adt());
    let node = engine.get("PID-3.1").unwrap().unwrap();
    assert!(node.as_component().is_some());
}

#[test]
fn test_roll_up_across_occurrences() {
    let mut engine = QueryEngine::new(fixtures::oru());
    let names = engine.get_all("PID-5.1").unwrap();
    assert_eq!(texts(&names), vec!["SMITH", "JONES"]);
}

// ============================================================================
// Repetitions, components and subcomponents
// ============================================================================

#[test]
fn test_repetitions() {
    let mut engine = QueryEngine::new(fixtures::adt());

    let phones = engine.get_all("PID-13").unwrap();
    assert_eq!(texts(&phones), vec!["555-1234", "555-9876"]);

    assert_eq!(engine.get("PID-13").unwrap().unwrap().data(), Some("555-1234"));
    assert_eq!(engine.get("PID-13(1)").unwrap().unwrap().data(), Some("555-9876"));
    assert!(engine.get("PID-13(2)").unwrap().unwrap().is_empty_sentinel());
}

#[test]
fn test_repetitions_within_repeated_segments() {
    let mut engine = QueryEngine::new(fixtures::oru());
    let values = engine.get_all("OBX-5").unwrap();
    assert_eq!(texts(&values), vec!["182", "7.2", "7.4", "72"]);

    let second = engine.get_all("OBX-5(1)").unwrap();
    assert_eq!(texts(&second), vec!["7.4"]);
}

#[test]
fn test_subcomponents() {
    let mut engine = QueryEngine::new(fixtures::oru());

    let units = engine.get("OBX-6").unwrap().unwrap();
    assert_eq!(units.to_string(), "mg/dl&milligrams per deciliter&UCUM");

    let text = engine.get("OBX-6.1.2").unwrap().unwrap();
    assert!(text.as_subcomponent().is_some());
    assert_eq!(text.data(), Some("milligrams per deciliter"));

    let component = engine.get("OBX-6.1").unwrap().unwrap();
    assert_eq!(component.data(), None);
    assert_eq!(component.to_string(), "mg/dl&milligrams per deciliter&UCUM");
}

#[test]
fn test_empty_components_are_addressable() {
    let mut engine = QueryEngine::new(fixtures::adt());
    let street2 = engine.get("PID-11.2").unwrap().unwrap();
    assert!(!street2.is_empty_sentinel());
    assert_eq!(street2.data(), Some(""));
    assert_eq!(engine.get("PID-11.4").unwrap().unwrap().data(), Some("NC"));
}

#[test]
fn test_segment_identifier_slot() {
    let mut engine = QueryEngine::new(fixtures::adt());
    assert_eq!(engine.get("EVN-0").unwrap().unwrap().data(), Some("EVN"));
    assert_eq!(engine.get("MSH-1").unwrap().unwrap().data(), Some("|"));
    assert_eq!(engine.get("MSH-9.2").unwrap().unwrap().data(), Some("A01"));
}

#[test]
fn test_descriptor_is_case_insensitive() {
    let mut engine = QueryEngine::new(fixtures::adt());
    assert_eq!(engine.get("pid-3.1").unwrap().unwrap().data(), Some("12345"));
    assert_eq!(engine.get("Nk1[1]-2.2").unwrap().unwrap().data(), Some("JIM"));
}

#[test]
fn test_location_key_input() {
    let mut engine = QueryEngine::new(fixtures::adt());
    let key = LocationKey::new("NK1").with_field(2).with_component(0);
    let names = engine.get_all(&key).unwrap();
    assert_eq!(texts(&names), vec!["DOE", "DOE"]);
}

#[test]
fn test_malformed_descriptor_propagates() {
    let mut engine = QueryEngine::new(fixtures::adt());
    for bad in ["", "P", "PID-", "PID-a", "PID[x]", "PID-1.2.3.4"] {
        assert!(
            matches!(engine.get(bad), Err(QueryError::Descriptor(_))),
            "descriptor {:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_zero_positions_are_never_found() {
    for strategy in [Strategy::Indexed, Strategy::DirectWalk] {
        for never_return_null in [true, false] {
            let config = QueryConfig::builder()
                .with_strategy(strategy)
                .with_never_return_null(never_return_null)
                .build();
            let mut engine = QueryEngine::with_config(fixtures::adt(), config);

            for descriptor in ["PID-3.0", "PID-5.0", "PID-3.1.0", "PID-3.0.1"] {
                assert!(!engine.has(descriptor).unwrap(), "{}", descriptor);
                assert!(engine.get_all(descriptor).unwrap().is_empty(), "{}", descriptor);

                let node = engine.get(descriptor).unwrap();
                if never_return_null {
                    assert!(node.unwrap().is_empty_sentinel());
                } else {
                    assert!(node.is_none());
                }
                assert!(engine.resolve(descriptor).is_err());
            }
        }
    }
}

// ============================================================================
// Segments
// ============================================================================

#[test]
fn test_get_segment() {
    let engine = QueryEngine::new(fixtures::oru());

    let obx = engine.get_segment("OBX[1]").unwrap().unwrap();
    assert_eq!(obx.field(1).unwrap().to_string(), "2");

    let first = engine.get_segment("OBX").unwrap().unwrap();
    assert_eq!(first.field(1).unwrap().to_string(), "1");

    assert!(engine.get_segment("OBX[7]").unwrap().is_none());
    assert!(engine.get_segment("NTE").unwrap().is_none());
}

#[test]
fn test_get_all_segments() {
    let engine = QueryEngine::new(fixtures::oru());

    let observations = engine.get_all_segments("obx").unwrap();
    assert_eq!(observations.len(), 3);
    let set_ids: Vec<String> = observations
        .iter()
        .map(|segment| segment.field(1).unwrap().to_string())
        .collect();
    assert_eq!(set_ids, vec!["1", "2", "3"]);

    assert_eq!(engine.get_all_segments("PID[1]").unwrap().len(), 1);
    assert!(engine.get_all_segments("NTE").unwrap().is_empty());
}

// ============================================================================
// Freshness
// ============================================================================

#[test]
fn test_inserted_segment_visible_to_next_query() {
    init_tracing();
    let mut structure = fixtures::oru();
    let mut engine = QueryEngine::new(&mut structure);
    assert_eq!(engine.get_all("OBX-1").unwrap().len(), 3);
    let builds = engine.index_stats().rebuilds;

    let obx = Segment::new("OBX")
        .unwrap()
        .with_field(Field::base("4"))
        .with_field(Field::base("NM"));
    engine.structure_mut().insert_segment(6, obx).unwrap();
    assert!(!engine.is_fresh());

    let set_ids = engine.get_all("OBX-1").unwrap();
    assert_eq!(texts(&set_ids), vec!["1", "2", "3", "4"]);
    assert!(engine.has("OBX[3]").unwrap());
    assert_eq!(engine.index_stats().rebuilds, builds + 1);
}

#[test]
fn test_removed_segment_disappears() {
    let mut engine = QueryEngine::new(fixtures::oru());
    let removed = engine.structure_mut().remove_segment(1).unwrap();
    assert_eq!(removed.name(), "PID");

    let ids = engine.get_all("PID-3.1").unwrap();
    assert_eq!(texts(&ids), vec!["67890"]);
}

#[test]
fn test_in_place_edit_then_query() {
    let mut engine = QueryEngine::new(fixtures::adt());

    engine
        .structure_mut()
        .segment_mut(2)
        .unwrap()
        .set_field(5, Field::from_texts(["SMITH", "ANNE"]))
        .unwrap();

    let node = engine.get("PID-5.2").unwrap().unwrap();
    assert_eq!(node.data(), Some("ANNE"));
}

#[test]
fn test_no_rebuild_without_mutation() {
    let mut engine = QueryEngine::new(fixtures::adt());
    for _ in 0..5 {
        engine.get("PID-3.1").unwrap();
    }
    assert_eq!(engine.index_stats().rebuilds, 1);
}

#[test]
fn test_direct_walk_sees_mutations_without_rebuild() {
    let config = QueryConfig::builder().with_strategy(Strategy::DirectWalk).build();
    let mut engine = QueryEngine::with_config(fixtures::adt(), config);

    engine
        .structure_mut()
        .push_segment(Segment::new("ZPI").unwrap().with_field(Field::base("custom")));

    assert_eq!(engine.get("ZPI-1").unwrap().unwrap().data(), Some("custom"));
    assert_eq!(engine.index_stats().rebuilds, 1);
}

// ============================================================================
// Strict resolution
// ============================================================================

#[test]
fn test_resolve_surfaces_lookup_errors() {
    let mut engine = QueryEngine::new(fixtures::adt());

    assert!(matches!(engine.resolve("ZZZ-1"), Err(QueryError::NotFound(_))));
    assert!(matches!(
        engine.resolve("PID-13(5)"),
        Err(QueryError::IndexOutOfRange { index: 5, len: 2, .. })
    ));
    assert!(matches!(
        engine.resolve("NK1[4]-2"),
        Err(QueryError::IndexOutOfRange { index: 4, len: 2, .. })
    ));
    assert_eq!(engine.resolve("NK1[1]-3").unwrap().data(), Some("SON"));
}

#[test]
fn test_resolve_error_names_the_location() {
    let mut engine = QueryEngine::new(fixtures::adt());
    let err = engine.resolve("ZZZ-1").unwrap_err();
    assert_eq!(err.to_string(), "Nothing found at ZZZ-1");
}
