mod common;

use vista_core::{
    ConversionError, GmodVersioning, LocalId, LocalIdBuilder, TaxonomyStore, VisVersion,
};

const FROM: VisVersion = VisVersion::V3_4a;
const TO: VisVersion = VisVersion::V3_5a;

#[test]
fn renamed_terminal_keeps_a_valid_chain() {
    let vis = common::vis();
    let path = vis.parse_path("111.3/H402", FROM).unwrap();

    let converted = vis.convert_path(FROM, &path, TO).unwrap().unwrap();
    assert_eq!(converted.to_string(), "111.3/H402A");
    assert_eq!(converted.vis_version(), TO);
    assert_eq!(converted.node().code(), "H402A");
    let target = vis.gmod(TO).unwrap();
    assert!(vista_core::GmodPath::is_valid(
        target,
        converted.parents(),
        converted.node()
    ));

    let back = vis.convert_path(TO, &converted, FROM).unwrap().unwrap();
    assert_eq!(back, path);
}

#[test]
fn node_conversion_is_symmetric() {
    let vis = common::vis();
    let node = vis.gmod(FROM).unwrap().node_by_code("H402").unwrap();

    let forward = vis.convert_node(FROM, node, TO).unwrap().unwrap();
    assert_eq!(forward.code(), "H402A");
    let back = vis.convert_node(TO, &forward, FROM).unwrap().unwrap();
    assert_eq!(&back, node);
}

#[test]
fn unchanged_paths_convert_verbatim() {
    let vis = common::vis();
    let path = vis.parse_path("411.1/C101.31-2", FROM).unwrap();
    let converted = vis.convert_path(FROM, &path, TO).unwrap().unwrap();
    assert_eq!(converted.to_string(), "411.1/C101.31-2");
    assert_eq!(converted.node().location().map(|l| l.as_str()), Some("2"));
}

#[test]
fn terminal_without_counterpart_converts_to_none() {
    let vis = common::vis();
    let path = vis.parse_path("111.3/H404", FROM).unwrap();
    assert_eq!(vis.convert_path(FROM, &path, TO).unwrap(), None);
}

#[test]
fn code_change_wins_over_assignment_change() {
    let vis = common::vis();
    let path = vis.parse_path("511.331/C221", FROM).unwrap();

    let converted = vis.convert_path(FROM, &path, TO).unwrap().unwrap();
    assert_eq!(converted.to_string(), "511.31/C121.31/C221");
    assert_eq!(
        converted.to_full_path_string(),
        "VE/500a/510/511/511.3/511.31/C121/C121.3/C121.31/C221"
    );
}

#[test]
fn unreachable_target_is_an_invariant_violation() {
    let vis = common::vis();
    let path = vis.parse_path("111.3/H401", FROM).unwrap();
    let err = vis.convert_path(FROM, &path, TO).unwrap_err();
    assert!(matches!(err, ConversionError::ConversionInvariantViolation(_)));
}

#[test]
fn unknown_releases_are_invalid_conversions() {
    let vis = common::vis();
    let path = vis.parse_path("111.3/H402", FROM).unwrap();
    let err = vis.convert_path(FROM, &path, VisVersion::V3_7a).unwrap_err();
    assert!(matches!(err, ConversionError::InvalidConversion(_)));

    let versioning = GmodVersioning::from_dto(&common::versioning_dto()).unwrap();
    let err = versioning
        .convert_code(FROM, "H402", VisVersion::V3_8a)
        .unwrap_err();
    assert!(matches!(err, ConversionError::InvalidConversion(_)));
    assert_eq!(
        versioning.convert_code(FROM, "411.1", TO).unwrap(),
        "411.1"
    );
    let known: Vec<VisVersion> = versioning.known_versions().collect();
    assert_eq!(known, vec![FROM, TO]);
}

#[test]
fn local_ids_convert_items_and_keep_tags() {
    let vis = common::vis();
    let local_id = LocalId::parse(
        "/dnv-v2/vis-3-4a/111.3/H402/meta/qty-pressure/state-opened",
        &vis,
    )
    .unwrap();

    let converted = vis.convert_local_id(&local_id, TO).unwrap().unwrap();
    assert_eq!(
        converted.to_string(),
        "/dnv-v2/vis-3-5a/111.3/H402A/meta/qty-pressure/state-opened"
    );

    let unmapped = LocalIdBuilder::create(FROM)
        .with_primary_item(vis.parse_path("111.3/H404", FROM).unwrap())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(vis.convert_local_id(&unmapped, TO).unwrap(), None);
}
