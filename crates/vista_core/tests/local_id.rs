mod common;

use vista_core::{
    CodebookName, GmodPath, LocalId, LocalIdBuilder, LocalIdError, LocalIdParsingState,
    PathParseOptions, TaxonomyStore, Vis, VisVersion,
};

const V: VisVersion = VisVersion::V3_4a;

fn path(vis: &Vis, item: &str) -> GmodPath {
    vis.parse_path(item, V).unwrap()
}

fn failure_states(vis: &Vis, value: &str) -> Vec<LocalIdParsingState> {
    let (local_id, errors) = LocalId::try_parse(value, vis);
    assert!(local_id.is_none(), "{value} should not parse");
    errors.iter().map(|error| error.state).collect()
}

#[test]
fn parses_the_reference_identifier() {
    let vis = common::vis();
    let local_id =
        LocalId::parse("/dnv-v2/vis-3-4a/411.1/C101.31-2/meta/qty-temperature", &vis).unwrap();

    let primary = local_id.primary_item().unwrap();
    assert_eq!(primary.node().code(), "C101.31");
    assert_eq!(primary.node().location().map(|l| l.as_str()), Some("2"));
    assert!(local_id.secondary_item().is_none());

    let tags: Vec<_> = local_id.metadata_tags().collect();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name(), CodebookName::Quantity);
    assert_eq!(tags[0].value(), "temperature");
    assert!(!tags[0].is_custom());
    assert!(!local_id.verbose_mode());
}

#[test]
fn accepted_identifiers_round_trip_byte_for_byte() {
    let vis = common::vis();
    for value in [
        "/dnv-v2/vis-3-4a/411.1/C101.31-2/meta/qty-temperature",
        "/dnv-v2/vis-3-4a/411.1/C101.63/S206/sec/411.1/C101.31-5/meta/qty-temperature/cnt-exhaust.gas/pos-port-upper",
        "/dnv-v2/vis-3-4a/411.1/C101.63/S206/sec/411.1/C101.31-5/~propulsion.engine/~cooling.system/~for.propulsion.engine/~cylinder.5/meta/qty-temperature/cnt-exhaust.gas/pos-port-upper",
        "/dnv-v2/vis-3-4a/511.11/C101.31/meta/qty~heat.index/calc-average/detail-sensor.1",
        "/dnv-v2/vis-3-4a/meta/state-running/cmd-start/type-alarm",
        "/dnv-v2/vis-3-4a/411.1/C101.31-2/meta",
        "/dnv-v2/vis-3-5a/511.31/C121.31/C221/~exhaust.silencer/~silencing/meta/qty-pressure/pos~zone.b",
    ] {
        let local_id = LocalId::parse(value, &vis).unwrap();
        assert_eq!(local_id.to_string(), value);
    }
}

#[test]
fn builder_renders_canonical_and_verbose_forms() {
    let vis = common::vis();
    let codebooks = vis.codebooks(V).unwrap();
    let builder = LocalIdBuilder::create(V)
        .with_primary_item(path(&vis, "411.1/C101.63/S206"))
        .unwrap()
        .with_secondary_item(path(&vis, "411.1/C101.31-5"))
        .unwrap()
        .with_metadata_tag(codebooks.create_tag(CodebookName::Position, "port-upper").unwrap())
        .unwrap()
        .with_metadata_tag(codebooks.create_tag(CodebookName::Quantity, "temperature").unwrap())
        .unwrap();

    assert!(builder.is_valid());
    assert_eq!(
        builder.to_string(),
        "/dnv-v2/vis-3-4a/411.1/C101.63/S206/sec/411.1/C101.31-5/meta/qty-temperature/pos-port-upper"
    );
    assert_eq!(
        builder.clone().with_verbose_mode(true).to_string(),
        "/dnv-v2/vis-3-4a/411.1/C101.63/S206/sec/411.1/C101.31-5/~propulsion.engine/~cooling.system/~for.propulsion.engine/~cylinder.5/meta/qty-temperature/pos-port-upper"
    );

    let first = builder.clone().build().unwrap();
    let second = builder.build().unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_builder_does_not_build() {
    let err = LocalIdBuilder::create(V).build().unwrap_err();
    assert_eq!(err, LocalIdError::EmptyLocalId);
}

#[test]
fn builder_rejects_invalid_components() {
    let vis = common::vis();
    let primary = path(&vis, "411.1/C101.31");
    let relaxed = PathParseOptions {
        require_mappable: false,
        ..PathParseOptions::default()
    };
    let ancestor = vis
        .gmod(V)
        .unwrap()
        .parse_path_with("411.1", vis.locations(V).unwrap(), &relaxed)
        .unwrap();

    let builder = LocalIdBuilder::create(V)
        .with_primary_item(primary.clone())
        .unwrap();
    let err = builder.clone().with_secondary_item(ancestor.clone()).unwrap_err();
    assert!(matches!(err, LocalIdError::InvalidComponent(_)));
    let unchanged = builder.clone().try_with_secondary_item(Some(ancestor));
    assert_eq!(unchanged, builder);

    let foreign = vis.parse_path("411.1/C101.31", VisVersion::V3_5a).unwrap();
    let err = LocalIdBuilder::create(V)
        .with_primary_item(foreign)
        .unwrap_err();
    assert!(matches!(err, LocalIdError::InvalidComponent(_)));

    let service = vis
        .codebooks(V)
        .unwrap()
        .create_tag(CodebookName::FunctionalServices, "heating")
        .unwrap();
    let err = LocalIdBuilder::create(V)
        .with_metadata_tag(service.clone())
        .unwrap_err();
    assert!(matches!(err, LocalIdError::InvalidComponent(_)));
    assert!(LocalIdBuilder::create(V)
        .try_with_metadata_tag(Some(service))
        .is_empty());
}

#[test]
fn secondary_item_needs_a_primary_item() {
    let vis = common::vis();
    let codebooks = vis.codebooks(V).unwrap();
    let temperature = codebooks
        .create_tag(CodebookName::Quantity, "temperature")
        .unwrap();
    let tagged = LocalIdBuilder::create(V)
        .with_metadata_tag(temperature)
        .unwrap();

    let err = tagged
        .clone()
        .with_secondary_item(path(&vis, "411.1/C101.31"))
        .unwrap_err();
    assert!(matches!(err, LocalIdError::InvalidComponent(_)));
    let unchanged = tagged
        .clone()
        .try_with_secondary_item(Some(path(&vis, "411.1/C101.31")));
    assert!(unchanged.secondary_item().is_none());

    let orphaned = tagged
        .with_primary_item(path(&vis, "411.1/C101.63/S206"))
        .unwrap()
        .with_secondary_item(path(&vis, "411.1/C101.31"))
        .unwrap()
        .without_primary_item();
    let err = orphaned.build().unwrap_err();
    assert!(matches!(err, LocalIdError::InvalidComponent(_)));

    let (local_id, errors) = LocalId::try_parse(
        "/dnv-v2/vis-3-4a/sec/411.1/C101.31/meta/qty-temperature",
        &vis,
    );
    assert!(local_id.is_none());
    assert!(errors.has_errors());
}

#[test]
fn builder_replaces_and_removes_components() {
    let vis = common::vis();
    let codebooks = vis.codebooks(V).unwrap();
    let builder = LocalIdBuilder::create(V)
        .try_with_primary_item(Some(path(&vis, "411.1/C101.31")))
        .try_with_metadata_tag(codebooks.try_create_tag(CodebookName::Quantity, "temperature"))
        .try_with_metadata_tag(codebooks.try_create_tag(CodebookName::Quantity, "heat.index"))
        .try_with_metadata_tag(codebooks.try_create_tag(CodebookName::Content, "Bad Value"));

    assert_eq!(
        builder.to_string(),
        "/dnv-v2/vis-3-4a/411.1/C101.31/meta/qty~heat.index"
    );
    assert!(builder.has_custom_tag());

    let stripped = builder
        .without_metadata_tag(CodebookName::Quantity)
        .without_primary_item();
    assert!(stripped.is_empty());
    assert!(stripped.metadata_tag(CodebookName::Quantity).is_none());
}

#[test]
fn malformed_strings_report_formatting_states() {
    let vis = common::vis();
    assert_eq!(failure_states(&vis, ""), vec![LocalIdParsingState::EmptyState]);
    assert_eq!(
        failure_states(&vis, "dnv-v2/vis-3-4a/411.1/C101.31/meta/qty-temperature"),
        vec![LocalIdParsingState::Formatting]
    );
    assert_eq!(
        failure_states(&vis, "/dnv-v2/vis-3-4a/411.1/C101.31/meta/qty-temperature/"),
        vec![LocalIdParsingState::Formatting]
    );
    assert_eq!(
        failure_states(&vis, "/dnv-v2/vis-3-4a//meta/qty-temperature"),
        vec![LocalIdParsingState::Formatting]
    );
    assert_eq!(
        failure_states(&vis, "/dnv-v2/vis-3-4a/meta"),
        vec![LocalIdParsingState::EmptyState]
    );
}

#[test]
fn header_and_item_failures_name_their_section() {
    let vis = common::vis();
    let cases = [
        ("/dnv-v3/vis-3-4a/411.1/C101.31/meta/qty-temperature", LocalIdParsingState::NamingRule),
        ("/dnv-v2/vis-9-9z/411.1/C101.31/meta/qty-temperature", LocalIdParsingState::VisVersion),
        ("/dnv-v2/vis-3-7a/411.1/C101.31/meta/qty-temperature", LocalIdParsingState::VisVersion),
        ("/dnv-v2/vis-3-4a/411.1/S90/meta/qty-temperature", LocalIdParsingState::PrimaryItem),
        ("/dnv-v2/vis-3-4a/sec/411.1/C101.31/meta/qty-temperature", LocalIdParsingState::PrimaryItem),
        ("/dnv-v2/vis-3-4a/411.1/C101.31/sec/411.1/X1/meta/qty-temperature", LocalIdParsingState::SecondaryItem),
        ("/dnv-v2/vis-3-4a/411.1/C101.31-2", LocalIdParsingState::ItemDescription),
        ("/dnv-v2/vis-3-4a/411.1/C101.31-2/~engine/meta/qty-temperature", LocalIdParsingState::ItemDescription),
    ];
    for (value, state) in cases {
        assert_eq!(failure_states(&vis, value), vec![state], "{value}");
    }
}

#[test]
fn metadata_failures_name_their_category() {
    let vis = common::vis();
    let prefix = "/dnv-v2/vis-3-4a/411.1/C101.31/meta/";
    let cases = [
        ("qty~temperature", LocalIdParsingState::MetaQuantity),
        ("qty-heat.index", LocalIdParsingState::MetaQuantity),
        ("qty-Temperature", LocalIdParsingState::MetaQuantity),
        ("state-opened/qty-temperature", LocalIdParsingState::MetaQuantity),
        ("qty-temperature/qty-pressure", LocalIdParsingState::MetaQuantity),
        ("pos-upper-port", LocalIdParsingState::MetaPosition),
        ("foo-bar", LocalIdParsingState::MetaPrefix),
        ("funct.svc-heating", LocalIdParsingState::MetaPrefix),
        ("temperature", LocalIdParsingState::MetaTag),
    ];
    for (tags, state) in cases {
        let value = format!("{prefix}{tags}");
        assert_eq!(failure_states(&vis, &value), vec![state], "{value}");
    }
}

#[test]
fn separator_messages_explain_the_fix() {
    let vis = common::vis();
    let err = LocalId::parse("/dnv-v2/vis-3-4a/411.1/C101.31/meta/qty-heat.index", &vis)
        .unwrap_err();
    let LocalIdError::Parse(errors) = err else {
        panic!("expected parse errors");
    };
    assert!(errors.has_error_state(LocalIdParsingState::MetaQuantity));
    assert!(errors.to_string().contains("Use prefix '~' for custom values"));

    let (builder, errors) =
        LocalIdBuilder::try_parse("/dnv-v2/vis-3-4a/411.1/C101.31/meta/qty~temperature", &vis);
    assert!(builder.is_none());
    assert!(errors.to_string().contains("Use prefix '-' for standard values"));
}

#[test]
fn successful_parse_reports_no_errors() {
    let vis = common::vis();
    let (local_id, errors) =
        LocalId::try_parse("/dnv-v2/vis-3-4a/411.1/C101.31-2/meta/qty-temperature", &vis);
    assert!(local_id.is_some());
    assert!(errors.is_empty());
    assert_eq!(errors.to_string(), "Success");
}
