#![allow(dead_code)]

use serde_json::{json, Value};
use vista_core::{
    CodebooksDto, GmodDto, GmodVersioning, GmodVersioningDto, LocationsDto, Vis, VisVersion,
};

fn node(code: &str, category: &str, node_type: &str, name: &str) -> Value {
    json!({ "code": code, "category": category, "type": node_type, "name": name })
}

fn relations(pairs: &[(&str, &str)]) -> Value {
    Value::Array(
        pairs
            .iter()
            .map(|(parent, child)| json!([parent, child]))
            .collect(),
    )
}

/// Nodes shared by both releases.
fn shared_nodes() -> Vec<Value> {
    let mut engine_leaf = node("411.1", "ASSET FUNCTION", "LEAF", "Propulsion driver");
    engine_leaf["normalAssignmentNames"] = json!({ "C101": "Propulsion engine" });
    vec![
        node("VE", "ASSET FUNCTION", "GROUP", "Vessel"),
        node("400a", "ASSET FUNCTION", "GROUP", "Propulsion and steering"),
        node("410", "ASSET FUNCTION", "GROUP", "Propulsion"),
        node("411", "ASSET FUNCTION", "GROUP", "Propulsion driver arrangement"),
        node("411i", "ASSET FUNCTION", "COMPOSITION", "Propulsion driver, individual"),
        engine_leaf,
        node("C101", "PRODUCT", "TYPE", "Reciprocating internal combustion engine"),
        node("C101.3", "PRODUCT FUNCTION", "GROUP", "Engine structure"),
        node("C101.31", "PRODUCT FUNCTION", "LEAF", "Cylinder"),
        node("C101.6", "PRODUCT FUNCTION", "GROUP", "Engine systems"),
        node("C101.63", "PRODUCT FUNCTION", "LEAF", "Cooling system"),
        node("C101.64", "PRODUCT FUNCTION", "COMPOSITION", "Fuel system"),
        node("C101.65", "PRODUCT FUNCTION", "GROUP", "Lubrication"),
        node("S206", "PRODUCT", "TYPE", "Cooling unit"),
        node("S90", "PRODUCT", "TYPE", "Pump"),
        node("500a", "ASSET FUNCTION", "GROUP", "Power generation"),
        node("510", "ASSET FUNCTION", "GROUP", "Main power"),
        node("511", "ASSET FUNCTION", "GROUP", "Generating arrangement"),
        node("511.11", "ASSET FUNCTION", "LEAF", "Generator driver"),
        node("511.3", "ASSET FUNCTION", "GROUP", "Exhaust handling"),
        node("C221", "PRODUCT", "TYPE", "Silencer"),
        node("100a", "ASSET FUNCTION", "GROUP", "Hull"),
        node("110", "ASSET FUNCTION", "GROUP", "Hull structure"),
        node("111", "ASSET FUNCTION", "GROUP", "Hull plating"),
        node("111.3", "ASSET FUNCTION", "LEAF", "Hull openings"),
        node("H402", "PRODUCT", "TYPE", "Hatch"),
    ]
}

fn shared_relations() -> Vec<(&'static str, &'static str)> {
    vec![
        ("VE", "400a"),
        ("400a", "410"),
        ("410", "411"),
        ("411", "411i"),
        ("411i", "411.1"),
        ("411.1", "C101"),
        ("C101", "C101.3"),
        ("C101.3", "C101.31"),
        ("C101", "C101.6"),
        ("C101.6", "C101.63"),
        ("C101.63", "S206"),
        ("C101.6", "C101.64"),
        ("C101.64", "S90"),
        ("C101.6", "C101.65"),
        ("C101.65", "S90"),
        ("VE", "500a"),
        ("500a", "510"),
        ("510", "511"),
        ("511", "511.11"),
        ("511.11", "C101"),
        ("511", "511.3"),
        ("VE", "100a"),
        ("100a", "110"),
        ("110", "111"),
        ("111", "111.3"),
    ]
}

pub fn gmod_3_4a() -> GmodDto {
    let mut items = shared_nodes();
    items.extend([
        node("511.33", "ASSET FUNCTION", "GROUP", "Exhaust silencing"),
        node("511.331", "ASSET FUNCTION", "LEAF", "Exhaust silencer"),
        node("H401", "PRODUCT", "TYPE", "Manhole"),
        node("H404", "PRODUCT", "TYPE", "Scuttle"),
    ]);
    let mut pairs = shared_relations();
    pairs.extend([
        ("511.3", "511.33"),
        ("511.33", "511.331"),
        ("511.331", "C221"),
        ("111.3", "H401"),
        ("111.3", "H402"),
        ("111.3", "H404"),
    ]);
    serde_json::from_value(json!({
        "visRelease": "3-4a",
        "items": items,
        "relations": relations(&pairs),
    }))
    .unwrap()
}

pub fn gmod_3_5a() -> GmodDto {
    let mut items: Vec<Value> = shared_nodes()
        .into_iter()
        .filter(|item| item["code"] != "H402")
        .collect();
    items.extend([
        node("511.31", "ASSET FUNCTION", "LEAF", "Exhaust silencer"),
        node("C121", "PRODUCT", "TYPE", "Exhaust treatment unit"),
        node("C121.3", "PRODUCT FUNCTION", "GROUP", "Exhaust treatment parts"),
        node("C121.31", "PRODUCT FUNCTION", "LEAF", "Silencing"),
        node("H402A", "PRODUCT", "TYPE", "Hatch"),
        node("H403", "PRODUCT", "TYPE", "Bolted plate"),
        node("Z999", "PRODUCT", "TYPE", "Unattached product"),
    ]);
    let mut pairs = shared_relations();
    pairs.extend([
        ("511.3", "511.31"),
        ("511.31", "C121"),
        ("C121", "C121.3"),
        ("C121.3", "C121.31"),
        ("C121.31", "C221"),
        ("111.3", "H402A"),
        ("111.3", "H403"),
    ]);
    serde_json::from_value(json!({
        "visRelease": "3-5a",
        "items": items,
        "relations": relations(&pairs),
    }))
    .unwrap()
}

pub fn codebooks(release: &str) -> CodebooksDto {
    serde_json::from_value(json!({
        "visRelease": release,
        "items": [
            { "name": "quantities", "values": { "Thermal": ["temperature"], "Mechanical": ["pressure", "flow.rate"] } },
            { "name": "contents", "values": { "Gas": ["exhaust.gas"], "Liquid": ["refrigerant", "fresh.water"] } },
            { "name": "calculations", "values": { "Statistics": ["average", "maximum"] } },
            { "name": "states", "values": { "Operating": ["opened", "closed", "running"] } },
            { "name": "commands", "values": { "Control": ["start", "stop"] } },
            { "name": "types", "values": { "Signal": ["alarm", "setpoint"] } },
            { "name": "functional_services", "values": { "Service": ["heating"] } },
            { "name": "positions", "values": {
                "Side": ["port", "starboard", "centre"],
                "Vertical": ["upper", "lower"],
                "Flow": ["inlet", "outlet"],
                "<number>": ["<number>"],
                "DEFAULT_GROUP": ["inside", "outside"]
            } }
        ]
    }))
    .unwrap()
}

pub fn locations(release: &str) -> LocationsDto {
    let codes = [
        ('N', "Number"),
        ('P', "Port"),
        ('C', "Centre"),
        ('S', "Starboard"),
        ('U', "Upper"),
        ('M', "Middle"),
        ('L', "Lower"),
        ('I', "Inside"),
        ('O', "Outside"),
        ('F', "Forward"),
        ('A', "Aft"),
    ];
    let items: Vec<Value> = codes
        .iter()
        .map(|(code, name)| json!({ "code": code.to_string(), "name": name }))
        .collect();
    serde_json::from_value(json!({ "visRelease": release, "items": items })).unwrap()
}

pub fn versioning_dto() -> GmodVersioningDto {
    serde_json::from_value(json!({
        "items": {
            "3-4a": {
                "H402": { "nextVisVersion": "3-5a", "nextCode": "H402A" },
                "H401": { "nextVisVersion": "3-5a", "nextCode": "Z999" },
                "511.331": { "nextVisVersion": "3-5a", "nextCode": "511.31" },
                "511.33": { "nextVisVersion": "3-5a", "nextCode": "511.3" }
            },
            "3-5a": {
                "H402A": { "previousVisVersion": "3-4a", "previousCode": "H402" },
                "511.31": { "previousVisVersion": "3-4a", "previousCode": "511.331" }
            }
        }
    }))
    .unwrap()
}

/// Registry with 3-4a and 3-5a loaded and change tables between them.
pub fn vis() -> Vis {
    let mut vis = Vis::new();
    vis.register_dto(
        VisVersion::V3_4a,
        &gmod_3_4a(),
        &codebooks("3-4a"),
        &locations("3-4a"),
    )
    .unwrap();
    vis.register_dto(
        VisVersion::V3_5a,
        &gmod_3_5a(),
        &codebooks("3-5a"),
        &locations("3-5a"),
    )
    .unwrap();
    vis.set_versioning(GmodVersioning::from_dto(&versioning_dto()).unwrap());
    vis
}
