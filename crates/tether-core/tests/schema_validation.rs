use serde_json::{Value, json};
use tether_core::service::{
    CommandArgument, McpServiceConfig, SchemaError, ViolationKind, check_service, validate_str,
    validate_value,
};

fn minimal() -> Value {
    json!({
        "id": "svc1",
        "name": "Demo",
        "description": "d",
        "author": "a",
        "icon": "i",
        "version": "1.0",
        "modes": []
    })
}

fn with_mode(mode: Value) -> Value {
    let mut value = minimal();
    value["modes"] = json!([mode]);
    value
}

fn stdio_mode(args: Value) -> Value {
    json!({
        "type": "stdio",
        "runner": "npx",
        "inputs": [
            { "id": "token", "label": "Token", "type": "password", "required": false }
        ],
        "commandTemplate": { "command": "npx", "args": args }
    })
}

fn violation_kind<'a>(err: &'a SchemaError, path: &str) -> &'a ViolationKind {
    &err
        .violations()
        .iter()
        .find(|v| v.path.to_string() == path)
        .unwrap_or_else(|| panic!("no violation at {}: {}", path, err))
        .kind
}

#[test]
fn empty_modes_are_valid() {
    let config = validate_value(&minimal()).unwrap();
    assert_eq!(config.id, "svc1");
    assert!(config.modes.is_empty());
}

#[test]
fn missing_modes_is_reported() {
    let mut value = minimal();
    value.as_object_mut().unwrap().remove("modes");

    let err = validate_value(&value).unwrap_err();
    assert_eq!(violation_kind(&err, "modes"), &ViolationKind::MissingField);
}

#[test]
fn every_required_top_level_field_is_reported() {
    for field in ["id", "name", "description", "author", "icon", "version", "modes"] {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove(field);
        let err = validate_value(&value).unwrap_err();
        assert!(err.has_violation_at(field), "{} not reported: {}", field, err);
    }
}

#[test]
fn unknown_transport_is_rejected() {
    let mut mode = stdio_mode(json!([]));
    mode["type"] = json!("http");

    let err = validate_value(&with_mode(mode)).unwrap_err();
    assert!(matches!(
        violation_kind(&err, "modes[0].type"),
        ViolationKind::InvalidVariant { found, .. } if found == "http"
    ));
}

#[test]
fn unknown_runner_and_input_type_are_rejected() {
    let mut mode = stdio_mode(json!([]));
    mode["runner"] = json!("cargo");
    mode["inputs"][0]["type"] = json!("number");

    let err = validate_value(&with_mode(mode)).unwrap_err();
    assert!(err.has_violation_at("modes[0].runner"));
    assert!(err.has_violation_at("modes[0].inputs[0].type"));
    assert_eq!(err.violations().len(), 2);
}

#[test]
fn conditional_without_values_is_rejected() {
    let mode = stdio_mode(json!(["-y", { "flag": "if_set", "variable": "token" }]));

    let err = validate_value(&with_mode(mode)).unwrap_err();
    assert_eq!(
        violation_kind(&err, "modes[0].commandTemplate.args[1].values"),
        &ViolationKind::MissingField
    );
}

#[test]
fn conditional_with_extra_key_is_rejected() {
    let mode = stdio_mode(json!([
        { "flag": "if_set", "variable": "token", "values": ["--token"], "when": "always" }
    ]));

    let err = validate_value(&with_mode(mode)).unwrap_err();
    assert_eq!(
        violation_kind(&err, "modes[0].commandTemplate.args[0].when"),
        &ViolationKind::UnexpectedField
    );
}

#[test]
fn conditional_with_unknown_flag_is_rejected() {
    let mode = stdio_mode(json!([
        { "flag": "if_unset", "variable": "token", "values": [] }
    ]));

    let err = validate_value(&with_mode(mode)).unwrap_err();
    assert!(err.has_violation_at("modes[0].commandTemplate.args[0].flag"));
}

#[test]
fn non_string_argument_is_rejected() {
    let mode = stdio_mode(json!(["--port", 8080]));

    let err = validate_value(&with_mode(mode)).unwrap_err();
    assert!(err.has_violation_at("modes[0].commandTemplate.args[1]"));
}

#[test]
fn plain_string_argument_is_valid() {
    let config = validate_value(&with_mode(stdio_mode(json!(["--verbose"])))).unwrap();
    assert_eq!(
        config.modes[0].command_template.args,
        vec![CommandArgument::literal("--verbose")]
    );
}

#[test]
fn optional_fields_may_be_absent_or_null() {
    let mut mode = stdio_mode(json!([]));
    mode["isDefault"] = Value::Null;
    mode["inputs"][0]["description"] = Value::Null;

    let config = validate_value(&with_mode(mode)).unwrap();
    let mode = &config.modes[0];
    assert_eq!(mode.is_default, None);
    assert_eq!(mode.prerequisites, None);
    assert_eq!(mode.inputs[0].description, None);
}

#[test]
fn wrong_kinds_are_reported_with_paths() {
    let mut mode = stdio_mode(json!([]));
    mode["inputs"][0]["required"] = json!("yes");
    mode["commandTemplate"]["env"] = json!({ "TOKEN": 1 });

    let violations = check_service(&with_mode(mode));
    let paths: Vec<String> = violations.iter().map(|v| v.path.to_string()).collect();
    assert_eq!(
        paths,
        vec![
            "modes[0].inputs[0].required",
            "modes[0].commandTemplate.env.TOKEN"
        ]
    );
}

#[test]
fn top_level_must_be_an_object() {
    let violations = check_service(&json!([1, 2]));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path.to_string(), "(root)");
}

#[test]
fn malformed_json_is_not_a_violation() {
    let err = validate_str("{ not json").unwrap_err();
    assert!(matches!(err, SchemaError::Malformed(_)));
    assert!(err.violations().is_empty());
}

#[test]
fn serialized_config_validates_again() {
    let value = with_mode(stdio_mode(json!([
        "-y",
        "@example/server",
        { "flag": "if_set", "variable": "token", "values": ["--token", "${token}"] }
    ])));
    let config = validate_value(&value).unwrap();

    let serialized = serde_json::to_string(&config).unwrap();
    let reparsed: McpServiceConfig = validate_str(&serialized).unwrap();
    assert_eq!(reparsed, config);
}
