//! Structural validation of untyped service descriptors
//!
//! Walks a `serde_json::Value` against the descriptor shape and collects every
//! violation with the path of the offending field (for example
//! `modes[1].commandTemplate.args[2].flag`), then hands the value to serde.
//! Keys not named by the schema are ignored, except on conditional arguments
//! which must carry exactly `flag`, `variable` and `values`.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::{ArgumentFlag, InputType, McpServiceConfig, RunnerType, TransportType};

/// A single step in a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a field inside a descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Name of the last key in the path, if any
    pub fn field(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    pub fn key(mut self, key: &str) -> Self {
        self.0.push(PathSegment::Key(key.to_string()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => write!(f, "{}", k)?,
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

/// What is wrong at a given path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    MissingField,
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
    InvalidVariant {
        found: String,
        allowed: &'static [&'static str],
    },
    UnexpectedField,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::MissingField => f.write_str("missing required field"),
            ViolationKind::WrongKind { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ViolationKind::InvalidVariant { found, allowed } => write!(
                f,
                "invalid value '{}' (expected one of: {})",
                found,
                allowed.join(", ")
            ),
            ViolationKind::UnexpectedField => f.write_str("unexpected field"),
        }
    }
}

/// A descriptor value that does not conform to the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: FieldPath,
    pub kind: ViolationKind,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// All violations found in one descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationList(pub Vec<SchemaViolation>);

impl fmt::Display for ViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    /// Text could not be parsed, or serde rejected a structurally valid value
    #[error("malformed service descriptor: {0}")]
    Malformed(String),

    #[error("service descriptor does not match schema: {0}")]
    Violations(ViolationList),
}

impl SchemaError {
    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            SchemaError::Violations(list) => &list.0,
            SchemaError::Malformed(_) => &[],
        }
    }

    /// Whether any violation points at the given rendered path
    pub fn has_violation_at(&self, path: &str) -> bool {
        self.violations().iter().any(|v| v.path.to_string() == path)
    }
}

/// Validate a descriptor and convert it into the typed model
pub fn validate_value(value: &Value) -> Result<McpServiceConfig, SchemaError> {
    validate_value_at(value, FieldPath::root())
}

/// Same as [`validate_value`], reporting paths below `base`
pub fn validate_value_at(value: &Value, base: FieldPath) -> Result<McpServiceConfig, SchemaError> {
    let violations = check_service_at(value, base);
    if !violations.is_empty() {
        return Err(SchemaError::Violations(ViolationList(violations)));
    }
    serde_json::from_value(value.clone()).map_err(|e| SchemaError::Malformed(e.to_string()))
}

/// Parse JSON text and validate it
pub fn validate_str(json: &str) -> Result<McpServiceConfig, SchemaError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    validate_value(&value)
}

/// Collect every violation without converting
pub fn check_service(value: &Value) -> Vec<SchemaViolation> {
    check_service_at(value, FieldPath::root())
}

fn check_service_at(value: &Value, base: FieldPath) -> Vec<SchemaViolation> {
    let mut walker = Walker {
        path: base,
        violations: Vec::new(),
    };
    walker.service(value);
    walker.violations
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const CONDITIONAL_KEYS: &[&str] = &["flag", "variable", "values"];

struct Walker {
    path: FieldPath,
    violations: Vec<SchemaViolation>,
}

impl Walker {
    fn report(&mut self, kind: ViolationKind) {
        self.violations.push(SchemaViolation {
            path: self.path.clone(),
            kind,
        });
    }

    fn wrong_kind(&mut self, expected: &'static str, value: &Value) {
        self.report(ViolationKind::WrongKind {
            expected,
            found: kind_name(value),
        });
    }

    fn at<F: FnOnce(&mut Self)>(&mut self, segment: PathSegment, f: F) {
        self.path.push(segment);
        f(self);
        self.path.pop();
    }

    fn at_key<F: FnOnce(&mut Self)>(&mut self, key: &str, f: F) {
        self.at(PathSegment::Key(key.to_string()), f);
    }

    fn object<'v>(&mut self, value: &'v Value) -> Option<&'v Map<String, Value>> {
        let map = value.as_object();
        if map.is_none() {
            self.wrong_kind("object", value);
        }
        map
    }

    fn required<'v>(&mut self, map: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
        let value = map.get(key);
        if value.is_none() {
            self.at_key(key, |w| w.report(ViolationKind::MissingField));
        }
        value
    }

    fn required_string(&mut self, map: &Map<String, Value>, key: &str) {
        if let Some(value) = self.required(map, key)
            && !value.is_string()
        {
            self.at_key(key, |w| w.wrong_kind("string", value));
        }
    }

    fn optional_string(&mut self, map: &Map<String, Value>, key: &str) {
        if let Some(value) = optional(map, key)
            && !value.is_string()
        {
            self.at_key(key, |w| w.wrong_kind("string", value));
        }
    }

    fn variant(&mut self, map: &Map<String, Value>, key: &str, allowed: &'static [&'static str]) {
        let Some(value) = self.required(map, key) else {
            return;
        };
        self.at_key(key, |w| match value.as_str() {
            Some(s) if allowed.contains(&s) => {}
            Some(s) => w.report(ViolationKind::InvalidVariant {
                found: s.to_string(),
                allowed,
            }),
            None => w.wrong_kind("string", value),
        });
    }

    fn string_array(&mut self, value: &Value) {
        let Some(items) = value.as_array() else {
            self.wrong_kind("array", value);
            return;
        };
        for (i, item) in items.iter().enumerate() {
            if !item.is_string() {
                self.at(PathSegment::Index(i), |w| w.wrong_kind("string", item));
            }
        }
    }

    fn array_of<F: FnMut(&mut Self, &Value)>(&mut self, value: &Value, mut each: F) {
        let Some(items) = value.as_array() else {
            self.wrong_kind("array", value);
            return;
        };
        for (i, item) in items.iter().enumerate() {
            self.at(PathSegment::Index(i), |w| each(w, item));
        }
    }

    fn service(&mut self, value: &Value) {
        let Some(map) = self.object(value) else {
            return;
        };
        for key in ["id", "name", "description", "author", "icon", "version"] {
            self.required_string(map, key);
        }
        if let Some(modes) = self.required(map, "modes") {
            self.at_key("modes", |w| w.array_of(modes, Self::mode));
        }
    }

    fn mode(&mut self, value: &Value) {
        let Some(map) = self.object(value) else {
            return;
        };
        self.variant(map, "type", TransportType::VARIANTS);
        self.variant(map, "runner", RunnerType::VARIANTS);

        if let Some(flag) = optional(map, "isDefault")
            && !flag.is_boolean()
        {
            self.at_key("isDefault", |w| w.wrong_kind("boolean", flag));
        }
        if let Some(prerequisites) = optional(map, "prerequisites") {
            self.at_key("prerequisites", |w| w.string_array(prerequisites));
        }
        if let Some(inputs) = self.required(map, "inputs") {
            self.at_key("inputs", |w| w.array_of(inputs, Self::input));
        }
        if let Some(template) = self.required(map, "commandTemplate") {
            self.at_key("commandTemplate", |w| w.command_template(template));
        }
    }

    fn input(&mut self, value: &Value) {
        let Some(map) = self.object(value) else {
            return;
        };
        self.required_string(map, "id");
        self.required_string(map, "label");
        self.variant(map, "type", InputType::VARIANTS);
        for key in ["description", "placeholder", "defaultValue"] {
            self.optional_string(map, key);
        }
        if let Some(required) = self.required(map, "required")
            && !required.is_boolean()
        {
            self.at_key("required", |w| w.wrong_kind("boolean", required));
        }
    }

    fn command_template(&mut self, value: &Value) {
        let Some(map) = self.object(value) else {
            return;
        };
        self.required_string(map, "command");
        if let Some(args) = self.required(map, "args") {
            self.at_key("args", |w| w.array_of(args, Self::argument));
        }
        if let Some(env) = optional(map, "env") {
            self.at_key("env", |w| {
                let Some(vars) = w.object(env) else {
                    return;
                };
                for (name, template) in vars {
                    if !template.is_string() {
                        w.at_key(name, |w| w.wrong_kind("string", template));
                    }
                }
            });
        }
    }

    fn argument(&mut self, value: &Value) {
        match value {
            Value::String(_) => {}
            Value::Object(map) => {
                for key in map.keys() {
                    if !CONDITIONAL_KEYS.contains(&key.as_str()) {
                        self.at_key(key, |w| w.report(ViolationKind::UnexpectedField));
                    }
                }
                self.variant(map, "flag", ArgumentFlag::VARIANTS);
                self.required_string(map, "variable");
                if let Some(values) = self.required(map, "values") {
                    self.at_key("values", |w| w.string_array(values));
                }
            }
            other => self.wrong_kind("string or conditional argument", other),
        }
    }
}

/// Optional fields treat an explicit `null` as absent
fn optional<'v>(map: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    map.get(key).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_service() -> Value {
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

    fn full_service() -> Value {
        json!({
            "id": "github",
            "name": "GitHub",
            "description": "GitHub API access",
            "author": "example",
            "icon": "github.svg",
            "version": "0.6.2",
            "modes": [
                {
                    "type": "stdio",
                    "runner": "npx",
                    "isDefault": true,
                    "prerequisites": ["node"],
                    "inputs": [
                        {
                            "id": "token",
                            "label": "Personal access token",
                            "type": "password",
                            "required": true
                        },
                        {
                            "id": "toolsets",
                            "label": "Toolsets",
                            "type": "select",
                            "defaultValue": "repos",
                            "required": false
                        }
                    ],
                    "commandTemplate": {
                        "command": "npx",
                        "args": [
                            "-y",
                            "@modelcontextprotocol/server-github",
                            {"flag": "if_set", "variable": "toolsets", "values": ["--toolsets", "${toolsets}"]}
                        ],
                        "env": {"GITHUB_PERSONAL_ACCESS_TOKEN": "${token}"}
                    }
                },
                {
                    "type": "sse",
                    "runner": "docker",
                    "inputs": [],
                    "commandTemplate": {
                        "command": "docker",
                        "args": ["run", "-i", "--rm", "ghcr.io/github/github-mcp-server"]
                    }
                }
            ]
        })
    }

    // =========================================================================
    // Acceptance
    // =========================================================================

    #[test]
    fn test_empty_modes_is_valid() {
        let config = validate_value(&minimal_service()).unwrap();
        assert_eq!(config.id, "svc1");
        assert!(config.modes.is_empty());
    }

    #[test]
    fn test_full_service_is_valid() {
        let config = validate_value(&full_service()).unwrap();
        assert_eq!(config.modes.len(), 2);
        assert_eq!(config.modes[0].transport, TransportType::Stdio);
        assert_eq!(config.modes[1].runner, RunnerType::Docker);
        assert_eq!(config.modes[0].inputs[1].default_value.as_deref(), Some("repos"));
    }

    #[test]
    fn test_null_optionals_are_absent() {
        let mut value = full_service();
        value["modes"][0]["isDefault"] = Value::Null;
        value["modes"][0]["commandTemplate"]["env"] = Value::Null;
        value["modes"][0]["inputs"][0]["placeholder"] = Value::Null;

        let config = validate_value(&value).unwrap();
        assert_eq!(config.modes[0].is_default, None);
        assert_eq!(config.modes[0].command_template.env, None);
    }

    #[test]
    fn test_unknown_keys_on_records_are_ignored() {
        let mut value = minimal_service();
        value["homepage"] = json!("https://example.com");
        assert!(validate_value(&value).is_ok());
    }

    // =========================================================================
    // Missing required fields
    // =========================================================================

    #[test]
    fn test_each_missing_top_level_field_is_reported() {
        for field in ["id", "name", "description", "author", "icon", "version", "modes"] {
            let mut value = minimal_service();
            value.as_object_mut().unwrap().remove(field);

            let err = validate_value(&value).unwrap_err();
            let violations = err.violations();
            assert_eq!(violations.len(), 1, "field {}", field);
            assert_eq!(violations[0].kind, ViolationKind::MissingField);
            assert_eq!(violations[0].path.to_string(), field);
        }
    }

    #[test]
    fn test_each_missing_mode_field_is_reported() {
        for field in ["type", "runner", "inputs", "commandTemplate"] {
            let mut value = full_service();
            value["modes"][1].as_object_mut().unwrap().remove(field);

            let err = validate_value(&value).unwrap_err();
            assert!(
                err.has_violation_at(&format!("modes[1].{}", field)),
                "{}",
                err
            );
        }
    }

    #[test]
    fn test_each_missing_input_field_is_reported() {
        for field in ["id", "label", "type", "required"] {
            let mut value = full_service();
            value["modes"][0]["inputs"][0]
                .as_object_mut()
                .unwrap()
                .remove(field);

            let err = validate_value(&value).unwrap_err();
            assert!(err.has_violation_at(&format!("modes[0].inputs[0].{}", field)));
        }
    }

    #[test]
    fn test_conditional_argument_missing_values() {
        let mut value = full_service();
        value["modes"][0]["commandTemplate"]["args"][2] =
            json!({"flag": "if_set", "variable": "token"});

        let err = validate_value(&value).unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].path.to_string(),
            "modes[0].commandTemplate.args[2].values"
        );
        assert_eq!(violations[0].kind, ViolationKind::MissingField);
        assert_eq!(violations[0].path.field(), Some("values"));
    }

    // =========================================================================
    // Variant tags
    // =========================================================================

    #[test]
    fn test_unknown_transport_is_rejected() {
        let mut value = full_service();
        value["modes"][0]["type"] = json!("http");

        let err = validate_value(&value).unwrap_err();
        let violations = err.violations();
        assert_eq!(violations[0].path.to_string(), "modes[0].type");
        assert!(matches!(
            &violations[0].kind,
            ViolationKind::InvalidVariant { found, .. } if found == "http"
        ));
    }

    #[test]
    fn test_unknown_runner_is_rejected() {
        let mut value = full_service();
        value["modes"][1]["runner"] = json!("bun");
        let err = validate_value(&value).unwrap_err();
        assert!(err.has_violation_at("modes[1].runner"));
    }

    #[test]
    fn test_unknown_input_type_is_rejected() {
        let mut value = full_service();
        value["modes"][0]["inputs"][1]["type"] = json!("number");
        let err = validate_value(&value).unwrap_err();
        assert!(err.has_violation_at("modes[0].inputs[1].type"));
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let mut value = full_service();
        value["modes"][0]["commandTemplate"]["args"][2]["flag"] = json!("if_unset");
        let err = validate_value(&value).unwrap_err();
        assert!(err.has_violation_at("modes[0].commandTemplate.args[2].flag"));
    }

    #[test]
    fn test_variant_tags_are_case_sensitive() {
        let mut value = full_service();
        value["modes"][0]["type"] = json!("STDIO");
        assert!(validate_value(&value).is_err());
    }

    // =========================================================================
    // Argument shapes
    // =========================================================================

    #[test]
    fn test_plain_string_argument_is_valid() {
        let mut value = full_service();
        value["modes"][1]["commandTemplate"]["args"] = json!(["--verbose"]);
        assert!(validate_value(&value).is_ok());
    }

    #[test]
    fn test_conditional_argument_with_extra_key_is_rejected() {
        let mut value = full_service();
        value["modes"][0]["commandTemplate"]["args"][2]["default"] = json!("x");

        let err = validate_value(&value).unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnexpectedField);
        assert_eq!(
            violations[0].path.to_string(),
            "modes[0].commandTemplate.args[2].default"
        );
    }

    #[test]
    fn test_non_string_non_object_argument_is_rejected() {
        for bad in [json!(42), json!(true), json!(["nested"]), Value::Null] {
            let mut value = full_service();
            value["modes"][1]["commandTemplate"]["args"][0] = bad;
            let err = validate_value(&value).unwrap_err();
            assert!(err.has_violation_at("modes[1].commandTemplate.args[0]"));
        }
    }

    #[test]
    fn test_conditional_values_must_be_strings() {
        let mut value = full_service();
        value["modes"][0]["commandTemplate"]["args"][2]["values"] = json!(["--toolsets", 3]);
        let err = validate_value(&value).unwrap_err();
        assert!(err.has_violation_at("modes[0].commandTemplate.args[2].values[1]"));
    }

    // =========================================================================
    // Kinds and reporting
    // =========================================================================

    #[test]
    fn test_wrong_kinds_are_reported() {
        let mut value = full_service();
        value["version"] = json!(1);
        value["modes"][0]["isDefault"] = json!("yes");
        value["modes"][0]["inputs"][0]["required"] = json!("true");
        value["modes"][0]["commandTemplate"]["env"]["GITHUB_PERSONAL_ACCESS_TOKEN"] = json!(5);

        let err = validate_value(&value).unwrap_err();
        assert_eq!(err.violations().len(), 4);
        assert!(err.has_violation_at("version"));
        assert!(err.has_violation_at("modes[0].isDefault"));
        assert!(err.has_violation_at("modes[0].inputs[0].required"));
        assert!(err.has_violation_at(
            "modes[0].commandTemplate.env.GITHUB_PERSONAL_ACCESS_TOKEN"
        ));
    }

    #[test]
    fn test_non_object_root() {
        let err = validate_value(&json!([1, 2])).unwrap_err();
        assert_eq!(err.violations()[0].path.to_string(), "(root)");
        assert_eq!(
            err.violations()[0].kind,
            ViolationKind::WrongKind {
                expected: "object",
                found: "array"
            }
        );
    }

    #[test]
    fn test_error_message_lists_paths() {
        let mut value = minimal_service();
        value.as_object_mut().unwrap().remove("modes");
        let message = validate_value(&value).unwrap_err().to_string();
        assert!(message.contains("modes: missing required field"));
    }

    #[test]
    fn test_base_path_prefixes_violations() {
        let mut value = minimal_service();
        value.as_object_mut().unwrap().remove("icon");
        let err = validate_value_at(&value, FieldPath::root().key("service").index(3)).unwrap_err();
        assert!(err.has_violation_at("service[3].icon"));
    }

    #[test]
    fn test_validate_str_reports_malformed_json() {
        let err = validate_str("{ not json").unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));
        assert!(err.violations().is_empty());
    }

    #[test]
    fn test_serialized_config_revalidates() {
        let config = validate_value(&full_service()).unwrap();
        let serialized = serde_json::to_value(&config).unwrap();
        let again = validate_value(&serialized).unwrap();
        assert_eq!(config, again);
    }
}
