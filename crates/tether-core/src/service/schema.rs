//! MCP service descriptor schema
//!
//! The on-disk contract for a launchable service: metadata, the modes it can
//! be started in, the inputs each mode needs and the templated command line.
//! Field names serialize verbatim (`isDefault`, `commandTemplate`, ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One installable/launchable service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServiceConfig {
    /// Stable lookup key (uniqueness is enforced by the catalog)
    pub id: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub icon: String,
    pub version: String,
    /// Alternative ways to launch this service, in declaration order
    pub modes: Vec<ServiceMode>,
}

impl McpServiceConfig {
    /// Modes flagged with `isDefault: true`, in declaration order
    pub fn default_modes(&self) -> impl Iterator<Item = (usize, &ServiceMode)> {
        self.modes.iter().enumerate().filter(|(_, m)| m.is_default())
    }

    /// First mode using the given transport
    pub fn mode_for(&self, transport: TransportType) -> Option<&ServiceMode> {
        self.modes.iter().find(|m| m.transport == transport)
    }
}

/// One complete launch strategy for a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMode {
    #[serde(rename = "type")]
    pub transport: TransportType,

    pub runner: RunnerType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,

    /// Tools that must be present before launch (checked externally)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,

    pub inputs: Vec<ConfigInput>,

    pub command_template: CommandTemplate,
}

impl ServiceMode {
    /// Whether this mode is explicitly flagged as the preferred one
    pub fn is_default(&self) -> bool {
        self.is_default.unwrap_or(false)
    }

    /// Look up an input declared by this mode
    pub fn input(&self, id: &str) -> Option<&ConfigInput> {
        self.inputs.iter().find(|i| i.id == id)
    }
}

/// Templated invocation of a service process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub command: String,

    pub args: Vec<CommandArgument>,

    /// Environment variable name -> value template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

/// One element of a templated argument list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArgument {
    /// Passed through (after placeholder substitution)
    Literal(String),
    /// Included only when the referenced input has a value
    Conditional(ConditionalArgument),
}

impl CommandArgument {
    pub fn literal(value: impl Into<String>) -> Self {
        CommandArgument::Literal(value.into())
    }

    pub fn if_set(variable: impl Into<String>, values: Vec<String>) -> Self {
        CommandArgument::Conditional(ConditionalArgument {
            flag: ArgumentFlag::IfSet,
            variable: variable.into(),
            values,
        })
    }
}

impl From<&str> for CommandArgument {
    fn from(value: &str) -> Self {
        CommandArgument::Literal(value.to_string())
    }
}

/// `{flag: "if_set", variable, values}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionalArgument {
    pub flag: ArgumentFlag,
    /// Id of the `ConfigInput` this argument depends on
    pub variable: String,
    pub values: Vec<String>,
}

/// Condition attached to a conditional argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentFlag {
    IfSet,
}

impl ArgumentFlag {
    pub const VARIANTS: &'static [&'static str] = &["if_set"];
}

/// One user-supplied parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInput {
    pub id: String,

    pub label: String,

    #[serde(rename = "type")]
    pub input_type: InputType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    pub required: bool,
}

/// Transport used to talk to the launched process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// Standard input/output streams
    Stdio,
    /// Server-sent events over HTTP
    Sse,
}

impl TransportType {
    pub const VARIANTS: &'static [&'static str] = &["stdio", "sse"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Stdio => "stdio",
            TransportType::Sse => "sse",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransportType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "stdio" => Ok(TransportType::Stdio),
            "sse" => Ok(TransportType::Sse),
            _ => anyhow::bail!("Invalid transport: '{}'. Valid values: stdio, sse", value),
        }
    }
}

/// Launch mechanism class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerType {
    /// Package runner (npx)
    Npx,
    /// Container engine
    Docker,
    /// Interpreter
    Python,
    /// Pre-compiled executable
    Binary,
}

impl RunnerType {
    pub const VARIANTS: &'static [&'static str] = &["npx", "docker", "python", "binary"];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerType::Npx => "npx",
            RunnerType::Docker => "docker",
            RunnerType::Python => "python",
            RunnerType::Binary => "binary",
        }
    }
}

impl fmt::Display for RunnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RunnerType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "npx" => Ok(RunnerType::Npx),
            "docker" => Ok(RunnerType::Docker),
            "python" => Ok(RunnerType::Python),
            "binary" => Ok(RunnerType::Binary),
            _ => anyhow::bail!(
                "Invalid runner: '{}'. Valid values: npx, docker, python, binary",
                value
            ),
        }
    }
}

/// How an input value is collected and displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    /// Masked on entry and in any rendered output
    Password,
    Path,
    Select,
}

impl InputType {
    pub const VARIANTS: &'static [&'static str] = &["text", "password", "path", "select"];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Password => "password",
            InputType::Path => "path",
            InputType::Select => "select",
        }
    }

    pub fn is_sensitive(&self) -> bool {
        matches!(self, InputType::Password)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for InputType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "text" => Ok(InputType::Text),
            "password" => Ok(InputType::Password),
            "path" => Ok(InputType::Path),
            "select" => Ok(InputType::Select),
            _ => anyhow::bail!(
                "Invalid input type: '{}'. Valid values: text, password, path, select",
                value
            ),
        }
    }
}
