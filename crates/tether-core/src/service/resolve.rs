//! Command template resolution
//!
//! Turns a [`ServiceMode`] plus user-supplied input values into the concrete
//! command line and environment used to start the service process.
//!
//! ## Rules
//!
//! - An input's effective value is the supplied value, else its `defaultValue`.
//!   Empty strings count as unset.
//! - Required inputs without an effective value fail resolution.
//! - `${input_id}` placeholders are substituted in the command, literal
//!   arguments, conditional values and env values. Placeholders naming an
//!   input the mode does not declare are left verbatim.
//! - A conditional argument contributes its values only when its variable is
//!   set; otherwise it contributes nothing.
//! - A literal argument or env value made only of placeholders that resolve
//!   to nothing is dropped.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use super::schema::{CommandArgument, McpServiceConfig, RunnerType, ServiceMode, TransportType};
use super::template;

const REDACTED: &str = "********";

/// Input id -> supplied value
pub type InputValues = HashMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("service '{0}' has no launch modes")]
    NoModes(String),

    #[error("service '{service}' has no {transport} mode")]
    NoModeForTransport {
        service: String,
        transport: TransportType,
    },

    #[error("missing required input(s): {}", .0.join(", "))]
    MissingRequiredInputs(Vec<String>),
}

/// Concrete command produced from a mode template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub transport: TransportType,
    pub runner: RunnerType,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    /// Same template filled with `password` values masked
    masked: Masked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Masked {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl ResolvedCommand {
    /// Copy with values of `password` inputs masked, for display or logs.
    ///
    /// Masking happens where the template placed each value, so text that
    /// merely resembles a secret is left alone.
    pub fn redacted(&self) -> ResolvedCommand {
        ResolvedCommand {
            transport: self.transport,
            runner: self.runner,
            command: self.masked.command.clone(),
            args: self.masked.args.clone(),
            env: self.masked.env.clone(),
            masked: self.masked.clone(),
        }
    }

    /// Command line as a single display string
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Pick the mode to launch.
///
/// The first mode flagged `isDefault` wins, else the first declared mode.
/// With a transport constraint only modes of that transport are considered.
pub fn select_mode(
    config: &McpServiceConfig,
    transport: Option<TransportType>,
) -> Result<&ServiceMode, ResolveError> {
    if config.modes.is_empty() {
        return Err(ResolveError::NoModes(config.id.clone()));
    }

    let candidates: Vec<&ServiceMode> = config
        .modes
        .iter()
        .filter(|m| transport.is_none_or(|t| m.transport == t))
        .collect();

    let defaults: Vec<&ServiceMode> = candidates
        .iter()
        .copied()
        .filter(|m| m.is_default())
        .collect();
    if defaults.len() > 1 {
        warn!(
            service = %config.id,
            count = defaults.len(),
            "multiple modes are flagged as default; using the first"
        );
    }

    defaults
        .first()
        .or(candidates.first())
        .copied()
        .ok_or_else(|| ResolveError::NoModeForTransport {
            service: config.id.clone(),
            transport: transport.unwrap_or(TransportType::Stdio),
        })
}

/// Select a mode and resolve it in one step
pub fn resolve_service(
    config: &McpServiceConfig,
    transport: Option<TransportType>,
    values: &InputValues,
) -> Result<ResolvedCommand, ResolveError> {
    let mode = select_mode(config, transport)?;
    debug!(
        service = %config.id,
        transport = %mode.transport,
        runner = %mode.runner,
        "resolving service"
    );
    resolve_mode(mode, values)
}

/// Resolve a mode template against supplied input values
pub fn resolve_mode(
    mode: &ServiceMode,
    values: &InputValues,
) -> Result<ResolvedCommand, ResolveError> {
    let effective = effective_values(mode, values);

    let missing: Vec<String> = mode
        .inputs
        .iter()
        .filter(|i| i.required && !effective.contains_key(i.id.as_str()))
        .map(|i| i.id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ResolveError::MissingRequiredInputs(missing));
    }

    let fill = |text: &str| fill_template(mode, &effective, text, false);
    let mask = |text: &str| fill_template(mode, &effective, text, true);

    let template = &mode.command_template;
    let command = fill(template.command.as_str());
    let mut masked = Masked {
        command: mask(template.command.as_str()),
        ..Masked::default()
    };

    let mut args = Vec::new();
    for argument in &template.args {
        match argument {
            CommandArgument::Literal(text) => {
                if let Some(value) = fill_or_drop(text, &fill) {
                    args.push(value);
                    masked.args.push(mask(text.as_str()));
                }
            }
            CommandArgument::Conditional(conditional) => {
                if effective.contains_key(conditional.variable.as_str()) {
                    for value in &conditional.values {
                        args.push(fill(value.as_str()));
                        masked.args.push(mask(value.as_str()));
                    }
                } else {
                    debug!(variable = %conditional.variable, "skipping conditional argument");
                }
            }
        }
    }

    let mut env = HashMap::new();
    for (name, value) in template.env.iter().flatten() {
        if let Some(filled) = fill_or_drop(value, &fill) {
            env.insert(name.clone(), filled);
            masked.env.insert(name.clone(), mask(value.as_str()));
        }
    }

    Ok(ResolvedCommand {
        transport: mode.transport,
        runner: mode.runner,
        command,
        args,
        env,
        masked,
    })
}

/// Substitute declared inputs into `text`; with `redact`, sensitive inputs
/// that have a value render as the mask instead.
fn fill_template(
    mode: &ServiceMode,
    effective: &HashMap<&str, &str>,
    text: &str,
    redact: bool,
) -> String {
    template::substitute(text, |name| {
        let input = mode.input(name)?;
        let value = effective.get(name).copied().unwrap_or("");
        if redact && input.input_type.is_sensitive() && !value.is_empty() {
            Some(REDACTED)
        } else {
            Some(value)
        }
    })
}

/// Supplied value, else default; empty strings are unset
fn effective_values<'a>(
    mode: &'a ServiceMode,
    values: &'a InputValues,
) -> HashMap<&'a str, &'a str> {
    mode.inputs
        .iter()
        .filter_map(|input| {
            let supplied = values.get(&input.id).map(String::as_str);
            supplied
                .filter(|v| !v.is_empty())
                .or_else(|| input.default_value.as_deref().filter(|v| !v.is_empty()))
                .map(|v| (input.id.as_str(), v))
        })
        .collect()
}

fn fill_or_drop<F: Fn(&str) -> String>(text: &str, fill: &F) -> Option<String> {
    let value = fill(text);
    if value.is_empty() && template::has_placeholders(text) {
        None
    } else {
        Some(value)
    }
}
