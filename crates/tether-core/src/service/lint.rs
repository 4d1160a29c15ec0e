//! Non-fatal checks on structurally valid service descriptors

use std::collections::HashSet;
use std::fmt;

use super::schema::{CommandArgument, McpServiceConfig, ServiceMode};
use super::template;

/// Something suspicious in a descriptor that does not make it invalid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// More than one mode sets `isDefault: true`
    MultipleDefaultModes { modes: Vec<usize> },
    /// A conditional argument or placeholder names an input the mode lacks
    UnknownVariable { mode: usize, variable: String },
    DuplicateInputId { mode: usize, id: String },
    EmptyCommand { mode: usize },
    /// `version` is not a semantic version
    NonSemverVersion { version: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::MultipleDefaultModes { modes } => {
                let list: Vec<String> = modes.iter().map(|m| format!("modes[{}]", m)).collect();
                write!(
                    f,
                    "multiple modes are marked as default ({}); the first one is used",
                    list.join(", ")
                )
            }
            ConfigWarning::UnknownVariable { mode, variable } => write!(
                f,
                "modes[{}] references undeclared input '{}'",
                mode, variable
            ),
            ConfigWarning::DuplicateInputId { mode, id } => {
                write!(f, "modes[{}] declares input '{}' more than once", mode, id)
            }
            ConfigWarning::EmptyCommand { mode } => {
                write!(f, "modes[{}].commandTemplate.command is empty", mode)
            }
            ConfigWarning::NonSemverVersion { version } => {
                write!(f, "version '{}' is not a semantic version", version)
            }
        }
    }
}

/// Collect warnings for a descriptor
pub fn lint(config: &McpServiceConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if semver::Version::parse(&config.version).is_err() {
        warnings.push(ConfigWarning::NonSemverVersion {
            version: config.version.clone(),
        });
    }

    let defaults: Vec<usize> = config.default_modes().map(|(i, _)| i).collect();
    if defaults.len() > 1 {
        warnings.push(ConfigWarning::MultipleDefaultModes { modes: defaults });
    }

    for (index, mode) in config.modes.iter().enumerate() {
        lint_mode(index, mode, &mut warnings);
    }

    warnings
}

fn lint_mode(index: usize, mode: &ServiceMode, warnings: &mut Vec<ConfigWarning>) {
    let mut seen = HashSet::new();
    for input in &mode.inputs {
        if !seen.insert(input.id.as_str()) {
            warnings.push(ConfigWarning::DuplicateInputId {
                mode: index,
                id: input.id.clone(),
            });
        }
    }

    let template = &mode.command_template;
    if template.command.trim().is_empty() {
        warnings.push(ConfigWarning::EmptyCommand { mode: index });
    }

    let mut referenced: Vec<&str> = template::placeholders(&template.command);
    for argument in &template.args {
        match argument {
            CommandArgument::Literal(text) => referenced.extend(template::placeholders(text)),
            CommandArgument::Conditional(conditional) => {
                referenced.push(&conditional.variable);
                for value in &conditional.values {
                    referenced.extend(template::placeholders(value));
                }
            }
        }
    }
    for value in template.env.iter().flat_map(|env| env.values()) {
        referenced.extend(template::placeholders(value));
    }

    let mut reported = HashSet::new();
    for variable in referenced {
        if !seen.contains(variable) && reported.insert(variable) {
            warnings.push(ConfigWarning::UnknownVariable {
                mode: index,
                variable: variable.to_string(),
            });
        }
    }
}
