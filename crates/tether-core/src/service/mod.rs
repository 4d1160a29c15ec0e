//! MCP service descriptors
//!
//! Schema types, structural validation, linting and command resolution.

pub mod lint;
pub mod resolve;
pub mod schema;
pub mod template;
pub mod validate;

pub use lint::{ConfigWarning, lint};
pub use resolve::{
    InputValues, ResolveError, ResolvedCommand, resolve_mode, resolve_service, select_mode,
};
pub use schema::{
    ArgumentFlag, CommandArgument, CommandTemplate, ConditionalArgument, ConfigInput, InputType,
    McpServiceConfig, RunnerType, ServiceMode, TransportType,
};
pub use validate::{
    FieldPath, PathSegment, SchemaError, SchemaViolation, ViolationKind, check_service,
    validate_str, validate_value,
};
