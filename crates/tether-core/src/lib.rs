//! Tether Core Library
//!
//! Declarative descriptors for MCP services: schema types with structural
//! validation, command resolution from user inputs, a file-backed service
//! catalog and merged public server listings.

pub mod catalog;
pub mod listing;
pub mod service;

/// Re-exports of commonly used types
pub mod prelude {
    // Service descriptors
    pub use crate::service::{
        CommandArgument, CommandTemplate, ConditionalArgument, ConfigInput, InputType,
        McpServiceConfig, RunnerType, ServiceMode, TransportType,
    };

    // Validation
    pub use crate::service::{SchemaError, check_service, validate_str, validate_value};

    // Resolution
    pub use crate::service::{InputValues, ResolveError, ResolvedCommand, resolve_service};

    // Catalog
    pub use crate::catalog::{CatalogError, CatalogStore, ServiceCatalog};

    // Listings
    pub use crate::listing::{ListingCollector, MergedServer, ServerListing, build_top_servers};
}
