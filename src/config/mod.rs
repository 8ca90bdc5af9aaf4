//! Configuration module for Trawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Values missing from the file fall back to the documented defaults, and the
//! search endpoint and password can be overridden from the environment.
//!
//! # Example
//!
//! ```no_run
//! use trawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trawl.toml")).unwrap();
//! println!("Writing pages to index: {}", config.search.index_name);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, FrontierConfig, Readiness, SearchConfig};

// Re-export parser functions
pub use parser::{
    apply_overrides, load_config, parse_config, DEFAULT_USERNAME, ENDPOINT_ENV, PASSWORD_ENV,
};
pub use validation::validate;
