//! Configuration module for FeedScout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use feedscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("feedscout.toml")).unwrap();
//! println!("Crawling with {} page workers", config.crawler.page_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

pub use validation::validate;
