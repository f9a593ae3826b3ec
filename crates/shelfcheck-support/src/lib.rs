//! # shelfcheck-support
//!
//! Plumbing shared by the storefront and REST suites: YAML configs with
//! `${param}` substitution, and an evidence sink that collects the text and
//! screenshots each step produces.
//!
//! ```rust,no_run
//! use shelfcheck_support::{EvidenceSink, MemorySink};
//!
//! let sink = MemorySink::new();
//! sink.begin_test("search for Smart TV");
//! sink.attach_text("search term", "Smart TV").unwrap();
//! assert_eq!(sink.len(), 2);
//! ```

pub mod de;
pub mod evidence;
pub mod params;

pub use evidence::{DirectorySink, Evidence, EvidenceBody, EvidenceSink, MemorySink, NullSink};
pub use params::{load_yaml, parse_yaml, ParamDef, Params};

/// Result type for support operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading configs or recording evidence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
