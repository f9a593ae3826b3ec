pub mod schema;
pub mod selectors;

pub use schema::{
    BrowserConfig, EvidenceConfig, OnFailure, SiteConfig, TimingConfig, Viewport, WebConfig,
};
pub use selectors::Selectors;
pub use shelfcheck_support::{ParamDef, Params};
