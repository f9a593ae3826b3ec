use crate::suite::Case;
use crate::{Error, Result};
use serde::Deserialize;
use shelfcheck_support::{ParamDef, Params};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Target API, credentials and suite selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub name: String,

    /// Parameter definitions (optional).
    pub params: HashMap<String, ParamDef>,

    pub base_url: String,
    pub users_endpoint: String,
    pub login_endpoint: String,

    pub api_key_header: String,
    pub api_key: String,

    /// Account used to fetch the bearer token before each case.
    pub auth: AuthConfig,

    /// Per-request timeout.
    #[serde(deserialize_with = "shelfcheck_support::de::from_str_or_value")]
    pub timeout_ms: u64,
    /// Pause before and after every case, to stay under rate limits.
    #[serde(deserialize_with = "shelfcheck_support::de::from_str_or_value")]
    pub throttle_ms: u64,

    /// Case names to run; empty runs them all.
    pub cases: Vec<String>,

    pub evidence: EvidenceConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            name: "reqres users and auth".into(),
            params: HashMap::new(),
            base_url: "https://reqres.in/api".into(),
            users_endpoint: "/users".into(),
            login_endpoint: "/login".into(),
            api_key_header: "X-API-KEY".into(),
            api_key: "QpwL5tke4Pnpja7X4".into(),
            auth: AuthConfig::default(),
            timeout_ms: 10_000,
            throttle_ms: 1000,
            cases: Vec::new(),
            evidence: EvidenceConfig::default(),
        }
    }
}

/// Login account.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub email: String,
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: "eve.holt@reqres.in".into(),
            password: "cityslicka".into(),
        }
    }
}

/// Where evidence is written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvidenceConfig {
    /// Output directory; evidence stays in memory when unset.
    pub dir: Option<String>,
}

impl ApiConfig {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_params(path, &Params::new())
    }

    /// Load config from a YAML file with parameters.
    pub fn load_with_params<P: AsRef<Path>>(path: P, params: &Params) -> Result<Self> {
        let config: ApiConfig = shelfcheck_support::load_yaml(path, params)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from YAML string (no params).
    pub fn parse(yaml: &str) -> Result<Self> {
        Self::parse_with_params(yaml, &Params::new())
    }

    /// Parse config from YAML string with parameter substitution.
    pub fn parse_with_params(yaml: &str, params: &Params) -> Result<Self> {
        let config: ApiConfig = shelfcheck_support::parse_yaml(yaml, params)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base_url is required".into()));
        }
        if self.api_key_header.is_empty() {
            return Err(Error::Config("api_key_header is required".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be at least 1".into()));
        }
        for name in &self.cases {
            if Case::from_name(name).is_none() {
                return Err(Error::Config(format!("unknown case: {}", name)));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Path of one user, e.g. `/users/2`.
    pub fn user_endpoint(&self, id: u64) -> String {
        format!("{}/{}", self.users_endpoint, id)
    }

    /// Cases selected by `cases`, in suite order.
    pub fn selected_cases(&self) -> Vec<Case> {
        Case::ALL
            .into_iter()
            .filter(|c| self.cases.is_empty() || self.cases.iter().any(|n| n == c.name()))
            .collect()
    }
}
