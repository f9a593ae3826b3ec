use crate::{Error, Result};
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Runtime parameters passed to a config.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    /// Create empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse from CLI args like "key=value".
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut params = Self::new();
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid param '{}', expected key=value", arg))
            })?;
            params.values.insert(key.trim().to_string(), value.to_string());
        }
        Ok(params)
    }
}

/// Parameter definition in config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamDef {
    /// Whether this parameter is required.
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided.
    pub default: Option<String>,

    /// Description for documentation.
    pub description: Option<String>,
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_.-]+)\}").expect("placeholder regex"))
}

fn resolve(name: &str, params: &Params, defs: &HashMap<String, ParamDef>) -> Result<Option<String>> {
    if let Some(v) = params.get(name) {
        return Ok(Some(v.to_string()));
    }
    let Some(def) = defs.get(name) else {
        // Unknown names stay in place so later layers can expand them.
        return Ok(None);
    };
    match (&def.default, def.required) {
        (Some(default), _) => Ok(Some(default.clone())),
        (None, true) => Err(Error::Config(format!(
            "missing required parameter: {}",
            name
        ))),
        (None, false) => Ok(Some(String::new())),
    }
}

/// Substitute `${var}` patterns in a string.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    let mut failure = None;
    let out = placeholder().replace_all(template, |caps: &Captures| {
        match resolve(&caps[1], params, defs) {
            Ok(Some(v)) => v,
            Ok(None) => caps[0].to_string(),
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(out.into_owned()),
    }
}

/// Recursively substitute params in a YAML value.
///
/// Substituted strings stay strings; numeric fields read them through
/// [`crate::de::from_str_or_value`].
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => {
            *s = substitute(s, params, defs)?;
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Parse a YAML document into `T` after substituting `${param}` references.
///
/// Parameter definitions are read from the document's top-level `params` map.
pub fn parse_yaml<T: DeserializeOwned>(yaml: &str, params: &Params) -> Result<T> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(yaml)?;

    let defs: HashMap<String, ParamDef> = value
        .get("params")
        .and_then(|v| serde_yaml::from_value(v.clone()).ok())
        .unwrap_or_default();

    substitute_value(&mut value, params, &defs)?;
    Ok(serde_yaml::from_value(value)?)
}

/// Read a YAML file and parse it with [`parse_yaml`].
pub fn load_yaml<T: DeserializeOwned, P: AsRef<Path>>(path: P, params: &Params) -> Result<T> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_yaml(&content, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default, deserialize_with = "crate::de::from_str_or_value")]
        limit: f64,
        #[serde(default, deserialize_with = "crate::de::from_str_or_value")]
        headless: bool,
        #[serde(default)]
        label: String,
    }

    #[test]
    fn test_substitute_simple() {
        let params = Params::new().set("name", "world");
        let defs = HashMap::new();
        let result = substitute("hello ${name}!", &params, &defs).unwrap();
        assert_eq!(result, "hello world!");
    }

    #[test]
    fn test_substitute_multiple() {
        let params = Params::new().set("a", "1").set("b", "2");
        let defs = HashMap::new();
        let result = substitute("${a} + ${b} = 3", &params, &defs).unwrap();
        assert_eq!(result, "1 + 2 = 3");
    }

    #[test]
    fn test_substitute_default() {
        let params = Params::new();
        let mut defs = HashMap::new();
        defs.insert(
            "name".to_string(),
            ParamDef {
                default: Some("default".to_string()),
                ..Default::default()
            },
        );
        let result = substitute("hello ${name}", &params, &defs).unwrap();
        assert_eq!(result, "hello default");
    }

    #[test]
    fn test_substitute_required_missing() {
        let params = Params::new();
        let mut defs = HashMap::new();
        defs.insert(
            "name".to_string(),
            ParamDef {
                required: true,
                ..Default::default()
            },
        );
        let err = substitute("hello ${name}", &params, &defs).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_substitute_unknown_left_alone() {
        let result = substitute("${HOME}/x", &Params::new(), &HashMap::new()).unwrap();
        assert_eq!(result, "${HOME}/x");
    }

    #[test]
    fn test_params_from_args() {
        let args = vec!["user=alice".to_string(), "pass=a=b".to_string()];
        let params = Params::from_args(&args).unwrap();
        assert_eq!(params.get("user"), Some("alice"));
        assert_eq!(params.get("pass"), Some("a=b"));
    }

    #[test]
    fn test_params_from_args_invalid() {
        let args = vec!["novalue".to_string()];
        assert!(Params::from_args(&args).is_err());
    }

    #[test]
    fn test_parse_yaml_keeps_scalar_types() {
        let yaml = r#"
params:
  limit:
    default: "3500"
  headless:
    default: "true"
name: "run ${limit}"
limit: "${limit}"
headless: "${headless}"
"#;
        let sample: Sample = parse_yaml(yaml, &Params::new()).unwrap();
        assert_eq!(sample.name, "run 3500");
        assert_eq!(sample.limit, 3500.0);
        assert!(sample.headless);
    }

    #[test]
    fn test_parse_yaml_cli_overrides_default() {
        let yaml = r#"
params:
  limit:
    default: "3500"
name: "x"
limit: "${limit}"
"#;
        let params = Params::new().set("limit", "4200.5");
        let sample: Sample = parse_yaml(yaml, &params).unwrap();
        assert_eq!(sample.limit, 4200.5);
    }

    #[test]
    fn test_numeric_looking_value_stays_text() {
        let yaml = r#"
params:
  label:
    default: "tv"
name: "x"
label: "${label}"
"#;
        let params = Params::new().set("label", "12345");
        let sample: Sample = parse_yaml(yaml, &params).unwrap();
        assert_eq!(sample.label, "12345");

        let params = Params::new().set("label", "true");
        let sample: Sample = parse_yaml(yaml, &params).unwrap();
        assert_eq!(sample.label, "true");
    }

    #[test]
    fn test_unquoted_numbers_still_parse() {
        let sample: Sample = parse_yaml("name: x\nlimit: 12.5\nheadless: true\n", &Params::new()).unwrap();
        assert_eq!(sample.limit, 12.5);
        assert!(sample.headless);
    }
}
