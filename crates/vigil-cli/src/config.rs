//! Rule set configuration
//!
//! A rule set declares the pass parameters, the rule providers to load and
//! the validators that bind document selectors to rules:
//!
//! ```toml
//! [params]
//! "validation.maxFails" = 5
//!
//! [[providers]]
//! name = "order"
//! type = "regex"
//! src = "config/order/order-rules.properties"
//!
//! [[validators]]
//! select = "/items/*/quantity"
//! rule = "order.quantity"
//! on_fail = "WARN"
//! ```
//!
//! Rule sets may be written as TOML, YAML or JSON; the file extension decides.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use vigil_core::{RuleName, Severity};

/// Structured file formats understood by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Some(FileFormat::Toml),
            Some("yaml") | Some("yml") => Some(FileFormat::Yaml),
            Some("json") => Some(FileFormat::Json),
            _ => None,
        }
    }
}

/// Parameter value as written in the rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Integer(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::String(s) => f.write_str(s),
        }
    }
}

/// Kinds of rule provider the CLI can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Named regular expressions from a properties file
    #[default]
    Regex,
}

/// A rule provider declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name used as the first part of composite rule names
    pub name: String,

    /// Provider implementation
    #[serde(rename = "type", default)]
    pub kind: ProviderKind,

    /// Rule file, resolved against the resource roots
    pub src: String,
}

/// Binds a document selector to a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Fragment selector, e.g. `/items/*/quantity` or `/**/email`
    pub select: String,

    /// Composite rule name `<provider>.<rule>`
    pub rule: String,

    /// Severity recorded when the rule does not match
    #[serde(default)]
    pub on_fail: Severity,
}

/// A complete rule set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    /// Pass parameters, e.g. `validation.maxFails`
    pub params: BTreeMap<String, ParamValue>,

    /// Rule providers
    pub providers: Vec<ProviderConfig>,

    /// Validators, applied in declaration order
    pub validators: Vec<ValidatorConfig>,
}

impl Ruleset {
    /// Load a rule set from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let format = FileFormat::from_path(path).ok_or_else(|| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "TOML, YAML or JSON".to_string(),
        })?;

        let content = fs::read_to_string(path)?;
        let ruleset = Self::parse(&content, format)?;
        tracing::debug!(
            path = %path.display(),
            providers = ruleset.providers.len(),
            validators = ruleset.validators.len(),
            "Loaded rule set"
        );
        Ok(ruleset)
    }

    /// Parse rule set content in the given format
    pub fn parse(content: &str, format: FileFormat) -> Result<Self> {
        let ruleset = match format {
            FileFormat::Toml => toml::from_str(content)?,
            FileFormat::Yaml => serde_yaml::from_str(content)?,
            FileFormat::Json => serde_json::from_str(content)?,
        };
        Ok(ruleset)
    }

    /// Check the rule set for declaration errors
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for provider in &self.providers {
            if provider.name.is_empty() || provider.name.contains('.') {
                return Err(Error::config(format!(
                    "Invalid provider name '{}': must be non-empty and must not contain '.'",
                    provider.name
                )));
            }
            if !names.insert(provider.name.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate provider '{}'",
                    provider.name
                )));
            }
        }

        for validator in &self.validators {
            let rule = RuleName::parse(&validator.rule)?;
            if !names.contains(rule.provider()) {
                return Err(Error::config(format!(
                    "Validator for '{}' uses undeclared provider '{}'",
                    validator.select,
                    rule.provider()
                )));
            }
        }

        Ok(())
    }

    /// Parameter values as the strings an execution context holds
    pub fn param_strings(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOML_RULESET: &str = r#"
[params]
"validation.maxFails" = 5

[[providers]]
name = "order"
type = "regex"
src = "config/order/order-rules.properties"

[[validators]]
select = "/header/customerNumber"
rule = "order.customerNumber"

[[validators]]
select = "/items/*/quantity"
rule = "order.quantity"
on_fail = "WARN"
"#;

    #[test]
    fn test_parse_toml() {
        let ruleset = Ruleset::parse(TOML_RULESET, FileFormat::Toml).unwrap();
        assert_eq!(
            ruleset.params.get("validation.maxFails"),
            Some(&ParamValue::Integer(5))
        );
        assert_eq!(ruleset.providers.len(), 1);
        assert_eq!(ruleset.providers[0].kind, ProviderKind::Regex);
        assert_eq!(ruleset.validators[0].on_fail, Severity::Error);
        assert_eq!(ruleset.validators[1].on_fail, Severity::Warn);
        ruleset.validate().unwrap();
    }

    #[test]
    fn test_parse_yaml_and_json_agree() {
        let yaml = r#"
params:
  validation.maxFails: "5"
providers:
  - name: order
    src: config/order/order-rules.properties
validators:
  - select: /items/*/quantity
    rule: order.quantity
    on_fail: FATAL
"#;
        let json = r#"{
  "params": {"validation.maxFails": "5"},
  "providers": [{"name": "order", "src": "config/order/order-rules.properties"}],
  "validators": [{"select": "/items/*/quantity", "rule": "order.quantity", "on_fail": "FATAL"}]
}"#;
        let from_yaml = Ruleset::parse(yaml, FileFormat::Yaml).unwrap();
        let from_json = Ruleset::parse(json, FileFormat::Json).unwrap();
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.validators[0].on_fail, Severity::Fatal);
    }

    #[test]
    fn test_param_strings() {
        let ruleset = Ruleset::parse(TOML_RULESET, FileFormat::Toml).unwrap();
        let params: Vec<_> = ruleset.param_strings().collect();
        assert_eq!(params, vec![("validation.maxFails", "5".to_string())]);
    }

    #[test]
    fn test_unknown_provider_type_is_rejected() {
        let toml = r#"
[[providers]]
name = "order"
type = "schematron"
src = "order.sch"
"#;
        assert!(matches!(
            Ruleset::parse(toml, FileFormat::Toml),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_validate_rejects_duplicates_and_undeclared_providers() {
        let mut ruleset = Ruleset::parse(TOML_RULESET, FileFormat::Toml).unwrap();
        ruleset.providers.push(ruleset.providers[0].clone());
        assert!(matches!(ruleset.validate(), Err(Error::Config(_))));

        let mut ruleset = Ruleset::parse(TOML_RULESET, FileFormat::Toml).unwrap();
        ruleset.validators[0].rule = "addressing.email".to_string();
        let err = ruleset.validate().unwrap_err();
        assert!(err.to_string().contains("undeclared provider 'addressing'"));

        let mut ruleset = Ruleset::parse(TOML_RULESET, FileFormat::Toml).unwrap();
        ruleset.validators[0].rule = "noseparator".to_string();
        assert!(matches!(ruleset.validate(), Err(Error::Core(_))));
    }

    #[test]
    fn test_load_missing_and_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Ruleset::load(&missing),
            Err(Error::FileNotFound { .. })
        ));

        let ini = dir.path().join("rules.ini");
        fs::write(&ini, "x=1").unwrap();
        assert!(matches!(
            Ruleset::load(&ini),
            Err(Error::InvalidFormat { .. })
        ));

        let toml = dir.path().join("rules.toml");
        fs::write(&toml, TOML_RULESET).unwrap();
        assert_eq!(Ruleset::load(&toml).unwrap().validators.len(), 2);
    }

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(FileFormat::from_path(Path::new("a.yml")), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path(Path::new("a.json")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("a")), None);
    }
}
