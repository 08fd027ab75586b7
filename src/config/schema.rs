use crate::config::rules::{ChainOptions, FieldOptions, Options, RuleSet, RULES};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TidyConfig {
    #[serde(default)]
    pub rules: RuleSelection,
    #[serde(default)]
    pub fields: FieldOptions,
    #[serde(default)]
    pub chains: ChainOptions,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleSelection {
    /// Replaces the default rule set when present.
    #[serde(default)]
    pub enable: Option<Vec<String>>,
    #[serde(default)]
    pub disable: Vec<String>,
}

impl TidyConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let enabled = self.rules.enable.iter().flatten();
        for name in enabled.clone().chain(&self.rules.disable) {
            if RuleSet::from_key(name).is_none() {
                issues.push(ValidationIssue::UnknownRule {
                    name: name.clone(),
                    suggestion: suggest_rule(name),
                });
            }
        }

        for name in enabled {
            if self.rules.disable.contains(name) && RuleSet::from_key(name).is_some() {
                issues.push(ValidationIssue::Conflict { name: name.clone() });
            }
        }

        if self.fields.max_declaration_length == 0 {
            issues.push(ValidationIssue::ZeroLength {
                field: "fields.max_declaration_length",
            });
        }
        if self.chains.max_statement_length == 0 {
            issues.push(ValidationIssue::ZeroLength {
                field: "chains.max_statement_length",
            });
        }
        if !self.chains.indent.chars().all(|c| c == ' ' || c == '\t') {
            issues.push(ValidationIssue::InvalidIndent {
                indent: self.chains.indent.clone(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Rule set and sub-options described by a validated config.
    pub fn options(&self) -> Options {
        let mut rules = match &self.rules.enable {
            Some(names) => names
                .iter()
                .filter_map(|name| RuleSet::from_key(name))
                .fold(RuleSet::empty(), |set, flag| set | flag),
            None => RuleSet::defaults(),
        };
        for name in &self.rules.disable {
            if let Some(flag) = RuleSet::from_key(name) {
                rules.remove(flag);
            }
        }

        Options {
            rules,
            fields: self.fields.clone(),
            chains: self.chains.clone(),
        }
    }
}

fn suggest_rule(name: &str) -> Option<String> {
    RULES
        .iter()
        .map(|(_, key, _)| (strsim::jaro_winkler(name, key), *key))
        .filter(|(score, _)| *score > 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    UnknownRule {
        name: String,
        suggestion: Option<String>,
    },
    Conflict {
        name: String,
    },
    ZeroLength {
        field: &'static str,
    },
    InvalidIndent {
        indent: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::UnknownRule { name, suggestion } => match suggestion {
                Some(suggestion) => {
                    write!(f, "unknown rule '{name}' (did you mean '{suggestion}'?)")
                }
                None => write!(f, "unknown rule '{name}'"),
            },
            ValidationIssue::Conflict { name } => {
                write!(f, "rule '{name}' is both enabled and disabled")
            }
            ValidationIssue::ZeroLength { field } => write!(f, "'{field}' must be greater than 0"),
            ValidationIssue::InvalidIndent { indent } => {
                write!(f, "chains.indent {indent:?} must only contain spaces and tabs")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rules: RuleSelection) -> TidyConfig {
        TidyConfig {
            rules,
            ..TidyConfig::default()
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = TidyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.options(), Options::default());
    }

    #[test]
    fn enable_replaces_defaults_and_disable_subtracts() {
        let config = config(RuleSelection {
            enable: Some(vec!["flatten-chains".into(), "camel-case-locals".into()]),
            disable: vec!["camel-case-locals".into()],
        });
        assert_eq!(
            config.validate().unwrap_err().issues,
            vec![ValidationIssue::Conflict {
                name: "camel-case-locals".into()
            }]
        );

        let config = super::TidyConfig {
            rules: RuleSelection {
                enable: None,
                disable: vec!["flatten-chains".into()],
            },
            ..TidyConfig::default()
        };
        assert!(!config.options().rules.contains(RuleSet::FLATTEN_CHAINS));
        assert!(config.options().rules.contains(RuleSet::MERGE_FIELD_DECLARATIONS));
    }

    #[test]
    fn unknown_rules_get_suggestions() {
        let config = config(RuleSelection {
            enable: Some(vec!["flaten-chains".into()]),
            disable: Vec::new(),
        });
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.issues,
            vec![ValidationIssue::UnknownRule {
                name: "flaten-chains".into(),
                suggestion: Some("flatten-chains".into()),
            }]
        );
        assert!(err.to_string().contains("did you mean 'flatten-chains'"));
    }

    #[test]
    fn every_issue_is_collected() {
        let mut config = TidyConfig::default();
        config.fields.max_declaration_length = 0;
        config.chains.max_statement_length = 0;
        config.chains.indent = "->".into();
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues.len(), 3);
        assert_eq!(err.to_string().lines().count(), 3);
    }
}
