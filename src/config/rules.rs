use bitflags::bitflags;
use serde::Deserialize;

bitflags! {
    /// Enabled cleanup rules.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct RuleSet: u32 {
        const NORMALIZE_LINE_ENDINGS = 1 << 0;
        const REMOVE_PRIVATE_NESTED_MODIFIER = 1 << 1;
        const MERGE_FIELD_DECLARATIONS = 1 << 2;
        const REMOVE_DEFAULT_INITIALIZERS = 1 << 3;
        const REMOVE_NULL_INITIALIZERS = 1 << 4;
        const CAMEL_CASE_LOCALS = 1 << 5;
        const CAMEL_CASE_PARAMETERS = 1 << 6;
        const CAMEL_CASE_PRIVATE_FIELDS = 1 << 7;
        const PASCAL_CASE_CONSTANTS = 1 << 8;
        const FLATTEN_CHAINS = 1 << 9;
    }
}

/// Rule metadata: flag, configuration key, description.
pub const RULES: &[(RuleSet, &str, &str)] = &[
    (
        RuleSet::NORMALIZE_LINE_ENDINGS,
        "normalize-line-endings",
        "Convert \\r\\n line endings to \\n",
    ),
    (
        RuleSet::REMOVE_PRIVATE_NESTED_MODIFIER,
        "remove-private-nested-modifier",
        "Drop the redundant 'private' modifier of nested types",
    ),
    (
        RuleSet::MERGE_FIELD_DECLARATIONS,
        "merge-field-declarations",
        "Merge fields of the same type and modifiers into one declaration",
    ),
    (
        RuleSet::REMOVE_DEFAULT_INITIALIZERS,
        "remove-default-initializers",
        "Remove field initializers equal to the type's default value",
    ),
    (
        RuleSet::REMOVE_NULL_INITIALIZERS,
        "remove-null-initializers",
        "Remove '= null' field initializers",
    ),
    (
        RuleSet::CAMEL_CASE_LOCALS,
        "camel-case-locals",
        "Rename local variables to camelCase",
    ),
    (
        RuleSet::CAMEL_CASE_PARAMETERS,
        "camel-case-parameters",
        "Rename method parameters to camelCase",
    ),
    (
        RuleSet::CAMEL_CASE_PRIVATE_FIELDS,
        "camel-case-private-fields",
        "Rename private fields to camelCase",
    ),
    (
        RuleSet::PASCAL_CASE_CONSTANTS,
        "pascal-case-constants",
        "Rename constants to PascalCase",
    ),
    (
        RuleSet::FLATTEN_CHAINS,
        "flatten-chains",
        "Put each call of a long fluent chain on its own line",
    ),
];

impl RuleSet {
    /// Rules enabled when the configuration does not list any.
    pub fn defaults() -> Self {
        RuleSet::all() - RuleSet::NORMALIZE_LINE_ENDINGS - RuleSet::CAMEL_CASE_PARAMETERS
    }

    pub fn from_key(key: &str) -> Option<Self> {
        RULES
            .iter()
            .find(|(_, name, _)| *name == key)
            .map(|(flag, _, _)| *flag)
    }

    /// Configuration key of a single rule.
    pub fn key(self) -> Option<&'static str> {
        RULES
            .iter()
            .find(|(flag, _, _)| *flag == self)
            .map(|(_, name, _)| *name)
    }

    pub fn keys(self) -> impl Iterator<Item = &'static str> {
        RULES
            .iter()
            .filter(move |(flag, _, _)| self.contains(*flag))
            .map(|(_, name, _)| *name)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::defaults()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    /// Longest merged field declaration accepted, in characters.
    pub max_declaration_length: usize,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            max_declaration_length: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainOptions {
    /// Statements longer than this many characters are flattened.
    pub max_statement_length: usize,
    /// Added to the statement's indentation before every broken `.`.
    pub indent: String,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            max_statement_length: 110,
            indent: "    ".to_string(),
        }
    }
}

/// Everything the passes are configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub rules: RuleSet,
    pub fields: FieldOptions,
    pub chains: ChainOptions,
}

impl Options {
    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_the_table() {
        for (flag, key, _) in RULES {
            assert_eq!(RuleSet::from_key(key), Some(*flag));
            assert_eq!(flag.key(), Some(*key));
        }
        assert_eq!(RuleSet::from_key("no-such-rule"), None);
        assert_eq!(RULES.len(), RuleSet::all().iter().count());
    }

    #[test]
    fn defaults_leave_out_opt_in_rules() {
        let defaults = RuleSet::default();
        assert!(defaults.contains(RuleSet::FLATTEN_CHAINS));
        assert!(!defaults.contains(RuleSet::NORMALIZE_LINE_ENDINGS));
        assert!(!defaults.contains(RuleSet::CAMEL_CASE_PARAMETERS));
    }

    #[test]
    fn combined_flags_have_no_single_key() {
        let both = RuleSet::CAMEL_CASE_LOCALS | RuleSet::FLATTEN_CHAINS;
        assert_eq!(both.key(), None);
        assert_eq!(
            both.keys().collect::<Vec<_>>(),
            vec!["camel-case-locals", "flatten-chains"]
        );
    }
}
