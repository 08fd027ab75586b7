//! Rewrite passes and their registry.
//!
//! A pass is a plain function from a [`PassContext`] to a [`PassOutput`]. In
//! report-only mode it still computes the rewritten tree, but hands back its
//! input together with findings for every place the result differs.

pub mod chains;
pub mod fields;
pub mod line_endings;
pub mod modifiers;
pub mod naming;

use crate::config::{Options, RuleSet};
use crate::rename::RenameError;
use crate::report::Finding;
use crate::semantic::{ResolveError, SemanticModel, SymbolResolver};
use crate::syntax::{LineIndex, SyntaxKind, SyntaxNode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PassError {
    #[error("pass '{pass}' needs a symbol model bound to its input")]
    MissingModel { pass: &'static str },

    #[error(transparent)]
    Rename(#[from] RenameError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Everything a pass reads.
pub struct PassContext<'a> {
    pub root: &'a SyntaxNode,
    pub options: &'a Options,
    pub report_only: bool,
    pub resolver: &'a dyn SymbolResolver,
    model: Option<&'a SemanticModel>,
    lines: LineIndex,
}

impl<'a> PassContext<'a> {
    pub fn new(
        root: &'a SyntaxNode,
        model: Option<&'a SemanticModel>,
        options: &'a Options,
        report_only: bool,
        resolver: &'a dyn SymbolResolver,
    ) -> Self {
        Self {
            root,
            options,
            report_only,
            resolver,
            model,
            lines: LineIndex::new(root.text()),
        }
    }

    /// The model of the input tree. Fails instead of handing out a model
    /// derived from some other tree.
    pub fn model(&self, pass: &'static str) -> Result<&'a SemanticModel, PassError> {
        self.model
            .filter(|model| model.is_bound_to(self.root))
            .ok_or(PassError::MissingModel { pass })
    }

    pub fn rules(&self) -> RuleSet {
        self.options.rules
    }

    /// A finding at a byte offset of the input text.
    pub fn finding(
        &self,
        rule: &'static str,
        kind: SyntaxKind,
        offset: usize,
        message: impl Into<String>,
    ) -> Finding {
        Finding::new(&self.lines, rule, kind, offset, message)
    }

    /// Output for a pass that computed `rewritten`: the input itself in
    /// report-only mode.
    pub fn output(&self, rewritten: SyntaxNode, findings: Vec<Finding>) -> PassOutput {
        PassOutput {
            root: if self.report_only {
                self.root.clone()
            } else {
                rewritten
            },
            findings,
            model: None,
        }
    }
}

/// What a pass hands back.
#[derive(Debug)]
pub struct PassOutput {
    pub root: SyntaxNode,
    pub findings: Vec<Finding>,
    /// A model already bound to `root`, when the pass derived one.
    pub model: Option<SemanticModel>,
}

pub type PassFn = fn(&PassContext<'_>) -> Result<PassOutput, PassError>;

/// A registry entry.
pub struct Pass {
    pub name: &'static str,
    /// The pass runs when any of these rules is enabled.
    pub rules: RuleSet,
    pub needs_model: bool,
    pub run: PassFn,
}

impl Pass {
    pub fn is_enabled(&self, rules: RuleSet) -> bool {
        rules.intersects(self.rules)
    }
}

/// All passes in the order they run.
pub static REGISTRY: &[Pass] = &[
    Pass {
        name: "line-endings",
        rules: RuleSet::NORMALIZE_LINE_ENDINGS,
        needs_model: false,
        run: line_endings::run,
    },
    Pass {
        name: "private-modifiers",
        rules: RuleSet::REMOVE_PRIVATE_NESTED_MODIFIER,
        needs_model: false,
        run: modifiers::run,
    },
    Pass {
        name: "field-declarations",
        rules: RuleSet::MERGE_FIELD_DECLARATIONS
            .union(RuleSet::REMOVE_DEFAULT_INITIALIZERS)
            .union(RuleSet::REMOVE_NULL_INITIALIZERS),
        needs_model: true,
        run: fields::run,
    },
    Pass {
        name: "local-naming",
        rules: RuleSet::CAMEL_CASE_LOCALS.union(RuleSet::CAMEL_CASE_PARAMETERS),
        needs_model: true,
        run: naming::run_locals,
    },
    Pass {
        name: "field-naming",
        rules: RuleSet::CAMEL_CASE_PRIVATE_FIELDS.union(RuleSet::PASCAL_CASE_CONSTANTS),
        needs_model: true,
        run: naming::run_fields,
    },
    Pass {
        name: "chain-flattening",
        rules: RuleSet::FLATTEN_CHAINS,
        needs_model: false,
        run: chains::run,
    },
];

pub fn registry() -> &'static [Pass] {
    REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_rule_once() {
        let mut seen = RuleSet::empty();
        for pass in registry() {
            assert!(!seen.intersects(pass.rules), "{} overlaps", pass.name);
            seen |= pass.rules;
        }
        assert_eq!(seen, RuleSet::all());
    }

    #[test]
    fn passes_run_only_for_their_rules() {
        let chains = registry().last().unwrap();
        assert!(chains.is_enabled(RuleSet::FLATTEN_CHAINS | RuleSet::CAMEL_CASE_LOCALS));
        assert!(!chains.is_enabled(RuleSet::CAMEL_CASE_LOCALS));
    }
}
