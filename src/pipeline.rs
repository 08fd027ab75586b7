//! Runs the enabled passes over one unit in registry order.

use crate::config::Options;
use crate::passes::{registry, PassContext, PassError};
use crate::report::Report;
use crate::semantic::{ResolveError, SemanticModel, SymbolResolver};
use crate::syntax::SyntaxNode;
use thiserror::Error;
use tracing::debug_span;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pass '{pass}' failed: {source}")]
    Pass {
        pass: &'static str,
        #[source]
        source: PassError,
    },

    #[error("failed to derive symbol model before '{pass}': {source}")]
    Resolve {
        pass: &'static str,
        #[source]
        source: ResolveError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Thread each pass's output into the next.
    Apply,
    /// Every pass sees the original tree; only findings come back.
    ReportOnly,
}

/// Result of one pipeline run.
#[derive(Debug)]
#[must_use = "the rewritten tree is in `root`"]
pub struct PipelineOutcome {
    pub root: SyntaxNode,
    pub report: Report,
    /// Whether `root` serializes differently from the input.
    pub changed: bool,
    /// How many symbol models were derived.
    pub derivations: usize,
    pub passes_run: Vec<&'static str>,
}

pub struct Pipeline<'r> {
    resolver: &'r dyn SymbolResolver,
    options: Options,
}

impl<'r> Pipeline<'r> {
    pub fn new(resolver: &'r dyn SymbolResolver, options: Options) -> Self {
        Self { resolver, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    #[tracing::instrument(level = "debug", skip_all, fields(mode = ?mode))]
    pub fn run(&self, root: &SyntaxNode, mode: Mode) -> Result<PipelineOutcome, PipelineError> {
        let report_only = mode == Mode::ReportOnly;
        let mut current = root.clone();
        let mut model: Option<SemanticModel> = None;
        let mut report = Report::new();
        let mut derivations = 0;
        let mut passes_run = Vec::new();

        for pass in registry() {
            if !pass.is_enabled(self.options.rules) {
                continue;
            }
            let _span = debug_span!("pass", name = pass.name).entered();

            if pass.needs_model && !model.as_ref().is_some_and(|m| m.is_bound_to(&current)) {
                let derived = self
                    .resolver
                    .resolve(&current)
                    .map_err(|source| PipelineError::Resolve {
                        pass: pass.name,
                        source,
                    })?;
                derivations += 1;
                tracing::debug!(derivations, "derived symbol model");
                model = Some(derived);
            }

            let ctx = PassContext::new(
                &current,
                model.as_ref(),
                &self.options,
                report_only,
                self.resolver,
            );
            let output = (pass.run)(&ctx).map_err(|source| PipelineError::Pass {
                pass: pass.name,
                source,
            })?;

            let tree_changed = !output.root.ptr_eq(&current);
            tracing::debug!(
                findings = output.findings.len(),
                changed = tree_changed,
                "pass finished"
            );
            report.extend(output.findings);
            passes_run.push(pass.name);

            if let Some(next) = output.model.filter(|m| m.is_bound_to(&output.root)) {
                model = Some(next);
            }
            if !report_only {
                current = output.root;
            }
        }

        let changed = current.text() != root.text();
        Ok(PipelineOutcome {
            root: current,
            report,
            changed,
            derivations,
            passes_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;
    use crate::semantic::LexicalResolver;
    use crate::ts::parse_unit;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "class C\n{\n    private int Count = 0;\n    void M() { int Total = Count; }\n}\n";

    fn rules() -> RuleSet {
        RuleSet::REMOVE_DEFAULT_INITIALIZERS
            | RuleSet::CAMEL_CASE_LOCALS
            | RuleSet::CAMEL_CASE_PRIVATE_FIELDS
    }

    #[test]
    fn passes_are_threaded_in_order() {
        let root = parse_unit(SOURCE).unwrap();
        let pipeline = Pipeline::new(&LexicalResolver, Options::with_rules(rules()));
        let outcome = pipeline.run(&root, Mode::Apply).unwrap();

        assert_eq!(
            outcome.root.text(),
            "class C\n{\n    private int count;\n    void M() { int total = count; }\n}\n"
        );
        assert!(outcome.changed);
        assert_eq!(outcome.report.len(), 3);
        assert_eq!(
            outcome.passes_run,
            vec!["field-declarations", "local-naming", "field-naming"]
        );
        // The field pass changed the tree; the local naming pass hands its
        // model on to the field naming pass.
        assert_eq!(outcome.derivations, 2);
    }

    #[test]
    fn report_only_keeps_the_original_tree() {
        let root = parse_unit(SOURCE).unwrap();
        let pipeline = Pipeline::new(&LexicalResolver, Options::with_rules(rules()));
        let outcome = pipeline.run(&root, Mode::ReportOnly).unwrap();

        assert!(outcome.root.ptr_eq(&root));
        assert!(!outcome.changed);
        assert_eq!(outcome.report.len(), 3);
        assert_eq!(outcome.derivations, 1);
    }

    #[test]
    fn no_enabled_rule_means_no_change() {
        let root = parse_unit(SOURCE).unwrap();
        let pipeline = Pipeline::new(&LexicalResolver, Options::with_rules(RuleSet::empty()));
        let outcome = pipeline.run(&root, Mode::Apply).unwrap();

        assert_eq!(outcome.root.text(), SOURCE);
        assert!(outcome.report.is_empty());
        assert!(outcome.passes_run.is_empty());
        assert_eq!(outcome.derivations, 0);
    }

    #[test]
    fn clean_code_is_left_byte_identical() {
        let source = "class C\n{\n    private int count;\n    void M() { int total = count; }\n}\n";
        let root = parse_unit(source).unwrap();
        let pipeline = Pipeline::new(&LexicalResolver, Options::with_rules(RuleSet::all()));
        let outcome = pipeline.run(&root, Mode::Apply).unwrap();

        assert_eq!(outcome.root.text(), source);
        assert!(!outcome.changed);
        assert!(outcome.report.is_empty());
    }
}
