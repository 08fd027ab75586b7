//! Scope-aware renaming.
//!
//! A rename rewrites the declaration and every resolved reference of one
//! symbol in a single new root, then re-derives the model and keeps the
//! result only if every identifier still binds where it did before. Renames
//! are driven per container by a work-list loop that stops once a sweep
//! accepts nothing.

pub mod policy;
pub mod validate;

pub use policy::NamingPolicy;
pub use validate::{check_candidate, is_keyword, is_valid_identifier, Rejection};

use crate::semantic::{ResolveError, SemanticModel, SymbolId, SymbolKind, SymbolResolver};
use crate::syntax::{replace_token_text, NodePath, SyntaxNode, TokenIndex};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("failed to re-derive symbols after renaming '{from}' to '{to}': {source}")]
    Resolve {
        from: String,
        to: String,
        #[source]
        source: ResolveError,
    },

    #[error("renaming in '{container}' did not settle after {iterations} sweeps")]
    NoFixpoint { container: String, iterations: usize },
}

/// Decides which declarations a naming rule touches and how.
pub trait RenameRule {
    /// Containers whose declarations the rule renames.
    fn containers(&self, model: &SemanticModel) -> Vec<SymbolId>;

    /// The policy for `id` and the rule key to report it under, or `None`
    /// when `id` is not eligible.
    fn policy(
        &self,
        model: &SemanticModel,
        container: SymbolId,
        id: SymbolId,
    ) -> Option<(NamingPolicy, &'static str)>;
}

/// A declaration together with the names proposed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameCandidate {
    pub symbol: SymbolId,
    pub current: String,
    pub proposed: Vec<String>,
    pub declaration: NodePath,
    pub rule: &'static str,
}

/// Result of trying one candidate's proposed names in order.
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    pub accepted: bool,
    pub chosen: Option<String>,
    pub root: SyntaxNode,
    pub model: SemanticModel,
    pub rejections: Vec<(String, Rejection)>,
}

/// An accepted rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRename {
    pub symbol: SymbolId,
    pub kind: SymbolKind,
    pub rule: &'static str,
    pub old_name: String,
    pub new_name: String,
    /// The declaring identifier token.
    pub declaration: TokenIndex,
}

/// Final tree and model after a rule ran to its fixpoint.
#[derive(Debug, Clone)]
pub struct RenameRun {
    pub root: SyntaxNode,
    pub model: SemanticModel,
    pub renames: Vec<AppliedRename>,
    /// Largest number of sweeps any single container needed.
    pub iterations: usize,
}

pub struct RenameEngine<'r, R: SymbolResolver + ?Sized> {
    resolver: &'r R,
}

impl<'r, R: SymbolResolver + ?Sized> RenameEngine<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Apply `rule` to every container of `model` until nothing changes.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&self, model: SemanticModel, rule: &dyn RenameRule) -> Result<RenameRun, RenameError> {
        let mut run = RenameRun {
            root: model.root().clone(),
            model,
            renames: Vec::new(),
            iterations: 0,
        };
        for container in rule.containers(&run.model) {
            let sweeps = self.run_container(&mut run, container, rule)?;
            run.iterations = run.iterations.max(sweeps);
        }
        Ok(run)
    }

    fn run_container(
        &self,
        run: &mut RenameRun,
        container: SymbolId,
        rule: &dyn RenameRule,
    ) -> Result<usize, RenameError> {
        let mut visited = HashSet::new();
        let limit = self.candidates(&run.model, container, &visited, rule).len() + 1;
        let mut sweeps = 0;

        loop {
            sweeps += 1;
            if sweeps > limit {
                return Err(RenameError::NoFixpoint {
                    container: run.model.symbol(container).name.clone(),
                    iterations: sweeps - 1,
                });
            }

            let work: Vec<SymbolId> = self
                .candidates(&run.model, container, &visited, rule)
                .into_iter()
                .map(|candidate| candidate.symbol)
                .collect();
            let mut accepted_any = false;

            for id in work {
                // Earlier acceptances in this sweep may have visited the name.
                let Some(candidate) = self.candidate(&run.model, container, id, &visited, rule) else {
                    continue;
                };
                let outcome = self.try_rename(&run.model, &candidate)?;
                visited.insert(outcome.chosen.clone().unwrap_or_else(|| candidate.current.clone()));

                if !outcome.accepted {
                    continue;
                }
                if let (Some(new_name), Some(declaration)) =
                    (outcome.chosen, run.model.symbol(id).declaration)
                {
                    tracing::debug!(from = %candidate.current, to = %new_name, "renamed");
                    run.renames.push(AppliedRename {
                        symbol: id,
                        kind: run.model.symbol(id).kind,
                        rule: candidate.rule,
                        old_name: candidate.current,
                        new_name,
                        declaration,
                    });
                }
                run.root = outcome.root;
                run.model = outcome.model;
                accepted_any = true;
            }

            if !accepted_any {
                return Ok(sweeps);
            }
        }
    }

    /// Work-list of one container: eligible declarations whose current name
    /// has not been visited yet.
    pub fn candidates(
        &self,
        model: &SemanticModel,
        container: SymbolId,
        visited: &HashSet<String>,
        rule: &dyn RenameRule,
    ) -> Vec<RenameCandidate> {
        model
            .symbols()
            .filter_map(|(id, _)| self.candidate(model, container, id, visited, rule))
            .collect()
    }

    fn candidate(
        &self,
        model: &SemanticModel,
        container: SymbolId,
        id: SymbolId,
        visited: &HashSet<String>,
        rule: &dyn RenameRule,
    ) -> Option<RenameCandidate> {
        let symbol = model.symbol(id);
        if symbol.declaration.is_none() || visited.contains(&symbol.name) {
            return None;
        }
        let (policy, key) = rule.policy(model, container, id)?;
        Some(RenameCandidate {
            symbol: id,
            current: symbol.name.clone(),
            proposed: policy.candidates(&symbol.name),
            declaration: symbol.syntax.clone(),
            rule: key,
        })
    }

    /// Try the proposed names of `candidate` in order and keep the first one
    /// that passes the static checks and does not capture any identifier.
    pub fn try_rename(
        &self,
        model: &SemanticModel,
        candidate: &RenameCandidate,
    ) -> Result<RenameOutcome, RenameError> {
        let mut rejections = Vec::new();

        for proposed in &candidate.proposed {
            if let Err(rejection) = check_candidate(model, candidate.symbol, proposed) {
                rejections.push((proposed.clone(), rejection));
                continue;
            }

            let root = rename_symbol(model, candidate.symbol, proposed);
            let renamed = self.resolver.resolve(&root).map_err(|source| RenameError::Resolve {
                from: candidate.current.clone(),
                to: proposed.clone(),
                source,
            })?;

            if renamed.binding_map() != model.binding_map() {
                rejections.push((proposed.clone(), Rejection::Capture));
                continue;
            }

            return Ok(RenameOutcome {
                accepted: true,
                chosen: Some(proposed.clone()),
                root,
                model: renamed,
                rejections,
            });
        }

        for (name, rejection) in &rejections {
            tracing::debug!(from = %candidate.current, to = %name, %rejection, "rename rejected");
        }
        Ok(RenameOutcome {
            accepted: false,
            chosen: None,
            root: model.root().clone(),
            model: model.clone(),
            rejections,
        })
    }
}

/// New root with the declaration and every reference of `id` renamed.
pub fn rename_symbol(model: &SemanticModel, id: SymbolId, new_name: &str) -> SyntaxNode {
    let texts: BTreeMap<TokenIndex, String> = model
        .symbol(id)
        .declaration
        .into_iter()
        .chain(model.references(id).iter().copied())
        .map(|index| (index, new_name.to_string()))
        .collect();
    replace_token_text(model.root(), &texts)
}
