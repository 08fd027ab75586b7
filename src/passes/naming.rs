//! Naming passes built on the rename engine.

use crate::config::RuleSet;
use crate::passes::{PassContext, PassError, PassOutput};
use crate::rename::{NamingPolicy, RenameEngine, RenameRule};
use crate::semantic::{SemanticModel, SymbolId, SymbolKind, TypeKind};
use crate::syntax::{token_text_offsets, SyntaxKind};

/// camelCase for locals and parameters of every method-like member.
pub struct LocalNaming {
    pub locals: bool,
    pub parameters: bool,
}

impl RenameRule for LocalNaming {
    fn containers(&self, model: &SemanticModel) -> Vec<SymbolId> {
        model.method_roots().collect()
    }

    fn policy(
        &self,
        model: &SemanticModel,
        container: SymbolId,
        id: SymbolId,
    ) -> Option<(NamingPolicy, &'static str)> {
        let symbol = model.symbol(id);
        if symbol.implicit || model.outermost_method(id) != Some(container) {
            return None;
        }
        match symbol.kind {
            SymbolKind::Local if self.locals => Some((NamingPolicy::CamelCase, "camel-case-locals")),
            SymbolKind::Parameter if self.parameters => {
                Some((NamingPolicy::CamelCase, "camel-case-parameters"))
            }
            _ => None,
        }
    }
}

/// camelCase for private fields, PascalCase for constants.
pub struct FieldNaming {
    pub private_fields: bool,
    pub constants: bool,
}

impl RenameRule for FieldNaming {
    fn containers(&self, model: &SemanticModel) -> Vec<SymbolId> {
        model
            .symbols()
            .filter(|(_, s)| s.kind == SymbolKind::Type && s.type_kind != Some(TypeKind::Enum))
            .map(|(id, _)| id)
            .collect()
    }

    fn policy(
        &self,
        model: &SemanticModel,
        container: SymbolId,
        id: SymbolId,
    ) -> Option<(NamingPolicy, &'static str)> {
        let symbol = model.symbol(id);
        if symbol.kind != SymbolKind::Field || symbol.implicit || symbol.container != Some(container) {
            return None;
        }
        if symbol.is_const() {
            self.constants
                .then_some((NamingPolicy::PascalCase, "pascal-case-constants"))
        } else if symbol.is_private() {
            self.private_fields
                .then_some((NamingPolicy::CamelCase, "camel-case-private-fields"))
        } else {
            None
        }
    }
}

pub fn run_locals(ctx: &PassContext<'_>) -> Result<PassOutput, PassError> {
    let rule = LocalNaming {
        locals: ctx.rules().contains(RuleSet::CAMEL_CASE_LOCALS),
        parameters: ctx.rules().contains(RuleSet::CAMEL_CASE_PARAMETERS),
    };
    rename_pass(ctx, "local-naming", &rule)
}

pub fn run_fields(ctx: &PassContext<'_>) -> Result<PassOutput, PassError> {
    let rule = FieldNaming {
        private_fields: ctx.rules().contains(RuleSet::CAMEL_CASE_PRIVATE_FIELDS),
        constants: ctx.rules().contains(RuleSet::PASCAL_CASE_CONSTANTS),
    };
    rename_pass(ctx, "field-naming", &rule)
}

fn rename_pass(
    ctx: &PassContext<'_>,
    pass: &'static str,
    rule: &dyn RenameRule,
) -> Result<PassOutput, PassError> {
    let model = ctx.model(pass)?;
    let run = RenameEngine::new(ctx.resolver).run(model.clone(), rule)?;
    tracing::debug!(pass, renames = run.renames.len(), sweeps = run.iterations, "naming finished");

    let offsets = token_text_offsets(ctx.root);
    let findings = run
        .renames
        .iter()
        .map(|rename| {
            let kind = model
                .syntax(rename.symbol)
                .map_or(SyntaxKind::Other, |node| node.kind());
            let offset = offsets.get(rename.declaration.0 as usize).copied().unwrap_or(0);
            ctx.finding(
                rename.rule,
                kind,
                offset,
                format!("'{}' should be renamed to '{}'", rename.old_name, rename.new_name),
            )
        })
        .collect();

    if ctx.report_only {
        return Ok(PassOutput {
            root: ctx.root.clone(),
            findings,
            model: Some(model.clone()),
        });
    }
    Ok(PassOutput {
        root: run.root,
        findings,
        model: Some(run.model),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::semantic::{LexicalResolver, SymbolResolver};
    use crate::ts::parse_unit;
    use pretty_assertions::assert_eq;

    fn apply(source: &str, rules: RuleSet, report_only: bool) -> PassOutput {
        let root = parse_unit(source).unwrap();
        let model = LexicalResolver.resolve(&root).unwrap();
        let options = Options::with_rules(rules);
        let ctx = PassContext::new(&root, Some(&model), &options, report_only, &LexicalResolver);
        if rules.intersects(RuleSet::CAMEL_CASE_LOCALS | RuleSet::CAMEL_CASE_PARAMETERS) {
            run_locals(&ctx).unwrap()
        } else {
            run_fields(&ctx).unwrap()
        }
    }

    #[test]
    fn locals_become_camel_case() {
        let out = apply(
            "class C\n{\n    int Sum(int[] Values)\n    {\n        int Total = 0;\n        foreach (var Item in Values) Total += Item;\n        return Total;\n    }\n}\n",
            RuleSet::CAMEL_CASE_LOCALS,
            false,
        );
        assert_eq!(
            out.root.text(),
            "class C\n{\n    int Sum(int[] Values)\n    {\n        int total = 0;\n        foreach (var item in Values) total += item;\n        return total;\n    }\n}\n"
        );
        assert_eq!(out.findings.len(), 2);
        assert_eq!(out.findings[0].message, "'Total' should be renamed to 'total'");
        assert_eq!((out.findings[0].line, out.findings[0].column), (4, 12));
        assert!(out.model.unwrap().is_bound_to(&out.root));
    }

    #[test]
    fn parameters_have_their_own_rule() {
        let out = apply(
            "class C { int Twice(int Value) => Value * 2; }",
            RuleSet::CAMEL_CASE_PARAMETERS,
            false,
        );
        assert_eq!(out.root.text(), "class C { int Twice(int value) => value * 2; }");
        assert_eq!(out.findings[0].rule, "camel-case-parameters");
    }

    #[test]
    fn this_access_keeps_the_field_when_a_local_is_renamed() {
        let out = apply(
            "class C { int value; void Set() { int Value = 1; this.value = Value; } }",
            RuleSet::CAMEL_CASE_LOCALS,
            false,
        );
        assert_eq!(
            out.root.text(),
            "class C { int value; void Set() { int value = 1; this.value = value; } }"
        );
    }

    #[test]
    fn private_fields_and_constants() {
        let out = apply(
            "class C { private int Count; public int Visible; const int maxSize = 3; int Get() => Count + maxSize; }",
            RuleSet::CAMEL_CASE_PRIVATE_FIELDS | RuleSet::PASCAL_CASE_CONSTANTS,
            false,
        );
        assert_eq!(
            out.root.text(),
            "class C { private int count; public int Visible; const int MaxSize = 3; int Get() => count + MaxSize; }"
        );
        assert_eq!(out.findings.len(), 2);
    }

    #[test]
    fn field_rename_skips_initializer_members_of_other_types() {
        let out = apply(
            "class C { private int Size; void M() { var w = new Widget { Size = 2 }; Size = 1; } }",
            RuleSet::CAMEL_CASE_PRIVATE_FIELDS,
            false,
        );
        assert_eq!(
            out.root.text(),
            "class C { private int size; void M() { var w = new Widget { Size = 2 }; size = 1; } }"
        );
    }

    #[test]
    fn enum_members_are_not_constants_to_rename() {
        let source = "enum Mode { off, on }";
        let out = apply(source, RuleSet::PASCAL_CASE_CONSTANTS, false);
        assert_eq!(out.root.text(), source);
    }

    #[test]
    fn report_only_keeps_the_tree_and_lists_renames() {
        let source = "class C { void M() { int A = 1; int B = A; } }";
        let out = apply(source, RuleSet::CAMEL_CASE_LOCALS, true);
        assert_eq!(out.root.text(), source);
        assert_eq!(out.findings.len(), 2);
    }
}
