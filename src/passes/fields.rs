//! Field declaration cleanup: default initializer removal and merging of
//! declarations that share a type and modifiers.

use crate::config::RuleSet;
use crate::passes::modifiers::modifier_token;
use crate::passes::{PassContext, PassError, PassOutput};
use crate::report::Finding;
use crate::semantic::types::{is_zero_char_literal, is_zero_numeric_literal};
use crate::semantic::{normalize_type_name, BuiltinType, SemanticModel, SymbolKind, TypeKind};
use crate::syntax::{
    Slot, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TokenIndex, TokenKind, Trivia,
    TriviaKind,
};
use std::collections::{HashMap, HashSet};

const PASS: &str = "field-declarations";
const MERGE_RULE: &str = "merge-field-declarations";
const DEFAULT_RULE: &str = "remove-default-initializers";
const NULL_RULE: &str = "remove-null-initializers";

pub fn run(ctx: &PassContext<'_>) -> Result<PassOutput, PassError> {
    let model = ctx.model(PASS)?;
    let mut rewriter = FieldRewriter {
        ctx,
        model,
        findings: Vec::new(),
    };
    let root = rewriter.visit(ctx.root, 0, TokenIndex(0));
    Ok(ctx.output(root, rewriter.findings))
}

/// Normalized type name and sorted modifiers.
type GroupKey = (String, Vec<String>);

struct FieldMember {
    slot: usize,
    /// Offset of the declaration's first token text in the input.
    offset: usize,
    node: SyntaxNode,
}

struct Merge {
    slots: Vec<usize>,
    merged: SyntaxNode,
    offset: usize,
}

struct FieldRewriter<'c, 'a> {
    ctx: &'c PassContext<'a>,
    model: &'a SemanticModel,
    findings: Vec<Finding>,
}

impl FieldRewriter<'_, '_> {
    fn visit(&mut self, node: &SyntaxNode, offset: usize, first: TokenIndex) -> SyntaxNode {
        let mut changed = false;
        let mut slots = Vec::with_capacity(node.slots().len());

        for (idx, slot) in node.slots().iter().enumerate() {
            let SyntaxElement::Node(child) = slot.element() else {
                slots.push(slot.clone());
                continue;
            };
            let child_offset = node.slot_offset(offset, idx);
            let child_first = node.slot_token_start(first, idx);
            let new_child = if node.kind().has_field_members() && child.kind() == SyntaxKind::DeclarationList {
                self.body(child, child_offset, child_first)
            } else {
                self.visit(child, child_offset, child_first)
            };
            changed |= !new_child.ptr_eq(child);
            slots.push(slot.with_element(new_child));
        }

        if changed {
            node.with_slots(slots)
        } else {
            node.clone()
        }
    }

    fn body(&mut self, body: &SyntaxNode, offset: usize, first: TokenIndex) -> SyntaxNode {
        let mut changed = false;
        let mut slots = Vec::with_capacity(body.slots().len());
        let mut fields = Vec::new();

        for (idx, slot) in body.slots().iter().enumerate() {
            let SyntaxElement::Node(member) = slot.element() else {
                slots.push(slot.clone());
                continue;
            };
            let member_offset = body.slot_offset(offset, idx);
            let member_first = body.slot_token_start(first, idx);
            let updated = if member.kind() == SyntaxKind::FieldDeclaration {
                let updated = self.remove_defaults(member, member_offset, member_first);
                fields.push(FieldMember {
                    slot: idx,
                    offset: member_offset + member.first_token().map_or(0, SyntaxToken::leading_len),
                    node: updated.clone(),
                });
                updated
            } else {
                self.visit(member, member_offset, member_first)
            };
            changed |= !updated.ptr_eq(member);
            slots.push(slot.with_element(updated));
        }

        if self.ctx.rules().contains(RuleSet::MERGE_FIELD_DECLARATIONS) {
            let merges = self.merges(&fields);
            if let Some(first_merge) = merges.first() {
                self.findings.push(self.ctx.finding(
                    MERGE_RULE,
                    SyntaxKind::FieldDeclaration,
                    first_merge.offset,
                    "Field declarations can be merged into one line",
                ));
                slots = apply_merges(slots, &merges);
                changed = true;
            }
        }

        if changed {
            body.with_slots(slots)
        } else {
            body.clone()
        }
    }

    fn remove_defaults(&mut self, field: &SyntaxNode, offset: usize, first: TokenIndex) -> SyntaxNode {
        let rules = self.ctx.rules();
        if !rules.intersects(RuleSet::REMOVE_DEFAULT_INITIALIZERS | RuleSet::REMOVE_NULL_INITIALIZERS) {
            return field.clone();
        }
        if modifiers(field).iter().any(|m| m == "const") {
            return field.clone();
        }
        let Some(vd_idx) = declaration_slot(field) else {
            return field.clone();
        };
        let Some(declaration) = field.slots()[vd_idx].element().as_node() else {
            return field.clone();
        };
        let vd_offset = field.slot_offset(offset, vd_idx);
        let vd_first = field.slot_token_start(first, vd_idx);
        let Some(type_idx) = type_slot(declaration) else {
            return field.clone();
        };
        let type_element = declaration.slots()[type_idx].element();
        let field_type = self.classify_type(type_element, declaration.slot_token_start(vd_first, type_idx));
        let type_text = type_element.trimmed_text();

        let mut slots = declaration.slots().to_vec();
        let mut changed = false;
        for (idx, slot) in declaration.slots().iter().enumerate() {
            let Some(declarator) = slot.element().as_node().filter(|n| n.kind() == SyntaxKind::VariableDeclarator) else {
                continue;
            };
            let Some(init) = initializer(declarator) else {
                continue;
            };
            if declarator.slots()[init.start..init.end]
                .iter()
                .any(|s| has_annotations(s.element()))
            {
                continue;
            }
            let Some(rule) = removable(&classify_value(&init.value), &field_type, &type_text) else {
                continue;
            };
            let flag = if rule == NULL_RULE {
                RuleSet::REMOVE_NULL_INITIALIZERS
            } else {
                RuleSet::REMOVE_DEFAULT_INITIALIZERS
            };
            if !rules.contains(flag) {
                continue;
            }

            let at = declaration.slot_offset(vd_offset, idx) + declarator.first_token().map_or(0, SyntaxToken::leading_len);
            self.findings.push(self.ctx.finding(
                rule,
                SyntaxKind::VariableDeclarator,
                at,
                "Field initializer with a default value can be removed",
            ));
            slots[idx] = slot.with_element(drop_initializer(declarator, &init));
            changed = true;
        }

        if changed {
            field.replace_slot(vd_idx, declaration.with_slots(slots))
        } else {
            field.clone()
        }
    }

    /// What the declared type is, as far as zero values go. A name bound to a
    /// type of this unit wins over a built-in type of the same name.
    fn classify_type(&self, ty: &SyntaxElement, first: TokenIndex) -> FieldType {
        if ty.is_node(SyntaxKind::NullableType) || ty.trimmed_text().ends_with('?') {
            return FieldType::Nullable;
        }
        let token_count = match ty {
            SyntaxElement::Token(token) if token.kind() == TokenKind::PredefinedType => {
                return BuiltinType::from_name(token.text()).map_or(FieldType::Unknown, FieldType::Builtin);
            }
            SyntaxElement::Token(token) if token.is_identifier() => 1,
            SyntaxElement::Node(node) if node.kind() == SyntaxKind::QualifiedName => node.token_count(),
            _ => return FieldType::Unknown,
        };

        let last = TokenIndex(first.0 + token_count - 1);
        match self.model.binding(last) {
            Some(id) => {
                let symbol = self.model.symbol(id);
                match (symbol.kind, symbol.type_kind) {
                    (SymbolKind::Type, Some(TypeKind::Enum)) => FieldType::Enum,
                    (SymbolKind::Type, Some(kind)) if kind.is_reference() => FieldType::Reference,
                    (SymbolKind::Type, Some(_)) => FieldType::Value,
                    (SymbolKind::TypeParameter, _) => FieldType::TypeParameter,
                    _ => FieldType::Unknown,
                }
            }
            None => BuiltinType::from_name(&ty.trimmed_text()).map_or(FieldType::Unknown, FieldType::Builtin),
        }
    }

    fn merges(&self, fields: &[FieldMember]) -> Vec<Merge> {
        let mut groups: Vec<Vec<&FieldMember>> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();
        for member in fields {
            let Some(key) = group_key(&member.node) else {
                continue;
            };
            match index.get(&key) {
                Some(&group) => groups[group].push(member),
                None => {
                    index.insert(key, groups.len());
                    groups.push(vec![member]);
                }
            }
        }

        let max = self.ctx.options.fields.max_declaration_length;
        groups
            .into_iter()
            .filter(|members| members.len() > 1)
            .filter_map(|members| {
                let merged = build_merged(&members)?;
                let length = merged.trimmed_text().chars().count();
                if length > max {
                    tracing::debug!(length, max, "merged field declaration too long");
                    return None;
                }
                Some(Merge {
                    slots: members.iter().map(|m| m.slot).collect(),
                    merged,
                    offset: members[0].offset,
                })
            })
            .collect()
    }
}

/// The declared type's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Builtin(BuiltinType),
    Enum,
    Reference,
    Value,
    TypeParameter,
    Nullable,
    Unknown,
}

/// The literal an initializer spells.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InitialValue {
    Null,
    Zero,
    False,
    ZeroChar,
    /// The `default` literal.
    Default,
    /// `default(T)`.
    DefaultOf(String),
    Other,
}

/// Rule under which an initializer can be dropped, if any.
fn removable(value: &InitialValue, field_type: &FieldType, type_text: &str) -> Option<&'static str> {
    let rule = match value {
        // Code that compiles only assigns null to reference and nullable types.
        InitialValue::Null => NULL_RULE,
        InitialValue::Default => DEFAULT_RULE,
        InitialValue::DefaultOf(ty) if normalize_type_name(ty) == normalize_type_name(type_text) => DEFAULT_RULE,
        InitialValue::Zero => match field_type {
            FieldType::Builtin(ty) if ty.is_numeric() => DEFAULT_RULE,
            FieldType::Enum => DEFAULT_RULE,
            _ => return None,
        },
        InitialValue::False if *field_type == FieldType::Builtin(BuiltinType::Bool) => DEFAULT_RULE,
        InitialValue::ZeroChar if *field_type == FieldType::Builtin(BuiltinType::Char) => DEFAULT_RULE,
        _ => return None,
    };
    Some(rule)
}

fn classify_value(value: &SyntaxElement) -> InitialValue {
    if let SyntaxElement::Node(node) = value {
        if node.kind() == SyntaxKind::DefaultExpression {
            let text = node.trimmed_text();
            let inner = text
                .strip_prefix("default")
                .map(str::trim)
                .and_then(|rest| rest.strip_prefix('('))
                .and_then(|rest| rest.strip_suffix(')'));
            return match inner {
                Some(ty) => InitialValue::DefaultOf(ty.trim().to_string()),
                None if text == "default" => InitialValue::Default,
                None => InitialValue::Other,
            };
        }
    }

    let Some(token) = single_token(value) else {
        return InitialValue::Other;
    };
    let text = token.text();
    match token.kind() {
        TokenKind::NullLiteral => InitialValue::Null,
        TokenKind::IntegerLiteral | TokenKind::RealLiteral if is_zero_numeric_literal(text) => InitialValue::Zero,
        TokenKind::BooleanLiteral if text == "false" => InitialValue::False,
        TokenKind::CharacterLiteral if is_zero_char_literal(text) => InitialValue::ZeroChar,
        TokenKind::Keyword if text == "default" => InitialValue::Default,
        _ => InitialValue::Other,
    }
}

fn single_token(element: &SyntaxElement) -> Option<&SyntaxToken> {
    match element {
        SyntaxElement::Token(token) => Some(token),
        SyntaxElement::Node(node) if node.token_count() == 1 => node.first_token(),
        SyntaxElement::Node(_) => None,
    }
}

/// `= value` inside a declarator: slots `start..end`.
struct Initializer {
    start: usize,
    end: usize,
    value: SyntaxElement,
}

fn initializer(declarator: &SyntaxNode) -> Option<Initializer> {
    let slots = declarator.slots();
    if let Some(idx) = slots
        .iter()
        .position(|s| s.element().is_node(SyntaxKind::EqualsValueClause))
    {
        let clause = slots[idx].element().as_node()?;
        let value = clause.slots().last()?.element().clone();
        return Some(Initializer {
            start: idx,
            end: idx + 1,
            value,
        });
    }

    let equals = slots
        .iter()
        .position(|s| s.element().as_token().is_some_and(|t| t.is_punct("=")))?;
    let value = slots.get(equals + 1)?.element().clone();
    Some(Initializer {
        start: equals,
        end: equals + 2,
        value,
    })
}

/// `int count = 0` becomes `int count`: the initializer goes, along with the
/// spaces in front of it. Line breaks are kept.
fn drop_initializer(declarator: &SyntaxNode, init: &Initializer) -> SyntaxNode {
    let mut slots = declarator.slots()[..init.start].to_vec();
    let tail: Vec<Trivia> = init
        .value
        .last_token()
        .map(SyntaxToken::trailing_trivia)
        .filter(|trivia| trivia.iter().any(|t| t.kind() == TriviaKind::EndOfLine))
        .map_or_else(Vec::new, <[Trivia]>::to_vec);

    if let Some(last) = slots.last_mut() {
        let mut trailing: Vec<Trivia> = last
            .element()
            .last_token()
            .map_or_else(Vec::new, |t| t.trailing_trivia().to_vec());
        trailing.retain(|t| t.kind() != TriviaKind::Whitespace);
        trailing.extend(tail);
        *last = last.with_element(last.element().with_trailing_trivia(trailing));
    }
    slots.extend_from_slice(&declarator.slots()[init.end..]);
    declarator.with_slots(slots)
}

fn has_annotations(element: &SyntaxElement) -> bool {
    match element {
        SyntaxElement::Node(node) => node.has_comments() || node.has_structured_trivia(),
        SyntaxElement::Token(token) => token.has_comments() || token.has_structured_trivia(),
    }
}

fn modifiers(field: &SyntaxNode) -> Vec<String> {
    field
        .slots()
        .iter()
        .filter_map(modifier_token)
        .map(|token| token.text().to_string())
        .collect()
}

fn declaration_slot(field: &SyntaxNode) -> Option<usize> {
    field
        .slots()
        .iter()
        .position(|s| s.element().is_node(SyntaxKind::VariableDeclaration))
}

fn type_slot(declaration: &SyntaxNode) -> Option<usize> {
    declaration.field_index("type").or_else(|| {
        declaration
            .slots()
            .first()
            .filter(|s| !s.element().is_node(SyntaxKind::VariableDeclarator))
            .map(|_| 0)
    })
}

fn declarators(field: &SyntaxNode) -> Vec<SyntaxNode> {
    declaration_slot(field)
        .and_then(|idx| field.slots()[idx].element().as_node())
        .map(|declaration| {
            declaration
                .child_nodes()
                .filter(|n| n.kind() == SyntaxKind::VariableDeclarator)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Grouping key of a declaration that may take part in a merge.
fn group_key(field: &SyntaxNode) -> Option<GroupKey> {
    if field.child_nodes().any(|n| n.kind() == SyntaxKind::AttributeList) {
        return None;
    }
    if field.has_comments() || field.has_structured_trivia() {
        return None;
    }

    let declaration = field.slots()[declaration_slot(field)?].element().as_node()?;
    let ty = declaration.slots()[type_slot(declaration)?].element();
    let declarators = declarators(field);
    if declarators.is_empty() || !declarators.iter().all(is_simple_declarator) {
        return None;
    }

    let mut modifiers = modifiers(field);
    if modifiers.iter().any(|m| m == "fixed") {
        return None;
    }
    modifiers.sort();
    Some((normalize_type_name(&ty.trimmed_text()), modifiers))
}

/// A name, optionally followed by `= literal`.
fn is_simple_declarator(declarator: &SyntaxNode) -> bool {
    let named = declarator
        .slots()
        .first()
        .and_then(|s| s.element().as_token())
        .is_some_and(SyntaxToken::is_identifier);
    if !named {
        return false;
    }
    match initializer(declarator) {
        None => declarator.slots().len() == 1,
        Some(init) => {
            init.start == 1
                && init.end == declarator.slots().len()
                && single_token(&init.value).is_some_and(|t| t.kind().is_literal())
        }
    }
}

/// One declaration holding every declarator of the group: bare declarators
/// first, then initialized ones, each in original order.
fn build_merged(members: &[&FieldMember]) -> Option<SyntaxNode> {
    let first = &members.first()?.node;
    let vd_idx = declaration_slot(first)?;
    let declaration = first.slots()[vd_idx].element().as_node()?;

    let mut slots: Vec<Slot> = declaration
        .slots()
        .iter()
        .take_while(|s| !s.element().is_node(SyntaxKind::VariableDeclarator))
        .cloned()
        .collect();

    let (bare, initialized): (Vec<SyntaxNode>, Vec<SyntaxNode>) = members
        .iter()
        .flat_map(|m| declarators(&m.node))
        .partition(|d| initializer(d).is_none());

    for (idx, declarator) in bare.into_iter().chain(initialized).enumerate() {
        let declarator = declarator.without_trailing_trivia();
        if idx == 0 {
            slots.push(Slot::unnamed(declarator.with_leading_trivia(Vec::new())));
        } else {
            slots.push(Slot::unnamed(SyntaxToken::punct(",")));
            slots.push(Slot::unnamed(
                declarator.with_leading_trivia(vec![Trivia::whitespace(" ")]),
            ));
        }
    }

    Some(first.replace_slot(vd_idx, declaration.with_slots(slots)))
}

fn apply_merges(slots: Vec<Slot>, merges: &[Merge]) -> Vec<Slot> {
    let mut replaced: HashMap<usize, &SyntaxNode> = HashMap::new();
    let mut removed: HashSet<usize> = HashSet::new();
    for merge in merges {
        if let Some((&keep, rest)) = merge.slots.split_first() {
            replaced.insert(keep, &merge.merged);
            removed.extend(rest.iter().copied());
        }
    }

    slots
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !removed.contains(idx))
        .map(|(idx, slot)| match replaced.get(&idx) {
            Some(merged) => slot.with_element((*merged).clone()),
            None => slot,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::semantic::{LexicalResolver, SymbolResolver};
    use crate::ts::parse_unit;
    use pretty_assertions::assert_eq;

    fn apply_with(source: &str, options: &Options) -> PassOutput {
        let root = parse_unit(source).unwrap();
        let model = LexicalResolver.resolve(&root).unwrap();
        let ctx = PassContext::new(&root, Some(&model), options, false, &LexicalResolver);
        run(&ctx).unwrap()
    }

    fn apply(source: &str, rules: RuleSet) -> PassOutput {
        apply_with(source, &Options::with_rules(rules))
    }

    #[test]
    fn zero_initializer_is_removed_with_its_spacing() {
        let out = apply("class C { int count = 0; }", RuleSet::REMOVE_DEFAULT_INITIALIZERS);
        assert_eq!(out.root.text(), "class C { int count; }");
        assert_eq!(out.findings.len(), 1);
        assert_eq!(
            out.findings[0].message,
            "Field initializer with a default value can be removed"
        );
        assert_eq!(out.findings[0].column, 14);
    }

    #[test]
    fn non_default_values_and_constants_stay() {
        let source = "class C { int count = 1; const int Zero = 0; bool on = true; }";
        let out = apply(source, RuleSet::REMOVE_DEFAULT_INITIALIZERS);
        assert_eq!(out.root.text(), source);
        assert!(out.findings.is_empty());
    }

    #[test]
    fn defaults_follow_the_declared_type() {
        let out = apply(
            "class C { bool on = false; char c = '\\0'; System.Int64 big = 0L; decimal d = 0m; \
             string name = default; Widget w = default(Widget); int other = default(long); }",
            RuleSet::REMOVE_DEFAULT_INITIALIZERS,
        );
        assert_eq!(
            out.root.text(),
            "class C { bool on; char c; System.Int64 big; decimal d; \
             string name; Widget w; int other = default(long); }"
        );
        assert_eq!(out.findings.len(), 6);
    }

    #[test]
    fn user_type_shadowing_a_builtin_keeps_its_initializer() {
        let source = "struct Int32 { public static implicit operator Int32(int v) => default; } \
                      class C { Int32 count = 0; }";
        let out = apply(source, RuleSet::REMOVE_DEFAULT_INITIALIZERS);
        assert!(out.root.text().contains("Int32 count = 0;"));
    }

    #[test]
    fn enum_fields_accept_zero() {
        let out = apply(
            "enum Mode { Off } class C { Mode mode = 0; }",
            RuleSet::REMOVE_DEFAULT_INITIALIZERS,
        );
        assert!(out.root.text().contains("Mode mode;"));
    }

    #[test]
    fn null_removal_has_its_own_switch() {
        let source = "class C { string name = null; int? n = null; }";
        let out = apply(source, RuleSet::REMOVE_DEFAULT_INITIALIZERS);
        assert_eq!(out.root.text(), source);

        let out = apply(source, RuleSet::REMOVE_NULL_INITIALIZERS);
        assert_eq!(out.root.text(), "class C { string name; int? n; }");
        assert!(out.findings.iter().all(|f| f.rule == "remove-null-initializers"));
    }

    #[test]
    fn commented_initializers_are_kept() {
        let source = "class C { int count = /* start */ 0; }";
        let out = apply(source, RuleSet::REMOVE_DEFAULT_INITIALIZERS);
        assert_eq!(out.root.text(), source);
    }

    #[test]
    fn same_type_and_modifiers_merge() {
        let source = "class C\n{\n    private int a = 1;\n    private Int32 b;\n    public int c;\n    private int d;\n}\n";
        let out = apply(source, RuleSet::MERGE_FIELD_DECLARATIONS);
        assert_eq!(
            out.root.text(),
            "class C\n{\n    private int b, d, a = 1;\n    public int c;\n}\n"
        );
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].message, "Field declarations can be merged into one line");
        assert_eq!((out.findings[0].line, out.findings[0].column), (2, 4));
    }

    #[test]
    fn merge_respects_the_length_limit() {
        let mut options = Options::with_rules(RuleSet::MERGE_FIELD_DECLARATIONS);
        options.fields.max_declaration_length = 40;
        let short = "class C { private int first; private int second; }";
        let out = apply_with(short, &options);
        assert_eq!(out.root.text(), "class C { private int first, second; }");

        let long = "class C { private int firstRatherLongName; private int secondRatherLongName; }";
        let out = apply_with(long, &options);
        assert_eq!(out.root.text(), long);
        assert!(out.findings.is_empty());
    }

    #[test]
    fn attributes_comments_and_single_declarations_block_merging() {
        let source = "class C {\n    [Obsolete] int a;\n    int b; // kept\n    int c;\n    string s;\n}";
        let out = apply(source, RuleSet::MERGE_FIELD_DECLARATIONS);
        assert_eq!(out.root.text(), source);
        assert!(out.findings.is_empty());
    }

    #[test]
    fn nested_types_are_merged_separately() {
        let out = apply(
            "class Outer { int a; int b; class Inner { int c; int d; } }",
            RuleSet::MERGE_FIELD_DECLARATIONS,
        );
        assert_eq!(out.root.text(), "class Outer { int a, b; class Inner { int c, d; } }");
        assert_eq!(out.findings.len(), 2);
    }

    #[test]
    fn report_only_leaves_the_tree_alone() {
        let root = parse_unit("class C { int a = 0; int b; }").unwrap();
        let model = LexicalResolver.resolve(&root).unwrap();
        let options = Options::default();
        let ctx = PassContext::new(&root, Some(&model), &options, true, &LexicalResolver);
        let out = run(&ctx).unwrap();
        assert!(out.root.ptr_eq(&root));
        assert_eq!(out.findings.len(), 2);
    }

    #[test]
    fn missing_model_is_an_error() {
        let root = parse_unit("class C { }").unwrap();
        let options = Options::default();
        let ctx = PassContext::new(&root, None, &options, false, &LexicalResolver);
        assert!(matches!(run(&ctx), Err(PassError::MissingModel { .. })));
    }
}
