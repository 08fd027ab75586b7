//! Fluent call chains that make a statement too long are split so that
//! every call after the first starts its own line.

use crate::config::ChainOptions;
use crate::passes::{PassContext, PassError, PassOutput};
use crate::syntax::{rewrite_postorder, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, Trivia, TriviaKind};

const RULE: &str = "flatten-chains";

pub fn run(ctx: &PassContext<'_>) -> Result<PassOutput, PassError> {
    let mut findings = Vec::new();
    let options = &ctx.options.chains;

    let root = rewrite_postorder(ctx.root, &mut |node, offset| {
        if node.kind() != SyntaxKind::ExpressionStatement {
            return node;
        }
        match flatten_statement(&node, options) {
            Some(flat) => {
                let at = offset + node.first_token().map_or(0, SyntaxToken::leading_len);
                findings.push(ctx.finding(
                    RULE,
                    SyntaxKind::ExpressionStatement,
                    at,
                    "expression should be multi-lined",
                ));
                flat
            }
            None => node,
        }
    });

    Ok(ctx.output(root, findings))
}

/// The statement with its chain broken over lines, or `None` when it is
/// short enough or already laid out that way.
pub fn flatten_statement(statement: &SyntaxNode, options: &ChainOptions) -> Option<SyntaxNode> {
    if statement.trimmed_text().chars().count() <= options.max_statement_length {
        return None;
    }
    let (expr_idx, expr) = statement
        .slots()
        .iter()
        .enumerate()
        .find_map(|(idx, slot)| slot.element().as_node().map(|node| (idx, node)))?;

    let eol = line_ending(statement);
    let indent = format!("{}{}", indentation(statement), options.indent);

    let flattened = if expr.kind() == SyntaxKind::AssignmentExpression {
        let right_idx = expr
            .field_index("right")
            .or_else(|| expr.slots().iter().rposition(|s| s.element().as_node().is_some()))?;
        let right = expr.slots()[right_idx].element().as_node()?;
        expr.replace_slot(right_idx, flatten_chain(right, eol, &indent)?)
    } else {
        flatten_chain(expr, eol, &indent)?
    };

    let rebuilt = statement.replace_slot(expr_idx, flattened);
    (rebuilt.text() != statement.text()).then_some(rebuilt)
}

/// One `.Name(args)` call of a chain.
struct Link {
    invocation: SyntaxNode,
    function_slot: usize,
    access: SyntaxNode,
    target_slot: usize,
    dot_slot: usize,
}

impl Link {
    fn of(node: &SyntaxNode) -> Option<Self> {
        if node.kind() != SyntaxKind::InvocationExpression {
            return None;
        }
        let function_slot = node.field_index("function").unwrap_or(0);
        let access = node
            .slots()
            .get(function_slot)?
            .element()
            .as_node()
            .filter(|n| n.kind() == SyntaxKind::MemberAccessExpression)?;
        let dot_slot = access
            .slots()
            .iter()
            .position(|s| s.element().as_token().is_some_and(|t| t.is_punct(".")))?;
        let target_slot = access.field_index("expression").unwrap_or(0);
        if target_slot >= dot_slot {
            return None;
        }
        Some(Self {
            invocation: node.clone(),
            function_slot,
            access: access.clone(),
            target_slot,
            dot_slot,
        })
    }

    fn target(&self) -> &SyntaxElement {
        self.access.slots()[self.target_slot].element()
    }

    fn dot(&self) -> Option<&SyntaxToken> {
        self.access.slots()[self.dot_slot].element().as_token()
    }
}

/// Split `expr` into its base and its calls, outermost call first.
fn split_chain(expr: &SyntaxNode) -> (SyntaxElement, Vec<Link>) {
    let mut links = Vec::new();
    let mut current = SyntaxElement::Node(expr.clone());
    while let Some(link) = current.as_node().and_then(Link::of) {
        current = link.target().clone();
        links.push(link);
    }
    (current, links)
}

fn flatten_chain(expr: &SyntaxNode, eol: &str, indent: &str) -> Option<SyntaxNode> {
    let inner = expr.with_leading_trivia(Vec::new());
    if inner.has_comments() || inner.has_structured_trivia() {
        return None;
    }
    let (base, links) = split_chain(expr);
    if links.len() < 2 {
        return None;
    }

    let mut acc = base;
    for (idx, link) in links.iter().rev().enumerate() {
        let mut dot = link.dot()?.clone();
        if idx > 0 {
            acc = acc.without_trailing_trivia();
            dot = dot.with_leading_trivia(vec![
                Trivia::end_of_line(eol),
                Trivia::whitespace(indent),
            ]);
        }
        let access = link
            .access
            .replace_slot(link.target_slot, acc)
            .replace_slot(link.dot_slot, dot);
        acc = SyntaxElement::Node(link.invocation.replace_slot(link.function_slot, access));
    }
    acc.as_node().cloned()
}

/// Whitespace after the last line break of the statement's leading trivia.
fn indentation(statement: &SyntaxNode) -> String {
    let leading = statement.leading_trivia();
    let start = leading
        .iter()
        .rposition(|t| t.kind() == TriviaKind::EndOfLine)
        .map_or(0, |idx| idx + 1);
    leading[start..]
        .iter()
        .filter(|t| t.kind() == TriviaKind::Whitespace)
        .map(Trivia::text)
        .collect()
}

fn line_ending(statement: &SyntaxNode) -> &'static str {
    let crlf = statement
        .leading_trivia()
        .iter()
        .chain(statement.trailing_trivia())
        .find(|t| t.kind() == TriviaKind::EndOfLine)
        .is_some_and(|t| t.text() == "\r\n");
    if crlf {
        "\r\n"
    } else {
        "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, RuleSet};
    use crate::semantic::LexicalResolver;
    use crate::ts::parse_unit;
    use pretty_assertions::assert_eq;

    const LONG: &str = "class C\n{\n    void M()\n    {\n        builder.WithName(\"a fairly long name value\").WithDescription(\"a fairly long description value\").WithCount(42).Build();\n    }\n}\n";

    const FLAT: &str = "class C\n{\n    void M()\n    {\n        builder.WithName(\"a fairly long name value\")\n            .WithDescription(\"a fairly long description value\")\n            .WithCount(42)\n            .Build();\n    }\n}\n";

    fn apply(source: &str) -> PassOutput {
        let root = parse_unit(source).unwrap();
        let options = Options::with_rules(RuleSet::FLATTEN_CHAINS);
        let ctx = PassContext::new(&root, None, &options, false, &LexicalResolver);
        run(&ctx).unwrap()
    }

    #[test]
    fn long_chain_is_split_after_the_first_call() {
        let out = apply(LONG);
        assert_eq!(out.root.text(), FLAT);
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].message, "expression should be multi-lined");
        assert_eq!((out.findings[0].line, out.findings[0].column), (4, 8));
    }

    #[test]
    fn flattening_is_idempotent() {
        let out = apply(FLAT);
        assert_eq!(out.root.text(), FLAT);
        assert!(out.findings.is_empty());
    }

    #[test]
    fn short_statements_are_left_alone() {
        let source = "class C { void M() { builder.WithName(\"x\").Build(); } }";
        let out = apply(source);
        assert_eq!(out.root.text(), source);
        assert!(out.findings.is_empty());
    }

    #[test]
    fn assignments_keep_their_left_side() {
        let statement = "result = source.Where(item => item.IsActiveAndVisibleOnTheMainScreen).Select(item => item.DisplayNameWithSuffix).ToList();";
        assert!(statement.len() > 110);
        let source = format!("class C\n{{\n    void M()\n    {{\n        {statement}\n    }}\n}}\n");
        let out = apply(&source);
        assert_eq!(
            out.root.text(),
            "class C\n{\n    void M()\n    {\n        result = source.Where(item => item.IsActiveAndVisibleOnTheMainScreen)\n            .Select(item => item.DisplayNameWithSuffix)\n            .ToList();\n    }\n}\n"
        );
        assert_eq!(out.findings.len(), 1);
    }

    #[test]
    fn crlf_statements_break_with_crlf() {
        let out = apply(&LONG.replace('\n', "\r\n"));
        assert_eq!(out.root.text(), FLAT.replace('\n', "\r\n"));
    }

    #[test]
    fn chains_with_comments_are_skipped() {
        let source = LONG.replace(".WithCount(42)", "/* count */.WithCount(42)");
        let out = apply(&source);
        assert_eq!(out.root.text(), source);
    }
}
