//! Findings collected while processing a unit.

use crate::syntax::{LineIndex, SyntaxKind};
use serde::Serialize;
use std::fmt;

/// The node a finding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeRef {
    pub kind: SyntaxKind,
    /// Byte offset of the node's first token text in the pass input.
    pub offset: usize,
}

/// One thing a rule would change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Zero-based line.
    pub line: usize,
    /// Zero-based column, in characters.
    pub column: usize,
    pub message: String,
    /// Configuration key of the rule that produced the finding.
    pub rule: &'static str,
    pub node: NodeRef,
}

impl Finding {
    pub fn new(
        lines: &LineIndex,
        rule: &'static str,
        kind: SyntaxKind,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let position = lines.position(offset);
        Self {
            line: position.line,
            column: position.column,
            message: message.into(),
            rule,
            node: NodeRef { kind, offset },
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]",
            self.line + 1,
            self.column + 1,
            self.message,
            self.rule
        )
    }
}

/// Append-only list of findings, in the order passes produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    findings: Vec<Finding>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.findings.iter()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_zero_based_and_display_one_based() {
        let lines = LineIndex::new("class C\n{\n    int x = 0;\n}\n");
        let finding = Finding::new(&lines, "remove-default-initializers", SyntaxKind::VariableDeclarator, 18, "m");
        assert_eq!((finding.line, finding.column), (2, 8));
        assert_eq!(finding.to_string(), "3:9: m [remove-default-initializers]");
    }

    #[test]
    fn report_keeps_insertion_order_and_duplicates() {
        let lines = LineIndex::new("x");
        let finding = Finding::new(&lines, "flatten-chains", SyntaxKind::ExpressionStatement, 0, "a");
        let mut report = Report::new();
        report.push(finding.clone());
        report.extend([finding.clone()]);
        assert_eq!(report.len(), 2);
        assert_eq!(report.findings(), &[finding.clone(), finding]);
    }

    #[test]
    fn serializes_as_a_plain_list() {
        let lines = LineIndex::new("x");
        let mut report = Report::new();
        report.push(Finding::new(&lines, "flatten-chains", SyntaxKind::ExpressionStatement, 0, "a"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json[0]["rule"], "flatten-chains");
        assert_eq!(json[0]["node"]["kind"], "ExpressionStatement");
        assert_eq!(json[0]["line"], 0);
    }
}
