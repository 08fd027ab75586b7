//! End-to-end tests for the rewrite pipeline.
//!
//! Scenario tests pin down the behavior of individual rules on whole units;
//! the property tests generate synthetic classes and verify:
//! 1. Lossless: parse(text).text() == text
//! 2. Idempotence: tidy(tidy(code)) == tidy(code)
//! 3. Report-only never changes the tree

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tidy_csharp::{parse_unit, LexicalResolver, Mode, Options, Pipeline, PipelineOutcome, RuleSet};

fn tidy_with(source: &str, options: Options, mode: Mode) -> PipelineOutcome {
    let root = parse_unit(source).unwrap();
    Pipeline::new(&LexicalResolver, options).run(&root, mode).unwrap()
}

fn tidy(source: &str, rules: RuleSet) -> PipelineOutcome {
    tidy_with(source, Options::with_rules(rules), Mode::Apply)
}

fn in_method(statement: &str) -> String {
    format!("class C\n{{\n    void M()\n    {{\n        {statement}\n    }}\n}}\n")
}

// -- Chain flattening --

fn chain(name_len: usize, description_len: usize) -> String {
    format!(
        "builder.WithName(\"{}\").WithDescription(\"{}\").WithCount(42).Build();",
        "n".repeat(name_len),
        "d".repeat(description_len)
    )
}

#[test]
fn long_chain_is_split_over_lines() {
    let statement = chain(30, 37);
    assert_eq!(statement.len(), 130);

    let outcome = tidy(&in_method(&statement), RuleSet::FLATTEN_CHAINS);
    let expected = in_method(&format!(
        "builder.WithName(\"{}\")\n            .WithDescription(\"{}\")\n            .WithCount(42)\n            .Build();",
        "n".repeat(30),
        "d".repeat(37)
    ));
    assert_eq!(outcome.root.text(), expected);
    assert_eq!(outcome.report.len(), 1);
    assert_eq!(outcome.report.findings()[0].message, "expression should be multi-lined");
}

#[test]
fn short_chain_is_untouched() {
    let source = in_method(&chain(5, 5));
    let outcome = tidy(&source, RuleSet::FLATTEN_CHAINS);
    assert_eq!(outcome.root.text(), source);
    assert!(outcome.report.is_empty());
}

#[test]
fn chain_at_the_limit_is_untouched() {
    let statement = chain(20, 27);
    assert_eq!(statement.len(), 110);
    let source = in_method(&statement);
    assert_eq!(tidy(&source, RuleSet::FLATTEN_CHAINS).root.text(), source);
}

#[test]
fn flattening_twice_changes_nothing() {
    let once = tidy(&in_method(&chain(30, 37)), RuleSet::FLATTEN_CHAINS);
    let twice = tidy(&once.root.text(), RuleSet::FLATTEN_CHAINS);
    assert_eq!(twice.root.text(), once.root.text());
    assert!(twice.report.is_empty());
}

// -- Field declarations --

#[test]
fn default_initializer_is_removed_with_one_finding() {
    let outcome = tidy("class C { int count = 0; }", RuleSet::REMOVE_DEFAULT_INITIALIZERS);
    assert_eq!(outcome.root.text(), "class C { int count; }");
    assert_eq!(outcome.report.len(), 1);
}

#[test]
fn non_default_initializer_is_kept() {
    let source = "class C { int count = 1; }";
    let outcome = tidy(source, RuleSet::REMOVE_DEFAULT_INITIALIZERS);
    assert_eq!(outcome.root.text(), source);
    assert!(outcome.report.is_empty());
}

#[test]
fn merge_length_guard_keeps_long_groups_apart() {
    let mut options = Options::with_rules(RuleSet::MERGE_FIELD_DECLARATIONS);
    options.fields.max_declaration_length = 40;
    let source = "class C\n{\n    private int firstCounterValue;\n    private int secondCounterValue;\n}\n";

    let outcome = tidy_with(source, options, Mode::Apply);
    assert_eq!(outcome.root.text(), source);
    assert!(outcome.report.is_empty());
}

// -- Renaming --

#[test]
fn rename_falls_back_when_the_preferred_name_is_taken() {
    let outcome = tidy(
        "class C { void M() { int value = 1; int Value = 2; Use(value, Value); } }",
        RuleSet::CAMEL_CASE_LOCALS,
    );
    assert_eq!(
        outcome.root.text(),
        "class C { void M() { int value = 1; int _value = 2; Use(value, _value); } }"
    );
}

#[test]
fn rename_is_skipped_when_every_candidate_is_taken() {
    let source = "class C { void M() { int value = 1; int _value = 3; int Value = 2; Use(value, _value, Value); } }";
    let outcome = tidy(source, RuleSet::CAMEL_CASE_LOCALS);
    assert_eq!(outcome.root.text(), source);
    assert!(outcome.report.is_empty());
}

#[test]
fn rename_does_not_capture_a_field_reference() {
    let source = "class C\n{\n    int total;\n    int Sum(int[] items)\n    {\n        int Total = 0;\n        foreach (var item in items) Total += item;\n        return Total + total;\n    }\n}\n";
    let outcome = tidy(source, RuleSet::CAMEL_CASE_LOCALS);
    let text = outcome.root.text();

    assert!(text.contains("int _total = 0;"), "{text}");
    assert!(text.contains("return _total + total;"), "{text}");
}

#[test]
fn cross_pass_threading_keeps_names_consistent() {
    let source = "class Account\n{\n    private decimal Balance = 0m;\n    private decimal Limit = 100m;\n    public bool CanSpend(decimal amount)\n    {\n        decimal Remaining = Balance + Limit;\n        return Remaining >= amount;\n    }\n}\n";
    let outcome = tidy(source, RuleSet::defaults());

    assert_eq!(
        outcome.root.text(),
        "class Account\n{\n    private decimal balance, limit = 100m;\n    public bool CanSpend(decimal amount)\n    {\n        decimal remaining = balance + limit;\n        return remaining >= amount;\n    }\n}\n"
    );
}

#[test]
fn report_only_lists_every_rule_without_touching_the_tree() {
    let source = "class C\n{\n    private int Count = 0;\n    private class Inner { }\n}\n";
    let root = parse_unit(source).unwrap();
    let outcome = Pipeline::new(&LexicalResolver, Options::default())
        .run(&root, Mode::ReportOnly)
        .unwrap();

    assert!(outcome.root.ptr_eq(&root));
    let rules: Vec<_> = outcome.report.iter().map(|f| f.rule).collect();
    assert_eq!(
        rules,
        vec![
            "remove-private-nested-modifier",
            "remove-default-initializers",
            "camel-case-private-fields",
        ]
    );
}

// -- Code Generation Strategies --

/// One class member; `suffix` varies the names, `idx` keeps them unique.
fn member(kind: usize, suffix: &str, idx: usize) -> String {
    match kind {
        0 => format!("private int Vx{suffix}{idx} = 0;"),
        1 => format!("public string name{suffix}{idx};"),
        2 => format!("private int ax{suffix}{idx}, bx{suffix}{idx} = 1;"),
        3 => format!("const int kx{suffix}{idx} = 3;"),
        4 => format!("private class Nested{suffix}{idx} {{ private object Fx{idx} = null; }}"),
        5 => format!(
            "void Method{idx}() {{ int Lx{suffix}{idx} = 1; var sum{idx} = Lx{suffix}{idx} + 1; }}"
        ),
        6 => format!(
            "void Chain{idx}() {{ builder.WithName(\"{suffix}\").WithDescription(\"a fairly long description for chain {idx}\").WithCount({idx}).Build(); }}"
        ),
        _ => format!("// note {suffix}"),
    }
}

fn unit_strategy() -> impl Strategy<Value = String> {
    let members = prop::collection::vec(
        (0usize..8, prop::string::string_regex("[a-z0-9]{0,4}").expect("valid regex")),
        0..8,
    );
    (members, any::<bool>()).prop_map(|(members, crlf)| {
        let eol = if crlf { "\r\n" } else { "\n" };
        let mut unit = format!("class Sample{eol}{{{eol}");
        for (idx, (kind, suffix)) in members.iter().enumerate() {
            unit.push_str("    ");
            unit.push_str(&member(*kind, suffix, idx));
            unit.push_str(eol);
        }
        unit.push('}');
        unit.push_str(eol);
        unit
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn parse_is_lossless(source in unit_strategy()) {
        let root = parse_unit(&source).unwrap();
        prop_assert_eq!(root.text(), source);
    }

    #[test]
    fn tidying_is_idempotent(source in unit_strategy()) {
        let once = tidy(&source, RuleSet::all()).root.text();
        prop_assert!(parse_unit(&once).is_ok(), "rewrite broke the unit:\n{}", once);

        let twice = tidy(&once, RuleSet::all());
        prop_assert_eq!(twice.root.text(), once);
        prop_assert!(twice.report.is_empty());
    }

    #[test]
    fn report_only_never_changes_text(source in unit_strategy()) {
        let outcome = tidy_with(&source, Options::default(), Mode::ReportOnly);
        prop_assert_eq!(outcome.root.text(), source);
        prop_assert!(!outcome.changed);
    }

    #[test]
    fn no_rules_no_change(source in unit_strategy()) {
        let outcome = tidy(&source, RuleSet::empty());
        prop_assert_eq!(outcome.root.text(), source);
        prop_assert!(outcome.report.is_empty());
    }
}
