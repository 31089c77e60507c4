//! End-to-end pipeline tests over the public API

use ccheck::config::{Settings, SuppressionSpec};
use ccheck::core::Severity;
use ccheck::runner::{analyze_source, run_files};
use ccheck::suppress::DiagnosticSink;
use ccheck::Diagnostic;
use std::path::Path;

fn analyze(source: &str, settings: &Settings) -> Vec<Diagnostic> {
    let sink = DiagnosticSink::new();
    analyze_source(Path::new("input.c"), source, settings, &sink);
    sink.into_reported()
}

#[test]
fn test_null_dereference_found() {
    let source = "\
void f() {
    int *p = 0;
    *p = 5;
}
";
    let diagnostics = analyze(source, &Settings::default());
    assert_eq!(diagnostics.len(), 1, "got: {diagnostics:?}");
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.rule_id, "nullPointer");
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.message, "Null pointer dereference: p");
    assert_eq!(diagnostic.primary_location().line, 3);
}

#[test]
fn test_inline_suppression_silences_the_next_line() {
    let source = "\
void f() {
    int *p = 0;
    // ccheck-suppress nullPointer
    *p = 5;
}
";
    let diagnostics = analyze(source, &Settings::default());
    assert!(diagnostics.is_empty(), "got: {diagnostics:?}");
}

#[test]
fn test_trailing_suppression_applies_to_its_own_line() {
    let source = "\
void f() {
    int *p = 0;
    *p = 5; // ccheck-suppress nullPointer
}
";
    let diagnostics = analyze(source, &Settings::default());
    assert!(diagnostics.is_empty(), "got: {diagnostics:?}");
}

#[test]
fn test_block_suppression() {
    let source = "\
void f(int x) {
    int y;
    // ccheck-suppress-begin zerodiv
    y = x / 0;
    y = x % 0;
    // ccheck-suppress-end zerodiv
    use(y);
}
";
    let diagnostics = analyze(source, &Settings::default());
    assert!(diagnostics.iter().all(|d| d.rule_id != "zerodiv"));
}

#[test]
fn test_unmatched_brace_gives_exactly_one_syntax_error() {
    let source = "\
void f() {
    int *p = 0;
    *p = 5;
";
    let diagnostics = analyze(source, &Settings::default());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule_id, "syntaxError");
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].primary_location().line, 1);
}

#[test]
fn test_duplicate_findings_collapse_in_the_sink() {
    let source = "void f() { int *p = 0; *p = 5; }";
    let sink = DiagnosticSink::new();
    let settings = Settings::default();
    analyze_source(Path::new("input.c"), source, &settings, &sink);
    analyze_source(Path::new("input.c"), source, &settings, &sink);
    assert_eq!(sink.into_reported().len(), 1);
}

#[test]
fn test_shadowing_reported_with_related_location() {
    let source = "\
void f() {
    int count = 0;
    {
        int count = 1;
        use(count);
    }
    use(count);
}
";
    let diagnostics = analyze(source, &Settings::default());
    let shadow: Vec<&Diagnostic> = diagnostics
        .iter()
        .filter(|d| d.rule_id == "shadowVariable")
        .collect();
    assert_eq!(shadow.len(), 1);
    assert_eq!(shadow[0].primary_location().line, 4);
    assert_eq!(shadow[0].locations[1].line, 2);
}

#[test]
fn test_typedef_and_template_normalization_feed_the_checks() {
    let source = "\
typedef int myint;
void f() {
    myint z = 0;
    myint y;
    y = 10 / z;
    use(y);
}
";
    let diagnostics = analyze(source, &Settings::default());
    assert!(diagnostics.iter().any(|d| d.rule_id == "zerodiv"));
}

#[test]
fn test_configured_file_scoped_suppression() {
    let settings = Settings {
        suppressions: vec![SuppressionSpec {
            rule: "*".into(),
            file: Some("input.c".into()),
            line: None,
        }],
        ..Settings::default()
    };
    let diagnostics = analyze("void f() { int *p = 0; *p = 5; }", &settings);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_parallel_and_sequential_runs_agree() {
    let dir = std::env::temp_dir().join(format!("ccheck_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let sources = [
        ("one.c", "void f() { int *p = 0; *p = 1; }"),
        ("two.c", "void g() { int x; int y = x; use(y); }"),
        ("three.c", "void h(int a) { int b; b = a / 0; use(b); }"),
        ("four.c", "void k() { int unused_val = 7; }"),
    ];
    let mut paths = Vec::new();
    for (name, source) in sources {
        let path = dir.join(name);
        std::fs::write(&path, source).unwrap();
        paths.push(path);
    }
    let settings = Settings::default();

    let parallel = run_files(&paths, &settings);

    let sink = DiagnosticSink::new();
    for path in &paths {
        let source = std::fs::read_to_string(path).unwrap();
        analyze_source(path, &source, &settings, &sink);
    }
    let sequential = sink.into_reported();

    assert_eq!(parallel, sequential);
    assert_eq!(parallel.len(), 4);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_multiple_rules_in_one_file() {
    let source = "\
void f(int n) {
    int *p = 0;
    int x;
    int dead = 3;
    *p = x / 0;
}
";
    let diagnostics = analyze(source, &Settings::default());
    let rules: Vec<&str> = diagnostics.iter().map(|d| d.rule_id.as_str()).collect();
    assert!(rules.contains(&"nullPointer"), "got: {rules:?}");
    assert!(rules.contains(&"uninitvar"), "got: {rules:?}");
    assert!(rules.contains(&"zerodiv"), "got: {rules:?}");
    assert!(rules.contains(&"unreadVariable"), "got: {rules:?}");
}

#[test]
fn test_severity_filter_end_to_end() {
    let settings = Settings {
        enabled: vec![Severity::Error],
        ..Settings::default()
    };
    let source = "\
void f() {
    int dead = 3;
    int *p = 0;
    *p = 5;
}
";
    let diagnostics = analyze(source, &settings);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule_id, "nullPointer");
}
