use std::collections::HashSet;

use crate::parser::parse_to_ast;

use super::code::VarKind;
use super::naming::stringify_reference;
use super::{compile, scope, CompileError, CompileOptions};

fn names(list: &[&str]) -> HashSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn analyze(script: &str, excluded: &[&str]) -> Vec<(String, VarKind)> {
    let program = parse_to_ast(script).unwrap();
    let excluded = names(excluded);
    scope::analyze_body(&[], &program.body, Some(&excluded))
        .into_iter()
        .map(|v| (v.name, v.kind))
        .collect()
}

// ============================================================================
// Scope analyzer
// ============================================================================

#[test]
fn test_collects_var_declarations() {
    assert_eq!(
        analyze("var a = 1;\nvar b, c;", &[]),
        vec![
            ("a".to_string(), VarKind::Local),
            ("b".to_string(), VarKind::Local),
            ("c".to_string(), VarKind::Local),
        ]
    );
}

#[test]
fn test_collects_function_declarations() {
    assert_eq!(
        analyze("function f() {}\nvar a;", &[]),
        vec![
            ("f".to_string(), VarKind::Local),
            ("a".to_string(), VarKind::Local),
        ]
    );
}

#[test]
fn test_collects_through_nested_blocks_and_loops() {
    let vars = analyze(
        "if (a) {\n    var b;\n} else {\n    var c;\n}\nwhile (a) {\n    var d;\n}\nfor (var e = 0; e < 1; e++) {\n    var f;\n}",
        &[],
    );
    let names: Vec<&str> = vars.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["b", "c", "d", "e", "f"]);
}

#[test]
fn test_does_not_descend_into_nested_functions() {
    let vars = analyze("var a;\nfunction f() {\n    var inner;\n}", &[]);
    let names: Vec<&str> = vars.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["a", "f"]);
}

#[test]
fn test_excludes_context_names() {
    assert_eq!(
        analyze("var x, a;", &["x"]),
        vec![("a".to_string(), VarKind::Local)]
    );
}

#[test]
fn test_deduplicates_redeclarations() {
    assert_eq!(
        analyze("var a;\nvar a = 1;", &[]),
        vec![("a".to_string(), VarKind::Local)]
    );
}

// ============================================================================
// Naming
// ============================================================================

fn first_expression(script: &str) -> crate::parser::ast::ExpressionType {
    let mut program = parse_to_ast(script).unwrap();
    match program.body.pop().unwrap() {
        crate::parser::ast::StatementType::ExpressionStatement { expression, .. } => expression,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_stringify_identifier_and_member_paths() {
    assert_eq!(stringify_reference(&first_expression("a;")).unwrap(), "a");
    assert_eq!(
        stringify_reference(&first_expression("a.b.c;")).unwrap(),
        "a.b.c"
    );
    assert_eq!(
        stringify_reference(&first_expression("this.x;")).unwrap(),
        "this.x"
    );
}

#[test]
fn test_stringify_rejects_computed_members() {
    assert!(stringify_reference(&first_expression("a[0];")).is_err());
}

// ============================================================================
// Compile entry
// ============================================================================

#[test]
fn test_compile_smoke() {
    let program = compile("x = 1;", &names(&["x"]), &CompileOptions::default()).unwrap();
    assert_eq!(program.root.name, super::PROGRAM);
    assert_eq!(program.root.depth, 0);
}

#[test]
fn test_compile_propagates_parse_errors() {
    let err = compile("x = ;", &names(&["x"]), &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
}

#[test]
fn test_anonymous_function_marker() {
    let program = compile(
        "print(function () {});",
        &names(&["print"]),
        &CompileOptions::default(),
    )
    .unwrap();
    let listing = program.listing();
    assert!(listing.contains("<anonymous>"));
}
