use super::ast::*;
use super::parse_to_ast;

fn parse(script: &str) -> ProgramData {
    parse_to_ast(script).unwrap_or_else(|e| panic!("parse failed: {}", e))
}

fn only_statement(script: &str) -> StatementType {
    let mut program = parse(script);
    assert_eq!(program.body.len(), 1, "expected one statement");
    program.body.pop().unwrap()
}

fn only_expression(script: &str) -> ExpressionType {
    match only_statement(script) {
        StatementType::ExpressionStatement { expression, .. } => expression,
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_number_literals() {
    match only_expression("x = 42;") {
        ExpressionType::AssignmentExpression { right, .. } => match *right {
            ExpressionType::Literal(LiteralData {
                value: LiteralType::NumberLiteral(n),
                ..
            }) => assert_eq!(n, 42.0),
            other => panic!("unexpected rhs {:?}", other),
        },
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn test_float_and_exponent_literals() {
    if let ExpressionType::Literal(LiteralData {
        value: LiteralType::NumberLiteral(n),
        ..
    }) = only_expression("1.5e2;")
    {
        assert_eq!(n, 150.0);
    } else {
        panic!("expected a number literal");
    }
}

#[test]
fn test_string_literals_and_escapes() {
    if let ExpressionType::Literal(LiteralData {
        value: LiteralType::StringLiteral(s),
        ..
    }) = only_expression("'a\\nb';")
    {
        assert_eq!(s, "a\nb");
    } else {
        panic!("expected a string literal");
    }
}

#[test]
fn test_double_quoted_strings() {
    if let ExpressionType::Literal(LiteralData {
        value: LiteralType::StringLiteral(s),
        ..
    }) = only_expression("\"hello\";")
    {
        assert_eq!(s, "hello");
    } else {
        panic!("expected a string literal");
    }
}

#[test]
fn test_keyword_literals() {
    assert!(matches!(
        only_expression("true;"),
        ExpressionType::Literal(LiteralData {
            value: LiteralType::BooleanLiteral(true),
            ..
        })
    ));
    assert!(matches!(
        only_expression("null;"),
        ExpressionType::Literal(LiteralData {
            value: LiteralType::NullLiteral,
            ..
        })
    ));
    assert!(matches!(
        only_expression("undefined;"),
        ExpressionType::Literal(LiteralData {
            value: LiteralType::UndefinedLiteral,
            ..
        })
    ));
}

#[test]
fn test_identifiers_with_keyword_prefixes() {
    assert!(matches!(
        only_expression("newish;"),
        ExpressionType::Identifier(IdentifierData { ref name, .. }) if name == "newish"
    ));
}

// ============================================================================
// Operators and precedence
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    match only_expression("1 + 2 * 3;") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn test_comparison_chains() {
    assert!(matches!(
        only_expression("i < 3;"),
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::LessThan,
            ..
        }
    ));
    assert!(matches!(
        only_expression("a === b;"),
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::StrictlyEqual,
            ..
        }
    ));
}

#[test]
fn test_logical_operators() {
    assert!(matches!(
        only_expression("a && b || c;"),
        ExpressionType::LogicalExpression {
            operator: LogicalOperator::Or,
            ..
        }
    ));
}

#[test]
fn test_unary_and_postfix() {
    assert!(matches!(
        only_expression("-x;"),
        ExpressionType::UnaryExpression {
            operator: UnaryOperator::Minus,
            ..
        }
    ));
    assert!(matches!(
        only_expression("typeof x;"),
        ExpressionType::UnaryExpression {
            operator: UnaryOperator::TypeOf,
            ..
        }
    ));
    assert!(matches!(
        only_expression("i++;"),
        ExpressionType::UpdateExpression {
            operator: UpdateOperator::PlusPlus,
            prefix: false,
            ..
        }
    ));
}

#[test]
fn test_conditional_expression() {
    assert!(matches!(
        only_expression("a ? 1 : 2;"),
        ExpressionType::ConditionalExpression { .. }
    ));
}

#[test]
fn test_compound_assignment() {
    assert!(matches!(
        only_expression("x += 1;"),
        ExpressionType::AssignmentExpression {
            operator: AssignmentOperator::AddEquals,
            ..
        }
    ));
}

#[test]
fn test_sequence_expression() {
    match only_expression("a = 1, b = 2;") {
        ExpressionType::SequenceExpression { expressions, .. } => {
            assert_eq!(expressions.len(), 2)
        }
        other => panic!("unexpected expression {:?}", other),
    }
}

// ============================================================================
// Members, calls and new
// ============================================================================

#[test]
fn test_member_chain() {
    match only_expression("a.b[c];") {
        ExpressionType::MemberExpression {
            object, property, ..
        } => {
            assert!(matches!(property, MemberProperty::Computed(_)));
            assert!(matches!(
                *object,
                ExpressionType::MemberExpression {
                    property: MemberProperty::Identifier(_),
                    ..
                }
            ));
        }
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn test_call_with_member_callee() {
    match only_expression("obj.foo(1, 2);") {
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 2);
            assert!(matches!(*callee, ExpressionType::MemberExpression { .. }));
        }
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn test_chained_calls() {
    match only_expression("foo()();") {
        ExpressionType::CallExpression { callee, .. } => {
            assert!(matches!(*callee, ExpressionType::CallExpression { .. }))
        }
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn test_new_expression() {
    match only_expression("new Point(1, 2);") {
        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 2);
            assert!(matches!(*callee, ExpressionType::Identifier(_)));
        }
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn test_this_member() {
    match only_expression("this.x = 1;") {
        ExpressionType::AssignmentExpression { left, .. } => match *left {
            ExpressionType::MemberExpression { object, .. } => {
                assert!(matches!(*object, ExpressionType::ThisExpression { .. }))
            }
            other => panic!("unexpected target {:?}", other),
        },
        other => panic!("unexpected expression {:?}", other),
    }
}

// ============================================================================
// Literals: arrays and objects
// ============================================================================

#[test]
fn test_array_literal() {
    match only_expression("[1, 2, 3];") {
        ExpressionType::ArrayExpression { elements, .. } => assert_eq!(elements.len(), 3),
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn test_object_literal_keys() {
    match only_expression("x = { a: 1, 'b c': 2 };") {
        ExpressionType::AssignmentExpression { right, .. } => match *right {
            ExpressionType::ObjectExpression { properties, .. } => {
                assert_eq!(properties[0].key, "a");
                assert_eq!(properties[1].key, "b c");
            }
            other => panic!("unexpected rhs {:?}", other),
        },
        other => panic!("unexpected expression {:?}", other),
    }
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_variable_statement() {
    match only_statement("var a = 1, b;") {
        StatementType::VariableDeclaration(decl) => {
            assert_eq!(decl.declarations.len(), 2);
            assert_eq!(decl.declarations[0].id.name, "a");
            assert!(decl.declarations[0].init.is_some());
            assert!(decl.declarations[1].init.is_none());
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_function_declaration() {
    match only_statement("function foo(a, b) { return a; }") {
        StatementType::FunctionDeclaration(f) => {
            assert_eq!(f.id.as_ref().unwrap().name, "foo");
            assert_eq!(f.params.len(), 2);
            assert_eq!(f.body.body.len(), 1);
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_function_expression_without_name() {
    match only_statement("var f = function (a) {};") {
        StatementType::VariableDeclaration(decl) => {
            match decl.declarations[0].init.as_ref().unwrap() {
                ExpressionType::FunctionExpression(f) => {
                    assert!(f.id.is_none());
                    assert_eq!(f.params.len(), 1);
                }
                other => panic!("unexpected initializer {:?}", other),
            }
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_if_else_binds_to_nearest_if() {
    match only_statement("if (a) if (b) x = 1; else x = 2;") {
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            assert!(alternate.is_none());
            assert!(matches!(
                *consequent,
                StatementType::IfStatement {
                    alternate: Some(_),
                    ..
                }
            ));
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_for_statement_clauses() {
    match only_statement("for (var i = 0; i < 3; i++) { x = i; }") {
        StatementType::ForStatement {
            init,
            test,
            update,
            ..
        } => {
            assert!(matches!(init, Some(ForInit::VariableDeclaration(_))));
            assert!(test.is_some());
            assert!(update.is_some());
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_for_statement_empty_clauses() {
    match only_statement("for (;;) { x = 1; }") {
        StatementType::ForStatement {
            init,
            test,
            update,
            ..
        } => {
            assert!(init.is_none());
            assert!(test.is_none());
            assert!(update.is_none());
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_while_and_debugger_statements() {
    let program = parse("while (a) { b(); }\ndebugger;");
    assert!(matches!(
        program.body[0],
        StatementType::WhileStatement { .. }
    ));
    assert!(matches!(
        program.body[1],
        StatementType::DebuggerStatement { .. }
    ));
}

#[test]
fn test_return_without_argument() {
    let program = parse("function f() { return; }");
    match &program.body[0] {
        StatementType::FunctionDeclaration(f) => {
            assert!(matches!(
                f.body.body[0],
                StatementType::ReturnStatement { argument: None, .. }
            ));
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

// ============================================================================
// Source positions and comments
// ============================================================================

#[test]
fn test_line_numbers_are_one_based() {
    let program = parse("x = 1;\ny = 2;\n\nz = 3;");
    let lines: Vec<u32> = program
        .body
        .iter()
        .map(|s| s.get_meta().start_line)
        .collect();
    assert_eq!(lines, vec![1, 2, 4]);
}

#[test]
fn test_function_body_end_line() {
    let program = parse("function foo() {\n    x = 1;\n}");
    match &program.body[0] {
        StatementType::FunctionDeclaration(f) => assert_eq!(f.body.meta.end_line, 3),
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_comments_are_skipped() {
    let program = parse("// leading\nx = 1; /* inline */ y = 2;");
    assert_eq!(program.body.len(), 2);
    assert_eq!(program.body[0].get_meta().start_line, 2);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_semicolon_is_an_error() {
    assert!(parse_to_ast("x = 1").is_err());
}

#[test]
fn test_unbalanced_parens_are_an_error() {
    assert!(parse_to_ast("foo(1;").is_err());
}

#[test]
fn test_keyword_as_identifier_is_an_error() {
    assert!(parse_to_ast("var for = 1;").is_err());
}
