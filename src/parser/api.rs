//! Pest-backed parser producing the AST of [`super::ast`].

use std::collections::HashMap;

use pest::error::{Error, ErrorVariant};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::ast::*;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

lazy_static! {
    static ref ESCAPES: HashMap<char, char> = {
        let mut m = HashMap::new();
        m.insert('n', '\n');
        m.insert('t', '\t');
        m.insert('r', '\r');
        m.insert('0', '\0');
        m.insert('b', '\u{0008}');
        m.insert('f', '\u{000C}');
        m.insert('v', '\u{000B}');
        m
    };
}

pub fn parse_to_ast(script: &str) -> Result<ProgramData, Error<Rule>> {
    let mut pairs = JsParser::parse(Rule::program, script)?;
    let program_pair = pairs.next().unwrap();
    let meta = meta_from_pair(&program_pair);
    let mut body = vec![];
    for pair in program_pair.into_inner() {
        match pair.as_rule() {
            Rule::statement => body.push(build_ast_from_statement(pair)?),
            Rule::EOI => { /* Do nothing */ }
            _ => return Err(get_unexpected_error(1, &pair)),
        }
    }
    Ok(ProgramData { meta, body })
}

fn meta_from_pair(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta::new(
        span.start(),
        span.end(),
        span.start_pos().line_col().0 as u32,
        span.end_pos().line_col().0 as u32,
    )
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

fn build_ast_from_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let inner_pair = pair.into_inner().next().unwrap();
    Ok(match inner_pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement(build_ast_from_block(inner_pair)?),
        Rule::variable_statement => {
            StatementType::VariableDeclaration(build_ast_from_variable_declaration(inner_pair)?)
        }
        Rule::function_declaration => {
            StatementType::FunctionDeclaration(build_ast_from_function(inner_pair)?)
        }
        Rule::if_statement => build_ast_from_if_statement(inner_pair)?,
        Rule::while_statement => build_ast_from_while_statement(inner_pair)?,
        Rule::for_statement => build_ast_from_for_statement(inner_pair)?,
        Rule::return_statement => {
            let meta = meta_from_pair(&inner_pair);
            let mut argument = None;
            for p in inner_pair.into_inner() {
                if p.as_rule() == Rule::expression {
                    argument = Some(build_ast_from_expression(p)?);
                }
            }
            StatementType::ReturnStatement { meta, argument }
        }
        Rule::debugger_statement => StatementType::DebuggerStatement {
            meta: meta_from_pair(&inner_pair),
        },
        Rule::empty_statement => StatementType::EmptyStatement {
            meta: meta_from_pair(&inner_pair),
        },
        Rule::expression_statement => {
            let meta = meta_from_pair(&inner_pair);
            let expr_pair = inner_pair.into_inner().next().unwrap();
            StatementType::ExpressionStatement {
                meta,
                expression: build_ast_from_expression(expr_pair)?,
            }
        }
        _ => return Err(get_unexpected_error(2, &inner_pair)),
    })
}

fn build_ast_from_block(pair: Pair<Rule>) -> Result<BlockStatementData, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut body = vec![];
    for p in pair.into_inner() {
        body.push(build_ast_from_statement(p)?);
    }
    Ok(BlockStatementData { meta, body })
}

fn build_ast_from_variable_declaration(
    pair: Pair<Rule>,
) -> Result<VariableDeclarationData, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut declarations = vec![];
    for p in pair.into_inner() {
        if p.as_rule() == Rule::variable_declaration {
            declarations.push(build_ast_from_declarator(p)?);
        }
    }
    Ok(VariableDeclarationData { meta, declarations })
}

fn build_ast_from_declarator(pair: Pair<Rule>) -> Result<VariableDeclaratorData, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let id_pair = pair_iter.next().unwrap();
    let id = IdentifierData {
        meta: meta_from_pair(&id_pair),
        name: id_pair.as_str().to_string(),
    };
    let init = match pair_iter.next() {
        Some(init_pair) => Some(build_ast_from_assignment_expression(
            init_pair.into_inner().next().unwrap(),
        )?),
        None => None,
    };
    Ok(VariableDeclaratorData { meta, id, init })
}

fn build_ast_from_function(pair: Pair<Rule>) -> Result<FunctionData, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut id = None;
    let mut params = vec![];
    let mut body = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::kw_function => {}
            Rule::identifier => {
                id = Some(IdentifierData {
                    meta: meta_from_pair(&p),
                    name: p.as_str().to_string(),
                });
            }
            Rule::formal_parameters => {
                for param in p.into_inner() {
                    params.push(IdentifierData {
                        meta: meta_from_pair(&param),
                        name: param.as_str().to_string(),
                    });
                }
            }
            Rule::function_body => {
                let block_meta = meta_from_pair(&p);
                let mut statements = vec![];
                for s in p.into_inner() {
                    statements.push(build_ast_from_statement(s)?);
                }
                body = Some(BlockStatementData {
                    meta: block_meta,
                    body: statements,
                });
            }
            _ => return Err(get_unexpected_error(3, &p)),
        }
    }
    Ok(FunctionData {
        meta,
        id,
        params,
        body: body.unwrap(),
    })
}

fn build_ast_from_if_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut test = None;
    let mut consequent = None;
    let mut alternate = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::kw_if | Rule::kw_else => {}
            Rule::expression => test = Some(build_ast_from_expression(p)?),
            Rule::statement => {
                let stmt = Box::new(build_ast_from_statement(p)?);
                if consequent.is_none() {
                    consequent = Some(stmt);
                } else {
                    alternate = Some(stmt);
                }
            }
            _ => return Err(get_unexpected_error(4, &p)),
        }
    }
    Ok(StatementType::IfStatement {
        meta,
        test: test.unwrap(),
        consequent: consequent.unwrap(),
        alternate,
    })
}

fn build_ast_from_while_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    pair_iter.next(); // kw_while
    let test = build_ast_from_expression(pair_iter.next().unwrap())?;
    let body = Box::new(build_ast_from_statement(pair_iter.next().unwrap())?);
    Ok(StatementType::WhileStatement { meta, test, body })
}

fn build_ast_from_for_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::kw_for => {}
            Rule::for_init_clause => {
                if let Some(init_pair) = p.into_inner().next() {
                    let inner = init_pair.into_inner().next().unwrap();
                    init = Some(match inner.as_rule() {
                        Rule::for_var_declaration => ForInit::VariableDeclaration(
                            build_ast_from_variable_declaration(inner)?,
                        ),
                        Rule::expression => ForInit::Expression(build_ast_from_expression(inner)?),
                        _ => return Err(get_unexpected_error(5, &inner)),
                    });
                }
            }
            Rule::for_test_clause => {
                if let Some(test_pair) = p.into_inner().next() {
                    test = Some(build_ast_from_expression(test_pair)?);
                }
            }
            Rule::for_update_clause => {
                if let Some(update_pair) = p.into_inner().next() {
                    update = Some(build_ast_from_expression(update_pair)?);
                }
            }
            Rule::statement => body = Some(Box::new(build_ast_from_statement(p)?)),
            _ => return Err(get_unexpected_error(6, &p)),
        }
    }
    Ok(StatementType::ForStatement {
        meta,
        init,
        test,
        update,
        body: body.unwrap(),
    })
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn build_ast_from_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut expressions = vec![];
    for p in pair.into_inner() {
        expressions.push(build_ast_from_assignment_expression(p)?);
    }
    if expressions.len() == 1 {
        Ok(expressions.pop().unwrap())
    } else {
        Ok(ExpressionType::SequenceExpression { meta, expressions })
    }
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let inner_pair = pair.into_inner().next().unwrap();
    match inner_pair.as_rule() {
        Rule::assignment => {
            let meta = meta_from_pair(&inner_pair);
            let mut pair_iter = inner_pair.into_inner();
            let left = build_ast_from_left_hand_side_expression(pair_iter.next().unwrap())?;
            let op_pair = pair_iter.next().unwrap();
            let operator = match op_pair.as_str() {
                "=" => AssignmentOperator::Equals,
                "+=" => AssignmentOperator::AddEquals,
                "-=" => AssignmentOperator::SubtractEquals,
                "*=" => AssignmentOperator::MultiplyEquals,
                "/=" => AssignmentOperator::DivideEquals,
                "%=" => AssignmentOperator::ModuloEquals,
                _ => return Err(get_unexpected_error(7, &op_pair)),
            };
            let right = build_ast_from_assignment_expression(pair_iter.next().unwrap())?;
            Ok(ExpressionType::AssignmentExpression {
                meta,
                operator,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        Rule::conditional_expression => build_ast_from_conditional_expression(inner_pair),
        _ => Err(get_unexpected_error(8, &inner_pair)),
    }
}

fn build_ast_from_conditional_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let test = build_ast_from_logical_or_expression(pair_iter.next().unwrap())?;
    if let Some(consequent_pair) = pair_iter.next() {
        let consequent = build_ast_from_assignment_expression(consequent_pair)?;
        let alternate = build_ast_from_assignment_expression(pair_iter.next().unwrap())?;
        Ok(ExpressionType::ConditionalExpression {
            meta,
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    } else {
        Ok(test)
    }
}

fn build_ast_from_logical_or_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let mut node = build_ast_from_logical_and_expression(pair_iter.next().unwrap())?;
    while let Some(op_pair) = pair_iter.next() {
        debug_assert_eq!(op_pair.as_rule(), Rule::op_or);
        let right = build_ast_from_logical_and_expression(pair_iter.next().unwrap())?;
        node = ExpressionType::LogicalExpression {
            meta: meta.clone(),
            operator: LogicalOperator::Or,
            left: Box::new(node),
            right: Box::new(right),
        };
    }
    Ok(node)
}

fn build_ast_from_logical_and_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let mut node = build_ast_from_equality_expression(pair_iter.next().unwrap())?;
    while let Some(op_pair) = pair_iter.next() {
        debug_assert_eq!(op_pair.as_rule(), Rule::op_and);
        let right = build_ast_from_equality_expression(pair_iter.next().unwrap())?;
        node = ExpressionType::LogicalExpression {
            meta: meta.clone(),
            operator: LogicalOperator::And,
            left: Box::new(node),
            right: Box::new(right),
        };
    }
    Ok(node)
}

fn build_ast_from_equality_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let mut node = build_ast_from_relational_expression(pair_iter.next().unwrap())?;
    while let Some(op_pair) = pair_iter.next() {
        let operator = match op_pair.as_str() {
            "===" => BinaryOperator::StrictlyEqual,
            "!==" => BinaryOperator::StrictlyUnequal,
            "==" => BinaryOperator::LooselyEqual,
            "!=" => BinaryOperator::LooselyUnequal,
            _ => return Err(get_unexpected_error(9, &op_pair)),
        };
        let right = build_ast_from_relational_expression(pair_iter.next().unwrap())?;
        node = ExpressionType::BinaryExpression {
            meta: meta.clone(),
            operator,
            left: Box::new(node),
            right: Box::new(right),
        };
    }
    Ok(node)
}

fn build_ast_from_relational_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let mut node = build_ast_from_additive_expression(pair_iter.next().unwrap())?;
    while let Some(op_pair) = pair_iter.next() {
        let operator = match op_pair.as_str() {
            "<" => BinaryOperator::LessThan,
            "<=" => BinaryOperator::LessThanEqual,
            ">" => BinaryOperator::GreaterThan,
            ">=" => BinaryOperator::GreaterThanEqual,
            _ => return Err(get_unexpected_error(10, &op_pair)),
        };
        let right = build_ast_from_additive_expression(pair_iter.next().unwrap())?;
        node = ExpressionType::BinaryExpression {
            meta: meta.clone(),
            operator,
            left: Box::new(node),
            right: Box::new(right),
        };
    }
    Ok(node)
}

fn build_ast_from_additive_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let mut node = build_ast_from_multiplicative_expression(pair_iter.next().unwrap())?;
    while let Some(op_pair) = pair_iter.next() {
        let operator = match op_pair.as_str() {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            _ => return Err(get_unexpected_error(11, &op_pair)),
        };
        let right = build_ast_from_multiplicative_expression(pair_iter.next().unwrap())?;
        node = ExpressionType::BinaryExpression {
            meta: meta.clone(),
            operator,
            left: Box::new(node),
            right: Box::new(right),
        };
    }
    Ok(node)
}

fn build_ast_from_multiplicative_expression(
    pair: Pair<Rule>,
) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let mut node = build_ast_from_unary_expression(pair_iter.next().unwrap())?;
    while let Some(op_pair) = pair_iter.next() {
        let operator = match op_pair.as_str() {
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Modulo,
            _ => return Err(get_unexpected_error(12, &op_pair)),
        };
        let right = build_ast_from_unary_expression(pair_iter.next().unwrap())?;
        node = ExpressionType::BinaryExpression {
            meta: meta.clone(),
            operator,
            left: Box::new(node),
            right: Box::new(right),
        };
    }
    Ok(node)
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut operators = vec![];
    let mut postfix_pair = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::unary_operator => {
                let op_inner = p.into_inner().next().unwrap();
                operators.push(match op_inner.as_rule() {
                    Rule::kw_typeof => UnaryOperator::TypeOf,
                    Rule::op_not => UnaryOperator::LogicalNot,
                    Rule::op_neg => UnaryOperator::Minus,
                    Rule::op_pos => UnaryOperator::Plus,
                    _ => return Err(get_unexpected_error(13, &op_inner)),
                });
            }
            Rule::postfix_expression => postfix_pair = Some(p),
            _ => return Err(get_unexpected_error(14, &p)),
        }
    }
    let mut node = build_ast_from_postfix_expression(postfix_pair.unwrap())?;
    // innermost operator binds tightest
    for operator in operators.into_iter().rev() {
        node = ExpressionType::UnaryExpression {
            meta: meta.clone(),
            operator,
            argument: Box::new(node),
        };
    }
    Ok(node)
}

fn build_ast_from_postfix_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let node = build_ast_from_left_hand_side_expression(pair_iter.next().unwrap())?;
    if let Some(op_pair) = pair_iter.next() {
        let operator = match op_pair.as_str() {
            "++" => UpdateOperator::PlusPlus,
            "--" => UpdateOperator::MinusMinus,
            _ => return Err(get_unexpected_error(15, &op_pair)),
        };
        Ok(ExpressionType::UpdateExpression {
            meta,
            operator,
            argument: Box::new(node),
            prefix: false,
        })
    } else {
        Ok(node)
    }
}

fn build_ast_from_left_hand_side_expression(
    pair: Pair<Rule>,
) -> Result<ExpressionType, Error<Rule>> {
    let inner_pair = pair.into_inner().next().unwrap();
    match inner_pair.as_rule() {
        Rule::new_expression => build_ast_from_new_expression(inner_pair),
        Rule::member_call_expression => build_ast_from_member_call_expression(inner_pair),
        _ => Err(get_unexpected_error(16, &inner_pair)),
    }
}

fn build_ast_from_new_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    pair_iter.next(); // kw_new
    let chain_pair = pair_iter.next().unwrap();
    let mut chain_iter = chain_pair.into_inner();
    let mut callee = build_ast_from_primary_expression(chain_iter.next().unwrap())?;
    for access in chain_iter {
        callee = apply_member_access(callee, access)?;
    }
    let arguments = build_arguments(pair_iter.next().unwrap())?;
    let mut node = ExpressionType::NewExpression {
        meta: meta.clone(),
        callee: Box::new(callee),
        arguments,
    };
    for tail in pair_iter {
        node = apply_access_tail(node, tail, &meta)?;
    }
    Ok(node)
}

fn build_ast_from_member_call_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut pair_iter = pair.into_inner();
    let mut node = build_ast_from_primary_expression(pair_iter.next().unwrap())?;
    for tail in pair_iter {
        node = apply_access_tail(node, tail, &meta)?;
    }
    Ok(node)
}

fn apply_access_tail(
    node: ExpressionType,
    tail: Pair<Rule>,
    meta: &Meta,
) -> Result<ExpressionType, Error<Rule>> {
    let inner = tail.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::member_access => apply_member_access(node, inner),
        Rule::arguments => {
            let arguments = build_arguments(inner)?;
            Ok(ExpressionType::CallExpression {
                meta: meta.clone(),
                callee: Box::new(node),
                arguments,
            })
        }
        _ => Err(get_unexpected_error(17, &inner)),
    }
}

fn apply_member_access(
    node: ExpressionType,
    access: Pair<Rule>,
) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&access);
    let inner = access.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::dot_access => {
            let name_pair = inner.into_inner().next().unwrap();
            Ok(ExpressionType::MemberExpression {
                meta,
                object: Box::new(node),
                property: MemberProperty::Identifier(name_pair.as_str().to_string()),
            })
        }
        Rule::bracket_access => {
            let expr_pair = inner.into_inner().next().unwrap();
            Ok(ExpressionType::MemberExpression {
                meta,
                object: Box::new(node),
                property: MemberProperty::Computed(Box::new(build_ast_from_expression(expr_pair)?)),
            })
        }
        _ => Err(get_unexpected_error(18, &inner)),
    }
}

fn build_arguments(pair: Pair<Rule>) -> Result<Vec<ExpressionType>, Error<Rule>> {
    let mut arguments = vec![];
    for p in pair.into_inner() {
        arguments.push(build_ast_from_assignment_expression(p)?);
    }
    Ok(arguments)
}

fn build_ast_from_primary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let inner_pair = pair.into_inner().next().unwrap();
    Ok(match inner_pair.as_rule() {
        Rule::literal => build_ast_from_literal(inner_pair)?,
        Rule::array_literal => {
            let meta = meta_from_pair(&inner_pair);
            let mut elements = vec![];
            for p in inner_pair.into_inner() {
                elements.push(build_ast_from_assignment_expression(p)?);
            }
            ExpressionType::ArrayExpression { meta, elements }
        }
        Rule::object_literal => build_ast_from_object_literal(inner_pair)?,
        Rule::function_expression => {
            ExpressionType::FunctionExpression(build_ast_from_function(inner_pair)?)
        }
        Rule::this_expression => ExpressionType::ThisExpression {
            meta: meta_from_pair(&inner_pair),
        },
        Rule::identifier_reference => ExpressionType::Identifier(IdentifierData {
            meta: meta_from_pair(&inner_pair),
            name: inner_pair.as_str().to_string(),
        }),
        Rule::paren_expression => {
            build_ast_from_expression(inner_pair.into_inner().next().unwrap())?
        }
        _ => return Err(get_unexpected_error(19, &inner_pair)),
    })
}

fn build_ast_from_object_literal(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let mut properties = vec![];
    for p in pair.into_inner() {
        let prop_meta = meta_from_pair(&p);
        let mut prop_iter = p.into_inner();
        let key_pair = prop_iter.next().unwrap();
        let key_inner = key_pair.into_inner().next().unwrap();
        let key = match key_inner.as_rule() {
            Rule::identifier_name => key_inner.as_str().to_string(),
            Rule::string_literal => unescape_string(key_inner.as_str()),
            _ => return Err(get_unexpected_error(20, &key_inner)),
        };
        let value = build_ast_from_assignment_expression(prop_iter.next().unwrap())?;
        properties.push(PropertyData {
            meta: prop_meta,
            key,
            value,
        });
    }
    Ok(ExpressionType::ObjectExpression { meta, properties })
}

fn build_ast_from_literal(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = meta_from_pair(&pair);
    let inner_pair = pair.into_inner().next().unwrap();
    let value = match inner_pair.as_rule() {
        Rule::number_literal => {
            LiteralType::NumberLiteral(inner_pair.as_str().parse::<f64>().unwrap())
        }
        Rule::string_literal => LiteralType::StringLiteral(unescape_string(inner_pair.as_str())),
        Rule::boolean_literal => LiteralType::BooleanLiteral(inner_pair.as_str() == "true"),
        Rule::null_literal => LiteralType::NullLiteral,
        Rule::undefined_literal => LiteralType::UndefinedLiteral,
        _ => return Err(get_unexpected_error(21, &inner_pair)),
    };
    Ok(ExpressionType::Literal(LiteralData { meta, value }))
}

fn unescape_string(quoted: &str) -> String {
    let raw = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(*ESCAPES.get(&escaped).unwrap_or(&escaped));
            }
        } else {
            out.push(c);
        }
    }
    out
}
