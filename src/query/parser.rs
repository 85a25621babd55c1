//! 查询语言语法分析
//!
//! 语法定义在 `query.pest`，由 pest 生成解析器；这里把得到的语法树
//! 转换为 [`Expression`]。

use pest::Parser;
use pest::error::{Error as PestError, InputLocation};
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::query::QueryError;
use crate::query::ast::{CompareOp, Condition, Expression, Literal, Shape};

#[derive(Parser)]
#[grammar = "query/query.pest"]
struct QueryParser;

pub fn parse(input: &str) -> Result<Expression, QueryError> {
    if input.trim().is_empty() {
        return Err(QueryError::EmptyExpression);
    }
    let query = QueryParser::parse(Rule::query, input)
        .map_err(from_pest)?
        .next()
        .ok_or_else(|| QueryError::parse(0, "empty parse tree"))?;
    build_query(query)
}

/// pest 错误转为带偏移的 [`QueryError::Parse`]
fn from_pest(error: PestError<Rule>) -> QueryError {
    let offset = match error.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let error = error.renamed_rules(|rule| rule_name(rule).to_string());
    QueryError::parse(offset, error.variant.message().into_owned())
}

fn rule_name(rule: &Rule) -> &'static str {
    match rule {
        Rule::shape | Rule::kw_one | Rule::kw_all | Rule::kw_count => "'one', 'all' or 'count'",
        Rule::filter | Rule::kw_where => "'where'",
        Rule::limit | Rule::kw_limit => "'limit'",
        Rule::integer => "a non-negative integer",
        Rule::kw_and => "'and'",
        Rule::kw_or => "'or'",
        Rule::kw_not => "'not'",
        Rule::kw_is => "'is'",
        Rule::kw_null => "'null'",
        Rule::compare_op => "a comparison operator",
        Rule::field | Rule::ident | Rule::quoted_field | Rule::quoted_name => "a column name",
        Rule::literal | Rule::string | Rule::number | Rule::boolean => {
            "a quoted string, number or boolean"
        }
        Rule::EOI => "end of expression",
        _ => "a condition",
    }
}

fn unexpected(pair: &Pair<Rule>) -> QueryError {
    QueryError::parse(
        pair.as_span().start(),
        format!("unexpected {}", rule_name(&pair.as_rule())),
    )
}

/// 取出唯一的子节点
fn only_child(pair: Pair<Rule>) -> Result<Pair<Rule>, QueryError> {
    let offset = pair.as_span().start();
    pair.into_inner()
        .next()
        .ok_or_else(|| QueryError::parse(offset, "incomplete expression"))
}

fn build_query(query: Pair<Rule>) -> Result<Expression, QueryError> {
    let mut expression = Expression {
        shape: Shape::All,
        filter: None,
        limit: None,
    };

    for pair in query.into_inner() {
        match pair.as_rule() {
            Rule::shape => expression.shape = build_shape(pair)?,
            Rule::filter => {
                let condition = pair
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::disjunction)
                    .ok_or_else(|| QueryError::parse(0, "missing condition"))?;
                expression.filter = Some(build_disjunction(condition)?);
            }
            Rule::limit => expression.limit = Some(build_limit(pair, expression.shape)?),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(expression)
}

fn build_shape(pair: Pair<Rule>) -> Result<Shape, QueryError> {
    let keyword = only_child(pair)?;
    match keyword.as_rule() {
        Rule::kw_one => Ok(Shape::One),
        Rule::kw_all => Ok(Shape::All),
        Rule::kw_count => Ok(Shape::Count),
        _ => Err(unexpected(&keyword)),
    }
}

/// `limit` 只对 `all` 有意义，其余形状直接拒绝
fn build_limit(pair: Pair<Rule>, shape: Shape) -> Result<usize, QueryError> {
    let offset = pair.as_span().start();
    if shape != Shape::All {
        return Err(QueryError::parse(
            offset,
            format!("limit only applies to 'all', not '{shape}'"),
        ));
    }
    let integer = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::integer)
        .ok_or_else(|| QueryError::parse(offset, "limit expects a non-negative integer"))?;
    integer
        .as_str()
        .parse()
        .map_err(|_| QueryError::parse(integer.as_span().start(), "limit is too large"))
}

fn build_disjunction(pair: Pair<Rule>) -> Result<Condition, QueryError> {
    fold_operands(pair, Rule::conjunction, build_conjunction, Condition::Or)
}

fn build_conjunction(pair: Pair<Rule>) -> Result<Condition, QueryError> {
    fold_operands(pair, Rule::unary, build_unary, Condition::And)
}

/// 左结合地折叠 `a op b op c`
fn fold_operands(
    pair: Pair<Rule>,
    operand: Rule,
    build: fn(Pair<Rule>) -> Result<Condition, QueryError>,
    combine: fn(Box<Condition>, Box<Condition>) -> Condition,
) -> Result<Condition, QueryError> {
    let offset = pair.as_span().start();
    let mut operands = pair.into_inner().filter(|p| p.as_rule() == operand);
    let first = operands
        .next()
        .ok_or_else(|| QueryError::parse(offset, "expected a condition"))?;

    operands.try_fold(build(first)?, |left, right| {
        Ok(combine(Box::new(left), Box::new(build(right)?)))
    })
}

fn build_unary(pair: Pair<Rule>) -> Result<Condition, QueryError> {
    let node = only_child(pair)?;
    match node.as_rule() {
        Rule::negation => {
            let operand = node
                .clone()
                .into_inner()
                .find(|p| p.as_rule() == Rule::unary)
                .ok_or_else(|| unexpected(&node))?;
            Ok(Condition::Not(Box::new(build_unary(operand)?)))
        }
        Rule::group => build_disjunction(only_child(node)?),
        Rule::null_check => {
            let mut field = None;
            let mut negated = false;
            for part in node.into_inner() {
                match part.as_rule() {
                    Rule::field => field = Some(build_field(part)?),
                    Rule::kw_not => negated = true,
                    _ => {}
                }
            }
            let field = field.ok_or_else(|| QueryError::parse(0, "expected a column name"))?;
            Ok(Condition::IsNull { field, negated })
        }
        Rule::comparison => build_comparison(node),
        _ => Err(unexpected(&node)),
    }
}

fn build_comparison(pair: Pair<Rule>) -> Result<Condition, QueryError> {
    let offset = pair.as_span().start();
    let mut parts = pair.into_inner();
    let (Some(field), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(QueryError::parse(offset, "incomplete comparison"));
    };

    Ok(Condition::Compare {
        field: build_field(field)?,
        op: build_op(&op)?,
        value: build_literal(value)?,
    })
}

fn build_field(pair: Pair<Rule>) -> Result<String, QueryError> {
    let node = only_child(pair)?;
    match node.as_rule() {
        Rule::ident => Ok(node.as_str().to_string()),
        Rule::quoted_field => Ok(unescape(only_child(node)?.as_str())),
        _ => Err(unexpected(&node)),
    }
}

fn build_op(pair: &Pair<Rule>) -> Result<CompareOp, QueryError> {
    let op = match pair.as_str().to_ascii_lowercase().as_str() {
        "==" | "=" => CompareOp::Eq,
        "!=" | "<>" => CompareOp::Ne,
        "<" => CompareOp::Lt,
        "<=" => CompareOp::Le,
        ">" => CompareOp::Gt,
        ">=" => CompareOp::Ge,
        "contains" => CompareOp::Contains,
        "startswith" => CompareOp::StartsWith,
        "endswith" => CompareOp::EndsWith,
        other => {
            return Err(QueryError::parse(
                pair.as_span().start(),
                format!("unknown operator '{other}'"),
            ));
        }
    };
    Ok(op)
}

fn build_literal(pair: Pair<Rule>) -> Result<Literal, QueryError> {
    let node = only_child(pair)?;
    match node.as_rule() {
        Rule::string => Ok(Literal::Text(
            node.into_inner()
                .next()
                .map(|text| unescape(text.as_str()))
                .unwrap_or_default(),
        )),
        Rule::boolean => Ok(Literal::Bool(node.as_str().eq_ignore_ascii_case("true"))),
        Rule::number => node.as_str().parse().map(Literal::Number).map_err(|_| {
            QueryError::parse(
                node.as_span().start(),
                format!("invalid number '{}'", node.as_str()),
            )
        }),
        _ => Err(unexpected(&node)),
    }
}

/// 处理引号内的反斜杠转义
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(field: &str, op: CompareOp, value: Literal) -> Condition {
        Condition::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    #[test]
    fn test_bare_shape() {
        let expr = parse("all").unwrap();
        assert_eq!(expr.shape, Shape::All);
        assert!(expr.filter.is_none());
        assert!(expr.limit.is_none());
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let expr = parse("ONE WHERE name == 'Jane Doe'").unwrap();
        assert_eq!(expr.shape, Shape::One);
        assert_eq!(
            expr.filter,
            Some(compare("name", CompareOp::Eq, Literal::Text("Jane Doe".into())))
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("all where a == 1 or b == 2 and c == 3").unwrap();
        let expected = Condition::Or(
            Box::new(compare("a", CompareOp::Eq, Literal::Number(1.0))),
            Box::new(Condition::And(
                Box::new(compare("b", CompareOp::Eq, Literal::Number(2.0))),
                Box::new(compare("c", CompareOp::Eq, Literal::Number(3.0))),
            )),
        );
        assert_eq!(expr.filter, Some(expected));
    }

    #[test]
    fn test_parentheses_not_and_null_checks() {
        let expr =
            parse("all where not (city contains 'aus' || about is not null) limit 3").unwrap();
        assert_eq!(expr.shape, Shape::All);
        assert_eq!(expr.limit, Some(3));
        let expected = Condition::Not(Box::new(Condition::Or(
            Box::new(compare("city", CompareOp::Contains, Literal::Text("aus".into()))),
            Box::new(Condition::IsNull {
                field: "about".into(),
                negated: true,
            }),
        )));
        assert_eq!(expr.filter, Some(expected));
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let source = "all where `current_company:name` startswith \"Goo\" and recommendations_count >= 2 limit 10";
        let expr = parse(source).unwrap();
        let reparsed = parse(&expr.to_string()).unwrap();
        assert_eq!(expr, reparsed);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("   "), Err(QueryError::EmptyExpression));
        assert!(matches!(parse("df[df.city == 'x']"), Err(QueryError::Parse { .. })));
        assert!(matches!(parse("all where city"), Err(QueryError::Parse { .. })));
        assert!(matches!(parse("all where city like 'x'"), Err(QueryError::Parse { .. })));
        assert!(matches!(parse("all limit -1"), Err(QueryError::Parse { .. })));
        assert!(matches!(parse("all where (a == 1"), Err(QueryError::Parse { .. })));
        assert!(matches!(parse("all extra"), Err(QueryError::Parse { .. })));
        assert!(matches!(parse("all where `` == 1"), Err(QueryError::Parse { .. })));
        assert!(matches!(parse("all where name == 'Jane"), Err(QueryError::Parse { .. })));
    }

    #[test]
    fn test_error_reports_offset_of_bad_token() {
        match parse("all where name like 'x'") {
            Err(QueryError::Parse { offset, message }) => {
                assert_eq!(offset, 15);
                assert!(message.contains("comparison operator"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_limit_only_applies_to_all() {
        assert_eq!(parse("all limit 0").unwrap().limit, Some(0));
        for source in ["one limit 0", "count where city == 'austin' limit 1"] {
            match parse(source) {
                Err(QueryError::Parse { message, .. }) => assert!(message.contains("limit")),
                other => panic!("{source}: unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn test_operator_aliases() {
        let expr = parse("all where current_company:name <> 'Acme' && x>=2 or !y = true").unwrap();
        let expected = Condition::Or(
            Box::new(Condition::And(
                Box::new(compare("current_company:name", CompareOp::Ne, Literal::Text("Acme".into()))),
                Box::new(compare("x", CompareOp::Ge, Literal::Number(2.0))),
            )),
            Box::new(Condition::Not(Box::new(compare("y", CompareOp::Eq, Literal::Bool(true))))),
        );
        assert_eq!(expr.filter, Some(expected));
    }

    #[test]
    fn test_string_escapes_and_numbers() {
        let expr = parse(r#"all where a == "O\"Brien" or b == 'it\'s' or c == -1.5 or d < 2e3"#).unwrap();
        assert_eq!(
            expr.to_string(),
            r#"all where (((`a` == "O\"Brien" or `b` == "it's") or `c` == -1.5) or `d` < 2000)"#
        );
    }

    #[test]
    fn test_backquoted_column_may_be_a_keyword() {
        let expr = parse("all where `count` = 1").unwrap();
        assert_eq!(
            expr.filter,
            Some(compare("count", CompareOp::Eq, Literal::Number(1.0)))
        );
    }
}
