//! 查询解释器
//!
//! 只读地在数据集上求值 [`Expression`]，不做任何 I/O。所有文本比较
//! 都忽略大小写，这一点由解释器保证，而不是依赖模型生成的表达式。

use std::cmp::Ordering;

use serde_json::Value;

use crate::dataset::{Dataset, ProfileRecord, cell_text};
use crate::query::ast::{CompareOp, Condition, Expression, Literal, Shape};
use crate::query::{QueryError, QueryResult, parser};

/// 解析并执行表达式文本
pub fn execute(dataset: &Dataset, source: &str) -> Result<QueryResult, QueryError> {
    let expression = parser::parse(source)?;
    evaluate(dataset, &expression)
}

/// 执行已解析的表达式
pub fn evaluate(dataset: &Dataset, expression: &Expression) -> Result<QueryResult, QueryError> {
    let filter = expression
        .filter
        .as_ref()
        .map(|condition| resolve_fields(dataset, condition))
        .transpose()?;

    let mut matches = dataset
        .rows()
        .iter()
        .filter(|row| {
            filter
                .as_ref()
                .is_none_or(|condition| matches_condition(row, condition))
        });

    let result = match expression.shape {
        Shape::One => matches
            .next()
            .cloned()
            .map(QueryResult::Record)
            .unwrap_or(QueryResult::NotFound),
        Shape::All => {
            let limit = expression.limit.unwrap_or(usize::MAX);
            QueryResult::Records(matches.take(limit).cloned().collect())
        }
        Shape::Count => QueryResult::Count(matches.count()),
    };

    Ok(result)
}

/// 把条件中的列名映射为数据集中的实际列名
fn resolve_fields(dataset: &Dataset, condition: &Condition) -> Result<Condition, QueryError> {
    let resolve = |field: &str| {
        dataset
            .resolve_column(field)
            .map(str::to_string)
            .ok_or_else(|| QueryError::UnknownField {
                field: field.to_string(),
                available: dataset.column_names().collect::<Vec<_>>().join(", "),
            })
    };

    Ok(match condition {
        Condition::And(a, b) => Condition::And(
            Box::new(resolve_fields(dataset, a)?),
            Box::new(resolve_fields(dataset, b)?),
        ),
        Condition::Or(a, b) => Condition::Or(
            Box::new(resolve_fields(dataset, a)?),
            Box::new(resolve_fields(dataset, b)?),
        ),
        Condition::Not(inner) => Condition::Not(Box::new(resolve_fields(dataset, inner)?)),
        Condition::Compare { field, op, value } => Condition::Compare {
            field: resolve(field)?,
            op: *op,
            value: value.clone(),
        },
        Condition::IsNull { field, negated } => Condition::IsNull {
            field: resolve(field)?,
            negated: *negated,
        },
    })
}

fn matches_condition(row: &ProfileRecord, condition: &Condition) -> bool {
    match condition {
        Condition::And(a, b) => matches_condition(row, a) && matches_condition(row, b),
        Condition::Or(a, b) => matches_condition(row, a) || matches_condition(row, b),
        Condition::Not(inner) => !matches_condition(row, inner),
        Condition::IsNull { field, negated } => {
            let is_null = row.get(field).is_none_or(is_blank);
            is_null != *negated
        }
        Condition::Compare { field, op, value } => match row.get(field) {
            Some(cell) if !is_blank(cell) => compare(cell, *op, value),
            // 空值只满足 `!=`
            _ => *op == CompareOp::Ne,
        },
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn compare(cell: &Value, op: CompareOp, literal: &Literal) -> bool {
    let Some(text) = cell_text(cell) else {
        return op == CompareOp::Ne;
    };
    let cell_lower = text.trim().to_lowercase();
    let literal_lower = literal.as_text().trim().to_lowercase();

    match op {
        CompareOp::Eq => equals(cell, &cell_lower, literal, &literal_lower),
        CompareOp::Ne => !equals(cell, &cell_lower, literal, &literal_lower),
        CompareOp::Contains => cell_lower.contains(&literal_lower),
        CompareOp::StartsWith => cell_lower.starts_with(&literal_lower),
        CompareOp::EndsWith => cell_lower.ends_with(&literal_lower),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let ordering = match (numeric(cell), literal_number(literal)) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => Some(cell_lower.cmp(&literal_lower)),
            };
            match ordering {
                Some(Ordering::Less) => matches!(op, CompareOp::Lt | CompareOp::Le),
                Some(Ordering::Equal) => matches!(op, CompareOp::Le | CompareOp::Ge),
                Some(Ordering::Greater) => matches!(op, CompareOp::Gt | CompareOp::Ge),
                None => false,
            }
        }
    }
}

fn equals(cell: &Value, cell_lower: &str, literal: &Literal, literal_lower: &str) -> bool {
    match (numeric(cell), literal_number(literal)) {
        (Some(a), Some(b)) => a == b,
        _ => cell_lower == literal_lower,
    }
}

/// 单元格的数值，数字形式的文本也会被解析
fn numeric(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn literal_number(literal: &Literal) -> Option<f64> {
    match literal {
        Literal::Number(n) => Some(*n),
        Literal::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Literal::Bool(_) => None,
    }
}
