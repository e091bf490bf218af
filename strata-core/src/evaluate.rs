// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! A narrow predicate evaluator, not a general expression engine.
//!
//! Predicate pushdown is the reader's job (`PushedPredicate`, already
//! rendered text); this module exists only so a caller can enforce a
//! predicate the reader couldn't push - the same gap a real columnar reader
//! closes by filtering in memory after a row-group skip. It covers exactly
//! the operator shapes the rewriter produces: `AND`/`OR` combinators, the
//! comparison operators, and the `STARTS_WITH`/`ENDS_WITH`/`SEARCH`
//! functions LIKE-family predicates rewrite into. Anything else is an
//! `InvalidInternalState` error rather than a guess.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Scalar};
use arrow::compute::kernels::cmp;
use arrow::compute::{and_kleene, filter_record_batch, or_kleene};
use arrow::record_batch::RecordBatch;
use strata_common::{invalid_state, Result, Value};
use strata_expr::{ExprNode, NodeType};

/// Evaluates `condition` against every row of `batch`, returning the
/// per-row match mask.
pub fn evaluate_predicate(condition: &ExprNode, batch: &RecordBatch) -> Result<BooleanArray> {
    match condition.node_type {
        NodeType::And => {
            let left = evaluate_predicate(operand(&condition.left, "AND")?, batch)?;
            let right = evaluate_predicate(operand(&condition.right, "AND")?, batch)?;
            and_kleene(&left, &right).map_err(Into::into)
        }
        NodeType::Or => {
            let left = evaluate_predicate(operand(&condition.left, "OR")?, batch)?;
            let right = evaluate_predicate(operand(&condition.right, "OR")?, batch)?;
            or_kleene(&left, &right).map_err(Into::into)
        }
        NodeType::ComparisonOperator => evaluate_comparison(condition, batch),
        NodeType::Function => evaluate_function(condition, batch),
        other => Err(invalid_state!(
            "cannot evaluate a predicate rooted at {other:?} outside the scan's pushdown path"
        )),
    }
}

/// Applies `condition` to every batch, dropping rows that don't match.
pub fn apply_filter(condition: &ExprNode, batches: Vec<RecordBatch>) -> Result<Vec<RecordBatch>> {
    batches
        .into_iter()
        .map(|batch| {
            let mask = evaluate_predicate(condition, &batch)?;
            filter_record_batch(&batch, &mask).map_err(Into::into)
        })
        .collect()
}

fn operand<'a>(slot: &'a Option<Box<ExprNode>>, combinator: &str) -> Result<&'a ExprNode> {
    slot.as_deref()
        .ok_or_else(|| invalid_state!("{combinator} predicate is missing an operand"))
}

fn evaluate_comparison(node: &ExprNode, batch: &RecordBatch) -> Result<BooleanArray> {
    let left = operand(&node.left, "comparison")?;
    let right = operand(&node.right, "comparison")?;
    let column = resolve_column(left, batch)?;
    let literal = right
        .value
        .as_literal()
        .ok_or_else(|| invalid_state!("comparison's right operand is not a literal"))?;
    let rhs = Scalar::new(literal_array(literal)?);

    let lhs = column.as_ref();
    match node.value.as_ident().unwrap_or_default() {
        "Eq" => cmp::eq(&lhs, &rhs).map_err(Into::into),
        "NotEq" => cmp::neq(&lhs, &rhs).map_err(Into::into),
        "Lt" => cmp::lt(&lhs, &rhs).map_err(Into::into),
        "Gt" => cmp::gt(&lhs, &rhs).map_err(Into::into),
        "Lte" => cmp::lt_eq(&lhs, &rhs).map_err(Into::into),
        "Gte" => cmp::gt_eq(&lhs, &rhs).map_err(Into::into),
        other => Err(invalid_state!("unsupported comparison operator: {other}")),
    }
}

fn evaluate_function(node: &ExprNode, batch: &RecordBatch) -> Result<BooleanArray> {
    let name = node.value.as_ident().unwrap_or_default().to_string();
    if node.parameters.len() != 3 {
        return Err(invalid_state!("{name} expects (column, pattern, ignore_case)"));
    }

    let column = resolve_column(&node.parameters[0], batch)?;
    let strings = column
        .as_any()
        .downcast_ref::<arrow::array::StringArray>()
        .ok_or_else(|| invalid_state!("{name} requires a string column"))?;
    let pattern = match node.parameters[1].value.as_literal() {
        Some(Value::String(pattern)) => pattern.clone(),
        _ => return Err(invalid_state!("{name} requires a string literal pattern")),
    };
    let ignore_case = matches!(node.parameters[2].value.as_literal(), Some(Value::Boolean(true)));
    let pattern = if ignore_case { pattern.to_lowercase() } else { pattern };

    let matches: fn(&str, &str) -> bool = match name.as_str() {
        "STARTS_WITH" => |s, p| s.starts_with(p),
        "ENDS_WITH" => |s, p| s.ends_with(p),
        "SEARCH" => |s, p| s.contains(p),
        other => return Err(invalid_state!("unsupported predicate function: {other}")),
    };

    let mask: BooleanArray = (0..strings.len())
        .map(|row| {
            if strings.is_null(row) {
                None
            } else {
                let value = strings.value(row);
                let value = if ignore_case { value.to_lowercase() } else { value.to_string() };
                Some(matches(&value, &pattern))
            }
        })
        .collect();
    Ok(mask)
}

fn resolve_column(node: &ExprNode, batch: &RecordBatch) -> Result<ArrayRef> {
    let name = node
        .source_column
        .as_deref()
        .or(node.query_column.as_deref())
        .ok_or_else(|| invalid_state!("predicate operand has no column name to evaluate against"))?;
    batch
        .column_by_name(name)
        .cloned()
        .ok_or_else(|| invalid_state!("column '{name}' not present in the morsel being filtered"))
}

fn literal_array(value: &Value) -> Result<ArrayRef> {
    use arrow::array::{BooleanArray as Bool, Float64Array, Int64Array, StringArray};

    let array: ArrayRef = match value {
        Value::Boolean(b) => Arc::new(Bool::from(vec![*b])),
        Value::Int64(i) => Arc::new(Int64Array::from(vec![*i])),
        Value::Float64(f) => Arc::new(Float64Array::from(vec![*f])),
        Value::String(s) => Arc::new(StringArray::from(vec![s.clone()])),
        other => return Err(invalid_state!("unsupported literal in predicate evaluation: {other:?}")),
    };
    Ok(array)
}
