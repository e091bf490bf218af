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

//! Resolves identifiers and materializes derived columns over an expression
//! tree. The binder is the only component allowed to mutate `$derived`.
//!
//! Binding does not mutate its input tree in place: `bind` consumes an
//! `ExprNode` by value and returns a freshly built bound node plus an
//! updated `BindingContext`. An arena of node indices was considered for
//! this instead of an owned rebuild, and rejected - the trees this binder
//! sees are shallow enough that the indirection would only add ceremony.

mod context;

pub use context::{BindingContext, BindingStatistics};

use strata_common::schema::next_identity;
use strata_common::suggest::suggest_alternative;
use strata_common::{
    Column, ConstantColumn, ExpressionColumn, FunctionColumn, RelationSchema, Result, StrataError,
    Value, DERIVED_SCHEMA, SHARED_SCHEMA_PREFIX,
};
use strata_execution::{AggregateRegistry, FunctionRegistry};

use crate::format::format_expression;
use crate::identity::hash_tree;
use crate::node::{ExprNode, NodeType, NodeValue};

/// Binds `node` against `ctx`, returning the bound node and the context with
/// any newly materialized derived columns folded in.
pub fn bind(
    node: ExprNode,
    ctx: BindingContext,
    functions: &FunctionRegistry,
    aggregates: &AggregateRegistry,
) -> Result<(ExprNode, BindingContext)> {
    // Already bound: idempotence, and the common case for re-binding a tree
    // that shares subexpressions already resolved elsewhere.
    if node.is_bound() {
        return Ok((node, ctx));
    }

    match node.node_type {
        NodeType::Identifier | NodeType::Evaluated => bind_identifier(node, ctx),
        NodeType::ExpressionList => bind_expression_list(node, ctx, functions, aggregates),
        _ => bind_generic(node, ctx, functions, aggregates),
    }
}

fn bind_expression_list(
    mut node: ExprNode,
    mut ctx: BindingContext,
    functions: &FunctionRegistry,
    aggregates: &AggregateRegistry,
) -> Result<(ExprNode, BindingContext)> {
    let elements = match std::mem::replace(&mut node.value, NodeValue::None) {
        NodeValue::ExprList(items) => items,
        other => {
            node.value = other;
            Vec::new()
        }
    };

    let mut bound = Vec::with_capacity(elements.len());
    for element in elements {
        let (bound_element, new_ctx) = bind(element, ctx, functions, aggregates)?;
        ctx = new_ctx;
        bound.push(bound_element);
    }
    node.value = NodeValue::ExprList(bound);
    Ok((node, ctx))
}

/// Implements spec §4.2.1: candidate schema selection, ambiguity/not-found
/// handling, the `@variable` branch, and alias/origin propagation on a hit.
fn bind_identifier(mut node: ExprNode, mut ctx: BindingContext) -> Result<(ExprNode, BindingContext)> {
    let source_column = node.source_column.clone().unwrap_or_default();
    let is_variable = node
        .current_name
        .as_deref()
        .is_some_and(|name| name.starts_with('@'));

    let candidate_names: Vec<String> = match &node.source {
        Some(source) => ctx
            .schemas
            .keys()
            .filter(|name| *name == source || name.starts_with(SHARED_SCHEMA_PREFIX))
            .cloned()
            .collect(),
        None => ctx.schemas.keys().cloned().collect(),
    };

    if candidate_names.is_empty() {
        return Err(StrataError::UnexpectedDatasetReference {
            dataset: node.source.clone().unwrap_or_default(),
        });
    }

    let mut found: Vec<(String, u64)> = Vec::new();
    for name in &candidate_names {
        if let Some(schema) = ctx.schemas.get(name) {
            if let Some(column) = schema.find_column(&source_column) {
                found.push((name.clone(), column.identity()));
            }
        }
    }

    if found.len() > 1 {
        return Err(StrataError::AmbiguousIdentifier {
            identifier: source_column,
        });
    }

    if found.is_empty() {
        if is_variable {
            let variable_name = node.current_name.clone().unwrap();
            let column = ctx.connection.as_column(&variable_name)?;
            ctx.schemas
                .entry(DERIVED_SCHEMA.to_string())
                .or_insert_with(|| RelationSchema::new(DERIVED_SCHEMA))
                .columns
                .push(Column::Constant(column.clone()));
            return Ok((literal_from_constant(column), ctx));
        }

        let candidates: Vec<&str> = candidate_names
            .iter()
            .filter_map(|name| ctx.schemas.get(name))
            .flat_map(RelationSchema::all_column_names)
            .collect();
        let suggestion = suggest_alternative(&source_column, candidates);
        return Err(StrataError::ColumnNotFound {
            column: source_column,
            suggestion,
        });
    }

    let (found_schema, identity) = found.into_iter().next().unwrap();

    if let Some(alias) = node.alias.clone() {
        if let Some(schema) = ctx.schemas.get_mut(&found_schema) {
            if let Some(column) = schema.columns.iter_mut().find(|c| c.identity() == identity) {
                if !column.all_names().contains(&alias.as_str()) {
                    column.aliases_mut().push(alias);
                }
            }
        }
    }

    let column = ctx.schemas[&found_schema]
        .find_column_by_identity(identity)
        .cloned()
        .expect("column located during resolution is still present");

    if is_variable {
        return Ok((literal_from_column(&column), ctx));
    }

    if node.source.is_none() {
        node.source = Some(found_schema);
    }
    if column.origin().len() == 1 {
        node.source = Some(column.origin()[0].clone());
    }

    node.ty = column.ty();
    node.query_column = Some(node.alias.clone().unwrap_or_else(|| column.name().to_string()));
    node.schema_column = Some(column);
    Ok((node, ctx))
}

fn literal_from_constant(column: ConstantColumn) -> ExprNode {
    let mut node = ExprNode::new(NodeType::Literal);
    node.value = NodeValue::Literal(column.value.clone());
    node.ty = column.ty;
    node.query_column = Some(column.name.clone());
    node.schema_column = Some(Column::Constant(column));
    node
}

fn literal_from_column(column: &Column) -> ExprNode {
    let mut node = ExprNode::new(NodeType::Literal);
    node.ty = column.ty();
    node.query_column = Some(column.name().to_string());
    if let Column::Constant(constant) = column {
        node.value = NodeValue::Literal(constant.value.clone());
    }
    node.schema_column = Some(column.clone());
    node
}

/// The generic path: cached-derived lookup, recursion into children and
/// parameters, and materialization of a new derived column (spec §4.2 steps
/// 4-7).
fn bind_generic(
    mut node: ExprNode,
    mut ctx: BindingContext,
    functions: &FunctionRegistry,
    aggregates: &AggregateRegistry,
) -> Result<(ExprNode, BindingContext)> {
    let column_name = node
        .query_column
        .clone()
        .unwrap_or_else(|| format_expression(&node, true));

    if let Some(existing) = find_existing_column(&ctx, &column_name) {
        node.ty = existing.ty();
        node.query_column = Some(node.alias.clone().unwrap_or(column_name));
        node.schema_column = Some(existing);
        return Ok((node, ctx));
    }

    let original_ctx = ctx.clone();

    if let Some(left) = node.left.take() {
        let (bound, new_ctx) = bind(*left, ctx, functions, aggregates)?;
        node.left = Some(Box::new(bound));
        ctx = new_ctx;
    }
    if let Some(right) = node.right.take() {
        let (bound, new_ctx) = bind(*right, ctx, functions, aggregates)?;
        node.right = Some(Box::new(bound));
        ctx = new_ctx;
    }
    if let Some(centre) = node.centre.take() {
        let (bound, new_ctx) = bind(*centre, ctx, functions, aggregates)?;
        node.centre = Some(Box::new(bound));
        ctx = new_ctx;
    }
    if !node.parameters.is_empty() {
        let mut bound_params = Vec::with_capacity(node.parameters.len());
        for parameter in std::mem::take(&mut node.parameters) {
            let (bound, param_ctx) = bind(parameter, original_ctx.clone(), functions, aggregates)?;
            bound_params.push(bound);
            ctx.merge_schemas(param_ctx.schemas);
        }
        node.parameters = bound_params;
    }

    if node.node_type == NodeType::Subquery || node.do_not_create_column {
        return Ok((node, ctx));
    }

    let column = match node.node_type {
        NodeType::Literal => {
            let value = node.value.as_literal().cloned().unwrap_or(Value::Null);
            let aliases = node.alias.clone().into_iter().collect();
            let column = ConstantColumn {
                identity: next_identity(),
                name: column_name.clone(),
                aliases,
                ty: node.ty,
                value,
            };
            let wrapped = Column::Constant(column);
            push_derived(&mut ctx, wrapped.clone());
            wrapped
        }
        _ => {
            if let Some(existing) = ctx
                .schemas
                .get(DERIVED_SCHEMA)
                .and_then(|schema| schema.find_column(&column_name))
                .cloned()
            {
                let flat = strata_common::FlatColumn {
                    identity: existing.identity(),
                    name: existing.name().to_string(),
                    aliases: existing.aliases().to_vec(),
                    ty: existing.ty(),
                };
                let wrapped = Column::Flat(flat);
                replace_derived(&mut ctx, existing.identity(), wrapped.clone());
                node.node_type = NodeType::Evaluated;
                node.query_column = Some(node.alias.clone().unwrap_or(column_name));
                node.schema_column = Some(wrapped);
                return Ok((node, ctx));
            }

            match node.node_type {
                NodeType::Function | NodeType::Aggregator => {
                    let name = node.value.as_ident().unwrap_or_default().to_string();
                    let binding = if node.node_type == NodeType::Aggregator {
                        aggregates
                            .get(&name)
                            .map(|descriptor| descriptor.name.to_string())
                            .ok_or_else(|| StrataError::FunctionNotFound {
                                function: name.clone(),
                                suggestion: suggest_alternative(&name, aggregates.names()),
                            })?
                    } else {
                        functions
                            .get(&name)
                            .map(|descriptor| descriptor.name.to_string())
                            .ok_or_else(|| StrataError::FunctionNotFound {
                                function: name.clone(),
                                suggestion: suggest_alternative(&name, functions.names()),
                            })?
                    };
                    let aliases = node.alias.clone().into_iter().collect();
                    let column = FunctionColumn {
                        identity: hash_tree(&node),
                        name: column_name.clone(),
                        aliases,
                        ty: node.ty,
                        binding,
                        origin: collect_origin(&node),
                    };
                    let wrapped = Column::Function(column);
                    push_derived(&mut ctx, wrapped.clone());
                    wrapped
                }
                _ => {
                    let aliases = node.alias.clone().into_iter().collect();
                    let column = ExpressionColumn {
                        identity: hash_tree(&node),
                        name: column_name.clone(),
                        aliases,
                        ty: node.ty,
                        expression: format_expression(&node, false),
                        origin: collect_origin(&node),
                    };
                    let wrapped = Column::Expression(column);
                    push_derived(&mut ctx, wrapped.clone());
                    wrapped
                }
            }
        }
    };

    node.query_column = Some(node.alias.clone().unwrap_or(column_name));
    node.schema_column = Some(column);
    Ok((node, ctx))
}

fn push_derived(ctx: &mut BindingContext, column: Column) {
    ctx.schemas
        .entry(DERIVED_SCHEMA.to_string())
        .or_insert_with(|| RelationSchema::new(DERIVED_SCHEMA))
        .columns
        .push(column);
}

fn replace_derived(ctx: &mut BindingContext, identity: u64, column: Column) {
    if let Some(schema) = ctx.schemas.get_mut(DERIVED_SCHEMA) {
        if let Some(slot) = schema.columns.iter_mut().find(|c| c.identity() == identity) {
            *slot = column;
        }
    }
}

fn find_existing_column(ctx: &BindingContext, name: &str) -> Option<Column> {
    ctx.schemas
        .values()
        .find_map(|schema| schema.find_column(name).cloned())
}

/// The source relations this node's value was computed from: the node's own
/// `source` plus any already-bound child's, deduplicated.
fn collect_origin(node: &ExprNode) -> Vec<String> {
    let mut origins = Vec::new();
    push_origin(&mut origins, &node.source);
    for child in [&node.left, &node.centre, &node.right] {
        if let Some(child) = child {
            for origin in collect_origin(child) {
                push_origin(&mut origins, &Some(origin));
            }
        }
    }
    for parameter in &node.parameters {
        for origin in collect_origin(parameter) {
            push_origin(&mut origins, &Some(origin));
        }
    }
    origins
}

fn push_origin(origins: &mut Vec<String>, candidate: &Option<String>) {
    if let Some(candidate) = candidate {
        if !origins.contains(candidate) {
            origins.push(candidate.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::{DataType, FlatColumn};

    fn engine_parts() -> (FunctionRegistry, AggregateRegistry, std::rc::Rc<strata_execution::VariableStore>) {
        (
            FunctionRegistry::builtin(),
            AggregateRegistry::builtin(),
            std::rc::Rc::new(strata_execution::VariableStore::new()),
        )
    }

    fn tweets_schema() -> RelationSchema {
        let mut schema = RelationSchema::new("tweets");
        schema.columns.push(Column::Flat(FlatColumn {
            identity: next_identity(),
            name: "user_name".to_string(),
            aliases: Vec::new(),
            ty: DataType::Varchar,
        }));
        schema
    }

    #[test]
    fn binds_a_flat_identifier() {
        let (functions, aggregates, connection) = engine_parts();
        let ctx = BindingContext::new(connection).with_schema(tweets_schema());
        let node = ExprNode::identifier("user_name");

        let (bound, _) = bind(node, ctx, &functions, &aggregates).unwrap();
        assert!(bound.is_bound());
        assert_eq!(bound.ty, DataType::Varchar);
    }

    #[test]
    fn rebinding_an_already_bound_node_is_idempotent() {
        let (functions, aggregates, connection) = engine_parts();
        let ctx = BindingContext::new(connection).with_schema(tweets_schema());
        let node = ExprNode::identifier("user_name");

        let (once, ctx) = bind(node, ctx, &functions, &aggregates).unwrap();
        let (twice, _) = bind(once.clone(), ctx, &functions, &aggregates).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_column_suggests_nearest_match() {
        let (functions, aggregates, connection) = engine_parts();
        let ctx = BindingContext::new(connection).with_schema(tweets_schema());
        let node = ExprNode::identifier("user_nme");

        let err = bind(node, ctx, &functions, &aggregates).unwrap_err();
        match err {
            StrataError::ColumnNotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("user_name"));
            }
            other => panic!("expected ColumnNotFound, got {other:?}"),
        }
    }

    #[test]
    fn session_variable_binds_to_a_literal() {
        let functions = FunctionRegistry::builtin();
        let aggregates = AggregateRegistry::builtin();
        let mut store = strata_execution::VariableStore::new();
        store.set("@threshold", Value::Int64(10));
        let ctx = BindingContext::new(std::rc::Rc::new(store));
        let node = ExprNode::identifier("@threshold");

        let (bound, ctx) = bind(node, ctx, &functions, &aggregates).unwrap();
        assert_eq!(bound.node_type, NodeType::Literal);
        assert_eq!(bound.value.as_literal(), Some(&Value::Int64(10)));
        assert!(ctx.schemas[DERIVED_SCHEMA]
            .find_column("@threshold")
            .is_some());
    }

    #[test]
    fn unknown_function_is_reported_with_a_suggestion() {
        let (functions, aggregates, connection) = engine_parts();
        let ctx = BindingContext::new(connection);
        let mut node = ExprNode::new(NodeType::Function);
        node.value = NodeValue::Ident("ROUN".to_string());

        let err = bind(node, ctx, &functions, &aggregates).unwrap_err();
        assert!(matches!(err, StrataError::FunctionNotFound { .. }));
    }

    #[test]
    fn repeated_subexpression_reuses_one_derived_column() {
        let (functions, aggregates, connection) = engine_parts();
        let ctx = BindingContext::new(connection);

        let mut call = ExprNode::new(NodeType::Function);
        call.value = NodeValue::Ident("PI".to_string());
        let (bound_once, ctx) = bind(call.clone(), ctx, &functions, &aggregates).unwrap();

        let (bound_twice, ctx) = bind(call, ctx, &functions, &aggregates).unwrap();
        assert_eq!(
            bound_once.schema_column.unwrap().identity(),
            bound_twice.schema_column.unwrap().identity()
        );
        assert_eq!(
            ctx.schemas[DERIVED_SCHEMA]
                .columns
                .iter()
                .filter(|c| c.name() == "PI()")
                .count(),
            1
        );
    }
}
