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

//! Walks a logical plan depth-first, binding every expression it carries.
//! The statement parser that would normally hand us this plan is out of
//! scope; callers build a `LogicalPlan` by hand or from a cost-based
//! optimizer that isn't part of this engine.

use strata_common::{RelationSchema, Result};
use strata_execution::{AggregateRegistry, FunctionRegistry};
use strata_expr::{bind, BindingContext};
use strata_optimizer::LogicalPlan;

/// Binds every expression reachable from `plan`, threading a single
/// `BindingContext` through in plan-evaluation order (children before their
/// parent) so a `Filter`'s condition sees the schema its `Scan` exposes.
pub fn bind_plan(
    plan: LogicalPlan,
    ctx: BindingContext,
    functions: &FunctionRegistry,
    aggregates: &AggregateRegistry,
) -> Result<(LogicalPlan, BindingContext)> {
    match plan {
        LogicalPlan::Scan { relation, schema } => {
            let ctx = with_relation_schema(ctx, &relation, &schema);
            Ok((LogicalPlan::Scan { relation, schema }, ctx))
        }
        LogicalPlan::Filter { condition, input } => {
            let (input, ctx) = bind_plan(*input, ctx, functions, aggregates)?;
            let (condition, ctx) = bind(condition, ctx, functions, aggregates)?;
            Ok((
                LogicalPlan::Filter {
                    condition,
                    input: Box::new(input),
                },
                ctx,
            ))
        }
        LogicalPlan::Project { columns, input } => {
            let (input, mut ctx) = bind_plan(*input, ctx, functions, aggregates)?;
            let mut bound = Vec::with_capacity(columns.len());
            for column in columns {
                let (column, new_ctx) = bind(column, ctx, functions, aggregates)?;
                ctx = new_ctx;
                bound.push(column);
            }
            Ok((
                LogicalPlan::Project {
                    columns: bound,
                    input: Box::new(input),
                },
                ctx,
            ))
        }
        LogicalPlan::Join {
            left,
            right,
            left_columns,
            right_columns,
        } => {
            let (left, ctx) = bind_plan(*left, ctx, functions, aggregates)?;
            let (right, ctx) = bind_plan(*right, ctx, functions, aggregates)?;
            Ok((
                LogicalPlan::Join {
                    left: Box::new(left),
                    right: Box::new(right),
                    left_columns,
                    right_columns,
                },
                ctx,
            ))
        }
    }
}

fn with_relation_schema(mut ctx: BindingContext, relation: &str, schema: &RelationSchema) -> BindingContext {
    ctx.schemas.entry(relation.to_string()).or_insert_with(|| schema.clone());
    ctx
}
