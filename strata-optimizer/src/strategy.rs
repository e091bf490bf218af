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

//! Plan-level optimization strategies. Each strategy walks a `LogicalPlan`
//! bottom-up and returns a rewritten one; the cost-based optimizer proper
//! (join reordering, statistics-driven strategy selection) is a different
//! module's job and isn't built here.

use log::debug;

use crate::logical_plan::LogicalPlan;
use crate::rewrite::rewrite_predicate;

/// A single, independently applicable plan rewrite.
pub trait OptimizationStrategy {
    fn name(&self) -> &'static str;

    fn optimize(&self, plan: LogicalPlan) -> LogicalPlan;
}

/// Applies [`rewrite_predicate`] to every `Filter` node's condition and to
/// every `Join`'s... joins don't carry a condition in this plan shape, so
/// only `Filter` nodes are touched.
#[derive(Debug, Default)]
pub struct PredicateRewriteStrategy;

impl OptimizationStrategy for PredicateRewriteStrategy {
    fn name(&self) -> &'static str {
        "predicate_rewriter"
    }

    fn optimize(&self, plan: LogicalPlan) -> LogicalPlan {
        match plan {
            LogicalPlan::Scan { .. } => plan,
            LogicalPlan::Filter { condition, input } => {
                let input = Box::new(self.optimize(*input));
                let condition = rewrite_predicate(condition);
                debug!("rewrote filter predicate");
                LogicalPlan::Filter { condition, input }
            }
            LogicalPlan::Project { columns, input } => LogicalPlan::Project {
                columns,
                input: Box::new(self.optimize(*input)),
            },
            LogicalPlan::Join {
                left,
                right,
                left_columns,
                right_columns,
            } => LogicalPlan::Join {
                left: Box::new(self.optimize(*left)),
                right: Box::new(self.optimize(*right)),
                left_columns,
                right_columns,
            },
        }
    }
}

/// Runs every registered strategy over `plan`, in order, once each.
pub fn optimize(plan: LogicalPlan, strategies: &[&dyn OptimizationStrategy]) -> LogicalPlan {
    strategies.iter().fold(plan, |plan, strategy| {
        debug!("applying strategy {}", strategy.name());
        strategy.optimize(plan)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::{ConnectorKind, DataType, RelationSchema, Value};
    use strata_expr::{ExprNode, NodeType, NodeValue};

    fn scan() -> LogicalPlan {
        LogicalPlan::Scan {
            relation: "orders".to_string(),
            schema: RelationSchema::new("orders"),
        }
    }

    fn like_predicate() -> ExprNode {
        let mut left = ExprNode::identifier("status");
        left.ty = DataType::Varchar;
        left.source_connector.insert(ConnectorKind::Blob);
        let right = ExprNode::literal(Value::String("shipped%".to_string()), DataType::Varchar);

        let mut node = ExprNode::new(NodeType::ComparisonOperator);
        node.value = NodeValue::Operator("Like".to_string());
        node.left = Some(Box::new(left));
        node.right = Some(Box::new(right));
        node
    }

    #[test]
    fn predicate_rewrite_strategy_rewrites_filter_under_a_scan() {
        let plan = LogicalPlan::Filter {
            condition: like_predicate(),
            input: Box::new(scan()),
        };

        let rewritten = optimize(plan, &[&PredicateRewriteStrategy]);

        match rewritten {
            LogicalPlan::Filter { condition, .. } => {
                assert_eq!(condition.node_type, NodeType::Function);
                assert_eq!(condition.value, NodeValue::Ident("STARTS_WITH".to_string()));
            }
            _ => panic!("expected a Filter node"),
        }
    }

    #[test]
    fn predicate_rewrite_strategy_recurses_through_project_and_join() {
        let plan = LogicalPlan::Project {
            columns: vec![],
            input: Box::new(LogicalPlan::Join {
                left: Box::new(LogicalPlan::Filter {
                    condition: like_predicate(),
                    input: Box::new(scan()),
                }),
                right: Box::new(scan()),
                left_columns: vec!["id".to_string()],
                right_columns: vec!["order_id".to_string()],
            }),
        };

        let rewritten = optimize(plan, &[&PredicateRewriteStrategy]);

        let LogicalPlan::Project { input, .. } = rewritten else {
            panic!("expected a Project node");
        };
        let LogicalPlan::Join { left, .. } = *input else {
            panic!("expected a Join node");
        };
        let LogicalPlan::Filter { condition, .. } = *left else {
            panic!("expected a Filter node");
        };
        assert_eq!(condition.node_type, NodeType::Function);
    }
}
