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

//! Canonical textual rendering of an expression tree. Two unrelated things
//! depend on the same output: the binder's derived-column cache key (two
//! occurrences of `a + b` must format identically to collapse onto one
//! column) and `identity::hash_tree`'s outer disambiguating hash.

use crate::node::{ExprNode, NodeType, NodeValue};

/// Renders `node` as a SQL-like expression string. With `qualify` set,
/// identifiers are rendered `source.column` when a source is known;
/// otherwise just `column`.
pub fn format_expression(node: &ExprNode, qualify: bool) -> String {
    match node.node_type {
        NodeType::Identifier | NodeType::Evaluated => format_identifier(node, qualify),
        NodeType::Literal => format_literal(node),
        NodeType::Wildcard => match &node.source {
            Some(source) if qualify => format!("{source}.*"),
            _ => "*".to_string(),
        },
        NodeType::Function | NodeType::Aggregator => {
            let name = node.value.as_ident().unwrap_or_default();
            let args: Vec<String> = node
                .parameters
                .iter()
                .map(|p| format_expression(p, qualify))
                .collect();
            format!("{name}({})", args.join(", "))
        }
        NodeType::BinaryOperator | NodeType::ComparisonOperator => {
            let op = node.value.as_ident().unwrap_or("?");
            format!(
                "{} {} {}",
                format_child(node.left.as_deref(), qualify),
                op,
                format_child(node.right.as_deref(), qualify),
            )
        }
        NodeType::And => format_logical(node, "AND", qualify),
        NodeType::Or => format_logical(node, "OR", qualify),
        NodeType::Xor => format_logical(node, "XOR", qualify),
        NodeType::ExpressionList => {
            let items: Vec<String> = match &node.value {
                NodeValue::ExprList(items) => {
                    items.iter().map(|i| format_expression(i, qualify)).collect()
                }
                _ => Vec::new(),
            };
            format!("({})", items.join(", "))
        }
        NodeType::Subquery => "(SUBQUERY)".to_string(),
    }
}

fn format_identifier(node: &ExprNode, qualify: bool) -> String {
    let column = node.source_column.as_deref().unwrap_or("?");
    match (&node.source, qualify) {
        (Some(source), true) => format!("{source}.{column}"),
        _ => column.to_string(),
    }
}

fn format_literal(node: &ExprNode) -> String {
    match node.value.as_literal() {
        Some(value) => value.to_string(),
        None => "NULL".to_string(),
    }
}

fn format_child(node: Option<&ExprNode>, qualify: bool) -> String {
    match node {
        Some(n) => format_expression(n, qualify),
        None => "?".to_string(),
    }
}

fn format_logical(node: &ExprNode, op: &str, qualify: bool) -> String {
    format!(
        "({} {op} {})",
        format_child(node.left.as_deref(), qualify),
        format_child(node.right.as_deref(), qualify),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::Value;

    #[test]
    fn qualifies_identifier_when_source_known() {
        let mut node = ExprNode::identifier("user_name");
        node.source = Some("tweets".to_string());
        assert_eq!(format_expression(&node, true), "tweets.user_name");
        assert_eq!(format_expression(&node, false), "user_name");
    }

    #[test]
    fn formats_function_call() {
        let mut node = ExprNode::new(NodeType::Function);
        node.value = NodeValue::Ident("STARTS_WITH".to_string());
        node.parameters = vec![
            ExprNode::identifier("name"),
            ExprNode::literal(Value::String("ab".to_string()), strata_common::DataType::Varchar),
        ];
        assert_eq!(format_expression(&node, false), "STARTS_WITH(name, 'ab')");
    }

    #[test]
    fn formats_binary_operator() {
        let mut node = ExprNode::new(NodeType::ComparisonOperator);
        node.value = NodeValue::Operator("Eq".to_string());
        node.left = Some(Box::new(ExprNode::identifier("x")));
        node.right = Some(Box::new(ExprNode::literal(
            Value::Int64(1),
            strata_common::DataType::Integer,
        )));
        assert_eq!(format_expression(&node, false), "x Eq 1");
    }
}
