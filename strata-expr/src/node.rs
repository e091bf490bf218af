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

//! The expression tree node. One `ExprNode` shape covers both
//! relational-algebra steps embedded in an expression (subqueries) and
//! ordinary scalar computation (comparisons, arithmetic, function calls,
//! identifiers, literals).

use std::collections::HashSet;

use strata_common::{Column, ConnectorKind, DataType, Value};

/// What kind of computation a node represents. `Evaluated` is assigned by
/// the binder when a node's result turns out to already exist as a derived
/// column from an earlier appearance of the same expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Identifier,
    Literal,
    Wildcard,
    Function,
    Aggregator,
    BinaryOperator,
    ComparisonOperator,
    And,
    Or,
    Xor,
    ExpressionList,
    Subquery,
    Evaluated,
}

/// The node's opaque payload. Which variant is meaningful depends on
/// `node_type`: a function name, an operator name, a literal scalar, the
/// members of an `EXPRESSION_LIST`, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    None,
    Ident(String),
    Operator(String),
    Literal(Value),
    ExprList(Vec<ExprNode>),
}

impl NodeValue {
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            NodeValue::Ident(name) | NodeValue::Operator(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            NodeValue::Literal(value) => Some(value),
            _ => None,
        }
    }
}

/// A node in an expression tree. Up to three positional children plus an
/// ordered `parameters` list (function arguments, CASE branches) cover every
/// shape in `NodeType`; `EXPRESSION_LIST` instead stores its members as
/// `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub node_type: NodeType,
    pub left: Option<Box<ExprNode>>,
    pub centre: Option<Box<ExprNode>>,
    pub right: Option<Box<ExprNode>>,
    pub parameters: Vec<ExprNode>,
    pub value: NodeValue,
    pub ty: DataType,
    pub sub_type: Option<DataType>,
    pub alias: Option<String>,
    pub source: Option<String>,
    pub source_column: Option<String>,
    pub current_name: Option<String>,
    pub query_column: Option<String>,
    pub schema_column: Option<Column>,
    pub identity: Option<u64>,
    pub do_not_create_column: bool,
    pub source_connector: HashSet<ConnectorKind>,
}

impl ExprNode {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            left: None,
            centre: None,
            right: None,
            parameters: Vec::new(),
            value: NodeValue::None,
            ty: DataType::Unknown,
            sub_type: None,
            alias: None,
            source: None,
            source_column: None,
            current_name: None,
            query_column: None,
            schema_column: None,
            identity: None,
            do_not_create_column: false,
            source_connector: HashSet::new(),
        }
    }

    pub fn identifier(source_column: impl Into<String>) -> Self {
        let source_column = source_column.into();
        Self {
            current_name: Some(source_column.clone()),
            source_column: Some(source_column),
            ..Self::new(NodeType::Identifier)
        }
    }

    pub fn literal(value: Value, ty: DataType) -> Self {
        Self {
            value: NodeValue::Literal(value),
            ty,
            ..Self::new(NodeType::Literal)
        }
    }

    pub fn is_bound(&self) -> bool {
        self.schema_column.is_some()
    }

    pub fn with_left(mut self, node: ExprNode) -> Self {
        self.left = Some(Box::new(node));
        self
    }

    pub fn with_right(mut self, node: ExprNode) -> Self {
        self.right = Some(Box::new(node));
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}
