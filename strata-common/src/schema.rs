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

//! Relation schemas and the column variants that populate them.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::DataType;
use crate::value::Value;

/// The name of the synthetic relation that accumulates derived columns
/// during binding. Always present in a binding context's schema map.
pub const DERIVED_SCHEMA: &str = "$derived";

/// Prefix shared by synthetic broadcast/shared-table relations, which are
/// candidates for identifier resolution regardless of a node's `source`.
pub const SHARED_SCHEMA_PREFIX: &str = "$shared";

pub type ColumnIdentity = u64;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh, process-unique column identity for base (physical)
/// columns. Derived columns instead use `hash_tree` so that two occurrences
/// of the same expression collapse to one identity (see `strata_expr::identity`).
pub fn next_identity() -> ColumnIdentity {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// A physical column backed by a field in the underlying relation.
#[derive(Debug, Clone)]
pub struct FlatColumn {
    pub identity: ColumnIdentity,
    pub name: String,
    pub aliases: Vec<String>,
    pub ty: DataType,
}

/// A column bound to a literal value.
#[derive(Debug, Clone)]
pub struct ConstantColumn {
    pub identity: ColumnIdentity,
    pub name: String,
    pub aliases: Vec<String>,
    pub ty: DataType,
    pub value: Value,
}

/// A column produced by a scalar function or aggregator call, bound by name
/// to a descriptor in the engine's function registry.
#[derive(Debug, Clone)]
pub struct FunctionColumn {
    pub identity: ColumnIdentity,
    pub name: String,
    pub aliases: Vec<String>,
    pub ty: DataType,
    pub binding: String,
    pub origin: Vec<String>,
}

/// A column produced by evaluating a non-function scalar expression.
#[derive(Debug, Clone)]
pub struct ExpressionColumn {
    pub identity: ColumnIdentity,
    pub name: String,
    pub aliases: Vec<String>,
    pub ty: DataType,
    pub expression: String,
    pub origin: Vec<String>,
}

/// A column in a relation schema. Every variant carries a stable identity, a
/// display name and an ordered list of aliases.
#[derive(Debug, Clone)]
pub enum Column {
    Flat(FlatColumn),
    Constant(ConstantColumn),
    Function(FunctionColumn),
    Expression(ExpressionColumn),
}

/// Columns compare equal when their identities match - identities are
/// unique within a running query, so this is sound and lets an `ExprNode`
/// carrying a bound `Column` derive `PartialEq` for idempotence checks.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Column {}

impl Column {
    pub fn identity(&self) -> ColumnIdentity {
        match self {
            Column::Flat(c) => c.identity,
            Column::Constant(c) => c.identity,
            Column::Function(c) => c.identity,
            Column::Expression(c) => c.identity,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Column::Flat(c) => &c.name,
            Column::Constant(c) => &c.name,
            Column::Function(c) => &c.name,
            Column::Expression(c) => &c.name,
        }
    }

    pub fn aliases(&self) -> &[String] {
        match self {
            Column::Flat(c) => &c.aliases,
            Column::Constant(c) => &c.aliases,
            Column::Function(c) => &c.aliases,
            Column::Expression(c) => &c.aliases,
        }
    }

    pub fn aliases_mut(&mut self) -> &mut Vec<String> {
        match self {
            Column::Flat(c) => &mut c.aliases,
            Column::Constant(c) => &mut c.aliases,
            Column::Function(c) => &mut c.aliases,
            Column::Expression(c) => &mut c.aliases,
        }
    }

    pub fn ty(&self) -> DataType {
        match self {
            Column::Flat(c) => c.ty,
            Column::Constant(c) => c.ty,
            Column::Function(c) => c.ty,
            Column::Expression(c) => c.ty,
        }
    }

    /// Source relations a derived column was computed from. Empty for
    /// physical and constant columns.
    pub fn origin(&self) -> &[String] {
        match self {
            Column::Function(c) => &c.origin,
            Column::Expression(c) => &c.origin,
            _ => &[],
        }
    }

    /// `name` plus every alias - the full set of strings that resolve to
    /// this column during identifier lookup.
    pub fn all_names(&self) -> Vec<&str> {
        let mut names = vec![self.name()];
        names.extend(self.aliases().iter().map(String::as_str));
        names
    }

    pub fn matches(&self, needle: &str) -> bool {
        self.name() == needle || self.aliases().iter().any(|a| a == needle)
    }
}

/// An ordered collection of columns belonging to one relation.
#[derive(Debug, Clone)]
pub struct RelationSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl RelationSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn find_column(&self, needle: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.matches(needle))
    }

    pub fn find_column_by_identity(&self, identity: ColumnIdentity) -> Option<&Column> {
        self.columns.iter().find(|c| c.identity() == identity)
    }

    pub fn all_column_names(&self) -> Vec<&str> {
        self.columns.iter().flat_map(Column::all_names).collect()
    }

    /// Union this schema with `other` by column identity, per spec invariant
    /// (iv): a column present in both (same identity) contributes once.
    pub fn merge(&mut self, other: RelationSchema) {
        for column in other.columns {
            if !self
                .columns
                .iter()
                .any(|existing| existing.identity() == column.identity())
            {
                self.columns.push(column);
            }
        }
    }
}
