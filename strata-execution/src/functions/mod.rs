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

//! Scalar function and aggregator registries. Per the source's design, a
//! function name and an aggregator name are fused into one lookup key in
//! the original, but `node_type` already tells the binder which kind of
//! call it's looking at, so Strata keeps the two registries explicit.

mod number;
mod text;

use std::collections::HashMap;

use strata_common::{Result, Value};

pub type ScalarImpl = fn(&[Value]) -> Result<Value>;

#[derive(Clone, Copy)]
pub struct FunctionDescriptor {
    pub name: &'static str,
    pub implementation: ScalarImpl,
}

#[derive(Clone, Copy)]
pub struct AggregateDescriptor {
    pub name: &'static str,
}

/// Flat mapping from uppercased scalar-function name to its descriptor.
pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionDescriptor>,
}

impl FunctionRegistry {
    /// The built-in scalar functions: numeric helpers plus the targets of
    /// the predicate rewriter's LIKE-family rewrites.
    pub fn builtin() -> Self {
        let entries: &[(&str, ScalarImpl)] = &[
            ("PI", number::pi as ScalarImpl),
            ("ROUND", number::round as ScalarImpl),
            ("RANDOM", number::random as ScalarImpl),
            ("STARTS_WITH", text::starts_with as ScalarImpl),
            ("ENDS_WITH", text::ends_with as ScalarImpl),
            ("SEARCH", text::search as ScalarImpl),
        ];
        let functions = entries
            .iter()
            .map(|(name, implementation)| {
                (
                    *name,
                    FunctionDescriptor {
                        name,
                        implementation: *implementation,
                    },
                )
            })
            .collect();
        Self { functions }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name.to_uppercase().as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Flat mapping from uppercased aggregator name to its descriptor. Kept as
/// a distinct registry from `FunctionRegistry` per the "two registries, one
/// lookup key" design note - the binder picks one or the other based on the
/// node's `NodeType`.
pub struct AggregateRegistry {
    aggregators: HashMap<&'static str, AggregateDescriptor>,
}

impl AggregateRegistry {
    pub fn builtin() -> Self {
        let names = ["COUNT", "SUM", "MIN", "MAX", "AVG"];
        let aggregators = names
            .iter()
            .map(|name| (*name, AggregateDescriptor { name }))
            .collect();
        Self { aggregators }
    }

    pub fn get(&self, name: &str) -> Option<&AggregateDescriptor> {
        self.aggregators.get(name.to_uppercase().as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.aggregators.keys().copied()
    }
}

impl Default for AggregateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
