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

//! The context threaded through binding: the schema environment, a handle
//! to session state, and statement-scoped statistics.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use strata_common::{RelationSchema, DERIVED_SCHEMA};
use strata_execution::VariableStore;

/// Counters the binder and scan update during one statement's lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingStatistics {
    pub rows_read: u64,
    pub blobs_read: u64,
    pub stalls: u64,
    pub io_wait: Duration,
}

/// The binder is single-threaded, so the connection handle only needs to be
/// cheaply cloneable, not shareable across threads - `Rc` rather than `Arc`.
#[derive(Debug, Clone)]
pub struct BindingContext {
    pub schemas: HashMap<String, RelationSchema>,
    pub connection: Rc<VariableStore>,
    pub statistics: BindingStatistics,
}

impl BindingContext {
    /// A fresh context over the given relation schemas, plus the always
    /// present `$derived` relation that accumulates columns created during
    /// binding (spec invariant: `$derived` always exists).
    pub fn new(connection: Rc<VariableStore>) -> Self {
        let mut schemas = HashMap::new();
        schemas.insert(DERIVED_SCHEMA.to_string(), RelationSchema::new(DERIVED_SCHEMA));
        Self {
            schemas,
            connection,
            statistics: BindingStatistics::default(),
        }
    }

    pub fn with_schema(mut self, schema: RelationSchema) -> Self {
        self.schemas.insert(schema.name.clone(), schema);
        self
    }

    /// Unions `other` into `self.schemas`: a new key is inserted wholesale,
    /// an existing key is merged by column identity (spec §4.2.2).
    pub fn merge_schemas(&mut self, other: HashMap<String, RelationSchema>) {
        for (name, schema) in other {
            match self.schemas.get_mut(&name) {
                Some(existing) => existing.merge(schema),
                None => {
                    self.schemas.insert(name, schema);
                }
            }
        }
    }
}
