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

//! Session variable storage. Process-scoped and single-threaded; mutated by
//! a `SetVariable` statement, read by the binder when it encounters an
//! identifier whose name starts with `@`.

use std::collections::HashMap;

use strata_common::schema::next_identity;
use strata_common::suggest::suggest_alternative;
use strata_common::{ConstantColumn, DataType, Result, StrataError, Value};

/// The session variable store. One instance lives on the `Engine` handle;
/// `SetVariable` is the only statement kind allowed to mutate it.
#[derive(Debug, Default)]
pub struct VariableStore {
    variables: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Returns a bound constant column for a `@variable` reference, as the
    /// binder's identifier-resolution step requires.
    pub fn as_column(&self, name: &str) -> Result<ConstantColumn> {
        let value = self.variables.get(name).cloned().ok_or_else(|| {
            StrataError::ColumnNotFound {
                column: name.to_string(),
                suggestion: suggest_alternative(name, self.variables.keys().map(String::as_str)),
            }
        })?;
        let ty = datatype_of(&value);
        Ok(ConstantColumn {
            identity: next_identity(),
            name: name.to_string(),
            aliases: Vec::new(),
            ty,
            value,
        })
    }
}

fn datatype_of(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Unknown,
        Value::Boolean(_) => DataType::Boolean,
        Value::Int64(_) => DataType::Integer,
        Value::Float64(_) => DataType::Float,
        Value::Bytes(_) => DataType::Binary,
        Value::String(_) => DataType::Varchar,
        Value::Timestamp(_) => DataType::Timestamp,
        Value::Interval(_) => DataType::Interval,
        Value::List(_) => DataType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_resolve_as_column() {
        let mut store = VariableStore::new();
        store.set("@threshold", Value::Int64(42));
        let column = store.as_column("@threshold").unwrap();
        assert_eq!(column.value, Value::Int64(42));
        assert_eq!(column.ty, DataType::Integer);
    }

    #[test]
    fn unknown_variable_is_column_not_found() {
        let store = VariableStore::new();
        assert!(matches!(
            store.as_column("@missing"),
            Err(StrataError::ColumnNotFound { .. })
        ));
    }
}
