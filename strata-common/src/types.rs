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

//! Domain type tags used by the expression tree and schema, distinct from
//! (but convertible to) `arrow::datatypes::DataType`.

use arrow::datatypes::DataType as ArrowType;

/// A Strata-level type tag. Kept separate from Arrow's `DataType` so the
/// binder can reason about SQL-ish types (e.g. `Interval`) before a morsel's
/// concrete Arrow schema exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Unknown,
    Boolean,
    Integer,
    Float,
    Varchar,
    Binary,
    Timestamp,
    Interval,
    Struct,
}

impl DataType {
    pub fn to_arrow(self) -> ArrowType {
        match self {
            DataType::Unknown => ArrowType::Null,
            DataType::Boolean => ArrowType::Boolean,
            DataType::Integer => ArrowType::Int64,
            DataType::Float => ArrowType::Float64,
            DataType::Varchar => ArrowType::Utf8,
            DataType::Binary => ArrowType::Binary,
            DataType::Timestamp => ArrowType::Timestamp(arrow::datatypes::TimeUnit::Nanosecond, None),
            DataType::Interval => {
                ArrowType::Interval(arrow::datatypes::IntervalUnit::MonthDayNano)
            }
            DataType::Struct => ArrowType::Struct(Default::default()),
        }
    }
}

impl Default for DataType {
    fn default() -> Self {
        DataType::Unknown
    }
}

/// The kind of source connector a relation is read through. LIKE-pattern
/// rewrites only fire when a predicate's left operand is known to originate
/// from a connector outside this set, because `Sql`/`Cql` connectors can push
/// LIKE down natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    Sql,
    Cql,
    Blob,
    File,
}
