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

//! Dynamically typed scalar values.
//!
//! Literals and session variables are dynamically typed in the planner; this
//! is the tagged sum that carries them until they're materialized as a
//! single-row Arrow array for a constant column.

use std::fmt;

/// An Arrow `IntervalMonthDayNano`-shaped interval: months, days, nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub nanos: i64,
}

impl Interval {
    pub fn new(months: i32, days: i32, nanos: i64) -> Self {
        Self { months, days, nanos }
    }
}

/// A dynamically typed scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Bytes(Vec<u8>),
    String(String),
    Timestamp(i64),
    Interval(Interval),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `List` values containing exactly one element - the shape the
    /// predicate rewriter collapses `IN (x)` into `= x`.
    pub fn is_singleton_list(&self) -> bool {
        matches!(self, Value::List(items) if items.len() == 1)
    }

    /// Pops the single element out of a one-element list, consuming `self`.
    pub fn into_singleton(self) -> Option<Value> {
        match self {
            Value::List(mut items) if items.len() == 1 => items.pop(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bytes(b) => write!(f, "{b:?}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Timestamp(t) => write!(f, "TIMESTAMP({t})"),
            Value::Interval(i) => {
                write!(f, "INTERVAL({}m {}d {}ns)", i.months, i.days, i.nanos)
            }
            Value::List(items) => {
                write!(f, "(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}
