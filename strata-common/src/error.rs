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

//! The error type used across every Strata crate.

use std::fmt;

/// The single error type surfaced by the binder, the optimizer and the
/// execution operators.
///
/// Variants map 1:1 onto the taxonomy a caller needs to distinguish: user
/// errors are fatal to the statement and carry a suggestion where one can be
/// computed; data errors are usually fatal but the async scan downgrades a
/// single blob's decode failure to a warning and keeps going; internal
/// errors indicate an invariant the rest of the engine assumes was violated.
#[derive(Debug)]
pub enum StrataError {
    ColumnNotFound {
        column: String,
        suggestion: Option<String>,
    },
    AmbiguousIdentifier {
        identifier: String,
    },
    UnexpectedDatasetReference {
        dataset: String,
    },
    FunctionNotFound {
        function: String,
        suggestion: Option<String>,
    },
    DataError(String),
    InvalidInternalState(String),
    Arrow(arrow::error::ArrowError),
    External(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = StrataError> = std::result::Result<T, E>;

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrataError::ColumnNotFound { column, suggestion } => {
                write!(f, "Column not found: {column}")?;
                if let Some(s) = suggestion {
                    write!(f, " - did you mean '{s}'?")?;
                }
                Ok(())
            }
            StrataError::AmbiguousIdentifier { identifier } => {
                write!(f, "Ambiguous identifier: {identifier}")
            }
            StrataError::UnexpectedDatasetReference { dataset } => {
                write!(f, "Unexpected dataset reference: {dataset}")
            }
            StrataError::FunctionNotFound { function, suggestion } => {
                write!(f, "Function not found: {function}")?;
                if let Some(s) = suggestion {
                    write!(f, " - did you mean '{s}'?")?;
                }
                Ok(())
            }
            StrataError::DataError(msg) => write!(f, "Data error: {msg}"),
            StrataError::InvalidInternalState(msg) => {
                write!(f, "Invalid internal state: {msg}")
            }
            StrataError::Arrow(err) => write!(f, "Arrow error: {err}"),
            StrataError::External(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StrataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StrataError::Arrow(err) => Some(err),
            StrataError::External(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<arrow::error::ArrowError> for StrataError {
    fn from(err: arrow::error::ArrowError) -> Self {
        StrataError::Arrow(err)
    }
}

#[macro_export]
macro_rules! invalid_state {
    ($($arg:tt)*) => {
        $crate::error::StrataError::InvalidInternalState(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! data_error {
    ($($arg:tt)*) => {
        $crate::error::StrataError::DataError(format!($($arg)*))
    };
}
