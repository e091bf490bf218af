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

//! Text functions the predicate rewriter's LIKE-family rewrites target
//! (`STARTS_WITH`, `ENDS_WITH`, `SEARCH`). Registered so the binder's
//! function lookup succeeds once a rewrite has fired.

use strata_common::{data_error, Result, Value};

fn case_fold(value: &str, ignore_case: bool) -> String {
    if ignore_case {
        value.to_lowercase()
    } else {
        value.to_string()
    }
}

pub fn starts_with(args: &[Value]) -> Result<Value> {
    match args {
        [Value::String(s), Value::String(pattern), Value::Boolean(ignore_case)] => Ok(
            Value::Boolean(case_fold(s, *ignore_case).starts_with(&case_fold(pattern, *ignore_case))),
        ),
        _ => Err(data_error!("STARTS_WITH expects (string, string, bool)")),
    }
}

pub fn ends_with(args: &[Value]) -> Result<Value> {
    match args {
        [Value::String(s), Value::String(pattern), Value::Boolean(ignore_case)] => Ok(
            Value::Boolean(case_fold(s, *ignore_case).ends_with(&case_fold(pattern, *ignore_case))),
        ),
        _ => Err(data_error!("ENDS_WITH expects (string, string, bool)")),
    }
}

pub fn search(args: &[Value]) -> Result<Value> {
    match args {
        [Value::String(s), Value::String(pattern), Value::Boolean(ignore_case)] => Ok(
            Value::Boolean(case_fold(s, *ignore_case).contains(&case_fold(pattern, *ignore_case))),
        ),
        _ => Err(data_error!("SEARCH expects (string, string, bool)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_is_case_sensitive_by_default() {
        let args = [
            Value::String("abcdef".into()),
            Value::String("ABC".into()),
            Value::Boolean(false),
        ];
        assert_eq!(starts_with(&args).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn search_ignores_case_when_asked() {
        let args = [
            Value::String("ABCDEF".into()),
            Value::String("cd".into()),
            Value::Boolean(true),
        ];
        assert_eq!(search(&args).unwrap(), Value::Boolean(true));
    }
}
