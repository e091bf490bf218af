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

//! Numeric scalar functions, grounded on `opteryx.functions.number_functions`.

use rand::Rng;
use strata_common::{data_error, Result, Value};

pub fn pi(_args: &[Value]) -> Result<Value> {
    Ok(Value::Float64(std::f64::consts::PI))
}

/// `ROUND(x)` rounds to the nearest integer; `ROUND(x, n)` rounds to `n`
/// decimal places, matching the source's two-arity dispatch.
pub fn round(args: &[Value]) -> Result<Value> {
    match args {
        [Value::Float64(x)] => Ok(Value::Float64(x.round())),
        [Value::Int64(x)] => Ok(Value::Int64(*x)),
        [Value::Float64(x), Value::Int64(decimals)] => {
            let factor = 10f64.powi(*decimals as i32);
            Ok(Value::Float64((x * factor).round() / factor))
        }
        _ => Err(data_error!("ROUND expects (number) or (number, decimals)")),
    }
}

pub fn random(_args: &[Value]) -> Result<Value> {
    Ok(Value::Float64(rand::rng().random::<f64>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pi_is_the_constant() {
        assert_eq!(pi(&[]).unwrap(), Value::Float64(std::f64::consts::PI));
    }

    #[test]
    fn round_single_arg() {
        assert_eq!(round(&[Value::Float64(3.7)]).unwrap(), Value::Float64(4.0));
    }

    #[test]
    fn round_with_decimals() {
        assert_eq!(
            round(&[Value::Float64(3.14159), Value::Int64(2)]).unwrap(),
            Value::Float64(3.14)
        );
    }
}
