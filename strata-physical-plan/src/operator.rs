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

//! The uniform operator contract every vectorized execution node implements.

use arrow::record_batch::RecordBatch;
use smallvec::SmallVec;
use strata_common::Result;

use crate::morsel::MorselSignal;

/// One operator on the execution pipeline. `execute` consumes exactly one
/// input signal and may answer with zero, one or more morsels; state is kept
/// across calls on `&mut self`. `Eos` must only be forwarded downstream
/// after an operator's own pending output for that call has drained, which
/// here means: the `Eos` call's return value is the operator's last word.
pub trait Operator: Send {
    fn execute(&mut self, input: MorselSignal) -> Result<SmallVec<[RecordBatch; 1]>>;
}

/// Which input edge a morsel arrived on. Used by operators with more than
/// one input (the hash join) to multiplex build-side and probe-side morsels
/// through a single state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSide {
    Left,
    Right,
}

/// The multi-input counterpart of [`Operator`]. The framework is responsible
/// for draining the build side (`Left`) to `Eos` before feeding the probe
/// side (`Right`).
pub trait MultiInputOperator: Send {
    fn execute(&mut self, side: StreamSide, input: MorselSignal) -> Result<SmallVec<[RecordBatch; 1]>>;
}
