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

//! The value carried on an operator edge: either a batch of rows or the
//! end-of-stream sentinel.

use arrow::record_batch::RecordBatch;

/// A morsel, or the explicit end-of-stream marker for one input edge.
///
/// Kept as its own sentinel variant rather than `Option<RecordBatch>` so a
/// multi-input operator (the hash join) can tell "no data yet on this side"
/// apart from "this side is done" when multiplexing two edges.
#[derive(Debug, Clone)]
pub enum MorselSignal {
    Batch(RecordBatch),
    Eos,
}

impl MorselSignal {
    pub fn is_eos(&self) -> bool {
        matches!(self, MorselSignal::Eos)
    }

    pub fn into_batch(self) -> Option<RecordBatch> {
        match self {
            MorselSignal::Batch(batch) => Some(batch),
            MorselSignal::Eos => None,
        }
    }
}
