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

//! Drives the two execution operators to completion. There is no generic
//! operator-graph scheduler here - statement dispatch is out of scope - so a
//! caller wires a small, fixed number of operators by hand and drives them
//! with these two helpers.

use arrow::record_batch::RecordBatch;
use log::debug;
use strata_common::Result;
use strata_physical_plan::{AsyncScan, HashJoinSingle, MorselSignal, MultiInputOperator, Operator, StreamSide};

/// Runs one scan to completion and collects every morsel it produces.
pub fn run_scan(scan: &mut AsyncScan) -> Result<Vec<RecordBatch>> {
    let morsels = scan.execute(MorselSignal::Eos)?.into_vec();
    debug!("scan produced {} morsels", morsels.len());
    Ok(morsels)
}

/// Feeds the build side to `Eos`, then streams the probe side through,
/// collecting the joined morsels in probe order.
pub fn run_join(join: &mut HashJoinSingle, left: Vec<RecordBatch>, right: Vec<RecordBatch>) -> Result<Vec<RecordBatch>> {
    let left_morsels = left.len();
    for batch in left {
        join.execute(StreamSide::Left, MorselSignal::Batch(batch))?;
    }
    join.execute(StreamSide::Left, MorselSignal::Eos)?;
    debug!("hash join build side finished with {left_morsels} morsels");

    let mut output = Vec::new();
    for batch in right {
        output.extend(join.execute(StreamSide::Right, MorselSignal::Batch(batch))?);
    }
    join.execute(StreamSide::Right, MorselSignal::Eos)?;
    Ok(output)
}
