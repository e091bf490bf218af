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

//! The contracts a connector implements so [`super::async_scan::AsyncScan`]
//! can read it. Everything behind these traits - object-store clients,
//! file-format decoders, the data catalog's partition listings - is an
//! external collaborator; only the boundary is specified here.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use strata_common::Result;
use strata_execution::{AsyncMemoryPool, EngineStatistics, PoolReference};

/// A predicate pushed down to a reader or partition scheme, already
/// rendered to its canonical textual form by the planner. This crate does
/// not depend on the expression tree crate, so predicates cross this
/// boundary as opaque formatted strings rather than `ExprNode`s.
pub type PushedPredicate = String;

/// A reader-supplied strategy that enumerates blob names matching a time
/// range and prefix, optionally narrowed by pushed predicates.
pub trait PartitionScheme: Send + Sync {
    fn get_blobs_in_partition(
        &self,
        start_date: i64,
        end_date: i64,
        list_blobs: &dyn Fn(&str) -> Result<Vec<String>>,
        prefix: &str,
        predicates: &[PushedPredicate],
    ) -> Result<Vec<String>>;
}

/// A connector consumed by [`super::async_scan::AsyncScan`].
#[async_trait]
pub trait Reader: Send + Sync {
    fn dataset(&self) -> &str;
    fn start_date(&self) -> i64;
    fn end_date(&self) -> i64;
    fn partition_scheme(&self) -> &dyn PartitionScheme;
    fn get_list_of_blob_names(&self, prefix: &str) -> Result<Vec<String>>;

    /// Reads one blob's raw bytes into `pool` and returns a reference to
    /// them. Runs on the scan's background executor, potentially one of
    /// many concurrent calls gated by a `CONCURRENT_READS` semaphore.
    async fn async_read_blob(
        &self,
        blob_name: &str,
        pool: AsyncMemoryPool,
        statistics: Arc<EngineStatistics>,
    ) -> Result<PoolReference>;
}

/// A decoder for one blob's bytes, keyed externally by blob name
/// (extension/MIME, with optional compression suffix).
pub trait Decoder: Send + Sync {
    /// Returns `(row_count, schema_note, morsel)`. `schema_note` carries any
    /// decoder-specific diagnostic (e.g. a detected struct-to-JSONB
    /// coercion); the scan does not interpret it beyond logging.
    fn decode(
        &self,
        bytes: &[u8],
        projection: &[String],
        predicates: &[PushedPredicate],
    ) -> Result<(usize, Option<String>, RecordBatch)>;
}

/// Resolves a decoder for a blob name. Kept separate from `Reader` because a
/// single reader may serve blobs of more than one format.
pub trait DecoderRegistry: Send + Sync {
    fn decoder_for(&self, blob_name: &str) -> Result<Arc<dyn Decoder>>;
}
