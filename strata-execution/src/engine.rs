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

//! `Engine` is the explicit handle that replaces the source's process
//! globals (`system_statistics`, configuration, session variables): a
//! caller owns one per connection instead of reaching into module-level
//! state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::functions::{AggregateRegistry, FunctionRegistry};
use crate::variables::VariableStore;

/// Counters the async scan and the binder update over a statement's
/// lifetime. Atomics because the scan's background reader task and the
/// operator thread both touch `time_reading_blobs`/`io_wait`.
#[derive(Default)]
pub struct EngineStatistics {
    pub rows_read: AtomicU64,
    pub rows_seen: AtomicU64,
    pub blobs_read: AtomicU64,
    pub failed_reads: AtomicU64,
    pub empty_datasets: AtomicU64,
    pub columns_read: AtomicU64,
    pub bytes_out: AtomicU64,
    pub stalls_reading_from_read_buffer: AtomicU64,
    time_reading_blobs_nanos: AtomicU64,
    io_wait_nanos: AtomicU64,
    messages: Mutex<Vec<String>>,
}

impl EngineStatistics {
    pub fn add_time_reading_blobs(&self, elapsed: Duration) {
        self.time_reading_blobs_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn time_reading_blobs(&self) -> Duration {
        Duration::from_nanos(self.time_reading_blobs_nanos.load(Ordering::Relaxed))
    }

    pub fn add_io_wait(&self, elapsed: Duration) {
        self.io_wait_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn io_wait(&self) -> Duration {
        Duration::from_nanos(self.io_wait_nanos.load(Ordering::Relaxed))
    }

    pub fn add_message(&self, message: impl Into<String>) {
        self.messages.lock().push(message.into());
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

/// Owns everything a running statement needs instead of relying on process
/// globals: resolved configuration, the function/aggregate registries,
/// session variables and statement-scoped statistics.
pub struct Engine {
    pub config: EngineConfig,
    pub functions: FunctionRegistry,
    pub aggregates: AggregateRegistry,
    pub variables: VariableStore,
    pub statistics: EngineStatistics,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            functions: FunctionRegistry::builtin(),
            aggregates: AggregateRegistry::builtin(),
            variables: VariableStore::new(),
            statistics: EngineStatistics::default(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
