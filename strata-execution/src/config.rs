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

//! Resolved engine configuration. Sourcing these values from the
//! environment or a config file is outside this crate's scope - callers
//! build an `EngineConfig` however they like and hand it to the `Engine`.

/// Where the metadata/catalog server lives. `Local` is the default; a
/// caller pointing at a remote catalog sets `Remote(url)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataServer {
    Local,
    Remote(String),
}

impl Default for MetadataServer {
    fn default() -> Self {
        MetadataServer::Local
    }
}

impl MetadataServer {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => MetadataServer::Local,
            Some(value) if value.eq_ignore_ascii_case("local") => MetadataServer::Local,
            Some(value) => MetadataServer::Remote(value.to_string()),
        }
    }
}

/// Resolved values for the configuration keys the async scan and its
/// memory pool read.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum number of blob reads the async scan issues concurrently.
    pub concurrent_reads: usize,
    /// Capacity, in bytes, of the scan's bounded read-buffer memory pool.
    pub max_read_buffer_capacity: usize,
    pub metadata_server: MetadataServer,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrent_reads: 4,
            max_read_buffer_capacity: 64 * 1024 * 1024,
            metadata_server: MetadataServer::default(),
        }
    }
}
