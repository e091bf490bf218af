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

//! Execution-time state: the engine handle, session variables, scalar and
//! aggregate function registries, resolved configuration and the bounded
//! memory pool the async scan reads into. Nothing here depends on the
//! expression tree or the optimizer - those crates depend on this one.

pub mod config;
pub mod engine;
pub mod functions;
pub mod memory_pool;
pub mod variables;

pub use config::{EngineConfig, MetadataServer};
pub use engine::{Engine, EngineStatistics};
pub use functions::{AggregateDescriptor, AggregateRegistry, FunctionDescriptor, FunctionRegistry};
pub use memory_pool::{AsyncMemoryPool, MemoryPool, PoolReference};
pub use variables::VariableStore;
