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

//! The facade that ties the engine, expression, optimizer and physical-plan
//! crates into one query path: bind a hand-built logical plan, rewrite its
//! predicates, and drive the scan and join operators to completion. There is
//! no SQL parser and no cost-based planner here; a caller supplies a
//! [`LogicalPlan`] the way a parser and planner would have produced one.

pub mod bind;
pub mod evaluate;
pub mod pipeline;

pub use bind::bind_plan;
pub use evaluate::{apply_filter, evaluate_predicate};
pub use pipeline::{run_join, run_scan};

pub use strata_common::{
    next_identity, Column, ColumnIdentity, ConnectorKind, ConstantColumn, DataType, ExpressionColumn, FlatColumn,
    FunctionColumn, Interval, RelationSchema, Result, StrataError, Value,
};
pub use strata_execution::{
    AggregateDescriptor, AggregateRegistry, AsyncMemoryPool, Engine, EngineConfig, EngineStatistics,
    FunctionDescriptor, FunctionRegistry, MetadataServer, PoolReference, VariableStore,
};
pub use strata_expr::{bind as bind_expr, BindingContext, BindingStatistics, ExprNode, NodeType, NodeValue};
pub use strata_optimizer::{optimize, rewrite_predicate, LogicalPlan, OptimizationStrategy, PredicateRewriteStrategy};
pub use strata_physical_plan::{
    AsyncScan, Decoder, DecoderRegistry, HashJoinSingle, MorselSignal, MultiInputOperator, Operator,
    PartitionScheme, PushedPredicate, Reader, StreamSide,
};
