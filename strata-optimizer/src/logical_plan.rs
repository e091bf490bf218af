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

//! A minimal logical plan carrying only the node kinds the predicate
//! rewriter and the binder need to see. Building out join reordering,
//! predicate pushdown into scans, or projection pruning is a different
//! strategy's job and out of scope here.

use strata_common::RelationSchema;
use strata_expr::ExprNode;

#[derive(Debug, Clone)]
pub enum LogicalPlan {
    Scan {
        relation: String,
        schema: RelationSchema,
    },
    Filter {
        condition: ExprNode,
        input: Box<LogicalPlan>,
    },
    Project {
        columns: Vec<ExprNode>,
        input: Box<LogicalPlan>,
    },
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        left_columns: Vec<String>,
        right_columns: Vec<String>,
    },
}
