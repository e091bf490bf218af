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

//! Stable content-hash identity for expression trees, so that two
//! occurrences of the same expression collapse onto one derived column.
//!
//! Uses `ahash::RandomState` seeded with fixed keys rather than its default
//! per-process random state: identities must be reproducible across process
//! restarts, which rules out the runtime-rng seeding the rest of the
//! workspace's hash maps rely on.

use std::hash::{BuildHasher, Hash};

use ahash::RandomState;

use crate::format::format_expression;
use crate::node::{ExprNode, NodeType};

const HASH_STATE: RandomState = RandomState::with_seeds(
    0x5be7_7d9c_3c4a_d1b3,
    0x1b87_3593_aaab_21a5,
    0x9e37_79b9_7f4a_7c15,
    0xc2b2_ae3d_27d4_eb4f,
);

fn hash_value<T: Hash>(value: T) -> u64 {
    HASH_STATE.hash_one(value)
}

/// Computes `node`'s stable 64-bit identity: `hash(format(node)) XOR
/// inner(node)`, where `inner` folds the children's identities and falls
/// back to the node's own identity, bound column, value or wildcard source
/// when that fold is zero.
pub fn hash_tree(node: &ExprNode) -> u64 {
    hash_value(format_expression(node, true)) ^ inner(node)
}

fn inner(node: &ExprNode) -> u64 {
    let mut folded = 0u64;
    if let Some(left) = &node.left {
        folded ^= inner(left);
    }
    if let Some(centre) = &node.centre {
        folded ^= inner(centre);
    }
    if let Some(right) = &node.right {
        folded ^= inner(right);
    }
    for parameter in &node.parameters {
        folded ^= inner(parameter);
    }

    if folded != 0 {
        return folded;
    }

    if let Some(identity) = node.identity {
        return hash_value(identity);
    }
    if let Some(column) = &node.schema_column {
        return hash_value(column.identity());
    }
    if node.value != crate::node::NodeValue::None {
        return hash_value(format!("{:?}", node.value));
    }
    if node.node_type == NodeType::Wildcard {
        let source = node.source.clone().unwrap_or_default();
        return hash_value(format!("{source}*"));
    }
    0
}
