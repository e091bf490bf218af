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

//! A bounded byte arena shared between the async scan's background reader
//! thread (writer) and the operator's own thread (reader).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use strata_common::{invalid_state, Result};

/// A handle to a blob's bytes held in a `MemoryPool`. Opaque outside this
/// module; only valid for one `read_and_release` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReference {
    id: u64,
    pub len: usize,
}

struct PoolInner {
    used: usize,
    slots: HashMap<u64, Vec<u8>>,
}

/// A bounded arena of raw blob payloads. Writers (the scan's background
/// reader task) reserve space and insert bytes; the operator thread copies
/// bytes out and releases the reservation. Access is serialized by the
/// pool's own lock; callers never see the pool's internal storage directly.
pub struct MemoryPool {
    name: String,
    capacity: usize,
    inner: Mutex<PoolInner>,
    not_full: Condvar,
    next_id: AtomicU64,
}

impl MemoryPool {
    pub fn new(capacity: usize, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity,
            inner: Mutex::new(PoolInner {
                used: 0,
                slots: HashMap::new(),
            }),
            not_full: Condvar::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used_bytes(&self) -> usize {
        self.inner.lock().used
    }

    /// Reserves space for `bytes` and stores them, blocking the caller until
    /// enough capacity has been released by readers. Returns an error if a
    /// single blob is larger than the pool's total capacity - no amount of
    /// waiting would ever free enough space.
    pub fn write(&self, bytes: Vec<u8>) -> Result<PoolReference> {
        let len = bytes.len();
        if len > self.capacity {
            return Err(invalid_state!(
                "blob of {len} bytes exceeds pool '{}' capacity of {} bytes",
                self.name,
                self.capacity
            ));
        }

        let mut inner = self.inner.lock();
        while inner.used + len > self.capacity {
            self.not_full.wait(&mut inner);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        inner.used += len;
        inner.slots.insert(id, bytes);
        Ok(PoolReference { id, len })
    }

    /// Copies a blob's bytes out of the pool and releases its reservation.
    ///
    /// `zero_copy` must be `false`: the pool is concurrently mutated by the
    /// writer thread, so handing back a borrowed view into pool storage
    /// would risk a read-after-free once the slot is reused.
    pub fn read_and_release(&self, reference: PoolReference, zero_copy: bool) -> Result<Vec<u8>> {
        if zero_copy {
            return Err(invalid_state!(
                "zero-copy reads from a concurrently mutated memory pool are not supported"
            ));
        }

        let mut inner = self.inner.lock();
        let bytes = inner.slots.remove(&reference.id).ok_or_else(|| {
            invalid_state!("pool reference {} already released", reference.id)
        })?;
        inner.used -= bytes.len();
        drop(inner);
        self.not_full.notify_all();
        Ok(bytes)
    }
}

/// A thin, cloneable handle to a shared `MemoryPool`, used from the async
/// scan's background reader task.
#[derive(Clone)]
pub struct AsyncMemoryPool {
    pool: Arc<MemoryPool>,
}

impl AsyncMemoryPool {
    pub fn new(pool: Arc<MemoryPool>) -> Self {
        Self { pool }
    }

    pub fn write(&self, bytes: Vec<u8>) -> Result<PoolReference> {
        self.pool.write(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let pool = MemoryPool::new(1024, "test");
        let reference = pool.write(vec![1, 2, 3]).unwrap();
        assert_eq!(pool.used_bytes(), 3);
        let bytes = pool.read_and_release(reference, false).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(pool.used_bytes(), 0);
    }

    #[test]
    fn zero_copy_is_rejected() {
        let pool = MemoryPool::new(1024, "test");
        let reference = pool.write(vec![1]).unwrap();
        assert!(pool.read_and_release(reference, true).is_err());
    }

    #[test]
    fn oversized_blob_is_rejected() {
        let pool = MemoryPool::new(4, "test");
        assert!(pool.write(vec![0; 8]).is_err());
    }
}
