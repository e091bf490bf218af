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

//! The async scan operator: lists blobs for a relation, fans out bounded
//! concurrent reads on a dedicated background thread, and decodes each blob
//! into a morsel with a single, stable output schema. Each decoded morsel is
//! normalized before that stability cast: struct columns become JSON text
//! and every column is aligned to the bound relation schema's declared type.

use std::sync::mpsc::{sync_channel, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, StructArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType as ArrowType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use log::warn;
use smallvec::SmallVec;
use strata_common::{data_error, Column, DataType, RelationSchema, Result, StrataError};
use strata_execution::{AsyncMemoryPool, EngineConfig, EngineStatistics, MemoryPool, PoolReference};
use tokio::sync::Semaphore;

use crate::morsel::MorselSignal;
use crate::operator::Operator;
use crate::scan::traits::{DecoderRegistry, PushedPredicate, Reader};

/// The 100ms reply-queue poll timeout named in the concurrency model: a
/// stall detector for statistics, not a query timeout.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// One background-thread fetch result, or the termination marker. Only a
/// `PoolReference` crosses the channel - the bytes stay in the pool until
/// the operator thread copy-releases them, matching the source's
/// `(blob_name, reference)` tuple on its reply queue.
enum ReplyItem {
    Blob { name: String, reference: PoolReference },
    Done,
}

/// Materializes a relation by reading and decoding its blobs. One instance
/// per scanned relation per statement.
pub struct AsyncScan {
    reader: Arc<dyn Reader>,
    decoders: Arc<dyn DecoderRegistry>,
    relation_schema: RelationSchema,
    projection: Vec<String>,
    predicates: Vec<PushedPredicate>,
    pool: Arc<MemoryPool>,
    concurrent_reads: usize,
    statistics: Arc<EngineStatistics>,
    done: bool,
}

impl AsyncScan {
    pub fn new(
        reader: Arc<dyn Reader>,
        decoders: Arc<dyn DecoderRegistry>,
        relation_schema: RelationSchema,
        projection: Vec<String>,
        predicates: Vec<PushedPredicate>,
        config: &EngineConfig,
        statistics: Arc<EngineStatistics>,
    ) -> Self {
        let pool = Arc::new(MemoryPool::new(
            config.max_read_buffer_capacity,
            format!("ReadBuffer <{}>", reader.dataset()),
        ));
        Self {
            reader,
            decoders,
            relation_schema,
            projection,
            predicates,
            pool,
            concurrent_reads: config.concurrent_reads,
            statistics,
            done: false,
        }
    }

    /// The relation schema narrowed to the projected columns, in relation
    /// order. An empty projection means "no column was pushed down" and
    /// keeps the full schema.
    fn output_columns(&self) -> Vec<&Column> {
        if self.projection.is_empty() {
            self.relation_schema.columns.iter().collect()
        } else {
            self.relation_schema
                .columns
                .iter()
                .filter(|c| self.projection.iter().any(|p| p == c.name()))
                .collect()
        }
    }

    /// Aligns a freshly decoded morsel to the bound output schema: selects
    /// the declared columns by name and casts each to its declared type.
    /// Runs before the cross-blob stability cast in `decode_blob`, so it's
    /// this step - not that one - that a schema-evolved blob has to survive.
    /// A `Struct` column has already become a JSON string by this point, so
    /// its declared type resolves to `Utf8` rather than `Struct` here.
    fn normalize_to_output_schema(&self, morsel: RecordBatch) -> Result<RecordBatch> {
        let output_columns = self.output_columns();
        let mut fields = Vec::with_capacity(output_columns.len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(output_columns.len());
        for column in output_columns {
            let target_type = if matches!(column.ty(), DataType::Struct) {
                ArrowType::Utf8
            } else {
                column.ty().to_arrow()
            };
            let array = morsel.column_by_name(column.name()).ok_or_else(|| {
                data_error!(
                    "decoded blob for '{}' is missing column '{}' declared in its relation schema",
                    self.relation_schema.name,
                    column.name()
                )
            })?;
            let array = if array.data_type() == &target_type {
                Arc::clone(array)
            } else {
                cast(array.as_ref(), &target_type)?
            };
            fields.push(Field::new(column.name(), target_type, true));
            columns.push(array);
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(StrataError::from)
    }

    fn run(&mut self) -> Result<SmallVec<[RecordBatch; 1]>> {
        self.statistics
            .columns_read
            .fetch_add(self.output_columns().len() as u64, std::sync::atomic::Ordering::Relaxed);

        let blob_names = {
            let reader = Arc::clone(&self.reader);
            let list_fn = |prefix: &str| reader.get_list_of_blob_names(prefix);
            self.reader.partition_scheme().get_blobs_in_partition(
                self.reader.start_date(),
                self.reader.end_date(),
                &list_fn,
                self.reader.dataset(),
                &self.predicates,
            )?
        };

        if blob_names.is_empty() {
            self.statistics
                .empty_datasets
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            return Ok(SmallVec::from_elem(self.empty_morsel(), 1));
        }

        let (reply_tx, reply_rx) = sync_channel::<ReplyItem>(self.concurrent_reads * 2);
        let reader = Arc::clone(&self.reader);
        let pool = Arc::clone(&self.pool);
        let statistics = Arc::clone(&self.statistics);
        let concurrent_reads = self.concurrent_reads;

        let io_thread = thread::Builder::new()
            .name("strata-async-scan".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed to start the scan's background tokio runtime");
                runtime.block_on(fetch_all(
                    blob_names,
                    reader,
                    AsyncMemoryPool::new(pool),
                    statistics,
                    reply_tx,
                    concurrent_reads,
                ));
            })
            .expect("failed to spawn the scan's background thread");

        let mut morsels: SmallVec<[RecordBatch; 1]> = SmallVec::new();
        let mut output_schema: Option<SchemaRef> = None;

        loop {
            match reply_rx.recv_timeout(POLL_TIMEOUT) {
                Ok(ReplyItem::Done) => break,
                Ok(ReplyItem::Blob { name, reference }) => {
                    match self.decode_blob(&name, reference, &mut output_schema) {
                        Ok(Some(morsel)) => morsels.push(morsel),
                        Ok(None) => {}
                        Err(err) => return Err(err),
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.statistics
                        .stalls_reading_from_read_buffer
                        .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    self.statistics.add_io_wait(POLL_TIMEOUT);
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        io_thread
            .join()
            .expect("the scan's background thread panicked");

        if morsels.is_empty() {
            self.statistics
                .empty_datasets
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            morsels.push(self.empty_morsel());
        }

        Ok(morsels)
    }

    fn decode_blob(
        &self,
        blob_name: &str,
        reference: PoolReference,
        output_schema: &mut Option<SchemaRef>,
    ) -> Result<Option<RecordBatch>> {
        let decoder = match self.decoders.decoder_for(blob_name) {
            Ok(decoder) => decoder,
            Err(err) => {
                self.record_failed_read(blob_name, &err);
                return Ok(None);
            }
        };

        // the pool is concurrently mutated by the background reader thread;
        // zero-copy here would risk a read-after-free once a slot is reused.
        let bytes = match self.pool.read_and_release(reference, false) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.record_failed_read(blob_name, &err);
                return Ok(None);
            }
        };

        let projection: Vec<String> = self
            .output_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let start = Instant::now();
        let decoded = decoder.decode(&bytes, &projection, &self.predicates);
        self.statistics.add_time_reading_blobs(start.elapsed());

        let (num_rows, _meta, mut morsel) = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                let message = err.to_string();
                if message.contains("No match for") {
                    return Err(data_error!(
                        "Unable to read blob {blob_name} - this error is likely caused by a blob having a significantly different schema to previously handled blobs, or the data catalog."
                    ));
                }
                self.record_failed_read(blob_name, &err);
                return Ok(None);
            }
        };

        self.statistics
            .rows_seen
            .fetch_add(num_rows as u64, std::sync::atomic::Ordering::Relaxed);

        morsel = struct_to_jsonb(morsel)?;
        morsel = self.normalize_to_output_schema(morsel)?;

        morsel = match output_schema {
            Some(schema) => cast_to_schema(morsel, schema)?,
            None => {
                *output_schema = Some(morsel.schema());
                morsel
            }
        };

        self.statistics
            .blobs_read
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.statistics
            .rows_read
            .fetch_add(morsel.num_rows() as u64, std::sync::atomic::Ordering::Relaxed);
        self.statistics
            .bytes_out
            .fetch_add(morsel.get_array_memory_size() as u64, std::sync::atomic::Ordering::Relaxed);

        Ok(Some(morsel))
    }

    fn record_failed_read(&self, blob_name: &str, err: &StrataError) {
        self.statistics.add_message(format!("failed to read {blob_name}"));
        self.statistics
            .failed_reads
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        warn!("failed to read {blob_name} - {err}");
    }

    /// An empty morsel matching the schema a real decode would normalize to -
    /// a `Struct`-tagged column resolves to `Utf8` here too, since
    /// `normalize_to_output_schema` would never hand back a `Struct` array.
    fn empty_morsel(&self) -> RecordBatch {
        let fields: Vec<_> = self
            .output_columns()
            .iter()
            .map(|c| {
                let ty = if matches!(c.ty(), DataType::Struct) {
                    ArrowType::Utf8
                } else {
                    c.ty().to_arrow()
                };
                Field::new(c.name(), ty, true)
            })
            .collect();
        RecordBatch::new_empty(Arc::new(Schema::new(fields)))
    }
}

impl Operator for AsyncScan {
    /// The scan has no real input edge; it runs its whole protocol to
    /// completion on the first call and reports done on every call after.
    fn execute(&mut self, _input: MorselSignal) -> Result<SmallVec<[RecordBatch; 1]>> {
        if self.done {
            return Ok(SmallVec::new());
        }
        self.done = true;
        self.run()
    }
}

async fn fetch_all(
    blob_names: Vec<String>,
    reader: Arc<dyn Reader>,
    pool: AsyncMemoryPool,
    statistics: Arc<EngineStatistics>,
    reply_tx: std::sync::mpsc::SyncSender<ReplyItem>,
    concurrent_reads: usize,
) {
    let semaphore = Arc::new(Semaphore::new(concurrent_reads));
    let mut tasks = tokio::task::JoinSet::new();

    for blob_name in blob_names {
        let reader = Arc::clone(&reader);
        let pool = pool.clone();
        let statistics = Arc::clone(&statistics);
        let semaphore = Arc::clone(&semaphore);
        let reply_tx = reply_tx.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire().await.expect("scan semaphore closed early");
            let start_per_blob = Instant::now();
            let reference = reader
                .async_read_blob(&blob_name, pool, Arc::clone(&statistics))
                .await;
            statistics.add_time_reading_blobs(start_per_blob.elapsed());
            match reference {
                Ok(reference) => {
                    let _ = reply_tx.send(ReplyItem::Blob { name: blob_name, reference });
                }
                Err(err) => {
                    statistics.add_message(format!("failed to read {blob_name} - {err}"));
                    statistics
                        .failed_reads
                        .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {}
    let _ = reply_tx.send(ReplyItem::Done);
}

/// Converts every `Struct`-typed column of a decoded morsel into a `Utf8`
/// column of JSON text, one object per row. Runs immediately after decode,
/// before the morsel is aligned to the bound output schema, since a `Struct`
/// column never survives decode in its original physical shape.
fn struct_to_jsonb(morsel: RecordBatch) -> Result<RecordBatch> {
    let schema = morsel.schema();
    if !schema.fields().iter().any(|f| matches!(f.data_type(), ArrowType::Struct(_))) {
        return Ok(morsel);
    }

    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for (field, array) in schema.fields().iter().zip(morsel.columns()) {
        if matches!(field.data_type(), ArrowType::Struct(_)) {
            let struct_array = array
                .as_any()
                .downcast_ref::<StructArray>()
                .ok_or_else(|| data_error!("column '{}' is declared Struct but isn't a struct array", field.name()))?;
            let strings: StringArray = (0..struct_array.len())
                .map(|row| {
                    if struct_array.is_null(row) {
                        None
                    } else {
                        Some(struct_row_to_json(struct_array, row).to_string())
                    }
                })
                .collect();
            fields.push(Field::new(field.name(), ArrowType::Utf8, field.is_nullable()));
            columns.push(Arc::new(strings));
        } else {
            fields.push(field.as_ref().clone());
            columns.push(Arc::clone(array));
        }
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(StrataError::from)
}

/// Serializes one row of a struct column to a JSON object, recursing into
/// nested structs. Grounded on the physical types this engine actually
/// decodes (int/float/utf8/bool); anything else serializes as `null` rather
/// than guessing at a representation.
fn struct_row_to_json(struct_array: &StructArray, row: usize) -> serde_json::Value {
    let ArrowType::Struct(fields) = struct_array.data_type() else {
        unreachable!("a StructArray's data type is always Struct");
    };
    let mut object = serde_json::Map::with_capacity(fields.len());
    for (field, column) in fields.iter().zip(struct_array.columns()) {
        object.insert(field.name().clone(), array_value_to_json(column.as_ref(), row));
    }
    serde_json::Value::Object(object)
}

fn array_value_to_json(array: &dyn Array, row: usize) -> serde_json::Value {
    if array.is_null(row) {
        return serde_json::Value::Null;
    }
    if let Some(values) = array.as_any().downcast_ref::<StructArray>() {
        return struct_row_to_json(values, row);
    }
    if let Some(values) = array.as_any().downcast_ref::<Int64Array>() {
        return serde_json::Value::from(values.value(row));
    }
    if let Some(values) = array.as_any().downcast_ref::<Float64Array>() {
        return serde_json::Value::from(values.value(row));
    }
    if let Some(values) = array.as_any().downcast_ref::<BooleanArray>() {
        return serde_json::Value::from(values.value(row));
    }
    if let Some(values) = array.as_any().downcast_ref::<StringArray>() {
        return serde_json::Value::from(values.value(row));
    }
    serde_json::Value::Null
}

fn cast_to_schema(morsel: RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    if morsel.schema().as_ref() == schema.as_ref() {
        return Ok(morsel);
    }
    let columns = morsel
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(array, field)| cast(array.as_ref(), field.data_type()).map_err(StrataError::from))
        .collect::<Result<Vec<_>>>()?;
    RecordBatch::try_new(Arc::clone(schema), columns).map_err(StrataError::from)
}
