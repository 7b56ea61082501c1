use anyhow::{Result, bail};
use arrow_array::{FixedSizeListArray, Int64Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::Table;
use std::sync::Arc;

use complaint_core::types::IndexEntry;

use crate::schema::build_chunk_schema;
use crate::table::sql_quote;

// Bounds the length of the `key IN (...)` filter.
const KEY_LOOKUP_BATCH: usize = 256;

pub fn entries_to_record_batch(entries: &[IndexEntry], dim: usize) -> Result<RecordBatch> {
	let schema = build_chunk_schema(dim);
	let mut keys = Vec::with_capacity(entries.len()); let mut doc_ids = Vec::with_capacity(entries.len()); let mut chunk_ids = Vec::with_capacity(entries.len());
	let mut categories = Vec::with_capacity(entries.len()); let mut texts = Vec::with_capacity(entries.len());
	let mut starts = Vec::with_capacity(entries.len()); let mut ends = Vec::with_capacity(entries.len());
	let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(entries.len());
	for e in entries {
		if e.vector.len() != dim { bail!("vector for {} has length {} (expected {})", e.key(), e.vector.len(), dim); }
		keys.push(e.key()); doc_ids.push(e.doc_id.clone()); chunk_ids.push(e.chunk_id as i64);
		categories.push(e.category.clone()); texts.push(e.chunk_text.clone());
		starts.push(e.char_start as i64); ends.push(e.char_end as i64);
		vectors.push(Some(e.vector.iter().map(|&x| Some(x)).collect()));
	}
	let record_batch = RecordBatch::try_new(schema, vec![
		Arc::new(StringArray::from(keys)),
		Arc::new(StringArray::from(doc_ids)),
		Arc::new(Int64Array::from(chunk_ids)),
		Arc::new(StringArray::from(categories)),
		Arc::new(StringArray::from(texts)),
		Arc::new(Int64Array::from(starts)),
		Arc::new(Int64Array::from(ends)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim as i32)),
	])?;
	Ok(record_batch)
}

/// Return the subset of `keys` already stored in `table`.
pub async fn existing_keys(table: &Table, keys: &[String]) -> Result<Vec<String>> {
	let mut found = Vec::new();
	for group in keys.chunks(KEY_LOOKUP_BATCH) {
		let list = group.iter().map(|k| sql_quote(k)).collect::<Vec<_>>().join(", ");
		let mut stream = table.query().only_if(format!("key IN ({list})")).select(Select::columns(&["key"])).execute().await?;
		while let Some(batch) = stream.try_next().await? {
			let col = batch.column_by_name("key").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow::anyhow!("chunks.key column missing"))?;
			found.extend((0..batch.num_rows()).map(|i| col.value(i).to_string()));
		}
	}
	Ok(found)
}
