use arrow_array::{Array, Float32Array, Int64Array, RecordBatch, StringArray};

use complaint_core::types::RetrievalHit;
use complaint_core::{Error, Result};

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<T>())
		.ok_or_else(|| Error::storage(format!("result column '{name}' missing or of unexpected type")))
}

/// Convert one result batch of a cosine vector search into hits.
///
/// LanceDB reports cosine distance in `_distance`; similarity is `1 - distance`.
pub fn hits_from_batch(batch: &RecordBatch) -> Result<Vec<RetrievalHit>> {
	let doc_ids = column::<StringArray>(batch, "doc_id")?;
	let chunk_ids = column::<Int64Array>(batch, "chunk_id")?;
	let categories = column::<StringArray>(batch, "category")?;
	let texts = column::<StringArray>(batch, "chunk_text")?;
	let distances = column::<Float32Array>(batch, "_distance")?;
	let mut hits = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		hits.push(RetrievalHit {
			chunk_text: texts.value(i).to_string(),
			doc_id: doc_ids.value(i).to_string(),
			chunk_id: chunk_ids.value(i).max(0) as usize,
			category: categories.value(i).to_string(),
			score: 1.0 - distances.value(i),
		});
	}
	Ok(hits)
}
