//! The manifest row set written to the `meta` table by `persist`.

use anyhow::{anyhow, Result};
use arrow_array::{RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::Connection;
use std::collections::HashMap;
use std::sync::Arc;

use complaint_core::{Error, Result as CoreResult};

use crate::schema::{build_meta_schema, META_TABLE};
use crate::table::{ensure_table, table_exists};

/// What `persist` records about a store.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexManifest {
	pub dim: usize,
	pub embedder_id: String,
	pub entries: usize,
	pub persisted_at: DateTime<Utc>,
}

impl IndexManifest {
	/// `None` unless every manifest key is present.
	pub(crate) async fn read(conn: &Connection) -> Result<Option<Self>> {
		if !table_exists(conn, META_TABLE).await? { return Ok(None); }
		let table = conn.open_table(META_TABLE).execute().await?;
		let mut rows: HashMap<String, String> = HashMap::new();
		let mut stream = table.query().select(Select::columns(&["key", "value"])).execute().await?;
		while let Some(batch) = stream.try_next().await? {
			let keys = batch.column_by_name("key").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("meta.key column missing"))?;
			let values = batch.column_by_name("value").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("meta.value column missing"))?;
			for i in 0..batch.num_rows() { rows.insert(keys.value(i).to_string(), values.value(i).to_string()); }
		}
		let (Some(dim), Some(embedder_id), Some(entries), Some(persisted_at)) =
			(rows.remove("dim"), rows.remove("embedder_id"), rows.remove("entries"), rows.remove("persisted_at"))
		else {
			return Ok(None);
		};
		Ok(Some(Self {
			dim: dim.parse()?,
			embedder_id,
			entries: entries.parse()?,
			persisted_at: DateTime::parse_from_rfc3339(&persisted_at)?.with_timezone(&Utc),
		}))
	}

	/// Upsert all manifest keys in one merge.
	pub(crate) async fn write(&self, conn: &Connection) -> Result<()> {
		ensure_table(conn, META_TABLE, build_meta_schema()).await?;
		let table = conn.open_table(META_TABLE).execute().await?;
		let rows = [
			("dim", self.dim.to_string()),
			("embedder_id", self.embedder_id.clone()),
			("entries", self.entries.to_string()),
			("persisted_at", self.persisted_at.to_rfc3339()),
		];
		let now = Utc::now().timestamp_millis();
		let rb = RecordBatch::try_new(
			build_meta_schema(),
			vec![
				Arc::new(StringArray::from(rows.iter().map(|(k, _)| k.to_string()).collect::<Vec<_>>())),
				Arc::new(StringArray::from(rows.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>())),
				Arc::new(TimestampMillisecondArray::from(vec![now; rows.len()])),
			],
		)?;
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_meta_schema()));
		let mut merge = table.merge_insert(&["key"]);
		merge.when_matched_update_all(None).when_not_matched_insert_all();
		let _ = merge.execute(reader).await?;
		Ok(())
	}

	pub(crate) fn check_compatible(&self, embedder_id: &str, dim: usize) -> CoreResult<()> {
		if self.dim != dim {
			return Err(Error::Configuration(format!("index was built with dim {} but the embedder produces {}", self.dim, dim)));
		}
		if self.embedder_id != embedder_id {
			return Err(Error::Configuration(format!("index was built with embedder '{}' but '{}' is configured", self.embedder_id, embedder_id)));
		}
		Ok(())
	}
}
