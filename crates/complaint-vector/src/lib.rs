//! LanceDB-backed vector index over complaint chunks.
//!
//! A store is a LanceDB directory holding two tables: `chunks` (one row per
//! `(doc_id, chunk_id)` with its vector) and `meta` (the manifest written by
//! `persist`). Searches are exact cosine scans.
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use complaint_core::traits::VectorIndex;
use complaint_core::types::{IndexEntry, RetrievalResult};
use complaint_core::{Error, Result};

pub mod manifest;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use manifest::IndexManifest;
use schema::{build_chunk_schema, build_meta_schema, CHUNKS_TABLE, META_TABLE};
use table::{ensure_table, open_db, table_exists};

// Candidates fetched per requested hit so equal scores at the cut-off can be re-ordered.
const OVERSAMPLE: usize = 4;

pub struct LanceIndex {
	conn: Connection,
	chunks: Table,
	dir: PathBuf,
	embedder_id: String,
	dim: usize,
}

impl LanceIndex {
	/// Open a store for building, creating it if absent.
	///
	/// An existing store is continued only if its manifest matches
	/// `embedder_id` and `dim`.
	pub async fn create(dir: &Path, embedder_id: &str, dim: usize) -> Result<Self> {
		if dim == 0 { return Err(Error::Configuration("index dimension must be at least 1".into())); }
		std::fs::create_dir_all(dir).map_err(|e| Error::storage(format!("cannot create {}: {e}", dir.display())))?;
		let conn = open_db(&dir.to_string_lossy()).await.map_err(Error::storage)?;
		if let Some(manifest) = IndexManifest::read(&conn).await.map_err(Error::storage)? {
			manifest.check_compatible(embedder_id, dim)?;
			tracing::info!(dir = %dir.display(), entries = manifest.entries, "continuing existing index");
		}
		ensure_table(&conn, CHUNKS_TABLE, build_chunk_schema(dim)).await.map_err(Error::storage)?;
		ensure_table(&conn, META_TABLE, build_meta_schema()).await.map_err(Error::storage)?;
		let chunks = conn.open_table(CHUNKS_TABLE).execute().await.map_err(Error::storage)?;
		Ok(Self { conn, chunks, dir: dir.to_path_buf(), embedder_id: embedder_id.to_string(), dim })
	}

	/// Open a persisted store for querying.
	pub async fn load(dir: &Path, embedder_id: &str, dim: usize) -> Result<Self> {
		if !dir.is_dir() {
			return Err(Error::unavailable(format!("no index at {}; run the indexer first", dir.display())));
		}
		let conn = open_db(&dir.to_string_lossy()).await.map_err(Error::unavailable)?;
		for name in [CHUNKS_TABLE, META_TABLE] {
			if !table_exists(&conn, name).await.map_err(Error::unavailable)? {
				return Err(Error::unavailable(format!("table '{name}' missing in {}", dir.display())));
			}
		}
		let manifest = IndexManifest::read(&conn)
			.await
			.map_err(Error::unavailable)?
			.ok_or_else(|| Error::unavailable(format!("index at {} was never persisted", dir.display())))?;
		manifest.check_compatible(embedder_id, dim)?;
		let chunks = conn.open_table(CHUNKS_TABLE).execute().await.map_err(Error::unavailable)?;
		tracing::info!(dir = %dir.display(), entries = manifest.entries, embedder = %manifest.embedder_id, "loaded index");
		Ok(Self { conn, chunks, dir: dir.to_path_buf(), embedder_id: embedder_id.to_string(), dim })
	}

	pub fn dir(&self) -> &Path { &self.dir }

	pub fn embedder_id(&self) -> &str { &self.embedder_id }

	pub async fn manifest(&self) -> Result<Option<IndexManifest>> {
		IndexManifest::read(&self.conn).await.map_err(Error::storage)
	}

	fn check_dim(&self, len: usize, what: &str) -> Result<()> {
		if len != self.dim {
			return Err(Error::Configuration(format!("{what} has dimension {len} but the index expects {}", self.dim)));
		}
		Ok(())
	}
}

#[async_trait]
impl VectorIndex for LanceIndex {
	fn dim(&self) -> usize { self.dim }

	async fn add(&self, entries: &[IndexEntry]) -> Result<()> {
		if entries.is_empty() { return Ok(()); }
		let mut seen = HashSet::with_capacity(entries.len());
		for e in entries {
			self.check_dim(e.vector.len(), "entry vector")?;
			if !seen.insert((e.doc_id.as_str(), e.chunk_id)) {
				return Err(Error::DuplicateEntry { doc_id: e.doc_id.clone(), chunk_id: e.chunk_id });
			}
		}
		let keys: Vec<String> = entries.iter().map(IndexEntry::key).collect();
		let existing = writer::existing_keys(&self.chunks, &keys).await.map_err(Error::storage)?;
		if let Some(dup) = existing.first().and_then(|k| entries.iter().find(|e| &e.key() == k)) {
			return Err(Error::DuplicateEntry { doc_id: dup.doc_id.clone(), chunk_id: dup.chunk_id });
		}
		let batch = writer::entries_to_record_batch(entries, self.dim).map_err(Error::storage)?;
		let schema = batch.schema();
		let reader = Box::new(arrow_array::RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		self.chunks.add(reader).execute().await.map_err(Error::storage)?;
		tracing::debug!(added = entries.len(), "appended index entries");
		Ok(())
	}

	async fn search(&self, query_vector: &[f32], k: usize) -> Result<RetrievalResult> {
		self.check_dim(query_vector.len(), "query vector")?;
		if k == 0 { return Ok(RetrievalResult::default()); }
		let total = self.chunks.count_rows(None).await.map_err(Error::storage)?;
		if total == 0 { return Ok(RetrievalResult::default()); }
		let fetch = k.saturating_mul(OVERSAMPLE).min(total);
		let mut stream = self
			.chunks
			.vector_search(query_vector.to_vec())
			.map_err(Error::storage)?
			.distance_type(DistanceType::Cosine)
			.limit(fetch)
			.execute()
			.await
			.map_err(Error::storage)?;
		let mut hits = Vec::with_capacity(fetch);
		while let Some(batch) = stream.try_next().await.map_err(Error::storage)? {
			hits.extend(search::hits_from_batch(&batch)?);
		}
		Ok(RetrievalResult::ranked(hits, k))
	}

	async fn persist(&self) -> Result<()> {
		let manifest = IndexManifest {
			dim: self.dim,
			embedder_id: self.embedder_id.clone(),
			entries: self.len().await?,
			persisted_at: chrono::Utc::now(),
		};
		manifest.write(&self.conn).await.map_err(Error::storage)?;
		tracing::info!(dir = %self.dir.display(), entries = manifest.entries, "index persisted");
		Ok(())
	}

	async fn len(&self) -> Result<usize> {
		self.chunks.count_rows(None).await.map_err(Error::storage)
	}
}
