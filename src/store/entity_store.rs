//! Entity Store Module
//!
//! SQLite-backed partitioned storage that survives process restarts: entity
//! records, filter-lookup records, cached document-database results, and a
//! small metadata partition for flags.
//!
//! The process-wide handle is opened exactly once; concurrent first callers
//! of [`EntityStore::open_shared`] share the same in-flight open. Every
//! operation runs in its own short-lived statement, so unrelated reads and
//! writes never block each other beyond the connection lock.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::info;

use crate::api::NamedResource;
use crate::error::Result;
use crate::pokemon::PokemonRecord;

/// Shared handle for the process-wide store.
static SHARED: OnceCell<Arc<EntityStore>> = OnceCell::const_new();

// == Partition ==
/// The named partitions of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Entity records, keyed by numeric id with a unique name index
    Entities,
    /// Filter-lookup records, keyed by composite `category[/sub]` key
    Filters,
    /// Cached document-database results, keyed by opaque string
    ResultCache,
}

impl Partition {
    fn table(self) -> &'static str {
        match self {
            Partition::Entities => "entities",
            Partition::Filters => "filters",
            Partition::ResultCache => "result_cache",
        }
    }
}

// == Entity Store ==
/// Partitioned persistent store on a single SQLite connection.
///
/// Storage failures always propagate; this layer never retries and never
/// converts an error into an empty result.
pub struct EntityStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore").field("conn", &"<sqlite>").finish()
    }
}

impl EntityStore {
    // == Open ==
    /// Opens (or creates) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entities (
                id        INTEGER PRIMARY KEY,
                name      TEXT NOT NULL,
                record    TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_name ON entities(name);
            CREATE TABLE IF NOT EXISTS filters (
                key       TEXT PRIMARY KEY,
                entries   TEXT NOT NULL,
                cached_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS result_cache (
                key       TEXT PRIMARY KEY,
                payload   TEXT NOT NULL,
                cached_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS meta (
                key       TEXT PRIMARY KEY,
                value     TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Returns the process-wide store, opening it on first call.
    ///
    /// Idempotent: concurrent callers before the first open completes share
    /// the same in-flight initialization; later callers get the same handle
    /// regardless of the path they pass.
    pub async fn open_shared(path: impl AsRef<Path>) -> Result<Arc<EntityStore>> {
        let path = path.as_ref().to_path_buf();
        SHARED
            .get_or_try_init(|| async {
                info!(path = %path.display(), "opening entity store");
                EntityStore::open(&path).map(Arc::new)
            })
            .await
            .cloned()
    }

    // == Entities ==
    /// Upserts one entity record by primary key. Full overwrite, no merge.
    pub fn put_entity(&self, record: &PokemonRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO entities (id, name, record) VALUES (?1, ?2, ?3)",
            params![record.id, record.name.to_lowercase(), json],
        )?;
        Ok(())
    }

    /// Upserts a batch of entity records in one transaction.
    pub fn put_entities(&self, records: &[PokemonRecord]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for record in records {
            let json = serde_json::to_string(record)?;
            tx.execute(
                "INSERT OR REPLACE INTO entities (id, name, record) VALUES (?1, ?2, ?3)",
                params![record.id, record.name.to_lowercase(), json],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Fetches one entity record by numeric id; `None` on miss.
    pub fn get_entity(&self, id: u32) -> Result<Option<PokemonRecord>> {
        let conn = self.conn.lock();
        let json: Option<String> = conn
            .query_row("SELECT record FROM entities WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(Into::into)).transpose()
    }

    /// Fetches one entity record through the name index; case-insensitive.
    pub fn get_entity_by_name(&self, name: &str) -> Result<Option<PokemonRecord>> {
        let conn = self.conn.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT record FROM entities WHERE name = ?1",
                params![name.to_lowercase()],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(Into::into)).transpose()
    }

    /// Materializes every entity record. Fresh query each call, so the
    /// traversal is restartable; used for the count check and as the
    /// preload source.
    pub fn all_entities(&self) -> Result<Vec<PokemonRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT record FROM entities ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }

    /// Number of stored entity records.
    pub fn entity_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Removes one entity record.
    pub fn delete_entity(&self, id: u32) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM entities WHERE id = ?1", params![id])?;
        Ok(())
    }

    // == Filters ==
    /// Upserts a filter record under its composite key.
    pub fn put_filter(&self, key: &str, entries: &[NamedResource], cached_at: i64) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO filters (key, entries, cached_at) VALUES (?1, ?2, ?3)",
            params![key, json, cached_at],
        )?;
        Ok(())
    }

    /// Fetches a filter record and its write timestamp; `None` on miss.
    /// TTL policy belongs to the caller.
    pub fn get_filter(&self, key: &str) -> Result<Option<(Vec<NamedResource>, i64)>> {
        let conn = self.conn.lock();
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT entries, cached_at FROM filters WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((json, cached_at)) => Ok(Some((serde_json::from_str(&json)?, cached_at))),
            None => Ok(None),
        }
    }

    /// Removes one filter record.
    pub fn delete_filter(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM filters WHERE key = ?1", params![key])?;
        Ok(())
    }

    // == Result Cache ==
    /// Upserts a cached document-database result.
    pub fn put_result(&self, key: &str, payload: &Value, cached_at: i64) -> Result<()> {
        let json = serde_json::to_string(payload)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO result_cache (key, payload, cached_at) VALUES (?1, ?2, ?3)",
            params![key, json, cached_at],
        )?;
        Ok(())
    }

    /// Fetches a cached result and its write timestamp; `None` on miss.
    pub fn get_result(&self, key: &str) -> Result<Option<(Value, i64)>> {
        let conn = self.conn.lock();
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT payload, cached_at FROM result_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((json, cached_at)) => Ok(Some((serde_json::from_str(&json)?, cached_at))),
            None => Ok(None),
        }
    }

    /// Removes one cached result.
    pub fn delete_result(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM result_cache WHERE key = ?1", params![key])?;
        Ok(())
    }

    // == Meta ==
    /// Reads a metadata value, such as the preload-complete flag.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Writes a metadata value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Removes a metadata value.
    pub fn delete_meta(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM meta WHERE key = ?1", params![key])?;
        Ok(())
    }

    // == Clear ==
    /// Empties one partition. Idempotent.
    pub fn clear(&self, partition: Partition) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(&format!("DELETE FROM {}", partition.table()), [])?;
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn temp_store() -> (EntityStore, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let store = EntityStore::open(file.path()).unwrap();
        (store, file)
    }

    fn sample_record(id: u32, name: &str) -> PokemonRecord {
        PokemonRecord::partial(id, name, format!("https://pokeapi.co/api/v2/pokemon/{}/", id), 100)
    }

    #[test]
    fn test_entity_roundtrip_by_id() {
        let (store, _file) = temp_store();
        let record = sample_record(25, "pikachu");

        store.put_entity(&record).unwrap();
        let loaded = store.get_entity(25).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_entity_lookup_by_name_case_insensitive() {
        let (store, _file) = temp_store();
        store.put_entity(&sample_record(25, "pikachu")).unwrap();

        let loaded = store.get_entity_by_name("PIKACHU").unwrap().unwrap();
        assert_eq!(loaded.id, 25);
    }

    #[test]
    fn test_get_miss_returns_none() {
        let (store, _file) = temp_store();
        assert!(store.get_entity(999).unwrap().is_none());
        assert!(store.get_entity_by_name("mewtwo").unwrap().is_none());
        assert!(store.get_filter("type/fire").unwrap().is_none());
        assert!(store.get_result("favorites:u1").unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites_without_merge() {
        let (store, _file) = temp_store();
        let mut record = sample_record(25, "pikachu");
        record.types = vec!["electric".to_string()];
        store.put_entity(&record).unwrap();

        // Overwrite with a partial: old fields must not survive
        store.put_entity(&sample_record(25, "pikachu")).unwrap();
        let loaded = store.get_entity(25).unwrap().unwrap();
        assert!(loaded.types.is_empty());
    }

    #[test]
    fn test_bulk_put_and_count() {
        let (store, _file) = temp_store();
        let records: Vec<PokemonRecord> =
            (1..=50).map(|id| sample_record(id, &format!("mon-{}", id))).collect();

        store.put_entities(&records).unwrap();
        assert_eq!(store.entity_count().unwrap(), 50);
        assert_eq!(store.all_entities().unwrap().len(), 50);
    }

    #[test]
    fn test_all_entities_is_restartable() {
        let (store, _file) = temp_store();
        store.put_entities(&[sample_record(1, "a"), sample_record(2, "b")]).unwrap();

        let first = store.all_entities().unwrap();
        let second = store.all_entities().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_roundtrip() {
        let (store, _file) = temp_store();
        let entries = vec![
            NamedResource::new("charmander", "https://pokeapi.co/api/v2/pokemon/4/"),
            NamedResource::new("vulpix", "https://pokeapi.co/api/v2/pokemon/37/"),
        ];

        store.put_filter("type/fire", &entries, 500).unwrap();
        let (loaded, cached_at) = store.get_filter("type/fire").unwrap().unwrap();
        assert_eq!(loaded, entries);
        assert_eq!(cached_at, 500);

        store.delete_filter("type/fire").unwrap();
        assert!(store.get_filter("type/fire").unwrap().is_none());
    }

    #[test]
    fn test_result_cache_roundtrip() {
        let (store, _file) = temp_store();
        let payload = json!({"favorites": [25, 133]});

        store.put_result("favorites:u1", &payload, 900).unwrap();
        let (loaded, cached_at) = store.get_result("favorites:u1").unwrap().unwrap();
        assert_eq!(loaded, payload);
        assert_eq!(cached_at, 900);

        store.delete_result("favorites:u1").unwrap();
        assert!(store.get_result("favorites:u1").unwrap().is_none());
    }

    #[test]
    fn test_meta_roundtrip() {
        let (store, _file) = temp_store();
        assert!(store.get_meta("preload_complete").unwrap().is_none());

        store.set_meta("preload_complete", "true").unwrap();
        assert_eq!(store.get_meta("preload_complete").unwrap().as_deref(), Some("true"));

        store.delete_meta("preload_complete").unwrap();
        assert!(store.get_meta("preload_complete").unwrap().is_none());
    }

    #[test]
    fn test_clear_partition_is_idempotent() {
        let (store, _file) = temp_store();
        store.put_entity(&sample_record(1, "a")).unwrap();

        store.clear(Partition::Entities).unwrap();
        assert_eq!(store.entity_count().unwrap(), 0);
        // Clearing an empty partition is safe
        store.clear(Partition::Entities).unwrap();
        assert_eq!(store.entity_count().unwrap(), 0);
    }

    #[test]
    fn test_clear_one_partition_leaves_others() {
        let (store, _file) = temp_store();
        store.put_entity(&sample_record(1, "a")).unwrap();
        store.put_filter("type/fire", &[], 0).unwrap();
        store.put_result("q", &json!(1), 0).unwrap();

        store.clear(Partition::Filters).unwrap();

        assert_eq!(store.entity_count().unwrap(), 1);
        assert!(store.get_filter("type/fire").unwrap().is_none());
        assert!(store.get_result("q").unwrap().is_some());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let file = NamedTempFile::new().unwrap();
        {
            let store = EntityStore::open(file.path()).unwrap();
            store.put_entity(&sample_record(25, "pikachu")).unwrap();
        }

        let store = EntityStore::open(file.path()).unwrap();
        assert!(store.get_entity(25).unwrap().is_some());
    }
}
