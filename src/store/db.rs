//! RocksDB-backed chunk database.
//!
//! One database per (miner, validator) pair. Chunk data and proofs
//! live in separate column families so a validator can keep a
//! hash-only database at a fraction of the miner's footprint.

use crate::errors::{StoreError, SubnetResult};
use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::path::{Path, PathBuf};

/// Chunk data, keyed by big-endian chunk index.
pub const CF_CHUNKS: &str = "chunks";
/// Hex SHA-256 proofs, keyed like `CF_CHUNKS`.
pub const CF_HASHES: &str = "hashes";
/// Database metadata.
pub const CF_META: &str = "meta";

pub const COLUMN_FAMILIES: &[&str] = &[CF_CHUNKS, CF_HASHES, CF_META];

const META_N_CHUNKS: &[u8] = b"n_chunks";
const META_SEED: &[u8] = b"seed";

/// Directory name for a pair database.
pub fn db_name(miner_hotkey: &str, validator_hotkey: &str) -> String {
    format!("DB-{}-{}", miner_hotkey, validator_hotkey)
}

/// Full path for a pair database under the wallet's store root.
pub fn db_path(
    db_root: &Path,
    wallet_name: &str,
    hotkey_name: &str,
    miner_hotkey: &str,
    validator_hotkey: &str,
) -> PathBuf {
    db_root
        .join(wallet_name)
        .join(hotkey_name)
        .join(db_name(miner_hotkey, validator_hotkey))
}

/// An open chunk database.
pub struct ChunkDb {
    db: DB,
    path: PathBuf,
}

impl ChunkDb {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> SubnetResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::new(path, format!("open failed: {}", e)))?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Whether a database already exists at the path.
    pub fn exists(path: &Path) -> bool {
        path.join("CURRENT").exists()
    }

    /// Remove a database from disk.
    pub fn destroy(path: &Path) -> SubnetResult<()> {
        if path.exists() {
            DB::destroy(&Options::default(), path)
                .map_err(|e| StoreError::new(path, format!("destroy failed: {}", e)))?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cf(&self, name: &str) -> SubnetResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::new(&self.path, format!("missing column family {}", name)).into())
    }

    pub fn get_chunk(&self, index: u32) -> SubnetResult<Option<Vec<u8>>> {
        Ok(self.db.get_cf(self.cf(CF_CHUNKS)?, index.to_be_bytes())?)
    }

    pub fn get_hash(&self, index: u32) -> SubnetResult<Option<String>> {
        let value = self.db.get_cf(self.cf(CF_HASHES)?, index.to_be_bytes())?;
        Ok(value.map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    /// Write a batch of chunks atomically. `data` is omitted for
    /// hash-only databases.
    pub fn put_batch(&self, entries: &[(u32, Option<Vec<u8>>, String)]) -> SubnetResult<()> {
        let chunks_cf = self.cf(CF_CHUNKS)?;
        let hashes_cf = self.cf(CF_HASHES)?;

        let mut batch = WriteBatch::default();
        for (index, data, hash) in entries {
            let key = index.to_be_bytes();
            if let Some(data) = data {
                batch.put_cf(chunks_cf, key, data);
            }
            batch.put_cf(hashes_cf, key, hash.as_bytes());
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Number of chunks this database holds.
    pub fn n_chunks(&self) -> SubnetResult<u32> {
        let value = self.db.get_cf(self.cf(CF_META)?, META_N_CHUNKS)?;
        match value {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::new(&self.path, "corrupt n_chunks metadata")
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_n_chunks(&self, n: u32) -> SubnetResult<()> {
        self.db
            .put_cf(self.cf(CF_META)?, META_N_CHUNKS, n.to_le_bytes())?;
        Ok(())
    }

    pub fn seed(&self) -> SubnetResult<Option<String>> {
        let value = self.db.get_cf(self.cf(CF_META)?, META_SEED)?;
        Ok(value.map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    pub fn set_seed(&self, seed: &str) -> SubnetResult<()> {
        self.db.put_cf(self.cf(CF_META)?, META_SEED, seed.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_put_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DB-a-b");
        let db = ChunkDb::open(&path).unwrap();

        db.put_batch(&[(0, Some(vec![1, 2, 3]), "hash0".to_string())])
            .unwrap();
        assert_eq!(db.get_chunk(0).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(db.get_hash(0).unwrap(), Some("hash0".to_string()));
        assert_eq!(db.get_chunk(1).unwrap(), None);
    }

    #[test]
    fn test_hash_only_batch() {
        let dir = tempfile::tempdir().unwrap();
        let db = ChunkDb::open(&dir.path().join("DB-a-b")).unwrap();

        db.put_batch(&[(5, None, "proof".to_string())]).unwrap();
        assert_eq!(db.get_chunk(5).unwrap(), None);
        assert_eq!(db.get_hash(5).unwrap(), Some("proof".to_string()));
    }

    #[test]
    fn test_metadata_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DB-a-b");
        {
            let db = ChunkDb::open(&path).unwrap();
            assert_eq!(db.n_chunks().unwrap(), 0);
            db.set_n_chunks(1024).unwrap();
            db.set_seed("minervalidator").unwrap();
        }
        let db = ChunkDb::open(&path).unwrap();
        assert_eq!(db.n_chunks().unwrap(), 1024);
        assert_eq!(db.seed().unwrap(), Some("minervalidator".to_string()));
    }

    #[test]
    fn test_destroy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DB-a-b");
        {
            let db = ChunkDb::open(&path).unwrap();
            db.set_n_chunks(1).unwrap();
        }
        assert!(ChunkDb::exists(&path));
        ChunkDb::destroy(&path).unwrap();
        assert!(!ChunkDb::exists(&path));
    }

    #[test]
    fn test_db_path_layout() {
        let path = db_path(Path::new("/data"), "w", "hk", "m", "v");
        assert_eq!(path, PathBuf::from("/data/w/hk/DB-m-v"));
    }
}
