//! Local store verification.

use crate::errors::{ChunkMismatch, StoreError, SubnetResult};
use tracing::{debug, info};

use super::allocate::Allocation;
use super::chunk;
use super::db::ChunkDb;

/// Re-hash every data chunk in a database and compare against the
/// stored proofs. Returns the number of chunks verified.
pub fn verify_db(alloc: &Allocation) -> SubnetResult<u32> {
    let db = ChunkDb::open(&alloc.path)?;
    let n_chunks = db.n_chunks()?;
    let db_label = alloc.path.display().to_string();

    for index in 0..n_chunks {
        let data = db.get_chunk(index)?.ok_or_else(|| {
            StoreError::new(&alloc.path, format!("missing chunk {}", index))
        })?;
        let stored = db.get_hash(index)?.ok_or_else(|| {
            StoreError::new(&alloc.path, format!("missing hash for chunk {}", index))
        })?;

        let computed = chunk::chunk_hash(&data);
        if computed != stored {
            return Err(ChunkMismatch {
                db: db_label,
                index,
                expected: stored,
                actual: computed,
            }
            .into());
        }
        debug!("Hash match for chunk {} in {}", index, db_label);
    }

    Ok(n_chunks)
}

/// Verify every allocation, stopping at the first mismatch.
pub fn verify_all(allocations: &[Allocation]) -> SubnetResult<()> {
    for alloc in allocations {
        let verified = verify_db(alloc)?;
        info!("Verified {} chunks in {}", verified, alloc.path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::generate::generate_db;
    use std::path::PathBuf;

    fn alloc(path: PathBuf, n_chunks: u32) -> Allocation {
        Allocation {
            path,
            n_chunks,
            seed: "minervalidator".into(),
            miner: "miner".into(),
            validator: "validator".into(),
            hash_only: false,
        }
    }

    #[test]
    fn test_verify_fresh_db() {
        let dir = tempfile::tempdir().unwrap();
        let alloc = alloc(dir.path().join("DB-m-v"), 3);
        generate_db(&alloc, false, None).unwrap();
        assert_eq!(verify_db(&alloc).unwrap(), 3);
    }

    #[test]
    fn test_verify_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let alloc = alloc(dir.path().join("DB-m-v"), 2);
        generate_db(&alloc, false, None).unwrap();

        // Corrupt chunk 1 behind the verifier's back.
        let db = ChunkDb::open(&alloc.path).unwrap();
        db.put_batch(&[(1, Some(vec![0u8; 8]), db.get_hash(1).unwrap().unwrap())])
            .unwrap();
        drop(db);

        let err = verify_db(&alloc).unwrap_err();
        assert!(err.to_string().contains("failed verification"));
    }
}
