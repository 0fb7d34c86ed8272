//! Database generation on a bounded worker pool.

use crate::errors::{StoreError, SubnetResult};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::allocate::Allocation;
use super::chunk;
use super::db::ChunkDb;
use super::CHUNK_SIZE;

/// Chunks written per batch. Bounds peak memory per worker.
const BATCH_CHUNKS: u32 = 16;

/// Fill one database from its allocation.
///
/// Generation resumes where a previous run stopped unless `restart`
/// wipes the database first. Already-complete databases are skipped.
pub fn generate_db(
    alloc: &Allocation,
    restart: bool,
    progress: Option<ProgressBar>,
) -> SubnetResult<()> {
    if restart {
        ChunkDb::destroy(&alloc.path)?;
    }

    let db = ChunkDb::open(&alloc.path)?;
    let existing = db.n_chunks()?;
    if existing >= alloc.n_chunks {
        debug!(
            "Database {} already holds {} chunks, skipping",
            alloc.path.display(),
            existing
        );
        if let Some(bar) = progress {
            bar.finish_and_clear();
        }
        return Ok(());
    }

    if let Some(stored_seed) = db.seed()? {
        if stored_seed != alloc.seed {
            return Err(StoreError::new(
                &alloc.path,
                format!(
                    "seed mismatch: database was generated for {}",
                    stored_seed
                ),
            )
            .into());
        }
    }

    if let Some(bar) = &progress {
        bar.set_length(alloc.n_chunks as u64);
        bar.set_position(existing as u64);
    }

    let mut batch: Vec<(u32, Option<Vec<u8>>, String)> =
        Vec::with_capacity(BATCH_CHUNKS as usize);
    for index in existing..alloc.n_chunks {
        let data = chunk::generate_chunk(&alloc.seed, index, CHUNK_SIZE);
        let hash = chunk::chunk_hash(&data);
        let data = if alloc.hash_only { None } else { Some(data) };
        batch.push((index, data, hash));

        if batch.len() as u32 == BATCH_CHUNKS || index + 1 == alloc.n_chunks {
            db.put_batch(&batch)?;
            db.set_n_chunks(index + 1)?;
            batch.clear();
        }
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    db.set_seed(&alloc.seed)?;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    debug!(
        "Generated {} chunks at {}",
        alloc.n_chunks,
        alloc.path.display()
    );
    Ok(())
}

/// Last eight characters of a hotkey, for progress-bar prefixes.
fn hotkey_tail(hotkey: &str) -> &str {
    match hotkey.char_indices().rev().nth(7) {
        Some((i, _)) => &hotkey[i..],
        None => hotkey,
    }
}

/// Generate every allocation concurrently, at most `workers` at a time.
pub async fn generate_all(
    allocations: &[Allocation],
    workers: usize,
    restart: bool,
    show_progress: bool,
) -> SubnetResult<()> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let multi = MultiProgress::new();
    let style = ProgressStyle::with_template(
        "{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} chunks",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    let mut handles = Vec::with_capacity(allocations.len());
    for alloc in allocations {
        let alloc = alloc.clone();
        let semaphore = Arc::clone(&semaphore);
        let progress = if show_progress {
            let bar = multi.add(ProgressBar::new(alloc.n_chunks as u64));
            bar.set_style(style.clone());
            bar.set_prefix(format!("...{}", hotkey_tail(&alloc.validator)));
            Some(bar)
        } else {
            None
        };

        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| StoreError::new(&alloc.path, e.to_string()))?;
            tokio::task::spawn_blocking(move || generate_db(&alloc, restart, progress))
                .await
                .map_err(|e| crate::errors::SubnetError::other(e.to_string()))?
        }));
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| crate::errors::SubnetError::other(e.to_string()))??;
    }

    info!("Generated {} databases", allocations.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn small_alloc(path: PathBuf, n_chunks: u32, hash_only: bool) -> Allocation {
        Allocation {
            path,
            n_chunks,
            seed: "minervalidator".into(),
            miner: "miner".into(),
            validator: "validator".into(),
            hash_only,
        }
    }

    #[test]
    fn test_generate_and_resume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DB-m-v");

        let alloc = small_alloc(path.clone(), 3, false);
        generate_db(&alloc, false, None).unwrap();

        let db = ChunkDb::open(&path).unwrap();
        assert_eq!(db.n_chunks().unwrap(), 3);
        let data = db.get_chunk(2).unwrap().unwrap();
        assert_eq!(data.len(), CHUNK_SIZE);
        assert_eq!(
            db.get_hash(2).unwrap().unwrap(),
            chunk::chunk_hash(&data)
        );
        drop(db);

        // Growing the allocation only generates the new tail.
        let grown = small_alloc(path.clone(), 5, false);
        generate_db(&grown, false, None).unwrap();
        let db = ChunkDb::open(&path).unwrap();
        assert_eq!(db.n_chunks().unwrap(), 5);
        assert!(db.get_chunk(4).unwrap().is_some());
    }

    #[test]
    fn test_hash_only_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DB-m-v");

        generate_db(&small_alloc(path.clone(), 2, true), false, None).unwrap();

        let db = ChunkDb::open(&path).unwrap();
        assert_eq!(db.n_chunks().unwrap(), 2);
        assert!(db.get_chunk(0).unwrap().is_none());
        // Proof still matches independently regenerated data.
        assert_eq!(
            db.get_hash(0).unwrap().unwrap(),
            chunk::generate_chunk_proof("minervalidator", 0)
        );
    }

    #[test]
    fn test_seed_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DB-m-v");

        generate_db(&small_alloc(path.clone(), 2, true), false, None).unwrap();

        let mut other = small_alloc(path, 3, true);
        other.seed = "differentseed".into();
        assert!(generate_db(&other, false, None).is_err());
    }

    #[test]
    fn test_hotkey_tail_respects_char_boundaries() {
        assert_eq!(hotkey_tail("5GrwvaEF5zXb26Fz"), "5zXb26Fz");
        assert_eq!(hotkey_tail("short"), "short");
        // Multibyte input must not split a character.
        assert_eq!(hotkey_tail("ααααααααββ"), "ααααααββ");
    }

    #[tokio::test]
    async fn test_generate_all_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let allocations = vec![
            small_alloc(dir.path().join("DB-m-v0"), 2, true),
            small_alloc(dir.path().join("DB-m-v1"), 2, true),
        ];
        generate_all(&allocations, 2, false, false).await.unwrap();
        for alloc in &allocations {
            assert_eq!(ChunkDb::open(&alloc.path).unwrap().n_chunks().unwrap(), 2);
        }
    }
}
