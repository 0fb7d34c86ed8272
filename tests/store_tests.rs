//! Chunk store integration tests
//!
//! Exercises the full miner-side flow on a temporary directory:
//! plan allocations, generate databases, verify them, and detect
//! corruption.

use bittensor_db::config;
use bittensor_db::metagraph::Metagraph;
use bittensor_db::store::{
    self, chunk, db_path, generate_db, verify_db, Allocation, ChunkDb, CHUNK_SIZE,
};

fn sample_metagraph() -> Metagraph {
    let mut mg = Metagraph::new(12, "local");
    mg.n = 2;
    mg.uids = vec![0, 1];
    mg.hotkeys = vec!["validatorA".into(), "validatorB".into()];
    mg.coldkeys = vec!["ckA".into(), "ckB".into()];
    mg.stake = vec![0, 5 * config::RAO_PER_TAO];
    mg.validator_permit = vec![true, true];
    mg.last_update = vec![0, 0];
    mg.axons = vec![None, None];
    mg
}

fn small_allocation(path: std::path::PathBuf, n_chunks: u32, hash_only: bool) -> Allocation {
    Allocation {
        path,
        n_chunks,
        seed: chunk::pair_seed("miner", "validatorA"),
        miner: "miner".into(),
        validator: "validatorA".into(),
        hash_only,
    }
}

#[test]
fn test_allocate_plans_one_db_per_hotkey() {
    let dir = tempfile::tempdir().unwrap();
    let allocations = store::allocate(
        dir.path(),
        "wallet",
        "hotkey",
        "miner",
        &sample_metagraph(),
        0.001,
        false,
    )
    .unwrap();

    assert_eq!(allocations.len(), 2);
    for alloc in &allocations {
        assert!(alloc.n_chunks >= 1);
        assert_eq!(
            alloc.path,
            db_path(dir.path(), "wallet", "hotkey", "miner", &alloc.validator)
        );
        assert_eq!(alloc.seed, format!("miner{}", alloc.validator));
    }
    // 5 TAO of stake earns a larger share than zero stake.
    assert!(allocations[1].n_chunks >= allocations[0].n_chunks);
}

#[test]
fn test_generate_and_verify() {
    let dir = tempfile::tempdir().unwrap();
    let alloc = small_allocation(dir.path().join("DB-miner-validatorA"), 3, false);

    generate_db(&alloc, false, None).unwrap();
    assert_eq!(verify_db(&alloc).unwrap(), 3);

    let db = ChunkDb::open(&alloc.path).unwrap();
    assert_eq!(db.n_chunks().unwrap(), 3);
    assert_eq!(db.seed().unwrap().as_deref(), Some(alloc.seed.as_str()));

    let data = db.get_chunk(1).unwrap().unwrap();
    assert_eq!(data.len(), CHUNK_SIZE);
    assert_eq!(data, chunk::generate_chunk(&alloc.seed, 1, CHUNK_SIZE));
    assert_eq!(
        db.get_hash(1).unwrap().unwrap(),
        chunk::chunk_hash(&data)
    );
}

#[test]
fn test_verify_detects_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let alloc = small_allocation(dir.path().join("DB-miner-validatorA"), 2, false);
    generate_db(&alloc, false, None).unwrap();

    {
        let db = ChunkDb::open(&alloc.path).unwrap();
        let bogus = vec![0u8; CHUNK_SIZE];
        db.put_batch(&[(1, Some(bogus.clone()), chunk::chunk_hash(&bogus))])
            .unwrap();
    }

    let err = verify_db(&alloc).unwrap_err();
    assert!(err.to_string().contains("Chunk 1"));
}

#[test]
fn test_generation_resumes_and_grows() {
    let dir = tempfile::tempdir().unwrap();
    let mut alloc = small_allocation(dir.path().join("DB-miner-validatorA"), 2, false);
    generate_db(&alloc, false, None).unwrap();

    alloc.n_chunks = 4;
    generate_db(&alloc, false, None).unwrap();

    let db = ChunkDb::open(&alloc.path).unwrap();
    assert_eq!(db.n_chunks().unwrap(), 4);
    // Earlier chunks are untouched by the resumed run.
    assert_eq!(
        db.get_chunk(0).unwrap().unwrap(),
        chunk::generate_chunk(&alloc.seed, 0, CHUNK_SIZE)
    );
    assert!(db.get_chunk(3).unwrap().is_some());
}

#[test]
fn test_hash_only_db_holds_proofs_without_data() {
    let dir = tempfile::tempdir().unwrap();
    let alloc = small_allocation(dir.path().join("DB-miner-validatorA"), 3, true);
    generate_db(&alloc, false, None).unwrap();

    let db = ChunkDb::open(&alloc.path).unwrap();
    for index in 0..3 {
        assert!(db.get_chunk(index).unwrap().is_none());
        assert_eq!(
            db.get_hash(index).unwrap().unwrap(),
            chunk::generate_chunk_proof(&alloc.seed, index)
        );
    }
}

#[test]
fn test_restart_wipes_existing_db() {
    let dir = tempfile::tempdir().unwrap();
    let mut alloc = small_allocation(dir.path().join("DB-miner-validatorA"), 4, true);
    generate_db(&alloc, false, None).unwrap();

    alloc.n_chunks = 2;
    generate_db(&alloc, true, None).unwrap();

    let db = ChunkDb::open(&alloc.path).unwrap();
    assert_eq!(db.n_chunks().unwrap(), 2);
}

#[tokio::test]
async fn test_generate_all_bounded_workers() {
    let dir = tempfile::tempdir().unwrap();
    let allocations: Vec<Allocation> = ["validatorA", "validatorB", "validatorC"]
        .iter()
        .map(|validator| Allocation {
            path: dir.path().join(format!("DB-miner-{}", validator)),
            n_chunks: 2,
            seed: chunk::pair_seed("miner", validator),
            miner: "miner".into(),
            validator: validator.to_string(),
            hash_only: true,
        })
        .collect();

    store::generate_all(&allocations, 2, false, false)
        .await
        .unwrap();

    for alloc in &allocations {
        assert!(ChunkDb::exists(&alloc.path));
        let db = ChunkDb::open(&alloc.path).unwrap();
        assert_eq!(db.n_chunks().unwrap(), 2);
    }
}

#[test]
fn test_open_is_exclusive_per_path() {
    // RocksDB locks the database path; a second open fails while the
    // first handle lives. Concurrent readers have to share one handle.
    let dir = tempfile::tempdir().unwrap();
    let alloc = small_allocation(dir.path().join("DB-miner-validatorA"), 2, false);
    generate_db(&alloc, false, None).unwrap();

    let held = ChunkDb::open(&alloc.path).unwrap();
    assert!(ChunkDb::open(&alloc.path).is_err());
    drop(held);
    assert!(ChunkDb::open(&alloc.path).is_ok());
}

#[test]
fn test_chunks_differ_across_validator_pairs() {
    let a = chunk::generate_chunk(&chunk::pair_seed("miner", "validatorA"), 0, 1024);
    let b = chunk::generate_chunk(&chunk::pair_seed("miner", "validatorB"), 0, 1024);
    assert_ne!(a, b);
}
