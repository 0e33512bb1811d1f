use morrigan_gp::data::{read_program, PopulationStore};
use morrigan_gp::engines::generation::codec;
use morrigan_gp::error::GpError;
use morrigan_gp::instructions::InstructionSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;

fn populate(store: &PopulationStore, generation: u32, seed: u64) {
    let set = InstructionSet::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let programs: Vec<_> = (0..store.population_size())
        .map(|_| codec::generate(&set, 4, 12, &mut rng).unwrap())
        .collect();
    store.write_generation(generation, &programs).unwrap();
}

#[test]
fn test_latest_generation_skips_gaps_and_noise() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 4);
    for generation in [0, 1, 3] {
        fs::create_dir(store.generation_dir(generation)).unwrap();
    }
    fs::create_dir(dir.path().join("backup")).unwrap();
    fs::write(dir.path().join("7"), "a file, not a generation").unwrap();

    assert_eq!(store.latest_generation().unwrap(), 3);
}

#[test]
fn test_generations_compare_numerically() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 4);
    for generation in [2, 9, 10] {
        fs::create_dir(store.generation_dir(generation)).unwrap();
    }
    assert_eq!(store.latest_generation().unwrap(), 10);
}

#[test]
fn test_zero_padded_names_are_not_generations() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 2);
    populate(&store, 0, 10);
    // Same programs under a padded name that cannot be rebuilt from its number.
    fs::rename(dir.path().join("0"), dir.path().join("01")).unwrap();
    populate(&store, 0, 10);

    let latest = store.latest_generation().unwrap();
    assert_eq!(latest, 0);
    assert_eq!(store.program_files(latest).unwrap().len(), 2);
}

#[test]
fn test_only_padded_names_is_no_population() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 2);
    fs::create_dir(dir.path().join("01")).unwrap();
    assert!(matches!(store.latest_generation(), Err(GpError::NoPopulation(_))));
}

#[test]
fn test_staging_directory_is_not_a_generation() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 2);
    populate(&store, 0, 15);
    let staged = store.stage_generation(1).unwrap();

    assert_eq!(store.latest_generation().unwrap(), 0);
    drop(staged);
    assert!(!store.staging_dir(1).exists());
}

#[test]
fn test_empty_root_has_no_population() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 4);
    assert!(matches!(store.latest_generation(), Err(GpError::NoPopulation(_))));
}

#[test]
fn test_fifteen_of_sixteen_is_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 16);
    populate(&store, 0, 11);
    fs::remove_file(store.program_path(0, 0xa)).unwrap();

    match store.program_files(0) {
        Err(GpError::SizeMismatch { expected, found, .. }) => {
            assert_eq!(expected, 16);
            assert_eq!(found, 15);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_program_files_ordered_by_index() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 16);
    populate(&store, 0, 12);

    let files = store.program_files(0).unwrap();
    let indices: Vec<usize> = files.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, (0..16).collect::<Vec<_>>());
    assert!(files[10].1.ends_with("a.sla"));
    assert!(files[15].1.ends_with("f.sla"));
}

#[test]
fn test_written_programs_read_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 4);
    populate(&store, 0, 13);

    for (index, path) in store.program_files(0).unwrap() {
        let text = fs::read_to_string(&path).unwrap();
        let program = read_program(&path).unwrap();
        assert_eq!(codec::encode(&program), text, "program {:x}", index);
    }
}

#[test]
fn test_write_generation_rejects_wrong_count() {
    let dir = tempfile::tempdir().unwrap();
    let store = PopulationStore::new(dir.path(), 4);
    populate(&store, 0, 14);
    let programs: Vec<_> = store
        .load_programs(0)
        .unwrap()
        .into_iter()
        .map(|(_, p)| p)
        .take(3)
        .collect();

    assert!(matches!(
        store.write_generation(1, &programs),
        Err(GpError::SizeMismatch { expected: 4, found: 3, .. })
    ));
    assert!(!store.generation_dir(1).exists());
}
