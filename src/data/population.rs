use crate::engines::generation::codec;
use crate::error::{GpError, Result};
use crate::types::{GenerationId, Program};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const PROGRAM_EXTENSION: &str = "sla";

/// Maps generation numbers to directories of program files.
///
/// Layout: `<root>/<generation>/<hex-index>.sla`. Generations are
/// write-once, never removed, and appear on disk only when complete.
#[derive(Debug, Clone)]
pub struct PopulationStore {
    root: PathBuf,
    population_size: usize,
}

impl PopulationStore {
    pub fn new<P: AsRef<Path>>(root: P, population_size: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            population_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn generation_dir(&self, generation: GenerationId) -> PathBuf {
        self.root.join(generation.to_string())
    }

    pub fn program_path(&self, generation: GenerationId, index: usize) -> PathBuf {
        self.generation_dir(generation)
            .join(format!("{:x}.{}", index, PROGRAM_EXTENSION))
    }

    /// Highest generation directory under the root.
    ///
    /// Entries whose names are not plain decimal numbers are ignored.
    pub fn latest_generation(&self) -> Result<GenerationId> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GpError::NoPopulation(self.root.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut latest = None;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(generation) = entry.file_name().to_str().and_then(parse_generation_name) else {
                continue;
            };
            latest = latest.max(Some(generation));
        }

        latest.ok_or_else(|| GpError::NoPopulation(self.root.clone()))
    }

    /// Program files of a generation, ordered by index.
    ///
    /// The directory must hold exactly `population_size` programs indexed
    /// `0..population_size`.
    pub fn program_files(&self, generation: GenerationId) -> Result<Vec<(usize, PathBuf)>> {
        let dir = self.generation_dir(generation);
        let mut files = BTreeMap::new();

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(PROGRAM_EXTENSION) {
                continue;
            }

            let index = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| usize::from_str_radix(s, 16).ok())
                .ok_or_else(|| {
                    GpError::Format(format!("{}: file name is not a hex index", path.display()))
                })?;

            if let Some(previous) = files.insert(index, path.clone()) {
                return Err(GpError::Format(format!(
                    "{} and {} share index {:x}",
                    previous.display(),
                    path.display(),
                    index
                )));
            }
        }

        if files.len() != self.population_size {
            return Err(GpError::SizeMismatch {
                path: dir,
                expected: self.population_size,
                found: files.len(),
            });
        }

        if let Some((&index, path)) = files.iter().find(|(i, _)| **i >= self.population_size) {
            return Err(GpError::Format(format!(
                "{}: index {:x} outside population of {}",
                path.display(),
                index,
                self.population_size
            )));
        }

        Ok(files.into_iter().collect())
    }

    pub fn load_programs(&self, generation: GenerationId) -> Result<Vec<(usize, Program)>> {
        self.program_files(generation)?
            .into_iter()
            .map(|(index, path)| Ok((index, read_program(&path)?)))
            .collect()
    }

    /// Hidden directory a generation is assembled in before it is published.
    ///
    /// Its name is not a decimal number, so discovery never sees it.
    pub fn staging_dir(&self, generation: GenerationId) -> PathBuf {
        self.root.join(format!(".{}.partial", generation))
    }

    /// Start assembling a generation that does not exist yet.
    ///
    /// Programs go into a staging directory that becomes `<root>/<generation>`
    /// only on [`StagedGeneration::commit`]. Dropping the handle without
    /// committing removes everything written so far.
    pub fn stage_generation(&self, generation: GenerationId) -> Result<StagedGeneration> {
        let target = self.generation_dir(generation);
        if target.exists() {
            return Err(GpError::AlreadyExists(target));
        }

        fs::create_dir_all(&self.root)?;
        let dir = self.staging_dir(generation);
        if dir.exists() {
            log::warn!("Removing stale staging directory {}", dir.display());
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir(&dir)?;

        Ok(StagedGeneration {
            dir,
            target,
            population_size: self.population_size,
            committed: false,
        })
    }

    /// Write and publish a whole generation, program `i` to index `i`.
    pub fn write_generation(&self, generation: GenerationId, programs: &[Program]) -> Result<PathBuf> {
        let staged = self.stage_generation(generation)?;
        staged.write_all(programs)?;
        staged.commit()
    }
}

/// A generation being written; see [`PopulationStore::stage_generation`].
#[derive(Debug)]
pub struct StagedGeneration {
    dir: PathBuf,
    target: PathBuf,
    population_size: usize,
    committed: bool,
}

impl StagedGeneration {
    pub fn staging_dir(&self) -> &Path {
        &self.dir
    }

    pub fn target_dir(&self) -> &Path {
        &self.target
    }

    pub fn write_program(&self, index: usize, program: &Program) -> Result<PathBuf> {
        let path = self.dir.join(format!("{:x}.{}", index, PROGRAM_EXTENSION));
        fs::write(&path, codec::encode(program))?;
        Ok(path)
    }

    pub fn write_all(&self, programs: &[Program]) -> Result<()> {
        if programs.len() != self.population_size {
            return Err(GpError::SizeMismatch {
                path: self.target.clone(),
                expected: self.population_size,
                found: programs.len(),
            });
        }

        for (index, program) in programs.iter().enumerate() {
            let path = self.write_program(index, program)?;
            log::debug!("Wrote {}", path.display());
        }
        Ok(())
    }

    /// Publish the staged programs under the generation's real name.
    pub fn commit(mut self) -> Result<PathBuf> {
        if self.target.exists() {
            return Err(GpError::AlreadyExists(self.target.clone()));
        }
        fs::rename(&self.dir, &self.target)?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedGeneration {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {}", self.dir.display(), e);
            }
        }
    }
}

/// Only canonical decimal names count, so the directory can be rebuilt
/// from the number.
fn parse_generation_name(name: &str) -> Option<GenerationId> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let generation: GenerationId = name.parse().ok()?;
    (generation.to_string() == name).then_some(generation)
}

pub fn read_program(path: &Path) -> Result<Program> {
    let text = fs::read_to_string(path)?;
    codec::decode(&text).map_err(|e| match e {
        GpError::Format(reason) => GpError::Format(format!("{}: {}", path.display(), reason)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Instruction;

    fn program() -> Program {
        Program::new(vec![Instruction::opcode("inc"), Instruction::Immediate(3)]).unwrap()
    }

    #[test]
    fn test_generation_names() {
        assert_eq!(parse_generation_name("0"), Some(0));
        assert_eq!(parse_generation_name("12"), Some(12));
        assert_eq!(parse_generation_name("012"), None);
        assert_eq!(parse_generation_name("00"), None);
        assert_eq!(parse_generation_name("-1"), None);
        assert_eq!(parse_generation_name("1a"), None);
        assert_eq!(parse_generation_name(""), None);
        assert_eq!(parse_generation_name(".1.partial"), None);
        assert_eq!(parse_generation_name("99999999999999999999"), None);
    }

    #[test]
    fn test_program_paths_use_hex_index() {
        let store = PopulationStore::new("/pop", 16);
        assert_eq!(store.program_path(3, 15), PathBuf::from("/pop/3/f.sla"));
        assert_eq!(store.program_path(0, 16), PathBuf::from("/pop/0/10.sla"));
        assert_eq!(store.staging_dir(4), PathBuf::from("/pop/.4.partial"));
    }

    #[test]
    fn test_missing_root_is_no_population() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path().join("absent"), 4);
        assert!(matches!(store.latest_generation(), Err(GpError::NoPopulation(_))));
    }

    #[test]
    fn test_write_and_load_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path(), 3);
        let published = store.write_generation(0, &vec![program(); 3]).unwrap();

        assert_eq!(published, dir.path().join("0"));
        assert!(!store.staging_dir(0).exists());
        let loaded = store.load_programs(0).unwrap();
        assert_eq!(loaded.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(loaded.iter().all(|(_, p)| *p == program()));
    }

    #[test]
    fn test_result_logs_are_not_counted_as_programs() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path(), 2);
        store.write_generation(0, &vec![program(); 2]).unwrap();
        fs::write(dir.path().join("0/0.sla.log"), "1\n2\n3\n4\n5\n6\n").unwrap();

        assert_eq!(store.program_files(0).unwrap().len(), 2);
    }

    #[test]
    fn test_generations_are_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path(), 2);
        store.write_generation(1, &vec![program(); 2]).unwrap();
        assert!(matches!(store.stage_generation(1), Err(GpError::AlreadyExists(_))));
        assert!(matches!(
            store.write_generation(1, &vec![program(); 2]),
            Err(GpError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_uncommitted_stage_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path(), 2);
        {
            let staged = store.stage_generation(0).unwrap();
            staged.write_program(0, &program()).unwrap();
            assert!(store.staging_dir(0).join("0.sla").exists());
        }
        assert!(!store.staging_dir(0).exists());
        assert!(!store.generation_dir(0).exists());
    }

    #[test]
    fn test_short_write_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path(), 3);
        assert!(matches!(
            store.write_generation(0, &vec![program(); 2]),
            Err(GpError::SizeMismatch { expected: 3, found: 2, .. })
        ));
        assert!(!store.generation_dir(0).exists());
        assert!(!store.staging_dir(0).exists());
    }

    #[test]
    fn test_stale_stage_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path(), 1);
        fs::create_dir(store.staging_dir(0)).unwrap();
        fs::write(store.staging_dir(0).join("5.sla"), "dec.").unwrap();

        store.write_generation(0, &[program()]).unwrap();
        assert_eq!(store.program_files(0).unwrap().len(), 1);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path(), 2);
        fs::create_dir(store.generation_dir(0)).unwrap();
        fs::write(store.program_path(0, 0), "inc.").unwrap();
        fs::write(store.program_path(0, 5), "inc.").unwrap();
        assert!(matches!(store.program_files(0), Err(GpError::Format(_))));
    }

    #[test]
    fn test_malformed_program_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = PopulationStore::new(dir.path(), 1);
        fs::create_dir(store.generation_dir(0)).unwrap();
        fs::write(store.program_path(0, 0), "inc/dec").unwrap();
        match store.load_programs(0) {
            Err(GpError::Format(reason)) => assert!(reason.contains("0.sla")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
