// File: src/persistence.rs
use crate::core::frequency::FrequencyTable;
use crate::core::types::{Denominators, PerSource, SourceWeights};
use crate::error::{ExpandError, ExpandResult};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Format marker of the columnar frequency file.
const FREQUENCY_FORMAT_VERSION: u32 = 1;

/// Whole-file writes that land together or not at all.
///
/// Every artifact is first written to a temp file next to its target; only
/// once all of them are written are they renamed into place.
#[derive(Default)]
pub struct StagedWrites {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, path: &Path, bytes: &[u8]) -> ExpandResult<()> {
        let parent_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            writer.write_all(bytes)?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        self.staged.push((temp_file, path.to_path_buf()));
        Ok(())
    }

    /// Renames every staged file onto its target.
    pub fn commit(self) -> ExpandResult<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.staged.len());
        for (temp_file, target) in self.staged {
            temp_file.persist(&target).map_err(|e| ExpandError::Io(e.error))?;
            tracing::debug!(path = %target.display(), "artifact written");
            written.push(target);
        }
        Ok(written)
    }
}

/// The on-disk shape of a frequency table: parallel columns plus the
/// per-source denominators. Derived ppm columns are not stored.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct FrequencyColumns {
    version: u32,
    word: Vec<String>,
    count_hkcancor: Vec<u64>,
    count_subtitles: Vec<u64>,
    count_app: Vec<u64>,
    tokens: Denominators,
    weights: SourceWeights,
}

impl FrequencyColumns {
    fn from_table(table: &FrequencyTable) -> Self {
        let rows = table.rows();
        Self {
            version: FREQUENCY_FORMAT_VERSION,
            word: rows.iter().map(|r| r.word.clone()).collect(),
            count_hkcancor: rows.iter().map(|r| r.counts.hkcancor).collect(),
            count_subtitles: rows.iter().map(|r| r.counts.subtitles).collect(),
            count_app: rows.iter().map(|r| r.counts.app).collect(),
            tokens: table.denominators(),
            weights: table.weights(),
        }
    }

    fn into_table(self, path: &Path, weights: SourceWeights) -> ExpandResult<FrequencyTable> {
        if self.version != FREQUENCY_FORMAT_VERSION {
            return Err(ExpandError::corrupt(
                path,
                format!("unsupported format version {}", self.version),
            ));
        }
        let n = self.word.len();
        if self.count_hkcancor.len() != n || self.count_subtitles.len() != n || self.count_app.len() != n {
            return Err(ExpandError::corrupt(path, "column lengths differ"));
        }

        let counts = self
            .word
            .into_iter()
            .zip(self.count_hkcancor)
            .zip(self.count_subtitles)
            .zip(self.count_app)
            .map(|(((word, h), s), a)| (word, PerSource::new(h, s, a)))
            .collect();
        Ok(FrequencyTable::from_counts(counts, self.tokens, weights))
    }
}

/// The frequency table on disk, with a TSV mirror for inspection.
#[derive(Debug, Clone)]
pub struct FrequencyStore {
    path: PathBuf,
}

impl FrequencyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mirror_path(&self) -> PathBuf {
        self.path.with_extension("tsv")
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Stages the columnar file and its mirror.
    pub fn stage(&self, table: &FrequencyTable, writes: &mut StagedWrites) -> ExpandResult<()> {
        let columns = FrequencyColumns::from_table(table);
        let bytes = bincode::serialize(&columns)
            .map_err(|e| ExpandError::corrupt(&self.path, e))?;
        writes.stage(&self.path, &bytes)?;
        writes.stage(&self.mirror_path(), render_tsv(table).as_bytes())?;
        Ok(())
    }

    pub fn save(&self, table: &FrequencyTable) -> ExpandResult<()> {
        let mut writes = StagedWrites::new();
        self.stage(table, &mut writes)?;
        writes.commit()?;
        Ok(())
    }

    /// Loads the table and derives every ppm column under `weights`.
    pub fn load(&self, weights: SourceWeights) -> ExpandResult<FrequencyTable> {
        if !self.exists() {
            return Err(ExpandError::FrequencyTableMissing(self.path.clone()));
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let columns: FrequencyColumns = bincode::deserialize_from(reader)
            .map_err(|e| ExpandError::corrupt(&self.path, e))?;
        columns.into_table(&self.path, weights)
    }
}

/// Plain-text mirror, most frequent first.
pub fn render_tsv(table: &FrequencyTable) -> String {
    let mut rows: Vec<_> = table.rows().iter().collect();
    rows.sort_by(|a, b| {
        b.ppm_weighted
            .total_cmp(&a.ppm_weighted)
            .then_with(|| a.word.cmp(&b.word))
    });

    let mut out = String::from(
        "word\tcount_hkcancor\tcount_subtitles\tcount_app\tppm_hkcancor\tppm_subtitles\tppm_app\tppm_weighted\n",
    );
    for row in rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\n",
            row.word,
            row.counts.hkcancor,
            row.counts.subtitles,
            row.counts.app,
            row.ppm_raw.hkcancor,
            row.ppm_raw.subtitles,
            row.ppm_raw.app,
            row.ppm_weighted,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DEFAULT_WEIGHTS;
    use tempfile::TempDir;

    fn sample() -> FrequencyTable {
        FrequencyTable::from_counts(
            vec![
                ("你好".to_string(), PerSource::new(50, 20, 0)),
                ("早晨".to_string(), PerSource::new(5, 0, 1)),
            ],
            PerSource::new(1_000_000, 1_000_000, 10),
            DEFAULT_WEIGHTS,
        )
    }

    #[test]
    fn test_save_and_load_recomputes_under_new_weights() {
        let dir = TempDir::new().unwrap();
        let store = FrequencyStore::new(dir.path().join("freq/table.bin"));
        store.save(&sample()).unwrap();

        assert!(store.mirror_path().is_file());
        let weights = PerSource::new(1.0, 0.35, 0.0);
        let loaded = store.load(weights).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.weights(), weights);
        assert!((loaded.get("你好").unwrap().ppm_weighted - 57.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FrequencyStore::new(dir.path().join("absent.bin"));
        let err = store.load(DEFAULT_WEIGHTS).unwrap_err();
        assert!(matches!(err, ExpandError::FrequencyTableMissing(_)));
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.bin");
        fs::write(&path, b"not bincode").unwrap();
        let err = FrequencyStore::new(&path).load(DEFAULT_WEIGHTS).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_mirror_is_sorted_by_weighted_ppm() {
        let tsv = render_tsv(&sample());
        let lines: Vec<&str> = tsv.lines().collect();
        assert!(lines[0].starts_with("word\tcount_hkcancor"));
        // 早晨 is carried by the small app source: 5 + 0.10 * 100_000
        assert!(lines[1].starts_with("早晨\t5\t0\t1\t"));
        assert!(lines[2].starts_with("你好\t50\t20\t0\t"));
        assert_eq!(lines.len(), 3);
        assert!(tsv.ends_with("57.0000\n"));
    }

    #[test]
    fn test_unstaged_targets_untouched_until_commit() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.txt");
        fs::write(&target, "old").unwrap();

        let mut writes = StagedWrites::new();
        writes.stage(&target, b"new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");

        writes.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }
}
