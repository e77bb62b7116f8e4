//!A library for random access to single lines of large text files using a
//!persisted byte-offset index

pub mod error;
/// Bounded-range reads of single lines
pub mod fetch;
/// The offset index of a source file and its builder
pub mod index;
/// Persistence of offset indexes in side-car files
pub mod store;

use async_std::path::Path;

use error::Error;
pub use fetch::fetch_line;
pub use index::LineIndex;
pub use store::{sidecar_path, BinaryStore, IndexStore, JsonStore};

pub type Result<T> = std::result::Result<T, error::Error>;

/// Look up line `line` (0-based) of the text file at `source`.
///
/// Reuses the side-car index next to the source file when it is present and
/// fresh; builds and persists it otherwise. Uses the default JSON side-car
/// representation.
pub async fn find_line<P: AsRef<Path>>(source: P, line: usize) -> Result<String> {
    find_line_with_store(source, line, &JsonStore).await
}

/// `find_line` with an explicit side-car representation
pub async fn find_line_with_store<P, S>(source: P, line: usize, store: &S) -> Result<String>
where
    P: AsRef<Path>,
    S: IndexStore,
{
    let source = source.as_ref();
    if !source.exists().await {
        return Err(Error::FileNotFound(source.as_os_str().into()));
    }

    let index_path = sidecar_path(source);
    let index = if store.exists(&index_path).await {
        let loaded = store.load(&index_path).await?;
        ensure_fresh(source, &index_path, loaded, store).await?
    } else {
        let built = LineIndex::build(source).await?;
        store.save(&index_path, &built).await?;
        built
    };

    fetch::fetch_line(source, &index, line).await
}

/// Return `loaded` unchanged if its recorded modification time still equals
/// the source file's current one, otherwise rebuild the index and persist it
/// over the stale side-car.
///
/// Timestamp equality is the sole invalidation policy. A modification that
/// leaves the timestamp unchanged within the filesystem's clock resolution
/// goes undetected.
pub async fn ensure_fresh<S: IndexStore>(
    source: &Path,
    index_path: &Path,
    loaded: LineIndex,
    store: &S,
) -> Result<LineIndex> {
    let current = index::source_mtime(source).await?;
    if loaded.mtime() == current {
        return Ok(loaded);
    }

    log::debug!("index for {} is stale, rebuilding", source.display());

    let rebuilt = LineIndex::build(source).await?;
    store.save(index_path, &rebuilt).await?;

    Ok(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, SystemTime};

    use async_std::path::PathBuf;
    use chrono::DateTime;
    use rand::{distributions::Uniform, Rng};

    fn write_source(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        PathBuf::from(path)
    }

    #[async_std::test]
    async fn looks_up_lines_and_persists_a_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "greek", "alpha\nbeta\ngamma\n");

        assert_eq!(find_line(&source, 1).await.unwrap(), "beta");
        assert!(sidecar_path(&source).exists().await);

        assert_eq!(find_line(&source, 0).await.unwrap(), "alpha");
        assert_eq!(find_line(&source, 2).await.unwrap(), "gamma");
    }

    #[async_std::test]
    async fn persisted_offsets_match_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "greek", "alpha\nbeta\ngamma\n");

        find_line(&source, 0).await.unwrap();

        let stored = JsonStore.load(&sidecar_path(&source)).await.unwrap();
        assert_eq!(stored.offsets(), &[0, 6, 11]);
    }

    #[async_std::test]
    async fn line_past_the_end_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "greek", "alpha\nbeta\ngamma\n");

        assert!(matches!(
            find_line(&source, 3).await,
            Err(Error::LineNotFound { line: 3, lines: 3 })
        ));
    }

    #[async_std::test]
    async fn empty_files_have_no_lines() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "empty", "");

        assert!(matches!(
            find_line(&source, 0).await,
            Err(Error::LineNotFound { line: 0, lines: 0 })
        ));
    }

    #[async_std::test]
    async fn missing_sources_are_reported_before_any_index_work() {
        let dir = tempfile::tempdir().unwrap();
        let source = PathBuf::from(dir.path().join("nope"));

        assert!(matches!(
            find_line(&source, 0).await,
            Err(Error::FileNotFound(_))
        ));
        assert!(!sidecar_path(&source).exists().await);
    }

    #[async_std::test]
    async fn second_lookup_reuses_the_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "greek", "alpha\nbeta\ngamma\n");

        find_line(&source, 0).await.unwrap();
        let first = std::fs::read(dir.path().join("greek.idx")).unwrap();

        find_line(&source, 2).await.unwrap();
        let second = std::fs::read(dir.path().join("greek.idx")).unwrap();

        // Unchanged mtime means no rebuild, so the side-car stays
        // bit-identical
        assert_eq!(first, second);
    }

    #[async_std::test]
    async fn fresh_sidecar_is_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "words", "one\ntwo\nthree\n");

        // A doctored index with a matching mtime must be used as-is
        let mtime = index::source_mtime(&source).await.unwrap();
        let doctored = LineIndex::new(mtime, vec![0, 8]);
        JsonStore.save(&sidecar_path(&source), &doctored).await.unwrap();

        assert_eq!(find_line(&source, 1).await.unwrap(), "three");
    }

    #[async_std::test]
    async fn stale_sidecar_triggers_a_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "words", "one\ntwo\nthree\n");

        // A recorded mtime from 1970 cannot match the source
        let stale = LineIndex::new(DateTime::from_timestamp(0, 0).unwrap(), vec![0, 2, 4]);
        JsonStore.save(&sidecar_path(&source), &stale).await.unwrap();

        assert_eq!(find_line(&source, 1).await.unwrap(), "two");

        // The rebuilt index replaced the stale side-car
        let reloaded = JsonStore.load(&sidecar_path(&source)).await.unwrap();
        assert_eq!(reloaded.offsets(), &[0, 4, 8]);
    }

    #[async_std::test]
    async fn modified_sources_are_reindexed() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "data", "one\ntwo\nthree\n");

        assert_eq!(find_line(&source, 2).await.unwrap(), "three");

        // Replace the content and give the file a clearly different mtime
        let std_path = dir.path().join("data");
        std::fs::write(&std_path, "first\nsecond\n").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&std_path)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(10))
            .unwrap();

        assert_eq!(find_line(&source, 1).await.unwrap(), "second");
        assert!(matches!(
            find_line(&source, 2).await,
            Err(Error::LineNotFound { line: 2, lines: 2 })
        ));
    }

    #[async_std::test]
    async fn corrupt_sidecars_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "greek", "alpha\nbeta\ngamma\n");
        std::fs::write(dir.path().join("greek.idx"), "{definitely not json").unwrap();

        assert!(matches!(
            find_line(&source, 0).await,
            Err(Error::CorruptIndex(_))
        ));
    }

    #[async_std::test]
    async fn binary_store_lookups_work_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "greek", "alpha\nbeta\ngamma\n");

        assert_eq!(
            find_line_with_store(&source, 1, &BinaryStore).await.unwrap(),
            "beta"
        );
        assert!(BinaryStore.exists(&sidecar_path(&source)).await);
        assert_eq!(
            find_line_with_store(&source, 2, &BinaryStore).await.unwrap(),
            "gamma"
        );
    }

    #[async_std::test]
    async fn random_access_matches_a_sequential_read() {
        let content = std::fs::read_to_string("./testfiles/input1").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "input1", &content);

        let lines: Vec<&str> = content.lines().collect();
        let picks: Vec<usize> = rand::thread_rng()
            .sample_iter(Uniform::new(0, lines.len()))
            .take(lines.len() * 3)
            .collect();

        for line in picks {
            assert_eq!(find_line(&source, line).await.unwrap(), lines[line].trim());
        }
    }
}
