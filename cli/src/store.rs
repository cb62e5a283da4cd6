//! Ledger state file: load, atomic save and single-operation commits

use fd_lock::RwLock;
use log::{debug, error, trace};
use pool_ledger::{Pool, PoolError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Ledger keyed by account name
pub type Ledger = Pool<String>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("State file not found: {0} (create one with `pool init`)")]
    StateMissing(PathBuf),

    #[error("State file already exists: {0} (pass --force to overwrite)")]
    StateExists(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid state file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("State file {0} violates ledger invariants")]
    Corrupt(PathBuf),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn load(path: &Path) -> Result<Ledger, CliError> {
    if !path.exists() {
        return Err(CliError::StateMissing(path.to_path_buf()));
    }

    let data = fs::read_to_string(path).map_err(io_error(path))?;
    let pool: Ledger = serde_json::from_str(&data).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if !pool.check_invariants() {
        return Err(CliError::Corrupt(path.to_path_buf()));
    }
    Ok(pool)
}

/// Write the ledger to a uniquely named sibling temp file and rename it over
/// `path`
pub fn save(path: &Path, pool: &Ledger) -> Result<(), CliError> {
    let data = serde_json::to_vec_pretty(pool).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = NamedTempFile::new_in(parent_dir(path)).map_err(io_error(path))?;
    tmp.write_all(&data).map_err(io_error(tmp.path()))?;
    tmp.as_file().sync_all().map_err(io_error(tmp.path()))?;
    tmp.persist(path).map_err(|e| CliError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    debug!("saved ledger to {}", path.display());
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Sibling `<state>.lock` file guarding read-modify-write cycles
fn lock_path(path: &Path) -> PathBuf {
    let mut lock = path.as_os_str().to_owned();
    lock.push(".lock");
    PathBuf::from(lock)
}

fn open_lock(path: &Path) -> Result<RwLock<File>, CliError> {
    let lock = lock_path(path);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock)
        .map_err(io_error(&lock))?;
    Ok(RwLock::new(file))
}

/// Create a fresh ledger file
pub fn create(path: &Path, fee: u128, force: bool) -> Result<Ledger, CliError> {
    let mut lock = open_lock(path)?;
    let _guard = lock.write().map_err(io_error(path))?;

    if path.exists() && !force {
        return Err(CliError::StateExists(path.to_path_buf()));
    }
    let pool = Ledger::new(fee);
    save(path, &pool)?;
    Ok(pool)
}

/// Load, apply one mutating operation, and save only if it succeeded
///
/// Holds an exclusive lock on the state file's `.lock` sibling from load
/// through save, so concurrent callers are serialized.
pub fn commit<T>(
    path: &Path,
    op: impl FnOnce(&mut Ledger) -> pool_ledger::Result<T>,
) -> Result<(T, Ledger), CliError> {
    let mut lock = open_lock(path)?;
    let _guard = lock.write().map_err(io_error(path))?;
    trace!("locked {}", path.display());

    let mut pool = load(path)?;
    let out = op(&mut pool)?;

    if !pool.check_invariants() {
        error!("ledger invariants broken after commit; state not saved");
        return Err(CliError::Corrupt(path.to_path_buf()));
    }
    debug!("invariants hold: {:?}", pool.get_pool_details());

    save(path, &pool)?;
    Ok((out, pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("pool.json")
    }

    #[test]
    fn test_create_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(&dir);

        create(&path, 3, false).unwrap();
        let pool = load(&path).unwrap();
        assert_eq!(pool.fee(), 3);
        assert!(!pool.is_active());
    }

    #[test]
    fn test_create_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(&dir);

        create(&path, 0, false).unwrap();
        assert!(matches!(create(&path, 0, false), Err(CliError::StateExists(_))));
        assert!(create(&path, 5, true).is_ok());
        assert_eq!(load(&path).unwrap().fee(), 5);
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(&state_path(&dir)), Err(CliError::StateMissing(_))));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(&dir);
        fs::write(&path, "not json").unwrap();
        assert!(matches!(load(&path), Err(CliError::Json { .. })));
    }

    #[test]
    fn test_commit_persists_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(&dir);
        create(&path, 0, false).unwrap();

        let alice = "alice".to_string();
        commit(&path, |pool| pool.faucet(&alice, 100, 200)).unwrap();
        let (share, _) = commit(&path, |pool| pool.provide(&alice, 10, 20)).unwrap();
        assert_eq!(share, 100_000_000);

        let pool = load(&path).unwrap();
        assert_eq!(pool.get_holdings(&alice).token1, 90);
        assert_eq!(pool.get_pool_details().total_token2, 20);

        // Only the state file and its lock remain, no stray temp files
        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["pool.json", "pool.json.lock"]);
    }

    #[test]
    fn test_commit_failure_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(&dir);
        create(&path, 0, false).unwrap();

        let alice = "alice".to_string();
        commit(&path, |pool| pool.faucet(&alice, 100, 200)).unwrap();
        commit(&path, |pool| pool.provide(&alice, 50, 100)).unwrap();
        let before = fs::read(&path).unwrap();

        let result = commit(&path, |pool| pool.swap_exact_token1(&alice, 50, 51));
        assert!(matches!(result, Err(CliError::Pool(PoolError::SlippageExceeded))));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_concurrent_commits_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(&dir);
        create(&path, 0, false).unwrap();

        const THREADS: u128 = 8;
        const COMMITS: u128 = 25;

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    let alice = "alice".to_string();
                    for _ in 0..COMMITS {
                        commit(&path, |pool| pool.faucet(&alice, 1, 1)).unwrap();
                    }
                });
            }
        });

        let holdings = load(&path).unwrap().get_holdings(&"alice".to_string());
        assert_eq!(holdings.token1, THREADS * COMMITS);
        assert_eq!(holdings.token2, THREADS * COMMITS);
    }

    #[test]
    fn test_error_messages() {
        let err = CliError::from(PoolError::ZeroLiquidity);
        assert_eq!(err.to_string(), "Pool has zero liquidity");

        let err = CliError::StateMissing(PathBuf::from("pool.json"));
        assert!(err.to_string().contains("pool init"));
    }
}
