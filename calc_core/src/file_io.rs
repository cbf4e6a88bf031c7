//! # File I/O Module
//!
//! Session file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Two calculators never write the same session at once
//! - **Version validation**: Ensure schema compatibility
//!
//! ## File Format
//!
//! Sessions are saved as `.calc` files containing JSON.
//! Lock files use `.calc.lock` extension with metadata about who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use calc_core::file_io::{save_session, load_session, FileLock};
//! use calc_core::calculator::Calculator;
//! use std::path::Path;
//!
//! let calc = Calculator::default();
//! let path = Path::new("today.calc");
//!
//! // Acquire lock before saving
//! let lock = FileLock::acquire(path, "desk-1").unwrap();
//!
//! // Save with atomic write
//! save_session(&calc.to_session(), path).unwrap();
//!
//! // Lock is released when dropped
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::session::{Session, SCHEMA_VERSION};

/// Locks older than this are taken over regardless of their owner
const STALE_LOCK_HOURS: i64 = 24;

/// Recorded as the lock's machine when the host name cannot be read
const UNKNOWN_MACHINE: &str = "unknown";

/// Contents of a `.calc.lock` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Who took the lock (user name, terminal id, ...)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info describing the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: machine_name().unwrap_or_else(|| UNKNOWN_MACHINE.to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Whether the owner is gone or the lock has simply been forgotten
    fn is_stale(&self) -> bool {
        self.is_stale_on(machine_name().as_deref())
    }

    /// Staleness as seen from `local_machine`; `None` when this machine's
    /// name is unknown
    fn is_stale_on(&self, local_machine: Option<&str>) -> bool {
        if Utc::now() - self.locked_at > Duration::hours(STALE_LOCK_HOURS) {
            return true;
        }
        // Only a lock taken on this machine can be checked for a live owner
        let same_machine = matches!(
            local_machine,
            Some(name) if name == self.machine && name != UNKNOWN_MACHINE
        );
        same_machine && !process_alive(self.pid)
    }

    fn holder(&self) -> String {
        format!("{} ({})", self.user_id, self.machine)
    }
}

fn machine_name() -> Option<String> {
    let var = if cfg!(windows) { "COMPUTERNAME" } else { "HOSTNAME" };
    std::env::var(var)
        .or_else(|_| std::env::var("HOST"))
        .ok()
        .filter(|name| !name.is_empty())
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists() || !Path::new("/proc").exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive lock on a session file, released on drop.
///
/// Held both as an OS-level lock (fs2) on the `.lock` file and as readable
/// metadata inside it, so other processes can report who holds it.
pub struct FileLock {
    session_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a session file.
    ///
    /// Fails with [`CalcError::FileLocked`] while a live process holds it.
    ///
    /// ```rust,no_run
    /// use calc_core::file_io::FileLock;
    /// use std::path::Path;
    ///
    /// let lock = FileLock::acquire(Path::new("today.calc"), "desk-1")?;
    /// drop(lock); // releases lock
    /// # Ok::<(), calc_core::errors::CalcError>(())
    /// ```
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        if let Some(existing) = FileLock::check(path) {
            return Err(CalcError::file_locked(
                path.display().to_string(),
                existing.holder(),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let lock_path = lock_path_for(path);
        let lock_error = |operation: &str, e: std::io::Error| {
            CalcError::file_error(operation, lock_path.display().to_string(), e.to_string())
        };

        let mut lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| lock_error("create lock", e))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let info = LockInfo::new(user_id);
        let json = serde_json::to_string_pretty(&info).map_err(|e| CalcError::serialization(e.to_string()))?;
        lock_file
            .write_all(json.as_bytes())
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| lock_error("write lock", e))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "Session lock acquired");

        Ok(FileLock {
            session_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Who holds the lock on `path`, if anyone. Stale locks count as free.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path))
            .ok()
            .filter(|info| !info.is_stale())
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The OS lock goes with the file handle
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `today.calc` -> `today.calc.lock`
fn lock_path_for(session_path: &Path) -> PathBuf {
    with_suffix(session_path, "lock")
}

/// `today.calc` -> `today.calc.<suffix>`; no extension -> `today.<suffix>`
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let extension = match path.extension() {
        Some(ext) => format!("{}.{}", ext.to_string_lossy(), suffix),
        None => suffix.to_string(),
    };
    path.with_extension(extension)
}

fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let contents = fs::read_to_string(lock_path).map_err(|e| {
        CalcError::file_error("read lock", lock_path.display().to_string(), e.to_string())
    })?;
    serde_json::from_str(&contents).map_err(|e| CalcError::serialization(e.to_string()))
}

/// Write `contents` to `path` with atomic write semantics.
///
/// The write process:
/// 1. Write to a temporary file next to `path` (`.tmp` appended)
/// 2. Sync to disk (fsync)
/// 3. Rename over `path` (atomic on most filesystems)
///
/// This prevents a truncated file if the process is interrupted mid-write.
pub fn write_atomic(path: &Path, contents: &str) -> CalcResult<()> {
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(contents.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        // Clean up temp file if rename fails
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Save a session to a file with atomic write semantics.
///
/// # Example
///
/// ```rust,no_run
/// use calc_core::file_io::save_session;
/// use calc_core::session::Session;
/// use std::path::Path;
///
/// save_session(&Session::default(), Path::new("today.calc"))?;
/// # Ok::<(), calc_core::errors::CalcError>(())
/// ```
pub fn save_session(session: &Session, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(session).map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })?;

    write_atomic(path, &json)?;

    tracing::info!(
        path = %path.display(),
        entries = session.history.len(),
        "Session saved"
    );
    Ok(())
}

/// Load a session from a file.
///
/// # Returns
///
/// * `Ok(Session)` - Successfully loaded session
/// * `Err(CalcError::VersionMismatch)` - File version is incompatible
/// * `Err(CalcError::SerializationError)` - Invalid JSON
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_session(path: &Path) -> CalcResult<Session> {
    let mut file = File::open(path).map_err(|e| {
        CalcError::file_error("open", path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        CalcError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    let session: Session =
        serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    validate_version(&session.meta.version)?;

    tracing::info!(
        path = %path.display(),
        entries = session.history.len(),
        "Session loaded"
    );
    Ok(session)
}

/// Load a session, returning whether another process holds its lock.
///
/// # Returns
///
/// * `Ok((Session, None))` - Loaded successfully, no lock
/// * `Ok((Session, Some(LockInfo)))` - Loaded, but another process has the lock
/// * `Err(_)` - Failed to load
pub fn load_session_with_lock_check(path: &Path) -> CalcResult<(Session, Option<LockInfo>)> {
    let session = load_session(path)?;
    let lock_info = FileLock::check(path);
    Ok((session, lock_info))
}

/// Temp file used by [`write_atomic`]
fn tmp_path_for(path: &Path) -> PathBuf {
    with_suffix(path, "tmp")
}

/// Check a file's schema version against [`SCHEMA_VERSION`].
///
/// Majors must match. While the schema is 0.x, a newer minor is rejected too,
/// since 0.x minors may break the format.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file = Version::parse(file_version).map_err(|_| mismatch())?;
    let current = Version::parse(SCHEMA_VERSION).map_err(|e| CalcError::Internal {
        message: format!("Bad schema version constant: {}", e),
    })?;

    if file.major != current.major {
        return Err(mismatch());
    }
    if current.major == 0 && file.minor > current.minor {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{Calculator, Operator};
    use std::env::temp_dir;

    fn temp_session_path(name: &str) -> PathBuf {
        temp_dir().join(format!("calc_core_test_{}.calc", name))
    }

    fn session_with_history() -> Session {
        let mut calc = Calculator::default();
        calc.input_digit("9");
        calc.perform_operation(Operator::Subtract);
        calc.input_digit("4");
        calc.perform_operation(Operator::Evaluate);
        calc.to_session()
    }

    #[test]
    fn test_lock_path_generation() {
        let session_path = Path::new("/path/to/today.calc");
        assert_eq!(lock_path_for(session_path), Path::new("/path/to/today.calc.lock"));
        assert_eq!(tmp_path_for(session_path), Path::new("/path/to/today.calc.tmp"));
        assert_eq!(tmp_path_for(Path::new("/path/to/logs")), Path::new("/path/to/logs.tmp"));
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("desk-1");
        assert_eq!(info.user_id, "desk-1");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_session_path("roundtrip");

        let session = session_with_history();
        save_session(&session, &path).unwrap();

        let loaded = load_session(&path).unwrap();
        assert_eq!(loaded.meta.id, session.meta.id);
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(loaded.history[0].expression, "9 - 4");
        assert_eq!(loaded.history[0].result, 5.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_session_path("atomic");
        let tmp_path = tmp_path_for(&path);

        save_session(&Session::default(), &path).unwrap();

        assert!(!tmp_path.exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let path = temp_session_path("invalid_json");
        write_atomic(&path, "{ \"meta\": ").unwrap();

        let err = load_session(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let path = temp_session_path("newer_schema");
        let mut session = Session::default();
        session.meta.version = "0.9.0".to_string();
        save_session(&session, &path).unwrap();

        let err = load_session(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_session(&temp_session_path("does_not_exist")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let path = temp_session_path("lock_test");

        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "desk-1").unwrap();
        assert_eq!(lock.info.user_id, "desk-1");
        assert_eq!(lock.session_path(), path.as_path());

        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);

        assert!(!lock_path.exists());

        let _ = fs::remove_file(&path);
    }

    fn foreign_lock(machine: &str) -> LockInfo {
        LockInfo {
            user_id: "desk-2".to_string(),
            machine: machine.to_string(),
            pid: u32::MAX,
            locked_at: Utc::now(),
        }
    }

    #[test]
    fn test_lock_from_unnamed_machine_is_not_stale() {
        let info = foreign_lock(UNKNOWN_MACHINE);
        assert!(!info.is_stale_on(None));
        assert!(!info.is_stale_on(Some(UNKNOWN_MACHINE)));
        assert!(!info.is_stale_on(Some("desk-1-host")));
    }

    #[test]
    fn test_lock_from_other_machine_is_not_stale() {
        let info = foreign_lock("other-host");
        assert!(!info.is_stale_on(Some("this-host")));
        assert!(!info.is_stale_on(None));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_dead_owner_on_same_machine_is_stale() {
        let info = foreign_lock("this-host");
        assert!(info.is_stale_on(Some("this-host")));
    }

    #[test]
    fn test_old_lock_is_stale_anywhere() {
        let mut info = foreign_lock("other-host");
        info.locked_at = Utc::now() - Duration::hours(STALE_LOCK_HOURS + 1);
        assert!(info.is_stale_on(None));
        assert!(info.is_stale_on(Some("this-host")));
    }

    #[test]
    fn test_acquire_fails_while_lock_is_held() {
        let path = temp_session_path("held_lock");
        File::create(&path).unwrap();

        let lock_path = lock_path_for(&path);
        let held = foreign_lock(UNKNOWN_MACHINE);
        fs::write(&lock_path, serde_json::to_string(&held).unwrap()).unwrap();

        assert_eq!(FileLock::check(&path).map(|info| info.user_id), Some("desk-2".to_string()));
        let err = FileLock::acquire(&path, "desk-1").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert!(lock_path.exists());

        let _ = fs::remove_file(&lock_path);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_second_acquire_fails_while_first_is_alive() {
        let path = temp_session_path("double_lock");
        File::create(&path).unwrap();

        let first = FileLock::acquire(&path, "desk-1").unwrap();
        let err = FileLock::acquire(&path, "desk-2").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");

        drop(first);
        assert!(FileLock::acquire(&path, "desk-2").is_ok());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_session_path("lock_check");

        save_session(&session_with_history(), &path).unwrap();

        let (loaded, lock_info) = load_session_with_lock_check(&path).unwrap();
        assert_eq!(loaded.history.len(), 1);
        assert!(lock_info.is_none());

        let _ = fs::remove_file(&path);
    }
}
