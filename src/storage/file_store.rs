//! File Store
//!
//! Owns the backing file and provides locked read-modify-write over single
//! line slots.
//!
//! ## Mutation protocol
//! 1. Take the exclusive sidecar lock (fail fast with `LockBusy`)
//! 2. Inspect the target line(s) and decide
//! 3. Stream every line into `{path}.tmp`, replacing only the target line
//!    and padding with empty lines if the file is too short
//! 4. Optionally fsync, then rename over `{path}`
//! 5. Release the lock
//!
//! A mutation that fails before step 4 never renames, so the backing file is
//! left byte-identical. Because the rename swaps the whole file at once, an
//! unlocked reader sees either the complete old or the complete new contents.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{LineKvError, Result};
use crate::record::{self, Record};

use super::FileLock;

/// Line-addressed record storage over one flat text file
#[derive(Debug)]
pub struct FileStore {
    /// Backing data file
    path: PathBuf,

    /// Sidecar file the mutation lock is taken on
    lock_path: PathBuf,

    /// Sidecar the rewritten file is staged in
    tmp_path: PathBuf,

    /// fsync staged file before rename
    sync_writes: bool,
}

impl FileStore {
    /// Open or create the backing file
    pub fn open(path: &Path, sync_writes: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            lock_path: sidecar(path, "lock"),
            tmp_path: sidecar(path, "tmp"),
            sync_writes,
        })
    }

    // =========================================================================
    // Single-line primitives
    // =========================================================================

    /// Record at `line`, or `None` if the line is empty or past the end
    ///
    /// Takes no lock.
    pub fn read_at(&self, line: u64) -> Result<Option<Record>> {
        let raw = self.read_raw_lines(line, 1)?;
        match raw.first() {
            Some(text) => decode_at(line, text),
            None => Ok(None),
        }
    }

    /// Write `record` at `line`
    ///
    /// Fails with `DuplicateKey` if the line already holds the same key. Any
    /// other content at the line is replaced.
    pub fn write_at(&self, line: u64, record: &Record) -> Result<()> {
        let _lock = self.lock()?;

        if let Some(text) = self.read_raw_lines(line, 1)?.first() {
            if matches!(probe_key(line, text), Slot::Key(key) if key == record.key) {
                return Err(LineKvError::DuplicateKey {
                    key: record.key.clone(),
                    line,
                });
            }
        }

        self.rewrite_line(line, &record::encode(record)?)?;
        tracing::debug!(line, key = %record.key, "Record written");
        Ok(())
    }

    /// Empty `line` if it holds `expected_key`
    ///
    /// Fails with `KeyNotFound` otherwise.
    pub fn erase_at(&self, line: u64, expected_key: &str) -> Result<()> {
        let _lock = self.lock()?;

        let holds_key = match self.read_raw_lines(line, 1)?.first() {
            Some(text) => matches!(probe_key(line, text), Slot::Key(key) if key == expected_key),
            None => false,
        };
        if !holds_key {
            return Err(LineKvError::key_not_found(expected_key));
        }

        self.rewrite_line(line, "")?;
        tracing::debug!(line, key = %expected_key, "Record erased");
        Ok(())
    }

    // =========================================================================
    // Probing operations
    // =========================================================================

    /// Insert `record` into the first empty line of `home..home + window`
    ///
    /// The whole window is checked for the same key first, so a key never
    /// occupies two slots. Returns the line written.
    pub fn insert(&self, home: u64, window: u64, record: &Record) -> Result<u64> {
        let _lock = self.lock()?;

        let lines = self.read_raw_lines(home, window)?;
        let read = lines.len() as u64;

        let mut free = None;
        for (line, text) in (home..).zip(lines) {
            match probe_key(line, &text) {
                Slot::Empty => {
                    free.get_or_insert(line);
                }
                Slot::Key(key) if key == record.key => {
                    return Err(LineKvError::DuplicateKey { key, line });
                }
                Slot::Key(_) | Slot::Unreadable => {}
            }
        }
        // Lines past the end of the file are empty slots too.
        if free.is_none() && read < window {
            free = Some(home + read);
        }

        let Some(line) = free else {
            return Err(LineKvError::SlotsExhausted {
                key: record.key.clone(),
                home,
                window,
            });
        };

        self.rewrite_line(line, &record::encode(record)?)?;
        tracing::debug!(line, home, key = %record.key, "Record inserted");
        Ok(line)
    }

    /// Find the record for `key` within `home..home + window`
    ///
    /// Scans the whole window without stopping at empty lines, so erased
    /// slots need no tombstones. Takes no lock.
    pub fn lookup(&self, home: u64, window: u64, key: &str) -> Result<Option<(u64, Record)>> {
        for (line, text) in (home..).zip(self.read_raw_lines(home, window)?) {
            if let Slot::Key(found) = probe_key(line, &text) {
                if found == key {
                    if let Some(record) = decode_at(line, &text)? {
                        return Ok(Some((line, record)));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Erase the record for `key` within `home..home + window`
    ///
    /// Returns the line erased, or `KeyNotFound`.
    pub fn remove(&self, home: u64, window: u64, key: &str) -> Result<u64> {
        let _lock = self.lock()?;

        let target = (home..)
            .zip(self.read_raw_lines(home, window)?)
            .find_map(|(line, text)| match probe_key(line, &text) {
                Slot::Key(found) if found == key => Some(line),
                _ => None,
            });

        let Some(line) = target else {
            return Err(LineKvError::key_not_found(key));
        };

        self.rewrite_line(line, "")?;
        tracing::debug!(line, home, key = %key, "Record removed");
        Ok(line)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of lines currently in the backing file
    pub fn line_count(&self) -> Result<u64> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut count = 0;
        while reader.read_until(b'\n', &mut buf)? > 0 {
            count += 1;
            buf.clear();
        }
        Ok(count)
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock sidecar path
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn lock(&self) -> Result<FileLock> {
        FileLock::try_acquire(&self.lock_path)
    }

    /// Raw text of lines `start..start + len` that exist in the file, without
    /// line terminators. Shorter than `len` if the file ends first.
    fn read_raw_lines(&self, start: u64, len: u64) -> Result<Vec<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let end = start.saturating_add(len);
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut lines = Vec::new();
        let mut current: u64 = 1;

        while current < end {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            if current >= start {
                let text = String::from_utf8_lossy(&buf);
                lines.push(text.trim_end_matches(['\n', '\r']).to_string());
            }
            current += 1;
        }

        Ok(lines)
    }

    /// Stage a copy of the file with `line` replaced by `replacement`, then
    /// swap it in. Must be called with the lock held.
    fn rewrite_line(&self, line: u64, replacement: &str) -> Result<()> {
        let staged = self.stage(line, replacement);
        if let Err(e) = staged {
            let _ = fs::remove_file(&self.tmp_path);
            return Err(e);
        }

        fs::rename(&self.tmp_path, &self.path)?;
        Ok(())
    }

    fn stage(&self, line: u64, replacement: &str) -> Result<()> {
        let source = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let tmp = File::create(&self.tmp_path)?;
        let mut writer = BufWriter::new(tmp);
        let mut current: u64 = 1;

        if let Some(mut reader) = source {
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf)? == 0 {
                    break;
                }
                if current == line {
                    writer.write_all(replacement.as_bytes())?;
                    writer.write_all(b"\n")?;
                } else {
                    writer.write_all(&buf)?;
                    if !buf.ends_with(b"\n") {
                        writer.write_all(b"\n")?;
                    }
                }
                current += 1;
            }
        }

        // Materialize missing slots up to the target line.
        while current < line {
            writer.write_all(b"\n")?;
            current += 1;
        }
        if current == line {
            writer.write_all(replacement.as_bytes())?;
            writer.write_all(b"\n")?;
        }

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        if self.sync_writes {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// What a probed line holds
enum Slot {
    Empty,
    Key(String),
    Unreadable,
}

/// Classify a line during probing. Corrupt lines are skipped rather than
/// failing the whole window.
fn probe_key(line: u64, text: &str) -> Slot {
    match record::decode_key(text) {
        Ok(None) => Slot::Empty,
        Ok(Some(key)) => Slot::Key(key),
        Err(e) => {
            tracing::warn!(line, error = %e, "Skipping unreadable line");
            Slot::Unreadable
        }
    }
}

fn decode_at(line: u64, text: &str) -> Result<Option<Record>> {
    record::decode(text).map_err(|e| LineKvError::corrupt(line, e.to_string()))
}

/// `{path}.{ext}` next to the data file
fn sidecar(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
