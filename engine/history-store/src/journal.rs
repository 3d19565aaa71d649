//! Per-account snapshot journals
//!
//! Every account owns one append-only JSON-lines file. A record is committed
//! once its terminating newline is on disk. A trailing fragment without a
//! newline is kept when it parses as a record (the file was written by
//! something that omits the final newline) and otherwise is a torn write,
//! discarded on load. Appends that fail are truncated back to the last
//! committed length.

use crate::error::{Result, StoreError};
use crate::snapshot::{Snapshot, SnapshotRecord};
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// File extension of live journals
pub const JOURNAL_EXTENSION: &str = "jsonl";

/// Encode an account name as a file stem (lowercase hex of its UTF-8 bytes)
pub fn encode_account(account: &str) -> String {
    account.bytes().map(|b| format!("{b:02x}")).collect()
}

/// Decode a file stem produced by [`encode_account`]
pub fn decode_account(stem: &str) -> Option<String> {
    let well_formed = !stem.is_empty()
        && stem.len() % 2 == 0
        && stem.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return None;
    }

    let bytes = (0..stem.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&stem[i..i + 2], 16).ok())
        .collect::<Option<Vec<u8>>>()?;

    String::from_utf8(bytes).ok()
}

/// Journal file path for an account
pub fn journal_path(accounts_dir: &Path, account: &str) -> PathBuf {
    accounts_dir.join(format!("{}.{JOURNAL_EXTENSION}", encode_account(account)))
}

/// File operations an append needs beyond `Write + Seek`
pub(crate) trait JournalFile: Write + Seek {
    /// Cut the file to `len` bytes
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Force written data to stable storage
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalFile for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// In-memory view of one account's journal
#[derive(Debug)]
pub struct AccountJournal {
    account: String,
    path: PathBuf,

    /// Series ordered by timestamp, ties in insertion order
    series: Vec<Snapshot>,

    /// Byte length of the committed prefix of the file
    committed_len: u64,

    /// The committed prefix ends in a valid record with no newline
    unterminated: bool,

    /// Why the on-disk journal could not be read, if it could not
    corrupt: Option<String>,
}

impl AccountJournal {
    /// Journal for an account with no file yet
    pub fn empty(account: &str, accounts_dir: &Path) -> Self {
        Self {
            account: account.to_string(),
            path: journal_path(accounts_dir, account),
            series: Vec::new(),
            committed_len: 0,
            unterminated: false,
            corrupt: None,
        }
    }

    /// Load a journal from disk
    ///
    /// Never fails: a journal that cannot be read or parsed comes back empty
    /// and flagged corrupt, so one damaged account does not take the others
    /// down with it.
    pub fn load(account: &str, path: PathBuf) -> Self {
        let mut journal = Self {
            account: account.to_string(),
            path,
            series: Vec::new(),
            committed_len: 0,
            unterminated: false,
            corrupt: None,
        };

        let bytes = match std::fs::read(&journal.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return journal,
            Err(e) => {
                journal.mark_corrupt(format!("unreadable journal: {e}"));
                return journal;
            }
        };

        match parse_journal(&bytes) {
            Ok(mut parsed) => {
                if parsed.torn_bytes > 0 {
                    tracing::warn!(
                        "Dropping torn record at end of journal for {:?} ({} bytes)",
                        journal.account,
                        parsed.torn_bytes
                    );
                }
                parsed.series.sort_by_key(|s| s.timestamp);
                journal.series = parsed.series;
                journal.committed_len = parsed.committed_len;
                journal.unterminated = parsed.unterminated;
            }
            Err(e) => journal.mark_corrupt(e.to_string()),
        }

        journal
    }

    /// Account this journal belongs to
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Path of the journal file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored series
    pub fn series(&self) -> &[Snapshot] {
        &self.series
    }

    /// Most recent snapshot
    pub fn last(&self) -> Option<&Snapshot> {
        self.series.last()
    }

    /// Whether the on-disk journal was found damaged
    pub fn is_corrupt(&self) -> bool {
        self.corrupt.is_some()
    }

    /// Append a snapshot and make it durable
    pub fn append(&mut self, snapshot: Snapshot, fsync: bool) -> Result<()> {
        if self.corrupt.is_some() {
            self.quarantine()?;
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).write(true).open(&self.path)?;
        self.append_to(&mut file, snapshot, fsync)
    }

    /// Write one record after the committed prefix of `file`
    ///
    /// The in-memory series only changes once the record is fully written.
    pub(crate) fn append_to<F: JournalFile>(
        &mut self,
        file: &mut F,
        snapshot: Snapshot,
        fsync: bool,
    ) -> Result<()> {
        let mut line = Vec::new();
        if self.unterminated {
            line.push(b'\n');
        }
        serde_json::to_writer(&mut line, &SnapshotRecord::from(&snapshot))?;
        line.push(b'\n');

        // Discard any torn tail before writing after the committed prefix
        file.truncate(self.committed_len)?;
        file.seek(SeekFrom::Start(self.committed_len))?;

        let written = file.write_all(&line).and_then(|()| {
            file.flush()?;
            if fsync {
                file.sync()?;
            }
            Ok(())
        });

        if let Err(e) = written {
            if let Err(rollback) = file.truncate(self.committed_len) {
                tracing::error!(
                    "Failed to roll back journal {:?} after write error: {}",
                    self.path,
                    rollback
                );
            }
            return Err(StoreError::Io(e));
        }

        self.committed_len += line.len() as u64;
        self.unterminated = false;

        let at = self.series.partition_point(|s| s.timestamp <= snapshot.timestamp);
        self.series.insert(at, snapshot);

        Ok(())
    }

    /// Delete the journal file and forget the series
    pub fn remove(&mut self) -> Result<()> {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }

        self.series.clear();
        self.committed_len = 0;
        self.unterminated = false;
        self.corrupt = None;

        Ok(())
    }

    /// Move a damaged journal aside so a fresh one can be started
    fn quarantine(&mut self) -> Result<()> {
        let target = self
            .path
            .with_extension(format!("{JOURNAL_EXTENSION}.corrupt-{}", Utc::now().timestamp()));

        match std::fs::rename(&self.path, &target) {
            Ok(()) => tracing::warn!(
                "Quarantined corrupt journal for {:?} as {:?}",
                self.account,
                target
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.series.clear();
        self.committed_len = 0;
        self.unterminated = false;
        self.corrupt = None;

        Ok(())
    }

    fn mark_corrupt(&mut self, reason: String) {
        tracing::error!(
            "Journal for {:?} at {:?} is corrupt, treating history as empty: {}",
            self.account,
            self.path,
            reason
        );
        self.series.clear();
        self.committed_len = 0;
        self.unterminated = false;
        self.corrupt = Some(reason);
    }
}

/// Result of parsing a journal file
#[derive(Debug)]
struct ParsedJournal {
    series: Vec<Snapshot>,
    committed_len: u64,
    unterminated: bool,

    /// Length of a discarded trailing fragment that did not parse
    torn_bytes: u64,
}

fn parse_record(line: &[u8], line_no: usize) -> Result<Snapshot> {
    let record: SnapshotRecord = serde_json::from_slice(line)
        .map_err(|e| StoreError::corruption(format!("line {line_no}: {e}")))?;
    Snapshot::try_from(record).map_err(|e| StoreError::corruption(format!("line {line_no}: {e}")))
}

/// Parse journal bytes into snapshots plus the committed byte length
fn parse_journal(bytes: &[u8]) -> Result<ParsedJournal> {
    let mut series = Vec::new();
    let mut offset = 0usize;
    let mut line_no = 0usize;

    while let Some(newline) = bytes[offset..].iter().position(|&b| b == b'\n') {
        line_no += 1;
        let line = &bytes[offset..offset + newline];
        offset += newline + 1;

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        series.push(parse_record(line, line_no)?);
    }

    let tail = &bytes[offset..];
    if tail.iter().all(u8::is_ascii_whitespace) {
        return Ok(ParsedJournal {
            series,
            committed_len: offset as u64,
            unterminated: false,
            torn_bytes: 0,
        });
    }

    match parse_record(tail, line_no + 1) {
        Ok(snapshot) => {
            series.push(snapshot);
            Ok(ParsedJournal {
                series,
                committed_len: bytes.len() as u64,
                unterminated: true,
                torn_bytes: 0,
            })
        }
        Err(_) => Ok(ParsedJournal {
            series,
            committed_len: offset as u64,
            unterminated: false,
            torn_bytes: tail.len() as u64,
        }),
    }
}
