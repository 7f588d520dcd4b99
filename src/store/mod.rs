//-
// Copyright (c) 2026, the maildirbox authors
//
// This file is part of maildirbox.
//
// Maildirbox is free software: you can  redistribute it and/or modify it under
// the terms of  the GNU General Public  License as published by  the Free
// Software Foundation, either version 3 of  the License, or (at your option)
// any later version.
//
// Maildirbox is distributed in the hope  that it will be useful, but WITHOUT
// ANY WARRANTY; without  even the implied warranty  of MERCHANTABILITY or
// FITNESS FOR  A PARTICULAR PURPOSE.  See the GNU  General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along with
// maildirbox. If not, see <http://www.gnu.org/licenses/>.

//! The persistent, dual-indexed UID record store.
//!
//! Each folder owns one store file (`maildirbox.uiddb`) holding one record
//! per message. The primary index is the 32-bit UID; a secondary index over
//! the unique token is derived from the record values and maintained
//! automatically by every insert and delete, so the two can never disagree.
//!
//! The store is tiny (one short record per message), so the whole file is
//! loaded on `open`, mutated in memory, and atomically rewritten on `close`
//! when anything changed. A handle is only ever held for the duration of a
//! single logical folder operation; `with_store` enforces that scoping and
//! guarantees the close runs on every exit path.
//!
//! The record *value* encoding is fixed and must not change:
//! `uid (4 bytes LE) || uniq NUL || info NUL || subdir NUL`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use log::{error, warn};

use crate::folder::token::TokenGenerator;
use crate::model::{Record, Subdir, Uid};
use crate::support::error::Error;
use crate::support::file_ops;

/// The fixed name of the per-folder store file.
pub const UID_DB_NAME: &str = "maildirbox.uiddb";

/// Magic prefix identifying a store file.
const MAGIC: &[u8] = b"MDBXUIDB";

/// The process-wide store environment.
///
/// Created once at startup and passed by shared reference into every
/// operation that touches a store; dropped once at shutdown. It owns the
/// process-lifetime unique token generator so that token sequence numbers
/// are shared by every mailbox in the process.
pub struct StoreEnv {
    tokens: TokenGenerator,
}

impl StoreEnv {
    pub fn new() -> Self {
        StoreEnv {
            tokens: TokenGenerator::new(),
        }
    }

    pub fn tokens(&self) -> &TokenGenerator {
        &self.tokens
    }
}

impl Default for StoreEnv {
    fn default() -> Self {
        StoreEnv::new()
    }
}

/// An open handle on one folder's UID record store.
#[derive(Debug)]
pub struct UidStore {
    path: PathBuf,
    by_uid: BTreeMap<u32, Record>,
    by_uniq: HashMap<String, u32>,
    last_uid: Option<u32>,
    dirty: bool,
}

impl UidStore {
    /// Open (creating if necessary) the store for the folder at `folder_dir`.
    ///
    /// A missing store file is created immediately so that the staleness
    /// check of the reconciler can compare against its modification time. An
    /// unrecognisable file is `StoreUnavailable`; individual undecodable
    /// records are logged and skipped.
    pub fn open(folder_dir: &Path) -> Result<Self, Error> {
        let path = folder_dir.join(UID_DB_NAME);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if io::ErrorKind::NotFound == e.kind() => {
                file_ops::spit(folder_dir, &path, false, 0o600, MAGIC)
                    .map_err(|e| {
                        error!(
                            "Cannot create uid store {}: {}",
                            path.display(),
                            e
                        );
                        Error::StoreUnavailable
                    })?;
                MAGIC.to_vec()
            },
            Err(e) => return Err(e.into()),
        };

        if data.len() < MAGIC.len() || MAGIC != &data[..MAGIC.len()] {
            error!("{} is not a uid store", path.display());
            return Err(Error::StoreUnavailable);
        }

        let mut by_uid = BTreeMap::new();
        let mut by_uniq = HashMap::new();
        let mut rest = &data[MAGIC.len()..];
        while !rest.is_empty() {
            if rest.len() < 4 {
                warn!("Truncated entry in {}; ignoring tail", path.display());
                break;
            }

            let len = LittleEndian::read_u32(&rest[..4]) as usize;
            rest = &rest[4..];
            if rest.len() < len {
                warn!("Truncated entry in {}; ignoring tail", path.display());
                break;
            }

            let (value, tail) = rest.split_at(len);
            rest = tail;
            match decode_record(value) {
                Ok(record) => {
                    by_uniq.insert(record.uniq.clone(), record.uid.raw());
                    by_uid.insert(record.uid.raw(), record);
                },
                Err(_) => {
                    warn!("Skipping corrupt record in {}", path.display())
                },
            }
        }

        Ok(UidStore {
            path,
            by_uid,
            by_uniq,
            last_uid: None,
            dirty: false,
        })
    }

    /// Close the store, atomically rewriting the backing file if anything
    /// changed during this open session.
    pub fn close(self) -> Result<(), Error> {
        if !self.dirty {
            return Ok(());
        }

        let dir = self.path.parent().ok_or(Error::StoreUnavailable)?;
        file_ops::spit(dir, &self.path, true, 0o600, &self.serialize()?)?;
        Ok(())
    }

    /// Return a fresh, never-before-returned UID.
    ///
    /// The first call of an open session derives the watermark from the
    /// maximum existing primary key (the primary table is the single source
    /// of truth; the watermark is never persisted separately). Subsequent
    /// calls just increment it.
    ///
    /// The watermark saturates at `u32::MAX` rather than wrapping; a folder
    /// that has consumed the entire UID space keeps answering `u32::MAX`
    /// instead of resurrecting old UIDs.
    pub fn next_uid(&mut self) -> Uid {
        let last = match self.last_uid {
            Some(last) => last,
            None => self.by_uid.keys().next_back().copied().unwrap_or(0),
        };
        let next = last.saturating_add(1).max(1);
        self.last_uid = Some(next);
        Uid(NonZeroU32::new(next).unwrap())
    }

    pub fn get_by_uid(&self, uid: Uid) -> Option<&Record> {
        self.by_uid.get(&uid.raw())
    }

    /// Exact-match lookup through the secondary (unique token) index.
    pub fn get_by_uniq(&self, uniq: &str) -> Option<&Record> {
        self.by_uniq.get(uniq).and_then(|uid| self.by_uid.get(uid))
    }

    /// Upsert keyed by `record.uid`; the secondary index follows
    /// automatically.
    pub fn insert(&mut self, record: Record) {
        if let Some(old) = self.by_uid.remove(&record.uid.raw()) {
            self.by_uniq.remove(&old.uniq);
        }
        self.by_uniq.insert(record.uniq.clone(), record.uid.raw());
        self.by_uid.insert(record.uid.raw(), record);
        self.dirty = true;
    }

    pub fn delete(&mut self, uid: Uid) {
        if let Some(old) = self.by_uid.remove(&uid.raw()) {
            if Some(&uid.raw()) == self.by_uniq.get(&old.uniq) {
                self.by_uniq.remove(&old.uniq);
            }
            self.dirty = true;
        }
    }

    /// Delete every record whose UID is absent from `keep`.
    ///
    /// Used after a listing pass to drop records whose backing file has
    /// vanished.
    pub fn prune_except(&mut self, keep: &[Uid]) {
        let mut keep: Vec<u32> = keep.iter().map(|uid| uid.raw()).collect();
        keep.sort_unstable();

        let dead: Vec<u32> = self
            .by_uid
            .keys()
            .copied()
            .filter(|uid| keep.binary_search(uid).is_err())
            .collect();
        for uid in dead {
            if let Some(old) = self.by_uid.remove(&uid) {
                if Some(&uid) == self.by_uniq.get(&old.uniq) {
                    self.by_uniq.remove(&old.uniq);
                }
                self.dirty = true;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }

    fn serialize(&self) -> Result<Vec<u8>, Error> {
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC);
        for record in self.by_uid.values() {
            let value = encode_record(record)?;
            data.write_u32::<LittleEndian>(value.len() as u32)?;
            data.extend_from_slice(&value);
        }
        Ok(data)
    }
}

/// Open the store for `folder_dir`, run `f` on it, and close it again.
///
/// The close runs on every exit path, so a failing `f` cannot leak a dirty
/// handle; if `f` succeeded but the close fails, the close error is
/// reported.
pub fn with_store<T>(
    _env: &StoreEnv,
    folder_dir: &Path,
    f: impl FnOnce(&mut UidStore) -> Result<T, Error>,
) -> Result<T, Error> {
    let mut store = UidStore::open(folder_dir)?;
    let result = f(&mut store);
    let closed = store.close();
    let value = result?;
    closed?;
    Ok(value)
}

fn encode_record(record: &Record) -> Result<Vec<u8>, Error> {
    let mut value = Vec::with_capacity(
        4 + record.uniq.len() + record.info.len() + 8,
    );
    value.write_u32::<LittleEndian>(record.uid.raw())?;
    value.extend_from_slice(record.uniq.as_bytes());
    value.push(0);
    value.extend_from_slice(record.info.as_bytes());
    value.push(0);
    value.extend_from_slice(record.subdir.as_str().as_bytes());
    value.push(0);
    Ok(value)
}

fn decode_record(value: &[u8]) -> Result<Record, Error> {
    if value.len() < 7 {
        return Err(Error::RecordCorrupt);
    }

    let uid = Uid::of(LittleEndian::read_u32(&value[..4]))
        .ok_or(Error::RecordCorrupt)?;
    let mut rest = &value[4..];
    let uniq = take_cstr(&mut rest)?.to_owned();
    let info = take_cstr(&mut rest)?.to_owned();
    let subdir =
        Subdir::from_name(take_cstr(&mut rest)?).ok_or(Error::RecordCorrupt)?;

    Ok(Record {
        uid,
        uniq,
        info,
        subdir,
    })
}

fn take_cstr<'a>(data: &mut &'a [u8]) -> Result<&'a str, Error> {
    let nul = memchr::memchr(0, data).ok_or(Error::RecordCorrupt)?;
    let s = str::from_utf8(&data[..nul]).map_err(|_| Error::RecordCorrupt)?;
    *data = &data[nul + 1..];
    Ok(s)
}
