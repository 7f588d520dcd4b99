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

//! Message-level operations and the backend capability trait.
//!
//! Every operation here opens the folder's UID store, works, and closes it
//! again; no store handle outlives a single call. All flag state lives in
//! file names, so flag changes are renames.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::model::{FolderRole, MsgFlags, Record, Subdir, Uid};
use crate::store::{self, StoreEnv};
use crate::support::error::Error;

use super::tree::FolderId;
use super::{filename, resolve, Maildir};

/// Host-supplied capability for digesting a message file into whatever
/// summary representation the host uses.
///
/// The backend knows where messages live and what their flags are, but has
/// no opinion on mail header syntax.
pub trait SummaryParser {
    type Summary;

    /// Parse the message file at `path`. `None` means the file was
    /// unparseable and the message should be presented without a summary.
    fn parse_summary(
        &self,
        path: &Path,
        flags: MsgFlags,
        role: FolderRole,
    ) -> Option<Self::Summary>;
}

/// The full mailbox backend surface.
///
/// Implemented by [`Maildir`]; exists so hosts can hold a mailbox behind
/// `dyn FolderBackend` or substitute a test double.
pub trait FolderBackend {
    fn scan_required(&self, folder: FolderId) -> bool;
    fn list_messages(
        &self,
        env: &StoreEnv,
        folder: FolderId,
    ) -> Result<Vec<Uid>, Error>;
    fn fetch_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
    ) -> Result<Option<PathBuf>, Error>;
    fn add_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        src: &Path,
        flags: Option<MsgFlags>,
    ) -> Result<Uid, Error>;
    fn remove_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
    ) -> Result<(), Error>;
    fn change_flags(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
        flags: MsgFlags,
    ) -> Result<bool, Error>;
    fn flags_of(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        msgs: &[(Uid, MsgFlags)],
    ) -> Result<Vec<(Uid, MsgFlags)>, Error>;
    fn scan_tree(&mut self) -> Result<(), Error>;
    fn create_tree(&self) -> Result<(), Error>;
    fn create_folder(
        &mut self,
        parent: FolderId,
        name: &str,
    ) -> Result<FolderId, Error>;
    fn rename_folder(&mut self, folder: FolderId, name: &str)
        -> Result<(), Error>;
    fn remove_folder(&mut self, folder: FolderId) -> Result<(), Error>;
}

impl Maildir {
    /// The path of the file currently embodying `uid`, or `None` if the
    /// message no longer exists.
    pub fn fetch_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
    ) -> Result<Option<PathBuf>, Error> {
        let dir = self.checked_folder_dir(folder)?;
        store::with_store(env, &dir, |store| {
            Ok(resolve::path_for_uid(&dir, store, uid))
        })
    }

    /// Deliver a copy of the file at `src` into `folder` and return the new
    /// message's UID.
    ///
    /// `None` flags mean a fresh unseen delivery into `new/`; explicit flags
    /// without `NEW` deliver straight into `cur/` with the matching info
    /// suffix. The file is staged under `tmp/` and renamed into place, per
    /// the maildir delivery protocol.
    pub fn add_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        src: &Path,
        flags: Option<MsgFlags>,
    ) -> Result<Uid, Error> {
        let dir = self.checked_folder_dir(folder)?;
        store::with_store(env, &dir, |store| {
            let flags = flags.unwrap_or_else(MsgFlags::default_new);
            let mut rec = Record {
                uid: store.next_uid(),
                uniq: env.tokens().next(),
                info: filename::flags_to_info(flags),
                subdir: Subdir::Tmp,
            };

            let tmp_path = dir.join(filename::filename_of(&rec));
            fs::copy(src, &tmp_path)?;

            rec.subdir = if flags.contains(MsgFlags::NEW) {
                Subdir::New
            } else {
                Subdir::Cur
            };
            let dest = dir.join(filename::filename_of(&rec));
            if let Err(e) = fs::rename(&tmp_path, &dest) {
                let _ = fs::remove_file(&tmp_path);
                return Err(e.into());
            }

            let uid = rec.uid;
            store.insert(rec);
            Ok(uid)
        })
    }

    /// Delete the message `uid` from `folder`.
    pub fn remove_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
    ) -> Result<(), Error> {
        let dir = self.checked_folder_dir(folder)?;
        store::with_store(env, &dir, |store| {
            let path = resolve::path_for_uid(&dir, store, uid)
                .ok_or(Error::NxMessage)?;
            fs::remove_file(path)?;
            store.delete(uid);
            Ok(())
        })
    }

    /// Set the flags of message `uid` to exactly `flags`.
    ///
    /// Returns false when the message is gone or the rename failed; the UID
    /// is preserved in every case.
    pub fn change_flags(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
        flags: MsgFlags,
    ) -> Result<bool, Error> {
        let dir = self.checked_folder_dir(folder)?;
        store::with_store(env, &dir, |store| {
            let rec = match resolve::record_for_uid(&dir, store, uid) {
                Some(rec) => rec,
                None => return Ok(false),
            };

            let new_rec = Record {
                uid: rec.uid,
                uniq: rec.uniq.clone(),
                info: filename::flags_to_info(flags),
                subdir: if flags.contains(MsgFlags::NEW) {
                    Subdir::New
                } else {
                    Subdir::Cur
                },
            };
            if rec.info == new_rec.info && rec.subdir == new_rec.subdir {
                return Ok(true);
            }

            let old_path = dir.join(filename::filename_of(&rec));
            let new_path = dir.join(filename::filename_of(&new_rec));
            if let Err(e) = fs::rename(&old_path, &new_path) {
                warn!(
                    "Unable to rename {} to {}: {}",
                    old_path.display(),
                    new_path.display(),
                    e
                );
                return Ok(false);
            }

            store.delete(uid);
            store.insert(new_rec);
            Ok(true)
        })
    }

    /// Bulk flag read, merging what the file name says with what the caller
    /// already believes.
    ///
    /// The file name is authoritative for the four info-controlled bits and
    /// for `NEW` once the message has been seen; other caller bits pass
    /// through. Messages with no record (or an undecodable info) are
    /// dropped from the result.
    pub fn flags_of(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        msgs: &[(Uid, MsgFlags)],
    ) -> Result<Vec<(Uid, MsgFlags)>, Error> {
        let dir = self.checked_folder_dir(folder)?;
        store::with_store(env, &dir, |store| {
            let mut out = Vec::with_capacity(msgs.len());
            for &(uid, caller) in msgs {
                let rec = match store.get_by_uid(uid) {
                    Some(rec) => rec,
                    None => {
                        debug!("{:?} has no record; skipping", uid);
                        continue;
                    },
                };
                let stored = match filename::info_to_flags(&rec.info) {
                    Ok(stored) => stored,
                    Err(_) => {
                        debug!("{:?} has bad info; skipping", uid);
                        continue;
                    },
                };

                let mut mask = MsgFlags::FLAGGED
                    | MsgFlags::FORWARDED
                    | MsgFlags::REPLIED
                    | MsgFlags::UNREAD;
                if !stored.contains(MsgFlags::UNREAD) {
                    // Seen on disk beats NEW in the caller's cache
                    mask |= MsgFlags::NEW;
                }
                out.push((uid, stored | (caller - mask)));
            }
            Ok(out)
        })
    }

    /// Fetch message `uid` and digest it through `parser`.
    ///
    /// `Ok(None)` means the message is gone; a parser refusal also yields
    /// `Ok(None)`.
    pub fn message_summary<P: SummaryParser>(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
        parser: &P,
    ) -> Result<Option<P::Summary>, Error> {
        let role = self.tree().get(folder).ok_or(Error::NxFolder)?.role;
        let path = match self.fetch_message(env, folder, uid)? {
            Some(path) => path,
            None => return Ok(None),
        };
        Ok(parser.parse_summary(&path, MsgFlags::default_new(), role))
    }

    fn checked_folder_dir(&self, folder: FolderId) -> Result<PathBuf, Error> {
        self.folder_dir(folder).ok_or(Error::NxFolder)
    }
}

impl FolderBackend for Maildir {
    fn scan_required(&self, folder: FolderId) -> bool {
        Maildir::scan_required(self, folder)
    }

    fn list_messages(
        &self,
        env: &StoreEnv,
        folder: FolderId,
    ) -> Result<Vec<Uid>, Error> {
        Maildir::list_messages(self, env, folder)
    }

    fn fetch_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
    ) -> Result<Option<PathBuf>, Error> {
        Maildir::fetch_message(self, env, folder, uid)
    }

    fn add_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        src: &Path,
        flags: Option<MsgFlags>,
    ) -> Result<Uid, Error> {
        Maildir::add_message(self, env, folder, src, flags)
    }

    fn remove_message(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
    ) -> Result<(), Error> {
        Maildir::remove_message(self, env, folder, uid)
    }

    fn change_flags(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        uid: Uid,
        flags: MsgFlags,
    ) -> Result<bool, Error> {
        Maildir::change_flags(self, env, folder, uid, flags)
    }

    fn flags_of(
        &self,
        env: &StoreEnv,
        folder: FolderId,
        msgs: &[(Uid, MsgFlags)],
    ) -> Result<Vec<(Uid, MsgFlags)>, Error> {
        Maildir::flags_of(self, env, folder, msgs)
    }

    fn scan_tree(&mut self) -> Result<(), Error> {
        Maildir::scan_tree(self)
    }

    fn create_tree(&self) -> Result<(), Error> {
        Maildir::create_tree(self)
    }

    fn create_folder(
        &mut self,
        parent: FolderId,
        name: &str,
    ) -> Result<FolderId, Error> {
        Maildir::create_folder(self, parent, name)
    }

    fn rename_folder(
        &mut self,
        folder: FolderId,
        name: &str,
    ) -> Result<(), Error> {
        Maildir::rename_folder(self, folder, name)
    }

    fn remove_folder(&mut self, folder: FolderId) -> Result<(), Error> {
        Maildir::remove_folder(self, folder)
    }
}
