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

//! Resolution between message file names and persistent UIDs.
//!
//! Maildir file names change whenever flags change, so they make poor message
//! identities. The UID store pins a stable UID to each unique token; this
//! module keeps the two in sync in both directions, including healing records
//! whose file was renamed behind our back.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::model::{Record, Subdir, Uid};
use crate::store::UidStore;

use super::filename;

/// Resolve the message file at `path` to its UID, minting one on first
/// sight.
///
/// The unique token is the key: a known token with a changed info suffix
/// keeps its UID, the record is merely rewritten. `None` means the name is
/// not a plausible message file path.
pub fn uid_for_filename(store: &mut UidStore, path: &Path) -> Option<Uid> {
    let name = path.file_name()?.to_str()?;
    let (uniq, info) = filename::split_basename(name);

    if let Some(rec) = store.get_by_uniq(uniq).cloned() {
        if rec.info != info {
            // Flags changed externally; the UID rides along. The recorded
            // subdirectory is refreshed lazily by the self-heal path, not
            // here.
            let uid = rec.uid;
            store.delete(uid);
            store.insert(Record {
                info: info.to_owned(),
                ..rec
            });
            return Some(uid);
        }
        return Some(rec.uid);
    }

    let (subdir, uniq, info) = filename::parse(path)?;
    let uid = store.next_uid();
    store.insert(Record {
        uid,
        uniq,
        info,
        subdir,
    });
    Some(uid)
}

/// Fetch the record for `uid`, verifying that its file still exists.
///
/// If the recorded path is gone the folder is re-searched: a bare token
/// under `new/`, then any `<uniq>:*` name under `cur/`. A hit rewrites the
/// record in place (same UID); a miss deletes it and yields `None`.
pub fn record_for_uid(
    folder_dir: &Path,
    store: &mut UidStore,
    uid: Uid,
) -> Option<Record> {
    let rec = store.get_by_uid(uid)?.clone();
    if folder_dir.join(filename::filename_of(&rec)).is_file() {
        return Some(rec);
    }

    debug!(
        "{}: {:?} not at recorded path; re-searching",
        folder_dir.display(),
        uid
    );
    store.delete(uid);

    let healed = search_for_uniq(folder_dir, &rec.uniq).map(
        |(subdir, info)| Record {
            uid,
            uniq: rec.uniq,
            info,
            subdir,
        },
    )?;
    store.insert(healed.clone());
    Some(healed)
}

/// The absolute path of the file currently embodying `uid`, if the message
/// still exists.
pub fn path_for_uid(
    folder_dir: &Path,
    store: &mut UidStore,
    uid: Uid,
) -> Option<PathBuf> {
    record_for_uid(folder_dir, store, uid)
        .map(|rec| folder_dir.join(filename::filename_of(&rec)))
}

fn search_for_uniq(
    folder_dir: &Path,
    uniq: &str,
) -> Option<(Subdir, String)> {
    if folder_dir.join(Subdir::New.as_str()).join(uniq).is_file() {
        return Some((Subdir::New, String::new()));
    }

    let prefix = format!("{}:", uniq);
    let mut candidates: Vec<String> = fs::read_dir(
        folder_dir.join(Subdir::Cur.as_str()),
    )
    .ok()?
    .filter_map(|entry| entry.ok()?.file_name().into_string().ok())
    .filter(|name| name.starts_with(&prefix))
    .collect();
    candidates.sort_unstable();

    let name = candidates.into_iter().next()?;
    let (_, info) = filename::split_basename(&name);
    Some((Subdir::Cur, info.to_owned()))
}
