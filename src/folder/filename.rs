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

//! The maildir file name grammar.
//!
//! A message file is named `<uniq>` or `<uniq>:<info>`, where `uniq` is the
//! unique token minted at delivery time and `info` records flags. The only
//! info form produced (and understood) here is `2,` followed by a subset of
//! the letters `F`, `P`, `R`, `S` in exactly that order.

use std::path::{Path, PathBuf};

use crate::model::{MsgFlags, Record, Subdir};
use crate::support::error::Error;

/// The path of the file embodying `rec`, relative to its folder directory.
pub fn filename_of(rec: &Record) -> PathBuf {
    let mut name = rec.uniq.clone();
    if !rec.info.is_empty() {
        name.push(':');
        name.push_str(&rec.info);
    }
    Path::new(rec.subdir.as_str()).join(name)
}

/// Split a message file base name into its `(uniq, info)` parts.
///
/// A name with no `:` separator has an empty info part.
pub fn split_basename(name: &str) -> (&str, &str) {
    match name.find(':') {
        Some(colon) => (&name[..colon], &name[colon + 1..]),
        None => (name, ""),
    }
}

/// Decompose a message file path into subdirectory, unique token, and info.
///
/// Only the last two components are considered; anything whose parent is not
/// one of the three standard subdirectories is `None`.
pub fn parse(path: &Path) -> Option<(Subdir, String, String)> {
    let name = path.file_name()?.to_str()?;
    let subdir = Subdir::from_name(path.parent()?.file_name()?.to_str()?)?;
    let (uniq, info) = split_basename(name);
    Some((subdir, uniq.to_owned(), info.to_owned()))
}

/// Render the info suffix encoding `flags`.
///
/// A `NEW` message has no info at all (it lives bare under `new/`).
pub fn flags_to_info(flags: MsgFlags) -> String {
    if flags.contains(MsgFlags::NEW) {
        return String::new();
    }

    let mut info = "2,".to_owned();
    if flags.contains(MsgFlags::FLAGGED) {
        info.push('F');
    }
    if flags.contains(MsgFlags::FORWARDED) {
        info.push('P');
    }
    if flags.contains(MsgFlags::REPLIED) {
        info.push('R');
    }
    if !flags.contains(MsgFlags::UNREAD) {
        info.push('S');
    }
    info
}

/// Decode an info suffix back into flags.
///
/// An empty info means a bare `new/` delivery, i.e. unread. Unknown flag
/// letters are ignored so that files written by other maildir software still
/// parse; only a missing `2,` prefix is an error.
pub fn info_to_flags(info: &str) -> Result<MsgFlags, Error> {
    if info.is_empty() {
        return Ok(MsgFlags::UNREAD);
    }

    if !info.starts_with("2,") {
        return Err(Error::RecordCorrupt);
    }

    let mut flags = MsgFlags::UNREAD;
    for c in info[2..].chars() {
        match c {
            'F' => flags |= MsgFlags::FLAGGED,
            'P' => flags |= MsgFlags::FORWARDED,
            'R' => flags |= MsgFlags::REPLIED,
            'S' => flags -= MsgFlags::UNREAD,
            _ => (),
        }
    }
    Ok(flags)
}
