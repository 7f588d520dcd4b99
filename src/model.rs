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

//! Core data model shared by the UID store and the folder machinery.

use std::fmt;
use std::num::NonZeroU32;

use bitflags::bitflags;

/// Uniquely identifies a message within a single folder.
///
/// UIDs start at 1 and increase monotonically as messages are added to the
/// folder. UIDs are never reused, even when lower-numbered messages have been
/// deleted, so a UID remains a stable handle for as long as its message
/// exists.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Uid({})", self.0.get())
    }
}

impl Uid {
    pub fn of(uid: u32) -> Option<Self> {
        NonZeroU32::new(uid).map(Uid)
    }

    pub fn raw(self) -> u32 {
        self.0.get()
    }

    #[cfg(test)]
    pub fn u(uid: u32) -> Self {
        Uid::of(uid).unwrap()
    }
}

bitflags! {
    /// Permanent message flags, as far as they are observable through a
    /// maildir filename.
    ///
    /// `NEW` is not encoded in the info suffix; it corresponds to the message
    /// living under `new/` with no info suffix at all. The other four flags
    /// map to the `F`/`P`/`R`/`S` letters of the Maildir info string (`S`
    /// meaning the *absence* of `UNREAD`).
    pub struct MsgFlags: u32 {
        const NEW       = 1 << 0;
        const UNREAD    = 1 << 1;
        const FLAGGED   = 1 << 2;
        const FORWARDED = 1 << 3;
        const REPLIED   = 1 << 4;
    }
}

impl MsgFlags {
    /// The flags a freshly delivered, never-seen message carries.
    pub fn default_new() -> Self {
        MsgFlags::NEW | MsgFlags::UNREAD
    }
}

/// The three standard subdirectories of a maildir folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subdir {
    New,
    Cur,
    Tmp,
}

impl Subdir {
    pub fn as_str(self) -> &'static str {
        match self {
            Subdir::New => "new",
            Subdir::Cur => "cur",
            Subdir::Tmp => "tmp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "new" => Some(Subdir::New),
            "cur" => Some(Subdir::Cur),
            "tmp" => Some(Subdir::Tmp),
            _ => None,
        }
    }
}

/// One persisted UID record, describing the single live file that currently
/// embodies the message.
///
/// The backing file is `<folder>/<subdir>/<uniq>` if `info` is empty, and
/// `<folder>/<subdir>/<uniq>:<info>` otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub uid: Uid,
    /// The collision-resistant unique token minted when the file was first
    /// created. Stable across flag changes; forms the secondary store key.
    pub uniq: String,
    /// The flags-info suffix (empty, or `2,` plus flag letters).
    pub info: String,
    pub subdir: Subdir,
}

/// The special role a folder-tree node may carry.
///
/// At most one node per tree holds each role other than `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FolderRole {
    None,
    Inbox,
    Outbox,
    Draft,
    Queue,
    Trash,
}
