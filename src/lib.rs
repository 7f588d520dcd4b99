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

//! Maildir++ mailbox backend with stable per-message UIDs.
//!
//! Maildir encodes message state in file names, which makes the names
//! themselves useless as long-term message identities. This crate pairs each
//! folder with a small persistent store that assigns every message a `Uid`
//! on first sight and keeps it pinned to the message's unique token across
//! flag renames, moves between `new/` and `cur/`, and deliveries by other
//! programs.
//!
//! The entry point is [`Maildir`], one instance per mailbox root, together
//! with a process-wide [`StoreEnv`]. Everything is synchronous, blocking
//! filesystem I/O; no locks are taken and no daemons are spawned. Other
//! maildir software may touch the mailbox concurrently: the worst outcome of
//! a race is a rescan, never a lost message.

#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat, $actual:expr) => {
        match $actual {
            $expected => (),
            unexpected => panic!(
                "Expected {} matches {}, got {:?}",
                stringify!($expected),
                stringify!($actual),
                unexpected
            ),
        }
    };
}

pub mod folder;
pub mod model;
pub mod store;
pub mod support;

pub use crate::folder::ops::{FolderBackend, SummaryParser};
pub use crate::folder::tree::{FolderId, FolderNode, FolderTree};
pub use crate::folder::Maildir;
pub use crate::model::{FolderRole, MsgFlags, Record, Subdir, Uid};
pub use crate::store::{StoreEnv, UidStore};
pub use crate::support::error::Error;
