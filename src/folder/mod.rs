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

//! Maildir++ folder hierarchy management.
//!
//! A mailbox is one root directory in Maildir++ layout: the root is itself a
//! maildir (the inbox), and every descendant folder is a dot-prefixed
//! directory placed *directly under the root*, with hierarchy expressed by
//! further dots in the name. `.Work` and `.Work.Urgent` are sibling
//! directories on disk but parent and child in the logical tree.

use std::fs;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use log::warn;

use crate::model::FolderRole;
use crate::support::error::Error;
use crate::support::file_ops::IgnoreKinds;
use crate::support::safe_name::is_safe_name;

pub mod filename;
pub mod ops;
pub mod rename;
pub mod resolve;
pub mod scan;
pub mod token;
pub mod tree;

use self::tree::{FolderId, FolderTree};

pub const DIR_NEW: &str = "new";
pub const DIR_CUR: &str = "cur";
pub const DIR_TMP: &str = "tmp";
/// Zero-byte marker distinguishing a Maildir++ subfolder from an unrelated
/// directory that happens to contain a `cur/`.
pub const MAILDIRFOLDER_MARKER: &str = "maildirfolder";

/// Sentinel directory name for the inbox node. The inbox is physically the
/// mailbox root; this name never appears on disk.
pub const INBOX_PATH: &str = ".inbox";

pub const OUTBOX_DIR: &str = "sent";
pub const DRAFT_DIR: &str = "draft";
pub const QUEUE_DIR: &str = "queue";
pub const TRASH_DIR: &str = "trash";

const DIR_PERMISSION: u32 = 0o700;

/// One Maildir++ mailbox: a root directory plus the logical folder tree
/// discovered within it.
///
/// The tree starts out holding just the root and the inbox; `scan_tree` (or
/// explicit folder creation) populates it.
pub struct Maildir {
    name: String,
    root: PathBuf,
    tree: FolderTree,
}

impl Maildir {
    pub fn new(name: &str, root: impl Into<PathBuf>) -> Self {
        Maildir {
            name: name.to_owned(),
            root: root.into(),
            tree: FolderTree::new(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tree(&self) -> &FolderTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut FolderTree {
        &mut self.tree
    }

    /// The on-disk directory backing folder `id`, or `None` if the folder
    /// has been removed from the tree.
    ///
    /// Both the synthetic tree root and the inbox map to the mailbox root.
    pub fn folder_dir(&self, id: FolderId) -> Option<PathBuf> {
        match self.tree.get(id)?.path.as_deref() {
            None | Some(INBOX_PATH) => Some(self.root.clone()),
            Some(path) => Some(self.root.join(path)),
        }
    }

    /// Ensure the mailbox root and the reserved special folders exist,
    /// creating whatever is missing.
    ///
    /// Pre-existing directories are left untouched, so this is safe to call
    /// on every startup. Something other than a directory at the root is an
    /// error.
    pub fn create_tree(&self) -> Result<(), Error> {
        match fs::metadata(&self.root) {
            Ok(md) if !md.is_dir() => return Err(Error::RootNotADirectory),
            Ok(_) => (),
            Err(e) if io::ErrorKind::NotFound == e.kind() => {
                fs::DirBuilder::new()
                    .recursive(true)
                    .mode(DIR_PERMISSION)
                    .create(&self.root)?;
            },
            Err(e) => return Err(e.into()),
        }

        setup_folder_dirs(&self.root, false)?;
        for special in &[OUTBOX_DIR, DRAFT_DIR, QUEUE_DIR, TRASH_DIR] {
            setup_folder_dirs(&self.root.join(format!(".{}", special)), true)?;
        }
        Ok(())
    }

    /// Create a subfolder of `parent` named `name` and return its id.
    ///
    /// The inbox is an alias for the tree root here: the inbox is backed by
    /// the mailbox root, so its subfolders are exactly the top-level folders,
    /// and the new node attaches to the root so that a later rescan finds it
    /// where discovery would put it.
    pub fn create_folder(
        &mut self,
        parent: FolderId,
        name: &str,
    ) -> Result<FolderId, Error> {
        if !is_safe_name(name) {
            return Err(Error::UnsafeName);
        }
        let parent = if self.tree.inbox() == parent {
            self.tree.root()
        } else {
            parent
        };
        let parent_node = self.tree.get(parent).ok_or(Error::NxFolder)?;

        let dir_name = match parent_node.path.as_deref() {
            None => format!(".{}", name),
            Some(path) => format!("{}.{}", path, name),
        };

        if self.tree.find_child(parent, name).is_some() {
            return Err(Error::FolderExists);
        }

        setup_folder_dirs(&self.root.join(&dir_name), true)?;
        Ok(self
            .tree
            .add_child(parent, name, &dir_name, FolderRole::None))
    }
}

/// Create the `new`/`cur`/`tmp` structure (and, for subfolders, the
/// `maildirfolder` marker) within `path`.
///
/// Anything that already exists is accepted as-is. On failure, directories
/// created by this call are removed again on a best-effort basis.
fn setup_folder_dirs(path: &Path, subfolder: bool) -> Result<(), Error> {
    fs::DirBuilder::new()
        .mode(DIR_PERMISSION)
        .create(path)
        .ignore_already_exists()?;

    let result = (|| -> io::Result<()> {
        for dir in &[DIR_NEW, DIR_CUR, DIR_TMP] {
            fs::DirBuilder::new()
                .mode(DIR_PERMISSION)
                .create(path.join(dir))
                .ignore_already_exists()?;
        }
        if subfolder {
            fs::OpenOptions::new()
                .write(true)
                .create(true)
                .open(path.join(MAILDIRFOLDER_MARKER))?;
        }
        Ok(())
    })();

    if let Err(e) = result {
        for dir in &[DIR_NEW, DIR_CUR, DIR_TMP] {
            if let Err(e) = fs::remove_dir(path.join(dir)) {
                if io::ErrorKind::NotFound != e.kind() {
                    warn!(
                        "Unable to clean up {}: {}",
                        path.join(dir).display(),
                        e
                    );
                }
            }
        }
        let _ = fs::remove_dir(path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_tree_builds_expected_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("box");
        let md = Maildir::new("box", &root);
        md.create_tree().unwrap();

        for sub in &[DIR_NEW, DIR_CUR, DIR_TMP] {
            assert!(root.join(sub).is_dir(), "missing root {}", sub);
        }
        // The root is the inbox, not a subfolder
        assert!(!root.join(MAILDIRFOLDER_MARKER).exists());

        for special in &[".sent", ".draft", ".queue", ".trash"] {
            let p = root.join(special);
            assert!(p.is_dir(), "missing {}", special);
            assert!(p.join(DIR_CUR).is_dir());
            assert!(p.join(MAILDIRFOLDER_MARKER).is_file());
        }

        // Idempotent
        md.create_tree().unwrap();
    }

    #[test]
    fn create_tree_rejects_non_directory_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("box");
        std::fs::write(&root, b"not a dir").unwrap();
        let md = Maildir::new("box", &root);
        assert_matches!(Err(Error::RootNotADirectory), md.create_tree());
    }

    #[test]
    fn create_folder_nests_by_dots() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("box");
        let mut md = Maildir::new("box", &root);
        md.create_tree().unwrap();

        let inbox = md.tree().inbox();
        let work = md.create_folder(inbox, "Work").unwrap();
        let urgent = md.create_folder(work, "Urgent").unwrap();

        // Both are physically directly under the root
        assert!(root.join(".Work").join(DIR_CUR).is_dir());
        assert!(root.join(".Work.Urgent").join(DIR_CUR).is_dir());
        assert!(!root.join(".Work").join(".Work.Urgent").exists());

        assert_eq!(
            Some(".Work.Urgent"),
            md.tree().node(urgent).path.as_deref()
        );
        assert_eq!(Some(root.join(".Work.Urgent")), md.folder_dir(urgent));
        // The inbox folder dir is the root itself
        assert_eq!(Some(root.clone()), md.folder_dir(inbox));
    }

    #[test]
    fn create_folder_validates() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("box");
        let mut md = Maildir::new("box", &root);
        md.create_tree().unwrap();
        let inbox = md.tree().inbox();

        assert_matches!(
            Err(Error::UnsafeName),
            md.create_folder(inbox, "a.b")
        );
        assert_matches!(Err(Error::UnsafeName), md.create_folder(inbox, ""));

        md.create_folder(inbox, "Work").unwrap();
        assert_matches!(
            Err(Error::FolderExists),
            md.create_folder(inbox, "Work")
        );
    }
}
