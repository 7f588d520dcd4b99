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

//! Reconciliation of the on-disk state with the store and the folder tree.
//!
//! Other programs deliver into, rename within, and delete from the maildir
//! at any time; nothing here assumes exclusive ownership. `scan_required`
//! detects that a folder changed behind our back by comparing directory
//! mtimes against the store file, `list_messages` reconciles one folder's
//! store with its actual files, and `scan_tree` rediscovers the folder
//! hierarchy itself.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, warn};

use crate::model::{FolderRole, Uid};
use crate::store::{self, StoreEnv, UID_DB_NAME};
use crate::support::error::Error;

use super::resolve;
use super::tree::FolderId;
use super::{
    Maildir, DIR_CUR, DIR_NEW, DRAFT_DIR, OUTBOX_DIR, QUEUE_DIR, TRASH_DIR,
};

impl Maildir {
    /// Whether folder `id` has (or may have) changed since the store was
    /// last written.
    ///
    /// True when `new/` or `cur/` is newer than the store file, or when the
    /// store file does not exist yet. False positives are harmless (a scan
    /// of an unchanged folder is a no-op); a false negative would lose
    /// messages, so doubt always answers true. A folder that no longer
    /// exists in the tree has nothing to scan and answers false.
    pub fn scan_required(&self, id: FolderId) -> bool {
        let dir = match self.folder_dir(id) {
            Some(dir) => dir,
            None => return false,
        };
        let store_mtime = match mtime(&dir.join(UID_DB_NAME)) {
            Some(mtime) => mtime,
            None => return true,
        };

        for sub in &[DIR_NEW, DIR_CUR] {
            match mtime(&dir.join(sub)) {
                Some(mtime) if mtime > store_mtime => return true,
                _ => (),
            }
        }
        false
    }

    /// Reconcile folder `id` with its files and return the UIDs of all
    /// messages currently present, ascending.
    ///
    /// Every file under `cur/` and `new/` is resolved to a UID (minting for
    /// newcomers), then records for vanished files are pruned.
    pub fn list_messages(
        &self,
        env: &StoreEnv,
        id: FolderId,
    ) -> Result<Vec<Uid>, Error> {
        let dir = self.folder_dir(id).ok_or(Error::NxFolder)?;

        store::with_store(env, &dir, |store| {
            let mut uids = Vec::new();
            for sub in &[DIR_CUR, DIR_NEW] {
                for path in list_dir(&dir.join(sub)) {
                    if let Some(uid) =
                        resolve::uid_for_filename(store, &path)
                    {
                        uids.push(uid);
                    }
                }
            }
            uids.sort_unstable();
            store.prune_except(&uids);
            Ok(uids)
        })
    }

    /// Rediscover the folder hierarchy from the directories on disk.
    ///
    /// Existing `FolderId`s of folders that still exist remain valid; nodes
    /// whose directory vanished are pruned (children first). Special-role
    /// assignments are recomputed from scratch.
    pub fn scan_tree(&mut self) -> Result<(), Error> {
        debug!("{}: scanning folder tree", self.root().display());
        self.tree_mut().clear_specials();
        self.create_tree()?;

        // Maildir++ is flat on disk: one enumeration of the root serves
        // every level of the recursion.
        let mut entries: Vec<String> = fs::read_dir(self.root())?
            .filter_map(|entry| entry.ok()?.file_name().into_string().ok())
            .filter(|name| name.starts_with('.'))
            .collect();
        entries.sort_unstable();

        let root = self.tree().root();
        self.discover(root, &entries);
        self.prune_missing();
        Ok(())
    }

    /// Find or create tree nodes for the immediate subfolders of `parent`,
    /// then recurse into each.
    fn discover(&mut self, parent: FolderId, entries: &[String]) {
        let prefix = self
            .tree()
            .node(parent)
            .path
            .clone()
            .unwrap_or_default();

        for entry in entries {
            if !entry.starts_with(&prefix) {
                continue;
            }
            let rest = &entry[prefix.len()..];
            if !rest.starts_with('.') {
                continue;
            }
            let leaf = &rest[1..];
            if leaf.is_empty() || leaf.contains('.') {
                // Not an immediate child at this level
                continue;
            }

            let dir = self.root().join(entry);
            if !dir.is_dir() || !dir.join(DIR_CUR).is_dir() {
                continue;
            }

            let id = match self.tree().find_child(parent, leaf) {
                Some(id) => id,
                None => self.tree_mut().add_child(
                    parent,
                    leaf,
                    entry,
                    FolderRole::None,
                ),
            };
            // Roles were cleared at the start of the scan, so they must be
            // reassigned whether the node is new or was already in the tree.
            // First match wins; later same-named dirs are ordinary folders.
            if prefix.is_empty() {
                let role = reserved_role(leaf);
                if FolderRole::None != role
                    && self.tree().special(role).is_none()
                {
                    self.tree_mut().set_special(role, id);
                }
            }
            self.discover(id, entries);
        }
    }

    /// Drop tree nodes whose backing directory no longer exists.
    fn prune_missing(&mut self) {
        let root = self.tree().root();
        for id in self.tree().post_order(root) {
            let node = match self.tree().get(id) {
                Some(node) => node,
                // Already went down with an ancestor
                None => continue,
            };
            if root == id || FolderRole::Inbox == node.role {
                continue;
            }

            let dir = match self.folder_dir(id) {
                Some(dir) => dir,
                None => continue,
            };
            if !dir.is_dir() {
                debug!(
                    "{}: folder directory vanished; forgetting subtree",
                    dir.display()
                );
                self.tree_mut().remove_subtree(id);
            }
        }
    }
}

/// Role reserved for a top-level folder of this directory leaf name.
fn reserved_role(leaf: &str) -> FolderRole {
    match leaf {
        OUTBOX_DIR => FolderRole::Outbox,
        DRAFT_DIR => FolderRole::Draft,
        QUEUE_DIR => FolderRole::Queue,
        TRASH_DIR => FolderRole::Trash,
        _ => FolderRole::None,
    }
}

/// The non-hidden entries of `dir`, as full paths, in directory order.
///
/// An unreadable directory is treated as empty (and logged); a folder with a
/// missing subdirectory simply lists no messages there.
fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let iter = match fs::read_dir(dir) {
        Ok(iter) => iter,
        Err(e) => {
            warn!("Unable to read {}: {}", dir.display(), e);
            return Vec::new();
        },
    };

    iter.filter_map(|entry| {
        let entry = entry.ok()?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            return None;
        }
        Some(entry.path())
    })
    .collect()
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::symlink_metadata(path).ok()?.modified().ok()
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::folder::DIR_TMP;

    fn mailbox() -> (tempfile::TempDir, Maildir, StoreEnv) {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("box");
        let mut md = Maildir::new("box", &root);
        md.scan_tree().unwrap();
        (dir, md, StoreEnv::new())
    }

    fn deliver(md: &Maildir, folder_path: &str, name: &str) {
        let dir = if folder_path.is_empty() {
            md.root().to_owned()
        } else {
            md.root().join(folder_path)
        };
        fs::write(dir.join(name), b"message").unwrap();
    }

    #[test]
    fn list_messages_is_stable_across_rescans() {
        let (_dir, md, env) = mailbox();
        let inbox = md.tree().inbox();

        deliver(&md, "", "new/1700000000.P1Q1M0.h");
        deliver(&md, "", "cur/1700000000.P1Q2M0.h:2,S");
        deliver(&md, "", "cur/1700000000.P1Q3M0.h:2,F");

        let first = md.list_messages(&env, inbox).unwrap();
        assert_eq!(3, first.len());
        assert!(first.windows(2).all(|w| w[0] < w[1]));

        // Nothing changed: same UIDs
        let second = md.list_messages(&env, inbox).unwrap();
        assert_eq!(first, second);

        // A deletion prunes exactly that record
        fs::remove_file(md.root().join("cur/1700000000.P1Q2M0.h:2,S"))
            .unwrap();
        let third = md.list_messages(&env, inbox).unwrap();
        assert_eq!(2, third.len());
        assert!(third.iter().all(|uid| first.contains(uid)));

        // New delivery gets a fresh UID above the old watermark
        deliver(&md, "", "new/1700000001.P1Q4M0.h");
        let fourth = md.list_messages(&env, inbox).unwrap();
        assert_eq!(3, fourth.len());
        assert!(fourth.last().unwrap() > first.last().unwrap());
    }

    #[test]
    fn dotfiles_and_store_file_are_not_messages() {
        let (_dir, md, env) = mailbox();
        let inbox = md.tree().inbox();

        deliver(&md, "", "cur/.hidden");
        deliver(&md, "", "new/1700000000.P1Q1M0.h");
        assert_eq!(1, md.list_messages(&env, inbox).unwrap().len());
    }

    #[test]
    fn scan_required_follows_mtimes() {
        let (_dir, md, env) = mailbox();
        let inbox = md.tree().inbox();

        // No store file yet
        assert!(md.scan_required(inbox));
        md.list_messages(&env, inbox).unwrap();
        assert!(!md.scan_required(inbox));

        // Delivery touches new/, which postdates the store file. Directory
        // mtimes have coarse granularity on some filesystems, so wait out a
        // full second.
        thread::sleep(Duration::from_millis(1100));
        deliver(&md, "", "new/1700000000.P1Q1M0.h");
        assert!(md.scan_required(inbox));

        md.list_messages(&env, inbox).unwrap();
        assert!(!md.scan_required(inbox));
    }

    #[test]
    fn scan_required_is_false_for_removed_folders() {
        let (_dir, mut md, _env) = mailbox();
        let root = md.tree().root();
        let work = md.create_folder(root, "Work").unwrap();
        assert!(md.scan_required(work));

        md.remove_folder(work).unwrap();
        // A dead id answers quietly rather than panicking
        assert!(!md.scan_required(work));
        assert_eq!(None, md.folder_dir(work));
    }

    #[test]
    fn scan_tree_discovers_nested_folders() {
        let (_dir, mut md, _env) = mailbox();

        for name in &[".Work", ".Work.Urgent", ".Archive"] {
            let dir = md.root().join(name);
            fs::create_dir(&dir).unwrap();
            for sub in &[DIR_NEW, DIR_CUR, DIR_TMP] {
                fs::create_dir(dir.join(sub)).unwrap();
            }
        }
        // A dot-directory without cur/ is not a folder
        fs::create_dir(md.root().join(".notmaildir")).unwrap();
        // An orphan grandchild whose parent has no directory is unreachable
        let orphan = md.root().join(".Gone.Child");
        fs::create_dir(&orphan).unwrap();
        fs::create_dir(orphan.join(DIR_CUR)).unwrap();

        md.scan_tree().unwrap();

        let tree = md.tree();
        let root = tree.root();
        let work = tree.find_child(root, "Work").unwrap();
        let urgent = tree.find_child(work, "Urgent").unwrap();
        assert_eq!(Some(".Work.Urgent"), tree.node(urgent).path.as_deref());
        assert!(tree.find_child(root, "Archive").is_some());
        assert!(tree.find_child(root, "notmaildir").is_none());
        assert!(tree.find_child(root, "Gone").is_none());
        assert!(tree.find_child(root, "Child").is_none());

        // Rescan keeps ids valid
        let before = (work, urgent);
        md.scan_tree().unwrap();
        assert_eq!(
            Some("Urgent"),
            md.tree().get(before.1).map(|n| &*n.name)
        );
        assert_eq!(Some(before.1), md.tree().find_child(before.0, "Urgent"));
    }

    #[test]
    fn scan_tree_assigns_reserved_roles_once() {
        let (_dir, mut md, _env) = mailbox();

        // create_tree (run by mailbox()) made .sent/.draft/.queue/.trash;
        // add a nested impostor
        let nested = md.root().join(".Work");
        fs::create_dir(&nested).unwrap();
        fs::create_dir(nested.join(DIR_CUR)).unwrap();
        let impostor = md.root().join(".Work.trash");
        fs::create_dir(&impostor).unwrap();
        fs::create_dir(impostor.join(DIR_CUR)).unwrap();

        md.scan_tree().unwrap();

        let tree = md.tree();
        let trash = tree.special(FolderRole::Trash).unwrap();
        assert_eq!(Some(".trash"), tree.node(trash).path.as_deref());
        assert_eq!(FolderRole::Trash, tree.node(trash).role);

        let work = tree.find_child(tree.root(), "Work").unwrap();
        let nested_trash = tree.find_child(work, "trash").unwrap();
        assert_eq!(FolderRole::None, tree.node(nested_trash).role);

        assert!(tree.special(FolderRole::Outbox).is_some());
        assert!(tree.special(FolderRole::Draft).is_some());
        assert!(tree.special(FolderRole::Queue).is_some());
    }

    #[test]
    fn reserved_roles_survive_rescans() {
        let (_dir, mut md, _env) = mailbox();
        let trash = md.tree().special(FolderRole::Trash).unwrap();

        md.scan_tree().unwrap();
        md.scan_tree().unwrap();

        // Same node, same role, after any number of rescans
        assert_eq!(Some(trash), md.tree().special(FolderRole::Trash));
        assert_eq!(FolderRole::Trash, md.tree().node(trash).role);
        assert!(md.tree().special(FolderRole::Outbox).is_some());
        assert!(md.tree().special(FolderRole::Draft).is_some());
        assert!(md.tree().special(FolderRole::Queue).is_some());
    }

    #[test]
    fn scan_tree_prunes_vanished_folders() {
        let (_dir, mut md, _env) = mailbox();

        let inbox = md.tree().inbox();
        let work = md.create_folder(inbox, "Work").unwrap();
        let urgent = md.create_folder(work, "Urgent").unwrap();
        md.scan_tree().unwrap();
        assert!(md.tree().get(urgent).is_some());

        fs::remove_dir_all(md.root().join(".Work.Urgent")).unwrap();
        fs::remove_dir_all(md.root().join(".Work")).unwrap();
        md.scan_tree().unwrap();

        assert!(md.tree().get(work).is_none());
        assert!(md.tree().get(urgent).is_none());
        assert!(md.tree().get(inbox).is_some());
    }
}
