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

//! Renaming and removing folders.
//!
//! Because Maildir++ spells the whole hierarchy into each directory name,
//! renaming a folder means renaming every directory in its subtree. There is
//! no atomic multi-directory rename, so the cascade is best-effort per node:
//! a node that cannot be renamed keeps its old path (and its descendants
//! their old prefix), and the rest of the subtree proceeds.

use std::fs;

use log::{error, warn};

use crate::model::FolderRole;
use crate::support::error::Error;
use crate::support::safe_name::is_safe_name;

use super::tree::FolderId;
use super::Maildir;

impl Maildir {
    /// Rename folder `id` to `name`, cascading over its subtree.
    ///
    /// Only ordinary folders can be renamed; the inbox and the reserved
    /// special folders keep their names. Descendants that themselves carry a
    /// special role are left in place.
    pub fn rename_folder(
        &mut self,
        id: FolderId,
        name: &str,
    ) -> Result<(), Error> {
        let node = self.tree().get(id).ok_or(Error::NxFolder)?;
        if FolderRole::None != node.role || node.path.is_none() {
            return Err(Error::BadOperationOnSpecialFolder);
        }
        if !is_safe_name(name) {
            return Err(Error::UnsafeName);
        }

        let old_path = node.path.clone().unwrap_or_default();
        let old_prefix_len = old_path.len();
        // ".Parent.Old" keeps ".Parent.", a top-level ".Old" keeps "."
        let new_prefix = match old_path.rfind('.') {
            Some(dot) => format!("{}{}", &old_path[..=dot], name),
            None => format!(".{}", name),
        };

        self.tree_mut().node_mut(id).name = name.to_owned();

        for sub in self.tree().pre_order(id) {
            let node = self.tree().node(sub);
            if id != sub && FolderRole::None != node.role {
                continue;
            }
            let sub_path = match node.path.clone() {
                Some(path) => path,
                None => continue,
            };

            let new_path =
                format!("{}{}", new_prefix, &sub_path[old_prefix_len..]);
            match fs::rename(
                self.root().join(&sub_path),
                self.root().join(&new_path),
            ) {
                Ok(()) => {
                    self.tree_mut().node_mut(sub).path = Some(new_path);
                },
                Err(e) => {
                    // Keep the recorded path truthful; a later rename or
                    // rescan can pick this node up again.
                    warn!(
                        "{}: unable to rename to {}: {}",
                        self.root().join(&sub_path).display(),
                        new_path,
                        e
                    );
                },
            }
        }
        Ok(())
    }

    /// Remove folder `id` and its subtree, directories and all.
    ///
    /// Descendants carrying a special role are skipped (their directories
    /// and nodes survive). A directory that cannot be removed stops the
    /// operation with its nodes intact.
    pub fn remove_folder(&mut self, id: FolderId) -> Result<(), Error> {
        let node = self.tree().get(id).ok_or(Error::NxFolder)?;
        if FolderRole::None != node.role || node.path.is_none() {
            return Err(Error::BadOperationOnSpecialFolder);
        }

        for sub in self.tree().post_order(id) {
            let node = match self.tree().get(sub) {
                Some(node) => node,
                None => continue,
            };
            if FolderRole::None != node.role {
                continue;
            }
            let dir = match self.folder_dir(sub) {
                Some(dir) => dir,
                None => continue,
            };
            if let Err(e) = fs::remove_dir_all(&dir) {
                error!("Unable to remove {}: {}", dir.display(), e);
                return Err(e.into());
            }
            self.tree_mut().remove_subtree(sub);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::folder::DIR_CUR;

    fn mailbox() -> (tempfile::TempDir, Maildir) {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("box");
        let mut md = Maildir::new("box", &root);
        md.scan_tree().unwrap();
        (dir, md)
    }

    #[test]
    fn rename_cascades_over_subtree() {
        let (_dir, mut md) = mailbox();
        let root = md.tree().root();
        let work = md.create_folder(root, "Work").unwrap();
        let urgent = md.create_folder(work, "Urgent").unwrap();
        let later = md.create_folder(work, "Later").unwrap();
        let archive = md.create_folder(root, "Archive").unwrap();

        md.rename_folder(work, "Projects").unwrap();

        assert_eq!("Projects", md.tree().node(work).name);
        assert_eq!(
            Some(".Projects"),
            md.tree().node(work).path.as_deref()
        );
        assert_eq!(
            Some(".Projects.Urgent"),
            md.tree().node(urgent).path.as_deref()
        );
        assert_eq!(
            Some(".Projects.Later"),
            md.tree().node(later).path.as_deref()
        );
        // Unrelated sibling untouched
        assert_eq!(
            Some(".Archive"),
            md.tree().node(archive).path.as_deref()
        );

        assert!(md.root().join(".Projects").join(DIR_CUR).is_dir());
        assert!(md.root().join(".Projects.Urgent").join(DIR_CUR).is_dir());
        assert!(!md.root().join(".Work").exists());
        assert!(!md.root().join(".Work.Urgent").exists());

        // Child names survive, so a rescan agrees with the tree
        md.scan_tree().unwrap();
        assert_eq!(Some(urgent), md.tree().find_child(work, "Urgent"));
    }

    #[test]
    fn rename_of_nested_folder_keeps_parent_prefix() {
        let (_dir, mut md) = mailbox();
        let root = md.tree().root();
        let work = md.create_folder(root, "Work").unwrap();
        let urgent = md.create_folder(work, "Urgent").unwrap();

        md.rename_folder(urgent, "Hot").unwrap();
        assert_eq!(
            Some(".Work.Hot"),
            md.tree().node(urgent).path.as_deref()
        );
        assert!(md.root().join(".Work.Hot").is_dir());
        assert_eq!(Some(".Work"), md.tree().node(work).path.as_deref());
    }

    #[test]
    fn rename_rejects_special_folders_and_bad_names() {
        let (_dir, mut md) = mailbox();
        md.scan_tree().unwrap();
        let root = md.tree().root();
        let inbox = md.tree().inbox();
        let trash = md.tree().special(FolderRole::Trash).unwrap();
        let work = md.create_folder(root, "Work").unwrap();

        assert_matches!(
            Err(Error::BadOperationOnSpecialFolder),
            md.rename_folder(inbox, "x")
        );
        assert_matches!(
            Err(Error::BadOperationOnSpecialFolder),
            md.rename_folder(trash, "x")
        );
        assert_matches!(
            Err(Error::BadOperationOnSpecialFolder),
            md.rename_folder(root, "x")
        );
        assert_matches!(
            Err(Error::UnsafeName),
            md.rename_folder(work, "a.b")
        );
    }

    #[test]
    fn rename_skips_special_role_descendants() {
        let (_dir, mut md) = mailbox();
        let root = md.tree().root();
        let work = md.create_folder(root, "Work").unwrap();
        let keep = md.create_folder(work, "keep").unwrap();
        let plain = md.create_folder(work, "plain").unwrap();
        // Force a role onto the nested node; the public discovery path only
        // binds roles at the top level, but hosts can designate folders.
        md.tree_mut().set_special(FolderRole::Trash, keep);

        md.rename_folder(work, "Projects").unwrap();

        assert_eq!(
            Some(".Projects.plain"),
            md.tree().node(plain).path.as_deref()
        );
        // The special child keeps its old (still truthful) path
        assert_eq!(
            Some(".Work.keep"),
            md.tree().node(keep).path.as_deref()
        );
        assert!(md.root().join(".Work.keep").is_dir());
        assert!(md.root().join(".Projects.plain").is_dir());
    }

    #[test]
    fn remove_folder_removes_subtree_but_spares_specials() {
        let (_dir, mut md) = mailbox();
        let root = md.tree().root();
        let work = md.create_folder(root, "Work").unwrap();
        let urgent = md.create_folder(work, "Urgent").unwrap();

        md.remove_folder(work).unwrap();
        assert!(md.tree().get(work).is_none());
        assert!(md.tree().get(urgent).is_none());
        assert!(!md.root().join(".Work").exists());
        assert!(!md.root().join(".Work.Urgent").exists());

        let trash = md.tree().special(FolderRole::Trash).unwrap();
        assert_matches!(
            Err(Error::BadOperationOnSpecialFolder),
            md.remove_folder(trash)
        );
        assert_matches!(
            Err(Error::BadOperationOnSpecialFolder),
            md.remove_folder(md.tree().inbox())
        );
        assert!(md.root().join(".trash").is_dir());
    }
}
