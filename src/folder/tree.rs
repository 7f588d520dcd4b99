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

//! The in-memory folder hierarchy.
//!
//! Nodes live in an arena indexed by `FolderId`; parent/child links are ids,
//! not references, so subtree mutation never fights the borrow checker.
//! Removed slots are tombstoned rather than compacted, which keeps every
//! outstanding `FolderId` either valid or dead, never silently rebound to a
//! different folder.

use crate::model::FolderRole;

/// Handle on one node of a [`FolderTree`].
///
/// Ids remain stable across tree mutation. An id whose folder has been
/// removed yields `None` from [`FolderTree::get`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FolderId(usize);

/// One folder in the hierarchy.
#[derive(Debug)]
pub struct FolderNode {
    /// Display name of the folder ("inbox", "Urgent", ...).
    pub name: String,
    /// Directory name relative to the mailbox root (".Work.Urgent"), or
    /// `None` for the synthetic tree root.
    ///
    /// The inbox carries the sentinel path `.inbox` but is physically backed
    /// by the mailbox root directory itself.
    pub path: Option<String>,
    pub role: FolderRole,
    parent: Option<FolderId>,
    children: Vec<FolderId>,
}

impl FolderNode {
    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    pub fn children(&self) -> &[FolderId] {
        &self.children
    }
}

pub struct FolderTree {
    nodes: Vec<Option<FolderNode>>,
    root: FolderId,
    inbox: FolderId,
    outbox: Option<FolderId>,
    draft: Option<FolderId>,
    queue: Option<FolderId>,
    trash: Option<FolderId>,
}

impl FolderTree {
    /// Create a tree holding the synthetic root and the inbox.
    ///
    /// These two nodes exist for the lifetime of the tree; no discovery or
    /// prune pass ever removes them.
    pub fn new(root_name: &str) -> Self {
        let mut tree = FolderTree {
            nodes: Vec::new(),
            root: FolderId(0),
            inbox: FolderId(0),
            outbox: None,
            draft: None,
            queue: None,
            trash: None,
        };
        tree.root = tree.alloc(FolderNode {
            name: root_name.to_owned(),
            path: None,
            role: FolderRole::None,
            parent: None,
            children: Vec::new(),
        });
        tree.inbox = tree.add_child(
            tree.root,
            "inbox",
            super::INBOX_PATH,
            FolderRole::Inbox,
        );
        tree
    }

    pub fn root(&self) -> FolderId {
        self.root
    }

    pub fn inbox(&self) -> FolderId {
        self.inbox
    }

    /// The node currently holding `role`, if any.
    pub fn special(&self, role: FolderRole) -> Option<FolderId> {
        match role {
            FolderRole::None => None,
            FolderRole::Inbox => Some(self.inbox),
            FolderRole::Outbox => self.outbox,
            FolderRole::Draft => self.draft,
            FolderRole::Queue => self.queue,
            FolderRole::Trash => self.trash,
        }
    }

    pub fn get(&self, id: FolderId) -> Option<&FolderNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn node(&self, id: FolderId) -> &FolderNode {
        self.nodes[id.0].as_ref().expect("stale FolderId")
    }

    pub(crate) fn node_mut(&mut self, id: FolderId) -> &mut FolderNode {
        self.nodes[id.0].as_mut().expect("stale FolderId")
    }

    pub(crate) fn add_child(
        &mut self,
        parent: FolderId,
        name: &str,
        path: &str,
        role: FolderRole,
    ) -> FolderId {
        let id = self.alloc(FolderNode {
            name: name.to_owned(),
            path: Some(path.to_owned()),
            role,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.node_mut(parent).children.push(id);
        if FolderRole::None != role {
            self.set_special(role, id);
        }
        id
    }

    pub(crate) fn find_child(
        &self,
        parent: FolderId,
        name: &str,
    ) -> Option<FolderId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&c| name == self.node(c).name)
    }

    /// Ids of the subtree rooted at `id`, parents before children.
    pub fn pre_order(&self, id: FolderId) -> Vec<FolderId> {
        let mut out = Vec::new();
        self.walk_pre(id, &mut out);
        out
    }

    fn walk_pre(&self, id: FolderId, out: &mut Vec<FolderId>) {
        if self.get(id).is_none() {
            return;
        }
        out.push(id);
        for child in self.node(id).children.clone() {
            self.walk_pre(child, out);
        }
    }

    /// Ids of the subtree rooted at `id`, children before parents.
    pub fn post_order(&self, id: FolderId) -> Vec<FolderId> {
        let mut out = self.pre_order(id);
        out.reverse();
        out
    }

    /// Forget all special-role assignments other than the inbox.
    pub(crate) fn clear_specials(&mut self) {
        for id in [self.outbox, self.draft, self.queue, self.trash]
            .iter()
            .flatten()
        {
            if let Some(node) = self.nodes[id.0].as_mut() {
                node.role = FolderRole::None;
            }
        }
        self.outbox = None;
        self.draft = None;
        self.queue = None;
        self.trash = None;
    }

    pub(crate) fn set_special(&mut self, role: FolderRole, id: FolderId) {
        let slot = match role {
            FolderRole::Outbox => &mut self.outbox,
            FolderRole::Draft => &mut self.draft,
            FolderRole::Queue => &mut self.queue,
            FolderRole::Trash => &mut self.trash,
            FolderRole::None | FolderRole::Inbox => return,
        };
        *slot = Some(id);
        self.node_mut(id).role = role;
    }

    /// Detach `id` from its parent and tombstone the whole subtree.
    pub(crate) fn remove_subtree(&mut self, id: FolderId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| id != c);
        }
        for sub in self.pre_order(id) {
            for slot in [
                &mut self.outbox,
                &mut self.draft,
                &mut self.queue,
                &mut self.trash,
            ]
            .iter_mut()
            {
                if Some(sub) == **slot {
                    **slot = None;
                }
            }
            self.nodes[sub.0] = None;
        }
    }

    fn alloc(&mut self, node: FolderNode) -> FolderId {
        let id = FolderId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }
}
