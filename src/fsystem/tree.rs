// Definition of the virtual file tree. Every node lives in a single arena and
// is keyed by its full path; folders hold ordered lists of child ids. Nothing
// here touches a real file system.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{ConsoleError, ConsoleErrorType, Result};
use crate::fsystem::paths;

new_key_type! { pub(crate) struct NodeId; }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum NodeKind {
    File,
    Folder,
}

#[derive(Debug, Clone)]
pub(crate) struct FileNode {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) path: String,
    pub(crate) content: Option<String>,
    pub(crate) language: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A file as delivered by a bulk import: its full path and its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FlatFile {
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) content: String,
}

/// Owned, nested rendering of a node and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct NodeView {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) kind: NodeKind,
    pub(crate) path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) children: Option<Vec<NodeView>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct Listing {
    pub(crate) folders: Vec<String>,
    pub(crate) files: Vec<String>,
}

impl FileNode {
    fn new_file(path: &str, content: String, parent: Option<NodeId>) -> FileNode {
        FileNode {
            id: Uuid::new_v4().to_string(),
            name: paths::name(path).to_string(),
            kind: NodeKind::File,
            path: path.to_string(),
            content: Some(content),
            language: Some(paths::language_for_path(path).to_string()),
            parent,
            children: Vec::new(),
        }
    }

    fn new_folder(path: &str, parent: Option<NodeId>) -> FileNode {
        FileNode {
            id: Uuid::new_v4().to_string(),
            name: paths::name(path).to_string(),
            kind: NodeKind::Folder,
            path: path.to_string(),
            content: None,
            language: None,
            parent,
            children: Vec::new(),
        }
    }

    pub(crate) fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FileTree {
    arena: SlotMap<NodeId, FileNode>,
    roots: Vec<NodeId>,
    by_path: HashMap<String, NodeId>,
}

impl FileTree {
    pub(crate) fn new() -> FileTree {
        FileTree::default()
    }

    /// Build a tree from a flat list of files. Folders are synthesized for every
    /// intermediate prefix the first time it is seen, so two files sharing a
    /// folder never produce two folder nodes. Roots keep first-encounter order.
    /// A path listed twice keeps the last content.
    #[instrument(skip(files))]
    pub(crate) fn import_flat_paths<I>(files: I) -> Result<FileTree>
    where
        I: IntoIterator<Item = FlatFile>,
    {
        let mut tree = FileTree::new();
        for file in files {
            let path = paths::normalize(&file.path)?;
            if let Some(&id) = tree.by_path.get(path) {
                let node = &mut tree.arena[id];
                if !node.is_file() {
                    return Err(ConsoleError::invalid_path(format!(
                        "Path {} is both a file and a folder",
                        path
                    )));
                }
                tracing::debug!("Path {} listed more than once, keeping the last content", path);
                node.content = Some(file.content);
                continue;
            }
            let parent = tree.ensure_folders(path)?;
            tree.attach(FileNode::new_file(path, file.content, parent));
        }
        tracing::info!("Imported {} nodes", tree.len());
        Ok(tree)
    }

    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, path: &str) -> bool {
        self.find_by_path(path).is_some()
    }

    pub(crate) fn find_by_path(&self, path: &str) -> Option<&FileNode> {
        let path = path.strip_suffix('/').unwrap_or(path);
        self.by_path.get(path).map(|&id| &self.arena[id])
    }

    pub(crate) fn is_file(&self, path: &str) -> bool {
        self.find_by_path(path).is_some_and(|node| node.is_file())
    }

    #[instrument(skip(self, content))]
    pub(crate) fn create_file(&mut self, path: &str, content: &str) -> Result<&FileNode> {
        let path = self.check_free(path)?;
        let parent = self.ensure_folders(path)?;
        let id = self.attach(FileNode::new_file(path, content.to_string(), parent));
        tracing::info!("Created file {}", path);
        Ok(&self.arena[id])
    }

    #[instrument(skip(self))]
    pub(crate) fn create_folder(&mut self, path: &str) -> Result<&FileNode> {
        let path = self.check_free(path)?;
        let parent = self.ensure_folders(path)?;
        let id = self.attach(FileNode::new_folder(path, parent));
        tracing::info!("Created folder {}", path);
        Ok(&self.arena[id])
    }

    #[instrument(skip(self, content))]
    pub(crate) fn update_content(&mut self, path: &str, content: &str) -> Result<()> {
        let path = path.strip_suffix('/').unwrap_or(path);
        let node = self
            .by_path
            .get(path)
            .map(|&id| &mut self.arena[id])
            .filter(|node| node.is_file());
        match node {
            Some(node) => {
                if node.content.as_deref() != Some(content) {
                    node.content = Some(content.to_string());
                }
                Ok(())
            }
            None => {
                let msg = format!("No file at path {}", path);
                tracing::info!("{}", msg);
                Err(ConsoleError::not_found(msg))
            }
        }
    }

    /// Remove a node and, for folders, everything below it. Returns the removed
    /// paths in depth-first order. An absent path is a no-op and removes nothing.
    #[instrument(skip(self))]
    pub(crate) fn delete_node(&mut self, path: &str) -> Vec<String> {
        let path = path.strip_suffix('/').unwrap_or(path);
        let id = match self.by_path.get(path) {
            Some(&id) => id,
            None => {
                tracing::info!("Nothing to delete at path {}", path);
                return Vec::new();
            }
        };
        let parent = self.arena[id].parent;
        self.siblings_mut(parent).retain(|&child| child != id);

        let mut removed = Vec::new();
        for node_id in self.subtree(id) {
            if let Some(node) = self.arena.remove(node_id) {
                self.by_path.remove(&node.path);
                removed.push(node.path);
            }
        }
        tracing::info!("Removed {} nodes at path {}", removed.len(), path);
        removed
    }

    /// Rename or move a node. Descendant paths are rewritten under the new
    /// prefix. Renaming within the same folder keeps the node's position,
    /// moving to another folder appends it there.
    #[instrument(skip(self))]
    pub(crate) fn rename_node(&mut self, old_path: &str, new_path: &str) -> Result<&FileNode> {
        let old_path = paths::normalize(old_path)?.to_string();
        let new_path = paths::normalize(new_path)?.to_string();
        let id = match self.by_path.get(&old_path) {
            Some(&id) => id,
            None => {
                return Err(ConsoleError::not_found(format!(
                    "Source path {} does not exist",
                    old_path
                )))
            }
        };
        if old_path == new_path {
            return Ok(&self.arena[id]);
        }
        if paths::is_within(&new_path, &old_path) {
            return Err(ConsoleError::invalid_path(format!(
                "Cannot move {} into itself",
                old_path
            )));
        }
        self.check_free(&new_path)?;

        let old_parent = self.arena[id].parent;
        let new_parent = self.ensure_folders(&new_path)?;
        if old_parent != new_parent {
            self.siblings_mut(old_parent).retain(|&child| child != id);
            self.siblings_mut(new_parent).push(id);
            self.arena[id].parent = new_parent;
        }

        let subtree = self.subtree(id);
        for &node_id in &subtree {
            let node = &mut self.arena[node_id];
            self.by_path.remove(&node.path);
            node.path = paths::rebase(&node.path, &old_path, &new_path);
            if node.is_file() {
                node.language = Some(paths::language_for_path(&node.path).to_string());
            }
            self.by_path.insert(node.path.clone(), node_id);
        }
        self.arena[id].name = paths::name(&new_path).to_string();
        tracing::info!("Moved {} ({} nodes) to {}", old_path, subtree.len(), new_path);
        Ok(&self.arena[id])
    }

    /// One level of the tree. `None` lists the roots.
    pub(crate) fn list(&self, path: Option<&str>) -> Result<Listing> {
        let children = match path {
            None => &self.roots,
            Some(path) => {
                let node = self
                    .find_by_path(path)
                    .ok_or_else(|| ConsoleError::not_found(format!("Path {} does not exist", path)))?;
                if node.is_file() {
                    return Err(ConsoleError::invalid_path(format!("Path {} is a file", path)));
                }
                &node.children
            }
        };
        let mut listing = Listing::default();
        for &child in children {
            let node = &self.arena[child];
            match node.kind {
                NodeKind::File => listing.files.push(node.name.clone()),
                NodeKind::Folder => listing.folders.push(node.name.clone()),
            }
        }
        Ok(listing)
    }

    /// File paths matching a shell glob, in tree order.
    pub(crate) fn search(&self, pattern: &str) -> Result<Vec<String>> {
        let regex = fnmatch_regex::glob_to_regex(pattern).map_err(|e| {
            ConsoleError::new(
                ConsoleErrorType::InvalidPath,
                format!("Invalid pattern {}: {}", pattern, e),
            )
        })?;
        Ok(self
            .iter()
            .filter(|node| node.is_file() && regex.is_match(&node.path))
            .map(|node| node.path.clone())
            .collect())
    }

    pub(crate) fn file_paths(&self) -> Vec<String> {
        self.iter()
            .filter(|node| node.is_file())
            .map(|node| node.path.clone())
            .collect()
    }

    /// All nodes, depth first, children in order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &FileNode> + '_ {
        let mut order = Vec::with_capacity(self.arena.len());
        for &root in &self.roots {
            order.extend(self.subtree(root));
        }
        order.into_iter().map(move |id| &self.arena[id])
    }

    pub(crate) fn snapshot(&self) -> Vec<NodeView> {
        self.roots.iter().map(|&id| self.view(id)).collect()
    }

    pub(crate) fn view_of(&self, path: &str) -> Option<NodeView> {
        let path = path.strip_suffix('/').unwrap_or(path);
        self.by_path.get(path).map(|&id| self.view(id))
    }

    fn view(&self, id: NodeId) -> NodeView {
        let node = &self.arena[id];
        let children = match node.kind {
            NodeKind::File => None,
            NodeKind::Folder => Some(node.children.iter().map(|&c| self.view(c)).collect()),
        };
        NodeView {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            path: node.path.clone(),
            content: node.content.clone(),
            language: node.language.clone(),
            children,
        }
    }

    // Validates `path` and makes sure nothing lives there and that no ancestor
    // is a file, so the insertion that follows cannot fail half way.
    fn check_free<'a>(&self, path: &'a str) -> Result<&'a str> {
        let path = paths::normalize(path)?;
        if self.by_path.contains_key(path) {
            let msg = format!("Something already exists at path {}", path);
            tracing::info!("{}", msg);
            return Err(ConsoleError::new(ConsoleErrorType::DuplicatePath, msg));
        }
        for ancestor in paths::ancestors(path) {
            if self.is_file(ancestor) {
                return Err(ConsoleError::invalid_path(format!(
                    "Path {} is a file",
                    ancestor
                )));
            }
        }
        Ok(path)
    }

    // Returns the folder that should hold `path`, creating any missing
    // ancestors on the way. `None` means the node belongs at the root.
    fn ensure_folders(&mut self, path: &str) -> Result<Option<NodeId>> {
        let mut parent = None;
        for ancestor in paths::ancestors(path) {
            let id = match self.by_path.get(ancestor) {
                Some(&id) => {
                    if self.arena[id].is_file() {
                        return Err(ConsoleError::invalid_path(format!(
                            "Path {} is a file",
                            ancestor
                        )));
                    }
                    id
                }
                None => {
                    tracing::debug!("Creating new folder {}", ancestor);
                    self.attach(FileNode::new_folder(ancestor, parent))
                }
            };
            parent = Some(id);
        }
        Ok(parent)
    }

    fn attach(&mut self, node: FileNode) -> NodeId {
        let parent = node.parent;
        let path = node.path.clone();
        let id = self.arena.insert(node);
        self.siblings_mut(parent).push(id);
        self.by_path.insert(path, id);
        id
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            Some(parent) => &mut self.arena[parent].children,
            None => &mut self.roots,
        }
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            order.push(node_id);
            if let Some(node) = self.arena.get(node_id) {
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }
}
