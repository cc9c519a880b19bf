use serde::Serialize;

use crate::errors::{ConsoleError, ConsoleErrorType, Result};
use crate::fsystem::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum EditorStatus {
    Empty,
    HasSelection,
}

/// Open tabs and the selected tab. The selection is always one of the open
/// paths, or nothing when no tab is open.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct EditorState {
    open_paths: Vec<String>,
    selected_path: Option<String>,
}

impl EditorState {
    pub(crate) fn new() -> EditorState {
        EditorState::default()
    }

    pub(crate) fn open_paths(&self) -> &[String] {
        &self.open_paths
    }

    pub(crate) fn selected(&self) -> Option<&str> {
        self.selected_path.as_deref()
    }

    pub(crate) fn is_open(&self, path: &str) -> bool {
        self.open_paths.iter().any(|p| p == path)
    }

    pub(crate) fn status(&self) -> EditorStatus {
        match self.selected_path {
            Some(_) => EditorStatus::HasSelection,
            None => EditorStatus::Empty,
        }
    }

    pub(crate) fn open(&mut self, path: &str) {
        if !self.is_open(path) {
            self.open_paths.push(path.to_string());
        }
        self.selected_path = Some(path.to_string());
    }

    /// Returns false when the path was not open.
    pub(crate) fn close(&mut self, path: &str) -> bool {
        let position = match self.open_paths.iter().position(|p| p == path) {
            Some(position) => position,
            None => return false,
        };
        self.open_paths.remove(position);
        if self.selected_path.as_deref() == Some(path) {
            self.selected_path = self.open_paths.last().cloned();
        }
        true
    }

    pub(crate) fn close_all<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.close(path.as_ref());
        }
    }

    pub(crate) fn select(&mut self, path: &str) -> Result<()> {
        if !self.is_open(path) {
            return Err(ConsoleError::new(
                ConsoleErrorType::NotOpen,
                format!("{} is not open", path),
            ));
        }
        self.selected_path = Some(path.to_string());
        Ok(())
    }

    /// Follow a rename: tabs at or below `old` move under `new`.
    pub(crate) fn retarget(&mut self, old: &str, new: &str) {
        let mut rewritten: Vec<String> = Vec::with_capacity(self.open_paths.len());
        for path in self.open_paths.drain(..) {
            let path = paths::rebase(&path, old, new);
            if !rewritten.contains(&path) {
                rewritten.push(path);
            }
        }
        self.open_paths = rewritten;
        self.selected_path = self
            .selected_path
            .take()
            .map(|selected| paths::rebase(&selected, old, new));
    }
}
