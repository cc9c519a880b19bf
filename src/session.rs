// A session is one workspace as seen by one front-end: a virtual tree, the
// editor tabs pointing into it and the chat transcript of generation requests.
// Every mutation goes through the session so the editor never points at a
// path the tree no longer has.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;
use uuid::Uuid;

use crate::backend::GeneratedSite;
use crate::errors::{ConsoleError, ConsoleErrorType, Result};
use crate::fsystem::{EditorState, FileTree, FlatFile, Listing, NodeView};

pub(crate) const STARTER_PATH: &str = "src/App.tsx";

const STARTER_CONTENT: &str = r#"import React from 'react';

function App() {
  return (
    <div className="min-h-screen bg-gradient-to-br from-blue-50 to-indigo-100 flex items-center justify-center">
      <div className="text-center">
        <h1 className="text-4xl font-bold text-gray-900 mb-4">
          Welcome to Bolt IDE
        </h1>
        <p className="text-lg text-gray-600 mb-8">
          Ask AI to create any website and watch it come to life!
        </p>
      </div>
    </div>
  );
}

export default App;"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChatMessage {
    pub(crate) id: String,
    pub(crate) role: Role,
    pub(crate) content: String,
    pub(crate) timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) files: Vec<String>,
}

impl ChatMessage {
    fn new(role: Role, content: String, files: Vec<String>) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
            files,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Session {
    id: String,
    created: DateTime<Utc>,
    tree: FileTree,
    editor: EditorState,
    messages: Vec<ChatMessage>,
}

fn starter_template() -> Vec<FlatFile> {
    vec![FlatFile {
        path: STARTER_PATH.to_string(),
        content: STARTER_CONTENT.to_string(),
    }]
}

impl Session {
    /// A new session. Seeded sessions start with the starter app open.
    pub(crate) fn new(seed: bool) -> Result<Session> {
        let mut session = Session {
            id: Uuid::new_v4().to_string(),
            created: Utc::now(),
            tree: FileTree::new(),
            editor: EditorState::new(),
            messages: Vec::new(),
        };
        if seed {
            session.tree = FileTree::import_flat_paths(starter_template())?;
            session.editor.open(STARTER_PATH);
        }
        Ok(session)
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn created(&self) -> DateTime<Utc> {
        self.created
    }

    #[cfg(test)]
    pub(crate) fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub(crate) fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub(crate) fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub(crate) fn snapshot(&self) -> Vec<NodeView> {
        self.tree.snapshot()
    }

    pub(crate) fn find(&self, path: &str) -> Result<NodeView> {
        self.tree
            .view_of(path)
            .ok_or_else(|| ConsoleError::not_found(format!("Path {} does not exist", path)))
    }

    pub(crate) fn list(&self, path: Option<&str>) -> Result<Listing> {
        self.tree.list(path)
    }

    pub(crate) fn search(&self, pattern: &str) -> Result<Vec<String>> {
        self.tree.search(pattern)
    }

    /// Open a tab. Only files can be opened.
    pub(crate) fn open(&mut self, path: &str) -> Result<()> {
        let node = self
            .tree
            .find_by_path(path)
            .ok_or_else(|| ConsoleError::not_found(format!("Path {} does not exist", path)))?;
        if !node.is_file() {
            return Err(ConsoleError::invalid_path(format!(
                "Path {} is a folder and cannot be opened",
                path
            )));
        }
        let path = node.path.clone();
        self.editor.open(&path);
        Ok(())
    }

    pub(crate) fn close(&mut self, path: &str) -> bool {
        self.editor.close(path.strip_suffix('/').unwrap_or(path))
    }

    pub(crate) fn select(&mut self, path: &str) -> Result<()> {
        self.editor.select(path.strip_suffix('/').unwrap_or(path))
    }

    /// Create a file and bring it up in the editor.
    #[instrument(skip(self, content), fields(session = %self.id))]
    pub(crate) fn create_file(&mut self, path: &str, content: &str) -> Result<NodeView> {
        let path = self.tree.create_file(path, content)?.path.clone();
        self.editor.open(&path);
        self.find(&path)
    }

    #[instrument(skip(self), fields(session = %self.id))]
    pub(crate) fn create_folder(&mut self, path: &str) -> Result<NodeView> {
        let path = self.tree.create_folder(path)?.path.clone();
        self.find(&path)
    }

    pub(crate) fn save(&mut self, path: &str, content: &str) -> Result<()> {
        self.tree.update_content(path, content)
    }

    /// Delete a node and close every tab that pointed into it.
    #[instrument(skip(self), fields(session = %self.id))]
    pub(crate) fn delete(&mut self, path: &str) -> Vec<String> {
        let removed = self.tree.delete_node(path);
        self.editor.close_all(&removed);
        removed
    }

    #[instrument(skip(self), fields(session = %self.id))]
    pub(crate) fn rename(&mut self, old_path: &str, new_path: &str) -> Result<NodeView> {
        let node = self.tree.rename_node(old_path, new_path)?;
        let new_path = node.path.clone();
        let old_path = old_path.strip_suffix('/').unwrap_or(old_path);
        self.editor.retarget(old_path, &new_path);
        self.find(&new_path)
    }

    pub(crate) fn record_prompt(&mut self, prompt: &str) -> ChatMessage {
        let message = ChatMessage::new(Role::User, prompt.to_string(), Vec::new());
        self.messages.push(message.clone());
        message
    }

    /// Apply the outcome of a generation request. A successful generation
    /// replaces the whole tree; a failed one leaves it untouched. Either way
    /// an assistant message is added to the transcript.
    #[instrument(skip(self, outcome), fields(session = %self.id))]
    pub(crate) fn apply_generation(&mut self, outcome: Result<GeneratedSite>) -> Result<ChatMessage> {
        let imported = outcome.and_then(|site| {
            let tree = FileTree::import_flat_paths(site.files.iter().cloned()).map_err(|e| {
                ConsoleError::upstream(format!("Generated files could not be imported: {}", e.message))
            })?;
            Ok((site, tree))
        });

        let (site, tree) = match imported {
            Ok(imported) => imported,
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                let content = format!(
                    "Sorry, I encountered an error generating your website: {}\n\nPlease try again with a different prompt.",
                    e.message
                );
                self.messages
                    .push(ChatMessage::new(Role::Assistant, content, Vec::new()));
                return Err(ConsoleError::upstream(e.message));
            }
        };

        self.tree = tree;
        let vanished: Vec<String> = self
            .editor
            .open_paths()
            .iter()
            .filter(|path| !self.tree.is_file(path))
            .cloned()
            .collect();
        self.editor.close_all(&vanished);

        let written = if site.files_written.is_empty() {
            self.tree.file_paths()
        } else {
            site.files_written
        };
        let total = match site.total_files {
            0 => written.len(),
            total => total,
        };
        let listing: Vec<String> = written.iter().map(|path| format!("- {}", path)).collect();
        let content = format!(
            "Successfully generated your website!\n\nCreated {} files:\n{}\n\nYour website is now live in the preview panel!",
            total,
            listing.join("\n")
        );
        tracing::info!("Generation replaced the tree with {} files", total);
        let message = ChatMessage::new(Role::Assistant, content, written);
        self.messages.push(message.clone());
        Ok(message)
    }
}

/// Take a lock, reporting a poisoned mutex as an internal error instead of
/// panicking in a request handler.
pub(crate) fn acquire<T>(lock: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    lock.lock().map_err(|_| {
        tracing::error!("A lock was poisoned by a panicking thread");
        ConsoleError::new(
            ConsoleErrorType::InternalError,
            "Workspace state is unavailable".to_string(),
        )
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SessionSummary {
    pub(crate) id: String,
    pub(crate) created: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub(crate) struct SessionManager {
    sessions: HashMap<String, Arc<Mutex<Session>>>,
    created: HashMap<String, DateTime<Utc>>,
}

impl SessionManager {
    pub(crate) fn new() -> SessionManager {
        SessionManager::default()
    }

    #[instrument(skip(self))]
    pub(crate) fn create_session(&mut self, seed: bool) -> Result<SessionSummary> {
        let session = Session::new(seed)?;
        let summary = SessionSummary {
            id: session.id().to_string(),
            created: session.created(),
        };
        self.created.insert(summary.id.clone(), summary.created);
        self.sessions
            .insert(summary.id.clone(), Arc::new(Mutex::new(session)));
        tracing::info!("Created session {}", summary.id);
        Ok(summary)
    }

    pub(crate) fn get_session(&self, id: &str) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| ConsoleError::not_found(format!("No session with id {}", id)))
    }

    #[instrument(skip(self))]
    pub(crate) fn drop_session(&mut self, id: &str) -> Result<()> {
        match self.sessions.remove(id) {
            Some(_) => {
                self.created.remove(id);
                tracing::info!("Dropped session {}", id);
                Ok(())
            }
            None => Err(ConsoleError::not_found(format!("No session with id {}", id))),
        }
    }

    /// Live sessions, oldest first.
    pub(crate) fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .created
            .iter()
            .map(|(id, created)| SessionSummary {
                id: id.clone(),
                created: *created,
            })
            .collect();
        summaries.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsystem::EditorStatus;

    fn site(paths: &[(&str, &str)]) -> GeneratedSite {
        GeneratedSite {
            files: paths
                .iter()
                .map(|(path, content)| FlatFile {
                    path: path.to_string(),
                    content: content.to_string(),
                })
                .collect(),
            files_written: paths.iter().map(|(path, _)| path.to_string()).collect(),
            total_files: paths.len(),
        }
    }

    #[test]
    fn test_seeded_session() {
        let session = Session::new(true).unwrap();
        assert_eq!(session.editor().selected(), Some(STARTER_PATH));
        let node = session.find(STARTER_PATH).unwrap();
        assert_eq!(node.language.as_deref(), Some("typescript"));
        assert!(session.find("src").unwrap().children.is_some());

        let empty = Session::new(false).unwrap();
        assert!(empty.tree().is_empty());
        assert_eq!(empty.editor().status(), EditorStatus::Empty);
    }

    #[test]
    fn test_create_file_opens_it() {
        let mut session = Session::new(true).unwrap();
        let node = session
            .create_file("src/components/New.tsx", "// hi")
            .unwrap();
        assert_eq!(node.content.as_deref(), Some("// hi"));
        assert_eq!(session.editor().selected(), Some("src/components/New.tsx"));
        assert_eq!(
            session.editor().open_paths(),
            &["src/App.tsx", "src/components/New.tsx"]
        );
        let src = session.list(Some("src")).unwrap();
        assert_eq!(src.folders, vec!["components"]);
    }

    #[test]
    fn test_open_requires_a_file() {
        let mut session = Session::new(true).unwrap();
        let err = session.open("src").unwrap_err();
        assert_eq!(err.error_type, ConsoleErrorType::InvalidPath);
        let err = session.open("missing.ts").unwrap_err();
        assert_eq!(err.error_type, ConsoleErrorType::NotFound);
    }

    #[test]
    fn test_trailing_slash_names_the_same_tab() {
        let mut session = Session::new(false).unwrap();
        session.create_file("a.txt", "a").unwrap();
        session.create_file("b.txt", "b").unwrap();
        session.open("a.txt/").unwrap();
        assert_eq!(session.editor().open_paths(), &["a.txt", "b.txt"]);

        session.select("b.txt/").unwrap();
        assert_eq!(session.editor().selected(), Some("b.txt"));
        assert!(session.close("b.txt/"));
        assert_eq!(session.editor().open_paths(), &["a.txt"]);
        assert_eq!(session.editor().selected(), Some("a.txt"));
    }

    #[test]
    fn test_delete_closes_tabs() {
        let mut session = Session::new(true).unwrap();
        session.create_file("src/lib/a.ts", "a").unwrap();
        session.create_file("README.md", "# hi").unwrap();
        session.open("src/App.tsx").unwrap();

        let removed = session.delete("src");
        assert_eq!(removed.len(), 4);
        assert_eq!(session.editor().open_paths(), &["README.md"]);
        assert_eq!(session.editor().selected(), Some("README.md"));
        assert!(session.delete("src").is_empty());
    }

    #[test]
    fn test_rename_retargets_tabs() {
        let mut session = Session::new(true).unwrap();
        session.create_file("src/lib/a.ts", "a").unwrap();
        let node = session.rename("src", "app/").unwrap();
        assert_eq!(node.path, "app");
        assert_eq!(
            session.editor().open_paths(),
            &["app/App.tsx", "app/lib/a.ts"]
        );
        assert_eq!(session.editor().selected(), Some("app/lib/a.ts"));
        assert_eq!(session.find("app/lib/a.ts").unwrap().content.as_deref(), Some("a"));
    }

    #[test]
    fn test_generation_replaces_tree() {
        let mut session = Session::new(true).unwrap();
        session.create_file("index.html", "<html></html>").unwrap();
        session.record_prompt("a landing page");

        let message = session
            .apply_generation(Ok(site(&[
                ("index.html", "<html>new</html>"),
                ("src/main.js", "console.log(1)"),
            ])))
            .unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.files, vec!["index.html", "src/main.js"]);
        assert!(message.content.contains("Created 2 files"));

        assert!(!session.tree().contains(STARTER_PATH));
        assert_eq!(session.editor().open_paths(), &["index.html"]);
        assert_eq!(
            session.find("index.html").unwrap().content.as_deref(),
            Some("<html>new</html>")
        );
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].role, Role::User);
    }

    #[test]
    fn test_generation_failure_leaves_tree() {
        let mut session = Session::new(true).unwrap();
        let before = session.snapshot();
        let err = session
            .apply_generation(Err(ConsoleError::upstream("Model overloaded".to_string())))
            .unwrap_err();
        assert_eq!(err.error_type, ConsoleErrorType::UpstreamFailure);
        assert_eq!(session.snapshot(), before);
        assert_eq!(session.editor().selected(), Some(STARTER_PATH));
        let last = session.messages().last().unwrap();
        assert!(last.content.contains("Model overloaded"));
    }

    #[test]
    fn test_unimportable_generation_is_upstream_failure() {
        let mut session = Session::new(true).unwrap();
        let before = session.snapshot();
        let err = session
            .apply_generation(Ok(site(&[("a", "x"), ("a/b.txt", "y")])))
            .unwrap_err();
        assert_eq!(err.error_type, ConsoleErrorType::UpstreamFailure);
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_manager_lifecycle() {
        let mut manager = SessionManager::new();
        let first = manager.create_session(true).unwrap();
        let second = manager.create_session(false).unwrap();
        assert_eq!(manager.len(), 2);

        let listed: Vec<String> = manager.list().into_iter().map(|s| s.id).collect();
        assert!(listed.contains(&first.id));
        assert!(listed.contains(&second.id));

        let session = manager.get_session(&first.id).unwrap();
        assert_eq!(acquire(&session).unwrap().id(), first.id);

        manager.drop_session(&first.id).unwrap();
        let err = manager.get_session(&first.id).unwrap_err();
        assert_eq!(err.error_type, ConsoleErrorType::NotFound);
        let err = manager.drop_session(&first.id).unwrap_err();
        assert_eq!(err.error_type, ConsoleErrorType::NotFound);
        assert_eq!(manager.list().len(), 1);
    }
}
