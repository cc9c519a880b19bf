use crate::backend::QueryRequest;
use crate::errors::{ConsoleError, ConsoleErrorType, Result};
use crate::fsystem::{EditorState, EditorStatus};
use crate::routes::{Sessions, SharedBackend};
use crate::session::{acquire, Session};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::instrument;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

#[derive(Debug, Deserialize)]
pub(crate) struct FileBody {
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathBody {
    pub(crate) path: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveBody {
    pub(crate) from: String,
    pub(crate) to: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PromptBody {
    pub(crate) prompt: String,
}

#[derive(Serialize)]
struct EditorView {
    status: EditorStatus,
    open_paths: Vec<String>,
    selected_path: Option<String>,
}

impl From<&EditorState> for EditorView {
    fn from(editor: &EditorState) -> Self {
        EditorView {
            status: editor.status(),
            open_paths: editor.open_paths().to_vec(),
            selected_path: editor.selected().map(str::to_string),
        }
    }
}

fn reply<T: Serialize>(result: Result<T>, status: StatusCode) -> Response {
    match result {
        Ok(value) => warp::reply::with_status(warp::reply::json(&value), status).into_response(),
        Err(e) => {
            tracing::info!("Request failed: {}", e);
            e.into_response()
        }
    }
}

// Runs `f` against one session while holding its lock. The manager lock is
// released before the session lock is taken.
fn with_session<T, F>(sessions: &Sessions, id: &str, f: F) -> Result<T>
where
    F: FnOnce(&mut Session) -> Result<T>,
{
    let session = acquire(sessions)?.get_session(id)?;
    let mut session = acquire(&session)?;
    f(&mut session)
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value.ok_or_else(|| {
        ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            format!("Missing {} argument", name),
        )
    })
}

#[instrument(name = "handlers.get_version", level = "info")]
pub(crate) fn get_version() -> Response {
    warp::reply::with_status(
        warp::reply::json(&env!("CARGO_PKG_VERSION").to_string()),
        StatusCode::OK,
    )
    .into_response()
}

#[instrument(name = "handlers.backend_health", level = "info", skip(backend))]
pub(crate) async fn backend_health(
    backend: SharedBackend,
) -> std::result::Result<Response, Infallible> {
    Ok(reply(backend.health().await, StatusCode::OK))
}

#[instrument(name = "handlers.list_sessions", level = "info", skip(sessions))]
pub(crate) fn list_sessions(sessions: Sessions) -> Response {
    let listed = acquire(&sessions).map(|manager| {
        tracing::debug!("{} live sessions", manager.len());
        manager.list()
    });
    reply(listed, StatusCode::OK)
}

#[instrument(name = "handlers.create_session", level = "info", skip(sessions), fields(seed = %seed))]
pub(crate) fn create_session(sessions: Sessions, seed: bool) -> Response {
    let created = acquire(&sessions).and_then(|mut manager| manager.create_session(seed));
    reply(created, StatusCode::CREATED)
}

#[instrument(name = "handlers.drop_session", level = "info", skip(sessions), fields(session = %id))]
pub(crate) fn drop_session(sessions: Sessions, id: String) -> Response {
    let dropped = acquire(&sessions)
        .and_then(|mut manager| manager.drop_session(&id))
        .map(|_| format!("Session {} dropped.", id));
    reply(dropped, StatusCode::OK)
}

#[instrument(name = "handlers.get_tree", level = "info", skip(sessions), fields(session = %id))]
pub(crate) fn get_tree(sessions: Sessions, id: String) -> Response {
    let tree = with_session(&sessions, &id, |session| Ok(session.snapshot()));
    reply(tree, StatusCode::OK)
}

#[instrument(
    name = "handlers.list_path",
    level = "info",
    skip(sessions),
    fields(
        session = %id,
        path = format!("{:?}", path)
    )
)]
pub(crate) fn list_path(sessions: Sessions, id: String, path: Option<String>) -> Response {
    let listing = with_session(&sessions, &id, |session| session.list(path.as_deref()));
    reply(listing, StatusCode::OK)
}

#[instrument(
    name = "handlers.search",
    level = "info",
    skip(sessions),
    fields(
        session = %id,
        pattern = format!("{:?}", pattern)
    )
)]
pub(crate) fn search(sessions: Sessions, id: String, pattern: Option<String>) -> Response {
    let found = required(pattern, "pattern")
        .and_then(|pattern| with_session(&sessions, &id, |session| session.search(&pattern)));
    reply(found, StatusCode::OK)
}

#[instrument(
    name = "handlers.get_file",
    level = "info",
    skip(sessions),
    fields(
        session = %id,
        path = format!("{:?}", path)
    )
)]
pub(crate) fn get_file(sessions: Sessions, id: String, path: Option<String>) -> Response {
    let node = required(path, "path")
        .and_then(|path| with_session(&sessions, &id, |session| session.find(&path)));
    reply(node, StatusCode::OK)
}

#[instrument(
    name = "handlers.create_file",
    level = "info",
    skip(sessions, body),
    fields(
        session = %id,
        path = %body.path
    )
)]
pub(crate) fn create_file(sessions: Sessions, id: String, body: FileBody) -> Response {
    let node = with_session(&sessions, &id, |session| {
        session.create_file(&body.path, &body.content)
    });
    reply(node, StatusCode::CREATED)
}

#[instrument(
    name = "handlers.save_file",
    level = "info",
    skip(sessions, body),
    fields(
        session = %id,
        path = %body.path
    )
)]
pub(crate) fn save_file(sessions: Sessions, id: String, body: FileBody) -> Response {
    let node = with_session(&sessions, &id, |session| {
        session.save(&body.path, &body.content)?;
        session.find(&body.path)
    });
    reply(node, StatusCode::OK)
}

#[instrument(
    name = "handlers.delete_file",
    level = "info",
    skip(sessions),
    fields(
        session = %id,
        path = format!("{:?}", path)
    )
)]
pub(crate) fn delete_file(sessions: Sessions, id: String, path: Option<String>) -> Response {
    let removed = required(path, "path").and_then(|path| {
        with_session(&sessions, &id, |session| {
            Ok(serde_json::json!({ "removed": session.delete(&path) }))
        })
    });
    reply(removed, StatusCode::OK)
}

#[instrument(
    name = "handlers.create_folder",
    level = "info",
    skip(sessions, body),
    fields(
        session = %id,
        path = %body.path
    )
)]
pub(crate) fn create_folder(sessions: Sessions, id: String, body: PathBody) -> Response {
    let node = with_session(&sessions, &id, |session| session.create_folder(&body.path));
    reply(node, StatusCode::CREATED)
}

#[instrument(
    name = "handlers.move_file",
    level = "info",
    skip(sessions, body),
    fields(
        session = %id,
        from = %body.from,
        to = %body.to
    )
)]
pub(crate) fn move_file(sessions: Sessions, id: String, body: MoveBody) -> Response {
    let node = with_session(&sessions, &id, |session| session.rename(&body.from, &body.to));
    reply(node, StatusCode::OK)
}

#[instrument(name = "handlers.get_editor", level = "info", skip(sessions), fields(session = %id))]
pub(crate) fn get_editor(sessions: Sessions, id: String) -> Response {
    let editor = with_session(&sessions, &id, |session| {
        Ok(EditorView::from(session.editor()))
    });
    reply(editor, StatusCode::OK)
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum EditorAction {
    Open,
    Close,
    Select,
}

#[instrument(
    name = "handlers.update_editor",
    level = "info",
    skip(sessions, body),
    fields(
        session = %id,
        action = ?action,
        path = %body.path
    )
)]
pub(crate) fn update_editor(
    sessions: Sessions,
    id: String,
    action: EditorAction,
    body: PathBody,
) -> Response {
    let editor = with_session(&sessions, &id, |session| {
        match action {
            EditorAction::Open => session.open(&body.path)?,
            EditorAction::Close => {
                if !session.close(&body.path) {
                    tracing::debug!("{} was not open", body.path);
                }
            }
            EditorAction::Select => session.select(&body.path)?,
        }
        Ok(EditorView::from(session.editor()))
    });
    reply(editor, StatusCode::OK)
}

#[instrument(name = "handlers.get_messages", level = "info", skip(sessions), fields(session = %id))]
pub(crate) fn get_messages(sessions: Sessions, id: String) -> Response {
    let messages = with_session(&sessions, &id, |session| Ok(session.messages().to_vec()));
    reply(messages, StatusCode::OK)
}

#[instrument(
    name = "handlers.generate",
    level = "info",
    skip(sessions, backend, body),
    fields(session = %id)
)]
pub(crate) async fn generate(
    sessions: Sessions,
    backend: SharedBackend,
    id: String,
    body: PromptBody,
) -> std::result::Result<Response, Infallible> {
    let prompt = body.prompt.trim().to_string();
    if prompt.is_empty() {
        let e = ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            "Prompt must not be empty".to_string(),
        );
        return Ok(e.into_response());
    }
    let session = match acquire(&sessions).and_then(|manager| manager.get_session(&id)) {
        Ok(session) => session,
        Err(e) => return Ok(e.into_response()),
    };
    if let Err(e) = acquire(&session).map(|mut session| session.record_prompt(&prompt)) {
        return Ok(e.into_response());
    }

    // No lock is held while the backend works
    let outcome = backend.generate(&prompt).await;

    let applied = acquire(&session).and_then(|mut session| {
        let message = session.apply_generation(outcome)?;
        Ok(serde_json::json!({
            "message": message,
            "tree": session.snapshot(),
        }))
    });
    Ok(reply(applied, StatusCode::OK))
}

#[instrument(name = "handlers.list_documents", level = "info", skip(backend))]
pub(crate) async fn list_documents(
    backend: SharedBackend,
) -> std::result::Result<Response, Infallible> {
    Ok(reply(backend.list_documents().await, StatusCode::OK))
}

#[instrument(
    name = "handlers.upload_document",
    level = "info",
    skip(backend, data),
    fields(
        filename = format!("{:?}", filename),
        size = data.len()
    )
)]
pub(crate) async fn upload_document(
    backend: SharedBackend,
    filename: Option<String>,
    data: Bytes,
) -> std::result::Result<Response, Infallible> {
    let filename = match required(filename, "filename") {
        Ok(filename) => filename,
        Err(e) => return Ok(e.into_response()),
    };
    let uploaded = backend.upload_document(&filename, data).await;
    Ok(reply(uploaded, StatusCode::CREATED))
}

#[instrument(name = "handlers.delete_document", level = "info", skip(backend), fields(document = %document_id))]
pub(crate) async fn delete_document(
    backend: SharedBackend,
    document_id: String,
) -> std::result::Result<Response, Infallible> {
    let deleted = backend
        .delete_document(&document_id)
        .await
        .map(|_| format!("Document {} deleted.", document_id));
    Ok(reply(deleted, StatusCode::OK))
}

#[instrument(name = "handlers.query_documents", level = "info", skip(backend, request))]
pub(crate) async fn query_documents(
    backend: SharedBackend,
    request: QueryRequest,
) -> std::result::Result<Response, Infallible> {
    if request.query.trim().is_empty() {
        let e = ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            "Query must not be empty".to_string(),
        );
        return Ok(e.into_response());
    }
    Ok(reply(backend.query(&request).await, StatusCode::OK))
}
