mod documents;
mod editor;
mod files;
mod sessions;

use crate::backend::Backend;
use crate::errors::{ConsoleError, ConsoleErrorType};
use crate::session::SessionManager;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

pub(crate) type Sessions = Arc<Mutex<SessionManager>>;
pub(crate) type SharedBackend = Arc<dyn Backend>;

pub(crate) fn routes(
    sessions: Sessions,
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    sessions::routes(sessions.clone(), backend.clone())
        .or(files::routes(sessions.clone()))
        .or(editor::routes(sessions.clone()))
        .or(documents::routes(backend.clone()))
        .recover(handle_rejection)
}

// Anything warp rejects on its own still answers with the usual error body.
async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let error = if err.is_not_found() {
        ConsoleError::not_found("No such endpoint".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ConsoleError::new(ConsoleErrorType::InvalidRequest, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        ConsoleError::new(ConsoleErrorType::InvalidRequest, e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            "Upload exceeds the 10 MiB limit".to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            "A Content-Length header is required".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            "Method not allowed".to_string(),
        )
    } else {
        tracing::warn!("Unhandled rejection: {:?}", err);
        ConsoleError::new(ConsoleErrorType::InvalidRequest, "Invalid request".to_string())
    };
    Ok(error.into_response())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::backend::{
        validate_document_id, validate_upload, DocumentInfo, GeneratedSite, QueryRequest,
        QueryResponse, UploadResponse,
    };
    use crate::errors::Result;
    use crate::fsystem::FlatFile;
    use async_trait::async_trait;
    use bytes::Bytes;

    /// Backend double. Generation either returns `files` or fails with
    /// `failure`; documents are a fixed single entry.
    pub(crate) struct FakeBackend {
        pub(crate) files: Vec<(&'static str, &'static str)>,
        pub(crate) failure: Option<&'static str>,
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn generate(&self, _prompt: &str) -> Result<GeneratedSite> {
            if let Some(failure) = self.failure {
                return Err(ConsoleError::upstream(failure.to_string()));
            }
            Ok(GeneratedSite {
                files: self
                    .files
                    .iter()
                    .map(|(path, content)| FlatFile {
                        path: path.to_string(),
                        content: content.to_string(),
                    })
                    .collect(),
                files_written: self.files.iter().map(|(path, _)| path.to_string()).collect(),
                total_files: self.files.len(),
            })
        }

        async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
            Ok(vec![DocumentInfo {
                document_id: "doc-1".to_string(),
                filename: "notes.md".to_string(),
                upload_date: "2024-05-01T10:00:00".to_string(),
                file_size: 120,
                file_type: ".md".to_string(),
                chunks_count: 3,
            }])
        }

        async fn upload_document(&self, filename: &str, data: Bytes) -> Result<UploadResponse> {
            validate_upload(filename, data.len())?;
            Ok(UploadResponse {
                document_id: "doc-2".to_string(),
                filename: filename.to_string(),
                chunks_processed: 1,
                message: "Document uploaded and processed successfully".to_string(),
            })
        }

        async fn delete_document(&self, document_id: &str) -> Result<()> {
            validate_document_id(document_id)?;
            if document_id != "doc-1" {
                return Err(ConsoleError::not_found(format!(
                    "Document {} not found",
                    document_id
                )));
            }
            Ok(())
        }

        async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
            Ok(QueryResponse {
                query: request.query.clone(),
                answer: "Forty-two".to_string(),
                sources: vec!["notes.md".to_string()],
                context_chunks: Vec::new(),
            })
        }

        async fn health(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({"status": "healthy"}))
        }
    }

    pub(crate) fn fake_backend() -> SharedBackend {
        Arc::new(FakeBackend {
            files: vec![("index.html", "<html></html>"), ("src/main.js", "console.log(1)")],
            failure: None,
        })
    }

    pub(crate) fn new_sessions() -> Sessions {
        Arc::new(Mutex::new(SessionManager::new()))
    }

    /// Create a session through the API and return its id.
    pub(crate) async fn create_session(
        filter: &(impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone + 'static),
        seed: bool,
    ) -> String {
        let response = warp::test::request()
            .method("POST")
            .path(&format!("/sessions?seed={}", seed))
            .reply(filter)
            .await;
        assert_eq!(response.status(), 201);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    pub(crate) fn json_body(response: &warp::http::Response<Bytes>) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_unknown_route() {
        let filter = routes(new_sessions(), fake_backend());
        let response = warp::test::request().path("/nowhere").reply(&filter).await;
        assert_eq!(response.status(), 404);
        assert_eq!(json_body(&response)["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let filter = routes(new_sessions(), fake_backend());
        let id = create_session(&filter, false).await;
        let response = warp::test::request()
            .method("POST")
            .path(&format!("/sessions/{}/files", id))
            .header("content-type", "application/json")
            .body("{\"content\": 1}")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 400);
        assert_eq!(json_body(&response)["error"], "InvalidRequest");
    }

    #[tokio::test]
    async fn test_version() {
        let filter = routes(new_sessions(), fake_backend());
        let response = warp::test::request().path("/version").reply(&filter).await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(&response), env!("CARGO_PKG_VERSION"));
    }
}
