use super::Sessions;
use crate::handlers;
use std::collections::HashMap;
use tracing::instrument;
use warp::Filter;

pub(super) fn routes(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    file_get(sessions.clone())
        .or(file_create(sessions.clone()))
        .or(file_save(sessions.clone()))
        .or(file_delete(sessions.clone()))
        .or(folder_create(sessions.clone()))
        .or(file_move(sessions.clone()))
}

#[instrument(skip(sessions))]
fn file_get(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "files")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .map(move |id, mut params: HashMap<String, String>| {
            handlers::get_file(sessions.clone(), id, params.remove("path"))
        })
}

#[instrument(skip(sessions))]
fn file_create(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "files")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |id, body| handlers::create_file(sessions.clone(), id, body))
}

#[instrument(skip(sessions))]
fn file_save(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "files")
        .and(warp::put())
        .and(warp::body::json())
        .map(move |id, body| handlers::save_file(sessions.clone(), id, body))
}

#[instrument(skip(sessions))]
fn file_delete(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "files")
        .and(warp::delete())
        .and(warp::query::<HashMap<String, String>>())
        .map(move |id, mut params: HashMap<String, String>| {
            handlers::delete_file(sessions.clone(), id, params.remove("path"))
        })
}

#[instrument(skip(sessions))]
fn folder_create(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "folders")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |id, body| handlers::create_folder(sessions.clone(), id, body))
}

#[instrument(skip(sessions))]
fn file_move(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "files" / "move")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |id, body| handlers::move_file(sessions.clone(), id, body))
}

#[cfg(test)]
mod tests {
    use super::super::routes;
    use super::super::testing::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_find() {
        let filter = routes(new_sessions(), fake_backend());
        let id = create_session(&filter, true).await;
        let files = format!("/sessions/{}/files", id);

        let response = warp::test::request()
            .method("POST")
            .path(&files)
            .json(&json!({"path": "src/components/New.tsx", "content": "// hi"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 201);
        assert_eq!(json_body(&response)["name"], "New.tsx");

        let response = warp::test::request()
            .path(&format!("{}?path=src/components/New.tsx", files))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(&response)["content"], "// hi");

        let response = warp::test::request()
            .method("POST")
            .path(&files)
            .json(&json!({"path": "src/components/New.tsx"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 409);
        assert_eq!(json_body(&response)["error"], "DuplicatePath");

        let response = warp::test::request()
            .method("POST")
            .path(&files)
            .json(&json!({"path": "../etc/passwd"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 400);
        assert_eq!(json_body(&response)["error"], "InvalidPath");
    }

    #[tokio::test]
    async fn test_save() {
        let filter = routes(new_sessions(), fake_backend());
        let id = create_session(&filter, true).await;
        let files = format!("/sessions/{}/files", id);

        let response = warp::test::request()
            .method("PUT")
            .path(&files)
            .json(&json!({"path": "src/App.tsx", "content": "X"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(&response)["content"], "X");

        let response = warp::test::request()
            .method("PUT")
            .path(&files)
            .json(&json!({"path": "src", "content": "X"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_delete_and_move() {
        let filter = routes(new_sessions(), fake_backend());
        let id = create_session(&filter, true).await;
        let files = format!("/sessions/{}/files", id);

        let response = warp::test::request()
            .method("POST")
            .path(&format!("/sessions/{}/folders", id))
            .json(&json!({"path": "src/lib"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 201);
        assert_eq!(json_body(&response)["type"], "folder");

        let response = warp::test::request()
            .method("POST")
            .path(&format!("{}/move", files))
            .json(&json!({"from": "src", "to": "app"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(&response)["children"][1]["path"], "app/lib");

        let response = warp::test::request()
            .method("POST")
            .path(&format!("{}/move", files))
            .json(&json!({"from": "app", "to": "app/inner"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 400);

        let response = warp::test::request()
            .method("DELETE")
            .path(&format!("{}?path=app", files))
            .reply(&filter)
            .await;
        assert_eq!(
            json_body(&response)["removed"],
            json!(["app", "app/App.tsx", "app/lib"])
        );

        // Deleting again is not an error
        let response = warp::test::request()
            .method("DELETE")
            .path(&format!("{}?path=app", files))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(&response)["removed"], json!([]));

        let response = warp::test::request()
            .path(&format!("/sessions/{}/editor", id))
            .reply(&filter)
            .await;
        assert_eq!(json_body(&response)["status"], "Empty");
    }
}
