use super::Sessions;
use crate::handlers::{self, EditorAction};
use warp::Filter;

pub(super) fn routes(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    editor_get(sessions.clone())
        .or(editor_update(sessions.clone(), "open", EditorAction::Open))
        .or(editor_update(sessions.clone(), "close", EditorAction::Close))
        .or(editor_update(sessions.clone(), "select", EditorAction::Select))
}

fn editor_get(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "editor")
        .and(warp::get())
        .map(move |id| handlers::get_editor(sessions.clone(), id))
}

fn editor_update(
    sessions: Sessions,
    segment: &'static str,
    action: EditorAction,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("sessions")
        .and(warp::path::param::<String>())
        .and(warp::path("editor"))
        .and(warp::path(segment))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .map(move |id, body| handlers::update_editor(sessions.clone(), id, action, body))
}
