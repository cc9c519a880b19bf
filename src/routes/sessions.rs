use super::{Sessions, SharedBackend};
use crate::handlers;
use std::collections::HashMap;
use warp::Filter;

pub(super) fn routes(
    sessions: Sessions,
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    version()
        .or(health(backend.clone()))
        .or(sessions_list(sessions.clone()))
        .or(sessions_create(sessions.clone()))
        .or(sessions_drop(sessions.clone()))
        .or(session_tree(sessions.clone()))
        .or(session_list_path(sessions.clone()))
        .or(session_search(sessions.clone()))
        .or(session_messages(sessions.clone()))
        .or(session_generate(sessions.clone(), backend.clone()))
}

fn version() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("version")
        .and(warp::get())
        .map(handlers::get_version)
}

fn health(
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("health")
        .and(warp::get())
        .and_then(move || handlers::backend_health(backend.clone()))
}

fn sessions_list(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions")
        .and(warp::get())
        .map(move || handlers::list_sessions(sessions.clone()))
}

fn sessions_create(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions")
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .map(move |params: HashMap<String, String>| {
            let seed = match params.get("seed") {
                Some(seed) => seed.parse::<bool>().unwrap_or(true),
                None => true,
            };
            handlers::create_session(sessions.clone(), seed)
        })
}

fn sessions_drop(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String)
        .and(warp::delete())
        .map(move |id| handlers::drop_session(sessions.clone(), id))
}

fn session_tree(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "tree")
        .and(warp::get())
        .map(move |id| handlers::get_tree(sessions.clone(), id))
}

fn session_list_path(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "list")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .map(move |id, mut params: HashMap<String, String>| {
            handlers::list_path(sessions.clone(), id, params.remove("path"))
        })
}

fn session_search(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "search")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .map(move |id, mut params: HashMap<String, String>| {
            handlers::search(sessions.clone(), id, params.remove("pattern"))
        })
}

fn session_messages(
    sessions: Sessions,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "messages")
        .and(warp::get())
        .map(move |id| handlers::get_messages(sessions.clone(), id))
}

fn session_generate(
    sessions: Sessions,
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("sessions" / String / "generate")
        .and(warp::post())
        .and(warp::body::json())
        .and_then(move |id, body| {
            handlers::generate(sessions.clone(), backend.clone(), id, body)
        })
}
