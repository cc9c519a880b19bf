use super::SharedBackend;
use crate::backend::MAX_UPLOAD_BYTES;
use crate::handlers;
use bytes::Bytes;
use std::collections::HashMap;
use warp::Filter;

pub(super) fn routes(
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    documents_list(backend.clone())
        .or(documents_upload(backend.clone()))
        .or(documents_query(backend.clone()))
        .or(documents_delete(backend.clone()))
}

fn documents_list(
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("documents")
        .and(warp::get())
        .and_then(move || handlers::list_documents(backend.clone()))
}

fn documents_upload(
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("documents")
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::body::content_length_limit(MAX_UPLOAD_BYTES as u64))
        .and(warp::body::bytes())
        .and_then(move |mut params: HashMap<String, String>, data: Bytes| {
            handlers::upload_document(backend.clone(), params.remove("filename"), data)
        })
}

fn documents_delete(
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("documents" / String)
        .and(warp::delete())
        .and_then(move |id| handlers::delete_document(backend.clone(), id))
}

fn documents_query(
    backend: SharedBackend,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("documents" / "query")
        .and(warp::post())
        .and(warp::body::json())
        .and_then(move |request| handlers::query_documents(backend.clone(), request))
}
