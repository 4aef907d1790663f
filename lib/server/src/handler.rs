use crate::query::Query;
use crate::{ops, ApiError};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode, Uri};
use serde_json::{json, Value};
use std::sync::Arc;
use vtfs_store::Store;

#[derive(Debug)]
pub struct SharedState {
    pub(crate) store: Store,
    /// When set, requests must carry exactly this token.
    pub(crate) token: Option<String>,
}

/// Handler which will process remote store requests
#[derive(Clone, Debug)]
pub struct Handler(Arc<SharedState>);

impl Handler {
    pub fn new(store: Store, token: Option<String>) -> Self {
        Handler(Arc::new(SharedState { store, token }))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Answer one request. Store calls are short and synchronous, so
    /// this runs inline on the connection task.
    #[tracing::instrument(level = "debug", skip_all, fields(op = uri.path()))]
    pub fn handle(&self, uri: &Uri) -> Response<Full<Bytes>> {
        let query = Query::parse(uri.query().unwrap_or_default());

        match self.dispatch(uri.path(), &query) {
            Ok(result) => reply(StatusCode::OK, json!({ "result": result })),
            Err(err) => {
                tracing::debug!(error = %err, code = err.code(), "request failed");
                reply(err.status(), json!({ "error": err.code() }))
            }
        }
    }

    fn dispatch(&self, path: &str, query: &Query) -> Result<Value, ApiError> {
        self.authorize(query)?;

        let store = &self.store;
        match path {
            "/list" => ops::list(store, query),
            "/create" => ops::create(store, query),
            "/delete" => ops::delete(store, query),
            "/read" => ops::read(store, query),
            "/write" => ops::write(store, query),
            "/stat" => ops::stat(store, query),
            "/link" => ops::link(store, query),
            _ => Err(ApiError::UnknownOperation),
        }
    }

    fn authorize(&self, query: &Query) -> Result<(), ApiError> {
        match (query.get("token"), &self.token) {
            (None, _) | (Some(""), _) => Err(ApiError::AccessDenied),
            (Some(token), Some(expected)) if token != expected => Err(ApiError::AccessDenied),
            _ => Ok(()),
        }
    }
}

impl std::ops::Deref for Handler {
    type Target = Arc<SharedState>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn reply(status: StatusCode, body: Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
