// crates/catalog-server/src/routes.rs
// ============================================================================
// Module: HTTP Routes
// Description: axum handlers for items, activities, and cached entries.
// Purpose: Translate HTTP requests into engine calls and errors into statuses.
// Dependencies: catalog-config, catalog-core, axum, serde, serde_json
// ============================================================================

//! ## Overview
//! Item routes address records by path id. Activity routes address records
//! by query filter: `old_*` parameters select the target and unprefixed
//! parameters carry the new values. Every failure is answered with
//! `{"error": {"kind", "message"}}` and a status derived from its kind.
//! Malformed paths, queries, and bodies are validation errors; bodies over
//! the configured limit are rejected with 413.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use catalog_config::validate_resource_path;
use catalog_core::ActivityCategory;
use catalog_core::ActivityPatch;
use catalog_core::CacheKey;
use catalog_core::CacheOutcome;
use catalog_core::CatalogError;
use catalog_core::Category;
use catalog_core::Item;
use catalog_core::ItemPatch;
use catalog_core::Record;
use catalog_core::RecordId;
use catalog_core::UpsertOutcome;
use catalog_core::Weekday;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::audit::CacheAuditEvent;
use crate::audit::CacheAuditOutcome;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::server::ServerState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cache key class for upstream entries.
pub const ENTRY_CACHE_CLASS: &str = "entries";
/// Response header reporting whether an entry came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-catalog-cache";

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the catalog router over shared state.
pub(crate) fn router(state: Arc<ServerState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/select", get(select_items))
        .route(
            "/items/{id}",
            get(get_item).put(upsert_item).patch(update_item).delete(delete_item),
        )
        .route(
            "/activities",
            get(list_activities)
                .post(create_activity)
                .put(upsert_activity)
                .patch(update_activity)
                .delete(delete_activity),
        )
        .route("/activities/select", get(select_activities))
        .route("/activities/{id}", get(get_activity))
        .route("/entries", get(get_default_entry))
        .route("/entries/{*path}", get(get_entry))
        .fallback(unknown_route)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

// ============================================================================
// SECTION: Query Types
// ============================================================================

/// Item fields accepted as query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemQuery {
    /// Item name.
    pub name: Option<String>,
    /// Unit price.
    pub price: Option<f64>,
    /// Units in stock.
    pub count: Option<u64>,
    /// Item category.
    pub category: Option<Category>,
}

impl ItemQuery {
    /// Converts the query into a patch without an id.
    fn into_patch(self) -> ItemPatch {
        ItemPatch {
            id: None,
            name: self.name,
            price: self.price,
            count: self.count,
            category: self.category,
        }
    }
}

/// Activity target filter (`old_*`) and new values, as query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityChangeQuery {
    /// Target id.
    pub old_id: Option<RecordId>,
    /// Target name.
    pub old_name: Option<String>,
    /// Target duration.
    pub old_duration: Option<u32>,
    /// Target teacher.
    pub old_teacher: Option<String>,
    /// Target room.
    pub old_room: Option<String>,
    /// Target day.
    pub old_day: Option<Weekday>,
    /// Target hour.
    pub old_hour: Option<u8>,
    /// Target category.
    pub old_category: Option<ActivityCategory>,
    /// New id.
    pub id: Option<RecordId>,
    /// New name.
    pub name: Option<String>,
    /// New duration.
    pub duration: Option<u32>,
    /// New teacher.
    pub teacher: Option<String>,
    /// New room.
    pub room: Option<String>,
    /// New day.
    pub day: Option<Weekday>,
    /// New hour.
    pub hour: Option<u8>,
    /// New category.
    pub category: Option<ActivityCategory>,
}

impl ActivityChangeQuery {
    /// Splits the query into the target filter and the new values.
    fn split(self) -> (ActivityPatch, ActivityPatch) {
        let old = ActivityPatch {
            id: self.old_id,
            name: self.old_name,
            duration: self.old_duration,
            teacher: self.old_teacher,
            room: self.old_room,
            day: self.old_day,
            hour: self.old_hour,
            category: self.old_category,
        };
        let new = ActivityPatch {
            id: self.id,
            name: self.name,
            duration: self.duration,
            teacher: self.teacher,
            room: self.room,
            day: self.day,
            hour: self.hour,
            category: self.category,
        };
        (old, new)
    }
}

// ============================================================================
// SECTION: Item Handlers
// ============================================================================

/// `GET /items`
async fn list_items(State(state): State<Arc<ServerState>>) -> Response {
    let result = run_blocking(|| state.items.list())
        .map(|items| Reply::json(json!({ "items": items })))
        .map_err(ApiError::from);
    finish(&state, "GET", "/items", result)
}

/// `GET /items/select`
async fn select_items(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> Response {
    let result = query.map_err(ApiError::from).and_then(|Query(query)| {
        let patch = query.clone().into_patch();
        let selection = run_blocking(|| state.items.select(&patch))?;
        Ok(Reply::json(json!({ "query": query, "selection": selection })))
    });
    finish(&state, "GET", "/items/select", result)
}

/// `GET /items/{id}`
async fn get_item(
    State(state): State<Arc<ServerState>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let result = path_id(id).and_then(|id| {
        let item = run_blocking(|| state.items.get(id))?;
        Reply::record(None, &item)
    });
    finish(&state, "GET", "/items/{id}", result)
}

/// `POST /items`
async fn create_item(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<Item>, JsonRejection>,
) -> Response {
    let result = body.map_err(ApiError::from).and_then(|Json(item)| {
        let item = run_blocking(|| state.items.insert(item))?;
        Reply::record(Some("added"), &item)
    });
    finish(&state, "POST", "/items", result)
}

/// `PUT /items/{id}`
async fn upsert_item(
    State(state): State<Arc<ServerState>>,
    id: Result<Path<u64>, PathRejection>,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> Response {
    let result = path_id(id).and_then(|id| {
        let Query(query) = query?;
        let outcome = run_blocking(|| state.items.upsert(id, &query.into_patch()))?;
        Reply::outcome(&outcome)
    });
    finish(&state, "PUT", "/items/{id}", result)
}

/// `PATCH /items/{id}`
async fn update_item(
    State(state): State<Arc<ServerState>>,
    id: Result<Path<u64>, PathRejection>,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> Response {
    let result = path_id(id).and_then(|id| {
        let Query(query) = query?;
        let item = run_blocking(|| state.items.update(id, &query.into_patch()))?;
        Reply::record(Some("updated"), &item)
    });
    finish(&state, "PATCH", "/items/{id}", result)
}

/// `DELETE /items/{id}`
async fn delete_item(
    State(state): State<Arc<ServerState>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let result = path_id(id).and_then(|id| {
        let item = run_blocking(|| state.items.delete(id))?;
        Reply::record(Some("deleted"), &item)
    });
    finish(&state, "DELETE", "/items/{id}", result)
}

// ============================================================================
// SECTION: Activity Handlers
// ============================================================================

/// `GET /activities`
async fn list_activities(State(state): State<Arc<ServerState>>) -> Response {
    let result = run_blocking(|| state.activities.list())
        .map(|activities| Reply::json(json!({ "activities": activities })))
        .map_err(ApiError::from);
    finish(&state, "GET", "/activities", result)
}

/// `GET /activities/select`
async fn select_activities(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<ActivityPatch>, QueryRejection>,
) -> Response {
    let result = query.map_err(ApiError::from).and_then(|Query(filter)| {
        let selection = run_blocking(|| state.activities.select(&filter))?;
        Ok(Reply::json(json!({ "query": filter, "selection": selection })))
    });
    finish(&state, "GET", "/activities/select", result)
}

/// `GET /activities/{id}`
async fn get_activity(
    State(state): State<Arc<ServerState>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let result = path_id(id).and_then(|id| {
        let activity = run_blocking(|| state.activities.get(id))?;
        Reply::record(None, &activity)
    });
    finish(&state, "GET", "/activities/{id}", result)
}

/// `POST /activities`
async fn create_activity(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<ActivityPatch>, JsonRejection>,
) -> Response {
    let result = body.map_err(ApiError::from).and_then(|Json(patch)| {
        let activity = run_blocking(|| state.activities.create_unique(&patch))?;
        Reply::record(Some("added"), &activity)
    });
    finish(&state, "POST", "/activities", result)
}

/// `PUT /activities`
async fn upsert_activity(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<ActivityChangeQuery>, QueryRejection>,
) -> Response {
    let result = query.map_err(ApiError::from).and_then(|Query(query)| {
        let (old, new) = query.split();
        let outcome = run_blocking(|| state.activities.upsert_matching(&old, &new))?;
        Reply::outcome(&outcome)
    });
    finish(&state, "PUT", "/activities", result)
}

/// `PATCH /activities`
async fn update_activity(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<ActivityChangeQuery>, QueryRejection>,
) -> Response {
    let result = query.map_err(ApiError::from).and_then(|Query(query)| {
        let (old, new) = query.split();
        let activity = run_blocking(|| state.activities.update_matching(&old, &new))?;
        Reply::record(Some("updated"), &activity)
    });
    finish(&state, "PATCH", "/activities", result)
}

/// `DELETE /activities`
async fn delete_activity(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<ActivityPatch>, QueryRejection>,
) -> Response {
    let result = query.map_err(ApiError::from).and_then(|Query(filter)| {
        let activity = run_blocking(|| state.activities.delete_matching(&filter))?;
        Reply::record(Some("deleted"), &activity)
    });
    finish(&state, "DELETE", "/activities", result)
}

// ============================================================================
// SECTION: Entry Handlers
// ============================================================================

/// `GET /entries`
async fn get_default_entry(State(state): State<Arc<ServerState>>) -> Response {
    let result = lookup_entry(&state, &state.default_path);
    finish(&state, "GET", "/entries", result)
}

/// `GET /entries/{*path}`
async fn get_entry(
    State(state): State<Arc<ServerState>>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let result = path.map_err(ApiError::from).and_then(|Path(path)| lookup_entry(&state, &path));
    finish(&state, "GET", "/entries/{*path}", result)
}

/// Resolves an upstream entry through the cache-aside gateway.
fn lookup_entry(state: &ServerState, path: &str) -> Result<Reply, ApiError> {
    validate_resource_path(path)
        .map_err(|reason| CatalogError::Validation(format!("resource path {reason}")))?;
    let key = CacheKey::new(ENTRY_CACHE_CLASS, path);
    let result = run_blocking(|| state.entries.lookup(&key));
    let event = match &result {
        Ok(lookup) => CacheAuditEvent::new(key.to_string(), lookup.outcome.into(), None),
        Err(err) => CacheAuditEvent::new(key.to_string(), CacheAuditOutcome::Error, Some(err.kind())),
    };
    state.audit.record_cache(&event);
    let lookup = result?;
    Ok(Reply {
        body: lookup.value,
        record_id: None,
        cache: Some(lookup.outcome),
    })
}

/// Fallback for unmatched routes.
async fn unknown_route(State(state): State<Arc<ServerState>>) -> Response {
    let result = Err(ApiError::from(CatalogError::NotFound("route not found".to_string())));
    finish(&state, "ANY", "*", result)
}

// ============================================================================
// SECTION: Replies
// ============================================================================

/// Successful handler output.
struct Reply {
    /// JSON response body.
    body: Value,
    /// Record touched by the request, for auditing.
    record_id: Option<RecordId>,
    /// Cache outcome for entry lookups.
    cache: Option<CacheOutcome>,
}

impl Reply {
    /// Wraps an arbitrary JSON body.
    const fn json(body: Value) -> Self {
        Self {
            body,
            record_id: None,
            cache: None,
        }
    }

    /// Serializes a record, optionally under a single label key.
    fn record<R: Record>(label: Option<&'static str>, record: &R) -> Result<Self, ApiError> {
        let value = serde_json::to_value(record).map_err(|err| {
            CatalogError::Store(format!("failed to encode {} {}: {err}", R::RESOURCE, record.id()))
        })?;
        let body = match label {
            Some(label) => {
                let mut object = Map::new();
                object.insert(label.to_string(), value);
                Value::Object(object)
            }
            None => value,
        };
        Ok(Self {
            body,
            record_id: Some(record.id()),
            cache: None,
        })
    }

    /// Serializes an upsert outcome under its `updated` or `added` label.
    fn outcome<R: Record>(outcome: &UpsertOutcome<R>) -> Result<Self, ApiError> {
        Self::record(Some(outcome.label()), outcome.record())
    }
}

/// Records the audit event and renders the response.
fn finish(
    state: &ServerState,
    method: &'static str,
    route: &'static str,
    result: Result<Reply, ApiError>,
) -> Response {
    let (status, error_kind, record_id) = match &result {
        Ok(reply) => (StatusCode::OK, None, reply.record_id),
        Err(err) => (err.status, Some(err.kind), None),
    };
    state.audit.record(&RequestAuditEvent::new(RequestAuditEventParams {
        method,
        route,
        status: status.as_u16(),
        error_kind,
        record_id: record_id.map(RecordId::get),
    }));
    match result {
        Ok(reply) => {
            let mut response = (StatusCode::OK, Json(reply.body)).into_response();
            if let Some(outcome) = reply.cache {
                response.headers_mut().insert(
                    HeaderName::from_static(CACHE_STATUS_HEADER),
                    HeaderValue::from_static(outcome.as_str()),
                );
            }
            response
        }
        Err(err) => err.into_response(),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// HTTP-facing error with its status and stable kind label.
#[derive(Debug)]
struct ApiError {
    /// Response status.
    status: StatusCode,
    /// Stable error kind label.
    kind: &'static str,
    /// Human-readable message.
    message: String,
    /// Missing mandatory fields for incomplete creates.
    missing: Vec<&'static str>,
}

impl ApiError {
    /// Builds an error for a rejected request extractor.
    fn rejection(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Self {
                status,
                kind: "payload_too_large",
                message,
                missing: Vec::new(),
            };
        }
        Self::from(CatalogError::Validation(message))
    }
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        let status = match &error {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Conflict(_) => StatusCode::CONFLICT,
            CatalogError::NoFieldsProvided
            | CatalogError::IncompleteForCreate {
                ..
            }
            | CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let missing = match &error {
            CatalogError::IncompleteForCreate {
                missing,
            } => missing.clone(),
            _ => Vec::new(),
        };
        Self {
            status,
            kind: error.kind(),
            message: error.to_string(),
            missing,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejection(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejection(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejection(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({ "kind": self.kind, "message": self.message });
        if !self.missing.is_empty()
            && let Some(object) = error.as_object_mut()
        {
            object.insert("missing".to_string(), json!(self.missing));
        }
        (self.status, Json(json!({ "error": error }))).into_response()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts a record id from a path segment.
fn path_id(id: Result<Path<u64>, PathRejection>) -> Result<RecordId, ApiError> {
    let Path(id) = id?;
    Ok(RecordId::new(id))
}

/// Runs a synchronous core call, shifting to a blocking context when available.
fn run_blocking<T>(call: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(call)
        }
        _ => call(),
    }
}
