//! In-process stand-in for a Supabase project.
//!
//! Implements the slice of `PostgREST`, `GoTrue` and Storage the API uses,
//! over in-memory JSON tables. Filters are evaluated the way `PostgREST`
//! would for the operators the repositories emit (`eq`, `neq`, `gte`, `lte`,
//! `is`, `in`, `ilike` and `or` groups). Row-level security is not modelled;
//! every request is recorded with its bearer token instead, so tests can
//! assert which credential a call used.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use serde_json::{Value, json};
use ushop_core::{Role, UserId};

/// Service role key the test config hands to the API.
pub const SERVICE_ROLE_KEY: &str = "test-service-role-key";

/// Anon key the test config hands to the API.
pub const ANON_KEY: &str = "test-anon-key";

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub bearer: Option<String>,
}

#[derive(Default)]
struct Store {
    tables: HashMap<String, Vec<Value>>,
    tokens: HashMap<String, Value>,
    objects: Vec<String>,
    requests: Vec<RecordedRequest>,
    /// Failing table, and whether reads fail too.
    fail: Option<(String, bool)>,
}

/// Handle to a running fake Supabase server.
#[derive(Clone)]
pub struct FakeSupabase {
    store: Arc<Mutex<Store>>,
    url: String,
}

impl FakeSupabase {
    /// Start the fake on an ephemeral port.
    pub async fn start() -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Supabase");
        let addr = listener.local_addr().expect("Fake Supabase has no address");
        let fake = Self {
            store,
            url: format!("http://{addr}"),
        };

        let app = Router::new()
            .route("/auth/v1/user", get(auth_user))
            .route("/rest/v1/", get(ping))
            .route("/rest/v1/{table}", any(rest))
            .route("/storage/v1/object/{*path}", post(upload))
            .with_state(fake.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake Supabase stopped");
        });
        fake
    }

    /// Base URL of the fake.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("Fake Supabase store poisoned")
    }

    /// Register an access token for a new user with a profile in `role`.
    pub fn add_user(&self, token: &str, role: Role) -> UserId {
        let id = UserId::random();
        let email = format!("{token}@example.test");
        let mut store = self.store();
        store
            .tokens
            .insert(token.to_string(), json!({ "id": id, "email": email }));
        store.insert(
            "profiles",
            json!({ "id": id, "email": email, "role": role.as_str() }),
        );
        id
    }

    /// Insert a row, filling `id` and `created_at` when absent.
    pub fn insert(&self, table: &str, row: Value) -> Value {
        self.store().insert(table, row)
    }

    /// All rows of `table`.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.store().tables.get(table).cloned().unwrap_or_default()
    }

    /// The row of `table` whose `id` is `id`.
    #[must_use]
    pub fn row(&self, table: &str, id: &impl ToString) -> Option<Value> {
        let id = id.to_string();
        self.rows(table)
            .into_iter()
            .find(|row| row.get("id").map(text).as_deref() == Some(id.as_str()))
    }

    /// Paths of uploaded Storage objects.
    #[must_use]
    pub fn objects(&self) -> Vec<String> {
        self.store().objects.clone()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.store().requests.clone()
    }

    /// Requests against one REST table.
    #[must_use]
    pub fn table_requests(&self, table: &str) -> Vec<RecordedRequest> {
        let path = format!("/rest/v1/{table}");
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.store().requests.clear();
    }

    /// Make every request against `table` fail with a 500.
    pub fn fail_table(&self, table: &str) {
        self.store().fail = Some((table.to_string(), true));
    }

    /// Make writes against `table` fail with a 500 while reads succeed.
    pub fn fail_writes(&self, table: &str) {
        self.store().fail = Some((table.to_string(), false));
    }

    /// Stop failing requests.
    pub fn heal(&self) {
        self.store().fail = None;
    }

    fn record(&self, method: Method, path: String, query: Option<&str>, headers: &HeaderMap) {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        self.store().requests.push(RecordedRequest {
            method,
            path,
            query: query.unwrap_or_default().to_string(),
            bearer,
        });
    }
}

impl Store {
    fn insert(&mut self, table: &str, mut row: Value) -> Value {
        if let Some(map) = row.as_object_mut() {
            map.entry("id")
                .or_insert_with(|| json!(uuid::Uuid::new_v4()));
            map.entry("created_at")
                .or_insert_with(|| json!(chrono::Utc::now()));
        }
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// Resolve `column` on `row`; `vendors.x` follows `row.vendor_id`.
    fn field(&self, row: &Value, column: &str) -> Value {
        if let Some(embedded) = column.strip_prefix("vendors.") {
            return self
                .vendor_of(row)
                .and_then(|v| v.get(embedded).cloned())
                .unwrap_or(Value::Null);
        }
        row.get(column).cloned().unwrap_or(Value::Null)
    }

    fn vendor_of(&self, row: &Value) -> Option<Value> {
        let vendor_id = row.get("vendor_id").map(text)?;
        self.tables
            .get("vendors")?
            .iter()
            .find(|v| v.get("id").map(text).as_deref() == Some(vendor_id.as_str()))
            .cloned()
    }

    fn matches(&self, row: &Value, condition: &Condition) -> bool {
        match condition {
            Condition::Or(any_of) => any_of.iter().any(|c| self.matches(row, c)),
            Condition::Op { column, op, value } => {
                let field = self.field(row, column);
                match op.as_str() {
                    "eq" => text(&field) == *value,
                    "neq" => text(&field) != *value,
                    "gte" => compare(&text(&field), value).is_ge() && !field.is_null(),
                    "lte" => compare(&text(&field), value).is_le() && !field.is_null(),
                    "is" => value == "null" && field.is_null(),
                    "in" => split_list(value).contains(&text(&field)),
                    "ilike" => {
                        let needle = unescape_like(value.trim_matches('*')).to_lowercase();
                        !field.is_null() && text(&field).to_lowercase().contains(&needle)
                    }
                    other => panic!("fake Supabase does not support operator {other}"),
                }
            }
        }
    }
}

// =============================================================================
// Query parsing
// =============================================================================

#[derive(Debug)]
enum Condition {
    Op {
        column: String,
        op: String,
        value: String,
    },
    Or(Vec<Condition>),
}

#[derive(Debug, Default)]
struct Query {
    select: Option<String>,
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    limit: Option<usize>,
    offset: usize,
    on_conflict: Option<Vec<String>>,
}

impl Query {
    fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let pairs = url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes());
        for (key, value) in pairs {
            match key.as_ref() {
                "select" => query.select = Some(value.into_owned()),
                "limit" => query.limit = value.parse().ok(),
                "offset" => query.offset = value.parse().unwrap_or(0),
                "on_conflict" => {
                    query.on_conflict = Some(value.split(',').map(str::to_string).collect());
                }
                "order" => {
                    query.order = value
                        .split(',')
                        .map(|part| {
                            let mut bits = part.split('.');
                            let column = bits.next().unwrap_or_default().to_string();
                            (column, bits.next() == Some("desc"))
                        })
                        .collect();
                }
                "or" => {
                    let inner = value.trim_start_matches('(').trim_end_matches(')');
                    let group = split_top_level(inner)
                        .into_iter()
                        .filter_map(|item| {
                            let (column, rest) = item.split_once('.')?;
                            parse_op(column, rest)
                        })
                        .collect();
                    query.conditions.push(Condition::Or(group));
                }
                column => {
                    if let Some(condition) = parse_op(column, &value) {
                        query.conditions.push(condition);
                    }
                }
            }
        }
        query
    }

    fn embeds_vendor(&self) -> bool {
        self.select
            .as_deref()
            .is_some_and(|s| s.contains("vendors(") || s.contains("vendors!inner("))
    }
}

fn parse_op(column: &str, raw: &str) -> Option<Condition> {
    let (op, value) = raw.split_once('.')?;
    Some(Condition::Op {
        column: column.to_string(),
        op: op.to_string(),
        value: unquote(value),
    })
}

/// Split on commas that are not inside double quotes or parentheses.
fn split_top_level(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut depth = 0usize;
    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '(' if !in_quotes => {
                depth += 1;
                current.push(c);
            }
            ')' if !in_quotes => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if !in_quotes && depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn unescape_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn split_list(value: &str) -> Vec<String> {
    let inner = value.trim_start_matches('(').trim_end_matches(')');
    split_top_level(inner).iter().map(|v| unquote(v)).collect()
}

/// Text form of a JSON value, as `PostgREST` compares it.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn compare(left: &str, right: &str) -> std::cmp::Ordering {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(std::cmp::Ordering::Equal),
        _ => left.cmp(right),
    }
}

fn merge(row: &mut Value, patch: &Value) {
    if let (Some(row), Some(patch)) = (row.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            row.insert(key.clone(), value.clone());
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn ping(State(fake): State<FakeSupabase>, headers: HeaderMap) -> Json<Value> {
    fake.record(Method::GET, "/rest/v1/".to_string(), None, &headers);
    Json(json!({}))
}

async fn auth_user(State(fake): State<FakeSupabase>, headers: HeaderMap) -> Response {
    fake.record(Method::GET, "/auth/v1/user".to_string(), None, &headers);
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    match fake.store().tokens.get(token) {
        Some(user) => Json(user.clone()).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": 401, "msg": "invalid JWT: token is expired" })),
        )
            .into_response(),
    }
}

async fn upload(
    State(fake): State<FakeSupabase>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    fake.record(
        Method::POST,
        format!("/storage/v1/object/{path}"),
        None,
        &headers,
    );
    fake.store().objects.push(path.clone());
    Json(json!({ "Key": path }))
}

async fn rest(
    State(fake): State<FakeSupabase>,
    method: Method,
    Path(table): Path<String>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    fake.record(
        method.clone(),
        format!("/rest/v1/{table}"),
        raw.as_deref(),
        &headers,
    );
    let failing = fake
        .store()
        .fail
        .as_ref()
        .is_some_and(|(t, reads)| *t == table && (*reads || method != Method::GET));
    if failing {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "code": "XX000", "message": "simulated failure" })),
        )
            .into_response();
    }

    let query = Query::parse(raw.as_deref());
    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "code": "PGRST102", "message": e.to_string() })),
                )
                    .into_response();
            }
        }
    };

    let mut store = fake.store();
    match method {
        Method::GET => Json(select(&store, &table, &query)).into_response(),
        Method::HEAD => {
            let total = matching(&store, &table, &query).len();
            let range = if total == 0 {
                "*/0".to_string()
            } else {
                format!("0-{}/{total}", total - 1)
            };
            let mut response = StatusCode::OK.into_response();
            if let Ok(value) = HeaderValue::from_str(&range) {
                response.headers_mut().insert("content-range", value);
            }
            response
        }
        Method::POST => insert(&mut store, &table, &query, body),
        Method::PATCH => {
            let indexes = matching(&store, &table, &query);
            let rows = store.tables.entry(table).or_default();
            let mut updated = Vec::new();
            for i in indexes {
                if let Some(row) = rows.get_mut(i) {
                    merge(row, &body);
                    updated.push(row.clone());
                }
            }
            Json(Value::Array(updated)).into_response()
        }
        Method::DELETE => {
            let indexes = matching(&store, &table, &query);
            if let Some(rows) = store.tables.get_mut(&table) {
                let mut i = 0;
                rows.retain(|_| {
                    let keep = !indexes.contains(&i);
                    i += 1;
                    keep
                });
            }
            StatusCode::NO_CONTENT.into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Indexes of rows matching every condition.
fn matching(store: &Store, table: &str, query: &Query) -> Vec<usize> {
    store
        .tables
        .get(table)
        .map(|rows| {
            rows.iter()
                .enumerate()
                .filter(|(_, row)| query.conditions.iter().all(|c| store.matches(row, c)))
                .map(|(i, _)| i)
                .collect()
        })
        .unwrap_or_default()
}

fn select(store: &Store, table: &str, query: &Query) -> Value {
    let rows = store.tables.get(table).cloned().unwrap_or_default();
    let mut selected: Vec<Value> = matching(store, table, query)
        .into_iter()
        .filter_map(|i| rows.get(i).cloned())
        .collect();

    for (column, desc) in query.order.iter().rev() {
        selected.sort_by(|a, b| {
            let ordering = compare(
                &text(&store.field(a, column)),
                &text(&store.field(b, column)),
            );
            if *desc { ordering.reverse() } else { ordering }
        });
    }

    if query.embeds_vendor() {
        for row in &mut selected {
            let vendor = store.vendor_of(row).unwrap_or(Value::Null);
            if let Some(map) = row.as_object_mut() {
                map.insert("vendors".to_string(), vendor);
            }
        }
    }

    let page = selected
        .into_iter()
        .skip(query.offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();
    Value::Array(page)
}

/// Columns that carry a unique constraint, per table.
fn unique_columns(table: &str) -> &'static [&'static str] {
    match table {
        "vendors" => &["owner_id"],
        "categories" => &["slug"],
        _ => &[],
    }
}

fn insert(store: &mut Store, table: &str, query: &Query, body: Value) -> Response {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(_) => vec![body],
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };

    let mut written = Vec::new();
    for row in rows {
        if let Some(conflict) = &query.on_conflict {
            let existing = store.tables.get_mut(table).and_then(|rows| {
                rows.iter_mut().find(|r| {
                    conflict
                        .iter()
                        .all(|c| r.get(c).map(text) == row.get(c).map(text))
                })
            });
            if let Some(existing) = existing {
                merge(existing, &row);
                written.push(existing.clone());
                continue;
            }
        } else {
            let duplicate = unique_columns(table).iter().any(|column| {
                store.tables.get(table).is_some_and(|rows| {
                    rows.iter()
                        .any(|r| r.get(*column).is_some() && r.get(*column) == row.get(*column))
                })
            });
            if duplicate {
                return (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "code": "23505",
                        "message": format!("duplicate key value violates unique constraint \"{table}_key\""),
                    })),
                )
                    .into_response();
            }
        }
        written.push(store.insert(table, row));
    }
    (StatusCode::CREATED, Json(Value::Array(written))).into_response()
}
