use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub api_key: String,
    /// A key allowed to read but not to rename or delete tags.
    pub read_only_api_key: Option<String>,
    /// Public origin used to build `shortUrl`.
    pub public_url: String,
    /// Short URLs with more visits than this cannot be deleted.
    pub delete_threshold: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: "mock-api-key".to_string(),
            read_only_api_key: None,
            public_url: "http://localhost".to_string(),
            delete_threshold: 15,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitsSummary {
    pub total: u64,
    pub non_bots: u64,
    pub bots: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub valid_since: Option<String>,
    pub valid_until: Option<String>,
    pub max_visits: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrl {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
    pub date_created: String,
    pub visits_summary: VisitsSummary,
    pub tags: Vec<String>,
    pub meta: Meta,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub crawlable: bool,
    pub forward_query: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortUrl {
    pub long_url: String,
    pub custom_slug: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub title: Option<String>,
    pub valid_since: Option<String>,
    pub valid_until: Option<String>,
    pub max_visits: Option<u64>,
    #[serde(default)]
    pub find_if_exists: bool,
    #[serde(default)]
    pub crawlable: bool,
    pub forward_query: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditShortUrl {
    pub long_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub title: Option<String>,
    pub valid_since: Option<String>,
    pub valid_until: Option<String>,
    pub max_visits: Option<u64>,
    pub crawlable: Option<bool>,
    pub forward_query: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTag {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Default)]
pub struct Store {
    pub short_urls: Vec<ShortUrl>,
    pub tags: BTreeSet<String>,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

/// A problem-details error body, the way Shlink reports failures.
#[derive(Debug)]
pub struct Problem {
    status: StatusCode,
    error_type: &'static str,
    title: &'static str,
    detail: String,
    extra: Map<String, Value>,
}

impl Problem {
    fn new(status: StatusCode, error_type: &'static str, title: &'static str, detail: String) -> Self {
        Self {
            status,
            error_type,
            title,
            detail,
            extra: Map::new(),
        }
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    fn invalid_argument(detail: impl ToString) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_ARGUMENT",
            "Invalid data",
            detail.to_string(),
        )
    }

    fn short_url_not_found(short_code: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "INVALID_SHORTCODE",
            "Short URL not found",
            format!("No URL found with short code \"{short_code}\""),
        )
        .with("shortCode", json!(short_code))
    }

    fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "FORBIDDEN_OPERATION",
            "Forbidden tag operation",
            "You are not allowed to modify tags".to_string(),
        )
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let mut body = self.extra;
        body.insert("type".to_string(), json!(self.error_type));
        body.insert("title".to_string(), json!(self.title));
        body.insert("detail".to_string(), json!(self.detail));
        body.insert("status".to_string(), json!(self.status.as_u16()));
        (
            self.status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(Value::Object(body)),
        )
            .into_response()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Access {
    Full,
    ReadOnly,
}

fn authorize(config: &MockConfig, headers: &HeaderMap) -> Result<Access, Problem> {
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if key == config.api_key {
        return Ok(Access::Full);
    }
    if config.read_only_api_key.as_deref() == Some(key) {
        return Ok(Access::ReadOnly);
    }
    Err(Problem::new(
        StatusCode::UNAUTHORIZED,
        "INVALID_API_KEY",
        "Invalid API key",
        "Provided API key does not exist or is invalid.".to_string(),
    ))
}

type Params = Query<Vec<(String, String)>>;

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn params_all<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    params
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

/// Slice `items` the way Shlink does: 1-based `page`, `itemsPerPage`
/// defaulting to everything.
fn paginate<T: Serialize>(items: Vec<T>, params: &[(String, String)]) -> Value {
    let total = items.len();
    let page = param(params, "page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let per_page = param(params, "itemsPerPage")
        .and_then(|p| p.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(total.max(1));
    let pages_count = total.div_ceil(per_page);
    let data: Vec<T> = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    json!({
        "data": data,
        "pagination": {
            "currentPage": page,
            "pagesCount": pages_count,
            "itemsPerPage": per_page,
            "itemsInCurrentPage": data.len(),
            "totalItems": total,
        },
    })
}

fn is_valid_url(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://")) && url.len() > "https://".len()
}

pub fn app() -> Router {
    app_with_config(MockConfig::default())
}

pub fn app_with_config(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/rest/v3/short-urls", get(list_short_urls).post(create_short_url))
        .route(
            "/rest/v3/short-urls/{short_code}",
            get(get_short_url).patch(edit_short_url).delete(delete_short_url),
        )
        .route("/rest/v3/tags", get(list_tags).put(rename_tag).delete(delete_tags))
        .route("/rest/v3/tags/stats", get(list_tags_with_stats))
        .route("/{short_code}", get(visit))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_config(listener, MockConfig::default()).await
}

pub async fn run_with_config(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock shlink listening");
    axum::serve(listener, app_with_config(config)).await
}

async fn list_short_urls(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<Json<Value>, Problem> {
    authorize(&state.config, &headers)?;
    let store = state.store.read().await;
    let search = param(&params, "searchTerm").map(str::to_lowercase);
    let tags = params_all(&params, "tags[]");
    let all_tags = param(&params, "tagsMode") == Some("all");

    let matching: Vec<ShortUrl> = store
        .short_urls
        .iter()
        .filter(|s| match &search {
            Some(term) => {
                s.long_url.to_lowercase().contains(term) || s.short_code.to_lowercase().contains(term)
            }
            None => true,
        })
        .filter(|s| {
            if tags.is_empty() {
                return true;
            }
            let has = |t: &&str| s.tags.iter().any(|own| own == t);
            if all_tags {
                tags.iter().all(has)
            } else {
                tags.iter().any(has)
            }
        })
        .cloned()
        .collect();

    Ok(Json(json!({ "shortUrls": paginate(matching, &params) })))
}

async fn create_short_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<ShortUrl>, Problem> {
    authorize(&state.config, &headers)?;
    let input: CreateShortUrl = serde_json::from_value(body).map_err(Problem::invalid_argument)?;
    if !is_valid_url(&input.long_url) {
        return Err(Problem::new(
            StatusCode::BAD_REQUEST,
            "INVALID_URL",
            "Invalid URL",
            format!("Provided URL {} is invalid. Try with a different one.", input.long_url),
        )
        .with("url", json!(input.long_url)));
    }

    let mut store = state.store.write().await;
    if input.find_if_exists {
        if let Some(existing) = store.short_urls.iter().find(|s| s.long_url == input.long_url) {
            return Ok(Json(existing.clone()));
        }
    }
    let short_code = match input.custom_slug {
        Some(slug) if store.short_urls.iter().any(|s| s.short_code == slug) => {
            return Err(Problem::new(
                StatusCode::BAD_REQUEST,
                "INVALID_SLUG",
                "Invalid custom slug",
                format!("Provided slug \"{slug}\" is already in use."),
            )
            .with("customSlug", json!(slug)));
        }
        Some(slug) => slug,
        None => Uuid::new_v4().simple().to_string()[..5].to_string(),
    };

    let short_url = ShortUrl {
        short_url: format!("{}/{short_code}", state.config.public_url),
        short_code,
        long_url: input.long_url,
        date_created: chrono::Utc::now().to_rfc3339(),
        visits_summary: VisitsSummary::default(),
        tags: input.tags,
        meta: Meta {
            valid_since: input.valid_since,
            valid_until: input.valid_until,
            max_visits: input.max_visits,
        },
        domain: None,
        title: input.title,
        crawlable: input.crawlable,
        forward_query: input.forward_query.unwrap_or(true),
    };
    store.tags.extend(short_url.tags.iter().cloned());
    store.short_urls.push(short_url.clone());
    debug!(short_code = %short_url.short_code, "created short URL");
    Ok(Json(short_url))
}

async fn get_short_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(short_code): Path<String>,
) -> Result<Json<ShortUrl>, Problem> {
    authorize(&state.config, &headers)?;
    let store = state.store.read().await;
    store
        .short_urls
        .iter()
        .find(|s| s.short_code == short_code)
        .cloned()
        .map(Json)
        .ok_or_else(|| Problem::short_url_not_found(&short_code))
}

async fn edit_short_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(short_code): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ShortUrl>, Problem> {
    authorize(&state.config, &headers)?;
    let input: EditShortUrl = serde_json::from_value(body).map_err(Problem::invalid_argument)?;
    if let Some(long_url) = input.long_url.as_deref().filter(|u| !is_valid_url(u)) {
        return Err(Problem::invalid_argument(format!("Provided long URL {long_url} is invalid")));
    }

    let mut guard = state.store.write().await;
    let store = &mut *guard;
    let short_url = store
        .short_urls
        .iter_mut()
        .find(|s| s.short_code == short_code)
        .ok_or_else(|| Problem::short_url_not_found(&short_code))?;

    if let Some(long_url) = input.long_url {
        short_url.long_url = long_url;
    }
    if let Some(tags) = input.tags {
        store.tags.extend(tags.iter().cloned());
        short_url.tags = tags;
    }
    if let Some(title) = input.title {
        short_url.title = Some(title);
    }
    if input.valid_since.is_some() {
        short_url.meta.valid_since = input.valid_since;
    }
    if input.valid_until.is_some() {
        short_url.meta.valid_until = input.valid_until;
    }
    if input.max_visits.is_some() {
        short_url.meta.max_visits = input.max_visits;
    }
    if let Some(crawlable) = input.crawlable {
        short_url.crawlable = crawlable;
    }
    if let Some(forward_query) = input.forward_query {
        short_url.forward_query = forward_query;
    }
    Ok(Json(short_url.clone()))
}

async fn delete_short_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(short_code): Path<String>,
) -> Result<StatusCode, Problem> {
    authorize(&state.config, &headers)?;
    let mut store = state.store.write().await;
    let index = store
        .short_urls
        .iter()
        .position(|s| s.short_code == short_code)
        .ok_or_else(|| Problem::short_url_not_found(&short_code))?;

    let threshold = state.config.delete_threshold;
    if store.short_urls[index].visits_summary.total > threshold {
        return Err(Problem::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_SHORTCODE_DELETION",
            "Cannot delete short URL",
            format!("Impossible to delete short URL with short code \"{short_code}\", since it has more than \"{threshold}\" visits."),
        )
        .with("shortCode", json!(short_code))
        .with("threshold", json!(threshold)));
    }
    store.short_urls.remove(index);
    Ok(StatusCode::NO_CONTENT)
}

/// Counters for every known tag, sorted by name.
fn tag_stats(store: &Store) -> Vec<Value> {
    let mut stats: BTreeMap<&str, (u64, u64)> = store.tags.iter().map(|t| (t.as_str(), (0, 0))).collect();
    for short_url in &store.short_urls {
        for tag in &short_url.tags {
            let entry = stats.entry(tag.as_str()).or_default();
            entry.0 += 1;
            entry.1 += short_url.visits_summary.total;
        }
    }
    stats
        .into_iter()
        .map(|(tag, (short_urls_count, visits))| {
            json!({
                "tag": tag,
                "shortUrlsCount": short_urls_count,
                "visitsSummary": {"total": visits, "nonBots": visits, "bots": 0},
            })
        })
        .collect()
}

fn matches_search(tag: &str, params: &[(String, String)]) -> bool {
    param(params, "searchTerm").map_or(true, |term| tag.to_lowercase().contains(&term.to_lowercase()))
}

async fn list_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<Json<Value>, Problem> {
    authorize(&state.config, &headers)?;
    let store = state.store.read().await;
    let data: Vec<&String> = store.tags.iter().filter(|t| matches_search(t, &params)).collect();

    // Servers predating /tags/stats embedded stats here on request.
    if param(&params, "withStats") == Some("true") {
        let stats: Vec<Value> = tag_stats(&store)
            .into_iter()
            .filter(|s| matches_search(s["tag"].as_str().unwrap_or_default(), &params))
            .collect();
        return Ok(Json(json!({ "tags": { "data": data, "stats": stats } })));
    }
    Ok(Json(json!({ "tags": { "data": data } })))
}

async fn list_tags_with_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<Json<Value>, Problem> {
    authorize(&state.config, &headers)?;
    let store = state.store.read().await;
    let stats: Vec<Value> = tag_stats(&store)
        .into_iter()
        .filter(|s| matches_search(s["tag"].as_str().unwrap_or_default(), &params))
        .collect();
    Ok(Json(json!({ "tags": paginate(stats, &params) })))
}

async fn rename_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, Problem> {
    if authorize(&state.config, &headers)? == Access::ReadOnly {
        return Err(Problem::forbidden());
    }
    let input: RenameTag = serde_json::from_value(body).map_err(Problem::invalid_argument)?;
    if input.old_name.is_empty() || input.new_name.is_empty() {
        return Err(Problem::invalid_argument("oldName and newName are required"));
    }

    let mut store = state.store.write().await;
    if !store.tags.contains(&input.old_name) {
        return Err(Problem::new(
            StatusCode::NOT_FOUND,
            "TAG_NOT_FOUND",
            "Tag not found",
            format!("Tag with name \"{}\" could not be found", input.old_name),
        )
        .with("tag", json!(input.old_name)));
    }
    if input.old_name != input.new_name && store.tags.contains(&input.new_name) {
        return Err(Problem::new(
            StatusCode::CONFLICT,
            "TAG_CONFLICT",
            "Tag conflict",
            format!("You cannot rename tag {} to {}, because it already exists", input.old_name, input.new_name),
        )
        .with("oldName", json!(input.old_name))
        .with("newName", json!(input.new_name)));
    }

    store.tags.remove(&input.old_name);
    store.tags.insert(input.new_name.clone());
    for short_url in &mut store.short_urls {
        for tag in &mut short_url.tags {
            if *tag == input.old_name {
                tag.clone_from(&input.new_name);
            }
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<StatusCode, Problem> {
    if authorize(&state.config, &headers)? == Access::ReadOnly {
        return Err(Problem::forbidden());
    }
    let doomed = params_all(&params, "tags[]");
    let mut store = state.store.write().await;
    store.tags.retain(|t| !doomed.contains(&t.as_str()));
    for short_url in &mut store.short_urls {
        short_url.tags.retain(|t| !doomed.contains(&t.as_str()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Public redirect. Counts a visit.
async fn visit(State(state): State<AppState>, Path(short_code): Path<String>) -> Result<Redirect, StatusCode> {
    let mut store = state.store.write().await;
    let short_url = store
        .short_urls
        .iter_mut()
        .find(|s| s.short_code == short_code)
        .ok_or(StatusCode::NOT_FOUND)?;
    short_url.visits_summary.total += 1;
    short_url.visits_summary.non_bots += 1;
    Ok(Redirect::to(&short_url.long_url))
}
