use std::sync::{Arc, Mutex};

use annonces_shared::constants::{CITIES, COMPUTING_BRANDS, PROPERTY_TYPES, VEHICLE_MAKES};
use annonces_shared::{
    format_price, Category, EventKind, ListingCriteria, ListingStatus, ListingType, Role,
};
use annonces_store::{
    Database, Listing, ListingUpdate, NewEvent, NewListing, SettingsCache, SiteSettings,
    TimeWindow,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{require_admin, require_analytics, resolve_role};
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::media::{content_type, MediaStore};

/// Analytics window when the request names none.
const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub settings: Arc<Mutex<SettingsCache>>,
    pub media: Arc<MediaStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, media: MediaStore, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            settings: Arc::new(Mutex::new(SettingsCache::new())),
            media: Arc::new(media),
            config: Arc::new(config),
        }
    }

    /// Run a blocking store call off the async runtime.
    async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("database task failed: {e}")))?
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // Multipart framing on top of the largest accepted image.
    let body_limit = state.config.max_upload_size + 64 * 1024;

    Router::new()
        .route("/health", get(health_check))
        .route("/settings", get(get_settings))
        .route("/options", get(form_options))
        .route("/listings", get(search_listings))
        .route("/listings/:id", get(listing_detail))
        .route("/listings/:id/view", post(record_view))
        .route("/listings/:id/contact", post(record_contact))
        .route("/listings/:id/share", post(record_share))
        .route("/media/:reference", get(media_download))
        .route("/admin/settings", put(admin_update_settings))
        .route(
            "/admin/listings",
            get(admin_list_listings).post(admin_create_listing),
        )
        .route(
            "/admin/listings/:id",
            patch(admin_update_listing).delete(admin_delete_listing),
        )
        .route("/admin/listings/:id/status", put(admin_set_status))
        .route("/admin/media", post(admin_media_upload))
        .route("/analytics/overview", get(analytics_overview))
        .route("/analytics/events", get(analytics_event_count))
        .route("/analytics/top", get(analytics_top_listings))
        .route("/analytics/categories", get(analytics_categories))
        .route("/analytics/sources", get(analytics_sources))
        .route("/analytics/daily", get(analytics_daily))
        .route("/analytics/export", get(analytics_export))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Payloads ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Tag plus visitor-facing label for a select box.
#[derive(Serialize)]
struct Choice {
    value: &'static str,
    label: &'static str,
}

/// Everything the search and listing forms offer as choices.
#[derive(Serialize)]
struct FormOptions {
    categories: Vec<Choice>,
    listing_types: Vec<Choice>,
    statuses: Vec<ListingStatus>,
    event_kinds: Vec<EventKind>,
    cities: &'static [&'static str],
    property_types: &'static [&'static str],
    vehicle_makes: &'static [&'static str],
    computing_brands: &'static [&'static str],
}

/// A listing with its display price.
#[derive(Serialize)]
struct ListingView {
    #[serde(flatten)]
    listing: Listing,
    price_label: String,
}

impl From<Listing> for ListingView {
    fn from(listing: Listing) -> Self {
        let price_label = format_price(listing.price, &listing.currency);
        Self {
            listing,
            price_label,
        }
    }
}

#[derive(Serialize)]
struct SearchResponse {
    listings: Vec<ListingView>,
    chips: Vec<String>,
    page: u32,
    /// A full page means there may be another one.
    has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    category: Option<Category>,
    listing_type: Option<ListingType>,
    city: Option<String>,
    price_min: Option<f64>,
    price_max: Option<f64>,
    status: Option<ListingStatus>,
    /// 1-based.
    page: Option<u32>,
}

impl SearchQuery {
    /// Criteria for `role`.  Only admins may pick a status; everyone else
    /// gets the published default.
    fn criteria(&self, role: Role) -> ListingCriteria {
        let mut criteria = ListingCriteria {
            category: self.category,
            listing_type: self.listing_type,
            city: self.city.clone(),
            price_min: self.price_min,
            price_max: self.price_max,
            ..Default::default()
        };
        if role.can_manage_listings() {
            criteria.status = self.status;
        }
        criteria.normalized()
    }

    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngagementRequest {
    source: Option<String>,
    extra: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StatusRequest {
    status: ListingStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalyticsQuery {
    days: Option<i64>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    kind: Option<EventKind>,
    limit: Option<u32>,
}

impl AnalyticsQuery {
    fn window(&self) -> Result<TimeWindow, ApiError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(ApiError::BadRequest(
                "window start is after its end".into(),
            )),
            (Some(start), Some(end)) => Ok(TimeWindow::new(start, end)),
            (Some(start), None) => Ok(TimeWindow::new(start, Utc::now())),
            (None, end) => {
                let days = self.days.unwrap_or(DEFAULT_WINDOW_DAYS);
                if days <= 0 {
                    return Err(ApiError::BadRequest("days must be positive".into()));
                }
                TimeWindow::days_before(end.unwrap_or_else(Utc::now), days).ok_or_else(|| {
                    ApiError::BadRequest(format!("days={days} reaches outside the calendar"))
                })
            }
        }
    }
}

// ─── Public endpoints ───

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn form_options() -> Json<FormOptions> {
    Json(FormOptions {
        categories: Category::ALL
            .iter()
            .map(|c| Choice {
                value: c.as_str(),
                label: c.label(),
            })
            .collect(),
        listing_types: ListingType::ALL
            .iter()
            .map(|t| Choice {
                value: t.as_str(),
                label: t.label(),
            })
            .collect(),
        statuses: ListingStatus::ALL.to_vec(),
        event_kinds: EventKind::ALL.to_vec(),
        cities: CITIES,
        property_types: PROPERTY_TYPES,
        vehicle_makes: VEHICLE_MAKES,
        computing_brands: COMPUTING_BRANDS,
    })
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<SiteSettings>, ApiError> {
    let cache = state.settings.clone();
    let settings = state
        .with_db(move |db| {
            let mut cache = cache
                .lock()
                .map_err(|_| ApiError::Internal("settings cache lock poisoned".into()))?;
            Ok(cache.get(db)?)
        })
        .await?;
    Ok(Json(settings))
}

async fn search_listings(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let role = resolve_role(&headers, &state.config);
    let criteria = query.criteria(role);
    let page = query.page();
    let page_size = state.config.page_size;
    let offset = (page - 1).saturating_mul(page_size);

    let chips = criteria.active_filter_chips();
    let listings = state
        .with_db(move |db| Ok(db.query_listings(&criteria, page_size, offset)?))
        .await?;

    Ok(Json(SearchResponse {
        has_more: listings.len() as u32 == page_size,
        listings: listings.into_iter().map(ListingView::from).collect(),
        chips,
        page,
        total: None,
    }))
}

async fn listing_detail(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ListingView>, ApiError> {
    let role = resolve_role(&headers, &state.config);
    let listing = state.with_db(move |db| Ok(db.get_listing(id)?)).await?;

    if listing.status != ListingStatus::Published && !role.can_manage_listings() {
        return Err(ApiError::NotFound(format!("listing {id}")));
    }
    Ok(Json(listing.into()))
}

/// Requester details attached to engagement events.
fn requester(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (ip, user_agent)
}

fn engagement_event(
    id: i64,
    kind: EventKind,
    headers: &HeaderMap,
    body: Option<Json<EngagementRequest>>,
) -> NewEvent {
    let (ip, user_agent) = requester(headers);
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let mut event = NewEvent::new(id, kind).with_requester(ip, user_agent);
    if let Some(source) = body.source.filter(|s| !s.trim().is_empty()) {
        event = event.with_source(source);
    }
    if let Some(extra) = body.extra {
        event = event.with_extra(extra);
    }
    event
}

/// A detail page view: bumps the counter and logs a `view` event.
async fn record_view(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<EngagementRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let event = engagement_event(id, EventKind::View, &headers, body);
    state
        .with_db(move |db| {
            if !db.increment_views(id)? {
                return Err(ApiError::NotFound(format!("listing {id}")));
            }
            db.record_event(&event)?;
            Ok(())
        })
        .await?;
    Ok(Json(serde_json::json!({ "recorded": true })))
}

async fn record_contact(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<EngagementRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let event = engagement_event(id, EventKind::ContactClick, &headers, body);
    state.with_db(move |db| Ok(db.record_event(&event)?)).await?;
    Ok(Json(serde_json::json!({ "recorded": true })))
}

async fn record_share(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<EngagementRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let event = engagement_event(id, EventKind::Share, &headers, body);
    state.with_db(move |db| Ok(db.record_event(&event)?)).await?;
    Ok(Json(serde_json::json!({ "recorded": true })))
}

async fn media_download(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.media.read_image(&reference).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&reference))], data))
}

// ─── Admin endpoints ───

async fn admin_update_settings(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(settings): Json<SiteSettings>,
) -> Result<Json<SiteSettings>, ApiError> {
    require_admin(&headers, &state.config)?;

    let cache = state.settings.clone();
    let saved = state
        .with_db(move |db| {
            settings.save(db)?;
            let mut cache = cache
                .lock()
                .map_err(|_| ApiError::Internal("settings cache lock poisoned".into()))?;
            Ok(cache.refresh(db)?)
        })
        .await?;

    info!(company = %saved.company_name, "Site settings updated");
    Ok(Json(saved))
}

/// Every status unless one is requested, with the matching total.
async fn admin_list_listings(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let role = require_admin(&headers, &state.config)?;
    let mut criteria = query.criteria(role);
    if criteria.status.is_none() {
        criteria.any_status = true;
    }
    let page = query.page();
    let page_size = state.config.page_size;
    let offset = (page - 1).saturating_mul(page_size);

    let chips = criteria.active_filter_chips();
    let (listings, total) = state
        .with_db(move |db| {
            let listings = db.query_listings(&criteria, page_size, offset)?;
            let total = db.count_listings(&criteria)?;
            Ok((listings, total))
        })
        .await?;

    Ok(Json(SearchResponse {
        has_more: listings.len() as u32 == page_size,
        listings: listings.into_iter().map(ListingView::from).collect(),
        chips,
        page,
        total: Some(total),
    }))
}

async fn admin_create_listing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(listing): Json<NewListing>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    require_admin(&headers, &state.config)?;

    let id = state.with_db(move |db| Ok(db.create_listing(&listing)?)).await?;

    info!(listing_id = id, "Admin created listing");
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn admin_update_listing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ListingUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.config)?;

    let empty = update.is_empty();
    let updated = state
        .with_db(move |db| Ok(db.update_listing(id, &update)?))
        .await?;
    if !updated && !empty {
        return Err(ApiError::NotFound(format!("listing {id}")));
    }
    Ok(Json(serde_json::json!({ "updated": updated })))
}

async fn admin_set_status(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.config)?;

    let status = req.status;
    let changed = state
        .with_db(move |db| Ok(db.set_listing_status(id, status)?))
        .await?;
    if !changed {
        return Err(ApiError::NotFound(format!("listing {id}")));
    }
    Ok(Json(serde_json::json!({ "id": id, "status": status })))
}

async fn admin_delete_listing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.config)?;

    let deleted = state.with_db(move |db| Ok(db.delete_listing(id)?)).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("listing {id}")));
    }

    info!(listing_id = id, "Admin deleted listing");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn admin_media_upload(
    headers: HeaderMap,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.config)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?;

            let reference = state.media.store_image(&file_name, &data).await?;

            info!(reference = %reference, size = data.len(), "Image uploaded via API");

            return Ok(Json(serde_json::json!({ "reference": reference })));
        }
    }

    Err(ApiError::BadRequest(
        "Missing 'file' field in multipart form".to_string(),
    ))
}

// ─── Analytics endpoints ───

async fn analytics_overview(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_analytics(&headers, &state.config)?;
    let window = query.window()?;
    let overview = state.with_db(move |db| Ok(db.overview(&window)?)).await?;
    Ok(Json(overview))
}

async fn analytics_event_count(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_analytics(&headers, &state.config)?;
    let window = query.window()?;
    let kind = query
        .kind
        .ok_or_else(|| ApiError::BadRequest("kind is required".into()))?;

    let count = state
        .with_db(move |db| Ok(db.count_events(kind, &window)?))
        .await?;
    Ok(Json(serde_json::json!({ "kind": kind, "count": count })))
}

async fn analytics_top_listings(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_analytics(&headers, &state.config)?;
    let window = query.window()?;
    let limit = query
        .limit
        .unwrap_or(annonces_shared::constants::DEFAULT_TOP_LISTINGS);

    let top = state
        .with_db(move |db| Ok(db.top_listings_by_views(&window, limit)?))
        .await?;
    Ok(Json(top))
}

async fn analytics_categories(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_analytics(&headers, &state.config)?;
    let window = query.window()?;
    let rollup = state
        .with_db(move |db| Ok(db.per_category_rollup(&window)?))
        .await?;
    Ok(Json(rollup))
}

async fn analytics_sources(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_analytics(&headers, &state.config)?;
    let window = query.window()?;
    let kind = query.kind;
    let sources = state
        .with_db(move |db| Ok(db.per_source_breakdown(kind, &window)?))
        .await?;
    Ok(Json(sources))
}

async fn analytics_daily(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_analytics(&headers, &state.config)?;
    let window = query.window()?;
    let daily = state
        .with_db(move |db| Ok(db.daily_activity(&window)?))
        .await?;
    Ok(Json(daily))
}

async fn analytics_export(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_analytics(&headers, &state.config)?;
    let window = query.window()?;
    let rows = state
        .with_db(move |db| Ok(db.export_listing_performance(&window)?))
        .await?;

    info!(rows = rows.len(), "Listing performance exported");
    Ok(Json(rows))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const ADMIN: &str = "admin-token";
    const ANALYST: &str = "analyst-token";

    async fn test_app() -> (Router, AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let media = MediaStore::new(dir.path().join("uploads"), 1024 * 1024)
            .await
            .unwrap();
        let config = ServerConfig {
            admin_token: Some(ADMIN.into()),
            analyst_token: Some(ANALYST.into()),
            ..Default::default()
        };
        let state = AppState::new(db, media, config);
        (build_router(state.clone()), state, dir)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn listing_json(title: &str, category: &str, price: f64, status: &str) -> Value {
        json!({
            "title": title,
            "description": format!("{title} description"),
            "category": category,
            "listing_type": "sale",
            "price": price,
            "city": "Libreville",
            "contact_name": "Jean Mba",
            "contact_phone": "+241-07-12-34-56",
            "status": status,
        })
    }

    async fn create(app: &Router, body: Value) -> i64 {
        let (status, value) = send(app, "POST", "/admin/listings", Some(ADMIN), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{value}");
        value["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _state, _dir) = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_admin_surface_requires_admin_token() {
        let (app, _state, _dir) = test_app().await;
        let body = listing_json("Villa A", "real_estate", 1.0, "published");

        let (status, _) = send(&app, "POST", "/admin/listings", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "POST", "/admin/listings", Some(ANALYST), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_validation_errors_list_reasons() {
        let (app, _state, _dir) = test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/admin/listings",
            Some(ADMIN),
            Some(json!({ "title": "Only a title", "price": -5.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let reasons = body["reasons"].as_array().unwrap();
        assert!(reasons.iter().any(|r| r == "price must not be negative"));
        assert!(reasons.iter().any(|r| r == "city is required"));
    }

    #[tokio::test]
    async fn test_public_search_shows_published_with_chips() {
        let (app, _state, _dir) = test_app().await;
        let villa = create(&app, listing_json("Villa A", "real_estate", 50_000_000.0, "published")).await;
        create(&app, listing_json("Car B", "vehicle", 8_000_000.0, "published")).await;
        create(&app, listing_json("Hidden", "real_estate", 20_000_000.0, "draft")).await;

        let (status, body) = send(
            &app,
            "GET",
            "/listings?category=real_estate&price_min=10000000&price_max=100000000&status=draft",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let listings = body["listings"].as_array().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0]["id"], villa);
        assert_eq!(listings[0]["price_label"], "50.0M FCFA");
        assert_eq!(body["has_more"], false);
        assert_eq!(
            body["chips"],
            json!(["Immobilier", "Budget 10 000 000 - 100 000 000 FCFA"])
        );
    }

    #[tokio::test]
    async fn test_pagination_signals_more() {
        let (app, _state, _dir) = test_app().await;
        for i in 0..10 {
            create(&app, listing_json(&format!("Item {i}"), "computing", 1_000.0, "published")).await;
        }

        let (_, first) = send(&app, "GET", "/listings", None, None).await;
        assert_eq!(first["listings"].as_array().unwrap().len(), 9);
        assert_eq!(first["has_more"], true);

        let (_, second) = send(&app, "GET", "/listings?page=2", None, None).await;
        assert_eq!(second["listings"].as_array().unwrap().len(), 1);
        assert_eq!(second["has_more"], false);
    }

    #[tokio::test]
    async fn test_drafts_hidden_from_public_detail() {
        let (app, _state, _dir) = test_app().await;
        let draft = create(&app, listing_json("Draft", "vehicle", 1.0, "draft")).await;

        let (status, _) = send(&app, "GET", &format!("/listings/{draft}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send(&app, "GET", &format!("/listings/{draft}"), Some(ADMIN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "draft");

        let (_, all) = send(&app, "GET", "/admin/listings", Some(ADMIN), None).await;
        assert_eq!(all["total"], 1);
    }

    #[tokio::test]
    async fn test_engagement_endpoints() {
        let (app, _state, _dir) = test_app().await;
        let id = create(&app, listing_json("Villa A", "real_estate", 1.0, "published")).await;

        let (status, _) = send(&app, "POST", &format!("/listings/{id}/view"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &app,
            "POST",
            &format!("/listings/{id}/contact"),
            None,
            Some(json!({ "source": "whatsapp" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        send(
            &app,
            "POST",
            &format!("/listings/{id}/share"),
            None,
            Some(json!({ "source": "facebook" })),
        )
        .await;

        let (_, listing) = send(&app, "GET", &format!("/listings/{id}"), None, None).await;
        assert_eq!(listing["views"], 1);
        assert_eq!(listing["contact_clicks"], 1);
        assert_eq!(listing["shares"], 1);

        let (status, _) = send(&app, "POST", "/listings/9999/view", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "POST", "/listings/9999/contact", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analytics_for_analyst() {
        let (app, _state, _dir) = test_app().await;
        let id = create(&app, listing_json("Villa A", "real_estate", 1.0, "published")).await;
        for _ in 0..3 {
            send(&app, "POST", &format!("/listings/{id}/view"), None, None).await;
        }
        send(
            &app,
            "POST",
            &format!("/listings/{id}/contact"),
            None,
            Some(json!({ "source": "whatsapp" })),
        )
        .await;

        let (status, _) = send(&app, "GET", "/analytics/categories", None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, rollup) =
            send(&app, "GET", "/analytics/categories?days=7", Some(ANALYST), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rollup[0]["category"], "real_estate");
        assert_eq!(rollup[0]["views"], 3);
        assert_eq!(rollup[0]["contact_rate"], 33.3);

        let (_, count) = send(
            &app,
            "GET",
            "/analytics/events?kind=contact_click",
            Some(ANALYST),
            None,
        )
        .await;
        assert_eq!(count["count"], 1);

        let (_, sources) = send(&app, "GET", "/analytics/sources", Some(ANALYST), None).await;
        assert_eq!(sources, json!([{ "source": "whatsapp", "count": 1 }]));

        let (_, overview) = send(&app, "GET", "/analytics/overview", Some(ADMIN), None).await;
        assert_eq!(overview["active_listings"], 1);

        let (status, _) = send(&app, "GET", "/analytics/top?days=0", Some(ANALYST), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analytics_window_bounds() {
        let (app, _state, _dir) = test_app().await;
        let id = create(&app, listing_json("Villa A", "real_estate", 1.0, "published")).await;
        send(&app, "POST", &format!("/listings/{id}/view"), None, None).await;

        let (status, count) =
            send(&app, "GET", "/analytics/events?kind=view", Some(ANALYST), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count["count"], 1);

        // An end without a start closes the window there.
        let (status, count) = send(
            &app,
            "GET",
            "/analytics/events?kind=view&end=2020-01-01T00:00:00Z",
            Some(ANALYST),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count["count"], 0);

        let (status, _) = send(
            &app,
            "GET",
            "/analytics/top?days=1000000000",
            Some(ANALYST),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_window_from_end_and_days() {
        let end = "2020-01-31T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let query = AnalyticsQuery {
            days: Some(30),
            start: None,
            end: Some(end),
            kind: None,
            limit: None,
        };
        let window = query.window().unwrap();
        assert_eq!(window.end, end);
        assert_eq!(
            window.start,
            "2020-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_storage_failure_is_503() {
        let (app, state, _dir) = test_app().await;
        create(&app, listing_json("Villa A", "real_estate", 1.0, "published")).await;
        state
            .db
            .lock()
            .unwrap()
            .conn()
            .execute("DROP TABLE listings", [])
            .unwrap();

        let (status, body) = send(&app, "GET", "/listings", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Storage unavailable");
    }

    #[tokio::test]
    async fn test_form_options() {
        let (app, _state, _dir) = test_app().await;
        let (status, options) = send(&app, "GET", "/options", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(options["categories"][1], json!({ "value": "vehicle", "label": "Véhicules" }));
        assert_eq!(options["listing_types"][1]["label"], "Location");
        assert_eq!(options["statuses"], json!(["draft", "published", "expired", "archived"]));
        assert_eq!(options["event_kinds"][1], "contact_click");
        assert_eq!(options["cities"][1], "Port-Gentil");
        assert!(options["vehicle_makes"]
            .as_array()
            .unwrap()
            .contains(&json!("Toyota")));
    }

    #[tokio::test]
    async fn test_status_update_and_delete() {
        let (app, _state, _dir) = test_app().await;
        let id = create(&app, listing_json("Villa A", "real_estate", 1.0, "published")).await;
        let uri = format!("/admin/listings/{id}");

        let (status, body) = send(
            &app,
            "PATCH",
            &uri,
            Some(ADMIN),
            Some(json!({ "title": "Villa A rénovée" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], true);

        let (status, _) = send(
            &app,
            "PUT",
            &format!("{uri}/status"),
            Some(ADMIN),
            Some(json!({ "status": "archived" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, public) = send(&app, "GET", "/listings", None, None).await;
        assert!(public["listings"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, "DELETE", &uri, Some(ADMIN), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", &uri, Some(ADMIN), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let (app, _state, _dir) = test_app().await;

        let (_, settings) = send(&app, "GET", "/settings", None, None).await;
        assert_eq!(settings["company_name"], "AUTO-IMMO");

        let (status, _) = send(
            &app,
            "PUT",
            "/admin/settings",
            Some(ADMIN),
            Some(json!({ "company_name": " Gabon Annonces ", "logo_path": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, settings) = send(&app, "GET", "/settings", None, None).await;
        assert_eq!(settings["company_name"], "Gabon Annonces");
    }

    #[tokio::test]
    async fn test_media_upload_and_download() {
        let (app, _state, _dir) = test_app().await;
        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"villa.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             png-bytes\r\n\
             --{boundary}--\r\n"
        );

        let request = Request::builder()
            .method("POST")
            .uri("/admin/media")
            .header("authorization", format!("Bearer {ADMIN}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        let reference = value["reference"].as_str().unwrap().to_string();
        assert!(reference.ends_with(".png"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/media/{reference}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"png-bytes");
    }
}
