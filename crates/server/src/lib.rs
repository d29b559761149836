use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cityscope_engine::citymap::{EraTable, ScaleUnit};
use cityscope_engine::stats::resources::PLAYABLE_ERAS;
use cityscope_engine::stats::series::{
    leaderboard_series, reward_breakdown, shape_for_chart, treasure_by_era_series,
    treasure_series, unit_series,
};
use cityscope_engine::stats::{
    detect_gvg_spending, ChartType, GcReport, GvgMarker, Period, RewardSlice, Series, StatsSource,
};
use cityscope_engine::{build_city_map, now_ms, CityView, Engine, MapPrefs, ParseError};
use cityscope_protocol::{
    targets, ArmyCount, CityMapRequest, CollectedReward, LeaderboardEntry, Patch, Resources,
    UiUpdate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub eras: EraTable,
    /// Browser extensions whose pages may call the API cross-origin.
    pub extension_ids: Vec<String>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            eras: EraTable::standard(),
            extension_ids: Vec::new(),
        }
    }

    pub fn with_extension_ids(mut self, ids: Vec<String>) -> Self {
        self.extension_ids = ids;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = local_only_cors(&state.extension_ids);
    Router::new()
        .route("/health", get(health))
        .route("/api/citymap/layout", post(citymap_layout))
        .route("/api/citymap/prefs", get(get_prefs).post(set_prefs))
        .route("/api/stats/leaderboard", post(record_leaderboard))
        .route("/api/stats/rewards", post(record_rewards))
        .route("/api/stats/rewards/breakdown", post(rewards_breakdown))
        .route("/api/stats/treasury/player", post(record_player_treasury))
        .route("/api/stats/treasury/clan", post(record_clan_treasury))
        .route("/api/stats/army", post(record_army))
        .route("/api/stats/gc", post(collect_garbage))
        .route("/api/stats/series", post(stats_series))
        .with_state(Arc::new(state))
        // Local security: allow only loopback + Tailscale by default.
        .layer(middleware::from_fn(ip_allowlist))
        // Never use `Access-Control-Allow-Origin: *` here; the panel lives on
        // the same machine and the stats are the player's own.
        .layer(cors)
}

/// Handler error: a status code and a plain-text body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let message = format!("{err:#}");
        tracing::error!(%message, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn health() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// City map
// ---------------------------------------------------------------------------

async fn citymap_layout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CityMapRequest>,
) -> ApiResult<UiUpdate> {
    let prefs = state.engine.load_map_prefs()?;
    let scale = match req.scale {
        Some(percent) => ScaleUnit::new(percent)?,
        None => prefs.scale,
    };

    let view = build_city_map(&req, scale, &state.eras);
    tracing::debug!(
        buildings = view.layout.buildings.len(),
        skipped = view.layout.skipped.len(),
        scale = %scale,
        "city map built"
    );

    let grid = serde_json::json!({
        "view": prefs.view,
        "scale": view.scale,
        "grid": view.grid,
        "buildings": view.layout.buildings,
        "skipped": view.layout.skipped,
    });
    let sidebar = serde_json::json!({
        "summary": view.summary,
        "categories": view.layout.category_areas,
        "streets_required": view.layout.streets_required,
        "street_tiles": view.layout.street_tiles,
    });
    Ok(Json(UiUpdate::new(
        "citymap.layout",
        vec![
            Patch::payload(targets::CITYMAP_GRID, grid),
            Patch::payload(targets::CITYMAP_SIDEBAR, sidebar),
        ],
    )))
}

async fn get_prefs(State(state): State<Arc<AppState>>) -> ApiResult<MapPrefs> {
    Ok(Json(state.engine.load_map_prefs()?))
}

#[derive(Debug, Deserialize)]
struct PrefsInput {
    #[serde(default)]
    scale: Option<u32>,
    #[serde(default)]
    view: Option<CityView>,
}

async fn set_prefs(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PrefsInput>,
) -> ApiResult<MapPrefs> {
    let mut prefs = state.engine.load_map_prefs()?;
    if let Some(percent) = input.scale {
        prefs.scale = ScaleUnit::preset(percent)?;
    }
    if let Some(view) = input.view {
        prefs.view = view;
    }
    state.engine.save_map_prefs(&prefs)?;
    Ok(Json(prefs))
}

// ---------------------------------------------------------------------------
// Stats ingestion
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Recorded {
    recorded: usize,
}

#[derive(Debug, Deserialize)]
struct LeaderboardInput {
    entries: Vec<LeaderboardEntry>,
}

async fn record_leaderboard(
    State(state): State<Arc<AppState>>,
    Json(input): Json<LeaderboardInput>,
) -> ApiResult<Recorded> {
    state.engine.record_leaderboard(&input.entries, now_ms())?;
    Ok(Json(Recorded {
        recorded: input.entries.len(),
    }))
}

#[derive(Debug, Deserialize)]
struct RewardsInput {
    source: String,
    rewards: Vec<CollectedReward>,
}

async fn record_rewards(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RewardsInput>,
) -> ApiResult<Recorded> {
    let recorded = state
        .engine
        .record_rewards(&input.source, &input.rewards, now_ms())?;
    Ok(Json(Recorded { recorded }))
}

#[derive(Debug, Deserialize)]
struct PlayerTreasuryInput {
    resources: Resources,
}

async fn record_player_treasury(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PlayerTreasuryInput>,
) -> ApiResult<Recorded> {
    state
        .engine
        .record_player_treasury(&input.resources, now_ms())?;
    Ok(Json(Recorded { recorded: 1 }))
}

#[derive(Debug, Deserialize)]
struct ClanTreasuryInput {
    clan_id: i64,
    resources: Resources,
}

async fn record_clan_treasury(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ClanTreasuryInput>,
) -> ApiResult<Recorded> {
    state
        .engine
        .record_clan_treasury(input.clan_id, &input.resources, now_ms())?;
    Ok(Json(Recorded { recorded: 1 }))
}

#[derive(Debug, Deserialize)]
struct ArmyInput {
    units: Vec<ArmyCount>,
}

async fn record_army(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ArmyInput>,
) -> ApiResult<Recorded> {
    state.engine.record_army(&input.units, now_ms())?;
    Ok(Json(Recorded {
        recorded: input.units.len(),
    }))
}

async fn collect_garbage(State(state): State<Arc<AppState>>) -> ApiResult<GcReport> {
    Ok(Json(state.engine.collect_garbage(now_ms())?))
}

// ---------------------------------------------------------------------------
// Stats charts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    source: StatsSource,
    #[serde(default)]
    chart: ChartType,
    /// Eras to chart; every playable era when empty.
    #[serde(default)]
    eras: Vec<String>,
    #[serde(default)]
    clan_id: Option<i64>,
    /// Treasury only: one series per era instead of per good.
    #[serde(default)]
    by_era: bool,
    /// Unit type id to the era it belongs to.
    #[serde(default)]
    unit_eras: BTreeMap<String, String>,
    #[serde(default)]
    annotations: bool,
}

#[derive(Debug, Serialize)]
struct Chart {
    source: StatsSource,
    chart: ChartType,
    series: Vec<Series>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    markers: Vec<GvgMarker>,
}

async fn stats_series(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SeriesQuery>,
) -> ApiResult<UiUpdate> {
    let eras: Vec<String> = if query.eras.is_empty() {
        PLAYABLE_ERAS.iter().map(|e| e.to_string()).collect()
    } else {
        query.eras.clone()
    };

    let engine = &state.engine;
    let mut markers = Vec::new();
    let mut series = match query.source {
        StatsSource::GbgPlayers => {
            leaderboard_series(&engine.load_leaderboard()?, &engine.load_player_cache()?)
        }
        StatsSource::Units | StatsSource::UnitsDaily => {
            unit_series(&engine.load_army(query.source)?, &eras, &query.unit_eras)
        }
        src if src.is_treasure() => {
            let snapshots = engine.load_treasury(src, query.clan_id)?;
            if query.annotations && src.is_clan() {
                markers = detect_gvg_spending(&snapshots);
            }
            if query.by_era {
                treasure_by_era_series(&snapshots, &eras)
            } else {
                treasure_series(&snapshots, &eras)
            }
        }
        other => {
            return Err(ApiError::bad_request(format!(
                "{other} is charted by /api/stats/rewards/breakdown"
            )))
        }
    };
    let chart = shape_for_chart(&mut series, query.chart, query.source);

    let payload = serde_json::to_value(Chart {
        source: query.source,
        chart,
        series,
        markers,
    })
    .map_err(anyhow::Error::from)?;
    Ok(Json(UiUpdate::new(
        "stats.series",
        vec![Patch::payload(targets::STATS_CHART, payload)],
    )))
}

#[derive(Debug, Deserialize)]
struct BreakdownQuery {
    source: String,
    #[serde(default)]
    period: Period,
}

async fn rewards_breakdown(
    State(state): State<Arc<AppState>>,
    Json(query): Json<BreakdownQuery>,
) -> ApiResult<Vec<RewardSlice>> {
    let since = query.period.start_ms(now_ms());
    let rows = state.engine.load_rewards_since(since)?;
    let types = state.engine.load_reward_types()?;
    Ok(Json(reward_breakdown(&rows, &types, &query.source)))
}

// ---------------------------------------------------------------------------
// Serving
// ---------------------------------------------------------------------------

pub async fn serve(
    addr: SocketAddr,
    db_path: PathBuf,
    extension_ids: Vec<String>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_listener(listener, db_path, extension_ids, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

pub async fn serve_listener(
    listener: tokio::net::TcpListener,
    db_path: PathBuf,
    extension_ids: Vec<String>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<SocketAddr> {
    let engine = Engine::new(db_path);
    // Fail fast if the database cannot be opened or migrated.
    engine.open()?;

    if extension_ids.is_empty() {
        tracing::warn!("no extension ids configured; extension origins will be refused");
    }
    let app = build_router(AppState::new(engine).with_extension_ids(extension_ids));
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "cityscope server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(addr)
}

async fn ip_allowlist(
    axum::extract::ConnectInfo(peer): axum::extract::ConnectInfo<SocketAddr>,
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    let ip = peer.ip();
    if is_allowed_peer_ip(ip) {
        return next.run(req).await;
    }
    tracing::warn!(%ip, "rejected peer");
    (StatusCode::FORBIDDEN, "forbidden").into_response()
}

fn is_allowed_peer_ip(ip: IpAddr) -> bool {
    if ip.is_loopback() {
        return true;
    }

    // Tailscale CGNAT range (100.64.0.0/10).
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            o[0] == 100 && (64..=127).contains(&o[1])
        }
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .is_some_and(|v4| is_allowed_peer_ip(IpAddr::V4(v4))),
    }
}

fn local_only_cors(extension_ids: &[String]) -> CorsLayer {
    use axum::http::header;
    use axum::http::HeaderValue;
    use axum::http::Method;

    let extension_ids: Arc<[String]> = extension_ids.into();
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            is_allowed_local_origin(origin, &extension_ids)
        }))
}

fn is_allowed_local_origin(origin: &axum::http::HeaderValue, extension_ids: &[String]) -> bool {
    let Ok(s) = origin.to_str() else {
        return false;
    };

    // Only the configured extensions hosting the panel.
    for scheme in ["chrome-extension://", "moz-extension://"] {
        if let Some(id) = s.strip_prefix(scheme) {
            return extension_ids.iter().any(|allowed| allowed == id);
        }
    }

    is_http_origin_for_host(s, "localhost") || is_http_origin_for_host(s, "127.0.0.1")
}

fn is_http_origin_for_host(origin: &str, host: &str) -> bool {
    for scheme in ["http://", "https://"] {
        if let Some(rest) = origin.strip_prefix(scheme) {
            if let Some(after) = rest.strip_prefix(host) {
                // Origin is just scheme://host[:port]
                return after.is_empty() || after.starts_with(':');
            }
        }
    }
    false
}
