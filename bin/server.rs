// Aurum Calc - Web Server
// REST API over the calculator, rate and ledger with Axum

use aurum_calc::{
    compute_impurity_to_add, decompose_purity, delete_entry, format_last_updated, get_all_entries,
    get_rate_history, grams_for_amount, grams_from_tmr_input, insert_entry, karat_rate_table,
    logging, parse_number, purity, search_conversion_table, tmr_from_grams, value_of,
    waist_from_input, Config, ConversionRow, Customer, Database, EntryDraft, GoldEntry,
    ImpurityMix, Karat, KaratRate, LedgerTotals, PurityBreakdown, RateChange, RateState,
    SaleSlip, SlipBasis, Tmr, WaistMethod,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    rate: Arc<Mutex<RateState<Database>>>,
}

impl AppState {
    fn lock(&self) -> Result<MutexGuard<'_, RateState<Database>>, ApiError> {
        self.rate
            .lock()
            .map_err(|_| ApiError::internal("state lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Failed request, rendered as `ApiResponse` with `success: false`
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn not_found(message: impl ToString) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
        }
    }

    fn internal(message: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Request failed: {:#}", err);
        ApiError::internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Karat query parameter: empty means 24, anything else is coerced
fn karat_param(text: &str) -> u32 {
    if text.trim().is_empty() {
        24
    } else {
        parse_number(text).max(0.0) as u32
    }
}

// ============================================================================
// Request / response shapes
// ============================================================================

/// Weight given either as grams or as tola/masha/ratti
#[derive(Deserialize, Default)]
#[serde(default)]
struct WeightQuery {
    grams: String,
    tola: String,
    masha: String,
    ratti: String,
    karat: String,
}

impl WeightQuery {
    fn in_grams(&self) -> f64 {
        if !self.grams.trim().is_empty() {
            parse_number(&self.grams)
        } else {
            grams_from_tmr_input(&self.tola, &self.masha, &self.ratti)
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct MoneyQuery {
    amount: String,
    karat: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PurityQuery {
    weight: String,
    karat: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ImpurityQuery {
    pure: String,
    karat: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WaistQuery {
    method: String,
    weight: String,
    factor: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TableQuery {
    search: String,
}

#[derive(Serialize)]
struct RateResponse {
    rate: f64,
    updated_at: Option<DateTime<Utc>>,
    last_updated: String,
}

impl RateResponse {
    fn from_state(state: &RateState<Database>) -> Self {
        Self {
            rate: state.current_rate(),
            updated_at: state.last_updated(),
            last_updated: format_last_updated(state.last_updated()),
        }
    }
}

#[derive(Deserialize)]
struct RateUpdate {
    rate: f64,
}

#[derive(Serialize)]
struct ConversionResponse {
    grams: f64,
    tmr: Tmr,
}

#[derive(Serialize)]
struct ValueResponse {
    grams: f64,
    karat: u32,
    purity: f64,
    rate: f64,
    value: f64,
}

#[derive(Serialize)]
struct MoneyResponse {
    amount: f64,
    karat: u32,
    grams: f64,
    tmr: Tmr,
}

#[derive(Serialize)]
struct WaistResponse {
    method: WaistMethod,
    formula: &'static str,
    waist: f64,
}

#[derive(Deserialize)]
struct SlipRequest {
    #[serde(default)]
    customer: Customer,
    #[serde(default)]
    description: String,
    #[serde(default)]
    karat: Karat,
    #[serde(flatten)]
    basis: SlipBasis,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/rate - Current rate per tola of 24K
async fn get_rate(State(state): State<AppState>) -> ApiResult<RateResponse> {
    let rate = state.lock()?;
    ok(RateResponse::from_state(&rate))
}

/// PUT /api/rate - Replace the rate
async fn put_rate(
    State(state): State<AppState>,
    Json(update): Json<RateUpdate>,
) -> ApiResult<RateResponse> {
    let mut rate = state.lock()?;
    rate.update_rate(update.rate)
        .map_err(ApiError::bad_request)?;
    ok(RateResponse::from_state(&rate))
}

/// GET /api/rate/history - Past rate edits, newest first
async fn rate_history(State(state): State<AppState>) -> ApiResult<Vec<RateChange>> {
    let rate = state.lock()?;
    ok(get_rate_history(rate.store().conn())?)
}

/// GET /api/convert/tmr?tola=&masha=&ratti= - Tola/Masha/Ratti to grams
async fn convert_tmr(Query(q): Query<WeightQuery>) -> ApiResult<ConversionResponse> {
    let grams = grams_from_tmr_input(&q.tola, &q.masha, &q.ratti);
    ok(ConversionResponse {
        grams,
        tmr: tmr_from_grams(grams),
    })
}

/// GET /api/convert/grams?grams= - Grams to Tola/Masha/Ratti
async fn convert_grams(Query(q): Query<WeightQuery>) -> ApiResult<ConversionResponse> {
    let grams = parse_number(&q.grams);
    ok(ConversionResponse {
        grams,
        tmr: tmr_from_grams(grams),
    })
}

/// GET /api/value?grams=|tola=&masha=&ratti=&karat= - Value at the current rate
async fn value(
    State(state): State<AppState>,
    Query(q): Query<WeightQuery>,
) -> ApiResult<ValueResponse> {
    let rate = state.lock()?.current_rate();
    let grams = q.in_grams();
    let karat = karat_param(&q.karat);
    ok(ValueResponse {
        grams,
        karat,
        purity: purity(karat),
        rate,
        value: value_of(grams, karat, rate),
    })
}

/// GET /api/money?amount=&karat= - Gold an amount buys
async fn money(
    State(state): State<AppState>,
    Query(q): Query<MoneyQuery>,
) -> ApiResult<MoneyResponse> {
    let rate = state.lock()?.current_rate();
    let amount = parse_number(&q.amount);
    let karat = karat_param(&q.karat);
    let grams = grams_for_amount(amount, karat, rate);
    ok(MoneyResponse {
        amount,
        karat,
        grams,
        tmr: tmr_from_grams(grams),
    })
}

/// GET /api/purity?weight=&karat= - Pure gold and impurity in an item
async fn purity_breakdown(Query(q): Query<PurityQuery>) -> ApiResult<PurityBreakdown> {
    ok(decompose_purity(parse_number(&q.weight), karat_param(&q.karat)))
}

/// GET /api/impurity?pure=&karat= - Impurity to add to reach a karat
async fn impurity_mix(Query(q): Query<ImpurityQuery>) -> ApiResult<ImpurityMix> {
    ok(compute_impurity_to_add(parse_number(&q.pure), karat_param(&q.karat)))
}

/// GET /api/waist?method=grams|ratti&weight=&factor= - Wastage
async fn waist(Query(q): Query<WaistQuery>) -> ApiResult<WaistResponse> {
    let method = if q.method.trim().is_empty() {
        WaistMethod::default()
    } else {
        q.method.parse::<WaistMethod>().map_err(ApiError::bad_request)?
    };
    ok(WaistResponse {
        method,
        formula: method.formula(),
        waist: waist_from_input(method, &q.weight, &q.factor),
    })
}

/// GET /api/karats - Price per tola and gram for every karat
async fn karats(State(state): State<AppState>) -> ApiResult<Vec<KaratRate>> {
    let rate = state.lock()?.current_rate();
    ok(karat_rate_table(rate))
}

/// GET /api/table?search= - Ratti conversion table, optionally filtered
async fn conversion_table(Query(q): Query<TableQuery>) -> ApiResult<Vec<ConversionRow>> {
    ok(search_conversion_table(&q.search))
}

/// GET /api/entries - All ledger entries in insertion order
async fn list_entries(State(state): State<AppState>) -> ApiResult<Vec<GoldEntry>> {
    let rate = state.lock()?;
    ok(get_all_entries(rate.store().conn())?)
}

/// POST /api/entries - Price and store a new entry
async fn add_entry(
    State(state): State<AppState>,
    Json(draft): Json<EntryDraft>,
) -> Result<(StatusCode, Json<ApiResponse<GoldEntry>>), ApiError> {
    let rate = state.lock()?;
    let entry = GoldEntry::from_draft(&draft, rate.current_rate()).map_err(ApiError::bad_request)?;

    let db = rate.store();
    insert_entry(db.conn(), &entry, db.actor())?;
    info!("Ledger entry {} added", entry.id);

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(entry))))
}

/// DELETE /api/entries/:id - Remove one entry
async fn remove_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<String> {
    let rate = state.lock()?;
    let db = rate.store();
    if delete_entry(db.conn(), &id, db.actor())? {
        ok(id)
    } else {
        Err(ApiError::not_found(format!("No entry with id {}", id)))
    }
}

/// GET /api/entries/totals - Added, subtracted and balance
async fn entry_totals(State(state): State<AppState>) -> ApiResult<LedgerTotals> {
    let rate = state.lock()?;
    let entries = get_all_entries(rate.store().conn())?;
    ok(LedgerTotals::from_entries(&entries))
}

/// POST /api/slip - Compute a sale slip at the current rate
async fn sale_slip(
    State(state): State<AppState>,
    Json(request): Json<SlipRequest>,
) -> ApiResult<SaleSlip> {
    let rate = state.lock()?.current_rate();
    let slip = SaleSlip::calculate(
        request.customer,
        &request.description,
        &request.basis,
        request.karat,
        rate,
        Local::now(),
    )
    .map_err(ApiError::bad_request)?;
    ok(slip)
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/rate", get(get_rate).put(put_rate))
        .route("/rate/history", get(rate_history))
        .route("/convert/tmr", get(convert_tmr))
        .route("/convert/grams", get(convert_grams))
        .route("/value", get(value))
        .route("/money", get(money))
        .route("/purity", get(purity_breakdown))
        .route("/impurity", get(impurity_mix))
        .route("/waist", get(waist))
        .route("/karats", get(karats))
        .route("/table", get(conversion_table))
        .route("/entries", get(list_entries).post(add_entry))
        .route("/entries/totals", get(entry_totals))
        .route("/entries/:id", delete(remove_entry))
        .route("/slip", post(sale_slip))
        .with_state(state)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    logging::init(&config.log_level)?;

    println!("🌐 Aurum Calc - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db = Database::open(&config.database_path)?.with_actor("api");
    info!("Database opened: {}", config.database_path.display());

    let rate = RateState::load(db, config.default_rate);
    println!("✓ Gold rate: {} / tola", rate.current_rate());

    // Create shared state
    let state = AppState {
        rate: Arc::new(Mutex::new(rate)),
    };

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;

    println!("\n🚀 Server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/rate", config.server_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
