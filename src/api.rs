//! REST API for the load planner.
//!
//! Serves the optimizer over HTTP (plain JSON and Server-Sent Events) next to presets
//! for standard equipment and the OpenAPI documentation. CORS is open.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::capacity::{ContainerSizeClass, PalletCapacity, PalletFootprintClass};
use crate::layout::LayerFit;
use crate::config::{ApiConfig, OptimizerConfig};
use crate::model::{
    AxisOrder, CandidateSummary, CartonPlacement, CartonSpec, Constraints, ContainerContents,
    ContainerSpec, ContentType, LoadRequest, OptimizationResult, Orientation, PackedContainer,
    PackedPallet, PalletSpec, PlacementStrategy,
};
use crate::optimizer::{PackingConfig, optimize_with_config, optimize_with_progress};

#[derive(Clone)]
struct ApiState {
    packing: PackingConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>load-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

/// Unwraps the body and runs the structural checks.
///
/// Degenerate dimensions pass; the optimizer answers them with an empty plan.
fn parse_load_request(
    payload: Result<Json<LoadRequest>, JsonRejection>,
) -> Result<LoadRequest, Response> {
    let Json(request) = payload.map_err(json_deserialize_error)?;
    request
        .check_structure()
        .map_err(|err| validation_error(err.to_string()))?;
    Ok(request)
}

/// A named standard container.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ContainerPreset {
    pub name: &'static str,
    pub container: ContainerSpec,
    pub size_class: ContainerSizeClass,
}

/// A named standard pallet.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PalletPreset {
    pub name: &'static str,
    pub pallet: PalletSpec,
    pub footprint_class: PalletFootprintClass,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PresetsResponse {
    pub containers: Vec<ContainerPreset>,
    pub pallets: Vec<PalletPreset>,
}

const CONTAINER_PRESETS: [(&str, ContainerSpec); 3] = [
    (
        "20ft",
        ContainerSpec {
            length: 589.0,
            width: 235.0,
            height: 239.0,
            max_weight: 28_200.0,
        },
    ),
    (
        "40ft",
        ContainerSpec {
            length: 1203.0,
            width: 235.0,
            height: 239.0,
            max_weight: 26_700.0,
        },
    ),
    (
        "40ft HC",
        ContainerSpec {
            length: 1203.0,
            width: 235.0,
            height: 269.0,
            max_weight: 26_500.0,
        },
    ),
];

const PALLET_PRESETS: [(&str, PalletSpec); 2] = [
    (
        "Euro",
        PalletSpec {
            length: 120.0,
            width: 80.0,
            height: 14.4,
            max_weight: 1500.0,
        },
    ),
    (
        "US",
        PalletSpec {
            length: 121.9,
            width: 101.6,
            height: 14.4,
            max_weight: 1200.0,
        },
    ),
];

fn presets() -> PresetsResponse {
    PresetsResponse {
        containers: CONTAINER_PRESETS
            .iter()
            .map(|(name, container)| ContainerPreset {
                name: *name,
                container: *container,
                size_class: ContainerSizeClass::classify(container),
            })
            .collect(),
        pallets: PALLET_PRESETS
            .iter()
            .map(|(name, pallet)| PalletPreset {
                name: *name,
                pallet: *pallet,
                footprint_class: PalletFootprintClass::classify(pallet.length, pallet.width),
            })
            .collect(),
    }
}

#[derive(Serialize, ToSchema)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_optimize, handle_optimize_stream, handle_presets, handle_health),
    components(
        schemas(
            LoadRequest,
            CartonSpec,
            PalletSpec,
            ContainerSpec,
            Constraints,
            OptimizationResult,
            PackedContainer,
            ContainerContents,
            ContentType,
            PackedPallet,
            CartonPlacement,
            Orientation,
            AxisOrder,
            PlacementStrategy,
            CandidateSummary,
            PresetsResponse,
            ContainerPreset,
            PalletPreset,
            PalletCapacity,
            LayerFit,
            ContainerSizeClass,
            PalletFootprintClass,
            HealthResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "optimization", description = "Carton loading optimization"),
        (name = "reference", description = "Presets and service status")
    )
)]
struct ApiDoc;

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(config: ApiConfig, optimizer_config: OptimizerConfig) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        packing: optimizer_config.packing_config(),
    };

    let app = Router::new()
        .route("/optimize", post(handle_optimize))
        .route("/optimize_stream", post(handle_optimize_stream))
        .route("/presets", get(handle_presets))
        .route("/health", get(handle_health))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    println!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /optimize");
    println!("   - POST /optimize_stream");
    println!("   - GET /presets");
    println!("   - GET /health");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /optimize.
///
/// Computes the complete load plan for one carton type.
#[utoipa::path(
    post,
    path = "/optimize",
    request_body = LoadRequest,
    responses(
        (status = 200, description = "Load plan; may place nothing for degenerate input", body = OptimizationResult),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Malformed body or pallet loading without a pallet",
            body = ErrorResponse
        )
    ),
    tag = "optimization"
)]
async fn handle_optimize(
    State(state): State<ApiState>,
    payload: Result<Json<LoadRequest>, JsonRejection>,
) -> Response {
    let request = match parse_load_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    println!(
        "📥 New optimize request: {} cartons, {}",
        request.carton.quantity,
        if request.use_pallets {
            "palletized"
        } else {
            "direct loading"
        }
    );
    let result = optimize_with_config(&request, state.packing);
    println!(
        "📦 Result: {} cartons packed, {} remaining, {} containers",
        result.total_cartons_packed, result.remaining_cartons, result.containers_used
    );
    if let Some(warning) = &result.weight_warning {
        println!("⚠️ {}", warning);
    }
    if !result.is_complete() {
        println!(
            "⚠️ {} cartons could not be placed",
            result.remaining_cartons
        );
    }
    if result.unit_cap_reached {
        println!("⚠️ Unit cap of {} reached", state.packing.max_units);
    }

    (StatusCode::OK, Json(result)).into_response()
}

/// Handler for POST /optimize_stream (SSE).
///
/// Streams progress events, then the complete plan as a `result` event.
#[utoipa::path(
    post,
    path = "/optimize_stream",
    request_body = LoadRequest,
    responses(
        (
            status = 200,
            description = "Streams optimization events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Malformed body or pallet loading without a pallet",
            body = ErrorResponse
        )
    ),
    tag = "optimization"
)]
async fn handle_optimize_stream(
    State(state): State<ApiState>,
    payload: Result<Json<LoadRequest>, JsonRejection>,
) -> Response {
    let request = match parse_load_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<Event>(32);
    let packing = state.packing;

    tokio::task::spawn_blocking(move || {
        let result = optimize_with_progress(&request, packing, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver drops the remaining events.
                let _ = tx.blocking_send(Event::default().data(json));
            }
        });
        if let Ok(json) = serde_json::to_string(&result) {
            let _ = tx.blocking_send(Event::default().event("result").data(json));
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, std::convert::Infallible>);
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for GET /presets.
#[utoipa::path(
    get,
    path = "/presets",
    responses((status = 200, description = "Standard containers and pallets", body = PresetsResponse)),
    tag = "reference"
)]
async fn handle_presets() -> Json<PresetsResponse> {
    Json(presets())
}

/// Handler for GET /health.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "reference"
)]
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
