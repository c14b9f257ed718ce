use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod calibration;
mod config;
mod context;
mod coords;
mod field;
mod fill;
mod icons;
mod images;
mod pdf_metrics;
mod pdf_writer;
mod position;
mod preview;
mod store;

#[cfg(test)]
mod fill_tests;

use calibration::{CalibrationConfig, DriftSample, RenderContext};
use config::Config;
use context::GlobalContext;
use field::{Field, PositionOverrides, ValueMap, validate_fields};
use store::PageSize;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Fill a PDF with field values and write the result
    Fill {
        /// Source PDF
        pdf: PathBuf,
        /// JSON array of fields
        #[arg(long)]
        fields: PathBuf,
        /// JSON object of slug -> value
        #[arg(long)]
        values: Option<PathBuf>,
        /// JSON object of field id -> {x, y}
        #[arg(long)]
        overrides: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the SVG preview of one page's fields
    Preview {
        pdf: PathBuf,
        #[arg(long)]
        fields: PathBuf,
        #[arg(long)]
        values: Option<PathBuf>,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "1.0")]
        scale: f64,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Suggest calibration offsets from logged drift samples
    Calibrate {
        /// JSON array of drift samples
        samples: PathBuf,
    },
}

fn read_json<T: DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: Option<&std::path::Path>) -> Result<T> {
    path.map_or_else(|| Ok(T::default()), read_json)
}

#[derive(Serialize)]
struct Status {
    status: String,
    version: &'static str,
}

async fn get_status() -> Json<Status> {
    Json(Status {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct Uploaded {
    id: String,
    pages: usize,
}

async fn upload_document(
    State(ctx): State<Arc<GlobalContext>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, StatusCode> {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                let pages = ctx.documents.put(&id, &data).map_err(|e| {
                    log::warn!("rejected upload for {id}: {e:#}");
                    StatusCode::UNPROCESSABLE_ENTITY
                })?;
                return Ok(Json(Uploaded { id, pages }));
            }
            Ok(None) => break,
            Err(_) => return Err(StatusCode::BAD_REQUEST),
        }
    }
    Err(StatusCode::BAD_REQUEST)
}

async fn get_fields(State(ctx): State<Arc<GlobalContext>>, Path(id): Path<String>) -> Json<Vec<Field>> {
    Json(ctx.fields.list_fields(&id))
}

#[derive(Serialize)]
struct Saved {
    count: usize,
}

async fn put_fields(
    State(ctx): State<Arc<GlobalContext>>,
    Path(id): Path<String>,
    Json(fields): Json<Vec<Field>>,
) -> Result<Json<Saved>, StatusCode> {
    let count = ctx.fields.replace_fields(&id, fields).map_err(|e| {
        log::warn!("rejected fields for {id}: {e:#}");
        StatusCode::BAD_REQUEST
    })?;
    Ok(Json(Saved { count }))
}

#[derive(Deserialize)]
struct PositionParams {
    scale: Option<f64>,
    context: Option<RenderContext>,
}

async fn get_positions(
    State(ctx): State<Arc<GlobalContext>>,
    Path(id): Path<String>,
    Query(params): Query<PositionParams>,
) -> Result<impl IntoResponse, StatusCode> {
    if !ctx.documents.exists(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let context = params.context.unwrap_or(RenderContext::Preview);
    let scale = match context {
        RenderContext::Pdf => 1.0,
        RenderContext::Preview => params.scale.unwrap_or(1.0),
    };
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let positions = ctx.positions(&id, scale, context).map_err(|e| {
        log::error!("positions for {id}: {e:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(positions))
}

#[derive(Deserialize)]
struct PreviewParams {
    page: Option<u32>,
    scale: Option<f64>,
}

async fn get_preview(
    State(ctx): State<Arc<GlobalContext>>,
    Path(id): Path<String>,
    Query(params): Query<PreviewParams>,
) -> Result<impl IntoResponse, StatusCode> {
    if !ctx.documents.exists(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let page = params.page.unwrap_or(1);
    let scale = params.scale.unwrap_or(1.0);
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let doc = ctx.documents.load(&id).map_err(|e| {
        log::error!("loading {id}: {e:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let size = page
        .checked_sub(1)
        .and_then(|i| doc.pages.get(i as usize))
        .copied()
        .ok_or(StatusCode::NOT_FOUND)?;
    let fields = ctx.fields.list_fields(&id);
    match preview::generate_svg(&fields, &ValueMap::new(), page, size, scale, &ctx.config.calibration) {
        Ok(content) => Ok(([(header::CONTENT_TYPE, "image/svg+xml")], content).into_response()),
        Err(e) => {
            log::error!("SVG preview error: {e:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct FillRequest {
    values: ValueMap,
    position_overrides: PositionOverrides,
}

async fn fill_document(
    State(ctx): State<Arc<GlobalContext>>,
    Path(id): Path<String>,
    Json(request): Json<FillRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if !ctx.documents.exists(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let timeout = ctx.config.fill_timeout();
    let worker = {
        let ctx = Arc::clone(&ctx);
        let id = id.clone();
        tokio::task::spawn_blocking(move || ctx.fill_stored(&id, &request.values, &request.position_overrides))
    };
    match tokio::time::timeout(timeout, worker).await {
        Ok(Ok(Ok(filled))) => {
            // Only a fill that beat the timeout is kept.
            if let Err(e) = ctx.documents.save_filled(&id, &filled.bytes) {
                log::error!("storing filled {id} failed: {e:#}");
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
            Ok(([(header::CONTENT_TYPE, "application/pdf")], filled.bytes).into_response())
        }
        Ok(Ok(Err(e))) => {
            log::error!("fill of {id} failed: {e:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Ok(Err(e)) => {
            log::error!("fill worker for {id} crashed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => {
            log::error!("fill of {id} timed out after {}s", timeout.as_secs());
            Err(StatusCode::GATEWAY_TIMEOUT)
        }
    }
}

fn router(ctx: Arc<GlobalContext>) -> Router {
    let body_limit = ctx.config.max_upload_bytes;
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/documents/:id", post(upload_document))
        .route("/api/documents/:id/fields", get(get_fields).put(put_fields))
        .route("/api/documents/:id/positions", get(get_positions))
        .route("/api/documents/:id/preview", get(get_preview))
        .route("/api/documents/:id/fill", post(fill_document))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn serve(config: Config, port: u16) -> Result<()> {
    let ctx = Arc::new(GlobalContext::new(config));
    let app = router(ctx);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    log::info!("listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn run_fill(
    config: &Config,
    pdf: &std::path::Path,
    fields: &std::path::Path,
    values: Option<&std::path::Path>,
    overrides: Option<&std::path::Path>,
    output: &std::path::Path,
) -> Result<()> {
    let source = std::fs::read(pdf).with_context(|| format!("reading {}", pdf.display()))?;
    let fields: Vec<Field> = read_json(fields)?;
    validate_fields(&fields)?;
    let values: ValueMap = read_json_or_default(values)?;
    let overrides: PositionOverrides = read_json_or_default(overrides)?;

    let fetcher = images::HttpFetcher::new(config.fetch_timeout())?;
    let filled = fill::FillEngine::new(&config.calibration, &fetcher).fill(&source, &fields, &values, &overrides)?;
    std::fs::write(output, &filled.bytes).with_context(|| format!("writing {}", output.display()))?;
    println!("{}", serde_json::to_string_pretty(&filled.report)?);
    Ok(())
}

fn run_preview(
    config: &Config,
    pdf: &std::path::Path,
    fields: &std::path::Path,
    values: Option<&std::path::Path>,
    page: u32,
    scale: f64,
    output: &std::path::Path,
) -> Result<()> {
    let source = std::fs::read(pdf).with_context(|| format!("reading {}", pdf.display()))?;
    let doc = pdf_writer::PdfDocument::load(&source)?;
    let info = doc
        .page(page)
        .with_context(|| format!("page {page} does not exist ({} pages)", doc.page_count()))?;
    let fields: Vec<Field> = read_json(fields)?;
    let values: ValueMap = read_json_or_default(values)?;
    let size = PageSize { width: info.width(), height: info.height() };
    let svg = preview::generate_svg(&fields, &values, page, size, scale, &config.calibration)?;
    std::fs::write(output, svg).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn run_calibrate(config: &Config, samples: &std::path::Path) -> Result<()> {
    let samples: Vec<DriftSample> = read_json(samples)?;
    let current: &CalibrationConfig = &config.calibration;
    let suggestion = calibration::suggest_offsets(current, &samples);
    println!("{}", serde_json::to_string_pretty(&suggestion)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Fill { pdf, fields, values, overrides, output }) => {
            run_fill(&config, &pdf, &fields, values.as_deref(), overrides.as_deref(), &output)
        }
        Some(Commands::Preview { pdf, fields, values, page, scale, output }) => {
            run_preview(&config, &pdf, &fields, values.as_deref(), page, scale, &output)
        }
        Some(Commands::Calibrate { samples }) => run_calibrate(&config, &samples),
        Some(Commands::Serve { port }) => tokio::runtime::Runtime::new()?.block_on(serve(config, port)),
        None => tokio::runtime::Runtime::new()?.block_on(serve(config, 3000)),
    }
}
