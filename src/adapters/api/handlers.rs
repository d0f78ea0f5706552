use axum::{
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::adapters::api::dtos::{
    GenerateRequestBody, GenerateResponse, PartPageCount, PartSummary, PartitionRequestBody,
    PartitionResponse, ScoreCreatedResponse,
};
use crate::config::AppConfig;
use crate::domain::errors::CoreError;
use crate::domain::ids::ScoreId;
use crate::domain::part::{LayoutParams, Part};
use crate::domain::partition_planner::{self, PartitionRequest};
use crate::domain::raster;
use crate::domain::score::PageSummary;
use crate::domain::staff_detector::{self, DetectionResult, DetectorConfig};
use crate::domain::{layout_renderer, score::RASTER_DPI};
use crate::ports::raster_backend::PdfRasterBackend;
use crate::ports::score_store::ScoreStore;

/// Upload size cap for the multipart PDF ingest route.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
const MM_PER_INCH: f32 = 25.4;

/// Server-side scratch state scoped to one score session: the last
/// partition result (so `generate` doesn't need the divider map resent)
/// and any PDFs already rendered for `get_part_pdf`. Not part of the
/// score cache itself — evicted alongside it is unnecessary since it is
/// tiny relative to raster bytes, but it is cleared when the score is.
#[derive(Default)]
struct SessionState {
    parts: Vec<Part>,
    generated: HashMap<String, Vec<u8>>,
}

pub struct AppStateInner {
    pub score_store: Arc<dyn ScoreStore>,
    pub raster_backend: Arc<dyn PdfRasterBackend>,
    pub config: AppConfig,
    sessions: Mutex<HashMap<ScoreId, SessionState>>,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn new(score_store: Arc<dyn ScoreStore>, raster_backend: Arc<dyn PdfRasterBackend>, config: AppConfig) -> Self {
        Self {
            score_store,
            raster_backend,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

/// POST /api/v1/scores — multipart PDF upload, rasterised and cached.
pub async fn create_score(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, CoreError> {
    let mut pdf_bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoreError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| CoreError::InvalidInput(format!("failed to read upload: {e}")))?;
            if data.len() > MAX_UPLOAD_BYTES {
                return Err(CoreError::InvalidInput("upload exceeds maximum size".into()));
            }
            pdf_bytes = Some(data.to_vec());
        }
    }
    let pdf_bytes = pdf_bytes.ok_or_else(|| CoreError::InvalidInput("missing 'file' field".into()))?;

    let score = raster::rasterize(state.raster_backend.as_ref(), &pdf_bytes, state.config.max_page_bytes)?;
    let page_count = score.page_count();
    let pages: Vec<PageSummary> = score.pages.iter().map(PageSummary::from).collect();
    let score_id = state.score_store.insert(score)?;
    log::info!("ingested score {score_id} ({page_count} pages)");

    Ok((
        StatusCode::CREATED,
        Json(ScoreCreatedResponse { score_id: score_id.to_string(), page_count, pages }),
    ))
}

/// GET /api/v1/scores/:score_id/pages/:page_index/raster
pub async fn get_page_raster(
    State(state): State<AppState>,
    Path((score_id, page_index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, CoreError> {
    let id = parse_id(&score_id)?;
    let score = state.score_store.get(id)?;
    let page = score
        .page(page_index)
        .ok_or_else(|| CoreError::InvalidInput(format!("page {page_index} out of range")))?;

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8((*page.raster).clone())
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| CoreError::Internal(format!("PNG encode failed: {e}")))?;

    Ok((
        [(header::CONTENT_TYPE, "image/png")],
        png,
    ))
}

#[derive(serde::Deserialize)]
pub struct DetectQuery {
    pub display_width: u32,
}

/// GET /api/v1/scores/:score_id/pages/:page_index/detect?display_width=
pub async fn detect_staves(
    State(state): State<AppState>,
    Path((score_id, page_index)): Path<(String, usize)>,
    Query(query): Query<DetectQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let id = parse_id(&score_id)?;
    let score = state.score_store.get(id)?;
    let page = score
        .page(page_index)
        .ok_or_else(|| CoreError::InvalidInput(format!("page {page_index} out of range")))?;

    let mut result: DetectionResult = staff_detector::detect(&page.raster, &DetectorConfig::default());
    if result.confidence < 0.3 {
        log::warn!("low-confidence detection on score {id} page {page_index}: {}", result.confidence);
    }

    let scale = query.display_width as f32 / page.width_px.max(1) as f32;
    for y in result.dividers.iter_mut() {
        *y *= scale;
    }

    Ok(Json(result))
}

/// POST /api/v1/scores/:score_id/partition
pub async fn partition_score(
    State(state): State<AppState>,
    Path(score_id): Path<String>,
    Json(body): Json<PartitionRequestBody>,
) -> Result<impl IntoResponse, CoreError> {
    let id = parse_id(&score_id)?;
    let score = state.score_store.get(id)?;

    let pages: BTreeMap<usize, crate::domain::divider::DividerSet> = body.pages;
    let request = PartitionRequest {
        display_width: body.display_width,
        pages: &pages,
        header: body.header,
        markings: &body.markings,
    };
    let parts = partition_planner::partition(&score, &request);

    let config = layout_renderer::RenderConfig::default();
    let response = PartitionResponse {
        parts: parts
            .iter()
            .map(|p| PartSummary::from_part(p, config.title_area_px, config.available_height_px()))
            .collect(),
    };

    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| CoreError::Internal("session mutex poisoned".into()))?;
    sessions.entry(id).or_default().parts = parts;

    Ok(Json(response))
}

/// POST /api/v1/scores/:score_id/generate
pub async fn generate_parts(
    State(state): State<AppState>,
    Path(score_id): Path<String>,
    Json(body): Json<GenerateRequestBody>,
) -> Result<impl IntoResponse, CoreError> {
    let id = parse_id(&score_id)?;
    let score = state.score_store.get(id)?;

    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| CoreError::Internal("session mutex poisoned".into()))?;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| CoreError::InvalidInput("call partition before generate".into()))?;

    let render_config = layout_renderer::RenderConfig::default();
    let mut counts = Vec::new();

    for part in session.parts.iter_mut() {
        if let Some(overrides) = body.parts.get(&part.name) {
            part.layout = LayoutParams {
                spacing_px: overrides.spacing_mm / MM_PER_INCH * RASTER_DPI,
                offsets_px: overrides.offsets.iter().map(|&o| o as f32).collect(),
                page_breaks_after: overrides.page_breaks_after.clone(),
            };
        }

        let page_count = layout_renderer::page_count(part, &render_config)?;
        let pdf_bytes = layout_renderer::render(&score, part, &render_config)?;
        log::info!("generated part '{}' for score {id}: {page_count} pages", part.name);

        session.generated.insert(part.name.clone(), pdf_bytes);
        counts.push(PartPageCount { name: part.name.clone(), page_count });
    }

    Ok(Json(GenerateResponse { parts: counts }))
}

/// GET /api/v1/scores/:score_id/parts/:part_name/pdf
pub async fn get_part_pdf(
    State(state): State<AppState>,
    Path((score_id, part_name)): Path<(String, String)>,
) -> Result<Response, CoreError> {
    let id = parse_id(&score_id)?;
    let sessions = state
        .sessions
        .lock()
        .map_err(|_| CoreError::Internal("session mutex poisoned".into()))?;
    let session = sessions
        .get(&id)
        .ok_or_else(|| CoreError::InvalidInput("no generated parts for this score".into()))?;
    let bytes = session
        .generated
        .get(&part_name)
        .ok_or_else(|| CoreError::InvalidInput(format!("part '{part_name}' has not been generated")))?
        .clone();

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}

fn parse_id(raw: &str) -> Result<ScoreId, CoreError> {
    ScoreId::parse(raw).map_err(|_| CoreError::UnknownScoreId(raw.to_string()))
}
