use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{calculate_compatibility, RankOptions};
use crate::models::{
    AnalyzeVacancyRequest, CompatibilityInput, ErrorResponse, HealthResponse, RankCandidatesRequest,
    RankCandidatesResponse,
};
use crate::routes::{validation_failed, AppState};
use crate::services::BackendError;

/// Configure all scoring routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/compatibility/score", web::post().to(score_compatibility))
        .route("/compatibility/rank", web::post().to(rank_candidates))
        .route("/vacancies/{vacancy_id}/analyze", web::post().to(analyze_vacancy))
        .route("/vacancies/{vacancy_id}/scores", web::get().to(vacancy_scores));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = match &state.postgres {
        Some(pg) => pg.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Score one candidate profile
///
/// POST /api/v1/compatibility/score
///
/// Request body:
/// ```json
/// {
///   "requirementsText": "react, sql, node",
///   "candidateSkillsText": "React y SQL avanzado",
///   "candidateExperienceText": ""
/// }
/// ```
async fn score_compatibility(req: web::Json<CompatibilityInput>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    HttpResponse::Ok().json(calculate_compatibility(&req))
}

/// Rank candidates supplied in the request body
///
/// POST /api/v1/compatibility/rank
async fn rank_candidates(
    state: web::Data<AppState>,
    req: web::Json<RankCandidatesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let req = req.into_inner();
    let options = RankOptions {
        min_score: req.min_score,
        limit: Some(req.limit.map(usize::from).unwrap_or(state.default_limit)),
    };

    let result = state
        .matcher
        .rank_candidates(&req.requirements_text, req.candidates, options);

    HttpResponse::Ok().json(RankCandidatesResponse {
        candidates: result.candidates,
        total_candidates: result.total_candidates,
        total_requirements: result.total_requirements,
    })
}

/// Score every postulation of a vacancy and store the results
///
/// POST /api/v1/vacancies/{vacancy_id}/analyze
///
/// Every postulation is scored and persisted; `limit` only trims the
/// response.
async fn analyze_vacancy(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: Option<web::Json<AnalyzeVacancyRequest>>,
) -> impl Responder {
    let vacancy_id = path.into_inner();
    let options = body.map(web::Json::into_inner).unwrap_or_default();

    tracing::info!("Analyzing postulations for vacancy {}", vacancy_id);

    let requirements = match state.backend.get_vacancy_requirements(&vacancy_id).await {
        Ok(text) => text,
        Err(BackendError::NotFound(message)) => {
            return HttpResponse::NotFound().json(ErrorResponse::new("Vacancy not found", message, 404));
        }
        Err(e) => {
            tracing::error!("Failed to fetch vacancy {}: {}", vacancy_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to fetch vacancy",
                e.to_string(),
                500,
            ));
        }
    };

    let candidates = match state.backend.list_postulations(&vacancy_id).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to list postulations for {}: {}", vacancy_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to list postulations",
                e.to_string(),
                500,
            ));
        }
    };

    let mut result = state
        .matcher
        .rank_candidates(&requirements, candidates, RankOptions::default());

    for ranked in &result.candidates {
        if let Some(pg) = &state.postgres {
            if let Err(e) = pg.record_score(&ranked.postulation_id, &vacancy_id, &ranked.result).await {
                tracing::warn!("Failed to record score for {}: {}", ranked.postulation_id, e);
            }
        }

        if !options.dry_run {
            // Best-effort: the score history above is the source we read back
            if let Err(e) = state
                .backend
                .update_postulation_score(&ranked.postulation_id, ranked.result.score, ranked.result.feedback.comment())
                .await
            {
                tracing::warn!("Failed to write score back to postulation {}: {}", ranked.postulation_id, e);
            }
        }
    }

    tracing::info!(
        "Scored {} postulations for vacancy {} against {} requirements",
        result.total_candidates,
        vacancy_id,
        result.total_requirements
    );

    let limit = options
        .limit
        .map(usize::from)
        .unwrap_or(state.default_limit)
        .min(state.matcher.max_limit());
    result.candidates.truncate(limit);

    HttpResponse::Ok().json(RankCandidatesResponse {
        candidates: result.candidates,
        total_candidates: result.total_candidates,
        total_requirements: result.total_requirements,
    })
}

/// Stored score history of a vacancy
///
/// GET /api/v1/vacancies/{vacancy_id}/scores
async fn vacancy_scores(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let Some(pg) = &state.postgres else {
        return HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
            "Score history unavailable",
            "No database is configured",
            503,
        ));
    };

    let vacancy_id = path.into_inner();
    match pg.get_scores_for_vacancy(&vacancy_id).await {
        Ok(scores) => HttpResponse::Ok().json(serde_json::json!({
            "vacancyId": vacancy_id,
            "scores": scores,
            "count": scores.len(),
        })),
        Err(e) => {
            tracing::error!("Failed to fetch scores for {}: {}", vacancy_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to fetch scores",
                e.to_string(),
                500,
            ))
        }
    }
}
