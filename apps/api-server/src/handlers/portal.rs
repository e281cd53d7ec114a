//! Portal handlers - profile, auto-saved draft, UCAT tracker, shortlist.
//!
//! Every handler takes the [`Identity`] extractor, so requests without a
//! valid Bearer token are rejected before any repository work. Rows are
//! always scoped to the authenticated user.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use meridian_core::domain::{ShortlistEntry, StudentProfile, UcatAttempt};
use meridian_core::ports::{BaseRepository, ProfileRepository, ShortlistRepository, UcatRepository};
use meridian_infra::SaveState;
use meridian_shared::dto::{
    DraftStatusResponse, NewShortlistEntryRequest, NewUcatAttemptRequest, ProfileForm,
};
use meridian_shared::response::ApiResponse;

use crate::drafts::apply_form;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/portal/profile
pub async fn get_profile(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let profile = state
        .profiles
        .find_by_user(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile has not been set up yet".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(profile)))
}

/// PUT /api/portal/profile
pub async fn put_profile(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<ProfileForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    if form.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("Full name is required".to_string()));
    }

    let mut profile = state
        .profiles
        .find_by_user(identity.user_id)
        .await?
        .unwrap_or_else(|| StudentProfile::new(identity.user_id, form.full_name.clone()));
    apply_form(&mut profile, &form);

    let saved = state.profiles.save(profile).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(saved)))
}

/// PUT /api/portal/profile/draft
///
/// Feeds the auto-save pipeline. The write is acknowledged immediately;
/// persistence happens after the debounce quiescence period.
pub async fn put_profile_draft(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<ProfileForm>,
) -> AppResult<HttpResponse> {
    let controller = state.drafts.controller(identity.user_id).await;
    controller.update(body.into_inner()).await;

    Ok(HttpResponse::Accepted().json(ApiResponse::ok(draft_status(controller.state()))))
}

/// POST /api/portal/profile/draft/save
///
/// Skips the debounce and persists the latest draft now.
pub async fn save_profile_draft(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let controller = state.drafts.controller(identity.user_id).await;
    controller.manual_save().await;

    Ok(HttpResponse::Accepted().json(ApiResponse::ok(draft_status(controller.state()))))
}

/// GET /api/portal/profile/draft/status
pub async fn get_draft_status(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let status = state
        .drafts
        .status(identity.user_id)
        .await
        .map(draft_status)
        .unwrap_or(DraftStatusResponse {
            status: "idle".to_string(),
            last_saved: None,
            error: None,
        });

    Ok(HttpResponse::Ok().json(ApiResponse::ok(status)))
}

fn draft_status(state: SaveState) -> DraftStatusResponse {
    DraftStatusResponse {
        status: state.status.as_str().to_string(),
        last_saved: state.last_saved,
        error: state.error,
    }
}

/// GET /api/portal/ucat
pub async fn list_ucat(identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let attempts = state.ucat.list_for_user(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(attempts)))
}

/// POST /api/portal/ucat
pub async fn add_ucat(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<NewUcatAttemptRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let attempt = UcatAttempt::new(
        identity.user_id,
        req.sat_on,
        req.verbal_reasoning,
        req.decision_making,
        req.quantitative_reasoning,
        req.abstract_reasoning,
        req.situational_judgement_band,
    )?;

    let saved = state.ucat.save(attempt).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(saved)))
}

/// DELETE /api/portal/ucat/{id}
pub async fn delete_ucat(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    // Another user's row reads as absent, not forbidden.
    let attempt = state
        .ucat
        .find_by_id(id)
        .await?
        .filter(|a| a.user_id == identity.user_id)
        .ok_or_else(|| AppError::NotFound("UCAT attempt not found".to_string()))?;

    state.ucat.delete(attempt.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/portal/shortlist
pub async fn list_shortlist(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let entries = state.shortlist.list_for_user(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(entries)))
}

/// POST /api/portal/shortlist
pub async fn add_shortlist(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<NewShortlistEntryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    if req.university.trim().is_empty() || req.course.trim().is_empty() {
        return Err(AppError::BadRequest(
            "University and course are required".to_string(),
        ));
    }

    let mut entry = ShortlistEntry::new(
        identity.user_id,
        req.university.trim().to_string(),
        req.course.trim().to_string(),
    );
    entry.ucas_code = req.ucas_code;
    entry.notes = req.notes;

    let saved = state.shortlist.save(entry).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(saved)))
}

/// DELETE /api/portal/shortlist/{id}
pub async fn delete_shortlist(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let entry = state
        .shortlist
        .find_by_id(id)
        .await?
        .filter(|e| e.user_id == identity.user_id)
        .ok_or_else(|| AppError::NotFound("Shortlist entry not found".to_string()))?;

    state.shortlist.delete(entry.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
