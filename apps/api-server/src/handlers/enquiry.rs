//! Public enquiry form handler.

use actix_web::{HttpResponse, web};

use meridian_core::domain::{Enquiry, EnquiryKind};
use meridian_core::ports::{BaseRepository, Mailer, OutboundEmail};
use meridian_shared::dto::{EnquiryAccepted, EnquiryKindDto, EnquiryRequest};
use meridian_shared::response::ApiResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/enquiries
///
/// Accepts a marketing-site form submission, persists it, and relays a
/// notification to the consultancy inbox. The enquiry counts as accepted
/// once persisted; a relay failure is logged rather than surfaced, so a
/// flaky email API never loses an enquiry.
pub async fn submit(
    state: web::Data<AppState>,
    body: web::Json<EnquiryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // Validate input
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if req.email.is_empty() || !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message is required".to_string()));
    }

    let kind = match req.kind {
        Some(EnquiryKindDto::Consultation) => EnquiryKind::Consultation,
        _ => EnquiryKind::General,
    };

    let enquiry = Enquiry::new(
        req.name.trim().to_string(),
        req.email.trim().to_string(),
        req.phone.filter(|p| !p.trim().is_empty()),
        req.message.trim().to_string(),
        kind,
    );
    let saved = state.enquiries.save(enquiry).await?;

    let email = notification_email(&saved, &state.enquiry_inbox);
    if let Err(e) = state.mailer.send(&email).await {
        tracing::error!(enquiry_id = %saved.id, error = %e, "Failed to relay enquiry notification");
    }

    Ok(HttpResponse::Accepted().json(ApiResponse::ok(EnquiryAccepted {
        id: saved.id.to_string(),
        received_at: saved.received_at,
    })))
}

fn notification_email(enquiry: &Enquiry, inbox: &str) -> OutboundEmail {
    let kind = match enquiry.kind {
        EnquiryKind::General => "General enquiry",
        EnquiryKind::Consultation => "Consultation request",
    };

    let mut text = format!("Name: {}\nEmail: {}\n", enquiry.name, enquiry.email);
    if let Some(phone) = &enquiry.phone {
        text.push_str(&format!("Phone: {phone}\n"));
    }
    text.push_str(&format!("\n{}\n", enquiry.message));

    OutboundEmail::new(inbox, format!("{kind} from {}", enquiry.name), text)
        .with_reply_to(&enquiry.email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::json;
    use std::sync::Arc;

    use meridian_core::ports::Mailer;
    use meridian_infra::{
        AutosaveConfig, InMemoryEnquiryRepository, InMemoryMailer, InMemoryProfileRepository,
        InMemoryShortlistRepository, InMemoryUcatRepository, InMemoryUserRepository,
    };

    use crate::drafts::DraftSessions;

    fn test_state(mailer: Arc<InMemoryMailer>) -> AppState {
        let profiles = Arc::new(InMemoryProfileRepository::new());
        AppState {
            users: Arc::new(InMemoryUserRepository::new()),
            profiles: profiles.clone(),
            ucat: Arc::new(InMemoryUcatRepository::new()),
            shortlist: Arc::new(InMemoryShortlistRepository::new()),
            enquiries: Arc::new(InMemoryEnquiryRepository::new()),
            mailer: mailer as Arc<dyn Mailer>,
            enquiry_inbox: "team@meridianadmissions.co.uk".to_string(),
            drafts: Arc::new(DraftSessions::new(profiles, AutosaveConfig::default())),
        }
    }

    #[actix_web::test]
    async fn accepted_enquiry_is_persisted_and_relayed() {
        let mailer = Arc::new(InMemoryMailer::new());
        let state = test_state(mailer.clone());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/api/enquiries", web::post().to(submit)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/enquiries")
            .set_json(json!({
                "name": "Priya Shah",
                "email": "priya@example.com",
                "message": "I would like help preparing for interviews.",
                "kind": "consultation"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "team@meridianadmissions.co.uk");
        assert_eq!(sent[0].reply_to.as_deref(), Some("priya@example.com"));
        assert!(sent[0].subject.starts_with("Consultation request"));
    }

    #[actix_web::test]
    async fn rejects_an_invalid_email() {
        let state = test_state(Arc::new(InMemoryMailer::new()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/api/enquiries", web::post().to(submit)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/enquiries")
            .set_json(json!({
                "name": "Priya Shah",
                "email": "not-an-address",
                "message": "hello"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
