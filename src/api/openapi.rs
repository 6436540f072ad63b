//! OpenAPI document assembly.
//!
//! Serves the generated document at `/openapi.json`. With the `swagger-ui`
//! feature enabled, Swagger UI is mounted at `/swagger-ui` and reads its own
//! copy from `/api-docs/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Assembled OpenAPI document for the REST surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Waitlist Gateway",
        description = "Capacity-bounded event waitlists with uniform lottery draws.\n\nEntrants join a per-event waitlist, organizers draw to fill the event's capacity, and selected entrants accept or decline. Declines free a slot that a refill draw can give to someone still waiting.",
        license(name = "MIT")
    ),
    paths(
        crate::api::handlers::system::health_handler,
        crate::api::handlers::events::upsert_event,
        crate::api::handlers::waitlist::create_waitlist,
        crate::api::handlers::waitlist::get_waitlist,
        crate::api::handlers::waitlist::delete_waitlist,
        crate::api::handlers::entrants::list_entrants,
        crate::api::handlers::entrants::join,
        crate::api::handlers::entrants::leave,
        crate::api::handlers::entrants::get_entrant,
        crate::api::handlers::entrants::respond,
        crate::api::handlers::entrants::cancel,
        crate::api::handlers::lottery::draw,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::error::ErrorBody,
            crate::domain::EntrantStatus,
            crate::domain::Decision,
            crate::domain::DrawPhase,
            crate::domain::WaitlistEntry,
            crate::domain::WaitlistSummary,
            crate::api::dto::PaginationMeta,
            crate::service::RefillOutcome,
        )
    ),
    tags(
        (name = "System", description = "Health and service metadata"),
        (name = "Events", description = "Event directory: capacity per event"),
        (name = "Waitlists", description = "Waitlist lifecycle"),
        (name = "Entrants", description = "Join, leave, respond, and organizer cancellation"),
        (name = "Lottery", description = "Uniform random draws"),
    )
)]
#[derive(Debug)]
pub struct ApiDoc;

/// Routes serving the OpenAPI document (and Swagger UI when enabled).
pub fn router() -> Router<AppState> {
    let router = Router::new().route("/openapi.json", get(openapi_json));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// `GET /openapi.json` — Generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
