pub mod drafts;
pub mod rpc;
pub mod upload;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn rpc_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/rpc/pitch.submit", post(rpc::submit_pitch))
        .route("/api/rpc/pitch.validateCitId", get(rpc::validate_cit_id))
        .route(
            "/api/rpc/requestAssistance.submit",
            post(rpc::submit_request_assistance),
        )
        .route("/api/rpc/utils.testConnection", get(rpc::test_connection))
}

pub fn draft_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/drafts", post(drafts::create))
        .route("/api/drafts/{id}", get(drafts::get).delete(drafts::delete))
        .route("/api/drafts/{id}/fields", put(drafts::update_fields))
        .route(
            "/api/drafts/{id}/content/{field}",
            get(drafts::get_content).put(drafts::put_content),
        )
        .route("/api/drafts/{id}/next", post(drafts::next))
        .route("/api/drafts/{id}/previous", post(drafts::previous))
        .route(
            "/api/drafts/{id}/files",
            post(drafts::upload_files),
        )
        .route(
            "/api/drafts/{id}/files/{file_id}",
            axum::routing::delete(drafts::remove_file),
        )
        .route(
            "/api/drafts/{id}/links",
            post(drafts::add_link).delete(drafts::remove_link),
        )
        .route("/api/drafts/{id}/submit", post(drafts::submit))
        .route("/api/drafts/{id}/dismiss-error", post(drafts::dismiss_error))
        .route("/api/drafts/{id}/reset", post(drafts::reset))
}
