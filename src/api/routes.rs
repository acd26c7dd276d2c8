use actix_web::{error::InternalError, get, post, web, HttpRequest, HttpResponse};
use tracing::{error, warn};

use crate::api::models::{ChatReply, ChatRequest, ErrorBody};
use crate::llm::models::Message as LlmMessage;
use crate::relay::Relay;

pub const RELAY_FAILURE: &str = "Failed to get a response from the assistant";

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

#[post("/chat")]
pub async fn chat(relay: web::Data<Relay>, req: web::Json<ChatRequest>) -> HttpResponse {
    let history: Vec<LlmMessage> = req
        .into_inner()
        .messages
        .into_iter()
        .map(LlmMessage::from)
        .collect();

    match relay.complete(&history).await {
        Ok(reply) => HttpResponse::Ok().json(ChatReply::from(reply)),
        Err(e) => {
            error!("Error relaying chat completion: {}", e);
            HttpResponse::InternalServerError().json(ErrorBody::new(RELAY_FAILURE))
        }
    }
}

fn reject_body(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected chat request: {}", err);
    let response = HttpResponse::BadRequest().json(ErrorBody::new(format!("Invalid request: {}", err)));
    InternalError::from_response(err, response).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(reject_body))
        .service(health)
        .service(chat);
}
