use actix_web::{http::header, HttpRequest, HttpResponse};

pub mod admin;
pub mod public;

/// Action-only endpoints send the visitor back to the page they came
/// from, or to a fallback when no referrer header was sent.
pub fn redirect_back(req: &HttpRequest, fallback: &str) -> HttpResponse {
    let target = req
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string();
    redirect_to(&target)
}

pub fn redirect_to(target: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, target.to_string()))
        .finish()
}
