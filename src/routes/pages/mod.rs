use actix_web::http::header::ContentType;
use actix_web::HttpResponse;

/// `GET /confirmed`, the default landing page after a successful confirmation
pub async fn confirmed_page() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(include_str!("./confirmed.html"))
}

/// `GET /confirm-error`
pub async fn confirm_error_page() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(include_str!("./confirm_error.html"))
}
