use actix_web::http::header::LOCATION;
use actix_web::HttpResponse;

/// 303, so that the browser follows up with a `GET`
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}
