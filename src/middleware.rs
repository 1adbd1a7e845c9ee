use actix_web::body::EitherBody;
use actix_web::body::MessageBody;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::http::header::HeaderValue;
use actix_web::http::Method;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web_lab::middleware::Next;

use crate::startup::AllowedOrigin;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// The subscription form is usually served from another origin, so every
/// response carries `Access-Control-Allow-Origin`, and preflight `OPTIONS`
/// requests are answered here without reaching the router.
///
/// The origin is read from `AllowedOrigin` in the app data (`*` if absent).
///
/// For more details, refer to the documentation for
/// `actix_web_lab::middleware::from_fn`
pub async fn cors<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let origin = req
        .app_data::<web::Data<AllowedOrigin>>()
        .and_then(|o| HeaderValue::from_str(&o.0).ok())
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    if req.method() == Method::OPTIONS {
        let resp = HttpResponse::NoContent()
            .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin))
            .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
            .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
            .finish();
        return Ok(req.into_response(resp).map_into_right_body());
    }

    let mut res = next.call(req).await?;
    res.headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    Ok(res.map_into_left_body())
}
