use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use logger::middleware::logger::REQUEST_ID_HEADER;

pub fn middleware(origin: &str) -> Cors {
    Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
        ])
        .allowed_origin(origin)
        .expose_headers(vec![
            header::SET_COOKIE,
            header::CONTENT_DISPOSITION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .supports_credentials()
        .max_age(3600)
}
