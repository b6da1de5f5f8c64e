use middleware::extractor::ExtractionMiddleware;

pub mod middleware {
    pub mod extractor;
}

/// Session key under which the identity token is kept in the cookie session.
pub const SESSION_TOKEN_KEY: &str = "token";

pub fn middleware() -> ExtractionMiddleware {
    ExtractionMiddleware::new()
}
