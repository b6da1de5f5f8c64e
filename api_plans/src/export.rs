use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
};

/// File name offered to the browser when a plan is downloaded.
pub const PLAN_FILE_NAME: &str = "braindump_plan.md";

/// Serves the plan as a Markdown attachment. The body is the generator
/// output byte for byte.
pub fn markdown_attachment(markdown: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/markdown; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(PLAN_FILE_NAME.to_string())],
        })
        .body(markdown)
}

#[cfg(test)]
mod tests {
    use actix_web::{body::to_bytes, http::header};

    use super::*;

    #[actix_web::test]
    async fn attachment_keeps_body_and_names_file() {
        let plan = "# Summary\n\nÜber plants\n".to_string();
        let resp = markdown_attachment(plan.clone());

        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/markdown; charset=utf-8"
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"braindump_plan.md\""
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, plan.as_bytes());
    }
}
