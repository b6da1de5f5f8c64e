use actix_web::{HttpResponse, post, web};
use common::{error::Res, jwt::Actor};

use crate::{
    dtos::plan::{PlanForm, PlanQuery, PlanResponse},
    export,
    services::plan::PlanService,
};

/// Turns an app idea into a Markdown development plan.
///
/// Free accounts get one plan; paid tiers are unlimited. The usage counter is
/// only charged when a plan was actually produced.
///
/// # Input
/// - `form`: `{ idea_text, app_category: "Web App" | "Mobile App", build_tool: "Windsurf" | "Bolt.new" | "Lovable" }`
/// - `download` query flag: answer with the Markdown file instead of JSON
///
/// # Output
/// - Success: `{ markdown, generation_count, file_name }` or the `braindump_plan.md` attachment
/// - Error: 400 with field `issues`, 402 when the quota is used up, 502/504 when generation fails
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/plan', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     idea_text: 'A plant watering reminder app with care tips',
///     app_category: 'Mobile App',
///     build_tool: 'Windsurf'
///   })
/// });
/// const { markdown } = await response.json();
/// ```
#[post("")]
async fn post_plan(
    actor: web::ReqData<Actor>,
    query: web::Query<PlanQuery>,
    form: web::Json<PlanForm>,
    service: web::Data<PlanService>,
) -> Res<HttpResponse> {
    let outcome = service.request_plan(&actor, form.into_inner()).await?;

    if query.download {
        return Ok(export::markdown_attachment(outcome.markdown));
    }

    Ok(HttpResponse::Ok().json(PlanResponse {
        markdown: outcome.markdown,
        generation_count: outcome.generation_count,
        file_name: export::PLAN_FILE_NAME,
    }))
}
