use async_trait::async_trait;
use common::{
    env_config::GeneratorConfig,
    error::{AppError, Res},
};
use serde::{Deserialize, Serialize};

use crate::dtos::plan::PlanRequest;

/// Produces the Markdown plan for a validated request.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, request: &PlanRequest) -> Res<String>;
}

const SYSTEM_PROMPT: &str = "You are an AI that helps generate a structured Markdown file for app ideas.

The user will provide an app idea, the type of app (Web App or Mobile App), and the build tool to be used.
Generate a detailed Markdown file that includes the following sections:

- **Summary:** A concise summary of the app idea.
- **Features:** Suggested features for the app.
- **Tech Stack:** Recommended tech stack based on the app type and build tool.
- **Development Steps:** A step-by-step guide for developing the app.
- **Integrations:** Potential integrations with other services or platforms.

Make sure it is well-structured and easy to read.
Do not include any introductory or concluding remarks. Just the markdown.
Do not include any links.
Do not include any HTML.
Make sure there are no unterminated lists or other markdown errors.
Do not include any YAML headers.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Generator backed by an OpenAI-compatible chat completions endpoint.
pub struct LlmPlanGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl LlmPlanGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        LlmPlanGenerator {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        )
    }
}

fn user_message(request: &PlanRequest) -> String {
    format!(
        "App Idea: {}\nApp Type: {}\nBuild Tool: {}",
        request.idea_text, request.app_category, request.build_tool
    )
}

#[async_trait]
impl PlanGenerator for LlmPlanGenerator {
    async fn generate(&self, request: &PlanRequest) -> Res<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_message(request),
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Request to generator failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            log::error!("Generator answered {}: {}", status, detail);
            return Err(AppError::Generation(format!(
                "Generator answered with status {}",
                status
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Unreadable generator response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Generation("Generator response has no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::plan::{AppCategory, BuildTool};

    #[test]
    fn user_message_carries_all_fields() {
        let msg = user_message(&PlanRequest {
            idea_text: "A plant watering reminder app with care tips".to_string(),
            app_category: AppCategory::MobileApp,
            build_tool: BuildTool::BoltNew,
        });
        assert_eq!(
            msg,
            "App Idea: A plant watering reminder app with care tips\nApp Type: Mobile App\nBuild Tool: Bolt.new"
        );
    }

    fn config(api_url: &str) -> GeneratorConfig {
        GeneratorConfig {
            api_url: api_url.to_string(),
            api_key: "k".to_string(),
            model: "m".to_string(),
            timeout_secs: 1,
        }
    }

    fn request() -> PlanRequest {
        PlanRequest {
            idea_text: "A plant watering reminder app with care tips".to_string(),
            app_category: AppCategory::WebApp,
            build_tool: BuildTool::Lovable,
        }
    }

    #[test]
    fn endpoint_joins_base_url() {
        let generator = LlmPlanGenerator::new(config("https://llm.local/v1/"));
        assert_eq!(generator.endpoint(), "https://llm.local/v1/chat/completions");
    }

    #[test]
    fn reply_without_choices_parses_empty() {
        let parsed: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer k")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r##"{"choices":[{"message":{"content":"# Plan"}}]}"##)
            .create_async()
            .await;

        let generator = LlmPlanGenerator::new(config(&server.url()));
        assert_eq!(generator.generate(&request()).await.unwrap(), "# Plan");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_a_generation_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let generator = LlmPlanGenerator::new(config(&server.url()));
        assert!(matches!(
            generator.generate(&request()).await,
            Err(AppError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn reply_without_content_is_a_generation_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":null}}]}"#)
            .create_async()
            .await;

        let generator = LlmPlanGenerator::new(config(&server.url()));
        assert!(matches!(
            generator.generate(&request()).await,
            Err(AppError::Generation(_))
        ));
    }
}
