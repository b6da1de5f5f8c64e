use std::{fmt, str::FromStr};

use common::error::{AppError, FieldError, Res};
use serde::{Deserialize, Serialize};

pub const MIN_IDEA_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppCategory {
    #[serde(rename = "Web App")]
    WebApp,
    #[serde(rename = "Mobile App")]
    MobileApp,
}

impl AppCategory {
    pub const ALL: [AppCategory; 2] = [AppCategory::WebApp, AppCategory::MobileApp];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppCategory::WebApp => "Web App",
            AppCategory::MobileApp => "Mobile App",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildTool {
    Windsurf,
    #[serde(rename = "Bolt.new")]
    BoltNew,
    Lovable,
}

impl BuildTool {
    pub const ALL: [BuildTool; 3] = [BuildTool::Windsurf, BuildTool::BoltNew, BuildTool::Lovable];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildTool::Windsurf => "Windsurf",
            BuildTool::BoltNew => "Bolt.new",
            BuildTool::Lovable => "Lovable",
        }
    }
}

macro_rules! impl_label {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or(())
            }
        }
    };
}

impl_label!(AppCategory);
impl_label!(BuildTool);

/// Plan request as submitted by the form. Every field is optional so that
/// missing values surface as field messages instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanForm {
    pub idea_text: Option<String>,
    pub app_category: Option<String>,
    pub build_tool: Option<String>,
}

/// A plan request that passed validation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub idea_text: String,
    pub app_category: AppCategory,
    pub build_tool: BuildTool,
}

impl PlanForm {
    /// Collects every field problem at once rather than stopping at the first.
    pub fn validate(self) -> Res<PlanRequest> {
        let mut issues = Vec::new();

        let idea_text = self.idea_text.as_deref().map(str::trim).unwrap_or_default();
        if idea_text.chars().count() < MIN_IDEA_CHARS {
            issues.push(FieldError::new(
                "idea_text",
                &format!("Your app idea must be at least {} characters.", MIN_IDEA_CHARS),
            ));
        }

        let app_category = match self.app_category.as_deref() {
            None | Some("") => {
                issues.push(FieldError::new("app_category", "You need to select an app type."));
                None
            }
            Some(value) => value.parse::<AppCategory>().ok().or_else(|| {
                issues.push(FieldError::new(
                    "app_category",
                    "App type must be one of: Web App, Mobile App.",
                ));
                None
            }),
        };

        let build_tool = match self.build_tool.as_deref() {
            None | Some("") => {
                issues.push(FieldError::new("build_tool", "You need to select a build tool."));
                None
            }
            Some(value) => value.parse::<BuildTool>().ok().or_else(|| {
                issues.push(FieldError::new(
                    "build_tool",
                    "Build tool must be one of: Windsurf, Bolt.new, Lovable.",
                ));
                None
            }),
        };

        match (app_category, build_tool) {
            (Some(app_category), Some(build_tool)) if issues.is_empty() => Ok(PlanRequest {
                idea_text: idea_text.to_string(),
                app_category,
                build_tool,
            }),
            _ => Err(AppError::Validation(issues)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanQuery {
    #[serde(default)]
    pub download: bool,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub markdown: String,
    /// Absent when the plan was produced but the usage counter could not be written.
    pub generation_count: Option<i64>,
    pub file_name: &'static str,
}
