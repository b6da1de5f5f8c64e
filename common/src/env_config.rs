use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// This struct holds all the necessary configuration parameters
/// required to initialize and run the server.
/// It includes database connection details, identity token settings,
/// server host and port, number of worker threads, CORS settings,
/// logging preferences, Stripe credentials and the plan generator endpoint.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to. `memory` selects the in-process store.
    pub database_url: String,
    /// Configuration for verifying identity tokens.
    pub jwt_config: JwtConfig,
    /// Key used to sign the session cookie.
    pub session_key: String,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Requests per second accepted across the whole server.
    pub global_rate_limit: u32,
    /// Emails allowed to use the admin override routes.
    pub admin_emails: Vec<String>,
    /// Stripe credentials and price ids.
    pub stripe: StripeConfig,
    /// Plan generator endpoint.
    pub generator: GeneratorConfig,
    /// Upper bound for a single user store operation, in seconds.
    pub store_timeout_secs: u64,
}

#[derive(Clone, Debug)]
/// Configuration for verifying identity (JSON Web Token) tokens issued by the identity provider.
pub struct JwtConfig {
    /// The secret key used to verify JWTs.
    pub secret: String,
    /// Expected `iss` claim. Not checked when empty.
    pub issuer: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    /// Stripe secret key
    pub secret_key: String,
    /// Stripe webhook secret
    pub webhook_secret: String,
    /// Price id of the Monthly subscription
    pub monthly_price_id: String,
    /// Price id of the Yearly subscription
    pub yearly_price_id: String,
}

#[derive(Clone, Debug)]
/// OpenAI-compatible chat completion endpoint used to write plans.
pub struct GeneratorConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// - `JWT_SECRET`: Required. The key shared with the identity provider.
    /// - `JWT_ISSUER`: Optional. Expected token issuer.
    ///
    /// # Panics
    ///
    /// This function will panic if `JWT_SECRET` is not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        JwtConfig {
            secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            issuer: env::var("JWT_ISSUER").ok().filter(|iss| !iss.is_empty()),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: `development` or `production`
    /// - `DATABASE_URL`: Connection string for the database, or `memory`
    /// - `JWT_SECRET`: Secret key for identity token verification
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `GLOBAL_RATE_LIMIT`: Requests per second (default: 10)
    /// - `ADMIN_EMAILS`: Comma separated admin emails (default: none)
    /// - `SESSION_KEY`: Cookie signing secret (default: `JWT_SECRET`)
    /// - `STRIPE_*`, `LLM_*`, `GENERATOR_TIMEOUT_SECS`, `STORE_TIMEOUT_SECS`
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing,
    /// or if a production deployment lacks `STRIPE_WEBHOOK_SECRET`.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        let jwt_config = JwtConfig::from_env();
        let session_key = env::var("SESSION_KEY").unwrap_or_else(|_| jwt_config.secret.clone());

        let config = Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_config,
            session_key,
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_or("PORT", 8080),
            num_workers: parse_or("WORKERS", 4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            global_rate_limit: parse_or("GLOBAL_RATE_LIMIT", 10),
            admin_emails: parse_list(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            stripe: StripeConfig {
                secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
                webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                monthly_price_id: env::var("STRIPE_PRICE_MONTHLY")
                    .unwrap_or_else(|_| "price_monthly".to_string()),
                yearly_price_id: env::var("STRIPE_PRICE_YEARLY")
                    .unwrap_or_else(|_| "price_yearly".to_string()),
            },
            generator: GeneratorConfig {
                api_url: env::var("LLM_API_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key: env::var("LLM_API_KEY").unwrap_or_default(),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                timeout_secs: parse_or("GENERATOR_TIMEOUT_SECS", 60),
            },
            store_timeout_secs: parse_or("STORE_TIMEOUT_SECS", 10),
        };

        if let Err(e) = config.check_secrets() {
            panic!("{}", e);
        }
        Arc::new(config)
    }

    /// Production refuses to start without the secrets that authenticate
    /// inbound calls. Elsewhere they may be empty, and the affected routes refuse work.
    pub fn check_secrets(&self) -> Result<(), String> {
        if self.is_production() && self.stripe.webhook_secret.is_empty() {
            return Err("STRIPE_WEBHOOK_SECRET must be set in production".to_string());
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }

    /// Deterministic configuration for tests; touches no environment variables.
    pub fn for_tests() -> Arc<Self> {
        Arc::new(Config {
            environment: "development".to_string(),
            database_url: "memory".to_string(),
            jwt_config: JwtConfig {
                secret: "test-secret".to_string(),
                issuer: None,
            },
            session_key: "test-session-key".repeat(8),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            num_workers: 1,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            console_logging_enabled: false,
            global_rate_limit: 1000,
            admin_emails: vec!["admin@example.com".to_string()],
            stripe: StripeConfig {
                secret_key: String::new(),
                webhook_secret: "whsec_test".to_string(),
                monthly_price_id: "price_monthly".to_string(),
                yearly_price_id: "price_yearly".to_string(),
            },
            generator: GeneratorConfig {
                api_url: "http://localhost:9".to_string(),
                api_key: String::new(),
                model: "test-model".to_string(),
                timeout_secs: 5,
            },
            store_timeout_secs: 5,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
