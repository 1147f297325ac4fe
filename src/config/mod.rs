use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
///
/// Built once at startup and handed to the constructors that need it; nothing
/// reads the environment after `load` returns.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub documents: DocumentsConfig,
    pub mail: MailConfig,
    pub cors: CorsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "5000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");
        let log_format = LogFormat::parse(&var_or("APP_LOG_FORMAT", "compact"))?;

        let database_url = var_or("DATABASE_URL", "sqlite://requests.db");
        let max_connections = var_or("DATABASE_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidPoolSize)?;

        let documents_dir = PathBuf::from(var_or("DOCUMENTS_DIR", "files"));

        let mail = MailConfig::from_env(environment)?;

        let allowed_origins = parse_origins(&var_or(
            "CORS_ALLOWED_ORIGINS",
            "http://localhost:3000",
        ))?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            documents: DocumentsConfig {
                base_dir: documents_dir,
            },
            mail,
            cors: CorsConfig { allowed_origins },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// Credentialed CORS cannot use a wildcard, so every origin must be explicit.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if origin.contains('*') {
                Err(ConfigError::InvalidCorsOrigin(origin.to_string()))
            } else {
                Ok(origin.to_string())
            }
        })
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing output controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// SQLite connection settings for the request store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Location of the PDFs that approved requests are served from.
#[derive(Debug, Clone)]
pub struct DocumentsConfig {
    pub base_dir: PathBuf,
}

/// Outbound mail transport selection.
#[derive(Clone)]
pub enum MailConfig {
    Smtp(SmtpConfig),
    /// Log messages instead of sending them.
    Console,
}

impl MailConfig {
    /// Without an explicit `MAIL_TRANSPORT`, production requires relay credentials;
    /// other environments fall back to the console transport.
    fn from_env(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let username = non_empty_var("EMAIL_USER");
        let password = non_empty_var("EMAIL_PASS");

        let transport = non_empty_var("MAIL_TRANSPORT").map(|value| value.to_ascii_lowercase());
        let wants_smtp = match transport.as_deref() {
            Some("smtp") => true,
            Some("console") => false,
            Some(other) => return Err(ConfigError::InvalidMailTransport(other.to_string())),
            None => {
                environment == AppEnvironment::Production
                    || (username.is_some() && password.is_some())
            }
        };

        if !wants_smtp {
            return Ok(Self::Console);
        }

        let (username, password) = match (username, password) {
            (Some(username), Some(password)) => (username, password),
            _ => return Err(ConfigError::MissingMailCredentials),
        };

        let port = var_or("MAIL_PORT", "587")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidMailPort)?;
        let sender = non_empty_var("MAIL_SENDER").unwrap_or_else(|| username.clone());

        Ok(Self::Smtp(SmtpConfig {
            host: var_or("MAIL_SERVER", "smtp.gmail.com"),
            port,
            username,
            password,
            sender,
        }))
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailConfig::Smtp(smtp) => f.debug_tuple("Smtp").field(smtp).finish(),
            MailConfig::Console => f.write_str("Console"),
        }
    }
}

/// Relay account used for STARTTLS submission.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .finish()
    }
}

/// Browser origins allowed to call the API.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidPoolSize,
    InvalidMailTransport(String),
    InvalidMailPort,
    MissingMailCredentials,
    InvalidCorsOrigin(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidPoolSize => {
                write!(f, "DATABASE_MAX_CONNECTIONS must be a positive integer")
            }
            ConfigError::InvalidMailTransport(value) => {
                write!(f, "MAIL_TRANSPORT must be 'smtp' or 'console', got '{value}'")
            }
            ConfigError::InvalidMailPort => write!(f, "MAIL_PORT must be a valid u16"),
            ConfigError::MissingMailCredentials => {
                write!(f, "EMAIL_USER and EMAIL_PASS are required for the smtp transport")
            }
            ConfigError::InvalidCorsOrigin(value) => write!(
                f,
                "CORS_ALLOWED_ORIGINS entries must be explicit origins, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
