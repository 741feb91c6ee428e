use crate::snapshots::{Category, SnapshotResolver};
use std::collections::BTreeMap;
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
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig::from_env()?,
        })
    }
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where snapshots are read from and where the metric record is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub export_path: PathBuf,
    prefixes: BTreeMap<Category, String>,
}

impl DataConfig {
    pub fn new(data_dir: impl Into<PathBuf>, export_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            export_path: export_path.into(),
            prefixes: Category::ordered()
                .into_iter()
                .map(|category| (category, category.default_prefix().to_string()))
                .collect(),
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let data_dir = env::var("APP_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let export_path =
            env::var("APP_EXPORT_PATH").unwrap_or_else(|_| "metrics.json".to_string());

        let mut config = Self::new(data_dir, export_path);
        for category in Category::ordered() {
            if let Ok(prefix) = env::var(prefix_var(category)) {
                config = config.with_prefix(category, prefix)?;
            }
        }
        Ok(config)
    }

    /// Overrides the filename prefix used to find `category` snapshots.
    pub fn with_prefix(
        mut self,
        category: Category,
        prefix: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let prefix = prefix.into().trim().to_string();
        if prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix { category });
        }
        self.prefixes.insert(category, prefix);
        Ok(self)
    }

    pub fn prefixes(&self) -> &BTreeMap<Category, String> {
        &self.prefixes
    }

    pub fn resolver(&self) -> SnapshotResolver {
        SnapshotResolver::new(
            self.prefixes
                .iter()
                .map(|(category, prefix)| (*category, prefix.clone())),
        )
    }
}

const fn prefix_var(category: Category) -> &'static str {
    match category {
        Category::TenantRoll => "APP_TENANT_PREFIX",
        Category::WorkOrders => "APP_WORK_ORDER_PREFIX",
        Category::VacancyDetail => "APP_VACANCY_PREFIX",
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyPrefix { category: Category },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyPrefix { category } => write!(
                f,
                "{} must not be empty ({} snapshots)",
                prefix_var(*category),
                category
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::EmptyPrefix { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
