use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://cafeito.db?mode=rwc";
const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8074";
const DEFAULT_TEMPLATE_DIR: &str = "templates";
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 12;
const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub http_bind_address: SocketAddr,
    pub template_dir: PathBuf,
    pub session_ttl: Duration,
    pub low_stock_threshold: i64,
    /// Created on first run when the users table is empty.
    pub seed_admin_username: String,
    pub seed_admin_password: String,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            database_url: cli_database_url,
            http_bind: cli_http_bind,
            template_dir: cli_template_dir,
            session_ttl_secs: cli_session_ttl_secs,
            low_stock_threshold: cli_low_stock_threshold,
            seed_admin_username: cli_seed_admin_username,
            seed_admin_password: cli_seed_admin_password,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            database_url: file_database_url,
            http_bind: file_http_bind,
            template_dir: file_template_dir,
            session_ttl_secs: file_session_ttl_secs,
            low_stock_threshold: file_low_stock_threshold,
            seed_admin_username: file_seed_admin_username,
            seed_admin_password: file_seed_admin_password,
        } = file_config;

        let database_url = cli_database_url
            .or(file_database_url)
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let http_bind_address = cli_http_bind.or(file_http_bind).unwrap_or_else(|| {
            DEFAULT_HTTP_BIND
                .parse()
                .expect("default bind address valid")
        });

        let template_dir = cli_template_dir
            .or(file_template_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR));

        let session_ttl = Duration::from_secs(
            cli_session_ttl_secs
                .or(file_session_ttl_secs)
                .unwrap_or(DEFAULT_SESSION_TTL_SECS)
                .max(60),
        );

        let low_stock_threshold = cli_low_stock_threshold
            .or(file_low_stock_threshold)
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
            .max(0);

        let seed_admin_username = cli_seed_admin_username
            .or(file_seed_admin_username)
            .unwrap_or_else(|| "admin".to_string());

        let seed_admin_password = cli_seed_admin_password
            .or(file_seed_admin_password)
            .unwrap_or_else(|| "admin".to_string());

        Ok(Self {
            database_url,
            http_bind_address,
            template_dir,
            session_ttl,
            low_stock_threshold,
            seed_admin_username,
            seed_admin_password,
        })
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.database_url.trim().is_empty(),
            "database URL must not be empty"
        );
        anyhow::ensure!(
            self.template_dir.exists(),
            "template directory {:?} does not exist",
            self.template_dir
        );
        anyhow::ensure!(
            self.template_dir.is_dir(),
            "template directory {:?} is not a directory",
            self.template_dir
        );
        anyhow::ensure!(
            !self.seed_admin_username.trim().is_empty(),
            "seed admin username must not be empty"
        );
        Ok(())
    }

    pub fn template_glob(&self) -> String {
        format!("{}/**/*.html", self.template_dir.display())
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "cafeito", about = "Café storefront and point-of-sale server", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "CAFEITO_DATABASE_URL",
        value_name = "URL",
        help = "SQLite database URL"
    )]
    pub database_url: Option<String>,

    #[arg(
        long,
        env = "CAFEITO_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "CAFEITO_TEMPLATE_DIR",
        value_name = "DIR",
        help = "Directory containing Tera templates"
    )]
    pub template_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "CAFEITO_SESSION_TTL_SECS",
        value_name = "SECS",
        help = "Idle session lifetime in seconds",
        value_parser = clap::value_parser!(u64)
    )]
    pub session_ttl_secs: Option<u64>,

    #[arg(
        long,
        env = "CAFEITO_LOW_STOCK_THRESHOLD",
        value_name = "N",
        help = "Stock level below which a product is flagged on the dashboard",
        value_parser = clap::value_parser!(i64)
    )]
    pub low_stock_threshold: Option<i64>,

    #[arg(
        long,
        env = "CAFEITO_SEED_ADMIN_USERNAME",
        value_name = "NAME",
        help = "Administrator account created when the user table is empty"
    )]
    pub seed_admin_username: Option<String>,

    #[arg(
        long,
        env = "CAFEITO_SEED_ADMIN_PASSWORD",
        value_name = "PASSWORD",
        help = "Password for the seeded administrator account"
    )]
    pub seed_admin_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    database_url: Option<String>,
    http_bind: Option<SocketAddr>,
    template_dir: Option<PathBuf>,
    session_ttl_secs: Option<u64>,
    low_stock_threshold: Option<i64>,
    seed_admin_username: Option<String>,
    seed_admin_password: Option<String>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
