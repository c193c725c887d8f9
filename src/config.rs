use std::env;
use std::net::IpAddr;
use std::str::FromStr;

use ipnetwork::IpNetwork;

use crate::provisioning::JobKind;

/// Where environment records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND")),
        }
    }
}

/// How provisioning jobs are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobRunnerKind {
    Command,
    Http,
}

impl FromStr for JobRunnerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "command" => Ok(Self::Command),
            "http" => Ok(Self::Http),
            _ => Err(ConfigError::Invalid("JOB_RUNNER")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Record store
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,

    // Provisioning jobs
    pub job_runner: JobRunnerKind,
    pub build_service_url: Option<String>,
    pub create_database_command: String,
    pub create_stack_command: String,
    pub delete_stack_command: String,
    pub job_timeout_seconds: u64,
    pub job_poll_interval_seconds: u64,

    // Access control
    pub api_key: Option<String>,
    pub allowed_networks: Vec<IpNetwork>,
    pub cors_allow_origin: String,

    // Server
    pub host: String,
    pub port: u16,
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;
        let database_url = non_empty_var("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let job_runner: JobRunnerKind = env::var("JOB_RUNNER")
            .unwrap_or_else(|_| "command".to_string())
            .parse()?;
        let build_service_url = non_empty_var("BUILD_SERVICE_URL");
        if job_runner == JobRunnerKind::Http && build_service_url.is_none() {
            return Err(ConfigError::Missing("BUILD_SERVICE_URL"));
        }

        Ok(Self {
            store_backend,
            database_url,

            job_runner,
            build_service_url,
            create_database_command: env::var("CREATE_DATABASE_COMMAND")
                .unwrap_or_else(|_| default_command(JobKind::CreateDatabase)),
            create_stack_command: env::var("CREATE_STACK_COMMAND")
                .unwrap_or_else(|_| default_command(JobKind::CreateStack)),
            delete_stack_command: env::var("DELETE_STACK_COMMAND")
                .unwrap_or_else(|_| default_command(JobKind::DeleteStack)),
            job_timeout_seconds: env::var("JOB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("JOB_TIMEOUT_SECONDS"))?,
            job_poll_interval_seconds: env::var("JOB_POLL_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("JOB_POLL_INTERVAL_SECONDS"))?,

            api_key: non_empty_var("API_KEY"),
            allowed_networks: parse_networks(&env::var("ALLOWED_IPS").unwrap_or_default())?,
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string()),

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shell command configured for a job kind
    pub fn command_for(&self, kind: JobKind) -> &str {
        match kind {
            JobKind::CreateDatabase => &self.create_database_command,
            JobKind::CreateStack => &self.create_stack_command,
            JobKind::DeleteStack => &self.delete_stack_command,
        }
    }

    /// Whether the peer address passes the IP allow list (an empty list allows all)
    pub fn is_ip_allowed(&self, ip: IpAddr) -> bool {
        self.allowed_networks.is_empty() || self.allowed_networks.iter().any(|n| n.contains(ip))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn default_command(kind: JobKind) -> String {
    format!("./buildspec/{}.sh", kind.project_name())
}

/// Parse a comma separated list of IPs or CIDR blocks
pub fn parse_networks(raw: &str) -> Result<Vec<IpNetwork>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|_| ConfigError::Invalid("ALLOWED_IPS")))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_networks() {
        let networks = parse_networks("10.0.0.0/8, 192.168.1.5,").unwrap();
        assert_eq!(networks.len(), 2);
        assert!(networks[0].contains("10.1.2.3".parse().unwrap()));
        assert!(networks[1].contains("192.168.1.5".parse().unwrap()));
        assert!(!networks[1].contains("192.168.1.6".parse().unwrap()));

        assert!(parse_networks("").unwrap().is_empty());
        assert!(parse_networks("not-an-ip").is_err());
    }

    #[test]
    fn test_is_ip_allowed() {
        let mut config = Config {
            store_backend: StoreBackend::Memory,
            database_url: None,
            job_runner: JobRunnerKind::Command,
            build_service_url: None,
            create_database_command: default_command(JobKind::CreateDatabase),
            create_stack_command: default_command(JobKind::CreateStack),
            delete_stack_command: default_command(JobKind::DeleteStack),
            job_timeout_seconds: 3600,
            job_poll_interval_seconds: 10,
            api_key: None,
            allowed_networks: Vec::new(),
            cors_allow_origin: "*".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_json: false,
        };
        // Empty list admits everyone
        assert!(config.is_ip_allowed("203.0.113.7".parse().unwrap()));

        config.allowed_networks = parse_networks("10.0.0.0/8, 192.168.1.5, ::1").unwrap();
        assert!(config.is_ip_allowed("10.20.30.40".parse().unwrap()));
        assert!(config.is_ip_allowed("192.168.1.5".parse().unwrap()));
        assert!(config.is_ip_allowed("::1".parse().unwrap()));
        assert!(!config.is_ip_allowed("192.168.1.6".parse().unwrap()));
        assert!(!config.is_ip_allowed("127.0.0.1".parse().unwrap()));
        assert_eq!(
            config.command_for(JobKind::DeleteStack),
            "./buildspec/TemporaryEnv-DeleteStack.sh"
        );
    }

    #[test]
    fn test_backend_names() {
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("dynamo".parse::<StoreBackend>().is_err());
        assert_eq!("http".parse::<JobRunnerKind>().unwrap(), JobRunnerKind::Http);
        assert!("lambda".parse::<JobRunnerKind>().is_err());
    }
}
