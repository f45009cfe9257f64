use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "dinoforum.toml";
const DEFAULT_DB_FILE: &str = "dinoforum.db";

#[derive(Parser, Debug)]
#[command(name = "dinoforum", about = "A server-rendered discussion forum")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the SQLite database file
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub forum: ForumConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ForumConfig {
    /// Seeded into an empty categories table at start-up.
    pub default_categories: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_token".to_string(),
            session_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            default_categories: [
                "General",
                "Fossils",
                "Dino News",
                "Questions",
                "Paleontology",
                "Dino Art",
                "Research",
                "Fun Facts",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            if cli.config.is_some() {
                anyhow::bail!("Config file not found: {}", config_path.display());
            }
            Config::default()
        };

        // CLI and environment overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref path) = cli.db_path {
            config.database.path = path.clone();
        }

        Ok(config)
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.database.path
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(config: Option<PathBuf>) -> Cli {
        Cli {
            config,
            host: None,
            port: None,
            db_path: None,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.cookie_name, "session_token");
        assert_eq!(config.auth.session_hours, 24);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.db_path(), &PathBuf::from("dinoforum.db"));
        assert_eq!(config.forum.default_categories.len(), 8);
        assert_eq!(config.forum.default_categories[0], "General");
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = cli_with(Some(tmp.path().join("nope.toml")));
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    fn load_applies_cli_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("forum.toml");
        std::fs::write(&config_path, "").unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: Some("127.0.0.1".to_string()),
            port: Some(9090),
            db_path: Some(tmp.path().join("custom.db")),
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.db_path(), &tmp.path().join("custom.db"));
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("forum.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000

[database]
path = "/var/lib/dinoforum/forum.db"

[auth]
cookie_name = "forum_cookie"
session_hours = 2
bcrypt_cost = 4

[forum]
default_categories = ["Sauropods", "Theropods"]
"#,
        )
        .unwrap();

        let config = Config::load(&cli_with(Some(config_path))).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.db_path(),
            &PathBuf::from("/var/lib/dinoforum/forum.db")
        );
        assert_eq!(config.auth.cookie_name, "forum_cookie");
        assert_eq!(config.auth.session_hours, 2);
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert_eq!(
            config.forum.default_categories,
            vec!["Sauropods".to_string(), "Theropods".to_string()]
        );
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("forum.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000

[database]
path = "from-file.db"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: Some("10.0.0.1".to_string()),
            port: Some(4000),
            db_path: Some(PathBuf::from("from-env.db")),
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.db_path(), &PathBuf::from("from-env.db"));
    }
}
