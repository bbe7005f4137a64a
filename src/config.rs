use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "bookers")]
#[command(about = "Runs the bookers backend", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookers")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database() -> String {
    "bookers.db".to_string()
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_cors_origin")]
    cors_origin: String,
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    auth_token: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        App {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            cors_origin: default_cors_origin(),
            database_url: None,
            auth_token: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cors_origin(&self) -> &str {
        &self.cors_origin
    }

    /// Remote libsql url. An empty value (e.g. from an unset `${VAR}`) counts as unset.
    pub fn database_url(&self) -> Option<String> {
        non_empty(&self.database_url)
    }

    pub fn auth_token(&self) -> Option<String> {
        non_empty(&self.auth_token)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path).with_context(|| format!("failed to load config from {path}"))?;
        Ok(cfg)
    }

    /// Loads `path`, falling back to built-in defaults when the file does not exist.
    pub fn new_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = ?path, "config file not found, using defaults");
            return Ok(Config::default());
        }
        let path = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("config path {path:?} is not valid utf-8"))?;
        Config::new(path)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    /// Expands `${VAR}` and `${VAR:-default}` in the raw YAML before parsing.
    /// An unset variable without a default expands to an empty string, which
    /// the optional settings treat as unset.
    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut out = String::with_capacity(yaml_str.len());
        let mut rest = yaml_str;

        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            out.push_str(&rest[..start]);

            let expr = &rest[start + 2..start + len];
            let value = match expr.split_once(":-") {
                Some((name, default)) => env::var(name).unwrap_or_else(|_| default.to_string()),
                None => env::var(expr).unwrap_or_else(|_| {
                    tracing::warn!(var = expr, "config references an unset environment variable");
                    String::new()
                }),
            };
            out.push_str(&value);
            rest = &rest[start + len + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}
