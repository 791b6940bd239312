//! Configuration management for OCPP CSMS

use crate::{CsmsError, CsmsResult};
use ocpp_transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// CSMS configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener configuration
    pub server: ServerConfig,
    /// OCPP protocol configuration
    pub ocpp: OcppConfig,
    /// Control plane and id tag policy
    pub auth: AuthConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// WebSocket port charge points connect to
    pub websocket_port: u16,
    /// HTTP control plane port
    pub http_port: u16,
    /// WebSocket upgrade timeout in seconds
    pub handshake_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            websocket_port: 9000,
            http_port: 8000,
            handshake_timeout: 10,
        }
    }
}

/// OCPP protocol configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcppConfig {
    /// Supported sub-protocols
    pub supported_protocols: Vec<String>,
    /// Default outbound call timeout in seconds
    pub call_timeout: u64,
    /// Heartbeat interval handed out in BootNotification responses
    pub heartbeat_interval: i32,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Longest accepted charger id
    pub max_charger_id_len: usize,
}

impl Default for OcppConfig {
    fn default() -> Self {
        Self {
            supported_protocols: vec![ocpp_types::OCPP16_SUBPROTOCOL.to_string()],
            call_timeout: 30,
            heartbeat_interval: 10,
            max_message_size: 65536,
            max_charger_id_len: 48,
        }
    }
}

impl OcppConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout)
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Key required on mutating control plane requests; open when unset
    pub api_key: Option<String>,
    /// Id tags answered with `Blocked`
    pub blocked_id_tags: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Transport settings derived from the server and OCPP sections
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            max_message_size: self.ocpp.max_message_size,
            handshake_timeout: Duration::from_secs(self.server.handshake_timeout),
            sub_protocols: self.ocpp.supported_protocols.clone(),
            max_charger_id_len: self.ocpp.max_charger_id_len,
            ..TransportConfig::default()
        }
    }

    pub fn websocket_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.websocket_port)
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.http_port)
    }
}

/// Configuration builder for easier setup
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set server configuration
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Set OCPP configuration
    pub fn ocpp(mut self, ocpp: OcppConfig) -> Self {
        self.config.ocpp = ocpp;
        self
    }

    /// Set authentication configuration
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Set logging configuration
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    pub fn websocket_port(mut self, port: u16) -> Self {
        self.config.server.websocket_port = port;
        self
    }

    pub fn http_port(mut self, port: u16) -> Self {
        self.config.server.http_port = port;
        self
    }

    pub fn call_timeout(mut self, secs: u64) -> Self {
        self.config.ocpp.call_timeout = secs;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from file; missing sections and keys keep their defaults
pub fn load_from_file(path: &str) -> CsmsResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| CsmsError::Configuration {
        message: format!("cannot read {}: {}", path, e),
    })?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from environment variables
pub fn load_from_env() -> Config {
    let mut config = Config::default();
    apply_env(&mut config);
    config
}

/// Overlay `OCPP_*` environment variables onto an existing configuration
pub fn apply_env(config: &mut Config) {
    if let Ok(addr) = std::env::var("OCPP_BIND_ADDRESS") {
        config.server.bind_address = addr;
    }
    if let Ok(port) = std::env::var("OCPP_WEBSOCKET_PORT") {
        if let Ok(port) = port.parse() {
            config.server.websocket_port = port;
        }
    }
    if let Ok(port) = std::env::var("OCPP_HTTP_PORT") {
        if let Ok(port) = port.parse() {
            config.server.http_port = port;
        }
    }
    if let Ok(timeout) = std::env::var("OCPP_CALL_TIMEOUT") {
        if let Ok(timeout) = timeout.parse() {
            config.ocpp.call_timeout = timeout;
        }
    }
    if let Ok(key) = std::env::var("OCPP_API_KEY") {
        config.auth.api_key = Some(key).filter(|k| !k.is_empty());
    }
    if let Ok(level) = std::env::var("OCPP_LOG_LEVEL") {
        config.logging.level = level;
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.server.bind_address.is_empty() {
        return Err("Bind address cannot be empty".to_string());
    }
    if config.server.websocket_port == 0 {
        return Err("WebSocket port cannot be 0".to_string());
    }
    if config.server.http_port == 0 {
        return Err("HTTP port cannot be 0".to_string());
    }
    if config.server.websocket_port == config.server.http_port {
        return Err("WebSocket and HTTP ports must differ".to_string());
    }

    if config.ocpp.supported_protocols.is_empty() {
        return Err("At least one OCPP protocol must be supported".to_string());
    }
    if config.ocpp.call_timeout == 0 {
        return Err("Call timeout cannot be 0".to_string());
    }
    if config.ocpp.heartbeat_interval <= 0 {
        return Err("Heartbeat interval must be positive".to_string());
    }
    if config.ocpp.max_message_size == 0 {
        return Err("Max message size cannot be 0".to_string());
    }
    if config.ocpp.max_charger_id_len == 0 {
        return Err("Max charger id length cannot be 0".to_string());
    }

    if matches!(&config.auth.api_key, Some(key) if key.is_empty()) {
        return Err("API key cannot be empty when set".to_string());
    }

    Ok(())
}
