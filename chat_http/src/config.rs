//! Listening address from the environment

use std::net::SocketAddr;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `HOST`
    pub host: String,
    /// `PORT`
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host;
        }

        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            config.port = port
                .trim()
                .parse::<u16>()
                .map_err(|e| format!("Invalid PORT {:?}: {}", port, e))?;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 3001);
    }

    #[test]
    fn test_port_from_env() {
        let config = ServerConfig::from_lookup(|name| match name {
            "PORT" => Some("8080".to_string()),
            "HOST" => Some("127.0.0.1".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn test_bad_port() {
        let err = ServerConfig::from_lookup(|name| (name == "PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(err.contains("Invalid PORT"));
    }
}
