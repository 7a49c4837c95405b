use std::path::PathBuf;

use crate::error::StartupError;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

// Fixed locations, not overridable from the environment.
pub const MODEL_REL_PATH: &str = "models/model.json";
pub const TEMPLATES_REL_DIR: &str = "templates";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub templates_dir: PathBuf,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                StartupError::InvalidConfig(format!("PORT must be a port number, got '{raw}'"))
            })?,
            None => DEFAULT_PORT,
        };
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        Ok(Self {
            host,
            port,
            model_path: resolve(MODEL_REL_PATH),
            templates_dir: resolve(TEMPLATES_REL_DIR),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Working directory first, then next to the executable. Falls back to the
/// working-directory path so a later load reports a clear not-found error.
fn resolve(rel: &str) -> PathBuf {
    let candidates = [
        PathBuf::from(rel),
        {
            let mut p = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
            p.pop(); // exe dir
            p.push(rel);
            p
        },
    ];

    for c in &candidates {
        if c.exists() {
            return c.clone();
        }
    }
    PathBuf::from(rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(vars: &[(&str, &str)]) -> Result<ServiceConfig, StartupError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = cfg(&[]).unwrap();
        assert_eq!(c.port, 8000);
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.bind_addr(), "0.0.0.0:8000");
        assert!(c.model_path.ends_with("models/model.json"));
        assert!(c.templates_dir.ends_with("templates"));
    }

    #[test]
    fn port_and_host_from_env() {
        let c = cfg(&[("PORT", "9123"), ("HOST", "127.0.0.1")]).unwrap();
        assert_eq!(c.bind_addr(), "127.0.0.1:9123");
    }

    #[test]
    fn bad_port_is_startup_error() {
        let err = cfg(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, StartupError::InvalidConfig(_)));
        assert!(cfg(&[("PORT", "70000")]).is_err());
    }

    #[test]
    fn model_path_ignores_env() {
        let c = cfg(&[("MODEL_PATH", "/tmp/other.json")]).unwrap();
        assert!(c.model_path.ends_with("models/model.json"));
    }
}
