use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let bind_addr = or_default("LEAGUEOPS_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("LEAGUEOPS_BIND_ADDR", e.to_string()))?;

    let rate_limit_per_minute = or_default("LEAGUEOPS_RATE_LIMIT_PER_MINUTE", "120")
        .parse::<usize>()
        .map_err(|e| invalid("LEAGUEOPS_RATE_LIMIT_PER_MINUTE", e.to_string()))?;
    if rate_limit_per_minute == 0 {
        return Err(invalid(
            "LEAGUEOPS_RATE_LIMIT_PER_MINUTE",
            "must be greater than zero".to_string(),
        ));
    }

    let env = parse_environment(&or_default("LEAGUEOPS_ENV", "development"))?;
    let log_level = or_default("LEAGUEOPS_LOG_LEVEL", "info");
    let leagues_path = PathBuf::from(or_default(
        "LEAGUEOPS_LEAGUES_PATH",
        "./config/leagues.yaml",
    ));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        leagues_path,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LEAGUEOPS_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(
            parse_environment("development").unwrap(),
            Environment::Development
        );
        assert_eq!(parse_environment("test").unwrap(), Environment::Test);
        assert_eq!(
            parse_environment("production").unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn parse_environment_unknown_fails() {
        let err = parse_environment("staging").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "LEAGUEOPS_ENV"));
    }

    #[test]
    fn build_app_config_uses_defaults_when_env_is_empty() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.env, Environment::Development);
        assert!(cfg.is_development());
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.leagues_path.to_str(), Some("./config/leagues.yaml"));
        assert_eq!(cfg.rate_limit_per_minute, 120);
    }

    #[test]
    fn build_app_config_applies_overrides() {
        let mut map = HashMap::new();
        map.insert("LEAGUEOPS_ENV", "production");
        map.insert("LEAGUEOPS_BIND_ADDR", "127.0.0.1:8080");
        map.insert("LEAGUEOPS_LOG_LEVEL", "debug");
        map.insert("LEAGUEOPS_LEAGUES_PATH", "/etc/leagueops/leagues.yaml");
        map.insert("LEAGUEOPS_RATE_LIMIT_PER_MINUTE", "30");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.env, Environment::Production);
        assert!(!cfg.is_development());
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(
            cfg.leagues_path.to_str(),
            Some("/etc/leagueops/leagues.yaml")
        );
        assert_eq!(cfg.rate_limit_per_minute, 30);
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = HashMap::new();
        map.insert("LEAGUEOPS_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LEAGUEOPS_BIND_ADDR"),
            "expected InvalidEnvVar(LEAGUEOPS_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_with_non_numeric_rate_limit() {
        let mut map = HashMap::new();
        map.insert("LEAGUEOPS_RATE_LIMIT_PER_MINUTE", "lots");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LEAGUEOPS_RATE_LIMIT_PER_MINUTE"),
            "expected InvalidEnvVar(LEAGUEOPS_RATE_LIMIT_PER_MINUTE), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_zero_rate_limit() {
        let mut map = HashMap::new();
        map.insert("LEAGUEOPS_RATE_LIMIT_PER_MINUTE", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }
}
