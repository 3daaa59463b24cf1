use super::{types::Config, ConfigError};
use crate::scheduler::CronSchedule;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Every job schedule is a valid cron expression
/// - Path mappings have both sides set
/// - Library root is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let schedules = [
        ("monitor.discovery_schedule", &config.monitor.discovery_schedule),
        ("monitor.acquisition_schedule", &config.monitor.acquisition_schedule),
        ("monitor.completion_schedule", &config.monitor.completion_schedule),
    ];
    for (key, expr) in schedules {
        CronSchedule::parse(expr)
            .map_err(|e| ConfigError::ValidationError(format!("{}: {}", key, e)))?;
    }

    for (i, mapping) in config.path_mappings.iter().enumerate() {
        if mapping.remote.trim().is_empty() || mapping.local.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "path_mappings[{}] needs both remote and local",
                i
            )));
        }
    }

    if config.placer.library_root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "placer.library_root cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::placer::PathMapping;
    use std::path::PathBuf;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                port: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_bad_schedule_fails() {
        let mut config = Config::default();
        config.monitor.completion_schedule = "every five minutes".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("monitor.completion_schedule"));
    }

    #[test]
    fn test_validate_empty_mapping_fails() {
        let mut config = Config::default();
        config.path_mappings.push(PathMapping::new("/downloads", ""));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_library_root_fails() {
        let mut config = Config::default();
        config.placer.library_root = PathBuf::new();
        assert!(validate_config(&config).is_err());
    }
}
