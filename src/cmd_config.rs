//! `guidepost config` subcommands.

use guidepost_config::{ConfigValidator, GuideConfig};

use crate::cli::ConfigAction;

pub(crate) fn handle_config_command(
    config: &GuideConfig,
    action: ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Check { print } => config_check(config, print),
    }
}

fn config_check(config: &GuideConfig, print: bool) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config);

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if !result.is_valid() {
        return Err(format!("configuration has {} error(s)", result.errors.len()).into());
    }

    if print {
        println!("{}", toml::to_string_pretty(config)?);
    }
    println!("Configuration OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use guidepost_config::ConfigLoader;

    use super::*;

    #[test]
    fn test_shipped_config_is_valid() {
        let config = ConfigLoader::load_str(include_str!("../config/default.toml")).unwrap();
        assert!(ConfigValidator::validate(&config).is_valid());
        assert_eq!(config, GuideConfig::default());
    }

    #[test]
    fn test_invalid_config_fails_check() {
        let config = ConfigLoader::load_str("[scroll]\nviewport_fraction = 1.5\n").unwrap();
        assert!(config_check(&config, false).is_err());
    }

    #[test]
    fn test_default_config_passes_and_prints() {
        assert!(config_check(&GuideConfig::default(), true).is_ok());
    }
}
