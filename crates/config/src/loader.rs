use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::BotConfig,
    validate::{Severity, validate},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["cibot.yaml", "cibot.yml", "cibot.toml", "cibot.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<BotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Parse already-substituted config text, picking the format from the file
/// extension of `path`.
pub fn parse_config(raw: &str, path: &Path) -> Result<BotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    match ext {
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

/// Load the config from `path`, or discover it when no path is given, then
/// validate it. Validation errors abort; warnings are logged.
pub fn discover_and_load(path: Option<&Path>) -> Result<BotConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => find_config_file().ok_or(Error::NotFound)?,
    };
    info!(path = %path.display(), "loading configuration");
    let config = load_config(&path)?;

    let result = validate(&config);
    for diag in &result.diagnostics {
        match diag.severity {
            Severity::Error => {},
            Severity::Warning => warn!(path = %diag.path, "{}", diag.message),
            Severity::Info => debug!(path = %diag.path, "{}", diag.message),
        }
    }
    if result.has_errors() {
        return Err(Error::Invalid(result));
    }
    Ok(config)
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./cibot.{yaml,yml,toml,json}` (project-local)
/// 2. `~/.config/cibot/cibot.{yaml,yml,toml,json}` (user-global)
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/cibot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "cibot").map(|d| d.config_dir().to_path_buf())
}

/// Returns the user data directory, used for the default store location.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "cibot").map(|d| d.data_dir().to_path_buf())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_format() {
        let yaml = parse_config("bot_name: a\n", Path::new("cibot.yaml")).unwrap();
        assert_eq!(yaml.bot_name.as_deref(), Some("a"));
        let toml = parse_config("bot_name = \"b\"\n", Path::new("cibot.toml")).unwrap();
        assert_eq!(toml.bot_name.as_deref(), Some("b"));
        let json = parse_config(r#"{"bot_name": "c"}"#, Path::new("cibot.json")).unwrap();
        assert_eq!(json.bot_name.as_deref(), Some("c"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = parse_config("", Path::new("cibot.ini")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn unparseable_yaml_is_an_error() {
        let err = parse_config("bot_name: [unterminated", Path::new("cibot.yml")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn load_and_validate_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cibot.yaml");
        std::fs::write(
            &path,
            "bot_name: cibot\nslack_token: xoxb-1\nenabled_plugins: [excuses]\n",
        )
        .unwrap();
        let cfg = discover_and_load(Some(&path)).unwrap();
        assert_eq!(cfg.enabled_plugins, vec!["excuses".to_string()]);
    }

    #[test]
    fn missing_identity_aborts_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cibot.yaml");
        std::fs::write(&path, "command_trigger: '!'\n").unwrap();
        let err = discover_and_load(Some(&path)).unwrap_err();
        let Error::Invalid(result) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(result.count(Severity::Error), 2);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_config(Path::new("/definitely/not/here/cibot.yaml")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
