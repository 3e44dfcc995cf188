//! Configuration loading
//!
//! Sources, lowest precedence first: config file, `.env` in the working
//! directory, process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::*;
use super::types::{ConnectConfig, TlsMode};

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<ConnectConfig> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path)?;

    let config: ConnectConfig = if format == "TOML" {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each level `<dir>/<name>` is checked before `<dir>/.github/<name>`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Parse the contents of a dotenv file.
///
/// Supports `#` comments, an optional `export ` prefix and matching
/// single or double quotes around the value.
pub fn parse_dotenv(content: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = value.trim();
        let value = ['"', '\'']
            .iter()
            .find_map(|q| {
                value
                    .strip_prefix(*q)
                    .and_then(|rest| rest.strip_suffix(*q))
            })
            .unwrap_or(value);

        vars.insert(key.to_string(), value.to_string());
    }

    vars
}

/// Read `<dir>/.env` if it exists
pub fn load_dotenv(dir: &Path) -> Result<BTreeMap<String, String>> {
    let path = dir.join(DOTENV_FILE);
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }

    let content = std::fs::read_to_string(&path)?;
    let vars = parse_dotenv(&content);
    debug!(path = %path.display(), count = vars.len(), "loaded dotenv file");
    Ok(vars)
}

/// Overlay `APP_STORE_CONNECT_*` variables onto a config.
///
/// `lookup` returns the value of a variable, if set.
pub fn apply_env<F>(config: &mut ConnectConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(ENV_KEY_ID) {
        config.credentials.key_id = v;
    }
    if let Some(v) = lookup(ENV_ISSUER_ID) {
        config.credentials.issuer_id = v;
    }
    if let Some(v) = lookup(ENV_PRIVATE_KEY_PATH) {
        config.credentials.private_key_path = PathBuf::from(v);
    }
    if let Some(v) = lookup(ENV_APP_ID) {
        config.credentials.app_id = Some(v);
    }
    if let Some(v) = lookup(ENV_BUNDLE_ID) {
        config.credentials.bundle_id = Some(v);
    }

    if let Some(v) = lookup(ENV_SSL_VERIFY) {
        config.tls = TlsMode::from_flag(&v)
            .ok_or_else(|| ConfigError::invalid(ENV_SSL_VERIFY, format!("expected a boolean, got '{}'", v)))?;
    }
    if let Some(v) = lookup(ENV_TIMEOUT) {
        config.timeout_secs = Some(parse_number(ENV_TIMEOUT, &v)?);
    }
    if let Some(v) = lookup(ENV_UPLOAD_RETRIES) {
        config.upload.attempts = parse_number(ENV_UPLOAD_RETRIES, &v)?;
    }
    if let Some(v) = lookup(ENV_UPLOAD_RETRY_SLEEP) {
        config.upload.sleep_secs = parse_number(ENV_UPLOAD_RETRY_SLEEP, &v)?;
    }

    if let Some(v) = lookup(ENV_SESSION).or_else(|| lookup(ENV_FASTLANE_SESSION)) {
        config.session = Some(v);
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, format!("expected a non-negative integer, got '{}'", value)))
}

/// Resolve the effective configuration for a working directory.
///
/// The result is not validated; [`validate_config`](super::validate_config)
/// runs when a client is built from it.
pub fn resolve_config(dir: &Path) -> Result<(ConnectConfig, Option<PathBuf>)> {
    let config_path = find_config(dir);
    let mut config = match &config_path {
        Some(path) => load_config(path)?,
        None => ConnectConfig::default(),
    };

    let dotenv = load_dotenv(dir)?;
    apply_env(&mut config, |name| {
        std::env::var(name).ok().or_else(|| dotenv.get(name).cloned())
    })?;

    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("appconnect.toml");
        std::fs::write(&config_path, "tls = \"verify\"").unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_github_dir_from_child() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("appconnect.yaml");
        std::fs::write(&config_path, "tls: verify\n").unwrap();

        let child = temp.path().join("ios").join("App");
        std::fs::create_dir_all(&child).unwrap();

        assert_eq!(find_config(&child), Some(config_path));
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appconnect.yaml");
        std::fs::write(
            &path,
            "credentials:\n  key_id: KEY\n  issuer_id: ISS\n  private_key_path: /keys/AuthKey.p8\nupload:\n  attempts: 5\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.credentials.key_id, "KEY");
        assert_eq!(config.credentials.private_key_path, PathBuf::from("/keys/AuthKey.p8"));
        assert_eq!(config.upload.attempts, 5);
        assert_eq!(config.upload.sleep_secs, DEFAULT_UPLOAD_RETRY_SLEEP_SECS);
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appconnect.toml");
        std::fs::write(&path, "[credentials\nkey_id = ").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_parse_dotenv() {
        let vars = parse_dotenv(
            "# comment\n\nexport APP_STORE_CONNECT_KEY_ID=\"ABC\"\nAPP_STORE_CONNECT_ISSUER_ID='iss-1'\nBROKEN\nAPP_STORE_CONNECT_APP_ID = 42\n",
        );
        assert_eq!(vars.get("APP_STORE_CONNECT_KEY_ID").unwrap(), "ABC");
        assert_eq!(vars.get("APP_STORE_CONNECT_ISSUER_ID").unwrap(), "iss-1");
        assert_eq!(vars.get("APP_STORE_CONNECT_APP_ID").unwrap(), "42");
        assert!(!vars.contains_key("BROKEN"));
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut config = ConnectConfig::default();
        apply_env(
            &mut config,
            lookup_from(&[
                (ENV_KEY_ID, "KEY"),
                (ENV_ISSUER_ID, "ISS"),
                (ENV_PRIVATE_KEY_PATH, "/tmp/AuthKey.p8"),
                (ENV_APP_ID, "123"),
                (ENV_SSL_VERIFY, "false"),
                (ENV_UPLOAD_RETRIES, "7"),
                (ENV_UPLOAD_RETRY_SLEEP, "0"),
                (ENV_FASTLANE_SESSION, "myacinfo=abc"),
            ]),
        )
        .unwrap();

        assert_eq!(config.credentials.key_id, "KEY");
        assert_eq!(config.credentials.app_id.as_deref(), Some("123"));
        assert_eq!(config.tls, TlsMode::AcceptInvalidCerts);
        assert_eq!(config.upload.attempts, 7);
        assert_eq!(config.upload.sleep_secs, 0);
        assert_eq!(config.session.as_deref(), Some("myacinfo=abc"));
    }

    #[test]
    fn test_apply_env_prefers_own_session_var() {
        let mut config = ConnectConfig::default();
        apply_env(
            &mut config,
            lookup_from(&[(ENV_SESSION, "a=1"), (ENV_FASTLANE_SESSION, "b=2")]),
        )
        .unwrap();
        assert_eq!(config.session.as_deref(), Some("a=1"));
    }

    #[test]
    fn test_apply_env_rejects_bad_numbers() {
        let mut config = ConnectConfig::default();
        let err = apply_env(&mut config, lookup_from(&[(ENV_UPLOAD_RETRIES, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == ENV_UPLOAD_RETRIES));

        let err = apply_env(&mut config, lookup_from(&[(ENV_SSL_VERIFY, "sometimes")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_resolve_config_layers_env_over_dotenv_over_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("appconnect.toml"),
            "[credentials]\nkey_id = \"FROM_FILE\"\nissuer_id = \"FILE_ISS\"\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join(".env"),
            "APP_STORE_CONNECT_KEY_ID=FROM_DOTENV\nAPP_STORE_CONNECT_BUNDLE_ID=com.example.dotenv\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                (ENV_KEY_ID, Some("FROM_ENV")),
                (ENV_ISSUER_ID, None::<&str>),
                (ENV_BUNDLE_ID, None),
                (ENV_SESSION, None),
                (ENV_FASTLANE_SESSION, None),
            ],
            || {
                let (config, path) = resolve_config(temp.path()).unwrap();
                assert!(path.is_some());
                assert_eq!(config.credentials.key_id, "FROM_ENV");
                assert_eq!(config.credentials.issuer_id, "FILE_ISS");
                assert_eq!(config.credentials.bundle_id.as_deref(), Some("com.example.dotenv"));
            },
        );
    }
}
