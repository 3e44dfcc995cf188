//! Default configuration values and environment variable names

/// App Store Connect public API base
pub const DEFAULT_API_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// Base of the web API used by the App Store Connect website
pub const DEFAULT_WEB_BASE_URL: &str =
    "https://appstoreconnect.apple.com/WebObjects/iTunesConnect.woa/ra";

/// Default number of attempts per upload chunk
pub const DEFAULT_UPLOAD_ATTEMPTS: u32 = 3;

/// Default pause between upload chunk attempts, in seconds
pub const DEFAULT_UPLOAD_RETRY_SLEEP_SECS: u64 = 2;

pub const ENV_KEY_ID: &str = "APP_STORE_CONNECT_KEY_ID";
pub const ENV_ISSUER_ID: &str = "APP_STORE_CONNECT_ISSUER_ID";
pub const ENV_PRIVATE_KEY_PATH: &str = "APP_STORE_CONNECT_PRIVATE_KEY_PATH";
pub const ENV_APP_ID: &str = "APP_STORE_CONNECT_APP_ID";
pub const ENV_BUNDLE_ID: &str = "APP_STORE_CONNECT_BUNDLE_ID";
pub const ENV_SSL_VERIFY: &str = "APP_STORE_CONNECT_SSL_VERIFY";
pub const ENV_TIMEOUT: &str = "APP_STORE_CONNECT_TIMEOUT";
pub const ENV_UPLOAD_RETRIES: &str = "APP_STORE_CONNECT_UPLOAD_RETRIES";
pub const ENV_UPLOAD_RETRY_SLEEP: &str = "APP_STORE_CONNECT_UPLOAD_RETRY_SLEEP";
pub const ENV_SESSION: &str = "APP_STORE_CONNECT_SESSION";

/// Session variable written by `fastlane spaceauth`
pub const ENV_FASTLANE_SESSION: &str = "FASTLANE_SESSION";

/// Name of the dotenv file read from the working directory
pub const DOTENV_FILE: &str = ".env";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        "appconnect.toml",
        "appconnect.yaml",
        "appconnect.yml",
        ".appconnect.toml",
    ]
}

/// Per-user state directory (`~/.appconnect`)
pub fn state_directory() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|home| home.join(".appconnect"))
}

/// Location of the cached web session file
pub fn session_file() -> Option<std::path::PathBuf> {
    state_directory().map(|dir| dir.join("session"))
}

/// Configuration template written by `appconnect config init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# appconnect configuration
# Environment variables (APP_STORE_CONNECT_*) override these values.

tls = "verify"

[credentials]
key_id = ""
issuer_id = ""
private_key_path = "AuthKey.p8"
# app_id = ""
# bundle_id = ""

[upload]
attempts = 3
sleep_secs = 2
"#;
