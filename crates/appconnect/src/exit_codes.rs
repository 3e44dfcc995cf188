//! Exit codes for the CLI

use appconnect_client::Error as ClientError;
use appconnect_core::ConfigError;

/// Success
pub const SUCCESS: i32 = 0;

/// Configuration or API error
pub const ERROR: i32 = 1;

/// Exit code for a failed command.
///
/// Configuration and API failures share one code; scripts tell them apart
/// by the message.
pub fn for_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        tracing::debug!("exiting after configuration error");
    } else if let Some(client_err) = err.downcast_ref::<ClientError>() {
        tracing::debug!(config = client_err.is_config(), kind = ?client_err.api_kind(), "exiting after client error");
    }
    ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_and_api_errors_share_exit_code() {
        let config = anyhow::Error::from(ConfigError::MissingField("APP_STORE_CONNECT_KEY_ID".into()));
        let api = anyhow::Error::from(ClientError::Api(appconnect_client::ApiError::Forbidden {
            detail: "no access".into(),
        }));
        assert_eq!(for_error(&config), ERROR);
        assert_eq!(for_error(&api), ERROR);
    }
}
