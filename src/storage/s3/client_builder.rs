use std::time::Duration;

use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::retry::RetryConfig as SdkRetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_sdk_s3::Client;

use crate::config::ClientConfig;
use crate::types::S3Credentials;

const STATIC_CREDENTIALS_PROVIDER_NAME: &str = "s3cleaner-static";

impl ClientConfig {
    /// Builds an S3 client from the loaded SDK configuration.
    pub fn create_client(&self, sdk_config: &SdkConfig) -> Client {
        let config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(self.force_path_style)
            .build();

        Client::from_conf(config)
    }

    /// Loads the shared SDK configuration (region, credentials, retry,
    /// timeouts, endpoint). Does not touch the network.
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut config_loader = self
            .load_config_credential(aws_config::defaults(BehaviorVersion::latest()))
            .region(Region::new(self.region.clone()))
            .retry_config(self.build_retry_config());

        if let Some(timeout_config) = self.build_timeout_config() {
            config_loader = config_loader.timeout_config(timeout_config);
        }

        if let Some(endpoint_url) = &self.endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint_url);
        }

        config_loader.load().await
    }

    fn load_config_credential(&self, mut config_loader: ConfigLoader) -> ConfigLoader {
        match &self.credential {
            S3Credentials::Credentials { access_keys } => {
                let credentials = Credentials::new(
                    access_keys.access_key.to_string(),
                    access_keys.secret_access_key.to_string(),
                    access_keys.session_token.clone(),
                    None,
                    STATIC_CREDENTIALS_PROVIDER_NAME,
                );
                config_loader = config_loader.credentials_provider(credentials);
            }
            S3Credentials::Profile(profile_name) => {
                let provider = ProfileFileCredentialsProvider::builder()
                    .profile_files(self.build_profile_files())
                    .profile_name(profile_name)
                    .build();
                config_loader = config_loader.credentials_provider(provider);
            }
            S3Credentials::FromEnvironment => {
                if self.has_custom_profile_files() {
                    config_loader = config_loader.profile_files(self.build_profile_files());
                }
            }
        }

        config_loader
    }

    fn has_custom_profile_files(&self) -> bool {
        self.client_config_location.aws_config_file.is_some()
            || self
                .client_config_location
                .aws_shared_credentials_file
                .is_some()
    }

    fn build_profile_files(&self) -> EnvConfigFiles {
        let mut builder = EnvConfigFiles::builder();

        builder = match &self.client_config_location.aws_config_file {
            Some(path) => builder.with_file(EnvConfigFileKind::Config, path),
            None => builder.include_default_config_file(true),
        };
        builder = match &self.client_config_location.aws_shared_credentials_file {
            Some(path) => builder.with_file(EnvConfigFileKind::Credentials, path),
            None => builder.include_default_credentials_file(true),
        };

        builder.build()
    }

    fn build_retry_config(&self) -> SdkRetryConfig {
        SdkRetryConfig::standard()
            .with_max_attempts(self.retry_config.aws_max_attempts)
            .with_initial_backoff(Duration::from_millis(
                self.retry_config.initial_backoff_milliseconds,
            ))
    }

    fn build_timeout_config(&self) -> Option<TimeoutConfig> {
        let timeouts = &self.cli_timeout_config;
        if timeouts.operation_timeout_milliseconds.is_none()
            && timeouts.operation_attempt_timeout_milliseconds.is_none()
            && timeouts.connect_timeout_milliseconds.is_none()
            && timeouts.read_timeout_milliseconds.is_none()
        {
            return None;
        }

        let mut builder = TimeoutConfig::builder();
        builder.set_operation_timeout(
            timeouts
                .operation_timeout_milliseconds
                .map(Duration::from_millis),
        );
        builder.set_operation_attempt_timeout(
            timeouts
                .operation_attempt_timeout_milliseconds
                .map(Duration::from_millis),
        );
        builder.set_connect_timeout(
            timeouts
                .connect_timeout_milliseconds
                .map(Duration::from_millis),
        );
        builder.set_read_timeout(timeouts.read_timeout_milliseconds.map(Duration::from_millis));

        Some(builder.build())
    }
}
