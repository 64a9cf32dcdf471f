use anyhow::Result;
use serde_json::{Value, json};

const UNKNOWN: &str = "unknown";

/// Build information for the `version` subcommand.
///
/// `S3CLEANER_GIT_COMMIT` and `S3CLEANER_BUILD_DATE` are read at compile
/// time when the release build exports them.
pub fn version_info() -> Value {
    json!({
        "Version": env!("CARGO_PKG_VERSION"),
        "GitCommit": option_env!("S3CLEANER_GIT_COMMIT").unwrap_or(UNKNOWN),
        "BuildDate": option_env!("S3CLEANER_BUILD_DATE").unwrap_or(UNKNOWN),
        "RustTarget": {
            "OS": std::env::consts::OS,
            "ARCH": std::env::consts::ARCH,
        },
    })
}

pub fn version_json() -> Result<String> {
    Ok(serde_json::to_string_pretty(&version_info())?)
}
