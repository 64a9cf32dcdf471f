use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_types::os_shim_internal::{Env, Fs};
use tracing::{debug, info};

use crate::selection::Selector;

const AWS_PROFILE_ENV: &str = "AWS_PROFILE";
const AWS_DEFAULT_PROFILE_ENV: &str = "AWS_DEFAULT_PROFILE";
const AWS_CONFIG_FILE_ENV: &str = "AWS_CONFIG_FILE";

const DEFAULT_PROFILE_NAME: &str = "default";

pub const PROFILE_SELECTION_LABEL: &str = "AWS Profiles";

/// Lists the named profiles of an AWS config file, sorted.
///
/// The file is parsed by the SDK's profile loader. A missing file yields an
/// empty list. The `default` profile is not a named profile and is skipped.
pub async fn list_profiles_from_aws_config(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        debug!(path = %path.display(), "AWS config file not found.");
        return Ok(vec![]);
    }

    let profile_files = EnvConfigFiles::builder()
        .with_file(EnvConfigFileKind::Config, path)
        .build();
    let profile_set = aws_config::profile::load(&Fs::real(), &Env::real(), &profile_files, None)
        .await
        .with_context(|| format!("failed to parse AWS config file: {}", path.display()))?;

    let mut profiles: Vec<String> = profile_set
        .profiles()
        .filter(|name| *name != DEFAULT_PROFILE_NAME)
        .map(String::from)
        .collect();
    profiles.sort();
    profiles.dedup();

    Ok(profiles)
}

/// `AWS_CONFIG_FILE`, else `<home>/.aws/config`.
pub fn default_aws_config_path() -> Option<PathBuf> {
    default_aws_config_path_from(|name| std::env::var(name).ok())
}

fn default_aws_config_path_from<F>(env_lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = env_lookup(AWS_CONFIG_FILE_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    env_lookup("HOME")
        .or_else(|| env_lookup("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".aws").join("config"))
}

/// Decides which profile a connection uses.
///
/// Order: the explicit profile, `AWS_PROFILE`, `AWS_DEFAULT_PROFILE`, then an
/// interactive pick among the profiles of `config_file`. An empty result
/// means the ambient credential chain.
pub async fn resolve_profile(
    explicit: Option<&str>,
    config_file: Option<&Path>,
    selector: &dyn Selector,
) -> Result<String> {
    resolve_profile_with_env(
        explicit,
        config_file,
        selector,
        |name| std::env::var(name).ok(),
    )
    .await
}

async fn resolve_profile_with_env<F>(
    explicit: Option<&str>,
    config_file: Option<&Path>,
    selector: &dyn Selector,
    env_lookup: F,
) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(profile) = explicit.filter(|p| !p.is_empty()) {
        return Ok(profile.to_string());
    }

    for name in [AWS_PROFILE_ENV, AWS_DEFAULT_PROFILE_ENV] {
        if let Some(profile) = env_lookup(name).filter(|p| !p.is_empty()) {
            debug!(profile = profile, source = name, "profile taken from environment.");
            return Ok(profile);
        }
    }

    let config_path = match config_file {
        Some(path) => Some(path.to_path_buf()),
        None => default_aws_config_path_from(&env_lookup),
    };
    let profiles = match config_path {
        Some(path) => list_profiles_from_aws_config(&path).await?,
        None => vec![],
    };

    if profiles.is_empty() {
        info!("no named profiles found. using the default credential chain.");
        return Ok(String::new());
    }

    selector.select_one(PROFILE_SELECTION_LABEL, &profiles)
}
