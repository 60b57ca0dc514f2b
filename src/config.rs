use crate::errors::{DeployError, DeployResult};
use clap::{Parser, Subcommand};
use std::{
    env, fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_OLD_VERSIONS: usize = 3;
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 16;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    /// Name prefix of the asset bucket; setup appends a unique suffix.
    pub bucket_prefix: String,
    pub aws: AwsSettings,
    pub build_location: Option<PathBuf>,
    pub old_versions: usize,
    pub upload_concurrency: usize,
}

/// Region and credentials that every AWS client of one invocation is built from.
#[derive(Debug, Clone)]
pub struct AwsSettings {
    pub region: String,
    /// `None` falls back to the ambient AWS credential chain.
    pub credentials: Option<StaticCredentials>,
}

#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Upload static assets to S3 behind CloudFront and prune old versions"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Application name, used as the key namespace (overrides CDN_APP_NAME)
    #[arg(long, global = true)]
    pub app_name: Option<String>,

    /// Bucket name prefix (overrides CDN_BUCKET_NAME)
    #[arg(long, global = true)]
    pub bucket_name: Option<String>,

    /// AWS region (overrides CDN_REGION)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// AWS access key id (overrides CDN_ACCESS_KEY_ID)
    #[arg(long, global = true)]
    pub access_key_id: Option<String>,

    /// AWS secret access key (overrides CDN_SECRET_ACCESS_KEY)
    #[arg(long, global = true)]
    pub secret_access_key: Option<String>,

    /// Directory holding the built bundle (overrides CDN_BUILD_LOCATION)
    #[arg(long, global = true)]
    pub build_location: Option<PathBuf>,

    /// Number of recent versions kept by `clean` (overrides CDN_OLD_VERSIONS)
    #[arg(long, global = true)]
    pub old_versions: Option<usize>,

    /// Maximum uploads in flight (overrides CDN_UPLOAD_CONCURRENCY)
    #[arg(long, global = true)]
    pub upload_concurrency: Option<usize>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Upload public files for the current build to S3
    Upload,
    /// Remove files belonging to old versions
    Clean,
    /// Print the CDN_URL for the app's distribution
    Env,
    /// Upload, then remove old versions
    Deploy,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> DeployResult<(Self, Command)> {
        let args = Args::parse();
        let command = args.command;
        let cfg = Self::resolve(args, |name| env::var(name).ok())?;
        Ok((cfg, command))
    }

    /// Merge CLI values over environment values. `lookup` reads one variable.
    pub fn resolve<F>(args: Args, lookup: F) -> DeployResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_name = args
            .app_name
            .or_else(|| lookup("CDN_APP_NAME"))
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DeployError::config("app name is required (CDN_APP_NAME)"))?;
        if app_name.contains('/') {
            return Err(DeployError::config(format!(
                "app name `{app_name}` must not contain `/`"
            )));
        }

        let bucket_prefix = args
            .bucket_name
            .or_else(|| lookup("CDN_BUCKET_NAME"))
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DeployError::config("bucket name is required (CDN_BUCKET_NAME)"))?;

        let region = args
            .region
            .or_else(|| lookup("CDN_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.into());

        let access_key_id = args.access_key_id.or_else(|| lookup("CDN_ACCESS_KEY_ID"));
        let secret_access_key = args
            .secret_access_key
            .or_else(|| lookup("CDN_SECRET_ACCESS_KEY"));
        let credentials = match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            _ => {
                return Err(DeployError::config(
                    "access key id and secret access key must be set together",
                ));
            }
        };

        let build_location = args
            .build_location
            .or_else(|| lookup("CDN_BUILD_LOCATION").map(PathBuf::from));

        // Zero reads as unset; keeping nothing would delete the version just uploaded.
        let old_versions = setting(args.old_versions, "CDN_OLD_VERSIONS", &lookup)?
            .filter(|keep| *keep > 0)
            .unwrap_or(DEFAULT_OLD_VERSIONS);
        let upload_concurrency =
            setting(args.upload_concurrency, "CDN_UPLOAD_CONCURRENCY", &lookup)?
                .unwrap_or(DEFAULT_UPLOAD_CONCURRENCY);
        if upload_concurrency == 0 {
            return Err(DeployError::config("upload concurrency must be at least 1"));
        }

        Ok(Self {
            app_name,
            bucket_prefix,
            aws: AwsSettings {
                region,
                credentials,
            },
            build_location,
            old_versions,
            upload_concurrency,
        })
    }

    /// Build directory; only commands that read the bundle need it.
    pub fn build_location(&self) -> DeployResult<&Path> {
        self.build_location
            .as_deref()
            .ok_or_else(|| DeployError::config("build location is required (CDN_BUILD_LOCATION)"))
    }

    /// `<build>/bundle/programs`, where each architecture has its own directory.
    pub fn programs_dir(&self) -> DeployResult<PathBuf> {
        Ok(self.build_location()?.join("bundle").join("programs"))
    }
}

fn setting<T, F>(cli: Option<T>, name: &str, lookup: &F) -> DeployResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    if cli.is_some() {
        return Ok(cli);
    }
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| DeployError::config(format!("parsing {name} value `{value}`: {err}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["cdn-assets"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_fills_unset_flags() {
        let cfg = AppConfig::resolve(
            args(&["clean"]),
            env_of(&[
                ("CDN_APP_NAME", "todos"),
                ("CDN_BUCKET_NAME", "todos-assets"),
                ("CDN_OLD_VERSIONS", "5"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.app_name, "todos");
        assert_eq!(cfg.bucket_prefix, "todos-assets");
        assert_eq!(cfg.aws.region, DEFAULT_REGION);
        assert!(cfg.aws.credentials.is_none());
        assert_eq!(cfg.old_versions, 5);
        assert_eq!(cfg.upload_concurrency, DEFAULT_UPLOAD_CONCURRENCY);
    }

    #[test]
    fn flags_override_env() {
        let cfg = AppConfig::resolve(
            args(&[
                "upload",
                "--app-name",
                "web",
                "--old-versions",
                "1",
                "--build-location",
                "/tmp/build",
            ]),
            env_of(&[
                ("CDN_APP_NAME", "todos"),
                ("CDN_BUCKET_NAME", "b"),
                ("CDN_OLD_VERSIONS", "5"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.app_name, "web");
        assert_eq!(cfg.old_versions, 1);
        assert_eq!(
            cfg.programs_dir().unwrap(),
            PathBuf::from("/tmp/build/bundle/programs")
        );
    }

    #[test]
    fn missing_bucket_is_config_error() {
        let err = AppConfig::resolve(args(&["env"]), env_of(&[("CDN_APP_NAME", "todos")]))
            .unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }

    #[test]
    fn half_credentials_rejected() {
        let err = AppConfig::resolve(
            args(&["env"]),
            env_of(&[
                ("CDN_APP_NAME", "todos"),
                ("CDN_BUCKET_NAME", "b"),
                ("CDN_ACCESS_KEY_ID", "AKIA"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }

    #[test]
    fn malformed_number_rejected() {
        let err = AppConfig::resolve(
            args(&["clean"]),
            env_of(&[
                ("CDN_APP_NAME", "todos"),
                ("CDN_BUCKET_NAME", "b"),
                ("CDN_OLD_VERSIONS", "three"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("CDN_OLD_VERSIONS"));
    }

    #[test]
    fn zero_old_versions_falls_back_to_default() {
        let cfg = AppConfig::resolve(
            args(&["deploy"]),
            env_of(&[
                ("CDN_APP_NAME", "todos"),
                ("CDN_BUCKET_NAME", "b"),
                ("CDN_OLD_VERSIONS", "0"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.old_versions, DEFAULT_OLD_VERSIONS);

        let cfg = AppConfig::resolve(
            args(&["clean", "--old-versions", "0"]),
            env_of(&[("CDN_APP_NAME", "todos"), ("CDN_BUCKET_NAME", "b")]),
        )
        .unwrap();
        assert_eq!(cfg.old_versions, DEFAULT_OLD_VERSIONS);
    }

    #[test]
    fn zero_upload_concurrency_rejected() {
        let err = AppConfig::resolve(
            args(&["upload"]),
            env_of(&[
                ("CDN_APP_NAME", "todos"),
                ("CDN_BUCKET_NAME", "b"),
                ("CDN_UPLOAD_CONCURRENCY", "0"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
        assert!(err.to_string().contains("concurrency"));

        let err = AppConfig::resolve(
            args(&["upload", "--upload-concurrency", "0"]),
            env_of(&[("CDN_APP_NAME", "todos"), ("CDN_BUCKET_NAME", "b")]),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }

    #[test]
    fn build_location_required_on_demand() {
        let cfg = AppConfig::resolve(
            args(&["env"]),
            env_of(&[("CDN_APP_NAME", "todos"), ("CDN_BUCKET_NAME", "b")]),
        )
        .unwrap();
        assert!(matches!(
            cfg.build_location(),
            Err(DeployError::Config(_))
        ));
    }

    #[test]
    fn secret_not_in_debug_output() {
        let creds = StaticCredentials {
            access_key_id: "AKIA".into(),
            secret_access_key: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
