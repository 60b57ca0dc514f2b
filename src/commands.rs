//! Command dispatch.
//!
//! A CLI command expands to one or more steps: `upload` re-resolves the CDN
//! URL once files are live, and `deploy` runs upload followed by clean.

use crate::{
    config::{AppConfig, Command},
    errors::DeployResult,
    handlers,
    services::{bucket_service::resolve_bucket, cdn::CdnDirectory, object_store::ObjectStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    Clean,
    Env,
}

impl Command {
    pub fn steps(self) -> &'static [Step] {
        match self {
            Command::Upload => &[Step::Upload, Step::Env],
            Command::Clean => &[Step::Clean],
            Command::Env => &[Step::Env],
            Command::Deploy => &[Step::Upload, Step::Env, Step::Clean],
        }
    }
}

/// Shared state of one invocation.
pub struct CommandContext<'a> {
    pub config: &'a AppConfig,
    pub store: &'a dyn ObjectStore,
    pub cdn: &'a dyn CdnDirectory,
    history: Vec<Step>,
    bucket: Option<String>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a dyn ObjectStore,
        cdn: &'a dyn CdnDirectory,
    ) -> Self {
        Self {
            config,
            store,
            cdn,
            history: Vec::new(),
            bucket: None,
        }
    }

    pub async fn run(&mut self, command: Command) -> DeployResult<()> {
        for step in command.steps() {
            self.history.push(*step);
            match step {
                Step::Upload => {
                    handlers::upload::run(self).await?;
                }
                Step::Clean => {
                    handlers::clean::run(self).await?;
                }
                Step::Env => {
                    handlers::env::run(self).await?;
                }
            }
        }
        Ok(())
    }

    /// Whether the running step is the first of this invocation.
    pub fn is_first_command(&self) -> bool {
        self.history.len() == 1
    }

    pub fn history(&self) -> &[Step] {
        &self.history
    }

    /// Resolve the asset bucket once per invocation.
    pub async fn bucket(&mut self) -> DeployResult<String> {
        if let Some(bucket) = &self.bucket {
            return Ok(bucket.clone());
        }
        let bucket = resolve_bucket(self.store, &self.config.bucket_prefix).await?;
        self.bucket = Some(bucket.clone());
        Ok(bucket)
    }
}
