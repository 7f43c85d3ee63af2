use super::TranslateError;
use crate::config::LocalModelConfig;
use crate::i18n::Language;
use std::collections::HashSet;
use std::process::Output;
use std::sync::Mutex;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Default)]
struct InstallState {
    index_updated: bool,
    pairs: HashSet<(Language, Language)>,
}

/// Translator backed by an installed Argos Translate model.
///
/// The model for a language pair is installed the first time that pair is
/// used and remembered for the rest of the process.
pub struct LocalModel {
    config: LocalModelConfig,
    state: Mutex<InstallState>,
}

impl LocalModel {
    pub fn new(config: LocalModelConfig) -> Self {
        Self {
            config,
            state: Mutex::new(InstallState::default()),
        }
    }

    pub async fn translate(
        &self,
        text: &str,
        from: Language,
        to: Language,
    ) -> Result<String, TranslateError> {
        self.ensure_installed(from, to).await?;

        let output = Command::new(&self.config.translate_bin)
            .args(["--from-lang", from.code(), "--to-lang", to.code(), "--", text])
            .output()
            .await
            .map_err(|e| {
                TranslateError::LocalModel(format!(
                    "failed to run {}: {}",
                    self.config.translate_bin, e
                ))
            })?;

        if !output.status.success() {
            return Err(TranslateError::LocalModel(format!(
                "{} exited with {}: {}",
                self.config.translate_bin,
                output.status,
                stderr_of(&output)
            )));
        }

        let translated = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("Local model {}->{}: {:?} -> {:?}", from, to, text, translated);
        Ok(translated)
    }

    /// Whether the model for `from -> to` has been installed by this process.
    pub fn is_installed(&self, from: Language, to: Language) -> bool {
        self.lock_state().pairs.contains(&(from, to))
    }

    async fn ensure_installed(&self, from: Language, to: Language) -> Result<(), TranslateError> {
        let needs_index = {
            let state = self.lock_state();
            if state.pairs.contains(&(from, to)) {
                return Ok(());
            }
            !state.index_updated
        };

        if needs_index {
            // A stale index only matters if the install below fails
            match self.run_package_manager(&["update"]).await {
                Ok(output) if output.status.success() => {}
                Ok(output) => warn!("Package index update failed: {}", stderr_of(&output)),
                Err(e) => warn!("Package index update failed: {}", e),
            }
            self.lock_state().index_updated = true;
        }

        let package = format!("translate-{}_{}", from.code(), to.code());
        info!("Installing local translation model {}", package);

        let output = self
            .run_package_manager(&["install", &package])
            .await
            .map_err(|e| TranslateError::ModelUnavailable {
                from,
                to,
                detail: format!("failed to run {}: {}", self.config.package_manager_bin, e),
            })?;

        if !output.status.success() {
            return Err(TranslateError::ModelUnavailable {
                from,
                to,
                detail: stderr_of(&output),
            });
        }

        self.lock_state().pairs.insert((from, to));
        info!("✓ Local translation model {} ready", package);
        Ok(())
    }

    async fn run_package_manager(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(&self.config.package_manager_bin)
            .args(args)
            .output()
            .await
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, InstallState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
