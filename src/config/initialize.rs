use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tokio::task::JoinHandle;

use crate::backend::{self, memory, BackendKind, MemoryBackend, RestBackend, SharedBackend};
use crate::common::{debug, info};
use crate::config::Config;
use crate::core::{Builder, GateHandle};
use crate::Result;

#[derive(Debug, Default)]
pub struct Initializer {
    pub config: Config,
}

/// Running gate together with the backend it was built on.
pub struct Portal {
    pub backend: SharedBackend,
    pub gate: GateHandle,
    pub task: JoinHandle<()>,
}

impl Initializer {
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub async fn load_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let f = fs::File::open(path).await?;
        let config = serde_yaml::from_reader::<_, Config>(f.into_std().await)?;

        Ok(Self { config })
    }

    /// Like `load_config_file` but a missing file yields the defaults.
    pub async fn load_optional_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if fs::metadata(path).await.is_err() {
            debug!(path=%path.display(), "Config file not found, use defaults");
            return Ok(Self::default());
        }
        Self::load_config_file(path).await
    }

    /// Values set in `overrides` win over the loaded ones.
    pub fn override_backend(&mut self, overrides: &mut backend::Config) {
        self.config.backend.override_merge(overrides);
    }

    pub fn build_backend(&self) -> Result<SharedBackend> {
        let config = &self.config.backend;
        let backend: SharedBackend = match config.kind() {
            BackendKind::Memory => {
                let backend = MemoryBackend::with_session_ttl(config.session_ttl());
                let seeded = memory::seed(&backend, &config.accounts);
                info!(seeded, "In memory backend ready");
                Arc::new(backend)
            }
            BackendKind::Rest => {
                let backend = RestBackend::from_config(config)?;
                info!(url=%config.url().unwrap_or_default(), "Rest backend ready");
                Arc::new(backend)
            }
        };
        Ok(backend)
    }

    /// Build the backend and spawn the gate. The gate stops on `shutdown` or
    /// on `GateHandle::shutdown`.
    pub fn start<F>(self, shutdown: F) -> Result<Portal>
    where
        F: Future + Send + 'static,
        F::Output: Send,
    {
        let backend = self.build_backend()?;
        Ok(self.launch(backend, shutdown))
    }

    /// Spawn the gate over an already built backend.
    pub fn launch<F>(self, backend: SharedBackend, shutdown: F) -> Portal
    where
        F: Future + Send + 'static,
        F::Output: Send,
    {
        let (gate, handle) = Builder::from_config(Arc::clone(&backend), self.config.gate).build();
        let task = tokio::spawn(gate.run(shutdown));

        Portal {
            backend,
            gate: handle,
            task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::core::View;

    #[tokio::test]
    async fn load_yaml_and_start_memory_portal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
backend:
  kind: memory
  session_ttl_seconds: 60
  accounts:
    - email: guru@example.com
      password: secret
      full_name: Guru
      role: Guru/Admin
      status: approved
gate:
  event_channel_buffer: 8
"#
        )
        .unwrap();

        let initializer = Initializer::load_config_file(file.path()).await.unwrap();
        assert_eq!(initializer.config.backend.kind(), BackendKind::Memory);

        let portal = initializer.start(std::future::pending::<()>()).unwrap();
        let snapshot = portal.gate.settled().await.unwrap();
        assert_eq!(snapshot.view, View::SignIn);

        portal.gate.shutdown().await;
        portal.task.await.unwrap();
    }

    #[tokio::test]
    async fn zero_channel_buffers_still_start() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "backend:\n  kind: memory\ngate:\n  event_channel_buffer: 0\n  command_channel_buffer: 0\n"
        )
        .unwrap();

        let initializer = Initializer::load_config_file(file.path()).await.unwrap();
        let portal = initializer.start(std::future::pending::<()>()).unwrap();
        assert_eq!(portal.gate.settled().await.unwrap().view, View::SignIn);

        portal.gate.shutdown().await;
        portal.task.await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let initializer = Initializer::load_optional_config_file(dir.path().join("none.yaml"))
            .await
            .unwrap();
        assert_eq!(initializer.config.backend.kind(), BackendKind::Rest);
        // Rest without url cannot be built.
        assert!(initializer.build_backend().is_err());
    }
}
