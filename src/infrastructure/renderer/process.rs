use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::{ports::PreviewRenderer, DomainError, RenderRequest, RenderTicket};
use crate::infrastructure::persistence::write_atomic;

pub const EXPORT_FILE: &str = "resume.pdf";

type Rendered = HashMap<RenderTicket, Vec<u8>>;

/// Renders by running an external program: the request JSON goes to its
/// stdin and whatever it writes to stdout is the artifact.
pub struct ProcessRenderer {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    export_dir: PathBuf,
    rendered: Mutex<Rendered>,
}

impl ProcessRenderer {
    pub fn new(program: impl Into<PathBuf>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(30),
            export_dir: export_dir.into(),
            rendered: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn export_path(&self) -> PathBuf {
        self.export_dir.join(EXPORT_FILE)
    }

    async fn run(&self, request: &RenderRequest) -> Result<Vec<u8>, DomainError> {
        let input = serde_json::to_vec(request)
            .map_err(|e| DomainError::internal(format!("Failed to encode render request: {}", e)))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DomainError::external(format!(
                    "Failed to start renderer {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DomainError::internal("renderer stdin was not captured"))?;
        let feed = async move {
            // A renderer may exit without reading everything; its exit
            // status decides the outcome.
            let _ = stdin.write_all(&input).await;
        };

        let run = async {
            let (_, output) = tokio::join!(feed, child.wait_with_output());
            output
        };
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                DomainError::external(format!(
                    "renderer timed out after {} ms",
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| DomainError::external(format!("renderer failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::external(format!(
                "renderer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }

    fn lock_rendered(&self) -> Result<MutexGuard<'_, Rendered>, DomainError> {
        self.rendered
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))
    }
}

#[async_trait]
impl PreviewRenderer for ProcessRenderer {
    #[tracing::instrument(skip(self, request), fields(seq = ticket.0))]
    async fn render_preview(
        &self,
        ticket: RenderTicket,
        request: &RenderRequest,
    ) -> Result<(), DomainError> {
        let bytes = self.run(request).await?;
        tracing::debug!(bytes = bytes.len(), "preview rendered");

        let mut rendered = self.lock_rendered()?;
        // Older tickets can never be displayed once a newer one has rendered.
        rendered.retain(|t, _| *t > ticket);
        rendered.insert(ticket, bytes);
        Ok(())
    }

    async fn fetch_preview(&self, ticket: RenderTicket) -> Result<String, DomainError> {
        let bytes = self.lock_rendered()?.remove(&ticket).ok_or_else(|| {
            DomainError::external(format!("no rendered preview for request {}", ticket.0))
        })?;
        Ok(STANDARD.encode(bytes))
    }

    #[tracing::instrument(skip(self, request))]
    async fn render_export(&self, request: &RenderRequest) -> Result<(), DomainError> {
        let bytes = self.run(request).await?;
        let path = self.export_path();
        write_atomic(&path, &bytes).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(())
    }
}
