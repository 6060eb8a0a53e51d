use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Byte sink the managed server's console output is copied into.
///
/// Clones share the underlying writer, so the stdout and stderr pumps can
/// interleave into one destination the way the server would write to a
/// terminal.
pub struct OutputSink(Arc<Mutex<Box<dyn AsyncWrite + Unpin + Sync + Send>>>);

impl Clone for OutputSink {
    fn clone(&self) -> Self {
        OutputSink(self.0.clone())
    }
}

impl OutputSink {
    pub fn new(writer: Box<dyn AsyncWrite + Unpin + Sync + Send>) -> Self {
        OutputSink(Arc::new(Mutex::new(writer)))
    }

    /// Sink that forwards to this process's stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(tokio::io::stdout()))
    }

    /// Sink that discards everything written to it.
    pub fn discard() -> Self {
        Self::new(Box::new(tokio::io::sink()))
    }

    // Sink failures must never stall the pump, so write errors are dropped.
    pub(crate) async fn write_all(&self, buf: &[u8]) {
        let mut writer = self.0.lock().await;
        let _ = writer.write_all(buf).await;
        let _ = writer.flush().await;
    }
}
