use crate::controller::ServerController;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;
use warden_core::WardenError;

/// Tracks the one controller currently considered active.
///
/// The slot mutates only through [`publish`](Self::publish) and
/// [`clear`](Self::clear), both compare-and-set shaped, so concurrent
/// starts and stops resolve deterministically: exactly one publisher wins,
/// and only the party holding the published controller can clear it.
#[derive(Debug, Default)]
pub struct Supervisor {
    slot: Mutex<Option<Arc<ServerController>>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `controller` as the active instance if the slot is empty.
    /// Returns `false` when another controller is already published.
    pub fn publish(&self, controller: &Arc<ServerController>) -> bool {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_some() {
            return false;
        }
        *slot = Some(Arc::clone(controller));
        true
    }

    /// Remove and return the published controller, but only if it is
    /// `expected`. Returns `None` when another party already cleared or
    /// replaced it.
    pub fn clear(&self, expected: &Arc<ServerController>) -> Option<Arc<ServerController>> {
        let mut slot = self.slot.lock().unwrap();
        match &*slot {
            Some(current) if Arc::ptr_eq(current, expected) => slot.take(),
            _ => None,
        }
    }

    /// The currently active controller, if any.
    pub fn current(&self) -> Option<Arc<ServerController>> {
        self.slot.lock().unwrap().clone()
    }

    /// Start `controller`, then publish it as the active instance.
    ///
    /// When two starts finish near-simultaneously exactly one wins the slot;
    /// the loser's freshly started process is killed before the error is
    /// returned.
    pub async fn start_published(
        &self,
        controller: Arc<ServerController>,
        timeout: Duration,
    ) -> Result<Arc<ServerController>, WardenError> {
        controller.start(timeout).await?;

        if self.publish(&controller) {
            return Ok(controller);
        }

        warn!(
            "Another server is already active, discarding the {}",
            controller.summary()
        );
        controller.kill().await;

        let current = self
            .current()
            .map(|active| active.summary())
            .unwrap_or_else(|| "unknown".to_string());
        Err(WardenError::AlreadyRunningElsewhere { current })
    }

    /// Stop the published controller, if any, and free the slot.
    ///
    /// Safe to call concurrently: whichever caller wins the clear performs
    /// the stop, the rest are no-ops.
    pub async fn stop_published(&self) {
        let Some(controller) = self.current() else {
            return;
        };
        if let Some(controller) = self.clear(&controller) {
            controller.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::OutputSink;
    use warden_core::ServerConfig;

    fn controller() -> (tempfile::TempDir, Arc<ServerController>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(warden_core::MODULE_LAUNCHER_JAR), b"").unwrap();
        let config = ServerConfig::builder().home(dir.path()).build().unwrap();
        let controller = ServerController::new(config, OutputSink::discard()).unwrap();
        (dir, Arc::new(controller))
    }

    #[test]
    fn test_publish_admits_one_controller() {
        let supervisor = Supervisor::new();
        let (_dir_a, a) = controller();
        let (_dir_b, b) = controller();

        assert!(supervisor.publish(&a));
        assert!(!supervisor.publish(&b));
        assert!(Arc::ptr_eq(&supervisor.current().unwrap(), &a));
    }

    #[test]
    fn test_clear_requires_the_published_controller() {
        let supervisor = Supervisor::new();
        let (_dir_a, a) = controller();
        let (_dir_b, b) = controller();

        supervisor.publish(&a);
        assert!(supervisor.clear(&b).is_none());
        assert!(supervisor.current().is_some());

        assert!(supervisor.clear(&a).is_some());
        assert!(supervisor.current().is_none());

        // Cleared slot accepts a new controller.
        assert!(supervisor.publish(&b));
    }

    #[test]
    fn test_double_clear_is_safe() {
        let supervisor = Supervisor::new();
        let (_dir, a) = controller();

        supervisor.publish(&a);
        assert!(supervisor.clear(&a).is_some());
        assert!(supervisor.clear(&a).is_none());
    }

    #[test]
    fn test_racing_publishers_admit_exactly_one() {
        let supervisor = Arc::new(Supervisor::new());
        let contenders: Vec<_> = (0..8).map(|_| controller()).collect();

        let handles: Vec<_> = contenders
            .iter()
            .map(|(_, c)| {
                let supervisor = Arc::clone(&supervisor);
                let c = Arc::clone(c);
                std::thread::spawn(move || supervisor.publish(&c))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
