use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide stop flag, flipped by the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Route SIGINT/SIGTERM into this flag. Only one handler may be installed per process.
    pub fn install_signal_handler(&self) -> Result<(), ctrlc::Error> {
        let shutdown = self.clone();
        ctrlc::set_handler(move || {
            tracing::info!("interrupt received; shutting down");
            shutdown.trigger();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();
        assert!(!observer.is_triggered());

        shutdown.trigger();
        assert!(observer.is_triggered());
    }
}
