use crate::error::Result;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Operator interrupts (Ctrl+C) routed to whichever phase is currently armed.
///
/// Each blocking phase calls [`Interrupt::arm`] for a fresh token, so an
/// interrupt that ended the scan does not also end the attack that follows.
#[derive(Clone, Default)]
pub struct Interrupt {
    current: Arc<Mutex<CancellationToken>>,
}

impl Interrupt {
    pub fn install() -> Result<Self> {
        let interrupt = Interrupt::default();
        let handler = interrupt.clone();
        ctrlc::set_handler(move || {
            log::debug!("Interrupt received");
            handler.trigger();
        })?;
        Ok(interrupt)
    }

    pub fn trigger(&self) {
        if let Ok(token) = self.current.lock() {
            token.cancel();
        }
    }

    pub fn arm(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        if let Ok(mut token) = self.current.lock() {
            *token = fresh.clone();
        }
        fresh
    }
}
