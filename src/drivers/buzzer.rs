//! Buzzer driver.
//!
//! Same actuator capability as an LED channel but no blink concept: the
//! buzzer is either held on/off or pulsed for a duration on the caller's
//! thread. The on flag is an atomic shared with snapshot readers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::info;

use crate::app::ports::Actuator;
use crate::drivers::actuator::ActuatorCell;
use crate::drivers::blink::ShutdownSignal;

pub struct Buzzer {
    output: ActuatorCell,
    on: Arc<AtomicBool>,
}

impl Buzzer {
    pub fn new(actuator: Box<dyn Actuator>) -> Self {
        Self {
            output: ActuatorCell::new(actuator),
            on: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag for lock-free snapshot reads.
    pub fn on_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.on)
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }

    pub fn set(&mut self, on: bool) {
        self.output.set(on);
        self.on.store(on, Ordering::Release);
        info!("buzzer {}", if on { "on" } else { "off" });
    }

    /// Sound for `duration`, then silence. Blocks the caller. Returns
    /// `false` if shutdown cut the pulse short.
    pub fn pulse(&mut self, duration: Duration, shutdown: &ShutdownSignal) -> bool {
        self.output.set(true);
        self.on.store(true, Ordering::Release);
        let full = shutdown.sleep(duration);
        self.output.set(false);
        self.on.store(false, Ordering::Release);
        if full {
            info!("buzzer pulsed {} ms", duration.as_millis());
        } else {
            info!("buzzer pulse cut short by shutdown");
        }
        full
    }

    pub fn release(&mut self) {
        self.output.release();
        self.on.store(false, Ordering::Release);
    }

    pub fn is_released(&self) -> bool {
        self.output.is_released()
    }
}
