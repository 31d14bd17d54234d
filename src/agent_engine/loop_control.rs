use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::agent_engine::state::LoopConfig;

/// Cooperative stop flag shared between the environment and the run loop.
///
/// Only read at iteration boundaries; an in-flight model call or action is
/// never interrupted.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Step and wall-clock limits, checked between iterations like the stop flag.
pub struct LoopController {
    config: LoopConfig,
    start_time: Instant,
    steps: u32,
}

impl LoopController {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            steps: 0,
        }
    }

    /// Restart the wall clock and step count; called when the run begins.
    pub fn start(&mut self) {
        self.start_time = Instant::now();
        self.steps = 0;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn record_step(&mut self) {
        self.steps += 1;
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Reason the run must end, if a limit has been reached.
    pub fn limit_reached(&self) -> Option<String> {
        if let Some(max) = self.config.max_steps {
            if self.steps >= max {
                return Some(format!("step limit of {max} reached"));
            }
        }
        if let Some(max_min) = self.config.max_duration_minutes {
            if self.start_time.elapsed().as_secs() / 60 >= u64::from(max_min) {
                return Some(format!("time limit of {max_min} minutes reached"));
            }
        }
        None
    }
}
