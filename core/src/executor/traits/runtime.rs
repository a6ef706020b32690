use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

/// Timed wait used for simulated step work.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Skips the wait but still yields to the scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}

/// Uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Replays a fixed script of draws, then repeats `fallback`.
#[derive(Debug)]
pub struct ScriptedRandom {
    script: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: clamp_unit(fallback),
        }
    }

    /// Always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(std::iter::empty(), value)
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        script.pop_front().map(clamp_unit).unwrap_or(self.fallback)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
