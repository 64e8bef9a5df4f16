//! Shared PoH service: one generation task plus concurrent callers.
//!
//! The sequencer sits behind a single mutex. Generation, mix-ins and
//! verification all take that lock, so a ring insert and a verification's
//! read-then-tombstone on the same index are always linearized.
//!
//! Each run of the generator owns its own stop signal. Restarting after a
//! stop hands the previous task's handle to the new one, which waits for
//! it to exit before producing hashes, so at most one generator is ever
//! stepping the chain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::delay::STATE_BYTES;
use crate::error::{PohError, Result, VerifyError};
use crate::sequencer::{Sequencer, Tick};

/// Serializable snapshot of the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PohStatus {
    pub running: bool,
    pub sequence: u64,
    pub slot: u64,
    pub last_hash: String,
    pub lockouts: Vec<u64>,
    pub live_entries: usize,
}

/// Stop request for a single generator run.
struct StopSignal {
    running: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            notify: Notify::new(),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns true if this call performed the stop.
    fn stop(&self) -> bool {
        if self.running.swap(false, Ordering::AcqRel) {
            // Stores a permit, so a paced loop that is not yet waiting still wakes.
            self.notify.notify_one();
            true
        } else {
            false
        }
    }
}

struct Generator {
    signal: Arc<StopSignal>,
    /// Taken by `join`; the signal stays so `stop` still reaches the run.
    handle: Option<JoinHandle<Result<()>>>,
}

pub struct PohService {
    sequencer: Arc<Mutex<Sequencer>>,
    generator: Mutex<Option<Generator>>,
}

impl PohService {
    pub fn new(sequencer: Sequencer) -> Self {
        Self {
            sequencer: Arc::new(Mutex::new(sequencer)),
            generator: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.generator
            .lock()
            .as_ref()
            .is_some_and(|generator| generator.signal.is_running())
    }

    /// Spawn the generation task, paced by the configured slot duration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<()> {
        let pacing = self.sequencer.lock().config().target_slot_duration();
        self.start_with(pacing)
    }

    /// Spawn the generation task with an explicit pacing target.
    ///
    /// `None` steps as fast as possible on a blocking thread; `Some(d)`
    /// produces one slot's worth of hashes per `d`. A stopped run that has
    /// not exited yet is drained before the new run starts stepping.
    pub fn start_with(&self, slot_duration: Option<Duration>) -> Result<()> {
        let mut generator = self.generator.lock();
        if generator
            .as_ref()
            .is_some_and(|current| current.signal.is_running())
        {
            return Err(PohError::Task("generation already running".to_string()));
        }
        let previous = generator.take().and_then(|stopped| stopped.handle);

        let signal = Arc::new(StopSignal::new());
        let task_signal = signal.clone();
        let sequencer = self.sequencer.clone();

        match slot_duration {
            None => info!("Starting PoH generation (uncapped)"),
            Some(duration) => info!(?duration, "Starting PoH generation (paced)"),
        }

        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(err) = join_generation(previous).await {
                    warn!("Previous PoH generation task failed: {err}");
                }
            }

            match slot_duration {
                None => {
                    tokio::task::spawn_blocking(move || run_uncapped(&sequencer, &task_signal))
                        .await
                        .map_err(|err| PohError::Task(err.to_string()))
                }
                Some(duration) => {
                    run_paced(sequencer, task_signal, duration).await;
                    Ok(())
                }
            }
        });

        *generator = Some(Generator {
            signal,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Signal the generation task to stop after its current step.
    pub fn stop(&self) {
        if let Some(generator) = self.generator.lock().as_ref() {
            if generator.signal.stop() {
                info!("Stopping PoH generation");
            }
        }
    }

    /// Wait for the generation task to finish.
    pub async fn join(&self) -> Result<()> {
        let handle = self
            .generator
            .lock()
            .as_mut()
            .and_then(|generator| generator.handle.take());
        if let Some(handle) = handle {
            join_generation(handle).await.map_err(|err| {
                warn!("PoH generation task failed: {err}");
                err
            })?;
        }
        Ok(())
    }

    /// Stop and wait for the generation task.
    pub async fn shutdown(&self) -> Result<()> {
        self.stop();
        self.join().await
    }

    /// Advance by one step outside the generation task.
    pub fn step(&self) -> Tick {
        self.sequencer.lock().step()
    }

    /// Record an external event digest into the chain.
    pub fn mix_in(&self, payload: &[u8; STATE_BYTES]) -> Tick {
        self.sequencer.lock().mix_in(payload)
    }

    pub fn verify(&self, sequence: u64) -> bool {
        self.sequencer.lock().verify(sequence)
    }

    pub fn verify_detailed(&self, sequence: u64) -> std::result::Result<(), VerifyError> {
        self.sequencer.lock().verify_detailed(sequence)
    }

    pub fn status(&self) -> PohStatus {
        let running = self.is_running();
        let sequencer = self.sequencer.lock();
        PohStatus {
            running,
            sequence: sequencer.sequence(),
            slot: sequencer.slot(),
            last_hash: sequencer.last_hash().to_hex(),
            lockouts: sequencer.lockouts(),
            live_entries: sequencer.live_entries(),
        }
    }
}

impl Drop for PohService {
    fn drop(&mut self) {
        if let Some(generator) = self.generator.get_mut() {
            generator.signal.stop();
        }
    }
}

async fn join_generation(handle: JoinHandle<Result<()>>) -> Result<()> {
    handle
        .await
        .map_err(|err| PohError::Task(err.to_string()))?
}

fn run_uncapped(sequencer: &Mutex<Sequencer>, signal: &StopSignal) {
    while signal.is_running() {
        sequencer.lock().step();
    }
}

async fn run_paced(sequencer: Arc<Mutex<Sequencer>>, signal: Arc<StopSignal>, slot: Duration) {
    let mut ticker = interval(slot);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let hashes_per_slot = sequencer.lock().config().hashes_per_slot;

    while signal.is_running() {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = signal.notify.notified() => break,
        }
        for _ in 0..hashes_per_slot {
            if !signal.is_running() {
                break;
            }
            sequencer.lock().step();
        }
    }
}
