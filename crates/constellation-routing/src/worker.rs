//! Background training worker.
//!
//! Training is synchronous and can run for thousands of episodes, so an
//! interactive host moves it onto its own thread. The satellites are moved
//! into the worker for the duration of the call and handed back with the
//! report, which gives the worker exclusive access without any locking.

use crate::config::RoutingConfig;
use crate::node::Satellite;
use crate::trainer::TrainingReport;
use crate::{Result, RoutingEngine, RoutingError};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Satellites (with their updated Q-tables) and the training report.
#[derive(Debug)]
pub struct TrainingResult {
    pub satellites: Vec<Satellite>,
    pub report: TrainingReport,
}

/// Handle to a training run on a background thread.
///
/// Dropping the handle abandons the run; the worker finishes its episodes
/// and discards the result.
pub struct TrainingHandle {
    receiver: Receiver<Result<TrainingResult>>,
    thread: JoinHandle<()>,
}

impl TrainingHandle {
    /// Block until the worker delivers its result.
    pub fn wait(self) -> Result<TrainingResult> {
        let result = self.receiver.recv().map_err(|_| RoutingError::WorkerLost);
        // A worker that panicked never sent; its join error carries nothing we report
        let _ = self.thread.join();
        result?
    }

    /// Non-blocking poll. `None` while the worker is still running.
    pub fn try_result(&self) -> Option<Result<TrainingResult>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RoutingError::WorkerLost)),
        }
    }
}

/// Start a training run on a dedicated thread.
pub fn spawn_training(
    satellites: Vec<Satellite>,
    start: usize,
    end: usize,
    episodes: usize,
    config: RoutingConfig,
) -> Result<TrainingHandle> {
    let (sender, receiver) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("q-routing-trainer".to_string())
        .spawn(move || {
            let mut satellites = satellites;
            let result = RoutingEngine::new(config).and_then(|mut engine| {
                let report = engine.train(&mut satellites, start, end, episodes)?;
                Ok(TrainingResult { satellites, report })
            });

            if sender.send(result).is_err() {
                debug!("Training result receiver dropped, discarding result");
            }
        })?;

    Ok(TrainingHandle { receiver, thread })
}
