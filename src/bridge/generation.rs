//! Background puzzle generation
//!
//! Generation runs on a forked engine handle on its own thread. The live
//! handle is never touched while the search runs, and a cancelled or failed
//! attempt is simply dropped.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, bounded};

use crate::consts::LOADING_THRESHOLD_SECS;
use crate::engine::{CancelToken, Midend};
use crate::error::{BridgeError, BridgeResult};

type Outcome = Result<Box<dyn Midend>, String>;

pub struct PendingGeneration {
    cancel: CancelToken,
    started: Instant,
    result: Receiver<Outcome>,
    worker: Option<JoinHandle<()>>,
}

impl PendingGeneration {
    /// Start generating on `midend`, which should be a fresh fork.
    pub fn spawn(mut midend: Box<dyn Midend>, seed: String) -> BridgeResult<Self> {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let (tx, rx) = bounded(1);

        let worker = std::thread::Builder::new()
            .name("puzzle-generation".into())
            .spawn(move || {
                let outcome = midend.new_game(&seed, &token).map(|()| midend);
                // Receiver gone means nobody wants the result.
                let _ = tx.send(outcome);
            })?;

        Ok(Self {
            cancel,
            started: Instant::now(),
            result: rx,
            worker: Some(worker),
        })
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The UI should dim the previous puzzle and show a spinner.
    pub fn show_loading(&self) -> bool {
        self.elapsed() >= Duration::from_secs_f32(LOADING_THRESHOLD_SECS)
    }

    fn finish(&mut self, outcome: Outcome) -> BridgeResult<Box<dyn Midend>> {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        match outcome {
            Ok(midend) if !self.cancel.is_cancelled() => Ok(midend),
            Ok(_) => Err(BridgeError::GenerationCancelled),
            Err(_) if self.cancel.is_cancelled() => Err(BridgeError::GenerationCancelled),
            Err(message) => Err(BridgeError::GenerationFailed(message)),
        }
    }

    /// Non-blocking check. `None` while still running.
    pub fn try_finish(&mut self) -> Option<BridgeResult<Box<dyn Midend>>> {
        match self.result.try_recv() {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(BridgeError::GenerationFailed(
                "generation worker exited without a result".to_string(),
            ))),
        }
    }

    /// Block up to `timeout`. `None` if it is still running afterwards.
    pub fn wait(&mut self, timeout: Duration) -> Option<BridgeResult<Box<dyn Midend>>> {
        match self.result.recv_timeout(timeout) {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(BridgeError::GenerationFailed(
                "generation worker exited without a result".to_string(),
            ))),
        }
    }

    /// Ask the worker to stop. It is detached, not joined.
    pub fn cancel(self) {
        log::info!("cancelling generation after {:?}", self.elapsed());
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::demo::LightsOut;

    /// A pending generation whose worker already answered.
    fn answered(outcome: Outcome, cancelled: bool) -> PendingGeneration {
        let (tx, rx) = bounded(1);
        tx.send(outcome).unwrap();
        let cancel = CancelToken::new();
        if cancelled {
            cancel.cancel();
        }
        PendingGeneration {
            cancel,
            started: Instant::now(),
            result: rx,
            worker: None,
        }
    }

    #[test]
    fn test_generation_completes() {
        let mut pending = PendingGeneration::spawn(LightsOut::new().fork(), "42".into()).unwrap();
        let midend = pending.wait(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(midend.random_seed().unwrap(), "5#42");
        assert!(midend.game_id().is_some());
    }

    #[test]
    fn test_failure_carries_engine_message() {
        let mut pending = answered(Err("no solution".into()), false);
        match pending.try_finish() {
            Some(Err(BridgeError::GenerationFailed(msg))) => assert_eq!(msg, "no solution"),
            _ => panic!("expected failure"),
        }
    }

    #[test]
    fn test_cancelled_result_discarded() {
        let mut pending = answered(Ok(LightsOut::new().fork()), true);
        assert!(matches!(
            pending.try_finish(),
            Some(Err(BridgeError::GenerationCancelled))
        ));

        let mut pending = answered(Err("Generation cancelled".into()), true);
        assert!(matches!(
            pending.try_finish(),
            Some(Err(BridgeError::GenerationCancelled))
        ));
    }

    #[test]
    fn test_running_and_lost_worker() {
        let (tx, rx) = bounded::<Outcome>(1);
        let mut pending = PendingGeneration {
            cancel: CancelToken::new(),
            started: Instant::now(),
            result: rx,
            worker: None,
        };
        assert!(pending.try_finish().is_none());
        assert!(!pending.show_loading());
        drop(tx);
        assert!(matches!(
            pending.try_finish(),
            Some(Err(BridgeError::GenerationFailed(_)))
        ));
    }

    #[test]
    fn test_show_loading_after_threshold() {
        let mut pending = answered(Err("slow".into()), false);
        pending.started = Instant::now() - Duration::from_secs(1);
        assert!(pending.show_loading());
    }
}
