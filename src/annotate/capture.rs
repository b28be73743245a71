use crate::annotate::model::{Point, Size};
use crate::annotate::surface::{Rgba, Surface};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub viewport: Size,
    pub scroll: Point,
}

/// Rasterizes the visible page. Runs off the event thread.
pub trait ScreenshotProvider: Send + Sync {
    fn capture(&self, request: &CaptureRequest) -> Result<Surface>;
}

/// Provider that paints the whole viewport one colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidColorProvider(pub Rgba);

impl ScreenshotProvider for SolidColorProvider {
    fn capture(&self, request: &CaptureRequest) -> Result<Surface> {
        let (width, height) = request.viewport.to_pixels();
        Ok(Surface::new(width, height, self.0))
    }
}

/// The last screenshot received, with the scroll offset it was taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    pub surface: Surface,
    pub origin: Point,
}

impl Screenshot {
    pub fn origin_pixels(&self) -> (i32, i32) {
        (self.origin.x.round() as i32, self.origin.y.round() as i32)
    }
}

#[derive(Debug)]
pub struct CaptureOutcome {
    pub sequence: u64,
    pub epoch: u64,
    pub request: CaptureRequest,
    pub result: Result<Surface>,
}

/// Runs each capture on its own thread and hands results back over a
/// channel. Requests are neither cancelled nor de-duplicated.
pub struct CaptureWorker {
    provider: Arc<dyn ScreenshotProvider>,
    outcome_tx: Sender<CaptureOutcome>,
    outcome_rx: Receiver<CaptureOutcome>,
    next_sequence: u64,
    in_flight: usize,
}

impl CaptureWorker {
    pub fn new(provider: Arc<dyn ScreenshotProvider>) -> Self {
        let (outcome_tx, outcome_rx) = channel();
        Self {
            provider,
            outcome_tx,
            outcome_rx,
            next_sequence: 0,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn request(&mut self, request: CaptureRequest, epoch: u64) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.in_flight += 1;

        let provider = Arc::clone(&self.provider);
        let tx = self.outcome_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("overlay-capture-{sequence}"))
            .spawn(move || {
                let result = provider.capture(&request);
                let _ = tx.send(CaptureOutcome {
                    sequence,
                    epoch,
                    request,
                    result,
                });
            });

        if let Err(err) = spawned {
            let _ = self.outcome_tx.send(CaptureOutcome {
                sequence,
                epoch,
                request,
                result: Err(anyhow::Error::new(err).context("spawn capture thread")),
            });
        }
        sequence
    }

    pub fn try_recv(&mut self) -> Option<CaptureOutcome> {
        match self.outcome_rx.try_recv() {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<CaptureOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl ScreenshotProvider for Failing {
        fn capture(&self, _request: &CaptureRequest) -> Result<Surface> {
            anyhow::bail!("renderer unavailable")
        }
    }

    fn request() -> CaptureRequest {
        CaptureRequest {
            viewport: Size::new(4.0, 3.0),
            scroll: Point::new(0.0, 10.0),
        }
    }

    #[test]
    fn outcomes_arrive_with_request_and_epoch() {
        let mut worker = CaptureWorker::new(Arc::new(SolidColorProvider(Rgba::BLACK)));
        let seq = worker.request(request(), 7);
        assert_eq!(worker.in_flight(), 1);

        let outcome = worker
            .recv_timeout(Duration::from_secs(5))
            .expect("capture outcome");
        assert_eq!(outcome.sequence, seq);
        assert_eq!(outcome.epoch, 7);
        assert_eq!(outcome.request, request());
        assert_eq!(outcome.result.expect("surface").size(), (4, 3));
        assert_eq!(worker.in_flight(), 0);
    }

    #[test]
    fn provider_failure_is_reported_as_outcome() {
        let mut worker = CaptureWorker::new(Arc::new(Failing));
        worker.request(request(), 0);
        let outcome = worker
            .recv_timeout(Duration::from_secs(5))
            .expect("capture outcome");
        assert!(outcome.result.is_err());
    }

    #[test]
    fn idle_worker_does_not_block() {
        let mut worker = CaptureWorker::new(Arc::new(SolidColorProvider(Rgba::BLACK)));
        assert!(worker.try_recv().is_none());
        assert!(worker.recv_timeout(Duration::from_secs(5)).is_none());
    }
}
