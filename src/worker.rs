// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Builds meshes on a background thread so an interactive caller never
//! waits on one.
//!
//! Every submitted request gets a ticket, and the newest ticket wins:
//! a build in progress gives up as soon as a newer request arrives, and
//! requests still queued behind a newer one are skipped without being
//! started.  A caller that only cares about the latest view can just
//! keep submitting and take whatever arrives with the newest ticket.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use error::{MeshError, Result};
use mesh::{build_cancellable, sampler_for, BuildRequest, Mesh};

enum Command {
    Build { ticket: usize, request: BuildRequest },
    Stop,
}

/// The result of one submitted request.
#[derive(Debug)]
pub struct BuildOutcome {
    /// The ticket `submit` handed out for the request.
    pub ticket: usize,
    /// The mesh, or why there is none.  A superseded build reports
    /// `MeshError::Cancelled`.
    pub result: Result<Mesh>,
}

/// A background thread that builds meshes on request.
pub struct MeshWorker {
    tx_cmd: Sender<Command>,
    rx_result: Receiver<BuildOutcome>,
    latest: Arc<AtomicUsize>,
    stopped: AtomicBool,
    thread_handle: Option<JoinHandle<()>>,
}

impl MeshWorker {
    /// Starts the worker.  Each build samples on `threads` threads.
    pub fn new(threads: usize) -> MeshWorker {
        let (tx_cmd, rx_cmd) = channel::unbounded::<Command>();
        let (tx_result, rx_result) = channel::unbounded::<BuildOutcome>();
        let latest = Arc::new(AtomicUsize::new(0));
        let latest_clone = Arc::clone(&latest);

        let thread_handle = thread::spawn(move || {
            worker_thread(rx_cmd, tx_result, latest_clone, threads.max(1));
        });

        MeshWorker {
            tx_cmd,
            rx_result,
            latest,
            stopped: AtomicBool::new(false),
            thread_handle: Some(thread_handle),
        }
    }

    /// Queues a build and returns its ticket.  Tickets grow with every
    /// call; submitting supersedes every earlier ticket.  Once the worker
    /// has been stopped nothing would ever answer, so no ticket is
    /// handed out.
    pub fn submit(&self, request: BuildRequest) -> Option<usize> {
        if self.stopped.load(Ordering::SeqCst) {
            warn!("{} build submitted to a stopped worker", request.kind);
            return None;
        }
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("submitting {} build as ticket {}", request.kind, ticket);
        match self.tx_cmd.send(Command::Build { ticket, request }) {
            Ok(()) => Some(ticket),
            Err(_) => {
                warn!("worker thread is gone, ticket {} dropped", ticket);
                None
            }
        }
    }

    /// The most recent ticket handed out.
    pub fn latest_ticket(&self) -> usize {
        self.latest.load(Ordering::SeqCst)
    }

    /// A finished outcome, if one is waiting.
    pub fn try_recv(&self) -> Option<BuildOutcome> {
        self.rx_result.try_recv().ok()
    }

    /// Waits up to `timeout` for the next outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<BuildOutcome> {
        match self.rx_result.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Waits for the outcome of `ticket`, discarding older ones.
    /// Returns `None` if nothing arrives within `timeout` of the last
    /// outcome seen.
    pub fn wait_for(&self, ticket: usize, timeout: Duration) -> Option<BuildOutcome> {
        while let Some(outcome) = self.recv_timeout(timeout) {
            if outcome.ticket == ticket {
                return Some(outcome);
            }
            debug!("discarding outcome of stale ticket {}", outcome.ticket);
        }
        None
    }

    /// Asks the thread to finish.  Any build in progress is abandoned
    /// and later submissions are refused.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.latest.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx_cmd.send(Command::Stop);
    }
}

impl Drop for MeshWorker {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_thread(
    rx_cmd: Receiver<Command>,
    tx_result: Sender<BuildOutcome>,
    latest: Arc<AtomicUsize>,
    threads: usize,
) {
    loop {
        let cmd = match rx_cmd.recv() {
            Ok(c) => c,
            Err(_) => return,
        };

        match cmd {
            Command::Build { ticket, request } => {
                if ticket < latest.load(Ordering::SeqCst) {
                    debug!("skipping superseded ticket {}", ticket);
                    let _ = tx_result.send(BuildOutcome {
                        ticket,
                        result: Err(MeshError::Cancelled),
                    });
                    continue;
                }

                let superseded = || latest.load(Ordering::SeqCst) != ticket;
                let result = sampler_for(&request)
                    .and_then(|sampler| build_cancellable(&request, &*sampler, threads, &superseded));
                if let Err(ref e) = result {
                    match *e {
                        MeshError::Cancelled => debug!("ticket {} superseded mid-build", ticket),
                        _ => warn!("ticket {} failed: {}", ticket, e),
                    }
                }
                if tx_result.send(BuildOutcome { ticket, result }).is_err() {
                    return;
                }
            }
            Command::Stop => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use params::FractalKind;

    const PATIENCE: Duration = Duration::from_secs(30);

    #[test]
    fn a_submitted_build_arrives() {
        let worker = MeshWorker::new(2);
        let ticket = worker.submit(BuildRequest::new(FractalKind::Julia).with_size(16)).unwrap();
        let outcome = worker.wait_for(ticket, PATIENCE).expect("no outcome");
        let mesh = outcome.result.unwrap();
        assert_eq!(mesh.vertex_count(), 16 * 16 * 4);
    }

    #[test]
    fn tickets_increase() {
        let worker = MeshWorker::new(1);
        let a = worker.submit(BuildRequest::new(FractalKind::Mandelbrot).with_size(2)).unwrap();
        let b = worker.submit(BuildRequest::new(FractalKind::Mandelbrot).with_size(2)).unwrap();
        assert!(b > a);
        assert_eq!(worker.latest_ticket(), b);
    }

    #[test]
    fn only_the_newest_request_is_guaranteed_a_mesh() {
        let worker = MeshWorker::new(1);
        let mut tickets = Vec::new();
        for _ in 0..3 {
            tickets.push(worker.submit(BuildRequest::new(FractalKind::Mandelbrot).with_size(200)).unwrap());
        }
        let newest = *tickets.last().unwrap();
        let mut seen = Vec::new();
        while let Some(outcome) = worker.recv_timeout(PATIENCE) {
            seen.push(outcome.ticket);
            if outcome.ticket == newest {
                assert!(outcome.result.is_ok());
                break;
            }
            match outcome.result {
                Err(MeshError::Cancelled) | Ok(_) => {}
                Err(e) => panic!("unexpected error {}", e),
            }
        }
        assert_eq!(seen.last(), Some(&newest));
    }

    #[test]
    fn invalid_requests_come_back_as_errors() {
        let worker = MeshWorker::new(1);
        let ticket = worker.submit(BuildRequest::new(FractalKind::Tree).with_size(0)).unwrap();
        let outcome = worker.wait_for(ticket, PATIENCE).expect("no outcome");
        match outcome.result {
            Err(MeshError::InvalidParams(_)) => {}
            other => panic!("unexpected {:?}", other.map(|m| m.vertex_count())),
        }
    }

    #[test]
    fn a_stopped_worker_hands_out_no_tickets() {
        let worker = MeshWorker::new(1);
        let before = worker.latest_ticket();
        worker.stop();
        assert_eq!(worker.submit(BuildRequest::new(FractalKind::Julia).with_size(2)), None);
        assert_eq!(worker.latest_ticket(), before + 1);
    }
}
