//! Single-flight reload coalescing.
//!
//! At most one load runs at a time. Requests that arrive while a load is in
//! flight collapse into exactly one follow-up load, started after the current
//! one finishes (successfully or not).

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::future::Future;

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
}

/// What a reload request should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The caller owns the flight and must run the load.
    Start,
    /// A load is already running; the request was folded into the follow-up.
    Coalesced,
}

/// What the flight owner should do after a load finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    RunAgain,
    Idle,
}

/// The bare state machine: `Idle`/`Loading` plus a pending flag.
#[derive(Debug, Default)]
pub struct SingleFlight {
    phase: LoadPhase,
    pending: bool,
}

impl SingleFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn request(&mut self) -> Admission {
        match self.phase {
            LoadPhase::Idle => {
                self.phase = LoadPhase::Loading;
                Admission::Start
            }
            LoadPhase::Loading => {
                self.pending = true;
                Admission::Coalesced
            }
        }
    }

    /// Record that the running load finished.
    pub const fn complete(&mut self) -> Completion {
        if self.pending {
            self.pending = false;
            Completion::RunAgain
        } else {
            self.phase = LoadPhase::Idle;
            Completion::Idle
        }
    }

    /// Drop the flight without finishing it. Any follow-up is discarded.
    pub const fn abandon(&mut self) {
        self.phase = LoadPhase::Idle;
        self.pending = false;
    }

    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Releases the flight if the owning future is dropped between polls.
struct FlightGuard<'a> {
    state: &'a RefCell<SingleFlight>,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.abandon();
            debug!("reload dropped mid-flight; loader released");
        }
    }
}

/// How a call to [`SingleFlightLoader::request_reload`] was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// This call owned the flight and ran `runs` loads back to back.
    Ran { runs: usize },
    Coalesced,
}

/// Drives [`SingleFlight`] for async loads on a single thread.
///
/// Not `Sync`; share it behind `Rc` between tasks on one `LocalSet` or one
/// cooperative event loop.
#[derive(Debug, Default)]
pub struct SingleFlightLoader {
    state: RefCell<SingleFlight>,
    total_runs: Cell<u64>,
}

impl SingleFlightLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a reload.
    ///
    /// If idle, runs `load` now and keeps re-running it while follow-up
    /// requests arrived during the previous run. If a load is already in
    /// flight, marks a follow-up and returns immediately.
    pub async fn request_reload<F, Fut, E>(&self, mut load: F) -> ReloadOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let admission = self.state.borrow_mut().request();
        if admission == Admission::Coalesced {
            debug!("reload requested while loading; coalesced");
            return ReloadOutcome::Coalesced;
        }

        let mut guard = FlightGuard {
            state: &self.state,
            armed: true,
        };
        let mut runs = 0usize;
        loop {
            runs += 1;
            self.total_runs.set(self.total_runs.get() + 1);
            if let Err(err) = load().await {
                warn!(error = %err, "reload failed");
            }
            let completion = self.state.borrow_mut().complete();
            match completion {
                Completion::RunAgain => debug!("running coalesced follow-up reload"),
                Completion::Idle => break,
            }
        }
        guard.armed = false;
        ReloadOutcome::Ran { runs }
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.state.borrow().phase()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    /// Loads started over the loader's lifetime.
    #[must_use]
    pub fn total_runs(&self) -> u64 {
        self.total_runs.get()
    }
}
