//! Refresh Scheduler.
//!
//! Owns the power-up sequence and the refresh budget. After reset it drives
//! the command bus alone until the device is initialised; afterwards it only
//! asks for the bus (`request_to_refresh_soon`) and waits for a grant.
//!
//! The budget is a leaky bucket measured in cycles of retention left. It
//! drains by one every cycle and each completed REFRESH pours back one
//! `increment` (the retention period divided by the refreshes it requires).
//! A granted episode keeps refreshing until less than one increment is owed,
//! so catching up restores a bounded slice of headroom rather than the whole
//! period.

use crate::config::Timing;
use crate::pins::{BusCommand, Command};

/// Leaky-bucket refresh budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshBudget {
    level: u64,
    max: u64,
    increment: u64,
    lapsed: bool,
}

impl RefreshBudget {
    /// Creates a full budget.
    ///
    /// # Arguments
    ///
    /// * `max` - Cycles in one retention period.
    /// * `increment` - Cycles of retention restored by one REFRESH.
    pub fn new(max: u64, increment: u64) -> Self {
        Self {
            level: max,
            max,
            increment: increment.max(1),
            lapsed: false,
        }
    }

    /// Cycles of retention left before data loss.
    pub fn level(&self) -> u64 {
        self.level
    }

    /// Cycles of retention in a full budget.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Cycles of retention restored by one REFRESH.
    pub fn increment(&self) -> u64 {
        self.increment
    }

    /// Whole refreshes owed to bring the budget back to full.
    pub fn refreshes_to_do(&self) -> u64 {
        (self.max - self.level) / self.increment
    }

    /// Sticky data-loss flag.
    pub fn is_lapsed(&self) -> bool {
        self.lapsed
    }

    /// Lets one cycle of retention elapse.
    ///
    /// # Returns
    ///
    /// `true` on the cycle the budget runs out.
    pub fn decay(&mut self) -> bool {
        if self.level == 0 {
            return false;
        }
        self.level -= 1;
        if self.level == 0 {
            self.lapsed = true;
            return true;
        }
        false
    }

    /// Accounts for one completed REFRESH.
    ///
    /// After a lapse the stored data is already lost, so the budget restarts
    /// from full and the lapse flag clears.
    pub fn credit(&mut self) {
        if self.lapsed {
            self.level = self.max;
            self.lapsed = false;
        } else {
            self.level = (self.level + self.increment).min(self.max);
        }
    }

    /// Refills the budget without a refresh (used once, at initialisation).
    pub fn fill(&mut self) {
        self.level = self.max;
        self.lapsed = false;
    }
}

/// Steps of the power-up sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitPhase {
    /// Waiting for supply and clock to stabilise.
    WaitStartup,
    /// Close every bank.
    PrechargeAll,
    /// First of the two mandatory refreshes.
    FirstRefresh,
    /// Second mandatory refresh.
    SecondRefresh,
    /// Program burst length and CAS latency.
    ModeRegisterSet,
    /// Wait out tMRD before handing over the bus.
    Settle,
}

/// Top-level refresh state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshState {
    /// Running the power-up sequence; owns the bus.
    Initializing(InitPhase),
    /// Initialised, nothing owed beyond the threshold.
    Ready,
    /// Enough refreshes are owed to ask for the bus.
    RequestSoon,
    /// The budget ran out before a grant arrived.
    Lapsed,
    /// Granted; issuing REFRESH until the budget is topped up.
    AutoRefresh,
}

/// Status signals exported by the refresh scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshStatus {
    pub initialised: bool,
    pub in_progress: bool,
    pub request_soon: bool,
    pub lapsed: bool,
}

pub struct RefreshScheduler {
    state: RefreshState,
    budget: RefreshBudget,
    timing: Timing,
    /// Cycles left before the next command may be issued.
    wait: u64,
    /// A REFRESH has been issued and its tRC window has not closed yet.
    outstanding: bool,
    refreshes: u64,
    episodes: u64,
    lapses: u64,
}

impl RefreshScheduler {
    /// Creates a scheduler in the after-reset state.
    pub fn new(timing: &Timing) -> Self {
        Self {
            state: RefreshState::Initializing(InitPhase::WaitStartup),
            budget: RefreshBudget::new(timing.refresh_period, timing.refresh_increment),
            timing: *timing,
            wait: 0,
            outstanding: false,
            refreshes: 0,
            episodes: 0,
            lapses: 0,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn budget(&self) -> &RefreshBudget {
        &self.budget
    }

    /// REFRESH commands completed after initialisation.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Granted refresh episodes.
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Times the budget ran out.
    pub fn lapses(&self) -> u64 {
        self.lapses
    }

    pub fn status(&self) -> RefreshStatus {
        RefreshStatus {
            initialised: !matches!(self.state, RefreshState::Initializing(_)),
            in_progress: self.state == RefreshState::AutoRefresh,
            request_soon: matches!(self.state, RefreshState::RequestSoon | RefreshState::Lapsed),
            lapsed: self.budget.is_lapsed(),
        }
    }

    /// Advances one cycle.
    ///
    /// # Arguments
    ///
    /// * `enable_refresh` - Grant from the arbiter; only honored while a
    ///   refresh is requested.
    ///
    /// # Returns
    ///
    /// The command to drive if the scheduler needs the bus this cycle,
    /// `None` otherwise.
    pub fn tick(&mut self, enable_refresh: bool) -> Option<BusCommand> {
        if self.wait > 0 {
            self.wait -= 1;
        }

        if let RefreshState::Initializing(phase) = self.state {
            return self.step_init(phase);
        }

        if self.budget.decay() {
            self.lapses += 1;
            log::warn!(
                "refresh deadline missed, stored data is considered lost (lapse #{})",
                self.lapses
            );
        }

        if self.wait == 0 && self.outstanding {
            self.outstanding = false;
            self.refreshes += 1;
            self.budget.credit();
        }

        match self.state {
            RefreshState::Initializing(phase) => self.step_init(phase),
            RefreshState::AutoRefresh => self.step_auto_refresh(),
            RefreshState::Ready | RefreshState::RequestSoon | RefreshState::Lapsed => {
                self.state = if self.budget.is_lapsed() {
                    RefreshState::Lapsed
                } else if self.budget.refreshes_to_do() > self.timing.refresh_threshold {
                    RefreshState::RequestSoon
                } else {
                    RefreshState::Ready
                };

                if enable_refresh && self.state != RefreshState::Ready {
                    self.episodes += 1;
                    log::debug!(
                        "refresh granted: {} owed, level {}/{}",
                        self.budget.refreshes_to_do(),
                        self.budget.level(),
                        self.budget.max()
                    );
                    self.state = RefreshState::AutoRefresh;
                    return self.step_auto_refresh();
                }
                None
            }
        }
    }

    fn step_auto_refresh(&mut self) -> Option<BusCommand> {
        if self.wait > 0 {
            return Some(BusCommand::nop());
        }
        if self.budget.is_lapsed() || self.budget.refreshes_to_do() > 0 {
            self.wait = u64::from(self.timing.t_rc);
            self.outstanding = true;
            return Some(BusCommand::new(Command::Refresh));
        }
        log::debug!("refresh episode done, level {}", self.budget.level());
        self.state = RefreshState::Ready;
        None
    }

    fn step_init(&mut self, phase: InitPhase) -> Option<BusCommand> {
        if self.wait > 0 {
            return Some(BusCommand::nop());
        }

        let (cmd, wait, next) = match phase {
            InitPhase::WaitStartup => (
                BusCommand::nop(),
                self.timing.startup,
                InitPhase::PrechargeAll,
            ),
            InitPhase::PrechargeAll => (
                BusCommand::new(Command::PrechargeAll),
                u64::from(self.timing.t_rp),
                InitPhase::FirstRefresh,
            ),
            InitPhase::FirstRefresh => (
                BusCommand::new(Command::Refresh),
                u64::from(self.timing.t_rc),
                InitPhase::SecondRefresh,
            ),
            InitPhase::SecondRefresh => (
                BusCommand::new(Command::Refresh),
                u64::from(self.timing.t_rc),
                InitPhase::ModeRegisterSet,
            ),
            InitPhase::ModeRegisterSet => (
                BusCommand::with_payload(
                    Command::ModeRegisterSet,
                    0,
                    self.timing.mode_register.encode(),
                ),
                u64::from(self.timing.t_mrd),
                InitPhase::Settle,
            ),
            InitPhase::Settle => {
                self.budget.fill();
                self.state = RefreshState::Ready;
                log::debug!("SDRAM initialised");
                return None;
            }
        };

        self.wait = wait;
        self.state = RefreshState::Initializing(next);
        Some(cmd)
    }
}
