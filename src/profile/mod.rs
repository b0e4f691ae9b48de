//! Firing-profile state machine.
//!
//! ```text
//!            load(non-empty)                 hold elapsed, last step
//!   IDLE ───────────────────▶ STEP(i) ──────────────────────────────▶ FINISHED
//!     ▲                        │  ▲ │                                    │
//!     │ load(empty)            │  │ └─ hold elapsed / next / prev ─▶ STEP(i±1)
//!     └────────────────────────┘  └──────────── start (re-enter) ────────┘
//! ```
//!
//! The runner only owns step bookkeeping. The control loop decides each
//! tick whether the profile may advance (running, sensor valid, no trip,
//! profile mode) and applies the setpoint the runner hands back.
//!
//! While advancement is withheld the step clock is paused, not reset: the
//! setpoint stays where it is, and time spent frozen does not count toward
//! the hold.

pub mod step;

use log::info;

pub use step::{MAX_STEPS, Profile, ProfileStep};

/// Where the schedule is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileState {
    /// No steps loaded.
    #[default]
    Idle,
    /// Executing step `i`.
    StepActive(usize),
    /// The last step's hold elapsed. The fire is over.
    Finished,
}

/// Published progress of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileProgress {
    pub state: ProfileState,
    /// Index of the active (or, once finished, last) step.
    pub active_step: usize,
    pub step_count: usize,
    pub elapsed_secs: u32,
    /// 0 when the step holds indefinitely.
    pub remaining_secs: u32,
}

/// Outcome of one [`ProfileRunner::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileUpdate {
    /// Nothing moved (frozen, idle or finished).
    Held,
    /// Still in the same step; timing refreshed.
    Running,
    /// A new step was entered; the regulator should target `target_c`.
    Entered { index: usize, target_c: f32 },
    /// The last step completed; heating must stop.
    Finished,
}

/// Step sequencer for a loaded [`Profile`].
#[derive(Debug, Clone, Default)]
pub struct ProfileRunner {
    profile: Profile,
    state: ProfileState,
    active: usize,
    step_start_ms: u64,
    paused_at_ms: Option<u64>,
    elapsed_secs: u32,
    remaining_secs: u32,
}

impl ProfileRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the schedule and enter step 0. Returns the new setpoint, or
    /// `None` if the profile is empty (schedule cleared).
    pub fn load(&mut self, profile: Profile, now_ms: u64) -> Option<f32> {
        self.profile = profile;
        self.active = 0;
        self.elapsed_secs = 0;
        self.remaining_secs = 0;
        self.paused_at_ms = None;
        if self.profile.is_empty() {
            self.state = ProfileState::Idle;
            info!("Profile cleared (0 steps)");
            None
        } else {
            info!("Profile loaded, steps={}", self.profile.len());
            self.enter(0, now_ms)
        }
    }

    /// Jump to `index`. Out-of-range indices are ignored.
    pub fn goto_step(&mut self, index: usize, now_ms: u64) -> Option<f32> {
        if index < self.profile.len() {
            self.enter(index, now_ms)
        } else {
            None
        }
    }

    /// Manual advance; no-op on the last step.
    pub fn next_step(&mut self, now_ms: u64) -> Option<f32> {
        if self.profile.is_empty() {
            return None;
        }
        self.goto_step(self.active + 1, now_ms)
    }

    /// Manual step back; no-op on the first step.
    pub fn prev_step(&mut self, now_ms: u64) -> Option<f32> {
        if self.profile.is_empty() || self.active == 0 {
            return None;
        }
        self.goto_step(self.active - 1, now_ms)
    }

    /// Restart the current step's timing from zero (a new run). A finished
    /// schedule resumes on its last step.
    pub fn restart_step(&mut self, now_ms: u64) -> Option<f32> {
        if self.profile.is_empty() {
            return None;
        }
        self.enter(self.active, now_ms)
    }

    /// Advance the schedule. With `advancing == false` the step clock
    /// pauses and nothing else changes.
    pub fn update(&mut self, now_ms: u64, advancing: bool) -> ProfileUpdate {
        let ProfileState::StepActive(index) = self.state else {
            return ProfileUpdate::Held;
        };

        if !advancing {
            if self.paused_at_ms.is_none() {
                self.paused_at_ms = Some(now_ms);
            }
            return ProfileUpdate::Held;
        }
        if let Some(paused_at) = self.paused_at_ms.take() {
            self.step_start_ms += now_ms.saturating_sub(paused_at);
        }

        let hold = self.profile.steps()[index].hold_secs;
        let elapsed_ms = now_ms.saturating_sub(self.step_start_ms);
        self.elapsed_secs = u32::try_from(elapsed_ms / 1000).unwrap_or(u32::MAX);

        if hold == 0 {
            self.remaining_secs = 0;
            return ProfileUpdate::Running;
        }
        if self.elapsed_secs < hold {
            self.remaining_secs = hold - self.elapsed_secs;
            return ProfileUpdate::Running;
        }

        if index + 1 < self.profile.len() {
            let target_c = self.profile.steps()[index + 1].target_c;
            self.enter(index + 1, now_ms);
            ProfileUpdate::Entered {
                index: index + 1,
                target_c,
            }
        } else {
            self.state = ProfileState::Finished;
            self.remaining_secs = 0;
            info!("Profile finished");
            ProfileUpdate::Finished
        }
    }

    /// Target of the active step, if any step is active or just finished.
    pub fn target_c(&self) -> Option<f32> {
        match self.state {
            ProfileState::Idle => None,
            _ => self.profile.get(self.active).map(|s| s.target_c),
        }
    }

    pub fn progress(&self) -> ProfileProgress {
        ProfileProgress {
            state: self.state,
            active_step: self.active,
            step_count: self.profile.len(),
            elapsed_secs: self.elapsed_secs,
            remaining_secs: self.remaining_secs,
        }
    }

    pub fn state(&self) -> ProfileState {
        self.state
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    fn enter(&mut self, index: usize, now_ms: u64) -> Option<f32> {
        let step = *self.profile.get(index)?;
        self.active = index;
        self.state = ProfileState::StepActive(index);
        self.step_start_ms = now_ms;
        self.paused_at_ms = None;
        self.elapsed_secs = 0;
        self.remaining_secs = step.hold_secs;
        info!("Profile step={}/{}", index + 1, self.profile.len());
        Some(step.target_c)
    }
}
