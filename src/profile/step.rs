//! Firing schedule data: steps and the bounded step list.

use heapless::Vec;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::MAX_TARGET_C;
use crate::error::ProfileError;

/// Maximum number of steps in one firing profile.
pub const MAX_STEPS: usize = 8;

/// One segment of a firing: reach `target_c`, then hold for `hold_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileStep {
    #[serde(rename = "targetC")]
    pub target_c: f32,
    /// Hold time in seconds; 0 holds indefinitely (manual advance only).
    #[serde(rename = "holdSec", default)]
    pub hold_secs: u32,
}

impl ProfileStep {
    pub fn new(target_c: f32, hold_secs: u32) -> Self {
        Self { target_c, hold_secs }
    }

    /// Hold 0 never advances on its own.
    pub fn is_indefinite(&self) -> bool {
        self.hold_secs == 0
    }

    fn check(&self) -> Result<(), ProfileError> {
        if self.target_c.is_finite() && (0.0..=MAX_TARGET_C).contains(&self.target_c) {
            Ok(())
        } else {
            Err(ProfileError::TargetOutOfRange)
        }
    }
}

/// Step as it arrives over the wire: the target may be missing or null.
#[derive(Deserialize)]
struct RawStep {
    #[serde(rename = "targetC", default)]
    target_c: Option<f32>,
    #[serde(rename = "holdSec", default)]
    hold_secs: u32,
}

/// An ordered, validated list of at most [`MAX_STEPS`] steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Profile {
    steps: Vec<ProfileStep, MAX_STEPS>,
}

impl Profile {
    /// An empty profile. Applying it clears the schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from steps, rejecting out-of-range targets and overlong lists.
    pub fn from_steps(steps: impl IntoIterator<Item = ProfileStep>) -> Result<Self, ProfileError> {
        let mut profile = Self::new();
        for step in steps {
            profile.push(step)?;
        }
        Ok(profile)
    }

    /// Parse the dashboard's `[{"targetC": .., "holdSec": ..}, ..]` form.
    ///
    /// Entries without a finite `targetC` are skipped, matching what the
    /// dashboard has always sent for blank rows.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let raw: std::vec::Vec<RawStep> =
            serde_json::from_str(json).map_err(|_| ProfileError::MalformedJson)?;
        let mut profile = Self::new();
        for (idx, entry) in raw.iter().enumerate() {
            match entry.target_c {
                Some(target_c) if target_c.is_finite() => {
                    profile.push(ProfileStep::new(target_c, entry.hold_secs))?;
                }
                _ => warn!("profile: skipping row {} without a target", idx),
            }
        }
        Ok(profile)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("[]"))
    }

    /// Append a step.
    pub fn push(&mut self, step: ProfileStep) -> Result<(), ProfileError> {
        step.check()?;
        self.steps
            .push(step)
            .map_err(|_| ProfileError::TooManySteps)
    }

    pub fn steps(&self) -> &[ProfileStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&ProfileStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
