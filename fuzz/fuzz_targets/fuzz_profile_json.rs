//! Fuzz target: `Profile::from_json` (dashboard profile upload)
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - An accepted profile never holds more than `MAX_STEPS` steps
//! - Every accepted target is finite and within 0–2000 °C
//! - Loading an accepted profile enters step 0 with remaining == hold
//!
//! cargo fuzz run fuzz_profile_json

#![no_main]

use kilnctl::profile::{MAX_STEPS, Profile, ProfileRunner, ProfileState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(profile) = Profile::from_json(text) else {
        return;
    };

    assert!(profile.len() <= MAX_STEPS);
    for step in profile.steps() {
        assert!(step.target_c.is_finite());
        assert!((0.0..=2000.0).contains(&step.target_c));
    }

    let first = profile.get(0).copied();
    let mut runner = ProfileRunner::new();
    let target = runner.load(profile, 0);
    match first {
        Some(step) => {
            assert_eq!(target, Some(step.target_c));
            assert_eq!(runner.state(), ProfileState::StepActive(0));
            assert_eq!(runner.progress().remaining_secs, step.hold_secs);
        }
        None => assert_eq!(runner.state(), ProfileState::Idle),
    }
});
