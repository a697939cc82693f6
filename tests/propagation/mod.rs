use impactor::cosmic::{Orbit, SUN_J2000};
use impactor::time::Epoch;

mod events;
mod export;
mod propagators;

/// The reference asteroid state, 1.7 AU from the Sun at the start of 2001
pub(crate) fn asteroid(epoch: Epoch) -> Orbit {
    Orbit::cartesian(
        -150_874_809.2,
        -187_234_595.3,
        -73_785_026.7,
        14.644_039_35,
        -11.757_448_19,
        -5.583_528_281,
        epoch,
        SUN_J2000,
    )
}
