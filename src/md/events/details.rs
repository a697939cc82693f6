/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::EventType;
use crate::cosmic::Orbit;
use core::fmt;

/// Enumerates the possible edges of an event in a trajectory.
///
/// For a threshold crossing, the edge is the direction of the crossing in physical time. For an extremum, it's the
/// direction of the function right after it (so a minimum is rising and a maximum is falling).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventEdge {
    /// The function is increasing through the event
    Rising,
    /// The function is decreasing through the event
    Falling,
    /// If the edge cannot be clearly defined, it will be marked as unclear. This happens if the event is at a saddle point and the epoch precision is too large to find the exact slope.
    Unclear,
}

impl EventEdge {
    /// Edge from the values of the function just before and just after the event, in physical time
    pub(crate) fn from_values(before: f64, after: f64) -> Self {
        if after > before {
            Self::Rising
        } else if after < before {
            Self::Falling
        } else {
            Self::Unclear
        }
    }
}

/// A stopping condition which was detected and passed all of its constraints.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Index of the condition in the configured list
    pub condition: usize,
    /// The state at the refined epoch of the event
    pub state: Orbit,
    /// Value of the function of the condition at that state
    pub value: f64,
    pub edge: EventEdge,
    /// The event recorded by the condition
    pub event_type: Option<EventType>,
    /// Set if this detection ended the propagation
    pub stopped: bool,
    // Store the representation of the condition as a string to avoid holding a reference to it
    pub repr: String,
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {}: {:.6} ({:?}){}",
            self.repr,
            self.state.epoch,
            self.value,
            self.edge,
            if self.stopped { " [stop]" } else { "" }
        )
    }
}
