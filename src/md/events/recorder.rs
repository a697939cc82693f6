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

use super::condition::target_relative;
use super::{Detection, EventError};
use crate::cosmic::{Bodies, Cosm, Frame, Orbit};
use crate::linalg::Vector3;
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Impact,
    CloseApproach,
    Miss,
}

/// How the distance of an event record is measured from the target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistanceType {
    /// From the center of the target
    Radius,
    /// From the equatorial radius of the target
    Altitude,
}

/// An event of a propagation, expressed relative to the target body.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub event_type: EventType,
    pub epoch: Epoch,
    pub stopped: bool,
    pub rel_position_km: Vector3<f64>,
    pub rel_velocity_km_s: Vector3<f64>,
    pub distance_km: f64,
    pub distance_type: DistanceType,
    /// Frame of the relative position and velocity, centered on the target
    pub frame: Frame,
}

impl EventRecord {
    fn from_state(
        event_type: EventType,
        state: &Orbit,
        stopped: bool,
        target: Bodies,
        cosm: &Cosm,
    ) -> Result<Self, EventError> {
        let rel = target_relative(state, target, cosm)?;
        let (distance_km, distance_type) = match event_type {
            EventType::Impact => (rel.altitude_km(), DistanceType::Altitude),
            _ => (rel.rmag_km(), DistanceType::Radius),
        };
        Ok(Self {
            event_type,
            epoch: state.epoch,
            stopped,
            rel_position_km: rel.radius_km,
            rel_velocity_km_s: rel.velocity_km_s,
            distance_km,
            distance_type,
            frame: rel.frame,
        })
    }

    /// Relative state of the object in the frame of the target at the event
    pub fn rel_state(&self) -> Orbit {
        Orbit::new(
            self.rel_position_km,
            self.rel_velocity_km_s,
            self.epoch,
            self.frame,
        )
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} @ {}: {:?} {:.3} km in {} (v = {:.6} km/s){}",
            self.event_type,
            self.epoch,
            self.distance_type,
            self.distance_km,
            self.frame,
            self.rel_velocity_km_s.norm(),
            if self.stopped { " [stopped]" } else { "" }
        )
    }
}

/// The events of a propagation: exactly one final event and all of the close approaches.
#[derive(Clone, Debug, PartialEq)]
pub struct EventSummary {
    pub final_event: EventRecord,
    /// All of the close approaches, in the order of the propagation
    pub close_approaches: Vec<EventRecord>,
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "final event: {}", self.final_event)?;
        for ca in &self.close_approaches {
            write!(f, "\n\tclose approach: {ca}")?;
        }
        Ok(())
    }
}

/// Classifies the detections of a propagation into its final event and the list of close approaches.
///
/// An impact is always the final event. Otherwise, the close approach which stopped the propagation is. If neither
/// happened, the final event is a miss computed from the final state of the propagation.
pub fn classify(
    detections: &[Detection],
    final_state: &Orbit,
    target: Bodies,
    cosm: &Cosm,
) -> Result<EventSummary, EventError> {
    let close_approaches = detections
        .iter()
        .filter(|d| d.event_type == Some(EventType::CloseApproach))
        .map(|d| EventRecord::from_state(EventType::CloseApproach, &d.state, d.stopped, target, cosm))
        .collect::<Result<Vec<_>, _>>()?;

    let final_event = if let Some(impact) = detections
        .iter()
        .find(|d| d.event_type == Some(EventType::Impact))
    {
        EventRecord::from_state(EventType::Impact, &impact.state, impact.stopped, target, cosm)?
    } else if let Some(ca) = close_approaches.iter().rev().find(|ca| ca.stopped) {
        ca.clone()
    } else {
        EventRecord::from_state(EventType::Miss, final_state, false, target, cosm)?
    };

    Ok(EventSummary {
        final_event,
        close_approaches,
    })
}
