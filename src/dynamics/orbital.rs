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

use super::{AccelModel, Dynamics, DynamicsAstroSnafu, DynamicsError};
use crate::cosmic::ephemerides::Asteroid;
use crate::cosmic::{Bodies, Cosm, Frame, Orbit};
use crate::linalg::{Vector3, Vector6};
use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;

pub use super::sph_harmonics::Harmonics;

/// `OrbitalDynamics` provides the equations of motion for any celestial dynamic, without state transition matrix computation.
///
/// The two-body acceleration of the center of the integration frame is always included, all other terms are acceleration models.
#[derive(Clone)]
pub struct OrbitalDynamics {
    pub accel_models: Vec<Arc<dyn AccelModel + Sync>>,
}

impl OrbitalDynamics {
    /// Initialize point mass dynamics given the third bodies, for states in the provided frame.
    pub fn point_masses(integr_frame: Frame, bodies: &[Bodies], cosm: Arc<Cosm>) -> Self {
        Self::new(vec![PointMasses::new(integr_frame, bodies, cosm)])
    }

    /// Initializes a OrbitalDynamics which does not simulate the gravity pull of other celestial objects but the primary one.
    pub fn two_body() -> Self {
        Self::new(vec![])
    }

    /// Initialize orbital dynamics with a list of acceleration models
    pub fn new(accel_models: Vec<Arc<dyn AccelModel + Sync>>) -> Self {
        Self { accel_models }
    }

    /// Total acceleration on the osculating state, in km/s^2
    pub fn accel(&self, osc: &Orbit) -> Result<Vector3<f64>, DynamicsError> {
        let mut accel = (-osc.frame.gm() / osc.rmag_km().powi(3)) * osc.radius_km;
        for model in &self.accel_models {
            accel += model.eom(osc)?;
        }
        Ok(accel)
    }
}

impl fmt::Display for OrbitalDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let models: Vec<String> = self.accel_models.iter().map(|x| format!("{x}")).collect();
        write!(f, "Orbital dynamics: two body; {}", models.join("; "))
    }
}

impl Dynamics for OrbitalDynamics {
    fn eom(
        &self,
        delta_t_s: f64,
        state: &Vector6<f64>,
        ctx: &Orbit,
    ) -> Result<Vector6<f64>, DynamicsError> {
        let osc = ctx.set_with_delta_seconds(delta_t_s, state);
        let accel = self.accel(&osc)?;
        Ok(Vector6::new(
            osc.velocity_km_s[0],
            osc.velocity_km_s[1],
            osc.velocity_km_s[2],
            accel[0],
            accel[1],
            accel[2],
        ))
    }
}

/// A perturbing body whose gravity is modeled as a point mass.
#[derive(Clone, Debug, PartialEq)]
pub enum ThirdBody {
    Major(Bodies),
    Asteroid(Asteroid),
}

impl ThirdBody {
    pub fn gm(&self) -> f64 {
        match self {
            Self::Major(body) => body.gm(),
            Self::Asteroid(asteroid) => asteroid.gm_km3_s2,
        }
    }
}

impl fmt::Display for ThirdBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major(body) => write!(f, "{body}"),
            Self::Asteroid(asteroid) => write!(f, "{}", asteroid.name),
        }
    }
}

/// PointMasses model
pub struct PointMasses {
    pub frame: Frame,
    pub bodies: Vec<ThirdBody>,
    pub cosm: Arc<Cosm>,
}

impl PointMasses {
    /// Initializes the multibody point mass dynamics with the provided list of bodies
    pub fn new(propagation_frame: Frame, bodies: &[Bodies], cosm: Arc<Cosm>) -> Arc<Self> {
        Arc::new(Self::with_bodies(
            propagation_frame,
            bodies.iter().map(|b| ThirdBody::Major(*b)).collect(),
            cosm,
        ))
    }

    pub fn with_bodies(propagation_frame: Frame, bodies: Vec<ThirdBody>, cosm: Arc<Cosm>) -> Self {
        Self {
            frame: propagation_frame,
            bodies,
            cosm,
        }
    }

    /// State of the third body relative to the center of the integration frame
    fn third_body_state(&self, third_body: &ThirdBody, osc: &Orbit) -> Result<Orbit, DynamicsError> {
        match third_body {
            ThirdBody::Major(body) => self.cosm.celestial_state(*body, osc.epoch, osc.frame),
            ThirdBody::Asteroid(asteroid) => self.cosm.asteroid_state(asteroid, osc.epoch, osc.frame),
        }
        .context(DynamicsAstroSnafu)
    }
}

impl fmt::Display for PointMasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.bodies.iter().map(|b| format!("{b}")).collect();
        write!(f, "Point masses of {}", names.join(", "))
    }
}

impl AccelModel for PointMasses {
    fn eom(&self, osc: &Orbit) -> Result<Vector3<f64>, DynamicsError> {
        let mut d_x = Vector3::zeros();
        for third_body in &self.bodies {
            let st_ij = self.third_body_state(third_body, osc)?;

            let r_ij = st_ij.radius_km;
            let r_ij3 = st_ij.rmag_km().powi(3);
            let r_j = osc.radius_km - r_ij; // sc as seen from 3rd body
            let r_j3 = r_j.norm().powi(3);
            // Direct pull on the object and indirect term from the acceleration of the center
            d_x += -third_body.gm() * (r_j / r_j3 + r_ij / r_ij3);
        }
        Ok(d_x)
    }
}
