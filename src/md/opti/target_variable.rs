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

use crate::md::TargetingError;
use serde_derive::{Deserialize, Serialize};
use std::default::Default;
use std::fmt;

/// Defines the kind of correction to apply in the targeter: a component of an impulsive delta-v
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vary {
    /// Vary velocity component X, in the axes of the integration frame
    VelocityX,
    /// Vary velocity component Y, in the axes of the integration frame
    VelocityY,
    /// Vary velocity component Z, in the axes of the integration frame
    VelocityZ,
    /// Vary velocity along the velocity direction (VNC frame)
    VelocityV,
    /// Vary velocity along the orbit normal (VNC frame)
    VelocityN,
    /// Vary velocity along the co-normal (VNC frame)
    VelocityC,
}

impl Vary {
    /// Whether this component is expressed in the local VNC frame of the state
    pub fn is_local(&self) -> bool {
        matches!(self, Self::VelocityV | Self::VelocityN | Self::VelocityC)
    }

    /// Index of this component in the delta-v vector
    pub fn vec_index(&self) -> usize {
        match self {
            Self::VelocityX | Self::VelocityV => 0,
            Self::VelocityY | Self::VelocityN => 1,
            Self::VelocityZ | Self::VelocityC => 2,
        }
    }
}

/// A free variable of the targeter, in km/s
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// The component that will be varied in the targeter
    pub component: Vary,
    /// The perturbation for the finite differencing algorithm
    #[serde(default = "Variable::default_perturbation")]
    pub perturbation: f64,
    /// The initial guess of this variable
    #[serde(default)]
    pub init_guess: f64,
    /// The maximum step this variable may have between each iteration
    #[serde(default = "Variable::default_max_step")]
    pub max_step: f64,
    /// The absolute maximum value this parameter can ever have
    #[serde(default = "Variable::default_max_value")]
    pub max_value: f64,
    /// The absolute minimum value this parameter can ever have
    #[serde(default = "Variable::default_min_value")]
    pub min_value: f64,
}

impl Variable {
    fn default_perturbation() -> f64 {
        1e-7
    }

    fn default_max_step() -> f64 {
        1e-3
    }

    fn default_max_value() -> f64 {
        0.1
    }

    fn default_min_value() -> f64 {
        -0.1
    }

    /// Returns whether the configuration of this variable is valid
    pub fn valid(&self) -> Result<(), TargetingError> {
        if self.perturbation == 0.0 || !self.perturbation.is_finite() {
            let msg = format!(
                "{:?}: perturbation must be non zero: {}",
                self.component, self.perturbation
            );
            error!("{msg}");
            return Err(TargetingError::VariableError { msg });
        }
        if !(self.max_step > 0.0) {
            let msg = format!(
                "{:?}: max step must be positive: {}",
                self.component, self.max_step
            );
            error!("{msg}");
            return Err(TargetingError::VariableError { msg });
        }
        if self.min_value > self.max_value {
            let msg = format!(
                "{:?}: min value is greater than max value: {} > {}",
                self.component, self.min_value, self.max_value
            );
            error!("{msg}");
            return Err(TargetingError::VariableError { msg });
        }
        if !self.check_bounds(self.init_guess) {
            let msg = format!(
                "{:?}: initial guess {} is outside of [{}; {}]",
                self.component, self.init_guess, self.min_value, self.max_value
            );
            error!("{msg}");
            return Err(TargetingError::VariableError { msg });
        }
        Ok(())
    }

    pub fn with_initial_guess(self, guess: f64) -> Self {
        let mut me = self;
        me.init_guess = guess;
        me
    }

    pub fn with_perturbation(self, perturbation: f64) -> Self {
        let mut me = self;
        me.perturbation = perturbation;
        me
    }

    pub fn with_max_step(self, max_step: f64) -> Self {
        let mut me = self;
        me.max_step = max_step;
        me
    }

    /// Sets symmetric bounds on the value of this variable
    pub fn with_bounds(self, min_value: f64, max_value: f64) -> Self {
        let mut me = self;
        me.min_value = min_value;
        me.max_value = max_value;
        me
    }

    /// Whether the value is within the bounds of this variable
    pub fn check_bounds(&self, val: f64) -> bool {
        val >= self.min_value && val <= self.max_value
    }

    /// Returns the value clamped to the bounds of this variable
    pub fn apply_bounds(&self, val: f64) -> f64 {
        if val > self.max_value {
            self.max_value
        } else if val < self.min_value {
            self.min_value
        } else {
            val
        }
    }

    /// Returns the correction clipped to the maximum step of this variable
    pub fn apply_max_step(&self, corr: f64) -> f64 {
        if corr.abs() > self.max_step.abs() {
            self.max_step.abs() * corr.signum()
        } else {
            corr
        }
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self {
            component: Vary::VelocityV,
            perturbation: Self::default_perturbation(),
            init_guess: 0.0,
            max_step: Self::default_max_step(),
            max_value: Self::default_max_value(),
            min_value: Self::default_min_value(),
        }
    }
}

impl From<Vary> for Variable {
    fn from(vary: Vary) -> Self {
        Self {
            component: vary,
            ..Default::default()
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} in [{:e}; {:e}] km/s (guess {:e}, step {:e}, pert {:e})",
            self.component,
            self.min_value,
            self.max_value,
            self.init_guess,
            self.max_step,
            self.perturbation
        )
    }
}
