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

use super::objective::Objective;
use crate::md::{Variable, Vary};
use crate::time::Duration;
use std::fmt;

/// One iteration of the targeter: the free variables which were simulated and the resulting errors
#[derive(Clone, Debug, PartialEq)]
pub struct TargeterIteration {
    pub variables: Vec<f64>,
    pub residuals: Vec<f64>,
}

/// Defines a targeter solution
#[derive(Clone, Debug)]
pub struct TargeterSolution {
    /// The converged values of the free variables
    pub correction: Vec<f64>,
    /// The definition of each free variable
    pub variables: Vec<Variable>,
    /// The achieved value of each objective
    pub achieved: Vec<f64>,
    /// The errors achieved
    pub achieved_errors: Vec<f64>,
    /// The objectives set in the targeter
    pub achieved_objectives: Vec<Objective>,
    /// Every iteration, the last one being the converged one
    pub history: Vec<TargeterIteration>,
    /// The number of iterations required
    pub iterations: usize,
    /// Computation duration
    pub computation_dur: Duration,
}

impl TargeterSolution {
    /// Returns the value of the free variable of this component, if it was varied
    pub fn value_of(&self, component: Vary) -> Option<f64> {
        self.variables
            .iter()
            .position(|v| v.component == component)
            .map(|i| self.correction[i])
    }
}

impl fmt::Display for TargeterSolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut objmsg = String::from("");
        for (i, obj) in self.achieved_objectives.iter().enumerate() {
            objmsg.push_str(&format!(
                "\n\t\t{:?} = {:.3} (wanted {:.3} ± {:.1e})",
                obj.parameter, self.achieved[i], obj.desired_value, obj.tolerance
            ));
        }

        let mut corrmsg = String::from("Correction:");
        for (i, var) in self.variables.iter().enumerate() {
            corrmsg.push_str(&format!(
                "\n\t\t{:?} = {:.6} m/s",
                var.component,
                self.correction[i] * 1e3
            ));
        }

        write!(
            f,
            "Targeter solution correcting {:?} (converged in {}, {} iterations):\n\t{}\n\tAchieved:{}",
            self.variables
                .iter()
                .map(|v| format!("{:?}", v.component))
                .collect::<Vec<String>>(),
            self.computation_dur,
            self.iterations,
            corrmsg,
            objmsg
        )
    }
}
