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

use crate::linalg::DMatrix;
use std::fmt;

/// The two-stage deflection of a close approach or an impact with an impulsive maneuver.
pub mod deflection;
pub mod objective;
/// Uses a [Newton Raphson](https://en.wikipedia.org/wiki/Newton%27s_method_in_optimization) method where the Jacobian is computed via finite differencing.
pub mod raphson_finite_diff;
pub mod solution;
pub mod target_variable;

use objective::Objective;
use target_variable::Variable;

/// A differential corrector: finds the free variables which achieve all of the objectives.
///
/// The targeter does not know how the objectives are computed: each call to the forward simulation
/// runs an independent propagation from the free variables and returns the achieved value of each objective.
#[derive(Clone, Debug)]
pub struct Targeter {
    /// The free variables, in order
    pub variables: Vec<Variable>,
    /// The list of objectives of this targeter
    pub objectives: Vec<Objective>,
    /// Maximum number of iterations
    pub iterations: usize,
}

impl Targeter {
    pub fn new(variables: Vec<Variable>, objectives: Vec<Objective>) -> Self {
        Self {
            variables,
            objectives,
            iterations: 25,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

impl fmt::Display for Targeter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut objmsg = String::from("");
        for obj in &self.objectives {
            objmsg.push_str(&format!("{obj}; "));
        }

        let mut varmsg = String::from("");
        for var in &self.variables {
            varmsg.push_str(&format!("{var}; "));
        }

        write!(f, "Targeter:\n\tObjectives: {objmsg}\n\tVariables: {varmsg}")
    }
}

/// Inverse of the Jacobian: the plain inverse if it is square, else the pseudo inverse of the least squares
/// (more variables than objectives) or minimum norm (more objectives than variables) problem.
///
/// Returns None if the matrix is singular.
pub(crate) fn pseudo_inverse(mat: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let (rows, cols) = mat.shape();
    if rows == cols {
        mat.clone().try_inverse()
    } else if rows < cols {
        let m1_inv = (mat * mat.transpose()).try_inverse()?;
        Some(mat.transpose() * m1_inv)
    } else {
        let m2_inv = (mat.transpose() * mat).try_inverse()?;
        Some(m2_inv * mat.transpose())
    }
}
