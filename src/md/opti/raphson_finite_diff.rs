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

use super::solution::{TargeterIteration, TargeterSolution};
use super::{pseudo_inverse, Targeter};
use crate::linalg::{DMatrix, DVector};
use crate::md::TargetingError;
use crate::ImpactorError;
use std::time::Instant;

impl Targeter {
    /// Differential correction using finite differencing.
    ///
    /// `forward` simulates the trajectory from the provided free variables and returns the achieved value of each
    /// objective, in order. It is called sequentially: once for the nominal of each iteration, and once per
    /// perturbed variable to build the Jacobian.
    pub fn try_achieve_fd<F>(&self, mut forward: F) -> Result<TargeterSolution, TargetingError>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>, ImpactorError>,
    {
        if self.objectives.is_empty() || self.variables.is_empty() {
            return Err(TargetingError::VariableError {
                msg: format!(
                    "{} variables and {} objectives: at least one of each is needed",
                    self.variables.len(),
                    self.objectives.len()
                ),
            });
        }

        for var in &self.variables {
            // Check the validity (this function will report to log and raise an error)
            var.valid()?;
        }

        let mut simulate = |xi: &[f64]| -> Result<Vec<f64>, TargetingError> {
            let achieved = forward(xi).map_err(|e| TargetingError::Simulation {
                source: Box::new(e),
            })?;
            if achieved.len() != self.objectives.len() {
                return Err(TargetingError::VariableError {
                    msg: format!(
                        "forward simulation returned {} values for {} objectives",
                        achieved.len(),
                        self.objectives.len()
                    ),
                });
            }
            Ok(achieved)
        };

        let mut xi: Vec<f64> = self.variables.iter().map(|v| v.init_guess).collect();
        let mut history = Vec::with_capacity(self.iterations + 1);

        let start_instant = Instant::now();

        for it in 0..=self.iterations {
            let achieved = simulate(&xi)?;

            // Build the error vector
            let mut err_vector = DVector::<f64>::zeros(self.objectives.len());
            let mut converged = true;
            // Build debugging information
            let mut objmsg = Vec::with_capacity(self.objectives.len());

            for (i, obj) in self.objectives.iter().enumerate() {
                let (ok, param_err) = obj.assess_raw(achieved[i]);
                if !ok {
                    converged = false;
                }
                err_vector[i] = param_err;

                objmsg.push(format!(
                    "\t{:?}: achieved = {:.6}\t desired = {:.6}\t scaled error = {:.6}",
                    obj.parameter, achieved[i], obj.desired_value, param_err
                ));
            }

            history.push(TargeterIteration {
                variables: xi.clone(),
                residuals: err_vector.iter().copied().collect(),
            });

            if converged {
                let conv_dur = Instant::now() - start_instant;
                // Log success as info
                if it == 1 {
                    info!("Targeter -- CONVERGED in 1 iteration");
                } else {
                    info!("Targeter -- CONVERGED in {} iterations", it);
                }
                for obj in &objmsg {
                    info!("{}", obj);
                }
                return Ok(TargeterSolution {
                    correction: xi,
                    variables: self.variables.clone(),
                    achieved,
                    achieved_errors: err_vector.iter().copied().collect(),
                    achieved_objectives: self.objectives.clone(),
                    history,
                    iterations: it,
                    computation_dur: conv_dur.into(),
                });
            }

            if it == self.iterations {
                error!("Targeter -- did not converge in {} iterations", it);
                for obj in &objmsg {
                    error!("{}", obj);
                }
                return Err(TargetingError::TooManyIterations {
                    iterations: it,
                    variables: xi,
                    residuals: err_vector.iter().copied().collect(),
                });
            }

            // The Jacobian of the achieved values with respect to each variable, one independent simulation per variable
            let mut jac = DMatrix::<f64>::zeros(self.objectives.len(), self.variables.len());
            for (j, var) in self.variables.iter().enumerate() {
                let mut this_xi = xi.clone();
                this_xi[j] += var.perturbation;
                let mut opposed_pert = false;
                if !var.check_bounds(this_xi[j]) {
                    // Oops, bound was hit, go the other way
                    this_xi[j] -= 2.0 * var.perturbation;
                    opposed_pert = true;
                }

                let this_achieved = simulate(&this_xi)?;
                for (i, obj) in self.objectives.iter().enumerate() {
                    let mut jac_val = obj.multiplicative_factor * (this_achieved[i] - achieved[i])
                        / var.perturbation;
                    if opposed_pert {
                        // We opposed the perturbation to ensure we don't over step a min/max bound
                        jac_val = -jac_val;
                    }
                    jac[(i, j)] = jac_val;
                }
            }

            debug!("Jacobian {}", jac);

            // Perform the pseudo-inverse if needed, else just inverse
            let jac_inv = match pseudo_inverse(&jac) {
                Some(jac_inv) => jac_inv,
                None => {
                    error!("Targeter -- singular Jacobian at iteration #{it}: {jac}");
                    return Err(TargetingError::SingularJacobian {
                        iteration: it,
                        variables: xi,
                        residuals: err_vector.iter().copied().collect(),
                    });
                }
            };

            debug!("Inverse Jacobian {}", jac_inv);

            let delta = jac_inv * &err_vector;

            debug!(
                "Error vector (norm = {}): {}\nRaw correction: {}",
                err_vector.norm(),
                err_vector,
                delta
            );

            // And finally apply it to the xi
            for (i, var) in self.variables.iter().enumerate() {
                // Choose the minimum step between the provided max step and the correction, and stay within the bounds.
                let corr = var.apply_max_step(delta[i]);
                xi[i] = var.apply_bounds(xi[i] + corr);
                debug!(
                    "Correction {:?} (element {}): {:e} (raw {:e})",
                    var.component, i, corr, delta[i]
                );
            }

            // Log progress to info
            info!("Targeter -- Iteration #{} -- {:?}", it, xi);
            for obj in &objmsg {
                info!("{}", obj);
            }
        }

        // The loop always returns on its last iteration
        Err(TargetingError::TooManyIterations {
            iterations: self.iterations,
            variables: xi,
            residuals: Vec::new(),
        })
    }
}

#[cfg(test)]
mod ut_raphson {
    use super::super::objective::{Objective, TargetParameter};
    use super::*;
    use crate::md::{Variable, Vary};
    use approx::assert_abs_diff_eq;

    #[test]
    fn quadratic() {
        // Closest approach distance as a quadratic of the maneuver: 5000 + 2e10 * (dv - 1e-3)^2, solution at 1.2e-3 for 5800 km
        let var = Variable::from(Vary::VelocityV)
            .with_initial_guess(1.5e-3)
            .with_perturbation(1e-8);
        let obj = Objective::within_tolerance(TargetParameter::ClosestApproach, 5_800.0, 1e-3);
        let tgt = Targeter::new(vec![var], vec![obj]);
        let mut calls = 0;
        let sol = tgt
            .try_achieve_fd(|x| {
                calls += 1;
                Ok(vec![5_000.0 + 2e10 * (x[0] - 1e-3).powi(2)])
            })
            .unwrap();
        assert_abs_diff_eq!(sol.correction[0], 1.2e-3, epsilon = 1e-9);
        assert_eq!(sol.history.len(), sol.iterations + 1);
        // One nominal and one perturbed simulation per iteration, and the final nominal
        assert_eq!(calls, 2 * sol.iterations + 1);
        assert_eq!(sol.value_of(Vary::VelocityV), Some(sol.correction[0]));
    }

    #[test]
    fn max_step_is_honored() {
        let var = Variable::from(Vary::VelocityX).with_max_step(1e-4);
        let obj = Objective::within_tolerance(TargetParameter::BMag, 1_000.0, 1e-6);
        let tgt = Targeter::new(vec![var], vec![obj]).with_iterations(5);
        // Linear: the exact solution is 1e-3, which needs ten steps of 1e-4
        let err = tgt.try_achieve_fd(|x| Ok(vec![1e6 * x[0]])).unwrap_err();
        match err {
            TargetingError::TooManyIterations {
                iterations,
                variables,
                residuals,
            } => {
                assert_eq!(iterations, 5);
                assert_abs_diff_eq!(variables[0], 5e-4, epsilon = 1e-12);
                assert_abs_diff_eq!(residuals[0], 500.0, epsilon = 1e-6);
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn singular_and_failing_simulations() {
        let var = Variable::from(Vary::VelocityN);
        let obj = Objective::new(TargetParameter::ClosestApproach, 1.0e4);
        let tgt = Targeter::new(vec![var], vec![obj]);
        assert!(matches!(
            tgt.try_achieve_fd(|_| Ok(vec![0.0])),
            Err(TargetingError::SingularJacobian { .. })
        ));
        assert!(matches!(
            tgt.try_achieve_fd(|_| Err(ImpactorError::PropagationFailure {
                msg: "diverged".to_string()
            })),
            Err(TargetingError::Simulation { .. })
        ));
        assert!(matches!(
            Targeter::new(vec![], vec![obj]).try_achieve_fd(|_| Ok(vec![0.0])),
            Err(TargetingError::VariableError { .. })
        ));
    }
}
