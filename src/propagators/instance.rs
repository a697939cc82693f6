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

use super::error_ctrl::ErrorCtrl;
use super::{
    DynamicsSnafu, IntegrationDetails, MaxDurationExceededSnafu, PropAstroSnafu, PropEventSnafu,
    PropagationError, Propagator,
};
use crate::cosmic::{Cosm, FrameService, Orbit};
use crate::dynamics::Dynamics;
use crate::linalg::Vector6;
use crate::md::events::{Detection, StopEngine, StoppedTraj};
use crate::md::trajectory::Traj;
use crate::time::{Duration, Epoch, Unit};
use snafu::ResultExt;
use std::sync::Arc;
use std::time::Instant;

/// A propagation in progress: the state, the adapted step size and the details of the previous step.
///
/// Created with [`Propagator::with`].
pub struct PropInstance<'a, D: Dynamics> {
    /// The state of this propagator instance
    pub state: Orbit,
    /// The propagator setup (kind, stages, etc.)
    pub prop: &'a Propagator<D>,
    /// Ephemeris context, used to check that the propagation stays within its span
    pub(crate) cosm: Arc<Cosm>,
    /// Stores the details of the previous integration step
    pub details: IntegrationDetails,
    pub(crate) step_size: Duration, // Stores the adapted step for the _next_ call
    pub(crate) fixed_step: bool,
    // Allows us to do pre-allocation of the ki vectors
    pub(crate) k: Vec<Vector6<f64>>,
}

/// Where the accepted states of the step loop go.
struct StepSink<'s> {
    traj: Option<&'s mut Traj>,
    engine: Option<&'s mut StopEngine>,
    detections: Vec<Detection>,
}

impl<'a, D: Dynamics> PropInstance<'a, D> {
    /// Integrates for the provided duration, sending each accepted state to the sink.
    ///
    /// Returns whether a stopping condition ended the propagation.
    fn step_loop(&mut self, duration: Duration, sink: &mut StepSink) -> Result<bool, PropagationError> {
        self.prop
            .opts
            .validate()
            .map_err(|msg| PropagationError::PropConfigError { msg })?;

        let start_time = self.state.epoch;
        let stop_time = start_time + duration;
        // Both bounds must be covered by the ephemerides before any work is done
        self.cosm.check_epoch(start_time).context(PropAstroSnafu)?;
        self.cosm.check_epoch(stop_time).context(PropAstroSnafu)?;

        // Call `finally` on the current state to set anything up
        self.state = self.prop.dynamics.finally(self.state).context(DynamicsSnafu)?;

        if let Some(traj) = sink.traj.as_deref_mut() {
            traj.push(self.state);
        }
        if let Some(engine) = sink.engine.as_deref_mut() {
            engine.prime(&self.state).context(PropEventSnafu)?;
        }

        if duration == Duration::ZERO {
            return Ok(false);
        }

        let tick = Instant::now();
        let log_progress = duration.abs() >= 2 * Unit::Minute;

        if log_progress {
            // Prevent the print spam for short propagations, like those of the targeter
            info!("Propagating for {} until {}", duration, stop_time);
        }

        let backprop = duration.is_negative();
        // The step size is stored as a magnitude, and signed for the direction of this propagation
        self.step_size = if backprop {
            -self.step_size.abs()
        } else {
            self.step_size.abs()
        };

        let mut stopped = false;
        while self.state.epoch != stop_time {
            let epoch = self.state.epoch;
            let remaining = stop_time - epoch;
            if remaining.abs() <= self.step_size.abs() {
                // Hit the stop time exactly: the error control may still shorten this step
                let prev_step_size = self.step_size;
                self.step_size = remaining;
                self.single_step()?;
                if self.state.epoch == stop_time {
                    self.step_size = prev_step_size;
                }
            } else {
                self.single_step()?;
            }

            if self.publish(sink, !backprop)? {
                stopped = true;
                break;
            }
        }

        // Restore to a positive step size
        self.step_size = self.step_size.abs();

        if log_progress {
            let tock: Duration = tick.elapsed().into();
            info!("Done in {}", tock);
        }

        Ok(stopped)
    }

    /// Sends the current state to the sink, and returns whether a stopping condition triggered on it.
    fn publish(&mut self, sink: &mut StepSink, forward: bool) -> Result<bool, PropagationError> {
        let traj = match sink.traj.as_deref_mut() {
            Some(traj) => traj,
            None => return Ok(false),
        };
        traj.push(self.state);

        let engine = match sink.engine.as_deref_mut() {
            Some(engine) => engine,
            None => return Ok(false),
        };
        let found = engine
            .evaluate(traj, &self.state, forward)
            .context(PropEventSnafu)?;

        let stop_state = found.iter().find(|d| d.stopped).map(|d| d.state);
        sink.detections.extend(found);

        if let Some(stop_state) = stop_state {
            // The states integrated past the event are dropped
            traj.truncate(stop_state.epoch, forward);
            traj.push(stop_state);
            self.state = stop_state;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// This method propagates the provided Dynamics for the provided duration.
    pub fn for_duration(&mut self, duration: Duration) -> Result<Orbit, PropagationError> {
        let mut sink = StepSink {
            traj: None,
            engine: None,
            detections: Vec::new(),
        };
        self.step_loop(duration, &mut sink)?;
        Ok(self.state)
    }

    /// Propagates the provided Dynamics until the provided epoch. Returns the end state.
    pub fn until_epoch(&mut self, end_time: Epoch) -> Result<Orbit, PropagationError> {
        let duration: Duration = end_time - self.state.epoch;
        self.for_duration(duration)
    }

    /// Propagates the provided Dynamics for the provided duration and keeps every accepted step.
    /// Returns the end state and the trajectory, which includes the initial state.
    pub fn for_duration_with_traj(&mut self, duration: Duration) -> Result<(Orbit, Traj), PropagationError> {
        let mut traj = Traj::new();
        let mut sink = StepSink {
            traj: Some(&mut traj),
            engine: None,
            detections: Vec::new(),
        };
        self.step_loop(duration, &mut sink)?;
        Ok((self.state, traj))
    }

    /// Propagates the provided Dynamics until the provided epoch and keeps every accepted step.
    /// Returns the end state and the trajectory, in either direction of propagation.
    pub fn until_epoch_with_traj(&mut self, end_time: Epoch) -> Result<(Orbit, Traj), PropagationError> {
        let duration: Duration = end_time - self.state.epoch;
        self.for_duration_with_traj(duration)
    }

    /// Propagates until a stopping condition of the engine stops the propagation, or for at most `max_duration`
    /// (negative to propagate backward).
    ///
    /// Reaching the maximum duration is an error unless the options accept it as a terminal outcome.
    pub fn until_stopped(
        &mut self,
        max_duration: Duration,
        engine: &mut StopEngine,
    ) -> Result<StoppedTraj, PropagationError> {
        if max_duration == Duration::ZERO {
            return Err(PropagationError::PropConfigError {
                msg: "a maximum duration is required with stopping conditions".to_string(),
            });
        }
        let mut traj = Traj::new();
        let mut sink = StepSink {
            traj: Some(&mut traj),
            engine: Some(engine),
            detections: Vec::new(),
        };
        let stopped = self.step_loop(max_duration, &mut sink)?;
        let detections = sink.detections;

        if !stopped && !self.prop.opts.accept_max_duration {
            error!(
                "no stopping condition triggered in {max_duration} ({} detections)",
                detections.len()
            );
            return MaxDurationExceededSnafu {
                max_duration,
                epoch: self.state.epoch,
            }
            .fail();
        }

        Ok(StoppedTraj {
            traj,
            detections,
            final_state: self.state,
            stopped,
        })
    }

    /// Take a single propagator step
    pub fn single_step(&mut self) -> Result<(), PropagationError> {
        let (t, state_vec) = self.derive()?;
        let epoch = self.state.epoch + t;
        if !state_vec.iter().all(|x| x.is_finite()) {
            error!("non finite state after a step of {t}: {state_vec}");
            return Err(PropagationError::NonFiniteState { epoch });
        }
        self.state.set(epoch, &state_vec);
        self.state = self.prop.dynamics.finally(self.state).context(DynamicsSnafu)?;

        Ok(())
    }

    /// This method integrates the dynamics. Everything passed to this function is in **seconds**.
    ///
    /// This function returns the step sized used (as a Duration) and the new state as y_{n+1} = y_n + \frac{dy_n}{dt}.
    /// To get the integration details, check `self.latest_details`.
    fn derive(&mut self) -> Result<(Duration, Vector6<f64>), PropagationError> {
        let state_vec = &self.state.to_cartesian_vec();
        let state_ctx = &self.state;
        let opts = &self.prop.opts;
        let error_ctrl = opts.error_ctrl();
        // Reset the number of attempts used (we don't reset the error because it's set before it's read)
        self.details.attempts = 1;
        // Convert the step size to seconds -- it's mutable because we may change it below
        let mut step_size = self.step_size.to_seconds();
        // The step control works on magnitudes, this is the direction of propagation
        let sign = step_size.signum();
        let min_step = opts.min_step.to_seconds();
        let max_step = opts.max_step.to_seconds();
        loop {
            let ki = self
                .prop
                .dynamics
                .eom(0.0, state_vec, state_ctx)
                .context(DynamicsSnafu)?;
            self.k[0] = ki;
            let mut a_idx: usize = 0;
            for i in 0..(self.prop.stages - 1) {
                // Let's compute the c_i by summing the relevant items from the list of coefficients.
                // \sum_{j=1}^{i-1} a_ij  ∀ i ∈ [2, s]
                let mut ci: f64 = 0.0;
                // The wi stores the a_{s1} * k_1 + a_{s2} * k_2 + ... + a_{s, s-1} * k_{s-1} +
                let mut wi = Vector6::<f64>::zeros();
                for kj in &self.k[0..i + 1] {
                    let a_ij = self.prop.a_coeffs[a_idx];
                    ci += a_ij;
                    wi += a_ij * kj;
                    a_idx += 1;
                }

                let ki = self
                    .prop
                    .dynamics
                    .eom(ci * step_size, &(state_vec + step_size * wi), state_ctx)
                    .context(DynamicsSnafu)?;
                self.k[i + 1] = ki;
            }
            // Compute the next state and the error
            let mut next_state = *state_vec;
            // State error estimation from https://en.wikipedia.org/wiki/Runge%E2%80%93Kutta_methods#Adaptive_Runge%E2%80%93Kutta_methods
            let mut error_est = Vector6::<f64>::zeros();
            for (i, ki) in self.k.iter().enumerate() {
                let b_i = self.prop.b_coeffs[i];
                if !self.fixed_step {
                    let b_i_star = self.prop.b_coeffs[i + self.prop.stages];
                    error_est += step_size * (b_i - b_i_star) * ki;
                }
                next_state += step_size * b_i * ki;
            }

            if self.fixed_step {
                // Using a fixed step, no adaptive step necessary
                self.details.step = self.step_size;
                return Ok((self.details.step, next_state));
            }

            // Compute the error estimate, normalized by the tolerances
            self.details.error = error_ctrl.estimate(&error_est, &next_state, state_vec);
            let magnitude = step_size.abs();
            if self.details.error <= 1.0
                || magnitude <= min_step
                || self.details.attempts >= opts.attempts
            {
                if self.details.attempts >= opts.attempts {
                    warn!(
                        "Could not further decrease step size: maximum number of attempts reached ({})",
                        self.details.attempts
                    );
                }

                // Keep the exact duration when the requested step was accepted as is
                self.details.step = if self.details.attempts == 1 {
                    self.step_size
                } else {
                    step_size * Unit::Second
                };
                if self.details.error < 1.0 {
                    // Error is less than tolerance, let's attempt to increase the step for the next iteration.
                    let proposed_step = if self.details.error > 0.0 {
                        0.9 * magnitude * (1.0 / self.details.error).powf(1.0 / f64::from(self.prop.order))
                    } else {
                        max_step
                    };
                    step_size = sign * proposed_step.clamp(min_step, max_step);
                }
                // In all cases, let's update the step size to whatever was the adapted step size
                self.step_size = step_size * Unit::Second;
                return Ok((self.details.step, next_state));
            } else {
                // Error is too high and we aren't using the smallest step, and we haven't hit the max number of attempts.
                // So let's adapt the step size.
                self.details.attempts += 1;
                let proposed_step = 0.9
                    * magnitude
                    * (1.0 / self.details.error).powf(1.0 / f64::from(self.prop.order - 1));
                step_size = sign * proposed_step.max(min_step);
                // Note that we don't set self.step_size, that will be updated right before we return
            }
        }
    }

    /// Copy the details of the latest integration step.
    pub fn latest_details(&self) -> IntegrationDetails {
        self.details
    }
}

#[cfg(test)]
mod ut_instance {
    use super::*;
    use crate::cosmic::EARTH_J2000;
    use crate::dynamics::OrbitalDynamics;
    use crate::propagators::PropOpts;
    use crate::time::TimeUnits;
    use approx::assert_abs_diff_eq;

    fn leo() -> Orbit {
        let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
        Orbit::keplerian(7_000.0, 0.01, 30.0, 10.0, 20.0, 0.0, epoch, EARTH_J2000)
    }

    #[test]
    fn exact_stop_time() {
        let prop = Propagator::default(OrbitalDynamics::two_body());
        let start = leo();
        let duration = 1_234.567.seconds();
        let mut instance = prop.with(start, Cosm::analytic());
        let end = instance.for_duration(duration).unwrap();
        assert_eq!(end.epoch, start.epoch + duration);
        // Energy is conserved by the two body dynamics
        assert_abs_diff_eq!(end.energy_km2_s2(), start.energy_km2_s2(), epsilon = 1e-10);
        // The step was restored after the final clamped step
        assert!(instance.step_size > Duration::ZERO);
    }

    #[test]
    fn backward_traj() {
        let prop = Propagator::default(OrbitalDynamics::two_body());
        let start = leo();
        let (end, traj) = prop
            .with(start, Cosm::analytic())
            .for_duration_with_traj(-2.hours())
            .unwrap();
        assert_eq!(end.epoch, start.epoch - 2.hours());
        assert_eq!(traj.first().unwrap().epoch, end.epoch);
        assert_eq!(traj.last().unwrap().epoch, start.epoch);
        assert!(traj.len() > 2);
        assert!(traj.states.windows(2).all(|w| w[0].epoch < w[1].epoch));
    }

    #[test]
    fn fixed_step() {
        let opts = PropOpts::with_fixed_step(10.seconds());
        let prop = Propagator::rkf78(OrbitalDynamics::two_body(), opts);
        let start = leo();
        let (_, traj) = prop
            .with(start, Cosm::analytic())
            .for_duration_with_traj(5.minutes())
            .unwrap();
        assert_eq!(traj.len(), 31);
    }

    #[test]
    fn out_of_ephemeris_span() {
        let prop = Propagator::default(OrbitalDynamics::two_body());
        let mut start = leo();
        start.epoch = Epoch::from_gregorian_tai_at_midnight(2049, 12, 1);
        let err = prop
            .with(start, Cosm::analytic())
            .for_duration(1_000.days())
            .unwrap_err();
        assert!(matches!(err, PropagationError::PropAstro { .. }));
    }
}
