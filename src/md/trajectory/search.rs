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

use super::{Traj, TrajError};
use crate::cosmic::Orbit;
use crate::time::{Duration, Epoch, Unit};
use std::fmt;

/// A scalar function of the state whose roots or extrema are searched in a trajectory.
pub trait EventEvaluator: fmt::Display {
    type Error: From<TrajError>;
    /// Evaluation of the event: zero at the event
    fn eval(&self, state: &Orbit) -> Result<f64, Self::Error>;
    fn epoch_precision(&self) -> Duration;
    fn value_precision(&self) -> f64;
}

/// Inverse of the golden ratio, (sqrt(5) - 1)/2
const INV_PHI: f64 = 0.618_033_988_749_894_8;

impl Traj {
    /// Find the exact state where the request event happens. The event function is expected to be monotone in the provided interval because we find the event using a Brent solver.
    ///
    /// Returns the state and the evaluation of the event there.
    pub fn find_bracketed<E>(&self, start: Epoch, end: Epoch, event: &E) -> Result<(Orbit, f64), E::Error>
    where
        E: EventEvaluator,
    {
        let max_iter = 50;

        // Helper lambdas, for f64s only
        let has_converged =
            |x1: f64, x2: f64| (x1 - x2).abs() <= event.epoch_precision().to_seconds();
        let arrange = |a: f64, ya: f64, b: f64, yb: f64| {
            if ya.abs() > yb.abs() {
                (a, ya, b, yb)
            } else {
                (b, yb, a, ya)
            }
        };

        let xa_e = start;
        let xb_e = end;

        // Search in seconds (convert to epoch just in time)
        let mut xa = 0.0;
        let mut xb = (xb_e - xa_e).to_seconds();
        // Evaluate the event at both bounds
        let ya_state = self.at(xa_e)?;
        let yb_state = self.at(xb_e)?;
        let mut ya = event.eval(&ya_state)?;
        let mut yb = event.eval(&yb_state)?;

        // Check if we're already at the root
        if ya.abs() <= event.value_precision().abs() {
            debug!(
                "{event} -- found with |{ya}| < {} @ {xa_e}",
                event.value_precision().abs()
            );
            return Ok((ya_state, ya));
        } else if yb.abs() <= event.value_precision().abs() {
            debug!(
                "{event} -- found with |{yb}| < {} @ {xb_e}",
                event.value_precision().abs()
            );
            return Ok((yb_state, yb));
        }

        if ya * yb > 0.0 {
            return Err(TrajError::EventNotFound {
                start,
                end,
                event: format!("{event}"),
            }
            .into());
        }

        // The Brent solver, from the roots crate
        // Source: https://docs.rs/roots/0.0.5/src/roots/numerical/brent.rs.html#57-131

        let (mut xc, mut yc, mut xd) = (xa, ya, xa);
        let mut flag = true;

        for _ in 0..max_iter {
            if ya.abs() < event.value_precision().abs() {
                let state = self.at(xa_e + xa * Unit::Second)?;
                debug!("{event} -- found with |{ya}| @ {}", state.epoch);
                return Ok((state, ya));
            }
            if yb.abs() < event.value_precision().abs() {
                let state = self.at(xa_e + xb * Unit::Second)?;
                debug!("{event} -- found with |{yb}| @ {}", state.epoch);
                return Ok((state, yb));
            }
            if has_converged(xa, xb) {
                // Precise enough in time: keep the closest bound
                let (x, y) = if ya.abs() < yb.abs() { (xa, ya) } else { (xb, yb) };
                let state = self.at(xa_e + x * Unit::Second)?;
                debug!("{event} -- time converged with {y} @ {}", state.epoch);
                return Ok((state, y));
            }
            let mut s = if (ya - yc).abs() > f64::EPSILON && (yb - yc).abs() > f64::EPSILON {
                xa * yb * yc / ((ya - yb) * (ya - yc))
                    + xb * ya * yc / ((yb - ya) * (yb - yc))
                    + xc * ya * yb / ((yc - ya) * (yc - yb))
            } else {
                xb - yb * (xb - xa) / (yb - ya)
            };
            let cond1 = (s - xb) * (s - (3.0 * xa + xb) / 4.0) > 0.0;
            let cond2 = flag && (s - xb).abs() >= (xb - xc).abs() / 2.0;
            let cond3 = !flag && (s - xb).abs() >= (xc - xd).abs() / 2.0;
            let cond4 = flag && has_converged(xb, xc);
            let cond5 = !flag && has_converged(xc, xd);
            if cond1 || cond2 || cond3 || cond4 || cond5 {
                s = (xa + xb) / 2.0;
                flag = true;
            } else {
                flag = false;
            }
            let next_try = self.at(xa_e + s * Unit::Second)?;
            let ys = event.eval(&next_try)?;
            xd = xc;
            xc = xb;
            yc = yb;
            if ya * ys < 0.0 {
                // Root bracketed between a and s
                let (_a, _ya, _b, _yb) = arrange(xa, ya, s, ys);
                {
                    xa = _a;
                    ya = _ya;
                    xb = _b;
                    yb = _yb;
                }
            } else {
                // Root bracketed between s and b
                let (_a, _ya, _b, _yb) = arrange(s, ys, xb, yb);
                {
                    xa = _a;
                    ya = _ya;
                    xb = _b;
                    yb = _yb;
                }
            }
        }
        error!("Brent solver failed after {max_iter} iterations");
        Err(TrajError::EventNotFound {
            start,
            end,
            event: format!("{event}"),
        }
        .into())
    }

    /// Find the extremum of the event function between both epochs with a golden section search, until the bracket is
    /// smaller than the epoch precision of the event.
    ///
    /// The function must be unimodal in the bracket. Returns the state and the evaluation of the event there.
    pub fn find_minmax_bracketed<E>(
        &self,
        start: Epoch,
        end: Epoch,
        event: &E,
        minimum: bool,
    ) -> Result<(Orbit, f64), E::Error>
    where
        E: EventEvaluator,
    {
        let sign = if minimum { 1.0 } else { -1.0 };
        let precision_s = event.epoch_precision().to_seconds().abs();
        let eval_at = |x: f64| -> Result<(Orbit, f64), E::Error> {
            let state = self.at(start + x * Unit::Second)?;
            let value = event.eval(&state)?;
            Ok((state, value))
        };

        let mut a = 0.0;
        let mut b = (end - start).to_seconds();
        let mut c = b - INV_PHI * (b - a);
        let mut d = a + INV_PHI * (b - a);
        let mut fc = sign * eval_at(c)?.1;
        let mut fd = sign * eval_at(d)?.1;

        let mut iter = 0;
        while (b - a).abs() > precision_s {
            if fc < fd {
                b = d;
                d = c;
                fd = fc;
                c = b - INV_PHI * (b - a);
                fc = sign * eval_at(c)?.1;
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + INV_PHI * (b - a);
                fd = sign * eval_at(d)?.1;
            }
            iter += 1;
        }

        let (state, value) = eval_at(0.5 * (a + b))?;
        debug!(
            "{event} -- {} {value} @ {} after {iter} iterations",
            if minimum { "minimum" } else { "maximum" },
            state.epoch
        );
        Ok((state, value))
    }
}
