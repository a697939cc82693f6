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

/// The `RK` trait defines a Runge Kutta integrator.
#[allow(clippy::upper_case_acronyms)]
pub trait RK
where
    Self: Sized,
{
    /// Returns the order of this integrator (as u8 because there probably isn't an order greater than 255).
    /// The order is used for the adaptive step size only to compute the error between estimates.
    const ORDER: u8;

    /// Returns the stages of this integrator (as usize because it's used as indexing)
    const STAGES: usize;

    /// Returns a pointer to a list of f64 corresponding to the A coefficients of the Butcher table for that RK.
    /// The lower triangle is stored row by row, so `Self::A_COEFFS.len()` must be STAGES*(STAGES-1)/2.
    /// *Warning:* this RK trait supposes that the implementation is consistent, i.e. c_i = \sum_j a_{ij}.
    const A_COEFFS: &'static [f64];
    /// Returns a pointer to a list of f64 corresponding to the b_i (propagated solution) followed by the
    /// b^*_i (embedded solution) coefficients of the Butcher table. `Self::B_COEFFS.len()` must be 2*STAGES.
    const B_COEFFS: &'static [f64];
}

/// `RKF78` is a Runge Kutta Fehlberg integrator of order 7(8): the solution is propagated with the eighth order weights
/// and the seventh order embedded solution is only used for the error estimate.
///
/// Coefficients from NASA TR R-287 (Fehlberg, 1968), table X.
pub struct RKF78 {}

impl RK for RKF78 {
    const ORDER: u8 = 8;
    const STAGES: usize = 13;
    const A_COEFFS: &'static [f64] = &[
        2.0 / 27.0,
        1.0 / 36.0,
        1.0 / 12.0,
        1.0 / 24.0,
        0.0,
        1.0 / 8.0,
        5.0 / 12.0,
        0.0,
        -25.0 / 16.0,
        25.0 / 16.0,
        1.0 / 20.0,
        0.0,
        0.0,
        1.0 / 4.0,
        1.0 / 5.0,
        -25.0 / 108.0,
        0.0,
        0.0,
        125.0 / 108.0,
        -65.0 / 27.0,
        125.0 / 54.0,
        31.0 / 300.0,
        0.0,
        0.0,
        0.0,
        61.0 / 225.0,
        -2.0 / 9.0,
        13.0 / 900.0,
        2.0,
        0.0,
        0.0,
        -53.0 / 6.0,
        704.0 / 45.0,
        -107.0 / 9.0,
        67.0 / 90.0,
        3.0,
        -91.0 / 108.0,
        0.0,
        0.0,
        23.0 / 108.0,
        -976.0 / 135.0,
        311.0 / 54.0,
        -19.0 / 60.0,
        17.0 / 6.0,
        -1.0 / 12.0,
        2383.0 / 4100.0,
        0.0,
        0.0,
        -341.0 / 164.0,
        4496.0 / 1025.0,
        -301.0 / 82.0,
        2133.0 / 4100.0,
        45.0 / 82.0,
        45.0 / 164.0,
        18.0 / 41.0,
        3.0 / 205.0,
        0.0,
        0.0,
        0.0,
        0.0,
        -6.0 / 41.0,
        -3.0 / 205.0,
        -3.0 / 41.0,
        3.0 / 41.0,
        6.0 / 41.0,
        0.0,
        -1777.0 / 4100.0,
        0.0,
        0.0,
        -341.0 / 164.0,
        4496.0 / 1025.0,
        -289.0 / 82.0,
        2193.0 / 4100.0,
        51.0 / 82.0,
        33.0 / 164.0,
        12.0 / 41.0,
        0.0,
        1.0,
    ];
    const B_COEFFS: &'static [f64] = &[
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        34.0 / 105.0,
        9.0 / 35.0,
        9.0 / 35.0,
        9.0 / 280.0,
        9.0 / 280.0,
        0.0,
        41.0 / 840.0,
        41.0 / 840.0,
        41.0 / 840.0,
        0.0,
        0.0,
        0.0,
        0.0,
        34.0 / 105.0,
        9.0 / 35.0,
        9.0 / 35.0,
        9.0 / 280.0,
        9.0 / 280.0,
        41.0 / 840.0,
        0.0,
        0.0,
    ];
}

#[cfg(test)]
mod ut_rk {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rkf78_butcher_table() {
        let stages = RKF78::STAGES;
        assert_eq!(RKF78::A_COEFFS.len(), stages * (stages - 1) / 2);
        assert_eq!(RKF78::B_COEFFS.len(), 2 * stages);
        // Both sets of weights are consistent
        let b: f64 = RKF78::B_COEFFS[..stages].iter().sum();
        let b_star: f64 = RKF78::B_COEFFS[stages..].iter().sum();
        assert_abs_diff_eq!(b, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(b_star, 1.0, epsilon = 1e-15);

        // The nodes c_i are within the step, and the last two are at its end and start
        let mut idx = 0;
        let mut nodes = Vec::new();
        for i in 1..stages {
            let ci: f64 = RKF78::A_COEFFS[idx..idx + i].iter().sum();
            idx += i;
            nodes.push(ci);
        }
        assert_abs_diff_eq!(nodes[0], 2.0 / 27.0, epsilon = 1e-15);
        assert_abs_diff_eq!(nodes[9], 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(nodes[10], 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(nodes[11], 1.0, epsilon = 1e-14);
    }
}
