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

use super::InterpolationError;

/// Evaluates the Hermite interpolation of the samples and their derivatives at `x`.
///
/// Returns the interpolated value and its derivative. The divided differences are built on the
/// doubled nodes and the Newton form is evaluated with Horner's method, so no polynomial is allocated.
/// For numerical stability, the abscissas should be normalized (e.g. to [-1; 1]) by the caller.
///
/// ```
/// use impactor::polyfit::hermite_eval;
///
/// let xs: Vec<_> = (0..8).map(|i| i as f64).collect();
/// let ys: Vec<_> = xs.iter().map(|x| x.cos()).collect();
/// let derivs: Vec<_> = xs.iter().map(|x| -x.sin()).collect();
///
/// let (y, dy) = hermite_eval(&xs, &ys, &derivs, 2.5).unwrap();
/// assert!((y - 2.5_f64.cos()).abs() < 1e-6);
/// assert!((dy + 2.5_f64.sin()).abs() < 1e-5);
/// ```
pub fn hermite_eval(
    xs: &[f64],
    ys: &[f64],
    derivs: &[f64],
    x: f64,
) -> Result<(f64, f64), InterpolationError> {
    if xs.is_empty() {
        return Err(InterpolationError::InvalidInterpolationData {
            msg: "No X data to interpolate".to_owned(),
        });
    }
    if xs.len() != ys.len() {
        return Err(InterpolationError::InvalidInterpolationData {
            msg: "Lengths of X and Y data differ".to_owned(),
        });
    }
    if xs.len() != derivs.len() {
        return Err(InterpolationError::InvalidInterpolationData {
            msg: "Lengths of X and its derivatives data differ".to_owned(),
        });
    }

    let n = 2 * xs.len();
    let mut zs = vec![0.0; n];
    // Column major divided differences table: qs[i + j * n] is the j-th difference ending at node i
    let mut qs = vec![0.0; n * n];

    for i in 0..xs.len() {
        zs[2 * i] = xs[i];
        zs[2 * i + 1] = xs[i];
        qs[2 * i] = ys[i];
        qs[2 * i + 1] = ys[i];
        qs[2 * i + 1 + n] = derivs[i];

        if i != 0 {
            let dz = zs[2 * i] - zs[2 * i - 1];
            if dz.abs() < f64::EPSILON {
                return Err(InterpolationError::InvalidInterpolationData {
                    msg: format!("duplicate abscissa {}", xs[i]),
                });
            }
            qs[2 * i + n] = (qs[2 * i] - qs[2 * i - 1]) / dz;
        }
    }

    for i in 2..n {
        for j in 2..=i {
            qs[i + j * n] =
                (qs[i + (j - 1) * n] - qs[i - 1 + (j - 1) * n]) / (zs[i] - zs[i - j]);
        }
    }

    // Horner on the Newton form, carrying the derivative along
    let mut value = qs[(n - 1) + (n - 1) * n];
    let mut deriv = 0.0;
    for i in (0..n - 1).rev() {
        deriv = deriv * (x - zs[i]) + value;
        value = value * (x - zs[i]) + qs[i + i * n];
    }

    if !value.is_finite() || !deriv.is_finite() {
        return Err(InterpolationError::InvalidInterpolationData {
            msg: format!("non finite interpolation at {x}"),
        });
    }

    Ok((value, deriv))
}

#[test]
fn hermite_sine_test() {
    let xs: Vec<_> = (0..8).map(|i| i as f64).collect();
    let ys: Vec<_> = xs.iter().map(|x| x.cos()).collect();
    let derivs: Vec<_> = xs.iter().map(|x| -x.sin()).collect();

    let tol = 1e-10;

    for x in &xs {
        let (eval, deriv) = hermite_eval(&xs, &ys, &derivs, *x).unwrap();
        assert!((eval - x.cos()).abs() < tol);
        assert!((deriv + x.sin()).abs() < tol);
    }

    // Between the nodes
    for x in [0.5, 3.3, 6.9] {
        let (eval, deriv) = hermite_eval(&xs, &ys, &derivs, x).unwrap();
        assert!((eval - x.cos()).abs() < 1e-6, "{x}: {eval}");
        assert!((deriv + x.sin()).abs() < 1e-5, "{x}: {deriv}");
    }
}

#[test]
fn hermite_constant_test() {
    let xs: Vec<_> = (0..8).map(|i| i as f64).collect();
    let ys: Vec<_> = xs.iter().map(|_| 2.0159).collect();
    let derivs: Vec<_> = xs.iter().map(|_| 0.0).collect();

    for x in [0.0, 1.5, 7.0] {
        let (eval, deriv) = hermite_eval(&xs, &ys, &derivs, x).unwrap();
        assert!((eval - 2.0159).abs() < 1e-12);
        assert!(deriv.abs() < 1e-12);
    }
}

#[test]
fn hermite_ephem_spline_test() {
    let ts = [
        -1.0,
        -0.7142321608948587,
        -0.4284548929983568,
        -0.14272281352821248,
        0.1430009063036013,
        0.4286973024022658,
        0.714367019041751,
        1.0,
    ];
    let values = [
        -1200.6957374089038,
        -1649.3350718512218,
        -2088.1291193578113,
        -2514.3714789070427,
        -2925.5702772667646,
        -3319.240151300038,
        -3693.030156393982,
        -4044.695271513933,
    ];
    let values_dt = [
        -5.450221271198159,
        -5.3475633589540585,
        -5.212915678573803,
        -5.0471031201910135,
        -4.851091887968967,
        -4.626059429784994,
        -4.373345524123602,
        -4.094465775216765,
    ];

    for (i, t) in ts.iter().enumerate() {
        let (eval, deriv) = hermite_eval(&ts, &values, &values_dt, *t).unwrap();
        assert!((eval - values[i]).abs() < 2e-7);
        assert!((deriv - values_dt[i]).abs() < 3e-6);
    }
}

#[test]
fn hermite_invalid_data() {
    assert!(hermite_eval(&[], &[], &[], 0.0).is_err());
    assert!(hermite_eval(&[0.0, 1.0], &[0.0], &[0.0, 1.0], 0.0).is_err());
    assert!(hermite_eval(&[0.0, 0.0], &[0.0, 1.0], &[0.0, 1.0], 0.0).is_err());
}
