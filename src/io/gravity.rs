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

use super::{ConfigError, InvalidConfigSnafu, ReadSnafu};
use flate2::read::GzDecoder;
use snafu::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use std::str::FromStr;

/// `GravityPotentialStor` provides the normalized spherical harmonic coefficients of a gravity field.
pub trait GravityPotentialStor: Clone + Send + Sync {
    /// Returns the maximum degree of this gravity potential storage (Jn=J2,J3...)
    fn max_degree_n(&self) -> usize;
    /// Returns the maximum order of this gravity potential storage (Jnm=Jn2,Jn3...)
    fn max_order_m(&self) -> usize;
    /// Returns the C_nm and S_nm for the provided degree and order, zero when not stored.
    fn cs_nm(&self, degree: usize, order: usize) -> (f64, f64);
}

/// `HarmonicsMem` loads the requested gravity potential files and stores them in memory (in a HashMap).
///
/// WARNING: This memory backend may require a lot of RAM for very high degree fields.
#[derive(Clone, Debug, PartialEq)]
pub struct HarmonicsMem {
    degree: usize,
    order: usize,
    // data is (degree, order) -> (C_nm, S_nm)
    data: HashMap<(usize, usize), (f64, f64)>,
}

impl HarmonicsMem {
    /// Initialize `HarmonicsMem` with a custom J2 value
    pub fn from_j2(j2: f64) -> Self {
        let mut data = HashMap::new();
        data.insert((2, 0), (j2, 0.0));
        Self {
            degree: 2,
            order: 0,
            data,
        }
    }

    /// Initialize `HarmonicsMem` as an EARTH J<sub>2</sub> only using the JGM3 model (available in GMAT)
    ///
    /// *WARNING:* This is an EARTH gravity model, and _should not_ be used around any other body.
    pub fn j2_jgm3() -> Self {
        Self::from_j2(-4.841_653_748_864_70e-04)
    }

    /// Initialize `HarmonicsMem` as the EGM96 EARTH field truncated to degree and order 4.
    ///
    /// *WARNING:* This is an EARTH gravity model, and _should not_ be used around any other body.
    pub fn egm96_4x4() -> Self {
        let coeffs: [(usize, usize, f64, f64); 12] = [
            (2, 0, -4.841_653_717_36e-04, 0.0),
            (2, 2, 2.439_143_523_98e-06, -1.400_166_836_83e-06),
            (3, 0, 9.572_541_737_92e-07, 0.0),
            (3, 1, 2.030_462_010_47e-06, 2.482_004_158_56e-07),
            (3, 2, 9.047_878_948_09e-07, -6.190_054_751_77e-07),
            (3, 3, 7.213_217_571_21e-07, 1.414_349_261_92e-06),
            (4, 0, 5.398_738_637_89e-07, 0.0),
            (4, 1, -5.361_573_893_88e-07, -4.735_673_465_18e-07),
            (4, 2, 3.505_016_239_62e-07, 6.624_800_262_75e-07),
            (4, 3, 9.908_567_666_72e-07, -2.009_567_235_67e-07),
            (4, 4, -1.885_196_330_23e-07, 3.088_038_821_49e-07),
            (2, 1, 0.0, 0.0),
        ];
        let data = coeffs
            .iter()
            .map(|&(n, m, c, s)| ((n, m), (c, s)))
            .collect();
        Self {
            degree: 4,
            order: 4,
            data,
        }
    }

    /// Returns a copy of this field truncated to the provided degree and order.
    pub fn truncated(&self, degree: usize, order: usize) -> Self {
        let data = self
            .data
            .iter()
            .filter(|((n, m), _)| *n <= degree && *m <= order)
            .map(|(k, v)| (*k, *v))
            .collect();
        Self {
            degree: degree.min(self.degree),
            order: order.min(self.order),
            data,
        }
    }

    /// Initialize `HarmonicsMem` from the file path, which may be gunzipped.
    ///
    /// The file contains one coefficient per line as `n m C_nm S_nm` (extra columns such as sigmas are ignored),
    /// and Fortran `D` exponents are accepted. If `skip_first_line` is set, the first line is a header (SHADR files).
    pub fn from_file<P: AsRef<Path>>(
        filepath: P,
        degree: usize,
        order: usize,
        gunzipped: bool,
        skip_first_line: bool,
    ) -> Result<Self, ConfigError> {
        let path = filepath.as_ref();
        let mut f = File::open(path).context(ReadSnafu)?;
        let mut buffer = vec![0; 0];
        if gunzipped {
            let mut d = GzDecoder::new(f);
            d.read_to_end(&mut buffer).context(ReadSnafu)?;
        } else {
            f.read_to_end(&mut buffer).context(ReadSnafu)?;
        }

        let data_as_str = String::from_utf8(buffer).map_err(|_| ConfigError::InvalidConfig {
            msg: format!("{} is not valid UTF-8", path.display()),
        })?;

        Self::loads(
            &data_as_str,
            degree,
            order,
            skip_first_line,
            &path.display().to_string(),
        )
    }

    /// Parses the coefficient text, keeping the terms up to the requested degree and order.
    pub fn loads(
        data_as_str: &str,
        degree: usize,
        order: usize,
        skip_first_line: bool,
        name: &str,
    ) -> Result<Self, ConfigError> {
        let mut data = HashMap::new();
        let mut max_order: usize = 0;
        let mut max_degree: usize = 0;
        for (lno, line) in data_as_str.lines().enumerate() {
            if (lno == 0 && skip_first_line) || line.trim().is_empty() {
                continue;
            }
            let items: Vec<&str> = line.split_whitespace().collect();
            ensure!(
                items.len() >= 4,
                InvalidConfigSnafu {
                    msg: format!("{name}: line {} has fewer than four columns", lno + 1)
                }
            );

            let (cur_degree, cur_order) = match (usize::from_str(items[0]), usize::from_str(items[1])) {
                (Ok(n), Ok(m)) => (n, m),
                _ => {
                    warn!("{name}: could not parse degree and order on line {} -- ignoring line", lno + 1);
                    continue;
                }
            };

            let parse = |item: &str| f64::from_str(&item.replace(['D', 'd'], "E"));
            let (c_nm, s_nm) = match (parse(items[2]), parse(items[3])) {
                (Ok(c), Ok(s)) => (c, s),
                _ => {
                    return Err(ConfigError::InvalidConfig {
                        msg: format!("{name}: could not parse C_nm or S_nm on line {}", lno + 1),
                    })
                }
            };

            // Only insert this data if it's within the required degree and order
            if cur_degree <= degree && cur_order <= order {
                data.insert((cur_degree, cur_order), (c_nm, s_nm));
                max_degree = max_degree.max(cur_degree);
                max_order = max_order.max(cur_order);
            }
        }

        if max_degree < degree || max_order < order {
            warn!(
                "{name} only contained (degree, order) of ({max_degree}, {max_order}) instead of requested ({degree}, {order})",
            );
        } else {
            info!("{name} loaded with (degree, order) = ({degree}, {order})");
        }

        Ok(Self {
            degree: max_degree,
            order: max_order,
            data,
        })
    }
}

impl GravityPotentialStor for HarmonicsMem {
    fn max_degree_n(&self) -> usize {
        self.degree
    }

    fn max_order_m(&self) -> usize {
        self.order
    }

    fn cs_nm(&self, degree: usize, order: usize) -> (f64, f64) {
        self.data
            .get(&(degree, order))
            .copied()
            .unwrap_or((0.0, 0.0))
    }
}

#[cfg(test)]
mod ut_gravity {
    use super::*;

    #[test]
    fn egm96_truncation() {
        let egm = HarmonicsMem::egm96_4x4();
        assert_eq!(egm.max_degree_n(), 4);
        assert_eq!(egm.max_order_m(), 4);
        let j2_only = egm.truncated(2, 0);
        assert_eq!(j2_only.max_degree_n(), 2);
        assert_eq!(j2_only.max_order_m(), 0);
        assert_eq!(j2_only.cs_nm(2, 2), (0.0, 0.0));
        assert_eq!(j2_only.cs_nm(2, 0), HarmonicsMem::egm96_4x4().cs_nm(2, 0));
    }

    #[test]
    fn parse_coefficients() {
        let content = "2 0 -0.484165371736D-03 0.0 1e-9 1e-9\n\
                       2 1 -0.186987635955D-09 0.119528012031D-08\n\
                       2 2 0.243914352398D-05 -0.140016683654D-05\n\
                       3 0 0.957254173792D-06 0.0\n";
        let stor = HarmonicsMem::loads(content, 2, 2, false, "inline").unwrap();
        assert_eq!(stor.max_degree_n(), 2);
        assert_eq!(stor.max_order_m(), 2);
        assert!((stor.cs_nm(2, 2).1 + 1.400_166_836_54e-6).abs() < 1e-18);
        // Degree 3 was not requested
        assert_eq!(stor.cs_nm(3, 0), (0.0, 0.0));

        assert!(HarmonicsMem::loads("2 0 abc 0.0", 2, 2, false, "bad").is_err());
        assert!(HarmonicsMem::loads("2 0", 2, 2, false, "short").is_err());
    }
}
