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

use super::{
    AccelModel, DynamicsAstroSnafu, DynamicsError, GravityFileSnafu, Harmonics, OrbitalDynamics,
    PointMasses, ThirdBody,
};
use crate::cosmic::{Bodies, Cosm, Frame, Orientation};
use crate::io::gravity::{GravityPotentialStor, HarmonicsMem};
use enum_iterator::all;
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// How the gravity of a body is modeled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GravityMode {
    #[default]
    Omit,
    PointMass,
    /// Only allowed for the central body of the propagation
    SphericalHarmonics,
}

/// Spherical harmonics of the central body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarmonicsConfig {
    pub degree: usize,
    pub order: usize,
    /// Coefficient file, the field of the context is used if unset
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub gunzipped: bool,
    /// Set for files with a header line (e.g. SHADR)
    #[serde(default)]
    pub skip_header: bool,
}

/// The force model: a gravity mode per major body, the harmonics of the central body and the named asteroids.
///
/// Bodies which are not listed are omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceModelConfig {
    #[serde(default)]
    pub bodies: BTreeMap<Bodies, GravityMode>,
    #[serde(default)]
    pub harmonics: Option<HarmonicsConfig>,
    /// Named asteroids modeled as point masses, in this order
    #[serde(default)]
    pub asteroids: Vec<String>,
}

impl ForceModelConfig {
    /// Point masses for the Sun, the nine planets and the Moon
    pub fn all_point_masses() -> Self {
        Self {
            bodies: all::<Bodies>().map(|b| (b, GravityMode::PointMass)).collect(),
            ..Default::default()
        }
    }

    /// Only the Sun as a point mass
    pub fn sun_only() -> Self {
        Self::default().with(Bodies::Sun, GravityMode::PointMass)
    }

    /// Sets the gravity mode of a body
    pub fn with(mut self, body: Bodies, mode: GravityMode) -> Self {
        self.bodies.insert(body, mode);
        self
    }

    pub fn with_harmonics(mut self, degree: usize, order: usize) -> Self {
        self.harmonics = Some(HarmonicsConfig {
            degree,
            order,
            file: None,
            gunzipped: false,
            skip_header: false,
        });
        self
    }

    pub fn with_asteroid(mut self, name: &str) -> Self {
        self.asteroids.push(name.to_string());
        self
    }

    pub fn mode(&self, body: Bodies) -> GravityMode {
        self.bodies.get(&body).copied().unwrap_or_default()
    }
}

fn invalid(msg: String) -> DynamicsError {
    error!("{msg}");
    DynamicsError::InvalidForceModel { msg }
}

/// Builds the acceleration terms for a state integrated in `integr_frame`.
///
/// The two-body term of the center of the frame is not in this list: it's always part of [`OrbitalDynamics`].
/// All the checks are done here, so that an invalid configuration is rejected before any integration.
pub fn build_forces(
    config: &ForceModelConfig,
    integr_frame: Frame,
    cosm: Arc<Cosm>,
) -> Result<Vec<Arc<dyn AccelModel + Sync>>, DynamicsError> {
    let center = integr_frame.center;
    if !integr_frame.is_inertial() {
        return Err(invalid(format!(
            "cannot integrate in the rotating frame {integr_frame}"
        )));
    }

    let mut third_bodies = Vec::new();
    let mut models: Vec<Arc<dyn AccelModel + Sync>> = Vec::new();

    for body in all::<Bodies>() {
        match (config.mode(body), body == center) {
            (GravityMode::Omit, true) => {
                return Err(invalid(format!(
                    "{center} is the central body but its gravity is omitted"
                )))
            }
            (GravityMode::SphericalHarmonics, false) => {
                return Err(invalid(format!(
                    "spherical harmonics are only supported for the central body ({center}), not {body}"
                )))
            }
            (GravityMode::SphericalHarmonics, true) => {
                models.push(central_harmonics(config, integr_frame, cosm.clone())?);
            }
            (GravityMode::PointMass, false) => third_bodies.push(ThirdBody::Major(body)),
            (GravityMode::PointMass, true) | (GravityMode::Omit, false) => {}
        }
    }

    if config.harmonics.is_some() && config.mode(center) != GravityMode::SphericalHarmonics {
        warn!("harmonics configured but {center} is not in SPHERICAL_HARMONICS mode, ignoring them");
    }

    for name in &config.asteroids {
        let asteroid = cosm.resolve_asteroid(name).context(DynamicsAstroSnafu)?;
        third_bodies.push(ThirdBody::Asteroid(asteroid.clone()));
    }

    if !third_bodies.is_empty() {
        models.push(Arc::new(PointMasses::with_bodies(
            integr_frame,
            third_bodies,
            cosm,
        )));
    }

    Ok(models)
}

/// Loads the gravity field of the central body and checks that 0 < order <= degree <= field degree.
fn central_harmonics(
    config: &ForceModelConfig,
    integr_frame: Frame,
    cosm: Arc<Cosm>,
) -> Result<Arc<dyn AccelModel + Sync>, DynamicsError> {
    let center = integr_frame.center;
    let hcfg = config.harmonics.as_ref().ok_or_else(|| {
        invalid(format!(
            "{center} in SPHERICAL_HARMONICS mode requires a degree and order"
        ))
    })?;

    if hcfg.order == 0 || hcfg.order > hcfg.degree {
        return Err(invalid(format!(
            "harmonics require 0 < order <= degree, got degree {} and order {}",
            hcfg.degree, hcfg.order
        )));
    }

    let field = match &hcfg.file {
        Some(path) => HarmonicsMem::from_file(
            path,
            hcfg.degree,
            hcfg.order,
            hcfg.gunzipped,
            hcfg.skip_header,
        )
        .context(GravityFileSnafu)?,
        None => cosm.gravity_field(center).context(DynamicsAstroSnafu)?.clone(),
    };

    if hcfg.degree > field.max_degree_n() || hcfg.order > field.max_order_m() {
        return Err(invalid(format!(
            "requested {}x{} harmonics but the {center} field is only {}x{}",
            hcfg.degree,
            hcfg.order,
            field.max_degree_n(),
            field.max_order_m()
        )));
    }

    Ok(Harmonics::from_stor(
        integr_frame.with_orientation(Orientation::BodyFixed),
        field.truncated(hcfg.degree, hcfg.order),
        cosm,
    ))
}

impl OrbitalDynamics {
    /// Builds the orbital dynamics from the force model configuration.
    pub fn from_config(
        config: &ForceModelConfig,
        integr_frame: Frame,
        cosm: Arc<Cosm>,
    ) -> Result<Self, DynamicsError> {
        let models = build_forces(config, integr_frame, cosm)?;
        let dynamics = Self::new(models);
        info!("{dynamics}");
        Ok(dynamics)
    }
}

#[cfg(test)]
mod ut_forces {
    use super::*;
    use crate::cosmic::{AstroError, EARTH_J2000, IAU_EARTH, SUN_J2000};

    #[test]
    fn center_must_be_modeled() {
        let cosm = Cosm::analytic();
        let cfg = ForceModelConfig::default().with(Bodies::Jupiter, GravityMode::PointMass);
        assert!(matches!(
            build_forces(&cfg, SUN_J2000, cosm.clone()),
            Err(DynamicsError::InvalidForceModel { .. })
        ));

        let cfg = ForceModelConfig::sun_only();
        assert!(build_forces(&cfg, SUN_J2000, cosm.clone()).unwrap().is_empty());

        let cfg = ForceModelConfig::all_point_masses();
        assert_eq!(build_forces(&cfg, SUN_J2000, cosm.clone()).unwrap().len(), 1);
        // Rotating frames are rejected
        assert!(build_forces(&cfg, IAU_EARTH, cosm).is_err());
    }

    #[test]
    fn harmonics_validation() {
        let cosm = Cosm::analytic();
        let base = ForceModelConfig::default().with(Bodies::Earth, GravityMode::SphericalHarmonics);
        // Missing degree and order
        assert!(build_forces(&base, EARTH_J2000, cosm.clone()).is_err());

        for (degree, order, ok) in [(4, 4, true), (2, 1, true), (4, 0, false), (3, 4, false), (5, 5, false)] {
            let cfg = base.clone().with_harmonics(degree, order);
            assert_eq!(
                build_forces(&cfg, EARTH_J2000, cosm.clone()).is_ok(),
                ok,
                "degree {degree} order {order}"
            );
        }

        // Harmonics on a third body
        let cfg = ForceModelConfig::sun_only()
            .with(Bodies::Earth, GravityMode::SphericalHarmonics)
            .with_harmonics(2, 2);
        assert!(build_forces(&cfg, SUN_J2000, cosm).is_err());
    }

    #[test]
    fn unknown_asteroid() {
        let cosm = Cosm::analytic();
        let cfg = ForceModelConfig::sun_only().with_asteroid("Ceres");
        assert_eq!(build_forces(&cfg, SUN_J2000, cosm.clone()).unwrap().len(), 1);

        let cfg = ForceModelConfig::sun_only().with_asteroid("Planet Nine");
        assert_eq!(
            build_forces(&cfg, SUN_J2000, cosm).err(),
            Some(DynamicsError::DynamicsAstro {
                source: AstroError::UnknownBody {
                    name: "Planet Nine".to_string()
                }
            })
        );
    }

    #[test]
    fn yaml_config() {
        let yaml = r#"
bodies:
  Sun: POINT_MASS
  Earth: SPHERICAL_HARMONICS
  Moon: POINT_MASS
harmonics:
  degree: 4
  order: 4
asteroids: [Ceres, Vesta]
"#;
        let cfg: ForceModelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.mode(Bodies::Earth), GravityMode::SphericalHarmonics);
        assert_eq!(cfg.mode(Bodies::Mars), GravityMode::Omit);
        let models = build_forces(&cfg, EARTH_J2000, Cosm::analytic()).unwrap();
        // Harmonics and one point mass model for Sun, Moon, Ceres and Vesta
        assert_eq!(models.len(), 2);
    }
}
