mod cosmic;
mod mission_design;
mod propagation;

use anise::almanac::metaload::MetaFile;
use anise::prelude::Almanac;
use impactor::Cosm;
use std::path::PathBuf;
use std::sync::Arc;

/// The analytic ephemerides fixture, for tests which do not depend on where the planets really are.
pub fn test_cosm() -> Arc<Cosm> {
    let _ = pretty_env_logger::try_init();
    Cosm::analytic()
}

/// DE440s, from `data/` if it was downloaded there, or else from the Nyx Space cloud (cached after the first run).
pub fn test_almanac() -> Arc<Almanac> {
    let manifest_dir =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or(".".to_string()));
    let local = manifest_dir.join("data/de440s.bsp");

    let path = if local.exists() {
        local.to_string_lossy().to_string()
    } else {
        let mut de440s = MetaFile {
            uri: "http://public-data.nyxspace.com/anise/de440s.bsp".to_string(),
            crc32: None,
        };
        de440s.process(true).unwrap();
        de440s.uri
    };

    Arc::new(Almanac::new(&path).unwrap())
}

/// The context of real analyses: DE440s ephemerides, the embedded asteroids and the Earth gravity field.
pub fn test_almanac_cosm() -> Arc<Cosm> {
    let _ = pretty_env_logger::try_init();
    Arc::new(Cosm::from_almanac(test_almanac()).unwrap())
}
