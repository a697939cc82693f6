extern crate impactor;

use flate2::write::GzEncoder;
use flate2::Compression;
use impactor::io::gravity::{GravityPotentialStor, HarmonicsMem};
use impactor::io::ConfigError;
use std::io::Write;
use std::path::PathBuf;

/// EGM96 to degree and order 4 in the SHADR layout, with Fortran exponents and sigma columns
const EGM96_4X4: &str = "6378.1363, 398600.4415, 0.0, 5, 5, 1, 0.0, 0.0
2 0 -4.84165371736D-04 0.0 3.561D-11 0.0
2 1 0.0 0.0 0.0 0.0
2 2 2.43914352398D-06 -1.40016683683D-06 5.373D-11 5.439D-11
3 0 9.57254173792D-07 0.0 1.8094D-11 0.0
3 1 2.03046201047D-06 2.48200415856D-07 1.3965D-10 1.3638D-10
3 2 9.04787894809D-07 -6.19005475177D-07 1.0962D-10 1.1136D-10
3 3 7.21321757121D-07 1.41434926192D-06 9.4003D-11 9.3571D-11
4 0 5.39873863789D-07 0.0 1.0423D-10 0.0
4 1 -5.36157389388D-07 -4.73567346518D-07 8.5674D-11 8.2792D-11
4 2 3.50501623962D-07 6.62480026275D-07 1.6074D-10 1.6312D-10
4 3 9.90856766672D-07 -2.00956723567D-07 8.4559D-11 8.5247D-11
4 4 -1.88519633023D-07 3.08803882149D-07 8.7121D-11 8.7051D-11
5 0 6.86702913736D-08 0.0 5.1e-11 0.0
";

fn gzipped(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}-{name}.cof.gz", std::process::id()));
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();
    path
}

#[test]
fn gunzipped_field() {
    let path = gzipped("egm96", EGM96_4X4);

    let field = HarmonicsMem::from_file(&path, 4, 4, true, true).unwrap();
    assert_eq!(field, HarmonicsMem::egm96_4x4());
    assert_eq!(field.max_degree_n(), 4);
    assert_eq!(field.max_order_m(), 4);
    // The degree 5 line is above the requested degree
    assert_eq!(field.cs_nm(5, 0), (0.0, 0.0));

    let truncated = HarmonicsMem::from_file(&path, 2, 2, true, true).unwrap();
    assert_eq!(truncated, HarmonicsMem::egm96_4x4().truncated(2, 2));
    assert_eq!(truncated.cs_nm(2, 0).0, -4.841_653_717_36e-04);
    assert_eq!(truncated.cs_nm(3, 0), (0.0, 0.0));

    // Compressed bytes are not valid coefficient text
    assert!(HarmonicsMem::from_file(&path, 4, 4, false, true).is_err());
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn malformed_fields() {
    // Without skipping it, the SHADR header has no degree and order
    let path = gzipped("header", EGM96_4X4);
    let field = HarmonicsMem::from_file(&path, 4, 4, true, false).unwrap();
    assert_eq!(field, HarmonicsMem::egm96_4x4());
    std::fs::remove_file(&path).unwrap();

    let path = gzipped("short", "2 0 -4.84165371736D-04\n");
    assert!(matches!(
        HarmonicsMem::from_file(&path, 2, 0, true, false),
        Err(ConfigError::InvalidConfig { .. })
    ));
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(
        HarmonicsMem::from_file("/does/not/exist.cof.gz", 2, 0, true, false),
        Err(ConfigError::ReadError { .. })
    ));
}
