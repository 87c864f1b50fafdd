//! Country-level grid carbon intensity.
//!
//! Annual average grid intensities in gCO2e/kWh, keyed by ISO 3166-1 Alpha-3
//! country code. Used to resolve per-segment `gridIntensity` overrides given
//! as a country rather than a raw number.

/// Average grid carbon intensity by ISO Alpha-3 country code, gCO2e/kWh.
const ALPHA3_GRID_INTENSITY: &[(&str, f64)] = &[
    ("ARE", 492.0),
    ("ARG", 344.0),
    ("AUS", 549.0),
    ("AUT", 110.0),
    ("BEL", 161.0),
    ("BGD", 691.0),
    ("BGR", 335.0),
    ("BRA", 98.0),
    ("CAN", 171.0),
    ("CHE", 41.0),
    ("CHL", 291.0),
    ("CHN", 581.0),
    ("COL", 164.0),
    ("CZE", 415.0),
    ("DEU", 381.0),
    ("DNK", 180.0),
    ("EGY", 469.0),
    ("ESP", 174.0),
    ("EST", 464.0),
    ("FIN", 79.0),
    ("FRA", 56.0),
    ("GBR", 237.0),
    ("GRC", 336.0),
    ("HRV", 246.0),
    ("HUN", 204.0),
    ("IDN", 682.0),
    ("IND", 713.0),
    ("IRL", 346.0),
    ("ISL", 28.0),
    ("ISR", 537.0),
    ("ITA", 331.0),
    ("JPN", 485.0),
    ("KOR", 431.0),
    ("LTU", 160.0),
    ("LUX", 105.0),
    ("LVA", 123.0),
    ("MEX", 475.0),
    ("MYS", 605.0),
    ("NGA", 516.0),
    ("NLD", 268.0),
    ("NOR", 30.0),
    ("NZL", 112.0),
    ("PAK", 440.0),
    ("PHL", 594.0),
    ("POL", 662.0),
    ("PRT", 234.0),
    ("ROU", 264.0),
    ("RUS", 441.0),
    ("SAU", 557.0),
    ("SGP", 471.0),
    ("SVK", 140.0),
    ("SVN", 237.0),
    ("SWE", 45.0),
    ("THA", 549.0),
    ("TUR", 464.0),
    ("TWN", 561.0),
    ("UKR", 259.0),
    ("USA", 369.0),
    ("VNM", 475.0),
    ("ZAF", 708.0),
];

/// Looks up the grid intensity for an ISO Alpha-3 country code.
///
/// Matching is case-insensitive. Returns `None` for codes not in the table,
/// which callers must reject as an invalid parameter.
pub fn intensity_for_country(code: &str) -> Option<f64> {
    let code = code.to_ascii_uppercase();
    ALPHA3_GRID_INTENSITY
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, v)| *v)
}
