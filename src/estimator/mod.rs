//! Emission estimation.
//!
//! A deterministic, side-effect-free transform from transferred bytes plus
//! behavioral and grid assumptions to a CO2 report, using the Sustainable
//! Web Design model (v4). The numeric coefficients are injected via
//! [`ModelParams`]; see [`model`].
//!
//! Hosting status is tri-state throughout: `Some(true)` green, `Some(false)`
//! non-green, `None` unreported. "Unreported" gets no green discount, is
//! echoed as `green: null`, and is never folded into `false`.

pub mod grid;
pub mod model;

pub use model::ModelParams;

use serde::Serialize;

use crate::error_handling::EstimateError;

/// Default fraction of bytes a returning visitor loads from local cache.
pub const DEFAULT_DATA_CACHE_RATIO: f64 = 0.02;

/// Default fraction of visits that are return visits.
pub const DEFAULT_RETURN_VISITOR_RATIO: f64 = 0.0;

/// A per-segment grid intensity override: either a raw gCO2e/kWh value or an
/// ISO Alpha-3 country code resolved against [`grid`].
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentIntensity {
    /// Direct grid intensity in gCO2e/kWh.
    Value(f64),
    /// ISO Alpha-3 country code.
    Country(String),
}

/// Optional per-segment grid intensity overrides. Segments left `None` fall
/// back to the model's global grid constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridIntensityOptions {
    pub device: Option<SegmentIntensity>,
    pub data_center: Option<SegmentIntensity>,
    pub network: Option<SegmentIntensity>,
}

/// Caller-facing estimation options. All fields optional; defaults are
/// filled during resolution, and defaults apply only when a field is absent
/// (an explicit `0.0` stays `0.0`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimationOptions {
    /// Fraction of bytes a returning visitor avoids re-downloading, in [0, 1].
    pub data_cache_ratio: Option<f64>,
    /// Fraction of visits that are return visits, in [0, 1].
    pub return_visitor_ratio: Option<f64>,
    /// Explicit hosting factor in [0, 1]; 1 = fully green. When set, the
    /// hosting lookup is skipped and this factor is applied directly.
    pub green_hosting_factor: Option<f64>,
    /// Per-segment grid intensity overrides.
    pub grid_intensity: GridIntensityOptions,
}

/// The grid intensity actually used for one segment, with the country code
/// echoed when the value came from a country override.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentVariable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub value: f64,
}

/// Resolved grid intensity for all three segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridVariables {
    pub device: SegmentVariable,
    pub data_center: SegmentVariable,
    pub network: SegmentVariable,
}

/// [`EstimationOptions`] with every default filled and every country code
/// resolved. This is the normalized form the cache key is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub data_cache_ratio: f64,
    pub return_visitor_ratio: f64,
    pub green_hosting_factor: Option<f64>,
    pub grid: GridVariables,
}

/// Emission figures of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Co2Summary {
    /// Grams of CO2e per visit.
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
}

/// Echo of the resolved inputs a report was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportVariables {
    pub bytes: u64,
    pub grid_intensity: GridVariables,
    pub data_cache_ratio: f64,
    pub return_visitor_ratio: f64,
    /// The discount factor actually applied to the operational data-center
    /// term.
    pub green_hosting_factor: f64,
}

/// A complete emission report. Pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub co2: Co2Summary,
    /// Tri-state hosting status; `None` serializes as `null` ("unreported").
    pub green: Option<bool>,
    pub variables: ReportVariables,
}

fn validate_ratio(name: &str, value: f64) -> Result<(), EstimateError> {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        return Err(EstimateError::InvalidParameter(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

fn resolve_segment(
    segment: &Option<SegmentIntensity>,
    name: &str,
    model: &ModelParams,
) -> Result<SegmentVariable, EstimateError> {
    match segment {
        None => Ok(SegmentVariable {
            country: None,
            value: model.grid_default,
        }),
        Some(SegmentIntensity::Value(v)) => {
            if !v.is_finite() || *v < 0.0 {
                return Err(EstimateError::InvalidParameter(format!(
                    "gridIntensity.{} must be a non-negative number, got {}",
                    name, v
                )));
            }
            Ok(SegmentVariable {
                country: None,
                value: *v,
            })
        }
        Some(SegmentIntensity::Country(code)) => {
            let value = grid::intensity_for_country(code).ok_or_else(|| {
                EstimateError::InvalidParameter(format!(
                    "gridIntensity.{}: unknown country code {:?}",
                    name, code
                ))
            })?;
            Ok(SegmentVariable {
                country: Some(code.to_ascii_uppercase()),
                value,
            })
        }
    }
}

/// Validates all options and fills defaults, resolving country codes against
/// the grid table.
///
/// This runs before any measurement so that an invalid parameter is rejected
/// without launching a browser.
pub fn resolve_options(
    options: &EstimationOptions,
    model: &ModelParams,
) -> Result<ResolvedOptions, EstimateError> {
    let data_cache_ratio = options.data_cache_ratio.unwrap_or(DEFAULT_DATA_CACHE_RATIO);
    validate_ratio("dataCacheRatio", data_cache_ratio)?;

    let return_visitor_ratio = options
        .return_visitor_ratio
        .unwrap_or(DEFAULT_RETURN_VISITOR_RATIO);
    validate_ratio("returnVisitorRatio", return_visitor_ratio)?;

    if let Some(factor) = options.green_hosting_factor {
        validate_ratio("greenHostingFactor", factor)?;
    }

    let grid = GridVariables {
        device: resolve_segment(&options.grid_intensity.device, "device", model)?,
        data_center: resolve_segment(&options.grid_intensity.data_center, "dataCenter", model)?,
        network: resolve_segment(&options.grid_intensity.network, "network", model)?,
    };

    Ok(ResolvedOptions {
        data_cache_ratio,
        return_visitor_ratio,
        green_hosting_factor: options.green_hosting_factor,
        grid,
    })
}

/// Computes a report from already-resolved options. Infallible.
pub fn estimate_resolved(
    bytes: u64,
    green: Option<bool>,
    resolved: &ResolvedOptions,
    model: &ModelParams,
) -> Report {
    let gb = bytes as f64 / 1e9;
    let e = &model.energy;

    let op_data_center = gb * e.operational_data_center * resolved.grid.data_center.value;
    let op_network = gb * e.operational_network * resolved.grid.network.value;
    let op_device = gb * e.operational_device * resolved.grid.device.value;
    let em_data_center = gb * e.embodied_data_center * resolved.grid.data_center.value;
    let em_network = gb * e.embodied_network * resolved.grid.network.value;
    let em_device = gb * e.embodied_device * resolved.grid.device.value;

    // An explicit factor wins over the looked-up status; an unreported
    // status earns no discount.
    let factor = resolved
        .green_hosting_factor
        .unwrap_or(match green {
            Some(true) => 1.0,
            Some(false) | None => 0.0,
        });

    let per_visit = op_data_center * (1.0 - factor)
        + em_data_center
        + op_network
        + em_network
        + op_device
        + em_device;

    let total = per_visit * (1.0 - resolved.return_visitor_ratio)
        + per_visit * resolved.return_visitor_ratio * (1.0 - resolved.data_cache_ratio);

    Report {
        co2: Co2Summary {
            total,
            rating: Some(model.rate(total).to_string()),
        },
        green,
        variables: ReportVariables {
            bytes,
            grid_intensity: resolved.grid.clone(),
            data_cache_ratio: resolved.data_cache_ratio,
            return_visitor_ratio: resolved.return_visitor_ratio,
            green_hosting_factor: factor,
        },
    }
}

/// Validates options and computes a report in one step.
pub fn estimate(
    bytes: u64,
    green: Option<bool>,
    options: &EstimationOptions,
    model: &ModelParams,
) -> Result<Report, EstimateError> {
    let resolved = resolve_options(options, model)?;
    Ok(estimate_resolved(bytes, green, &resolved, model))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn model() -> ModelParams {
        ModelParams::swd_v4()
    }

    #[test]
    fn test_rejects_out_of_range_ratios() {
        for (options, needle) in [
            (
                EstimationOptions {
                    data_cache_ratio: Some(-0.1),
                    ..Default::default()
                },
                "dataCacheRatio",
            ),
            (
                EstimationOptions {
                    return_visitor_ratio: Some(1.5),
                    ..Default::default()
                },
                "returnVisitorRatio",
            ),
            (
                EstimationOptions {
                    green_hosting_factor: Some(2.0),
                    ..Default::default()
                },
                "greenHostingFactor",
            ),
        ] {
            match estimate(1_000_000, None, &options, &model()) {
                Err(EstimateError::InvalidParameter(msg)) => {
                    assert!(msg.contains(needle), "{} not in {:?}", needle, msg)
                }
                other => panic!("expected InvalidParameter, got {:?}", other.map(|r| r.co2)),
            }
        }
    }

    #[test]
    fn test_rejects_unknown_country_code() {
        let options = EstimationOptions {
            grid_intensity: GridIntensityOptions {
                device: Some(SegmentIntensity::Country("ZZZ".into())),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            estimate(1_000_000, None, &options, &model()),
            Err(EstimateError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_estimate_is_pure() {
        let options = EstimationOptions {
            data_cache_ratio: Some(0.5),
            return_visitor_ratio: Some(0.3),
            grid_intensity: GridIntensityOptions {
                network: Some(SegmentIntensity::Country("FRA".into())),
                ..Default::default()
            },
            ..Default::default()
        };
        let a = estimate(123_456_789, Some(false), &options, &model()).unwrap();
        let b = estimate(123_456_789, Some(false), &options, &model()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_return_visitor_ratio_is_inert() {
        let base = EstimationOptions {
            return_visitor_ratio: Some(0.0),
            data_cache_ratio: Some(0.9),
            ..Default::default()
        };
        let plain = EstimationOptions {
            return_visitor_ratio: Some(0.0),
            data_cache_ratio: Some(0.0),
            ..Default::default()
        };
        let a = estimate(500_000_000, None, &base, &model()).unwrap();
        let b = estimate(500_000_000, None, &plain, &model()).unwrap();
        // With no return visitors the cache ratio cannot influence the total.
        assert!((a.co2.total - b.co2.total).abs() < EPSILON);
    }

    #[test]
    fn test_full_return_full_cache_collapses_to_zero() {
        let options = EstimationOptions {
            return_visitor_ratio: Some(1.0),
            data_cache_ratio: Some(1.0),
            ..Default::default()
        };
        let report = estimate(2_000_000_000, None, &options, &model()).unwrap();
        assert!(report.co2.total.abs() < EPSILON);
    }

    #[test]
    fn test_two_gb_green_default_ratios() {
        // 2 GB, green hosting, defaults: the operational data-center term is
        // zeroed; everything else remains.
        let report = estimate(
            2_000_000_000,
            Some(true),
            &EstimationOptions::default(),
            &model(),
        )
        .unwrap();

        let m = model();
        let gb = 2.0;
        let expected = gb * m.grid_default
            * (m.energy.embodied_data_center
                + m.energy.operational_network
                + m.energy.embodied_network
                + m.energy.operational_device
                + m.energy.embodied_device);
        assert!((report.co2.total - expected).abs() < EPSILON);
        assert_eq!(report.co2.rating.as_deref(), Some("F"));
        assert_eq!(report.green, Some(true));
        assert!((report.variables.green_hosting_factor - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_unreported_hosting_gets_no_discount() {
        let unknown = estimate(1_000_000_000, None, &EstimationOptions::default(), &model())
            .unwrap();
        let non_green = estimate(
            1_000_000_000,
            Some(false),
            &EstimationOptions::default(),
            &model(),
        )
        .unwrap();
        // Same total, but the tri-state is preserved in the report.
        assert!((unknown.co2.total - non_green.co2.total).abs() < EPSILON);
        assert_eq!(unknown.green, None);
        assert_eq!(non_green.green, Some(false));
    }

    #[test]
    fn test_explicit_factor_overrides_lookup() {
        let options = EstimationOptions {
            green_hosting_factor: Some(0.5),
            ..Default::default()
        };
        // Lookup said non-green; the explicit factor still applies.
        let report = estimate(1_000_000_000, Some(false), &options, &model()).unwrap();
        assert!((report.variables.green_hosting_factor - 0.5).abs() < EPSILON);

        let full = estimate(1_000_000_000, Some(false), &EstimationOptions::default(), &model())
            .unwrap();
        assert!(report.co2.total < full.co2.total);
    }

    #[test]
    fn test_segment_override_applies_independently() {
        let options = EstimationOptions {
            grid_intensity: GridIntensityOptions {
                device: Some(SegmentIntensity::Country("SWE".into())),
                ..Default::default()
            },
            ..Default::default()
        };
        let report = estimate(1_000_000_000, None, &options, &model()).unwrap();
        let vars = &report.variables.grid_intensity;
        assert_eq!(vars.device.country.as_deref(), Some("SWE"));
        assert_eq!(vars.device.value, 45.0);
        // Other segments fall back to the global constant.
        assert_eq!(vars.data_center.value, model().grid_default);
        assert_eq!(vars.network.value, model().grid_default);
        assert!(vars.data_center.country.is_none());
    }

    #[test]
    fn test_explicit_zero_cache_ratio_is_not_replaced_by_default() {
        let explicit = EstimationOptions {
            data_cache_ratio: Some(0.0),
            return_visitor_ratio: Some(1.0),
            ..Default::default()
        };
        let defaulted = EstimationOptions {
            return_visitor_ratio: Some(1.0),
            ..Default::default()
        };
        let a = estimate(1_000_000_000, None, &explicit, &model()).unwrap();
        let b = estimate(1_000_000_000, None, &defaulted, &model()).unwrap();
        assert!(a.co2.total > b.co2.total);
        assert_eq!(a.variables.data_cache_ratio, 0.0);
        assert_eq!(b.variables.data_cache_ratio, DEFAULT_DATA_CACHE_RATIO);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = estimate(1_000, None, &EstimationOptions::default(), &model()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["variables"]["dataCacheRatio"].is_number());
        assert!(json["variables"]["gridIntensity"]["dataCenter"]["value"].is_number());
        assert!(json["green"].is_null());
    }
}
