//! Local checks run on compression payloads before they are sent.
//!
//! Every check is pure. A payload that fails here never reaches the
//! network; the error names the offending field or layer.

use super::types::{
    AutoCompressionRequest, AvailableLayer, CompressionMethod, CompressionRequest,
    RecommendationMethod, RecommendationRequest,
};
use crate::error::{EdgePressError, Result};
use std::collections::HashMap;
use std::collections::HashSet;

/// Interval a recommendation ratio must fall in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioRange {
    pub min: f64,
    pub max: f64,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl RatioRange {
    /// `min < v <= max`
    pub const fn left_open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: false,
            max_inclusive: true,
        }
    }

    /// `min <= v <= max`
    pub const fn closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// `min < v < max`
    pub const fn open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: false,
            max_inclusive: false,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let above_min = if self.min_inclusive {
            value >= self.min
        } else {
            value > self.min
        };
        let below_max = if self.max_inclusive {
            value <= self.max
        } else {
            value < self.max
        };
        above_min && below_max
    }
}

impl std::fmt::Display for RatioRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lower = if self.min_inclusive { "<=" } else { "<" };
        let upper = if self.max_inclusive { "<=" } else { "<" };
        write!(f, "{} {} ratio {} {}", self.min, lower, upper, self.max)
    }
}

/// Ratio used by `auto_compress`.
pub const AUTO_COMPRESSION_RATIO: RatioRange = RatioRange::left_open(0.0, 1.0);

/// Per-layer ratio of the norm-based pruning methods.
pub const PRUNING_RATIO: RatioRange = RatioRange::open(0.0, 1.0);

/// Recommendation method identifier -> allowed ratio.
#[derive(Debug, Clone)]
pub struct RatioRules {
    ranges: HashMap<String, RatioRange>,
}

impl Default for RatioRules {
    fn default() -> Self {
        Self::empty()
            .with_rule(RecommendationMethod::Slamp.as_str(), RatioRange::left_open(0.0, 1.0))
            .with_rule(RecommendationMethod::Vbmf.as_str(), RatioRange::closed(-1.0, 1.0))
    }
}

impl RatioRules {
    pub fn empty() -> Self {
        Self {
            ranges: HashMap::new(),
        }
    }

    /// Register or replace the range for `method`.
    pub fn with_rule(mut self, method: impl Into<String>, range: RatioRange) -> Self {
        self.ranges.insert(method.into(), range);
        self
    }

    pub fn get(&self, method: &str) -> Option<&RatioRange> {
        self.ranges.get(method)
    }

    /// Check `ratio` for `method`. Methods without a rule only need a finite ratio.
    pub fn check(&self, method: &str, ratio: f64) -> Result<()> {
        if !ratio.is_finite() {
            return Err(EdgePressError::validation(
                "recommendation_ratio",
                format!("ratio must be a finite number, got {}", ratio),
            ));
        }
        match self.get(method) {
            Some(range) if !range.contains(ratio) => Err(EdgePressError::validation(
                "recommendation_ratio",
                format!("the ratio range for {} is {}, got {}", method, range, ratio),
            )),
            _ => Ok(()),
        }
    }

    pub fn validate_recommendation(&self, request: &RecommendationRequest) -> Result<()> {
        if request.compression_id.trim().is_empty() {
            return Err(EdgePressError::validation(
                "compression_id",
                "compression id must not be empty",
            ));
        }
        self.check(
            request.recommendation_method.as_str(),
            request.recommendation_ratio,
        )
    }
}

/// Validate a recommendation request against the default ratio rules.
pub fn validate_recommendation(request: &RecommendationRequest) -> Result<()> {
    RatioRules::default().validate_recommendation(request)
}

/// Reject recommendation methods that cannot drive `method`.
pub fn validate_method_pair(
    method: CompressionMethod,
    recommendation: RecommendationMethod,
) -> Result<()> {
    if recommendation.supports(method) {
        return Ok(());
    }
    let message = match method.recommendation_method() {
        Some(expected) => format!(
            "{} cannot be used with {}; use {}",
            recommendation, method, expected
        ),
        None => format!("{} does not support recommendations", method),
    };
    Err(EdgePressError::validation("recommendation_method", message))
}

/// Validate the layer parameters of a compression request.
pub fn validate_compression(request: &CompressionRequest) -> Result<()> {
    let mut selected = 0usize;
    for layer in request.selected_layers() {
        validate_layer(request.compression_method, layer)?;
        selected += 1;
    }
    if selected == 0 {
        return Err(EdgePressError::validation(
            "layers",
            "select at least one layer to compress",
        ));
    }
    Ok(())
}

pub fn validate_auto_compression(request: &AutoCompressionRequest) -> Result<()> {
    if request.model_id.trim().is_empty() {
        return Err(EdgePressError::validation("model_id", "model id must not be empty"));
    }
    if !AUTO_COMPRESSION_RATIO.contains(request.recommendation_ratio) {
        return Err(EdgePressError::validation(
            "recommendation_ratio",
            format!(
                "expected {}, got {}",
                AUTO_COMPRESSION_RATIO, request.recommendation_ratio
            ),
        ));
    }
    Ok(())
}

/// Check one selected layer's values against the method's arity and bounds.
pub fn validate_layer(method: CompressionMethod, layer: &AvailableLayer) -> Result<()> {
    let field = format!("layers[{}]", layer.name);
    let fail = |message: String| Err(EdgePressError::validation(field.clone(), message));

    match method {
        CompressionMethod::PrL2 | CompressionMethod::PrGm | CompressionMethod::PrNn => {
            if layer.values.len() != 1 {
                return fail(format!(
                    "{} takes exactly 1 ratio, got {} values",
                    method,
                    layer.values.len()
                ));
            }
            let ratio = layer.values[0].as_f64();
            if !PRUNING_RATIO.contains(ratio) {
                return fail(format!("expected {}, got {}", PRUNING_RATIO, ratio));
            }
        }
        CompressionMethod::PrId => {
            let Some(&channels) = layer.channels.first() else {
                return fail("PR_ID needs the layer's channel count".to_string());
            };
            let channels = i64::from(channels);
            let count = layer.values.len() as i64;
            if count < 1 || count > channels - 1 {
                return fail(format!(
                    "PR_ID takes between 1 and {} channel indices, got {}",
                    (channels - 1).max(0),
                    count
                ));
            }
            let mut seen = HashSet::new();
            for value in &layer.values {
                let Some(index) = value.as_integer() else {
                    return fail(format!("channel index {} is not an integer", value));
                };
                if !(0..channels).contains(&index) {
                    return fail(format!(
                        "channel index {} is outside 0..{}",
                        index, channels
                    ));
                }
                if !seen.insert(index) {
                    return fail(format!("channel index {} is listed twice", index));
                }
            }
        }
        CompressionMethod::FdTk => {
            let ranks = positive_ranks(method, layer, 2).map_err(|m| {
                EdgePressError::validation(field.clone(), m)
            })?;
            if layer.channels.len() == 2 {
                for (rank, limit) in ranks.iter().zip(&layer.channels) {
                    if *rank > i64::from(*limit) {
                        return fail(format!(
                            "rank {} exceeds the channel count {}",
                            rank, limit
                        ));
                    }
                }
            }
        }
        CompressionMethod::FdCp => {
            positive_ranks(method, layer, 1)
                .map_err(|m| EdgePressError::validation(field.clone(), m))?;
        }
        CompressionMethod::FdSvd => {
            let ranks = positive_ranks(method, layer, 1)
                .map_err(|m| EdgePressError::validation(field.clone(), m))?;
            if let Some(limit) = layer.channels.iter().min() {
                if ranks[0] > i64::from(*limit) {
                    return fail(format!(
                        "rank {} exceeds the smallest channel count {}",
                        ranks[0], limit
                    ));
                }
            }
        }
    }
    Ok(())
}

fn positive_ranks(
    method: CompressionMethod,
    layer: &AvailableLayer,
    arity: usize,
) -> std::result::Result<Vec<i64>, String> {
    if layer.values.len() != arity {
        return Err(format!(
            "{} takes exactly {} rank{}, got {} values",
            method,
            arity,
            if arity == 1 { "" } else { "s" },
            layer.values.len()
        ));
    }
    layer
        .values
        .iter()
        .map(|value| match value.as_integer() {
            Some(rank) if rank > 0 => Ok(rank),
            _ => Err(format!("rank {} must be a positive integer", value)),
        })
        .collect()
}
