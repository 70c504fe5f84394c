//! Decision-vector dimensions: kind, inclusive bounds and categorical value tables.

use crate::config::encoders::{json_to_arg, RateControlParameters};
use crate::error::{Result, SweetspotError};
use serde::{Deserialize, Serialize};

/// Decimal digits kept when building a cache key.
pub const KEY_PRECISION: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneKind {
    Continuous,
    Integer,
    Categorical,
}

impl GeneKind {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "f" => Some(GeneKind::Continuous),
            "i" => Some(GeneKind::Integer),
            "c" => Some(GeneKind::Categorical),
            _ => None,
        }
    }

    pub fn is_continuous(self) -> bool {
        self == GeneKind::Continuous
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneDescriptor {
    pub name: String,
    pub kind: GeneKind,
    pub low: f64,
    pub high: f64,
    /// Encoder argument values indexed by the gene's integer value.
    pub value_table: Vec<String>,
}

impl GeneDescriptor {
    /// Encoder-facing value of this gene for a raw coordinate.
    pub fn value_of(&self, raw: f64) -> String {
        match self.kind {
            GeneKind::Continuous => format!("{:.*}", KEY_PRECISION, raw),
            GeneKind::Integer => format!("{}", raw.round() as i64),
            GeneKind::Categorical => {
                let index = (raw.round().max(self.low).min(self.high)) as usize;
                self.value_table[index].clone()
            }
        }
    }
}

/// Ordered, immutable description of the search space.
///
/// Continuous genes always come first: the engine treats the trailing
/// `integer_dimension_count()` dimensions as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneSpace {
    genes: Vec<GeneDescriptor>,
}

impl GeneSpace {
    pub fn new(genes: Vec<GeneDescriptor>) -> Result<Self> {
        if genes.is_empty() {
            return Err(SweetspotError::Configuration("Gene space has no genes".to_string()));
        }
        for (i, gene) in genes.iter().enumerate() {
            if genes[..i].iter().any(|g| g.name == gene.name) {
                return Err(SweetspotError::Configuration(format!(
                    "Duplicate gene '{}'",
                    gene.name
                )));
            }
            validate_descriptor(gene)?;
        }

        let (mut ordered, integers): (Vec<_>, Vec<_>) =
            genes.into_iter().partition(|g| g.kind.is_continuous());
        ordered.extend(integers);

        Ok(Self { genes: ordered })
    }

    /// Build from an encoder parameter block.
    pub fn build(source: &RateControlParameters) -> Result<Self> {
        let mut genes = Vec::with_capacity(source.bounds.len());

        for (name, entry) in &source.bounds {
            let fields = entry.as_array().filter(|a| a.len() == 3).ok_or_else(|| {
                SweetspotError::Configuration(format!(
                    "Gene '{}' must be [low, high, type], got {}",
                    name, entry
                ))
            })?;

            let low = numeric_bound(name, "low", &fields[0])?;
            let high = numeric_bound(name, "high", &fields[1])?;
            let kind = fields[2]
                .as_str()
                .and_then(GeneKind::from_code)
                .ok_or_else(|| {
                    SweetspotError::Configuration(format!(
                        "Gene '{}' has unknown type {}",
                        name, fields[2]
                    ))
                })?;

            let value_table = match kind {
                GeneKind::Categorical => source
                    .categorical
                    .get(name)
                    .ok_or_else(|| {
                        SweetspotError::Configuration(format!(
                            "Categorical gene '{}' has no value table",
                            name
                        ))
                    })?
                    .iter()
                    .map(json_to_arg)
                    .collect(),
                _ => Vec::new(),
            };

            genes.push(GeneDescriptor {
                name: name.clone(),
                kind,
                low,
                high,
                value_table,
            });
        }

        let space = Self::new(genes)?;
        log::debug!("Params loaded: {:?}", space.names());
        Ok(space)
    }

    pub fn genes(&self) -> &[GeneDescriptor] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.genes.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn gene(&self, name: &str) -> Option<(usize, &GeneDescriptor)> {
        self.genes.iter().enumerate().find(|(_, g)| g.name == name)
    }

    /// `(low_bounds, high_bounds)` in gene order.
    pub fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        self.genes.iter().map(|g| (g.low, g.high)).unzip()
    }

    pub fn continuous_count(&self) -> usize {
        self.genes.iter().filter(|g| g.kind.is_continuous()).count()
    }

    pub fn integer_dimension_count(&self) -> usize {
        self.genes.len() - self.continuous_count()
    }

    /// Round non-continuous genes, clamp into bounds and normalise `-0`.
    pub fn canonicalize(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_len(x)?;
        Ok(self
            .genes
            .iter()
            .zip(x)
            .map(|(gene, &v)| {
                let v = if gene.kind.is_continuous() { v } else { v.round() };
                normalize_zero(v.clamp(gene.low, gene.high))
            })
            .collect())
    }

    /// Deterministic string identity of a decision vector.
    ///
    /// Vectors that agree after canonicalisation and rounding to
    /// `KEY_PRECISION` decimals share a key.
    pub fn canonical_key(&self, x: &[f64]) -> Result<String> {
        let canonical = self.canonicalize(x)?;
        Ok(format_key(&canonical))
    }

    pub fn check_len(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.genes.len() {
            return Err(SweetspotError::Engine(format!(
                "Decision vector has {} values, gene space has {} genes",
                x.len(),
                self.genes.len()
            )));
        }
        Ok(())
    }
}

/// `[v1 v2 ...]` with fixed precision; `-0` is written as `0`.
pub fn format_key(x: &[f64]) -> String {
    let scale = 10f64.powi(KEY_PRECISION as i32);
    let parts: Vec<String> = x
        .iter()
        .map(|v| {
            let rounded = normalize_zero((v * scale).round() / scale);
            format!("{:.*}", KEY_PRECISION, rounded)
        })
        .collect();
    format!("[{}]", parts.join(" "))
}

/// Inverse of `format_key`.
pub fn parse_key(key: &str) -> Result<Vec<f64>> {
    key.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split_whitespace()
        .map(|part| {
            part.parse::<f64>().map_err(|e| {
                SweetspotError::Configuration(format!("Bad decision vector key '{}': {}", key, e))
            })
        })
        .collect()
}

pub(crate) fn normalize_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

fn numeric_bound(gene: &str, which: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            SweetspotError::Configuration(format!(
                "Gene '{}' has a non-numeric {} bound: {}",
                gene, which, value
            ))
        })
}

fn validate_descriptor(gene: &GeneDescriptor) -> Result<()> {
    if !gene.low.is_finite() || !gene.high.is_finite() {
        return Err(SweetspotError::Configuration(format!(
            "Gene '{}' has non-finite bounds",
            gene.name
        )));
    }
    if gene.low > gene.high {
        return Err(SweetspotError::Configuration(format!(
            "Gene '{}' has low bound {} above high bound {}",
            gene.name, gene.low, gene.high
        )));
    }
    if gene.kind == GeneKind::Categorical {
        let expected_high = gene.value_table.len() as f64 - 1.0;
        if gene.value_table.is_empty() || gene.low != 0.0 || gene.high != expected_high {
            return Err(SweetspotError::Configuration(format!(
                "Categorical gene '{}' must span [0, {}] to match its value table",
                gene.name, expected_high
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: &str) -> RateControlParameters {
        RateControlParameters::parse(json, "ABR").unwrap()
    }

    #[test]
    fn test_build_orders_continuous_first() {
        let space = GeneSpace::build(&params(
            r#"{"ABR": {
                "bounds": {"b:v": [1, 50, "i"], "crf": [0.5, 4.5, "f"], "preset": [0, 2, "c"]},
                "categorical": {"preset": ["slow", "medium", "fast"]}
            }}"#,
        ))
        .unwrap();

        assert_eq!(space.names(), vec!["crf", "b:v", "preset"]);
        assert_eq!(space.continuous_count(), 1);
        assert_eq!(space.integer_dimension_count(), 2);
        assert_eq!(space.bounds(), (vec![0.5, 1.0, 0.0], vec![4.5, 50.0, 2.0]));
    }

    #[test]
    fn test_build_rejects_bad_bounds() {
        let inverted = params(r#"{"ABR": {"bounds": {"b:v": [50, 1, "i"]}}}"#);
        assert!(matches!(GeneSpace::build(&inverted), Err(SweetspotError::Configuration(_))));

        let text = params(r#"{"ABR": {"bounds": {"b:v": ["low", 1, "i"]}}}"#);
        assert!(matches!(GeneSpace::build(&text), Err(SweetspotError::Configuration(_))));

        let missing = params(r#"{"ABR": {"bounds": {"b:v": [1, "i"]}}}"#);
        assert!(matches!(GeneSpace::build(&missing), Err(SweetspotError::Configuration(_))));

        let table_mismatch = params(
            r#"{"ABR": {"bounds": {"tune": [0, 5, "c"]}, "categorical": {"tune": ["film", "grain"]}}}"#,
        );
        assert!(matches!(
            GeneSpace::build(&table_mismatch),
            Err(SweetspotError::Configuration(_))
        ));
    }

    #[test]
    fn test_canonical_key_tolerates_rounding_noise() {
        let space = GeneSpace::build(&params(
            r#"{"ABR": {"bounds": {"crf": [0, 10, "f"], "b:v": [1, 50, "i"]}}}"#,
        ))
        .unwrap();

        let a = space.canonical_key(&[2.5, 12.2]).unwrap();
        let b = space.canonical_key(&[2.5000000001, 11.8]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "[2.50000 12.00000]");

        let c = space.canonical_key(&[-0.0, 1.0]).unwrap();
        assert_eq!(c, "[0.00000 1.00000]");
        assert_eq!(parse_key(&a).unwrap(), vec![2.5, 12.0]);
    }

    #[test]
    fn test_categorical_value_lookup() {
        let space = GeneSpace::build(&params(
            r#"{"ABR": {"bounds": {"preset": [0, 2, "c"]}, "categorical": {"preset": ["slow", "medium", "fast"]}}}"#,
        ))
        .unwrap();
        let (_, gene) = space.gene("preset").unwrap();
        assert_eq!(gene.value_of(1.2), "medium");
        assert_eq!(gene.value_of(7.0), "fast");
    }
}
