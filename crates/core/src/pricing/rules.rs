use std::collections::BTreeMap;
use std::slice;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::service::ServiceId;

/// One bounded adjustable quantity declared by a rule, e.g. bathrooms,
/// AC units, maids, hours.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountDial {
    pub key: String,
    pub min: u32,
    pub max: u32,
}

impl CountDial {
    /// Bounds a raw count to `[min, max]` without panicking on inverted
    /// bounds (integrity checks report those separately).
    pub fn bound(&self, value: u32) -> u32 {
        value.min(self.max).max(self.min)
    }

    /// The count the evaluator should use: the state value when present,
    /// the dial minimum otherwise, always bounded.
    pub fn effective(&self, counts: &BTreeMap<String, u32>) -> u32 {
        self.bound(counts.get(&self.key).copied().unwrap_or(self.min))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeTier {
    pub label: String,
    pub price: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    FlatUnit,
    TieredBySize,
    PerCountMultiplier,
    MatrixBySizeAndCategory,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatUnit => "flat_unit",
            Self::TieredBySize => "tiered_by_size",
            Self::PerCountMultiplier => "per_count_multiplier",
            Self::MatrixBySizeAndCategory => "matrix_by_size_and_category",
        }
    }
}

/// Strategy-specific rule data. Rules arrive from catalog files where the
/// declared strategy tag and the parameter payload are distinct fields, so
/// a mismatch between the two is representable and must be caught.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum StrategyParams {
    FlatUnit { dial: CountDial, price_per_unit: Decimal },
    TieredBySize { tiers: Vec<SizeTier> },
    PerCountMultiplier { price_per_unit: Decimal, dials: Vec<CountDial> },
    MatrixBySizeAndCategory { rows: Vec<SizeTier>, dial: CountDial },
}

impl StrategyParams {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::FlatUnit { .. } => StrategyKind::FlatUnit,
            Self::TieredBySize { .. } => StrategyKind::TieredBySize,
            Self::PerCountMultiplier { .. } => StrategyKind::PerCountMultiplier,
            Self::MatrixBySizeAndCategory { .. } => StrategyKind::MatrixBySizeAndCategory,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingRule {
    pub service_id: ServiceId,
    pub base_price: Decimal,
    pub strategy: StrategyKind,
    pub parameters: StrategyParams,
}

impl PricingRule {
    /// Fails fast when the declared strategy and the parameter shape
    /// diverge. Every evaluation starts here.
    pub fn verify_parameters(&self) -> Result<(), ConfigurationError> {
        let found = self.parameters.kind();
        if found == self.strategy {
            return Ok(());
        }

        Err(ConfigurationError::ParameterMismatch {
            service_id: self.service_id.clone(),
            declared: self.strategy,
            found,
        })
    }

    /// The count dials this rule exposes, in declaration order.
    pub fn dials(&self) -> &[CountDial] {
        match &self.parameters {
            StrategyParams::FlatUnit { dial, .. } => slice::from_ref(dial),
            StrategyParams::PerCountMultiplier { dials, .. } => dials,
            StrategyParams::MatrixBySizeAndCategory { dial, .. } => slice::from_ref(dial),
            StrategyParams::TieredBySize { .. } => &[],
        }
    }

    pub fn dial(&self, key: &str) -> Option<&CountDial> {
        self.dials().iter().find(|dial| dial.key == key)
    }

    /// The size tiers selectable for this rule (empty for count strategies).
    pub fn size_tiers(&self) -> &[SizeTier] {
        match &self.parameters {
            StrategyParams::TieredBySize { tiers } => tiers,
            StrategyParams::MatrixBySizeAndCategory { rows, .. } => rows,
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no pricing configuration for service {service_id:?}")]
    UnknownService { service_id: ServiceId },
    #[error(
        "pricing rule for {service_id:?} declares strategy {declared:?} but carries {found:?} parameters"
    )]
    ParameterMismatch { service_id: ServiceId, declared: StrategyKind, found: StrategyKind },
}
