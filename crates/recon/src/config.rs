use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// One run's configuration. Everything the source scripts hardcoded per
/// copy (alias tables, reference numbers, amount-field choices, thresholds)
/// lives here instead.
#[derive(Debug, Default, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub name: String,
    /// Default CSV path; the CLI may override it.
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub missing_location: MissingLocationPolicy,
    #[serde(default)]
    pub unmapped_location: UnmappedPolicy,
    #[serde(default)]
    pub amounts: AmountsConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    /// Raw location string → canonical location. Empty table = identity
    /// (aggregate on raw locations, nothing excluded).
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub reference: ReferenceConfig,
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What to do with rows whose location cell is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingLocationPolicy {
    /// Remove the row before aggregation.
    #[default]
    Drop,
    /// Keep it under the `Unknown Location` sentinel.
    Unknown,
}

/// What to do with rows whose raw location has no alias entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedPolicy {
    /// Exclude from aggregation (the excluded count is reported).
    #[default]
    Exclude,
    /// Bucket under the `Unknown Location` sentinel.
    Unknown,
}

// ---------------------------------------------------------------------------
// Amount selection
// ---------------------------------------------------------------------------

/// Which column a processing bucket sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingAmount {
    /// `Total (- Refund)`.
    #[default]
    NetOfRefund,
    /// `Total Amount`.
    Total,
}

/// Which column a refunded bucket sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundedAmount {
    /// |`Total (- Refund)`| — the signed-net convention of cleaned exports.
    #[default]
    AbsNet,
    /// `Refund Amount`.
    RefundAmount,
    /// `Total Amount`.
    Total,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AmountsConfig {
    #[serde(default)]
    pub processing: ProcessingAmount,
    #[serde(default)]
    pub refunded: RefundedAmount,
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

pub const DEFAULT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ToleranceConfig {
    /// Monetary epsilon. Counts always compare exactly.
    #[serde(default = "default_amount")]
    pub amount: f64,
}

fn default_amount() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self { amount: DEFAULT_TOLERANCE }
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ReferenceConfig {
    /// Hand-transcribed per-location numbers, keyed by canonical location.
    #[serde(default)]
    pub manual: BTreeMap<String, ReferenceEntry>,
    #[serde(default)]
    pub platform: Option<PlatformConfig>,
    #[serde(default)]
    pub order_ids: Option<OrderIdsConfig>,
}

/// Expected totals for one canonical location.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceEntry {
    pub processing_orders: usize,
    pub processing_sales: f64,
    #[serde(default)]
    pub refunded_orders: usize,
    #[serde(default)]
    pub refund_amount: f64,
}

/// Dashboard summary endpoint. The CLI fetches
/// `{url}?month={month}` and hands the parsed payload to the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    pub url: String,
    #[serde(default)]
    pub month: Option<String>,
}

/// External order-ID list, one ID per line. When `location` is set, only
/// CSV rows at that canonical location participate in the set comparison.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderIdsConfig {
    pub file: String,
    #[serde(default)]
    pub location: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.tolerance.amount.is_finite() || self.tolerance.amount < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance.amount must be a non-negative number, got {}",
                self.tolerance.amount
            )));
        }

        for (raw, canonical) in &self.aliases {
            if raw.trim().is_empty() || canonical.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "alias entries must have non-empty raw and canonical names".into(),
                ));
            }
        }

        for (location, entry) in &self.reference.manual {
            if entry.processing_sales < 0.0 || entry.refund_amount < 0.0 {
                return Err(ReconError::ConfigValidation(format!(
                    "reference for '{location}' has a negative amount"
                )));
            }
        }

        if let Some(ref platform) = self.reference.platform {
            if platform.url.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "reference.platform.url must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
