use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel bucket for rows whose location is absent or unmapped,
/// when the run's policy keeps them instead of dropping them.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single row of the order export.
///
/// Numeric fields are `None` when the source cell failed coercion; the load
/// never aborts on a bad number.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order_id: String,
    /// Raw location before normalization, canonical after.
    pub location: Option<String>,
    pub status: String,
    /// `Total Amount`.
    pub total: Option<f64>,
    /// `Total (- Refund)` — signed; negative on refund rows in some exports.
    pub net: Option<f64>,
    /// `Refund Amount`; empty cells default to 0.
    pub refund: Option<f64>,
}

/// Order status classes that participate in aggregation.
/// All other statuses are tallied in the breakdown but never summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Processing,
    Refunded,
}

impl StatusClass {
    pub fn classify(status: &str) -> Option<Self> {
        match status {
            "Processing" => Some(Self::Processing),
            "Refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate key = (canonical location, status class).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BucketKey {
    pub location: String,
    pub class: StatusClass,
}

/// Count and sum of the selected amount field for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub sum: f64,
}

/// Per-location rollup across all statuses.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocationTotals {
    /// Order count regardless of status.
    pub orders: usize,
    pub status_breakdown: BTreeMap<String, usize>,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareField {
    Count,
    Sum,
}

impl std::fmt::Display for CompareField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Sum => write!(f, "sum"),
        }
    }
}

/// One differing field between computed and reference buckets.
///
/// Counts are never within tolerance; money is within tolerance when the
/// absolute difference does not exceed the configured epsilon.
#[derive(Debug, Clone, Serialize)]
pub struct Discrepancy {
    pub location: String,
    pub class: StatusClass,
    pub field: CompareField,
    pub computed: f64,
    pub reference: f64,
    pub difference: f64,
    pub within_tolerance: bool,
}

/// One differing grand-total field between the CSV and the platform summary.
#[derive(Debug, Clone, Serialize)]
pub struct TotalsDiscrepancy {
    pub field: String,
    pub computed: f64,
    pub reference: f64,
    pub difference: f64,
    pub within_tolerance: bool,
}

// ---------------------------------------------------------------------------
// Platform summary
// ---------------------------------------------------------------------------

/// Dashboard summary payload. Keys are camelCase on the wire; absent keys
/// read as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSummary {
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_refunds: f64,
    #[serde(default)]
    pub platform_fees: f64,
    #[serde(default)]
    pub stripe_fees: f64,
    #[serde(default)]
    pub net_deposit: f64,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Rows the pipeline excluded or could not fully use, surfaced so the CLI
/// can warn instead of dropping silently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub rows_read: usize,
    pub missing_location_dropped: usize,
    pub unmapped_excluded: usize,
    /// Cells that failed numeric coercion (mapped to missing, kept).
    pub coerce_failures: usize,
    /// Rows counted in a bucket whose selected amount was missing.
    pub unsummed: usize,
}

/// Computed aggregates for one canonical location.
#[derive(Debug, Clone, Serialize)]
pub struct LocationSummary {
    pub location: String,
    pub orders: usize,
    pub processing: Bucket,
    pub refunded: Bucket,
    pub status_breakdown: BTreeMap<String, usize>,
}

/// CSV grand totals across all canonical locations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GrandTotals {
    pub orders: usize,
    pub processing_orders: usize,
    pub processing_sales: f64,
    pub refunded_orders: usize,
    pub refund_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformComparison {
    pub summary: PlatformSummary,
    pub discrepancies: Vec<TotalsDiscrepancy>,
    pub all_matched: bool,
}

/// Order-ID set difference against an externally supplied ID list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderIdReport {
    pub csv_count: usize,
    pub reference_count: usize,
    pub missing_in_csv: Vec<String>,
    pub extra_in_csv: Vec<String>,
}

impl OrderIdReport {
    pub fn all_matched(&self) -> bool {
        self.missing_in_csv.is_empty() && self.extra_in_csv.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

/// Full output of one reconciliation run. Built fresh per run, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReportMeta,
    pub stats: PipelineStats,
    pub locations: Vec<LocationSummary>,
    pub totals: GrandTotals,
    /// Number of reference buckets compared (0 = no manual table configured).
    pub reference_buckets: usize,
    /// Empty when no manual reference table is configured.
    pub discrepancies: Vec<Discrepancy>,
    pub platform: Option<PlatformComparison>,
    pub order_ids: Option<OrderIdReport>,
    /// False when any count differs, any money diff exceeds tolerance, or
    /// the order-ID sets differ.
    pub all_matched: bool,
}
