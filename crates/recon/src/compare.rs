use std::collections::{BTreeMap, BTreeSet};

use crate::config::ReferenceEntry;
use crate::model::{
    Bucket, BucketKey, CompareField, Discrepancy, GrandTotals, OrderIdReport, PlatformSummary,
    StatusClass, TotalsDiscrepancy,
};

/// Differences below this are float noise, not discrepancies.
const EQ_EPSILON: f64 = 1e-9;

/// Compare computed buckets against a reference of the same shape.
///
/// Keys from either side participate; a key present on one side only is a
/// full mismatch with the missing side treated as zero. Counts compare
/// exactly; sums within `tolerance`. The returned bool is true when nothing
/// material differs (count diffs and out-of-tolerance sums are material;
/// within-tolerance sum diffs are reported but not material).
pub fn compare_buckets(
    computed: &BTreeMap<BucketKey, Bucket>,
    reference: &BTreeMap<BucketKey, Bucket>,
    tolerance: f64,
) -> (Vec<Discrepancy>, bool) {
    let keys: BTreeSet<&BucketKey> = computed.keys().chain(reference.keys()).collect();

    let mut discrepancies = Vec::new();
    let mut all_matched = true;

    for key in keys {
        let c = computed.get(key).copied().unwrap_or_default();
        let r = reference.get(key).copied().unwrap_or_default();

        if c.count != r.count {
            all_matched = false;
            discrepancies.push(Discrepancy {
                location: key.location.clone(),
                class: key.class,
                field: CompareField::Count,
                computed: c.count as f64,
                reference: r.count as f64,
                difference: (c.count as f64 - r.count as f64).abs(),
                within_tolerance: false,
            });
        }

        let diff = (c.sum - r.sum).abs();
        if diff > EQ_EPSILON {
            let within = diff <= tolerance + EQ_EPSILON;
            if !within {
                all_matched = false;
            }
            discrepancies.push(Discrepancy {
                location: key.location.clone(),
                class: key.class,
                field: CompareField::Sum,
                computed: c.sum,
                reference: r.sum,
                difference: diff,
                within_tolerance: within,
            });
        }
    }

    (discrepancies, all_matched)
}

/// Expand the manual reference table into bucket form.
pub fn reference_buckets(
    manual: &BTreeMap<String, ReferenceEntry>,
) -> BTreeMap<BucketKey, Bucket> {
    let mut buckets = BTreeMap::new();
    for (location, entry) in manual {
        buckets.insert(
            BucketKey { location: location.clone(), class: StatusClass::Processing },
            Bucket { count: entry.processing_orders, sum: entry.processing_sales },
        );
        buckets.insert(
            BucketKey { location: location.clone(), class: StatusClass::Refunded },
            Bucket { count: entry.refunded_orders, sum: entry.refund_amount },
        );
    }
    buckets
}

/// Compare CSV grand totals against the dashboard summary. Fee fields are
/// informational only and never compared.
pub fn compare_totals(
    totals: &GrandTotals,
    platform: &PlatformSummary,
    tolerance: f64,
) -> (Vec<TotalsDiscrepancy>, bool) {
    let mut discrepancies = Vec::new();
    let mut all_matched = true;

    let mut money = |field: &str, computed: f64, reference: f64| {
        let diff = (computed - reference).abs();
        if diff > EQ_EPSILON {
            let within = diff <= tolerance + EQ_EPSILON;
            if !within {
                all_matched = false;
            }
            discrepancies.push(TotalsDiscrepancy {
                field: field.to_string(),
                computed,
                reference,
                difference: diff,
                within_tolerance: within,
            });
        }
    };

    money("total_sales", totals.processing_sales, platform.total_sales);
    money("total_refunds", totals.refund_total, platform.total_refunds);

    if totals.orders as u64 != platform.total_orders {
        all_matched = false;
        discrepancies.push(TotalsDiscrepancy {
            field: "total_orders".to_string(),
            computed: totals.orders as f64,
            reference: platform.total_orders as f64,
            difference: (totals.orders as f64 - platform.total_orders as f64).abs(),
            within_tolerance: false,
        });
    }

    (discrepancies, all_matched)
}

/// Set difference between the CSV's order IDs and an external ID list.
pub fn compare_order_ids(
    csv_ids: &BTreeSet<String>,
    reference_ids: &BTreeSet<String>,
) -> OrderIdReport {
    OrderIdReport {
        csv_count: csv_ids.len(),
        reference_count: reference_ids.len(),
        missing_in_csv: reference_ids.difference(csv_ids).cloned().collect(),
        extra_in_csv: csv_ids.difference(reference_ids).cloned().collect(),
    }
}
