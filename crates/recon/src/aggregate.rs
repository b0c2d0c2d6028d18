use std::collections::BTreeMap;

use crate::config::{AmountsConfig, ProcessingAmount, RefundedAmount};
use crate::model::{Bucket, BucketKey, LocationTotals, OrderRecord, StatusClass, UNKNOWN_LOCATION};

#[derive(Debug, Default)]
pub struct AggregateOutput {
    /// (canonical location, status class) → count + sum.
    pub buckets: BTreeMap<BucketKey, Bucket>,
    /// All-status rollup per canonical location.
    pub locations: BTreeMap<String, LocationTotals>,
    /// Rows counted in a bucket whose selected amount was missing.
    pub unsummed: usize,
}

/// Partition records by (canonical location, status class) and sum the
/// configured amount field. Statuses outside the recognized classes are
/// tallied in the breakdown but never summed.
pub fn aggregate(records: &[OrderRecord], amounts: &AmountsConfig) -> AggregateOutput {
    let mut out = AggregateOutput::default();

    for record in records {
        let location = record.location.as_deref().unwrap_or(UNKNOWN_LOCATION);

        let totals = out.locations.entry(location.to_string()).or_default();
        totals.orders += 1;
        *totals
            .status_breakdown
            .entry(record.status.clone())
            .or_insert(0) += 1;

        let Some(class) = StatusClass::classify(&record.status) else {
            continue;
        };

        let amount = select_amount(record, class, amounts);
        let bucket = out
            .buckets
            .entry(BucketKey { location: location.to_string(), class })
            .or_default();
        bucket.count += 1;
        match amount {
            Some(v) => bucket.sum += v,
            None => out.unsummed += 1,
        }
    }

    out
}

fn select_amount(
    record: &OrderRecord,
    class: StatusClass,
    amounts: &AmountsConfig,
) -> Option<f64> {
    match class {
        StatusClass::Processing => match amounts.processing {
            ProcessingAmount::NetOfRefund => record.net,
            ProcessingAmount::Total => record.total,
        },
        StatusClass::Refunded => match amounts.refunded {
            RefundedAmount::AbsNet => record.net.map(f64::abs),
            RefundedAmount::RefundAmount => record.refund,
            RefundedAmount::Total => record.total,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location: &str, status: &str, total: f64, net: f64, refund: f64) -> OrderRecord {
        OrderRecord {
            order_id: format!("o_{location}_{total}"),
            location: Some(location.to_string()),
            status: status.to_string(),
            total: Some(total),
            net: Some(net),
            refund: Some(refund),
        }
    }

    fn key(location: &str, class: StatusClass) -> BucketKey {
        BucketKey { location: location.to_string(), class }
    }

    #[test]
    fn cottman_buckets() {
        // Two processing rows of 10.00 and 20.00, one refunded row of 5.00.
        let records = vec![
            record("Cottman", "Processing", 10.00, 10.00, 0.0),
            record("Cottman", "Processing", 20.00, 20.00, 0.0),
            record("Cottman", "Refunded", 5.00, -5.00, 5.00),
        ];
        let out = aggregate(&records, &AmountsConfig::default());

        let processing = out.buckets[&key("Cottman", StatusClass::Processing)];
        assert_eq!(processing.count, 2);
        assert_eq!(processing.sum, 30.00);

        // abs_net: |-5.00| = 5.00
        let refunded = out.buckets[&key("Cottman", StatusClass::Refunded)];
        assert_eq!(refunded.count, 1);
        assert_eq!(refunded.sum, 5.00);
    }

    #[test]
    fn bucket_counts_cover_recognized_records() {
        let records = vec![
            record("A", "Processing", 1.0, 1.0, 0.0),
            record("A", "Refunded", 2.0, -2.0, 2.0),
            record("B", "Processing", 3.0, 3.0, 0.0),
            record("B", "Cancelled", 4.0, 4.0, 0.0),
            record("B", "On Hold", 5.0, 5.0, 0.0),
        ];
        let out = aggregate(&records, &AmountsConfig::default());

        let recognized = records
            .iter()
            .filter(|r| StatusClass::classify(&r.status).is_some())
            .count();
        let bucket_total: usize = out.buckets.values().map(|b| b.count).sum();
        assert_eq!(bucket_total, recognized);
        assert_eq!(bucket_total, 3);

        // Unrecognized statuses still show up in the breakdown
        assert_eq!(out.locations["B"].orders, 3);
        assert_eq!(out.locations["B"].status_breakdown["Cancelled"], 1);
        assert_eq!(out.locations["B"].status_breakdown["On Hold"], 1);
    }

    #[test]
    fn amount_field_selection() {
        let records = vec![
            record("A", "Processing", 12.00, 10.00, 0.0),
            record("A", "Refunded", 8.00, -6.00, 7.00),
        ];

        let net = aggregate(&records, &AmountsConfig::default());
        assert_eq!(net.buckets[&key("A", StatusClass::Processing)].sum, 10.00);
        assert_eq!(net.buckets[&key("A", StatusClass::Refunded)].sum, 6.00);

        let gross = aggregate(
            &records,
            &AmountsConfig {
                processing: ProcessingAmount::Total,
                refunded: RefundedAmount::RefundAmount,
            },
        );
        assert_eq!(gross.buckets[&key("A", StatusClass::Processing)].sum, 12.00);
        assert_eq!(gross.buckets[&key("A", StatusClass::Refunded)].sum, 7.00);
    }

    #[test]
    fn missing_amount_counts_but_does_not_sum() {
        let mut bad = record("A", "Processing", 0.0, 0.0, 0.0);
        bad.net = None;
        let records = vec![bad, record("A", "Processing", 10.0, 10.0, 0.0)];

        let out = aggregate(&records, &AmountsConfig::default());
        let bucket = out.buckets[&key("A", StatusClass::Processing)];
        assert_eq!(bucket.count, 2);
        assert_eq!(bucket.sum, 10.0);
        assert_eq!(out.unsummed, 1);
    }
}
