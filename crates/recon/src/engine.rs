use std::collections::BTreeSet;

use crate::aggregate::aggregate;
use crate::compare::{compare_buckets, compare_order_ids, compare_totals, reference_buckets};
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::load::load_orders;
use crate::model::{
    Bucket, BucketKey, GrandTotals, LocationSummary, PipelineStats, PlatformComparison,
    ReconReport, ReportMeta, StatusClass,
};
use crate::normalize::normalize;

/// Everything a run consumes, already in memory. The caller does all I/O
/// (file reads, HTTP) so tests can run without touching disk or network.
#[derive(Debug, Default)]
pub struct ReconInput {
    pub csv_text: String,
    /// Pre-fetched dashboard summary, when the platform variant is in play.
    pub platform: Option<crate::model::PlatformSummary>,
    /// External order-ID list for the set comparison.
    pub reference_order_ids: Option<Vec<String>>,
}

/// Run the whole pipeline once: load → normalize → aggregate → compare.
/// Single linear pass, no retries, no process-wide state.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconReport, ReconError> {
    let (records, load_stats) = load_orders(&input.csv_text, config.missing_location)?;
    let (records, unmapped_excluded) =
        normalize(records, &config.aliases, config.unmapped_location);

    let aggregated = aggregate(&records, &config.amounts);

    let stats = PipelineStats {
        rows_read: load_stats.rows_read,
        missing_location_dropped: load_stats.missing_location_dropped,
        unmapped_excluded,
        coerce_failures: load_stats.coerce_failures,
        unsummed: aggregated.unsummed,
    };

    let bucket = |location: &str, class: StatusClass| -> Bucket {
        aggregated
            .buckets
            .get(&BucketKey { location: location.to_string(), class })
            .copied()
            .unwrap_or_default()
    };

    let locations: Vec<LocationSummary> = aggregated
        .locations
        .iter()
        .map(|(location, totals)| LocationSummary {
            location: location.clone(),
            orders: totals.orders,
            processing: bucket(location, StatusClass::Processing),
            refunded: bucket(location, StatusClass::Refunded),
            status_breakdown: totals.status_breakdown.clone(),
        })
        .collect();

    let mut totals = GrandTotals::default();
    for summary in &locations {
        totals.orders += summary.orders;
        totals.processing_orders += summary.processing.count;
        totals.processing_sales += summary.processing.sum;
        totals.refunded_orders += summary.refunded.count;
        totals.refund_total += summary.refunded.sum;
    }

    let tolerance = config.tolerance.amount;
    let mut all_matched = true;

    let mut reference_bucket_count = 0;
    let discrepancies = if config.reference.manual.is_empty() {
        Vec::new()
    } else {
        let reference = reference_buckets(&config.reference.manual);
        reference_bucket_count = reference.len();
        let (discrepancies, matched) =
            compare_buckets(&aggregated.buckets, &reference, tolerance);
        all_matched &= matched;
        discrepancies
    };

    let platform = input.platform.as_ref().map(|summary| {
        let (discrepancies, matched) = compare_totals(&totals, summary, tolerance);
        all_matched &= matched;
        PlatformComparison {
            summary: summary.clone(),
            discrepancies,
            all_matched: matched,
        }
    });

    let order_ids = input.reference_order_ids.as_ref().map(|ids| {
        let location_filter = config
            .reference
            .order_ids
            .as_ref()
            .and_then(|c| c.location.as_deref());
        let csv_ids: BTreeSet<String> = records
            .iter()
            .filter(|r| match location_filter {
                Some(loc) => r.location.as_deref() == Some(loc),
                None => true,
            })
            .map(|r| r.order_id.clone())
            .collect();
        let reference_ids: BTreeSet<String> = ids.iter().cloned().collect();
        let report = compare_order_ids(&csv_ids, &reference_ids);
        all_matched &= report.all_matched();
        report
    });

    Ok(ReconReport {
        meta: ReportMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        stats,
        locations,
        totals,
        reference_buckets: reference_bucket_count,
        discrepancies,
        platform,
        order_ids,
        all_matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompareField, PlatformSummary};

    const EXPORT: &str = "\
Order ID,Location,Status,Total Amount,Total (- Refund),Refund Amount
26004,\"2210 Cottman Ave, Philadelphia, PA\",Processing,10.00,10.00,
26014,\"2210 Cottman Ave, Philadelphia, PA\",Processing,20.00,20.00,
26035,\"2210 Cottman Ave, Philadelphia, PA\",Refunded,5.00,-5.00,5.00
26044,\"7 Court St, Binghamton, NY\",Processing,14.89,14.89,
26071,\"7 Court St, Binghamton, NY\",Cancelled,9.99,9.99,
";

    const CONFIG: &str = r#"
name = "Engine Test"

[aliases]
"2210 Cottman Ave, Philadelphia, PA" = "Cottman"
"7 Court St, Binghamton, NY" = "Court St"

[reference.manual."Cottman"]
processing_orders = 2
processing_sales = 30.00
refunded_orders = 1
refund_amount = 5.00

[reference.manual."Court St"]
processing_orders = 1
processing_sales = 14.89
"#;

    fn input(csv: &str) -> ReconInput {
        ReconInput { csv_text: csv.to_string(), ..Default::default() }
    }

    #[test]
    fn full_pipeline_reconciles() {
        let config = ReconConfig::from_toml(CONFIG).unwrap();
        let report = run(&config, &input(EXPORT)).unwrap();

        assert!(report.all_matched);
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.stats.rows_read, 5);
        assert_eq!(report.totals.orders, 5);
        assert_eq!(report.totals.processing_orders, 3);
        assert_eq!(report.totals.refunded_orders, 1);
        assert!((report.totals.processing_sales - 44.89).abs() < 1e-9);
        assert!((report.totals.refund_total - 5.00).abs() < 1e-9);

        let cottman = report
            .locations
            .iter()
            .find(|l| l.location == "Cottman")
            .unwrap();
        assert_eq!(cottman.orders, 3);
        assert_eq!(cottman.processing.count, 2);
        assert_eq!(cottman.refunded.count, 1);

        // Cancelled is counted at the location, never bucketed
        let court = report
            .locations
            .iter()
            .find(|l| l.location == "Court St")
            .unwrap();
        assert_eq!(court.orders, 2);
        assert_eq!(court.status_breakdown["Cancelled"], 1);
    }

    #[test]
    fn reference_drift_is_material() {
        let drifted = CONFIG.replace("processing_sales = 30.00", "processing_sales = 31.00");
        let config = ReconConfig::from_toml(&drifted).unwrap();
        let report = run(&config, &input(EXPORT)).unwrap();

        assert!(!report.all_matched);
        let d = report
            .discrepancies
            .iter()
            .find(|d| d.location == "Cottman" && d.field == CompareField::Sum)
            .unwrap();
        assert!((d.difference - 1.00).abs() < 1e-9);
        assert!(!d.within_tolerance);
    }

    #[test]
    fn platform_totals_participate_in_verdict() {
        let config = ReconConfig::from_toml(CONFIG).unwrap();
        let mut with_platform = input(EXPORT);
        with_platform.platform = Some(PlatformSummary {
            total_sales: 44.89,
            total_orders: 5,
            total_refunds: 5.00,
            ..Default::default()
        });
        let report = run(&config, &with_platform).unwrap();
        assert!(report.all_matched);
        assert!(report.platform.as_ref().unwrap().all_matched);

        with_platform.platform = Some(PlatformSummary {
            total_sales: 40.00,
            total_orders: 5,
            total_refunds: 5.00,
            ..Default::default()
        });
        let report = run(&config, &with_platform).unwrap();
        assert!(!report.all_matched);
        assert!(!report.platform.as_ref().unwrap().all_matched);
        // The per-location comparison itself still matched
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn order_id_sets_filtered_by_location() {
        let config_toml = format!(
            "{CONFIG}\n[reference.order_ids]\nfile = \"ids.txt\"\nlocation = \"Cottman\"\n"
        );
        let config = ReconConfig::from_toml(&config_toml).unwrap();

        let mut with_ids = input(EXPORT);
        with_ids.reference_order_ids =
            Some(vec!["26004".into(), "26014".into(), "26035".into()]);
        let report = run(&config, &with_ids).unwrap();
        let ids = report.order_ids.as_ref().unwrap();
        assert!(ids.all_matched());
        assert_eq!(ids.csv_count, 3); // Court St rows excluded by the filter

        with_ids.reference_order_ids = Some(vec!["26004".into(), "99999".into()]);
        let report = run(&config, &with_ids).unwrap();
        let ids = report.order_ids.as_ref().unwrap();
        assert_eq!(ids.missing_in_csv, vec!["99999"]);
        assert_eq!(ids.extra_in_csv, vec!["26014", "26035"]);
        assert!(!report.all_matched);
    }

    #[test]
    fn unmapped_rows_are_counted_not_silent() {
        let config = ReconConfig::from_toml(CONFIG).unwrap();
        let csv = format!(
            "{EXPORT}26999,\"999 Nowhere St, Erewhon, ZZ\",Processing,3.00,3.00,\n"
        );
        let report = run(&config, &input(&csv)).unwrap();
        assert_eq!(report.stats.unmapped_excluded, 1);
        // The excluded row reaches no bucket
        assert_eq!(report.totals.orders, 5);
    }

    #[test]
    fn summary_mode_without_reference() {
        // Empty alias table + no reference: aggregate raw locations, no
        // comparison sections, trivially matched.
        let config = ReconConfig::from_toml(r#"name = "Summary""#).unwrap();
        let report = run(&config, &input(EXPORT)).unwrap();
        assert!(report.all_matched);
        assert!(report.discrepancies.is_empty());
        assert!(report.platform.is_none());
        assert_eq!(report.locations.len(), 2);
        assert_eq!(
            report.locations[0].location,
            "2210 Cottman Ave, Philadelphia, PA"
        );
    }
}
