//! Text rendering of a `ReconReport`.
//!
//! Stdout gets the human report; stderr gets a short countable summary the
//! way `diff`-style tools do, so scripts can keep stdout clean.

use std::io::{self, Write};

use ordrec_recon::model::{CompareField, Discrepancy, LocationSummary, ReconReport};

pub fn render(report: &ReconReport, w: &mut impl Write) -> io::Result<()> {
    writeln!(w, "=== {} ===", report.meta.config_name)?;
    writeln!(
        w,
        "run at {} (engine {})",
        report.meta.run_at, report.meta.engine_version
    )?;
    writeln!(w)?;

    render_locations(&report.locations, w)?;
    render_totals(report, w)?;

    if report.reference_buckets > 0 {
        writeln!(w, "-- reference comparison --")?;
        if report.discrepancies.is_empty() {
            writeln!(w, "all buckets match")?;
        } else {
            for d in &report.discrepancies {
                writeln!(w, "{}", format_discrepancy(d))?;
            }
        }
        writeln!(w)?;
    }

    if let Some(ref platform) = report.platform {
        writeln!(w, "-- platform comparison --")?;
        let s = &platform.summary;
        writeln!(w, "platform sales:   ${:.2}", s.total_sales)?;
        writeln!(w, "platform orders:  {}", s.total_orders)?;
        writeln!(w, "platform refunds: ${:.2}", s.total_refunds)?;
        writeln!(
            w,
            "fees: platform ${:.2}, stripe ${:.2}, net deposit ${:.2}",
            s.platform_fees, s.stripe_fees, s.net_deposit
        )?;
        if platform.discrepancies.is_empty() {
            writeln!(w, "totals match")?;
        } else {
            for d in &platform.discrepancies {
                writeln!(
                    w,
                    "{}: csv {:.2} | platform {:.2} | diff {:.2}{}",
                    d.field,
                    d.computed,
                    d.reference,
                    d.difference,
                    if d.within_tolerance { " (within tolerance)" } else { "" }
                )?;
            }
        }
        writeln!(w)?;
    }

    if let Some(ref ids) = report.order_ids {
        writeln!(w, "-- order IDs --")?;
        writeln!(w, "csv: {} | reference: {}", ids.csv_count, ids.reference_count)?;
        if ids.all_matched() {
            writeln!(w, "sets match")?;
        } else {
            if !ids.missing_in_csv.is_empty() {
                writeln!(w, "in reference but not CSV: {}", ids.missing_in_csv.join(", "))?;
            }
            if !ids.extra_in_csv.is_empty() {
                writeln!(w, "in CSV but not reference: {}", ids.extra_in_csv.join(", "))?;
            }
        }
        writeln!(w)?;
    }

    let verdict = if report.all_matched { "RECONCILED" } else { "DISCREPANCIES FOUND" };
    writeln!(w, "verdict: {verdict}")?;
    Ok(())
}

/// Per-location aggregates and grand totals only — the `summary` command.
pub fn render_summary(report: &ReconReport, w: &mut impl Write) -> io::Result<()> {
    render_locations(&report.locations, w)?;
    render_totals(report, w)
}

fn render_locations(locations: &[LocationSummary], w: &mut impl Write) -> io::Result<()> {
    for loc in locations {
        writeln!(w, "-- {} --", loc.location)?;
        writeln!(w, "orders: {}", loc.orders)?;
        writeln!(
            w,
            "processing: {} orders, ${:.2}",
            loc.processing.count, loc.processing.sum
        )?;
        writeln!(
            w,
            "refunded:   {} orders, ${:.2}",
            loc.refunded.count, loc.refunded.sum
        )?;
        let breakdown: Vec<String> = loc
            .status_breakdown
            .iter()
            .map(|(status, count)| format!("{status}: {count}"))
            .collect();
        writeln!(w, "statuses: {}", breakdown.join(", "))?;
        writeln!(w)?;
    }
    Ok(())
}

fn render_totals(report: &ReconReport, w: &mut impl Write) -> io::Result<()> {
    let t = &report.totals;
    writeln!(w, "-- totals --")?;
    writeln!(w, "orders: {}", t.orders)?;
    writeln!(w, "processing: {} orders, ${:.2}", t.processing_orders, t.processing_sales)?;
    writeln!(w, "refunded:   {} orders, ${:.2}", t.refunded_orders, t.refund_total)?;
    writeln!(w)?;
    Ok(())
}

fn format_discrepancy(d: &Discrepancy) -> String {
    match d.field {
        CompareField::Count => format!(
            "{} {} count: csv {} | reference {} | diff {}",
            d.location, d.class, d.computed as usize, d.reference as usize, d.difference as usize
        ),
        CompareField::Sum => format!(
            "{} {} sum: csv ${:.2} | reference ${:.2} | diff ${:.2}{}",
            d.location,
            d.class,
            d.computed,
            d.reference,
            d.difference,
            if d.within_tolerance { " (within tolerance)" } else { "" }
        ),
    }
}

/// One-line-per-fact summary to stderr (suppressed by --quiet).
pub fn stderr_summary(report: &ReconReport) {
    let s = &report.stats;
    eprintln!("rows: {}", s.rows_read);
    if s.missing_location_dropped > 0 {
        eprintln!("dropped (missing location): {}", s.missing_location_dropped);
    }
    if s.unmapped_excluded > 0 {
        eprintln!("warning: {} row(s) excluded by the alias table", s.unmapped_excluded);
    }
    if s.coerce_failures > 0 {
        eprintln!("warning: {} numeric cell(s) failed coercion", s.coerce_failures);
    }
    if s.unsummed > 0 {
        eprintln!("warning: {} bucketed row(s) had no usable amount", s.unsummed);
    }
    eprintln!("locations: {}", report.locations.len());
    let material = report
        .discrepancies
        .iter()
        .filter(|d| !d.within_tolerance)
        .count();
    eprintln!(
        "discrepancies: {} ({} material)",
        report.discrepancies.len(),
        material
    );
}
