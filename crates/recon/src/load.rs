use crate::config::MissingLocationPolicy;
use crate::error::ReconError;
use crate::model::{OrderRecord, UNKNOWN_LOCATION};

/// Column names fixed by export convention.
pub const COL_ORDER_ID: &str = "Order ID";
pub const COL_LOCATION: &str = "Location";
pub const COL_STATUS: &str = "Status";
pub const COL_TOTAL: &str = "Total Amount";
pub const COL_NET: &str = "Total (- Refund)";
pub const COL_REFUND: &str = "Refund Amount";

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadStats {
    pub rows_read: usize,
    pub missing_location_dropped: usize,
    pub coerce_failures: usize,
}

/// Parse the order export. Numeric coercion failures map to `None` and are
/// counted; they never abort the load.
pub fn load_orders(
    csv_text: &str,
    policy: MissingLocationPolicy,
) -> Result<(Vec<OrderRecord>, LoadStats), ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReconError::MissingColumn { column: name.into() })
    };

    let order_id_idx = idx(COL_ORDER_ID)?;
    let location_idx = idx(COL_LOCATION)?;
    let status_idx = idx(COL_STATUS)?;
    let total_idx = idx(COL_TOTAL)?;
    let net_idx = idx(COL_NET)?;
    let refund_idx = idx(COL_REFUND)?;

    let mut stats = LoadStats::default();
    let mut records = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Csv(e.to_string()))?;
        stats.rows_read += 1;

        let location = match record.get(location_idx).map(str::trim) {
            Some(loc) if !loc.is_empty() => Some(loc.to_string()),
            _ => match policy {
                MissingLocationPolicy::Drop => {
                    stats.missing_location_dropped += 1;
                    continue;
                }
                MissingLocationPolicy::Unknown => Some(UNKNOWN_LOCATION.to_string()),
            },
        };

        let total = coerce(record.get(total_idx), &mut stats);
        let net = coerce(record.get(net_idx), &mut stats);
        // Refund Amount: empty reads as zero, like the source exports.
        let refund = coerce(record.get(refund_idx), &mut stats).or(Some(0.0));

        records.push(OrderRecord {
            order_id: record.get(order_id_idx).unwrap_or("").trim().to_string(),
            location,
            status: record.get(status_idx).unwrap_or("").trim().to_string(),
            total,
            net,
            refund,
        });
    }

    Ok((records, stats))
}

/// Numeric coercion: empty → `None` (not a failure), unparseable → `None`
/// (counted as a failure).
fn coerce(cell: Option<&str>, stats: &mut LoadStats) -> Option<f64> {
    let raw = cell.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            stats.coerce_failures += 1;
            None
        }
    }
}
