use std::collections::BTreeMap;

use crate::config::UnmappedPolicy;
use crate::model::{OrderRecord, UNKNOWN_LOCATION};

/// Rewrite each record's location to its canonical form.
///
/// Unmapped raw locations are excluded or bucketed per policy; the excluded
/// count is returned so callers can surface it. An empty alias table means
/// identity: records pass through on their raw locations untouched.
pub fn normalize(
    records: Vec<OrderRecord>,
    aliases: &BTreeMap<String, String>,
    policy: UnmappedPolicy,
) -> (Vec<OrderRecord>, usize) {
    if aliases.is_empty() {
        return (records, 0);
    }

    let mut excluded = 0;
    let mut out = Vec::with_capacity(records.len());

    for mut record in records {
        let canonical = record
            .location
            .as_deref()
            .and_then(|raw| aliases.get(raw))
            .cloned();

        match canonical {
            Some(loc) => {
                record.location = Some(loc);
                out.push(record);
            }
            None => match policy {
                UnmappedPolicy::Exclude => excluded += 1,
                UnmappedPolicy::Unknown => {
                    record.location = Some(UNKNOWN_LOCATION.to_string());
                    out.push(record);
                }
            },
        }
    }

    (out, excluded)
}
