use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::crl::RevocationEntry;
use crate::decode::SourceCrl;
use crate::SerialNumber;

/// Merges the revocation entries of `sources` into one list.
///
/// Sources are visited in order, and entries within a source in the order
/// they appear. The first entry seen for a serial number is kept, later
/// entries for the same serial number are dropped. Kept entries are not
/// modified in any way.
pub fn merge(sources: &[SourceCrl]) -> Vec<RevocationEntry> {
	merge_entries(sources.iter().flat_map(|source| source.entries.iter().cloned()))
}

pub(crate) fn merge_entries(
	entries: impl IntoIterator<Item = RevocationEntry>,
) -> Vec<RevocationEntry> {
	let mut merged: Vec<RevocationEntry> = Vec::new();
	let mut seen: HashMap<SerialNumber, usize> = HashMap::new();

	for entry in entries {
		match seen.entry(entry.serial_number.clone()) {
			Entry::Vacant(slot) => {
				slot.insert(merged.len());
				merged.push(entry);
			},
			Entry::Occupied(slot) => {
				let kept = &merged[*slot.get()];
				if kept.revocation_time != entry.revocation_time {
					tracing::warn!(
						serial = %entry.serial_number,
						kept = %kept.revocation_time,
						dropped = %entry.revocation_time,
						"dropping duplicate revocation with a different revocation time"
					);
				} else {
					tracing::debug!(serial = %entry.serial_number, "dropping duplicate revocation");
				}
			},
		}
	}

	merged
}
