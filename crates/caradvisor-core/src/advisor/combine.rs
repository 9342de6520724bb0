//! Merging of manual and extracted filters.

use caradvisor_types::filter::FilterSet;

/// Merge extracted filters into the manual ones.
///
/// Manual filters always win: for any attribute present in both sets, the
/// manual constraint is kept whole and the extracted one is discarded.
pub fn combine_filters(manual: &FilterSet, extracted: &FilterSet) -> FilterSet {
    let mut combined = manual.clone();
    for (attribute, constraint) in extracted.iter() {
        if !combined.contains(attribute) {
            combined.insert(attribute, constraint.clone());
        }
    }
    combined
}
