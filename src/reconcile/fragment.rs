use log::debug;

use crate::markup::MarkupTree;

pub const CRITICAL_TAGS: [&str; 10] = ["p", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6"];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentationThresholds {
    /// Minimum candidate/reference ratio of all elements.
    pub min_element_ratio: f64,
    /// Minimum candidate/reference ratio of block-structure elements (`CRITICAL_TAGS`).
    pub min_critical_ratio: f64,
}

impl Default for FragmentationThresholds {
    fn default() -> Self {
        Self {
            min_element_ratio: 0.5,
            min_critical_ratio: 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StructureCounts {
    pub elements: usize,
    pub critical: usize,
}

pub fn structure_counts(tree: &MarkupTree) -> StructureCounts {
    let elements = tree.elements();
    let critical = elements
        .iter()
        .filter(|&&id| tree.tag(id).is_some_and(|t| CRITICAL_TAGS.contains(&t)))
        .count();
    StructureCounts {
        elements: elements.len(),
        critical,
    }
}

/// Coarse structural-loss check: true when the candidate kept too few elements of the
/// reference to be repaired in place.
pub fn is_fragmented(
    reference: &MarkupTree,
    candidate: &MarkupTree,
    thresholds: &FragmentationThresholds,
) -> bool {
    let original = structure_counts(reference);
    if original.elements == 0 {
        return false;
    }
    let translated = structure_counts(candidate);
    if translated.elements == 0 {
        debug!("fragmented: candidate has no elements (reference has {})", original.elements);
        return true;
    }

    let element_ratio = translated.elements as f64 / original.elements as f64;
    if element_ratio < thresholds.min_element_ratio {
        debug!(
            "fragmented: elements {}/{} ({element_ratio:.2})",
            translated.elements, original.elements
        );
        return true;
    }

    if original.critical > 0 {
        let critical_ratio = translated.critical as f64 / original.critical as f64;
        if critical_ratio < thresholds.min_critical_ratio {
            debug!(
                "fragmented: critical elements {}/{} ({critical_ratio:.2})",
                translated.critical, original.critical
            );
            return true;
        }
    }
    false
}
