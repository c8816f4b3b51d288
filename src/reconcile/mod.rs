//! Structural reconciliation of machine-translated markup against its source markup.

mod fragment;
mod links;
mod lists;
mod restore;
mod tags;

pub use fragment::{is_fragmented, structure_counts, FragmentationThresholds, StructureCounts};
pub use links::{localize_path, rewrite_href, rewrite_internal_links, split_href, HrefParts};
pub use lists::{align_lists, LIST_TAGS};
pub use restore::restore_structure;
pub use tags::{
    allowed_tags, allowed_tags_from_markup, remove_disallowed_tags, strip_line_breaks,
    TagAllowList,
};

use log::debug;

use crate::lookup::AddressLookup;
use crate::markup::{parse_markup, serialize_fragment, MarkupTree, NodeKind};

pub const DEFAULT_MAX_UNWRAP_PASSES: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconcileOptions {
    pub thresholds: FragmentationThresholds,
    pub max_unwrap_passes: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            thresholds: FragmentationThresholds::default(),
            max_unwrap_passes: DEFAULT_MAX_UNWRAP_PASSES,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub markup: String,
    /// The candidate was rebuilt from the reference skeleton.
    pub restored: bool,
    pub unwrapped_tags: usize,
    pub removed_breaks: usize,
    pub rewritten_links: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Cleans `candidate` so it follows the structure of `reference`, then localizes its
    /// internal links. Missing markup is treated as an empty fragment; this never fails.
    pub fn run(
        &self,
        reference: Option<&str>,
        candidate: Option<&str>,
        lookup: &AddressLookup,
    ) -> Reconciled {
        let reference_tree = parse_markup(reference);
        let allowed = allowed_tags(&reference_tree);
        let mut candidate_tree = parse_markup(candidate);

        let unwrapped_tags =
            remove_disallowed_tags(&mut candidate_tree, &allowed, self.options.max_unwrap_passes);
        let removed_breaks = strip_line_breaks(&mut candidate_tree, &allowed);
        align_lists(&reference_tree, &mut candidate_tree);

        let mut restored = false;
        if is_fragmented(&reference_tree, &candidate_tree, &self.options.thresholds) {
            candidate_tree = restore_structure(&reference_tree, &candidate_tree);
            restored = true;
        }

        let mut rewritten_links = rewrite_internal_links(&mut candidate_tree, lookup);
        let mut markup = finish(&mut candidate_tree);

        if markup.is_empty() && !serialize_fragment(&reference_tree).trim().is_empty() {
            debug!("candidate reconciled to nothing; falling back to reference markup");
            let mut fallback = reference_tree.clone();
            rewritten_links = rewrite_internal_links(&mut fallback, lookup);
            markup = finish(&mut fallback);
            restored = true;
        }

        Reconciled {
            markup,
            restored,
            unwrapped_tags,
            removed_breaks,
            rewritten_links,
        }
    }
}

fn finish(tree: &mut MarkupTree) -> String {
    strip_blank_top_level_text(tree);
    serialize_fragment(tree).trim().to_string()
}

fn strip_blank_top_level_text(tree: &mut MarkupTree) {
    let blank: Vec<_> = tree
        .children(tree.root())
        .iter()
        .copied()
        .filter(|&c| matches!(tree.kind(c), NodeKind::Text(t) if t.trim().is_empty()))
        .collect();
    for id in blank {
        tree.delete_node(id);
    }
}

/// `reconcile(reference, candidate, lookup)` with default options.
pub fn reconcile(reference: &str, candidate: &str, lookup: &AddressLookup) -> String {
    Reconciler::default()
        .run(Some(reference), Some(candidate), lookup)
        .markup
}
