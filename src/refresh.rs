//! Batch re-cleaning of stored translations and slug normalization over a [`ContentStore`].

use std::collections::BTreeSet;

use anyhow::anyhow;
use log::{debug, info, warn};

use crate::content::{ContentItem, ContentStore};
use crate::lookup::build_address_lookup;
use crate::markup::{parse_markup, skeleton_digest};
use crate::progress::ConsoleProgress;
use crate::reconcile::{ReconcileOptions, Reconciler};
use crate::slug::slugify;

#[derive(Clone, Debug, Default)]
pub struct RefreshOptions {
    /// Only this language; otherwise every configured language except the default.
    pub language: Option<String>,
    /// Only these items; empty means all.
    pub item_ids: Vec<u64>,
    pub dry_run: bool,
    pub default_language: String,
    /// Configured languages. Empty means "whatever the store contains".
    pub languages: Vec<String>,
    pub reconcile: ReconcileOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LanguageRefresh {
    pub language: String,
    pub updated: usize,
    /// Bodies that had to be rebuilt from the reference skeleton.
    pub restored: usize,
    /// Cleaned bodies whose element skeleton still differs from the reference.
    pub skeleton_mismatches: usize,
    pub changed_items: Vec<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub languages: Vec<LanguageRefresh>,
    pub total_updates: usize,
    pub dry_run: bool,
}

fn target_languages(store: &ContentStore, opts: &RefreshOptions) -> anyhow::Result<Vec<String>> {
    let configured: BTreeSet<String> = if opts.languages.is_empty() {
        store.languages()
    } else {
        opts.languages.iter().cloned().collect()
    };
    if let Some(lang) = opts.language.as_deref() {
        if !configured.contains(lang) {
            return Err(anyhow!(
                "language {lang} is not configured (known: {})",
                configured.iter().cloned().collect::<Vec<_>>().join(", ")
            ));
        }
        return Ok(vec![lang.to_string()]);
    }
    Ok(configured
        .into_iter()
        .filter(|l| *l != opts.default_language)
        .collect())
}

/// Re-runs reconciliation over every stored translated body and writes back the ones
/// that change, unless `dry_run`.
pub fn refresh_translations(
    store: &mut ContentStore,
    opts: &RefreshOptions,
    progress: &ConsoleProgress,
) -> anyhow::Result<RefreshSummary> {
    let languages = target_languages(store, opts)?;
    let ids: BTreeSet<u64> = opts.item_ids.iter().copied().collect();
    let selected: Vec<usize> = store
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| ids.is_empty() || ids.contains(&item.id))
        .map(|(i, _)| i)
        .collect();

    let mut summary = RefreshSummary {
        dry_run: opts.dry_run,
        ..RefreshSummary::default()
    };
    if selected.is_empty() {
        progress.warn("no items match the requested ids");
        warn!("refresh: no items selected (ids={:?})", opts.item_ids);
        return Ok(summary);
    }

    let reconciler = Reconciler::new(opts.reconcile);
    for language in languages {
        let lookup = build_address_lookup(selected.iter().map(|&i| &store.items[i]), &language);
        debug!("refresh {language}: {} address mappings", lookup.len());

        let mut report = LanguageRefresh {
            language: language.clone(),
            ..LanguageRefresh::default()
        };
        let label = format!("refresh {language}");
        for (n, &idx) in selected.iter().enumerate() {
            progress.progress(&label, n + 1, selected.len());
            let item = &store.items[idx];
            let Some(translated) = translated_body(item, &language) else {
                continue;
            };
            let reconciled = reconciler.run(item.body.as_deref(), Some(translated), &lookup);
            if reconciled.markup.trim() == translated.trim() {
                continue;
            }

            if reconciled.restored {
                report.restored += 1;
            }
            let reference_digest = skeleton_digest(&parse_markup(item.body.as_deref()));
            if skeleton_digest(&parse_markup(Some(reconciled.markup.as_str()))) != reference_digest {
                report.skeleton_mismatches += 1;
                debug!("item {} ({language}): skeleton differs from source", item.id);
            }
            report.updated += 1;
            report.changed_items.push(item.id);
            progress.info(change_line(item.id, &language, opts.dry_run));

            if !opts.dry_run {
                if let Some(fields) = store.items[idx].translations.get_mut(&language) {
                    fields.body = Some(reconciled.markup);
                }
            }
        }

        info!(
            "{language}: {} updated, {} restored, {} skeleton mismatches",
            report.updated, report.restored, report.skeleton_mismatches
        );
        progress.info(format!(
            "{language}: {} {} translation(s)",
            if opts.dry_run { "would update" } else { "updated" },
            report.updated
        ));
        summary.total_updates += report.updated;
        summary.languages.push(report);
    }
    Ok(summary)
}

fn change_line(item_id: u64, language: &str, dry_run: bool) -> String {
    if dry_run {
        format!("[dry run] item {item_id} ({language}): body would be cleaned")
    } else {
        format!("item {item_id} ({language}): body cleaned")
    }
}

fn translated_body<'a>(item: &'a ContentItem, language: &str) -> Option<&'a str> {
    item.translations
        .get(language)
        .and_then(|t| t.body.as_deref())
        .filter(|b| !b.trim().is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlugChange {
    pub item_id: u64,
    pub language: String,
    pub old: String,
    pub new: String,
}

/// Rewrites translated addresses into their unicode slug form. Values that slugify to
/// nothing are left alone.
pub fn normalize_slugs(
    store: &mut ContentStore,
    language: Option<&str>,
    dry_run: bool,
) -> Vec<SlugChange> {
    let mut changes = Vec::new();
    for item in &mut store.items {
        for (lang, fields) in item.translations.iter_mut() {
            if language.is_some_and(|l| l != lang.as_str()) {
                continue;
            }
            let Some(old) = fields.address.as_deref() else {
                continue;
            };
            let new = slugify(old, true);
            if new.is_empty() || new == old {
                continue;
            }
            changes.push(SlugChange {
                item_id: item.id,
                language: lang.clone(),
                old: old.to_string(),
                new: new.clone(),
            });
            if !dry_run {
                fields.address = Some(new);
            }
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::{change_line, normalize_slugs, refresh_translations, RefreshOptions};
    use crate::content::ContentStore;
    use crate::progress::ConsoleProgress;

    fn store() -> ContentStore {
        serde_json::from_str(
            r#"{
            "default_language": "en",
            "items": [
                {"id": 1, "canonical_address": "old-slug",
                 "body": "<p>See <a href=\"/blog/old-slug/\">this</a></p>",
                 "translations": {
                    "fr": {"address": "Nouveau Slug", "body": "<div><p>Voir <a href=\"/blog/old-slug/\">ceci</a></p></div>"},
                    "de": {"address": "neuer-slug", "body": "<p>Siehe <a href=\"/blog/neuer-slug/\">das</a></p>"}
                 }},
                {"id": 2, "canonical_address": "second",
                 "body": "<p>A</p><p>B</p><p>C</p>",
                 "translations": {
                    "fr": {"body": "Une. Deux. Trois."},
                    "en": {"body": "<div>ignored</div>"}
                 }}
            ]
        }"#,
        )
        .expect("parse store")
    }

    fn options() -> RefreshOptions {
        RefreshOptions {
            default_language: "en".to_string(),
            languages: vec!["en".to_string(), "fr".to_string(), "de".to_string()],
            ..RefreshOptions::default()
        }
    }

    fn fr_body(store: &ContentStore, idx: usize) -> &str {
        store.items[idx].translations["fr"].body.as_deref().unwrap_or_default()
    }

    #[test]
    fn refreshes_configured_languages_except_default() {
        let mut store = store();
        let summary =
            refresh_translations(&mut store, &options(), &ConsoleProgress::quiet()).expect("refresh");
        let langs: Vec<_> = summary.languages.iter().map(|l| l.language.as_str()).collect();
        assert_eq!(langs, vec!["de", "fr"]);

        let de = &summary.languages[0];
        assert_eq!(de.updated, 0);
        let fr = &summary.languages[1];
        assert_eq!(fr.updated, 2);
        assert_eq!(fr.restored, 1);
        assert_eq!(fr.changed_items, vec![1, 2]);
        assert_eq!(summary.total_updates, 2);

        assert_eq!(
            fr_body(&store, 0),
            r#"<p>Voir <a href="/blog/nouveau-slug/">ceci</a></p>"#
        );
        assert_eq!(fr_body(&store, 1), "<p>Une.</p><p>Deux.</p><p>Trois.</p>");
        assert_eq!(
            store.items[1].translations["en"].body.as_deref(),
            Some("<div>ignored</div>")
        );
    }

    #[test]
    fn dry_run_and_item_filter_leave_store_untouched() {
        let mut store = store();
        let opts = RefreshOptions {
            language: Some("fr".to_string()),
            item_ids: vec![2],
            dry_run: true,
            ..options()
        };
        let summary =
            refresh_translations(&mut store, &opts, &ConsoleProgress::quiet()).expect("refresh");
        assert!(summary.dry_run);
        assert_eq!(summary.total_updates, 1);
        assert_eq!(summary.languages[0].changed_items, vec![2]);
        assert_eq!(fr_body(&store, 1), "Une. Deux. Trois.");

        let opts = RefreshOptions {
            item_ids: vec![99],
            ..options()
        };
        let summary =
            refresh_translations(&mut store, &opts, &ConsoleProgress::quiet()).expect("refresh");
        assert_eq!(summary.total_updates, 0);
        assert!(summary.languages.is_empty());
    }

    #[test]
    fn second_refresh_finds_nothing_to_clean() {
        let mut store: ContentStore = serde_json::from_str(
            r#"{"items": [{"id": 7, "body": "<ul><li><p>a</p><ul><li>b</li></ul></li></ul>",
                "translations": {"fr": {"body": "<ul><li>1<ul><li>2</li></ul></li></ul>"}}}]}"#,
        )
        .expect("parse store");
        let first =
            refresh_translations(&mut store, &options(), &ConsoleProgress::quiet()).expect("refresh");
        assert_eq!(first.total_updates, 1);
        assert_eq!(fr_body(&store, 0), "<ul><li><p>1</p><ul><li>2</li></ul></li></ul>");
        let second =
            refresh_translations(&mut store, &options(), &ConsoleProgress::quiet()).expect("refresh");
        assert_eq!(second.total_updates, 0);
    }

    #[test]
    fn change_lines_mark_dry_runs() {
        assert_eq!(change_line(3, "fr", true), "[dry run] item 3 (fr): body would be cleaned");
        assert_eq!(change_line(3, "fr", false), "item 3 (fr): body cleaned");
    }

    #[test]
    fn rejects_unconfigured_language() {
        let mut store = store();
        let opts = RefreshOptions {
            language: Some("it".to_string()),
            ..options()
        };
        assert!(refresh_translations(&mut store, &opts, &ConsoleProgress::quiet()).is_err());
    }

    #[test]
    fn normalizes_translated_addresses() {
        let mut store = store();
        let preview = normalize_slugs(&mut store, None, true);
        assert_eq!(preview.len(), 1);
        assert_eq!(preview[0].new, "nouveau-slug");
        assert_eq!(
            store.items[0].translations["fr"].address.as_deref(),
            Some("Nouveau Slug")
        );

        assert!(normalize_slugs(&mut store, Some("de"), false).is_empty());
        let applied = normalize_slugs(&mut store, Some("fr"), false);
        assert_eq!(applied.len(), 1);
        assert_eq!(
            store.items[0].translations["fr"].address.as_deref(),
            Some("nouveau-slug")
        );
    }
}
