//! Driver (spec §4.9): orchestrates file scanning, parsing, walking, and
//! reconciliation across one engine run and reports whether any output file
//! changed.
//!
//! Parallelism follows spec §5's conservative recommendation: file reads and
//! `onLoad` plugin transforms run sequentially (the plugin host needs
//! exclusive access for those hooks), parsing runs in parallel per file
//! (grounded on `core/context.rs`'s `rayon` `par_iter().collect()` pattern),
//! and the AST walk — which owns per-file scope/symbol state — runs
//! sequentially, merging every file's keys into one shared collector.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;

use crate::config::{Config, ExtractConfig, OutputFormat, NAMESPACE_NONE};
use crate::engine::collector::{ExtractedKey, KeyCollector, Namespace};
use crate::engine::comment_scanner::{scan_comments_for_keys, CommentKeyHit};
use crate::engine::error::EngineError;
use crate::engine::file_scanner::scan_files;
use crate::engine::namespace::{group_for_reconciliation, merge_namespace_key, split_namespace_prefix};
use crate::engine::parser::parse_file;
use crate::engine::plugin::{Logger, Plugin, PluginHost, PluginProvider};
use crate::engine::reconciler::{reconcile, ReconcileInput};
use crate::engine::tree::{canonical_json, expand_path_template, serialize_output, write_json5_in_place, TranslationTree};
use crate::engine::value_source::ExternalStringProvider;
use crate::engine::walker::walk_module;

/// One reconciled output file's outcome (spec §3 "TranslationResult", narrowed
/// to what the driver needs to report back to a caller).
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub locale: String,
    pub namespace: String,
    pub updated: bool,
}

/// The whole run's outcome (spec §4.9 "Return a boolean `anyFileUpdated`").
#[derive(Debug)]
pub struct DriverOutput {
    pub any_file_updated: bool,
    pub files: Vec<FileResult>,
    pub keys_extracted: usize,
    pub source_files_scanned: usize,
}

/// Run-level options that sit outside the persisted configuration schema.
pub struct DriverOptions<'a> {
    pub root: &'a Path,
    pub dry_run: bool,
    pub plugins: Vec<Box<dyn Plugin>>,
    pub logger: &'a dyn Logger,
}

impl<'a> DriverOptions<'a> {
    pub fn new(root: &'a Path, logger: &'a dyn Logger) -> Self {
        Self {
            root,
            dry_run: false,
            plugins: Vec::new(),
            logger,
        }
    }
}

/// Run the full pipeline once (spec §4.9). Returns `Err` for configuration
/// errors or an unrecoverable file-processing failure; everything else
/// (malformed existing translation files, plugin panics) degrades per §7
/// and is only logged.
pub fn run(config: &Config, options: DriverOptions) -> Result<DriverOutput, EngineError> {
    config
        .validate()
        .map_err(|e| EngineError::configuration("config", e.to_string()))?;

    let files = scan_files(&config.extract.input, &config.extract.ignore)
        .map_err(|e| EngineError::configuration("extract.input", e.to_string()))?;

    let mut plugin_host = PluginHost::new(options.plugins);
    plugin_host.setup_all(options.logger);

    // Sequential: read + onLoad transform (the plugin host needs &mut self).
    let mut sources = Vec::with_capacity(files.len());
    for path in &files {
        let raw = fs::read_to_string(path).map_err(EngineError::from)?;
        let code = plugin_host.on_load_all(raw, path, options.logger);
        sources.push((path.clone(), code));
    }

    // Parallel: parsing is pure per-file work.
    let parsed: Vec<Result<(PathBuf, crate::engine::parser::ParsedFile), EngineError>> = sources
        .into_par_iter()
        .map(|(path, code)| {
            parse_file(code, &path.to_string_lossy())
                .map(|parsed_file| (path.clone(), parsed_file))
                .map_err(|e| EngineError::file_processing(path.display().to_string(), e))
        })
        .collect();

    // Sequential: walking owns per-file scope/symbol state and drives the
    // (possibly non-reentrant) plugin key/context hooks through a shared ref.
    let mut collector = KeyCollector::new(config.extract.default_ns.clone());
    for result in parsed {
        let (_path, parsed_file) = result?;

        let provider: Box<dyn ExternalStringProvider> = Box::new(PluginProvider {
            host: &plugin_host,
            config: &config.extract,
            logger: options.logger,
        });
        let providers = [provider];

        let keys = walk_module(
            &parsed_file.module,
            &parsed_file.source_map,
            &config.extract,
            &providers,
        );
        for key in keys {
            collector.insert(key);
        }

        for hit in scan_comments_for_keys(&parsed_file.raw_source) {
            collector.insert(comment_hit_to_key(hit, &config.extract));
        }
    }

    plugin_host.on_end_all(&collector, options.logger);

    let keys_extracted = collector.len();
    let known_namespaces = discover_known_namespaces_all_locales(config);
    let grouped = group_for_reconciliation(&collector, &known_namespaces);

    let file_results = if config.extract.merge_namespaces {
        reconcile_merged(config, &grouped, &options)
    } else {
        reconcile_split(config, &grouped, &options)
    };

    plugin_host.after_sync_all(&file_results_to_outputs(&file_results), &config.extract, options.logger);

    let any_file_updated = file_results.iter().any(|r| r.updated);
    Ok(DriverOutput {
        any_file_updated,
        files: file_results,
        keys_extracted,
        source_files_scanned: files.len(),
    })
}

fn comment_hit_to_key(hit: CommentKeyHit, config: &ExtractConfig) -> ExtractedKey {
    let (prefix_ns, bare_key) = split_namespace_prefix(&hit.key, config.ns_separator.as_deref());
    let namespace = match hit.namespace.or_else(|| prefix_ns.map(str::to_string)) {
        Some(ns) => Namespace::Explicit(ns),
        None => Namespace::Implicit,
    };
    ExtractedKey {
        key: bare_key.to_string(),
        namespace,
        default_value: hit.default_value,
        explicit_default: false,
        has_count: false,
        is_ordinal: false,
        return_objects: false,
        context_expression: None,
    }
}

fn file_results_to_outputs(results: &[FileResult]) -> Vec<crate::engine::reconciler::ReconcileOutput> {
    // `afterSync` only needs per-file `updated` status per spec §6's plugin
    // interface contract; the tree itself isn't meaningful to reconstruct
    // here since split/merged modes already wrote it to disk.
    results
        .iter()
        .map(|r| crate::engine::reconciler::ReconcileOutput {
            tree: TranslationTree::new(),
            updated: r.updated,
        })
        .collect()
}

fn load_existing_tree(path: &Path, format: OutputFormat, logger: &dyn Logger) -> (TranslationTree, Option<String>) {
    let Ok(raw) = fs::read_to_string(path) else {
        return (TranslationTree::new(), None);
    };
    let parsed: Result<Value, String> = match format {
        OutputFormat::Json5 => json5::from_str(&raw).map_err(|e| e.to_string()),
        _ => serde_json::from_str(&raw).map_err(|e| e.to_string()),
    };
    match parsed {
        Ok(Value::Object(obj)) => (obj, Some(raw)),
        _ => {
            logger.warn(&format!(
                "{}: existing translation file is not a valid JSON object; treating as empty",
                path.display()
            ));
            (TranslationTree::new(), Some(raw))
        }
    }
}

fn serialize_tree(tree: &TranslationTree, existing_raw: Option<&str>, config: &ExtractConfig) -> String {
    if config.output_format == OutputFormat::Json5 {
        if let Some(raw) = existing_raw {
            if let Ok(updated) = write_json5_in_place(raw, tree) {
                return updated;
            }
        }
    }
    serialize_output(tree, config.output_format, config.indentation)
}

fn write_tree(path: &Path, content: &str) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(EngineError::from)?;
    }
    fs::write(path, content).map_err(EngineError::from)
}

fn object_keys_for(ns_keys: &[&ExtractedKey]) -> HashSet<String> {
    ns_keys
        .iter()
        .filter(|k| k.return_objects)
        .map(|k| k.key.clone())
        .collect()
}

fn reconcile_split(
    config: &Config,
    grouped: &std::collections::HashMap<String, Vec<&ExtractedKey>>,
    options: &DriverOptions,
) -> Vec<FileResult> {
    let primary_language = config.primary_language();
    let mut results = Vec::new();

    for locale in &config.locales {
        for (namespace, ns_keys) in grouped {
            let path_namespace: Option<&str> = if namespace.is_empty() { None } else { Some(namespace.as_str()) };
            let output_path_str = expand_path_template(&config.extract.output, locale, path_namespace);
            let output_path = options.root.join(&output_path_str);

            let (existing_tree, existing_raw) =
                load_existing_tree(&output_path, config.extract.output_format, options.logger);
            let object_keys = object_keys_for(ns_keys);
            let owned_keys: Vec<ExtractedKey> = ns_keys.iter().map(|k| (**k).clone()).collect();

            let input = ReconcileInput {
                ns_keys: &owned_keys,
                existing: &existing_tree,
                locale,
                namespace,
                primary_language: &primary_language,
                config: &config.extract,
                object_keys: &object_keys,
            };
            let output = reconcile(&input);

            if output.updated && !options.dry_run {
                let content = serialize_tree(&output.tree, existing_raw.as_deref(), &config.extract);
                if let Err(e) = write_tree(&output_path, &content) {
                    options.logger.warn(&format!("{}: {}", output_path.display(), e));
                }
            }

            results.push(FileResult {
                path: output_path,
                locale: locale.clone(),
                namespace: namespace.clone(),
                updated: output.updated,
            });
        }
    }

    results
}

fn reconcile_merged(
    config: &Config,
    grouped: &std::collections::HashMap<String, Vec<&ExtractedKey>>,
    options: &DriverOptions,
) -> Vec<FileResult> {
    let primary_language = config.primary_language();
    let mut results = Vec::new();

    for locale in &config.locales {
        let output_path_str = expand_path_template(&config.extract.output, locale, None);
        let output_path = options.root.join(&output_path_str);
        let (existing_full, existing_raw) =
            load_existing_tree(&output_path, config.extract.output_format, options.logger);

        let mut combined: TranslationTree = TranslationTree::new();
        let mut any_namespace_updated = false;

        let mut namespaces: Vec<&String> = grouped.keys().collect();
        namespaces.sort();
        for namespace in namespaces {
            let ns_keys = &grouped[namespace];
            let is_default = namespace.is_empty() || namespace == &config.extract.default_ns || namespace.as_str() == NAMESPACE_NONE;

            let existing_subtree = if is_default {
                // The default namespace's existing keys live at the file's
                // top level alongside every other namespace's own subtree
                // (keyed by namespace name); strip those out so they aren't
                // mistaken for stale default-namespace keys and don't get
                // written back over the other namespaces' freshly-reconciled
                // output below.
                let mut filtered = existing_full.clone();
                for other_ns in grouped.keys() {
                    let other_is_default = other_ns.is_empty()
                        || other_ns == &config.extract.default_ns
                        || other_ns.as_str() == NAMESPACE_NONE;
                    if !other_is_default {
                        filtered.remove(other_ns.as_str());
                    }
                }
                filtered
            } else {
                existing_full
                    .get(namespace.as_str())
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default()
            };

            let object_keys = object_keys_for(ns_keys);
            let owned_keys: Vec<ExtractedKey> = ns_keys.iter().map(|k| (**k).clone()).collect();
            let input = ReconcileInput {
                ns_keys: &owned_keys,
                existing: &existing_subtree,
                locale,
                namespace,
                primary_language: &primary_language,
                config: &config.extract,
                object_keys: &object_keys,
            };
            let output = reconcile(&input);
            any_namespace_updated |= output.updated;

            if is_default {
                for (key, value) in output.tree {
                    combined.insert(merge_namespace_key(namespace, &key, &config.extract.default_ns), value);
                }
            } else {
                combined.insert(namespace.clone(), Value::Object(output.tree));
            }
        }

        let updated = any_namespace_updated
            || canonical_json(&combined, config.extract.indentation)
                != canonical_json(&existing_full, config.extract.indentation);

        if updated && !options.dry_run {
            let content = serialize_tree(&combined, existing_raw.as_deref(), &config.extract);
            if let Err(e) = write_tree(&output_path, &content) {
                options.logger.warn(&format!("{}: {}", output_path.display(), e));
            }
        }

        results.push(FileResult {
            path: output_path,
            locale: locale.clone(),
            namespace: String::new(),
            updated,
        });
    }

    results
}

/// Walk up from a template fragment to the nearest existing ancestor
/// directory, so namespace discovery can search a directory that actually
/// exists without assuming the output tree's exact layout.
fn longest_existing_ancestor(path: &str) -> PathBuf {
    let mut candidate = PathBuf::from(path);
    if candidate.as_os_str().is_empty() {
        return PathBuf::from(".");
    }
    loop {
        if candidate.is_dir() {
            return candidate;
        }
        if !candidate.pop() {
            return PathBuf::from(".");
        }
    }
}

/// Discover namespaces that already have an output file on disk for a given
/// locale, even though the current extraction produced nothing for them
/// (spec §4.7: "every namespace, including namespaces discovered on disk
/// even if the current extraction produced none"). Not applicable in
/// merged-namespace mode, where one file already holds every namespace.
fn discover_known_namespaces(config: &ExtractConfig, locale: &str) -> Vec<String> {
    if config.merge_namespaces {
        return Vec::new();
    }
    const PLACEHOLDER: &str = "\u{e000}NAMESPACE\u{e000}";
    let expanded = expand_path_template(&config.output, locale, Some(PLACEHOLDER));
    let Some(idx) = expanded.find(PLACEHOLDER) else {
        return Vec::new();
    };
    let prefix = expanded[..idx].replace('\\', "/");
    let suffix = expanded[idx + PLACEHOLDER.len()..].replace('\\', "/");

    let search_root = longest_existing_ancestor(&prefix);
    let mut namespaces = Vec::new();
    for entry in walkdir::WalkDir::new(&search_root)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path_str = entry.path().to_string_lossy().replace('\\', "/");
        if let Some(rest) = path_str.strip_prefix(prefix.as_str()) {
            if let Some(ns) = rest.strip_suffix(suffix.as_str()) {
                if !ns.is_empty() {
                    namespaces.push(ns.to_string());
                }
            }
        }
    }
    namespaces
}

fn discover_known_namespaces_all_locales(config: &Config) -> Vec<String> {
    let mut all = Vec::new();
    for locale in &config.locales {
        all.extend(discover_known_namespaces(&config.extract, locale));
    }
    all.sort();
    all.dedup();
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::plugin::ConsoleLogger;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn base_config(root: &Path) -> Config {
        let mut config = Config {
            locales: vec!["en".to_string(), "fr".to_string()],
            ..Default::default()
        };
        config.extract.input = vec![format!("{}/src/**/*.tsx", root.display())];
        config.extract.output = format!("{}/locales/{{{{language}}}}/{{{{namespace}}}}.json", root.display());
        config
    }

    #[test]
    fn test_s1_direct_hook_produces_primary_default() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "const { t } = useTranslation('common'); t('save');");
        let config = base_config(dir.path());

        let logger = ConsoleLogger;
        let output = run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();
        assert!(output.any_file_updated);

        let en_path = dir.path().join("locales/en/common.json");
        let content = fs::read_to_string(en_path).unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["save"], "save");
    }

    #[test]
    fn test_idempotence_second_run_reports_no_update() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "const { t } = useTranslation('common'); t('save');");
        let config = base_config(dir.path());
        let logger = ConsoleLogger;

        run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();
        let second = run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();
        assert!(!second.any_file_updated);
    }

    #[test]
    fn test_secondary_locale_gets_empty_default() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "const { t } = useTranslation('common'); t('save');");
        let config = base_config(dir.path());
        let logger = ConsoleLogger;
        run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();

        let fr_path = dir.path().join("locales/fr/common.json");
        let content = fs::read_to_string(fr_path).unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["save"], "");
    }

    #[test]
    fn test_plural_expansion_for_arabic_locale() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "t('items', { count: 0 });");
        let mut config = base_config(dir.path());
        config.locales = vec!["ar".to_string()];
        let logger = ConsoleLogger;
        run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();

        let path = dir.path().join("locales/ar/translation.json");
        let value: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        for category in ["zero", "one", "two", "few", "many", "other"] {
            assert!(value.get(format!("items_{category}")).is_some(), "missing items_{category}");
        }
    }

    #[test]
    fn test_dry_run_does_not_write_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "t('save');");
        let config = base_config(dir.path());
        let logger = ConsoleLogger;
        let mut options = DriverOptions::new(dir.path(), &logger);
        options.dry_run = true;
        let output = run(&config, options).unwrap();
        assert!(output.any_file_updated);
        assert!(!dir.path().join("locales/en/translation.json").exists());
    }

    #[test]
    fn test_remove_unused_keys_prunes_stale_entry() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "t('save');");
        write(dir.path(), "locales/en/translation.json", r#"{ "save": "Save", "stale": "old" }"#);
        let config = base_config(dir.path());
        let logger = ConsoleLogger;
        run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();

        let value: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("locales/en/translation.json")).unwrap(),
        )
        .unwrap();
        assert!(value.get("stale").is_none());
        assert_eq!(value["save"], "Save");
    }

    #[test]
    fn test_preserve_pattern_keeps_unused_key() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "t('save');");
        write(dir.path(), "locales/en/translation.json", r#"{ "save": "Save", "archived": "old" }"#);
        let mut config = base_config(dir.path());
        config.extract.preserve_patterns = vec!["archived".to_string()];
        let logger = ConsoleLogger;
        run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();

        let value: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("locales/en/translation.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(value["archived"], "old");
    }

    #[test]
    fn test_known_on_disk_namespace_survives_with_no_current_keys() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "// nothing here\n");
        write(dir.path(), "locales/en/errors.json", r#"{ "not_found": "Not found" }"#);
        let mut config = base_config(dir.path());
        config.extract.remove_unused_keys = false;
        let logger = ConsoleLogger;
        let output = run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();
        assert!(output.files.iter().any(|f| f.namespace == "errors"));
    }

    #[test]
    fn test_merge_namespaces_collapses_into_one_file_per_locale() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/app.tsx",
            "const { t } = useTranslation('forms'); t('submit'); t('save');",
        );
        let mut config = base_config(dir.path());
        config.extract.merge_namespaces = true;
        config.extract.output = format!("{}/locales/{{{{language}}}}.json", dir.path().display());
        let logger = ConsoleLogger;
        run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();

        let value: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("locales/en.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(value["forms"]["submit"], "submit");
    }

    #[test]
    fn test_merge_namespaces_default_ns_update_does_not_clobber_other_namespace() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/forms.tsx",
            "const { t } = useTranslation('forms'); t('submit');",
        );
        write(dir.path(), "src/app.tsx", "t('newDefault');");
        write(
            dir.path(),
            "locales/en.json",
            r#"{ "forms": { "submit": "submit" } }"#,
        );
        let mut config = base_config(dir.path());
        config.extract.merge_namespaces = true;
        config.extract.remove_unused_keys = false;
        config.extract.output = format!("{}/locales/{{{{language}}}}.json", dir.path().display());
        let logger = ConsoleLogger;
        run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();

        let value: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("locales/en.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(value["forms"]["submit"], "submit");
        assert_eq!(value["newDefault"], "newDefault");
    }

    #[test]
    fn test_comment_scanner_hit_is_collected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.tsx", "// t('leftover', 'Leftover text')\n");
        let config = base_config(dir.path());
        let logger = ConsoleLogger;
        run(&config, DriverOptions::new(dir.path(), &logger)).unwrap();

        let value: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("locales/en/translation.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(value["leftover"], "Leftover text");
    }
}
