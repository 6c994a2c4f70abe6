//! Configuration schema, discovery, and validation.
//!
//! Mirrors the shape of an i18next-scanner-style config file: one required
//! `locales` list plus a nested `extract` block controlling source scanning and
//! reconciliation. Defaults match the documented configuration schema.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result, anyhow};
use glob::Pattern;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".glotrc.json";

/// One hook call recognized by the Scope Manager (spec §4.3).
///
/// `ns_arg`/`key_prefix_arg` are argument positions (0-based) inspected for the
/// namespace and `keyPrefix` respectively.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HookSpec {
    pub name: String,
    #[serde(default)]
    pub ns_arg: usize,
    #[serde(default = "default_key_prefix_arg")]
    pub key_prefix_arg: usize,
}

fn default_key_prefix_arg() -> usize {
    1
}

impl HookSpec {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ns_arg: 0,
            key_prefix_arg: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Json,
    Json5,
    Js,
    JsEsm,
    JsCjs,
    Ts,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Json
    }
}

/// The sentinel namespace name meaning "no explicit default namespace" (spec §3
/// invariant 2 and §6 `extract.defaultNS`).
pub const NAMESPACE_NONE: &str = "none";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractConfig {
    pub input: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    pub output: String,
    #[serde(default = "default_ns")]
    pub default_ns: String,
    /// `None` (or the JSON value `false`) means flat keys, no nesting separator.
    #[serde(default = "default_key_separator")]
    pub key_separator: Option<String>,
    #[serde(default = "default_ns_separator")]
    pub ns_separator: Option<String>,
    #[serde(default = "default_context_separator")]
    pub context_separator: String,
    #[serde(default = "default_plural_separator")]
    pub plural_separator: String,
    #[serde(default = "default_functions")]
    pub functions: Vec<String>,
    #[serde(default = "default_trans_components")]
    pub trans_components: Vec<String>,
    #[serde(default = "default_use_translation_names")]
    pub use_translation_names: Vec<HookSpec>,
    pub primary_language: Option<String>,
    #[serde(default = "default_default_value")]
    pub default_value: String,
    #[serde(default = "default_sort")]
    pub sort: bool,
    #[serde(default = "default_remove_unused_keys")]
    pub remove_unused_keys: bool,
    /// When true, the primary language's values are kept in sync with
    /// call-site default values rather than treated as translator-owned
    /// text (spec §4.7 Step 5).
    #[serde(default)]
    pub sync_primary_with_defaults: bool,
    #[serde(default)]
    pub preserve_patterns: Vec<String>,
    #[serde(default)]
    pub merge_namespaces: bool,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "default_indentation")]
    pub indentation: usize,
    #[serde(default = "default_generate_base_plural_forms")]
    pub generate_base_plural_forms: bool,
    #[serde(default)]
    pub disable_plurals: bool,
    /// Inline HTML tags preserved verbatim when deriving a `<Trans>` element's
    /// default value from its children (spec §4.4); any other child element
    /// becomes a numbered placeholder (`<0>…</0>`).
    #[serde(default = "default_trans_keep_basic_html_nodes_for")]
    pub trans_keep_basic_html_nodes_for: Vec<String>,
}

fn default_ns() -> String {
    "translation".to_string()
}
fn default_key_separator() -> Option<String> {
    Some(".".to_string())
}
fn default_ns_separator() -> Option<String> {
    Some(":".to_string())
}
fn default_context_separator() -> String {
    "_".to_string()
}
fn default_plural_separator() -> String {
    "_".to_string()
}
fn default_functions() -> Vec<String> {
    vec!["t".to_string(), "*.t".to_string()]
}
fn default_trans_components() -> Vec<String> {
    vec!["Trans".to_string()]
}
fn default_use_translation_names() -> Vec<HookSpec> {
    vec![
        HookSpec::simple("useTranslation"),
        HookSpec::simple("getT"),
        HookSpec::simple("useT"),
    ]
}
fn default_default_value() -> String {
    String::new()
}
fn default_sort() -> bool {
    true
}
fn default_remove_unused_keys() -> bool {
    true
}
fn default_indentation() -> usize {
    2
}
fn default_generate_base_plural_forms() -> bool {
    true
}
fn default_trans_keep_basic_html_nodes_for() -> Vec<String> {
    vec![
        "br".to_string(),
        "strong".to_string(),
        "i".to_string(),
        "p".to_string(),
    ]
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input: vec!["src/**/*.{ts,tsx}".to_string()],
            ignore: Vec::new(),
            output: "locales/{{language}}/{{namespace}}.json".to_string(),
            default_ns: default_ns(),
            key_separator: default_key_separator(),
            ns_separator: default_ns_separator(),
            context_separator: default_context_separator(),
            plural_separator: default_plural_separator(),
            functions: default_functions(),
            trans_components: default_trans_components(),
            use_translation_names: default_use_translation_names(),
            primary_language: None,
            default_value: default_default_value(),
            sort: default_sort(),
            remove_unused_keys: default_remove_unused_keys(),
            sync_primary_with_defaults: false,
            preserve_patterns: Vec::new(),
            merge_namespaces: false,
            output_format: OutputFormat::default(),
            indentation: default_indentation(),
            generate_base_plural_forms: default_generate_base_plural_forms(),
            disable_plurals: false,
            trans_keep_basic_html_nodes_for: default_trans_keep_basic_html_nodes_for(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub locales: Vec<String>,
    #[serde(default)]
    pub extract: ExtractConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locales: vec!["en".to_string()],
            extract: ExtractConfig::default(),
        }
    }
}

impl Config {
    /// The primary language: the configured override, or the first locale, or "en".
    pub fn primary_language(&self) -> String {
        self.extract
            .primary_language
            .clone()
            .or_else(|| self.locales.first().cloned())
            .unwrap_or_else(|| "en".to_string())
    }

    /// Locales other than the primary language.
    pub fn secondary_languages(&self) -> Vec<String> {
        let primary = self.primary_language();
        self.locales
            .iter()
            .filter(|l| **l != primary)
            .cloned()
            .collect()
    }

    /// Validate configuration values.
    ///
    /// Checks required fields are non-empty (spec §4.9) and that every glob
    /// pattern parses.
    pub fn validate(&self) -> Result<()> {
        if self.locales.is_empty() {
            return Err(anyhow!("Configuration error: 'locales' must not be empty"));
        }
        if self.extract.input.is_empty() {
            return Err(anyhow!(
                "Configuration error: 'extract.input' must not be empty"
            ));
        }
        if self.extract.output.is_empty() {
            return Err(anyhow!(
                "Configuration error: 'extract.output' must not be empty"
            ));
        }
        if !self.extract.output.contains("{{language}}") && !self.extract.output.contains("{{lng}}")
        {
            return Err(anyhow!(
                "Configuration error: 'extract.output' must contain the {{{{language}}}} (or {{{{lng}}}}) placeholder"
            ));
        }

        for pattern in self.extract.ignore.iter().chain(self.extract.input.iter()) {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern: \"{}\"", pattern))?;
        }
        for pattern in &self.extract.preserve_patterns {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'preservePatterns': \"{}\"", pattern)
                })?;
            }
        }

        Ok(())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
