//! Plugin interface: lets an external collaborator extend file loading,
//! expression resolution, and end-of-run reporting without the engine
//! depending on it directly.
//!
//! Modeled as a trait with optional (default no-op) methods, dispatched
//! through a fixed `Vec<Box<dyn Plugin>>`; every call is isolated so one
//! plugin's failure never aborts the run.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use colored::Colorize;
use swc_ecma_ast::Expr;

use crate::config::ExtractConfig;
use crate::engine::collector::{ExtractedKey, KeyCollector};
use crate::engine::reconciler::ReconcileOutput;
use crate::engine::value_source::{ExternalStringProvider, ResolveMode};

/// Minimal logging surface handed to plugins alongside `addKey`,
/// immutable config, and scope lookup.
pub trait Logger {
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
}

/// The engine's own logger: plain stderr/stdout output in the teacher's
/// cargo-diagnostic style, no external logging crate.
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn warn(&self, message: &str) {
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }

    fn info(&self, message: &str) {
        println!("{message}");
    }
}

/// Per-run context a plugin's hooks are called with.
pub struct PluginContext<'a> {
    pub config: &'a ExtractConfig,
    pub logger: &'a dyn Logger,
    collected: &'a mut KeyCollector,
    /// Resolved `(default_ns, key_prefix)` for a scope-bound identifier, if any.
    scope_lookup: Box<dyn Fn(&str) -> Option<(Vec<String>, Option<String>)> + 'a>,
}

impl<'a> PluginContext<'a> {
    pub fn new(
        config: &'a ExtractConfig,
        logger: &'a dyn Logger,
        collected: &'a mut KeyCollector,
        scope_lookup: impl Fn(&str) -> Option<(Vec<String>, Option<String>)> + 'a,
    ) -> Self {
        Self {
            config,
            logger,
            collected,
            scope_lookup: Box::new(scope_lookup),
        }
    }

    pub fn add_key(&mut self, key: ExtractedKey) {
        self.collected.insert(key);
    }

    pub fn lookup_scope(&self, name: &str) -> Option<(Vec<String>, Option<String>)> {
        (self.scope_lookup)(name)
    }
}

/// A plugin's optional lifecycle hooks. Every method has a no-op default so
/// a plugin only overrides what it needs.
pub trait Plugin {
    fn name(&self) -> &str {
        "unnamed"
    }

    fn setup(&mut self) {}

    /// Transform a file's source text before parsing.
    fn on_load(&mut self, code: String, _path: &Path) -> String {
        code
    }

    /// Called once per visited AST node during the walk.
    fn on_visit_node(&mut self, _node_kind: &str, _ctx: &mut PluginContext) {}

    /// Contribute extra key candidates for an otherwise-unresolved (or
    /// already-resolved) expression.
    fn extract_keys_from_expression(
        &self,
        _expr: &Expr,
        _mode: ResolveMode,
        _config: &ExtractConfig,
        _logger: &dyn Logger,
    ) -> Vec<String> {
        Vec::new()
    }

    fn extract_context_from_expression(
        &self,
        _expr: &Expr,
        _config: &ExtractConfig,
        _logger: &dyn Logger,
    ) -> Vec<String> {
        Vec::new()
    }

    fn on_end(&mut self, _keys: &KeyCollector) {}

    fn after_sync(&mut self, _results: &[ReconcileOutput], _config: &ExtractConfig) {}
}

/// Runs every registered plugin's hooks, catching panics at each call
/// boundary so a broken plugin degrades to "no contribution" instead of
/// aborting the engine run.
pub struct PluginHost {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginHost {
    pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn setup_all(&mut self, logger: &dyn Logger) {
        for plugin in &mut self.plugins {
            let name = plugin.name().to_string();
            let result = panic::catch_unwind(AssertUnwindSafe(|| plugin.setup()));
            if result.is_err() {
                logger.warn(&format!("plugin '{name}' panicked during setup"));
            }
        }
    }

    pub fn on_load_all(&mut self, mut code: String, path: &Path, logger: &dyn Logger) -> String {
        for plugin in &mut self.plugins {
            let name = plugin.name().to_string();
            let before = code.clone();
            let result = panic::catch_unwind(AssertUnwindSafe(|| plugin.on_load(before.clone(), path)));
            code = match result {
                Ok(transformed) => transformed,
                Err(_) => {
                    logger.warn(&format!("plugin '{name}' panicked in onLoad; input left unchanged"));
                    before
                }
            };
        }
        code
    }

    pub fn extract_keys(
        &self,
        expr: &Expr,
        mode: ResolveMode,
        config: &ExtractConfig,
        logger: &dyn Logger,
    ) -> Vec<String> {
        let mut out = Vec::new();
        for plugin in &self.plugins {
            let name = plugin.name();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                plugin.extract_keys_from_expression(expr, mode, config, logger)
            }));
            match result {
                Ok(values) => out.extend(values),
                Err(_) => logger.warn(&format!("plugin '{name}' panicked in extractKeysFromExpression")),
            }
        }
        out
    }

    pub fn extract_context(&self, expr: &Expr, config: &ExtractConfig, logger: &dyn Logger) -> Vec<String> {
        let mut out = Vec::new();
        for plugin in &self.plugins {
            let name = plugin.name();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                plugin.extract_context_from_expression(expr, config, logger)
            }));
            match result {
                Ok(values) => out.extend(values),
                Err(_) => logger.warn(&format!("plugin '{name}' panicked in extractContextFromExpression")),
            }
        }
        out
    }

    pub fn on_end_all(&mut self, keys: &KeyCollector, logger: &dyn Logger) {
        for plugin in &mut self.plugins {
            let name = plugin.name().to_string();
            let result = panic::catch_unwind(AssertUnwindSafe(|| plugin.on_end(keys)));
            if result.is_err() {
                logger.warn(&format!("plugin '{name}' panicked in onEnd"));
            }
        }
    }

    pub fn after_sync_all(&mut self, results: &[ReconcileOutput], config: &ExtractConfig, logger: &dyn Logger) {
        for plugin in &mut self.plugins {
            let name = plugin.name().to_string();
            let result = panic::catch_unwind(AssertUnwindSafe(|| plugin.after_sync(results, config)));
            if result.is_err() {
                logger.warn(&format!("plugin '{name}' panicked in afterSync"));
            }
        }
    }
}

/// Bridges the plugin host into the Expression Resolver's own plugin hook
/// (spec §4.2 "Plugin hook": "the same mechanism is used separately for key
/// resolution and context resolution"), so the walker's `resolve_expr` calls
/// unify plugin-contributed strings with its own static result without
/// depending on the plugin system directly.
pub struct PluginProvider<'a> {
    pub host: &'a PluginHost,
    pub config: &'a ExtractConfig,
    pub logger: &'a dyn Logger,
}

impl<'a> ExternalStringProvider for PluginProvider<'a> {
    fn provide(&self, expr: &Expr, mode: ResolveMode) -> Vec<String> {
        match mode {
            ResolveMode::Key => self.host.extract_keys(expr, mode, self.config, self.logger),
            ResolveMode::Context => self.host.extract_context(expr, self.config, self.logger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingPlugin {
        calls: Arc<AtomicUsize>,
    }

    impl Plugin for CountingPlugin {
        fn name(&self) -> &str {
            "counting"
        }

        fn setup(&mut self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingPlugin;

    impl Plugin for PanickingPlugin {
        fn name(&self) -> &str {
            "panicker"
        }

        fn setup(&mut self) {
            panic!("boom");
        }
    }

    struct SilentLogger {
        warnings: std::sync::Mutex<Vec<String>>,
    }

    impl Logger for SilentLogger {
        fn warn(&self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }
        fn info(&self, _message: &str) {}
    }

    #[test]
    fn test_setup_all_invokes_every_plugin() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut host = PluginHost::new(vec![Box::new(CountingPlugin { calls: calls.clone() })]);
        host.setup_all(&ConsoleLogger);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_plugin_is_isolated() {
        let logger = SilentLogger {
            warnings: std::sync::Mutex::new(Vec::new()),
        };
        let mut host = PluginHost::new(vec![Box::new(PanickingPlugin)]);
        host.setup_all(&logger);
        assert_eq!(logger.warnings.lock().unwrap().len(), 1);
        assert!(logger.warnings.lock().unwrap()[0].contains("panicker"));
    }

    #[test]
    fn test_on_load_returns_original_on_panic() {
        struct BadLoad;
        impl Plugin for BadLoad {
            fn name(&self) -> &str {
                "bad-load"
            }
            fn on_load(&mut self, _code: String, _path: &Path) -> String {
                panic!("nope");
            }
        }
        let logger = SilentLogger {
            warnings: std::sync::Mutex::new(Vec::new()),
        };
        let mut host = PluginHost::new(vec![Box::new(BadLoad)]);
        let result = host.on_load_all("original".to_string(), Path::new("f.ts"), &logger);
        assert_eq!(result, "original");
    }

    #[test]
    fn test_empty_host_reports_empty() {
        let host = PluginHost::new(vec![]);
        assert!(host.is_empty());
    }
}
