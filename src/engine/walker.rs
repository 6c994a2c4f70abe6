//! AST Walker + Call-Site Handler + JSX Handler (spec §4.4).
//!
//! Walks one file's module, maintaining the Scope Manager's frame stack and
//! the Expression Resolver's per-file symbol table, and turns recognized
//! translation calls and `<Trans>` elements into `ExtractedKey`s. Runs once
//! per file and returns its own `Vec<ExtractedKey>`; the driver merges every
//! file's output into the shared collector sequentially (spec §5).

use std::collections::HashMap;

use swc_common::SourceMap;
use swc_ecma_ast::{
    ArrowExpr, CallExpr, Callee, Expr, ExprOrSpread, FnDecl, JSXAttrName, JSXAttrOrSpread,
    JSXAttrValue, JSXElement, JSXElementChild, JSXElementName, JSXExpr, Lit, Module, NewExpr,
    ObjectPatProp, Pat, Prop, PropName, PropOrSpread, TsEnumDecl, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::config::ExtractConfig;
use crate::engine::collector::{ExtractedKey, Namespace};
use crate::engine::namespace::resolve_namespace_candidates;
use crate::engine::scope::{ScopeInfo, ScopeStack, TranslationSource};
use crate::engine::value_source::{
    capture_enum, capture_initializer, extract_typed_param_namespace, resolve_expr,
    ExternalStringProvider, ResolveMode, SymbolTable,
};

/// Options recovered from a call's trailing object-literal argument(s)
/// (spec §4.4 "Argument interpretation").
#[derive(Debug, Clone, Default)]
struct CallOptions {
    default_value: Option<String>,
    ns: Vec<String>,
    context: Vec<String>,
    has_count: bool,
    is_ordinal: bool,
    return_objects: bool,
    key_prefix: Option<String>,
}

/// Match the callee's textual shape against one configured function pattern
/// (spec §4.4 "Recognition"): exact name, dotted member, or `*.`-prefixed
/// wildcard matching any `<ident>.suffix`.
fn matches_function_pattern(pattern: &str, callee_text: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        return callee_text.ends_with(suffix) && callee_text != suffix.trim_start_matches('.');
    }
    callee_text == pattern
}

fn callee_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) => {
            let obj = callee_text(&member.obj)?;
            let prop = match &member.prop {
                swc_ecma_ast::MemberProp::Ident(id) => id.sym.to_string(),
                _ => return None,
            };
            Some(format!("{obj}.{prop}"))
        }
        _ => None,
    }
}

/// The leading identifier of a (possibly dotted) callee, used to check
/// whether the callee is scope-bound (spec §4.4: "the engine also consults
/// the scope to see if the callee identifier is scope-bound").
fn callee_root_ident(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Ident(ident) => Some(&ident.sym),
        Expr::Member(member) => callee_root_ident(&member.obj),
        _ => None,
    }
}

/// Convert a selector-API arrow (`$ => $.path.to.key`) into a dot-joined key
/// string (spec §4.4 "selector function").
fn selector_key(arrow: &ArrowExpr) -> Option<String> {
    let [Pat::Ident(param)] = arrow.params.as_slice() else {
        return None;
    };
    let body_expr = match arrow.body.as_ref() {
        swc_ecma_ast::BlockStmtOrExpr::Expr(expr) => expr.as_ref(),
        _ => return None,
    };
    let mut segments = Vec::new();
    let mut current = body_expr;
    loop {
        match current {
            Expr::Member(member) => {
                match &member.prop {
                    swc_ecma_ast::MemberProp::Ident(id) => segments.push(id.sym.to_string()),
                    _ => return None,
                }
                current = &member.obj;
            }
            Expr::Ident(ident) if ident.sym == param.id.sym => break,
            _ => return None,
        }
    }
    segments.reverse();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("."))
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        _ => None,
    }
}

fn bool_literal_true(expr: &Expr) -> bool {
    matches!(expr, Expr::Lit(Lit::Bool(b)) if b.value)
}

/// Scan an options object expression for recognized call options (spec §4.4).
fn scan_call_options(obj: &swc_ecma_ast::ObjectLit, symbols: &SymbolTable, opts: &mut CallOptions) {
    for prop in &obj.props {
        let PropOrSpread::Prop(prop) = prop else { continue };
        let Prop::KeyValue(kv) = prop.as_ref() else { continue };
        let key = match &kv.key {
            PropName::Ident(id) => id.sym.to_string(),
            PropName::Str(s) => s.value.to_string(),
            _ => continue,
        };
        match key.as_str() {
            "defaultValue" => {
                if let Some(v) = string_literal(&kv.value) {
                    opts.default_value = Some(v);
                }
            }
            "ns" => {
                if let Ok(values) = resolve_expr(&kv.value, ResolveMode::Key, symbols, &[]) {
                    opts.ns = values;
                }
            }
            "context" => {
                if let Ok(values) = resolve_expr(&kv.value, ResolveMode::Context, symbols, &[]) {
                    opts.context = values;
                }
            }
            "count" => opts.has_count = true,
            "ordinal" => opts.is_ordinal = bool_literal_true(&kv.value),
            "returnObjects" => opts.return_objects = bool_literal_true(&kv.value),
            "keyPrefix" => {
                if let Some(v) = string_literal(&kv.value) {
                    opts.key_prefix = Some(v);
                }
            }
            _ => {}
        }
    }
}

/// Interpret a call's trailing arguments (arg1, optionally extended by arg2)
/// per spec §4.4.
fn interpret_trailing_args(args: &[ExprOrSpread], symbols: &SymbolTable) -> CallOptions {
    let mut opts = CallOptions::default();
    for arg in args.iter().skip(1).take(2) {
        match arg.expr.as_ref() {
            Expr::Object(obj) => scan_call_options(obj, symbols, &mut opts),
            Expr::Lit(Lit::Str(s)) if opts.default_value.is_none() => {
                opts.default_value = Some(s.value.to_string());
            }
            _ => {}
        }
    }
    opts
}

/// Destructured/aliased binding name for a given property key inside an
/// object pattern, e.g. `{ t }` or `{ t: translate }` (spec §4.3).
fn find_destructured_binding(pat: &Pat, prop_name: &str) -> Option<String> {
    let Pat::Object(obj) = pat else { return None };
    for prop in &obj.props {
        match prop {
            ObjectPatProp::KeyValue(kv) => {
                let key = match &kv.key {
                    PropName::Ident(id) => id.sym.to_string(),
                    PropName::Str(s) => s.value.to_string(),
                    _ => continue,
                };
                if key == prop_name
                    && let Pat::Ident(binding) = kv.value.as_ref()
                {
                    return Some(binding.id.sym.to_string());
                }
            }
            ObjectPatProp::Assign(assign) if assign.key.sym == *prop_name => {
                return Some(assign.key.sym.to_string());
            }
            _ => {}
        }
    }
    None
}

/// Serializes a `<Trans>` element's children into a default-value string
/// (spec §4.4): kept HTML tags are preserved verbatim, other elements become
/// numbered placeholders, and `{{name}}`-shaped interpolation containers are
/// rendered back as `{{name}}`.
struct TransSerializer<'a> {
    kept_tags: &'a [String],
    index: usize,
}

impl<'a> TransSerializer<'a> {
    fn new(kept_tags: &'a [String]) -> Self {
        Self { kept_tags, index: 0 }
    }

    fn serialize_children(&mut self, children: &[JSXElementChild]) -> String {
        let mut out = String::new();
        for child in children {
            self.serialize_child(child, &mut out);
        }
        out
    }

    fn serialize_child(&mut self, child: &JSXElementChild, out: &mut String) {
        match child {
            JSXElementChild::JSXText(text) => out.push_str(text.value.trim()),
            JSXElementChild::JSXElement(el) => {
                let tag = match &el.opening.name {
                    JSXElementName::Ident(id) => id.sym.to_string(),
                    _ => return,
                };
                let inner = self.serialize_children(&el.children);
                if self.kept_tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                    out.push_str(&format!("<{tag}>{inner}</{tag}>"));
                } else {
                    let idx = self.index;
                    self.index += 1;
                    out.push_str(&format!("<{idx}>{inner}</{idx}>"));
                }
            }
            JSXElementChild::JSXExprContainer(container) => {
                if let JSXExpr::Expr(expr) = &container.expr
                    && let Expr::Object(obj) = expr.as_ref()
                    && let [PropOrSpread::Prop(prop)] = obj.props.as_slice()
                    && let Prop::Shorthand(ident) = prop.as_ref()
                {
                    out.push_str(&format!("{{{{{}}}}}", ident.sym));
                }
            }
            _ => {}
        }
    }
}

/// One file's walk. Owned for the duration of a single `walk_module` call;
/// never persists across files (spec §4.2 "must not leak across files",
/// spec §5 "no internal state outlives the walk").
pub struct Walker<'a> {
    config: &'a ExtractConfig,
    scope: ScopeStack,
    symbols: SymbolTable,
    /// Registered component-param namespace propagation: `component -> ns`
    /// (spec §4.3 cross-file `FromProps` propagation's single-file half; the
    /// driver performs the cross-file half by repeating this per file and
    /// carrying a shared registry across calls).
    component_namespaces: HashMap<String, Vec<String>>,
    output: Vec<ExtractedKey>,
    /// Plugins contributing extra key/context candidates alongside the
    /// resolver's own static analysis.
    providers: &'a [Box<dyn ExternalStringProvider>],
}

impl<'a> Walker<'a> {
    pub fn new(config: &'a ExtractConfig, providers: &'a [Box<dyn ExternalStringProvider>]) -> Self {
        Self {
            config,
            scope: ScopeStack::new(),
            symbols: SymbolTable::new(),
            component_namespaces: HashMap::new(),
            output: Vec::new(),
            providers,
        }
    }

    pub fn walk(mut self, module: &Module) -> Vec<ExtractedKey> {
        self.scope.push_root();
        module.visit_with(&mut self);
        self.scope.pop();
        self.output
    }

    fn ns_separator(&self) -> Option<&str> {
        self.config.ns_separator.as_deref()
    }

    fn scope_lookup(&self, name: &str) -> Option<(Vec<String>, Option<String>)> {
        match self.scope.lookup(name) {
            Some((_, TranslationSource::Shadowed)) => None,
            Some((info, _)) => Some((info.default_ns.clone(), info.key_prefix.clone())),
            None => None,
        }
    }

    /// Try to recognize `name` as a hook call and bind the destructured
    /// translation-function identifier (spec §4.3 "Hook detection").
    fn try_bind_hook(&mut self, pat: &Pat, call: &CallExpr) {
        let Callee::Expr(callee) = &call.callee else { return };
        let Some(name) = callee_text(callee) else { return };
        let Some(hook) = self
            .config
            .use_translation_names
            .iter()
            .find(|h| h.name == name)
            .cloned()
        else {
            return;
        };

        let ns = call
            .args
            .get(hook.ns_arg)
            .and_then(|arg| resolve_expr(&arg.expr, ResolveMode::Key, &self.symbols, self.providers).ok())
            .unwrap_or_default();

        let key_prefix = call
            .args
            .get(hook.key_prefix_arg)
            .and_then(|arg| match arg.expr.as_ref() {
                Expr::Object(obj) => obj.props.iter().find_map(|p| {
                    let PropOrSpread::Prop(prop) = p else { return None };
                    let Prop::KeyValue(kv) = prop.as_ref() else { return None };
                    let is_key_prefix = matches!(&kv.key, PropName::Ident(id) if id.sym == "keyPrefix");
                    if is_key_prefix { string_literal(&kv.value) } else { None }
                }),
                _ => None,
            });

        let binding_name = match pat {
            Pat::Ident(ident) => Some(ident.id.sym.to_string()),
            Pat::Object(_) => find_destructured_binding(pat, "t"),
            _ => None,
        };
        if let Some(binding_name) = binding_name {
            self.scope.bind(
                binding_name,
                ScopeInfo::new(ns, key_prefix),
                TranslationSource::Direct,
            );
        }
    }

    /// Typed-parameter detection (spec §4.3): a function parameter annotated
    /// as the translation-function type with a single string-literal type
    /// argument binds that parameter with `defaultNs` in the new scope.
    fn bind_typed_params(&mut self, params: &[Pat]) {
        for param in params {
            if let Pat::Ident(ident) = param
                && let Some(ann) = &ident.type_ann
                && let Some(ns) = extract_typed_param_namespace(ann)
            {
                self.scope.bind(
                    ident.id.sym.to_string(),
                    ScopeInfo::new(vec![ns], None),
                    TranslationSource::FromProps,
                );
            }
        }
    }

    /// Register a component's first-parameter destructured translation
    /// binding against any namespace(s) already known for that component
    /// (spec §4.3 `FromProps` propagation).
    fn bind_component_props(&mut self, component_name: &str, first_param: Option<&Pat>) {
        let Some(param) = first_param else { return };
        let Some(namespaces) = self.component_namespaces.get(component_name).cloned() else {
            return;
        };
        if let Some(binding) = find_destructured_binding(param, "t") {
            self.scope.bind(
                binding,
                ScopeInfo::new(namespaces, None),
                TranslationSource::FromProps,
            );
        }
    }

    fn handle_call_like(&mut self, callee: &Expr, args: &[ExprOrSpread]) {
        let Some(text) = callee_text(callee) else { return };
        let recognized = self
            .config
            .functions
            .iter()
            .any(|pattern| matches_function_pattern(pattern, &text));
        if !recognized {
            return;
        }

        let Some(key_arg) = args.first() else { return };

        let key_candidates = if let Expr::Arrow(arrow) = key_arg.expr.as_ref() {
            selector_key(arrow).map(|k| vec![k])
        } else {
            None
        };
        let key_candidates = match key_candidates {
            Some(keys) => keys,
            None => resolve_expr(&key_arg.expr, ResolveMode::Key, &self.symbols, self.providers)
                .unwrap_or_default(),
        };
        if key_candidates.is_empty() {
            return;
        }

        let opts = interpret_trailing_args(args, &self.symbols);

        let root_ident = callee_root_ident(callee);
        let (scope_ns, scope_prefix) = root_ident
            .and_then(|name| self.scope_lookup(name))
            .unwrap_or_default();

        let key_prefix = opts.key_prefix.clone().or(scope_prefix);
        let context_candidates = if opts.context.is_empty() {
            vec![None]
        } else {
            opts.context.iter().cloned().map(Some).collect::<Vec<_>>()
        };

        for base_key in &key_candidates {
            let prefixed_key = match &key_prefix {
                Some(prefix) => format!("{prefix}{}{base_key}", self.config.key_separator.as_deref().unwrap_or(".")),
                None => base_key.clone(),
            };
            let (ns_candidates, explicit_ns) = resolve_namespace_candidates(
                &opts.ns,
                &prefixed_key,
                self.ns_separator(),
                &scope_ns,
                &self.config.default_ns,
            );

            for ns in &ns_candidates {
                for context in &context_candidates {
                    let final_key = match context {
                        Some(ctx) => format!("{prefixed_key}{}{ctx}", self.config.context_separator),
                        None => prefixed_key.clone(),
                    };
                    let namespace = if explicit_ns {
                        Namespace::Explicit(ns.clone())
                    } else {
                        Namespace::Implicit
                    };
                    self.output.push(ExtractedKey {
                        key: final_key,
                        namespace,
                        default_value: opts.default_value.clone(),
                        explicit_default: opts.default_value.is_some(),
                        has_count: opts.has_count,
                        is_ordinal: opts.is_ordinal,
                        return_objects: opts.return_objects,
                        context_expression: context.clone(),
                    });
                }
            }
        }
    }

    fn handle_trans_element(&mut self, el: &JSXElement) {
        let tag = match &el.opening.name {
            JSXElementName::Ident(id) => id.sym.to_string(),
            _ => return,
        };
        if !self.config.trans_components.iter().any(|c| c == &tag) {
            return;
        }

        let mut i18n_key = None;
        let mut explicit_default = None;
        let mut ns = None;

        for attr in &el.opening.attrs {
            let JSXAttrOrSpread::JSXAttr(attr) = attr else { continue };
            let name = match &attr.name {
                JSXAttrName::Ident(id) => id.sym.to_string(),
                _ => continue,
            };
            let value = attr.value.as_ref().and_then(|v| match v {
                JSXAttrValue::Str(s) => Some(s.value.to_string()),
                JSXAttrValue::JSXExprContainer(c) => match &c.expr {
                    JSXExpr::Expr(expr) => string_literal(expr),
                    _ => None,
                },
                _ => None,
            });
            match name.as_str() {
                "i18nKey" => i18n_key = value,
                "defaults" => explicit_default = value,
                "ns" => ns = value,
                _ => {}
            }
        }

        let Some(key) = i18n_key else { return };
        let default_value = explicit_default.or_else(|| {
            let mut serializer =
                TransSerializer::new(&self.config.trans_keep_basic_html_nodes_for);
            Some(serializer.serialize_children(&el.children))
        });

        let (ns_candidates, explicit_ns) = resolve_namespace_candidates(
            &ns.into_iter().collect::<Vec<_>>(),
            &key,
            self.ns_separator(),
            &[],
            &self.config.default_ns,
        );
        for candidate in ns_candidates {
            let namespace = if explicit_ns {
                Namespace::Explicit(candidate)
            } else {
                Namespace::Implicit
            };
            self.output.push(ExtractedKey {
                key: key.clone(),
                namespace,
                default_value: default_value.clone(),
                explicit_default: explicit_default.is_some(),
                has_count: false,
                is_ordinal: false,
                return_objects: false,
                context_expression: None,
            });
        }
    }
}

impl<'a> Visit for Walker<'a> {
    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Some(init) = &node.init {
            if let Expr::Call(call) = init.as_ref() {
                self.try_bind_hook(&node.name, call);
            }
            if let Some(value) = capture_initializer(init) {
                if let Pat::Ident(ident) = &node.name {
                    self.symbols.insert(ident.id.sym.to_string(), value);
                }
            }
        }
        node.visit_children_with(self);
    }

    fn visit_ts_enum_decl(&mut self, node: &TsEnumDecl) {
        self.symbols.insert(node.id.sym.to_string(), capture_enum(node));
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        self.scope.push_function();
        let params: Vec<Pat> = node.function.params.iter().map(|p| p.pat.clone()).collect();
        self.bind_typed_params(&params);
        let component_name = node.ident.sym.to_string();
        self.bind_component_props(&component_name, params.first());
        node.function.visit_children_with(self);
        self.scope.pop();
    }

    fn visit_function(&mut self, node: &swc_ecma_ast::Function) {
        self.scope.push_function();
        let params: Vec<Pat> = node.params.iter().map(|p| p.pat.clone()).collect();
        self.bind_typed_params(&params);
        node.visit_children_with(self);
        self.scope.pop();
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.scope.push_function();
        self.bind_typed_params(&node.params);
        node.visit_children_with(self);
        self.scope.pop();
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee {
            self.handle_call_like(callee, &node.args);
        }
        node.visit_children_with(self);
    }

    fn visit_new_expr(&mut self, node: &NewExpr) {
        let args: Vec<ExprOrSpread> = node.args.clone().unwrap_or_default();
        self.handle_call_like(&node.callee, &args);
        node.visit_children_with(self);
    }

    fn visit_jsx_element(&mut self, node: &JSXElement) {
        self.handle_trans_element(node);
        node.visit_children_with(self);
    }
}

/// Entry point: walk a parsed module and return every `ExtractedKey` it
/// produced (spec §4.4; comment-scanner hits are merged in separately by the
/// driver, per spec §4.5's "added to the collector with the same contract").
pub fn walk_module(
    module: &Module,
    _source_map: &SourceMap,
    config: &ExtractConfig,
    providers: &[Box<dyn ExternalStringProvider>],
) -> Vec<ExtractedKey> {
    Walker::new(config, providers).walk(module)
}
