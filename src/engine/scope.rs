//! Scope Manager (spec §4.3): tracks lexical bindings of translation-function
//! identifiers to `{defaultNs, keyPrefix}` while the walker descends into the
//! AST. A function-like node pushes a frame on entry and pops on exit; the
//! root (file) frame is pushed at the start of a file's walk and popped at
//! the end.

use crate::config::HookSpec;

/// Per-lexical-scope binding for a translation-function identifier (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeInfo {
    /// Namespace candidates to assume when a call site doesn't specify one.
    /// More than one entry means the binding must fan out across namespaces
    /// when consumed (spec §4.4).
    pub default_ns: Vec<String>,
    pub key_prefix: Option<String>,
}

impl ScopeInfo {
    pub fn new(default_ns: Vec<String>, key_prefix: Option<String>) -> Self {
        Self {
            default_ns,
            key_prefix,
        }
    }

    pub fn unscoped() -> Self {
        Self {
            default_ns: Vec::new(),
            key_prefix: None,
        }
    }
}

/// How a scope-bound identifier came to exist, for diagnostics and for the
/// Call-Site Handler to decide whether cross-file namespace fan-out applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationSource {
    /// Bound directly from a hook call: `const { t } = useTranslation('ns')`.
    Direct,
    /// Bound from a typed function parameter (spec §4.3 "typed-parameter
    /// detection"): `function X({ t }: { t: TFunction<'ns'> })`.
    FromProps,
    /// Bound via cross-file propagation: a component/function receiving a
    /// translation function as an argument whose namespace is known from the
    /// call site (spec §4.3 fan-out across candidate namespaces).
    FromFnCall,
    /// A local identifier shadows an outer translation-function binding with
    /// something unrelated; lookups must not see through the shadow.
    Shadowed,
}

/// A single frame in the scope stack: the bindings introduced at one lexical
/// level (function body or file root).
#[derive(Debug, Clone, Default)]
struct ScopeFrame {
    bindings: Vec<(String, ScopeInfo, TranslationSource)>,
}

/// Stack of lexical frames, owned by the walker for the duration of one
/// file's walk. Never escapes the walk and never persists across files.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Push the root (file) frame. Call once at the start of a file's walk.
    pub fn push_root(&mut self) {
        self.frames.push(ScopeFrame::default());
    }

    /// Push a frame for a function-like node on entry.
    pub fn push_function(&mut self) {
        self.frames.push(ScopeFrame::default());
    }

    /// Pop the innermost frame on exit from a function-like node, or at the
    /// end of a file's walk.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Bind an identifier in the current (innermost) frame.
    pub fn bind(&mut self, name: impl Into<String>, info: ScopeInfo, source: TranslationSource) {
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.push((name.into(), info, source));
        }
    }

    /// Mark an identifier as shadowed in the current frame, so inner lookups
    /// stop at this frame rather than seeing an outer binding of the same
    /// name.
    pub fn shadow(&mut self, name: impl Into<String>) {
        self.bind(name, ScopeInfo::unscoped(), TranslationSource::Shadowed);
    }

    /// Walk frames from innermost to outermost, returning the first binding
    /// found for `name` (spec §4.3 "lookup").
    pub fn lookup(&self, name: &str) -> Option<(&ScopeInfo, &TranslationSource)> {
        for frame in self.frames.iter().rev() {
            for (bound_name, info, source) in frame.bindings.iter().rev() {
                if bound_name == name {
                    return Some((info, source));
                }
            }
        }
        None
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Result of recognizing a hook call at a `VariableDeclarator` (spec §4.3
/// "hook detection").
#[derive(Debug, Clone)]
pub struct HookBinding {
    pub fn_identifier: String,
    pub info: ScopeInfo,
}

/// Match a call's callee name against a configured hook spec.
pub fn matches_hook<'a>(callee_name: &str, hooks: &'a [HookSpec]) -> Option<&'a HookSpec> {
    hooks.iter().find(|h| h.name == callee_name)
}

/// Build the `ScopeInfo` for a recognized hook call, given the already
/// resolved namespace argument (possibly multiple candidates, spec §4.3 "if
/// it yields a list, the engine must fan out") and an optional resolved
/// `keyPrefix` pulled from the options argument.
pub fn build_hook_scope_info(
    resolved_namespaces: Vec<String>,
    key_prefix: Option<String>,
) -> ScopeInfo {
    ScopeInfo::new(resolved_namespaces, key_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_in_current_frame() {
        let mut stack = ScopeStack::new();
        stack.push_root();
        stack.bind(
            "t",
            ScopeInfo::new(vec!["common".to_string()], None),
            TranslationSource::Direct,
        );
        let (info, source) = stack.lookup("t").unwrap();
        assert_eq!(info.default_ns, vec!["common"]);
        assert_eq!(*source, TranslationSource::Direct);
    }

    #[test]
    fn test_lookup_falls_through_to_outer_frame() {
        let mut stack = ScopeStack::new();
        stack.push_root();
        stack.bind(
            "t",
            ScopeInfo::new(vec!["common".to_string()], None),
            TranslationSource::Direct,
        );
        stack.push_function();
        let (info, _) = stack.lookup("t").unwrap();
        assert_eq!(info.default_ns, vec!["common"]);
        stack.pop();
        assert!(stack.lookup("t").is_some());
    }

    #[test]
    fn test_pop_removes_inner_binding() {
        let mut stack = ScopeStack::new();
        stack.push_root();
        stack.push_function();
        stack.bind("t", ScopeInfo::unscoped(), TranslationSource::Direct);
        assert!(stack.lookup("t").is_some());
        stack.pop();
        assert!(stack.lookup("t").is_none());
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let mut stack = ScopeStack::new();
        stack.push_root();
        stack.bind(
            "t",
            ScopeInfo::new(vec!["outer".to_string()], None),
            TranslationSource::Direct,
        );
        stack.push_function();
        stack.shadow("t");
        let (_, source) = stack.lookup("t").unwrap();
        assert_eq!(*source, TranslationSource::Shadowed);
    }

    #[test]
    fn test_unbound_identifier_returns_none() {
        let mut stack = ScopeStack::new();
        stack.push_root();
        assert!(stack.lookup("t").is_none());
    }

    #[test]
    fn test_matches_hook_by_name() {
        let hooks = vec![HookSpec::simple("useTranslation")];
        assert!(matches_hook("useTranslation", &hooks).is_some());
        assert!(matches_hook("useOtherHook", &hooks).is_none());
    }

    #[test]
    fn test_hook_scope_info_fans_out_over_multiple_namespaces() {
        let info = build_hook_scope_info(
            vec!["common".to_string(), "forms".to_string()],
            Some("actions".to_string()),
        );
        assert_eq!(info.default_ns.len(), 2);
        assert_eq!(info.key_prefix.as_deref(), Some("actions"));
    }
}
