//! Static expression resolution (spec §4.2): the Expression Resolver.
//!
//! Given an AST expression, statically resolves it to a finite set of possible
//! string values, restricted to what can be determined without executing code.
//! An empty result means "unresolvable"; a singleton means "certain"; a larger
//! set means "a known finite union".

use std::collections::HashMap;

use swc_ecma_ast::{Expr, Lit, TsType, TsTypeAnn};

/// Reason an expression could not be resolved, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvableReason {
    UnknownIdentifier(String),
    ComplexTemplate { expr_count: usize },
    UnsupportedExpression(String),
}

impl std::fmt::Display for UnresolvableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvableReason::UnknownIdentifier(name) => {
                write!(f, "unknown identifier '{}'", name)
            }
            UnresolvableReason::ComplexTemplate { expr_count } => {
                write!(f, "template literal with {} embedded expressions", expr_count)
            }
            UnresolvableReason::UnsupportedExpression(kind) => {
                write!(f, "unsupported expression: {}", kind)
            }
        }
    }
}

/// A value captured in the per-file symbol table (spec §4.2).
///
/// Object expressions with statically-resolvable properties become `Map`;
/// other resolvable initializers (including enum declarations with string or
/// numeric members) become `Set`.
#[derive(Debug, Clone)]
pub enum SymbolValue {
    Set(Vec<String>),
    Map(HashMap<String, String>),
}

/// Per-file symbol table populated while walking `VariableDeclarator`s and enum
/// declarations. Reset for every file — must never leak across files.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolValue>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: SymbolValue) {
        self.symbols.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&SymbolValue> {
        self.symbols.get(name)
    }
}

/// Whether the caller is resolving a key value or a context value. Context
/// resolution filters out the empty string (spec §4.2: "empty context is
/// equivalent to no context").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Key,
    Context,
}

/// External string contributions consulted alongside the resolver's own result
/// (spec §4.2 "Plugin hook"); unioned into whatever the resolver itself
/// produces.
pub trait ExternalStringProvider {
    fn provide(&self, expr: &Expr, mode: ResolveMode) -> Vec<String>;
}

fn filter_context(mode: ResolveMode, mut values: Vec<String>) -> Vec<String> {
    if mode == ResolveMode::Context {
        values.retain(|v| !v.is_empty());
    }
    values
}

fn dedup(mut values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
    values
}

/// Resolve an expression to its set of possible string values.
///
/// Implements every rule in spec §4.2: literals, `undefined`, conditionals,
/// template literals (cartesian product), binary concatenation, TS
/// `satisfies`/`as` with literal-type annotations, TS template-literal types,
/// member-expression lookup against the symbol table, and plain identifier
/// lookup. Any other construct resolves to the empty set.
pub fn resolve_expr(
    expr: &Expr,
    mode: ResolveMode,
    symbols: &SymbolTable,
    providers: &[Box<dyn ExternalStringProvider>],
) -> Result<Vec<String>, UnresolvableReason> {
    let own = resolve_expr_inner(expr, mode, symbols);
    let mut combined = match own {
        Ok(values) => values,
        Err(reason) => {
            // Even on failure, plugin-provided values can still rescue the call
            // (spec §4.2: "the plugin-provided strings are unioned with the
            // resolver's own result").
            let plugin_values: Vec<String> = providers
                .iter()
                .flat_map(|p| p.provide(expr, mode))
                .collect();
            if plugin_values.is_empty() {
                return Err(reason);
            }
            plugin_values
        }
    };
    for provider in providers {
        combined.extend(provider.provide(expr, mode));
    }
    Ok(dedup(filter_context(mode, combined)))
}

fn resolve_expr_inner(
    expr: &Expr,
    mode: ResolveMode,
    symbols: &SymbolTable,
) -> Result<Vec<String>, UnresolvableReason> {
    match expr {
        Expr::Lit(lit) => resolve_literal(lit),
        Expr::Ident(ident) => {
            if &*ident.sym == "undefined" {
                return Ok(vec![]);
            }
            match symbols.get(&ident.sym) {
                Some(SymbolValue::Set(values)) => Ok(values.clone()),
                Some(SymbolValue::Map(_)) => Ok(vec![]),
                None => Err(UnresolvableReason::UnknownIdentifier(ident.sym.to_string())),
            }
        }
        Expr::Cond(cond) => {
            // spec.md: union of both branches' resolutions; an unresolvable
            // branch contributes an empty set rather than failing the whole
            // expression.
            let mut cons = resolve_expr_inner(&cond.cons, mode, symbols).unwrap_or_default();
            let alt = resolve_expr_inner(&cond.alt, mode, symbols).unwrap_or_default();
            cons.extend(alt);
            Ok(cons)
        }
        Expr::Tpl(tpl) => resolve_template(tpl, mode, symbols),
        Expr::Bin(bin) if bin.op == swc_ecma_ast::BinaryOp::Add => {
            // spec.md: if either operand is empty (including unresolvable),
            // the concatenation result is empty.
            let left = resolve_expr_inner(&bin.left, mode, symbols).unwrap_or_default();
            let right = resolve_expr_inner(&bin.right, mode, symbols).unwrap_or_default();
            if left.is_empty() || right.is_empty() {
                return Ok(vec![]);
            }
            Ok(cartesian_concat(&[left, right]))
        }
        Expr::TsSatisfies(s) => resolve_ts_literal_type(s.type_ann.as_ref()),
        Expr::TsAs(a) => resolve_ts_literal_type(a.type_ann.as_ref()),
        Expr::TsConstAssertion(c) => resolve_expr_inner(&c.expr, mode, symbols),
        Expr::Member(member) => resolve_member(member, symbols),
        Expr::Paren(p) => resolve_expr_inner(&p.expr, mode, symbols),
        other => Err(UnresolvableReason::UnsupportedExpression(
            expr_kind_name(other),
        )),
    }
}

fn resolve_literal(lit: &Lit) -> Result<Vec<String>, UnresolvableReason> {
    match lit {
        Lit::Str(s) => Ok(vec![s.value.to_string()]),
        Lit::Num(n) => Ok(vec![format_number(n.value)]),
        Lit::Bool(b) => Ok(vec![b.value.to_string()]),
        other => Err(UnresolvableReason::UnsupportedExpression(format!(
            "{:?}",
            other
        ))),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn resolve_template(
    tpl: &swc_ecma_ast::Tpl,
    mode: ResolveMode,
    symbols: &SymbolTable,
) -> Result<Vec<String>, UnresolvableReason> {
    // Each expression slot resolves independently; the final set is the
    // cartesian product of quasi text and every embedded expression's set.
    let mut parts: Vec<Vec<String>> = Vec::with_capacity(tpl.quasis.len() + tpl.exprs.len());
    for (i, quasi) in tpl.quasis.iter().enumerate() {
        parts.push(vec![quasi.raw.to_string()]);
        if let Some(expr) = tpl.exprs.get(i) {
            let resolved = resolve_expr_inner(expr, mode, symbols).map_err(|_| {
                UnresolvableReason::ComplexTemplate {
                    expr_count: tpl.exprs.len(),
                }
            })?;
            parts.push(resolved);
        }
    }
    Ok(cartesian_concat(&parts))
}

fn cartesian_concat(parts: &[Vec<String>]) -> Vec<String> {
    parts.iter().fold(vec![String::new()], |acc, part| {
        let mut next = Vec::with_capacity(acc.len() * part.len().max(1));
        for prefix in &acc {
            for piece in part {
                next.push(format!("{}{}", prefix, piece));
            }
        }
        next
    })
}

fn resolve_ts_literal_type(ty: &TsType) -> Result<Vec<String>, UnresolvableReason> {
    match ty {
        TsType::TsLitType(lit_ty) => match &lit_ty.lit {
            swc_ecma_ast::TsLit::Str(s) => Ok(vec![s.value.to_string()]),
            swc_ecma_ast::TsLit::Number(n) => Ok(vec![format_number(n.value)]),
            swc_ecma_ast::TsLit::Bool(b) => Ok(vec![b.value.to_string()]),
            swc_ecma_ast::TsLit::Tpl(tpl_ty) => resolve_ts_tpl_type(tpl_ty),
            _ => Err(UnresolvableReason::UnsupportedExpression(
                "ts literal type".to_string(),
            )),
        },
        TsType::TsUnionOrIntersectionType(swc_ecma_ast::TsUnionOrIntersectionType::TsUnionType(
            union,
        )) => {
            let mut values = Vec::new();
            for member in &union.types {
                values.extend(resolve_ts_literal_type(member)?);
            }
            Ok(values)
        }
        TsType::TsParenthesizedType(p) => resolve_ts_literal_type(&p.type_ann),
        _ => Err(UnresolvableReason::UnsupportedExpression(
            "ts type".to_string(),
        )),
    }
}

fn resolve_ts_tpl_type(
    tpl_ty: &swc_ecma_ast::TsTplLitType,
) -> Result<Vec<String>, UnresolvableReason> {
    let mut parts: Vec<Vec<String>> = Vec::new();
    for (i, quasi) in tpl_ty.quasis.iter().enumerate() {
        parts.push(vec![quasi.raw.to_string()]);
        if let Some(ty) = tpl_ty.types.get(i) {
            parts.push(resolve_ts_literal_type(ty)?);
        }
    }
    Ok(cartesian_concat(&parts))
}

fn resolve_member(
    member: &swc_ecma_ast::MemberExpr,
    symbols: &SymbolTable,
) -> Result<Vec<String>, UnresolvableReason> {
    let Expr::Ident(obj_ident) = member.obj.as_ref() else {
        return Err(UnresolvableReason::UnsupportedExpression(
            "member expression on non-identifier object".to_string(),
        ));
    };
    let prop_name = match &member.prop {
        swc_ecma_ast::MemberProp::Ident(id) => Some(id.sym.to_string()),
        swc_ecma_ast::MemberProp::Computed(c) => match c.expr.as_ref() {
            Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
            _ => None,
        },
        swc_ecma_ast::MemberProp::PrivateName(_) => None,
    };
    let Some(prop_name) = prop_name else {
        return Err(UnresolvableReason::UnsupportedExpression(
            "computed member with non-literal property".to_string(),
        ));
    };
    match symbols.get(&obj_ident.sym) {
        Some(SymbolValue::Map(map)) => map.get(&prop_name).map(|v| vec![v.clone()]).ok_or(
            UnresolvableReason::UnknownIdentifier(format!("{}.{}", obj_ident.sym, prop_name)),
        ),
        _ => Err(UnresolvableReason::UnknownIdentifier(
            obj_ident.sym.to_string(),
        )),
    }
}

fn expr_kind_name(expr: &Expr) -> String {
    match expr {
        Expr::Array(_) => "array expression".to_string(),
        Expr::Object(_) => "object expression".to_string(),
        Expr::Call(_) => "call expression".to_string(),
        Expr::Fn(_) | Expr::Arrow(_) => "function expression".to_string(),
        other => format!("{:?}", std::mem::discriminant(other)),
    }
}

/// Capture an object expression's statically-resolvable properties into a
/// `SymbolValue::Map`, or a resolvable non-object initializer into a
/// `SymbolValue::Set` (spec §4.2 per-file symbol table).
pub fn capture_initializer(expr: &Expr) -> Option<SymbolValue> {
    match expr {
        Expr::Object(obj) => {
            let mut map = HashMap::new();
            for prop in &obj.props {
                let swc_ecma_ast::PropOrSpread::Prop(prop) = prop else {
                    return None; // spread makes the object unresolvable
                };
                let swc_ecma_ast::Prop::KeyValue(kv) = prop.as_ref() else {
                    return None;
                };
                let key = match &kv.key {
                    swc_ecma_ast::PropName::Ident(id) => id.sym.to_string(),
                    swc_ecma_ast::PropName::Str(s) => s.value.to_string(),
                    _ => return None,
                };
                let value = match kv.value.as_ref() {
                    Expr::Lit(Lit::Str(s)) => s.value.to_string(),
                    Expr::Lit(Lit::Num(n)) => format_number(n.value),
                    _ => return None,
                };
                map.insert(key, value);
            }
            Some(SymbolValue::Map(map))
        }
        Expr::Lit(Lit::Str(s)) => Some(SymbolValue::Set(vec![s.value.to_string()])),
        Expr::Array(arr) => {
            let mut values = Vec::new();
            for elem in arr.elems.iter().flatten() {
                if elem.spread.is_some() {
                    return None;
                }
                match elem.expr.as_ref() {
                    Expr::Lit(Lit::Str(s)) => values.push(s.value.to_string()),
                    _ => return None,
                }
            }
            Some(SymbolValue::Set(values))
        }
        _ => None,
    }
}

/// Capture a TS enum declaration's string/numeric members as a map
/// (spec §4.2: "Enum declarations whose members have string or numeric
/// initializers are captured as maps").
pub fn capture_enum(decl: &swc_ecma_ast::TsEnumDecl) -> SymbolValue {
    let mut map = HashMap::new();
    for member in &decl.members {
        let name = match &member.id {
            swc_ecma_ast::TsEnumMemberId::Ident(id) => id.sym.to_string(),
            swc_ecma_ast::TsEnumMemberId::Str(s) => s.value.to_string(),
        };
        if let Some(init) = &member.init {
            let value = match init.as_ref() {
                Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
                Expr::Lit(Lit::Num(n)) => Some(format_number(n.value)),
                _ => None,
            };
            if let Some(value) = value {
                map.insert(name, value);
            }
        }
    }
    SymbolValue::Map(map)
}

/// Detect the i18next translation-function parameter type with a single
/// string-literal type argument (spec §4.3 "Typed-parameter detection"),
/// returning the literal namespace string if recognized.
pub fn extract_typed_param_namespace(ann: &TsTypeAnn) -> Option<String> {
    let TsType::TsTypeRef(type_ref) = ann.type_ann.as_ref() else {
        return None;
    };
    let params = type_ref.type_params.as_ref()?;
    let first = params.params.first()?;
    match resolve_ts_literal_type(first) {
        Ok(values) if values.len() == 1 => Some(values.into_iter().next().unwrap()),
        _ => None,
    }
}
