//! The twenty-seven core functions (spec §4.I "Core function library").
//!
//! `comment()` is omitted deliberately: spec prose lists it alongside the
//! other twenty-seven names while also calling the library "27 functions,"
//! which is one name too many for its own count. Real XPath 1.0 has no
//! `comment()` function (only a `comment()` node-type test, already handled
//! in `eval::node_test_matches`), so the inconsistency is resolved in favor
//! of the standard, and the count in this library is exactly 27 (see
//! `DESIGN.md`).

use super::ast::Expression;
use super::eval::{self, Context};
use super::value::Value;

pub fn call(name: &str, args: &[Expression], ctx: &Context) -> Value {
    let a = |i: usize| eval::eval(&args[i], ctx);
    match name {
        "last" => Value::Number(ctx.node_set.len() as f64),
        "position" => Value::Number(ctx.position as f64),
        "count" => Value::Number(a(0).to_node_set().len() as f64),
        "id" => Value::NodeSet(fn_id(ctx, &a(0))),
        "local-name" => Value::String(fn_local_name(ctx, args)),
        "namespace-uri" => Value::String(fn_namespace_uri(ctx, args)),
        "name" => Value::String(fn_name(ctx, args)),
        "string" => Value::String(fn_string(ctx, args)),
        "concat" => Value::String(args.iter().map(|e| eval::eval(e, ctx).to_string_with(Some(ctx.doc))).collect()),
        "starts-with" => Value::Bool(str_arg(ctx, 0, args).starts_with(&str_arg(ctx, 1, args))),
        "contains" => Value::Bool(str_arg(ctx, 0, args).contains(&str_arg(ctx, 1, args))),
        "substring-before" => Value::String(fn_substring_before(ctx, args)),
        "substring-after" => Value::String(fn_substring_after(ctx, args)),
        "substring" => Value::String(fn_substring(ctx, args)),
        "string-length" => Value::Number(fn_string_length(ctx, args) as f64),
        "normalize-space" => Value::String(fn_normalize_space(ctx, args)),
        "translate" => Value::String(fn_translate(ctx, args)),
        "boolean" => Value::Bool(a(0).to_bool()),
        "not" => Value::Bool(!a(0).to_bool()),
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "lang" => Value::Bool(fn_lang(ctx, args)),
        "number" => Value::Number(if args.is_empty() { Value::String(node_string(ctx)).to_number() } else { a(0).to_number() }),
        "sum" => Value::Number(a(0).to_node_set().iter().map(|&n| ctx.doc.str(n).trim().parse::<f64>().unwrap_or(f64::NAN)).sum()),
        "floor" => Value::Number(a(0).to_number().floor()),
        "ceiling" => Value::Number(a(0).to_number().ceil()),
        "round" => Value::Number(round_xpath(a(0).to_number())),
        _ => Value::Undef,
    }
}

fn round_xpath(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        return n;
    }
    (n + 0.5).floor()
}

fn str_arg(ctx: &Context, i: usize, args: &[Expression]) -> String {
    eval::eval(&args[i], ctx).to_string_with(Some(ctx.doc))
}

fn node_string(ctx: &Context) -> String {
    ctx.doc.str(ctx.node)
}

fn fn_string(ctx: &Context, args: &[Expression]) -> String {
    if args.is_empty() {
        node_string(ctx)
    } else {
        eval::eval(&args[0], ctx).to_string_with(Some(ctx.doc))
    }
}

/// `id(object)` (spec §4.I): each whitespace-separated token in the
/// argument's string value is looked up against every ID-marked attribute
/// in the document.
fn fn_id(ctx: &Context, arg: &Value) -> Vec<crate::dom::NodeId> {
    let tokens: Vec<String> = match arg {
        Value::NodeSet(ns) => ns.iter().flat_map(|&n| ctx.doc.str(n).split_whitespace().map(str::to_string).collect::<Vec<_>>()).collect(),
        other => other.to_string_with(Some(ctx.doc)).split_whitespace().map(str::to_string).collect(),
    };
    let mut out = Vec::new();
    for node in ctx.doc.descendants(None).filter(|&n| ctx.doc.is_element(n)) {
        for &attr in ctx.doc.attributes(node) {
            if ctx.doc.is_id_attribute(attr) && tokens.iter().any(|t| t == ctx.doc.attribute_value(attr)) {
                out.push(node);
            }
        }
    }
    out
}

fn first_or_context(ctx: &Context, args: &[Expression]) -> Option<crate::dom::NodeId> {
    if args.is_empty() {
        Some(ctx.node)
    } else {
        eval::eval(&args[0], ctx).to_node_set().first().copied()
    }
}

fn fn_local_name(ctx: &Context, args: &[Expression]) -> String {
    match first_or_context(ctx, args) {
        Some(n) => ctx.doc.local_name(n).to_string(),
        None => String::new(),
    }
}

fn fn_namespace_uri(ctx: &Context, args: &[Expression]) -> String {
    match first_or_context(ctx, args) {
        Some(n) => ctx.doc.namespace_for_prefix(n, ctx.doc.prefix(n)).unwrap_or("").to_string(),
        None => String::new(),
    }
}

fn fn_name(ctx: &Context, args: &[Expression]) -> String {
    match first_or_context(ctx, args) {
        Some(n) => ctx.doc.qname(n).unwrap_or("").to_string(),
        None => String::new(),
    }
}

fn fn_substring_before(ctx: &Context, args: &[Expression]) -> String {
    let s = str_arg(ctx, 0, args);
    let needle = str_arg(ctx, 1, args);
    match s.find(&needle) {
        Some(i) => s[..i].to_string(),
        None => String::new(),
    }
}

fn fn_substring_after(ctx: &Context, args: &[Expression]) -> String {
    let s = str_arg(ctx, 0, args);
    let needle = str_arg(ctx, 1, args);
    match s.find(&needle) {
        Some(i) => s[i + needle.len()..].to_string(),
        None => String::new(),
    }
}

/// `substring(string, start, length?)`: 1-based, with the rounding and
/// fractional-position rules of the standard (spec §4.I).
fn fn_substring(ctx: &Context, args: &[Expression]) -> String {
    let s = str_arg(ctx, 0, args);
    let chars: Vec<char> = s.chars().collect();
    let start = round_xpath(eval::eval(&args[1], ctx).to_number());
    let len = if args.len() > 2 { round_xpath(eval::eval(&args[2], ctx).to_number()) } else { f64::INFINITY };
    if start.is_nan() || len.is_nan() {
        return String::new();
    }
    let end = if len.is_infinite() && len > 0.0 { f64::INFINITY } else { start + len };
    let mut out = String::new();
    for (i, &c) in chars.iter().enumerate() {
        let pos = (i + 1) as f64;
        if pos >= start && pos < end {
            out.push(c);
        }
    }
    out
}

fn fn_string_length(ctx: &Context, args: &[Expression]) -> usize {
    let s = if args.is_empty() { node_string(ctx) } else { str_arg(ctx, 0, args) };
    s.chars().count()
}

fn fn_normalize_space(ctx: &Context, args: &[Expression]) -> String {
    let s = if args.is_empty() { node_string(ctx) } else { str_arg(ctx, 0, args) };
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fn_translate(ctx: &Context, args: &[Expression]) -> String {
    let s = str_arg(ctx, 0, args);
    let from: Vec<char> = str_arg(ctx, 1, args).chars().collect();
    let to: Vec<char> = str_arg(ctx, 2, args).chars().collect();
    s.chars()
        .filter_map(|c| match from.iter().position(|&f| f == c) {
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect()
}

fn fn_lang(ctx: &Context, args: &[Expression]) -> bool {
    let wanted = str_arg(ctx, 0, args).to_ascii_lowercase();
    let mut cur = Some(ctx.node);
    while let Some(n) = cur {
        if ctx.doc.is_element(n) {
            if let Some(v) = ctx.doc.attribute_value_by_qname(n, "xml:lang") {
                let v = v.to_ascii_lowercase();
                return v == wanted || v.starts_with(&format!("{}-", wanted));
            }
        }
        cur = ctx.doc.parent(n);
    }
    false
}
