//! The tree-walking evaluator (spec §4.I).
//!
//! Axis collection follows `petty-xpath1::axes`'s "one pure collector
//! function per axis" shape, adapted from its generic `DataSourceNode`
//! trait to this crate's own `Document`/`NodeId` pair (SPEC_FULL.md §4.H/
//! 4.I: "specializes that idea directly ... since there is exactly one
//! data source"), and extended with `ancestor-or-self` and `namespace` to
//! reach all thirteen axes, plus `following`/`preceding` via a document
//! order key instead of the teacher's post-hoc `.sort()` in its own tests.

use super::ast::*;
use super::functions;
use super::value::Value;
use crate::dom::{Document, NodeId, NodeKind};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct VariableScope {
    vars: Rc<HashMap<String, Value>>,
}

impl VariableScope {
    pub fn new() -> Self {
        VariableScope::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        Rc::make_mut(&mut self.vars).insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// The evaluation context (spec §4.I "Evaluation context"): a variable
/// scope, the context node, and the context node-set used by
/// `position()`/`last()`.
pub struct Context<'a> {
    pub doc: &'a Document,
    pub node: NodeId,
    pub node_set: Vec<NodeId>,
    pub position: usize,
    pub vars: VariableScope,
}

impl<'a> Context<'a> {
    pub fn new(doc: &'a Document, node: NodeId, vars: VariableScope) -> Self {
        Context { doc, node, node_set: vec![node], position: 1, vars }
    }

    fn with_node(&self, node: NodeId, node_set: Vec<NodeId>, position: usize) -> Context<'a> {
        Context { doc: self.doc, node, node_set, position, vars: self.vars.clone() }
    }
}

pub fn eval(expr: &Expression, ctx: &Context) -> Value {
    match expr {
        Expression::Literal(s) => Value::String(s.clone()),
        Expression::Number(n) => Value::Number(*n),
        Expression::Variable(name) => ctx.vars.get(name).cloned().unwrap_or(Value::Undef),
        Expression::LocationPath(path) => Value::NodeSet(eval_location_path(path, ctx)),
        Expression::FunctionCall { name, args } => functions::call(name, args, ctx),
        Expression::UnaryOp { op: UnaryOperator::Minus, expr } => Value::Number(-eval(expr, ctx).to_number()),
        Expression::BinaryOp { left, op, right } => eval_binary(*op, left, right, ctx),
    }
}

fn eval_binary(op: BinaryOperator, left: &Expression, right: &Expression, ctx: &Context) -> Value {
    use BinaryOperator::*;
    match op {
        Or => Value::Bool(eval(left, ctx).to_bool() || eval(right, ctx).to_bool()),
        And => Value::Bool(eval(left, ctx).to_bool() && eval(right, ctx).to_bool()),
        Equals | NotEquals => {
            let l = eval(left, ctx);
            let r = eval(right, ctx);
            let eq = compare_equality(&l, &r, ctx.doc);
            Value::Bool(if op == Equals { eq } else { !eq })
        }
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            let l = eval(left, ctx).to_number();
            let r = eval(right, ctx).to_number();
            let result = match op {
                LessThan => l < r,
                LessThanOrEqual => l <= r,
                GreaterThan => l > r,
                GreaterThanOrEqual => l >= r,
                _ => unreachable!(),
            };
            Value::Bool(result)
        }
        Plus => Value::Number(eval(left, ctx).to_number() + eval(right, ctx).to_number()),
        Minus => Value::Number(eval(left, ctx).to_number() - eval(right, ctx).to_number()),
        Multiply => Value::Number(eval(left, ctx).to_number() * eval(right, ctx).to_number()),
        Divide => Value::Number(eval(left, ctx).to_number() / eval(right, ctx).to_number()),
        Modulo => {
            let l = eval(left, ctx).to_number();
            let r = eval(right, ctx).to_number();
            Value::Number(l % r)
        }
        Union => {
            let mut ns = eval(left, ctx).to_node_set();
            ns.extend(eval(right, ctx).to_node_set());
            dedup_preserve_order(&mut ns);
            Value::NodeSet(sort_document_order(ctx.doc, ns))
        }
    }
}

/// Equality with XPath's type-promotion rules (spec §4.I "Equality").
fn compare_equality(l: &Value, r: &Value, doc: &Document) -> bool {
    match (l, r) {
        (Value::NodeSet(a), Value::NodeSet(b)) => {
            a.iter().any(|&x| b.iter().any(|&y| doc.str(x) == doc.str(y)))
        }
        (Value::NodeSet(ns), other) | (other, Value::NodeSet(ns)) => match other {
            Value::Number(n) => ns.iter().any(|&id| id_to_number(doc, id) == *n),
            Value::String(s) => ns.iter().any(|&id| &doc.str(id) == s),
            Value::Bool(b) => *b == !ns.is_empty(),
            Value::Undef => false,
            Value::NodeSet(_) => unreachable!(),
        },
        (Value::Bool(_), _) | (_, Value::Bool(_)) => l.to_bool() == r.to_bool(),
        (Value::Number(_), _) | (_, Value::Number(_)) => l.to_number() == r.to_number(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Undef, Value::Undef) => true,
        (Value::Undef, _) | (_, Value::Undef) => false,
    }
}

fn id_to_number(doc: &Document, id: NodeId) -> f64 {
    doc.str(id).trim().parse().unwrap_or(f64::NAN)
}

fn eval_location_path(path: &LocationPath, ctx: &Context) -> Vec<NodeId> {
    let mut steps = path.steps.iter();
    let mut current: Vec<NodeId> = match &path.start_point {
        Some(expr) => eval(expr, ctx).to_node_set(),
        None if path.is_absolute => match steps.next() {
            Some(first) => finish_step(first, root_axis_candidates(ctx.doc, first.axis), ctx),
            None => Vec::new(),
        },
        None => vec![ctx.node],
    };

    for step in steps {
        let mut next: Vec<NodeId> = Vec::new();
        for (i, &node) in current.iter().enumerate() {
            let step_ctx = ctx.with_node(node, current.clone(), i + 1);
            next.extend(eval_step(step, &step_ctx));
        }
        dedup_preserve_order(&mut next);
        current = sort_document_order(ctx.doc, next);
    }
    current
}

fn eval_step(step: &Step, ctx: &Context) -> Vec<NodeId> {
    finish_step(step, axis_candidates(ctx.doc, ctx.node, step.axis), ctx)
}

fn finish_step(step: &Step, candidates: Vec<NodeId>, ctx: &Context) -> Vec<NodeId> {
    let mut matched: Vec<NodeId> =
        candidates.into_iter().filter(|&n| node_test_matches(ctx.doc, n, &step.node_test, step.axis)).collect();
    matched = sort_document_order(ctx.doc, matched);

    for predicate in &step.predicates {
        let snapshot = matched.clone();
        matched = snapshot
            .iter()
            .enumerate()
            .filter(|(i, &node)| {
                let pred_ctx = ctx.with_node(node, snapshot.clone(), i + 1);
                eval_predicate(predicate, &pred_ctx)
            })
            .map(|(_, &node)| node)
            .collect();
    }
    matched
}

/// Candidates for a location path's first step when the path is absolute:
/// there is no real `NodeId` for the document root in this arena, so the
/// only axes that make sense here are the ones every absolute path
/// actually uses (`child`, `descendant`, `descendant-or-self`); the
/// document root's own `self` member of `descendant-or-self` is dropped
/// since it cannot match any name or type test anyway.
fn root_axis_candidates(doc: &Document, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.all_nodes(None).collect(),
        Axis::Descendant | Axis::DescendantOrSelf => doc.descendants(None).collect(),
        _ => Vec::new(),
    }
}

fn eval_predicate(expr: &Expression, ctx: &Context) -> bool {
    match eval(expr, ctx) {
        Value::Number(n) => n == ctx.position as f64,
        other => other.to_bool(),
    }
}

fn node_test_matches(doc: &Document, candidate: NodeId, test: &NodeTest, axis: Axis) -> bool {
    match test {
        NodeTest::NodeType(NodeTypeTest::Node) => true,
        NodeTest::NodeType(NodeTypeTest::Text) => matches!(doc.kind(candidate), NodeKind::Text | NodeKind::CData),
        NodeTest::NodeType(NodeTypeTest::Comment) => doc.kind(candidate) == NodeKind::Comment,
        NodeTest::NodeType(NodeTypeTest::ProcessingInstruction) => doc.kind(candidate) == NodeKind::ProcessingInstruction,
        NodeTest::Wildcard => is_principal_type(doc, candidate, axis),
        NodeTest::Name(name) => is_principal_type(doc, candidate, axis) && local_part(name) == doc.local_name(candidate),
    }
}

fn is_principal_type(doc: &Document, candidate: NodeId, axis: Axis) -> bool {
    match axis {
        Axis::Attribute => doc.kind(candidate) == NodeKind::Attribute && !doc.is_namespace_decl(candidate),
        Axis::Namespace => doc.kind(candidate) == NodeKind::Attribute && doc.is_namespace_decl(candidate),
        _ => doc.is_element(candidate),
    }
}

fn local_part(name: &str) -> &str {
    match name.find(':') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

/// Raw (node-test-unfiltered) candidates for one axis (spec §4.I axis
/// table).
fn axis_candidates(doc: &Document, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::SelfAxis => vec![context],
        Axis::Parent => doc.parent(context).into_iter().collect(),
        Axis::Ancestor => collect_ancestors(doc, context),
        Axis::AncestorOrSelf => {
            let mut v = vec![context];
            v.extend(collect_ancestors(doc, context));
            v
        }
        Axis::Child => {
            if doc.is_element(context) {
                doc.all_nodes(Some(context)).collect()
            } else {
                Vec::new()
            }
        }
        Axis::Descendant => {
            if doc.is_element(context) {
                doc.descendants(Some(context)).collect()
            } else {
                Vec::new()
            }
        }
        Axis::DescendantOrSelf => {
            let mut v = vec![context];
            if doc.is_element(context) {
                v.extend(doc.descendants(Some(context)));
            }
            v
        }
        Axis::FollowingSibling => {
            let mut v = Vec::new();
            let mut cur = doc.next_sibling(context);
            while let Some(n) = cur {
                v.push(n);
                cur = doc.next_sibling(n);
            }
            v
        }
        Axis::PrecedingSibling => {
            let mut v = Vec::new();
            let mut cur = doc.previous_sibling(context);
            while let Some(n) = cur {
                v.push(n);
                cur = doc.previous_sibling(n);
            }
            v
        }
        Axis::Following => axis_following(doc, context),
        Axis::Preceding => axis_preceding(doc, context),
        Axis::Attribute => {
            if doc.is_element(context) {
                doc.attributes(context).to_vec()
            } else {
                Vec::new()
            }
        }
        Axis::Namespace => {
            if doc.is_element(context) {
                doc.visible_namespaces(context).into_iter().map(|(_, _, id)| id).collect()
            } else {
                Vec::new()
            }
        }
    }
}

fn collect_ancestors(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let mut v = Vec::new();
    let mut cur = doc.parent(node);
    while let Some(p) = cur {
        v.push(p);
        cur = doc.parent(p);
    }
    v
}

fn axis_following(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let ctx_key = order_key(doc, context);
    doc.descendants(None).filter(|&n| order_key(doc, n) > ctx_key && !is_ancestor(doc, context, n)).collect()
}

fn axis_preceding(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let ctx_key = order_key(doc, context);
    doc.descendants(None).filter(|&n| order_key(doc, n) < ctx_key && !is_ancestor(doc, n, context)).collect()
}

fn is_ancestor(doc: &Document, ancestor: NodeId, node: NodeId) -> bool {
    let mut cur = doc.parent(node);
    while let Some(p) = cur {
        if p == ancestor {
            return true;
        }
        cur = doc.parent(p);
    }
    false
}

/// A node's position in document order, as a lexicographically comparable
/// key: a sequence of sibling indices from the document root down to the
/// node, with attribute/namespace nodes (declared `Attr` before `Elem` so
/// they sort right after their owner element, before its children) keyed
/// off their owner element's path.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
enum Seg {
    Attr(usize),
    Elem(usize),
}

fn order_key(doc: &Document, node: NodeId) -> Vec<Seg> {
    if doc.kind(node) == NodeKind::Attribute {
        let owner = doc.parent(node).expect("attribute node always has an owner element");
        let mut key = order_key(doc, owner);
        let idx = doc.attributes(owner).iter().position(|&id| id == node).unwrap_or(0);
        key.push(Seg::Attr(idx));
        return key;
    }
    let mut path = Vec::new();
    let mut cur = node;
    loop {
        let parent = doc.parent(cur);
        let idx = doc.all_nodes(parent).position(|x| x == cur).unwrap_or(0);
        path.push(Seg::Elem(idx));
        match parent {
            Some(p) => cur = p,
            None => break,
        }
    }
    path.reverse();
    path
}

fn sort_document_order(doc: &Document, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes.sort_by_key(|&n| order_key(doc, n));
    nodes
}

fn dedup_preserve_order(nodes: &mut Vec<NodeId>) {
    let mut seen = std::collections::HashSet::new();
    nodes.retain(|n| seen.insert(*n));
}

/// `xpath.matches(node)`: `node` is a member of evaluating the path from
/// the document root (spec §4.I "Matches").
pub fn matches(expr: &Expression, doc: &Document, node: NodeId) -> bool {
    let Some(root) = doc.root_element() else { return false };
    let ctx = Context::new(doc, root, VariableScope::new());
    eval(expr, &ctx).to_node_set().contains(&node)
}
