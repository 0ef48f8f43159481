//! Projector promotion: a tree rewrite that hoists projector nodes toward
//! the root and merges equal ones.
//!
//! Trees are usually built with a projector directly above each leaf, so
//! every branch re-transforms the same query coordinate. Promotion pulls
//! each projector up through single-input nodes, and where both children of
//! a binary node end up wearing equal projectors it strips them and inserts
//! one shared projector above the binary node. The rewrite runs bottom-up
//! and is idempotent.

use std::mem;

use crate::node::{DataNode, ProjectNode};

/// Promote and merge projectors throughout the tree. Call once after
/// construction or after [`DataNode::set_orbit`].
pub fn promote_projectors(root: &mut Box<DataNode>) {
    promote_at(root);
}

fn promote_at(slot: &mut Box<DataNode>) {
    match slot.as_mut() {
        DataNode::Null | DataNode::Source(_) => {}
        DataNode::Project(node) => promote_at(&mut node.input),
        DataNode::Unary(node) => promote_at(&mut node.input),
        DataNode::Average(node) => promote_at(&mut node.input),
        DataNode::StdDev(node) => promote_at(&mut node.input),
        DataNode::Binary(node) => {
            promote_at(&mut node.left);
            promote_at(&mut node.right);
        }
    }
    hoist_above(slot);
    merge_above(slot);
}

/// Take the projector out of `input` if one sits there, leaving its child in
/// place. Anything else stays untouched.
fn lift_projector(input: &mut Box<DataNode>) -> Option<ProjectNode> {
    let child = mem::take(input.as_mut());
    match child {
        DataNode::Project(project) => Some(project),
        other => {
            **input = other;
            None
        }
    }
}

/// Rotate a projector sitting directly under a single-input node above that
/// node. Leaves, projectors and binary nodes are left alone; binary nodes
/// only ever gain a projector through [`merge_above`].
fn hoist_above(slot: &mut Box<DataNode>) {
    let projector = {
        let input = match slot.as_mut() {
            DataNode::Unary(node) => &mut node.input,
            DataNode::Average(node) => &mut node.input,
            DataNode::StdDev(node) => &mut node.input,
            _ => return,
        };
        let Some(project) = lift_projector(input) else {
            return;
        };
        let ProjectNode {
            projector,
            input: grandchild,
        } = project;
        *input = grandchild;
        projector
    };

    let body = mem::take(slot.as_mut());
    **slot = DataNode::Project(ProjectNode {
        projector,
        input: Box::new(body),
    });
}

/// If both children of a binary node are projectors with equal, valid
/// parameters, strip them and insert a single shared projector above the
/// binary node. Unequal or invalid projectors leave the tree unchanged.
fn merge_above(slot: &mut Box<DataNode>) {
    let shared = match slot.as_ref() {
        DataNode::Binary(node) => match (node.left.as_ref(), node.right.as_ref()) {
            (DataNode::Project(left), DataNode::Project(right)) => {
                match (left.projector, right.projector) {
                    (Some(l), Some(r)) if l == r => l,
                    _ => return,
                }
            }
            _ => return,
        },
        _ => return,
    };

    if let DataNode::Binary(node) = slot.as_mut() {
        for child in [&mut node.left, &mut node.right] {
            if let Some(project) = lift_projector(child) {
                *child = project.input;
            }
        }
    }

    let body = mem::take(slot.as_mut());
    **slot = DataNode::Project(ProjectNode {
        projector: Some(shared),
        input: Box::new(body),
    });
}
