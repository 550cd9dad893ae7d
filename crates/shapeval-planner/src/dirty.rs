//! Incremental dirty check: does a transaction's delta touch a subtree?
//!
//! A shape needs evaluation when the delta has a statement matching its
//! target selectors or its effective path predicate, or when any sub-shape
//! needs evaluation. Negation does not change the answer.

use shapeval_core::shape::{NodeShape, Shape};
use shapeval_core::source::Delta;

use crate::combinators::ShapePlanner;
use crate::context::Frame;
use crate::error::Result;

pub(crate) fn requires_evaluation(shape: &Shape, frame: Frame<'_>, delta: &Delta) -> Result<bool> {
    if shape.deactivated {
        return Ok(false);
    }
    let frame = frame.enter(shape);
    if own_selection_touched(frame, delta)? {
        return Ok(true);
    }
    for child in shape.children() {
        if child.requires_evaluation(frame, delta)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn own_selection_touched(frame: Frame<'_>, delta: &Delta) -> Result<bool> {
    for target in frame.targets() {
        if target.touched_by(delta)? {
            return Ok(true);
        }
    }
    match frame.path() {
        Some(path) => Ok(delta.touches(None, Some(path.predicate()), None)?),
        None => Ok(false),
    }
}

/// Dirty check for a whole node shape.
pub fn node_requires_evaluation(node: &NodeShape, delta: &Delta) -> Result<bool> {
    if node.deactivated {
        return Ok(false);
    }
    let frame = Frame::root(node);
    for target in &node.targets {
        if target.touched_by(delta)? {
            return Ok(true);
        }
    }
    for shape in &node.shapes {
        if shape.requires_evaluation(frame, delta)? {
            return Ok(true);
        }
    }
    Ok(false)
}
