//! Path-addressed access into nested [`Node`] trees.
//!
//! `get(root, [a, b, c])` is `root[a][b][c]`; `set` assigns at the final segment.

use crate::core::document::{Node, PathSegment, display_path};
use crate::core::error::TinbergenError;

fn step<'a>(
    node: &'a Node,
    seg: &PathSegment,
    path: &[PathSegment],
    depth: usize,
) -> Result<&'a Node, TinbergenError> {
    let found = match (node, seg) {
        (Node::Map(map), PathSegment::Key(key)) => map.get(key),
        (Node::List(items), PathSegment::Index(i)) => items.get(*i),
        _ => None,
    };
    found.ok_or_else(|| unresolved(node, path, depth))
}

fn step_mut<'a>(
    node: &'a mut Node,
    seg: &PathSegment,
    path: &[PathSegment],
    depth: usize,
) -> Result<&'a mut Node, TinbergenError> {
    let found = match seg {
        PathSegment::Key(key) => match node {
            Node::Map(map) => map.get_mut(key),
            _ => None,
        },
        PathSegment::Index(i) => match node {
            Node::List(items) => items.get_mut(*i),
            _ => None,
        },
    };
    match found {
        Some(child) => Ok(child),
        None => Err(TinbergenError::LookupError(format!(
            "path {} does not resolve at segment {}",
            display_path(path),
            depth
        ))),
    }
}

fn unresolved(node: &Node, path: &[PathSegment], depth: usize) -> TinbergenError {
    TinbergenError::LookupError(format!(
        "path {} does not resolve: segment {} ({}) not found in {}",
        display_path(path),
        depth,
        path[depth],
        node.type_name()
    ))
}

pub fn get<'a>(root: &'a Node, path: &[PathSegment]) -> Result<&'a Node, TinbergenError> {
    let mut item = root;
    for (depth, seg) in path.iter().enumerate() {
        item = step(item, seg, path, depth)?;
    }
    Ok(item)
}

pub fn get_mut<'a>(root: &'a mut Node, path: &[PathSegment]) -> Result<&'a mut Node, TinbergenError> {
    let mut item = root;
    for (depth, seg) in path.iter().enumerate() {
        item = step_mut(item, seg, path, depth)?;
    }
    Ok(item)
}

/// Assign `value` at `path`. A missing final map key is inserted; a final list
/// index must already exist.
pub fn set(root: &mut Node, path: &[PathSegment], value: Node) -> Result<(), TinbergenError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(TinbergenError::LookupError(
            "cannot set at an empty path".to_string(),
        ));
    };
    let container = get_mut(root, parents)?;
    match (container, last) {
        (Node::Map(map), PathSegment::Key(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Node::List(items), PathSegment::Index(i)) if *i < items.len() => {
            items[*i] = value;
            Ok(())
        }
        (container, last) => Err(TinbergenError::LookupError(format!(
            "path {} does not resolve: cannot assign {} in {}",
            display_path(path),
            last,
            container.type_name()
        ))),
    }
}
