// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolution chain tracking (circular dependency detection)
//!
//! A chain is the path of module ids from the top-level `use` down to the
//! module currently being resolved. Every branch of the dependency call
//! tree carries its own copy: a `require` hands the child a clone of the
//! parent's path, so sibling requirements running concurrently never see
//! each other while a module that requires one of its own ancestors
//! always finds itself on the path.
//!
//! All copies made from one top-level chain also share a wait graph: an
//! edge `a -> b` for every pending `require` of `b` made by `a`. A cycle
//! closing across sibling branches shows up there as a route back to the
//! requesting module.

use crate::error::{CHAIN_SEPARATOR, ModuleError, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::trace;

/// Ordered set of module ids currently being resolved on one path
#[derive(Debug, Clone, Default)]
pub struct ResolutionChain {
    stack: Vec<String>,
    members: HashSet<String>,
    waits: Arc<Mutex<WaitGraph>>,
}

/// Pending requires within one top-level resolution
#[derive(Debug, Default)]
struct WaitGraph {
    edges: HashMap<String, Vec<String>>,
}

impl WaitGraph {
    fn insert(&mut self, from: &str, to: &str) {
        self.edges.entry(from.to_string()).or_default().push(to.to_string());
    }

    fn remove(&mut self, from: &str, to: &str) {
        if let Some(targets) = self.edges.get_mut(from) {
            if let Some(pos) = targets.iter().position(|t| t == to) {
                targets.swap_remove(pos);
            }
            if targets.is_empty() {
                self.edges.remove(from);
            }
        }
    }

    /// Shortest route `from => .. => to` along pending requires
    fn route(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut parents: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut route = vec![to.to_string()];
                let mut cursor = to;
                while let Some(&parent) = parents.get(cursor) {
                    route.push(parent.to_string());
                    cursor = parent;
                }
                route.reverse();
                return Some(route);
            }
            for next in self.edges.get(node).into_iter().flatten().map(String::as_str) {
                if next != from && !parents.contains_key(next) {
                    parents.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }
}

/// A pending require recorded in the wait graph; removed on drop
#[derive(Debug)]
pub(crate) struct WaitEdge {
    waits: Arc<Mutex<WaitGraph>>,
    from: String,
    to: String,
}

impl Drop for WaitEdge {
    fn drop(&mut self) {
        self.waits.lock().remove(&self.from, &self.to);
    }
}

impl ResolutionChain {
    /// Create an empty chain (top-level `use`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `id`, failing with a cycle error if it is already on the chain
    pub fn enter(&mut self, id: &str) -> Result<()> {
        if self.members.contains(id) {
            let mut path = self.stack.clone();
            path.push(id.to_string());
            return Err(ModuleError::CyclicDependency { path });
        }
        trace!(module = id, depth = self.stack.len(), "entering resolution chain");
        self.stack.push(id.to_string());
        self.members.insert(id.to_string());
        Ok(())
    }

    /// Pop `id`, which must be the most recently entered id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not tracked or is not on top of the chain.
    #[track_caller]
    pub fn exit(&mut self, id: &str) {
        assert!(
            self.members.remove(id),
            "module '{id}' left a resolution chain it never entered"
        );
        match self.stack.pop() {
            Some(top) if top == id => {
                trace!(module = id, depth = self.stack.len(), "leaving resolution chain");
            }
            top => panic!(
                "module '{id}' left the resolution chain out of order (top was {top:?})"
            ),
        }
    }

    /// Record that the module below the top of the chain waits on the top.
    ///
    /// Fails with a cycle error when the top already waits, through other
    /// branches of the same resolution, on the module requiring it.
    /// Returns `None` for a top-level chain, where nobody is waiting.
    pub(crate) fn register_wait(&self) -> Result<Option<WaitEdge>> {
        let [.., from, to] = self.stack.as_slice() else {
            return Ok(None);
        };

        let mut waits = self.waits.lock();
        if let Some(route) = waits.route(to, from) {
            let mut path = self.stack.clone();
            path.extend(route.into_iter().skip(1));
            return Err(ModuleError::CyclicDependency { path });
        }
        waits.insert(from, to);
        Ok(Some(WaitEdge {
            waits: Arc::clone(&self.waits),
            from: from.clone(),
            to: to.clone(),
        }))
    }

    /// Check if `id` is on the chain
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Number of ids on the chain
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Ids from the outermost module to the innermost
    pub fn path(&self) -> &[String] {
        &self.stack
    }

    /// The chain rendered as `a => b => c`
    pub fn render(&self) -> String {
        self.stack.join(CHAIN_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_exit() {
        let mut chain = ResolutionChain::new();
        chain.enter("a").unwrap();
        chain.enter("b").unwrap();
        assert_eq!(chain.depth(), 2);
        assert!(chain.contains("a"));
        assert_eq!(chain.render(), "a => b");

        chain.exit("b");
        chain.exit("a");
        assert!(chain.is_empty());
        assert!(!chain.contains("a"));
    }

    #[test]
    fn test_reentry_is_cycle() {
        let mut chain = ResolutionChain::new();
        for id in ["module_1", "module_2", "module_3"] {
            chain.enter(id).unwrap();
        }

        let err = chain.enter("module_1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "loop dependencies found: module_1 => module_2 => module_3 => module_1"
        );
        // failed entry leaves the chain untouched
        assert_eq!(chain.depth(), 3);
    }

    #[test]
    fn test_self_dependency() {
        let mut chain = ResolutionChain::new();
        chain.enter("solo").unwrap();
        let err = chain.enter("solo").unwrap_err();
        assert_eq!(err.cycle_path().unwrap(), ["solo", "solo"]);
    }

    #[test]
    fn test_branches_are_independent() {
        let mut root = ResolutionChain::new();
        root.enter("a").unwrap();

        let mut left = root.clone();
        let mut right = root.clone();
        left.enter("b").unwrap();
        right.enter("c").unwrap();
        left.enter("d").unwrap();
        right.enter("d").unwrap();

        assert_eq!(left.render(), "a => b => d");
        assert_eq!(right.render(), "a => c => d");
        assert_eq!(root.depth(), 1);
    }

    fn branch(parent: &ResolutionChain, id: &str) -> ResolutionChain {
        let mut child = parent.clone();
        child.enter(id).unwrap();
        child
    }

    #[test]
    fn test_cycle_across_branches() {
        let root = branch(&ResolutionChain::new(), "x");
        assert!(root.register_wait().unwrap().is_none());

        let y = branch(&root, "y");
        let z = branch(&root, "z");
        let _x_y = y.register_wait().unwrap();
        let _x_z = z.register_wait().unwrap();

        let z_y = branch(&z, "y").register_wait().unwrap();
        let err = branch(&y, "z").register_wait().unwrap_err();
        assert_eq!(err.cycle_path().unwrap(), ["x", "y", "z", "y"]);

        // once z stops waiting on y, y may wait on z
        drop(z_y);
        assert!(branch(&y, "z").register_wait().unwrap().is_some());
    }

    #[test]
    fn test_shared_dependency_is_not_a_cycle() {
        let root = branch(&ResolutionChain::new(), "a");
        let b = branch(&root, "b");
        let c = branch(&root, "c");
        let _edges = [
            b.register_wait().unwrap(),
            c.register_wait().unwrap(),
            branch(&b, "d").register_wait().unwrap(),
            branch(&c, "d").register_wait().unwrap(),
        ];
    }

    #[test]
    fn test_independent_chains_do_not_share_waits() {
        let first = branch(&branch(&ResolutionChain::new(), "p"), "q");
        let second = branch(&branch(&ResolutionChain::new(), "q"), "p");
        let _p_q = first.register_wait().unwrap();
        assert!(second.register_wait().unwrap().is_some());
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn test_exit_out_of_order_panics() {
        let mut chain = ResolutionChain::new();
        chain.enter("a").unwrap();
        chain.enter("b").unwrap();
        chain.exit("a");
    }

    #[test]
    #[should_panic(expected = "never entered")]
    fn test_exit_untracked_panics() {
        let mut chain = ResolutionChain::new();
        chain.exit("ghost");
    }
}
