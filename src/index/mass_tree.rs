//! Augmented interval tree keyed by `min_mass`, each node carrying the
//! maximum `max_mass` of its subtree, answering point-stab and range-overlap
//! queries on the mass dimension in O(log n + k).
//!
//! Intervals with both mass bounds null are not inserted into the tree at
//! all — they go in a side list that every query unions in unconditionally,
//! since they match every mass. A node's own bounds use `-infinity` /
//! `+infinity` sentinels for a one-sided null bound purely as an internal
//! key representation; this never leaks into the stored data model, which
//! keeps bounds as `Option<f64>`.
//!
//! The tree is an unbalanced BST: insertion order determines shape, with no
//! rebalancing. Query cost is O(log n + k) on average but degrades to O(n)
//! under adversarial insertion order; nothing in the workload (mass-sorted
//! batch loads aside) makes that the common case in practice.

use std::collections::HashSet;

use super::Handle;

const NEG_INF: f64 = f64::NEG_INFINITY;
const POS_INF: f64 = f64::INFINITY;

struct Node {
    key_min: f64,
    key_max: f64,
    subtree_max: f64,
    handle: Handle,
    left: Option<usize>,
    right: Option<usize>,
    parent: Option<usize>,
}

enum Slot {
    Occupied(Node),
    Free(Option<usize>),
}

/// The mass-interval index. Never stores or returns `ExclusionInterval`
/// values directly — only the slab [`Handle`]s the store gave it at insert.
#[derive(Default)]
pub struct MassIntervalTree {
    slots: Vec<Slot>,
    free_head: Option<usize>,
    root: Option<usize>,
    handle_to_node: std::collections::HashMap<Handle, usize>,
    null_mass: HashSet<Handle>,
}

impl MassIntervalTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handle_to_node.len() + self.null_mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.root = None;
        self.handle_to_node.clear();
        self.null_mass.clear();
    }

    /// Insert `handle` keyed on `[min_mass, max_mass]`. A fully-null pair is
    /// routed to the side list instead of the tree.
    pub fn insert(&mut self, handle: Handle, min_mass: Option<f64>, max_mass: Option<f64>) {
        if min_mass.is_none() && max_mass.is_none() {
            self.null_mass.insert(handle);
            return;
        }
        let key_min = min_mass.unwrap_or(NEG_INF);
        let key_max = max_mass.unwrap_or(POS_INF);
        let idx = self.alloc(Node {
            key_min,
            key_max,
            subtree_max: key_max,
            handle,
            left: None,
            right: None,
            parent: None,
        });
        self.handle_to_node.insert(handle, idx);

        let Some(root) = self.root else {
            self.root = Some(idx);
            return;
        };
        let mut cur = root;
        loop {
            if key_max > self.node(cur).subtree_max {
                self.node_mut(cur).subtree_max = key_max;
            }
            let go_left = key_min < self.node(cur).key_min;
            let next = if go_left {
                self.node(cur).left
            } else {
                self.node(cur).right
            };
            match next {
                Some(n) => cur = n,
                None => {
                    if go_left {
                        self.node_mut(cur).left = Some(idx);
                    } else {
                        self.node_mut(cur).right = Some(idx);
                    }
                    self.node_mut(idx).parent = Some(cur);
                    return;
                }
            }
        }
    }

    /// Remove one occurrence of `handle`. Returns `false` if `handle` was
    /// never inserted (or already removed).
    pub fn remove(&mut self, handle: Handle) -> bool {
        if self.null_mass.remove(&handle) {
            return true;
        }
        let Some(idx) = self.handle_to_node.remove(&handle) else {
            return false;
        };
        self.remove_node(idx);
        true
    }

    /// All handles whose mass range contains `mass`, plus the null-mass side
    /// list.
    pub fn stab(&self, mass: f64) -> Vec<Handle> {
        self.range_overlap(mass, mass)
    }

    /// All handles whose mass range overlaps `[lo, hi]`, plus the null-mass
    /// side list. `lo`/`hi` may themselves be `NEG_INF`/`POS_INF` to mean an
    /// unbounded query side.
    pub fn range_overlap(&self, lo: f64, hi: f64) -> Vec<Handle> {
        let mut out = Vec::new();
        self.range_rec(self.root, lo, hi, &mut out);
        out.extend(self.null_mass.iter().copied());
        out
    }

    fn range_rec(&self, idx: Option<usize>, lo: f64, hi: f64, out: &mut Vec<Handle>) {
        let Some(i) = idx else { return };
        let n = self.node(i);
        if n.subtree_max < lo {
            return;
        }
        self.range_rec(n.left, lo, hi, out);
        if n.key_min <= hi && n.key_max >= lo {
            out.push(n.handle);
        }
        if n.key_min <= hi {
            self.range_rec(n.right, lo, hi, out);
        }
    }

    fn remove_node(&mut self, idx: usize) {
        let left = self.node(idx).left;
        let right = self.node(idx).right;

        if let (Some(_), Some(right)) = (left, right) {
            let mut succ = right;
            while let Some(l) = self.node(succ).left {
                succ = l;
            }
            let succ_key_min = self.node(succ).key_min;
            let succ_key_max = self.node(succ).key_max;
            let succ_handle = self.node(succ).handle;
            self.node_mut(idx).key_min = succ_key_min;
            self.node_mut(idx).key_max = succ_key_max;
            self.node_mut(idx).handle = succ_handle;
            self.handle_to_node.insert(succ_handle, idx);
            self.remove_node(succ);
            return;
        }

        let child = left.or(right);
        let parent = self.node(idx).parent;
        if let Some(c) = child {
            self.node_mut(c).parent = parent;
        }
        match parent {
            None => self.root = child,
            Some(p) => {
                if self.node(p).left == Some(idx) {
                    self.node_mut(p).left = child;
                } else {
                    self.node_mut(p).right = child;
                }
            }
        }
        self.dealloc(idx);
        self.recompute_up(parent);
    }

    fn recompute(&mut self, idx: usize) {
        let mut m = self.node(idx).key_max;
        if let Some(l) = self.node(idx).left {
            m = m.max(self.node(l).subtree_max);
        }
        if let Some(r) = self.node(idx).right {
            m = m.max(self.node(r).subtree_max);
        }
        self.node_mut(idx).subtree_max = m;
    }

    fn recompute_up(&mut self, mut idx: Option<usize>) {
        while let Some(i) = idx {
            self.recompute(i);
            idx = self.node(i).parent;
        }
    }

    fn alloc(&mut self, node: Node) -> usize {
        if let Some(free) = self.free_head {
            let next_free = match &self.slots[free] {
                Slot::Free(n) => *n,
                Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
            };
            self.free_head = next_free;
            self.slots[free] = Slot::Occupied(node);
            free
        } else {
            self.slots.push(Slot::Occupied(node));
            self.slots.len() - 1
        }
    }

    fn dealloc(&mut self, idx: usize) {
        self.slots[idx] = Slot::Free(self.free_head);
        self.free_head = Some(idx);
    }

    fn node(&self, idx: usize) -> &Node {
        match &self.slots[idx] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling mass tree index"),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        match &mut self.slots[idx] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling mass tree index"),
        }
    }
}
