//! Balanced median-split point kd-tree (§4.6, C6): a complete binary tree
//! stored as a flat level-order array, built by repeated median-select
//! instead of the acceleration structure's SAH build. Each node (not just
//! leaves) holds one point, the classic photon-map kd-tree shape.

use std::collections::BinaryHeap;

use crate::{Float, Point3f};

pub trait HasPosition {
    fn position(&self) -> Point3f;
}

fn axis_of(p: Point3f, axis: u8) -> Float {
    match axis {
        0 => p.x,
        1 => p.y,
        _ => p.z,
    }
}

fn extent_axis(items: &[impl HasPosition]) -> u8 {
    let mut min = Point3f::new(Float::INFINITY, Float::INFINITY, Float::INFINITY);
    let mut max = Point3f::new(Float::NEG_INFINITY, Float::NEG_INFINITY, Float::NEG_INFINITY);
    for item in items {
        let p = item.position();
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }
    let d = (max.x - min.x, max.y - min.y, max.z - min.z);
    if d.0 > d.1 && d.0 > d.2 {
        0
    } else if d.1 > d.2 {
        1
    } else {
        2
    }
}

#[derive(Clone, Copy)]
struct KdNode {
    axis: u8,
    split_pos: Float,
    is_leaf: bool,
}

pub struct PointKdTree<T> {
    nodes: Vec<KdNode>,
    /// `items[i]` is the point stored at tree node `i` (level-order, `i`'s
    /// children at `2i+1`/`2i+2`), reordered in place during the build's
    /// recursive median-select.
    items: Vec<T>,
}

impl<T: HasPosition + Clone> PointKdTree<T> {
    pub fn build(mut items: Vec<T>) -> Self {
        let n = items.len();
        let mut nodes = vec![KdNode { axis: 0, split_pos: 0.0, is_leaf: true }; n];
        if n > 0 {
            Self::build_range(0, 0, n, &mut nodes, &mut items);
        }
        Self { nodes, items }
    }

    fn build_range(node_num: usize, start: usize, end: usize, nodes: &mut [KdNode], items: &mut [T]) {
        if end - start == 1 {
            nodes[node_num] = KdNode { axis: 0, split_pos: 0.0, is_leaf: true };
            return;
        }

        let axis = extent_axis(&items[start..end]);
        let mid = (start + end) / 2;
        items[start..end].select_nth_unstable_by(mid - start, |a, b| {
            axis_of(a.position(), axis).partial_cmp(&axis_of(b.position(), axis)).unwrap()
        });
        nodes[node_num] = KdNode { axis, split_pos: axis_of(items[mid].position(), axis), is_leaf: false };

        if start < mid {
            Self::build_range(2 * node_num + 1, start, mid, nodes, items);
        }
        if mid + 1 < end {
            Self::build_range(2 * node_num + 2, mid + 1, end, nodes, items);
        }
    }

    /// k-NN lookup (§4.6): descends near-child-first, pruning the far child
    /// unless the split-plane distance is inside the current worst radius.
    /// Returns up to `k` `(dist_squared, item)` pairs (unsorted, heap order)
    /// and the final squared search radius.
    pub fn lookup(&self, p: Point3f, k: usize, initial_max_dist2: Float) -> (Vec<(Float, T)>, Float) {
        let mut heap: BinaryHeap<HeapEntry<T>> = BinaryHeap::with_capacity(k.max(1));
        let mut max_dist2 = initial_max_dist2;
        if !self.nodes.is_empty() {
            self.lookup_node(0, p, k, &mut heap, &mut max_dist2);
        }
        let found = heap.into_iter().map(|e| (e.dist2, e.item)).collect();
        (found, max_dist2)
    }

    fn lookup_node(&self, node_num: usize, p: Point3f, k: usize, heap: &mut BinaryHeap<HeapEntry<T>>, max_dist2: &mut Float) {
        if node_num >= self.nodes.len() {
            return;
        }
        let node = self.nodes[node_num];
        let left = 2 * node_num + 1;
        let right = 2 * node_num + 2;

        if !node.is_leaf {
            let diff = axis_of(p, node.axis) - node.split_pos;
            let (near, far) = if diff <= 0.0 { (left, right) } else { (right, left) };
            if near < self.nodes.len() {
                self.lookup_node(near, p, k, heap, max_dist2);
            }
            if far < self.nodes.len() && (diff * diff < *max_dist2 || heap.len() < k) {
                self.lookup_node(far, p, k, heap, max_dist2);
            }
        }

        let item = &self.items[node_num];
        let d = item.position() - p;
        let dist2 = d.x * d.x + d.y * d.y + d.z * d.z;
        if dist2 < *max_dist2 || heap.len() < k {
            if heap.len() == k {
                heap.pop();
            }
            heap.push(HeapEntry { dist2, item: item.clone() });
            if heap.len() == k {
                *max_dist2 = heap.peek().map(|e| e.dist2).unwrap_or(*max_dist2);
            }
        }
    }
}

struct HeapEntry<T> {
    dist2: Float,
    item: T,
}

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist2 == other.dist2
    }
}
impl<T> Eq for HeapEntry<T> {}
impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist2.partial_cmp(&other.dist2).unwrap_or(std::cmp::Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point3f;

    #[derive(Clone, Copy)]
    struct P(Point3f);
    impl HasPosition for P {
        fn position(&self) -> Point3f {
            self.0
        }
    }

    #[test]
    fn finds_the_nearest_k_points() {
        let items: Vec<P> = (0..20).map(|i| P(point3f!(i as f32, 0.0, 0.0))).collect();
        let tree = PointKdTree::build(items);
        let (found, max_dist2) = tree.lookup(point3f!(10.0, 0.0, 0.0), 3, Float::INFINITY);
        assert_eq!(found.len(), 3);
        let mut dists: Vec<Float> = found.iter().map(|(d, _)| *d).collect();
        dists.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(dists, vec![0.0, 1.0, 1.0]);
        assert!(max_dist2 <= 1.0 + 1e-5);
    }

    #[test]
    fn empty_tree_returns_nothing() {
        let tree: PointKdTree<P> = PointKdTree::build(vec![]);
        let (found, _) = tree.lookup(point3f!(0.0, 0.0, 0.0), 5, Float::INFINITY);
        assert!(found.is_empty());
    }
}
