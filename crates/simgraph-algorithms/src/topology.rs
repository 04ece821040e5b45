//! Graph topology analysis algorithms
//!
//! Triangle counting and clique listing by neighbor-set intersection.

use super::common::{GraphView, NodeIndex};
use rayon::prelude::*;

/// Intersection of two ascending slices
pub fn intersect_sorted(a: &[NodeIndex], b: &[NodeIndex]) -> Vec<NodeIndex> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn intersection_len(a: &[NodeIndex], b: &[NodeIndex]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

/// Triangle Counting
///
/// Returns total number of triangles in the graph, each counted once.
pub fn count_triangles(view: &GraphView) -> usize {
    // For each edge (u, v) with u < v, the triangles closing it are the
    // common higher neighbors w > v. Ordering u < v < w counts each triangle once.
    (0..view.node_count)
        .into_par_iter()
        .map(|u| {
            let higher_u = view.higher_neighbors(u);
            higher_u
                .iter()
                .enumerate()
                .map(|(pos, &v)| intersection_len(&higher_u[pos + 1..], view.higher_neighbors(v)))
                .sum::<usize>()
        })
        .sum()
}

/// Clique listing
///
/// Returns every set of exactly `size` nodes that are pairwise adjacent.
/// Each clique is reported once, members ascending, and the list itself is in
/// lexicographic order regardless of how many worker threads ran.
///
/// With `size == 3` this is triangle listing: for each edge (u, v) the common
/// neighbors w of u and v close a triangle.
pub fn enumerate_cliques(view: &GraphView, size: usize) -> Vec<Vec<NodeIndex>> {
    if size == 0 {
        return Vec::new();
    }

    let per_start: Vec<Vec<Vec<NodeIndex>>> = (0..view.node_count)
        .into_par_iter()
        .map(|u| {
            let mut found = Vec::new();
            let mut members = Vec::with_capacity(size);
            members.push(u);
            extend_clique(view, &mut members, view.higher_neighbors(u), size, &mut found);
            found
        })
        .collect();

    per_start.into_iter().flatten().collect()
}

/// Grow `members` with nodes from `candidates`, which holds the common
/// higher neighbors of all current members.
fn extend_clique(
    view: &GraphView,
    members: &mut Vec<NodeIndex>,
    candidates: &[NodeIndex],
    size: usize,
    out: &mut Vec<Vec<NodeIndex>>,
) {
    if members.len() == size {
        out.push(members.clone());
        return;
    }

    let needed = size - members.len();
    for (pos, &v) in candidates.iter().enumerate() {
        if candidates.len() - pos < needed {
            break;
        }
        let next = intersect_sorted(&candidates[pos + 1..], view.higher_neighbors(v));
        if next.len() + 1 < needed {
            continue;
        }
        members.push(v);
        extend_clique(view, members, &next, size, out);
        members.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_graph(n: usize) -> GraphView {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j, 1.0));
            }
        }
        GraphView::from_edges(n, edges)
    }

    #[test]
    fn test_triangle_counting() {
        // Complete graph K4: 4 nodes, all connected.
        // Triangles: (0,1,2), (0,1,3), (0,2,3), (1,2,3) -> 4 triangles.
        let view = complete_graph(4);
        assert_eq!(count_triangles(&view), 4);
    }

    #[test]
    fn test_enumerate_triangles_k4() {
        let view = complete_graph(4);
        let triangles = enumerate_cliques(&view, 3);
        assert_eq!(
            triangles,
            vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![1, 2, 3]]
        );
    }

    #[test]
    fn test_enumerate_four_cliques() {
        // K5 has C(5,4) = 5 four-cliques
        let view = complete_graph(5);
        let cliques = enumerate_cliques(&view, 4);
        assert_eq!(cliques.len(), 5);
        assert!(cliques.iter().all(|c| c.windows(2).all(|w| w[0] < w[1])));
    }

    #[test]
    fn test_triangle_plus_tail() {
        // 0-1-2 triangle, 2-3 tail
        let view = GraphView::from_edges(
            4,
            vec![(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0), (2, 3, 1.0)],
        );
        assert_eq!(enumerate_cliques(&view, 3), vec![vec![0, 1, 2]]);
        assert!(enumerate_cliques(&view, 4).is_empty());
        assert_eq!(count_triangles(&view), 1);
    }

    #[test]
    fn test_intersect_sorted() {
        assert_eq!(intersect_sorted(&[1, 3, 5, 7], &[2, 3, 4, 7, 9]), vec![3, 7]);
        assert!(intersect_sorted(&[], &[1]).is_empty());
    }
}
