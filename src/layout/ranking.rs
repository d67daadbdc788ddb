use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Longest-path ranks over vertex indices `0..count`.
///
/// Cycles are broken by picking the remaining vertex earliest in declaration order as the
/// next source; its incoming edges are treated as back-edges and do not constrain ranks.
pub(super) fn compute_ranks(count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut indeg = vec![0usize; count];
    for &(from, to) in edges {
        if from == to {
            continue;
        }
        adj[from].push(to);
        indeg[to] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..count)
        .filter(|idx| indeg[*idx] == 0)
        .map(Reverse)
        .collect();
    let mut processed = vec![false; count];
    let mut order = Vec::with_capacity(count);

    loop {
        while let Some(Reverse(idx)) = ready.pop() {
            if processed[idx] {
                continue;
            }
            processed[idx] = true;
            order.push(idx);
            for &next in &adj[idx] {
                if processed[next] {
                    continue;
                }
                indeg[next] = indeg[next].saturating_sub(1);
                if indeg[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        if order.len() >= count {
            break;
        }
        // Cycle: the earliest unprocessed vertex becomes the next source.
        match (0..count).find(|idx| !processed[*idx]) {
            Some(idx) => ready.push(Reverse(idx)),
            None => break,
        }
    }

    let mut position = vec![0usize; count];
    for (pos, idx) in order.iter().enumerate() {
        position[*idx] = pos;
    }
    let mut ranks = vec![0usize; count];
    for &idx in &order {
        for &next in &adj[idx] {
            if position[next] <= position[idx] {
                continue;
            }
            ranks[next] = ranks[next].max(ranks[idx] + 1);
        }
    }
    ranks
}

/// Median-heuristic crossing reduction: alternating down and up sweeps, each bucket sorted
/// by the median position of its neighbors in the adjacent rank. Ties keep current order.
pub(super) fn order_rank_nodes(
    rank_nodes: &mut [Vec<usize>],
    edges: &[(usize, usize)],
    count: usize,
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(from, to) in edges {
        if from == to {
            continue;
        }
        outgoing[from].push(to);
        incoming[to].push(from);
    }

    let mut positions = vec![0usize; count];
    let update_positions = |rank_nodes: &[Vec<usize>], positions: &mut [usize]| {
        for bucket in rank_nodes {
            for (pos, idx) in bucket.iter().enumerate() {
                positions[*idx] = pos;
            }
        }
    };
    update_positions(&*rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<usize>, neighbors: &[Vec<usize>], positions: &[usize]| {
        let mut scored: Vec<(f32, usize, usize)> = bucket
            .iter()
            .enumerate()
            .map(|(current, idx)| {
                let score = median_position(&neighbors[*idx], positions).unwrap_or(current as f32);
                (score, current, *idx)
            })
            .collect();
        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        *bucket = scored.into_iter().map(|(_, _, idx)| idx).collect();
    };

    for _ in 0..passes.max(1) {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(&*rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len() - 1).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(&*rank_nodes, &mut positions);
        }
    }
}

fn median_position(neighbors: &[usize], positions: &[usize]) -> Option<f32> {
    if neighbors.is_empty() {
        return None;
    }
    let mut values: Vec<f32> = neighbors.iter().map(|n| positions[*n] as f32).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_gets_increasing_ranks() {
        let ranks = compute_ranks(3, &[(0, 1), (1, 2)]);
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn longest_path_wins() {
        let ranks = compute_ranks(4, &[(0, 1), (1, 2), (0, 2), (2, 3)]);
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn cycles_are_broken_in_declaration_order() {
        let ranks = compute_ranks(3, &[(0, 1), (1, 2), (2, 0)]);
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn self_loops_are_ignored() {
        let ranks = compute_ranks(2, &[(0, 0), (0, 1)]);
        assert_eq!(ranks, vec![0, 1]);
    }

    #[test]
    fn ordering_uncrosses_simple_pair() {
        // 0 -> 3, 1 -> 2 crosses when rank 1 is [2, 3].
        let edges = [(0, 3), (1, 2)];
        let mut buckets = vec![vec![0, 1], vec![2, 3]];
        order_rank_nodes(&mut buckets, &edges, 4, 2);
        let pos = |idx: usize| buckets[1].iter().position(|v| *v == idx).unwrap();
        let top = |idx: usize| buckets[0].iter().position(|v| *v == idx).unwrap();
        assert_eq!(pos(3) < pos(2), top(0) < top(1));
    }
}
