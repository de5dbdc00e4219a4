use std::time::{Duration, Instant};

use super::distance::DistanceMatrix;

/// Minimum decrease for a 2-opt move to count as an improvement; guards
/// against accepting floating-point churn forever.
const EPSILON: f64 = 1e-9;

/// Order the pool into a low-total-distance open path.
///
/// Construction is greedy nearest-neighbor from the first song in pool
/// order, ties broken towards the lowest pool index. Improvement is 2-opt
/// over the cycle obtained by appending a virtual node at distance zero
/// from every song; cutting the virtual node's two edges afterwards
/// recovers the open path, which keeps the inner loop free of endpoint
/// special cases. The deadline is checked after every attempted move, so
/// moves are atomic, only strict improvements are accepted, and the path
/// returned is always the best one seen: a valid permutation even with a
/// zero or exhausted budget.
pub fn solve(matrix: &DistanceMatrix, budget: Duration) -> Vec<usize> {
    let size = matrix.len();
    if size <= 1 {
        return (0..size).collect();
    }

    let start = Instant::now();
    let mut cycle = nearest_neighbor(matrix);
    cycle.push(size); // virtual node closing the open path into a cycle
    improve(matrix, &mut cycle, start, budget);
    cut_virtual_node(cycle)
}

/// Total distance of an open path under the matrix.
pub fn path_distance(matrix: &DistanceMatrix, path: &[usize]) -> f64 {
    path.windows(2)
        .map(|pair| matrix.get(pair[0], pair[1]))
        .sum()
}

/// Greedy construction: repeatedly append the closest unvisited song.
fn nearest_neighbor(matrix: &DistanceMatrix) -> Vec<usize> {
    let size = matrix.len();
    let mut path = Vec::with_capacity(size + 1);
    let mut unvisited: Vec<usize> = (1..size).collect();
    let mut current = 0;
    path.push(current);
    while !unvisited.is_empty() {
        let mut best_position = 0;
        let mut best_distance = f64::INFINITY;
        // Strict comparison over ascending pool indices keeps the lowest
        // index on ties
        for (position, &candidate) in unvisited.iter().enumerate() {
            let candidate_distance = matrix.get(current, candidate);
            if candidate_distance < best_distance {
                best_distance = candidate_distance;
                best_position = position;
            }
        }
        current = unvisited.remove(best_position);
        path.push(current);
    }
    path
}

/// Cycle-oriented 2-opt: reverse segments while that strictly shortens the
/// cycle, until a full sweep finds nothing or the budget runs out.
fn improve(matrix: &DistanceMatrix, cycle: &mut [usize], start: Instant, budget: Duration) {
    let len = cycle.len();
    let virtual_node = matrix.len();
    let edge = |from: usize, to: usize| {
        if from == virtual_node || to == virtual_node {
            0.0
        } else {
            matrix.get(from, to)
        }
    };

    loop {
        let mut improved = false;
        for first in 1..len - 1 {
            for second in (first + 1)..len {
                let a = cycle[first - 1];
                let b = cycle[first];
                let c = cycle[second];
                let d = cycle[(second + 1) % len];
                let delta = edge(a, c) + edge(b, d) - edge(a, b) - edge(c, d);
                if delta < -EPSILON {
                    cycle[first..=second].reverse();
                    improved = true;
                }
                // Deadline check at move granularity: a move is never cut
                // short, and the current cycle is always the best found
                if start.elapsed() >= budget {
                    return;
                }
            }
        }
        if !improved {
            return; // local optimum for the 2-opt neighborhood
        }
    }
}

/// Drop the virtual node and its two incident edges, rotating the cycle so
/// the remaining nodes form the open path.
fn cut_virtual_node(cycle: Vec<usize>) -> Vec<usize> {
    let virtual_node = cycle.len() - 1;
    let split = cycle
        .iter()
        .position(|&node| node == virtual_node)
        .unwrap_or(virtual_node);
    let mut path = Vec::with_capacity(virtual_node);
    path.extend(&cycle[split + 1..]);
    path.extend(&cycle[..split]);
    path
}
