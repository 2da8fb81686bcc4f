//! Pareto dominance, non-dominated sorting and crowding distances for
//! minimization problems.

/// `a` dominates `b` if it is not worse in any objective and better in at
/// least one. Comparisons with NaN are false, so NaN values never dominate
/// and are never dominated.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut better = false;
    for (ai, bi) in a.iter().zip(b) {
        if ai > bi || ai.partial_cmp(bi).is_none() {
            return false;
        }
        if ai < bi {
            better = true;
        }
    }
    better
}

/// Sort the points into fronts of mutually non-dominated points. The first
/// front contains the indices of all non-dominated points.
pub fn non_dominated_sort(points: &[Vec<f64>]) -> Vec<Vec<usize>> {
    non_dominated_sort_by(points.len(), |i, j| dominates(&points[i], &points[j]))
}

/// Fast non-dominated sorting of `n` items with a custom dominance relation.
pub fn non_dominated_sort_by<F: Fn(usize, usize) -> bool>(
    n: usize,
    dominates: F,
) -> Vec<Vec<usize>> {
    let mut domination_count = vec![0usize; n];
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut front = Vec::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if dominates(i, j) {
                dominated[i].push(j);
            } else if dominates(j, i) {
                domination_count[i] += 1;
            }
        }
        if domination_count[i] == 0 {
            front.push(i);
        }
    }

    let mut fronts = Vec::new();
    while !front.is_empty() {
        let mut next = Vec::new();
        for &i in &front {
            for &j in &dominated[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(front);
        front = next;
    }
    fronts
}

/// Crowding distance of the members of a front. Boundary points of every
/// objective get an infinite distance.
pub fn crowding_distance(points: &[Vec<f64>], front: &[usize]) -> Vec<f64> {
    let n = front.len();
    let mut distance = vec![0.0; n];
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    let n_obj = points[front[0]].len();
    for m in 0..n_obj {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| points[front[a]][m].total_cmp(&points[front[b]][m]));
        let min = points[front[order[0]]][m];
        let max = points[front[order[n - 1]]][m];
        distance[order[0]] = f64::INFINITY;
        distance[order[n - 1]] = f64::INFINITY;
        let range = max - min;
        if !(range > 0.0 && range.is_finite()) {
            continue;
        }
        for k in 1..n - 1 {
            let delta = points[front[order[k + 1]]][m] - points[front[order[k - 1]]][m];
            distance[order[k]] += delta / range;
        }
    }
    distance
}

/// Check that no point is dominated by another point of the set.
pub fn is_non_dominated_set(points: &[Vec<f64>]) -> bool {
    points
        .iter()
        .enumerate()
        .all(|(i, p)| points.iter().enumerate().all(|(j, q)| i == j || !dominates(q, p)))
}
