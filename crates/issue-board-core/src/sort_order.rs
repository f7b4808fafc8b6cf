//! Sort-order arithmetic for manual reordering.
//!
//! Issues carry a floating point `sort_order`. Inserting between two
//! neighbours takes their midpoint, so a drag never renumbers the rest of
//! the list.

/// Sort order given to the first issue of an empty group.
pub const DEFAULT_SORT_ORDER: f64 = 65535.0;

/// Distance kept from the nearest neighbour when inserting at either end.
pub const SORT_ORDER_STEP: f64 = 10000.0;

/// Compute the sort order for an item placed between `prev` and `next`.
#[must_use]
pub fn sort_order_between(prev: Option<f64>, next: Option<f64>) -> f64 {
    match (prev, next) {
        (Some(prev), Some(next)) => f64::midpoint(prev, next),
        (Some(prev), None) => prev + SORT_ORDER_STEP,
        (None, Some(next)) => next - SORT_ORDER_STEP,
        (None, None) => DEFAULT_SORT_ORDER,
    }
}

/// Compute the sort order for inserting at `index` into `neighbours`.
///
/// `neighbours` must already exclude the item being moved and be sorted
/// ascending. An index past the end appends.
#[must_use]
pub fn sort_order_at(neighbours: &[f64], index: usize) -> f64 {
    let index = index.min(neighbours.len());
    let prev = index.checked_sub(1).and_then(|i| neighbours.get(i)).copied();
    let next = neighbours.get(index).copied();
    sort_order_between(prev, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn midpoint_between_neighbours() {
        assert!(approx(sort_order_between(Some(100.0), Some(200.0)), 150.0));
    }

    #[test]
    fn ends_step_away_from_neighbour() {
        assert!(approx(sort_order_between(Some(100.0), None), 10100.0));
        assert!(approx(sort_order_between(None, Some(100.0)), -9900.0));
    }

    #[test]
    fn empty_group_uses_default() {
        assert!(approx(sort_order_between(None, None), DEFAULT_SORT_ORDER));
        assert!(approx(sort_order_at(&[], 3), DEFAULT_SORT_ORDER));
    }

    #[test]
    fn index_selects_neighbours() {
        let orders = [10.0, 20.0, 30.0];
        assert!(approx(sort_order_at(&orders, 0), 10.0 - SORT_ORDER_STEP));
        assert!(approx(sort_order_at(&orders, 1), 15.0));
        assert!(approx(sort_order_at(&orders, 3), 30.0 + SORT_ORDER_STEP));
        assert!(approx(sort_order_at(&orders, 99), 30.0 + SORT_ORDER_STEP));
    }
}
