//! Validation helpers for command line inputs.

/// Check a `[min, max]` score range given on the command line.
///
/// Both bounds must be finite, lie in `[0, 1]` and satisfy `min <= max`.
/// A degenerate range is allowed but logged, since every random score will
/// then be identical.
pub fn validate_score_range(min: f64, max: f64) -> Result<(f64, f64), String> {
    for (name, value) in [("min", min), ("max", max)] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(format!("Score {} must be within [0, 1], got {}", name, value));
        }
    }
    if min > max {
        return Err(format!(
            "Minimum score {} is greater than maximum score {}",
            min, max
        ));
    }
    if min == max {
        log::warn!("Score range [{}, {}] is degenerate; every random score will be {}", min, max, min);
    }
    Ok((min, max))
}

/// Log a summary of how many nodes each entry node can reach.
///
/// Returns false (and warns) when no node is reachable at all, which
/// usually means the network has no entry nodes.
pub fn check_reachability(reachable: usize, total: usize) -> bool {
    if total == 0 {
        log::warn!("Network has no nodes");
        return false;
    }
    if reachable == 0 {
        log::warn!("No node is reachable from an entry node");
        return false;
    }
    if reachable < total {
        log::warn!(
            "{} of {} nodes are unreachable from every entry node",
            total - reachable,
            total
        );
    } else {
        log::info!("All {} nodes are reachable from an entry node", total);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_score_range() {
        assert_eq!(validate_score_range(0.0, 1.0), Ok((0.0, 1.0)));
        assert_eq!(validate_score_range(0.3, 0.3), Ok((0.3, 0.3)));
        assert!(validate_score_range(0.6, 0.2).is_err());
        assert!(validate_score_range(-0.1, 0.5).is_err());
        assert!(validate_score_range(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_check_reachability() {
        assert!(check_reachability(3, 3));
        assert!(check_reachability(2, 3));
        assert!(!check_reachability(0, 3));
        assert!(!check_reachability(0, 0));
    }
}
