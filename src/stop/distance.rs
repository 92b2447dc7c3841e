//! Tolerance-bounded structural distance between dot-bracket strings.
//!
//! A differing position costs one unit. Where both strings close a pair but
//! opened it at different positions, the closing position costs one more,
//! and another when the pattern's opening position is also open in the
//! candidate. Where only the pattern closes, its opening position costs one
//! when the candidate has it open.

/// Loose match: `*` in the pattern matches any candidate symbol.
pub fn check_loose_structure(candidate: &str, pattern: &str, tolerance: u32) -> bool {
    within_distance(candidate, pattern, tolerance, true)
}

/// Count match: every position is compared, no wildcards.
pub fn check_count_structure(candidate: &str, pattern: &str, tolerance: u32) -> bool {
    within_distance(candidate, pattern, tolerance, false)
}

fn within_distance(candidate: &str, pattern: &str, tolerance: u32, wildcard: bool) -> bool {
    let ours = candidate.as_bytes();
    let stop = pattern.as_bytes();
    if ours.len() != stop.len() {
        return false;
    }

    let mut remaining = tolerance as i64;
    let mut our_open: Vec<usize> = Vec::new();
    let mut stop_open: Vec<usize> = Vec::new();

    for pos in 0..ours.len() {
        let skip = wildcard && stop[pos] == b'*';
        if !skip && ours[pos] != stop[pos] {
            remaining -= 1;
        }

        if ours[pos] == b'(' {
            our_open.push(pos);
        }
        if stop[pos] == b'(' {
            stop_open.push(pos);
        }

        if ours[pos] == b')' && stop[pos] == b')' {
            let (Some(our_partner), Some(stop_partner)) = (our_open.pop(), stop_open.pop()) else {
                return false;
            };
            if our_partner != stop_partner {
                remaining -= 1;
                if ours[stop_partner] == b'(' {
                    remaining -= 1;
                }
            }
        } else {
            if ours[pos] == b')' && our_open.pop().is_none() {
                return false;
            }
            if stop[pos] == b')' {
                let Some(stop_partner) = stop_open.pop() else {
                    return false;
                };
                if ours[stop_partner] == b'(' {
                    remaining -= 1;
                }
            }
        }

        if remaining < 0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_always_match() {
        for s in ["", "....", "((..))", "((+))", "(.(..).)"] {
            assert!(check_loose_structure(s, s, 0));
            assert!(check_count_structure(s, s, 0));
            assert!(check_count_structure(s, s, 5));
        }
    }

    #[test]
    fn test_zero_tolerance_rejects_any_difference() {
        assert!(!check_count_structure("......", ".....(", 0));
        assert!(!check_loose_structure("(....)", "......", 0));
    }

    #[test]
    fn test_substituted_unpaired_costs_one() {
        // "x" stands in for any non-bracket symbol the candidate may carry
        assert!(check_count_structure("..x..", ".....", 1));
        assert!(!check_count_structure("..x..", ".....", 0));
        assert!(check_loose_structure("..x..", ".....", 1));
    }

    #[test]
    fn test_shifted_pair_costs_three() {
        // candidate pairs 0-5 and 1-4, pattern pairs 0-5 and 2-4
        let candidate = "((..))";
        let pattern = "(.(.))";
        // pos 1: '(' vs '.', pos 2: '.' vs '(' -> 2
        // pos 4: both close, partners 1 vs 2 differ -> 1, candidate[2] is '.' -> 0
        assert!(!check_count_structure(candidate, pattern, 2));
        assert!(check_count_structure(candidate, pattern, 3));
    }

    #[test]
    fn test_symmetric_mispair_double_penalty() {
        let candidate = "((.))";
        let pattern = "(()).";
        // pos2 '.' vs ')' -> 1; pattern closes alone at 2, partner 1 is '(' in candidate -> 1
        // pos3 both ')', partners 1 vs 0 -> 1, candidate[0] is '(' -> 1 more
        // pos4 ')' vs '.' -> 1
        assert!(!check_count_structure(candidate, pattern, 4));
        assert!(check_count_structure(candidate, pattern, 5));
    }

    #[test]
    fn test_loose_ignores_wildcards() {
        assert!(check_loose_structure("((..))", "((**))", 0));
        assert!(check_loose_structure("(....)", "******", 0));
        assert!(!check_count_structure("((..))", "((**))", 1));
        assert!(check_count_structure("((..))", "((**))", 2));
    }

    #[test]
    fn test_length_mismatch_never_matches() {
        assert!(!check_loose_structure("...", "....", 10));
        assert!(!check_count_structure("....", "...", 10));
    }

    #[test]
    fn test_unbalanced_input_rejected() {
        assert!(!check_count_structure("..))", "..))", 10));
    }
}
