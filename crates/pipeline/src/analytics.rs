use std::collections::HashMap;

use shared::{
    domain::{Candidate, CandidateStatus},
    protocol::{percentage_of, Analytics, RoleBreakdown, StatusBreakdown},
};

/// Aggregates the full candidate list in one pass.
///
/// Roles with equal counts keep the order in which they were first seen.
pub fn compute_analytics(candidates: &[Candidate]) -> Analytics {
    let total = candidates.len();
    let mut status_counts = [0usize; CandidateStatus::ALL.len()];
    let mut role_counts: Vec<RoleBreakdown> = Vec::new();
    let mut role_index: HashMap<&str, usize> = HashMap::new();
    let mut experience_sum = 0.0_f64;

    for candidate in candidates {
        status_counts[candidate.status.index()] += 1;

        match role_index.get(candidate.role.as_str()) {
            Some(&slot) => role_counts[slot].count += 1,
            None => {
                role_index.insert(candidate.role.as_str(), role_counts.len());
                role_counts.push(RoleBreakdown {
                    role: candidate.role.clone(),
                    count: 1,
                });
            }
        }

        experience_sum += candidate.experience;
    }

    let status_breakdown = CandidateStatus::ALL
        .iter()
        .map(|status| {
            let count = status_counts[status.index()];
            StatusBreakdown {
                status: *status,
                count,
                percentage: percentage_of(count, total),
            }
        })
        .collect();

    // sort_by is stable
    role_counts.sort_by(|a, b| b.count.cmp(&a.count));

    let average_experience = if total == 0 {
        0.0
    } else {
        ((experience_sum / total as f64) * 10.0).round() / 10.0
    };

    Analytics {
        total_candidates: total,
        status_breakdown,
        role_breakdown: role_counts,
        average_experience,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::candidate;
    use proptest::prelude::*;
    use shared::domain::CandidateStatus::*;

    #[test]
    fn empty_list_yields_zeroes() {
        let analytics = compute_analytics(&[]);
        assert_eq!(analytics.total_candidates, 0);
        assert_eq!(analytics.average_experience, 0.0);
        assert!(analytics.role_breakdown.is_empty());
        assert_eq!(analytics.status_breakdown.len(), 4);
        assert!(analytics
            .status_breakdown
            .iter()
            .all(|entry| entry.count == 0 && entry.percentage == 0));
    }

    #[test]
    fn averages_experience_to_one_decimal() {
        let list = vec![
            candidate("a", "A", "Engineer", 2.0, Applied),
            candidate("b", "B", "Engineer", 4.0, Applied),
            candidate("c", "C", "Engineer", 9.0, Applied),
        ];
        assert_eq!(compute_analytics(&list).average_experience, 5.0);

        let list = vec![
            candidate("a", "A", "Engineer", 1.0, Applied),
            candidate("b", "B", "Engineer", 1.0, Applied),
            candidate("c", "C", "Engineer", 2.0, Applied),
        ];
        assert_eq!(compute_analytics(&list).average_experience, 1.3);
    }

    #[test]
    fn status_counts_and_percentages_cover_total() {
        let list = vec![
            candidate("a", "A", "Engineer", 1.0, Applied),
            candidate("b", "B", "Designer", 2.0, Interview),
            candidate("c", "C", "Engineer", 3.0, Offer),
            candidate("d", "D", "Analyst", 4.0, Rejected),
            candidate("e", "E", "Engineer", 5.0, Applied),
            candidate("f", "F", "Designer", 6.0, Interview),
        ];
        let analytics = compute_analytics(&list);

        let count_sum: usize = analytics.status_breakdown.iter().map(|s| s.count).sum();
        assert_eq!(count_sum, analytics.total_candidates);

        let pct_sum: u32 = analytics.status_breakdown.iter().map(|s| s.percentage).sum();
        assert!((97..=103).contains(&pct_sum), "percent sum {pct_sum}");

        assert_eq!(analytics.count_for(Applied), 2);
        assert_eq!(analytics.status_breakdown[0].percentage, 33);
        assert_eq!(analytics.status_breakdown[2].percentage, 17);
    }

    const ROLES: [&str; 5] = ["Engineer", "Designer", "Analyst", "Recruiter", "Manager"];

    fn arb_status() -> impl Strategy<Value = CandidateStatus> {
        prop_oneof![Just(Applied), Just(Interview), Just(Offer), Just(Rejected)]
    }

    fn arb_candidates() -> impl Strategy<Value = Vec<Candidate>> {
        prop::collection::vec((arb_status(), 0..ROLES.len(), 0.0f64..=50.0), 0..80).prop_map(
            |rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(i, (status, role, experience))| {
                        candidate(&format!("c{i}"), "Someone", ROLES[role], experience, status)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn status_breakdown_covers_any_list(list in arb_candidates()) {
            let analytics = compute_analytics(&list);
            prop_assert_eq!(analytics.total_candidates, list.len());
            prop_assert_eq!(analytics.status_breakdown.len(), 4);

            let count_sum: usize = analytics.status_breakdown.iter().map(|s| s.count).sum();
            prop_assert_eq!(count_sum, list.len());

            let pct_sum: u32 = analytics.status_breakdown.iter().map(|s| s.percentage).sum();
            if list.is_empty() {
                prop_assert_eq!(pct_sum, 0);
            } else {
                prop_assert!((97..=103).contains(&pct_sum), "percent sum {}", pct_sum);
            }
        }

        #[test]
        fn role_breakdown_is_non_increasing_for_any_list(list in arb_candidates()) {
            let analytics = compute_analytics(&list);

            let sum: usize = analytics.role_breakdown.iter().map(|r| r.count).sum();
            prop_assert_eq!(sum, list.len());
            prop_assert!(analytics
                .role_breakdown
                .windows(2)
                .all(|pair| pair[0].count >= pair[1].count));

            let average = analytics.average_experience;
            prop_assert!((0.0..=50.0).contains(&average));
        }
    }

    #[test]
    fn status_breakdown_follows_column_order() {
        let list = vec![candidate("a", "A", "Engineer", 1.0, Rejected)];
        let statuses: Vec<_> = compute_analytics(&list)
            .status_breakdown
            .iter()
            .map(|entry| entry.status)
            .collect();
        assert_eq!(statuses, CandidateStatus::ALL.to_vec());
    }

    #[test]
    fn role_breakdown_sorted_descending_and_sums_to_total() {
        let list = vec![
            candidate("a", "A", "Designer", 1.0, Applied),
            candidate("b", "B", "Engineer", 1.0, Applied),
            candidate("c", "C", "Engineer", 1.0, Applied),
            candidate("d", "D", "Analyst", 1.0, Applied),
            candidate("e", "E", "Engineer", 1.0, Applied),
            candidate("f", "F", "Analyst", 1.0, Applied),
        ];
        let analytics = compute_analytics(&list);

        let roles: Vec<_> = analytics
            .role_breakdown
            .iter()
            .map(|entry| (entry.role.as_str(), entry.count))
            .collect();
        assert_eq!(roles, vec![("Engineer", 3), ("Analyst", 2), ("Designer", 1)]);

        let sum: usize = analytics.role_breakdown.iter().map(|r| r.count).sum();
        assert_eq!(sum, analytics.total_candidates);
        assert!(analytics
            .role_breakdown
            .windows(2)
            .all(|pair| pair[0].count >= pair[1].count));
    }

    #[test]
    fn equal_role_counts_keep_first_seen_order() {
        let list = vec![
            candidate("a", "A", "Designer", 1.0, Applied),
            candidate("b", "B", "Engineer", 1.0, Applied),
        ];
        let analytics = compute_analytics(&list);
        assert_eq!(analytics.role_breakdown[0].role, "Designer");
        assert_eq!(analytics.role_breakdown[1].role, "Engineer");
    }

    #[test]
    fn conversion_rate_counts_offers() {
        let list = vec![
            candidate("a", "A", "Engineer", 1.0, Offer),
            candidate("b", "B", "Engineer", 1.0, Applied),
            candidate("c", "C", "Engineer", 1.0, Applied),
            candidate("d", "D", "Engineer", 1.0, Rejected),
        ];
        let analytics = compute_analytics(&list);
        assert_eq!(analytics.conversion_rate(), 25);
        assert_eq!(analytics.offers(), 1);
        assert_eq!(analytics.rejected(), 1);
        assert_eq!(analytics.in_progress(), 0);
    }
}
