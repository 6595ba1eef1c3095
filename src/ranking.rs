use crate::models::ScholarSummary;

/// Orders scholars by gap, longest first. The sort is stable, so equal gaps
/// keep their first-seen order.
pub fn rank_by_gap(mut scholars: Vec<ScholarSummary>) -> Vec<ScholarSummary> {
    scholars.sort_by(|a, b| b.gap_days.cmp(&a.gap_days));
    scholars
}

/// The first `top_n` entries of an already ranked list, or all of them when
/// `top_n` is zero or negative.
pub fn top_gaps(ranked: &[ScholarSummary], top_n: i64) -> Vec<ScholarSummary> {
    let limit = usize::try_from(top_n)
        .ok()
        .filter(|limit| *limit > 0)
        .map_or(ranked.len(), |limit| limit.min(ranked.len()));
    ranked[..limit].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tier;

    fn scholar(id: &str, gap_days: i64) -> ScholarSummary {
        ScholarSummary {
            scholar_id: id.to_string(),
            program: String::new(),
            last_channel: String::new(),
            last_status: String::new(),
            last_contact: None,
            first_contact: None,
            next_due_date: None,
            contact_count: 1,
            gap_days,
            days_past_due: 0,
            missed_cadences: 0,
            days_since_first: 0,
            avg_interval_days: 0.0,
            contacts_per_month: 0.0,
            tier: Tier::OnTrack,
        }
    }

    fn ids(scholars: &[ScholarSummary]) -> Vec<&str> {
        scholars.iter().map(|s| s.scholar_id.as_str()).collect()
    }

    #[test]
    fn ranks_longest_gap_first_and_keeps_ties_in_order() {
        let ranked = rank_by_gap(vec![
            scholar("A", 10),
            scholar("B", 40),
            scholar("C", 10),
            scholar("D", 40),
        ]);
        assert_eq!(ids(&ranked), vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn top_gaps_truncates_or_returns_everything() {
        let ranked = rank_by_gap(vec![scholar("A", 1), scholar("B", 3), scholar("C", 2)]);
        assert_eq!(ids(&top_gaps(&ranked, 2)), vec!["B", "C"]);
        assert_eq!(ids(&top_gaps(&ranked, 3)).len(), 3);
        assert_eq!(ids(&top_gaps(&ranked, 10)).len(), 3);
        assert_eq!(ids(&top_gaps(&ranked, 0)), vec!["B", "C", "A"]);
        assert_eq!(ids(&top_gaps(&ranked, -1)), vec!["B", "C", "A"]);
    }
}
