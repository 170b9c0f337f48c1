use std::cmp::Reverse;

use repertoire_core::model::WorkCandidate;

/// Keep the `limit` most corroborated candidates.
///
/// Orders by number of PROs reporting the work, then by ISWC presence.
/// The sort is stable, so ties keep merge order.
pub fn select_top(mut candidates: Vec<WorkCandidate>, limit: usize) -> Vec<WorkCandidate> {
    candidates.sort_by_key(|c| (Reverse(c.pro_source_count()), Reverse(c.iswc.is_some())));
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use repertoire_core::model::SourceTag;

    fn candidate(title: &str, pros: &[SourceTag], iswc: bool) -> WorkCandidate {
        let mut c = WorkCandidate::new(format!("title:{title}"), title, SourceTag::Bibliographic);
        c.sources.extend(pros.iter().copied());
        if iswc {
            c.iswc = Some(format!("T-{title}"));
        }
        c
    }

    #[test]
    fn test_pro_count_then_iswc() {
        let candidates = vec![
            candidate("plain", &[], false),
            candidate("iswc-only", &[], true),
            candidate("one-pro", &[SourceTag::Bmi], false),
            candidate("two-pros", &[SourceTag::Ascap, SourceTag::Sesac], false),
            candidate("one-pro-iswc", &[SourceTag::Ascap], true),
        ];

        let titles: Vec<String> = select_top(candidates, 10)
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(
            titles,
            ["two-pros", "one-pro-iswc", "one-pro", "iswc-only", "plain"]
        );
    }

    #[test]
    fn test_ties_keep_merge_order_and_limit_applies() {
        let candidates: Vec<WorkCandidate> = (0..8)
            .map(|i| candidate(&format!("w{i}"), &[], false))
            .collect();

        let top = select_top(candidates, 5);
        let titles: Vec<&str> = top.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["w0", "w1", "w2", "w3", "w4"]);
    }

    #[test]
    fn test_limit_larger_than_input() {
        let top = select_top(vec![candidate("only", &[], false)], 50);
        assert_eq!(top.len(), 1);
        assert!(select_top(Vec::new(), 5).is_empty());
    }
}
