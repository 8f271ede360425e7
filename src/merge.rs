use std::collections::HashMap;

use crate::models::{RatingRecord, RemoteDetail};

/// Combines local exact, local fuzzy and remote results into one list keyed
/// by literal title.
///
/// The first record seen for a title keeps its position. A later record
/// replaces it only when that later record is remote, so remote data always
/// wins over local data for the same title string.
pub fn merge_results(
    local_exact: Vec<RatingRecord>,
    local_fuzzy: Vec<RatingRecord>,
    remote: Vec<RemoteDetail>,
) -> Vec<RatingRecord> {
    let combined = local_exact
        .into_iter()
        .chain(local_fuzzy)
        .chain(remote.into_iter().map(RatingRecord::from));

    let mut merged: Vec<RatingRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in combined {
        match positions.get(record.title()).copied() {
            None => {
                positions.insert(record.title().to_string(), merged.len());
                merged.push(record);
            }
            Some(idx) => {
                if matches!(record, RatingRecord::Remote(_)) {
                    merged[idx] = record;
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatingSource;
    use std::collections::BTreeMap;

    fn remote(title: &str, imdb: &str) -> RemoteDetail {
        let mut ratings = BTreeMap::new();
        ratings.insert("imdb".to_string(), imdb.to_string());
        RemoteDetail::new(title.to_string(), None, None, None, ratings)
    }

    #[test]
    fn remote_overrides_local_with_same_title() {
        let merged = merge_results(
            vec![RatingRecord::local("Heat", Some(4.1))],
            vec![],
            vec![remote("Heat", "8.3/10")],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source(), RatingSource::Remote);
        assert_eq!(merged[0].average_rating(), Some(8.3));
    }

    #[test]
    fn exact_local_wins_over_fuzzy_local() {
        let merged = merge_results(
            vec![RatingRecord::local("Toy Story (1995)", Some(3.9))],
            vec![RatingRecord::local("Toy Story (1995)", Some(1.0))],
            vec![],
        );
        assert_eq!(merged, vec![RatingRecord::local("Toy Story (1995)", Some(3.9))]);
    }

    #[test]
    fn order_follows_first_appearance() {
        let merged = merge_results(
            vec![RatingRecord::local("B", Some(1.0))],
            vec![RatingRecord::local("A", Some(2.0))],
            vec![remote("C", "7/10"), remote("B", "6/10")],
        );
        let titles: Vec<&str> = merged.iter().map(RatingRecord::title).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
        assert_eq!(merged[0].source(), RatingSource::Remote);
    }

    #[test]
    fn titles_compare_case_sensitively() {
        let merged = merge_results(
            vec![RatingRecord::local("heat", Some(4.0))],
            vec![],
            vec![remote("Heat", "8.3/10")],
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn later_remote_duplicate_replaces_earlier_remote() {
        let merged = merge_results(
            vec![],
            vec![],
            vec![remote("Heat", "8.0/10"), remote("Heat", "8.3/10")],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].average_rating(), Some(8.3));
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert!(merge_results(vec![], vec![], vec![]).is_empty());
    }
}
