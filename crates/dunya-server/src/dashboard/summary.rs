//! Collection overview: release ordering and totals

use std::cmp::Reverse;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::ItemState;

/// Sort order for the releases of a collection. Every order is descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseOrder {
    /// Keep database order
    #[default]
    None,
    Date,
    Unmatched,
    Ignored,
    Error,
}

impl FromStr for ReleaseOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(ReleaseOrder::None),
            "date" => Ok(ReleaseOrder::Date),
            "unmatched" => Ok(ReleaseOrder::Unmatched),
            "ignored" => Ok(ReleaseOrder::Ignored),
            "error" => Ok(ReleaseOrder::Error),
            other => Err(format!("Unknown release order '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSummary {
    pub id: Uuid,
    pub mbid: Uuid,
    pub title: String,
    pub artist: String,
    pub ignore: bool,
    pub state: ItemState,
    pub state_date: DateTime<Utc>,
    pub matched_paths: Vec<String>,
    pub file_count: usize,
    /// Bad latest checker results on the release and its files
    pub error_count: usize,
}

impl ReleaseSummary {
    pub fn is_matched(&self) -> bool {
        !self.matched_paths.is_empty()
    }
}

pub fn sort_releases(releases: &mut [ReleaseSummary], order: ReleaseOrder) {
    match order {
        ReleaseOrder::None => {},
        ReleaseOrder::Date => releases.sort_by_key(|r| Reverse(r.state_date)),
        ReleaseOrder::Unmatched => {
            releases.sort_by_key(|r| Reverse((!r.is_matched(), r.state_date)))
        },
        ReleaseOrder::Ignored => releases.sort_by_key(|r| Reverse(r.ignore)),
        ReleaseOrder::Error => releases.sort_by_key(|r| Reverse(r.error_count)),
    }
}

/// Totals shown at the top of a collection page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseTotals {
    pub total: usize,
    /// Releases with at least one file on disk
    pub matched: usize,
    /// Matched releases whose import finished
    pub finished: usize,
}

pub fn totals(releases: &[ReleaseSummary]) -> ReleaseTotals {
    releases.iter().fold(
        ReleaseTotals {
            total: releases.len(),
            ..Default::default()
        },
        |mut acc, r| {
            if r.file_count > 0 {
                acc.matched += 1;
                if r.state == ItemState::Finished {
                    acc.finished += 1;
                }
            }
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn release(title: &str, minute: u32) -> ReleaseSummary {
        ReleaseSummary {
            id: Uuid::new_v4(),
            mbid: Uuid::new_v4(),
            title: title.to_string(),
            artist: "T. M. Krishna".to_string(),
            ignore: false,
            state: ItemState::NotStarted,
            state_date: Utc.with_ymd_and_hms(2014, 3, 1, 12, minute, 0).unwrap(),
            matched_paths: vec![format!("{}/cd1", title)],
            file_count: 3,
            error_count: 0,
        }
    }

    fn titles(releases: &[ReleaseSummary]) -> Vec<&str> {
        releases.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_parse_order() {
        assert_eq!("date".parse::<ReleaseOrder>().unwrap(), ReleaseOrder::Date);
        assert_eq!("".parse::<ReleaseOrder>().unwrap(), ReleaseOrder::None);
        assert!("size".parse::<ReleaseOrder>().is_err());
    }

    #[test]
    fn test_sort_by_date() {
        let mut releases = vec![release("a", 1), release("b", 3), release("c", 2)];
        sort_releases(&mut releases, ReleaseOrder::Date);
        assert_eq!(titles(&releases), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_unmatched_first() {
        let mut unmatched = release("u", 0);
        unmatched.matched_paths.clear();
        let mut releases = vec![release("a", 5), unmatched, release("b", 9)];
        sort_releases(&mut releases, ReleaseOrder::Unmatched);
        assert_eq!(titles(&releases), vec!["u", "b", "a"]);
    }

    #[test]
    fn test_sort_ignored_and_errors() {
        let mut ignored = release("i", 0);
        ignored.ignore = true;
        let mut releases = vec![release("a", 0), ignored];
        sort_releases(&mut releases, ReleaseOrder::Ignored);
        assert_eq!(releases[0].title, "i");

        let mut broken = release("e", 0);
        broken.error_count = 4;
        let mut releases = vec![release("a", 0), broken];
        sort_releases(&mut releases, ReleaseOrder::Error);
        assert_eq!(releases[0].title, "e");
    }

    #[test]
    fn test_totals() {
        let mut finished = release("f", 0);
        finished.state = ItemState::Finished;
        let mut empty = release("x", 0);
        empty.file_count = 0;
        empty.state = ItemState::Finished;

        let t = totals(&[finished, empty, release("n", 0)]);
        assert_eq!(
            t,
            ReleaseTotals {
                total: 3,
                matched: 2,
                finished: 1
            }
        );
    }
}
