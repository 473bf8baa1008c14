// src/report.rs
use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::model::LoggedSet;

/// Period granularity of the history view.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum View {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl View {
    /// First day of the period containing `date`. Weeks start on Monday, so a
    /// Sunday belongs to the week that began six days earlier.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Self::Monthly => date.with_day(1).unwrap_or(date),
            Self::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    pub fn bucket_key(self, start: NaiveDate) -> String {
        match self {
            Self::Daily | Self::Weekly => start.format("%Y-%m-%d").to_string(),
            Self::Monthly => start.format("%Y-%m").to_string(),
            Self::Yearly => start.format("%Y").to_string(),
        }
    }

    pub fn title(self, start: NaiveDate) -> String {
        match self {
            Self::Daily => start.format("%A, %B %-d, %Y").to_string(),
            Self::Weekly => format!("Week of {}", start.format("%B %-d")),
            Self::Monthly => start.format("%B %Y").to_string(),
            Self::Yearly => format!("Year {}", start.year()),
        }
    }
}

/// One period of history, most recent period first in the output of
/// [`group_sets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket<'a> {
    pub key: String,
    pub start: NaiveDate,
    pub title: String,
    /// In order of first appearance in the profile's (most recent first) log.
    pub exercises: Vec<ExerciseGroup<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseGroup<'a> {
    pub name: &'a str,
    /// Category recorded on the most recent set in the group.
    pub category: &'a str,
    /// Newest first; the newest set carries the highest number.
    pub sets: Vec<NumberedSet<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberedSet<'a> {
    pub number: usize,
    pub set: &'a LoggedSet,
}

type Groups<'a> = IndexMap<&'a str, (&'a str, Vec<&'a LoggedSet>)>;

/// Groups `sets` into periods of `view` granularity and, within each period,
/// by exercise name.
pub fn group_sets(sets: &[LoggedSet], view: View) -> Vec<Bucket<'_>> {
    let mut periods: BTreeMap<NaiveDate, Groups<'_>> = BTreeMap::new();
    for set in sets {
        periods
            .entry(view.bucket_start(set.date))
            .or_default()
            .entry(set.name.as_str())
            .or_insert_with(|| (set.category.as_str(), Vec::new()))
            .1
            .push(set);
    }

    periods
        .into_iter()
        .rev()
        .map(|(start, groups)| Bucket {
            key: view.bucket_key(start),
            start,
            title: view.title(start),
            exercises: groups
                .into_iter()
                .map(|(name, (category, mut members))| {
                    members.sort_by(|a, b| b.id.cmp(&a.id));
                    let total = members.len();
                    ExerciseGroup {
                        name,
                        category,
                        sets: members
                            .into_iter()
                            .enumerate()
                            .map(|(index, set)| NumberedSet {
                                number: total - index,
                                set,
                            })
                            .collect(),
                    }
                })
                .collect(),
        })
        .collect()
}
