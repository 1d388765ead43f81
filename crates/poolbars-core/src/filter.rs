// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client-side bar filtering.
//!
//! A bar passes when it satisfies every active constraint: name search,
//! table count bucket, Guinness on draft, free pool tonight and live table.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use thiserror::Error;

use crate::model::Bar;

/// Table count selection from the header dropdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TableBucket {
    /// No constraint on table count.
    #[default]
    Any,
    /// Exactly this many tables.
    Exactly(u32),
    /// Three tables or more.
    ThreeOrMore,
}

impl TableBucket {
    /// The choices offered in the header, in display order.
    pub const CHOICES: [TableBucket; 4] = [
        TableBucket::Any,
        TableBucket::Exactly(1),
        TableBucket::Exactly(2),
        TableBucket::ThreeOrMore,
    ];

    /// Whether a table count satisfies this bucket. Unknown counts only pass `Any`.
    #[must_use]
    pub fn matches(self, tables: Option<u32>) -> bool {
        match (self, tables) {
            (TableBucket::Any, _) => true,
            (TableBucket::ThreeOrMore, Some(n)) => n >= 3,
            (TableBucket::Exactly(want), Some(n)) => n == want,
            (_, None) => false,
        }
    }

    /// Human-readable label for the dropdown.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            TableBucket::Any => "No. of tables".to_string(),
            TableBucket::Exactly(1) => "1 Table".to_string(),
            TableBucket::Exactly(n) => format!("{n} Tables"),
            TableBucket::ThreeOrMore => "3+ Tables".to_string(),
        }
    }
}

/// Error returned when a table bucket string is not recognized.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid table bucket '{0}': expected \"\", a number, or \"3+\"")]
pub struct ParseBucketError(String);

impl FromStr for TableBucket {
    type Err = ParseBucketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(TableBucket::Any),
            "3+" => Ok(TableBucket::ThreeOrMore),
            other => other
                .parse::<u32>()
                .ok()
                .map(TableBucket::Exactly)
                .ok_or_else(|| ParseBucketError(s.to_string())),
        }
    }
}

impl fmt::Display for TableBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableBucket::Any => Ok(()),
            TableBucket::Exactly(n) => write!(f, "{n}"),
            TableBucket::ThreeOrMore => f.write_str("3+"),
        }
    }
}

/// The current filter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring of the bar name.
    pub query: String,
    pub tables: TableBucket,
    pub guinness_only: bool,
    /// Only bars with free pool on the current weekday.
    pub free_pool_tonight: bool,
    pub live_table_only: bool,
}

impl FilterCriteria {
    /// Whether `bar` satisfies every active constraint on `today`.
    #[must_use]
    pub fn matches(&self, bar: &Bar, today: Weekday) -> bool {
        self.name_matches(bar)
            && self.tables.matches(bar.num_tables)
            && (!self.guinness_only || bar.guinness)
            && (!self.free_pool_tonight || bar.has_free_pool_on(today))
            && (!self.live_table_only || bar.live_table)
    }

    fn name_matches(&self, bar: &Bar) -> bool {
        self.query.is_empty() || bar.name.to_lowercase().contains(&self.query.to_lowercase())
    }

    /// Whether any constraint is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }

    /// Reset every constraint.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Bars matching `criteria` on `today`, in their original order.
#[must_use]
pub fn filter_bars(bars: &[Bar], criteria: &FilterCriteria, today: Weekday) -> Vec<Bar> {
    bars.iter()
        .filter(|bar| criteria.matches(bar, today))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::bar;

    fn names(bars: &[Bar]) -> Vec<&str> {
        bars.iter().map(|b| b.name.as_str()).collect()
    }

    fn breakroom() -> Bar {
        let mut b = bar(1, "Breakroom");
        b.num_tables = Some(3);
        b.guinness = true;
        b.live_table = false;
        b.lat = Some(37.77);
        b.lon = Some(-122.43);
        b
    }

    #[test]
    fn test_breakroom_scenario() {
        let bars = vec![breakroom()];

        let criteria = FilterCriteria {
            tables: "3+".parse().unwrap(),
            guinness_only: true,
            ..Default::default()
        };
        assert_eq!(names(&filter_bars(&bars, &criteria, Weekday::Mon)), vec!["Breakroom"]);

        let criteria = FilterCriteria {
            tables: "1".parse().unwrap(),
            ..Default::default()
        };
        assert!(filter_bars(&bars, &criteria, Weekday::Mon).is_empty());
    }

    #[test]
    fn test_default_criteria_match_everything() {
        let mut odd = bar(2, "No Tables Known");
        odd.num_tables = None;
        odd.lat = None;
        let bars = vec![breakroom(), odd];

        assert_eq!(filter_bars(&bars, &FilterCriteria::default(), Weekday::Fri).len(), 2);
    }

    #[test]
    fn test_name_query_is_case_insensitive_substring() {
        let bars = vec![breakroom(), bar(2, "The Broken Cue"), bar(3, "Eagle")];
        let criteria = FilterCriteria {
            query: "BRO".to_string(),
            ..Default::default()
        };
        assert_eq!(
            names(&filter_bars(&bars, &criteria, Weekday::Mon)),
            vec!["The Broken Cue"]
        );

        let criteria = FilterCriteria {
            query: "eak".to_string(),
            ..Default::default()
        };
        assert_eq!(names(&filter_bars(&bars, &criteria, Weekday::Mon)), vec!["Breakroom"]);
    }

    #[test]
    fn test_table_buckets() {
        let counts = [None, Some(0), Some(1), Some(2), Some(3), Some(7)];

        let passing = |bucket: TableBucket| -> Vec<Option<u32>> {
            counts.into_iter().filter(|c| bucket.matches(*c)).collect()
        };

        assert_eq!(passing(TableBucket::Any), counts.to_vec());
        assert_eq!(passing(TableBucket::Exactly(1)), vec![Some(1)]);
        assert_eq!(passing(TableBucket::Exactly(2)), vec![Some(2)]);
        assert_eq!(passing(TableBucket::ThreeOrMore), vec![Some(3), Some(7)]);
    }

    #[test]
    fn test_unknown_table_count_never_matches_exact_bucket() {
        let mut b = breakroom();
        b.num_tables = None;
        for bucket in [TableBucket::Exactly(1), TableBucket::Exactly(2), TableBucket::ThreeOrMore] {
            let criteria = FilterCriteria {
                tables: bucket,
                ..Default::default()
            };
            assert!(!criteria.matches(&b, Weekday::Mon), "{bucket:?}");
        }
    }

    #[test]
    fn test_guinness_flag() {
        let mut plain = bar(2, "Plain");
        plain.guinness = false;
        let bars = vec![breakroom(), plain];
        let criteria = FilterCriteria {
            guinness_only: true,
            ..Default::default()
        };
        assert_eq!(names(&filter_bars(&bars, &criteria, Weekday::Mon)), vec!["Breakroom"]);
    }

    #[test]
    fn test_free_pool_tonight_uses_today() {
        let mut tuesday_bar = bar(2, "Tuesday Spot");
        tuesday_bar.free_pool.tuesday = true;
        let bars = vec![breakroom(), tuesday_bar];
        let criteria = FilterCriteria {
            free_pool_tonight: true,
            ..Default::default()
        };

        assert_eq!(
            names(&filter_bars(&bars, &criteria, Weekday::Tue)),
            vec!["Tuesday Spot"]
        );
        assert!(filter_bars(&bars, &criteria, Weekday::Wed).is_empty());
    }

    #[test]
    fn test_live_table_flag() {
        let mut live = bar(2, "Live");
        live.live_table = true;
        let bars = vec![breakroom(), live];
        let criteria = FilterCriteria {
            live_table_only: true,
            ..Default::default()
        };
        assert_eq!(names(&filter_bars(&bars, &criteria, Weekday::Mon)), vec!["Live"]);
    }

    #[test]
    fn test_combined_predicates_require_all() {
        let mut everything = bar(1, "Full House");
        everything.num_tables = Some(4);
        everything.guinness = true;
        everything.live_table = true;
        everything.free_pool.saturday = true;

        let mut no_guinness = everything.clone();
        no_guinness.id = 2;
        no_guinness.name = "Full House Annex".to_string();
        no_guinness.guinness = false;

        let mut two_tables = everything.clone();
        two_tables.id = 3;
        two_tables.name = "Full House Two".to_string();
        two_tables.num_tables = Some(2);

        let bars = vec![everything, no_guinness, two_tables];
        let criteria = FilterCriteria {
            query: "full".to_string(),
            tables: TableBucket::ThreeOrMore,
            guinness_only: true,
            free_pool_tonight: true,
            live_table_only: true,
        };

        assert_eq!(names(&filter_bars(&bars, &criteria, Weekday::Sat)), vec!["Full House"]);
        assert!(filter_bars(&bars, &criteria, Weekday::Sun).is_empty());
    }

    #[test]
    fn test_filter_preserves_order_and_is_idempotent() {
        let mut bars = Vec::new();
        for id in 0..20 {
            let mut b = bar(id, &format!("Bar {id}"));
            b.num_tables = Some(u32::try_from(id % 5).unwrap());
            b.guinness = id % 2 == 0;
            b.live_table = id % 3 == 0;
            b.free_pool.friday = id % 4 == 0;
            bars.push(b);
        }

        let criteria = FilterCriteria {
            tables: TableBucket::ThreeOrMore,
            guinness_only: true,
            ..Default::default()
        };

        let once = filter_bars(&bars, &criteria, Weekday::Fri);
        let twice = filter_bars(&once, &criteria, Weekday::Fri);
        assert_eq!(once, twice);

        let ids: Vec<_> = once.iter().map(|b| b.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(ids, vec![4, 8, 14, 18]);
    }

    #[test]
    fn test_bucket_parse_and_display() {
        assert_eq!("".parse::<TableBucket>(), Ok(TableBucket::Any));
        assert_eq!("2".parse::<TableBucket>(), Ok(TableBucket::Exactly(2)));
        assert_eq!("3+".parse::<TableBucket>(), Ok(TableBucket::ThreeOrMore));
        assert!("lots".parse::<TableBucket>().is_err());

        for bucket in TableBucket::CHOICES {
            assert_eq!(bucket.to_string().parse::<TableBucket>(), Ok(bucket));
        }
    }

    #[test]
    fn test_is_active_and_clear() {
        let mut criteria = FilterCriteria::default();
        assert!(!criteria.is_active());

        criteria.live_table_only = true;
        assert!(criteria.is_active());

        criteria.clear();
        assert!(!criteria.is_active());
    }
}
