//! Temporal train/test partitions.
//!
//! Rolling splits use an expanding window: every year after the first is a
//! test year, trained on all years before it.
//!
//! ```text
//! years: 2022 2023 2024 2025
//!
//!   train [2022]             → test 2023
//!   train [2022, 2023]       → test 2024
//!   train [2022, 2023, 2024] → test 2025
//! ```

use serde::{Deserialize, Serialize};

/// One train/test partition by year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train_years: Vec<i32>,
    pub test_year: i32,
}

impl Split {
    /// Report label, e.g. `train_2023_test_2024`.
    pub fn name(&self) -> String {
        match self.train_years.last() {
            Some(last) => format!("train_{}_test_{}", last, self.test_year),
            None => format!("test_{}", self.test_year),
        }
    }
}

/// Expanding-window splits over `years` (sorted, duplicates removed).
pub fn rolling_splits(years: &[i32]) -> Vec<Split> {
    let mut years = years.to_vec();
    years.sort_unstable();
    years.dedup();

    (1..years.len())
        .map(|idx| Split {
            train_years: years[..idx].to_vec(),
            test_year: years[idx],
        })
        .collect()
}

/// Single split testing on `test_year`, trained on every earlier year.
pub fn temporal_split(years: &[i32], test_year: i32) -> Split {
    let mut train_years: Vec<i32> = years.iter().copied().filter(|&y| y < test_year).collect();
    train_years.sort_unstable();
    train_years.dedup();
    Split {
        train_years,
        test_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_splits() {
        let splits = rolling_splits(&[2022, 2023, 2024, 2025]);
        assert_eq!(splits.len(), 3);
        assert_eq!(splits[0], Split { train_years: vec![2022], test_year: 2023 });
        assert_eq!(splits[1], Split { train_years: vec![2022, 2023], test_year: 2024 });
        assert_eq!(
            splits[2],
            Split { train_years: vec![2022, 2023, 2024], test_year: 2025 }
        );
    }

    #[test]
    fn test_rolling_splits_unsorted_input() {
        let splits = rolling_splits(&[2024, 2022, 2023, 2023]);
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[1].train_years, vec![2022, 2023]);
        assert_eq!(splits[1].test_year, 2024);
    }

    #[test]
    fn test_too_few_years() {
        assert!(rolling_splits(&[]).is_empty());
        assert!(rolling_splits(&[2022]).is_empty());
    }

    #[test]
    fn test_temporal_split() {
        let split = temporal_split(&[2025, 2022, 2024, 2023], 2024);
        assert_eq!(split.train_years, vec![2022, 2023]);
        assert_eq!(split.test_year, 2024);
    }

    #[test]
    fn test_split_name() {
        let split = Split { train_years: vec![2022, 2023], test_year: 2024 };
        assert_eq!(split.name(), "train_2023_test_2024");
    }
}
