// File: comparer.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::error::CompareError;
use crate::factor::{Change, Factor};
use crate::rawresponse::ResponseModel;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Header excluded from [`Factor::Header`] by default; it changes on every
/// response.
pub const DEFAULT_VOLATILE_HEADER: &str = "date";

/// Which factors a comparison skips and which names each factor ignores.
///
/// An exclusion entry with an empty name set skips its factor entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonConfig {
    ignore: HashSet<Factor>,
    exclusions: HashMap<Factor, HashSet<String>>,
}

impl ComparisonConfig {
    /// `HeaderValue` ignored, `date` excluded from `Header`.
    pub fn new() -> Self {
        let mut config = Self::empty();
        config.ignore(Factor::HeaderValue);
        config.exclude(Factor::Header, DEFAULT_VOLATILE_HEADER);
        config
    }

    /// Compares every factor with no exclusions.
    pub fn empty() -> Self {
        Self {
            ignore: HashSet::new(),
            exclusions: HashMap::new(),
        }
    }

    pub fn ignore(&mut self, factor: Factor) {
        self.ignore.insert(factor);
    }

    pub fn unignore(&mut self, factor: Factor) {
        self.ignore.remove(&factor);
    }

    pub fn is_ignored(&self, factor: Factor) -> bool {
        self.ignore.contains(&factor)
    }

    pub fn exclude(&mut self, factor: Factor, name: &str) {
        self.exclusions
            .entry(factor)
            .or_default()
            .insert(name.to_string());
    }

    /// Registers an empty exclusion set, which skips `factor`.
    pub fn skip(&mut self, factor: Factor) {
        self.exclusions.insert(factor, HashSet::new());
    }

    pub fn clear_exclusions(&mut self, factor: Factor) {
        self.exclusions.remove(&factor);
    }

    pub fn exclusions(&self, factor: Factor) -> Option<&HashSet<String>> {
        self.exclusions.get(&factor)
    }

    fn skips(&self, factor: Factor) -> bool {
        self.is_ignored(factor)
            || self
                .exclusions
                .get(&factor)
                .is_some_and(|names| names.is_empty())
    }

    fn is_excluded(&self, factor: Factor, name: &str) -> bool {
        let Some(names) = self.exclusions.get(&factor) else {
            return false;
        };
        match factor {
            Factor::Header | Factor::HeaderValue => {
                names.iter().any(|excluded| excluded.eq_ignore_ascii_case(name))
            }
            _ => names.contains(name),
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FactorComparer;

impl FactorComparer {
    /// Lists the differences from `old` to `new`, in [`Factor::ALL`] order.
    pub fn compare(
        old: Option<&ResponseModel>,
        new: Option<&ResponseModel>,
        config: &ComparisonConfig,
    ) -> Result<Vec<Change>, CompareError> {
        let (Some(old), Some(new)) = (old, new) else {
            return Err(CompareError::MissingOperand);
        };

        let mut changes = Vec::new();
        for factor in Factor::ALL {
            if config.skips(factor) {
                continue;
            }
            let change = match factor {
                Factor::StatusCode => scalar_change(factor, old.status_code(), new.status_code()),
                Factor::ContentLength => {
                    scalar_change(factor, old.content_length(), new.content_length())
                }
                Factor::ContentType => scalar_change(factor, old.content_type(), new.content_type()),
                Factor::Location => scalar_change(factor, old.location(), new.location()),
                Factor::Header => named_set_diff(
                    old.headers(),
                    new.headers(),
                    |name| config.is_excluded(factor, name),
                    |name, _| name.to_string(),
                    "Header",
                )
                .map(|found| Change::new(factor, "", found)),
                Factor::HeaderValue => named_set_diff(
                    old.headers(),
                    new.headers(),
                    |name| config.is_excluded(factor, name),
                    |name, value| format!("{}:{}", name, value.trim()),
                    "Header:Value",
                )
                .map(|found| Change::new(factor, "", found)),
                Factor::Cookie => named_set_diff(
                    old.cookies(),
                    new.cookies(),
                    |name| config.is_excluded(factor, name),
                    |name, _| name.to_string(),
                    "Cookie",
                )
                .map(|found| Change::new(factor, "", found)),
            };
            changes.extend(change);
        }

        Ok(changes)
    }
}

fn scalar_change<T: PartialEq + ToString>(factor: Factor, old: T, new: T) -> Option<Change> {
    (old != new).then(|| Change::new(factor, old.to_string(), new.to_string()))
}

/// Encodes the non-excluded entries of both maps and reports every entry only
/// in `new` as Extra and every entry only in `old` as Missing, one line each,
/// sorted. `None` when the sets are equal.
fn named_set_diff<E, F>(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
    is_excluded: E,
    encode: F,
    label: &str,
) -> Option<String>
where
    E: Fn(&str) -> bool,
    F: Fn(&str, &str) -> String,
{
    let collect = |entries: &BTreeMap<String, String>| -> BTreeSet<String> {
        entries
            .iter()
            .filter(|(name, _)| !is_excluded(name.as_str()))
            .map(|(name, value)| encode(name.as_str(), value.as_str()))
            .collect()
    };
    let old_set = collect(old);
    let new_set = collect(new);

    let mut found = String::new();
    for entry in new_set.difference(&old_set) {
        found.push_str(&format!("{} // Extra {}\n", entry, label));
    }
    for entry in old_set.difference(&new_set) {
        found.push_str(&format!("{} // Missing {}\n", entry, label));
    }

    (!found.is_empty()).then_some(found)
}
