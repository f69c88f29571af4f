use std::collections::BTreeSet;

use super::model::{ExamRecord, ExamTable, RaceColor, Sex};

// ---------------------------------------------------------------------------
// Filter selection: which values are selected per filter field
// ---------------------------------------------------------------------------

/// The user's choice of years, sexes and race/color values.
///
/// Unlike a "no constraint" filter, an empty set selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub years: BTreeSet<i32>,
    pub sexes: BTreeSet<Sex>,
    pub races: BTreeSet<RaceColor>,
}

impl FilterSelection {
    /// Earliest year only, every sex, every race/color.
    pub fn initial(table: &ExamTable) -> Self {
        Self {
            years: table.years.first().copied().into_iter().collect(),
            sexes: table.sexes.clone(),
            races: table.races.clone(),
        }
    }

    /// Whether `record` passes all three filters. Null values never match.
    pub fn matches(&self, record: &ExamRecord) -> bool {
        record.year.is_some_and(|y| self.years.contains(&y))
            && record.sex.as_ref().is_some_and(|s| self.sexes.contains(s))
            && record
                .race_color
                .as_ref()
                .is_some_and(|r| self.races.contains(r))
    }

    pub fn toggle_year(&mut self, year: i32) {
        if !self.years.remove(&year) {
            self.years.insert(year);
        }
    }

    pub fn toggle_sex(&mut self, sex: &Sex) {
        if !self.sexes.remove(sex) {
            self.sexes.insert(sex.clone());
        }
    }

    pub fn toggle_race(&mut self, race: &RaceColor) {
        if !self.races.remove(race) {
            self.races.insert(race.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// FilteredSet
// ---------------------------------------------------------------------------

/// The rows of a table that match a selection, in table order.
#[derive(Debug, Clone, Default)]
pub struct FilteredSet<'a> {
    pub rows: Vec<&'a ExamRecord>,
}

impl<'a> FilteredSet<'a> {
    pub fn from_rows(rows: Vec<&'a ExamRecord>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a ExamRecord> + '_ {
        self.rows.iter().copied()
    }
}

/// Return the rows with `year ∈ years AND sex ∈ sexes AND race ∈ races`.
/// An empty result is valid.
pub fn apply_filter<'a>(table: &'a ExamTable, selection: &FilterSelection) -> FilteredSet<'a> {
    let rows = table
        .records
        .iter()
        .filter(|rec| selection.matches(rec))
        .collect();
    FilteredSet { rows }
}
