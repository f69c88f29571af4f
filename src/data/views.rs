//! The derived views shown on the dashboard.
//!
//! Every view is a pure function of a [`FilteredSet`]; nothing here keeps
//! state between selections.

use std::collections::{BTreeMap, BTreeSet};

use super::filter::{apply_filter, FilterSelection, FilteredSet};
use super::model::{
    AttendanceStatus, CompletionStatus, ExamTable, IncomeBracket, InternetAccess,
};

// ---------------------------------------------------------------------------
// Shared arithmetic
// ---------------------------------------------------------------------------

/// `part / whole × 100`, or `0.0` when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// One decimal place and a `%` suffix, e.g. `"75.0%"`.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Running sum and count, finalised to a mean on read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    pub sum: f64,
    pub count: u64,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

// ---------------------------------------------------------------------------
// Per-state internet summary (sidebar table)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StateInternetRow {
    pub state_code: String,
    pub total: u64,
    pub with_internet: u64,
    /// Share of the state's rows with `internet = Sim`, in `[0, 100]`.
    pub percentage: f64,
}

impl StateInternetRow {
    pub fn percentage_label(&self) -> String {
        format_percentage(self.percentage)
    }
}

/// Count rows and internet-enabled rows per state, sorted by percentage
/// descending (ties: larger state first, then code).
pub fn state_internet_summary(filtered: &FilteredSet<'_>) -> Vec<StateInternetRow> {
    let mut counts: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for rec in filtered.iter() {
        let Some(state) = rec.state_code.as_deref() else {
            continue;
        };
        let entry = counts.entry(state).or_default();
        entry.0 += 1;
        if rec.internet == Some(InternetAccess::Yes) {
            entry.1 += 1;
        }
    }

    let mut rows: Vec<StateInternetRow> = counts
        .into_iter()
        .map(|(state, (total, with_internet))| StateInternetRow {
            state_code: state.to_string(),
            total,
            with_internet,
            percentage: percentage(with_internet, total),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.state_code.cmp(&b.state_code))
    });
    rows
}

// ---------------------------------------------------------------------------
// Two-valued rates (donuts)
// ---------------------------------------------------------------------------

/// Counts over a two-valued partition such as {Presente, Ausente}.
/// Rows outside the partition are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateSummary {
    pub positive: u64,
    pub negative: u64,
}

impl RateSummary {
    pub fn total(&self) -> u64 {
        self.positive + self.negative
    }

    /// Share of `positive`; `0.0` when the partition is empty.
    pub fn percentage(&self) -> f64 {
        percentage(self.positive, self.total())
    }

    pub fn percentage_label(&self) -> String {
        format_percentage(self.percentage())
    }
}

/// Presence rate over {Presente, Ausente}.
pub fn presence_rate(filtered: &FilteredSet<'_>) -> RateSummary {
    filtered
        .iter()
        .fold(RateSummary::default(), |mut acc, rec| {
            match rec.attendance {
                Some(AttendanceStatus::Present) => acc.positive += 1,
                Some(AttendanceStatus::Absent) => acc.negative += 1,
                _ => {}
            }
            acc
        })
}

/// Secondary-school completion rate over {Concluiu, Não concluiu}.
pub fn completion_rate(filtered: &FilteredSet<'_>) -> RateSummary {
    filtered
        .iter()
        .fold(RateSummary::default(), |mut acc, rec| {
            match rec.completion {
                Some(CompletionStatus::Completed) => acc.positive += 1,
                Some(CompletionStatus::NotCompleted) => acc.negative += 1,
                _ => {}
            }
            acc
        })
}

// ---------------------------------------------------------------------------
// Participation per state (choropleth)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCount {
    pub state_code: String,
    pub count: u64,
}

/// Rows per state, largest first (ties by code). States with no rows are
/// simply absent.
pub fn participation_by_state(filtered: &FilteredSet<'_>) -> Vec<StateCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for state in filtered.iter().filter_map(|rec| rec.state_code.as_deref()) {
        *counts.entry(state).or_default() += 1;
    }

    let mut rows: Vec<StateCount> = counts
        .into_iter()
        .map(|(state, count)| StateCount {
            state_code: state.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.state_code.cmp(&b.state_code)));
    rows
}

// ---------------------------------------------------------------------------
// Mean score by year × income bracket (heatmap)
// ---------------------------------------------------------------------------

/// Mean score pivoted by year (rows) and income bracket (columns), with a
/// parallel participant count per cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeScoreMatrix {
    /// Row axis, ascending.
    pub years: Vec<i32>,
    /// Column axis in ascending income order; only brackets with data.
    pub brackets: Vec<IncomeBracket>,
    /// `means[row][col]`; `None` for an empty cell.
    pub means: Vec<Vec<Option<f64>>>,
    /// `counts[row][col]`, same axes as `means`.
    pub counts: Vec<Vec<u64>>,
}

impl IncomeScoreMatrix {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || self.brackets.is_empty()
    }

    /// Lowest and highest cell mean, if any cell has data.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.means
            .iter()
            .flatten()
            .flatten()
            .fold(None, |range, &v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Pivot present participants with a score by (year, income bracket).
pub fn score_by_income(filtered: &FilteredSet<'_>) -> IncomeScoreMatrix {
    let mut cells: BTreeMap<(i32, &IncomeBracket), MeanAccumulator> = BTreeMap::new();
    for rec in filtered.iter() {
        if rec.attendance != Some(AttendanceStatus::Present) {
            continue;
        }
        let (Some(year), Some(income), Some(score)) = (rec.year, rec.income.as_ref(), rec.mean_score)
        else {
            continue;
        };
        cells.entry((year, income)).or_default().push(score);
    }

    let years: Vec<i32> = cells
        .keys()
        .map(|(year, _)| *year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    // IncomeBracket's Ord is the fixed ascending-income order.
    let brackets: Vec<IncomeBracket> = cells
        .keys()
        .map(|(_, bracket)| (*bracket).clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut means = Vec::with_capacity(years.len());
    let mut counts = Vec::with_capacity(years.len());
    for &year in &years {
        let row: Vec<MeanAccumulator> = brackets
            .iter()
            .map(|bracket| cells.get(&(year, bracket)).copied().unwrap_or_default())
            .collect();
        means.push(row.iter().map(MeanAccumulator::mean).collect());
        counts.push(row.iter().map(|acc| acc.count).collect());
    }

    IncomeScoreMatrix {
        years,
        brackets,
        means,
        counts,
    }
}

// ---------------------------------------------------------------------------
// Internet access by year (stacked bars)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct InternetYearShare {
    pub year: i32,
    pub access: InternetAccess,
    pub total: u64,
    /// Share within `year`; the shares of one year sum to 100.
    pub percentage: f64,
}

impl InternetYearShare {
    pub fn percentage_label(&self) -> String {
        format_percentage(self.percentage)
    }
}

/// Row count per (year, internet answer) and its share within the year.
/// Sorted by year, then answer.
pub fn internet_by_year(filtered: &FilteredSet<'_>) -> Vec<InternetYearShare> {
    let mut groups: BTreeMap<(i32, &InternetAccess), u64> = BTreeMap::new();
    let mut year_totals: BTreeMap<i32, u64> = BTreeMap::new();
    for rec in filtered.iter() {
        let (Some(year), Some(access)) = (rec.year, rec.internet.as_ref()) else {
            continue;
        };
        *groups.entry((year, access)).or_default() += 1;
        *year_totals.entry(year).or_default() += 1;
    }

    groups
        .into_iter()
        .map(|((year, access), total)| {
            let year_total = year_totals.get(&year).copied().unwrap_or_default();
            InternetYearShare {
                year,
                access: access.clone(),
                total,
                percentage: percentage(total, year_total),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Mean score by year (line chart)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct YearMean {
    pub year: i32,
    /// `None` when no row of that year has a score.
    pub mean: Option<f64>,
    pub scored: u64,
}

/// Mean of every non-null score per year, ascending by year. Attendance is
/// not filtered beyond what the null scores already encode.
pub fn mean_score_by_year(filtered: &FilteredSet<'_>) -> Vec<YearMean> {
    let mut years: BTreeMap<i32, MeanAccumulator> = BTreeMap::new();
    for rec in filtered.iter() {
        let Some(year) = rec.year else { continue };
        let acc = years.entry(year).or_default();
        if let Some(score) = rec.mean_score {
            acc.push(score);
        }
    }

    years
        .into_iter()
        .map(|(year, acc)| YearMean {
            year,
            mean: acc.mean(),
            scored: acc.count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// All views at once
// ---------------------------------------------------------------------------

/// Everything the dashboard draws for one selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardViews {
    pub filtered_rows: usize,
    pub state_summary: Vec<StateInternetRow>,
    pub presence: RateSummary,
    pub completion: RateSummary,
    pub participation: Vec<StateCount>,
    pub income_scores: IncomeScoreMatrix,
    pub internet_by_year: Vec<InternetYearShare>,
    pub mean_by_year: Vec<YearMean>,
}

impl DashboardViews {
    pub fn compute(table: &ExamTable, selection: &FilterSelection) -> Self {
        Self::from_filtered(&apply_filter(table, selection))
    }

    pub fn from_filtered(filtered: &FilteredSet<'_>) -> Self {
        Self {
            filtered_rows: filtered.len(),
            state_summary: state_internet_summary(filtered),
            presence: presence_rate(filtered),
            completion: completion_rate(filtered),
            participation: participation_by_state(filtered),
            income_scores: score_by_income(filtered),
            internet_by_year: internet_by_year(filtered),
            mean_by_year: mean_score_by_year(filtered),
        }
    }
}
