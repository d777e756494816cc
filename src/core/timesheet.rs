// BillExact - core/timesheet.rs
//
// Timesheet totals, keyword-based activity categorisation, and the
// per-category / per-day / per-project aggregations shown on dashboards.
// Core layer: pure logic, no I/O.

use crate::core::model::{Activity, BillingEntry, Category, Project, TimeEntry};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Label used for activities that match no category keyword.
pub const UNCATEGORISED: &str = "Uncategorised";

// =============================================================================
// Timesheet totals
// =============================================================================

/// Hour totals over a set of time entries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetTotals {
    pub entry_count: usize,
    pub total_hours: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
}

impl TimesheetTotals {
    pub fn from_entries(entries: &[TimeEntry]) -> Self {
        let mut totals = Self {
            entry_count: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            let hours = entry.duration / 60.0;
            totals.total_hours += hours;
            if entry.billable {
                totals.billable_hours += hours;
            } else {
                totals.non_billable_hours += hours;
            }
        }
        totals
    }

    /// Share of hours that are billable (0.0 when nothing is logged).
    pub fn billable_ratio(&self) -> f64 {
        if self.total_hours > 0.0 {
            self.billable_hours / self.total_hours
        } else {
            0.0
        }
    }
}

/// Hours logged on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub hours: f64,
    pub billable: f64,
    pub non_billable: f64,
}

/// Aggregate time entries per calendar day, oldest first.
pub fn daily_totals(entries: &[TimeEntry]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, DailyTotal> = BTreeMap::new();
    for entry in entries {
        let hours = entry.duration / 60.0;
        let day = by_day.entry(entry.date).or_insert(DailyTotal {
            date: entry.date,
            hours: 0.0,
            billable: 0.0,
            non_billable: 0.0,
        });
        day.hours += hours;
        if entry.billable {
            day.billable += hours;
        } else {
            day.non_billable += hours;
        }
    }
    by_day.into_values().collect()
}

/// Hours and billable value logged against one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTotal {
    pub project_id: String,
    pub name: String,
    pub hours: f64,
    /// Billable hours times the project's rate.
    pub billable_value: f64,
}

/// Aggregate time entries per project, most hours first.
///
/// Entries without a project, or whose project is unknown, are skipped.
pub fn project_totals(entries: &[TimeEntry], projects: &[Project]) -> Vec<ProjectTotal> {
    let by_id: HashMap<&str, &Project> = projects.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut totals: HashMap<&str, ProjectTotal> = HashMap::new();

    for entry in entries {
        let Some(project) = entry
            .project_id
            .as_deref()
            .and_then(|id| by_id.get(id).copied())
        else {
            continue;
        };
        let hours = entry.duration / 60.0;
        let total = totals.entry(project.id.as_str()).or_insert(ProjectTotal {
            project_id: project.id.clone(),
            name: project.name.clone(),
            hours: 0.0,
            billable_value: 0.0,
        });
        total.hours += hours;
        if entry.billable {
            total.billable_value += hours * project.billable_rate;
        }
    }

    let mut totals: Vec<ProjectTotal> = totals.into_values().collect();
    totals.sort_by(|a, b| {
        b.hours
            .total_cmp(&a.hours)
            .then_with(|| a.name.cmp(&b.name))
    });
    totals
}

// =============================================================================
// Activity categorisation
// =============================================================================

/// Find the category for an activity.
///
/// An explicit `category_id` on the activity wins. Otherwise the first
/// category (in list order) with a keyword occurring in the app name or
/// window title is chosen; matching is a case-insensitive substring test.
pub fn categorize<'a>(activity: &Activity, categories: &'a [Category]) -> Option<&'a Category> {
    if let Some(ref id) = activity.category_id {
        if let Some(category) = categories.iter().find(|c| &c.id == id) {
            return Some(category);
        }
    }

    let haystack = format!("{} {}", activity.app_name, activity.window_title).to_lowercase();
    categories.iter().find(|category| {
        category
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && haystack.contains(&k))
    })
}

/// Minutes spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTime {
    pub category: String,
    pub minutes: f64,
    pub activity_count: usize,
}

impl CategoryTime {
    pub fn hours(&self) -> f64 {
        self.minutes / 60.0
    }
}

/// Total activity time per category, most time first.
///
/// Activities matching no category are grouped under `UNCATEGORISED`.
pub fn time_by_category(activities: &[Activity], categories: &[Category]) -> Vec<CategoryTime> {
    let mut totals: HashMap<String, CategoryTime> = HashMap::new();

    for activity in activities {
        let name = categorize(activity, categories)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNCATEGORISED.to_string());
        let total = totals.entry(name.clone()).or_insert(CategoryTime {
            category: name,
            minutes: 0.0,
            activity_count: 0,
        });
        total.minutes += activity.duration;
        total.activity_count += 1;
    }

    let mut totals: Vec<CategoryTime> = totals.into_values().collect();
    totals.sort_by(|a, b| {
        b.minutes
            .total_cmp(&a.minutes)
            .then_with(|| a.category.cmp(&b.category))
    });

    tracing::debug!(
        activities = activities.len(),
        categories = totals.len(),
        "Activity time aggregated"
    );

    totals
}

// =============================================================================
// Billing totals
// =============================================================================

/// Hours and amount billed per matter, sorted by matter ID.
pub fn billing_by_matter(entries: &[BillingEntry]) -> BTreeMap<String, (f64, f64)> {
    let mut by_matter: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for entry in entries {
        let totals = by_matter.entry(entry.matter_id.clone()).or_insert((0.0, 0.0));
        totals.0 += entry.hours;
        totals.1 += entry.amount;
    }
    by_matter
}
