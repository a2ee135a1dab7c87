//! View models: what each view displays, computed from server data without any I/O
//!
//! Painting these models (to HTML, a terminal, ...) is up to the caller.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::calendar::{self, DateRange};
use crate::tag::TagFilter;
use crate::todo::{Priority, Todo, TodoId};

/// Column headers of a Sunday-first grid
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A day in the month grid
#[derive(Clone, Debug, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_today: bool,
    pub is_past: bool,
    /// Number of todos due that day
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st of the month
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
}

impl MonthGrid {
    /// Lay out the month of `reference`, using the per-day counts returned by the server
    pub fn new(reference: NaiveDate, counts: &HashMap<NaiveDate, u64>, today: NaiveDate) -> Self {
        let first = calendar::first_day_of_month(reference);
        let range = DateRange::new(first, calendar::last_day_of_month(reference));

        let days = range.days()
            .map(|date| DayCell {
                date,
                is_today: calendar::is_today(date, today),
                is_past: calendar::is_past(date, today),
                count: counts.get(&date).copied().unwrap_or(0),
            })
            .collect();

        Self {
            year: first.year(),
            month: first.month(),
            leading_blanks: calendar::leading_blank_cells(first),
            days,
        }
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.days.iter().find(|cell| cell.date == date)
    }

    /// The grid as rows of seven cells, `None` standing for blank cells
    pub fn weeks(&self) -> Vec<Vec<Option<&DayCell>>> {
        let mut cells: Vec<Option<&DayCell>> = (0..self.leading_blanks).map(|_| None).collect();
        cells.extend(self.days.iter().map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }
        cells.chunks(7).map(|week| week.to_vec()).collect()
    }
}


/// A day of the week view, with the todos due that day
#[derive(Clone, Debug, PartialEq)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub is_today: bool,
    pub todos: Vec<Todo>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeekGrid {
    pub range: DateRange,
    pub columns: Vec<DayColumn>,
}

impl WeekGrid {
    /// Lay out the week of `reference`, bucketing the todos returned by the server per due date
    pub fn new(reference: NaiveDate, todos: Vec<Todo>, filter: TagFilter, today: NaiveDate) -> Self {
        let start = calendar::start_of_week(reference);
        let range = DateRange::new(start, calendar::add_days(start, 6));

        let columns = bucket_by_day(range, filter.apply(todos))
            .into_iter()
            .map(|(date, todos)| DayColumn {
                date,
                is_today: calendar::is_today(date, today),
                todos,
            })
            .collect();

        Self { range, columns }
    }

    pub fn column(&self, date: NaiveDate) -> Option<&DayColumn> {
        self.columns.iter().find(|column| column.date == date)
    }

    pub fn column_mut(&mut self, date: NaiveDate) -> Option<&mut DayColumn> {
        self.columns.iter_mut().find(|column| column.date == date)
    }
}

/// The todos due on a single day
#[derive(Clone, Debug, PartialEq)]
pub struct DayList {
    pub date: NaiveDate,
    pub todos: Vec<Todo>,
}

impl DayList {
    pub fn new(date: NaiveDate, todos: Vec<Todo>, filter: TagFilter) -> Self {
        Self { date, todos: filter.apply(todos) }
    }
}


/// Which todos the list view shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Overdue,
    Today,
    /// The seven days starting tomorrow
    Upcoming,
    NoDate,
}

impl Default for ListFilter {
    fn default() -> Self {
        ListFilter::All
    }
}

impl Display for ListFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ListFilter::All => write!(f, "all"),
            ListFilter::Overdue => write!(f, "overdue"),
            ListFilter::Today => write!(f, "today"),
            ListFilter::Upcoming => write!(f, "upcoming"),
            ListFilter::NoDate => write!(f, "no-date"),
        }
    }
}

impl FromStr for ListFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ListFilter::All),
            "overdue" => Ok(ListFilter::Overdue),
            "today" => Ok(ListFilter::Today),
            "upcoming" => Ok(ListFilter::Upcoming),
            "no-date" => Ok(ListFilter::NoDate),
            other => Err(format!("unknown list filter {:?}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TodoList {
    pub filter: ListFilter,
    pub todos: Vec<Todo>,
}

impl TodoList {
    pub fn new(filter: ListFilter, todos: Vec<Todo>, tag_filter: TagFilter) -> Self {
        Self { filter, todos: tag_filter.apply(todos) }
    }
}


/// Group todos by due date over `range`.
///
/// Every day of the range gets a bucket, possibly empty. Todos keep their relative order; those
/// without a due date or outside the range are dropped.
pub fn bucket_by_day(range: DateRange, todos: Vec<Todo>) -> BTreeMap<NaiveDate, Vec<Todo>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<Todo>> = range.days().map(|date| (date, Vec::new())).collect();
    for todo in todos {
        if let Some(bucket) = todo.due_date().and_then(|due| buckets.get_mut(&due)) {
            bucket.push(todo);
        }
    }
    buckets
}


/// Everything needed to display a single todo
#[derive(Clone, Debug, PartialEq)]
pub struct TodoRow {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    /// `dd/mm`, followed by `HH:MM` when the todo has a due time
    pub due_label: Option<String>,
    pub priority: Priority,
    pub completed: bool,
    pub overdue: bool,
    /// Tag names and their colors, as `#rrggbb` strings
    pub tags: Vec<(String, String)>,
    /// Completed and total sub-tasks, if there are any
    pub subtask_progress: Option<(usize, usize)>,
    /// Only top-level todos can receive sub-tasks
    pub accepts_subtasks: bool,
}

impl TodoRow {
    pub fn new(todo: &Todo, today: NaiveDate) -> Self {
        let due_label = todo.due_date().map(|date| {
            match todo.due_time() {
                Some(time) => format!("{} {}", date.format("%d/%m"), time.format("%H:%M")),
                None => date.format("%d/%m").to_string(),
            }
        });

        let subtask_progress = if todo.subtasks().is_empty() {
            None
        } else {
            let done = todo.subtasks().iter().filter(|sub| sub.completed()).count();
            Some((done, todo.subtasks().len()))
        };

        Self {
            id: todo.id(),
            title: todo.title().to_string(),
            description: todo.description().filter(|d| d.is_empty() == false).map(String::from),
            due_label,
            priority: todo.priority(),
            completed: todo.completed(),
            overdue: todo.is_overdue(today),
            tags: todo.tags().iter()
                .map(|tag| (tag.name().to_string(), tag.color().to_hex_string()))
                .collect(),
            subtask_progress,
            accepts_subtasks: todo.parent_id().is_none(),
        }
    }

    /// Sub-task completion, as a percentage
    pub fn subtask_percent(&self) -> Option<u32> {
        self.subtask_progress.map(|(done, total)| (done * 100 / total.max(1)) as u32)
    }
}
