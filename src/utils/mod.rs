//! Some utility functions, mostly to display view models as plain text

use std::fmt::Write;

use chrono::NaiveDate;

use crate::calendar::grid::{DayList, MonthGrid, TodoList, TodoRow, WeekGrid, WEEKDAY_LABELS};
use crate::provider::RenderedView;
use crate::statistics::StatisticsChart;
use crate::tag::Tag;
use crate::todo::{Priority, Todo};

/// Width of a full bar of the statistics chart
const CHART_WIDTH: f64 = 40.0;

/// A single line describing a todo, e.g. `[ ] #4 Write report !high 15/03 14:30 #work (1/2)`
pub fn format_row(row: &TodoRow) -> String {
    let completion = if row.completed { "x" } else { " " };
    let mut line = format!("[{}] #{} {}", completion, row.id, row.title);

    if row.priority != Priority::Medium {
        let _ = write!(line, " !{}", row.priority);
    }
    if let Some(due) = &row.due_label {
        let _ = write!(line, " {}", due);
    }
    if row.overdue {
        line.push_str(" (overdue)");
    }
    for (name, _color) in &row.tags {
        let _ = write!(line, " #{}", name);
    }
    if let Some((done, total)) = row.subtask_progress {
        let _ = write!(line, " ({}/{})", done, total);
    }
    line
}

/// A todo and its sub-tasks, indented
pub fn format_todo(todo: &Todo, today: NaiveDate, indent: usize) -> String {
    let mut text = format!("{}{}\n", " ".repeat(indent), format_row(&TodoRow::new(todo, today)));
    for subtask in todo.subtasks() {
        text.push_str(&format_todo(subtask, today, indent + 4));
    }
    text
}

fn format_todos(todos: &[Todo], today: NaiveDate, indent: usize) -> String {
    if todos.is_empty() {
        return format!("{}(nothing to do)\n", " ".repeat(indent));
    }
    todos.iter().map(|todo| format_todo(todo, today, indent)).collect()
}

/// The month grid, one week per line. Days with todos show how many
pub fn format_month(grid: &MonthGrid) -> String {
    let mut text = WEEKDAY_LABELS.iter().map(|label| format!("{:>6}", label)).collect::<String>();
    text.push('\n');

    for week in grid.weeks() {
        for cell in week {
            let cell_text = match cell {
                None => String::new(),
                Some(cell) => {
                    let marker = if cell.is_today { "*" } else { "" };
                    match cell.count {
                        0 => format!("{}{}", marker, cell.date.format("%-d")),
                        n => format!("{}{}({})", marker, cell.date.format("%-d"), n),
                    }
                },
            };
            let _ = write!(text, "{:>6}", cell_text);
        }
        text.push('\n');
    }
    text
}

pub fn format_week(grid: &WeekGrid, today: NaiveDate) -> String {
    let mut text = String::new();
    for column in &grid.columns {
        let marker = if column.is_today { " (today)" } else { "" };
        let _ = writeln!(text, "{}{}", column.date.format("%a %d/%m"), marker);
        text.push_str(&format_todos(&column.todos, today, 4));
    }
    text
}

pub fn format_day(day: &DayList, today: NaiveDate) -> String {
    format_todos(&day.todos, today, 0)
}

pub fn format_list(list: &TodoList, today: NaiveDate) -> String {
    format!("Filter: {}\n{}", list.filter, format_todos(&list.todos, today, 0))
}

pub fn format_view(view: &RenderedView, today: NaiveDate) -> String {
    match view {
        RenderedView::Month(grid) => format_month(grid),
        RenderedView::Week(grid) => format_week(grid, today),
        RenderedView::Day(day) => format_day(day, today),
        RenderedView::List(list) => format_list(list, today),
    }
}

/// A horizontal bar chart, one day per line
pub fn format_chart(chart: &StatisticsChart) -> String {
    let mut text = format!("{} todos completed\n", chart.completed_count);
    for bar in &chart.bars {
        let width = (bar.height_percent / 100.0 * CHART_WIDTH).round() as usize;
        let _ = writeln!(text, "{:>5} {:>3} {}", bar.date.format("%d/%m"), bar.count, "#".repeat(width));
    }
    text
}

pub fn format_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(|tag| format!("{}\t{}\t{}\n", tag.id(), tag.name(), tag.color().to_hex_string()))
        .collect()
}
