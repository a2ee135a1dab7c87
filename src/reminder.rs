//! Deadline reminders

use chrono::{Duration, NaiveDateTime};

use crate::todo::Todo;

/// The todos worth a reminder at `now`: open, due today, with a due time strictly later than `now`
/// and at most `lead` away.
///
/// Sub-tasks are looked at as well, since they carry their own deadlines.
pub fn due_soon(todos: &[Todo], now: NaiveDateTime, lead: Duration) -> Vec<&Todo> {
    let mut found = Vec::new();
    collect_due_soon(todos, now, lead, &mut found);
    found
}

fn collect_due_soon<'a>(todos: &'a [Todo], now: NaiveDateTime, lead: Duration, found: &mut Vec<&'a Todo>) {
    for todo in todos {
        if is_due_soon(todo, now, lead) {
            found.push(todo);
        }
        collect_due_soon(todo.subtasks(), now, lead, found);
    }
}

fn is_due_soon(todo: &Todo, now: NaiveDateTime, lead: Duration) -> bool {
    if todo.completed() {
        return false;
    }
    let (date, time) = match (todo.due_date(), todo.due_time()) {
        (Some(date), Some(time)) => (date, time),
        _ => return false,
    };
    if date != now.date() {
        return false;
    }

    let due = date.and_time(time);
    due > now && due - now <= lead
}
