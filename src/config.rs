//! Support for library configuration options

use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

/// Environment variable the `agenda` binary reads the server base URL from (e.g. `http://localhost:8080/api`)
pub const URL_ENV_VAR: &str = "TODO_AGENDA_URL";
/// Environment variable the `agenda` binary reads the bearer token from
pub const TOKEN_ENV_VAR: &str = "TODO_AGENDA_TOKEN";

/// The User-Agent header sent with every request.
/// Feel free to override it when initing this library.
pub static USER_AGENT: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new(format!("todo-agenda/{}", env!("CARGO_PKG_VERSION")))));

/// How many past days the statistics view asks the server for
pub static STATISTICS_DAYS: Lazy<Arc<Mutex<u32>>> = Lazy::new(|| Arc::new(Mutex::new(30)));

/// How many days (the most recent ones) the statistics chart displays
pub static CHART_BARS: Lazy<Arc<Mutex<usize>>> = Lazy::new(|| Arc::new(Mutex::new(14)));

/// How long before its due time a todo triggers a reminder
pub static REMINDER_LEAD_MINUTES: Lazy<Arc<Mutex<i64>>> = Lazy::new(|| Arc::new(Mutex::new(15)));

/// Read the current value of a setting
pub fn get<T: Clone>(setting: &Lazy<Arc<Mutex<T>>>) -> T {
    match setting.lock() {
        Ok(value) => value.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Override the value of a setting
pub fn set<T>(setting: &Lazy<Arc<Mutex<T>>>, new_value: T) {
    match setting.lock() {
        Ok(mut value) => *value = new_value,
        Err(poisoned) => *poisoned.into_inner() = new_value,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_can_be_overridden() {
        static SETTING: Lazy<Arc<Mutex<u32>>> = Lazy::new(|| Arc::new(Mutex::new(30)));
        assert_eq!(get(&SETTING), 30);
        set(&SETTING, 7);
        assert_eq!(get(&SETTING), 7);

        assert!(get(&USER_AGENT).starts_with("todo-agenda/"));
    }
}
