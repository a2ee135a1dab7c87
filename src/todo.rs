//! To-do items, as exchanged with the server

use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AgendaError;
use crate::tag::{Tag, TagId};

pub type TodoId = i64;

/// Longest title the server accepts
pub const MAX_TITLE_LEN: usize = 200;
/// Longest description the server accepts
pub const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority {:?}", other)),
        }
    }
}


/// A to-do item.
///
/// Instances are only ever built from server responses (or by the local [`Cache`](crate::cache::Cache)
/// that mimics a server): the client never creates or edits them directly, it sends [`TodoDraft`]s instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    id: TodoId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, with = "optional_local_date")]
    due_date: Option<NaiveDate>,
    #[serde(default, with = "optional_local_time")]
    due_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    priority: Priority,
    #[serde(default)]
    completed: bool,
    /// Display order within the containing list
    #[serde(default, rename = "displayOrder", alias = "position", deserialize_with = "null_as_default")]
    position: i32,
    #[serde(default)]
    parent_id: Option<TodoId>,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<Tag>,
    #[serde(default, deserialize_with = "null_as_default")]
    subtasks: Vec<Todo>,
}

impl Todo {
    /// Build the todo a server would return after storing `draft` under `id`.
    /// Tags are not resolved here, see [`Self::set_tags`]
    pub fn from_draft(id: TodoId, draft: &TodoDraft) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: draft.due_date,
            due_time: draft.due_time,
            priority: draft.priority,
            completed: draft.completed,
            position: 0,
            parent_id: draft.parent_id,
            tags: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    pub fn id(&self) -> TodoId                  { self.id }
    pub fn title(&self) -> &str                 { &self.title }
    pub fn description(&self) -> Option<&str>  { self.description.as_deref() }
    pub fn due_date(&self) -> Option<NaiveDate> { self.due_date }
    pub fn due_time(&self) -> Option<NaiveTime> { self.due_time }
    pub fn priority(&self) -> Priority          { self.priority }
    pub fn completed(&self) -> bool             { self.completed }
    pub fn position(&self) -> i32               { self.position }
    pub fn parent_id(&self) -> Option<TodoId>   { self.parent_id }
    pub fn tags(&self) -> &[Tag]                { &self.tags }
    pub fn subtasks(&self) -> &[Todo]           { &self.subtasks }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.iter().any(|tag| tag.id() == tag_id)
    }

    /// Whether this todo is still open while its due date is strictly before `today`.
    /// Only dates are compared: a todo due today is never overdue, whatever its due time.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => self.completed == false && due < today,
            None => false,
        }
    }

    /// The body to send to fully replace this todo on the server
    pub fn to_draft(&self) -> TodoDraft {
        TodoDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            due_time: self.due_time,
            priority: self.priority,
            completed: self.completed,
            tag_ids: self.tags.iter().map(|tag| tag.id()).collect(),
            parent_id: self.parent_id,
        }
    }

    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    pub(crate) fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
    }

    pub(crate) fn set_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
    }

    pub(crate) fn set_subtasks(&mut self, subtasks: Vec<Todo>) {
        self.subtasks = subtasks;
    }

    /// Overwrite every editable field with the content of `draft`, keeping id, position and sub-tasks
    pub(crate) fn replace_with(&mut self, draft: &TodoDraft) {
        self.title = draft.title.clone();
        self.description = draft.description.clone();
        self.due_date = draft.due_date;
        self.due_time = draft.due_time;
        self.priority = draft.priority;
        self.completed = draft.completed;
    }
}


/// The body of a create or update request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "optional_local_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "optional_local_time")]
    pub due_time: Option<NaiveTime>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default)]
    pub parent_id: Option<TodoId>,
}

impl TodoDraft {
    pub fn new<S: ToString>(title: S) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            due_date: None,
            due_time: None,
            priority: Priority::default(),
            completed: false,
            tag_ids: Vec::new(),
            parent_id: None,
        }
    }

    pub fn described<S: ToString>(mut self, description: S) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn due_at(mut self, time: NaiveTime) -> Self {
        self.due_time = Some(time);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags(mut self, tag_ids: Vec<TagId>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn child_of(mut self, parent: TodoId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Check the constraints the server enforces, so that obviously invalid drafts are not sent
    pub fn validate(&self) -> Result<(), AgendaError> {
        if self.title.trim().is_empty() {
            return Err(AgendaError::InvalidTodo("title is required".to_string()));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(AgendaError::InvalidTodo(format!("title must be at most {} characters", MAX_TITLE_LEN)));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(AgendaError::InvalidTodo(format!("description must be at most {} characters", MAX_DESCRIPTION_LEN)));
            }
        }
        Ok(())
    }
}


/// Parse a time of day sent by the server, either `HH:MM` or `HH:MM:SS`
pub fn parse_local_time(s: &str) -> Result<NaiveTime, AgendaError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| AgendaError::InvalidTime(s.to_string()))
}

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod optional_local_date {
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use crate::calendar::{format_iso, parse_local_date};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&format_iso(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => parse_local_date(&s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

mod optional_local_time {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => super::parse_local_time(&s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_local_date;

    fn date(s: &str) -> NaiveDate {
        parse_local_date(s).unwrap()
    }

    #[test]
    fn deserialize_server_todo() {
        let json = r##"{
            "id": 7,
            "title": "Write report",
            "description": null,
            "completed": false,
            "dueDate": "2024-03-15",
            "dueTime": "14:30:00",
            "priority": "HIGH",
            "displayOrder": 2,
            "parentId": null,
            "tags": [{"id": 1, "name": "work", "color": "#ff0000"}],
            "subtasks": [{"id": 8, "title": "Outline", "completed": true, "parentId": 7}],
            "createdAt": "2024-03-01T10:00:00"
        }"##;
        let todo: Todo = serde_json::from_str(json).unwrap();

        assert_eq!(todo.id(), 7);
        assert_eq!(todo.due_date(), Some(date("2024-03-15")));
        assert_eq!(todo.due_time(), Some(NaiveTime::from_hms_opt(14, 30, 0).unwrap()));
        assert_eq!(todo.priority(), Priority::High);
        assert_eq!(todo.position(), 2);
        assert!(todo.has_tag(1));
        assert_eq!(todo.subtasks().len(), 1);
        assert_eq!(todo.subtasks()[0].parent_id(), Some(7));
    }

    #[test]
    fn missing_and_null_fields_get_defaults() {
        let todo: Todo = serde_json::from_str(r#"{"id": 1, "title": "t", "priority": null, "tags": null, "dueTime": "09:05"}"#).unwrap();
        assert_eq!(todo.priority(), Priority::Medium);
        assert!(todo.tags().is_empty());
        assert_eq!(todo.due_date(), None);
        assert_eq!(todo.due_time(), Some(NaiveTime::from_hms_opt(9, 5, 0).unwrap()));

        assert!(serde_json::from_str::<Todo>(r#"{"id": 1, "title": "t", "dueDate": "2024-3-1"}"#).is_err());
    }

    #[test]
    fn overdue_compares_dates_only() {
        let today = date("2024-03-15");
        let mut todo = Todo::from_draft(1, &TodoDraft::new("a").due_on(date("2024-03-14")));
        assert!(todo.is_overdue(today));

        todo.set_completed(true);
        assert!(todo.is_overdue(today) == false);

        let due_today = Todo::from_draft(2, &TodoDraft::new("b").due_on(today).due_at(NaiveTime::from_hms_opt(0, 1, 0).unwrap()));
        assert!(due_today.is_overdue(today) == false);

        let undated = Todo::from_draft(3, &TodoDraft::new("c"));
        assert!(undated.is_overdue(today) == false);
    }

    #[test]
    fn draft_wire_format() {
        let draft = TodoDraft::new("Buy milk")
            .due_on(date("2024-03-15"))
            .due_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap())
            .with_tags(vec![3, 4])
            .child_of(9);
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["title"], "Buy milk");
        assert_eq!(value["dueDate"], "2024-03-15");
        assert_eq!(value["dueTime"], "08:00");
        assert_eq!(value["priority"], "MEDIUM");
        assert_eq!(value["completed"], false);
        assert_eq!(value["tagIds"], serde_json::json!([3, 4]));
        assert_eq!(value["parentId"], 9);
        assert!(value["description"].is_null());
    }

    #[test]
    fn draft_validation() {
        assert!(TodoDraft::new("ok").validate().is_ok());
        assert!(TodoDraft::new("   ").validate().is_err());
        assert!(TodoDraft::new("x".repeat(MAX_TITLE_LEN)).validate().is_ok());
        assert!(TodoDraft::new("x".repeat(MAX_TITLE_LEN + 1)).validate().is_err());
        assert!(TodoDraft::new("ok").described("d".repeat(MAX_DESCRIPTION_LEN + 1)).validate().is_err());
    }

    #[test]
    fn full_replace_keeps_every_field() {
        let todo = Todo::from_draft(4, &TodoDraft::new("a").with_priority(Priority::Low).completed(true));
        let draft = todo.to_draft();
        assert_eq!(draft.priority, Priority::Low);
        assert!(draft.completed);
        assert_eq!(Todo::from_draft(4, &draft), todo);
    }
}
