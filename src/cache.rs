//! This module provides a local, in-memory source of todos and tags
//!
//! A [`Cache`] answers the same queries as the server, with the same semantics (ordering, sub-task
//! handling, cascading deletions...). It is used to work offline, and to mock the server in tests
//! (see [`MockBehaviour`]).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, add_days, last_day_of_month};
use crate::error::AgendaError;
use crate::mock_behaviour::MockBehaviour;
use crate::statistics::Statistics;
use crate::tag::{Tag, TagDraft, TagId};
use crate::todo::{Todo, TodoDraft, TodoId};
use crate::traits::{TagSource, TodoSource};


/// A source that keeps its todos and tags in memory, and that can be saved to a file
#[derive(Debug)]
pub struct Cache {
    data: CachedData,
    /// Overrides the current date, so that results do not depend on when tests are run
    today: Option<NaiveDate>,
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CachedData {
    /// Every todo, sub-tasks included. Their `subtasks` field is left empty, it is filled when a todo is returned
    todos: BTreeMap<TodoId, Todo>,
    tags: BTreeMap<TagId, Tag>,
    /// The day each completed todo has been completed
    completions: BTreeMap<TodoId, NaiveDate>,
    last_todo_id: TodoId,
    last_tag_id: TagId,
}

impl Cache {
    /// Initialize an empty cache
    pub fn new() -> Self {
        Self {
            data: CachedData::default(),
            today: None,
            mock_behaviour: None,
        }
    }

    /// Initialize a cache from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let data = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => serde_json::from_reader(std::io::BufReader::new(file))?,
        };

        Ok(Self {
            data,
            today: None,
            mock_behaviour: None,
        })
    }

    /// Store the current content of this cache to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let file = match std::fs::File::create(path) {
            Err(err) => {
                return Err(format!("Unable to save file {:?}: {}", path, err).into());
            },
            Ok(f) => f,
        };

        serde_json::to_writer(file, &self.data)?;
        log::debug!("Saved {} todos and {} tags to {:?}", self.data.todos.len(), self.data.tags.len(), path);
        Ok(())
    }

    /// Pretend the current date is `today` (or the actual current date when `None`)
    pub fn set_today(&mut self, today: Option<NaiveDate>) {
        self.today = today;
    }

    /// Make some operations fail on purpose
    pub fn set_mock_behaviour(&mut self, mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = mock_behaviour;
    }

    /// Compares two Caches to check they have the same content
    pub fn has_same_contents_than(&self, other: &Self) -> bool {
        self.data == other.data
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(calendar::today)
    }

    fn check_behaviour<F>(&self, can: F) -> Result<(), Box<dyn Error>>
    where
        F: FnOnce(&mut MockBehaviour) -> Result<(), Box<dyn Error>>,
    {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(behaviour) => match behaviour.lock() {
                Ok(mut behaviour) => can(&mut behaviour),
                Err(poisoned) => can(&mut poisoned.into_inner()),
            },
        }
    }

    /// A copy of a stored todo, with its sub-tasks attached
    fn assemble(&self, todo: &Todo) -> Todo {
        let mut children: Vec<&Todo> = self.children_of(todo.id()).collect();
        children.sort_by_key(|child| (child.position(), child.id()));

        let mut assembled = todo.clone();
        assembled.set_subtasks(children.into_iter().map(|child| self.assemble(child)).collect());
        assembled
    }

    fn children_of(&self, parent: TodoId) -> impl Iterator<Item = &Todo> + '_ {
        self.data.todos.values().filter(move |todo| todo.parent_id() == Some(parent))
    }

    fn top_level<P>(&self, predicate: P) -> Vec<&Todo>
    where
        P: Fn(&Todo) -> bool,
    {
        self.data.todos.values()
            .filter(|todo| todo.parent_id().is_none() && predicate(todo))
            .collect()
    }

    fn assemble_all(&self, todos: Vec<&Todo>) -> Vec<Todo> {
        todos.into_iter().map(|todo| self.assemble(todo)).collect()
    }

    fn get_assembled(&self, id: TodoId) -> Result<Todo, Box<dyn Error>> {
        match self.data.todos.get(&id) {
            Some(todo) => Ok(self.assemble(todo)),
            None => Err(Box::new(AgendaError::TodoNotFound(id))),
        }
    }

    fn resolve_tags(&self, tag_ids: &[TagId]) -> Vec<Tag> {
        let mut tags: Vec<Tag> = tag_ids.iter()
            .filter_map(|id| self.data.tags.get(id))
            .cloned()
            .collect();
        tags.sort_by_key(|tag| tag.id());
        tags.dedup_by_key(|tag| tag.id());
        tags
    }

    fn record_completion(&mut self, id: TodoId, completed: bool) {
        if completed {
            let today = self.today();
            self.data.completions.insert(id, today);
        } else {
            self.data.completions.remove(&id);
        }
    }

    /// Complete `parent` when every one of its sub-tasks is completed
    fn complete_parent_if_done(&mut self, parent: TodoId) {
        let all_done = self.children_of(parent).all(|child| child.completed());
        if all_done == false {
            return;
        }

        let completed_now = match self.data.todos.get_mut(&parent) {
            Some(todo) if todo.completed() == false => {
                todo.set_completed(true);
                true
            },
            _ => false,
        };
        if completed_now {
            log::debug!("Every sub-task of todo {} is done, completing it", parent);
            self.record_completion(parent, true);
        }
    }

    fn remove_with_subtasks(&mut self, id: TodoId) {
        let children: Vec<TodoId> = self.children_of(id).map(|child| child.id()).collect();
        for child in children {
            self.remove_with_subtasks(child);
        }
        self.data.todos.remove(&id);
        self.data.completions.remove(&id);
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// Untimed todos come after timed ones
fn by_due_time(left: &Todo, right: &Todo) -> Ordering {
    match (left.due_time(), right.due_time()) {
        (Some(l), Some(r)) => l.cmp(&r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn newest_first(left: &Todo, right: &Todo) -> Ordering {
    right.id().cmp(&left.id())
}

#[async_trait]
impl TodoSource for Cache {
    async fn get_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_fetch)?;
        let mut todos = self.top_level(|_| true);
        todos.sort_by(|l, r| l.position().cmp(&r.position()).then_with(|| newest_first(l, r)));
        Ok(self.assemble_all(todos))
    }

    async fn get_todos_by_date(&self, date: NaiveDate) -> Result<Vec<Todo>, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_fetch)?;
        let mut todos = self.top_level(|todo| todo.due_date() == Some(date));
        todos.sort_by(|l, r| by_due_time(l, r).then_with(|| newest_first(l, r)));
        Ok(self.assemble_all(todos))
    }

    async fn get_todos_by_week(&self, start: NaiveDate) -> Result<Vec<Todo>, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_fetch)?;
        let end = add_days(start, 6);
        let mut todos = self.top_level(|todo| match todo.due_date() {
            Some(due) => start <= due && due <= end,
            None => false,
        });
        todos.sort_by(|l, r| {
            l.due_date().cmp(&r.due_date())
                .then_with(|| by_due_time(l, r))
                .then_with(|| newest_first(l, r))
        });
        Ok(self.assemble_all(todos))
    }

    async fn get_calendar_counts(&self, year: i32, month: u32) -> Result<HashMap<NaiveDate, u64>, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_fetch)?;
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AgendaError::InvalidDate(format!("{:04}-{:02}", year, month)))?;
        let last = last_day_of_month(first);

        let mut counts = HashMap::new();
        for todo in self.top_level(|_| true) {
            if let Some(due) = todo.due_date() {
                if first <= due && due <= last {
                    *counts.entry(due).or_insert(0) += 1;
                }
            }
        }
        Ok(counts)
    }

    async fn get_overdue_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_fetch)?;
        let today = self.today();
        let mut todos = self.top_level(|todo| todo.is_overdue(today));
        todos.sort_by(|l, r| l.due_date().cmp(&r.due_date()).then_with(|| newest_first(l, r)));
        Ok(self.assemble_all(todos))
    }

    async fn get_undated_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_fetch)?;
        let mut todos = self.top_level(|todo| todo.due_date().is_none());
        todos.sort_by(|l, r| newest_first(l, r));
        Ok(self.assemble_all(todos))
    }

    async fn get_statistics(&self, days: u32) -> Result<Statistics, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_get_statistics)?;
        let since = add_days(self.today(), -(days as i64));

        let mut stats = Statistics::default();
        for (id, day) in &self.data.completions {
            let still_completed = self.data.todos.get(id).map(|todo| todo.completed()).unwrap_or(false);
            if still_completed && *day >= since {
                stats.completed_count += 1;
                *stats.daily_stats.entry(*day).or_insert(0) += 1;
            }
        }
        Ok(stats)
    }

    async fn create_todo(&mut self, draft: TodoDraft) -> Result<Todo, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_create)?;
        draft.validate()?;

        self.data.last_todo_id += 1;
        let id = self.data.last_todo_id;

        let mut todo = Todo::from_draft(id, &draft);
        if let Some(parent) = draft.parent_id {
            if self.data.todos.contains_key(&parent) == false {
                log::warn!("Parent todo {} does not exist, creating {} as a top-level todo", parent, id);
                todo = Todo::from_draft(id, &TodoDraft { parent_id: None, ..draft.clone() });
            }
        }
        todo.set_tags(self.resolve_tags(&draft.tag_ids));

        self.data.todos.insert(id, todo);
        self.record_completion(id, draft.completed);
        self.get_assembled(id)
    }

    async fn update_todo(&mut self, id: TodoId, draft: TodoDraft) -> Result<Todo, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_update)?;
        draft.validate()?;

        let tags = self.resolve_tags(&draft.tag_ids);
        let (was_completed, parent) = match self.data.todos.get_mut(&id) {
            None => return Err(Box::new(AgendaError::TodoNotFound(id))),
            Some(todo) => {
                let was_completed = todo.completed();
                todo.replace_with(&draft);
                todo.set_tags(tags);
                (was_completed, todo.parent_id())
            },
        };

        if was_completed != draft.completed {
            self.record_completion(id, draft.completed);
        }
        if let (Some(parent), true) = (parent, draft.completed) {
            self.complete_parent_if_done(parent);
        }
        self.get_assembled(id)
    }

    async fn toggle_todo(&mut self, id: TodoId) -> Result<Todo, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_toggle)?;

        let (completed, parent) = match self.data.todos.get_mut(&id) {
            None => return Err(Box::new(AgendaError::TodoNotFound(id))),
            Some(todo) => {
                let completed = todo.completed() == false;
                todo.set_completed(completed);
                (completed, todo.parent_id())
            },
        };

        self.record_completion(id, completed);
        if let (Some(parent), true) = (parent, completed) {
            self.complete_parent_if_done(parent);
        }
        self.get_assembled(id)
    }

    async fn delete_todo(&mut self, id: TodoId) -> Result<(), Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_delete)?;
        if self.data.todos.contains_key(&id) == false {
            return Err(Box::new(AgendaError::TodoNotFound(id)));
        }
        self.remove_with_subtasks(id);
        Ok(())
    }

    async fn reorder_todos(&mut self, ids: &[TodoId]) -> Result<(), Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_reorder)?;
        for (position, id) in ids.iter().enumerate() {
            match self.data.todos.get_mut(id) {
                Some(todo) => todo.set_position(position as i32),
                None => log::debug!("Ignoring unknown todo {} in a reorder request", id),
            }
        }
        Ok(())
    }

    async fn move_todo(&mut self, id: TodoId, date: NaiveDate) -> Result<Todo, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_move)?;
        match self.data.todos.get_mut(&id) {
            None => return Err(Box::new(AgendaError::TodoNotFound(id))),
            Some(todo) => todo.set_due_date(Some(date)),
        }
        self.get_assembled(id)
    }
}

#[async_trait]
impl TagSource for Cache {
    async fn get_tags(&self) -> Result<Vec<Tag>, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_use_tags)?;
        let mut tags: Vec<Tag> = self.data.tags.values().cloned().collect();
        tags.sort_by(|l, r| l.name().cmp(r.name()).then_with(|| l.id().cmp(&r.id())));
        Ok(tags)
    }

    async fn create_tag(&mut self, draft: TagDraft) -> Result<Tag, Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_use_tags)?;
        if draft.name.trim().is_empty() {
            return Err("tag name is required".into());
        }

        self.data.last_tag_id += 1;
        let tag = Tag::new(self.data.last_tag_id, draft.name, draft.color);
        self.data.tags.insert(tag.id(), tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&mut self, id: TagId) -> Result<(), Box<dyn Error>> {
        self.check_behaviour(MockBehaviour::can_use_tags)?;
        if self.data.tags.remove(&id).is_none() {
            return Err(Box::new(AgendaError::TagNotFound(id)));
        }

        for todo in self.data.todos.values_mut() {
            if todo.has_tag(id) {
                let remaining = todo.tags().iter().filter(|tag| tag.id() != id).cloned().collect();
                todo.set_tags(remaining);
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveTime;
    use crate::calendar::parse_local_date;

    fn date(s: &str) -> NaiveDate {
        parse_local_date(s).unwrap()
    }

    fn cache_on(today: &str) -> Cache {
        let mut cache = Cache::new();
        cache.set_today(Some(date(today)));
        cache
    }

    fn ids(todos: &[Todo]) -> Vec<TodoId> {
        todos.iter().map(|todo| todo.id()).collect()
    }

    #[tokio::test]
    async fn listings_only_contain_top_level_todos() {
        let mut cache = cache_on("2024-03-15");
        let parent = cache.create_todo(TodoDraft::new("parent").due_on(date("2024-03-15"))).await.unwrap();
        let child = cache.create_todo(TodoDraft::new("child").due_on(date("2024-03-15")).child_of(parent.id())).await.unwrap();

        let all = cache.get_todos().await.unwrap();
        assert_eq!(ids(&all), vec![parent.id()]);
        assert_eq!(ids(all[0].subtasks()), vec![child.id()]);

        let counts = cache.get_calendar_counts(2024, 3).await.unwrap();
        assert_eq!(counts.get(&date("2024-03-15")), Some(&1));
        assert_eq!(counts.len(), 1);
    }

    #[tokio::test]
    async fn ordering_follows_the_server() {
        let mut cache = cache_on("2024-03-15");
        let day = date("2024-03-15");
        let untimed = cache.create_todo(TodoDraft::new("untimed").due_on(day)).await.unwrap();
        let late = cache.create_todo(TodoDraft::new("late").due_on(day).due_at(NaiveTime::from_hms_opt(18, 0, 0).unwrap())).await.unwrap();
        let early = cache.create_todo(TodoDraft::new("early").due_on(day).due_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap())).await.unwrap();
        let tomorrow = cache.create_todo(TodoDraft::new("tomorrow").due_on(date("2024-03-16"))).await.unwrap();
        let undated = cache.create_todo(TodoDraft::new("someday")).await.unwrap();

        let by_date = cache.get_todos_by_date(day).await.unwrap();
        assert_eq!(ids(&by_date), vec![early.id(), late.id(), untimed.id()]);

        let week = cache.get_todos_by_week(date("2024-03-10")).await.unwrap();
        assert_eq!(ids(&week), vec![early.id(), late.id(), untimed.id(), tomorrow.id()]);

        // Same position everywhere: newest first
        let all = cache.get_todos().await.unwrap();
        assert_eq!(all[0].id(), undated.id());

        cache.reorder_todos(&[untimed.id(), undated.id(), early.id(), late.id(), tomorrow.id()]).await.unwrap();
        let all = cache.get_todos().await.unwrap();
        assert_eq!(ids(&all), vec![untimed.id(), undated.id(), early.id(), late.id(), tomorrow.id()]);
        assert_eq!(all[4].position(), 4);

        assert_eq!(ids(&cache.get_undated_todos().await.unwrap()), vec![undated.id()]);
    }

    #[tokio::test]
    async fn overdue_todos() {
        let mut cache = cache_on("2024-03-15");
        let late = cache.create_todo(TodoDraft::new("late").due_on(date("2024-03-14"))).await.unwrap();
        let _done = cache.create_todo(TodoDraft::new("done").due_on(date("2024-03-01")).completed(true)).await.unwrap();
        let _today = cache.create_todo(TodoDraft::new("today").due_on(date("2024-03-15"))).await.unwrap();

        assert_eq!(ids(&cache.get_overdue_todos().await.unwrap()), vec![late.id()]);
    }

    #[tokio::test]
    async fn completing_every_subtask_completes_the_parent() {
        let mut cache = cache_on("2024-03-15");
        let parent = cache.create_todo(TodoDraft::new("parent")).await.unwrap();
        let first = cache.create_todo(TodoDraft::new("first").child_of(parent.id())).await.unwrap();
        let second = cache.create_todo(TodoDraft::new("second").child_of(parent.id())).await.unwrap();

        cache.toggle_todo(first.id()).await.unwrap();
        assert!(cache.get_todos().await.unwrap()[0].completed() == false);

        let toggled = cache.toggle_todo(second.id()).await.unwrap();
        assert!(toggled.completed());
        let parent = &cache.get_todos().await.unwrap()[0];
        assert!(parent.completed());
        assert!(parent.subtasks().iter().all(|child| child.completed()));

        // Un-completing a sub-task leaves the parent alone
        cache.toggle_todo(first.id()).await.unwrap();
        assert!(cache.get_todos().await.unwrap()[0].completed());

        let stats = cache.get_statistics(30).await.unwrap();
        assert_eq!(stats.completed_count, 2);
        assert_eq!(stats.daily_stats.get(&date("2024-03-15")), Some(&2));
    }

    #[tokio::test]
    async fn deletions_cascade() {
        let mut cache = cache_on("2024-03-15");
        let tag = cache.create_tag(TagDraft::new("work", "#ff0000").unwrap()).await.unwrap();
        let parent = cache.create_todo(TodoDraft::new("parent").with_tags(vec![tag.id()])).await.unwrap();
        assert!(parent.has_tag(tag.id()));
        let child = cache.create_todo(TodoDraft::new("child").child_of(parent.id())).await.unwrap();

        cache.delete_tag(tag.id()).await.unwrap();
        assert!(cache.get_todos().await.unwrap()[0].tags().is_empty());
        assert!(cache.delete_tag(tag.id()).await.is_err());

        cache.delete_todo(parent.id()).await.unwrap();
        assert!(cache.get_todos().await.unwrap().is_empty());
        assert!(cache.toggle_todo(child.id()).await.is_err());
    }

    #[tokio::test]
    async fn tags_are_listed_by_name() {
        let mut cache = Cache::new();
        cache.create_tag(TagDraft::new("zebra", "black").unwrap()).await.unwrap();
        cache.create_tag(TagDraft::new("apple", "green").unwrap()).await.unwrap();
        assert!(cache.create_tag(TagDraft::new("  ", "green").unwrap()).await.is_err());

        let names: Vec<String> = cache.get_tags().await.unwrap().iter().map(|tag| tag.name().to_string()).collect();
        assert_eq!(names, vec!["apple", "zebra"]);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let mut cache = Cache::new();
        assert!(cache.create_todo(TodoDraft::new("")).await.is_err());
        assert!(cache.update_todo(42, TodoDraft::new("missing")).await.is_err());
        assert!(cache.move_todo(42, date("2024-03-15")).await.is_err());
        assert!(cache.get_calendar_counts(2024, 13).await.is_err());
    }

    #[tokio::test]
    async fn mocked_failures() {
        let mut cache = Cache::new();
        let behaviour = Arc::new(Mutex::new(MockBehaviour {
            reorder_behaviour: (1, 1),
            ..MockBehaviour::default()
        }));
        cache.set_mock_behaviour(Some(Arc::clone(&behaviour)));

        assert!(cache.reorder_todos(&[]).await.is_ok());
        assert!(cache.reorder_todos(&[]).await.is_err());
        assert!(cache.reorder_todos(&[]).await.is_ok());
        assert!(cache.get_todos().await.is_ok());
    }

    #[tokio::test]
    async fn serde_cache() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");

        let mut cache = cache_on("2024-03-15");
        let tag = cache.create_tag(TagDraft::new("home", "#00ff00").unwrap()).await.unwrap();
        let parent = cache.create_todo(TodoDraft::new("shopping").due_on(date("2024-03-15")).with_tags(vec![tag.id()])).await.unwrap();
        cache.create_todo(TodoDraft::new("milk").child_of(parent.id()).completed(true)).await.unwrap();

        cache.save_to_file(&cache_path).unwrap();

        let retrieved_cache = Cache::from_file(&cache_path).unwrap();
        assert!(cache.has_same_contents_than(&retrieved_cache));
        assert!(Cache::from_file(&dir.path().join("missing.json")).is_err());
    }
}
