//! The data sources a [`Provider`](crate::Provider) can talk to
//!
//! A source is usually a [`Client`](crate::client::Client) connected to a server, or a local
//! [`Cache`](crate::cache::Cache) that behaves like one.

use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::statistics::Statistics;
use crate::tag::{Tag, TagDraft, TagId};
use crate::todo::{Todo, TodoDraft, TodoId};

#[async_trait]
pub trait TodoSource {
    /// Returns every top-level todo, in display order
    async fn get_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>>;
    /// Returns the top-level todos due on `date`
    async fn get_todos_by_date(&self, date: NaiveDate) -> Result<Vec<Todo>, Box<dyn Error>>;
    /// Returns the top-level todos due in the seven days starting at `start`
    async fn get_todos_by_week(&self, start: NaiveDate) -> Result<Vec<Todo>, Box<dyn Error>>;
    /// Returns the number of todos due on each day of a month. Days with no todo may be missing
    async fn get_calendar_counts(&self, year: i32, month: u32) -> Result<HashMap<NaiveDate, u64>, Box<dyn Error>>;
    /// Returns the open todos whose due date is in the past
    async fn get_overdue_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>>;
    /// Returns the top-level todos that have no due date
    async fn get_undated_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>>;
    /// Returns completion statistics over the last `days` days
    async fn get_statistics(&self, days: u32) -> Result<Statistics, Box<dyn Error>>;

    async fn create_todo(&mut self, draft: TodoDraft) -> Result<Todo, Box<dyn Error>>;
    /// Replace every field of an existing todo
    async fn update_todo(&mut self, id: TodoId, draft: TodoDraft) -> Result<Todo, Box<dyn Error>>;
    /// Flip the completion status of a todo
    async fn toggle_todo(&mut self, id: TodoId) -> Result<Todo, Box<dyn Error>>;
    async fn delete_todo(&mut self, id: TodoId) -> Result<(), Box<dyn Error>>;
    /// Store `ids` in this order: the todo at index `i` gets position `i`
    async fn reorder_todos(&mut self, ids: &[TodoId]) -> Result<(), Box<dyn Error>>;
    /// Change the due date of a todo
    async fn move_todo(&mut self, id: TodoId, date: NaiveDate) -> Result<Todo, Box<dyn Error>>;
}

#[async_trait]
pub trait TagSource {
    /// Returns every tag, sorted by name
    async fn get_tags(&self) -> Result<Vec<Tag>, Box<dyn Error>>;
    async fn create_tag(&mut self, draft: TagDraft) -> Result<Tag, Box<dyn Error>>;
    async fn delete_tag(&mut self, id: TagId) -> Result<(), Box<dyn Error>>;
}
