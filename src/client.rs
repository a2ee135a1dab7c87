//! This module provides a client to connect to the to-do REST server
//!
//! Every request is authenticated with a bearer token, and every non-2xx answer is reported as an
//! [`AgendaError::HttpStatus`]. Nothing is retried.

use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::calendar::{format_iso, parse_local_date};
use crate::config;
use crate::error::AgendaError;
use crate::resource::Resource;
use crate::statistics::Statistics;
use crate::tag::{Tag, TagDraft, TagId};
use crate::todo::{Todo, TodoDraft, TodoId};
use crate::traits::{TagSource, TodoSource};

static TODOS: &str = "todos";
static TAGS: &str = "tags";


/// A source that fetches its data from the REST server
pub struct Client {
    resource: Resource,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>>(url: S, token: Option<String>) -> Result<Self, Box<dyn Error>> {
        let url = Url::parse(url.as_ref())?;
        let http = reqwest::Client::builder()
            .user_agent(config::get(&config::USER_AGENT))
            .build()?;

        Ok(Self {
            resource: Resource::new(url, token),
            http,
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.resource.endpoint(segments);
        let builder = self.http.request(method, url);
        match self.resource.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, Box<dyn Error>> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().to_string();
        log::debug!("{} {}", method, url);

        let response = self.http.execute(request).await?;
        let status = response.status();
        if status.is_success() == false {
            log::warn!("{} {} returned {}", method, url, status);
            return Err(Box::new(AgendaError::HttpStatus { method, url, status }));
        }
        Ok(response)
    }

    async fn send_and_parse<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, Box<dyn Error>> {
        let response = self.send(builder).await?;
        let parsed = response.json::<T>().await?;
        Ok(parsed)
    }
}

#[async_trait]
impl TodoSource for Client {
    async fn get_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>> {
        self.send_and_parse(self.request(Method::GET, &[TODOS])).await
    }

    async fn get_todos_by_date(&self, date: NaiveDate) -> Result<Vec<Todo>, Box<dyn Error>> {
        let date = format_iso(date);
        self.send_and_parse(self.request(Method::GET, &[TODOS, "date", &date])).await
    }

    async fn get_todos_by_week(&self, start: NaiveDate) -> Result<Vec<Todo>, Box<dyn Error>> {
        let request = self.request(Method::GET, &[TODOS, "week"])
            .query(&[("start", format_iso(start))]);
        self.send_and_parse(request).await
    }

    async fn get_calendar_counts(&self, year: i32, month: u32) -> Result<HashMap<NaiveDate, u64>, Box<dyn Error>> {
        let request = self.request(Method::GET, &[TODOS, "calendar-counts"])
            .query(&[("year", year.to_string()), ("month", month.to_string())]);
        let raw: HashMap<String, u64> = self.send_and_parse(request).await?;

        let mut counts = HashMap::with_capacity(raw.len());
        for (date, count) in raw {
            counts.insert(parse_local_date(&date)?, count);
        }
        Ok(counts)
    }

    async fn get_overdue_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>> {
        self.send_and_parse(self.request(Method::GET, &[TODOS, "overdue"])).await
    }

    async fn get_undated_todos(&self) -> Result<Vec<Todo>, Box<dyn Error>> {
        self.send_and_parse(self.request(Method::GET, &[TODOS, "no-date"])).await
    }

    async fn get_statistics(&self, days: u32) -> Result<Statistics, Box<dyn Error>> {
        let request = self.request(Method::GET, &[TODOS, "statistics"])
            .query(&[("days", days)]);
        self.send_and_parse(request).await
    }

    async fn create_todo(&mut self, draft: TodoDraft) -> Result<Todo, Box<dyn Error>> {
        let request = self.request(Method::POST, &[TODOS]).json(&draft);
        self.send_and_parse(request).await
    }

    async fn update_todo(&mut self, id: TodoId, draft: TodoDraft) -> Result<Todo, Box<dyn Error>> {
        let id = id.to_string();
        let request = self.request(Method::PUT, &[TODOS, &id]).json(&draft);
        self.send_and_parse(request).await
    }

    async fn toggle_todo(&mut self, id: TodoId) -> Result<Todo, Box<dyn Error>> {
        let id = id.to_string();
        self.send_and_parse(self.request(Method::PATCH, &[TODOS, &id, "toggle"])).await
    }

    async fn delete_todo(&mut self, id: TodoId) -> Result<(), Box<dyn Error>> {
        let id = id.to_string();
        self.send(self.request(Method::DELETE, &[TODOS, &id])).await?;
        Ok(())
    }

    async fn reorder_todos(&mut self, ids: &[TodoId]) -> Result<(), Box<dyn Error>> {
        let request = self.request(Method::PUT, &[TODOS, "reorder"]).json(ids);
        self.send(request).await?;
        Ok(())
    }

    async fn move_todo(&mut self, id: TodoId, date: NaiveDate) -> Result<Todo, Box<dyn Error>> {
        let id = id.to_string();
        let request = self.request(Method::PATCH, &[TODOS, &id, "due-date"])
            .query(&[("dueDate", format_iso(date))]);
        self.send_and_parse(request).await
    }
}

#[async_trait]
impl TagSource for Client {
    async fn get_tags(&self) -> Result<Vec<Tag>, Box<dyn Error>> {
        self.send_and_parse(self.request(Method::GET, &[TAGS])).await
    }

    async fn create_tag(&mut self, draft: TagDraft) -> Result<Tag, Box<dyn Error>> {
        let request = self.request(Method::POST, &[TAGS]).json(&draft);
        self.send_and_parse(request).await
    }

    async fn delete_tag(&mut self, id: TagId) -> Result<(), Box<dyn Error>> {
        let id = id.to_string();
        self.send(self.request(Method::DELETE, &[TAGS, &id])).await?;
        Ok(())
    }
}
