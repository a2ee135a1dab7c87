//! This crate provides a client for a calendar-based to-do service.
//!
//! It provides a REST client in the [`client`] module, that can be used as a stand-alone module.
//! A local, in-memory source that behaves like the server is available in the [`cache`] module. It is handy to work offline, and to mock the server in tests.
//!
//! Both sources can be used in a [`Provider`](provider::Provider). \
//! A `Provider` keeps track of what the user is looking at (a day, a week, a month or a filtered list), and computes the view models to display, using the pure functions of the [`calendar`] module. \
//! It also applies the user actions (drag-and-drop reordering, moving a todo to another day, completing it...), and tells the caller which views must be fetched again.

pub mod traits;

pub mod calendar;
pub mod todo;
pub use todo::{Todo, TodoDraft};
pub mod tag;
pub use tag::{Tag, TagDraft};
pub mod reorder;
pub mod statistics;
pub mod reminder;
pub mod provider;
pub use provider::Provider;

pub mod client;
pub mod cache;
pub mod resource;
pub mod mock_behaviour;

pub mod config;
pub mod error;
pub use error::AgendaError;
pub mod utils;
