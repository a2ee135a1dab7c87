//! This modules keeps track of what the user is looking at, and applies their actions
//!
//! A [`Provider`] owns the application state (which period, which view, which filters), the view
//! model that is currently displayed, and a data source it fetches everything from.
//!
//! Some actions (dropping a todo onto another one) are applied to the displayed view model right
//! away, before the server is even contacted. Every action then tells the caller which views are
//! stale, as an [`Invalidation`], and the caller decides when to re-fetch them (see [`Provider::refresh_if`]).

use std::error::Error;

use bitflags::bitflags;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::calendar::{self, ViewMode};
use crate::calendar::grid::{DayList, ListFilter, MonthGrid, TodoList, WeekGrid};
use crate::config;
use crate::reminder;
use crate::reorder::{apply_order, drop_onto, merge_visible_order};
use crate::statistics::StatisticsChart;
use crate::tag::{Tag, TagDraft, TagFilter, TagId};
use crate::todo::{Todo, TodoDraft, TodoId};
use crate::traits::{TagSource, TodoSource};

pub mod feedback;
use feedback::{Feedback, FeedbackEvent, FeedbackSender};

bitflags! {
    /// The views an action has made stale, and that should be fetched again
    pub struct Invalidation: u8 {
        const DAY = 1;
        const WEEK = 2;
        const MONTH = 4;
        const LIST = 8;
        const TAGS = 16;
        const STATISTICS = 32;
        /// Every view that displays todos
        const TODOS = Self::DAY.bits | Self::WEEK.bits | Self::MONTH.bits | Self::LIST.bits;
    }
}

impl Invalidation {
    /// The flag that stands for a given view
    pub fn for_view(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Day => Invalidation::DAY,
            ViewMode::Week => Invalidation::WEEK,
            ViewMode::Month => Invalidation::MONTH,
            ViewMode::List => Invalidation::LIST,
        }
    }
}


/// What the user is currently looking at
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub reference_date: NaiveDate,
    pub view_mode: ViewMode,
    pub tag_filter: TagFilter,
    pub list_filter: ListFilter,
    /// The day drilled down into from the month grid
    pub selected_date: Option<NaiveDate>,
}

impl ViewState {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            view_mode: ViewMode::default(),
            tag_filter: TagFilter::default(),
            list_filter: ListFilter::default(),
            selected_date: None,
        }
    }
}

/// The last view model that has been successfully fetched
#[derive(Clone, Debug, PartialEq)]
pub enum RenderedView {
    Month(MonthGrid),
    Week(WeekGrid),
    Day(DayList),
    List(TodoList),
}

impl RenderedView {
    pub fn view_mode(&self) -> ViewMode {
        match self {
            RenderedView::Month(_) => ViewMode::Month,
            RenderedView::Week(_) => ViewMode::Week,
            RenderedView::Day(_) => ViewMode::Day,
            RenderedView::List(_) => ViewMode::List,
        }
    }
}

/// A displayed list of todos that can be reordered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    /// The todos of a day, either a week column, the day view, or the day selected in the month grid
    Day(NaiveDate),
    /// The list view
    List,
}


/// Coordinates the displayed views with a data source.
///
/// `S` is usually a [`Client`](crate::client::Client). Tests (and offline use) rather use a [`Cache`](crate::cache::Cache).
pub struct Provider<S>
where
    S: TodoSource + TagSource,
{
    source: S,
    state: ViewState,
    displayed: Option<RenderedView>,
    selected_day: Option<DayList>,
    tags: Vec<Tag>,
    feedback: Feedback,
    /// Overrides the current date
    today: Option<NaiveDate>,
}

impl<S> Provider<S>
where
    S: TodoSource + TagSource,
{
    /// Create a provider that shows the current month. Nothing is fetched until [`Self::refresh`] is called
    pub fn new(source: S) -> Self {
        Self::with_feedback(source, Feedback::new())
    }

    /// Create a provider that sends its notices to a [`feedback_channel`](feedback::feedback_channel)
    pub fn new_with_feedback_channel(source: S, channel: FeedbackSender) -> Self {
        Self::with_feedback(source, Feedback::new_with_feedback_channel(channel))
    }

    fn with_feedback(source: S, feedback: Feedback) -> Self {
        Self {
            source,
            state: ViewState::new(calendar::today()),
            displayed: None,
            selected_day: None,
            tags: Vec::new(),
            feedback,
            today: None,
        }
    }

    pub fn source(&self) -> &S                         { &self.source }
    pub fn source_mut(&mut self) -> &mut S             { &mut self.source }
    pub fn state(&self) -> &ViewState                  { &self.state }
    /// The view currently displayed. It may be stale if the last refresh failed
    pub fn displayed(&self) -> Option<&RenderedView>   { self.displayed.as_ref() }
    /// The todos of the day selected in the month grid
    pub fn selected_day(&self) -> Option<&DayList>     { self.selected_day.as_ref() }
    pub fn tags(&self) -> &[Tag]                       { &self.tags }
    /// How many errors have been reported since this provider was created
    pub fn n_errors(&self) -> u32                      { self.feedback.n_errors() }

    /// Pretend the current date is `today` (or the actual current date when `None`), and show it
    pub fn set_today(&mut self, today: Option<NaiveDate>) {
        self.today = today;
        self.state.reference_date = self.today();
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(calendar::today)
    }

    /// The title of the current period (e.g. `March 2024`)
    pub fn period_title(&self) -> String {
        calendar::period_title(self.state.reference_date, self.state.view_mode)
    }


    // Navigation

    /// Replace the whole application state, then refresh
    pub async fn show(&mut self, state: ViewState) -> bool {
        self.state = state;
        self.refresh().await
    }

    /// Move `steps` periods forward (or backward if negative), then refresh
    pub async fn navigate(&mut self, steps: i64) -> bool {
        self.state.reference_date = calendar::navigate(self.state.reference_date, self.state.view_mode, steps);
        self.state.selected_date = None;
        self.refresh().await
    }

    pub async fn go_to_today(&mut self) -> bool {
        self.state.reference_date = self.today();
        self.state.selected_date = None;
        self.refresh().await
    }

    /// Show the period of `date`, then refresh
    pub async fn go_to(&mut self, date: NaiveDate) -> bool {
        self.state.reference_date = date;
        self.state.selected_date = None;
        self.refresh().await
    }

    pub async fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        self.state.view_mode = mode;
        self.state.selected_date = None;
        self.refresh().await
    }

    pub async fn set_tag_filter(&mut self, filter: TagFilter) -> bool {
        self.state.tag_filter = filter;
        self.refresh().await
    }

    pub async fn set_list_filter(&mut self, filter: ListFilter) -> bool {
        self.state.list_filter = filter;
        self.refresh().await
    }


    // Rendering

    /// Fetch the data of the current view, and display it.
    ///
    /// In case of failure, the previously displayed view stays displayed (even though it may be
    /// stale), and an error notice is sent. Returns whether the view has been updated.
    pub async fn refresh(&mut self) -> bool {
        let view = self.state.view_mode;
        self.feedback.send(FeedbackEvent::Loading{ view });

        match self.fetch_view().await {
            Err(err) => {
                self.feedback.error(&format!("Unable to load the {} view: {}", view, err));
                false
            },
            Ok((rendered, selected_day)) => {
                let text = format!("Rendered the {} view of {}", view, self.period_title());
                self.feedback.info(&text);
                self.displayed = Some(rendered);
                self.selected_day = selected_day;
                self.feedback.send(FeedbackEvent::Loaded{ view });
                true
            },
        }
    }

    /// Refresh the current view if `invalidation` says it is stale, and reload the tags if they are.
    ///
    /// Returns false if something had to be fetched again and could not be.
    pub async fn refresh_if(&mut self, invalidation: Invalidation) -> bool {
        let mut success = true;
        if invalidation.contains(Invalidation::TAGS) {
            success &= self.load_tags().await;
        }
        if invalidation.intersects(Invalidation::for_view(self.state.view_mode)) {
            success &= self.refresh().await;
        }
        success
    }

    /// Drill down into a day of the month grid
    pub async fn select_date(&mut self, date: NaiveDate) -> bool {
        self.state.selected_date = Some(date);
        match self.fetch_day(date).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to load the todos of {}: {}", calendar::format_iso(date), err));
                false
            },
            Ok(day) => {
                self.selected_day = Some(day);
                true
            },
        }
    }

    pub async fn load_tags(&mut self) -> bool {
        match self.source.get_tags().await {
            Err(err) => {
                self.feedback.error(&format!("Unable to load the tags: {}", err));
                false
            },
            Ok(tags) => {
                self.tags = tags;
                true
            },
        }
    }

    async fn fetch_view(&self) -> Result<(RenderedView, Option<DayList>), Box<dyn Error>> {
        let today = self.today();
        let reference = self.state.reference_date;
        let tag_filter = self.state.tag_filter;

        let rendered = match self.state.view_mode {
            ViewMode::Month => {
                let counts = self.source.get_calendar_counts(reference.year(), reference.month()).await?;
                RenderedView::Month(MonthGrid::new(reference, &counts, today))
            },
            ViewMode::Week => {
                let todos = self.source.get_todos_by_week(calendar::start_of_week(reference)).await?;
                RenderedView::Week(WeekGrid::new(reference, todos, tag_filter, today))
            },
            ViewMode::Day => {
                let todos = self.source.get_todos_by_date(reference).await?;
                RenderedView::Day(DayList::new(reference, todos, tag_filter))
            },
            ViewMode::List => {
                let filter = self.state.list_filter;
                let todos = self.fetch_list(filter, today).await?;
                RenderedView::List(TodoList::new(filter, todos, tag_filter))
            },
        };

        let selected_day = match (self.state.view_mode, self.state.selected_date) {
            (ViewMode::Month, Some(date)) => Some(self.fetch_day(date).await?),
            _ => None,
        };

        Ok((rendered, selected_day))
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<DayList, Box<dyn Error>> {
        let todos = self.source.get_todos_by_date(date).await?;
        Ok(DayList::new(date, todos, self.state.tag_filter))
    }

    async fn fetch_list(&self, filter: ListFilter, today: NaiveDate) -> Result<Vec<Todo>, Box<dyn Error>> {
        match filter {
            ListFilter::All => self.source.get_todos().await,
            ListFilter::Overdue => self.source.get_overdue_todos().await,
            ListFilter::Today => self.source.get_todos_by_date(today).await,
            ListFilter::Upcoming => self.source.get_todos_by_week(calendar::add_days(today, 1)).await,
            ListFilter::NoDate => self.source.get_undated_todos().await,
        }
    }

    /// The unfiltered order of a container, as the source knows it
    async fn fetch_container_order(&self, container: Container) -> Result<Vec<TodoId>, Box<dyn Error>> {
        let todos = match container {
            Container::Day(date) => self.source.get_todos_by_date(date).await?,
            Container::List => self.fetch_list(self.state.list_filter, self.today()).await?,
        };
        Ok(todos.iter().map(|todo| todo.id()).collect())
    }

    fn current_view(&self) -> Invalidation {
        Invalidation::for_view(self.state.view_mode)
    }

    /// The displayed todos of a container, if it is displayed at all
    fn container_mut(&mut self, container: Container) -> Option<&mut Vec<Todo>> {
        match (container, self.displayed.as_mut()) {
            (Container::List, Some(RenderedView::List(list))) => Some(&mut list.todos),
            (Container::Day(date), Some(RenderedView::Week(grid))) => grid.column_mut(date).map(|column| &mut column.todos),
            (Container::Day(date), Some(RenderedView::Day(day))) if day.date == date => Some(&mut day.todos),
            (Container::Day(date), Some(RenderedView::Month(_))) => {
                self.selected_day.as_mut()
                    .filter(|day| day.date == date)
                    .map(|day| &mut day.todos)
            },
            _ => None,
        }
    }


    // Mutations

    /// Drop `dragged` onto `target` within a displayed container.
    ///
    /// The new order is displayed right away, then sent to the source as a whole. When the source
    /// accepts it, the displayed view already matches and nothing is invalidated.
    pub async fn reorder(&mut self, container: Container, dragged: TodoId, target: TodoId) -> Invalidation {
        let todos = match self.container_mut(container) {
            Some(todos) => todos,
            None => {
                log::warn!("Unable to reorder: {:?} is not displayed", container);
                return Invalidation::empty();
            },
        };

        let order: Vec<TodoId> = todos.iter().map(|todo| todo.id()).collect();
        let new_order = drop_onto(&order, dragged, target);
        if new_order == order {
            return Invalidation::empty();
        }
        apply_order(todos, &new_order);

        // The server renumbers the whole list, including the todos the tag filter hides
        let sent_order = match self.state.tag_filter {
            TagFilter::All => new_order,
            TagFilter::Tag(_) => match self.fetch_container_order(container).await {
                Err(err) => {
                    self.feedback.error(&format!("Unable to reorder: {}", err));
                    return self.current_view();
                },
                Ok(full) => merge_visible_order(&full, &new_order),
            },
        };

        match self.source.reorder_todos(&sent_order).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to reorder: {}", err));
                self.current_view()
            },
            Ok(()) => {
                log::debug!("Reordered {:?} as {:?}", container, sent_order);
                Invalidation::empty()
            },
        }
    }

    /// Give a todo a new due date. The displayed view is left untouched until it is fetched again
    pub async fn move_to_date(&mut self, id: TodoId, date: NaiveDate) -> Invalidation {
        match self.source.move_todo(id, date).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to move todo {}: {}", id, err));
                self.current_view()
            },
            Ok(todo) => {
                self.feedback.success(&format!("\"{}\" moved to {}", todo.title(), date.format("%d/%m")));
                Invalidation::TODOS
            },
        }
    }

    /// Flip the completion status of a todo. Its new status is only displayed once the view is fetched again
    pub async fn toggle(&mut self, id: TodoId) -> Invalidation {
        match self.source.toggle_todo(id).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to update todo {}: {}", id, err));
                self.current_view()
            },
            Ok(todo) => {
                let text = match todo.completed() {
                    true => format!("\"{}\" completed", todo.title()),
                    false => format!("\"{}\" reopened", todo.title()),
                };
                self.feedback.success(&text);
                Invalidation::TODOS | Invalidation::STATISTICS
            },
        }
    }

    pub async fn create(&mut self, draft: TodoDraft) -> Invalidation {
        if let Err(err) = draft.validate() {
            self.feedback.error(&err.to_string());
            return Invalidation::empty();
        }

        match self.source.create_todo(draft).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to create the todo: {}", err));
                Invalidation::empty()
            },
            Ok(todo) => {
                self.feedback.success(&format!("\"{}\" created", todo.title()));
                Invalidation::TODOS | Invalidation::STATISTICS
            },
        }
    }

    /// Create a todo from a title only, due on `date`, with the default priority
    pub async fn quick_add(&mut self, title: &str, date: NaiveDate) -> Invalidation {
        self.create(TodoDraft::new(title.trim()).due_on(date)).await
    }

    /// Replace every field of a todo
    pub async fn update(&mut self, id: TodoId, draft: TodoDraft) -> Invalidation {
        if let Err(err) = draft.validate() {
            self.feedback.error(&err.to_string());
            return Invalidation::empty();
        }

        match self.source.update_todo(id, draft).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to update todo {}: {}", id, err));
                self.current_view()
            },
            Ok(todo) => {
                self.feedback.success(&format!("\"{}\" updated", todo.title()));
                Invalidation::TODOS | Invalidation::STATISTICS
            },
        }
    }

    pub async fn delete(&mut self, id: TodoId) -> Invalidation {
        match self.source.delete_todo(id).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to delete todo {}: {}", id, err));
                self.current_view()
            },
            Ok(()) => {
                self.feedback.success("Todo deleted");
                Invalidation::TODOS | Invalidation::STATISTICS
            },
        }
    }

    /// Create a tag from its name and any CSS color
    pub async fn create_tag(&mut self, name: &str, color: &str) -> Invalidation {
        let draft = match TagDraft::new(name, color) {
            Ok(draft) => draft,
            Err(err) => {
                self.feedback.error(&format!("Invalid color {:?}: {}", color, err));
                return Invalidation::empty();
            },
        };

        match self.source.create_tag(draft).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to create the tag: {}", err));
                Invalidation::empty()
            },
            Ok(tag) => {
                self.feedback.success(&format!("Tag \"{}\" created", tag.name()));
                Invalidation::TAGS
            },
        }
    }

    /// Delete a tag. It is detached from every todo, and is not used as a filter anymore
    pub async fn delete_tag(&mut self, id: TagId) -> Invalidation {
        match self.source.delete_tag(id).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to delete tag {}: {}", id, err));
                Invalidation::TAGS
            },
            Ok(()) => {
                if self.state.tag_filter == TagFilter::Tag(id) {
                    self.state.tag_filter = TagFilter::All;
                }
                self.feedback.success("Tag deleted");
                Invalidation::TAGS | Invalidation::TODOS
            },
        }
    }


    // Queries

    /// Fetch the completion statistics, and chart the most recent days
    pub async fn statistics(&mut self) -> Option<StatisticsChart> {
        let days = config::get(&config::STATISTICS_DAYS);
        match self.source.get_statistics(days).await {
            Err(err) => {
                self.feedback.error(&format!("Unable to load the statistics: {}", err));
                None
            },
            Ok(stats) => Some(StatisticsChart::new(&stats, config::get(&config::CHART_BARS))),
        }
    }

    /// The todos of today whose deadline is close to `now`
    pub async fn upcoming_reminders(&mut self, now: NaiveDateTime) -> Vec<Todo> {
        let todos = match self.source.get_todos_by_date(now.date()).await {
            Err(err) => {
                log::warn!("Unable to check the deadlines: {}", err);
                return Vec::new();
            },
            Ok(todos) => todos,
        };

        let lead = Duration::minutes(config::get(&config::REMINDER_LEAD_MINUTES));
        reminder::due_soon(&todos, now, lead)
            .into_iter()
            .cloned()
            .collect()
    }
}
