use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};

use todo_agenda::cache::Cache;
use todo_agenda::calendar::{parse_local_date, ViewMode};
use todo_agenda::calendar::grid::ListFilter;
use todo_agenda::client::Client;
use todo_agenda::config;
use todo_agenda::provider::{Container, RenderedView, ViewState};
use todo_agenda::provider::feedback::{feedback_channel, FeedbackEvent, FeedbackReceiver};
use todo_agenda::tag::{TagFilter, TagId};
use todo_agenda::todo::{parse_local_time, Priority, TodoDraft, TodoId};
use todo_agenda::traits::{TagSource, TodoSource};
use todo_agenda::utils;
use todo_agenda::Provider;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The base URL of the API, e.g. http://localhost:8080/api
    #[arg(long, env = config::URL_ENV_VAR)]
    url: Option<String>,
    /// The bearer token to authenticate with
    #[arg(long, env = config::TOKEN_ENV_VAR, hide_env_values = true)]
    token: Option<String>,
    /// Work on a local JSON file instead of a server
    #[arg(long, value_name = "FILE")]
    offline: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display a day, a week, a month or a list of todos
    Show {
        /// day, week, month or list
        #[arg(long, default_value = "month")]
        view: ViewMode,
        /// Any date of the period to show (defaults to today)
        #[arg(long, value_parser = parse_local_date)]
        date: Option<NaiveDate>,
        /// Only show the todos that have this tag
        #[arg(long, default_value = "all")]
        tag: TagFilter,
        /// Which todos the list view shows: all, overdue, today, upcoming or no-date
        #[arg(long, default_value = "all")]
        filter: ListFilter,
        /// In the month view, also list the todos of this day
        #[arg(long, value_parser = parse_local_date)]
        select: Option<NaiveDate>,
    },
    /// Create a todo
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_local_date)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_local_time)]
        time: Option<NaiveTime>,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Identifiers of the tags to attach
        #[arg(long = "tag")]
        tags: Vec<TagId>,
        /// Make this todo a sub-task of another one
        #[arg(long)]
        parent: Option<TodoId>,
    },
    /// Complete a todo, or reopen it
    Toggle { id: TodoId },
    /// Give a todo another due date
    Move {
        id: TodoId,
        #[arg(value_parser = parse_local_date)]
        date: NaiveDate,
    },
    /// Drop a todo onto another one
    Reorder {
        dragged: TodoId,
        target: TodoId,
        /// The day both todos are due (the list of every todo is used otherwise)
        #[arg(long, value_parser = parse_local_date)]
        date: Option<NaiveDate>,
    },
    Delete { id: TodoId },
    /// List the tags
    Tags,
    /// Create a tag
    TagAdd {
        name: String,
        /// Any CSS color
        #[arg(default_value = "#3498db")]
        color: String,
    },
    TagRm { id: TagId },
    /// Chart the todos completed recently
    Stats,
    /// List the todos whose deadline is close
    Reminders,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let (sender, receiver) = feedback_channel();

    match cli.offline {
        Some(path) => {
            let cache = match path.exists() {
                true => Cache::from_file(&path)?,
                false => Cache::new(),
            };
            let mut provider = Provider::new_with_feedback_channel(cache, sender);
            let result = run(&mut provider, cli.command, &receiver).await;
            provider.source().save_to_file(&path)?;
            result
        },
        None => {
            let url = cli.url.ok_or("No server URL. Use --url, or set the TODO_AGENDA_URL environment variable")?;
            let client = Client::new(url, cli.token)?;
            let mut provider = Provider::new_with_feedback_channel(client, sender);
            run(&mut provider, cli.command, &receiver).await
        },
    }
}

async fn run<S>(provider: &mut Provider<S>, command: Commands, receiver: &FeedbackReceiver) -> Result<(), Box<dyn Error>>
where
    S: TodoSource + TagSource,
{
    let today = provider.today();

    match command {
        Commands::Show { view, date, tag, filter, select } => {
            let state = ViewState {
                reference_date: date.unwrap_or(today),
                view_mode: view,
                tag_filter: tag,
                list_filter: filter,
                selected_date: select,
            };
            if provider.show(state).await {
                println!("{}", provider.period_title());
                if let Some(displayed) = provider.displayed() {
                    print!("{}", utils::format_view(displayed, today));
                }
                if let Some(day) = provider.selected_day() {
                    println!("\n{}", day.date.format("%A %d/%m"));
                    print!("{}", utils::format_day(day, today));
                }
            }
        },
        Commands::Add { title, description, date, time, priority, tags, parent } => {
            let mut draft = TodoDraft::new(title).with_priority(priority).with_tags(tags);
            draft.description = description;
            draft.due_date = date;
            draft.due_time = time;
            draft.parent_id = parent;
            provider.create(draft).await;
        },
        Commands::Toggle { id } => {
            provider.toggle(id).await;
        },
        Commands::Move { id, date } => {
            provider.move_to_date(id, date).await;
        },
        Commands::Reorder { dragged, target, date } => {
            let (state, container) = match date {
                Some(date) => (ViewState { view_mode: ViewMode::Day, ..ViewState::new(date) }, Container::Day(date)),
                None => (ViewState { view_mode: ViewMode::List, ..ViewState::new(today) }, Container::List),
            };
            if provider.show(state).await {
                let invalidation = provider.reorder(container, dragged, target).await;
                if invalidation.is_empty() {
                    let todos = match provider.displayed() {
                        Some(RenderedView::Day(day)) => &day.todos,
                        Some(RenderedView::List(list)) => &list.todos,
                        _ => return Ok(()),
                    };
                    let order: Vec<String> = todos.iter().map(|todo| todo.id().to_string()).collect();
                    println!("New order: {}", order.join(", "));
                }
            }
        },
        Commands::Delete { id } => {
            provider.delete(id).await;
        },
        Commands::Tags => {
            if provider.load_tags().await {
                print!("{}", utils::format_tags(provider.tags()));
            }
        },
        Commands::TagAdd { name, color } => {
            provider.create_tag(&name, &color).await;
        },
        Commands::TagRm { id } => {
            provider.delete_tag(id).await;
        },
        Commands::Stats => {
            if let Some(chart) = provider.statistics().await {
                print!("{}", utils::format_chart(&chart));
            }
        },
        Commands::Reminders => {
            let now = Local::now().naive_local();
            for todo in provider.upcoming_reminders(now).await {
                let due = todo.due_time().map(|time| time.format("%H:%M").to_string()).unwrap_or_default();
                println!("{}\t#{} {}", due, todo.id(), todo.title());
            }
        },
    }

    if let FeedbackEvent::Success(text) = &*receiver.borrow() {
        println!("{}", text);
    }

    match provider.n_errors() {
        0 => Ok(()),
        n => Err(format!("{} error(s) occurred, see the logs for details", n).into()),
    }
}
