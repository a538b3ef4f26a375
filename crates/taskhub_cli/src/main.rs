//! Command-line front end over `taskhub_core`.
//!
//! # Responsibility
//! - Load config, start logging, open the store, and run one command.
//! - Render views as plain text; all state changes go through `Coordinator`.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use taskhub_core::view::{
    active_goals, filtered_tasks, format_due_date, goal_cards, local_today, overdue_severity,
    task_view_counts,
};
use taskhub_core::{
    ActionOutcome, CategoryDraft, Coordinator, EntityId, GoalDraft, GoalDrag, GoalKind, HubConfig,
    HubEvent, NoticeLevel, Recurrence, ReorderOutcome, SqliteRecordStore, TaskDraft, TaskFilter,
    TaskView,
};
use taskhub_core::model::category::DEFAULT_CATEGORY_COLOR;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "taskhub", version, about = "Tasks, goals, and categories from the terminal")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file; overrides `[store] path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tab counts and active goal progress.
    Summary,
    /// List tasks for a view.
    Tasks(TaskListArgs),
    /// List active goals in order.
    Goals,
    /// List categories.
    Categories,
    AddCategory {
        name: String,
        #[arg(long, default_value = DEFAULT_CATEGORY_COLOR)]
        color: String,
    },
    DeleteCategory {
        id: EntityId,
        #[arg(long)]
        yes: bool,
    },
    AddGoal {
        name: String,
        #[arg(long, value_parser = parse_goal_kind, default_value = "personal")]
        kind: GoalKind,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },
    ArchiveGoal {
        id: EntityId,
        #[arg(long)]
        yes: bool,
    },
    DeleteGoal {
        id: EntityId,
        #[arg(long)]
        yes: bool,
    },
    /// Move a goal in front of another.
    Reorder { dragged: EntityId, target: EntityId },
    AddTask(AddTaskArgs),
    /// Flip a task between done and not done.
    Toggle { id: EntityId },
    DeleteTask {
        id: EntityId,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct TaskListArgs {
    /// all | overdue | upcoming (defaults to `[view] default_view`).
    #[arg(long)]
    view: Option<TaskView>,
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long)]
    category: Option<EntityId>,
    #[arg(long)]
    goal: Option<EntityId>,
}

#[derive(Args, Debug)]
struct AddTaskArgs {
    title: String,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    due: Option<NaiveDate>,
    #[arg(long)]
    category: Option<EntityId>,
    #[arg(long)]
    goal: Option<EntityId>,
    /// daily | weekly | monthly
    #[arg(long)]
    repeat: Option<String>,
    #[arg(long, default_value_t = 1)]
    every: u32,
    /// Day of week for weekly repeats, 0 = Sunday.
    #[arg(long, default_value_t = 1)]
    day: u8,
    #[arg(long)]
    until: Option<NaiveDate>,
}

impl AddTaskArgs {
    fn draft(&self) -> CliResult<TaskDraft> {
        let mut draft = TaskDraft::new(&self.title);
        draft.notes = self.notes.clone();
        draft.due_date = self.due;
        draft.category_id = self.category;
        draft.goal_id = self.goal;
        if let Some(repeat) = &self.repeat {
            let rule = match repeat.as_str() {
                "daily" => Recurrence::daily(self.every)?,
                "weekly" => Recurrence::weekly(self.every, self.day)?,
                "monthly" => Recurrence::monthly(self.every)?,
                other => return Err(format!("unknown repeat `{other}`").into()),
            };
            draft.recurrence = Some(match self.until {
                Some(until) => rule.ending_on(until),
                None => rule,
            });
        }
        Ok(draft)
    }
}

fn parse_goal_kind(value: &str) -> Result<GoalKind, String> {
    GoalKind::parse(value).ok_or_else(|| {
        let known: Vec<&str> = GoalKind::ALL.iter().map(|kind| kind.as_str()).collect();
        format!("unknown goal kind `{value}`; expected {}", known.join("|"))
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => HubConfig::load(path)?,
        None => HubConfig::default(),
    };
    taskhub_core::init_from_config(&config.logging)?;

    let store = match cli.db.as_ref().or(config.store.path.as_ref()) {
        Some(path) => SqliteRecordStore::open(path)?,
        None => SqliteRecordStore::open_in_memory()?,
    };
    let mut hub = Coordinator::new(store);
    hub.subscribe(|event| {
        if let HubEvent::Notice(notice) = event {
            match notice.level {
                NoticeLevel::Success => println!("{}", notice.message),
                NoticeLevel::Error => eprintln!("{}", notice.message),
            }
        }
    });
    hub.load().await?;
    info!("event=cli_command module=cli status=start command={:?}", cli.command);

    let today = local_today();
    match cli.command {
        Command::Summary => {
            let counts = task_view_counts(hub.state(), today);
            println!(
                "tasks: {} open, {} overdue, {} upcoming",
                counts.all, counts.overdue, counts.upcoming
            );
            for card in goal_cards(hub.state(), today) {
                println!(
                    "{:>3}%  {}  ({}/{} tasks, {})",
                    card.progress, card.goal.name, card.counts.completed, card.counts.total,
                    card.due.text
                );
            }
        }
        Command::Tasks(args) => {
            let filter = TaskFilter {
                view: args.view.unwrap_or(config.view.default_view),
                search: args.search,
                category_id: args.category,
                goal_id: args.goal,
            };
            for task in filtered_tasks(hub.state(), &filter, today) {
                let mark = if task.is_completed { "x" } else { " " };
                let due = match task.due_date {
                    Some(due) => {
                        let text = format_due_date(due, today);
                        match overdue_severity(due, today).filter(|_| !task.is_completed) {
                            Some(severity) => format!("{text} ({severity:?} overdue)"),
                            None => text,
                        }
                    }
                    None => String::new(),
                };
                let category = task
                    .category
                    .as_ref()
                    .map(|category| format!(" [{}]", category.name))
                    .unwrap_or_default();
                println!("[{mark}] {}  {}{}  {}", task.id, task.title, category, due);
            }
        }
        Command::Goals => {
            for goal in active_goals(hub.state()) {
                println!("{:>3}. {}  {}  {}", goal.order, goal.id, goal.name, goal.kind.as_str());
            }
        }
        Command::Categories => {
            for category in hub.state().categories.all() {
                println!("{}  {}  {}", category.id, category.color_hex, category.name);
            }
        }
        Command::AddCategory { name, color } => {
            let category = hub.create_category(&CategoryDraft::new(name, color)).await?;
            println!("{}", category.id);
        }
        Command::DeleteCategory { id, yes } => {
            let outcome = hub
                .delete_category(id, |impact| confirm(yes, &impact.message()))
                .await?;
            report(outcome);
        }
        Command::AddGoal {
            name,
            kind,
            due,
            description,
        } => {
            let mut draft = GoalDraft::new(name, kind);
            draft.due_date = due;
            draft.description = description;
            let goal = hub.create_goal(&draft).await?;
            println!("{}", goal.id);
        }
        Command::ArchiveGoal { id, yes } => {
            let outcome = hub
                .archive_goal(id, |goal| {
                    confirm(yes, &format!("Mark \"{}\" as complete?", goal.name))
                })
                .await?;
            report(outcome);
        }
        Command::DeleteGoal { id, yes } => {
            let outcome = hub
                .delete_goal(id, |impact| confirm(yes, &impact.message()))
                .await?;
            report(outcome);
        }
        Command::Reorder { dragged, target } => {
            let Some(request) = GoalDrag::start(dragged).drop_on(target) else {
                println!("unchanged");
                return Ok(());
            };
            match hub.reorder_goals(request).await? {
                ReorderOutcome::Reordered { persisted } => println!("reordered ({persisted} saved)"),
                ReorderOutcome::Unchanged => println!("unchanged"),
                ReorderOutcome::NotFound => println!("not found"),
            }
        }
        Command::AddTask(args) => {
            let task = hub.create_task(&args.draft()?).await?;
            println!("{}", task.id);
        }
        Command::Toggle { id } => {
            if hub.toggle_task_completion(id).await?.is_none() {
                println!("not found");
            }
        }
        Command::DeleteTask { id, yes } => {
            let outcome = hub
                .delete_task(id, |impact| confirm(yes, &impact.message()))
                .await?;
            report(outcome);
        }
    }
    Ok(())
}

/// Destructive commands run only with `--yes`; otherwise the prompt is shown.
fn confirm(yes: bool, prompt: &str) -> bool {
    if !yes {
        println!("{prompt}\n(re-run with --yes to confirm)");
    }
    yes
}

fn report(outcome: ActionOutcome) {
    match outcome {
        ActionOutcome::Applied => {}
        ActionOutcome::Cancelled => println!("cancelled"),
        ActionOutcome::NotFound => println!("not found"),
        ActionOutcome::Unchanged => println!("unchanged"),
    }
}
