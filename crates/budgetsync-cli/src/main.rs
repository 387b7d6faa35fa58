//! budgetsync - an offline-first budgeting client for the terminal.
//!
//! Budgets, expenses and the dashboard are read from the local cache first
//! and refreshed from the server when it can be reached. Earnings are kept
//! on this device only.

mod app;
mod render;

use std::io;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use budgetsync_core::models::BudgetEdit;
use budgetsync_core::ErrorClass;

use app::App;

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "budgetsync.log";

#[derive(Debug, Parser)]
#[command(name = "budgetsync", version, about = "Offline-first personal budgeting")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Keep the password in the OS keychain
        #[arg(long)]
        remember: bool,
        /// Sign in with a Google ID token instead of a password
        #[arg(long, conflicts_with_all = ["email", "remember"])]
        google_token: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
    },
    /// Log out and forget the session
    Logout,
    /// Show balances, savings and emergency fund progress
    Dashboard,
    #[command(subcommand)]
    Budget(BudgetCommand),
    #[command(subcommand)]
    Expenses(ExpenseCommand),
    /// Local-only earnings log
    #[command(subcommand)]
    Earn(EarnCommand),
    #[command(subcommand)]
    Posts(PostCommand),
    /// Financial literacy articles
    Articles,
    /// Side-job ideas
    Jobs {
        #[arg(long)]
        search: Option<String>,
    },
    #[command(subcommand)]
    Categories(CategoryCommand),
}

#[derive(Debug, Subcommand)]
enum BudgetCommand {
    /// Show the current budget
    Show,
    /// First-time budget setup
    Setup(BudgetSetupArgs),
    /// Change income or goals; frequency and categories are kept
    Edit {
        #[arg(long)]
        income: Option<f64>,
        #[arg(long)]
        savings_rate: Option<f64>,
        #[arg(long)]
        emergency_goal: Option<f64>,
        #[arg(long)]
        annual_goal: Option<f64>,
    },
}

#[derive(Debug, Args)]
struct BudgetSetupArgs {
    #[arg(long)]
    income: Option<f64>,
    /// weekly, bi-weekly or monthly
    #[arg(long)]
    frequency: Option<String>,
    /// Spending category to budget for, repeatable
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long, default_value_t = 0.0)]
    savings_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    emergency_goal: f64,
    #[arg(long, default_value_t = 0.0)]
    annual_goal: f64,
}

#[derive(Debug, Subcommand)]
enum ExpenseCommand {
    List,
    Add {
        amount: String,
        category: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum EarnCommand {
    Add {
        amount: String,
        #[arg(long)]
        source: Option<String>,
    },
    Summary,
}

#[derive(Debug, Subcommand)]
enum PostCommand {
    List {
        /// Category slug, or "all"
        #[arg(long, default_value = "all")]
        category: String,
    },
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "General")]
        category: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Delete {
        id: String,
    },
    Like {
        id: String,
    },
    Comment {
        id: String,
        text: String,
    },
    EditComment {
        id: String,
        comment_id: String,
        text: String,
    },
    DeleteComment {
        id: String,
        comment_id: String,
    },
}

#[derive(Debug, Subcommand)]
enum CategoryCommand {
    List,
    /// Admin only
    Add { name: String },
}

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug). Everything is
/// also written to a daily log file next to the cache when one is available.
fn init_tracing(log_dir: Option<std::path::PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let cache_root = app::cache_root();
    let log_guard = init_tracing(app::log_dir(&cache_root));
    info!("budgetsync starting");

    let mut app = App::new(cache_root)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted, cancelling pending requests");
            ctrl_c.cancel();
        }
    });

    if let Err(e) = run(&mut app, cli.command, &cancel).await {
        let class = ErrorClass::of(&e);
        eprintln!("Error ({}): {:#}", class, e);
        if class == ErrorClass::Auth {
            eprintln!("Run `budgetsync login` to sign in again.");
        } else if class.is_recoverable_by_cache() {
            eprintln!("Saved budgets and expenses can still be viewed offline.");
        }
        drop(log_guard);
        std::process::exit(1);
    }
    info!("budgetsync finished");
    Ok(())
}

fn expired_session_hint(app: &App) {
    if app.is_offline_session() {
        println!();
        println!("Your session has expired. Run `budgetsync login` to refresh this data.");
    }
}

async fn run(app: &mut App, command: Command, cancel: &CancellationToken) -> Result<()> {
    match command {
        Command::Login {
            email,
            remember,
            google_token,
        } => {
            let user = match google_token {
                Some(token) => app.login_google(&token).await?,
                None => app.login(email, remember).await?,
            };
            println!("Welcome back, {}!", user.display_name());
        }
        Command::Signup { email, username } => {
            let user = app.signup(&email, &username).await?;
            println!("Account created. Welcome, {}!", user.display_name());
        }
        Command::Logout => {
            app.logout().await?;
            println!("Logged out.");
        }
        Command::Dashboard => {
            let snapshot = app.dashboard(cancel).await?;
            render::dashboard(&snapshot);
            expired_session_hint(app);
        }
        Command::Budget(cmd) => match cmd {
            BudgetCommand::Show => {
                let budget = app.budget(cancel).await?;
                render::budget(&budget);
                expired_session_hint(app);
            }
            BudgetCommand::Setup(args) => {
                let outcome = app
                    .setup_budget(app::BudgetSetup {
                        income: args.income,
                        frequency: args.frequency,
                        categories: args.categories,
                        savings_rate: args.savings_rate,
                        emergency_goal: args.emergency_goal,
                        annual_goal: args.annual_goal,
                    })
                    .await?;
                render::push_outcome("Budget saved", &outcome);
            }
            BudgetCommand::Edit {
                income,
                savings_rate,
                emergency_goal,
                annual_goal,
            } => {
                let edit = BudgetEdit {
                    monthly_income: income,
                    target_savings_rate: savings_rate,
                    emergency_fund_goal: emergency_goal,
                    annual_savings_goal: annual_goal,
                };
                let outcome = app.edit_budget(edit).await?;
                render::push_outcome("Budget updated", &outcome);
            }
        },
        Command::Expenses(cmd) => match cmd {
            ExpenseCommand::List => {
                let expenses = app.expenses(cancel).await?;
                render::expenses(&expenses);
                expired_session_hint(app);
            }
            ExpenseCommand::Add {
                amount,
                category,
                description,
            } => {
                let expense = app.add_expense(&amount, &category, description).await?;
                render::expense_added(&expense);
            }
            ExpenseCommand::Delete { id } => {
                app.delete_expense(&id).await?;
                println!("Expense deleted.");
            }
        },
        Command::Earn(cmd) => match cmd {
            EarnCommand::Add { amount, source } => {
                let entry = app.add_earning(&amount, source.as_deref()).await?;
                render::earning_added(&entry);
            }
            EarnCommand::Summary => {
                let summary = app.earnings_summary()?;
                render::earnings(&summary);
            }
        },
        Command::Posts(cmd) => run_posts(app, cmd).await?,
        Command::Articles => {
            let articles = app.articles().await?;
            render::articles(&articles);
        }
        Command::Jobs { search } => {
            let jobs = app.jobs(search.as_deref().unwrap_or("")).await?;
            render::jobs(&jobs);
        }
        Command::Categories(cmd) => match cmd {
            CategoryCommand::List => {
                let categories = app.categories().await?;
                render::categories(&categories);
            }
            CategoryCommand::Add { name } => {
                let category = app.add_category(&name).await?;
                println!("Category \"{}\" created.", category.name);
            }
        },
    }
    Ok(())
}

async fn run_posts(app: &App, cmd: PostCommand) -> Result<()> {
    let viewer = app.session()?.user.clone();
    match cmd {
        PostCommand::List { category } => {
            let posts = app.posts(&category).await?;
            render::posts(&posts, &viewer);
        }
        PostCommand::New {
            title,
            content,
            category,
        } => {
            let post = app.new_post(&title, &content, &category).await?;
            render::post(&post, &viewer);
        }
        PostCommand::Edit {
            id,
            title,
            content,
            category,
        } => {
            let post = app.edit_post(&id, title, content, category).await?;
            render::post(&post, &viewer);
        }
        PostCommand::Delete { id } => {
            app.delete_post(&id).await?;
            println!("Post deleted.");
        }
        PostCommand::Like { id } => {
            let post = app.toggle_like(&id).await?;
            let verb = if post.is_liked_by(&viewer.id) { "Liked" } else { "Unliked" };
            println!("{} \"{}\" ({} likes).", verb, post.title, post.like_count());
        }
        PostCommand::Comment { id, text } => {
            let post = app.comment(&id, &text).await?;
            render::post(&post, &viewer);
        }
        PostCommand::EditComment { id, comment_id, text } => {
            let post = app.edit_comment(&id, &comment_id, &text).await?;
            render::post(&post, &viewer);
        }
        PostCommand::DeleteComment { id, comment_id } => {
            let post = app.delete_comment(&id, &comment_id).await?;
            render::post(&post, &viewer);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_expense_add() {
        let cli = Cli::try_parse_from(["budgetsync", "expenses", "add", "250.50", "food", "--description", "Lunch"])
            .expect("parse");
        match cli.command {
            Command::Expenses(ExpenseCommand::Add {
                amount,
                category,
                description,
            }) => {
                assert_eq!(amount, "250.50");
                assert_eq!(category, "food");
                assert_eq!(description.as_deref(), Some("Lunch"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_budget_setup_categories() {
        let cli = Cli::try_parse_from([
            "budgetsync",
            "budget",
            "setup",
            "--income",
            "20000",
            "--frequency",
            "monthly",
            "--category",
            "Food",
            "--category",
            "Housing",
        ])
        .expect("parse");
        match cli.command {
            Command::Budget(BudgetCommand::Setup(args)) => {
                assert_eq!(args.income, Some(20000.0));
                assert_eq!(args.categories, vec!["Food", "Housing"]);
                assert_eq!(args.savings_rate, 0.0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
