//! EatMate CLI - find recipes, inspect nutrition and chat with a cooking assistant.

use clap::{Parser, Subcommand};
use eatmate::completion::{CompletionClient, Role};
use eatmate::config::{Config, LogVerbosity};
use eatmate::conversation::ConversationLog;
use eatmate::detail::{DetailState, DetailTab, RecipeDetailView, TabView};
use eatmate::models::RecipeId;
use eatmate::query::{Cuisine, Diet};
use eatmate::recipe_api::RecipeApi;
use eatmate::search::{SearchSession, SearchState};
use eatmate::substitutes::{LookupView, SubstituteLookup, EXAMPLE_INGREDIENTS, NO_SUBSTITUTES_MESSAGE};
use eatmate::theme::{Appearance, FileStore, ThemeManager, ThemeMode};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "eatmate")]
#[command(about = "Find recipes, check nutrition and ask a cooking assistant")]
#[command(version)]
struct Cli {
    /// Log verbosity level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find recipes that use the given ingredients
    Ingredients {
        /// Ingredient names; commas also separate entries
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Find recipes within macro-nutrient bounds
    Nutrients {
        #[arg(long)]
        min_calories: Option<f64>,
        #[arg(long)]
        max_calories: Option<f64>,
        #[arg(long)]
        min_protein: Option<f64>,
        #[arg(long)]
        max_protein: Option<f64>,
        #[arg(long)]
        min_carbs: Option<f64>,
        #[arg(long)]
        max_carbs: Option<f64>,
        #[arg(long)]
        min_fat: Option<f64>,
        #[arg(long)]
        max_fat: Option<f64>,
    },

    /// Search recipes by text, cuisine and diet
    Search {
        #[arg(short, long, default_value = "")]
        query: String,

        #[arg(long, default_value = "any")]
        cuisine: Cuisine,

        #[arg(long, default_value = "any")]
        diet: Diet,
    },

    /// Show one recipe
    Recipe {
        id: String,

        #[arg(short, long, default_value = "instructions")]
        tab: DetailTab,
    },

    /// Find substitutes for an ingredient
    Substitute {
        /// Ingredient name; lists examples when omitted
        name: Option<String>,
    },

    /// Chat with the cooking assistant
    Chat,

    /// Show or change the display theme
    Theme {
        mode: Option<ThemeMode>,

        /// Appearance reported by the device
        #[arg(long, default_value = "light")]
        device: Appearance,
    },

    /// Show current configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum LogLevel {
    Minimal,
    Compact,
    Verbose,
}

impl From<LogLevel> for LogVerbosity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Minimal => LogVerbosity::Minimal,
            LogLevel::Compact => LogVerbosity::Compact,
            LogLevel::Verbose => LogVerbosity::Verbose,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config_path = cli.config.clone();
    let config = match cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let mut config = config.with_env_overrides();
    if let Some(level) = cli.log_level {
        config.app.log_verbosity = level.into();
    }
    let verbosity = config.app.log_verbosity;
    let recipes = Arc::new(RecipeApi::from_config(&config.recipes, verbosity));

    match cli.command {
        Commands::Ingredients { names } => {
            let mut session = SearchSession::ingredients(recipes);
            let criteria = session.criteria_mut();
            criteria.number = config.recipes.results_per_search;
            criteria.ranking = config.recipes.ranking;
            for name in &names {
                criteria.add(name);
            }
            session.submit().await;
            print_results(&session);
        }
        Commands::Nutrients {
            min_calories,
            max_calories,
            min_protein,
            max_protein,
            min_carbs,
            max_carbs,
            min_fat,
            max_fat,
        } => {
            let mut session = SearchSession::nutrients(recipes);
            let criteria = session.criteria_mut();
            criteria.number = config.recipes.results_per_search;
            let overrides = [
                (&mut criteria.min_calories, min_calories),
                (&mut criteria.max_calories, max_calories),
                (&mut criteria.min_protein, min_protein),
                (&mut criteria.max_protein, max_protein),
                (&mut criteria.min_carbs, min_carbs),
                (&mut criteria.max_carbs, max_carbs),
                (&mut criteria.min_fat, min_fat),
                (&mut criteria.max_fat, max_fat),
            ];
            for (field, value) in overrides {
                if let Some(value) = value {
                    *field = value;
                }
            }
            session.submit().await;
            print_results(&session);
        }
        Commands::Search { query, cuisine, diet } => {
            let mut session = SearchSession::parameters(recipes);
            let criteria = session.criteria_mut();
            criteria.query = query;
            criteria.cuisine = cuisine;
            criteria.diet = diet;

            if !session.can_submit() {
                anyhow::bail!("Enter a search term or pick a cuisine or diet");
            }
            session.submit().await;
            print_results(&session);
        }
        Commands::Recipe { id, tab } => {
            let mut view = RecipeDetailView::new(recipes, RecipeId::from(id.as_str()));
            view.select_tab(tab);
            view.load().await;
            print_detail(&view);
        }
        Commands::Substitute { name } => match name {
            Some(name) => {
                let mut lookup = SubstituteLookup::new(recipes);
                if !lookup.lookup(&name).await {
                    anyhow::bail!("Enter an ingredient name");
                }
                print_substitutes(&lookup);
            }
            None => {
                println!("Try one of:");
                for example in EXAMPLE_INGREDIENTS {
                    println!("  {}", example);
                }
            }
        },
        Commands::Chat => {
            let client = Arc::new(CompletionClient::from_config(&config.assistant, verbosity));
            run_chat(client).await?;
        }
        Commands::Theme { mode, device } => {
            let store = Arc::new(FileStore::new(config.storage.preferences.clone()));
            let (_device_tx, device_rx) = watch::channel(device);
            let mut manager = ThemeManager::load(store, device_rx);
            if let Some(mode) = mode {
                manager.set_mode(mode);
            }

            let theme = manager.active_theme();
            println!("Mode:       {}", manager.mode());
            println!("Active:     {}", if theme.dark { "dark" } else { "light" });
            println!("Background: {}", theme.colors.background);
            println!("Text:       {}", theme.colors.text);
            println!("Primary:    {}", theme.colors.primary);
        }
        Commands::Config { path } => show_config(path, config_path, &config)?,
    }

    Ok(())
}

fn print_results<C>(session: &SearchSession<C>) {
    match session.state() {
        SearchState::Results => {
            if let Some(total) = session.total_results() {
                println!("{} recipes found, showing {}", total, session.results().len());
            }
            for recipe in session.results() {
                let mut line = format!("{:>8}  {}", recipe.id, recipe.title);
                if let Some(minutes) = recipe.ready_in_minutes {
                    line.push_str(&format!("  ({} min)", minutes));
                }
                if let (Some(used), Some(missed)) = (recipe.used_ingredient_count, recipe.missed_ingredient_count) {
                    line.push_str(&format!("  [{} used, {} missing]", used, missed));
                }
                println!("{}", line);
            }
        }
        SearchState::NoResults => println!("No recipes found. Try different criteria."),
        SearchState::Failed => println!("{}", session.error_message().unwrap_or_default()),
        SearchState::Idle | SearchState::Searching => {}
    }
}

fn print_detail(view: &RecipeDetailView) {
    let detail = match view.state() {
        DetailState::Loaded(detail) => detail,
        DetailState::Failed => {
            println!("Failed to load recipe details. Please try again.");
            return;
        }
        DetailState::Loading => return,
    };

    println!("{}", detail.title);
    println!("{}", detail.image_or_placeholder());
    if let Some(minutes) = detail.ready_in_minutes {
        print!("Ready in {} min", minutes);
        if let Some(servings) = detail.servings {
            print!(" · Serves {}", servings);
        }
        println!();
    }
    if let Some(summary) = &detail.summary {
        println!("{}", summary);
    }
    println!("\n[{}]", view.active_tab());

    match view.current_view() {
        Some(TabView::Instructions(steps)) => {
            for step in steps {
                println!("{:>3}. {}", step.number, step.text);
            }
        }
        Some(TabView::Ingredients(items)) => {
            for item in items {
                println!("  • {}", item);
            }
        }
        Some(TabView::Nutrition { breakdown, nutrients }) => {
            let (protein, fat, carbs) = breakdown.rounded();
            println!("Protein {}% · Fat {}% · Carbs {}%", protein, fat, carbs);
            for nutrient in nutrients {
                match nutrient.daily_value_label() {
                    Some(dv) => println!("  {}: {} {} ({})", nutrient.name, nutrient.amount, nutrient.unit, dv),
                    None => println!("  {}: {} {}", nutrient.name, nutrient.amount, nutrient.unit),
                }
            }
        }
        Some(TabView::NoData(tab)) => println!("{}", tab.empty_message()),
        None => {}
    }
}

fn print_substitutes(lookup: &SubstituteLookup) {
    match lookup.view() {
        Some(LookupView::Substitutes { ingredient, substitutes }) => {
            println!("Substitutes for {}:", ingredient);
            for substitute in substitutes {
                println!("  • {}", substitute);
            }
        }
        Some(LookupView::NoSubstitutes) => println!("{}", NO_SUBSTITUTES_MESSAGE),
        Some(LookupView::Error(message)) => println!("{}", message),
        None => {}
    }
}

async fn run_chat(client: Arc<CompletionClient>) -> anyhow::Result<()> {
    let mut log = ConversationLog::new(client);

    if let Some(greeting) = log.messages().first() {
        println!("{}\n", greeting.content);
    }
    println!("Try asking:");
    for suggestion in log.suggestions() {
        println!("  - {}", suggestion);
    }
    println!("\nType 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        let before = log.scroll_anchor().map(str::to_string);
        if !log.send(text).await {
            continue;
        }
        if log.scroll_anchor().map(str::to_string) != before {
            if let Some(reply) = log.messages().last().filter(|m| m.role == Role::Assistant) {
                println!("\n{}\n", reply.content);
            }
        }
    }

    log.teardown();
    Ok(())
}

fn show_config(show_path: bool, config_path: Option<PathBuf>, config: &Config) -> anyhow::Result<()> {
    if show_path {
        println!("{}", config_path.unwrap_or_else(Config::default_path).display());
        return Ok(());
    }

    println!("{}", toml::to_string_pretty(&config.redacted())?);
    Ok(())
}
