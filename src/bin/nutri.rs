//! nutri: nutriscope CLI client
//!
//! Runs the prediction wizards against a nutrition service from the terminal.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use nutriscope::render::{GlucoseReport, GutHealthReport, MealReport};
use nutriscope::{
    AppContext, Config, MealCategory, MealRecord, NotificationQueue, NutriscopeError,
    NutritionGoal, RecommendationRequest, Severity, SlotKey,
};

/// Nutriscope CLI client
#[derive(Parser)]
#[command(name = "nutri")]
#[command(version)]
#[command(about = "Meal analysis, glucose prediction and gut-health client")]
struct Args {
    /// Config file (default: ~/.nutriscope/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prediction service base URL
    #[arg(long, env = "NUTRISCOPE_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a meal photo
    Meal {
        /// Meal image (JPEG or PNG)
        image: PathBuf,
        /// What the meal is, in your own words
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Predict the glucose response to a meal
    Glucose {
        /// Clinical biomarkers CSV
        #[arg(long)]
        bio: PathBuf,
        /// Microbiome CSV
        #[arg(long)]
        micro: PathBuf,
        /// Meal image
        #[arg(long)]
        image: PathBuf,
        #[arg(long, value_enum, default_value_t = MealCategory::Lunch)]
        category: MealCategory,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Classify gut health from microbiome data
    Gut {
        /// Microbiome CSV
        file: PathBuf,
    },

    /// Get meal suggestions
    Recommend {
        /// Meal caption to base suggestions on
        caption: String,
        #[arg(long, value_enum, default_value_t = MealCategory::Lunch)]
        meal_type: MealCategory,
        #[arg(long, value_enum, default_value_t = NutritionGoal::Maintaining)]
        goal: NutritionGoal,
    },

    /// Save a meal record (JSON file) to history
    Save {
        record: PathBuf,
    },

    /// Sign in
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Bearer token to send with requests
        #[arg(long)]
        token: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = args.api_url {
        config.api.base_url = url;
    }
    let context = AppContext::init(config)?;

    let outcome = run(&context, args.command).await;
    print_notifications(context.alerts());
    if let Err(e) = &outcome
        && matches!(e.downcast_ref::<NutriscopeError>(), Some(NutriscopeError::SessionExpired))
    {
        eprintln!("run `nutri login` to sign in again");
    }
    outcome
}

async fn run(context: &AppContext, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Meal { image, description } => {
            let wizard = context.meal_wizard()?;
            wizard.select_path(SlotKey::MealImage, &image)?;
            wizard.set_description(description);
            let analysis = wizard.submit().await?;
            println!("{}", MealReport(&analysis));
        }

        Command::Glucose {
            bio,
            micro,
            image,
            category,
            description,
        } => {
            let wizard = context.glucose_wizard()?;
            wizard.select_path(SlotKey::Biomarkers, &bio)?;
            wizard.select_path(SlotKey::Microbiome, &micro)?;
            wizard.advance();
            wizard.select_path(SlotKey::MealImage, &image)?;
            wizard.set_meal_category(category);
            wizard.set_description(description);
            let prediction = wizard.submit().await?;
            println!("{}", GlucoseReport(&prediction));
        }

        Command::Gut { file } => {
            let wizard = context.gut_health_wizard()?;
            wizard.select_path(SlotKey::Microbiome, &file)?;
            let assessment = wizard.submit().await?;
            println!("{}", GutHealthReport(&assessment));
        }

        Command::Recommend {
            caption,
            meal_type,
            goal,
        } => {
            let request = RecommendationRequest::new(caption, meal_type, goal);
            let suggestions = context.recommend_meal(request).await?;
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }

        Command::Save { record } => {
            let content = std::fs::read_to_string(&record)?;
            let record: MealRecord = serde_json::from_str(&content)?;
            let saved = context.save_meal(&record).await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }

        Command::Login { email, token } => {
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new().with_prompt("Email").interact_text()?,
            };
            let password = Password::new().with_prompt("Password").interact()?;
            let user = context.session().login(&email, &password)?;
            if let Some(token) = token {
                context.session().attach_token(token)?;
            }
            println!("signed in as {} <{}>", user.name, user.email);
        }

        Command::Register { name, email } => {
            let password = Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?;
            let user = context.session().register(&name, &email, &password)?;
            println!("registered {} <{}>", user.name, user.email);
        }

        Command::Logout => {
            context.teardown()?;
            println!("signed out");
        }

        Command::Whoami => match context.session().current() {
            Some(user) => {
                println!("name:  {}", user.name);
                println!("email: {}", user.email);
                println!("token: {}", if user.token.is_some() { "set" } else { "none" });
            }
            None => println!("not signed in"),
        },
    }

    Ok(())
}

/// Print queued notifications to stderr so stdout carries only results.
fn print_notifications(alerts: &NotificationQueue) {
    for notification in alerts.drain() {
        let tag = match notification.severity {
            Severity::Success => "ok",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {}", notification.message);
    }
}
