mod logging;

use std::fmt;

use learnaid_core::model::{CourseId, LoginForm, Step, StepKind};
use rand::rng;
use services::{
    ApiConfig, AppServices, AuthSession, Clock, CourseCatalog, CourseStepStore, ProgressBoard,
    ScenarioQuizStore,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidQuizSize { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidQuizSize { raw } => write!(f, "invalid --size value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [--db <sqlite_url>] [--api <url>] [-v] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  courses                         list the course catalog");
    eprintln!("  course <course_id>              walk through a course");
    eprintln!("  quiz [--size <n>]               run an emergency scenario quiz");
    eprintln!("  progress <course_id>            show progress, notes and a quote");
    eprintln!("  login --email <e> --password <p>");
    eprintln!("  logout");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://learnaid.sqlite3");
    eprintln!("  --size {}", services::DEFAULT_QUIZ_SIZE);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARNAID_DB_URL, LEARNAID_API_URL, LEARNAID_API_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Courses,
    Course { course_id: CourseId },
    Quiz { size: usize },
    Progress { course_id: CourseId },
    Login { email: String, password: String },
    Logout,
}

struct Args {
    db_url: String,
    api_url: Option<String>,
    verbose: bool,
    command: Command,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = std::env::var("LEARNAID_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://learnaid.sqlite3".into(), normalize_sqlite_url);
        let mut api_url = None;
        let mut verbose = false;
        let mut size = services::DEFAULT_QUIZ_SIZE;
        let mut email = None;
        let mut password = None;
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => api_url = Some(require_value(&mut args, "--api")?),
                "--size" => {
                    let value = require_value(&mut args, "--size")?;
                    size = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidQuizSize { raw: value })?;
                }
                "--email" => email = Some(require_value(&mut args, "--email")?),
                "--password" => password = Some(require_value(&mut args, "--password")?),
                "-v" | "--verbose" => verbose = true,
                "--help" | "-h" => return Ok(None),
                _ if arg.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let Some(name) = positional.next() else {
            return Ok(None);
        };
        let course_arg = |command: &'static str, value: Option<String>| {
            value.map(CourseId::new).ok_or(ArgsError::MissingArgument {
                command,
                name: "course_id",
            })
        };
        let command = match name.as_str() {
            "courses" => Command::Courses,
            "course" => Command::Course {
                course_id: course_arg("course", positional.next())?,
            },
            "quiz" => Command::Quiz { size },
            "progress" => Command::Progress {
                course_id: course_arg("progress", positional.next())?,
            },
            "login" => Command::Login {
                email: email.ok_or(ArgsError::MissingValue { flag: "--email" })?,
                password: password.ok_or(ArgsError::MissingValue { flag: "--password" })?,
            },
            "logout" => Command::Logout,
            _ => return Err(ArgsError::UnknownCommand(name)),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self {
            db_url,
            api_url,
            verbose,
            command,
        }))
    }

    fn api_config(&self) -> Result<ApiConfig, services::ApiError> {
        let config = ApiConfig::from_env()?;
        match &self.api_url {
            Some(url) => ApiConfig::new(url, config.timeout),
            None => Ok(config),
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

//
// ─── SCREENS ───────────────────────────────────────────────────────────────────
//

type Input = Lines<BufReader<Stdin>>;

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>, std::io::Error> {
    println!("{label}");
    Ok(input.next_line().await?.map(|line| line.trim().to_owned()))
}

/// Reads a 1-based option number. `None` when stdin closes.
async fn choose(input: &mut Input, options: &[String]) -> Result<Option<String>, std::io::Error> {
    for (i, option) in options.iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
    loop {
        let Some(line) = prompt(input, "> ").await? else {
            return Ok(None);
        };
        match line.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(options[n - 1].clone())),
            _ => println!("Pick a number between 1 and {}.", options.len()),
        }
    }
}

fn print_step(step: &Step, index: usize, total: usize) {
    println!();
    println!("[{}/{}] {}", index + 1, total, step.title);
    if !step.body.is_empty() {
        println!("{}", step.body);
    }
}

async fn require_session(services: &AppServices) -> Result<AuthSession, Box<dyn std::error::Error>> {
    services
        .auth()
        .restore_session()
        .await?
        .ok_or_else(|| "not signed in; run `app login` first".into())
}

async fn list_courses(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = CourseCatalog::new();
    services.catalog().refresh(&mut catalog).await?;
    if catalog.courses().is_empty() {
        println!("No courses available.");
    }
    for course in catalog.courses() {
        println!("{:<20} {}", course.id.as_str(), course.title);
        if !course.description.is_empty() {
            println!("{:<20} {}", "", course.description);
        }
    }
    Ok(())
}

async fn walk_course(
    services: &AppServices,
    course_id: &CourseId,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = require_session(services).await?;
    let steps = services.course_steps(session.user.id.clone());
    let mut store = CourseStepStore::new();
    steps.load(&mut store, course_id).await?;

    loop {
        let Some(step) = store.current_step().cloned() else {
            break;
        };
        print_step(&step, store.current_index(), store.steps().len());

        match step.kind {
            StepKind::MultipleChoice => {
                if let Some(previous) = store.answer_for(&step.id) {
                    println!("You answered: {previous}");
                } else {
                    let Some(choice) = choose(input, &step.options).await? else {
                        break;
                    };
                    store.submit_answer(&step.id, choice.as_str())?;
                    if step.is_correct(&choice) == Some(true) {
                        println!("Correct!");
                    } else {
                        println!("Not quite.");
                    }
                    if let Some(explanation) = &step.explanation {
                        println!("{explanation}");
                    }
                }
            }
            StepKind::Finish => {
                println!("Course complete.");
                break;
            }
            StepKind::Info => {}
        }

        let Some(line) = prompt(input, "[enter] next, [b] back, [q] quit").await? else {
            break;
        };
        match line.as_str() {
            "q" => break,
            "b" => {
                store.retreat();
            }
            _ => {
                store.advance();
                // Failures are logged by the service; navigation continues regardless.
                let _ = steps.persist_progress(&store).await;
            }
        }
    }

    store.reset();
    Ok(())
}

async fn run_quiz(
    services: &AppServices,
    size: usize,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = require_session(services).await?;
    let quiz = services
        .scenario_quiz(session.user.id.clone())
        .with_quiz_size(size);
    let mut store = ScenarioQuizStore::new();
    quiz.load_bundled(&mut store)?;
    let drawn = quiz.start_quiz(&mut store, &mut rng())?;

    while !store.is_completed() {
        let Some(scenario) = store.current().cloned() else {
            break;
        };
        println!();
        println!("[{}/{}] {}", store.current_index() + 1, drawn, scenario.prompt);
        let Some(choice) = choose(input, &scenario.options).await? else {
            break;
        };
        let outcome = quiz
            .submit_and_advance(&mut store, &scenario.id, &choice)
            .await?;
        if outcome.is_correct {
            println!("Correct!");
        } else {
            println!("The best answer: {}", scenario.correct_option);
        }
        println!("{}", scenario.explanation);
    }

    println!();
    println!("Score: {}/{}", store.score(), drawn);
    store.exit_quiz();
    Ok(())
}

async fn show_progress(
    services: &AppServices,
    course_id: &CourseId,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = require_session(services).await?;
    let progress = services.progress(session.user.id.clone());
    let mut board = ProgressBoard::new();

    if let Err(err) = progress.refresh(&mut board, course_id).await {
        tracing::debug!(error = %err, "showing empty progress");
        println!("Could not load progress: {err}");
    }
    println!("\"{}\"", progress.motivational_quote(&mut board, &mut rng()));

    let Some(snapshot) = board.snapshot(course_id) else {
        return Ok(());
    };
    println!();
    println!("{}: {}% complete", course_id, snapshot.percent_complete.value());
    for module in &snapshot.modules {
        let mark = if module.completed { "x" } else { " " };
        println!("  [{mark}] {}", module.title);
        if let (Some(reflection), Some(confidence)) = (&module.reflection, module.confidence) {
            println!("      {reflection} (confidence {}/5)", confidence.value());
        }
    }
    if !snapshot.notes.is_empty() {
        println!();
        println!("Notes:");
        for (i, (_, text)) in snapshot.notes.iter().enumerate() {
            println!("  {}. {text}", i + 1);
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    logging::init_logging(parsed.verbose)?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    tracing::info!(db_url = %parsed.db_url, "opening local store");
    let services =
        AppServices::new_sqlite(&parsed.db_url, parsed.api_config()?, Clock::system()).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match &parsed.command {
        Command::Courses => list_courses(&services).await,
        Command::Course { course_id } => walk_course(&services, course_id, &mut input).await,
        Command::Quiz { size } => run_quiz(&services, *size, &mut input).await,
        Command::Progress { course_id } => show_progress(&services, course_id).await,
        Command::Login { email, password } => {
            let form = LoginForm {
                email: email.clone(),
                password: password.clone(),
            };
            let session = services.auth().login(&form).await?;
            println!("Signed in as {}.", session.user.name);
            Ok(())
        }
        Command::Logout => {
            services.auth().logout().await?;
            println!("Signed out.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
