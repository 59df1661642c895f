use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuestionIndex, UserId};
use services::{
    Clock, IdentityProvider, LocalIdentity, QuizServices, QuizSession, QuizSessionError,
    RestRemoteStore, SessionEvent, SessionMode, SessionSnapshot, SessionStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const BUNDLED_QUESTIONS: &str = include_str!("../data/questions.json");

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUser { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
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
    eprintln!(
        "  cargo run -p app -- [--db <sqlite_url>] [--questions <path>] [--user <id>] [--review]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  --questions <bundled sample bank>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_QUESTIONS, QUIZ_USER, QUIZ_LOG");
    eprintln!("  QUIZ_REMOTE_URL, QUIZ_REMOTE_KEY");
    eprintln!("  QUIZ_SYNC_BATCH_SIZE, QUIZ_SYNC_INTERVAL_SECS");
}

fn print_commands() {
    println!("Commands:");
    println!("  <number>     toggle that option");
    println!("  s            submit the selection");
    println!("  v            reveal a study question");
    println!("  n / p        next / previous question");
    println!("  x            exclude this question");
    println!("  l            list excluded questions");
    println!("  r <number>   restore an excluded question");
    println!("  R            restore every excluded question");
    println!("  h            show this help");
    println!("  q            quit");
}

struct Args {
    db_url: String,
    questions: Option<PathBuf>,
    user: Option<UserId>,
    review: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut questions = std::env::var_os("QUIZ_QUESTIONS").map(PathBuf::from);
        let mut user = std::env::var("QUIZ_USER")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok());
        let mut review = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--questions" => {
                    questions = Some(PathBuf::from(require_value(args, "--questions")?));
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    let parsed = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUser { raw: value.clone() })?;
                    user = Some(parsed);
                }
                "--review" => review = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            questions,
            user,
            review,
        })
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

fn load_bank(
    path: Option<&PathBuf>,
) -> Result<QuestionBank, storage::question_bank::QuestionSourceError> {
    match path {
        Some(path) => storage::question_bank::from_path(path),
        None => storage::question_bank::from_json_str(BUNDLED_QUESTIONS),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn render(snapshot: &SessionSnapshot) {
    println!();
    match snapshot.status {
        SessionStatus::Loading => {
            println!("Loading review questions...");
            return;
        }
        SessionStatus::NothingToReview => {
            println!("No mistakes to review.");
            return;
        }
        SessionStatus::Ready => {}
    }
    let Some(question) = snapshot.question.as_ref() else {
        return;
    };

    let mode = if snapshot.review { " (review)" } else { "" };
    println!(
        "Question {}/{}{mode}",
        snapshot.index.ordinal(),
        snapshot.total
    );
    if let Some(topic) = question.topic_label() {
        println!("[{topic}]");
    }
    if snapshot.is_excluded {
        println!("(excluded from rotation)");
    }
    println!("{}", question.question);
    if snapshot.multi_select {
        println!("(select all that apply)");
    }
    for (i, option) in question.options.iter().enumerate() {
        let mark = if snapshot.record.is_selected(i) { "x" } else { " " };
        println!("  [{mark}] {}. {option}", i + 1);
    }

    match snapshot.record.is_correct() {
        Some(correct) if !snapshot.is_study_mode() => {
            let verdict = if correct { "Correct" } else { "Incorrect" };
            println!("{verdict}. Answer: {}", question.correct_answer);
            if !question.explanation.is_empty() {
                println!("{}", question.explanation);
            }
        }
        Some(_) => println!("{}", question.explanation),
        None => {}
    }

    let counts = snapshot.counts;
    println!(
        "answered {} | correct {} | incorrect {} | excluded {}",
        counts.answered, counts.correct, counts.incorrect, snapshot.excluded_count
    );
}

fn on_event(event: &SessionEvent, snapshot: &SessionSnapshot) {
    match event {
        SessionEvent::SelectionChanged { .. }
        | SessionEvent::Answered { .. }
        | SessionEvent::Revealed { .. }
        | SessionEvent::Navigated { .. }
        | SessionEvent::Opened
        | SessionEvent::ReviewLoaded { .. } => render(snapshot),
        SessionEvent::Excluded { index } => println!("Excluded question {}.", index.ordinal()),
        SessionEvent::Restored { index } => println!("Restored question {}.", index.ordinal()),
        SessionEvent::RestoredAll { count } => println!("Restored {count} questions."),
        _ => {}
    }
}

//
// ─── TERMINAL LOOP ─────────────────────────────────────────────────────────────
//

async fn prompt(lines: &mut Lines<BufReader<Stdin>>) -> std::io::Result<Option<String>> {
    use std::io::Write;
    print!("> ");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

fn report(result: Result<(), QuizSessionError>) {
    if let Err(err) = result {
        println!("{err}");
    }
}

async fn run_session(
    session: &mut QuizSession,
    lines: &mut Lines<BufReader<Stdin>>,
) -> std::io::Result<()> {
    while let Some(line) = prompt(lines).await? {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        match command {
            "q" => break,
            "h" => print_commands(),
            "s" => report(session.submit().await.map(|_| ())),
            "v" => report(session.reveal().await),
            "n" => {
                if !session.snapshot().can_next {
                    println!("No later question.");
                }
                report(session.next().await.map(|_| ()));
            }
            "p" => {
                if !session.snapshot().can_prev {
                    println!("No earlier question.");
                }
                report(session.prev().await.map(|_| ()));
            }
            "x" => report(session.exclude_current().await.map(|_| ())),
            "l" => {
                let excluded = session.excluded_questions();
                if excluded.is_empty() {
                    println!("No excluded questions.");
                }
                for (index, question) in excluded {
                    println!("  {}. {}", index.ordinal(), question.question);
                }
            }
            "r" => match words.next().and_then(|raw| raw.parse::<usize>().ok()) {
                Some(ordinal) if ordinal > 0 => {
                    let index = QuestionIndex::new(ordinal - 1);
                    match session.restore(index).await {
                        Ok(false) => println!("Question {ordinal} is not excluded."),
                        Ok(true) => {}
                        Err(err) => println!("{err}"),
                    }
                }
                _ => println!("usage: r <question number>"),
            },
            "R" => {
                let count = session.snapshot().excluded_count;
                if count == 0 {
                    println!("No excluded questions.");
                    continue;
                }
                println!("Restore all {count} excluded questions? [y/N]");
                let confirmed = prompt(lines)
                    .await?
                    .is_some_and(|answer| answer.eq_ignore_ascii_case("y"));
                session.restore_all(|_| confirmed).await;
            }
            other => match other.parse::<usize>() {
                Ok(option) if option > 0 => report(session.click(option - 1).await),
                _ => println!("unknown command: {other} (h for help)"),
            },
        }
    }
    Ok(())
}

/// Lines shown once before the first question.
fn session_header(mode: SessionMode, mistakes: Option<u64>) -> String {
    let mut header = String::new();
    if mode == SessionMode::Review {
        header.push_str("Reviewing previous mistakes.\n");
    }
    if let Some(count) = mistakes {
        header.push_str(&format!("Mistakes recorded so far: {count}\n"));
    }
    header.push_str("Type h for help.\n");
    header
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let bank = Arc::new(load_bank(parsed.questions.as_ref())?);

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let identity = Arc::new(LocalIdentity::new(parsed.user.clone()));
    let remote = Arc::new(RestRemoteStore::from_env());
    if !remote.enabled() {
        warn!("QUIZ_REMOTE_URL/QUIZ_REMOTE_KEY not set; mistakes stay queued locally");
    }
    let services = QuizServices::new_sqlite(
        &parsed.db_url,
        remote,
        identity.clone(),
        Clock::default_clock(),
    )
    .await?;

    services.log_daily_visit().await?;
    let page = if parsed.review { "/review" } else { "/quiz" };
    let user = identity.current_user().await?;
    services.visits().log_page_visit(user.as_ref(), page).await;
    let mistakes = services.mistake_count().await;
    if let Some(count) = mistakes {
        info!(count, "mistakes recorded");
    }

    let mode = if parsed.review {
        SessionMode::Review
    } else {
        SessionMode::Standard
    };
    let mut session = QuizSession::open(bank, &services, mode).await?;
    print!("{}", session_header(mode, mistakes));
    session.subscribe(on_event);
    if parsed.review {
        session.load_review().await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = run_session(&mut session, &mut lines).await;

    services.shutdown();
    let pending = services.sync().pending().await?;
    if pending > 0 {
        info!(pending, "unsent mistakes kept for the next run");
    }
    Ok(result?)
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
