use clap::Parser;
use quizterm::{
    console::Console, input::StdinLineSource, Config, Error as QuizError, SessionController,
};
use std::{error::Error, io, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "QUIZTERM_LOG";

/// timed multiple-choice quiz with persistent scores
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed multiple-choice quiz for the terminal. Questions are loaded from a JSON file, every answer has a time limit, and scores are kept per player with a leaderboard."
)]
pub struct Cli {
    /// question file to load
    #[clap(short = 'q', long, default_value = quizterm::config::DEFAULT_QUESTIONS_FILE)]
    questions: PathBuf,

    /// score file to read and update
    #[clap(short = 's', long, default_value = quizterm::config::DEFAULT_SCORES_FILE)]
    scores: PathBuf,

    /// seconds allowed per answer
    #[clap(short = 't', long, default_value_t = quizterm::config::DEFAULT_ANSWER_TIMEOUT_SECS)]
    timeout: u64,

    /// questions per round
    #[clap(short = 'n', long, default_value_t = quizterm::config::DEFAULT_QUESTIONS_PER_SESSION)]
    number_of_questions: usize,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            questions_path: cli.questions.clone(),
            scores_path: cli.scores.clone(),
            answer_timeout_secs: cli.timeout,
            questions_per_session: cli.number_of_questions,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from(&cli);
    config.validate()?;
    info!(?config, "starting");

    let console = Console::new(StdinLineSource::new(), io::stdout());
    let mut controller = SessionController::new(&config, console, rand::thread_rng());

    match controller.run() {
        Ok(()) => Ok(()),
        // stdin closed: nothing left to ask, leave quietly
        Err(QuizError::InputClosed) => {
            info!("input closed, exiting");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
