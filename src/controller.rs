use crate::config::Config;
use crate::console::Console;
use crate::error::{Error, Result};
use crate::input::LineSource;
use crate::question::{Difficulty, QuestionBank};
use crate::scores::{ClearOutcome, ScoreStore};
use crate::session::{QuizSession, SessionOptions};
use rand::Rng;
use std::io::Write;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "yes" | "y" => Some(YesNo::Yes),
            "no" | "n" => Some(YesNo::No),
            _ => None,
        }
    }
}

/// Top-level game loop: owns the bank, the score store and the console
pub struct SessionController<S: LineSource, W: Write, R: Rng> {
    console: Console<S, W>,
    bank: QuestionBank,
    store: ScoreStore,
    options: SessionOptions,
    rng: R,
}

impl<S: LineSource, W: Write, R: Rng> SessionController<S, W, R> {
    /// Load the question bank and score store named in `config`, reporting
    /// any degraded load on the console.
    pub fn new(config: &Config, mut console: Console<S, W>, rng: R) -> Self {
        let bank = load_bank(config, &mut console);
        let store = load_store(config, &mut console);
        Self::with_parts(console, bank, store, SessionOptions::from(config), rng)
    }

    pub fn with_parts(
        console: Console<S, W>,
        bank: QuestionBank,
        store: ScoreStore,
        options: SessionOptions,
        rng: R,
    ) -> Self {
        Self {
            console,
            bank,
            store,
            options,
            rng,
        }
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    pub fn console(&self) -> &Console<S, W> {
        &self.console
    }

    /// Run rounds until the operator declines a replay.
    ///
    /// Returns `Error::InputClosed` if input ends mid-dialogue.
    pub fn run(&mut self) -> Result<()> {
        if self.bank.is_empty() {
            self.console
                .error("No questions available to play. Exiting.");
            return Ok(());
        }

        self.console.success("\nWelcome to the quiz!");

        loop {
            let player = self.ask_player_name()?;
            let difficulty = self.ask_difficulty()?;
            self.play_round(&player, difficulty);

            match self.ask_yes_no("\nPlay again? (yes/no): ", false)? {
                YesNo::Yes => continue,
                YesNo::No => {
                    self.offer_clear(&player)?;
                    return Ok(());
                }
            }
        }
    }

    fn ask_player_name(&mut self) -> Result<String> {
        loop {
            let name = self.console.prompt("\nEnter your name: ")?;
            if !name.is_empty() {
                return Ok(name);
            }
            self.console
                .error("Name cannot be empty. Please enter your name.");
        }
    }

    pub fn ask_difficulty(&mut self) -> Result<Difficulty> {
        loop {
            self.console.say("\nChoose a difficulty level:");
            for d in Difficulty::ALL {
                self.console.say(format!("{}. {}", d.menu_number(), d));
            }
            let choice = self.console.prompt("Your choice (1/2/3): ")?;
            match Difficulty::from_menu_choice(&choice) {
                Some(d) => return Ok(d),
                None => self.console.error(
                    "Invalid choice. Please pick one of the available options (1, 2 or 3).",
                ),
            }
        }
    }

    /// Replay answers anything but yes as no; clear-stats insists on a recognised answer.
    fn ask_yes_no(&mut self, prompt: &str, insist: bool) -> Result<YesNo> {
        loop {
            let reply = self.console.prompt(prompt)?;
            match YesNo::parse(&reply) {
                Some(answer) => return Ok(answer),
                None if !insist => return Ok(YesNo::No),
                None => self
                    .console
                    .error("Invalid choice. Please answer 'yes' or 'no'."),
            }
        }
    }

    fn play_round(&mut self, player: &str, difficulty: Difficulty) {
        let session = QuizSession::new(player, difficulty, &self.bank, self.options, &mut self.rng);
        if session.is_empty() {
            self.console.warn(format!(
                "No questions available for level '{difficulty}'. Pick another level next time."
            ));
            return;
        }

        let result = session.run(&mut self.console);
        info!(
            player = %result.player,
            difficulty = %result.difficulty,
            score = result.score,
            num_questions = result.num_questions,
            "round complete"
        );

        match self.store.record_score(&result.player, result.score) {
            Ok(()) => self.console.success(format!(
                "Scores saved to '{}'.",
                self.store.path().display()
            )),
            Err(e) => {
                warn!("failed to save scores: {e}");
                self.console.error(format!("Failed to save scores: {e}"));
            }
        }

        self.show_leaderboard();
        self.show_player_stats(&result.player);
    }

    pub fn show_leaderboard(&mut self) {
        let board = self.store.leaderboard();
        if board.is_empty() {
            self.console.warn("\nThe leaderboard is empty.\n");
            return;
        }
        self.console.success("\nLeaderboard:");
        for entry in board {
            self.console
                .say(format!("{}: {} points", entry.player, entry.best));
        }
        self.console.blank();
    }

    pub fn show_player_stats(&mut self, player: &str) {
        match self.store.player_stats(player) {
            Some(stats) => {
                self.console.info(format!("\nStats for '{player}':"));
                self.console.say(format!("{stats}\n"));
            }
            None => self.console.warn("\nNo data about your games yet.\n"),
        }
    }

    fn offer_clear(&mut self, player: &str) -> Result<()> {
        match self.ask_yes_no("Clear your stats? (yes/no): ", true)? {
            YesNo::Yes => match self.store.clear_player(player) {
                Ok(ClearOutcome::Cleared) => self
                    .console
                    .success(format!("Stats for '{player}' cleared.")),
                Ok(ClearOutcome::NothingToClear) => self
                    .console
                    .warn(format!("No stats to clear for '{player}'.")),
                Err(e) => {
                    warn!("failed to save scores after clearing: {e}");
                    self.console.error(format!("Failed to save scores: {e}"));
                }
            },
            YesNo::No => self.console.success("Thanks for playing! See you next time."),
        }
        Ok(())
    }
}

fn load_bank<S: LineSource, W: Write>(config: &Config, console: &mut Console<S, W>) -> QuestionBank {
    let path = &config.questions_path;
    match QuestionBank::load(path) {
        Ok(bank) => {
            console.success(format!(
                "Loaded {} questions from '{}'.",
                bank.len(),
                path.display()
            ));
            for rejected in bank.rejected() {
                console.warn(format!("Skipped {rejected}"));
            }
            bank
        }
        Err(e @ Error::NotFound(_)) => {
            warn!("{e}");
            console.error(format!(
                "Question file '{}' not found. Make sure it is in the current directory.",
                path.display()
            ));
            QuestionBank::default()
        }
        Err(e) => {
            warn!("{e}");
            console.error(format!("Failed to load questions: {e}"));
            QuestionBank::default()
        }
    }
}

fn load_store<S: LineSource, W: Write>(config: &Config, console: &mut Console<S, W>) -> ScoreStore {
    let path = &config.scores_path;
    match ScoreStore::load(path) {
        Ok(store) => {
            if !store.board().is_empty() {
                console.success(format!("Loaded scores from '{}'.", path.display()));
            }
            store
        }
        Err(e) => {
            warn!("{e}");
            console.error(format!("Failed to load scores, starting fresh: {e}"));
            ScoreStore::empty(path)
        }
    }
}
