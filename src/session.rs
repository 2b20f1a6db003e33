use crate::console::Console;
use crate::input::{LineSource, TimedAnswer};
use crate::question::{Difficulty, Question, QuestionBank};
use crate::util::percentage;
use crossterm::style::Stylize;
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

/// Tier assigned from the share of correct answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Award {
    #[strum(to_string = "Gold Master!")]
    Gold,
    #[strum(to_string = "Silver Genius!")]
    Silver,
    #[strum(to_string = "Bronze Expert!")]
    Bronze,
    #[strum(to_string = "Try again!")]
    TryAgain,
}

impl Award {
    /// 100% gold, [80, 100) silver, [50, 80) bronze, anything else (and 0/0) try again.
    pub fn for_score(score: u32, total: usize) -> Self {
        match percentage(score as usize, total) {
            Some(p) if p >= 100.0 => Award::Gold,
            Some(p) if p >= 80.0 => Award::Silver,
            Some(p) if p >= 50.0 => Award::Bronze,
            _ => Award::TryAgain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub questions_per_session: usize,
    pub answer_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            questions_per_session: crate::config::DEFAULT_QUESTIONS_PER_SESSION,
            answer_timeout: Duration::from_secs(crate::config::DEFAULT_ANSWER_TIMEOUT_SECS),
        }
    }
}

impl From<&crate::config::Config> for SessionOptions {
    fn from(cfg: &crate::config::Config) -> Self {
        Self {
            questions_per_session: cfg.questions_per_session,
            answer_timeout: cfg.answer_timeout(),
        }
    }
}

/// Which read a question is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retry,
}

/// What happens after one answer read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Correct,
    Wrong,
    TimedOut,
    /// Not one of the option labels on the first read
    RetryAllowed,
    /// Not one of the option labels on the retry
    InvalidAgain,
}

/// Judge a single read of `answer` for `question`.
pub fn judge(question: &Question, answer: &TimedAnswer, attempt: Attempt) -> Step {
    let Some(answer) = answer.as_str() else {
        return Step::TimedOut;
    };
    if !question.is_valid_choice(answer) {
        return match attempt {
            Attempt::First => Step::RetryAllowed,
            Attempt::Retry => Step::InvalidAgain,
        };
    }
    if question.is_correct(answer) {
        Step::Correct
    } else {
        Step::Wrong
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub player: String,
    pub difficulty: Difficulty,
    pub score: u32,
    pub num_questions: usize,
    pub missed: Vec<Question>,
    pub award: Award,
}

/// One timed round for one player at one difficulty
#[derive(Debug)]
pub struct QuizSession<'a> {
    player: String,
    difficulty: Difficulty,
    pool_size: usize,
    questions: Vec<&'a Question>,
    options: SessionOptions,
    score: u32,
    missed: Vec<Question>,
}

impl<'a> QuizSession<'a> {
    /// Filter the bank, shuffle, and keep at most `questions_per_session`.
    pub fn new<R: Rng + ?Sized>(
        player: &str,
        difficulty: Difficulty,
        bank: &'a QuestionBank,
        options: SessionOptions,
        rng: &mut R,
    ) -> Self {
        let mut questions = bank.filter_by_difficulty(difficulty);
        let pool_size = questions.len();
        questions.shuffle(rng);
        questions.truncate(options.questions_per_session);
        debug!(
            player,
            %difficulty,
            pool_size,
            selected = questions.len(),
            "questions selected"
        );

        Self {
            player: player.to_string(),
            difficulty,
            pool_size,
            questions,
            options,
            score: 0,
            missed: Vec::new(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Fewer matching questions than a full round needs
    pub fn is_short(&self) -> bool {
        self.pool_size < self.options.questions_per_session
    }

    pub fn questions(&self) -> &[&'a Question] {
        &self.questions
    }

    pub fn run<S: LineSource, W: Write>(mut self, console: &mut Console<S, W>) -> SessionResult {
        console.success(format!(
            "\nLoaded {} questions for level '{}'.",
            self.pool_size, self.difficulty
        ));
        if self.is_short() {
            console.warn(format!(
                "Warning: not enough questions for this level. {} available.",
                self.pool_size
            ));
        }

        let questions = std::mem::take(&mut self.questions);
        for (i, question) in questions.iter().enumerate() {
            self.ask(console, i + 1, question);
        }
        let num_questions = questions.len();

        let award = Award::for_score(self.score, num_questions);
        console.say(format!("\nYour result: {}/{}", self.score, num_questions));
        console.say(styled_award(award));
        self.review_missed(console);

        debug!(player = %self.player, score = self.score, num_questions, %award, "session finished");
        SessionResult {
            player: self.player,
            difficulty: self.difficulty,
            score: self.score,
            num_questions,
            missed: self.missed,
            award,
        }
    }

    fn ask<S: LineSource, W: Write>(
        &mut self,
        console: &mut Console<S, W>,
        number: usize,
        question: &Question,
    ) {
        console.heading(format!("\nQuestion {number}: {}", question.text));
        console.say(format!(
            "You have {} seconds to answer.",
            self.options.answer_timeout.as_secs()
        ));
        for option in &question.options {
            console.say(option);
        }

        let timeout = self.options.answer_timeout;
        let first = console.prompt_timed("Your answer (enter the letter): ", timeout);
        let mut step = judge(question, &first, Attempt::First);

        if step == Step::RetryAllowed {
            console.error(format!(
                "Invalid choice. Please pick one of: {}.",
                question.option_labels().iter().join(", ")
            ));
            console.warn("You have one more attempt.");
            let retry = console.prompt_timed("Try again (enter the letter): ", timeout);
            step = judge(question, &retry, Attempt::Retry);
        }
        debug!(number, ?step, "question judged");

        match step {
            Step::Correct => {
                console.success("Correct!");
                self.score += 1;
            }
            Step::TimedOut => {
                console.error("Time is up!");
                self.reveal(console, question);
            }
            Step::Wrong => {
                console.error("Wrong!");
                self.reveal(console, question);
            }
            Step::InvalidAgain | Step::RetryAllowed => {
                console.error("Invalid choice again.");
                self.reveal(console, question);
            }
        }
    }

    fn reveal<S: LineSource, W: Write>(&mut self, console: &mut Console<S, W>, question: &Question) {
        console.success(format!("Correct answer: {}", question.correct_label()));
        console.warn(format!("Explanation: {}", question.explanation_text()));
        self.missed.push(question.clone());
    }

    fn review_missed<S: LineSource, W: Write>(&self, console: &mut Console<S, W>) {
        if self.missed.is_empty() {
            return;
        }
        console.info("\nQuestions to review:");
        for q in &self.missed {
            console.say(format!("- {} (answer: {})", q.text, q.correct_label()));
        }
    }
}

fn styled_award(award: Award) -> String {
    let label = award.to_string();
    match award {
        Award::Gold => label.yellow().to_string(),
        Award::Silver => label.cyan().to_string(),
        Award::Bronze => label.magenta().to_string(),
        Award::TryAgain => label.red().to_string(),
    }
}
