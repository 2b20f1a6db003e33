use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const OPTION_DELIMITER: char = '.';
pub const NO_EXPLANATION: &str = "No explanation.";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Difficulty {
    #[serde(alias = "Легкий")]
    Easy,
    #[serde(alias = "Средний")]
    Medium,
    #[serde(alias = "Сложный")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Menu choice `1`, `2` or `3`.
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Difficulty::Easy),
            "2" => Some(Difficulty::Medium),
            "3" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn menu_number(&self) -> usize {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

/// One multiple-choice question as stored in the question file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    /// `"A. option text"`; the label is everything before the first `.`
    pub options: Vec<String>,
    pub answer: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

pub fn option_label(option: &str) -> String {
    option
        .split(OPTION_DELIMITER)
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase()
}

impl Question {
    pub fn option_labels(&self) -> Vec<String> {
        self.options.iter().map(|o| option_label(o)).collect()
    }

    pub fn correct_label(&self) -> String {
        self.answer.trim().to_uppercase()
    }

    pub fn is_valid_choice(&self, answer: &str) -> bool {
        self.option_labels().iter().any(|l| l == answer)
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim().to_uppercase() == self.correct_label()
    }

    pub fn explanation_text(&self) -> &str {
        match self.explanation.as_deref() {
            Some(e) if !e.trim().is_empty() => e,
            _ => NO_EXPLANATION,
        }
    }

    pub fn validate(&self, index: usize) -> Result<()> {
        let invalid = |reason: String| Error::InvalidQuestion { index, reason };

        if self.text.trim().is_empty() {
            return Err(invalid("question text is empty".to_string()));
        }
        if self.options.len() < 2 {
            return Err(invalid(format!(
                "needs at least two options, found {}",
                self.options.len()
            )));
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            let label = option_label(option);
            if label.is_empty() {
                return Err(invalid(format!("option '{option}' has no label")));
            }
            if !seen.insert(label.clone()) {
                return Err(invalid(format!("option label '{label}' is repeated")));
            }
        }

        let correct = self.correct_label();
        if !seen.contains(&correct) {
            return Err(invalid(format!(
                "answer '{correct}' is not among the options"
            )));
        }
        Ok(())
    }
}

/// Immutable set of questions loaded once at startup
#[derive(Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
    rejected: Vec<Error>,
}

impl QuestionBank {
    /// Read a JSON array of questions from `path`.
    ///
    /// A missing file is `Error::NotFound`, malformed JSON is `Error::Parse`.
    /// Individual records that fail validation are skipped and kept in
    /// [`QuestionBank::rejected`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::from_read(path.to_path_buf(), e))?;
        let records: Vec<serde_json::Value> =
            serde_json::from_slice(&bytes).map_err(|source| Error::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut parsed = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();
        for (i, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Question>(record) {
                Ok(q) => parsed.push((i + 1, q)),
                Err(e) => rejected.push(Error::InvalidQuestion {
                    index: i + 1,
                    reason: e.to_string(),
                }),
            }
        }

        let mut bank = Self::from_indexed(parsed);
        rejected.append(&mut bank.rejected);
        rejected.sort_by_key(|e| match e {
            Error::InvalidQuestion { index, .. } => *index,
            _ => 0,
        });
        bank.rejected = rejected;

        info!(
            path = %path.display(),
            loaded = bank.len(),
            rejected = bank.rejected.len(),
            "question bank loaded"
        );
        Ok(bank)
    }

    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self::from_indexed(questions.into_iter().enumerate().map(|(i, q)| (i + 1, q)).collect())
    }

    fn from_indexed(questions: Vec<(usize, Question)>) -> Self {
        let mut seen_texts = HashSet::new();
        let mut kept = Vec::with_capacity(questions.len());
        let mut rejected = Vec::new();

        for (index, question) in questions {
            if let Err(e) = question.validate(index) {
                warn!("{e}");
                rejected.push(e);
                continue;
            }
            if !seen_texts.insert(question.text.trim().to_lowercase()) {
                let e = Error::InvalidQuestion {
                    index,
                    reason: "duplicate of an earlier question".to_string(),
                };
                warn!("{e}");
                rejected.push(e);
                continue;
            }
            kept.push(question);
        }

        Self {
            questions: kept,
            rejected,
        }
    }

    pub fn filter_by_difficulty(&self, tier: Difficulty) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.difficulty == tier)
            .collect()
    }

    pub fn counts_by_difficulty(&self) -> Vec<(Difficulty, usize)> {
        Difficulty::ALL
            .iter()
            .map(|d| (*d, self.questions.iter().filter(|q| q.difficulty == *d).count()))
            .collect()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn rejected(&self) -> &[Error] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    pub(crate) fn question(text: &str, answer: &str, difficulty: Difficulty) -> Question {
        Question {
            text: text.to_string(),
            options: vec![
                "A. first".to_string(),
                "B. second".to_string(),
                "C. third".to_string(),
                "D. fourth".to_string(),
            ],
            answer: answer.to_string(),
            difficulty,
            explanation: Some(format!("because {answer}")),
        }
    }

    #[test]
    fn test_option_labels() {
        let q = question("What?", "b", Difficulty::Easy);
        assert_eq!(q.option_labels(), vec!["A", "B", "C", "D"]);
        assert_eq!(q.correct_label(), "B");
        assert!(q.is_valid_choice("C"));
        assert!(!q.is_valid_choice("E"));
        assert!(q.is_correct("b"));
        assert!(q.is_correct(" B "));
        assert!(!q.is_correct("A"));
    }

    #[test]
    fn test_label_uses_first_delimiter_only() {
        assert_eq!(option_label("a. U.S. law"), "A");
        assert_eq!(option_label("  c  .text"), "C");
        assert_eq!(option_label("no delimiter"), "NO DELIMITER");
    }

    #[test]
    fn test_explanation_fallback() {
        let mut q = question("What?", "A", Difficulty::Easy);
        assert_eq!(q.explanation_text(), "because A");
        q.explanation = None;
        assert_eq!(q.explanation_text(), NO_EXPLANATION);
        q.explanation = Some("   ".to_string());
        assert_eq!(q.explanation_text(), NO_EXPLANATION);
    }

    #[test]
    fn test_validate_rejects_unknown_answer() {
        let q = question("What?", "E", Difficulty::Easy);
        assert_matches!(q.validate(7), Err(Error::InvalidQuestion { index: 7, .. }));
    }

    #[test]
    fn test_validate_rejects_repeated_label() {
        let mut q = question("What?", "A", Difficulty::Easy);
        q.options.push("a. again".to_string());
        assert_matches!(q.validate(1), Err(Error::InvalidQuestion { .. }));
    }

    #[test]
    fn test_difficulty_menu_choice() {
        assert_eq!(Difficulty::from_menu_choice("1"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_menu_choice(" 2 "), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_menu_choice("3"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_menu_choice("4"), None);
        assert_eq!(Difficulty::from_menu_choice("easy"), None);
        for d in Difficulty::ALL {
            assert_eq!(
                Difficulty::from_menu_choice(&d.menu_number().to_string()),
                Some(d)
            );
        }
    }

    #[test]
    fn test_difficulty_accepts_legacy_labels() {
        let d: Difficulty = serde_json::from_str("\"Средний\"").unwrap();
        assert_eq!(d, Difficulty::Medium);
        let d: Difficulty = serde_json::from_str("\"Hard\"").unwrap();
        assert_eq!(d, Difficulty::Hard);
        assert!(serde_json::from_str::<Difficulty>("\"Extreme\"").is_err());
        assert_eq!(Difficulty::Easy.to_string(), "Easy");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = QuestionBank::load(dir.path().join("nope.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("questions.json");
        fs::write(&path, "[{\"question\": ").unwrap();
        assert_matches!(QuestionBank::load(&path), Err(Error::Parse { .. }));
    }

    #[test]
    fn test_load_skips_invalid_and_duplicate_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("questions.json");
        let data = r#"[
            {"question": "Q1", "options": ["A. x", "B. y"], "answer": "a", "difficulty": "Легкий",
             "explanation": "x is right"},
            {"question": "Q2", "options": ["A. x", "B. y"], "answer": "C", "difficulty": "Easy"},
            {"question": "Q3", "options": ["A. x", "B. y"], "answer": "B", "difficulty": "Impossible"},
            {"question": "q1", "options": ["A. x", "B. y"], "answer": "B", "difficulty": "Hard"},
            {"question": "Q4", "options": ["A. x", "B. y"], "answer": "B", "difficulty": "Hard"}
        ]"#;
        fs::write(&path, data).unwrap();

        let bank = QuestionBank::load(&path).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.questions()[0].text, "Q1");
        assert_eq!(bank.questions()[0].difficulty, Difficulty::Easy);
        assert_eq!(bank.questions()[1].text, "Q4");

        let indices: Vec<usize> = bank
            .rejected()
            .iter()
            .map(|e| match e {
                Error::InvalidQuestion { index, .. } => *index,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(indices, vec![2, 3, 4]);
    }

    #[test]
    fn test_bank_keeps_rejections_next_to_questions() {
        let bank = QuestionBank::from_questions(vec![
            question("kept", "A", Difficulty::Easy),
            question("dropped", "Z", Difficulty::Easy),
        ]);
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.rejected().len(), 1);
        assert!(bank.rejected()[0].to_string().starts_with("Invalid question #2"));
        assert!(QuestionBank::default().is_empty());
    }

    #[test]
    fn test_filter_by_difficulty_preserves_order() {
        let bank = QuestionBank::from_questions(vec![
            question("one", "A", Difficulty::Easy),
            question("two", "A", Difficulty::Hard),
            question("three", "A", Difficulty::Easy),
        ]);
        let easy: Vec<&str> = bank
            .filter_by_difficulty(Difficulty::Easy)
            .iter()
            .map(|q| q.text.as_str())
            .collect();
        assert_eq!(easy, vec!["one", "three"]);
        assert!(bank.filter_by_difficulty(Difficulty::Medium).is_empty());
        assert_eq!(
            bank.counts_by_difficulty(),
            vec![
                (Difficulty::Easy, 2),
                (Difficulty::Medium, 0),
                (Difficulty::Hard, 1)
            ]
        );
    }
}
