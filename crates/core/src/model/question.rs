use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Fewest answer choices a question may offer.
pub const MIN_OPTIONS: usize = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least {MIN_OPTIONS} options, got {len}")]
    TooFewOptions { len: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("option `{option}` appears more than once")]
    DuplicateOption { option: String },

    #[error("correct option `{option}` is not one of the options")]
    CorrectOptionMissing { option: String },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as supplied by an author, an import file or the bank.
///
/// Field names follow the JSON shape used by quiz exports, so `question` is
/// accepted as an alias for `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    #[serde(alias = "question")]
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: String,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_option: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_option: correct_option.into(),
        }
    }

    /// Validate the draft into a `Question`.
    ///
    /// Text and options are trimmed. The correct option is matched by value
    /// after trimming.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, there are fewer than
    /// two options, an option is blank or repeated, or the correct option is
    /// not among the options.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        if self.options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                len: self.options.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        let mut options = Vec::with_capacity(self.options.len());
        for (index, option) in self.options.iter().enumerate() {
            let option = option.trim();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            if !seen.insert(option) {
                return Err(QuestionError::DuplicateOption {
                    option: option.to_owned(),
                });
            }
            options.push(option.to_owned());
        }

        let correct_option = self.correct_option.trim();
        if !seen.contains(correct_option) {
            return Err(QuestionError::CorrectOptionMissing {
                option: correct_option.to_owned(),
            });
        }

        Ok(Question {
            text: text.to_owned(),
            options,
            correct_option: correct_option.to_owned(),
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// `correct_option` is always one of `options`; answers are compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_option: String,
}

impl Question {
    /// Shorthand for building and validating a draft.
    ///
    /// # Errors
    ///
    /// See [`QuestionDraft::validate`].
    pub fn new(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_option: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        QuestionDraft::new(text, options, correct_option).validate()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_option == option
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(question: Question) -> Self {
        Self {
            text: question.text,
            options: question.options,
            correct_option: question.correct_option,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
