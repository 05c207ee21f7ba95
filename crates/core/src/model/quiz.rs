use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuizId;
use crate::model::question::{Question, QuestionDraft, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("invalid question {index}: {source}")]
    Question {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated quiz, as authored or imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    /// Validates title and every question.
    ///
    /// An empty question list is accepted; such a quiz can sit in the bank
    /// but cannot be started.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` for a blank title, or
    /// `QuizError::Question` for the first invalid question.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedQuiz, QuizError> {
        let title = normalize_title(&self.title)?;
        let questions = validate_questions(self.questions)?;

        Ok(ValidatedQuiz {
            title,
            description: normalize_description(self.description),
            questions,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuiz {
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedQuiz {
    #[must_use]
    pub fn assign_id(self, id: QuizId) -> Quiz {
        Quiz {
            id,
            title: self.title,
            description: self.description,
            questions: self.questions,
            created_at: self.created_at,
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A quiz and its question bank.
///
/// The bank is unordered; sessions sample from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: Option<String>,
    questions: Vec<Question>,
    created_at: DateTime<Utc>,
}

impl Quiz {
    /// Creates a quiz from already validated questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` if the title is blank.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        description: Option<String>,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        Ok(Self {
            id,
            title: normalize_title(&title.into())?,
            description: normalize_description(description),
            questions,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns a copy with the given fields replaced, keeping id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the new title or any new question is invalid.
    pub fn with_changes(
        &self,
        title: Option<String>,
        description: Option<Option<String>>,
        questions: Option<Vec<QuestionDraft>>,
    ) -> Result<Self, QuizError> {
        let title = match title {
            Some(title) => normalize_title(&title)?,
            None => self.title.clone(),
        };
        let description = match description {
            Some(description) => normalize_description(description),
            None => self.description.clone(),
        };
        let questions = match questions {
            Some(drafts) => validate_questions(drafts)?,
            None => self.questions.clone(),
        };

        Ok(Self {
            id: self.id,
            title,
            description,
            questions,
            created_at: self.created_at,
        })
    }
}

fn normalize_title(title: &str) -> Result<String, QuizError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(QuizError::EmptyTitle);
    }
    Ok(title.to_owned())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}

fn validate_questions(drafts: Vec<QuestionDraft>) -> Result<Vec<Question>, QuizError> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            draft
                .validate()
                .map_err(|source| QuizError::Question { index, source })
        })
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
