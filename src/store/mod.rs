// src/store/mod.rs

//! Persistence seam. Handlers and services only see these traits; the
//! Postgres implementation backs the server, the in-memory one backs tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        question::{CategoryFilter, ImportBatch, Question},
        quiz::Quiz,
        result::QuizResult,
        user::{Role, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, AppError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    /// Looks a user up by username, or by email when `login` contains '@'.
    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>>;
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    /// Replaces email and password hash. Returns false when the user does not exist.
    async fn update_user(&self, user: &User) -> StoreResult<bool>;
    /// Newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_users(&self, role: Option<Role>) -> StoreResult<i64>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Fails with `Conflict` when the question text already exists.
    async fn insert_question(&self, question: Question) -> StoreResult<Question>;
    async fn question_text_exists(&self, text: &str) -> StoreResult<bool>;
    /// Ids that do not exist are absent from the output. Order is unspecified.
    async fn find_questions(&self, ids: &[Uuid]) -> StoreResult<Vec<Question>>;
    async fn list_questions(&self, filter: &CategoryFilter) -> StoreResult<Vec<Question>>;
    async fn question_ids(&self, filter: &CategoryFilter) -> StoreResult<Vec<Uuid>>;
    /// Replaces the stored record. Returns false when it does not exist.
    async fn update_question(&self, question: &Question) -> StoreResult<bool>;
    async fn delete_question(&self, id: Uuid) -> StoreResult<bool>;
    /// Removes every question and every import batch.
    async fn delete_all_questions(&self) -> StoreResult<u64>;
    async fn insert_batch(&self, batch: ImportBatch) -> StoreResult<ImportBatch>;
    async fn update_batch_counts(&self, id: Uuid, inserted: i64, skipped: i64) -> StoreResult<()>;
    /// Removes a batch and the questions it imported. Returns the number of
    /// questions removed, or `None` when the batch does not exist.
    async fn delete_batch(&self, id: Uuid) -> StoreResult<Option<u64>>;
    /// Newest first.
    async fn list_batches(&self) -> StoreResult<Vec<ImportBatch>>;
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn insert_quiz(&self, quiz: Quiz) -> StoreResult<Quiz>;
    async fn find_quiz(&self, id: Uuid) -> StoreResult<Option<Quiz>>;
    async fn find_quizzes(&self, ids: &[Uuid]) -> StoreResult<Vec<Quiz>>;
    /// Newest first.
    async fn list_quizzes(&self) -> StoreResult<Vec<Quiz>>;
    async fn delete_quiz(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_quizzes(&self) -> StoreResult<i64>;
}

/// Selects which results `ResultStore::list_results` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultFilter {
    All,
    Quiz(Uuid),
    Student(String),
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn insert_result(&self, result: QuizResult) -> StoreResult<QuizResult>;
    async fn find_result(&self, id: Uuid) -> StoreResult<Option<QuizResult>>;
    /// Order is unspecified; the reporter sorts.
    async fn list_results(&self, filter: &ResultFilter) -> StoreResult<Vec<QuizResult>>;
    async fn delete_result(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_results(&self) -> StoreResult<i64>;
}

/// Everything the application needs from persistence.
pub trait Store: UserStore + QuestionStore + QuizStore + ResultStore {}

impl<T> Store for T where T: UserStore + QuestionStore + QuizStore + ResultStore {}
