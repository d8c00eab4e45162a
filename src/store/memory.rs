// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{QuestionStore, QuizStore, ResultFilter, ResultStore, StoreResult, UserStore};
use crate::{
    error::AppError,
    models::{
        question::{CategoryFilter, ImportBatch, Question},
        quiz::Quiz,
        result::QuizResult,
        user::{Role, User},
    },
};

/// Process-local store. Used by the integration tests and for running the
/// API without a database.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    questions: RwLock<HashMap<Uuid, Question>>,
    batches: RwLock<HashMap<Uuid, ImportBatch>>,
    quizzes: RwLock<HashMap<Uuid, Quiz>>,
    results: RwLock<HashMap<Uuid, QuizResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        let found = if login.contains('@') {
            let email = login.to_lowercase();
            users.values().find(|u| u.email == email)
        } else {
            users.values().find(|u| u.username == login)
        };
        Ok(found.cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                existing.email = user.email.clone();
                existing.password = user.password.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut list: Vec<User> = self.users.read().await.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn count_users(&self, role: Option<Role>) -> StoreResult<i64> {
        let users = self.users.read().await;
        let count = users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn insert_question(&self, question: Question) -> StoreResult<Question> {
        let mut questions = self.questions.write().await;
        if questions.values().any(|q| q.question == question.question) {
            return Err(AppError::Conflict("Question already exists".to_string()));
        }
        questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn question_text_exists(&self, text: &str) -> StoreResult<bool> {
        Ok(self.questions.read().await.values().any(|q| q.question == text))
    }

    async fn find_questions(&self, ids: &[Uuid]) -> StoreResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }

    async fn list_questions(&self, filter: &CategoryFilter) -> StoreResult<Vec<Question>> {
        let mut list: Vec<Question> = self
            .questions
            .read()
            .await
            .values()
            .filter(|q| filter.matches(q.category))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    async fn question_ids(&self, filter: &CategoryFilter) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .questions
            .read()
            .await
            .values()
            .filter(|q| filter.matches(q.category))
            .map(|q| q.id)
            .collect())
    }

    async fn update_question(&self, question: &Question) -> StoreResult<bool> {
        let mut questions = self.questions.write().await;
        if questions
            .values()
            .any(|q| q.id != question.id && q.question == question.question)
        {
            return Err(AppError::Conflict("Question already exists".to_string()));
        }
        match questions.get_mut(&question.id) {
            Some(existing) => {
                *existing = question.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_question(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.questions.write().await.remove(&id).is_some())
    }

    async fn delete_all_questions(&self) -> StoreResult<u64> {
        let mut questions = self.questions.write().await;
        let removed = questions.len() as u64;
        questions.clear();
        self.batches.write().await.clear();
        Ok(removed)
    }

    async fn insert_batch(&self, batch: ImportBatch) -> StoreResult<ImportBatch> {
        self.batches.write().await.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn update_batch_counts(&self, id: Uuid, inserted: i64, skipped: i64) -> StoreResult<()> {
        if let Some(batch) = self.batches.write().await.get_mut(&id) {
            batch.inserted = inserted;
            batch.skipped = skipped;
        }
        Ok(())
    }

    async fn delete_batch(&self, id: Uuid) -> StoreResult<Option<u64>> {
        let mut questions = self.questions.write().await;
        if self.batches.write().await.remove(&id).is_none() {
            return Ok(None);
        }
        let before = questions.len();
        questions.retain(|_, q| q.batch_id != Some(id));
        Ok(Some((before - questions.len()) as u64))
    }

    async fn list_batches(&self) -> StoreResult<Vec<ImportBatch>> {
        let mut list: Vec<ImportBatch> = self.batches.read().await.values().cloned().collect();
        list.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(list)
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn insert_quiz(&self, quiz: Quiz) -> StoreResult<Quiz> {
        self.quizzes.write().await.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn find_quiz(&self, id: Uuid) -> StoreResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(&id).cloned())
    }

    async fn find_quizzes(&self, ids: &[Uuid]) -> StoreResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(ids.iter().filter_map(|id| quizzes.get(id).cloned()).collect())
    }

    async fn list_quizzes(&self) -> StoreResult<Vec<Quiz>> {
        let mut list: Vec<Quiz> = self.quizzes.read().await.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn delete_quiz(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.quizzes.write().await.remove(&id).is_some())
    }

    async fn count_quizzes(&self) -> StoreResult<i64> {
        Ok(self.quizzes.read().await.len() as i64)
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn insert_result(&self, result: QuizResult) -> StoreResult<QuizResult> {
        self.results.write().await.insert(result.id, result.clone());
        Ok(result)
    }

    async fn find_result(&self, id: Uuid) -> StoreResult<Option<QuizResult>> {
        Ok(self.results.read().await.get(&id).cloned())
    }

    async fn list_results(&self, filter: &ResultFilter) -> StoreResult<Vec<QuizResult>> {
        Ok(self
            .results
            .read()
            .await
            .values()
            .filter(|r| match filter {
                ResultFilter::All => true,
                ResultFilter::Quiz(quiz_id) => r.quiz_id == *quiz_id,
                ResultFilter::Student(name) => r.student_name == *name,
            })
            .cloned()
            .collect())
    }

    async fn delete_result(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.results.write().await.remove(&id).is_some())
    }

    async fn count_results(&self) -> StoreResult<i64> {
        Ok(self.results.read().await.len() as i64)
    }
}
