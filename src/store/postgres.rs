// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

use super::{QuestionStore, QuizStore, ResultFilter, ResultStore, StoreResult, UserStore};
use crate::{
    error::AppError,
    models::{
        question::{Category, CategoryFilter, ImportBatch, Question, QuestionSource},
        quiz::Quiz,
        result::{AnswerSnapshot, QuizResult},
        user::{Role, User},
    },
};

/// PostgreSQL-backed store. Lists and snapshots live in JSONB columns.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Category names bound as a TEXT[] parameter; `None` means no filter.
fn filter_names(filter: &CategoryFilter) -> Option<Vec<String>> {
    match filter {
        CategoryFilter::All => None,
        CategoryFilter::Only(categories) => {
            Some(categories.iter().map(|c| c.as_str().to_string()).collect())
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            AppError::InternalServerError(format!("Unknown role '{}' for user {}", row.role, row.id))
        })?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    question: String,
    options: Json<Vec<String>>,
    answer: String,
    category: String,
    explanation: String,
    source: String,
    batch_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<Category>().map_err(|c| {
            AppError::InternalServerError(format!("Unknown category '{}' for question {}", c, row.id))
        })?;
        Ok(Question {
            id: row.id,
            question: row.question,
            options: row.options.0,
            answer: row.answer,
            category,
            explanation: row.explanation,
            source: QuestionSource::parse(&row.source).unwrap_or_default(),
            batch_id: row.batch_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct QuizRow {
    id: Uuid,
    title: String,
    categories: Json<Vec<String>>,
    num_questions: i64,
    question_ids: Json<Vec<Uuid>>,
    duration: i64,
    description: String,
    created_by: String,
    certificate_enabled: bool,
    certificate_template: String,
    certificate_passing_score: i64,
    created_at: DateTime<Utc>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Quiz {
            id: row.id,
            title: row.title,
            categories: row.categories.0,
            num_questions: row.num_questions,
            question_ids: row.question_ids.0,
            duration: row.duration,
            description: row.description,
            created_by: row.created_by,
            certificate_enabled: row.certificate_enabled,
            certificate_template: row.certificate_template,
            certificate_passing_score: row.certificate_passing_score,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ResultRow {
    id: Uuid,
    quiz_id: Uuid,
    user_id: Option<Uuid>,
    student_name: String,
    answers: Json<Vec<AnswerSnapshot>>,
    question_order: Json<Vec<String>>,
    score: i64,
    total_questions: i64,
    correct_answers: i64,
    wrong_answers: i64,
    time_taken: i64,
    attempted_at: DateTime<Utc>,
}

impl From<ResultRow> for QuizResult {
    fn from(row: ResultRow) -> Self {
        QuizResult {
            id: row.id,
            quiz_id: row.quiz_id,
            user_id: row.user_id,
            student_name: row.student_name,
            answers: row.answers.0,
            question_order: row.question_order.0,
            score: row.score,
            total_questions: row.total_questions,
            correct_answers: row.correct_answers,
            wrong_answers: row.wrong_answers,
            time_taken: row.time_taken,
            attempted_at: row.attempted_at,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password, role, created_at";

const QUESTION_COLUMNS: &str =
    "id, question, options, answer, category, explanation, source, batch_id, created_at, updated_at";

const QUIZ_COLUMNS: &str = "id, title, categories, num_questions, question_ids, duration, description, \
     created_by, certificate_enabled, certificate_template, certificate_passing_score, created_at";

const RESULT_COLUMNS: &str = "id, quiz_id, user_id, student_name, answers, question_order, score, \
     total_questions, correct_answers, wrong_answers, time_taken, attempted_at";

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("User already exists".to_string()),
            other => {
                tracing::error!("Failed to insert user: {:?}", other);
                other
            }
        })?;

        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let sql = if login.contains('@') {
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)")
        } else {
            format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1")
        };
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET email = $2, password = $3 WHERE id = $1")
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password)
            .execute(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict("Email already in use".to_string()),
                other => other,
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_users(&self, role: Option<Role>) -> StoreResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR role = $1)")
                .bind(role.map(|r| r.as_str()))
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn insert_question(&self, question: Question) -> StoreResult<Question> {
        sqlx::query(
            r#"
            INSERT INTO questions
            (id, question, options, answer, category, explanation, source, batch_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(Json(&question.options))
        .bind(&question.answer)
        .bind(question.category.as_str())
        .bind(&question.explanation)
        .bind(question.source.as_str())
        .bind(question.batch_id)
        .bind(question.created_at)
        .bind(question.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Question already exists".to_string()),
            other => {
                tracing::error!("Failed to insert question: {:?}", other);
                other
            }
        })?;

        Ok(question)
    }

    async fn question_text_exists(&self, text: &str) -> StoreResult<bool> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM questions WHERE question = $1)")
            .bind(text)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn find_questions(&self, ids: &[Uuid]) -> StoreResult<Vec<Question>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ANY($1)");
        sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Question::try_from)
            .collect()
    }

    async fn list_questions(&self, filter: &CategoryFilter) -> StoreResult<Vec<Question>> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE ($1::TEXT[] IS NULL OR category = ANY($1)) \
             ORDER BY created_at"
        );
        sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(filter_names(filter))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Question::try_from)
            .collect()
    }

    async fn question_ids(&self, filter: &CategoryFilter) -> StoreResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM questions WHERE ($1::TEXT[] IS NULL OR category = ANY($1))",
        )
        .bind(filter_names(filter))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn update_question(&self, question: &Question) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE questions SET
                question = $2, options = $3, answer = $4, category = $5,
                explanation = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(Json(&question.options))
        .bind(&question.answer)
        .bind(question.category.as_str())
        .bind(&question.explanation)
        .bind(question.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Question already exists".to_string()),
            other => other,
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_question(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_questions(&self) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM questions")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM import_batches")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn insert_batch(&self, batch: ImportBatch) -> StoreResult<ImportBatch> {
        sqlx::query(
            r#"
            INSERT INTO import_batches (id, original_name, uploaded_by, inserted, skipped, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(batch.id)
        .bind(&batch.original_name)
        .bind(&batch.uploaded_by)
        .bind(batch.inserted)
        .bind(batch.skipped)
        .bind(batch.uploaded_at)
        .execute(&self.pool)
        .await?;
        Ok(batch)
    }

    async fn update_batch_counts(&self, id: Uuid, inserted: i64, skipped: i64) -> StoreResult<()> {
        sqlx::query("UPDATE import_batches SET inserted = $2, skipped = $3 WHERE id = $1")
            .bind(id)
            .bind(inserted)
            .bind(skipped)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_batch(&self, id: Uuid) -> StoreResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;
        let batch = sqlx::query("DELETE FROM import_batches WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if batch.rows_affected() == 0 {
            return Ok(None);
        }
        let questions = sqlx::query("DELETE FROM questions WHERE batch_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(questions.rows_affected()))
    }

    async fn list_batches(&self) -> StoreResult<Vec<ImportBatch>> {
        let rows: Vec<(Uuid, String, String, i64, i64, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, original_name, uploaded_by, inserted, skipped, uploaded_at
            FROM import_batches
            ORDER BY uploaded_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, original_name, uploaded_by, inserted, skipped, uploaded_at)| ImportBatch {
                id,
                original_name,
                uploaded_by,
                inserted,
                skipped,
                uploaded_at,
            })
            .collect())
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn insert_quiz(&self, quiz: Quiz) -> StoreResult<Quiz> {
        sqlx::query(
            r#"
            INSERT INTO quizzes
            (id, title, categories, num_questions, question_ids, duration, description,
             created_by, certificate_enabled, certificate_template, certificate_passing_score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(quiz.id)
        .bind(&quiz.title)
        .bind(Json(&quiz.categories))
        .bind(quiz.num_questions)
        .bind(Json(&quiz.question_ids))
        .bind(quiz.duration)
        .bind(&quiz.description)
        .bind(&quiz.created_by)
        .bind(quiz.certificate_enabled)
        .bind(&quiz.certificate_template)
        .bind(quiz.certificate_passing_score)
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert quiz: {:?}", e);
            AppError::from(e)
        })?;
        Ok(quiz)
    }

    async fn find_quiz(&self, id: Uuid) -> StoreResult<Option<Quiz>> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1");
        Ok(sqlx::query_as::<_, QuizRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Quiz::from))
    }

    async fn find_quizzes(&self, ids: &[Uuid]) -> StoreResult<Vec<Quiz>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, QuizRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Quiz::from)
            .collect())
    }

    async fn list_quizzes(&self) -> StoreResult<Vec<Quiz>> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, QuizRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Quiz::from)
            .collect())
    }

    async fn delete_quiz(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_quizzes(&self) -> StoreResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quizzes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn insert_result(&self, result: QuizResult) -> StoreResult<QuizResult> {
        sqlx::query(
            r#"
            INSERT INTO results
            (id, quiz_id, user_id, student_name, answers, question_order, score,
             total_questions, correct_answers, wrong_answers, time_taken, attempted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(result.id)
        .bind(result.quiz_id)
        .bind(result.user_id)
        .bind(&result.student_name)
        .bind(Json(&result.answers))
        .bind(Json(&result.question_order))
        .bind(result.score)
        .bind(result.total_questions)
        .bind(result.correct_answers)
        .bind(result.wrong_answers)
        .bind(result.time_taken)
        .bind(result.attempted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert result: {:?}", e);
            AppError::from(e)
        })?;
        Ok(result)
    }

    async fn find_result(&self, id: Uuid) -> StoreResult<Option<QuizResult>> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE id = $1");
        Ok(sqlx::query_as::<_, ResultRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(QuizResult::from))
    }

    async fn list_results(&self, filter: &ResultFilter) -> StoreResult<Vec<QuizResult>> {
        let query = match filter {
            ResultFilter::All => {
                let sql = format!("SELECT {RESULT_COLUMNS} FROM results");
                sqlx::query_as::<_, ResultRow>(&sql).fetch_all(&self.pool).await
            }
            ResultFilter::Quiz(quiz_id) => {
                let sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE quiz_id = $1");
                sqlx::query_as::<_, ResultRow>(&sql)
                    .bind(quiz_id)
                    .fetch_all(&self.pool)
                    .await
            }
            ResultFilter::Student(name) => {
                let sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE student_name = $1");
                sqlx::query_as::<_, ResultRow>(&sql)
                    .bind(name)
                    .fetch_all(&self.pool)
                    .await
            }
        };

        Ok(query
            .map_err(|e| {
                tracing::error!("Failed to list results: {:?}", e);
                AppError::from(e)
            })?
            .into_iter()
            .map(QuizResult::from)
            .collect())
    }

    async fn delete_result(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM results WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_results(&self) -> StoreResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM results")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
