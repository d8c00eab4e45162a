// src/services/bank.rs

//! Question bank administration: manual entry, edits and bulk import.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{
        ALL_CATEGORIES, Category, CategoryFilter, CreateQuestionRequest, ImportBatch, ImportRow,
        Question, QuestionSource, UpdateQuestionRequest, clean_options,
    },
    store::QuestionStore,
    utils::id::parse_id,
};

/// Outcome of a bulk import.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportReport {
    pub batch_id: Uuid,
    pub inserted: i64,
    pub skipped: i64,
}

/// Parses an optional category, defaulting to `general`.
fn parse_category(raw: Option<&str>) -> Result<Category, AppError> {
    match raw.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(Category::General),
        Some(c) => c
            .parse()
            .map_err(|bad| AppError::BadRequest(format!("Invalid category: {}", bad))),
    }
}

/// Category filter of the question listing. `all` or nothing lists everything.
pub fn listing_filter(raw: Option<&str>) -> Result<CategoryFilter, AppError> {
    match raw.map(|c| c.trim().to_lowercase()) {
        None => Ok(CategoryFilter::All),
        Some(c) if c.is_empty() || c == ALL_CATEGORIES => Ok(CategoryFilter::All),
        Some(c) => Ok(CategoryFilter::Only(vec![parse_category(Some(c.as_str()))?])),
    }
}

pub async fn list_questions<S>(store: &S, category: Option<&str>) -> Result<Vec<Question>, AppError>
where
    S: QuestionStore + ?Sized,
{
    let filter = listing_filter(category)?;
    store.list_questions(&filter).await
}

pub async fn create_question<S>(store: &S, req: CreateQuestionRequest) -> Result<Question, AppError>
where
    S: QuestionStore + ?Sized,
{
    req.validate()?;
    let category = parse_category(req.category.as_deref())?;

    let text = req.question.trim().to_string();
    if store.question_text_exists(&text).await? {
        return Err(AppError::Conflict("Question already exists".to_string()));
    }

    let now = Utc::now();
    let question = Question {
        id: Uuid::new_v4(),
        question: text,
        options: clean_options(&req.options),
        answer: req.answer.trim().to_string(),
        category,
        explanation: req.explanation.unwrap_or_default().trim().to_string(),
        source: QuestionSource::Manual,
        batch_id: None,
        created_at: now,
        updated_at: now,
    };

    let question = store.insert_question(question).await?;
    tracing::info!(question_id = %question.id, category = %question.category, "Question created");
    Ok(question)
}

/// Applies the supplied fields. Existing results keep their snapshots.
pub async fn update_question<S>(
    store: &S,
    raw_id: &str,
    req: UpdateQuestionRequest,
) -> Result<Question, AppError>
where
    S: QuestionStore + ?Sized,
{
    let id = parse_id(raw_id, "question")?;
    req.validate()?;

    let mut question = store
        .find_questions(&[id])
        .await?
        .pop()
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if let Some(text) = req.question {
        question.question = text.trim().to_string();
    }
    if let Some(options) = req.options {
        question.options = clean_options(&options);
    }
    if let Some(answer) = req.answer {
        question.answer = answer.trim().to_string();
    }
    if req.category.is_some() {
        question.category = parse_category(req.category.as_deref())?;
    }
    if let Some(explanation) = req.explanation {
        question.explanation = explanation.trim().to_string();
    }
    question.updated_at = Utc::now();

    if !store.update_question(&question).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(question)
}

pub async fn delete_question<S>(store: &S, raw_id: &str) -> Result<(), AppError>
where
    S: QuestionStore + ?Sized,
{
    let id = parse_id(raw_id, "question")?;
    if !store.delete_question(id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(())
}

pub async fn delete_all_questions<S>(store: &S) -> Result<u64, AppError>
where
    S: QuestionStore + ?Sized,
{
    let deleted = store.delete_all_questions().await?;
    tracing::warn!(deleted, "Question bank cleared");
    Ok(deleted)
}

/// Removes one import batch together with the questions it brought in.
pub async fn delete_batch<S>(store: &S, raw_id: &str) -> Result<u64, AppError>
where
    S: QuestionStore + ?Sized,
{
    let id = parse_id(raw_id, "batch")?;
    let deleted = store
        .delete_batch(id)
        .await?
        .ok_or(AppError::NotFound("Import batch not found".to_string()))?;
    tracing::info!(batch_id = %id, deleted, "Import batch deleted");
    Ok(deleted)
}

/// Turns an import row into a question, or `None` when the row is unusable.
fn question_from_row(row: &ImportRow, batch_id: Uuid) -> Option<Question> {
    let text = row.question.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let answer = row.answer.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
    let category = parse_category(row.category.as_deref()).ok()?;

    let options: Vec<String> = [&row.option1, &row.option2, &row.option3, &row.option4]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    let options = clean_options(&options);
    if options.len() < 2 {
        return None;
    }

    let now = Utc::now();
    Some(Question {
        id: Uuid::new_v4(),
        question: text.to_string(),
        options,
        answer: answer.to_string(),
        category,
        explanation: row.explanation.as_deref().unwrap_or_default().trim().to_string(),
        source: QuestionSource::Import,
        batch_id: Some(batch_id),
        created_at: now,
        updated_at: now,
    })
}

/// Imports rows one by one under a fresh batch. Invalid and duplicate rows are
/// counted as skipped; the import itself never fails on a bad row.
pub async fn import_questions<S>(
    store: &S,
    name: Option<String>,
    rows: &[ImportRow],
    uploaded_by: &str,
) -> Result<ImportReport, AppError>
where
    S: QuestionStore + ?Sized,
{
    let batch = ImportBatch {
        id: Uuid::new_v4(),
        original_name: name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "import".to_string()),
        uploaded_by: uploaded_by.to_string(),
        inserted: 0,
        skipped: 0,
        uploaded_at: Utc::now(),
    };
    let batch = store.insert_batch(batch).await?;

    let mut inserted = 0;
    let mut skipped = 0;
    for row in rows {
        let Some(question) = question_from_row(row, batch.id) else {
            skipped += 1;
            continue;
        };
        match store.insert_question(question).await {
            Ok(_) => inserted += 1,
            Err(AppError::Conflict(_)) => skipped += 1,
            Err(e) => return Err(e),
        }
    }

    store.update_batch_counts(batch.id, inserted, skipped).await?;
    tracing::info!(batch_id = %batch.id, inserted, skipped, "Questions imported");

    Ok(ImportReport {
        batch_id: batch.id,
        inserted,
        skipped,
    })
}
