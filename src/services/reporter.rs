// src/services/reporter.rs

//! Read-side views over recorded results. Joins are best-effort.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        quiz::QuizSummary,
        result::{QuizResult, ResultDetail, ResultView},
        user::UserSummary,
    },
    services::server::resolve_in_order,
    store::{ResultFilter, Store},
    utils::id::parse_id,
};

/// Most recent attempt first.
pub fn sort_newest_first(results: &mut [QuizResult]) {
    results.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
}

/// Leaderboard order: higher score first, ties go to the most recent attempt.
pub fn rank_by_score(results: &mut [QuizResult]) {
    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.attempted_at.cmp(&a.attempted_at))
    });
}

fn unique<T: Copy + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}

/// Attaches quiz and user summaries. Missing documents leave the field empty.
async fn join<S>(store: &S, results: Vec<QuizResult>) -> Result<Vec<ResultView>, AppError>
where
    S: Store + ?Sized,
{
    let quiz_ids = unique(results.iter().map(|r| r.quiz_id));
    let user_ids = unique(results.iter().filter_map(|r| r.user_id));

    let quizzes: HashMap<Uuid, QuizSummary> = store
        .find_quizzes(&quiz_ids)
        .await?
        .iter()
        .map(|q| (q.id, QuizSummary::from(q)))
        .collect();
    let users: HashMap<Uuid, UserSummary> = store
        .find_users(&user_ids)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    Ok(results
        .into_iter()
        .map(|result| ResultView {
            quiz: quizzes.get(&result.quiz_id).cloned(),
            user: result.user_id.and_then(|id| users.get(&id).cloned()),
            result,
        })
        .collect())
}

/// Every result, newest first.
pub async fn list_results<S>(store: &S) -> Result<Vec<ResultView>, AppError>
where
    S: Store + ?Sized,
{
    let mut results = store.list_results(&ResultFilter::All).await?;
    sort_newest_first(&mut results);
    join(store, results).await
}

/// Results of one quiz, ranked by score then recency.
pub async fn list_results_by_quiz<S>(store: &S, raw_quiz_id: &str) -> Result<Vec<ResultView>, AppError>
where
    S: Store + ?Sized,
{
    let quiz_id = parse_id(raw_quiz_id, "quiz")?;
    let mut results = store.list_results(&ResultFilter::Quiz(quiz_id)).await?;
    rank_by_score(&mut results);
    join(store, results).await
}

/// Attempt history of one respondent, newest first. Empty when there is none.
pub async fn list_results_by_respondent<S>(store: &S, name: &str) -> Result<Vec<ResultView>, AppError>
where
    S: Store + ?Sized,
{
    let mut results = store
        .list_results(&ResultFilter::Student(name.trim().to_string()))
        .await?;
    sort_newest_first(&mut results);
    join(store, results).await
}

/// One attempt with its snapshot and the questions re-resolved in stored order.
pub async fn get_result_detail<S>(store: &S, raw_id: &str) -> Result<ResultDetail, AppError>
where
    S: Store + ?Sized,
{
    let id = parse_id(raw_id, "result")?;
    let result = store
        .find_result(id)
        .await?
        .ok_or(AppError::NotFound("No details found for this attempt".to_string()))?;

    let order: Vec<Uuid> = result
        .question_order
        .iter()
        .filter_map(|raw| Uuid::parse_str(raw.trim()).ok())
        .collect();
    let found = store.find_questions(&order).await?;
    let questions = resolve_in_order(&order, found);

    let view = join(store, vec![result])
        .await?
        .pop()
        .ok_or(AppError::InternalServerError("Result join lost the result".to_string()))?;

    Ok(ResultDetail { view, questions })
}

pub async fn delete_result<S>(store: &S, raw_id: &str) -> Result<(), AppError>
where
    S: Store + ?Sized,
{
    let id = parse_id(raw_id, "result")?;
    if !store.delete_result(id).await? {
        return Err(AppError::NotFound("Result not found".to_string()));
    }
    tracing::info!(result_id = %id, "Result deleted");
    Ok(())
}
