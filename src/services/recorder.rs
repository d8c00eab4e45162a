// src/services/recorder.rs

//! Recording quiz attempts as immutable, self-contained snapshots.

use std::collections::HashMap;

use chrono::Utc;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        question::Question,
        result::{AnswerSnapshot, NO_EXPLANATION, QuizResult, RecordResultRequest, UNKNOWN_QUESTION},
    },
    store::{QuestionStore, ResultStore},
    utils::id::parse_id,
};

/// Who is submitting the attempt.
#[derive(Debug, Clone)]
pub struct Respondent {
    pub user_id: Option<Uuid>,
    /// Display name used when the request does not carry one.
    pub fallback_name: Option<String>,
}

/// Exact, case-sensitive comparison of trimmed texts.
pub fn is_correct(chosen: &str, answer: &str) -> bool {
    chosen.trim() == answer.trim()
}

/// One snapshot per submitted answer, in submission order.
/// Keys that resolve to no question produce an "unknown question" entry.
pub fn build_snapshots(
    answers: &IndexMap<String, String>,
    questions: &HashMap<Uuid, Question>,
) -> Vec<AnswerSnapshot> {
    answers
        .iter()
        .map(|(key, chosen)| {
            let question = Uuid::parse_str(key.trim())
                .ok()
                .and_then(|id| questions.get(&id));

            match question {
                Some(q) => AnswerSnapshot {
                    question_id: key.clone(),
                    question: q.question.clone(),
                    options: q.options.clone(),
                    correct_answer: q.answer.clone(),
                    explanation: if q.explanation.is_empty() {
                        NO_EXPLANATION.to_string()
                    } else {
                        q.explanation.clone()
                    },
                    chosen_answer: chosen.clone(),
                    correct: is_correct(chosen, &q.answer),
                },
                None => AnswerSnapshot {
                    question_id: key.clone(),
                    question: UNKNOWN_QUESTION.to_string(),
                    options: Vec::new(),
                    correct_answer: String::new(),
                    explanation: NO_EXPLANATION.to_string(),
                    chosen_answer: chosen.clone(),
                    correct: false,
                },
            }
        })
        .collect()
}

/// Scores a submission against the live question bank and stores the snapshot.
///
/// The client score/total are kept as given when present; the correct and
/// wrong counts are always recomputed here.
pub async fn record_result<S>(
    store: &S,
    req: RecordResultRequest,
    respondent: Respondent,
) -> Result<QuizResult, AppError>
where
    S: QuestionStore + ResultStore + ?Sized,
{
    let raw_quiz_id = req
        .quiz_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or(AppError::BadRequest("Quiz ID and answers are required".to_string()))?;
    let answers = req
        .answers
        .ok_or(AppError::BadRequest("Quiz ID and answers are required".to_string()))?;
    let quiz_id = parse_id(raw_quiz_id, "quiz")?;

    let student_name = req
        .student_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .or(respondent.fallback_name)
        .ok_or(AppError::BadRequest("Student name is required".to_string()))?;

    let ids: Vec<Uuid> = answers
        .keys()
        .filter_map(|key| Uuid::parse_str(key.trim()).ok())
        .collect();
    let questions: HashMap<Uuid, Question> = store
        .find_questions(&ids)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    let snapshots = build_snapshots(&answers, &questions);

    let correct_answers = snapshots.iter().filter(|s| s.correct).count() as i64;
    let wrong_answers = snapshots.len() as i64 - correct_answers;
    let unknown = answers.len().saturating_sub(questions.len());
    if unknown > 0 {
        tracing::warn!(%quiz_id, unknown, "Submission references unknown questions");
    }

    let question_order = req
        .question_order
        .filter(|order| !order.is_empty())
        .unwrap_or_else(|| answers.keys().cloned().collect());

    let result = QuizResult {
        id: Uuid::new_v4(),
        quiz_id,
        user_id: respondent.user_id,
        student_name,
        score: req.score.unwrap_or(correct_answers),
        total_questions: req.total.unwrap_or(snapshots.len() as i64),
        correct_answers,
        wrong_answers,
        answers: snapshots,
        question_order,
        time_taken: req.time_taken.unwrap_or(0).max(0),
        attempted_at: Utc::now(),
    };

    let result = store.insert_result(result).await?;

    tracing::info!(
        result_id = %result.id,
        %quiz_id,
        student = %result.student_name,
        score = result.score,
        total = result.total_questions,
        "Result recorded"
    );

    Ok(result)
}
