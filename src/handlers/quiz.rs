// src/handlers/quiz.rs

use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        attempt::{QuizLeaderboardEntry, SubmitQuizRequest, SubmittedAnswer},
        category::Difficulty,
        question::{AnswerEntry, AnswerOption, Question, QuestionWithAnswers},
        quiz::{CreateQuizRequest, QuizListParams, QuizSummary, UpdateQuizRequest},
        user::{LeaderboardEntry, ROLE_ADMIN, ROLE_MANAGEMENT},
    },
    utils::{
        jwt::{Claims, optional_claims},
        ranking::recompute_user_ranks,
    },
};

/// Points awarded per correct answer, by quiz difficulty label.
/// Unrecognized labels fall back to the Easy value.
fn points_per_correct(difficulty: &str) -> i64 {
    match difficulty {
        "Easy" => 10,
        "Medium" => 20,
        "Hard" => 30,
        _ => 10,
    }
}

/// Helper struct for fetching the quiz's answer key from the database.
#[derive(sqlx::FromRow)]
struct AnswerKeyRow {
    question_id: i64,
    answer_id: i64,
    is_correct: bool,
}

/// Per-question answer key: every option id, and the correct subset.
struct AnswerKey {
    options: HashSet<i64>,
    correct: HashSet<i64>,
}

/// Builds the per-question lookup once per submission, so correctness
/// checks are O(1) per answer rather than a query per answer.
fn build_answer_key(rows: &[AnswerKeyRow]) -> HashMap<i64, AnswerKey> {
    let mut key: HashMap<i64, AnswerKey> = HashMap::new();
    for row in rows {
        let entry = key.entry(row.question_id).or_insert_with(|| AnswerKey {
            options: HashSet::new(),
            correct: HashSet::new(),
        });
        entry.options.insert(row.answer_id);
        if row.is_correct {
            entry.correct.insert(row.answer_id);
        }
    }
    key
}

#[derive(Debug, PartialEq, Eq)]
struct ScoreOutcome {
    score: i64,
    correct: i64,
    incorrect: i64,
}

/// Scores a submission against the quiz's answer key.
///
/// Every submitted question must belong to the quiz and every submitted
/// answer must be one of that question's options; otherwise the whole
/// submission is rejected. Unsubmitted questions are neither penalized
/// nor counted, and an empty submission scores zero.
fn score_submission(
    submitted: &[SubmittedAnswer],
    key: &HashMap<i64, AnswerKey>,
    points_per_correct: i64,
) -> Result<ScoreOutcome, String> {
    let mut correct = 0i64;

    for answer in submitted {
        let question_key = key
            .get(&answer.question_id)
            .ok_or_else(|| format!("Question {} does not belong to this quiz", answer.question_id))?;

        if !question_key.options.contains(&answer.answer_id) {
            return Err(format!(
                "Answer {} does not belong to question {}",
                answer.answer_id, answer.question_id
            ));
        }

        if question_key.correct.contains(&answer.answer_id) {
            correct += 1;
        }
    }

    Ok(ScoreOutcome {
        score: correct * points_per_correct,
        correct,
        incorrect: submitted.len() as i64 - correct,
    })
}

/// Lists quizzes with pagination and optional category/difficulty/name
/// filters. Public; `user_has_liked` is populated when the caller sends a
/// valid bearer token.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    headers: HeaderMap,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * limit;
    let search = params.search.map(|s| format!("%{}%", s));

    let viewer_id = optional_claims(&headers, &config.jwt_secret)
        .and_then(|c| c.sub.parse::<i64>().ok())
        .unwrap_or(0);

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM quizzes q
        WHERE (? IS NULL OR q.category_id = ?)
          AND (? IS NULL OR q.difficulty_id = ?)
          AND (? IS NULL OR q.quiz_name LIKE ?)
        "#,
    )
    .bind(params.category_id)
    .bind(params.category_id)
    .bind(params.difficulty_id)
    .bind(params.difficulty_id)
    .bind(&search)
    .bind(&search)
    .fetch_one(&pool)
    .await?;

    let quizzes = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT q.quiz_id, q.quiz_name, q.question_count, q.duration,
               q.is_customizable, q.created_at,
               c.category_name, d.name AS difficulty, u.username AS creator,
               (SELECT COUNT(*) FROM quiz_likes l WHERE l.quiz_id = q.quiz_id) AS likes,
               EXISTS(
                   SELECT 1 FROM quiz_likes l
                   WHERE l.quiz_id = q.quiz_id AND l.user_id = ?
               ) AS user_has_liked
        FROM quizzes q
        JOIN categories c ON c.category_id = q.category_id
        JOIN difficulties d ON d.difficulty_id = q.difficulty_id
        JOIN users u ON u.user_id = q.user_id
        WHERE (? IS NULL OR q.category_id = ?)
          AND (? IS NULL OR q.difficulty_id = ?)
          AND (? IS NULL OR q.quiz_name LIKE ?)
        ORDER BY q.created_at DESC, q.quiz_id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(viewer_id)
    .bind(params.category_id)
    .bind(params.category_id)
    .bind(params.difficulty_id)
    .bind(params.difficulty_id)
    .bind(&search)
    .bind(&search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(json!({
        "data": quizzes,
        "total": total,
        "page": page,
        "totalPages": (total + limit - 1) / limit,
    })))
}

/// Creates a quiz together with its questions and answer options.
///
/// The quiz row, every question, every option and the category usage
/// counter are written inside one transaction: a failure anywhere leaves
/// no partial quiz behind.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let category: Option<(i64,)> =
        sqlx::query_as("SELECT category_id FROM categories WHERE category_id = ?")
            .bind(payload.category_id)
            .fetch_optional(&pool)
            .await?;
    if category.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let difficulty: Option<(i64,)> =
        sqlx::query_as("SELECT difficulty_id FROM difficulties WHERE difficulty_id = ?")
            .bind(payload.difficulty_id)
            .fetch_optional(&pool)
            .await?;
    if difficulty.is_none() {
        return Err(AppError::NotFound("Difficulty not found".to_string()));
    }

    let mut tx = pool.begin().await?;

    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes
        (quiz_name, user_id, category_id, difficulty_id, question_count, duration, is_customizable)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING quiz_id
        "#,
    )
    .bind(&payload.quiz_name)
    .bind(user_id)
    .bind(payload.category_id)
    .bind(payload.difficulty_id)
    .bind(payload.questions.len() as i64)
    .bind(payload.duration.unwrap_or(0))
    .bind(payload.is_customizable.unwrap_or(false))
    .fetch_one(&mut *tx)
    .await?;

    for (index, question) in payload.questions.iter().enumerate() {
        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (quiz_id, question_text, question_type, position, time_limit)
            VALUES (?, ?, ?, ?, ?)
            RETURNING question_id
            "#,
        )
        .bind(quiz_id)
        .bind(&question.question_text)
        .bind(&question.question_type)
        .bind(question.position.unwrap_or(index as i64 + 1))
        .bind(question.time_limit.unwrap_or(30))
        .fetch_one(&mut *tx)
        .await?;

        for answer in &question.answers {
            sqlx::query(
                "INSERT INTO answer_options (question_id, answer_text, is_correct) VALUES (?, ?, ?)",
            )
            .bind(question_id)
            .bind(&answer.answer_text)
            .bind(answer.is_correct)
            .execute(&mut *tx)
            .await?;
        }
    }

    sqlx::query("UPDATE categories SET times_chosen = times_chosen + 1 WHERE category_id = ?")
        .bind(payload.category_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit quiz creation: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"quiz_id": quiz_id})),
    ))
}

/// Lists the static difficulty lookup table.
pub async fn list_difficulties(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let difficulties = sqlx::query_as::<_, Difficulty>(
        "SELECT difficulty_id, name FROM difficulties ORDER BY difficulty_id ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(difficulties))
}

/// Retrieves a single quiz with its joined listing fields.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let viewer_id = optional_claims(&headers, &config.jwt_secret)
        .and_then(|c| c.sub.parse::<i64>().ok())
        .unwrap_or(0);

    let quiz = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT q.quiz_id, q.quiz_name, q.question_count, q.duration,
               q.is_customizable, q.created_at,
               c.category_name, d.name AS difficulty, u.username AS creator,
               (SELECT COUNT(*) FROM quiz_likes l WHERE l.quiz_id = q.quiz_id) AS likes,
               EXISTS(
                   SELECT 1 FROM quiz_likes l
                   WHERE l.quiz_id = q.quiz_id AND l.user_id = ?
               ) AS user_has_liked
        FROM quizzes q
        JOIN categories c ON c.category_id = q.category_id
        JOIN difficulties d ON d.difficulty_id = q.difficulty_id
        JOIN users u ON u.user_id = q.user_id
        WHERE q.quiz_id = ?
        "#,
    )
    .bind(viewer_id)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Updates quiz metadata by ID.
/// Allowed for the quiz owner and for staff.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM quizzes WHERE quiz_id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;

    let (owner_id,) = owner.ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let is_staff = claims.role_id == ROLE_ADMIN || claims.role_id == ROLE_MANAGEMENT;
    if owner_id != user_id && !is_staff {
        return Err(AppError::Forbidden(
            "You are not allowed to modify this quiz".to_string(),
        ));
    }

    if payload.quiz_name.is_none()
        && payload.category_id.is_none()
        && payload.difficulty_id.is_none()
        && payload.duration.is_none()
        && payload.is_customizable.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: sqlx::QueryBuilder<sqlx::Sqlite> =
        sqlx::QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(quiz_name) = payload.quiz_name {
        separated.push("quiz_name = ");
        separated.push_bind_unseparated(quiz_name);
    }

    if let Some(category_id) = payload.category_id {
        separated.push("category_id = ");
        separated.push_bind_unseparated(category_id);
    }

    if let Some(difficulty_id) = payload.difficulty_id {
        separated.push("difficulty_id = ");
        separated.push_bind_unseparated(difficulty_id);
    }

    if let Some(duration) = payload.duration {
        separated.push("duration = ");
        separated.push_bind_unseparated(duration);
    }

    if let Some(is_customizable) = payload.is_customizable {
        separated.push("is_customizable = ");
        separated.push_bind_unseparated(is_customizable);
    }

    builder.push(" WHERE quiz_id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(StatusCode::OK)
}

/// Deletes a quiz by ID. Questions, options, attempts, likes and logs go
/// with it via foreign key cascades.
/// Allowed for the quiz owner and for staff.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM quizzes WHERE quiz_id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;

    let (owner_id,) = owner.ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let is_staff = claims.role_id == ROLE_ADMIN || claims.role_id == ROLE_MANAGEMENT;
    if owner_id != user_id && !is_staff {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this quiz".to_string(),
        ));
    }

    sqlx::query("DELETE FROM quizzes WHERE quiz_id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a quiz's questions with their answer options, ordered by
/// position. Returns 204 when the quiz has no questions yet.
pub async fn list_quiz_questions(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let quiz: Option<(i64,)> = sqlx::query_as("SELECT quiz_id FROM quizzes WHERE quiz_id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if quiz.is_none() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT question_id, quiz_id, question_text, question_type, position, time_limit
        FROM questions
        WHERE quiz_id = ?
        ORDER BY position ASC, question_id ASC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    if questions.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let options = sqlx::query_as::<_, AnswerOption>(
        r#"
        SELECT a.answer_id, a.question_id, a.answer_text, a.is_correct
        FROM answer_options a
        JOIN questions q ON q.question_id = a.question_id
        WHERE q.quiz_id = ?
        ORDER BY a.answer_id ASC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let mut by_question: HashMap<i64, Vec<AnswerEntry>> = HashMap::new();
    for option in options {
        by_question
            .entry(option.question_id)
            .or_default()
            .push(AnswerEntry {
                answer_id: option.answer_id,
                answer_text: option.answer_text,
                is_correct: option.is_correct,
            });
    }

    let body: Vec<QuestionWithAnswers> = questions
        .into_iter()
        .map(|q| QuestionWithAnswers {
            answers: by_question.remove(&q.question_id).unwrap_or_default(),
            question_id: q.question_id,
            question_text: q.question_text,
            time_limit: q.time_limit,
            question_type: q.question_type,
        })
        .collect();

    Ok(Json(body).into_response())
}

/// Submits a user's answers for a quiz, scores them and records the
/// attempt.
///
/// * Each correct answer is worth the quiz difficulty's point value.
/// * Unknown question or answer ids reject the whole submission.
/// * Attempt header, per-answer rows, the user's score increment and the
///   audit log entry are committed atomically; ranks are recomputed right
///   after the commit.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz: Option<(i64, String, String)> = sqlx::query_as(
        r#"
        SELECT q.quiz_id, q.quiz_name, d.name
        FROM quizzes q
        JOIN difficulties d ON d.difficulty_id = q.difficulty_id
        WHERE q.quiz_id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    let (quiz_id, quiz_name, difficulty) =
        quiz.ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let points = points_per_correct(&difficulty);
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let mut tx = pool.begin().await?;

    // Answer key built once per submission, keyed by question id.
    let key_rows: Vec<AnswerKeyRow> = sqlx::query_as(
        r#"
        SELECT a.question_id, a.answer_id, a.is_correct
        FROM answer_options a
        JOIN questions qn ON qn.question_id = a.question_id
        WHERE qn.quiz_id = ?
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&mut *tx)
    .await?;

    let key = build_answer_key(&key_rows);

    let outcome =
        score_submission(&req.answers, &key, points).map_err(AppError::BadRequest)?;

    // Attempt header goes in first so the per-answer rows have a parent;
    // the final score is written once all of them are recorded.
    let attempt_id: i64 = sqlx::query_scalar(
        "INSERT INTO quiz_attempts (user_id, quiz_id, score) VALUES (?, ?, 0) RETURNING attempt_id",
    )
    .bind(user_id)
    .bind(quiz_id)
    .fetch_one(&mut *tx)
    .await?;

    for answer in &req.answers {
        let is_correct = key
            .get(&answer.question_id)
            .map(|k| k.correct.contains(&answer.answer_id))
            .unwrap_or(false);

        sqlx::query(
            r#"
            INSERT INTO attempt_answers (attempt_id, question_id, answer_id, is_correct, time_taken)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt_id)
        .bind(answer.question_id)
        .bind(answer.answer_id)
        .bind(is_correct)
        .bind(answer.time_taken)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "UPDATE quiz_attempts SET score = ?, finished_at = CURRENT_TIMESTAMP WHERE attempt_id = ?",
    )
    .bind(outcome.score)
    .bind(attempt_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET total_score = total_score + ? WHERE user_id = ?")
        .bind(outcome.score)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let action = format!(
        "{} finished quiz {} for {} points.",
        claims.username, quiz_name, outcome.score
    );
    sqlx::query("INSERT INTO logs (action_performer, action, user_id, quiz_id) VALUES (?, ?, ?, ?)")
        .bind(&claims.username)
        .bind(&action)
        .bind(user_id)
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit quiz submission: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // Derived state: recomputed from scratch, self-heals if interrupted.
    recompute_user_ranks(&pool).await?;

    let top10 = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT user_id, username, total_score, rank
        FROM users
        WHERE rank > 0
        ORDER BY rank ASC
        LIMIT 10
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let current_user = sqlx::query_as::<_, LeaderboardEntry>(
        "SELECT user_id, username, total_score, rank FROM users WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(json!({
        "message": "Quiz submitted successfully",
        "score": outcome.score,
        "correctAnswers": outcome.correct,
        "incorrectAnswers": outcome.incorrect,
        "leaderboard": top10,
        "currentUserStats": current_user,
    })))
}

/// Per-quiz leaderboard: attempts ranked live by a window function
/// (score descending, earliest finish first), top 10 plus the caller's
/// best attempt whenever they have one. Returns 204 when the quiz has no
/// attempts yet.
pub async fn quiz_leaderboard(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let quiz: Option<(i64,)> = sqlx::query_as("SELECT quiz_id FROM quizzes WHERE quiz_id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if quiz.is_none() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let top10 = sqlx::query_as::<_, QuizLeaderboardEntry>(
        r#"
        WITH ranked AS (
            SELECT a.user_id, u.username, a.score,
                   ROW_NUMBER() OVER (ORDER BY a.score DESC, a.finished_at ASC) AS rank
            FROM quiz_attempts a
            JOIN users u ON u.user_id = a.user_id
            WHERE a.quiz_id = ?
        )
        SELECT user_id, username, score, rank
        FROM ranked
        ORDER BY rank ASC
        LIMIT 10
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if top10.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    // Unlike the global projection, the caller's row is included even when
    // it already sits inside the top 10.
    let current_user = sqlx::query_as::<_, QuizLeaderboardEntry>(
        r#"
        WITH ranked AS (
            SELECT a.user_id, u.username, a.score,
                   ROW_NUMBER() OVER (ORDER BY a.score DESC, a.finished_at ASC) AS rank
            FROM quiz_attempts a
            JOIN users u ON u.user_id = a.user_id
            WHERE a.quiz_id = ?
        )
        SELECT user_id, username, score, rank
        FROM ranked
        WHERE user_id = ?
        ORDER BY rank ASC
        LIMIT 1
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(json!({
        "quiz_id": id,
        "top10": top10,
        "currentUser": current_user,
    }))
    .into_response())
}

/// Toggle Like on a quiz. The (user, quiz) pair is the primary key, so a
/// user can hold at most one like per quiz at any time.
pub async fn toggle_like(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz: Option<(i64,)> = sqlx::query_as("SELECT quiz_id FROM quizzes WHERE quiz_id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if quiz.is_none() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let mut tx = pool.begin().await?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM quiz_likes WHERE user_id = ? AND quiz_id = ?")
            .bind(user_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    let is_liked = existing.is_some();

    if is_liked {
        sqlx::query("DELETE FROM quiz_likes WHERE user_id = ? AND quiz_id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query("INSERT INTO quiz_likes (user_id, quiz_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint failed") {
                    // Concurrent request handled gracefully
                    return AppError::Conflict("Already liked".to_string());
                }
                AppError::InternalServerError(e.to_string())
            })?;
    }

    tx.commit().await?;

    Ok(Json(json!({ "liked": !is_liked })))
}
