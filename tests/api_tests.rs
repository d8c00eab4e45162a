// tests/api_tests.rs

use std::sync::Arc;

use chrono::Utc;
use quizbank::{
    config::Config,
    models::user::{Role, User},
    routes,
    state::AppState,
    store::{MemoryStore, UserStore},
    utils::hash::hash_password,
};
use serde_json::{Value, json};

const FACULTY_CODE: &str = "faculty-test-code";

struct TestApp {
    address: String,
    store: Arc<MemoryStore>,
    client: reqwest::Client,
}

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: None,
        admin_email: None,
        admin_password: None,
        faculty_code: Some(FACULTY_CODE.to_string()),
        port: 0,
    }
}

/// Helper function to spawn the app on a random port for testing.
/// The in-memory store is returned alongside so tests can seed it.
async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        config: test_config(),
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn register(&self, role: &str) -> String {
        let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123",
                "role": role,
                "faculty_code": FACULTY_CODE,
            }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    async fn admin_token(&self) -> String {
        self.store
            .insert_user(User {
                id: uuid::Uuid::new_v4(),
                username: "root".to_string(),
                email: "root@example.com".to_string(),
                password: hash_password("rootpass1").unwrap(),
                role: Role::Admin,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let body: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "login": "root", "password": "rootpass1" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn add_question(&self, token: &str, text: &str, category: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/questions"))
            .bearer_auth(token)
            .json(&json!({
                "question": text,
                "options": ["right", "wrong", "other"],
                "answer": "right",
                "category": category,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    async fn create_quiz(&self, token: &str, body: Value) -> Value {
        let response = self
            .client
            .post(self.url("/api/quizzes"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    async fn submit(&self, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/results"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: Option<&str>, path: &str) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;
    let response = app.get(None, "/random_path_that_does_not_exist").await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_then_login_by_username_or_email() {
    let app = spawn_app().await;
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{}@Example.com", username),
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"].get("password").is_none());

    for login in [username.clone(), format!("{}@example.com", username)] {
        let response = app
            .client
            .post(app.url("/api/auth/login"))
            .json(&json!({ "login": login, "password": "password123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "login": username, "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // Same username again
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "username": username,
            "email": "other@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn register_fails_validation_and_faculty_code_check() {
    let app = spawn_app().await;

    // Username too short
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": "yo", "email": "yo@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "validation_error");

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "username": "prof_x",
            "email": "prof@example.com",
            "password": "password123",
            "role": "faculty",
            "faculty_code": "guess"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn role_checks_guard_staff_routes() {
    let app = spawn_app().await;
    let student = app.register("student").await;

    let response = app
        .client
        .post(app.url("/api/quizzes"))
        .json(&json!({ "categories": ["logical"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .post(app.url("/api/quizzes"))
        .bearer_auth(&student)
        .json(&json!({ "categories": ["logical"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "forbidden");

    assert_eq!(app.get(Some(student.as_str()), "/api/results").await.status().as_u16(), 403);
    assert_eq!(app.get(Some(student.as_str()), "/api/questions").await.status().as_u16(), 403);
    assert_eq!(app.get(Some("garbage"), "/api/results/student/x").await.status().as_u16(), 401);
}

#[tokio::test]
async fn duplicate_question_text_is_a_conflict() {
    let app = spawn_app().await;
    let faculty = app.register("faculty").await;
    app.add_question(&faculty, "What is 2 + 2?", "numerical").await;

    let response = app
        .client
        .post(app.url("/api/questions"))
        .bearer_auth(&faculty)
        .json(&json!({
            "question": "What is 2 + 2?",
            "options": ["4", "5"],
            "answer": "4",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn quiz_is_clamped_and_served_without_answers() {
    let app = spawn_app().await;
    let faculty = app.register("faculty").await;
    for i in 0..10 {
        app.add_question(&faculty, &format!("Logic puzzle {}", i), "logical").await;
    }
    app.add_question(&faculty, "Synonym of big?", "verbal").await;

    let created = app
        .create_quiz(&faculty, json!({ "categories": [" Logical "], "count": 5000 }))
        .await;
    assert_eq!(created["num_questions"], 10);
    assert_eq!(created["categories"], json!(["Logical"]));
    assert_eq!(created["duration"], 600);

    let path = format!("/api/quizzes/{}", created["id"].as_str().unwrap());
    let first: Value = app.get(None, &path).await.json().await.unwrap();
    let second: Value = app.get(None, &path).await.json().await.unwrap();

    let ids = |quiz: &Value| {
        let mut ids: Vec<String> = quiz["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids
    };
    assert_eq!(ids(&first).len(), 10);
    assert_eq!(ids(&first), ids(&second));

    for q in first["questions"].as_array().unwrap() {
        assert!(q.get("answer").is_none());
        assert_eq!(q["category"], "logical");
    }
}

#[tokio::test]
async fn quiz_creation_errors() {
    let app = spawn_app().await;
    let faculty = app.register("faculty").await;
    app.add_question(&faculty, "Only verbal", "verbal").await;

    let response = app
        .client
        .post(app.url("/api/quizzes"))
        .bearer_auth(&faculty)
        .json(&json!({ "categories": ["verbal", "Tarot"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid categories: tarot");

    let response = app
        .client
        .post(app.url("/api/quizzes"))
        .bearer_auth(&faculty)
        .json(&json!({ "categories": ["spatial"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No questions available for chosen categories");

    let response = app.get(None, "/api/quizzes/not-an-id").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_id");

    let response = app
        .get(None, &format!("/api/quizzes/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn results_are_scored_ranked_and_frozen() {
    let app = spawn_app().await;
    let faculty = app.register("faculty").await;
    let student = app.register("student").await;

    let q1 = app.add_question(&faculty, "First question", "reasoning").await;
    let q2 = app.add_question(&faculty, "Second question", "reasoning").await;
    let q3 = app.add_question(&faculty, "Third question", "reasoning").await;
    let (id1, id2, id3) = (
        q1["id"].as_str().unwrap(),
        q2["id"].as_str().unwrap(),
        q3["id"].as_str().unwrap(),
    );

    let quiz = app
        .create_quiz(&faculty, json!({ "title": "Reasoning check", "categories": ["reasoning"] }))
        .await;
    let quiz_id = quiz["id"].as_str().unwrap();
    assert_eq!(quiz["title"], "Reasoning check");

    // asha: 2 right, 1 wrong
    let response = app
        .submit(
            &student,
            json!({
                "quiz_id": quiz_id,
                "student_name": "asha",
                "answers": { id1: "right", id2: " right ", id3: "wrong" },
                "time_taken": 95,
                "question_order": [id3, id1, id2],
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let asha: Value = response.json().await.unwrap();
    assert_eq!(asha["score"], 2);
    assert_eq!(asha["total_questions"], 3);
    assert_eq!(asha["correct_answers"], 2);
    assert_eq!(asha["wrong_answers"], 1);
    assert_eq!(asha["question_order"], json!([id3, id1, id2]));

    // bilal: all right
    let bilal: Value = app
        .submit(
            &student,
            json!({
                "quiz_id": quiz_id,
                "student_name": "bilal",
                "answers": { id1: "right", id2: "right", id3: "right" },
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(bilal["score"], 3);

    // chen: 2 right, submitted after asha
    let chen: Value = app
        .submit(
            &student,
            json!({
                "quiz_id": quiz_id,
                "student_name": "chen",
                "answers": { id1: "right", id2: "right", id3: "Right" },
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(chen["score"], 2);

    let board: Vec<Value> = app
        .get(Some(faculty.as_str()), &format!("/api/results/quiz/{}", quiz_id))
        .await
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = board.iter().map(|r| r["student_name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["bilal", "chen", "asha"]);
    assert_eq!(board[0]["quiz"]["title"], "Reasoning check");

    // Detail is stable, then survives edits of the live question
    let detail_path = format!("/api/results/{}", asha["id"].as_str().unwrap());
    let before: Value = app.get(Some(student.as_str()), &detail_path).await.json().await.unwrap();
    let again: Value = app.get(Some(student.as_str()), &detail_path).await.json().await.unwrap();
    assert_eq!(before, again);
    let order: Vec<&str> = before["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec![id3, id1, id2]);

    let response = app
        .client
        .put(app.url(&format!("/api/questions/{}", id1)))
        .bearer_auth(&faculty)
        .json(&json!({ "question": "First question, reworded", "answer": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let after: Value = app.get(Some(student.as_str()), &detail_path).await.json().await.unwrap();
    assert_eq!(after["answers"], before["answers"]);
    let first = after["answers"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["question_id"] == id1)
        .unwrap();
    assert_eq!(first["question"], "First question");
    assert_eq!(first["correct"], true);
    assert_eq!(after["score"], 2);

    let history: Vec<Value> = app
        .get(Some(student.as_str()), "/api/results/student/asha")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 1);

    let nobody: Vec<Value> = app
        .get(Some(student.as_str()), "/api/results/student/nobody")
        .await
        .json()
        .await
        .unwrap();
    assert!(nobody.is_empty());
}

#[tokio::test]
async fn submissions_are_validated_before_writing() {
    let app = spawn_app().await;
    let student = app.register("student").await;

    let response = app
        .submit(&student, json!({ "answers": { "x": "y" } }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    for malformed in [
        json!({ "quiz_id": 5, "answers": { "x": "y" } }),
        json!({ "quiz_id": uuid::Uuid::new_v4().to_string(), "answers": { "q": 1 } }),
    ] {
        let response = app.submit(&student, malformed).await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["kind"], "validation_error");
    }

    let response = app
        .client
        .post(app.url("/api/results"))
        .bearer_auth(&student)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "validation_error");

    let response = app
        .submit(&student, json!({ "quiz_id": "not-an-id", "answers": { "x": "y" } }))
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_id");

    let response = app
        .submit(
            &student,
            json!({ "quiz_id": uuid::Uuid::new_v4().to_string(), "answers": { "ghost": "y" } }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["answers"][0]["question"], "Unknown question");
    assert_eq!(body["correct_answers"], 0);
    assert!(body["student_name"].as_str().unwrap().starts_with("u_"));

    let response = app
        .get(Some(student.as_str()), &format!("/api/results/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn import_skips_invalid_and_duplicate_rows() {
    let app = spawn_app().await;
    let faculty = app.register("faculty").await;
    app.add_question(&faculty, "Existing", "general").await;

    let response = app
        .client
        .post(app.url("/api/questions/import"))
        .bearer_auth(&faculty)
        .json(&json!({
            "name": "week1.csv",
            "rows": [
                { "question": "Gear ratio?", "option1": "2:1", "option2": "1:2", "answer": "2:1", "category": "Mechanical" },
                { "question": "Existing", "option1": "a", "option2": "b", "answer": "a" },
                { "question": "No options", "option1": "a", "answer": "a" },
                { "question": "No answer", "option1": "a", "option2": "b" },
                { "question": "Bad category", "option1": "a", "option2": "b", "answer": "a", "category": "magic" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["inserted"], 1);
    assert_eq!(report["skipped"], 4);

    let batches: Vec<Value> = app
        .get(Some(faculty.as_str()), "/api/questions/batches")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0]["original_name"], "week1.csv");

    let mechanical: Vec<Value> = app
        .get(Some(faculty.as_str()), "/api/questions?category=mechanical")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(mechanical.len(), 1);
    assert_eq!(mechanical[0]["source"], "import");
}

#[tokio::test]
async fn demo_quiz_is_not_persisted() {
    let app = spawn_app().await;
    let faculty = app.register("faculty").await;
    for i in 0..3 {
        app.add_question(&faculty, &format!("Spatial {}", i), "spatial").await;
    }

    let demo: Value = app.get(None, "/api/quizzes/demo/spatial").await.json().await.unwrap();
    assert_eq!(demo["demo"], true);
    assert_eq!(demo["duration"], 300);
    assert_eq!(demo["questions"].as_array().unwrap().len(), 3);

    assert_eq!(app.get(None, "/api/quizzes/demo/verbal").await.status().as_u16(), 404);
    assert_eq!(app.get(None, "/api/quizzes/demo/tarot").await.status().as_u16(), 400);

    let quizzes: Vec<Value> = app.get(None, "/api/quizzes").await.json().await.unwrap();
    assert!(quizzes.is_empty());
}

#[tokio::test]
async fn admin_summary_and_user_management() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let faculty = app.register("faculty").await;
    app.register("student").await;

    let summary: Value = app.get(Some(admin.as_str()), "/api/admin/summary").await.json().await.unwrap();
    assert_eq!(summary["total_users"], 3);
    assert_eq!(summary["total_admins"], 1);
    assert_eq!(summary["total_faculties"], 1);
    assert_eq!(summary["total_students"], 1);
    assert_eq!(summary["total_quizzes"], 0);

    assert_eq!(app.get(Some(faculty.as_str()), "/api/admin/users").await.status().as_u16(), 403);

    let users: Vec<Value> = app.get(Some(admin.as_str()), "/api/admin/users").await.json().await.unwrap();
    let root = users.iter().find(|u| u["username"] == "root").unwrap();
    let student = users.iter().find(|u| u["role"] == "student").unwrap();

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/users/{}", root["id"].as_str().unwrap())))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/users/{}", student["id"].as_str().unwrap())))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    // Wiping the bank is admin only
    let response = app
        .client
        .delete(app.url("/api/questions"))
        .bearer_auth(&faculty)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .delete(app.url("/api/questions"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn profile_update_changes_email_and_password() {
    let app = spawn_app().await;
    let token = app.register("student").await;
    app.store
        .insert_user(User {
            id: uuid::Uuid::new_v4(),
            username: "taken".to_string(),
            email: "taken@example.com".to_string(),
            password: hash_password("password123").unwrap(),
            role: Role::Student,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let profile = |body: Value| {
        app.client
            .put(app.url("/api/auth/profile"))
            .bearer_auth(&token)
            .json(&body)
            .send()
    };

    let response = profile(json!({})).await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = profile(json!({ "email": "Fresh@Example.com", "password": "newpass99" }))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "fresh@example.com");
    let username = body["user"]["username"].as_str().unwrap().to_string();

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "login": username, "password": "newpass99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = profile(json!({ "email": "TAKEN@example.com" })).await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email already in use");

    let response = app
        .client
        .put(app.url("/api/auth/profile"))
        .json(&json!({ "password": "whatever1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn deleting_an_import_batch_removes_its_questions() {
    let app = spawn_app().await;
    let faculty = app.register("faculty").await;
    app.add_question(&faculty, "Kept by hand", "general").await;

    let report: Value = app
        .client
        .post(app.url("/api/questions/import"))
        .bearer_auth(&faculty)
        .json(&json!({
            "rows": [
                { "question": "Imported A", "option1": "a", "option2": "b", "answer": "a" },
                { "question": "Imported B", "option1": "a", "option2": "b", "answer": "b" }
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let path = format!("/api/questions/batches/{}", report["batch_id"].as_str().unwrap());

    let response = app.client.delete(app.url(&path)).bearer_auth(&faculty).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deleted"], 2);

    let questions: Vec<Value> = app
        .get(Some(faculty.as_str()), "/api/questions")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["question"], "Kept by hand");

    let batches: Vec<Value> = app
        .get(Some(faculty.as_str()), "/api/questions/batches")
        .await
        .json()
        .await
        .unwrap();
    assert!(batches.is_empty());

    let response = app.client.delete(app.url(&path)).bearer_auth(&faculty).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
