use std::sync::Arc;

use actix_web::{test, web, App};
use chrono::Duration;
use dotenv::dotenv;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use tasknest::auth::{AuthMiddleware, AuthResponse, TokenIssuer};
use tasknest::config::Config;
use tasknest::mailer::{LogMailer, ResetDelivery};
use tasknest::models::{Task, TaskPage, TaskStats};
use tasknest::routes;

const TEST_SECRET: &str = "integration-test-secret";

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_hours: 48,
        reset_ttl_minutes: 30,
        bcrypt_cost: 4,
        uploads_dir: "uploads".to_string(),
        app_base_url: "http://127.0.0.1:8080".to_string(),
        smtp: None,
    }
}

fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(TEST_SECRET, Duration::hours(48), Duration::minutes(30))
}

async fn connect() -> PgPool {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

macro_rules! test_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(token_issuer()))
                .app_data(web::Data::from(Arc::new(LogMailer) as Arc<dyn ResetDelivery>))
                .app_data(web::Data::new(test_config()))
                .service(routes::health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                ),
        )
        .await
    };
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    prefix: &str,
) -> AuthResponse {
    let email = format!("{}-{}@example.com", prefix, Uuid::new_v4());
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": email, "name": "Task Tester", "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "registration failed");
    test::read_body_json(resp).await
}

async fn create_task(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    token: &str,
    payload: serde_json::Value,
) -> Task {
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(token))
        .set_json(payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "task creation failed");
    test::read_body_json(resp).await
}

async fn delete_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    auth: &AuthResponse,
) {
    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", auth.user.id))
        .insert_header(bearer(&auth.token))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200, "cleanup delete failed");
}

#[ignore = "requires a running Postgres; set DATABASE_URL"]
#[actix_rt::test]
async fn test_ownership_invariant() {
    let pool = connect().await;
    let app = test_app!(pool);

    let owner = register_user(&app, "it-owner").await;
    let intruder = register_user(&app, "it-intruder").await;

    let task = create_task(
        &app,
        &owner.token,
        json!({
            "title": "Private task",
            "subtitle": "Owner only",
            "description": "Must not be touched by anyone else."
        }),
    )
    .await;

    // A non-owner's update is Forbidden...
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(&intruder.token))
        .set_json(json!({
            "title": "Hijacked",
            "subtitle": "x",
            "description": "x"
        }))
        .to_request();
    let update_resp = test::call_service(&app, req).await;
    assert_eq!(update_resp.status(), 403);
    let update_body = test::read_body(update_resp).await;

    // ...and so is a delete.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(&intruder.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // A task that never existed produces the identical error shape, so a
    // non-owner cannot distinguish absent from not-owned.
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", Uuid::new_v4()))
        .insert_header(bearer(&intruder.token))
        .set_json(json!({
            "title": "Hijacked",
            "subtitle": "x",
            "description": "x"
        }))
        .to_request();
    let absent_resp = test::call_service(&app, req).await;
    assert_eq!(absent_resp.status(), 403);
    assert_eq!(update_body, test::read_body(absent_resp).await);

    // The task is unchanged.
    let req = test::TestRequest::get()
        .uri("/api/tasks?search=Private")
        .insert_header(bearer(&owner.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.total_count, 1);
    assert_eq!(page.tasks[0].title, "Private task");

    delete_user(&app, &owner).await;
    delete_user(&app, &intruder).await;
}

#[ignore = "requires a running Postgres; set DATABASE_URL"]
#[actix_rt::test]
async fn test_pagination_filters_and_sorting() {
    let pool = connect().await;
    let app = test_app!(pool);

    let user = register_user(&app, "it-pages").await;

    // 13 tasks: 5 completed, 8 active; 3 titles carry a search marker.
    for i in 1..=13 {
        let title = if i <= 3 {
            format!("groceries run {:02}", i)
        } else {
            format!("errand {:02}", i)
        };
        create_task(
            &app,
            &user.token,
            json!({
                "title": title,
                "subtitle": "subtitle",
                "description": "description",
                "completed": i <= 5
            }),
        )
        .await;
    }

    // 13 tasks, limit 6: page 1 has 6 tasks, 3 pages in total.
    let req = test::TestRequest::get()
        .uri("/api/tasks?limit=6&page=1")
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.total_count, 13);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page_count, 6);

    // Page 3 holds the remainder.
    let req = test::TestRequest::get()
        .uri("/api/tasks?limit=6&page=3")
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.page_count, 1);

    // Past the end: empty result, not an error.
    let req = test::TestRequest::get()
        .uri("/api/tasks?limit=6&page=4")
        .insert_header(bearer(&user.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let page: TaskPage = test::read_body_json(resp).await;
    assert_eq!(page.page_count, 0);
    assert_eq!(page.total_pages, 3);

    // Bogus limit and page fall back to the defaults.
    let req = test::TestRequest::get()
        .uri("/api/tasks?limit=0&page=-2")
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.page_count, 6);

    // An absurdly large page number is still the empty-page contract, not
    // an overflow or a server error.
    let req = test::TestRequest::get()
        .uri("/api/tasks?page=9223372036854775807")
        .insert_header(bearer(&user.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let page: TaskPage = test::read_body_json(resp).await;
    assert_eq!(page.page_count, 0);
    assert_eq!(page.total_count, 13);

    // SQL wildcards in the search term match literally, not as patterns.
    let req = test::TestRequest::get()
        .uri("/api/tasks?search=%25")
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.total_count, 0);

    // tab=1: active only.
    let req = test::TestRequest::get()
        .uri("/api/tasks?tab=1&limit=20")
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.total_count, 8);
    assert!(page.tasks.iter().all(|t| !t.completed));

    // tab=2: completed only.
    let req = test::TestRequest::get()
        .uri("/api/tasks?tab=2&limit=20")
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.total_count, 5);
    assert!(page.tasks.iter().all(|t| t.completed));

    // Case-insensitive substring search on the title.
    let req = test::TestRequest::get()
        .uri("/api/tasks?search=GROCERIES")
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.total_count, 3);
    assert!(page.tasks.iter().all(|t| t.title.contains("groceries")));

    // Ascending title sort.
    let req = test::TestRequest::get()
        .uri("/api/tasks?sortField=title&sortOrder=1&limit=20")
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    let titles: Vec<_> = page.tasks.iter().map(|t| t.title.clone()).collect();
    let mut sorted = titles.clone();
    sorted.sort();
    assert_eq!(titles, sorted);

    delete_user(&app, &user).await;
}

#[ignore = "requires a running Postgres; set DATABASE_URL"]
#[actix_rt::test]
async fn test_task_round_trip() {
    let pool = connect().await;
    let app = test_app!(pool);

    let user = register_user(&app, "it-roundtrip").await;
    let marker = format!("roundtrip-{}", Uuid::new_v4());

    let created = create_task(
        &app,
        &user.token,
        json!({
            "title": marker,
            "subtitle": "A very particular subtitle",
            "description": "Every field must come back unchanged.",
            "deadline": "2030-06-15T12:00:00Z"
        }),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks?search={}", marker))
        .insert_header(bearer(&user.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.total_count, 1);

    let fetched = &page.tasks[0];
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.title, created.title);
    assert_eq!(fetched.subtitle, created.subtitle);
    assert_eq!(fetched.description, created.description);
    assert_eq!(fetched.deadline, created.deadline);
    assert!(!fetched.completed);

    delete_user(&app, &user).await;
}

#[ignore = "requires a running Postgres; set DATABASE_URL"]
#[actix_rt::test]
async fn test_cascade_delete_spares_other_accounts() {
    let pool = connect().await;
    let app = test_app!(pool);

    let doomed = register_user(&app, "it-doomed").await;
    let survivor = register_user(&app, "it-survivor").await;

    for i in 0..3 {
        create_task(
            &app,
            &doomed.token,
            json!({
                "title": format!("doomed {}", i),
                "subtitle": "s",
                "description": "d"
            }),
        )
        .await;
    }
    for i in 0..2 {
        create_task(
            &app,
            &survivor.token,
            json!({
                "title": format!("survivor {}", i),
                "subtitle": "s",
                "description": "d"
            }),
        )
        .await;
    }

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", doomed.user.id))
        .insert_header(bearer(&doomed.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["tasks_removed"], 3);

    // Exactly the doomed account's rows are gone.
    let leftovers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
        .bind(doomed.user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(leftovers, 0);

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&survivor.token))
        .to_request();
    let page: TaskPage = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(page.total_count, 2);

    delete_user(&app, &survivor).await;
}

#[ignore = "requires a running Postgres; set DATABASE_URL"]
#[actix_rt::test]
async fn test_statistics() {
    let pool = connect().await;
    let app = test_app!(pool);

    let user = register_user(&app, "it-stats").await;

    // 1 completed, 3 active of which 1 is overdue.
    create_task(
        &app,
        &user.token,
        json!({ "title": "done", "subtitle": "s", "description": "d", "completed": true }),
    )
    .await;
    create_task(
        &app,
        &user.token,
        json!({ "title": "open", "subtitle": "s", "description": "d" }),
    )
    .await;
    create_task(
        &app,
        &user.token,
        json!({
            "title": "overdue",
            "subtitle": "s",
            "description": "d",
            "deadline": "2020-01-01T00:00:00Z"
        }),
    )
    .await;
    create_task(
        &app,
        &user.token,
        json!({
            "title": "future",
            "subtitle": "s",
            "description": "d",
            "deadline": "2099-01-01T00:00:00Z"
        }),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/users/stats")
        .insert_header(bearer(&user.token))
        .to_request();
    let stats: TaskStats = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(stats.total, 4);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.active, 3);
    assert_eq!(stats.overdue, 1);

    delete_user(&app, &user).await;
}
