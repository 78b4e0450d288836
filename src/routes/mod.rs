pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::me)
            .service(auth::request_password_reset)
            .service(auth::apply_password_reset),
    )
    .service(
        web::scope("/users")
            .service(users::update_name)
            .service(users::confirm_password)
            .service(users::update_password)
            .service(users::statistics)
            .service(users::upload_avatar_url)
            .service(users::delete_avatar)
            .service(users::delete_account),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
