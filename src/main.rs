use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use chrono::Duration;
use sqlx::PgPool;

use tasknest::auth::{AuthMiddleware, TokenIssuer};
use tasknest::config::Config;
use tasknest::mailer::{LogMailer, ResetDelivery, SmtpMailer};
use tasknest::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // All signing state lives here; there is no ambient secret.
    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        Duration::hours(config.token_ttl_hours),
        Duration::minutes(config.reset_ttl_minutes),
    );

    let mailer: Arc<dyn ResetDelivery> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp).expect("Failed to build SMTP transport")),
        None => {
            log::warn!("SMTP not configured; password-reset links will only be logged");
            Arc::new(LogMailer)
        }
    };

    let bind_addr = (config.server_host.clone(), config.server_port);
    log::info!("Starting tasknest server at {}", config.server_url());

    let tokens = web::Data::new(tokens);
    let mailer = web::Data::from(mailer);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(tokens.clone())
            .app_data(mailer.clone())
            .app_data(config.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
