use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthenticationGate;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    admin_greeting, get_current_user, health_check, login, logout, refresh, register,
    user_greeting,
};

pub fn run(listener: TcpListener, gate: AuthenticationGate) -> Result<Server, std::io::Error> {
    let issuer = gate.issuer().clone();
    let gate = web::Data::new(gate);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(gate.clone())

            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))

            // Protected routes (require a valid access token)
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(issuer.clone()))
                    .route("/me", web::get().to(get_current_user))
                    .route("/user", web::get().to(user_greeting))
                    .route("/admin", web::get().to(admin_greeting)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
