use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthHelper;
use crate::configuration::AuthSettings;
use crate::logger::LoggerMiddleware;
use crate::middleware::Authenticate;
use crate::routes::{credentials_json_config, current_user, health_check, login, refresh, register};
use crate::users::UserStore;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
    auth_settings: AuthSettings,
) -> Result<Server, std::io::Error> {
    let helper = web::Data::new(AuthHelper::new(auth_settings, store));

    let server = HttpServer::new(move || {
        App::new()
            // Innermost first: identity is attached before the loggers see the response
            .wrap(Authenticate::new(helper.clone()))
            .wrap(LoggerMiddleware)
            .wrap(Logger::default())
            .app_data(helper.clone())
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .service(
                web::resource("/auth/login")
                    .app_data(credentials_json_config())
                    .route(web::post().to(login)),
            )
            .service(
                web::resource("/auth/refresh")
                    .app_data(credentials_json_config())
                    .route(web::post().to(refresh)),
            )
            .route("/auth/me", web::get().to(current_user))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
