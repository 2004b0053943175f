// API route configuration

use crate::api::{handlers, static_files};
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health_check))
                .route("/games", web::get().to(handlers::list_games))
                .route("/games", web::post().to(handlers::create_game))
                // Literal paths before `{id}` so they never parse as ids.
                .route("/games/search", web::post().to(handlers::search_games))
                .route("/games/populate", web::post().to(handlers::populate_games))
                .route("/games/{id}", web::put().to(handlers::update_game))
                .route("/games/{id}", web::delete().to(handlers::delete_game)),
        )
        .default_service(web::to(static_files::serve));
}
