// HTTP request handlers for API endpoints

use crate::api::models::*;
use crate::catalog::{self, CatalogClient, CatalogSources};
use crate::database_ops::db::Db;
use crate::database_ops::games::{GameSearch, GameStore, NewGame};
use actix_web::{web, HttpResponse};
use tracing::{error, info};

/// Outbound side of the catalog import, shared across workers.
#[derive(Debug, Clone)]
pub struct CatalogImport {
    pub client: CatalogClient,
    pub sources: CatalogSources,
}

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> HttpResponse {
    let database = if db.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/games
pub async fn list_games(db: web::Data<Db>) -> HttpResponse {
    match db.list().await {
        Ok(games) => HttpResponse::Ok().json(games),
        Err(e) => {
            error!(error = %format!("{e:#}"), "error querying games");
            HttpResponse::InternalServerError().json(ErrorBody::new(e.to_string()))
        }
    }
}

/// POST /api/games
pub async fn create_game(payload: web::Json<NewGame>, db: web::Data<Db>) -> HttpResponse {
    match db.create(&payload).await {
        Ok(game) => {
            info!(id = game.id, name = %game.name, platform = %game.platform, "game created");
            HttpResponse::Ok().json(game)
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "error creating game");
            HttpResponse::BadRequest().json(ErrorBody::new(e.to_string()))
        }
    }
}

/// PUT /api/games/{id} - full replace
pub async fn update_game(
    path: web::Path<i64>,
    payload: web::Json<NewGame>,
    db: web::Data<Db>,
) -> HttpResponse {
    let id = path.into_inner();
    match db.get(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(id),
        Err(e) => {
            error!(id, error = %format!("{e:#}"), "error loading game for update");
            return HttpResponse::BadRequest().json(ErrorBody::new(e.to_string()));
        }
    }

    match db.update(id, &payload).await {
        Ok(game) => HttpResponse::Ok().json(game),
        Err(e) => {
            error!(id, error = %format!("{e:#}"), "error updating game");
            HttpResponse::BadRequest().json(ErrorBody::new(e.to_string()))
        }
    }
}

/// DELETE /api/games/{id} - hard delete
pub async fn delete_game(path: web::Path<i64>, db: web::Data<Db>) -> HttpResponse {
    let id = path.into_inner();
    match db.delete(id).await {
        Ok(true) => {
            info!(id, "game deleted");
            HttpResponse::Ok().json(DeletedResponse { id })
        }
        Ok(false) => not_found(id),
        Err(e) => {
            error!(id, error = %format!("{e:#}"), "error deleting game");
            HttpResponse::BadRequest().json(ErrorBody::new(e.to_string()))
        }
    }
}

/// POST /api/games/search
pub async fn search_games(payload: web::Json<GameSearch>, db: web::Data<Db>) -> HttpResponse {
    match db.search(&payload).await {
        Ok(games) => HttpResponse::Ok().json(games),
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to execute search on games");
            HttpResponse::InternalServerError()
                .json(ErrorBody::new("An error occurred during the search"))
        }
    }
}

/// POST /api/games/populate - import both remote catalogs
pub async fn populate_games(
    db: web::Data<Db>,
    import: web::Data<CatalogImport>,
) -> HttpResponse {
    match catalog::populate(&import.client, db.get_ref(), &import.sources).await {
        Ok(summary) => HttpResponse::Ok().json(PopulateResponse::from(&summary)),
        Err(e) => {
            error!(error = %e, "error populating the database");
            HttpResponse::InternalServerError().json(PopulateFailure::new(e.to_string()))
        }
    }
}

fn not_found(id: i64) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody::new(format!("game {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::configure_routes;
    use crate::api::static_files::StaticDir;
    use crate::catalog::test_support::serve_catalogs;
    use crate::database_ops::games::Game;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    fn import_for(base: &str) -> CatalogImport {
        CatalogImport {
            client: CatalogClient::new(5).unwrap(),
            sources: CatalogSources::new(
                &format!("{base}/android.json"),
                &format!("{base}/ios.json"),
            )
            .unwrap(),
        }
    }

    macro_rules! app {
        ($db:expr, $import:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($db.clone()))
                    .app_data(web::Data::new($import))
                    .app_data(web::Data::new(StaticDir(std::env::temp_dir().join(
                        format!("game-catalog-static-{}", uuid::Uuid::new_v4()),
                    ))))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn crud_round_trip() {
        let db = Db::in_memory().await.unwrap();
        let app = app!(db, import_for("http://127.0.0.1:9"));

        let req = test::TestRequest::post()
            .uri("/api/games")
            .set_json(json!({
                "name": "Foo",
                "platform": "ios",
                "publisherId": "pub-1",
                "isPublished": true
            }))
            .to_request();
        let created: Game = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created.name, "Foo");
        assert_eq!(created.app_version, "1.0");
        assert!(created.is_published);

        let req = test::TestRequest::get().uri("/api/games").to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["publisherId"], "pub-1");
        assert_eq!(listed[0]["isPublished"], true);
        assert!(listed[0]["storeId"].is_null());

        let req = test::TestRequest::put()
            .uri(&format!("/api/games/{}", created.id))
            .set_json(json!({"name": "Foo 2", "platform": "android", "appVersion": "2.0"}))
            .to_request();
        let updated: Game = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Foo 2");
        assert_eq!(updated.publisher_id, None);
        assert!(!updated.is_published);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/games/{}", created.id))
            .to_request();
        let deleted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(deleted, json!({"id": created.id}));
        assert!(db.list().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn missing_ids_and_bad_bodies_are_rejected() {
        let db = Db::in_memory().await.unwrap();
        let app = app!(db, import_for("http://127.0.0.1:9"));

        let req = test::TestRequest::delete().uri("/api/games/42").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri("/api/games/42")
            .set_json(json!({"name": "Foo", "platform": "ios"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/games")
            .set_json(json!({"platform": "ios"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn search_orders_by_name() {
        let db = Db::in_memory().await.unwrap();
        for (name, platform) in [("Zed", "ios"), ("Alpha", "ios"), ("Alpine", "android")] {
            db.create(&NewGame {
                publisher_id: None,
                name: name.into(),
                platform: platform.into(),
                store_id: None,
                bundle_id: None,
                app_version: "1.0".into(),
                is_published: false,
            })
            .await
            .unwrap();
        }
        let app = app!(db, import_for("http://127.0.0.1:9"));

        let req = test::TestRequest::post()
            .uri("/api/games/search")
            .set_json(json!({"name": "alp"}))
            .to_request();
        let hits: Vec<Game> = test::call_and_read_body_json(&app, req).await;
        let names: Vec<_> = hits.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Alpine"]);

        let req = test::TestRequest::post()
            .uri("/api/games/search")
            .set_json(json!({"name": " ", "platform": "ios"}))
            .to_request();
        let hits: Vec<Game> = test::call_and_read_body_json(&app, req).await;
        let names: Vec<_> = hits.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zed"]);
    }

    #[actix_web::test]
    async fn populate_reports_processed_count() {
        let base = serve_catalogs(
            (200, r#"[{"name":"Foo"}]"#),
            (200, r#"[{"name":"Bar","version":"2.0"}]"#),
        );
        let db = Db::in_memory().await.unwrap();
        let app = app!(db, import_for(&base));

        let req = test::TestRequest::post()
            .uri("/api/games/populate")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "Successfully processed 2 out of 2 games",
                "count": 2
            })
        );
        assert_eq!(db.list().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn populate_fetch_failure_is_a_server_error() {
        let base = serve_catalogs((500, "boom"), (200, r#"[{"name":"Bar"}]"#));
        let db = Db::in_memory().await.unwrap();
        let app = app!(db, import_for(&base));

        let req = test::TestRequest::post()
            .uri("/api/games/populate")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to populate database");
        assert!(body["details"].as_str().unwrap().contains("android"));
        assert!(db.list().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn health_reports_database() {
        let db = Db::in_memory().await.unwrap();
        let app = app!(db, import_for("http://127.0.0.1:9"));

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.database, "connected");
    }

    #[actix_web::test]
    async fn unknown_paths_fall_through_to_static_files() {
        let dir = std::env::temp_dir().join(format!("game-catalog-static-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>games</h1>").unwrap();

        let db = Db::in_memory().await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(import_for("http://127.0.0.1:9")))
                .app_data(web::Data::new(StaticDir(dir.clone())))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap().to_str().unwrap(),
            "text/html"
        );
        assert_eq!(test::read_body(resp).await, "<h1>games</h1>");

        let req = test::TestRequest::get().uri("/missing.js").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
