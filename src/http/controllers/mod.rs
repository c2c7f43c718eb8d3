use actix_web::web;

pub mod auth;
pub mod channels;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth::login))
                    .route("/refresh", web::post().to(auth::refresh))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/channels")
                    .route("", web::get().to(channels::list))
                    .route("/{id}/messages", web::get().to(channels::messages)),
            ),
    );
}
