use actix_web::web;

use crate::handlers::documents;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/documents")
            .route("", web::post().to(documents::upload_documents))
            .route("/{id}", web::get().to(documents::download_document)),
    );
}
