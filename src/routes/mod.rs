use actix_web::web;

pub mod admin;
pub mod documents;
pub mod timesheets;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(timesheets::configure)
            .configure(admin::configure)
            .configure(documents::configure),
    );
}
