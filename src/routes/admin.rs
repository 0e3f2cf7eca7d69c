use actix_web::web;

use crate::handlers::admin;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/timesheets")
            .route(
                r"/{employee_id}/{year:\d+}/{month:\d+}/entries",
                web::post().to(admin::commit_entries),
            )
            .route("/{id}/audit", web::get().to(admin::get_audit_trail)),
    );
}
