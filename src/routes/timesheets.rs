use actix_web::web;

use crate::handlers::timesheets;

const MONTH: &str = r"/{year:\d+}/{month:\d+}";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/timesheets")
            .route("/periods", web::get().to(timesheets::get_periods))
            .route(MONTH, web::get().to(timesheets::get_timesheet))
            .route(
                &format!("{}/preview", MONTH),
                web::post().to(timesheets::preview),
            )
            .route(
                &format!("{}/bulk", MONTH),
                web::post().to(timesheets::bulk_edit),
            )
            .route(
                &format!("{}/entries", MONTH),
                web::post().to(timesheets::commit_entries),
            )
            .route(
                &format!("{}/submit", MONTH),
                web::post().to(timesheets::submit),
            )
            .route("/{id}/decision", web::post().to(timesheets::decide))
            .route("/{id}/approvals", web::get().to(timesheets::get_approvals)),
    )
    .route("/presets", web::get().to(timesheets::get_presets));
}
