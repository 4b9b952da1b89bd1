use actix_web::{HttpResponse, Responder, http::header, web};
use tracing::{error, info};

use crate::{
    domain::{
        AppState, reader,
        reader::{RosterStudent, format_percentage},
    },
    error::AppError,
};

const HEADER: [&str; 6] = [
    "Student ID",
    "Name",
    "Total Classes",
    "Present Count",
    "Absent Count",
    "Attendance Percentage",
];

/// Renders the roster in the same order the classroom detail lists it.
pub fn render_csv(students: &[RosterStudent]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let write = |writer: &mut csv::Writer<Vec<u8>>| -> csv::Result<()> {
        writer.write_record(HEADER)?;
        for s in students {
            writer.write_record([
                s.id.to_string(),
                s.name.clone(),
                s.total_classes.to_string(),
                s.present_count.to_string(),
                s.absent_count.to_string(),
                format_percentage(s.attendance_percentage),
            ])?;
        }
        writer.flush()?;
        Ok(())
    };

    write(&mut writer).map_err(|e| {
        error!(error = %e, "Failed to write CSV row");
        AppError::Internal("Failed to write CSV data")
    })?;

    writer.into_inner().map_err(|e| {
        error!(error = %e, "Failed to flush CSV writer");
        AppError::Internal("Failed to write CSV data")
    })
}

/// Download a classroom's attendance report
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/export",
    params(
        ("id" = u64, Path, description = "Classroom ID")
    ),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 500, description = "Failed to fetch student data")
    ),
    tag = "Classroom"
)]
pub async fn export_attendance(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let classroom_id = path.into_inner();

    let students = reader::roster(&state, classroom_id).await?;
    let body = render_csv(&students)?;

    info!(classroom_id, rows = students.len(), "Attendance exported");
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=attendance_report.csv",
        ))
        .body(body))
}
