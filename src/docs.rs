use crate::api::{attendance::MeetLink, class::ClassListResponse};
use crate::domain::reader::{ClassroomDetail, RosterStudent, StudentProgress};
use crate::model::{
    attendance::AttendanceStatus,
    class::Class,
    classroom::Classroom,
    enrollment::Enrollment,
    student::{Location, Student},
};
use crate::models::{AttendanceReq, ClassReq, ClassroomReq, JoinReq, RegisterReq};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Classroom Attendance API",
        version = "1.0.0",
        description = r#"
## Classroom Attendance Service

Teachers create classrooms and schedule classes; students register once, receive a
six-digit token and use it to enroll and mark attendance.

### Key Features
- **Registration**: issues a unique six-digit token per student
- **Enrollment**: open until the classroom's first class starts
- **Attendance**: one mark per student and class, re-marking replaces the earlier one
- **Reports**: per-classroom roster with percentages, per-student progress and CSV export

### Response Format
Every JSON response is wrapped as `{"status", "message", "data"}`. `data` is omitted on errors.
"#,
    ),
    paths(
        crate::api::health::health,

        crate::api::student::register_student,
        crate::api::student::get_student,
        crate::api::student::student_classrooms,

        crate::api::classroom::create_classroom,
        crate::api::classroom::list_classrooms,
        crate::api::classroom::classroom_detail,
        crate::api::classroom::join_classroom,

        crate::api::class::create_class,
        crate::api::class::list_classes,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::student_progress,
        crate::api::attendance::student_attendance,

        crate::api::export::export_attendance
    ),
    components(
        schemas(
            RegisterReq,
            JoinReq,
            ClassroomReq,
            ClassReq,
            AttendanceReq,
            AttendanceStatus,
            Location,
            Student,
            Classroom,
            Class,
            ClassListResponse,
            Enrollment,
            MeetLink,
            RosterStudent,
            ClassroomDetail,
            StudentProgress
        )
    ),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Student", description = "Student registration and lookup"),
        (name = "Classroom", description = "Classrooms, enrollment and reports"),
        (name = "Class", description = "Class scheduling"),
        (name = "Attendance", description = "Attendance marking and progress"),
    )
)]
pub struct ApiDoc;
