pub mod activity;
pub mod course;
pub mod course_certificate;
pub mod course_instructor;
pub mod course_module;
pub mod course_student;
pub mod lesson;
pub mod lesson_progress;
pub mod submission;
pub mod user;

pub use activity::Entity as Activity;
pub use course::Entity as Course;
pub use course_certificate::Entity as CourseCertificate;
pub use course_instructor::Entity as CourseInstructor;
pub use course_module::Entity as CourseModule;
pub use course_student::Entity as CourseStudent;
pub use lesson::Entity as Lesson;
pub use lesson_progress::Entity as LessonProgress;
pub use submission::Entity as Submission;
pub use user::Entity as User;
