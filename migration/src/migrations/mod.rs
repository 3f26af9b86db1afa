pub mod m202510010001_create_users;
pub mod m202510010002_create_courses;
pub mod m202510010003_create_course_instructors;
pub mod m202510010004_create_course_students;
pub mod m202510010005_create_course_modules;
pub mod m202510010006_create_lessons;
pub mod m202510010007_create_activities;
pub mod m202510010008_create_submissions;
pub mod m202510010009_create_lesson_progress;
pub mod m202510010010_create_course_certificates;
