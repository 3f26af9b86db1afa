use crate::seed::{SeedFuture, Seeder};
use crate::seeds::actors_with_role;
use db::models::course;
use db::models::user::Role;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use services::AppError;
use services::course_service::{CourseFields, CourseService, CourseWrite};
use services::tree;

pub struct CourseSeeder;

struct SampleCourse {
    title: &'static str,
    code: &'static str,
    category: &'static str,
    approve: bool,
}

const COURSES: [SampleCourse; 3] = [
    SampleCourse {
        title: "Algebra I",
        code: "MATH101",
        category: "Mathematics",
        approve: true,
    },
    SampleCourse {
        title: "Intro to Programming",
        code: "CS101",
        category: "Computer Science",
        approve: true,
    },
    SampleCourse {
        title: "Databases",
        code: "CS220",
        category: "Computer Science",
        approve: false,
    },
];

fn sample_tree(code: &str) -> Value {
    json!([
        {
            "title": "Foundations",
            "description": format!("Getting started with {code}"),
            "order": 1,
            "lessons": [
                { "title": "Welcome", "content": "Course overview.", "order": 1 },
                {
                    "title": "Core ideas",
                    "content": "The concepts the rest of the course builds on.",
                    "order": 2,
                    "has_activity": true,
                    "activities": [
                        {
                            "title": "Warm-up exercise",
                            "activity_type": "assignment",
                            "instructions": "Answer the questions in your own words.",
                            "max_score": 10,
                            "due_date": "2030-01-01T00:00:00Z"
                        }
                    ]
                }
            ]
        },
        {
            "title": "Practice",
            "order": 2,
            "lessons": [
                { "title": "Worked examples", "order": 1, "has_quiz": true }
            ]
        }
    ])
}

impl Seeder for CourseSeeder {
    fn seed<'a>(&'a self, db: &'a DatabaseConnection) -> SeedFuture<'a> {
        Box::pin(async move {
            let admin = actors_with_role(db, Role::Admin).await?.into_iter().next();
            let instructors = actors_with_role(db, Role::Instructor).await?;
            if instructors.is_empty() {
                return Err(AppError::not_found("Instructor"));
            }

            for (i, sample) in COURSES.iter().enumerate() {
                if course::Model::find_by_code(db, sample.code).await?.is_some() {
                    continue;
                }
                let owner = &instructors[i % instructors.len()];
                let write = CourseWrite {
                    fields: CourseFields {
                        title: Some(sample.title.to_string()),
                        code: Some(sample.code.to_string()),
                        description: Some(format!("{} for beginners.", sample.title)),
                        category: Some(sample.category.to_string()),
                    },
                    modules: Some(tree::parse_modules(&sample_tree(sample.code))?),
                    ..Default::default()
                };
                let view = CourseService::create(db, Some(owner), write).await?;
                CourseService::submit_for_review(db, Some(owner), view.id).await?;

                if let (true, Some(admin)) = (sample.approve, admin.as_ref()) {
                    CourseService::approve(db, Some(admin), view.id).await?;
                }
                log::debug!("Created course {} ({})", view.code, view.slug);
            }

            Ok(())
        })
    }
}
