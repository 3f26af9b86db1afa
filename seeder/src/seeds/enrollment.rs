use crate::seed::{SeedFuture, Seeder};
use crate::seeds::actors_with_role;
use db::models::course;
use db::models::user::Role;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use services::AppError;
use services::course_service::CourseService;
use services::progress_service::ProgressService;
use services::submission_service::{NewSubmission, SubmissionService};

/// Enrolls students in approved courses and records some progress and
/// submissions so that dashboards have something to show.
pub struct EnrollmentSeeder;

impl Seeder for EnrollmentSeeder {
    fn seed<'a>(&'a self, db: &'a DatabaseConnection) -> SeedFuture<'a> {
        Box::pin(async move {
            let students = actors_with_role(db, Role::Student).await?;
            let approved = course::Entity::find()
                .filter(course::Column::IsApproved.eq(true))
                .all(db)
                .await?;

            let mut rng = StdRng::from_entropy();
            for student in &students {
                for c in &approved {
                    if !rng.gen_bool(0.7) {
                        continue;
                    }
                    match CourseService::enroll(db, Some(student), c.id).await {
                        Ok(()) => {}
                        Err(AppError::Conflict(_)) => continue,
                        Err(e) => return Err(e),
                    }

                    let view = CourseService::get(db, Some(student), c.id).await?;
                    let lessons = view.modules.iter().flat_map(|m| m.lessons.iter());
                    for lesson in lessons {
                        if rng.gen_bool(0.5) {
                            ProgressService::record_completion(db, Some(student), lesson.lesson.id).await?;
                        }
                        for activity in &lesson.activities {
                            if !rng.gen_bool(0.5) {
                                continue;
                            }
                            let new = NewSubmission {
                                activity_id: activity.id,
                                text_response: "My answer.".to_string(),
                                ..Default::default()
                            };
                            match SubmissionService::create(db, Some(student), new).await {
                                Ok(_) | Err(AppError::Conflict(_)) => {}
                                Err(e) => return Err(e),
                            }
                        }
                    }
                }
            }

            Ok(())
        })
    }
}
