use std::collections::HashSet;

use super::super::domain::{Course, CourseCode, Student};
use super::super::repository::{CourseCatalog, StoreError};

/// Prerequisites of `course` the student has not completed, in declaration order.
pub fn missing_prerequisites(student: &Student, course: &Course) -> Vec<CourseCode> {
    course
        .prerequisites
        .iter()
        .filter(|code| !student.has_completed(code))
        .cloned()
        .collect()
}

pub fn has_completed_prerequisites(student: &Student, course: &Course) -> bool {
    course
        .prerequisites
        .iter()
        .all(|code| student.has_completed(code))
}

/// Depth-first walk of the prerequisite graph. Each direct prerequisite is emitted
/// before its own expansion; codes already in `visited` stop the walk, so cycles
/// terminate. Duplicates reached through different branches are kept.
pub(crate) fn expand<C>(
    catalog: &C,
    code: &CourseCode,
    visited: &mut HashSet<CourseCode>,
) -> Result<Vec<CourseCode>, StoreError>
where
    C: CourseCatalog + ?Sized,
{
    if !visited.insert(code.clone()) {
        return Ok(Vec::new());
    }

    let Some(course) = catalog.fetch(code)? else {
        return Ok(Vec::new());
    };

    let mut all = Vec::new();
    for prerequisite in course.prerequisites {
        let nested = expand(catalog, &prerequisite, visited)?;
        all.push(prerequisite);
        all.extend(nested);
    }
    Ok(all)
}
