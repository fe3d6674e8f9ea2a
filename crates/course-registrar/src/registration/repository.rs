use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{Course, CourseCode, Role, StaffMember, Student, User, UserId};

/// Error enumeration for catalog and directory failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed store of course definitions.
pub trait CourseCatalog: Send + Sync {
    fn fetch(&self, code: &CourseCode) -> Result<Option<Course>, StoreError>;
    fn list(&self) -> Result<Vec<Course>, StoreError>;
    /// Rejects a course whose code is already present.
    fn insert(&self, course: Course) -> Result<Course, StoreError>;
    /// Replaces an existing course; `NotFound` when the code is unknown.
    fn update(&self, course: Course) -> Result<(), StoreError>;
    fn upsert(&self, course: Course) -> Result<(), StoreError>;
    fn remove(&self, code: &CourseCode) -> Result<bool, StoreError>;
    fn replace_all(&self, courses: Vec<Course>) -> Result<(), StoreError>;

    fn available(&self) -> Result<Vec<Course>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(Course::has_free_seat)
            .collect())
    }
}

/// Keyed store of student and staff accounts.
pub trait UserDirectory: Send + Sync {
    fn student(&self, id: &UserId) -> Result<Option<Student>, StoreError>;
    fn advisor(&self, id: &UserId) -> Result<Option<StaffMember>, StoreError>;
    fn administrator(&self, id: &UserId) -> Result<Option<StaffMember>, StoreError>;
    /// Rejects an id already registered under the same role.
    fn insert(&self, user: User) -> Result<User, StoreError>;
    fn update_student(&self, student: Student) -> Result<(), StoreError>;
    fn remove(&self, id: &UserId, role: Role) -> Result<bool, StoreError>;
    fn students(&self) -> Result<Vec<Student>, StoreError>;
    fn advisors(&self) -> Result<Vec<StaffMember>, StoreError>;
    fn administrators(&self) -> Result<Vec<StaffMember>, StoreError>;
    fn replace_all(
        &self,
        students: Vec<Student>,
        advisors: Vec<StaffMember>,
        administrators: Vec<StaffMember>,
    ) -> Result<(), StoreError>;

    /// Students are checked first, then advisors, then administrators.
    fn authenticate(&self, id: &UserId, credential: &str) -> Result<Option<User>, StoreError> {
        let candidates = [
            self.student(id)?.map(User::Student),
            self.advisor(id)?.map(User::Advisor),
            self.administrator(id)?.map(User::Administrator),
        ];

        Ok(candidates
            .into_iter()
            .flatten()
            .find(|user| user.credential() == credential))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
}

#[derive(Default, Clone)]
pub struct InMemoryCourseCatalog {
    courses: Arc<Mutex<BTreeMap<CourseCode, Course>>>,
}

impl InMemoryCourseCatalog {
    pub fn with_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        let courses = courses
            .into_iter()
            .map(|course| (course.code.clone(), course))
            .collect();
        Self {
            courses: Arc::new(Mutex::new(courses)),
        }
    }
}

impl CourseCatalog for InMemoryCourseCatalog {
    fn fetch(&self, code: &CourseCode) -> Result<Option<Course>, StoreError> {
        Ok(lock(&self.courses)?.get(code).cloned())
    }

    fn list(&self) -> Result<Vec<Course>, StoreError> {
        Ok(lock(&self.courses)?.values().cloned().collect())
    }

    fn insert(&self, course: Course) -> Result<Course, StoreError> {
        let mut guard = lock(&self.courses)?;
        if guard.contains_key(&course.code) {
            return Err(StoreError::Conflict);
        }
        guard.insert(course.code.clone(), course.clone());
        Ok(course)
    }

    fn update(&self, course: Course) -> Result<(), StoreError> {
        let mut guard = lock(&self.courses)?;
        match guard.get_mut(&course.code) {
            Some(existing) => {
                *existing = course;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn upsert(&self, course: Course) -> Result<(), StoreError> {
        lock(&self.courses)?.insert(course.code.clone(), course);
        Ok(())
    }

    fn remove(&self, code: &CourseCode) -> Result<bool, StoreError> {
        Ok(lock(&self.courses)?.remove(code).is_some())
    }

    fn replace_all(&self, courses: Vec<Course>) -> Result<(), StoreError> {
        let mut guard = lock(&self.courses)?;
        *guard = courses
            .into_iter()
            .map(|course| (course.code.clone(), course))
            .collect();
        Ok(())
    }
}

#[derive(Default)]
struct DirectoryState {
    students: BTreeMap<UserId, Student>,
    advisors: BTreeMap<UserId, StaffMember>,
    administrators: BTreeMap<UserId, StaffMember>,
}

#[derive(Default, Clone)]
pub struct InMemoryUserDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl InMemoryUserDirectory {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Result<Self, StoreError> {
        let directory = Self::default();
        for user in users {
            directory.insert(user)?;
        }
        Ok(directory)
    }
}

fn keyed<T>(records: Vec<T>, key: impl Fn(&T) -> UserId) -> BTreeMap<UserId, T> {
    records.into_iter().map(|record| (key(&record), record)).collect()
}

impl UserDirectory for InMemoryUserDirectory {
    fn student(&self, id: &UserId) -> Result<Option<Student>, StoreError> {
        Ok(lock(&self.state)?.students.get(id).cloned())
    }

    fn advisor(&self, id: &UserId) -> Result<Option<StaffMember>, StoreError> {
        Ok(lock(&self.state)?.advisors.get(id).cloned())
    }

    fn administrator(&self, id: &UserId) -> Result<Option<StaffMember>, StoreError> {
        Ok(lock(&self.state)?.administrators.get(id).cloned())
    }

    fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut guard = lock(&self.state)?;
        let taken = match &user {
            User::Student(student) => guard.students.contains_key(&student.id),
            User::Advisor(staff) => guard.advisors.contains_key(&staff.id),
            User::Administrator(staff) => guard.administrators.contains_key(&staff.id),
        };
        if taken {
            return Err(StoreError::Conflict);
        }

        match user.clone() {
            User::Student(student) => {
                guard.students.insert(student.id.clone(), student);
            }
            User::Advisor(staff) => {
                guard.advisors.insert(staff.id.clone(), staff);
            }
            User::Administrator(staff) => {
                guard.administrators.insert(staff.id.clone(), staff);
            }
        }
        Ok(user)
    }

    fn update_student(&self, student: Student) -> Result<(), StoreError> {
        let mut guard = lock(&self.state)?;
        match guard.students.get_mut(&student.id) {
            Some(existing) => {
                *existing = student;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn remove(&self, id: &UserId, role: Role) -> Result<bool, StoreError> {
        let mut guard = lock(&self.state)?;
        let removed = match role {
            Role::Student => guard.students.remove(id).is_some(),
            Role::Advisor => guard.advisors.remove(id).is_some(),
            Role::Administrator => guard.administrators.remove(id).is_some(),
        };
        Ok(removed)
    }

    fn students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(lock(&self.state)?.students.values().cloned().collect())
    }

    fn advisors(&self) -> Result<Vec<StaffMember>, StoreError> {
        Ok(lock(&self.state)?.advisors.values().cloned().collect())
    }

    fn administrators(&self) -> Result<Vec<StaffMember>, StoreError> {
        Ok(lock(&self.state)?.administrators.values().cloned().collect())
    }

    fn replace_all(
        &self,
        students: Vec<Student>,
        advisors: Vec<StaffMember>,
        administrators: Vec<StaffMember>,
    ) -> Result<(), StoreError> {
        let mut guard = lock(&self.state)?;
        *guard = DirectoryState {
            students: keyed(students, |student| student.id.clone()),
            advisors: keyed(advisors, |staff| staff.id.clone()),
            administrators: keyed(administrators, |staff| staff.id.clone()),
        };
        Ok(())
    }
}
