mod normalizer;
mod parser;

use crate::workflows::ingest::domain::StudentRecord;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

pub(crate) use normalizer::normalize_student_id;

#[derive(Debug)]
pub enum RosterError {
    Io(std::io::Error),
    Csv(csv::Error),
    DuplicateStudent { student_id: String, row: usize },
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Io(err) => write!(f, "failed to read class list: {}", err),
            RosterError::Csv(err) => write!(f, "invalid class list CSV data: {}", err),
            RosterError::DuplicateStudent { student_id, row } => write!(
                f,
                "student {} appears more than once in the class list (again at data row {})",
                student_id, row
            ),
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterError::Io(err) => Some(err),
            RosterError::Csv(err) => Some(err),
            RosterError::DuplicateStudent { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Class list indexed by normalized student identifier. Iteration follows file order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<StudentRecord>,
    index: HashMap<String, usize>,
}

impl Roster {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RosterError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterError> {
        Self::from_students(parser::parse_students(reader)?)
    }

    pub fn from_students(students: Vec<StudentRecord>) -> Result<Self, RosterError> {
        let mut index = HashMap::with_capacity(students.len());
        for (position, student) in students.iter().enumerate() {
            if index.insert(student.student_id.clone(), position).is_some() {
                return Err(RosterError::DuplicateStudent {
                    student_id: student.student_id.clone(),
                    row: position + 1,
                });
            }
        }

        Ok(Self { students, index })
    }

    /// Look up a student; `student_id` is normalized first.
    pub fn get(&self, student_id: &str) -> Option<&StudentRecord> {
        self.index
            .get(&normalize_student_id(student_id))
            .map(|&position| &self.students[position])
    }

    pub fn students(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}
