use super::normalizer::normalize_student_id;
use crate::workflows::ingest::domain::StudentRecord;
use serde::{Deserialize, Deserializer};
use std::io::Read;

pub(crate) fn parse_students<R: Read>(reader: R) -> Result<Vec<StudentRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut students = Vec::new();

    for record in csv_reader.deserialize::<ClassListRow>() {
        let row = record?;
        students.push(StudentRecord {
            student_id: normalize_student_id(&row.uun),
            exam_number: row.exam_number,
            extra_time: row.extra_time,
        });
    }

    Ok(students)
}

#[derive(Debug, Deserialize)]
struct ClassListRow {
    #[serde(rename = "UUN")]
    uun: String,
    #[serde(rename = "Exam Number")]
    exam_number: String,
    #[serde(rename = "Extra Time", default, deserialize_with = "blank_as_zero")]
    extra_time: u32,
}

fn blank_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value.parse::<u32>().map_err(|_| {
            serde::de::Error::custom(format!(
                "extra time '{value}' is not a whole number of minutes"
            ))
        }),
    }
}
