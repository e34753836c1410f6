/// Marker letter every university user name starts with.
pub(crate) const STUDENT_ID_MARKER: char = 'S';

pub(crate) fn normalize_student_id(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let upper = cleaned.trim().to_ascii_uppercase();
    if upper.starts_with(STUDENT_ID_MARKER) {
        upper
    } else {
        format!("{STUDENT_ID_MARKER}{upper}")
    }
}
