//! Joining a logs folder and a file name

use std::path::MAIN_SEPARATOR;

/// Join `folder` and `file_name` with exactly one separator
///
/// An empty side yields the other. When one side already contains the other
/// (`/logs/app.log` + `app.log`, or `/logs` + `/logs/app.log`) the longer one
/// is returned as-is instead of repeating the overlap.
pub fn path_string(folder: &str, file_name: &str) -> String {
    if folder.is_empty() {
        file_name.to_string()
    } else if file_name.is_empty() {
        folder.to_string()
    } else if folder.ends_with(file_name) {
        folder.to_string()
    } else if file_name.starts_with(folder) {
        file_name.to_string()
    } else {
        let folder_sep = folder.ends_with(MAIN_SEPARATOR);
        let file_sep = file_name.starts_with(MAIN_SEPARATOR);
        match (folder_sep, file_sep) {
            (true, true) => format!("{}{}", folder, &file_name[MAIN_SEPARATOR.len_utf8()..]),
            (true, false) | (false, true) => format!("{}{}", folder, file_name),
            (false, false) => format!("{}{}{}", folder, MAIN_SEPARATOR, file_name),
        }
    }
}
