//! Vault-relative note paths.
//!
//! A stream's note for a date always lives at
//! `normalize(folder)/YYYY-MM-DD.md`, or with the `.mdenc` extension when
//! it is held by the encryption collaborator. Paths use `/` separators
//! regardless of platform.

use crate::constants::{DATE_FORMAT_ISO, ENCRYPTED_NOTE_FILE_EXTENSION, NOTE_FILE_EXTENSION};
use crate::settings::Stream;
use chrono::NaiveDate;

/// Storage flavour of a note file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    Plain,
    Encrypted,
}

impl NoteKind {
    pub fn extension(&self) -> &'static str {
        match self {
            NoteKind::Plain => NOTE_FILE_EXTENSION,
            NoteKind::Encrypted => ENCRYPTED_NOTE_FILE_EXTENSION,
        }
    }
}

/// Normalizes a folder setting into a vault-relative path.
///
/// Backslashes become `/`, non-breaking spaces become plain spaces, empty
/// and `.` segments are dropped, and leading/trailing slashes are removed.
/// The vault root normalizes to the empty string.
///
/// ```
/// use streams::paths::normalize_folder;
///
/// assert_eq!(normalize_folder("/Journal//Work/"), "Journal/Work");
/// assert_eq!(normalize_folder(r"Journal\Work"), "Journal/Work");
/// assert_eq!(normalize_folder("./"), "");
/// ```
pub fn normalize_folder(folder: &str) -> String {
    folder
        .trim()
        .replace(['\u{00A0}', '\u{202F}'], " ")
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// File name of the note for `date`.
pub fn note_file_name(date: NaiveDate, kind: NoteKind) -> String {
    format!("{}{}", date.format(DATE_FORMAT_ISO), kind.extension())
}

/// Path of a note inside `folder`, which is normalized first.
pub fn note_path_in(folder: &str, date: NaiveDate, kind: NoteKind) -> String {
    let folder = normalize_folder(folder);
    let file_name = note_file_name(date, kind);
    if folder.is_empty() {
        file_name
    } else {
        format!("{}/{}", folder, file_name)
    }
}

/// Plain note path for `stream` on `date`.
///
/// ```
/// use streams::paths::note_path;
/// use streams::settings::Stream;
/// use chrono::NaiveDate;
///
/// let stream = Stream::new("Work", "/Journal/Work/");
/// let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(note_path(&stream, date), "Journal/Work/2024-03-05.md");
/// ```
pub fn note_path(stream: &Stream, date: NaiveDate) -> String {
    note_path_in(&stream.folder, date, NoteKind::Plain)
}

/// Encrypted sibling of [`note_path`].
pub fn encrypted_note_path(stream: &Stream, date: NaiveDate) -> String {
    note_path_in(&stream.folder, date, NoteKind::Encrypted)
}

/// Swaps a note path's extension for the other kind's.
pub fn with_kind(path: &str, kind: NoteKind) -> Option<String> {
    let (_, current) = parse_note_path(path)?;
    let stem = path.strip_suffix(current.extension())?;
    Some(format!("{}{}", stem, kind.extension()))
}

/// Parses a note file name (`YYYY-MM-DD.md` / `.mdenc`).
///
/// Only the zero-padded form [`note_path`] produces is accepted.
pub fn parse_note_file_name(file_name: &str) -> Option<(NaiveDate, NoteKind)> {
    let (stem, kind) = if let Some(stem) = file_name.strip_suffix(ENCRYPTED_NOTE_FILE_EXTENSION) {
        (stem, NoteKind::Encrypted)
    } else if let Some(stem) = file_name.strip_suffix(NOTE_FILE_EXTENSION) {
        (stem, NoteKind::Plain)
    } else {
        return None;
    };
    let date = NaiveDate::parse_from_str(stem, DATE_FORMAT_ISO).ok()?;
    (date.format(DATE_FORMAT_ISO).to_string() == stem).then_some((date, kind))
}

/// Parses the file-name part of a vault-relative note path.
pub fn parse_note_path(path: &str) -> Option<(NaiveDate, NoteKind)> {
    let file_name = path.rsplit(['/', '\\']).next()?;
    parse_note_file_name(file_name)
}

/// Finds the stream whose folder directly contains `path`.
///
/// The path must be a dated note. When stream folders overlap, the stream
/// listed first wins.
pub fn stream_for_path<'a>(streams: &'a [Stream], path: &str) -> Option<&'a Stream> {
    parse_note_path(path)?;
    let normalized = normalize_folder(path);
    let parent = match normalized.rfind('/') {
        Some(idx) => &normalized[..idx],
        None => "",
    };
    streams
        .iter()
        .find(|stream| normalize_folder(&stream.folder) == parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_note_path_is_folder_slash_iso_date_md() {
        let cases = [
            ("Daily", "Daily/2024-01-15.md"),
            ("/Daily/", "Daily/2024-01-15.md"),
            ("Journal//Daily", "Journal/Daily/2024-01-15.md"),
            (r"Journal\Daily", "Journal/Daily/2024-01-15.md"),
            ("  Journal/./Daily ", "Journal/Daily/2024-01-15.md"),
        ];
        for (folder, expected) in cases {
            let stream = Stream::new("s", folder);
            assert_eq!(
                note_path(&stream, date(2024, 1, 15)),
                expected,
                "folder {:?}",
                folder
            );
        }
    }

    #[test]
    fn test_note_path_is_deterministic() {
        let stream = Stream::new("s", "Notes");
        let d = date(1999, 12, 31);
        assert_eq!(note_path(&stream, d), note_path(&stream, d));
        assert_eq!(
            note_path(&stream, d),
            format!("{}/{}{}", normalize_folder(&stream.folder), "1999-12-31", ".md")
        );
    }

    #[test]
    fn test_root_folder_has_no_leading_slash() {
        let stream = Stream::new("root", "/");
        assert_eq!(note_path(&stream, date(2024, 1, 15)), "2024-01-15.md");
    }

    #[test]
    fn test_encrypted_sibling() {
        let stream = Stream::new("s", "Private");
        assert_eq!(
            encrypted_note_path(&stream, date(2024, 1, 15)),
            "Private/2024-01-15.mdenc"
        );
        assert_eq!(
            with_kind("Private/2024-01-15.md", NoteKind::Encrypted).unwrap(),
            "Private/2024-01-15.mdenc"
        );
        assert_eq!(
            with_kind("Private/2024-01-15.mdenc", NoteKind::Plain).unwrap(),
            "Private/2024-01-15.md"
        );
    }

    #[test]
    fn test_parse_note_file_name() {
        assert_eq!(
            parse_note_file_name("2024-01-15.md"),
            Some((date(2024, 1, 15), NoteKind::Plain))
        );
        assert_eq!(
            parse_note_file_name("2024-01-15.mdenc"),
            Some((date(2024, 1, 15), NoteKind::Encrypted))
        );
        assert_eq!(parse_note_file_name("2024-13-01.md"), None);
        assert_eq!(parse_note_file_name("2024-1-5.md"), None);
        assert_eq!(parse_note_file_name("2024-01-5.mdenc"), None);
        assert_eq!(parse_note_file_name("notes.md"), None);
        assert_eq!(parse_note_file_name("2024-01-15.txt"), None);
    }

    #[test]
    fn test_stream_for_path() {
        let streams = vec![Stream::new("Work", "Journal/Work"), Stream::new("Home", "Home")];
        assert_eq!(
            stream_for_path(&streams, "Journal/Work/2024-01-15.md").map(|s| s.name.as_str()),
            Some("Work")
        );
        assert_eq!(
            stream_for_path(&streams, "Home/2024-01-15.mdenc").map(|s| s.name.as_str()),
            Some("Home")
        );
        assert!(stream_for_path(&streams, "Journal/2024-01-15.md").is_none());
        assert!(stream_for_path(&streams, "Home/readme.md").is_none());
    }
}
