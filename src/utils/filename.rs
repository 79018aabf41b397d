// Helpers for turning untrusted upload names into safe on-disk and download names

use std::collections::HashSet;
use std::path::Path;

const MAX_NAME_CHARS: usize = 200;
const FALLBACK_NAME: &str = "document";

/// Reduce a client-supplied file name to a single safe path component.
///
/// Directory parts (either separator) and control characters are dropped.
/// Names that end up empty, `.` or `..` become `document`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// `report.docx` -> `report_converted.pdf`
pub fn converted_name(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string());
    format!("{}_converted.pdf", stem)
}

/// Makes archive entry names unique by numbering repeats: `a.pdf`, `a_2.pdf`, ...
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comparison is case-insensitive so bundles unpack cleanly on any filesystem.
    pub fn claim(&mut self, name: &str) -> String {
        let mut n = 1;
        let mut candidate = name.to_string();
        while !self.taken.insert(candidate.to_lowercase()) {
            n += 1;
            candidate = numbered(name, n);
        }
        candidate
    }
}

fn numbered(name: &str, n: usize) -> String {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}_{}.{}",
            stem.to_string_lossy(),
            n,
            ext.to_string_lossy()
        ),
        _ => format!("{}_{}", name, n),
    }
}

/// Build a `Content-Disposition: attachment` value with an ASCII fallback
/// and an RFC 5987 `filename*` for the exact UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
