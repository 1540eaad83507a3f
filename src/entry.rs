use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::DateFormat;

/// One reported file, ready for a result list.
///
/// Metadata is read once, when the path is first reported. A path that has
/// vanished since the command printed it gets size 0 and no date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// Absolute path as printed by the command.
    pub path: PathBuf,

    /// Base name.
    pub name: String,

    /// Parent directory.
    pub folder: String,

    /// Coarse classification for choosing an icon.
    pub kind: HitKind,

    /// Mime type, e.g. `text/plain` or `inode/directory`.
    pub mime: String,

    /// Human description of the type.
    pub description: String,

    pub size: u64,

    /// `12.3 KB` and friends.
    pub readable_size: String,

    pub modified: Option<DateTime<Local>>,

    pub readable_date: String,
}

/// Icon classification of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Folder,
    Text,
    Image,
    Audio,
    Video,
    Archive,
    Other,
}

impl Hit {
    /// Stat `path` and render the display fields.
    pub fn from_path(path: &str, date_format: DateFormat) -> Self {
        let p = Path::new(path);
        let meta = std::fs::metadata(p).ok();

        let is_dir = meta.as_ref().is_some_and(|m| m.is_dir());
        let size = meta.as_ref().map(|m| m.len()).unwrap_or(0);
        let modified = meta
            .as_ref()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Local>::from);

        let (mime, kind, description) = if is_dir {
            ("inode/directory".to_string(), HitKind::Folder, "folder".to_string())
        } else {
            let mime = mime_guess::from_path(p).first_or_octet_stream();
            let kind = classify_mime(&mime);
            (mime.essence_str().to_string(), kind, describe_mime(&mime))
        };

        Self {
            name: crate::parser::base_name(path).to_string(),
            folder: p
                .parent()
                .map(|d| d.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: p.to_path_buf(),
            kind,
            mime,
            description,
            size,
            readable_size: format_size(size),
            readable_date: modified
                .map(|t| format_date(t, Local::now(), date_format))
                .unwrap_or_default(),
            modified,
        }
    }

    /// Negated size, so an ascending sort lists big files first.
    pub fn size_key(&self) -> i64 {
        -(self.size.min(i64::MAX as u64) as i64)
    }

    /// Negated mtime, so an ascending sort lists recent files first.
    pub fn date_key(&self) -> i64 {
        -self.modified.map(|t| t.timestamp()).unwrap_or(0)
    }
}

fn classify_mime(mime: &mime_guess::Mime) -> HitKind {
    match mime.type_().as_str() {
        "text" => HitKind::Text,
        "image" => HitKind::Image,
        "audio" => HitKind::Audio,
        "video" => HitKind::Video,
        "application" => match mime.subtype().as_str() {
            "zip" | "gzip" | "x-tar" | "x-bzip2" | "x-xz" | "x-7z-compressed" | "vnd.rar"
            | "x-rar-compressed" | "zstd" => HitKind::Archive,
            _ => HitKind::Other,
        },
        _ => HitKind::Other,
    }
}

fn describe_mime(mime: &mime_guess::Mime) -> String {
    match classify_mime(mime) {
        HitKind::Text => "text document".to_string(),
        HitKind::Image => "image".to_string(),
        HitKind::Audio => "audio".to_string(),
        HitKind::Video => "video".to_string(),
        HitKind::Archive => "archive".to_string(),
        HitKind::Folder | HitKind::Other => mime.essence_str().to_string(),
    }
}

/// Helper: format byte size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes == 1 {
        "1 byte".to_string()
    } else {
        format!("{} bytes", bytes)
    }
}

/// Render a modification time relative to `now`.
pub fn format_date(t: DateTime<Local>, now: DateTime<Local>, format: DateFormat) -> String {
    match format {
        DateFormat::Iso => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        DateFormat::Locale => t.format("%c").to_string(),
        DateFormat::Informal => {
            let days = now.date_naive().signed_duration_since(t.date_naive()).num_days();
            let clock = t.format("%-I:%M %p");
            match days {
                0 => format!("today at {clock}"),
                1 => format!("yesterday at {clock}"),
                2..=6 => format!("{} at {clock}", t.format("%A")),
                _ => t.format("%b %-d %Y").to_string(),
            }
        }
    }
}
