//! LIST response parser.
//!
//! Servers disagree wildly about listing formats, so parsing works off
//! an ordered table of line grammars — first match wins, and a line no
//! grammar recognises is dropped rather than failing the listing.
//! Covered formats:
//!
//! 1. Unix long format, owner+group names, `Mon DD YYYY` timestamp
//! 2. Unix long format, two numeric ids, `Mon DD YYYY` timestamp
//! 3. Unix long format, two numeric ids, `HH:MM` time-of-day
//! 4. Unix long format, owner+group names, `HH:MM` time-of-day
//! 5. Unix variant carrying two size fields
//! 6. DOS/IIS `MM-DD-YY HH:MM(AM|PM)` with `<DIR>` marker or size
//! 7. Compact numeric-size format without a permission block
//!
//! Every grammar exposes the named captures `dir`, `permission`,
//! `size`, `timestamp` and `name`; the name is the remainder of the
//! line and may contain spaces.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::ftp::types::{FtpDirectory, FtpEntry};

lazy_static! {
    /// Ordered line grammars; first match wins.
    static ref LINE_GRAMMARS: Vec<Regex> = vec![
        Regex::new(
            r"^(?P<dir>[-d])(?P<permission>(?:[-r][-w][-xs]){3})\s+\d+\s+\w+\s+\w+\s+(?P<size>\d+)\s+(?P<timestamp>\w+\s+\d+\s+\d{4})\s+(?P<name>.+)$"
        )
        .unwrap(),
        Regex::new(
            r"^(?P<dir>[-d])(?P<permission>(?:[-r][-w][-xs]){3})\s+\d+\s+\d+\s+(?P<size>\d+)\s+(?P<timestamp>\w+\s+\d+\s+\d{4})\s+(?P<name>.+)$"
        )
        .unwrap(),
        Regex::new(
            r"^(?P<dir>[-d])(?P<permission>(?:[-r][-w][-xs]){3})\s+\d+\s+\d+\s+(?P<size>\d+)\s+(?P<timestamp>\w+\s+\d+\s+\d{1,2}:\d{2})\s+(?P<name>.+)$"
        )
        .unwrap(),
        Regex::new(
            r"^(?P<dir>[-d])(?P<permission>(?:[-r][-w][-xs]){3})\s+\d+\s+\w+\s+\w+\s+(?P<size>\d+)\s+(?P<timestamp>\w+\s+\d+\s+\d{1,2}:\d{2})\s+(?P<name>.+)$"
        )
        .unwrap(),
        Regex::new(
            r"^(?P<dir>[-d])(?P<permission>(?:[-r][-w][-xs]){3})\s+(?P<size>\d+)\s+\w+\s\w+\s+(?P<size2>\d+)\s+(?P<timestamp>\w+\s+\d+\s+\d{2}:\d{2})\s+(?P<name>.+)$"
        )
        .unwrap(),
        Regex::new(
            r"^(?P<timestamp>\d{2}-\d{2}-\d{2}\s+\d{2}:\d{2}[AaPp][Mm])\s+(?:(?P<dir><\w+>)|(?P<size>\d+))\s+(?P<name>.+)$"
        )
        .unwrap(),
        Regex::new(
            r"^(?P<size>\d+)\s+\d+\s+(?P<timestamp>\w+\s+\d+\s+\d{1,2}:\d{2})\s+(?P<name>.+)$"
        )
        .unwrap(),
    ];
}

/// Parse a full multi-line listing body describing `dir_path`.
///
/// Blank lines and unrecognised lines are skipped; `.` and `..`
/// entries are filtered out.
pub fn parse_listing(raw: &str, dir_path: &str) -> Vec<FtpEntry> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| parse_line(line, dir_path))
        .filter(|e| e.name != "." && e.name != "..")
        .collect()
}

/// Parse a listing body into a tree, partitioning entries by kind.
pub fn parse_directory(raw: &str, dir_path: &str) -> FtpDirectory {
    let mut tree = FtpDirectory {
        path: dir_path.to_string(),
        ..FtpDirectory::default()
    };
    for entry in parse_listing(raw, dir_path) {
        if entry.is_directory {
            tree.directories.push(entry);
        } else {
            tree.files.push(entry);
        }
    }
    tree
}

fn parse_line(line: &str, dir_path: &str) -> Option<FtpEntry> {
    let caps = LINE_GRAMMARS.iter().find_map(|re| re.captures(line))?;

    let dir_token = caps.name("dir").map(|m| m.as_str()).unwrap_or("");
    let is_directory = !dir_token.is_empty() && dir_token != "-";

    let permissions = caps.name("permission").map(|m| m.as_str().to_string());
    let size = caps
        .name("size")
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0);
    let modified = caps
        .name("timestamp")
        .and_then(|m| parse_timestamp(m.as_str()));

    Some(FtpEntry {
        name: caps.name("name")?.as_str().to_string(),
        is_directory,
        permissions,
        size,
        modified,
        parent: dir_path.to_string(),
    })
}

// ─── Timestamps ──────────────────────────────────────────────────────

/// Parse a listing timestamp token, trying the known forms in order.
/// Total failure is `None` — the entry is still emitted without a
/// modification time.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let squeezed: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    // "Mon DD HH:MM" — current year implied
    if let Ok(dt) = NaiveDateTime::parse_from_str(
        &format!("{} {}", Utc::now().year(), squeezed),
        "%Y %b %d %H:%M",
    ) {
        return Some(Utc.from_utc_datetime(&dt));
    }

    // "Mon DD YYYY HH:MM"
    if let Ok(dt) = NaiveDateTime::parse_from_str(&squeezed, "%b %d %Y %H:%M") {
        return Some(Utc.from_utc_datetime(&dt));
    }

    // "MM-DD-YY HH:MMam/pm"
    if let Some(dt) = parse_dos_timestamp(&squeezed) {
        return Some(dt);
    }

    // Date-only fallback, e.g. "Nov 11 2021"
    if let Ok(date) = NaiveDate::parse_from_str(&squeezed, "%b %d %Y") {
        let dt = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&dt));
    }

    None
}

/// Two-digit years are mapped into 2000+; 12 hours are added for PM
/// times other than 12 o'clock.
fn parse_dos_timestamp(s: &str) -> Option<DateTime<Utc>> {
    lazy_static! {
        static ref DOS_TIME: Regex =
            Regex::new(r"^(\d{2})-(\d{2})-(\d{2}) (\d{1,2}):(\d{2})([AaPp][Mm])$").unwrap();
    }
    let caps = DOS_TIME.captures(s)?;

    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = 2000 + caps[3].parse::<i32>().ok()?;
    let mut hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;

    if caps[6].eq_ignore_ascii_case("pm") && hour != 12 {
        hour += 12;
    }

    let dt = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    Some(Utc.from_utc_datetime(&dt))
}
