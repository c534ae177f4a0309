//! Parser for lines of a repository's `logs/HEAD` file.
//!
//! A line looks like
//!
//! ```text
//! <from> <to> <name> <<email>> <seconds>[ <offset>]\t<message>
//! ```
//!
//! Fields are located by scanning for their delimiters rather than by
//! splitting on whitespace, since names and messages may contain spaces.
//! The offset token is accepted but not applied: the resulting timestamp is
//! always `epoch + seconds`, viewed in the local time zone.

use crate::error::ParseError;
use crate::models::{Author, ReflogEntry};
use chrono::{Local, TimeZone};

pub fn parse(line: &str) -> Result<ReflogEntry, ParseError> {
    let end_from = find_from(line, ' ', 0)
        .ok_or_else(|| ParseError::MalformedLine("missing space after old commit".to_string()))?;
    let end_to = find_from(line, ' ', end_from + 1)
        .ok_or_else(|| ParseError::MalformedLine("missing space after new commit".to_string()))?;
    let end_author = find_from(line, '>', end_to + 1)
        .ok_or_else(|| ParseError::MalformedAuthor("missing '>' after address".to_string()))?;

    let author = parse_author(&line[end_to + 1..=end_author])?;

    // Skip the '>' and the single space that follows it.
    let start_time = end_author + 2;
    if start_time > line.len() {
        return Err(ParseError::MalformedLine(
            "line ends after author".to_string(),
        ));
    }

    let tab = find_from(line, '\t', start_time)
        .ok_or_else(|| ParseError::MalformedLine("missing tab before message".to_string()))?;
    let end_time = match find_from(line, ' ', start_time) {
        Some(space) if space < tab => space,
        _ => tab,
    };

    let raw_seconds = &line[start_time..end_time];
    let seconds: i64 = raw_seconds
        .parse()
        .map_err(|_| ParseError::InvalidTimestamp(raw_seconds.to_string()))?;
    let timestamp = Local
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| ParseError::InvalidTimestamp(raw_seconds.to_string()))?;

    Ok(ReflogEntry {
        commit_from: line[..end_from].to_string(),
        commit_to: line[end_from + 1..end_to].to_string(),
        author,
        timestamp,
        message: line[tab + 1..].to_string(),
    })
}

/// Parses every line of a log file. Each raw line is returned next to its
/// result so callers can report the lines that failed.
pub fn parse_log(content: &str) -> Vec<(String, Result<ReflogEntry, ParseError>)> {
    content
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| (line.to_string(), parse(line)))
        .collect()
}

fn parse_author(block: &str) -> Result<Author, ParseError> {
    let open = block
        .find('<')
        .ok_or_else(|| ParseError::MalformedAuthor(format!("missing '<' in {block:?}")))?;
    let close = block
        .rfind('>')
        .filter(|close| *close > open)
        .ok_or_else(|| ParseError::MalformedAuthor(format!("missing '>' in {block:?}")))?;

    let name = block[..open].trim();
    let name = name
        .strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name);

    Ok(Author {
        name: name.to_string(),
        email: block[open + 1..close].trim().to_string(),
    })
}

fn find_from(haystack: &str, needle: char, from: usize) -> Option<usize> {
    haystack
        .get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|idx| idx + from)
}
