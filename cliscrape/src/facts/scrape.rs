//! Line-oriented field extraction.
//!
//! Each extractor looks at the first line carrying its label and returns
//! `None` when the label never shows up.

use super::uptime::parse_uptime;
use crate::error::ParseError;

pub(super) const UPTIME_LABEL: &str = "System Up Time";
pub(super) const UPTIME_DELIMITER: &str = ":sec):";
pub(super) const HOSTNAME_LABEL: &str = "System Name:";
pub(super) const DESCRIPTION_LABEL: &str = "System Description";
pub(super) const SERIAL_DELIMITER: &str = ": ";
pub(super) const VERSION_LABEL: &str = "SW version";

fn labeled_line<'a>(raw: &'a str, label: &str) -> Option<&'a str> {
    raw.lines().find(|line| line.contains(label))
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// `System Up Time (days,hour:min:sec):  45,23:02:04` in seconds.
pub(super) fn uptime(raw_system: &str) -> Result<Option<i64>, ParseError> {
    let Some(line) = labeled_line(raw_system, UPTIME_LABEL) else {
        return Ok(None);
    };

    let (_, value) = line
        .split_once(UPTIME_DELIMITER)
        .ok_or(ParseError::MissingField {
            field: "uptime",
            delimiter: UPTIME_DELIMITER,
        })?;

    parse_uptime(value).map(Some)
}

/// `System Name:  switch1`
pub(super) fn hostname(raw_system: &str) -> Option<&str> {
    let line = labeled_line(raw_system, HOSTNAME_LABEL)?;
    let (_, value) = line.rsplit_once("Name:")?;
    non_empty(value)
}

/// First word of `System Description:  SG300-28 28-Port Gigabit ...`
pub(super) fn model(raw_system: &str) -> Option<&str> {
    let line = labeled_line(raw_system, DESCRIPTION_LABEL)?;
    let description = line.split(':').nth(1)?;
    description.split_whitespace().next()
}

/// Everything after the first `": "` of `show system id`, possibly empty.
///
/// `None` only when the delimiter is absent.
pub(super) fn serial_number(raw_system_id: &str) -> Option<&str> {
    let (_, serial) = raw_system_id.split_once(SERIAL_DELIMITER)?;
    Some(serial.trim())
}

/// `SW version    1.4.5.02 ( date ... )` without the build date.
pub(super) fn os_version(raw_version: &str) -> Option<&str> {
    let line = labeled_line(raw_version, VERSION_LABEL)?;
    let head = line.split(" (").next()?;
    let (_, version) = head.split_once("version")?;
    non_empty(version)
}
