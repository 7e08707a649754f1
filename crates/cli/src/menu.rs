//! Menu choices and client-side input validation.

/// Highest workload the client will send.
pub const MAX_LEVEL: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    ReadDevice,
    InjectViaDevice,
    ReadWorkload,
    InjectViaAttribute,
    ReadResourceFactor,
    ReadCriticalAlerts,
    ViewLogs,
    Exit,
}

pub const MENU: &str = "\n--- Auto Monitor Client ---\n\
1. Read current status from the device\n\
2. Inject simulated workload (device write)\n\
3. Read current_workload attribute\n\
4. Inject simulated workload (attribute write)\n\
5. Read resource_factor attribute\n\
6. Read critical_alerts attribute\n\
7. View recent daemon logs\n\
0. Exit\n\
Enter choice: ";

pub fn parse_choice(line: &str) -> Option<Choice> {
    match line.trim() {
        "1" => Some(Choice::ReadDevice),
        "2" => Some(Choice::InjectViaDevice),
        "3" => Some(Choice::ReadWorkload),
        "4" => Some(Choice::InjectViaAttribute),
        "5" => Some(Choice::ReadResourceFactor),
        "6" => Some(Choice::ReadCriticalAlerts),
        "7" => Some(Choice::ViewLogs),
        "0" => Some(Choice::Exit),
        _ => None,
    }
}

/// Validate a workload typed by the user. Rejects anything that is not an
/// integer in `[0, MAX_LEVEL]` before it reaches the daemon.
pub fn parse_level(input: &str) -> Result<u64, String> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| format!("Invalid workload {trimmed:?}. Must be a number 0-{MAX_LEVEL}."))?;
    if !(0..=MAX_LEVEL).contains(&value) {
        return Err(format!("Invalid workload {value}. Must be 0-{MAX_LEVEL}."));
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn choices_map_to_menu_entries() {
        assert_eq!(parse_choice("1\n"), Some(Choice::ReadDevice));
        assert_eq!(parse_choice(" 4 "), Some(Choice::InjectViaAttribute));
        assert_eq!(parse_choice("0"), Some(Choice::Exit));
        assert_eq!(parse_choice("7"), Some(Choice::ViewLogs));
        assert_eq!(parse_choice("8"), None);
        assert_eq!(parse_choice("one"), None);
    }

    #[test]
    fn levels_in_range_are_accepted() {
        assert_eq!(parse_level("0"), Ok(0));
        assert_eq!(parse_level("85\n"), Ok(85));
        assert_eq!(parse_level("100"), Ok(100));
    }

    #[test]
    fn bad_levels_are_rejected_client_side() {
        assert_matches!(parse_level("101"), Err(_));
        assert_matches!(parse_level("-1"), Err(_));
        assert_matches!(parse_level("abc"), Err(_));
        assert_matches!(parse_level(""), Err(_));
    }
}
