//! Personal-name transforms: "First Last" to "Last, First", last name, initials
//!
//! All three are suffix-aware: a trailing generational suffix (Jr, Sr) or
//! roman numeral (I to XI), with or without a period, stays attached to the
//! name instead of being mistaken for the surname.

const COMMON_SUFFIXES: &[&str] = &[
    "jr", "sr", "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi",
];

fn is_suffix(token: &str) -> bool {
    let bare = token.strip_suffix('.').unwrap_or(token).to_lowercase();
    COMMON_SUFFIXES.contains(&bare.as_str())
}

/// Reverse a "First Last" name to "Last, First"
///
/// ```
/// use cfix_tagger::text::reverse_name;
/// assert_eq!(reverse_name("John Smith Jr"), "Smith, John Jr");
/// assert_eq!(reverse_name("Sting"), "Sting");
/// ```
pub fn reverse_name(input: &str) -> String {
    let trimmed = input.trim();
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let n = parts.len();
    if n < 2 {
        return trimmed.to_string();
    }

    if is_suffix(parts[n - 1]) {
        if n == 2 {
            // "Smith Jr": nothing left to call a given name
            return trimmed.to_string();
        }
        format!("{}, {} {}", parts[n - 2], parts[..n - 2].join(" "), parts[n - 1])
    } else {
        format!("{}, {}", parts[n - 1], parts[..n - 1].join(" "))
    }
}

/// Last-name component of a "First Last" name
pub fn last_name(input: &str) -> String {
    reverse_name(input)
        .split_whitespace()
        .next()
        .map(|s| s.trim_end_matches(',').to_string())
        .unwrap_or_default()
}

/// Initials of the given names followed by the last name, lower-cased
///
/// "Johann Sebastian Bach" becomes "jsbach". A single-token name reduces to
/// its first character.
pub fn initials_name(input: &str) -> String {
    let trimmed = input.trim();
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let n = parts.len();

    let out = match n {
        0 => String::new(),
        1 => parts[0].chars().next().map(String::from).unwrap_or_default(),
        _ if is_suffix(parts[n - 1]) => {
            if n == 2 {
                trimmed.to_string()
            } else {
                let mut s = initials(&parts[..n - 2]);
                s.push_str(parts[n - 2]);
                s.push_str(parts[n - 1]);
                s
            }
        }
        _ => {
            let mut s = initials(&parts[..n - 1]);
            s.push_str(parts[n - 1]);
            s
        }
    };

    out.to_lowercase()
}

fn initials(given: &[&str]) -> String {
    given.iter().filter_map(|p| p.chars().next()).collect()
}
