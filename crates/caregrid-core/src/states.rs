//! US state name/abbreviation normalization.
//!
//! Stored rows and inbound filters use state names inconsistently ("NJ",
//! "New Jersey", "new-jersey"); queries must match any form against any other.

/// Both accepted forms of a recognized US state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateForms {
    pub name: &'static str,
    pub abbrev: &'static str,
}

const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Resolve any accepted input form — "NJ", "New Jersey", "new-jersey" — to
/// both canonical forms. Returns `None` for unrecognized input; callers fall
/// back to exact matching on the raw value.
#[must_use]
pub fn state_forms(input: &str) -> Option<StateForms> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.len() == 2 {
        let upper = trimmed.to_uppercase();
        if let Some(&(abbrev, name)) = STATES.iter().find(|(a, _)| *a == upper) {
            return Some(StateForms { name, abbrev });
        }
    }

    // Slug or full name: compare ignoring case with '-' treated as a space.
    let folded: String = trimmed
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();
    STATES
        .iter()
        .find(|(_, name)| name.to_lowercase() == folded)
        .map(|&(abbrev, name)| StateForms { name, abbrev })
}

/// Whether two state values refer to the same state, tolerating mixed forms.
/// Unrecognized values fall back to case-insensitive equality.
#[must_use]
pub fn same_state(a: &str, b: &str) -> bool {
    match (state_forms(a), state_forms(b)) {
        (Some(fa), Some(fb)) => fa.abbrev == fb.abbrev,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}
