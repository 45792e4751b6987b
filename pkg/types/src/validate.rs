use anyhow::{Result, bail};

/// Validate a resource or namespace name.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > 63 {
        bail!("name '{}' exceeds 63 characters (got {})", name, name.len());
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

/// Validate a qualified key such as a resource dimension (`requests.cpu`,
/// `example.com/gpus`) or a finalizer (`quota.k3rs.io/accounting`).
///
/// An optional DNS prefix of at most 253 chars, then a name of at most 63
/// chars made of `[A-Za-z0-9-_.]` that starts and ends alphanumeric.
pub fn validate_qualified_name(key: &str) -> Result<()> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() || prefix.len() > 253 {
            bail!("prefix of '{}' must be 1-253 characters", key);
        }
        let valid_label = |label: &str| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        };
        if !prefix.split('.').all(valid_label) {
            bail!("prefix of '{}' must be a lowercase DNS subdomain", key);
        }
    }

    if name.is_empty() || name.len() > 63 {
        bail!("name part of '{}' must be 1-63 characters", key);
    }
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) {
        bail!("name part of '{}' must start and end with an alphanumeric character", key);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        bail!("name part of '{}' may only contain [A-Za-z0-9-_.]", key);
    }
    Ok(())
}
