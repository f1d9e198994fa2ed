use anyhow::{bail, Result};

/// Parse a port specification into an ordered list of TCP ports.
///
/// The specification is a comma-separated list of tokens; each token is
/// either a single decimal port (`80`) or an inclusive range (`8000-8010`).
/// Values outside `1..=65535` are dropped without error, an inverted range
/// produces no ports, and duplicates are kept (a port listed twice is
/// probed twice). Empty tokens are skipped.
///
/// A non-numeric token or a range with more than one `-` fails immediately.
/// If, after all tokens are processed, no port survived, the parse fails
/// with "no valid ports specified" — this is how `""`, `"3-1"` and
/// `"99999"` are rejected.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>> {
    let mut out: Vec<u16> = Vec::new();

    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if token.contains('-') {
            let parts: Vec<&str> = token.split('-').collect();
            if parts.len() != 2 {
                bail!("invalid port range: {token}");
            }
            let start = parse_port_number(parts[0].trim())?;
            let end = parse_port_number(parts[1].trim())?;
            // Walk only the overlap with the valid window; values outside
            // it would be dropped anyway. An inverted range overlaps
            // nothing and contributes nothing.
            for value in start.max(1)..=end.min(65535) {
                out.push(value as u16);
            }
        } else if let Some(p) = in_port_window(parse_port_number(token)?) {
            out.push(p);
        }
    }

    if out.is_empty() {
        bail!("no valid ports specified");
    }

    Ok(out)
}

/// Parse one decimal token. Only genuinely non-numeric input is an error;
/// window checking happens separately so out-of-window values, however
/// large, can be dropped silently.
fn parse_port_number(s: &str) -> Result<u64> {
    match s.parse::<u64>() {
        Ok(v) => Ok(v),
        Err(_) => bail!("invalid port number: {s}"),
    }
}

fn in_port_window(value: u64) -> Option<u16> {
    if (1..=65535).contains(&value) {
        Some(value as u16)
    } else {
        None
    }
}
