use anyhow::{Context, Result, bail};
use std::collections::HashSet;

/// Default seed when no usable token was given.
pub const DEFAULT_SEED: u64 = 1337;

/// Largest range `a..b` accepted on the command line.
const MAX_RANGE: u64 = 10_000;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Supports literal integers (negative values use their magnitude) and
/// half-open ranges such as `10..20`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        for seed in parse_token(token)? {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_token(token: &str) -> Result<Vec<u64>> {
    if let Some((start, end)) = token.split_once("..") {
        let start = parse_seed(start).with_context(|| format!("bad range start in {token}"))?;
        let end = parse_seed(end).with_context(|| format!("bad range end in {token}"))?;
        if end <= start {
            bail!("Empty seed range: {token}");
        }
        if end - start > MAX_RANGE {
            bail!("Seed range {token} is wider than {MAX_RANGE}");
        }
        return Ok((start..end).collect());
    }
    Ok(vec![parse_seed(token)?])
}

fn parse_seed(token: &str) -> Result<u64> {
    let token = token.trim();
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    bail!("Unrecognized seed token: {token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &str) -> Vec<String> {
        split_csv(raw)
    }

    #[test]
    fn resolves_numbers_ranges_and_duplicates() {
        let seeds = resolve_seed_inputs(&tokens("42, -7, 3..6, 4")).unwrap();
        assert_eq!(seeds, vec![42, 7, 3, 4, 5]);
    }

    #[test]
    fn falls_back_to_default_seed() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
        assert_eq!(resolve_seed_inputs(&tokens(" , ")).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_garbage_and_empty_ranges() {
        assert!(resolve_seed_inputs(&tokens("orange")).is_err());
        assert!(resolve_seed_inputs(&tokens("9..3")).is_err());
        assert!(resolve_seed_inputs(&tokens("0..99999")).is_err());
    }
}
