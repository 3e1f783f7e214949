use anyhow::{Context, Result, bail};
use sixdown_game::{decode_game_code, encode_game_code};
use std::collections::HashSet;

/// Largest seed range a single token may expand to.
const MAX_RANGE: u64 = 100_000;

/// Seed metadata for one batch entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// The game code typed on the command line, if the seed came from one.
    pub code: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, code: None }
    }

    #[must_use]
    pub const fn from_game_code(seed: u64, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
        }
    }

    /// Code to show in reports: the one supplied, else the seed's canonical code.
    #[must_use]
    pub fn display_code(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| encode_game_code(self.seed))
    }
}

fn parse_range(token: &str) -> Result<Option<(u64, u64)>> {
    let Some((start, end)) = token.split_once("..") else {
        return Ok(None);
    };
    let start: u64 = start
        .trim()
        .parse()
        .with_context(|| format!("invalid range start in `{token}`"))?;
    let end: u64 = end
        .trim()
        .parse()
        .with_context(|| format!("invalid range end in `{token}`"))?;
    if end <= start {
        bail!("empty seed range `{token}`");
    }
    if end - start > MAX_RANGE {
        bail!("seed range `{token}` exceeds {MAX_RANGE} seeds");
    }
    Ok(Some((start, end)))
}

/// Resolve CLI seed tokens into seeds.
///
/// Accepts integers (negative values use their magnitude), half-open ranges
/// such as `100..150`, and game codes such as `SD-BLITZ07`. Duplicates are
/// dropped in first-seen order; an empty list falls back to seed 1337.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Some((start, end)) = parse_range(token)? {
            pending.extend((start..end).map(SeedInfo::from_numeric));
            continue;
        }

        if let Some(seed) = decode_game_code(token) {
            pending.push(SeedInfo::from_game_code(seed, token.to_uppercase()));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    let mut deduped: Vec<SeedInfo> = pending
        .into_iter()
        .filter(|info| seen.insert(info.seed))
        .collect();

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}

/// Repeat each seed `iterations` times on consecutive seeds.
#[must_use]
pub fn expand_iterations(seeds: &[SeedInfo], iterations: usize) -> Vec<SeedInfo> {
    let iterations = iterations.max(1);
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(seeds.len() * iterations);
    for info in seeds {
        for i in 0..iterations {
            let offset = u64::try_from(i).unwrap_or(u64::MAX);
            let entry = if i == 0 {
                info.clone()
            } else {
                SeedInfo::from_numeric(info.seed.wrapping_add(offset))
            };
            if seen.insert(entry.seed) {
                out.push(entry);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn numbers_codes_and_ranges_resolve() {
        let seeds = resolve_seed_inputs(&tokens(&["7", "-9", "sd-blitz07", "20..23"])).unwrap();
        let values: Vec<u64> = seeds.iter().map(|s| s.seed).collect();
        assert_eq!(values[..2], [7, 9]);
        assert_eq!(values[3..], [20, 21, 22]);
        assert_eq!(seeds[2].code.as_deref(), Some("SD-BLITZ07"));
        assert_eq!(Some(seeds[2].seed), decode_game_code("SD-BLITZ07"));
    }

    #[test]
    fn duplicates_collapse_and_empty_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "5", " "])).unwrap();
        assert_eq!(seeds.len(), 1);
        let seeds = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(1337)]);
    }

    #[test]
    fn bad_tokens_are_errors() {
        assert!(resolve_seed_inputs(&tokens(&["SD-NOPE01"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9..3"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..999999999"])).is_err());
    }

    #[test]
    fn iterations_walk_consecutive_seeds() {
        let seeds = expand_iterations(&[SeedInfo::from_numeric(10), SeedInfo::from_numeric(11)], 3);
        let values: Vec<u64> = seeds.iter().map(|s| s.seed).collect();
        assert_eq!(values, vec![10, 11, 12, 13]);
        assert_eq!(seeds[0].display_code(), encode_game_code(10));
    }
}
