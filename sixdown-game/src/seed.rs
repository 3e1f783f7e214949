//! Reversible game codes for sharing reproducible matchups.
//! Code format: `SD-<WORD><NN>`, e.g. `SD-BLITZ42`, `SD-PINDOWN07`.

const CODE_PREFIX: &str = "SD";

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Words available to game codes. The index is packed into the seed.
pub const WORD_LIST: [&str; 64] = [
    "BLITZ", "PINDOWN", "SNAP", "LATERAL", "SAFETY", "HUDDLE", "GRIDIRON", "ENDZONE", "TACKLE",
    "SWEEP", "COUNTER", "DIVE", "POWER", "PUNT", "DROPKICK", "HOLDER", "GOALPOST", "SIDELINE",
    "HASH", "CHAINS", "DOWNS", "DRIVE", "TEMPO", "STRIDE", "SPIRAL", "BOOT", "RUSH", "NICKEL",
    "DIME", "PURSUIT", "SCRUM", "GRIT", "FLAG", "WHISTLE", "CLOCK", "TIMEOUT", "KNEEL", "SURGE",
    "TILT", "PUZZLE", "PLAYBOOK", "ROSTER", "CAPTAIN", "COACH", "BENCH", "TURF", "MUD", "FROST",
    "GALE", "HEATWAVE", "STADIUM", "BANNER", "ANTHEM", "RIVAL", "DERBY", "TROPHY", "PENNANT",
    "SEASON", "CHARGE", "ANCHOR", "WEDGE", "SCREEN", "OPTION", "MARGIN",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    (word_index & 0x003F) | ((u16::from(nn) & 0x7F) << 6)
}

#[inline]
fn unpack(packed: u16) -> (usize, u8) {
    let word = usize::from(packed & 0x003F);
    let nn = u8::try_from((packed >> 6) & 0x7F).unwrap_or(0);
    (word, nn)
}

fn compose_seed(word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let [lo, hi] = packed.to_le_bytes();
    let buf = [b'S', b'I', b'X', b'D', b'N', b'-', lo, hi, 0x5A];
    let hash = fnv1a64(&buf);
    (hash & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render a seed as a game code. Only the low 13 bits of the seed survive,
/// so decoding returns the canonical seed for the code, not the input.
#[must_use]
pub fn encode_game_code(seed: u64) -> String {
    let packed = u16::try_from(seed & 0x1FFF).unwrap_or(0);
    let (wi, nn) = unpack(packed);
    let word = WORD_LIST.get(wi).copied().unwrap_or(WORD_LIST[0]);
    format!("{CODE_PREFIX}-{word}{:02}", nn % 100)
}

/// Resolve a game code (case-insensitive) to its canonical seed.
#[must_use]
pub fn decode_game_code(code: &str) -> Option<u64> {
    let (prefix, rest) = code.trim().split_once('-')?;
    if !prefix.eq_ignore_ascii_case(CODE_PREFIX) || rest.len() < 3 {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = normalize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| *w == word)?;
    Some(compose_seed(u16::try_from(idx).ok()?, nn))
}

/// Derive a fresh code from arbitrary entropy (clock, counter, ...).
#[must_use]
pub fn code_from_entropy(entropy: u64) -> String {
    let len = u64::try_from(WORD_LIST.len()).unwrap_or(64);
    let wi = u16::try_from(entropy % len).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_game_code(compose_seed(wi, nn))
}
