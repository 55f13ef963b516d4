//! Fallback bot nickname generator.
//!
//! Produces nicknames in the format `AdjNounNN` (e.g. `NeoBot42`). The noun
//! is cut to three characters when needed so the result always fits the
//! RFC 1459 nine-character nickname limit.

use rand::RngExt;

const ADJECTIVES: &[&str] = &[
    "Neo", "Hex", "Zen", "Ion", "Arc", "Dim", "Fax", "Gem", "Jet", "Kin", "Lux", "Max", "Nix",
    "Orb", "Pix", "Rex", "Sol", "Tek", "Vox", "Wiz", "Byte", "Cold", "Dark", "Echo", "Flux",
    "Grim", "Iron", "Mono", "Nova", "Onyx", "Rust", "Warp",
];

const NOUNS: &[&str] = &[
    "Bot", "Owl", "Fox", "Elk", "Ant", "Bee", "Cat", "Dog", "Eel", "Gnu", "Hen", "Jay", "Yak",
    "Ram", "Rat", "Emu", "Cog", "Bit", "Gear", "Log",
];

/// Generate a random nickname like `NeoBot42`.
pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let adj = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let noun = if adj.len() + noun.len() > 7 { &noun[..3] } else { noun };
    let num: u8 = rng.random_range(0..100);
    format!("{}{}{}", adj, noun, num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nickname_fits_limit() {
        for _ in 0..200 {
            let nick = generate_nickname();
            assert!(nick.len() <= 9, "{nick} is too long");
            assert!(nick.chars().next().is_some_and(|c| c.is_ascii_alphabetic()));
        }
    }
}
