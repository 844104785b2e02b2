use rand::seq::SliceRandom;

pub const MAX_PLAYER_NAME_LENGTH: usize = 20;

const ADJECTIVES: [&str; 12] = [
    "Brave", "Quick", "Sleepy", "Lucky", "Bouncy", "Sneaky", "Tiny", "Mighty", "Fuzzy", "Clumsy",
    "Jolly", "Wild",
];

const NOUNS: [&str; 12] = [
    "Frog", "Otter", "Badger", "Panda", "Gecko", "Falcon", "Walrus", "Lynx", "Moose", "Koala",
    "Newt", "Yak",
];

pub fn sanitize_player_name(name: &str, fallback: &str) -> String {
    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    cleaned.chars().take(MAX_PLAYER_NAME_LENGTH).collect()
}

pub fn generate_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Brave");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Frog");
    format!("{adjective} {noun}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_whitespace_and_caps_length() {
        assert_eq!(sanitize_player_name("  a \t b  ", "x"), "a b");
        assert_eq!(sanitize_player_name("   ", "fallback"), "fallback");
        let long = "n".repeat(40);
        assert_eq!(sanitize_player_name(&long, "x").len(), MAX_PLAYER_NAME_LENGTH);
    }

    #[test]
    fn generated_names_fit_the_cap() {
        for _ in 0..32 {
            let name = generate_name();
            assert!(name.len() <= MAX_PLAYER_NAME_LENGTH);
            assert_eq!(name.split(' ').count(), 2);
        }
    }
}
