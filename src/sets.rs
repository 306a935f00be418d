//! Static catalog of TCG expansions per game generation.
//!
//! Used to suggest likely sets for a looked-up Pokémon, either from its
//! species' generation name or from its national-dex id.

use lazy_static::lazy_static;
use std::collections::BTreeSet;

static SETS_BY_GENERATION: &[(&str, &[&str])] = &[
    (
        "generation-i",
        &[
            "Base Set",
            "Jungle",
            "Fossil",
            "Base Set 2",
            "Team Rocket",
            "Gym Heroes",
            "Gym Challenge",
            "Wizards Black Star Promos",
        ],
    ),
    (
        "generation-ii",
        &[
            "Neo Genesis",
            "Neo Discovery",
            "Neo Revelation",
            "Neo Destiny",
            "Legendary Collection",
            "Expedition Base Set",
            "Aquapolis",
            "Skyridge",
        ],
    ),
    (
        "generation-iii",
        &[
            "Ruby & Sapphire",
            "Sandstorm",
            "Dragon",
            "Team Magma vs Team Aqua",
            "Hidden Legends",
            "FireRed & LeafGreen",
            "Team Rocket Returns",
            "Deoxys",
            "Emerald",
            "Unseen Forces",
            "Delta Species",
            "Legend Maker",
            "Holon Phantoms",
            "Crystal Guardians",
            "Dragon Frontiers",
            "Power Keepers",
        ],
    ),
    (
        "generation-iv",
        &[
            "Diamond & Pearl",
            "Mysterious Treasures",
            "Secret Wonders",
            "Great Encounters",
            "Majestic Dawn",
            "Legends Awakened",
            "Stormfront",
            "Platinum",
            "Rising Rivals",
            "Supreme Victors",
            "Arceus",
            "HeartGold & SoulSilver",
            "Unleashed",
            "Undaunted",
            "Triumphant",
            "Call of Legends",
        ],
    ),
    (
        "generation-v",
        &[
            "Black & White",
            "Emerging Powers",
            "Noble Victories",
            "Next Destinies",
            "Dark Explorers",
            "Dragons Exalted",
            "Dragon Vault",
            "Boundaries Crossed",
            "Plasma Storm",
            "Plasma Freeze",
            "Plasma Blast",
            "Legendary Treasures",
        ],
    ),
    (
        "generation-vi",
        &[
            "XY",
            "Flashfire",
            "Furious Fists",
            "Phantom Forces",
            "Primal Clash",
            "Roaring Skies",
            "Ancient Origins",
            "BREAKthrough",
            "BREAKpoint",
            "Fates Collide",
            "Steam Siege",
            "Evolutions",
        ],
    ),
    (
        "generation-vii",
        &[
            "Sun & Moon",
            "Guardians Rising",
            "Burning Shadows",
            "Crimson Invasion",
            "Ultra Prism",
            "Forbidden Light",
            "Celestial Storm",
            "Lost Thunder",
            "Team Up",
            "Detective Pikachu",
            "Unbroken Bonds",
            "Unified Minds",
            "Hidden Fates",
            "Cosmic Eclipse",
        ],
    ),
    (
        "generation-viii",
        &[
            "Sword & Shield",
            "Rebel Clash",
            "Darkness Ablaze",
            "Champions Path",
            "Vivid Voltage",
            "Shining Fates",
            "Battle Styles",
            "Chilling Reign",
            "Evolving Skies",
            "Celebrations",
            "Fusion Strike",
            "Brilliant Stars",
            "Astral Radiance",
            "Pokémon GO",
            "Lost Origin",
            "Silver Tempest",
            "Crown Zenith",
        ],
    ),
    (
        "generation-ix",
        &[
            "Scarlet & Violet",
            "Paldea Evolved",
            "Obsidian Flames",
            "151",
            "Paradox Rift",
            "Paldean Fates",
            "Temporal Forces",
        ],
    ),
];

lazy_static! {
    /// Deduplicated, alphabetically sorted union of every known set
    static ref ALL_SETS: Vec<&'static str> = {
        let unique: BTreeSet<&'static str> = SETS_BY_GENERATION
            .iter()
            .flat_map(|(_, sets)| sets.iter().copied())
            .collect();
        unique.into_iter().collect()
    };
}

/// Sets for a generation name as PokéAPI spells it (e.g. "generation-iv").
///
/// Matching is case-insensitive and tolerant of surrounding text; an unknown
/// or missing generation falls back to the full catalog. Keys are tried
/// longest-first so "generation-iii" never matches the "generation-i" entry.
pub fn sets_for_generation(generation: Option<&str>) -> Vec<String> {
    let Some(name) = generation.map(str::trim).filter(|s| !s.is_empty()) else {
        return all_sets();
    };
    let name = name.to_lowercase();

    if let Some((_, sets)) = SETS_BY_GENERATION.iter().find(|(key, _)| *key == name) {
        return sets.iter().map(|s| s.to_string()).collect();
    }

    let mut keyed: Vec<&(&str, &[&str])> = SETS_BY_GENERATION.iter().collect();
    keyed.sort_by_key(|(key, _)| std::cmp::Reverse(key.len()));
    for (key, sets) in keyed {
        if name.contains(key) {
            return sets.iter().map(|s| s.to_string()).collect();
        }
    }

    all_sets()
}

/// Sets for a national-dex id, via the generation its range falls in.
pub fn sets_for_pokemon_id(id: i64) -> Vec<String> {
    let generation = match id {
        i64::MIN..=151 => "generation-i",
        152..=251 => "generation-ii",
        252..=386 => "generation-iii",
        387..=493 => "generation-iv",
        494..=649 => "generation-v",
        650..=721 => "generation-vi",
        722..=809 => "generation-vii",
        810..=905 => "generation-viii",
        _ => "generation-ix",
    };
    sets_for_generation(Some(generation))
}

/// Every known set, deduplicated and alphabetically sorted.
pub fn all_sets() -> Vec<String> {
    ALL_SETS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_generation_name_matches() {
        let sets = sets_for_generation(Some("generation-i"));
        assert!(sets.contains(&"Base Set".to_string()));
        assert!(!sets.contains(&"Neo Genesis".to_string()));
    }

    #[test]
    fn longer_keys_win_over_their_prefixes() {
        let sets = sets_for_generation(Some("Generation-III (Hoenn)"));
        assert!(sets.contains(&"Ruby & Sapphire".to_string()));
        assert!(!sets.contains(&"Base Set".to_string()));
    }

    #[test]
    fn unknown_generation_falls_back_to_all_sets() {
        assert_eq!(sets_for_generation(Some("generation-xx")), all_sets());
        assert_eq!(sets_for_generation(None), all_sets());
        assert_eq!(sets_for_generation(Some("  ")), all_sets());
    }

    #[test]
    fn dex_id_ranges_pick_the_right_generation() {
        assert!(sets_for_pokemon_id(25).contains(&"Base Set".to_string()));
        assert!(sets_for_pokemon_id(151).contains(&"Base Set".to_string()));
        assert!(sets_for_pokemon_id(152).contains(&"Neo Genesis".to_string()));
        assert!(sets_for_pokemon_id(386).contains(&"Ruby & Sapphire".to_string()));
        assert!(sets_for_pokemon_id(493).contains(&"Diamond & Pearl".to_string()));
        assert!(sets_for_pokemon_id(649).contains(&"Black & White".to_string()));
        assert!(sets_for_pokemon_id(721).contains(&"XY".to_string()));
        assert!(sets_for_pokemon_id(809).contains(&"Sun & Moon".to_string()));
        assert!(sets_for_pokemon_id(905).contains(&"Sword & Shield".to_string()));
        assert!(sets_for_pokemon_id(1000).contains(&"Scarlet & Violet".to_string()));
    }

    #[test]
    fn all_sets_is_sorted_and_deduplicated() {
        let sets = all_sets();
        let mut sorted = sets.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sets, sorted);
    }
}
