//! The compiled-in list of enemy commander portraits.

use serde::Serialize;

macro_rules! style_prefix {
    () => {
        "Game character portrait, head and shoulders only, dark moody background, \
         dramatic cinematic lighting, digital painting style, military sci-fi aesthetic, \
         highly detailed face, sharp focus, "
    };
}

/// Shared art direction prepended to every portrait prompt.
pub const STYLE_PREFIX: &str = style_prefix!();

/// One portrait to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    /// Enemy number, 1-based.
    pub id: u32,
    /// File name written into the output directory.
    pub filename: &'static str,
    /// Full generation prompt, style prefix included.
    pub prompt: &'static str,
}

/// The ten WarZones campaign commanders, in campaign order.
pub const ENEMY_ROSTER: [WorkItem; 10] = [
    WorkItem {
        id: 1,
        filename: "enemy-1.webp",
        prompt: concat!(
            style_prefix!(),
            "young nervous male naval officer, clean shaven, green uniform, ",
            "first-time commander look, uncertain eyes, dim bridge lighting"
        ),
    },
    WorkItem {
        id: 2,
        filename: "enemy-2.webp",
        prompt: concat!(
            style_prefix!(),
            "female tactical officer, short dark hair, steely grey eyes, ",
            "fog and mist swirling around her, sensor visor over one eye, ",
            "blue-grey uniform, mysterious expression"
        ),
    },
    WorkItem {
        id: 3,
        filename: "enemy-3.webp",
        prompt: concat!(
            style_prefix!(),
            "imposing male commander with three deep scars across his face, ",
            "shaved head, red and black military armor, menacing grin, ",
            "nickname 'The Hydra', multiple medal ribbons, red backlighting"
        ),
    },
    WorkItem {
        id: 4,
        filename: "enemy-4.webp",
        prompt: concat!(
            style_prefix!(),
            "wiry intense female officer, short spiky hair, cybernetic eye implant, ",
            "speed lines in background, stopwatch hanging from neck, ",
            "yellow-accented dark uniform, tense focused expression"
        ),
    },
    WorkItem {
        id: 5,
        filename: "enemy-5.webp",
        prompt: concat!(
            style_prefix!(),
            "pale gaunt male submarine captain, deep-set dark eyes, ",
            "wearing a black submariner's cap, deep ocean blue uniform, ",
            "bioluminescent glow from below, claustrophobic atmosphere"
        ),
    },
    WorkItem {
        id: 6,
        filename: "enemy-6.webp",
        prompt: concat!(
            style_prefix!(),
            "grizzled old male demolitions expert, eye patch over left eye, ",
            "burn scars on neck, orange and black bomb disposal suit, ",
            "dangerous smirk, explosive sparks in background"
        ),
    },
    WorkItem {
        id: 7,
        filename: "enemy-7.webp",
        prompt: concat!(
            style_prefix!(),
            "massive intimidating female warlord, glowing cyan eyes, ",
            "heavy black power armor with shield generators, ",
            "tentacle motifs on shoulder plates, 'The Kraken', purple backlighting, ",
            "cold ruthless expression"
        ),
    },
    WorkItem {
        id: 8,
        filename: "enemy-8.webp",
        prompt: concat!(
            style_prefix!(),
            "ghostly translucent male officer, face partially fading in and out, ",
            "spectral blue glow, stealth camouflage uniform shifting colors, ",
            "phantom-like, haunting hollow eyes"
        ),
    },
    WorkItem {
        id: 9,
        filename: "enemy-9.webp",
        prompt: concat!(
            style_prefix!(),
            "bulky armored male commander, face behind a cracked transparent visor, ",
            "heavy iron-grey power armor, shield insignia on chest, ",
            "cold calculating stare, sparks bouncing off armor"
        ),
    },
    WorkItem {
        id: 10,
        filename: "enemy-10.webp",
        prompt: concat!(
            style_prefix!(),
            "legendary elderly admiral, white beard and weathered face, ",
            "golden epaulettes on black greatcoat, chest full of medals, ",
            "piercing ice-blue eyes, supreme confidence, ",
            "golden light behind him, final boss energy, 'Admiral Voss'"
        ),
    },
];

/// Returns the roster entries whose ids are in `ids`, in roster order.
///
/// An empty `ids` slice selects the whole roster.
pub fn select(ids: &[u32]) -> Vec<WorkItem> {
    ENEMY_ROSTER
        .iter()
        .filter(|item| ids.is_empty() || ids.contains(&item.id))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_roster_ids_and_filenames() {
        assert_eq!(ENEMY_ROSTER.len(), 10);
        for (idx, item) in ENEMY_ROSTER.iter().enumerate() {
            assert_eq!(item.id as usize, idx + 1);
            assert_eq!(item.filename, format!("enemy-{}.webp", item.id));
        }
    }

    #[test]
    fn test_filenames_unique() {
        let names: HashSet<_> = ENEMY_ROSTER.iter().map(|i| i.filename).collect();
        assert_eq!(names.len(), ENEMY_ROSTER.len());
    }

    #[test]
    fn test_prompts_carry_style_prefix() {
        for item in &ENEMY_ROSTER {
            assert!(item.prompt.starts_with(STYLE_PREFIX));
            assert!(item.prompt.len() > STYLE_PREFIX.len());
        }
        assert!(ENEMY_ROSTER[9].prompt.ends_with("'Admiral Voss'"));
        assert!(STYLE_PREFIX.contains("dramatic cinematic lighting, digital painting style"));
    }

    #[test]
    fn test_select() {
        assert_eq!(select(&[]).len(), 10);

        let picked = select(&[7, 3, 42]);
        let ids: Vec<u32> = picked.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 7]);
    }
}
