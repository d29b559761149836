//! Which goods belong to which era.

use std::collections::BTreeSet;

/// Era name to the goods it produces, in display order.
pub const RES_MAP: [(&str, &[&str]); 22] = [
    ("NoAge", &["money", "supplies", "tavern_silver", "medals", "premium"]),
    ("StoneAge", &[]),
    ("BronzeAge", &["dye", "cypress", "alabaster", "sandstone", "wine"]),
    ("IronAge", &["cloth", "ebony", "lead", "gems", "limestone"]),
    ("EarlyMiddleAge", &["marble", "bronze", "gold", "granite", "honey"]),
    ("HighMiddleAge", &["brick", "herbs", "glass", "ropes", "salt"]),
    ("LateMiddleAge", &["basalt", "brass", "gunpowder", "silk", "talc"]),
    ("ColonialAge", &["coffee", "porcelain", "paper", "tar", "wire"]),
    ("IndustrialAge", &["coke", "fertilizer", "rubber", "textiles", "whaleoil"]),
    ("ProgressiveEra", &["asbestos", "explosives", "petroleum", "machineparts", "tinplate"]),
    (
        "ModernEra",
        &[
            "convenience_food",
            "ferroconcrete",
            "flavorants",
            "luxury_materials",
            "packaging",
        ],
    ),
    ("PostModernEra", &["dna_data", "filters", "renewable_resources", "semiconductors", "steel"]),
    ("ContemporaryEra", &["bionics", "electromagnets", "gas", "plastics", "robots"]),
    (
        "TomorrowEra",
        &[
            "nutrition_research",
            "papercrete",
            "preservatives",
            "smart_materials",
            "translucent_concrete",
        ],
    ),
    (
        "FutureEra",
        &[
            "algae",
            "biogeochemical_data",
            "nanoparticles",
            "purified_water",
            "superconductors",
        ],
    ),
    ("ArcticFuture", &["ai_data", "bioplastics", "nanowire", "paper_batteries", "transester_gas"]),
    ("OceanicFuture", &["artificial_scales", "biolight", "corals", "pearls", "plankton"]),
    ("VirtualFuture", &["cryptocash", "data_crystals", "golden_rice", "nanites", "tea_silk"]),
    (
        "SpaceAgeMars",
        &[
            "biotech_crops",
            "lubricants",
            "fusion_reactors",
            "mars_microbes",
            "superalloys",
        ],
    ),
    ("SpaceAgeAsteroidBelt", &[]),
    ("SpaceAgeVenus", &[]),
    ("special", &["promethium", "orichalcum", "mars_ore", "asteroid_ice"]),
];

/// Eras whose goods a player can actually trade, oldest first.
pub const PLAYABLE_ERAS: [&str; 19] = [
    "BronzeAge",
    "IronAge",
    "EarlyMiddleAge",
    "HighMiddleAge",
    "LateMiddleAge",
    "ColonialAge",
    "IndustrialAge",
    "ProgressiveEra",
    "ModernEra",
    "PostModernEra",
    "ContemporaryEra",
    "TomorrowEra",
    "FutureEra",
    "ArcticFuture",
    "OceanicFuture",
    "VirtualFuture",
    "SpaceAgeMars",
    "SpaceAgeAsteroidBelt",
    "SpaceAgeVenus",
];

pub fn goods_of(era: &str) -> &'static [&'static str] {
    RES_MAP
        .iter()
        .find(|(name, _)| *name == era)
        .map(|(_, goods)| *goods)
        .unwrap_or(&[])
}

/// The selected eras, in resource map order. Unknown names are dropped.
pub fn selected_eras<S: AsRef<str>>(selection: &[S]) -> Vec<&'static str> {
    let wanted: BTreeSet<&str> = selection.iter().map(|s| s.as_ref()).collect();
    RES_MAP
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| wanted.contains(name))
        .collect()
}

/// Capital letters of an era name: `BronzeAge` becomes `BA`.
pub fn short_era_name(era: &str) -> String {
    era.chars().filter(|c| c.is_ascii_uppercase()).collect()
}

/// Compact thousands: 5123 becomes `5k`, 2123 becomes `2.1k`.
pub fn kilos(n: i64) -> String {
    let k = n as f64 / 1000.0;
    if n.abs() < 5000 {
        format!("{k:.1}k")
    } else {
        format!("{k:.0}k")
    }
}
