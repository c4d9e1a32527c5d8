// src/entity/realm.rs
use serde::{Deserialize, Serialize};

/// Cultivation stage a scroll is tagged with, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Realm {
    #[default]
    #[serde(rename = "炼气期")]
    QiCondensation,
    #[serde(rename = "筑基期")]
    Foundation,
    #[serde(rename = "金丹期")]
    GoldenCore,
    #[serde(rename = "元婴期")]
    NascentSoul,
    #[serde(rename = "化神期")]
    SpiritSevering,
    #[serde(rename = "炼虚期")]
    VoidShattering,
    #[serde(rename = "大乘期")]
    Mahayana,
}

impl Realm {
    pub const ALL: [Realm; 7] = [
        Realm::QiCondensation,
        Realm::Foundation,
        Realm::GoldenCore,
        Realm::NascentSoul,
        Realm::SpiritSevering,
        Realm::VoidShattering,
        Realm::Mahayana,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Realm::QiCondensation => "炼气期",
            Realm::Foundation => "筑基期",
            Realm::GoldenCore => "金丹期",
            Realm::NascentSoul => "元婴期",
            Realm::SpiritSevering => "化神期",
            Realm::VoidShattering => "炼虚期",
            Realm::Mahayana => "大乘期",
        }
    }

    /// ASCII name accepted on the command line.
    pub fn alias(&self) -> &'static str {
        match self {
            Realm::QiCondensation => "qi-condensation",
            Realm::Foundation => "foundation",
            Realm::GoldenCore => "golden-core",
            Realm::NascentSoul => "nascent-soul",
            Realm::SpiritSevering => "spirit-severing",
            Realm::VoidShattering => "void-shattering",
            Realm::Mahayana => "mahayana",
        }
    }
}

impl std::fmt::Display for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Realm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Realm::ALL
            .into_iter()
            .find(|realm| realm.label() == wanted || realm.alias() == wanted)
            .ok_or_else(|| format!("Invalid realm: {}", s))
    }
}
