//! Social media output formats

use serde::Serialize;

/// A fixed crop target for one social media surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SocialFormat {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: &'static str,
}

pub const SOCIAL_FORMATS: [SocialFormat; 5] = [
    SocialFormat {
        name: "Instagram Square (1:1)",
        width: 1080,
        height: 1080,
        aspect_ratio: "1:1",
    },
    SocialFormat {
        name: "Instagram Portrait (4:5)",
        width: 1080,
        height: 1350,
        aspect_ratio: "4:5",
    },
    SocialFormat {
        name: "Twitter Post (16:9)",
        width: 1200,
        height: 675,
        aspect_ratio: "16:9",
    },
    SocialFormat {
        name: "Twitter Header (3:1)",
        width: 1500,
        height: 500,
        aspect_ratio: "3:1",
    },
    SocialFormat {
        name: "Facebook Cover (205:78)",
        width: 820,
        height: 312,
        aspect_ratio: "205:78",
    },
];

impl SocialFormat {
    pub fn all() -> &'static [SocialFormat] {
        &SOCIAL_FORMATS
    }

    /// The format selected when the page opens
    pub fn default_format() -> SocialFormat {
        SOCIAL_FORMATS[0]
    }

    /// Look up a format by its exact display name, ignoring case
    pub fn by_name(name: &str) -> Option<SocialFormat> {
        SOCIAL_FORMATS
            .iter()
            .copied()
            .find(|f| f.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Download file name: display name with whitespace runs replaced by `_`, lowercased
    pub fn file_name(&self) -> String {
        let joined = self.name.split_whitespace().collect::<Vec<_>>().join("_");
        format!("{}.png", joined.to_lowercase())
    }
}
