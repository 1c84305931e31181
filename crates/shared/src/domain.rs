use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            pub fn next(self) -> Self {
                Self(self.0.wrapping_add(1))
            }
        }
    };
}

id_newtype!(SelectionId);
id_newtype!(RequestId);
id_newtype!(ResultId);

/// Range offered by both font-size sliders, in percent.
pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 10..=200;
pub const DEFAULT_FONT_SIZE: u32 = 100;

pub const TEXT_LINES_SINGLE: &str = "single";
pub const TEXT_LINES_DOUBLE: &str = "double";
pub const TEXT_LINE_OPTIONS: [&str; 2] = [TEXT_LINES_SINGLE, TEXT_LINES_DOUBLE];

const DOWNLOAD_FALLBACK_STEM: &str = "custom";
const DOWNLOAD_SUFFIX: &str = "_card.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSlider {
    Wishes,
    Name,
}

impl FontSlider {
    pub fn label(self) -> &'static str {
        match self {
            Self::Wishes => "Wishes font size",
            Self::Name => "Name font size",
        }
    }
}

/// Text and slider inputs of the card form, exactly as the user entered them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    pub wishes_text: String,
    pub name_text: String,
    pub text_lines: String,
    pub wishes_font_size: u32,
    pub name_font_size: u32,
}

impl Default for CardFields {
    fn default() -> Self {
        Self {
            wishes_text: String::new(),
            name_text: String::new(),
            text_lines: TEXT_LINES_SINGLE.to_string(),
            wishes_font_size: DEFAULT_FONT_SIZE,
            name_font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl CardFields {
    pub fn font_size(&self, slider: FontSlider) -> u32 {
        match slider {
            FontSlider::Wishes => self.wishes_font_size,
            FontSlider::Name => self.name_font_size,
        }
    }

    pub fn font_size_mut(&mut self, slider: FontSlider) -> &mut u32 {
        match slider {
            FontSlider::Wishes => &mut self.wishes_font_size,
            FontSlider::Name => &mut self.name_font_size,
        }
    }

    pub fn download_file_name(&self) -> String {
        download_file_name(&self.name_text)
    }
}

pub fn font_size_multiplier(percent: u32) -> f64 {
    f64::from(percent) / 100.0
}

/// Suggested filename for a generated card: `"Jane Doe "` becomes `jane_doe_card.jpg`.
pub fn download_file_name(name_text: &str) -> String {
    let stem = name_text
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        format!("{DOWNLOAD_FALLBACK_STEM}{DOWNLOAD_SUFFIX}")
    } else {
        format!("{stem}{DOWNLOAD_SUFFIX}")
    }
}
