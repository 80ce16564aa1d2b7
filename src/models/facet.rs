use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

pub const MAX_SIMILARITY_FLOOR: u8 = 100;

macro_rules! facet_enum {
    ($name:ident, $label:literal, { $($variant:ident => $value:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| AppError::Usage(format!("unknown {}: {s}", $label)))
            }
        }
    };
}

facet_enum!(Gender, "gender", {
    Men => "Men",
    Women => "Women",
    Unisex => "Unisex",
});

facet_enum!(BaseColour, "colour", {
    Black => "Black",
    White => "White",
    Blue => "Blue",
    Red => "Red",
    Green => "Green",
    Grey => "Grey",
    NavyBlue => "Navy Blue",
    Orange => "Orange",
    Purple => "Purple",
});

facet_enum!(Category, "category", {
    Apparel => "Apparel",
    Accessories => "Accessories",
    Footwear => "Footwear",
    SportingGoods => "Sporting Goods",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetFilter {
    #[serde(
        default,
        serialize_with = "empty_when_unset",
        deserialize_with = "unset_when_empty"
    )]
    pub gender: Option<Gender>,
    #[serde(
        default,
        serialize_with = "empty_when_unset",
        deserialize_with = "unset_when_empty"
    )]
    pub base_colour: Option<BaseColour>,
    #[serde(
        default,
        serialize_with = "empty_when_unset",
        deserialize_with = "unset_when_empty"
    )]
    pub category: Option<Category>,
    /// Percentage in 0..=100; 0 disables the threshold.
    #[serde(rename = "similarity", default, deserialize_with = "clamped_floor")]
    pub similarity_floor: u8,
}

impl FacetFilter {
    pub fn set_similarity_floor(&mut self, floor: u8) {
        self.similarity_floor = floor.min(MAX_SIMILARITY_FLOOR);
    }

    pub fn with_similarity_floor(mut self, floor: u8) -> Self {
        self.set_similarity_floor(floor);
        self
    }

    pub fn min_similarity(&self) -> Option<f64> {
        let floor = self.similarity_floor.min(MAX_SIMILARITY_FLOOR);
        (floor > 0).then(|| f64::from(floor) / 100.0)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.gender.is_none()
            && self.base_colour.is_none()
            && self.category.is_none()
            && self.similarity_floor == 0
    }
}

fn empty_when_unset<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: Serializer,
{
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_str(""),
    }
}

fn unset_when_empty<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: std::str::FromStr<Err = AppError>,
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn clamped_floor<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = u64::deserialize(deserializer)?;
    Ok(raw.min(u64::from(MAX_SIMILARITY_FLOOR)) as u8)
}
