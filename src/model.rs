use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Shape;

/// Largest id that survives a round trip through JSON numbers.
const MAX_JSON_SAFE_ID: u64 = (1 << 53) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl GroupId {
    pub fn generate() -> Self {
        GroupId((rand::random::<u64>() & MAX_JSON_SAFE_ID).max(1))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, priced treatment area made of one or more rectangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Per group, never per shape.
    pub price: f64,
    pub shapes: Vec<Shape>,
}

impl Group {
    /// Anchor for labels and badges.
    pub fn first_shape(&self) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.is_valid())
    }

    pub fn valid_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.is_valid())
    }
}

/// Sum of group prices; each group counts once whatever its shape count.
pub fn total_price<'a>(groups: impl IntoIterator<Item = &'a Group>) -> f64 {
    groups.into_iter().map(|g| g.price).sum()
}

/// Lenient price input: anything that is not a finite, non-negative number is 0.
pub fn parse_price(input: &str) -> f64 {
    let cleaned = input.trim().replace(',', ".");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn other(&self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// Body region a default reference image depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Face,
    Body,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Face => "face",
            Region::Body => "body",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "face" => Some(Region::Face),
            "body" => Some(Region::Body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(pub String);

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a subject picks its reference image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectCategory {
    /// Category with a gender suffix, e.g. `face_female`: one canonical image,
    /// gender implied.
    Explicit { region: Region, gender: Gender },
    /// Bare category, e.g. `body`: the gender must be chosen.
    Gendered { region: Region },
    /// Caller-supplied images, one per gender, either may be missing.
    Custom {
        male: Option<String>,
        female: Option<String>,
    },
}

impl SubjectCategory {
    pub fn parse(
        category: &str,
        male_image: Option<String>,
        female_image: Option<String>,
    ) -> Result<Self, String> {
        let category = category.trim().to_ascii_lowercase();

        if category == "custom" {
            return Ok(SubjectCategory::Custom {
                male: male_image.filter(|s| !s.trim().is_empty()),
                female: female_image.filter(|s| !s.trim().is_empty()),
            });
        }

        if let Some(region) = Region::parse(&category) {
            return Ok(SubjectCategory::Gendered { region });
        }

        if let Some((region, gender)) = category.split_once('_') {
            let gender = match gender {
                "male" => Some(Gender::Male),
                "female" => Some(Gender::Female),
                _ => None,
            };
            if let (Some(region), Some(gender)) = (Region::parse(region), gender) {
                return Ok(SubjectCategory::Explicit { region, gender });
            }
        }

        Err(format!("unknown subject category: {:?}", category))
    }

    fn to_raw(&self) -> (String, Option<String>, Option<String>) {
        match self {
            SubjectCategory::Explicit { region, gender } => (
                format!("{}_{}", region.as_str(), gender.as_str()),
                None,
                None,
            ),
            SubjectCategory::Gendered { region } => (region.as_str().to_string(), None, None),
            SubjectCategory::Custom { male, female } => {
                ("custom".to_string(), male.clone(), female.clone())
            }
        }
    }
}

/// A subject as configured by the clinic: which treatment areas it offers and
/// which reference image they are drawn on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSubjectConfig", into = "RawSubjectConfig")]
pub struct SubjectConfig {
    pub key: SubjectKey,
    pub name: String,
    pub category: SubjectCategory,
}

impl SubjectConfig {
    /// True when no gender is implied and the variants differ by gender.
    pub fn requires_gender_choice(&self) -> bool {
        match &self.category {
            SubjectCategory::Explicit { .. } => false,
            SubjectCategory::Gendered { .. } => true,
            SubjectCategory::Custom { male, female } => male.is_some() && female.is_some(),
        }
    }

    pub fn implied_gender(&self) -> Option<Gender> {
        match &self.category {
            SubjectCategory::Explicit { gender, .. } => Some(*gender),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSubjectConfig {
    key: String,
    #[serde(default)]
    name: String,
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    male_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    female_image: Option<String>,
}

impl TryFrom<RawSubjectConfig> for SubjectConfig {
    type Error = String;

    fn try_from(raw: RawSubjectConfig) -> Result<Self, Self::Error> {
        let category = SubjectCategory::parse(&raw.category, raw.male_image, raw.female_image)?;
        let name = if raw.name.is_empty() {
            raw.key.clone()
        } else {
            raw.name
        };
        Ok(SubjectConfig {
            key: SubjectKey(raw.key),
            name,
            category,
        })
    }
}

impl From<SubjectConfig> for RawSubjectConfig {
    fn from(config: SubjectConfig) -> Self {
        let (category, male_image, female_image) = config.category.to_raw();
        RawSubjectConfig {
            key: config.key.0,
            name: config.name,
            category,
            male_image,
            female_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(price: f64, shapes: usize) -> Group {
        Group {
            id: GroupId::generate(),
            name: "area".to_string(),
            price,
            shapes: vec![Shape::new(1., 1., 5., 5.); shapes],
        }
    }

    #[test]
    fn total_ignores_shape_count() {
        let a = group(150.0, 3);
        let b = group(80.0, 1);
        assert_eq!(total_price([&a, &b]), 230.0);
    }

    #[test]
    fn lenient_price_parsing() {
        assert_eq!(parse_price("120"), 120.0);
        assert_eq!(parse_price(" 99,50 "), 99.5);
        assert_eq!(parse_price("abc"), 0.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("-4"), 0.0);
        assert_eq!(parse_price("NaN"), 0.0);
        assert_eq!(parse_price("inf"), 0.0);
    }

    #[test]
    fn generated_ids_fit_json_numbers() {
        for _ in 0..100 {
            let id = GroupId::generate();
            assert!(id.0 >= 1 && id.0 <= MAX_JSON_SAFE_ID);
        }
    }

    #[test]
    fn category_parsing() {
        assert_eq!(
            SubjectCategory::parse("face", None, None),
            Ok(SubjectCategory::Gendered { region: Region::Face })
        );
        assert_eq!(
            SubjectCategory::parse("Body_Female", None, None),
            Ok(SubjectCategory::Explicit {
                region: Region::Body,
                gender: Gender::Female
            })
        );
        assert_eq!(
            SubjectCategory::parse("custom", Some("m.png".into()), Some("  ".into())),
            Ok(SubjectCategory::Custom {
                male: Some("m.png".into()),
                female: None
            })
        );
        assert!(SubjectCategory::parse("legs", None, None).is_err());
        assert!(SubjectCategory::parse("face_other", None, None).is_err());
    }

    #[test]
    fn gender_choice_requirement() {
        let subject = |category| SubjectConfig {
            key: SubjectKey("s".into()),
            name: "s".into(),
            category,
        };

        assert!(subject(SubjectCategory::Gendered { region: Region::Face }).requires_gender_choice());
        assert!(!subject(SubjectCategory::Explicit {
            region: Region::Face,
            gender: Gender::Male
        })
        .requires_gender_choice());
        assert!(!subject(SubjectCategory::Custom {
            male: None,
            female: Some("f.png".into())
        })
        .requires_gender_choice());
    }

    #[test]
    fn subject_config_from_toml() {
        let s: SubjectConfig = toml::from_str(
            r#"
            key = "lips"
            category = "face_female"
            "#,
        )
        .unwrap();
        assert_eq!(s.name, "lips");
        assert_eq!(s.implied_gender(), Some(Gender::Female));

        let back = toml::to_string(&s).unwrap();
        assert!(back.contains("face_female"));
    }
}
