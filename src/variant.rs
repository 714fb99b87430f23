//! Which reference image and which group dataset a subject uses.
//!
//! Everything here is a pure function of `(SubjectConfig, Option<Gender>)`.

use std::path::Path;

use crate::model::{Gender, Region, SubjectCategory, SubjectConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// One of the bundled `{face,body} x {male,female}` images.
    Default { region: Region, gender: Gender },
    /// Caller-supplied path or `http(s)` URL.
    Custom(String),
}

impl ImageSource {
    pub fn default_file_name(region: Region, gender: Gender) -> String {
        format!("{}_{}.png", region.as_str(), gender.as_str())
    }

    /// Where to fetch the image from: a filesystem path or a URL.
    pub fn locate(&self, image_dir: &Path) -> String {
        match self {
            ImageSource::Default { region, gender } => image_dir
                .join(Self::default_file_name(*region, *gender))
                .to_string_lossy()
                .into_owned(),
            ImageSource::Custom(s) if is_url(s) => s.clone(),
            ImageSource::Custom(s) => {
                let p = Path::new(s);
                if p.is_absolute() {
                    s.clone()
                } else {
                    image_dir.join(p).to_string_lossy().into_owned()
                }
            }
        }
    }
}

pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    pub image: ImageSource,
    /// Partition key for the group dataset. `None` is the single implicit
    /// variant of an ungendered subject.
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Ready(ResolvedVariant),
    /// Gender-dependent subject with no gender chosen yet.
    NeedsGender,
    /// Custom subject configured without any image.
    NoImage,
}

impl Resolution {
    pub fn variant(&self) -> Option<&ResolvedVariant> {
        match self {
            Resolution::Ready(v) => Some(v),
            _ => None,
        }
    }
}

pub fn resolve_variant(config: &SubjectConfig, gender: Option<Gender>) -> Resolution {
    match &config.category {
        SubjectCategory::Explicit { region, gender } => Resolution::Ready(ResolvedVariant {
            image: ImageSource::Default {
                region: *region,
                gender: *gender,
            },
            gender: Some(*gender),
        }),
        SubjectCategory::Gendered { region } => match gender {
            Some(gender) => Resolution::Ready(ResolvedVariant {
                image: ImageSource::Default {
                    region: *region,
                    gender,
                },
                gender: Some(gender),
            }),
            None => Resolution::NeedsGender,
        },
        SubjectCategory::Custom { male, female } => {
            let pick = |g: Gender| match g {
                Gender::Male => male.as_ref(),
                Gender::Female => female.as_ref(),
            };

            match (male, female) {
                (None, None) => Resolution::NoImage,
                (Some(_), Some(_)) => match gender {
                    Some(g) => Resolution::Ready(ResolvedVariant {
                        image: ImageSource::Custom(pick(g).cloned().unwrap_or_default()),
                        gender: Some(g),
                    }),
                    None => Resolution::NeedsGender,
                },
                // a single image serves every gender
                (Some(only), None) | (None, Some(only)) => {
                    let image = gender
                        .and_then(|g| pick(g).or_else(|| pick(g.other())))
                        .unwrap_or(only);
                    Resolution::Ready(ResolvedVariant {
                        image: ImageSource::Custom(image.clone()),
                        gender: None,
                    })
                }
            }
        }
    }
}
