//! Typed resume document schema.
//!
//! The wire format (JSONB column, sync messages, JSON export) matches the
//! structure the artboard templates consume: camelCase field names, sections
//! keyed by fixed lowercase keys plus an open-ended `custom` map, and layout
//! references encoded as plain strings (`"experience"`, `"custom.<id>"`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{layout, DocumentError};

// ────────────────────────────────────────────────────────────────────────────
// Envelope
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(DocumentError::Validation(format!(
                "unknown visibility `{other}`"
            ))),
        }
    }
}

/// A resume as the editor session and persistence layer see it: the document
/// data plus the envelope fields that travel with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub data: ResumeData,
    pub visibility: Visibility,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Document root
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeData {
    pub basics: Basics,
    pub sections: Sections,
    pub metadata: Metadata,
}

impl ResumeData {
    /// Checks the structural invariants: no dangling layout references, every
    /// custom section placed exactly once, at least one page, and item ids
    /// unique within each section.
    pub fn validate(&self) -> Result<(), DocumentError> {
        layout::validate_layout(&self.metadata.layout, &self.sections)?;
        self.sections.validate_item_ids()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Basics {
    pub name: String,
    pub headline: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub url: Url,
    pub custom_fields: Vec<CustomField>,
    pub picture: Picture,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Url {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomField {
    pub id: String,
    pub icon: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Picture {
    pub url: String,
    pub size: f64,
    pub aspect_ratio: f64,
    pub border_radius: f64,
    pub effects: PictureEffects,
}

impl Default for Picture {
    fn default() -> Self {
        Picture {
            url: String::new(),
            size: 64.0,
            aspect_ratio: 1.0,
            border_radius: 0.0,
            effects: PictureEffects::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PictureEffects {
    pub hidden: bool,
    pub border: bool,
    pub grayscale: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

/// The fixed set of section keys. Fixed sections always exist in the typed
/// model (they may merely be absent from the layout); only custom sections
/// come and go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FixedSectionKey {
    Summary,
    Awards,
    Certifications,
    Education,
    Experience,
    Volunteer,
    Interests,
    Languages,
    Profiles,
    Projects,
    Publications,
    References,
    Skills,
}

impl FixedSectionKey {
    pub const ALL: [FixedSectionKey; 13] = [
        FixedSectionKey::Summary,
        FixedSectionKey::Awards,
        FixedSectionKey::Certifications,
        FixedSectionKey::Education,
        FixedSectionKey::Experience,
        FixedSectionKey::Volunteer,
        FixedSectionKey::Interests,
        FixedSectionKey::Languages,
        FixedSectionKey::Profiles,
        FixedSectionKey::Projects,
        FixedSectionKey::Publications,
        FixedSectionKey::References,
        FixedSectionKey::Skills,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FixedSectionKey::Summary => "summary",
            FixedSectionKey::Awards => "awards",
            FixedSectionKey::Certifications => "certifications",
            FixedSectionKey::Education => "education",
            FixedSectionKey::Experience => "experience",
            FixedSectionKey::Volunteer => "volunteer",
            FixedSectionKey::Interests => "interests",
            FixedSectionKey::Languages => "languages",
            FixedSectionKey::Profiles => "profiles",
            FixedSectionKey::Projects => "projects",
            FixedSectionKey::Publications => "publications",
            FixedSectionKey::References => "references",
            FixedSectionKey::Skills => "skills",
        }
    }
}

impl FromStr for FixedSectionKey {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FixedSectionKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DocumentError::SectionNotFound(s.to_string()))
    }
}

impl fmt::Display for FixedSectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A layout reference to a section: either a fixed key or `custom.<id>`.
/// The wire format is the plain string the layout columns carry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SectionRef {
    Fixed(FixedSectionKey),
    Custom(String),
}

impl SectionRef {
    pub fn custom(id: impl Into<String>) -> Self {
        SectionRef::Custom(id.into())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, SectionRef::Custom(_))
    }
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionRef::Fixed(key) => f.write_str(key.as_str()),
            SectionRef::Custom(id) => write!(f, "custom.{id}"),
        }
    }
}

impl From<SectionRef> for String {
    fn from(r: SectionRef) -> String {
        r.to_string()
    }
}

impl TryFrom<String> for SectionRef {
    type Error = DocumentError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for SectionRef {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("custom.") {
            if id.is_empty() {
                return Err(DocumentError::SectionNotFound(s.to_string()));
            }
            return Ok(SectionRef::Custom(id.to_string()));
        }
        s.parse::<FixedSectionKey>().map(SectionRef::Fixed)
    }
}

/// The free-text section variant (summary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentSection {
    pub id: String,
    pub name: String,
    pub columns: u8,
    pub separate_links: bool,
    pub visible: bool,
    pub content: String,
}

impl Default for ContentSection {
    fn default() -> Self {
        ContentSection {
            id: String::new(),
            name: String::new(),
            columns: 1,
            separate_links: true,
            visible: true,
            content: String::new(),
        }
    }
}

/// The item-list section variant, parameterized over the item kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemSection<T> {
    pub id: String,
    pub name: String,
    pub columns: u8,
    pub separate_links: bool,
    pub visible: bool,
    pub items: Vec<T>,
}

impl<T> Default for ItemSection<T> {
    fn default() -> Self {
        ItemSection {
            id: String::new(),
            name: String::new(),
            columns: 1,
            separate_links: true,
            visible: true,
            items: Vec::new(),
        }
    }
}

pub type CustomSection = ItemSection<CustomItem>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    pub summary: ContentSection,
    pub awards: ItemSection<Award>,
    pub certifications: ItemSection<Certification>,
    pub education: ItemSection<Education>,
    pub experience: ItemSection<Experience>,
    pub volunteer: ItemSection<Volunteer>,
    pub interests: ItemSection<Interest>,
    pub languages: ItemSection<Language>,
    pub profiles: ItemSection<Profile>,
    pub projects: ItemSection<Project>,
    pub publications: ItemSection<Publication>,
    pub references: ItemSection<Reference>,
    pub skills: ItemSection<Skill>,
    pub custom: BTreeMap<String, CustomSection>,
}

impl Sections {
    /// Ids of all custom sections currently present.
    pub fn custom_ids(&self) -> Vec<&str> {
        self.custom.keys().map(String::as_str).collect()
    }

    /// True if `r` resolves to an existing section. Fixed keys always exist.
    pub fn contains(&self, r: &SectionRef) -> bool {
        match r {
            SectionRef::Fixed(_) => true,
            SectionRef::Custom(id) => self.custom.contains_key(id),
        }
    }

    pub(crate) fn validate_item_ids(&self) -> Result<(), DocumentError> {
        fn check<T: ResumeItem>(key: &str, items: &[T]) -> Result<(), DocumentError> {
            let mut seen = std::collections::HashSet::new();
            for item in items {
                if !seen.insert(item.id()) {
                    return Err(DocumentError::Validation(format!(
                        "duplicate item id `{}` in section `{key}`",
                        item.id()
                    )));
                }
            }
            Ok(())
        }

        check("awards", &self.awards.items)?;
        check("certifications", &self.certifications.items)?;
        check("education", &self.education.items)?;
        check("experience", &self.experience.items)?;
        check("volunteer", &self.volunteer.items)?;
        check("interests", &self.interests.items)?;
        check("languages", &self.languages.items)?;
        check("profiles", &self.profiles.items)?;
        check("projects", &self.projects.items)?;
        check("publications", &self.publications.items)?;
        check("references", &self.references.items)?;
        check("skills", &self.skills.items)?;
        for (id, section) in &self.custom {
            check(&format!("custom.{id}"), &section.items)?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Items
// ────────────────────────────────────────────────────────────────────────────

/// Common surface of every section item: a unique-within-section id and a
/// visibility flag.
pub trait ResumeItem {
    fn id(&self) -> &str;
    fn visible(&self) -> bool;
}

macro_rules! resume_item {
    ($ty:ty) => {
        impl ResumeItem for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn visible(&self) -> bool {
                self.visible
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: String,
    pub visible: bool,
    pub network: String,
    pub username: String,
    pub icon: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub id: String,
    pub visible: bool,
    pub company: String,
    pub position: String,
    pub location: String,
    pub date: String,
    pub summary: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub visible: bool,
    pub institution: String,
    pub study_type: String,
    pub area: String,
    pub score: String,
    pub date: String,
    pub summary: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub id: String,
    pub visible: bool,
    pub name: String,
    pub description: String,
    pub level: u8,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Language {
    pub id: String,
    pub visible: bool,
    pub name: String,
    pub description: String,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Award {
    pub id: String,
    pub visible: bool,
    pub title: String,
    pub awarder: String,
    pub date: String,
    pub summary: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub id: String,
    pub visible: bool,
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub summary: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interest {
    pub id: String,
    pub visible: bool,
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub visible: bool,
    pub name: String,
    pub description: String,
    pub date: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Publication {
    pub id: String,
    pub visible: bool,
    pub name: String,
    pub publisher: String,
    pub date: String,
    pub summary: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volunteer {
    pub id: String,
    pub visible: bool,
    pub organization: String,
    pub position: String,
    pub location: String,
    pub date: String,
    pub summary: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub id: String,
    pub visible: bool,
    pub name: String,
    pub description: String,
    pub summary: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomItem {
    pub id: String,
    pub visible: bool,
    pub name: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub url: Url,
}

resume_item!(Profile);
resume_item!(Experience);
resume_item!(Education);
resume_item!(Skill);
resume_item!(Language);
resume_item!(Award);
resume_item!(Certification);
resume_item!(Interest);
resume_item!(Project);
resume_item!(Publication);
resume_item!(Volunteer);
resume_item!(Reference);
resume_item!(CustomItem);

// Items default to visible; every other field starts empty.
macro_rules! default_item {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl Default for $ty {
            fn default() -> Self {
                $ty {
                    visible: true,
                    $($field: Default::default()),*
                }
            }
        }
    };
}

default_item!(Profile { id, network, username, icon, url });
default_item!(Experience { id, company, position, location, date, summary, url });
default_item!(Education { id, institution, study_type, area, score, date, summary, url });
default_item!(Skill { id, name, description, level, keywords });
default_item!(Language { id, name, description, level });
default_item!(Award { id, title, awarder, date, summary, url });
default_item!(Certification { id, name, issuer, date, summary, url });
default_item!(Interest { id, name, keywords });
default_item!(Project { id, name, description, date, summary, keywords, url });
default_item!(Publication { id, name, publisher, date, summary, url });
default_item!(Volunteer { id, organization, position, location, date, summary, url });
default_item!(Reference { id, name, description, summary, url });
default_item!(CustomItem { id, name, description, date, location, summary, keywords, url });

// ────────────────────────────────────────────────────────────────────────────
// Metadata
// ────────────────────────────────────────────────────────────────────────────

/// One rendered page: a main column and a sidebar column of section refs.
/// Serializes as a two-element array, matching the stored layout grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page(pub [Vec<SectionRef>; 2]);

impl Page {
    pub fn empty() -> Self {
        Page([Vec::new(), Vec::new()])
    }

    pub fn main(&self) -> &Vec<SectionRef> {
        &self.0[0]
    }

    pub fn sidebar(&self) -> &Vec<SectionRef> {
        &self.0[1]
    }

    pub fn column(&self, index: usize) -> Option<&Vec<SectionRef>> {
        self.0.get(index)
    }

    pub fn column_mut(&mut self, index: usize) -> Option<&mut Vec<SectionRef>> {
        self.0.get_mut(index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub template: String,
    pub layout: Vec<Page>,
    pub css: Css,
    pub page: PageSettings,
    pub theme: Theme,
    pub typography: Typography,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Css {
    pub value: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub margin: f64,
    pub format: PageFormat,
    pub options: PageOptions,
}

impl Default for PageSettings {
    fn default() -> Self {
        PageSettings {
            margin: 18.0,
            format: PageFormat::A4,
            options: PageOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
}

impl PageFormat {
    /// Page size in millimeters (width, height).
    pub fn size_mm(&self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Letter => (216.0, 279.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageOptions {
    pub break_line: bool,
    pub page_numbers: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        PageOptions {
            break_line: true,
            page_numbers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: String,
    pub text: String,
    pub primary: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: "#ffffff".to_string(),
            text: "#000000".to_string(),
            primary: "#dc2626".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Typography {
    pub font: Font,
    pub line_height: f64,
    pub hide_icons: bool,
    pub underline_links: bool,
}

impl Default for Typography {
    fn default() -> Self {
        Typography {
            font: Font::default(),
            line_height: 1.5,
            hide_icons: false,
            underline_links: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Font {
    pub family: String,
    pub subset: String,
    pub variants: Vec<String>,
    pub size: f64,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            family: "IBM Plex Sans".to_string(),
            subset: "latin".to_string(),
            variants: vec![
                "regular".to_string(),
                "italic".to_string(),
                "600".to_string(),
            ],
            size: 14.0,
        }
    }
}
