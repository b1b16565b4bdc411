//! Template-supplied defaults for new resume documents.
//!
//! A fresh document gets the default section set, the default single-page
//! two-column layout, and metadata for the default template, with the owner's
//! profile (name, email, picture) folded into `basics` at creation time.

use crate::document::schema::{
    Basics, ContentSection, CustomSection, FixedSectionKey, Metadata, Page, Picture, ResumeData,
    SectionRef, Sections,
};

/// The visual templates the artboard knows how to paint.
pub const TEMPLATES: [&str; 13] = [
    "azurill",
    "bronzor",
    "chikorita",
    "ditto",
    "gengar",
    "glalie",
    "harvard",
    "kakuna",
    "leafish",
    "nosepass",
    "onyx",
    "pikachu",
    "rhyhorn",
];

pub const DEFAULT_TEMPLATE: &str = "rhyhorn";

/// The default placement of fixed sections: one page, main column and sidebar.
pub fn default_layout() -> Vec<Page> {
    use FixedSectionKey::*;

    let main = [
        Profiles,
        Summary,
        Experience,
        Education,
        Projects,
        Volunteer,
        References,
    ];
    let sidebar = [
        Skills,
        Interests,
        Certifications,
        Awards,
        Publications,
        Languages,
    ];

    vec![Page([
        main.into_iter().map(SectionRef::Fixed).collect(),
        sidebar.into_iter().map(SectionRef::Fixed).collect(),
    ])]
}

pub fn default_sections() -> Sections {
    fn content(key: FixedSectionKey, name: &str) -> ContentSection {
        ContentSection {
            id: key.as_str().to_string(),
            name: name.to_string(),
            ..ContentSection::default()
        }
    }

    macro_rules! items {
        ($key:expr, $name:expr) => {
            crate::document::schema::ItemSection {
                id: $key.as_str().to_string(),
                name: $name.to_string(),
                ..Default::default()
            }
        };
    }

    use FixedSectionKey::*;

    Sections {
        summary: content(Summary, "Summary"),
        awards: items!(Awards, "Awards"),
        certifications: items!(Certifications, "Certifications"),
        education: items!(Education, "Education"),
        experience: items!(Experience, "Experience"),
        volunteer: items!(Volunteer, "Volunteering"),
        interests: items!(Interests, "Interests"),
        languages: items!(Languages, "Languages"),
        profiles: items!(Profiles, "Profiles"),
        projects: items!(Projects, "Projects"),
        publications: items!(Publications, "Publications"),
        references: items!(References, "References"),
        skills: items!(Skills, "Skills"),
        custom: Default::default(),
    }
}

/// A new custom section as created by "Add Custom Section".
pub fn default_custom_section(id: &str) -> CustomSection {
    CustomSection {
        id: id.to_string(),
        name: "Custom Section".to_string(),
        ..Default::default()
    }
}

/// The full default document with the owner's profile folded in.
pub fn default_resume_data(name: &str, email: &str, picture_url: &str) -> ResumeData {
    ResumeData {
        basics: Basics {
            name: name.to_string(),
            email: email.to_string(),
            picture: Picture {
                url: picture_url.to_string(),
                ..Picture::default()
            },
            ..Basics::default()
        },
        sections: default_sections(),
        metadata: Metadata {
            template: DEFAULT_TEMPLATE.to_string(),
            layout: default_layout(),
            ..Metadata::default()
        },
    }
}
