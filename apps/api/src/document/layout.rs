#![allow(dead_code)]

//! Layout grid reflow: drag-relocation of sections between page/column slots,
//! page add/remove, and the reset-to-template-default transform.
//!
//! All operations are pure `Vec<Page> -> Vec<Page>` transforms that fail
//! closed: on error the input layout is returned untouched to the caller.
//! The structural invariants (§ every reference resolves, every custom
//! section placed exactly once, page 0 never removed) are enforced by
//! `validate_layout`, which runs on every structural document mutation.

use thiserror::Error;

use crate::document::defaults::default_layout;
use crate::document::schema::{Page, SectionRef, Sections};

/// An addressable position in the layout grid.
///
/// `index: None` models a drop without a precise slot (empty column or page
/// background); such drops insert at the top of the addressed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub page: usize,
    pub column: usize,
    pub index: Option<usize>,
}

impl Locator {
    pub fn new(page: usize, column: usize, index: usize) -> Self {
        Locator {
            page,
            column,
            index: Some(index),
        }
    }

    pub fn column_of(page: usize, column: usize) -> Self {
        Locator {
            page,
            column,
            index: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout has no pages")]
    NoPages,

    #[error("page {0} does not exist")]
    PageOutOfBounds(usize),

    #[error("column {0} does not exist")]
    ColumnOutOfBounds(usize),

    #[error("no section at page {page}, column {column}, index {index}")]
    NoSectionAtSource {
        page: usize,
        column: usize,
        index: usize,
    },

    #[error("page 0 cannot be removed")]
    PageZeroProtected,

    #[error("section reference `{0}` does not resolve to an existing section")]
    DanglingReference(String),

    #[error("section reference `{0}` appears more than once in the layout")]
    DuplicateReference(String),

    #[error("custom section `{0}` is not placed in the layout")]
    UnplacedCustomSection(String),
}

/// Moves the section reference at `current` to `target`.
///
/// Identity moves return the layout unchanged. The reference is removed
/// first, then inserted at the target index, clamped so that an index past
/// the end of the column appends.
pub fn move_section(
    current: Locator,
    target: Locator,
    layout: &[Page],
) -> Result<Vec<Page>, LayoutError> {
    if current == target {
        return Ok(layout.to_vec());
    }

    let source_index = current.index.unwrap_or(0);
    let mut next: Vec<Page> = layout.to_vec();

    let source_column = next
        .get_mut(current.page)
        .ok_or(LayoutError::PageOutOfBounds(current.page))?
        .column_mut(current.column)
        .ok_or(LayoutError::ColumnOutOfBounds(current.column))?;
    if source_index >= source_column.len() {
        return Err(LayoutError::NoSectionAtSource {
            page: current.page,
            column: current.column,
            index: source_index,
        });
    }
    let section = source_column.remove(source_index);

    let target_column = next
        .get_mut(target.page)
        .ok_or(LayoutError::PageOutOfBounds(target.page))?
        .column_mut(target.column)
        .ok_or(LayoutError::ColumnOutOfBounds(target.column))?;
    let insert_at = target.index.unwrap_or(0).min(target_column.len());
    target_column.insert(insert_at, section);

    Ok(next)
}

/// Appends an empty two-column page.
pub fn add_page(layout: &[Page]) -> Vec<Page> {
    let mut next = layout.to_vec();
    next.push(Page::empty());
    next
}

/// Removes page `page` (never page 0), folding its main column into page 0's
/// main column and its sidebar into page 0's sidebar, order preserved.
pub fn remove_page(page: usize, layout: &[Page]) -> Result<Vec<Page>, LayoutError> {
    if page == 0 {
        return Err(LayoutError::PageZeroProtected);
    }
    if page >= layout.len() {
        return Err(LayoutError::PageOutOfBounds(page));
    }

    let mut next = layout.to_vec();
    let removed = next.remove(page);
    let [main, sidebar] = removed.0;
    next[0].0[0].extend(main);
    next[0].0[1].extend(sidebar);
    Ok(next)
}

/// Restores the template default placement for fixed sections. Custom
/// sections currently placed anywhere are collected in their relative order
/// and appended to page 0's main column so none is dropped.
pub fn reset_layout(layout: &[Page]) -> Vec<Page> {
    let custom: Vec<SectionRef> = layout
        .iter()
        .flat_map(|page| page.0.iter())
        .flatten()
        .filter(|r| r.is_custom())
        .cloned()
        .collect();

    let mut next = default_layout();
    next[0].0[0].extend(custom);
    next
}

/// Checks the reference-cardinality invariants of a layout against the
/// section table: at least one page, no dangling references, no reference
/// placed twice, every custom section placed exactly once.
pub fn validate_layout(layout: &[Page], sections: &Sections) -> Result<(), LayoutError> {
    if layout.is_empty() {
        return Err(LayoutError::NoPages);
    }

    let mut seen = std::collections::HashSet::new();
    for page in layout {
        for column in &page.0 {
            for r in column {
                if !sections.contains(r) {
                    return Err(LayoutError::DanglingReference(r.to_string()));
                }
                if !seen.insert(r.clone()) {
                    return Err(LayoutError::DuplicateReference(r.to_string()));
                }
            }
        }
    }

    for id in sections.custom_ids() {
        if !seen.contains(&SectionRef::custom(id)) {
            return Err(LayoutError::UnplacedCustomSection(id.to_string()));
        }
    }

    Ok(())
}

/// Removes every occurrence of `section` from the layout (used when a custom
/// section is deleted).
pub fn remove_reference(section: &SectionRef, layout: &[Page]) -> Vec<Page> {
    layout
        .iter()
        .map(|page| {
            let [main, sidebar] = &page.0;
            Page([
                main.iter().filter(|r| *r != section).cloned().collect(),
                sidebar.iter().filter(|r| *r != section).cloned().collect(),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::defaults::{default_resume_data, default_sections};
    use crate::document::schema::FixedSectionKey;

    fn refs(names: &[&str]) -> Vec<SectionRef> {
        names.iter().map(|n| n.parse().unwrap()).collect()
    }

    fn ref_names(column: &[SectionRef]) -> Vec<String> {
        column.iter().map(|r| r.to_string()).collect()
    }

    fn all_refs(layout: &[Page]) -> Vec<String> {
        let mut out: Vec<String> = layout
            .iter()
            .flat_map(|p| p.0.iter())
            .flatten()
            .map(|r| r.to_string())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_move_summary_to_sidebar_top() {
        // The default layout: main starts [profiles, summary, experience, ...].
        let layout = default_layout();
        let moved = move_section(Locator::new(0, 0, 1), Locator::new(0, 1, 0), &layout).unwrap();

        let main = ref_names(moved[0].main());
        let sidebar = ref_names(moved[0].sidebar());
        assert_eq!(&main[..2], &["profiles", "experience"]);
        assert_eq!(&sidebar[..2], &["summary", "skills"]);
    }

    #[test]
    fn test_move_identity_is_noop() {
        let layout = default_layout();
        let loc = Locator::new(0, 0, 2);
        let moved = move_section(loc, loc, &layout).unwrap();
        assert_eq!(moved, layout);
    }

    #[test]
    fn test_move_preserves_reference_multiset() {
        let layout = default_layout();
        let before = all_refs(&layout);
        let moved = move_section(Locator::new(0, 1, 3), Locator::new(0, 0, 0), &layout).unwrap();
        assert_eq!(all_refs(&moved), before);
        validate_layout(&moved, &default_sections()).unwrap();
    }

    #[test]
    fn test_move_index_beyond_length_appends() {
        let layout = default_layout();
        let moved =
            move_section(Locator::new(0, 0, 0), Locator::new(0, 1, 99), &layout).unwrap();
        assert_eq!(
            moved[0].sidebar().last().unwrap().to_string(),
            "profiles"
        );
    }

    #[test]
    fn test_move_without_target_index_inserts_at_top() {
        let mut layout = default_layout();
        layout.push(Page::empty());
        let moved = move_section(
            Locator::new(0, 0, 0),
            Locator::column_of(1, 1),
            &layout,
        )
        .unwrap();
        assert_eq!(ref_names(moved[1].sidebar()), vec!["profiles"]);
    }

    #[test]
    fn test_move_out_of_bounds_fails_closed() {
        let layout = default_layout();
        assert_eq!(
            move_section(Locator::new(3, 0, 0), Locator::new(0, 0, 0), &layout),
            Err(LayoutError::PageOutOfBounds(3))
        );
        assert!(matches!(
            move_section(Locator::new(0, 0, 99), Locator::new(0, 1, 0), &layout),
            Err(LayoutError::NoSectionAtSource { .. })
        ));
    }

    #[test]
    fn test_add_page_appends_empty() {
        let layout = add_page(&default_layout());
        assert_eq!(layout.len(), 2);
        assert!(layout[1].main().is_empty());
        assert!(layout[1].sidebar().is_empty());
    }

    #[test]
    fn test_remove_page_folds_into_page_zero() {
        // Two-page layout: page 1 main [projA], sidebar [skillA] (as custom refs).
        let mut layout = default_layout();
        layout.push(Page([refs(&["custom.projA"]), refs(&["custom.skillA"])]));

        let before = all_refs(&layout);
        let removed = remove_page(1, &layout).unwrap();

        assert_eq!(removed.len(), 1);
        assert_eq!(
            removed[0].main().last().unwrap().to_string(),
            "custom.projA"
        );
        assert_eq!(
            removed[0].sidebar().last().unwrap().to_string(),
            "custom.skillA"
        );
        // Conservation: multiset of references unchanged.
        assert_eq!(all_refs(&removed), before);
    }

    #[test]
    fn test_remove_page_zero_protected() {
        let layout = default_layout();
        assert_eq!(remove_page(0, &layout), Err(LayoutError::PageZeroProtected));
        assert_eq!(remove_page(5, &layout), Err(LayoutError::PageOutOfBounds(5)));
    }

    #[test]
    fn test_reset_layout_keeps_custom_sections_in_order() {
        // c1 on page 0 sidebar, c2 on page 1 main.
        let mut layout = default_layout();
        layout[0].0[1].insert(0, SectionRef::custom("c1"));
        layout.push(Page([refs(&["custom.c2"]), vec![]]));

        let reset = reset_layout(&layout);

        assert_eq!(reset.len(), 1);
        let main = ref_names(reset[0].main());
        // Defaults restored first, then customs appended in relative order.
        assert_eq!(main[main.len() - 2..], ["custom.c1", "custom.c2"]);
        assert_eq!(
            main.iter().filter(|n| n.starts_with("custom.")).count(),
            2
        );
        assert!(reset[0]
            .sidebar()
            .iter()
            .all(|r| !r.is_custom()));
    }

    #[test]
    fn test_validate_rejects_dangling_custom_ref() {
        let mut layout = default_layout();
        layout[0].0[0].push(SectionRef::custom("ghost"));
        let err = validate_layout(&layout, &default_sections()).unwrap_err();
        assert_eq!(
            err,
            LayoutError::DanglingReference("custom.ghost".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_and_unplaced() {
        let sections = default_sections();

        let mut layout = default_layout();
        layout[0].0[1].push(SectionRef::Fixed(FixedSectionKey::Summary));
        assert_eq!(
            validate_layout(&layout, &sections).unwrap_err(),
            LayoutError::DuplicateReference("summary".to_string())
        );

        // Custom section present in the table but absent from the layout.
        let data = default_resume_data("", "", "");
        let mut sections = data.sections;
        sections.custom.insert(
            "c9".to_string(),
            crate::document::defaults::default_custom_section("c9"),
        );
        assert_eq!(
            validate_layout(&default_layout(), &sections).unwrap_err(),
            LayoutError::UnplacedCustomSection("c9".to_string())
        );
    }

    #[test]
    fn test_validate_allows_absent_fixed_sections() {
        // Fixed sections may be missing from the layout entirely.
        let layout = vec![Page([refs(&["experience"]), refs(&["skills"])])];
        validate_layout(&layout, &default_sections()).unwrap();
    }

    #[test]
    fn test_validate_requires_a_page() {
        assert_eq!(
            validate_layout(&[], &default_sections()).unwrap_err(),
            LayoutError::NoPages
        );
    }

    #[test]
    fn test_remove_reference_strips_all_occurrences() {
        let mut layout = default_layout();
        layout[0].0[0].push(SectionRef::custom("x"));
        let stripped = remove_reference(&SectionRef::custom("x"), &layout);
        assert!(all_refs(&stripped).iter().all(|n| n != "custom.x"));
        assert_eq!(all_refs(&stripped).len(), all_refs(&layout).len() - 1);
    }
}
