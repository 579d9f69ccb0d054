//! Occupancy resolution.
//!
//! Keeps every cell of every live grid container occupied: `fill` walks a
//! container and its model children, creating placeholders for empty cells
//! and placing real elements over them; `empty` is the inverse, tearing a
//! container's rendered children down (containers before their own
//! destruction) while clearing the model's non-owning handles.

use tracing::trace;

use super::placement::PlacementError;
use super::FormLayout;
use crate::binding::{Interaction, RenderBinding};
use crate::model::{Cell, ElementKind, Sticky};

/// Handles of all live placeholders.
///
/// Supports removal without destruction: when a preview subtree is destroyed
/// through its root handle, the placeholders inside it die with it and must
/// only be forgotten here.
#[derive(Debug, Default)]
pub(crate) struct PlaceholderSet<H> {
    handles: Vec<H>,
}

impl<H: PartialEq> PlaceholderSet<H> {
    pub(crate) fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, handle: H) {
        self.handles.push(handle);
    }

    /// Forgets the handle. Returns whether it was tracked; destruction is
    /// the caller's decision.
    pub(crate) fn remove(&mut self, handle: &H) -> bool {
        match self.handles.iter().position(|h| h == handle) {
            Some(idx) => {
                self.handles.remove(idx);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, handle: &H) -> bool {
        self.handles.iter().any(|h| h == handle)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    #[cfg(test)]
    pub(crate) fn verify_no_duplicates(&self) {
        for (i, a) in self.handles.iter().enumerate() {
            assert!(
                !self.handles[i + 1..].contains(a),
                "placeholder tracked twice",
            );
        }
    }
}

impl<R: RenderBinding> FormLayout<R> {
    /// Fills a container's rendering.
    ///
    /// For a grid container: every cell without an occupant gets a
    /// placeholder, then every model child is handled: children whose cell
    /// falls outside the current extents are flagged as orphaned and left
    /// unplaced, containers are placed and filled depth-first, leaves are
    /// placed. For a tabbed container: each page child is materialized,
    /// added as a tab and filled, and the first page is selected.
    pub fn fill(&mut self, r: &mut R, name: &str) -> Result<(), PlacementError> {
        let Some(el) = self.model.get(name) else {
            return Ok(());
        };
        let kind = el.kind;
        let (columns, rows) = (el.columns, el.rows);
        let Some(handle) = el.handle.clone() else {
            return Ok(());
        };

        match kind {
            ElementKind::GridContainer => {
                trace!("filling `{name}` ({columns}x{rows})");

                for column in 0..columns {
                    for row in 0..rows {
                        let cell = Cell::new(column, row);
                        if r.occupant_at(&handle, cell).is_none() {
                            self.new_placeholder(r, &handle, name, cell);
                        }
                    }
                }

                let children: Vec<String> =
                    self.model.children_of(name).map(|c| c.name.clone()).collect();
                for child_name in children {
                    let Some(child) = self.model.get(&child_name) else {
                        continue;
                    };
                    if child.handle.is_some() {
                        // Already rendered; fill only runs over emptied
                        // containers.
                        continue;
                    }
                    let child_kind = child.kind;
                    let outside =
                        child.cell.column >= columns || child.cell.row >= rows;

                    if let Some(child) = self.model.get_mut(&child_name) {
                        child.remove = outside;
                    }
                    if outside {
                        continue;
                    }

                    self.place_element(r, &child_name, None, None)?;
                    if child_kind.is_container() {
                        self.fill(r, &child_name)?;
                    }
                }
            }
            ElementKind::TabbedContainer => {
                let children: Vec<String> =
                    self.model.children_of(name).map(|c| c.name.clone()).collect();
                let mut first_page = None;
                for child_name in children {
                    let Some(child) = self.model.get(&child_name) else {
                        continue;
                    };
                    if child.handle.is_some() || !child.kind.is_grid_container() {
                        continue;
                    }
                    let label = child.text.clone().unwrap_or_else(|| child_name.clone());

                    let page = r.create_container(ElementKind::GridContainer, &handle);
                    r.bind(&page, Interaction::Motion);
                    r.bind(
                        &page,
                        Interaction::ElementPress {
                            element: child_name.clone(),
                        },
                    );
                    r.bind(&page, Interaction::Release);
                    r.add_tab(&handle, &page, &label);

                    if let Some(child) = self.model.get_mut(&child_name) {
                        child.handle = Some(page.clone());
                    }
                    self.fill(r, &child_name)?;

                    if first_page.is_none() {
                        first_page = Some(page);
                    }
                }
                if let Some(page) = first_page {
                    r.select_tab(&handle, &page);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Tears down a container's rendered children.
    ///
    /// Placeholders are forgotten and destroyed; model children have their
    /// subtrees emptied before their own destruction, and their non-owning
    /// handles cleared. The container's own rendering is left alone.
    pub fn empty(&mut self, r: &mut R, name: &str) {
        let Some(el) = self.model.get(name) else {
            return;
        };
        let Some(handle) = el.handle.clone() else {
            return;
        };

        for occ in r.occupants(&handle) {
            if self.placeholders.remove(&occ) {
                r.destroy(&occ);
            }
        }

        let children: Vec<String> = self.model.children_of(name).map(|c| c.name.clone()).collect();
        for child_name in children {
            let Some(child) = self.model.get(&child_name) else {
                continue;
            };
            let child_kind = child.kind;
            let Some(child_handle) = child.handle.clone() else {
                continue;
            };
            if child_kind.is_container() {
                self.empty(r, &child_name);
            }
            r.destroy(&child_handle);
            if let Some(child) = self.model.get_mut(&child_name) {
                child.handle = None;
            }
        }
    }

    /// Empties and re-fills one container after a structural edit (extent
    /// change, reordered children).
    pub fn rebuild_container(&mut self, r: &mut R, name: &str) -> Result<(), PlacementError> {
        // A preview anchored inside the subtree would dangle across the
        // rebuild.
        self.clear_preview(r);
        self.empty(r, name);
        self.fill(r, name)
    }

    /// Creates, places, binds and tracks one placeholder.
    pub(crate) fn new_placeholder(
        &mut self,
        r: &mut R,
        parent: &R::Handle,
        container_name: &str,
        cell: Cell,
    ) -> R::Handle {
        let ph = r.create_placeholder(parent, &self.options.placeholder_text);
        r.place(&ph, cell, Sticky::empty());
        r.bind(&ph, Interaction::Motion);
        r.bind(
            &ph,
            Interaction::ElementPress {
                element: container_name.to_string(),
            },
        );
        r.bind(&ph, Interaction::Release);
        self.placeholders.insert(ph.clone());
        ph
    }
}
