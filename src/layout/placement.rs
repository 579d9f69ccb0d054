//! The placement service: swapping elements and placeholders in and out of
//! cells while keeping every cell covered.

use thiserror::Error;
use tracing::error;

use super::FormLayout;
use crate::binding::{Interaction, RenderBinding};
use crate::model::{Cell, ElementKind};

/// Fatal placement failures.
///
/// Both variants signal a corrupted or inconsistent model. They abort only
/// the attempted operation, leaving prior state untouched, and must surface
/// to the hosting application as a hard failure of that operation; the
/// model is not self-healing from either. Everything else in this engine is
/// a policy branch, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// An element's declared parent cannot be resolved to a live container.
    #[error("element `{0}` is missing its parent container")]
    MissingParent(String),
    /// The model has no top-level container to build the form from.
    #[error("the model has no top-level container")]
    MissingTopLevel,
}

impl<R: RenderBinding> FormLayout<R> {
    /// Places an element's rendering into a container cell.
    ///
    /// The target container and cell default to the element's own stored
    /// parent and position; both can be overridden, e.g. while the user
    /// moves an existing element. A placeholder occupying the resolved cell
    /// is swapped out. An element flagged as orphaned is placed logically
    /// but rendered as absent: hidden, with a fresh placeholder covering the
    /// cell instead.
    pub fn place_element(
        &mut self,
        r: &mut R,
        name: &str,
        target: Option<&str>,
        cell: Option<Cell>,
    ) -> Result<R::Handle, PlacementError> {
        let Some(el) = self.model.get(name) else {
            error!("place_element: `{name}` is not in the model");
            return Err(PlacementError::MissingParent(name.to_string()));
        };
        let kind = el.kind;
        let sticky = el.sticky;
        let remove = el.remove;
        let stored_cell = el.cell;
        let text = el.text.clone();

        let parent_name = match target {
            Some(target) => target.to_string(),
            None => el.parent.clone().ok_or_else(|| {
                error!("element `{name}` has no parent and no explicit target");
                PlacementError::MissingParent(name.to_string())
            })?,
        };
        let parent_handle = self
            .model
            .get(&parent_name)
            .and_then(|parent| parent.handle.clone())
            .ok_or_else(|| {
                error!("element `{name}` references `{parent_name}`, which has no live rendering");
                PlacementError::MissingParent(name.to_string())
            })?;

        let cell = cell.unwrap_or(stored_cell);

        // The resolved cell may be covered by a live preview; structural
        // edits reset the drag session. Runs after resolution so a failed
        // placement leaves prior state untouched.
        self.clear_preview(r);

        // Swap out the placeholder at the resolved cell.
        if let Some(occ) = r.occupant_at(&parent_handle, cell) {
            if self.placeholders.remove(&occ) {
                r.destroy(&occ);
            }
        }

        let handle = match kind {
            ElementKind::GridContainer | ElementKind::TabbedContainer => {
                r.create_container(kind, &parent_handle)
            }
            _ => r.create_leaf(kind, &parent_handle, text.as_deref()),
        };
        r.bind(&handle, Interaction::Motion);
        r.bind(
            &handle,
            Interaction::ElementPress {
                element: name.to_string(),
            },
        );
        r.bind(&handle, Interaction::Release);

        r.place(&handle, cell, sticky);

        if remove {
            r.hide(&handle);
            self.new_placeholder(r, &parent_handle, &parent_name, cell);
        }

        if let Some(el) = self.model.get_mut(name) {
            el.handle = Some(handle.clone());
        }
        Ok(handle)
    }

    /// Removes an element's rendering, restoring its cell's placeholder.
    ///
    /// The inverse swap of [`place_element`](Self::place_element): the
    /// subtree of a container is emptied first, the rendering is destroyed,
    /// and exactly one placeholder is restored at the vacated cell when the
    /// parent is a live grid container and the cell is inside its current
    /// extents. The element itself stays in the model.
    pub fn remove_element(&mut self, r: &mut R, name: &str) {
        // The preview may live inside the removed subtree.
        self.clear_preview(r);

        let Some(el) = self.model.get(name) else {
            return;
        };
        let kind = el.kind;
        let cell = el.cell;
        let parent_name = el.parent.clone();
        let Some(handle) = el.handle.clone() else {
            return;
        };

        if kind.is_container() {
            self.empty(r, name);
        }
        r.destroy(&handle);
        if let Some(el) = self.model.get_mut(name) {
            el.handle = None;
        }

        let Some(parent_name) = parent_name else {
            return;
        };
        let Some(parent) = self.model.get(&parent_name) else {
            return;
        };
        if parent.kind.is_grid_container()
            && cell.column < parent.columns
            && cell.row < parent.rows
        {
            if let Some(parent_handle) = parent.handle.clone() {
                // An orphaned element leaves its cell covered already.
                if r.occupant_at(&parent_handle, cell).is_none() {
                    self.new_placeholder(r, &parent_handle, &parent_name, cell);
                }
            }
        }
    }
}
