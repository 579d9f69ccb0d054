//! Engine core.
//!
//! [`FormLayout`] owns the grid model, the placeholder set and the drag
//! session, and is the only mutator of all three. The render binding is
//! passed into every entry point rather than stored, which keeps the engine
//! free of toolkit lifetimes and makes the serial-mutation discipline a
//! borrow-checker fact instead of a convention.
//!
//! The implementation is split by concern:
//!
//! ```text
//! layout/
//! ├── mod.rs       - FormLayout, Options, form construction
//! ├── occupancy.rs - placeholder set, fill/empty of containers
//! ├── placement.rs - element <-> placeholder swaps, error taxonomy
//! └── preview.rs   - drag session and the proposed-element state machine
//! ```

use std::rc::Rc;

use formgrid_config::Config;
use tracing::debug;

use crate::binding::{Interaction, RenderBinding};
use crate::model::FormModel;
use self::occupancy::PlaceholderSet;
use self::preview::DragSession;

pub mod occupancy;
pub mod placement;
pub mod preview;


#[cfg(test)]
mod tests;

pub use placement::PlacementError;
pub use preview::MotionResult;

/// Configurable properties of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Grid extents of a fresh grid container, and of preview grids.
    pub default_columns: u32,
    pub default_rows: u32,
    /// Text shown by placeholders marking empty cells.
    pub placeholder_text: String,
    /// Label of the first preview tab of a tabbed-container preview.
    pub preview_tab_label: String,
}

impl Options {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_columns: config.container.columns,
            default_rows: config.container.rows,
            placeholder_text: config.placeholder.text.clone(),
            preview_tab_label: config.preview.tab_label.clone(),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The layout engine for one form.
#[derive(Debug)]
pub struct FormLayout<R: RenderBinding> {
    /// The grid model; exclusively owned, mutated only through the
    /// occupancy resolver and the placement service.
    pub(super) model: FormModel<R::Handle>,
    /// Handles of all live placeholders.
    pub(super) placeholders: PlaceholderSet<R::Handle>,
    /// Drag/preview session state.
    pub(super) session: DragSession<R::Handle>,
    /// Configurable properties of the engine.
    pub(super) options: Rc<Options>,
}

impl<R: RenderBinding> FormLayout<R> {
    pub fn new(model: FormModel<R::Handle>, config: &Config) -> Self {
        Self::with_options(model, Options::from_config(config))
    }

    pub fn with_options(model: FormModel<R::Handle>, options: Options) -> Self {
        Self {
            model,
            placeholders: PlaceholderSet::new(),
            session: DragSession::new(),
            options: Rc::new(options),
        }
    }

    pub fn model(&self) -> &FormModel<R::Handle> {
        &self.model
    }

    /// Mutable access to the model for structural edits; a container whose
    /// extents change must be rebuilt afterwards (see
    /// [`rebuild_container`](Self::rebuild_container)).
    pub fn model_mut(&mut self) -> &mut FormModel<R::Handle> {
        &mut self.model
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Builds (or rebuilds) the form's rendering from the model.
    ///
    /// Locates the single top-level container, tears down any previous
    /// rendering, creates the root rendering, binds the canvas-level
    /// interactions and fills the tree with elements and placeholders.
    pub fn draw(&mut self, r: &mut R) -> Result<(), placement::PlacementError> {
        let top = self
            .model
            .top()
            .ok_or(placement::PlacementError::MissingTopLevel)?;
        let top_name = top.name.clone();

        if let Some(old_root) = top.handle.clone() {
            debug!("rebuilding form root `{top_name}`");
            // Preview first: its subtree lives under the old root but is
            // tracked by the session, not the model.
            self.clear_preview(r);
            self.empty(r, &top_name);
            r.destroy(&old_root);
            if let Some(el) = self.model.get_mut(&top_name) {
                el.handle = None;
            }
        }
        self.session = DragSession::new();

        let root = r.create_root();
        r.bind(&root, Interaction::Motion);
        r.bind(&root, Interaction::CanvasPress);
        r.bind(&root, Interaction::Release);
        r.bind(&root, Interaction::Leave);
        if let Some(el) = self.model.get_mut(&top_name) {
            el.handle = Some(root);
        }

        self.fill(r, &top_name)
    }

    #[cfg(test)]
    pub(crate) fn verify_invariants(&self, r: &R) {
        let proposed_handle = self.session.proposed.as_ref().map(|p| p.handle.clone());

        for el in self.model.elements() {
            if !el.kind.is_grid_container() {
                continue;
            }
            let Some(handle) = &el.handle else {
                continue;
            };

            // Full coverage: every cell has exactly one occupant.
            for column in 0..el.columns {
                for row in 0..el.rows {
                    let cell = crate::model::Cell::new(column, row);
                    assert!(
                        r.occupant_at(handle, cell).is_some(),
                        "cell ({column}, {row}) of `{}` has no occupant",
                        el.name,
                    );
                }
            }

            // Occupant identity: each occupant is exactly one of placeholder,
            // committed element, or the proposed element.
            for occ in r.occupants(handle) {
                let is_placeholder = self.placeholders.contains(&occ);
                let is_element = self.model.by_handle(&occ).is_some();
                let is_proposed = proposed_handle.as_ref() == Some(&occ);
                assert_eq!(
                    usize::from(is_placeholder)
                        + usize::from(is_element)
                        + usize::from(is_proposed),
                    1,
                    "occupant {occ:?} of `{}` must be exactly one of \
                     placeholder/element/proposed",
                    el.name,
                );
            }

            // Orphaned children are rendered as absent: their cell holds a
            // placeholder, not them.
            for child in self.model.children_of(&el.name) {
                if child.remove && child.cell.column < el.columns && child.cell.row < el.rows {
                    let occ = r.occupant_at(handle, child.cell);
                    assert_ne!(
                        occ.as_ref(),
                        child.handle.as_ref(),
                        "orphaned `{}` must not occupy its declared cell",
                        child.name,
                    );
                }
            }
        }

        self.placeholders.verify_no_duplicates();
    }
}
