//! The render binding capability.
//!
//! The engine never talks to a toolkit directly. Everything it needs from
//! the rendered side goes through [`RenderBinding`], leaving the engine a
//! pure tree-and-state machine that is exercised in tests against an
//! in-memory implementation.
//!
//! Handle ownership: handles are created and destroyed by the binding, and
//! every handle is destroyed exactly once, by whichever of the occupancy
//! resolver, placement service or preview machine created it. Destroying a
//! container handle destroys its entire rendered subtree; book-keeping
//! references into that subtree are purged without a second destruction.

use std::fmt;

use crate::model::{Cell, ElementKind, Sticky};

/// Interactions the engine attaches to rendered handles.
///
/// The binding wires these to real toolkit events and routes them back to
/// the hosting application, which re-enters the engine (motion, leave) or
/// its own collaborators (clicks, release).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Pointer motion over the handle; drives the drag-preview machine.
    Motion,
    /// Primary-button press on (or within) the named committed element.
    ElementPress { element: String },
    /// Primary-button press on a not-yet-committed proposed element; routes
    /// to the host's commit-insertion handler.
    ProposedPress,
    /// Primary-button press on empty canvas space; clears the selection.
    CanvasPress,
    /// Primary-button release.
    Release,
    /// Pointer leaving the canvas.
    Leave,
}

/// What a pointer position resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellTarget {
    /// A cell of a committed model container, named by its model name.
    Cell { container: String, cell: Cell },
    /// Nowhere: outside the canvas, or not over any container. Matches no
    /// real cell, so it can never anchor a preview.
    Outside,
}

impl CellTarget {
    pub fn is_outside(&self) -> bool {
        matches!(self, CellTarget::Outside)
    }

    /// The targeted container's name, if any.
    pub fn container(&self) -> Option<&str> {
        match self {
            CellTarget::Cell { container, .. } => Some(container),
            CellTarget::Outside => None,
        }
    }
}

/// Capability the hosting toolkit provides for rendering the form.
pub trait RenderBinding {
    /// Identifier of a rendered widget.
    type Handle: Clone + PartialEq + fmt::Debug;

    /// Creates the root container rendering for the form.
    fn create_root(&mut self) -> Self::Handle;

    /// Materializes a leaf of the given kind inside a rendered container.
    /// `text` feeds the kind's display-text (and value, where the kind has
    /// one) attribute.
    fn create_leaf(
        &mut self,
        kind: ElementKind,
        parent: &Self::Handle,
        text: Option<&str>,
    ) -> Self::Handle;

    /// Materializes a container of the given kind inside a rendered
    /// container.
    fn create_container(&mut self, kind: ElementKind, parent: &Self::Handle) -> Self::Handle;

    /// Creates a placeholder occupant inside a rendered container.
    fn create_placeholder(&mut self, parent: &Self::Handle, text: &str) -> Self::Handle;

    /// Visually marks a container as a preview (border/outline).
    fn outline_preview(&mut self, handle: &Self::Handle);

    /// Grid-places the handle at a cell of its parent container.
    fn place(&mut self, handle: &Self::Handle, cell: Cell, sticky: Sticky);

    /// Removes the handle from its grid cell without destroying it.
    fn hide(&mut self, handle: &Self::Handle);

    /// Re-grids a previously hidden handle at its remembered cell.
    fn show(&mut self, handle: &Self::Handle);

    /// Destroys the handle and its entire rendered subtree.
    fn destroy(&mut self, handle: &Self::Handle);

    /// Attaches an interaction to the handle. Attaching a press interaction
    /// replaces any previously attached press interaction, so a committed
    /// element never keeps its proposed-element routing.
    fn bind(&mut self, handle: &Self::Handle, interaction: Interaction);

    /// The occupant gridded at a cell of the container, if any.
    fn occupant_at(&self, container: &Self::Handle, cell: Cell) -> Option<Self::Handle>;

    /// All occupants currently gridded in the container.
    fn occupants(&self, container: &Self::Handle) -> Vec<Self::Handle>;

    /// Adds a page to a tabbed container's rendering.
    fn add_tab(&mut self, tabbed: &Self::Handle, page: &Self::Handle, label: &str);

    /// Makes a page the visible tab of a tabbed container's rendering.
    fn select_tab(&mut self, tabbed: &Self::Handle, page: &Self::Handle);

    /// Grid-geometry lookup of a pointer position against the committed
    /// model containers under the top container's rendering.
    fn resolve_cell(&self, top: &Self::Handle, x: f64, y: f64) -> CellTarget;
}
