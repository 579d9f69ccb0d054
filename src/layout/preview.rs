//! The drag-preview state machine.
//!
//! While the toolbox has an element kind armed for insertion, pointer
//! motion resolves to a `(container, cell)` target and materializes a live
//! preview (the proposed element) of what a click would insert there.
//! Container kinds preview with a full grid of placeholders; a tabbed
//! container previews with one tab page. Moving the target tears the stale
//! preview down and restores the placeholder it displaced.
//!
//! The machine is driven entirely by re-entrant pointer events and is fully
//! re-derivable from [`DragSession`]: the current proposed element, the
//! anchor it targets, and the primary-button flag. Repeated motion over an
//! unchanged target is a no-op.

use tracing::trace;

use super::FormLayout;
use crate::binding::{CellTarget, Interaction, RenderBinding};
use crate::model::{Cell, Element, ElementKind, Sticky};

/// A transient, not-yet-committed preview of the element about to be
/// inserted. Never part of the model; at most one exists at a time.
#[derive(Debug)]
pub(crate) struct ProposedElement<H> {
    pub(crate) kind: ElementKind,
    /// Root handle of the preview rendering.
    pub(crate) handle: H,
    /// The preview tab page, when previewing a tabbed container.
    pub(crate) tab: Option<H>,
    /// Placeholders of the preview grid. The rendered subtree dies with the
    /// root handle, so these are forgotten rather than destroyed.
    pub(crate) grid: Vec<H>,
    /// The preview was added as a page of an existing tabbed container
    /// rather than gridded into a cell.
    pub(crate) as_tab: bool,
    /// Generated display text, reused on commit.
    pub(crate) text: Option<String>,
}

/// Drag/preview session state.
///
/// Process-wide for the single active form; reset whenever no toolbox kind
/// is armed or the pointer leaves the targeted cell.
#[derive(Debug)]
pub(crate) struct DragSession<H> {
    pub(crate) proposed: Option<ProposedElement<H>>,
    /// The most recently targeted cell, or the outside sentinel.
    pub(crate) anchor: CellTarget,
    /// Primary button currently held; distinguishes hover-only motion from
    /// drag-to-move of an already-placed element.
    pub(crate) button_pressed: bool,
}

impl<H> DragSession<H> {
    pub(crate) fn new() -> Self {
        Self {
            proposed: None,
            anchor: CellTarget::Outside,
            button_pressed: false,
        }
    }
}

/// Outcome of a pointer-motion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionResult {
    /// No kind is armed and a selected element is being dragged; the host
    /// should run its move-selected-element operation.
    MoveSelected,
    /// The target or the preview changed.
    Updated,
    /// Nothing to do.
    NoChange,
}

impl<R: RenderBinding> FormLayout<R> {
    /// Feeds one pointer-motion event into the state machine.
    ///
    /// `armed` is the element kind currently chosen in the toolbox, and
    /// `has_selection` whether the host has a committed element selected.
    pub fn pointer_motion(
        &mut self,
        r: &mut R,
        armed: Option<ElementKind>,
        has_selection: bool,
        x: f64,
        y: f64,
    ) -> MotionResult {
        let Some(armed) = armed else {
            // Ordinary selection/move mode. A preview left over from the
            // toolbox disarming goes away first.
            let had_preview = self.session.proposed.is_some();
            self.clear_preview(r);
            if has_selection && self.session.button_pressed {
                return MotionResult::MoveSelected;
            }
            return if had_preview {
                MotionResult::Updated
            } else {
                MotionResult::NoChange
            };
        };

        let Some(top_handle) = self.model.top().and_then(|top| top.handle.clone()) else {
            return MotionResult::NoChange;
        };

        let mut target = r.resolve_cell(&top_handle, x, y);
        // A tabbed container has no cells of its own; anchor it at the
        // origin so pointer jitter across its body never retargets.
        if let CellTarget::Cell { container, cell } = &mut target {
            if self
                .model
                .get(container)
                .is_some_and(|el| el.kind.is_tabbed_container())
            {
                *cell = Cell::new(0, 0);
            }
        }

        if target == self.session.anchor {
            return MotionResult::NoChange;
        }

        let prev_anchor = std::mem::replace(&mut self.session.anchor, target.clone());
        let prev = self.session.proposed.take();

        let target_is_tabbed = target
            .container()
            .and_then(|name| self.model.get(name))
            .is_some_and(|el| el.kind.is_tabbed_container());

        if target_is_tabbed {
            // Inserting a grid container into a tabbed container: the
            // preview becomes a new page. The anchor container necessarily
            // changed here; an unchanged one would have been caught by the
            // normalized-anchor equality above.
            if armed.is_grid_container()
                && prev.as_ref().is_some_and(|p| p.kind.is_grid_container())
            {
                if let CellTarget::Cell { container, .. } = &target {
                    let container = container.clone();
                    self.propose_tab_page(r, armed, &container);
                }
            }
            // A tabbed container's cell never holds a placeholder, so no
            // gridded preview can appear here.
        } else if let CellTarget::Cell { container, cell } = &target {
            let container = container.clone();
            let cell = *cell;
            let parent_handle = self.model.get(&container).and_then(|el| el.handle.clone());
            if let Some(parent_handle) = parent_handle {
                // Only an empty cell receives a preview: the occupant must
                // be a placeholder, not a committed element.
                if let Some(occ) = r.occupant_at(&parent_handle, cell) {
                    if self.placeholders.remove(&occ) {
                        r.destroy(&occ);
                        let proposed = self.build_proposed(r, armed, &parent_handle);
                        r.place(&proposed.handle, cell, Sticky::empty());
                        self.session.proposed = Some(proposed);
                    }
                }
            }
        }

        // Stale-preview cleanup. Runs on every anchor change after the
        // replacement was built, including when the pointer left the
        // canvas, where no replacement exists.
        self.teardown_preview(r, prev, &prev_anchor);

        trace!("preview retargeted to {:?}", self.session.anchor);
        MotionResult::Updated
    }

    /// Pointer left the canvas: no cell is targeted anymore.
    pub fn pointer_leave(&mut self, r: &mut R) {
        self.clear_preview(r);
    }

    /// Destroys any live preview, restores the placeholder it displaced and
    /// resets the anchor to the outside sentinel.
    pub fn clear_preview(&mut self, r: &mut R) {
        let prev = self.session.proposed.take();
        let prev_anchor = std::mem::replace(&mut self.session.anchor, CellTarget::Outside);
        self.teardown_preview(r, prev, &prev_anchor);
    }

    pub fn pointer_press(&mut self) {
        self.session.button_pressed = true;
    }

    pub fn pointer_release(&mut self) {
        self.session.button_pressed = false;
    }

    pub fn button_pressed(&self) -> bool {
        self.session.button_pressed
    }

    /// Commits the current preview as a real model element.
    ///
    /// The preview rendering is kept as the committed rendering: press
    /// routing is rebound from proposed to committed, and the preview's
    /// placeholders become the new container's occupants. A tabbed preview
    /// commits its page as a child page element. Returns the new element's
    /// name. The host's commit-insertion handler calls this from the
    /// proposed-press interaction.
    pub fn commit_proposed(&mut self, r: &mut R) -> Option<String> {
        let proposed = self.session.proposed.take()?;
        let anchor = std::mem::replace(&mut self.session.anchor, CellTarget::Outside);
        let CellTarget::Cell { container, cell } = anchor else {
            self.teardown_preview(r, Some(proposed), &CellTarget::Outside);
            return None;
        };

        let name = self.model.generate_unique_name(proposed.kind);
        let mut el = Element::new(name.clone(), proposed.kind, Some(container.as_str()), cell);
        if proposed.kind.is_container() {
            el = el.with_extents(self.options.default_columns, self.options.default_rows);
        }
        if let Some(text) = proposed.text.clone() {
            el = el.with_text(text);
        }
        el.handle = Some(proposed.handle.clone());
        self.model.insert(el);

        r.bind(
            &proposed.handle,
            Interaction::ElementPress {
                element: name.clone(),
            },
        );
        r.bind(&proposed.handle, Interaction::Release);
        for ph in &proposed.grid {
            r.bind(
                ph,
                Interaction::ElementPress {
                    element: name.clone(),
                },
            );
            r.bind(ph, Interaction::Release);
        }

        if let Some(tab) = &proposed.tab {
            let page_name = self.model.generate_unique_name(ElementKind::GridContainer);
            let mut page = Element::new(
                page_name.clone(),
                ElementKind::GridContainer,
                Some(name.as_str()),
                Cell::new(0, 0),
            )
            .with_extents(self.options.default_columns, self.options.default_rows);
            page.handle = Some(tab.clone());
            self.model.insert(page);

            r.bind(
                tab,
                Interaction::ElementPress {
                    element: page_name.clone(),
                },
            );
            r.bind(tab, Interaction::Release);
            for ph in &proposed.grid {
                r.bind(
                    ph,
                    Interaction::ElementPress {
                        element: page_name.clone(),
                    },
                );
                r.bind(ph, Interaction::Release);
            }
        }

        Some(name)
    }

    /// Builds the preview for the armed kind inside a rendered container.
    /// Gridding it at the target cell is the caller's job.
    fn build_proposed(
        &mut self,
        r: &mut R,
        armed: ElementKind,
        parent: &R::Handle,
    ) -> ProposedElement<R::Handle> {
        let proposed = match armed {
            ElementKind::GridContainer => {
                let handle = r.create_container(armed, parent);
                r.outline_preview(&handle);
                let grid = self.preview_grid(r, &handle);
                ProposedElement {
                    kind: armed,
                    handle,
                    tab: None,
                    grid,
                    as_tab: false,
                    text: None,
                }
            }
            ElementKind::TabbedContainer => {
                let handle = r.create_container(armed, parent);
                let page = r.create_container(ElementKind::GridContainer, &handle);
                r.outline_preview(&page);
                let grid = self.preview_grid(r, &page);
                let label = self.options.preview_tab_label.clone();
                r.add_tab(&handle, &page, &label);
                r.select_tab(&handle, &page);
                ProposedElement {
                    kind: armed,
                    handle,
                    tab: Some(page),
                    grid,
                    as_tab: false,
                    text: None,
                }
            }
            kind if kind.has_text() => {
                let text = self.model.generate_unique_name(kind);
                let handle = r.create_leaf(kind, parent, Some(&text));
                ProposedElement {
                    kind,
                    handle,
                    tab: None,
                    grid: Vec::new(),
                    as_tab: false,
                    text: Some(text),
                }
            }
            kind => {
                let handle = r.create_leaf(kind, parent, None);
                ProposedElement {
                    kind,
                    handle,
                    tab: None,
                    grid: Vec::new(),
                    as_tab: false,
                    text: None,
                }
            }
        };

        r.bind(&proposed.handle, Interaction::Motion);
        r.bind(&proposed.handle, Interaction::ProposedPress);
        proposed
    }

    /// Builds a grid-container preview as a new page of an existing tabbed
    /// container and selects it.
    fn propose_tab_page(&mut self, r: &mut R, armed: ElementKind, tabbed_name: &str) {
        let Some(tabbed_handle) = self.model.get(tabbed_name).and_then(|el| el.handle.clone())
        else {
            return;
        };

        let page = r.create_container(ElementKind::GridContainer, &tabbed_handle);
        r.outline_preview(&page);
        let grid = self.preview_grid(r, &page);
        let label = self.model.generate_unique_name(armed);
        r.add_tab(&tabbed_handle, &page, &label);
        r.select_tab(&tabbed_handle, &page);
        r.bind(&page, Interaction::Motion);
        r.bind(&page, Interaction::ProposedPress);

        self.session.proposed = Some(ProposedElement {
            kind: armed,
            handle: page,
            tab: None,
            grid,
            as_tab: true,
            text: Some(label),
        });
    }

    /// Fills a preview container with a default-sized grid of placeholders
    /// carrying preview routing.
    fn preview_grid(&mut self, r: &mut R, parent: &R::Handle) -> Vec<R::Handle> {
        let text = self.options.placeholder_text.clone();
        let mut grid = Vec::new();
        for column in 0..self.options.default_columns {
            for row in 0..self.options.default_rows {
                let ph = r.create_placeholder(parent, &text);
                r.place(&ph, Cell::new(column, row), Sticky::empty());
                r.bind(&ph, Interaction::Motion);
                r.bind(&ph, Interaction::ProposedPress);
                self.placeholders.insert(ph.clone());
                grid.push(ph);
            }
        }
        grid
    }

    /// Destroys a stale preview and restores the placeholder it displaced.
    fn teardown_preview(
        &mut self,
        r: &mut R,
        prev: Option<ProposedElement<R::Handle>>,
        prev_anchor: &CellTarget,
    ) {
        let Some(prev) = prev else {
            return;
        };

        for ph in &prev.grid {
            self.placeholders.remove(ph);
        }
        r.destroy(&prev.handle);

        // A tab-page preview vacated no cell.
        if prev.as_tab {
            return;
        }
        let vacated = match prev_anchor {
            CellTarget::Cell { container, cell } => self
                .model
                .get(container)
                .filter(|el| el.kind.is_grid_container())
                .and_then(|el| el.handle.clone())
                .map(|handle| (container.clone(), *cell, handle)),
            CellTarget::Outside => None,
        };
        if let Some((container, cell, parent_handle)) = vacated {
            if r.occupant_at(&parent_handle, cell).is_none() {
                self.new_placeholder(r, &parent_handle, &container, cell);
            }
        }
    }
}
