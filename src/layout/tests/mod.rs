//! Engine tests: an in-memory render binding plus an operation-based runner
//! that verifies the occupancy and ownership invariants after every step.
//!
//! The binding panics on any use of a destroyed handle, which is what turns
//! the double-destruction and dangling-handle risks into test failures
//! instead of silent corruption.


use std::collections::HashMap;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use super::{FormLayout, Options};
use crate::binding::{CellTarget, Interaction, RenderBinding};
use crate::model::{Cell, Element, ElementKind, FormModel, Sticky};

#[derive(Debug, Clone, PartialEq)]
enum WidgetKind {
    Root,
    Leaf(ElementKind),
    Container(ElementKind),
    Placeholder,
}

#[derive(Debug)]
struct Widget {
    parent: Option<u64>,
    #[allow(dead_code)]
    kind: WidgetKind,
    /// Cell within the parent, while gridded.
    gridded: Option<Cell>,
    /// Remembered cell while hidden.
    hidden_at: Option<Cell>,
    outlined: bool,
    #[allow(dead_code)]
    text: Option<String>,
    bindings: Vec<Interaction>,
    /// Pages, for tabbed containers.
    tabs: Vec<u64>,
    selected_tab: Option<u64>,
}

/// In-memory render binding.
#[derive(Debug, Default)]
pub(super) struct TestBinding {
    widgets: HashMap<u64, Widget>,
    next_id: u64,
    routes: HashMap<(i64, i64), CellTarget>,
    /// Count of mutating calls, for idempotency assertions.
    pub(super) mutations: u64,
}

impl TestBinding {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Programs what a pointer position resolves to.
    pub(super) fn route(&mut self, xy: (i64, i64), target: CellTarget) {
        self.routes.insert(xy, target);
    }

    pub(super) fn alive(&self) -> usize {
        self.widgets.len()
    }

    pub(super) fn is_alive(&self, handle: u64) -> bool {
        self.widgets.contains_key(&handle)
    }

    pub(super) fn is_gridded(&self, handle: u64) -> bool {
        self.widget(handle).gridded.is_some()
    }

    pub(super) fn is_outlined(&self, handle: u64) -> bool {
        self.widget(handle).outlined
    }

    pub(super) fn tabs_of(&self, handle: u64) -> Vec<u64> {
        self.widget(handle).tabs.clone()
    }

    pub(super) fn selected_tab_of(&self, handle: u64) -> Option<u64> {
        self.widget(handle).selected_tab
    }

    pub(super) fn bindings_of(&self, handle: u64) -> Vec<Interaction> {
        self.widget(handle).bindings.clone()
    }

    fn widget(&self, handle: u64) -> &Widget {
        self.widgets
            .get(&handle)
            .unwrap_or_else(|| panic!("use of dead handle {handle}"))
    }

    fn widget_mut(&mut self, handle: u64) -> &mut Widget {
        self.widgets
            .get_mut(&handle)
            .unwrap_or_else(|| panic!("use of dead handle {handle}"))
    }

    fn alloc(&mut self, kind: WidgetKind, parent: Option<u64>, text: Option<String>) -> u64 {
        if let Some(parent) = parent {
            self.widget(parent);
        }
        self.next_id += 1;
        self.mutations += 1;
        self.widgets.insert(
            self.next_id,
            Widget {
                parent,
                kind,
                gridded: None,
                hidden_at: None,
                outlined: false,
                text,
                bindings: Vec::new(),
                tabs: Vec::new(),
                selected_tab: None,
            },
        );
        self.next_id
    }
}

impl RenderBinding for TestBinding {
    type Handle = u64;

    fn create_root(&mut self) -> u64 {
        self.alloc(WidgetKind::Root, None, None)
    }

    fn create_leaf(&mut self, kind: ElementKind, parent: &u64, text: Option<&str>) -> u64 {
        self.alloc(WidgetKind::Leaf(kind), Some(*parent), text.map(String::from))
    }

    fn create_container(&mut self, kind: ElementKind, parent: &u64) -> u64 {
        self.alloc(WidgetKind::Container(kind), Some(*parent), None)
    }

    fn create_placeholder(&mut self, parent: &u64, text: &str) -> u64 {
        self.alloc(WidgetKind::Placeholder, Some(*parent), Some(text.to_string()))
    }

    fn outline_preview(&mut self, handle: &u64) {
        self.mutations += 1;
        self.widget_mut(*handle).outlined = true;
    }

    fn place(&mut self, handle: &u64, cell: Cell, _sticky: Sticky) {
        let parent = self
            .widget(*handle)
            .parent
            .expect("placing a parentless widget");
        if let Some(occ) = self.occupant_at(&parent, cell) {
            if occ != *handle {
                panic!("cell {cell:?} of {parent} already occupied by {occ}");
            }
        }
        self.mutations += 1;
        self.widget_mut(*handle).gridded = Some(cell);
    }

    fn hide(&mut self, handle: &u64) {
        self.mutations += 1;
        let w = self.widget_mut(*handle);
        w.hidden_at = w.gridded.take();
    }

    fn show(&mut self, handle: &u64) {
        self.mutations += 1;
        let w = self.widget_mut(*handle);
        w.gridded = w.hidden_at.take();
    }

    fn destroy(&mut self, handle: &u64) {
        self.widget(*handle);
        self.mutations += 1;

        let mut doomed = vec![*handle];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            doomed.extend(
                self.widgets
                    .iter()
                    .filter(|(_, w)| w.parent == Some(parent))
                    .map(|(id, _)| *id),
            );
            i += 1;
        }
        for id in doomed {
            self.widgets.remove(&id);
            for w in self.widgets.values_mut() {
                w.tabs.retain(|t| *t != id);
                if w.selected_tab == Some(id) {
                    w.selected_tab = None;
                }
            }
        }
    }

    fn bind(&mut self, handle: &u64, interaction: Interaction) {
        self.mutations += 1;
        let w = self.widget_mut(*handle);
        let is_press = matches!(
            interaction,
            Interaction::ElementPress { .. } | Interaction::ProposedPress | Interaction::CanvasPress
        );
        if is_press {
            w.bindings.retain(|b| {
                !matches!(
                    b,
                    Interaction::ElementPress { .. }
                        | Interaction::ProposedPress
                        | Interaction::CanvasPress
                )
            });
        }
        if !w.bindings.contains(&interaction) {
            w.bindings.push(interaction);
        }
    }

    fn occupant_at(&self, container: &u64, cell: Cell) -> Option<u64> {
        self.widget(*container);
        self.widgets
            .iter()
            .find(|(_, w)| w.parent == Some(*container) && w.gridded == Some(cell))
            .map(|(id, _)| *id)
    }

    fn occupants(&self, container: &u64) -> Vec<u64> {
        self.widget(*container);
        self.widgets
            .iter()
            .filter(|(_, w)| w.parent == Some(*container) && w.gridded.is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    fn add_tab(&mut self, tabbed: &u64, page: &u64, _label: &str) {
        self.widget(*page);
        self.mutations += 1;
        self.widget_mut(*tabbed).tabs.push(*page);
    }

    fn select_tab(&mut self, tabbed: &u64, page: &u64) {
        self.widget(*page);
        self.mutations += 1;
        self.widget_mut(*tabbed).selected_tab = Some(*page);
    }

    fn resolve_cell(&self, _top: &u64, x: f64, y: f64) -> CellTarget {
        self.routes
            .get(&(x as i64, y as i64))
            .cloned()
            .unwrap_or(CellTarget::Outside)
    }
}

pub(super) fn test_options() -> Options {
    Options {
        default_columns: 2,
        default_rows: 2,
        placeholder_text: String::from(" . "),
        preview_tab_label: String::from("tab 1"),
    }
}

/// Builds a layout from the given elements and draws it.
pub(super) fn draw_layout(
    elements: Vec<Element<u64>>,
) -> (FormLayout<TestBinding>, TestBinding) {
    let mut layout = FormLayout::with_options(FormModel::from_elements(elements), test_options());
    let mut r = TestBinding::new();
    layout.draw(&mut r).unwrap();
    layout.verify_invariants(&r);
    (layout, r)
}

pub(super) fn target(container: &str, column: u32, row: u32) -> CellTarget {
    CellTarget::Cell {
        container: container.to_string(),
        cell: Cell::new(column, row),
    }
}

/// Routes the pointer to the given target and feeds one motion event.
pub(super) fn motion(
    layout: &mut FormLayout<TestBinding>,
    r: &mut TestBinding,
    armed: Option<ElementKind>,
    to: CellTarget,
) -> super::MotionResult {
    r.route((0, 0), to);
    let result = layout.pointer_motion(r, armed, false, 0.0, 0.0);
    layout.verify_invariants(r);
    result
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum KindPick {
    Frame,
    Notebook,
    Label,
    Button,
    Entry,
    Checkbutton,
    Radiobutton,
}

impl KindPick {
    fn kind(self) -> ElementKind {
        match self {
            KindPick::Frame => ElementKind::GridContainer,
            KindPick::Notebook => ElementKind::TabbedContainer,
            KindPick::Label => ElementKind::Label,
            KindPick::Button => ElementKind::Button,
            KindPick::Entry => ElementKind::Entry,
            KindPick::Checkbutton => ElementKind::Checkbutton,
            KindPick::Radiobutton => ElementKind::Radiobutton,
        }
    }
}

/// One step applied to a live layout.
#[derive(Debug, Clone, Arbitrary)]
enum Op {
    AddElement {
        kind: KindPick,
        container: u8,
        column: u8,
        row: u8,
    },
    RemoveRendering {
        element: u8,
    },
    Resize {
        container: u8,
        columns: u8,
        rows: u8,
    },
    Rebuild {
        container: u8,
    },
    Arm {
        kind: Option<KindPick>,
    },
    MotionTo {
        container: u8,
        column: u8,
        row: u8,
    },
    MotionOutside,
    Press,
    Release,
    Leave,
    Commit,
    Redraw,
}

struct Harness {
    layout: FormLayout<TestBinding>,
    r: TestBinding,
    armed: Option<ElementKind>,
}

impl Harness {
    fn new() -> Self {
        let mut model = FormModel::new();
        model.insert(
            Element::new("top", ElementKind::GridContainer, None, Cell::new(0, 0))
                .with_extents(3, 3),
        );
        let mut layout = FormLayout::with_options(model, test_options());
        let mut r = TestBinding::new();
        layout.draw(&mut r).unwrap();
        Self {
            layout,
            r,
            armed: None,
        }
    }

    fn containers(&self) -> Vec<String> {
        self.layout
            .model()
            .elements()
            .filter(|el| el.kind.is_container() && el.handle.is_some())
            .map(|el| el.name.clone())
            .collect()
    }

    fn grid_containers(&self) -> Vec<String> {
        self.layout
            .model()
            .elements()
            .filter(|el| el.kind.is_grid_container() && el.handle.is_some())
            .map(|el| el.name.clone())
            .collect()
    }

    fn pick(names: &[String], index: u8) -> Option<String> {
        if names.is_empty() {
            None
        } else {
            Some(names[index as usize % names.len()].clone())
        }
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::AddElement {
                kind,
                container,
                column,
                row,
            } => {
                let Some(parent) = Self::pick(&self.grid_containers(), *container) else {
                    return;
                };
                let (pcols, prows) = {
                    let el = self.layout.model().get(&parent).unwrap();
                    (el.columns, el.rows)
                };
                let kind = kind.kind();
                let cell = Cell::new(
                    u32::from(*column) % (pcols + 1),
                    u32::from(*row) % (prows + 1),
                );
                // Only one element may declare a given cell of a container.
                let taken = self
                    .layout
                    .model()
                    .children_of(&parent)
                    .any(|c| c.cell == cell);
                if taken {
                    return;
                }

                let name = self.layout.model().generate_unique_name(kind);
                let mut el = Element::new(name, kind, Some(parent.as_str()), cell);
                if kind.is_container() {
                    el = el.with_extents(2, 2);
                }
                self.layout.model_mut().insert(el);
                self.layout.rebuild_container(&mut self.r, &parent).unwrap();
            }
            Op::RemoveRendering { element } => {
                let rendered: Vec<String> = self
                    .layout
                    .model()
                    .elements()
                    .filter(|el| el.parent.is_some() && el.handle.is_some())
                    .map(|el| el.name.clone())
                    .collect();
                let Some(name) = Self::pick(&rendered, *element) else {
                    return;
                };
                self.layout.remove_element(&mut self.r, &name);
            }
            Op::Resize {
                container,
                columns,
                rows,
            } => {
                let Some(name) = Self::pick(&self.grid_containers(), *container) else {
                    return;
                };
                if let Some(el) = self.layout.model_mut().get_mut(&name) {
                    el.columns = 1 + u32::from(*columns) % 3;
                    el.rows = 1 + u32::from(*rows) % 3;
                }
                self.layout.rebuild_container(&mut self.r, &name).unwrap();
            }
            Op::Rebuild { container } => {
                let Some(name) = Self::pick(&self.containers(), *container) else {
                    return;
                };
                self.layout.rebuild_container(&mut self.r, &name).unwrap();
            }
            Op::Arm { kind } => {
                self.armed = kind.map(KindPick::kind);
            }
            Op::MotionTo {
                container,
                column,
                row,
            } => {
                let Some(name) = Self::pick(&self.containers(), *container) else {
                    return;
                };
                let (cols, rows) = {
                    let el = self.layout.model().get(&name).unwrap();
                    (el.columns.max(1), el.rows.max(1))
                };
                let cell = Cell::new(u32::from(*column) % (cols + 1), u32::from(*row) % (rows + 1));
                self.r.route(
                    (0, 0),
                    CellTarget::Cell {
                        container: name,
                        cell,
                    },
                );
                self.layout.pointer_motion(&mut self.r, self.armed, false, 0.0, 0.0);
            }
            Op::MotionOutside => {
                self.r.route((0, 0), CellTarget::Outside);
                self.layout.pointer_motion(&mut self.r, self.armed, false, 0.0, 0.0);
            }
            Op::Press => self.layout.pointer_press(),
            Op::Release => self.layout.pointer_release(),
            Op::Leave => self.layout.pointer_leave(&mut self.r),
            Op::Commit => {
                self.layout.commit_proposed(&mut self.r);
            }
            Op::Redraw => {
                self.layout.draw(&mut self.r).unwrap();
            }
        }

        self.layout.verify_invariants(&self.r);
    }
}

fn check_ops(ops: &[Op]) -> Harness {
    let mut harness = Harness::new();
    for op in ops {
        harness.apply(op);
    }
    harness
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn random_operations_preserve_occupancy(
        ops in proptest::collection::vec(any::<Op>(), 0..40),
    ) {
        check_ops(&ops);
    }
}
