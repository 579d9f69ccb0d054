//! The form layout model.
//!
//! A form is a flat list of elements forming a tree through parent *names*:
//! every element names its owning container rather than owning its children,
//! which lets the model survive partial edits (an element whose cell no
//! longer fits its container stays in the list, flagged and unrendered,
//! until the container grows back). Exactly one element has no parent; that
//! is the top-level container the form is built from.
//!
//! The model never owns renderings. An element carries an optional handle to
//! its rendered representation, but the handle belongs to the render binding
//! and is only ever destroyed through the placement service or the occupancy
//! resolver.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Edge-alignment flags for an element within its grid cell.
    ///
    /// Empty means centered; opposite edges together stretch the element
    /// along that axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Sticky: u8 {
        const N = 1;
        const S = 1 << 1;
        const E = 1 << 2;
        const W = 1 << 3;
    }
}

impl Serialize for Sticky {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for Sticky {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Sticky::from_bits_truncate(u8::deserialize(deserializer)?))
    }
}

/// A grid cell position within a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub column: u32,
    pub row: u32,
}

impl Cell {
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

/// The closed set of element kinds.
///
/// Kinds are plain tags; construction of the rendered counterpart is
/// dispatched by matching on the kind in the placement service, and the
/// toolbox arms one of these for insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    /// Rectangular grid of cells, one occupant per cell.
    GridContainer,
    /// Container whose children are pages, each a grid container, one of
    /// which is shown at a time.
    TabbedContainer,
    Label,
    Button,
    Entry,
    Checkbutton,
    Radiobutton,
}

impl ElementKind {
    pub fn is_grid_container(self) -> bool {
        matches!(self, ElementKind::GridContainer)
    }

    pub fn is_tabbed_container(self) -> bool {
        matches!(self, ElementKind::TabbedContainer)
    }

    pub fn is_container(self) -> bool {
        self.is_grid_container() || self.is_tabbed_container()
    }

    /// Whether the kind carries a display-text attribute.
    pub fn has_text(self) -> bool {
        matches!(
            self,
            ElementKind::Label
                | ElementKind::Button
                | ElementKind::Checkbutton
                | ElementKind::Radiobutton
        )
    }

    /// Whether the kind carries a value attribute alongside its text.
    pub fn has_value(self) -> bool {
        matches!(self, ElementKind::Radiobutton)
    }

    /// Base word for generated unique names.
    pub fn base_name(self) -> &'static str {
        match self {
            ElementKind::GridContainer => "frame",
            ElementKind::TabbedContainer => "notebook",
            ElementKind::Label => "label",
            ElementKind::Button => "button",
            ElementKind::Entry => "entry",
            ElementKind::Checkbutton => "checkbutton",
            ElementKind::Radiobutton => "radiobutton",
        }
    }
}

/// A node of the layout tree.
///
/// Generic over the render binding's handle type `H`; the handle field is a
/// non-owning reference to the rendered representation and is not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct Element<H> {
    /// Stable, unique name of the element.
    pub name: String,
    pub kind: ElementKind,
    /// Name of the owning container; `None` for the top-level container.
    pub parent: Option<String>,
    /// Grid cell within the parent container.
    pub cell: Cell,
    /// Grid extents; meaningful for containers.
    pub columns: u32,
    /// Grid extents; meaningful for containers.
    pub rows: u32,
    pub sticky: Sticky,
    /// Display text, for kinds that carry one.
    pub text: Option<String>,
    /// The declared cell lies outside the parent's current extents; the
    /// element stays in the model but is rendered as absent.
    pub remove: bool,
    /// Handle of the rendered representation, owned by the render binding.
    #[serde(skip)]
    pub handle: Option<H>,
}

impl<H> Element<H> {
    pub fn new(
        name: impl Into<String>,
        kind: ElementKind,
        parent: Option<&str>,
        cell: Cell,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: parent.map(String::from),
            cell,
            columns: 0,
            rows: 0,
            sticky: Sticky::empty(),
            text: None,
            remove: false,
            handle: None,
        }
    }

    pub fn with_extents(mut self, columns: u32, rows: u32) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_sticky(mut self, sticky: Sticky) -> Self {
        self.sticky = sticky;
        self
    }
}

/// The collection of all elements of one form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct FormModel<H> {
    elements: Vec<Element<H>>,
}

impl<H> FormModel<H> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn from_elements(elements: Vec<Element<H>>) -> Self {
        Self { elements }
    }

    pub fn insert(&mut self, element: Element<H>) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element<H>> {
        self.elements.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Element<H>> {
        self.elements.iter().find(|el| el.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Element<H>> {
        self.elements.iter_mut().find(|el| el.name == name)
    }

    /// The single top-level container of the form.
    pub fn top(&self) -> Option<&Element<H>> {
        self.elements.iter().find(|el| el.parent.is_none())
    }

    /// Children of the named container, in model order.
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element<H>> {
        self.elements
            .iter()
            .filter(move |el| el.parent.as_deref() == Some(name))
    }

    /// The element whose rendering the handle belongs to, if any.
    pub fn by_handle(&self, handle: &H) -> Option<&Element<H>>
    where
        H: PartialEq,
    {
        self.elements
            .iter()
            .find(|el| el.handle.as_ref() == Some(handle))
    }

    /// Removes the named element and all of its descendants from the model,
    /// returning them. Descendants must go too, or their parent references
    /// would dangle.
    pub fn remove(&mut self, name: &str) -> Vec<Element<H>> {
        let mut doomed = vec![name.to_string()];
        let mut i = 0;
        while i < doomed.len() {
            for el in &self.elements {
                if el.parent.as_deref() == Some(doomed[i].as_str()) {
                    doomed.push(el.name.clone());
                }
            }
            i += 1;
        }

        let mut removed = Vec::new();
        let elements = std::mem::take(&mut self.elements);
        for el in elements {
            if doomed.iter().any(|d| *d == el.name) {
                removed.push(el);
            } else {
                self.elements.push(el);
            }
        }
        removed
    }

    /// Generates a name not used by any element: the kind's base word plus
    /// the smallest free ordinal. Also used as generated display text for
    /// previews of kinds that carry text.
    pub fn generate_unique_name(&self, kind: ElementKind) -> String {
        let base = kind.base_name();
        let mut n = 1u32;
        loop {
            let candidate = format!("{base}{n}");
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}
