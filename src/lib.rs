//! Layout and interactive placement for a visual form builder.
//!
//! The engine keeps a tree-shaped grid model of containers and leaf controls
//! synchronized with a live rendered view while the user drags new or
//! existing elements across the canvas. Three rules shape everything here:
//!
//! 1. Every cell of every live grid container holds exactly one occupant
//!    (a real element's rendering or a placeholder) at all times outside the
//!    atomic swap the placement service performs. Empty cells do not exist;
//!    they are placeholders, which is what makes hit-testing and insertion
//!    targeting uniform.
//! 2. At most one proposed element (the live preview of the element about to
//!    be inserted) exists at any instant. Retargeting builds the replacement
//!    first and then unconditionally tears down the stale preview, restoring
//!    the placeholder it displaced.
//! 3. Rendered handles are owned by the render binding and destroyed exactly
//!    once. The model, the placeholder set and the drag session hold
//!    non-owning references; whichever of them caused a handle to be created
//!    is the one that routes its destruction.
//!
//! The concrete toolkit sits behind the [`RenderBinding`] capability, so the
//! fill/empty and preview machinery are plain recursive tree functions that
//! run the same under a real toolkit or the in-memory test binding.
//!
//! Out of scope, reachable only through bound interactions routed back to
//! the host: the toolbox (which kind is armed for insertion), selection and
//! moving of committed elements, the attribute panel, and persistence.

pub mod binding;
pub mod layout;
pub mod model;

pub use binding::{CellTarget, Interaction, RenderBinding};
pub use layout::{FormLayout, MotionResult, Options, PlacementError};
pub use model::{Cell, Element, ElementKind, FormModel, Sticky};
