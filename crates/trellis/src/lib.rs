//! Focus navigation and command routing for a retained-mode element tree.
//!
//! Trellis provides two engines over an arena-backed element tree
//! ([`View`]): a focus navigator that answers tab-order and directional
//! movement queries ([`predict_navigation`], [`perform_navigation`]), and a
//! command dispatcher ([`CommandRegistry`]) that translates raw input
//! gestures into commands and routes the resulting can-execute and
//! executed events through the tree with tunnel and bubble passes.

pub mod command;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod gesture;
mod id;
pub mod navigation;
pub mod routed;
pub mod view;

pub use geom;

pub use command::{
    CanExecuteHandler, Command, CommandBinding, CommandBindingCollection, CommandId,
    ExecutedHandler, InputBinding, InputBindingCollection, ParamValue,
};
pub use dispatch::{ClassId, CommandInvocation, CommandRegistry};
pub use error::{Error, Result};
pub use gesture::InputGesture;
pub use id::NodeId;
pub use navigation::{
    NavigationAxis, NavigationDirection, NavigationMode, perform_navigation, predict_navigation,
};
pub use routed::{CanExecuteEventData, EventDataPool, ExecutedEventData, RoutingPass};
pub use view::View;

// Commonly used geometry types at the root.
pub use geom::{Point, Rect};
