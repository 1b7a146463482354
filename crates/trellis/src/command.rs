//! Commands and command bindings.
//!
//! A [`Command`] is an identity plus the gestures that trigger it. A
//! [`CommandBinding`] attaches up to four handlers to a command on behalf of
//! an element or a class, and owns the can-execute/execute state machine that
//! decides whether those handlers run.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::{
    gesture::InputGesture,
    id::NodeId,
    routed::{CanExecuteEventData, EventDataPool, ExecutedEventData, RoutingPass},
};

/// Identifier for a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandId(pub &'static str);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dynamic value passed as a command parameter.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum ParamValue {
    /// No parameter.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Callback for a direct (non-routed) command.
pub type DirectFn = Arc<dyn Fn(&ParamValue) + Send + Sync>;

/// How a command executes when triggered.
#[derive(Clone)]
enum CommandKind {
    /// Raises the four attached events through the tree.
    Routed,
    /// Invokes a callback directly, without routing. The triggering input
    /// event is left unhandled so it can reach other listeners.
    Direct(DirectFn),
    /// The no-op sentinel: translation aborts silently.
    Noop,
}

impl fmt::Debug for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Routed => write!(f, "Routed"),
            Self::Direct(_) => write!(f, "Direct"),
            Self::Noop => write!(f, "Noop"),
        }
    }
}

/// A command: an identity, an execution kind, and the gestures that
/// trigger it during input translation.
#[derive(Debug)]
pub struct Command {
    /// Command identifier.
    id: CommandId,
    /// Execution kind.
    kind: CommandKind,
    /// Gestures that trigger this command.
    gestures: Vec<InputGesture>,
}

/// Shared no-op sentinel instance.
static NOOP: OnceLock<Arc<Command>> = OnceLock::new();

impl Command {
    /// Construct a routed command.
    pub fn routed(id: CommandId) -> Self {
        Self {
            id,
            kind: CommandKind::Routed,
            gestures: Vec::new(),
        }
    }

    /// Construct a direct command wrapping a callback.
    pub fn direct(id: CommandId, callback: DirectFn) -> Self {
        Self {
            id,
            kind: CommandKind::Direct(callback),
            gestures: Vec::new(),
        }
    }

    /// The shared no-op sentinel. Binding a gesture to it suppresses the
    /// gesture without executing anything.
    pub fn noop() -> Arc<Self> {
        NOOP.get_or_init(|| {
            Arc::new(Self {
                id: CommandId("noop"),
                kind: CommandKind::Noop,
                gestures: Vec::new(),
            })
        })
        .clone()
    }

    /// Add a triggering gesture.
    pub fn with_gesture(mut self, gesture: impl Into<InputGesture>) -> Self {
        self.gestures.push(gesture.into());
        self
    }

    /// The command identifier.
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Gestures that trigger this command.
    pub fn gestures(&self) -> &[InputGesture] {
        &self.gestures
    }

    /// Is this the no-op sentinel?
    pub fn is_noop(&self) -> bool {
        matches!(self.kind, CommandKind::Noop)
    }

    /// Is this a routed command?
    pub fn is_routed(&self) -> bool {
        matches!(self.kind, CommandKind::Routed)
    }

    /// The callback of a direct command, if any.
    pub(crate) fn direct_callback(&self) -> Option<&DirectFn> {
        match &self.kind {
            CommandKind::Direct(callback) => Some(callback),
            _ => None,
        }
    }
}

/// Handler for the can-execute attached events.
pub type CanExecuteHandler = Arc<dyn Fn(NodeId, &mut CanExecuteEventData) + Send + Sync>;

/// Handler for the executed attached events.
pub type ExecutedHandler = Arc<dyn Fn(NodeId, &mut ExecutedEventData) + Send + Sync>;

/// Associates a command with up to four event handlers and drives their
/// invocation.
///
/// Bindings are created explicitly and registered either into an element's
/// collection or a class table; they are never implicitly destroyed.
pub struct CommandBinding {
    /// The bound command.
    command: Arc<Command>,
    /// Tunnel-phase executed handler.
    preview_executed: Option<ExecutedHandler>,
    /// Bubble-phase executed handler.
    executed: Option<ExecutedHandler>,
    /// Tunnel-phase can-execute handler.
    preview_can_execute: Option<CanExecuteHandler>,
    /// Bubble-phase can-execute handler.
    can_execute: Option<CanExecuteHandler>,
}

impl fmt::Debug for CommandBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBinding")
            .field("command", &self.command.id())
            .field("preview_executed", &self.preview_executed.is_some())
            .field("executed", &self.executed.is_some())
            .field("preview_can_execute", &self.preview_can_execute.is_some())
            .field("can_execute", &self.can_execute.is_some())
            .finish()
    }
}

impl CommandBinding {
    /// Construct a binding for a command with no handlers.
    pub fn new(command: Arc<Command>) -> Self {
        Self {
            command,
            preview_executed: None,
            executed: None,
            preview_can_execute: None,
            can_execute: None,
        }
    }

    /// Set the preview-executed handler.
    pub fn on_preview_executed(mut self, handler: ExecutedHandler) -> Self {
        self.preview_executed = Some(handler);
        self
    }

    /// Set the executed handler.
    pub fn on_executed(mut self, handler: ExecutedHandler) -> Self {
        self.executed = Some(handler);
        self
    }

    /// Set the preview-can-execute handler.
    pub fn on_preview_can_execute(mut self, handler: CanExecuteHandler) -> Self {
        self.preview_can_execute = Some(handler);
        self
    }

    /// Set the can-execute handler.
    pub fn on_can_execute(mut self, handler: CanExecuteHandler) -> Self {
        self.can_execute = Some(handler);
        self
    }

    /// The bound command.
    pub fn command(&self) -> &Arc<Command> {
        &self.command
    }

    /// Answer a can-execute query with this binding alone, outside routing.
    ///
    /// The preview handler runs first; when it marks the query handled the
    /// main handler is skipped. A binding with an executed handler but no
    /// can-execute handler is executable by default: it grants permission
    /// and marks the query handled.
    pub fn check_can_execute(&self, sender: NodeId, data: &mut CanExecuteEventData) {
        if let Some(handler) = &self.preview_can_execute {
            handler(sender, data);
            if data.handled() {
                return;
            }
        }
        if let Some(handler) = &self.can_execute {
            handler(sender, data);
        } else if self.executed.is_some() || self.preview_executed.is_some() {
            data.set_can_execute(true);
            data.set_handled(true);
        }
    }

    /// Invoke the can-execute handler for one routing pass.
    ///
    /// The tunnel pass runs the preview handler; the bubble pass runs the
    /// main handler, falling back to the default-executable rule.
    pub(crate) fn route_can_execute(
        &self,
        sender: NodeId,
        pass: RoutingPass,
        data: &mut CanExecuteEventData,
    ) {
        match pass {
            RoutingPass::Tunnel => {
                if let Some(handler) = &self.preview_can_execute {
                    handler(sender, data);
                }
            }
            RoutingPass::Bubble => {
                if let Some(handler) = &self.can_execute {
                    handler(sender, data);
                } else if self.executed.is_some() || self.preview_executed.is_some() {
                    data.set_can_execute(true);
                    data.set_handled(true);
                }
            }
        }
    }

    /// Invoke the executed handler for one routing pass.
    ///
    /// Skipped entirely when the event is already handled. Can-execute is
    /// re-derived just before executing with a freshly checked-out record,
    /// guarding against state that went stale since the original query; the
    /// record is released on every path. The event is marked handled only
    /// when a handler actually ran.
    pub(crate) fn route_executed(
        &self,
        sender: NodeId,
        pass: RoutingPass,
        data: &mut ExecutedEventData,
        pool: &EventDataPool,
    ) {
        if data.handled() {
            return;
        }
        let handler = match pass {
            RoutingPass::Tunnel => &self.preview_executed,
            RoutingPass::Bubble => &self.executed,
        };
        let Some(handler) = handler else {
            return;
        };

        let can = {
            let mut probe = pool.acquire_can_execute();
            if let Some(command) = data.command() {
                probe.prime(command.clone(), data.parameter().clone());
            }
            self.check_can_execute(sender, &mut probe);
            probe.can_execute()
            // Probe drops here and returns to the pool, panic or not.
        };
        if can {
            handler(sender, data);
            data.set_handled(true);
        }
    }
}

/// An ordered collection of command bindings.
///
/// Iteration order matters: gesture matching scans last-to-first so the most
/// recently added binding wins, while event invocation runs in insertion
/// order.
#[derive(Default)]
pub struct CommandBindingCollection {
    /// Bindings in insertion order.
    items: Vec<Arc<CommandBinding>>,
}

impl fmt::Debug for CommandBindingCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBindingCollection")
            .field("len", &self.items.len())
            .finish()
    }
}

impl CommandBindingCollection {
    /// Construct an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding, returning the shared handle.
    pub fn add(&mut self, binding: CommandBinding) -> Arc<CommandBinding> {
        let binding = Arc::new(binding);
        self.items.push(binding.clone());
        binding
    }

    /// Remove a binding by handle identity. Returns whether it was present.
    pub fn remove(&mut self, binding: &Arc<CommandBinding>) -> bool {
        let before = self.items.len();
        self.items.retain(|b| !Arc::ptr_eq(b, binding));
        before != self.items.len()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Is the collection empty?
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate bindings in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<CommandBinding>> {
        self.items.iter()
    }
}

/// Associates an input gesture directly with a command.
#[derive(Clone)]
pub struct InputBinding {
    /// Triggering gesture.
    gesture: InputGesture,
    /// Command to execute.
    command: Arc<Command>,
    /// Command parameter.
    parameter: ParamValue,
    /// Explicit command target; defaults to the element being translated.
    target: Option<NodeId>,
}

impl fmt::Debug for InputBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputBinding")
            .field("gesture", &self.gesture)
            .field("command", &self.command.id())
            .field("parameter", &self.parameter)
            .field("target", &self.target)
            .finish()
    }
}

impl InputBinding {
    /// Construct a binding from a gesture to a command.
    pub fn new(gesture: impl Into<InputGesture>, command: Arc<Command>) -> Self {
        Self {
            gesture: gesture.into(),
            command,
            parameter: ParamValue::Null,
            target: None,
        }
    }

    /// Set the command parameter.
    pub fn with_parameter(mut self, parameter: impl Into<ParamValue>) -> Self {
        self.parameter = parameter.into();
        self
    }

    /// Set an explicit command target.
    pub fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// The triggering gesture.
    pub fn gesture(&self) -> &InputGesture {
        &self.gesture
    }

    /// The bound command.
    pub fn command(&self) -> &Arc<Command> {
        &self.command
    }

    /// The command parameter.
    pub fn parameter(&self) -> &ParamValue {
        &self.parameter
    }

    /// The explicit command target, if any.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }
}

/// An ordered collection of input bindings. Matching scans last-to-first.
#[derive(Default, Debug)]
pub struct InputBindingCollection {
    /// Bindings in insertion order.
    items: Vec<InputBinding>,
}

impl InputBindingCollection {
    /// Construct an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding.
    pub fn add(&mut self, binding: InputBinding) {
        self.items.push(binding);
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Is the collection empty?
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate bindings in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &InputBinding> {
        self.items.iter()
    }
}
