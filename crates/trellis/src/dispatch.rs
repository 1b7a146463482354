//! Command dispatch.
//!
//! The [`CommandRegistry`] holds the process-wide class binding tables and
//! drives the full input-to-command pipeline: gesture matching against
//! element and class bindings, command invocation, and the tunnel/bubble
//! routing of the can-execute and executed events through the tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::{
    command::{
        Command, CommandBinding, CommandBindingCollection, InputBinding, InputBindingCollection,
        ParamValue,
    },
    error::Result,
    event::{
        gamepad::GamepadButton,
        key::{Key, Mods},
        mouse::{MouseButton, WheelDirection},
    },
    gesture::InputGesture,
    id::NodeId,
    routed::{CanExecuteEventData, EventDataPool, ExecutedEventData, RoutingPass},
    view::View,
};

/// Identifier for an element class. Class bindings registered against a
/// class apply to every element of that class and its subclasses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(pub &'static str);

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The product of a gesture match: which command to run, against which
/// element, with which parameter. Consumed immediately, never stored.
#[derive(Clone)]
pub struct CommandInvocation {
    /// Element the command executes against.
    pub target: NodeId,
    /// The matched command.
    pub command: Arc<Command>,
    /// Parameter to pass.
    pub parameter: ParamValue,
}

thread_local! {
    /// Per-thread scratch buffer for collecting matching class bindings,
    /// avoiding a heap allocation on every dispatch.
    static SCRATCH: RefCell<Vec<Arc<CommandBinding>>> = const { RefCell::new(Vec::new()) };
}

/// Run `f` with the thread's scratch buffer, clearing it on every exit
/// path. A reentrant dispatch (scope redirection re-entering the invoker)
/// falls back to a fresh buffer.
fn with_scratch<R>(f: impl FnOnce(&mut Vec<Arc<CommandBinding>>) -> R) -> R {
    SCRATCH.with(|cell| match cell.try_borrow_mut() {
        Ok(buf) => {
            let mut buf = scopeguard::guard(buf, |mut b| b.clear());
            f(&mut buf)
        }
        Err(_) => f(&mut Vec::new()),
    })
}

/// Class binding tables plus the event-data pool: everything dispatch
/// needs beyond the tree itself.
///
/// Constructed once by the hosting application and passed by reference,
/// so tests get isolation with fresh instances. Table locks are held only
/// for lookup and insert, never across a handler callback.
#[derive(Default)]
pub struct CommandRegistry {
    /// Class command bindings.
    class_command: Mutex<HashMap<ClassId, CommandBindingCollection>>,
    /// Class input bindings.
    class_input: Mutex<HashMap<ClassId, InputBindingCollection>>,
    /// Supertype chain per class, most derived first, computed at class
    /// definition time.
    chains: Mutex<HashMap<ClassId, Vec<ClassId>>>,
    /// Pool of routed event data records.
    pool: EventDataPool,
}

impl CommandRegistry {
    /// Construct an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock a table, recovering from poisoning. A panic under a table lock
    /// can only have interrupted a map or vector edit, which leaves the
    /// table structurally sound.
    fn lock<'a, T>(m: &'a Mutex<T>) -> MutexGuard<'a, T> {
        m.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Define a class, optionally deriving from a previously defined
    /// supertype. The supertype chain is computed once, here.
    pub fn define_class(&self, class: ClassId, supertype: Option<ClassId>) {
        let mut chains = Self::lock(&self.chains);
        let mut chain = vec![class];
        if let Some(s) = supertype {
            match chains.get(&s) {
                Some(sc) => chain.extend(sc.iter().copied()),
                None => chain.push(s),
            }
        }
        chains.insert(class, chain);
    }

    /// The supertype chain of a class, most derived first. An undefined
    /// class is its own one-element chain.
    pub fn supertype_chain(&self, class: ClassId) -> Vec<ClassId> {
        Self::lock(&self.chains)
            .get(&class)
            .cloned()
            .unwrap_or_else(|| vec![class])
    }

    /// Register a command binding for a class, returning the shared
    /// handle.
    pub fn register_class_command_binding(
        &self,
        class: ClassId,
        binding: CommandBinding,
    ) -> Arc<CommandBinding> {
        Self::lock(&self.class_command)
            .entry(class)
            .or_default()
            .add(binding)
    }

    /// Register an input binding for a class.
    pub fn register_class_input_binding(&self, class: ClassId, binding: InputBinding) {
        Self::lock(&self.class_input)
            .entry(class)
            .or_default()
            .add(binding);
    }

    //
    // Input translation
    //

    /// Translate a key press on the focused element into a command.
    /// Returns whether the input event should be considered handled.
    pub fn handle_key_down_translation(&self, view: &View, element: NodeId, key: Key) -> bool {
        self.translate(view, element, |g| g.matches_key(key))
    }

    /// Translate a mouse click into a command.
    pub fn handle_mouse_click_translation(
        &self,
        view: &View,
        element: NodeId,
        button: MouseButton,
        mods: Mods,
    ) -> bool {
        self.translate(view, element, |g| g.matches_click(button, mods))
    }

    /// Translate a mouse double-click into a command.
    pub fn handle_mouse_double_click_translation(
        &self,
        view: &View,
        element: NodeId,
        button: MouseButton,
        mods: Mods,
    ) -> bool {
        self.translate(view, element, |g| g.matches_double_click(button, mods))
    }

    /// Translate a mouse wheel rotation into a command.
    pub fn handle_mouse_wheel_translation(
        &self,
        view: &View,
        element: NodeId,
        direction: WheelDirection,
        mods: Mods,
    ) -> bool {
        self.translate(view, element, |g| g.matches_wheel(direction, mods))
    }

    /// Translate a gamepad button press into a command.
    pub fn handle_gamepad_button_down_translation(
        &self,
        view: &View,
        element: NodeId,
        button: GamepadButton,
    ) -> bool {
        self.translate(view, element, |g| g.matches_gamepad(button))
    }

    /// Match a gesture and execute the resulting invocation.
    fn translate(
        &self,
        view: &View,
        element: NodeId,
        matches: impl Fn(&InputGesture) -> bool,
    ) -> bool {
        let Some(invocation) = self.find_matching_binding(view, element, matches) else {
            return false;
        };
        debug!(command = %invocation.command.id(), "input gesture matched");
        self.execute_invocation(view, invocation)
    }

    /// Find the binding triggered by an input event.
    ///
    /// Search order: element input bindings, class input bindings, element
    /// command bindings (via each command's own gestures), class command
    /// bindings. Class tables are walked most-derived class first. Within
    /// every collection the scan runs last-to-first, so the most recently
    /// added binding wins. The first match ends the search.
    pub fn find_matching_binding(
        &self,
        view: &View,
        element: NodeId,
        matches: impl Fn(&InputGesture) -> bool,
    ) -> Option<CommandInvocation> {
        if let Ok(bindings) = view.input_bindings(element) {
            for b in bindings.iter().rev() {
                if matches(b.gesture()) {
                    return Some(CommandInvocation {
                        target: b.target().unwrap_or(element),
                        command: b.command().clone(),
                        parameter: b.parameter().clone(),
                    });
                }
            }
        }

        let chain = view
            .class(element)
            .map(|c| self.supertype_chain(c))
            .unwrap_or_default();

        {
            let table = Self::lock(&self.class_input);
            for class in &chain {
                let Some(col) = table.get(class) else { continue };
                for b in col.iter().rev() {
                    if matches(b.gesture()) {
                        return Some(CommandInvocation {
                            target: b.target().unwrap_or(element),
                            command: b.command().clone(),
                            parameter: b.parameter().clone(),
                        });
                    }
                }
            }
        }

        if let Ok(bindings) = view.command_bindings(element) {
            for b in bindings.iter().rev() {
                if b.command().gestures().iter().any(&matches) {
                    return Some(CommandInvocation {
                        target: element,
                        command: b.command().clone(),
                        parameter: ParamValue::Null,
                    });
                }
            }
        }

        {
            let table = Self::lock(&self.class_command);
            for class in &chain {
                let Some(col) = table.get(class) else { continue };
                for b in col.iter().rev() {
                    if b.command().gestures().iter().any(&matches) {
                        return Some(CommandInvocation {
                            target: element,
                            command: b.command().clone(),
                            parameter: ParamValue::Null,
                        });
                    }
                }
            }
        }
        None
    }

    /// Execute a matched invocation.
    ///
    /// The no-op sentinel aborts silently. A routed command is queried then
    /// raised through the tree; the triggering input event counts as
    /// handled unless a handler requested continued routing. A direct
    /// command runs its callback and always leaves the input unhandled so
    /// it can reach other listeners.
    pub fn execute_invocation(&self, view: &View, invocation: CommandInvocation) -> bool {
        let CommandInvocation {
            target,
            command,
            parameter,
        } = invocation;
        if command.is_noop() {
            trace!("no-op command, translation aborted");
            return false;
        }
        if command.is_routed() {
            let (can, continue_routing) = self.raise_can_execute(view, target, &command, &parameter);
            if !can {
                return false;
            }
            self.raise_executed(view, target, &command, &parameter);
            !continue_routing
        } else if let Some(callback) = command.direct_callback() {
            callback(&parameter);
            false
        } else {
            false
        }
    }

    //
    // Event routing
    //

    /// Raise the can-execute pair of events through the tree toward
    /// `target` and back. Returns whether the command may execute and
    /// whether the triggering input should continue routing.
    pub fn raise_can_execute(
        &self,
        view: &View,
        target: NodeId,
        command: &Arc<Command>,
        parameter: &ParamValue,
    ) -> (bool, bool) {
        let mut data = self.pool.acquire_can_execute();
        data.prime(command.clone(), parameter.clone());
        let route = view.route_to(target);
        for &node in &route {
            self.deliver_can_execute(view, node, RoutingPass::Tunnel, &mut data);
            if data.handled() {
                return (data.can_execute(), data.continue_routing());
            }
        }
        for &node in route.iter().rev() {
            self.deliver_can_execute(view, node, RoutingPass::Bubble, &mut data);
            if data.handled() {
                break;
            }
        }
        (data.can_execute(), data.continue_routing())
    }

    /// Raise the executed pair of events through the tree toward `target`
    /// and back. Returns whether any handler ran.
    pub fn raise_executed(
        &self,
        view: &View,
        target: NodeId,
        command: &Arc<Command>,
        parameter: &ParamValue,
    ) -> bool {
        trace!(command = %command.id(), "raising executed");
        let mut data = self.pool.acquire_executed();
        data.prime(command.clone(), parameter.clone());
        let route = view.route_to(target);
        for &node in &route {
            self.deliver_executed(view, node, RoutingPass::Tunnel, &mut data);
            if data.handled() {
                return true;
            }
        }
        for &node in route.iter().rev() {
            self.deliver_executed(view, node, RoutingPass::Bubble, &mut data);
            if data.handled() {
                return true;
            }
        }
        false
    }

    /// Deliver a can-execute event to one element: bindings first, then the
    /// element's own handlers.
    fn deliver_can_execute(
        &self,
        view: &View,
        element: NodeId,
        pass: RoutingPass,
        data: &mut CanExecuteEventData,
    ) {
        self.invoke_binding_can_execute(view, element, pass, data);
        if data.handled() {
            return;
        }
        for h in view.can_execute_handlers(element, pass) {
            h(element, data);
            if data.handled() {
                return;
            }
        }
    }

    /// Deliver an executed event to one element: bindings first, then the
    /// element's own handlers.
    fn deliver_executed(
        &self,
        view: &View,
        element: NodeId,
        pass: RoutingPass,
        data: &mut ExecutedEventData,
    ) {
        self.invoke_binding_executed(view, element, pass, data);
        if data.handled() {
            return;
        }
        for h in view.executed_handlers(element, pass) {
            h(element, data);
            if data.handled() {
                return;
            }
        }
    }

    /// Collect the class command bindings matching `command` for an
    /// element's class chain into the scratch buffer.
    fn collect_class_bindings(
        &self,
        view: &View,
        element: NodeId,
        command: &Arc<Command>,
        scratch: &mut Vec<Arc<CommandBinding>>,
    ) {
        let Some(class) = view.class(element) else {
            return;
        };
        let table = Self::lock(&self.class_command);
        for class in self.supertype_chain(class) {
            let Some(col) = table.get(&class) else { continue };
            for b in col.iter() {
                if Arc::ptr_eq(b.command(), command) {
                    scratch.push(b.clone());
                }
            }
        }
    }

    /// Run the command bindings relevant to a can-execute event on one
    /// element: local bindings in collection order, then the collected
    /// class bindings. One handled answer ends the run, and remaining
    /// class bindings are skipped outright.
    fn invoke_binding_can_execute(
        &self,
        view: &View,
        element: NodeId,
        pass: RoutingPass,
        data: &mut CanExecuteEventData,
    ) {
        let Some(command) = data.command().cloned() else {
            return;
        };
        for b in view.element_command_bindings(element) {
            if Arc::ptr_eq(b.command(), &command) {
                b.route_can_execute(element, pass, data);
                if data.handled() {
                    return;
                }
            }
        }
        with_scratch(|scratch| {
            self.collect_class_bindings(view, element, &command, scratch);
            for b in scratch.iter() {
                b.route_can_execute(element, pass, data);
                if data.handled() {
                    break;
                }
            }
        });
        if !data.handled() {
            self.redirect_can_execute(view, element, pass, data);
        }
    }

    /// Run the command bindings relevant to an executed event on one
    /// element, mirroring [`Self::invoke_binding_can_execute`].
    fn invoke_binding_executed(
        &self,
        view: &View,
        element: NodeId,
        pass: RoutingPass,
        data: &mut ExecutedEventData,
    ) {
        let Some(command) = data.command().cloned() else {
            return;
        };
        for b in view.element_command_bindings(element) {
            if Arc::ptr_eq(b.command(), &command) {
                b.route_executed(element, pass, data, &self.pool);
                if data.handled() {
                    return;
                }
            }
        }
        with_scratch(|scratch| {
            self.collect_class_bindings(view, element, &command, scratch);
            for b in scratch.iter() {
                b.route_executed(element, pass, data, &self.pool);
                if data.handled() {
                    break;
                }
            }
        });
        if !data.handled() {
            self.redirect_executed(view, element, pass, data);
        }
    }

    /// Focus-scope redirection for can-execute events.
    ///
    /// When a bubbling event reaches a focus scope boundary unhandled, it
    /// is re-raised directly against the element focused in the enclosing
    /// scope, provided that element does not sit back inside this scope.
    /// The original event is then marked handled unconditionally.
    fn redirect_can_execute(
        &self,
        view: &View,
        element: NodeId,
        pass: RoutingPass,
        data: &mut CanExecuteEventData,
    ) {
        let Some(focused) = self.redirect_target(view, element, pass) else {
            return;
        };
        trace!(?focused, "redirecting can-execute to enclosing scope focus");
        self.invoke_binding_can_execute(view, focused, pass, data);
        data.set_handled(true);
    }

    /// Focus-scope redirection for executed events.
    fn redirect_executed(
        &self,
        view: &View,
        element: NodeId,
        pass: RoutingPass,
        data: &mut ExecutedEventData,
    ) {
        let Some(focused) = self.redirect_target(view, element, pass) else {
            return;
        };
        trace!(?focused, "redirecting executed to enclosing scope focus");
        self.invoke_binding_executed(view, focused, pass, data);
        data.set_handled(true);
    }

    /// The element an unhandled bubbling event at a scope boundary is
    /// redirected to, if any.
    fn redirect_target(&self, view: &View, element: NodeId, pass: RoutingPass) -> Option<NodeId> {
        if pass != RoutingPass::Bubble || !view.is_focus_scope(element) {
            return None;
        }
        let enclosing = view.enclosing_scope(element)?;
        let focused = view.scope_focus(enclosing)?;
        // Cycle guard: the enclosing scope may itself remember an element
        // inside this scope.
        if view.is_ancestor_or_self(element, focused) {
            return None;
        }
        Some(focused)
    }

    //
    // Command sources
    //

    /// Query whether the command configured on a source element can
    /// execute right now.
    pub fn check_can_execute_source(&self, view: &View, element: NodeId) -> Result<bool> {
        view.node(element)?;
        let Some(command) = view.source_command(element).cloned() else {
            return Ok(false);
        };
        if command.is_noop() {
            return Ok(false);
        }
        if command.is_routed() {
            let target = view.source_target(element);
            let parameter = view.source_parameter(element);
            let (can, _) = self.raise_can_execute(view, target, &command, &parameter);
            Ok(can)
        } else {
            Ok(command.direct_callback().is_some())
        }
    }

    /// Invoke the command configured on a source element, when it can
    /// execute. Returns whether it ran.
    pub fn execute_source(&self, view: &View, element: NodeId) -> Result<bool> {
        if !self.check_can_execute_source(view, element)? {
            return Ok(false);
        }
        // check_can_execute_source verified the command is present.
        let Some(command) = view.source_command(element).cloned() else {
            return Ok(false);
        };
        let parameter = view.source_parameter(element);
        if command.is_routed() {
            let target = view.source_target(element);
            self.raise_executed(view, target, &command, &parameter);
        } else if let Some(callback) = command.direct_callback() {
            callback(&parameter);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandId;

    #[test]
    fn supertype_chains_are_precomputed() {
        let registry = CommandRegistry::new();
        let base = ClassId("element");
        let control = ClassId("control");
        let button = ClassId("button");
        registry.define_class(base, None);
        registry.define_class(control, Some(base));
        registry.define_class(button, Some(control));
        assert_eq!(registry.supertype_chain(button), vec![button, control, base]);
        assert_eq!(registry.supertype_chain(ClassId("other")), vec![ClassId("other")]);
    }

    #[test]
    fn undefined_supertype_still_chains() {
        let registry = CommandRegistry::new();
        let a = ClassId("a");
        registry.define_class(a, Some(ClassId("b")));
        assert_eq!(registry.supertype_chain(a), vec![a, ClassId("b")]);
    }

    #[test]
    fn noop_invocation_aborts_silently() -> Result<()> {
        let registry = CommandRegistry::new();
        let mut view = View::new();
        let root = view.insert_root(ClassId("widget"))?;
        let handled = registry.execute_invocation(
            &view,
            CommandInvocation {
                target: root,
                command: Command::noop(),
                parameter: ParamValue::Null,
            },
        );
        assert!(!handled);
        Ok(())
    }

    #[test]
    fn direct_command_runs_but_leaves_input_unhandled() -> Result<()> {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let registry = CommandRegistry::new();
        let mut view = View::new();
        let root = view.insert_root(ClassId("widget"))?;
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = ran.clone();
        let command = Arc::new(Command::direct(
            CommandId("ping"),
            Arc::new(move |_| {
                ran2.fetch_add(1, Ordering::SeqCst);
            }),
        ));
        let handled = registry.execute_invocation(
            &view,
            CommandInvocation {
                target: root,
                command,
                parameter: ParamValue::Null,
            },
        );
        assert!(!handled);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
