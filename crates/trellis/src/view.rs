//! The element arena.
//!
//! A [`View`] owns every element in a tree as a slotmap arena. Ids handed
//! out are tagged with the owning view's identity, so an id from one view
//! never resolves against another. Elements carry the layout, focus and
//! command-source properties that navigation and dispatch read, plus the
//! per-element binding collections and routed-event handlers.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use geom::Rect;
use slotmap::SlotMap;
use tracing::debug;

use crate::{
    command::{
        CanExecuteHandler, Command, CommandBindingCollection, ExecutedHandler,
        InputBindingCollection, ParamValue,
    },
    dispatch::ClassId,
    error::{Error, Result},
    id::{NodeId, NodeKey},
    navigation::NavigationMode,
    routed::RoutingPass,
};

/// Routed-event handlers attached directly to one element.
#[derive(Default)]
pub(crate) struct ElementHandlers {
    /// Tunnel-phase can-execute handlers.
    pub(crate) preview_can_execute: Vec<CanExecuteHandler>,
    /// Bubble-phase can-execute handlers.
    pub(crate) can_execute: Vec<CanExecuteHandler>,
    /// Tunnel-phase executed handlers.
    pub(crate) preview_executed: Vec<ExecutedHandler>,
    /// Bubble-phase executed handlers.
    pub(crate) executed: Vec<ExecutedHandler>,
}

/// One element in the arena.
pub struct Node {
    /// Visual parent, if attached.
    visual_parent: Option<NodeId>,
    /// Logical parent, consulted when there is no visual parent.
    logical_parent: Option<NodeId>,
    /// Visual children in document order.
    children: Vec<NodeId>,
    /// Layout bounds in shared coordinates.
    bounds: Rect,
    /// Is the element itself visible?
    visible: bool,
    /// Is the element enabled for interaction?
    enabled: bool,
    /// Can the element receive focus?
    focusable: bool,
    /// Does tab traversal stop on this element?
    is_tab_stop: bool,
    /// Tab traversal group index. Lower groups come first.
    tab_index: i32,
    /// Navigation mode on the tab axis.
    tab_navigation: NavigationMode,
    /// Navigation mode on the control-tab axis.
    ctrl_tab_navigation: NavigationMode,
    /// Navigation mode on the directional axis.
    directional_navigation: NavigationMode,
    /// Last focused descendant, remembered for `Once` re-entry.
    last_focused: Option<NodeId>,
    /// Does this element delimit a focus scope?
    is_focus_scope: bool,
    /// Focused element remembered by this scope.
    scope_focus: Option<NodeId>,
    /// Element class, for class-level binding lookup.
    class: ClassId,
    /// Command this element invokes as a command source.
    command: Option<Arc<Command>>,
    /// Parameter passed when invoking as a command source.
    command_parameter: ParamValue,
    /// Explicit command target; defaults to the element itself.
    command_target: Option<NodeId>,
    /// Element-level input bindings.
    input_bindings: InputBindingCollection,
    /// Element-level command bindings.
    command_bindings: CommandBindingCollection,
    /// Directly attached routed-event handlers.
    handlers: ElementHandlers,
}

impl Node {
    /// Construct a detached node of the given class with default properties.
    fn new(class: ClassId) -> Self {
        Self {
            visual_parent: None,
            logical_parent: None,
            children: Vec::new(),
            bounds: Rect::default(),
            visible: true,
            enabled: true,
            focusable: true,
            is_tab_stop: true,
            tab_index: 0,
            tab_navigation: NavigationMode::Continue,
            ctrl_tab_navigation: NavigationMode::Continue,
            directional_navigation: NavigationMode::Continue,
            last_focused: None,
            is_focus_scope: false,
            scope_focus: None,
            class,
            command: None,
            command_parameter: ParamValue::Null,
            command_target: None,
            input_bindings: InputBindingCollection::new(),
            command_bindings: CommandBindingCollection::new(),
            handlers: ElementHandlers::default(),
        }
    }
}

/// Identity source for new views. Each view gets its own value, which is
/// baked into every id it hands out.
static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// An element tree.
pub struct View {
    /// This view's identity. Ids carrying a different identity are foreign.
    id: u64,
    /// Element arena.
    nodes: SlotMap<NodeKey, Node>,
    /// Tree root, once inserted.
    root: Option<NodeId>,
    /// Currently focused element.
    focus: Option<NodeId>,
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    /// Construct an empty view.
    pub fn new() -> Self {
        Self {
            id: NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            root: None,
            focus: None,
        }
    }

    /// Tag an arena key with this view's identity.
    fn tag(&self, key: NodeKey) -> NodeId {
        NodeId {
            view: self.id,
            key,
        }
    }

    /// Look up a node, when the id belongs to this view and still resolves.
    fn get(&self, id: NodeId) -> Option<&Node> {
        if id.view != self.id {
            return None;
        }
        self.nodes.get(id.key)
    }

    /// Insert the root element. Fails if a root already exists.
    pub fn insert_root(&mut self, class: ClassId) -> Result<NodeId> {
        if self.root.is_some() {
            return Err(Error::Invalid("view already has a root".into()));
        }
        let key = self.nodes.insert(Node::new(class));
        let id = self.tag(key);
        self.root = Some(id);
        Ok(id)
    }

    /// Insert a new element as the last visual child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, class: ClassId) -> Result<NodeId> {
        self.node(parent)?;
        let key = self.nodes.insert(Node::new(class));
        let id = self.tag(key);
        self.nodes[id.key].visual_parent = Some(parent);
        self.nodes[parent.key].children.push(id);
        Ok(id)
    }

    /// Remove an element and its entire visual subtree.
    ///
    /// Focus and scope records pointing into the removed subtree are
    /// cleared.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if let Some(parent) = self.nodes[id.key].visual_parent {
            self.nodes[parent.key].children.retain(|c| *c != id);
        }
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            stack.extend(self.nodes[n.key].children.iter().copied());
            removed.push(n);
            self.nodes.remove(n.key);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        if let Some(focus) = self.focus
            && removed.contains(&focus)
        {
            self.focus = None;
        }
        for node in self.nodes.values_mut() {
            if let Some(f) = node.scope_focus
                && removed.contains(&f)
            {
                node.scope_focus = None;
            }
        }
        Ok(())
    }

    /// The tree root, if one has been inserted.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Does this view contain the element? False for ids minted by another
    /// view, even when their arena slots coincide.
    pub fn contains(&self, id: NodeId) -> bool {
        id.view == self.id && self.nodes.contains_key(id.key)
    }

    /// Borrow a node.
    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        if id.view != self.id {
            return Err(Error::Invalid(format!("element from another view: {id:?}")));
        }
        self.nodes
            .get(id.key)
            .ok_or_else(|| Error::Invalid(format!("unknown element: {id:?}")))
    }

    /// Mutably borrow a node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        if id.view != self.id {
            return Err(Error::Invalid(format!("element from another view: {id:?}")));
        }
        self.nodes
            .get_mut(id.key)
            .ok_or_else(|| Error::Invalid(format!("unknown element: {id:?}")))
    }

    //
    // Tree accessors
    //

    /// Visual parent of an element.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.visual_parent)
    }

    /// Parent for navigation purposes: the visual parent, falling back to
    /// the logical parent for detached content.
    pub fn nav_parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)
            .and_then(|n| n.visual_parent.or(n.logical_parent))
    }

    /// Visual children in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Root of the tree containing `id`, following navigation parents.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(parent) = self.nav_parent(cur) {
            cur = parent;
        }
        cur
    }

    /// Is `ancestor` an ancestor of `id` (or `id` itself)?
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.nav_parent(n);
        }
        false
    }

    /// Set the logical parent of an element.
    pub fn set_logical_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<()> {
        self.node_mut(id)?.logical_parent = parent;
        Ok(())
    }

    //
    // Properties
    //

    /// Layout bounds of an element.
    pub fn bounds(&self, id: NodeId) -> Rect {
        self.get(id).map(|n| n.bounds).unwrap_or_default()
    }

    /// Set the layout bounds of an element.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) -> Result<()> {
        self.node_mut(id)?.bounds = bounds;
        Ok(())
    }

    /// Is the element itself marked visible?
    pub fn visible(&self, id: NodeId) -> bool {
        self.get(id).map(|n| n.visible).unwrap_or(false)
    }

    /// Set element visibility.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    /// Is the element visible and under no hidden ancestor?
    pub fn effectively_visible(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            match self.get(n) {
                Some(node) if node.visible => cur = self.nav_parent(n),
                _ => return false,
            }
        }
        true
    }

    /// Is the element enabled?
    pub fn enabled(&self, id: NodeId) -> bool {
        self.get(id).map(|n| n.enabled).unwrap_or(false)
    }

    /// Set whether the element is enabled.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.node_mut(id)?.enabled = enabled;
        Ok(())
    }

    /// Can the element receive focus?
    pub fn focusable(&self, id: NodeId) -> bool {
        self.get(id).map(|n| n.focusable).unwrap_or(false)
    }

    /// Set whether the element can receive focus.
    pub fn set_focusable(&mut self, id: NodeId, focusable: bool) -> Result<()> {
        self.node_mut(id)?.focusable = focusable;
        Ok(())
    }

    /// Does tab traversal stop on this element?
    pub fn is_tab_stop(&self, id: NodeId) -> bool {
        self.get(id).map(|n| n.is_tab_stop).unwrap_or(false)
    }

    /// Set whether tab traversal stops on this element.
    pub fn set_is_tab_stop(&mut self, id: NodeId, is_tab_stop: bool) -> Result<()> {
        self.node_mut(id)?.is_tab_stop = is_tab_stop;
        Ok(())
    }

    /// Tab traversal group index.
    pub fn tab_index(&self, id: NodeId) -> i32 {
        self.get(id).map(|n| n.tab_index).unwrap_or(0)
    }

    /// Set the tab traversal group index.
    pub fn set_tab_index(&mut self, id: NodeId, tab_index: i32) -> Result<()> {
        self.node_mut(id)?.tab_index = tab_index;
        Ok(())
    }

    /// Navigation mode on the tab axis.
    pub fn tab_navigation(&self, id: NodeId) -> NavigationMode {
        self.get(id)
            .map(|n| n.tab_navigation)
            .unwrap_or(NavigationMode::Continue)
    }

    /// Set the navigation mode on the tab axis.
    pub fn set_tab_navigation(&mut self, id: NodeId, mode: NavigationMode) -> Result<()> {
        self.node_mut(id)?.tab_navigation = mode;
        Ok(())
    }

    /// Navigation mode on the control-tab axis.
    pub fn ctrl_tab_navigation(&self, id: NodeId) -> NavigationMode {
        self.get(id)
            .map(|n| n.ctrl_tab_navigation)
            .unwrap_or(NavigationMode::Continue)
    }

    /// Set the navigation mode on the control-tab axis.
    pub fn set_ctrl_tab_navigation(&mut self, id: NodeId, mode: NavigationMode) -> Result<()> {
        self.node_mut(id)?.ctrl_tab_navigation = mode;
        Ok(())
    }

    /// Navigation mode on the directional axis.
    pub fn directional_navigation(&self, id: NodeId) -> NavigationMode {
        self.get(id)
            .map(|n| n.directional_navigation)
            .unwrap_or(NavigationMode::Continue)
    }

    /// Set the navigation mode on the directional axis.
    pub fn set_directional_navigation(&mut self, id: NodeId, mode: NavigationMode) -> Result<()> {
        self.node_mut(id)?.directional_navigation = mode;
        Ok(())
    }

    /// Element class.
    pub fn class(&self, id: NodeId) -> Option<ClassId> {
        self.get(id).map(|n| n.class)
    }

    //
    // Focus
    //

    /// The currently focused element.
    pub fn focus(&self) -> Option<NodeId> {
        self.focus
    }

    /// Move focus to an element, committing the change into the tree's
    /// memory: every ancestor records it as its last focused descendant,
    /// and the enclosing focus scope records it as the scope focus.
    ///
    /// Returns whether focus actually changed.
    pub fn set_focus(&mut self, id: NodeId) -> Result<bool> {
        self.node(id)?;
        if self.focus == Some(id) {
            return Ok(false);
        }
        debug!(?id, "focus moved");
        self.focus = Some(id);
        let mut cur = self.nav_parent(id);
        let mut scope_seen = false;
        while let Some(n) = cur {
            self.nodes[n.key].last_focused = Some(id);
            if !scope_seen && self.nodes[n.key].is_focus_scope {
                self.nodes[n.key].scope_focus = Some(id);
                scope_seen = true;
            }
            cur = self.nav_parent(n);
        }
        Ok(true)
    }

    /// Clear focus entirely.
    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    /// The last focused descendant of a container, when it is still part of
    /// the same tree and still eligible to receive focus. Does not clear
    /// the record.
    pub fn peek_last_focused(&self, container: NodeId) -> Option<NodeId> {
        let last = self.get(container)?.last_focused?;
        if !self.contains(last) {
            return None;
        }
        if self.root_of(last) != self.root_of(container) {
            return None;
        }
        if !self.effectively_visible(last) || !self.enabled(last) || !self.focusable(last) {
            return None;
        }
        Some(last)
    }

    /// Record an element as a container's last focused descendant.
    pub fn set_last_focused(&mut self, container: NodeId, element: NodeId) -> Result<()> {
        self.node_mut(container)?.last_focused = Some(element);
        Ok(())
    }

    /// Does this element delimit a focus scope?
    pub fn is_focus_scope(&self, id: NodeId) -> bool {
        self.get(id).map(|n| n.is_focus_scope).unwrap_or(false)
    }

    /// Set whether an element delimits a focus scope.
    pub fn set_is_focus_scope(&mut self, id: NodeId, is_focus_scope: bool) -> Result<()> {
        self.node_mut(id)?.is_focus_scope = is_focus_scope;
        Ok(())
    }

    /// The focused element remembered by a focus scope.
    pub fn scope_focus(&self, scope: NodeId) -> Option<NodeId> {
        self.get(scope).and_then(|n| n.scope_focus)
    }

    /// Record a scope's remembered focused element.
    pub fn set_scope_focus(&mut self, scope: NodeId, element: Option<NodeId>) -> Result<()> {
        self.node_mut(scope)?.scope_focus = element;
        Ok(())
    }

    /// The nearest focus scope at or above `id`, excluding `id` itself.
    pub fn enclosing_scope(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.nav_parent(id);
        while let Some(n) = cur {
            if self.is_focus_scope(n) {
                return Some(n);
            }
            cur = self.nav_parent(n);
        }
        None
    }

    //
    // Command source
    //

    /// Configure the element as a command source.
    pub fn set_command_source(
        &mut self,
        id: NodeId,
        command: Arc<Command>,
        parameter: ParamValue,
        target: Option<NodeId>,
    ) -> Result<()> {
        let node = self.node_mut(id)?;
        node.command = Some(command);
        node.command_parameter = parameter;
        node.command_target = target;
        Ok(())
    }

    /// Clear the element's command-source configuration.
    pub fn clear_command_source(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        node.command = None;
        node.command_parameter = ParamValue::Null;
        node.command_target = None;
        Ok(())
    }

    /// The command this element invokes as a source.
    pub fn source_command(&self, id: NodeId) -> Option<&Arc<Command>> {
        self.get(id).and_then(|n| n.command.as_ref())
    }

    /// The parameter this element passes as a source.
    pub fn source_parameter(&self, id: NodeId) -> ParamValue {
        self.get(id)
            .map(|n| n.command_parameter.clone())
            .unwrap_or_default()
    }

    /// The element a source invocation targets. Defaults to the source.
    pub fn source_target(&self, id: NodeId) -> NodeId {
        self.get(id)
            .and_then(|n| n.command_target)
            .unwrap_or(id)
    }

    //
    // Bindings and handlers
    //

    /// Element-level input bindings.
    pub fn input_bindings(&self, id: NodeId) -> Result<&InputBindingCollection> {
        Ok(&self.node(id)?.input_bindings)
    }

    /// Element-level input bindings, mutable.
    pub fn input_bindings_mut(&mut self, id: NodeId) -> Result<&mut InputBindingCollection> {
        Ok(&mut self.node_mut(id)?.input_bindings)
    }

    /// Element-level command bindings.
    pub fn command_bindings(&self, id: NodeId) -> Result<&CommandBindingCollection> {
        Ok(&self.node(id)?.command_bindings)
    }

    /// Element-level command bindings, mutable.
    pub fn command_bindings_mut(&mut self, id: NodeId) -> Result<&mut CommandBindingCollection> {
        Ok(&mut self.node_mut(id)?.command_bindings)
    }

    /// Attach a can-execute handler to an element for one routing pass.
    pub fn add_can_execute_handler(
        &mut self,
        id: NodeId,
        pass: RoutingPass,
        handler: CanExecuteHandler,
    ) -> Result<()> {
        let handlers = &mut self.node_mut(id)?.handlers;
        match pass {
            RoutingPass::Tunnel => handlers.preview_can_execute.push(handler),
            RoutingPass::Bubble => handlers.can_execute.push(handler),
        }
        Ok(())
    }

    /// Detach a can-execute handler by callback identity.
    pub fn remove_can_execute_handler(
        &mut self,
        id: NodeId,
        pass: RoutingPass,
        handler: &CanExecuteHandler,
    ) -> Result<bool> {
        let handlers = &mut self.node_mut(id)?.handlers;
        let list = match pass {
            RoutingPass::Tunnel => &mut handlers.preview_can_execute,
            RoutingPass::Bubble => &mut handlers.can_execute,
        };
        let before = list.len();
        list.retain(|h| !Arc::ptr_eq(h, handler));
        Ok(before != list.len())
    }

    /// Attach an executed handler to an element for one routing pass.
    pub fn add_executed_handler(
        &mut self,
        id: NodeId,
        pass: RoutingPass,
        handler: ExecutedHandler,
    ) -> Result<()> {
        let handlers = &mut self.node_mut(id)?.handlers;
        match pass {
            RoutingPass::Tunnel => handlers.preview_executed.push(handler),
            RoutingPass::Bubble => handlers.executed.push(handler),
        }
        Ok(())
    }

    /// Detach an executed handler by callback identity.
    pub fn remove_executed_handler(
        &mut self,
        id: NodeId,
        pass: RoutingPass,
        handler: &ExecutedHandler,
    ) -> Result<bool> {
        let handlers = &mut self.node_mut(id)?.handlers;
        let list = match pass {
            RoutingPass::Tunnel => &mut handlers.preview_executed,
            RoutingPass::Bubble => &mut handlers.executed,
        };
        let before = list.len();
        list.retain(|h| !Arc::ptr_eq(h, handler));
        Ok(before != list.len())
    }

    /// Clone an element's can-execute handlers for one routing pass.
    pub(crate) fn can_execute_handlers(
        &self,
        id: NodeId,
        pass: RoutingPass,
    ) -> Vec<CanExecuteHandler> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        match pass {
            RoutingPass::Tunnel => node.handlers.preview_can_execute.clone(),
            RoutingPass::Bubble => node.handlers.can_execute.clone(),
        }
    }

    /// Clone an element's executed handlers for one routing pass.
    pub(crate) fn executed_handlers(&self, id: NodeId, pass: RoutingPass) -> Vec<ExecutedHandler> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        match pass {
            RoutingPass::Tunnel => node.handlers.preview_executed.clone(),
            RoutingPass::Bubble => node.handlers.executed.clone(),
        }
    }

    /// Clone an element's class-visible command bindings.
    pub(crate) fn element_command_bindings(
        &self,
        id: NodeId,
    ) -> Vec<Arc<crate::command::CommandBinding>> {
        self.get(id)
            .map(|n| n.command_bindings.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The path from the root down to `id`, inclusive.
    pub(crate) fn route_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            path.push(n);
            cur = self.nav_parent(n);
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ClassId;

    const WIDGET: ClassId = ClassId("widget");

    #[test]
    fn tree_construction_and_accessors() -> Result<()> {
        let mut view = View::new();
        let root = view.insert_root(WIDGET)?;
        let a = view.insert_child(root, WIDGET)?;
        let b = view.insert_child(root, WIDGET)?;
        let a1 = view.insert_child(a, WIDGET)?;

        assert_eq!(view.root(), Some(root));
        assert_eq!(view.children(root), &[a, b]);
        assert_eq!(view.parent(a1), Some(a));
        assert_eq!(view.root_of(a1), root);
        assert!(view.is_ancestor_or_self(root, a1));
        assert!(!view.is_ancestor_or_self(b, a1));
        assert_eq!(view.route_to(a1), vec![root, a, a1]);
        Ok(())
    }

    #[test]
    fn second_root_is_rejected() -> Result<()> {
        let mut view = View::new();
        view.insert_root(WIDGET)?;
        assert!(view.insert_root(WIDGET).is_err());
        Ok(())
    }

    #[test]
    fn effective_visibility_follows_ancestors() -> Result<()> {
        let mut view = View::new();
        let root = view.insert_root(WIDGET)?;
        let a = view.insert_child(root, WIDGET)?;
        let a1 = view.insert_child(a, WIDGET)?;

        assert!(view.effectively_visible(a1));
        view.set_visible(a, false)?;
        assert!(!view.effectively_visible(a1));
        assert!(view.visible(a1));
        Ok(())
    }

    #[test]
    fn focus_commit_updates_ancestors_and_scope() -> Result<()> {
        let mut view = View::new();
        let root = view.insert_root(WIDGET)?;
        let scope = view.insert_child(root, WIDGET)?;
        view.set_is_focus_scope(scope, true)?;
        let inner = view.insert_child(scope, WIDGET)?;
        let leaf = view.insert_child(inner, WIDGET)?;

        assert!(view.set_focus(leaf)?);
        assert_eq!(view.focus(), Some(leaf));
        assert_eq!(view.peek_last_focused(inner), Some(leaf));
        assert_eq!(view.peek_last_focused(scope), Some(leaf));
        assert_eq!(view.scope_focus(scope), Some(leaf));

        // Re-focusing the same element is a no-op.
        assert!(!view.set_focus(leaf)?);
        Ok(())
    }

    #[test]
    fn last_focused_invalidated_by_removal_and_hiding() -> Result<()> {
        let mut view = View::new();
        let root = view.insert_root(WIDGET)?;
        let pane = view.insert_child(root, WIDGET)?;
        let leaf = view.insert_child(pane, WIDGET)?;
        view.set_focus(leaf)?;

        view.set_visible(leaf, false)?;
        assert_eq!(view.peek_last_focused(pane), None);
        view.set_visible(leaf, true)?;
        assert_eq!(view.peek_last_focused(pane), Some(leaf));

        view.remove_subtree(leaf)?;
        assert_eq!(view.peek_last_focused(pane), None);
        assert_eq!(view.focus(), None);
        Ok(())
    }

    #[test]
    fn source_target_defaults_to_source() -> Result<()> {
        let mut view = View::new();
        let root = view.insert_root(WIDGET)?;
        let button = view.insert_child(root, WIDGET)?;
        assert_eq!(view.source_target(button), button);
        view.set_command_source(
            button,
            Command::noop(),
            ParamValue::Null,
            Some(root),
        )?;
        assert_eq!(view.source_target(button), root);
        Ok(())
    }

    #[test]
    fn handler_removal_by_identity() -> Result<()> {
        let mut view = View::new();
        let root = view.insert_root(WIDGET)?;
        let h: ExecutedHandler = Arc::new(|_, _| {});
        view.add_executed_handler(root, RoutingPass::Bubble, h.clone())?;
        assert_eq!(view.executed_handlers(root, RoutingPass::Bubble).len(), 1);
        assert!(view.remove_executed_handler(root, RoutingPass::Bubble, &h)?);
        assert!(view.executed_handlers(root, RoutingPass::Bubble).is_empty());
        assert!(!view.remove_executed_handler(root, RoutingPass::Bubble, &h)?);
        Ok(())
    }
}
