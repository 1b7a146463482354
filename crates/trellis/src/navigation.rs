//! Focus navigation.
//!
//! Computes focus destinations over the element tree. Tab-axis moves
//! (`Next`/`Previous`/`First`/`Last`) walk the tree in document order,
//! grouped by tab index; directional moves (`Up`/`Down`/`Left`/`Right`)
//! score candidates geometrically by layout bounds. Navigation containers
//! (any element whose mode for the active axis is not `Continue`) bound the
//! search, and their mode decides how a search enters, leaves or wraps
//! within them.

use geom::Rect;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::{Error, Result},
    event::key::KeyCode,
    id::NodeId,
    view::View,
};

/// How navigation treats a container subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationMode {
    /// Not a container: navigation passes straight through.
    Continue,
    /// Entering focuses the remembered last-focused descendant, falling
    /// back to the first stop.
    Once,
    /// Navigation skips this subtree entirely.
    None,
    /// A container whose tab indices are ordered locally to the subtree.
    Local,
    /// Navigation may enter but never leave: exhaustion yields no
    /// destination instead of escaping.
    Contained,
    /// Navigation wraps around within the subtree on exhaustion.
    Cycle,
}

/// A focus movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationDirection {
    /// Next element in tab order.
    Next,
    /// Previous element in tab order.
    Previous,
    /// First element in tab order.
    First,
    /// Last element in tab order.
    Last,
    /// Geometrically upward.
    Up,
    /// Geometrically downward.
    Down,
    /// Geometrically leftward.
    Left,
    /// Geometrically rightward.
    Right,
}

impl NavigationDirection {
    /// Convert an arrow key to its direction. Any other key is a caller
    /// error.
    pub fn from_arrow_key(code: KeyCode) -> Result<Self> {
        match code {
            KeyCode::Up => Ok(Self::Up),
            KeyCode::Down => Ok(Self::Down),
            KeyCode::Left => Ok(Self::Left),
            KeyCode::Right => Ok(Self::Right),
            other => Err(Error::Invalid(format!("not an arrow key: {other:?}"))),
        }
    }

    /// Is this a tab-axis direction?
    pub fn is_tab_axis(&self) -> bool {
        matches!(self, Self::Next | Self::Previous | Self::First | Self::Last)
    }
}

/// The property axis a navigation request reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationAxis {
    /// Tab key traversal.
    Tab,
    /// Ctrl+Tab traversal.
    ControlTab,
    /// Arrow-key traversal.
    Directional,
}

impl NavigationAxis {
    /// The axis for a direction, with the control modifier selecting the
    /// control-tab axis for tab moves.
    pub fn for_direction(direction: NavigationDirection, ctrl: bool) -> Self {
        if direction.is_tab_axis() {
            if ctrl { Self::ControlTab } else { Self::Tab }
        } else {
            Self::Directional
        }
    }
}

/// Upper bound on wrap retries for `Cycle` containers on the directional
/// axis. One wrap normally suffices; the guard keeps oddly nested geometry
/// from looping.
const CYCLE_WRAP_LIMIT: u32 = 2;

/// Compute the destination of a navigation request without changing focus.
///
/// Returns `None` when no further navigation is possible, which is a normal
/// outcome rather than an error. Calling this twice against an unchanged
/// tree yields the same answer.
pub fn predict_navigation(
    view: &View,
    element: NodeId,
    direction: NavigationDirection,
    ctrl: bool,
) -> Option<NodeId> {
    if !view.contains(element) {
        return None;
    }
    let axis = NavigationAxis::for_direction(direction, ctrl);
    let dest = match direction {
        NavigationDirection::Next => tab_search(view, element, axis, true),
        NavigationDirection::Previous => tab_search(view, element, axis, false),
        NavigationDirection::First => edge_stop(view, view.root_of(element), axis, true),
        NavigationDirection::Last => edge_stop(view, view.root_of(element), axis, false),
        NavigationDirection::Up
        | NavigationDirection::Down
        | NavigationDirection::Left
        | NavigationDirection::Right => directional_search(view, element, direction),
    };
    let dest = dest.filter(|d| *d != element);
    trace!(?element, ?direction, ctrl, ?dest, "navigation predicted");
    dest
}

/// Predict a destination and commit the focus change.
///
/// Returns whether focus actually moved. When prediction yields no
/// destination, focus is left untouched and `false` is returned.
pub fn perform_navigation(
    view: &mut View,
    element: NodeId,
    direction: NavigationDirection,
    ctrl: bool,
) -> bool {
    match predict_navigation(view, element, direction, ctrl) {
        Some(dest) => view.set_focus(dest).unwrap_or(false),
        None => false,
    }
}

/// The navigation mode of an element on an axis.
fn axis_mode(view: &View, id: NodeId, axis: NavigationAxis) -> NavigationMode {
    match axis {
        NavigationAxis::Tab => view.tab_navigation(id),
        NavigationAxis::ControlTab => view.ctrl_tab_navigation(id),
        NavigationAxis::Directional => view.directional_navigation(id),
    }
}

/// Is the element a navigation container on this axis?
fn is_container(view: &View, id: NodeId, axis: NavigationAxis) -> bool {
    axis_mode(view, id, axis) != NavigationMode::Continue
}

/// Is the element a valid focus destination? Visibility is checked by the
/// callers' tree walks, which prune hidden subtrees.
fn is_stop(view: &View, id: NodeId) -> bool {
    view.is_tab_stop(id) && view.focusable(id) && view.enabled(id)
}

/// Can the element itself take focus when its subtree holds no stop?
fn is_focus_fallback(view: &View, id: NodeId) -> bool {
    view.focusable(id) && view.enabled(id)
}

/// The nearest container strictly above `id`, or the tree root when no
/// ancestor is a container.
fn container_above(view: &View, id: NodeId, axis: NavigationAxis) -> NodeId {
    let mut cur = view.nav_parent(id);
    while let Some(n) = cur {
        if is_container(view, n, axis) || view.nav_parent(n).is_none() {
            return n;
        }
        cur = view.nav_parent(n);
    }
    id
}

/// The container bounding a tab search from `id`: `id` itself when it is a
/// container, else the nearest ancestor container.
fn tab_container_of(view: &View, id: NodeId, axis: NavigationAxis) -> NodeId {
    if is_container(view, id, axis) && view.nav_parent(id).is_some() {
        id
    } else if view.nav_parent(id).is_none() {
        id
    } else {
        container_above(view, id, axis)
    }
}

/// One level-member candidate found by a container walk.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// The element.
    id: NodeId,
    /// Its tab index.
    tab_index: i32,
    /// Its position in the document-order walk.
    doc: usize,
}

/// Walk a container's subtree in document order, collecting the level
/// members: stops and nested containers. Hidden subtrees are pruned and
/// nested containers are not descended into. Also reports `start`'s walk
/// position when encountered.
fn level_members(
    view: &View,
    container: NodeId,
    start: NodeId,
    axis: NavigationAxis,
) -> (Vec<Candidate>, Option<(i32, usize)>) {
    let mut members = Vec::new();
    let mut start_key = None;
    let mut doc = 0;
    let mut stack: Vec<NodeId> = view.children(container).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if !view.visible(id) {
            continue;
        }
        if id == start {
            start_key = Some((view.tab_index(id), doc));
        }
        let container_here = is_container(view, id, axis);
        if container_here || is_stop(view, id) {
            members.push(Candidate {
                id,
                tab_index: view.tab_index(id),
                doc,
            });
        }
        doc += 1;
        if !container_here {
            stack.extend(view.children(id).iter().rev().copied());
        }
    }
    (members, start_key)
}

/// Scan one container level for the next destination in tab order.
///
/// Members are ordered by tab-index group, document order within a group.
/// The scan starts just past `start`'s position in that ordering, wrapping
/// when the container cycles. Containers encountered are entered rather
/// than returned.
fn scan_tab_level(
    view: &View,
    container: NodeId,
    start: NodeId,
    axis: NavigationAxis,
    forward: bool,
    cycle: bool,
) -> Option<NodeId> {
    let (mut members, start_key) = level_members(view, container, start, axis);
    if members.is_empty() {
        return None;
    }
    // Stable sort preserves document order within each tab-index group.
    members.sort_by_key(|m| m.tab_index);

    let len = members.len();
    let at = members.iter().position(|m| m.id == start);
    let order: Vec<usize> = match (at, start_key) {
        (Some(i), _) => step_order(i, len, forward, cycle),
        (None, Some((ti, dp))) => {
            let ins = members
                .iter()
                .take_while(|m| (m.tab_index, m.doc) < (ti, dp))
                .count();
            boundary_order(ins, len, forward, cycle)
        }
        // Start is outside the walk (it is the container itself): scan the
        // whole level from the appropriate end.
        (None, None) => {
            if forward {
                (0..len).collect()
            } else {
                (0..len).rev().collect()
            }
        }
    };

    for k in order {
        let m = members[k];
        if m.id == start {
            continue;
        }
        if is_stop(view, m.id) {
            return Some(m.id);
        }
        if let Some(found) = enter_tab_container(view, m.id, axis, forward) {
            return Some(found);
        }
    }
    None
}

/// Scan positions after occupied slot `i`, in direction, optionally
/// wrapping.
fn step_order(i: usize, len: usize, forward: bool, cycle: bool) -> Vec<usize> {
    let mut order = Vec::with_capacity(len);
    for k in 1..=len {
        let idx = if forward { i + k } else { i + len - k };
        if cycle {
            order.push(idx % len);
        } else if forward && idx < len {
            order.push(idx);
        } else if !forward && idx >= len {
            order.push(idx - len);
        }
    }
    order
}

/// Scan positions from insertion boundary `ins` (start sits between slots),
/// in direction, optionally wrapping.
fn boundary_order(ins: usize, len: usize, forward: bool, cycle: bool) -> Vec<usize> {
    if forward {
        let mut order: Vec<usize> = (ins..len).collect();
        if cycle {
            order.extend(0..ins);
        }
        order
    } else {
        let mut order: Vec<usize> = (0..ins).rev().collect();
        if cycle {
            order.extend((ins..len).rev());
        }
        order
    }
}

/// Enter a container found during a tab scan.
///
/// `None` mode skips the subtree. `Once` mode restores the remembered
/// last-focused descendant when it is still valid. Otherwise the first
/// (or last, going backward) stop inside is taken; a container with no
/// stop inside falls back to the container itself when it can take focus.
fn enter_tab_container(
    view: &View,
    container: NodeId,
    axis: NavigationAxis,
    forward: bool,
) -> Option<NodeId> {
    match axis_mode(view, container, axis) {
        NavigationMode::None => return None,
        NavigationMode::Once => {
            if let Some(last) = view.peek_last_focused(container) {
                return Some(last);
            }
        }
        _ => {}
    }
    if let Some(found) = scan_tab_level(view, container, container, axis, forward, false) {
        return Some(found);
    }
    if is_focus_fallback(view, container) {
        return Some(container);
    }
    None
}

/// The first or last navigation stop under `scope`, entering containers.
fn edge_stop(view: &View, scope: NodeId, axis: NavigationAxis, first: bool) -> Option<NodeId> {
    if let Some(found) = scan_tab_level(view, scope, scope, axis, first, false) {
        return Some(found);
    }
    if is_stop(view, scope) && view.effectively_visible(scope) {
        return Some(scope);
    }
    None
}

/// Tab-axis search: scan the bounding container, escalating level by level
/// until a destination is found or the search legitimately ends.
fn tab_search(view: &View, element: NodeId, axis: NavigationAxis, forward: bool) -> Option<NodeId> {
    let mut start = element;
    let mut container = tab_container_of(view, element, axis);
    if container == element && view.nav_parent(element).is_none() {
        // Starting at the root: search straight into it.
        return scan_tab_level(
            view,
            container,
            container,
            axis,
            forward,
            axis_mode(view, container, axis) == NavigationMode::Cycle,
        );
    }
    loop {
        let mode = axis_mode(view, container, axis);
        let cycle = mode == NavigationMode::Cycle;
        if let Some(found) = scan_tab_level(view, container, start, axis, forward, cycle) {
            return Some(found);
        }
        // A cycling container already wrapped; a contained one may not be
        // escaped. Both end the search here.
        if matches!(mode, NavigationMode::Contained | NavigationMode::Cycle) {
            return None;
        }
        if view.nav_parent(container).is_none() {
            return None;
        }
        start = container;
        container = container_above(view, container, axis);
    }
}

//
// Directional axis
//

/// Shift `bounds` to just outside `container` on the side the motion came
/// from, so every element inside becomes eligible in the direction of
/// travel. Used both to enter a container and to wrap a `Cycle` search.
fn move_bounds_outside(bounds: Rect, container: Rect, direction: NavigationDirection) -> Rect {
    let mut out = bounds;
    match direction {
        NavigationDirection::Right => out.x = container.left() - bounds.w - 1.0,
        NavigationDirection::Left => out.x = container.right() + 1.0,
        NavigationDirection::Down => out.y = container.top() - bounds.h - 1.0,
        NavigationDirection::Up => out.y = container.bottom() + 1.0,
        _ => {}
    }
    out
}

/// Is `cand` strictly beyond `reference` in the direction of travel?
fn is_beyond(cand: Rect, reference: Rect, direction: NavigationDirection) -> bool {
    match direction {
        NavigationDirection::Left => cand.right() <= reference.left(),
        NavigationDirection::Right => cand.left() >= reference.right(),
        NavigationDirection::Up => cand.bottom() <= reference.top(),
        NavigationDirection::Down => cand.top() >= reference.bottom(),
        _ => false,
    }
}

/// Gap between the facing edges, the primary directional score.
fn edge_gap(cand: Rect, reference: Rect, direction: NavigationDirection) -> f32 {
    match direction {
        NavigationDirection::Left => (reference.left() - cand.right()).abs(),
        NavigationDirection::Right => (cand.left() - reference.right()).abs(),
        NavigationDirection::Up => (reference.top() - cand.bottom()).abs(),
        NavigationDirection::Down => (cand.top() - reference.bottom()).abs(),
        _ => f32::INFINITY,
    }
}

/// Squared center distance, the tie-break score.
fn center_gap(cand: Rect, reference: Rect) -> f32 {
    cand.center().distance_squared(reference.center())
}

/// Collect the level members of `container` for a directional scan,
/// skipping `exclude`'s whole subtree.
fn directional_members(
    view: &View,
    container: NodeId,
    exclude: NodeId,
    axis: NavigationAxis,
) -> Vec<NodeId> {
    let mut members = Vec::new();
    let mut stack: Vec<NodeId> = view.children(container).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if id == exclude || !view.visible(id) {
            continue;
        }
        if is_container(view, id, axis) {
            members.push(id);
            continue;
        }
        if is_stop(view, id) {
            members.push(id);
        }
        stack.extend(view.children(id).iter().rev().copied());
    }
    members
}

/// Scan one container level geometrically: rank the eligible members by
/// edge gap, breaking ties by center distance, and resolve the winners in
/// order, entering containers as needed.
fn scan_directional_level(
    view: &View,
    container: NodeId,
    reference: Rect,
    exclude: NodeId,
    direction: NavigationDirection,
) -> Option<NodeId> {
    let axis = NavigationAxis::Directional;
    let mut ranked: Vec<(f32, f32, NodeId)> = directional_members(view, container, exclude, axis)
        .into_iter()
        .filter_map(|id| {
            let b = view.bounds(id);
            if b.is_zero() || !is_beyond(b, reference, direction) {
                return None;
            }
            Some((edge_gap(b, reference, direction), center_gap(b, reference), id))
        })
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));

    for (_, _, id) in ranked {
        if is_container(view, id, axis) {
            if let Some(found) = enter_directional_container(view, id, direction) {
                return Some(found);
            }
        } else {
            return Some(id);
        }
    }
    None
}

/// Enter a container found during a directional scan: restore the
/// remembered descendant for `Once` mode, otherwise search inside with the
/// reference placed just outside the near edge. Local searches never
/// escalate.
fn enter_directional_container(
    view: &View,
    container: NodeId,
    direction: NavigationDirection,
) -> Option<NodeId> {
    match axis_mode(view, container, NavigationAxis::Directional) {
        NavigationMode::None => return None,
        NavigationMode::Once => {
            if let Some(last) = view.peek_last_focused(container) {
                return Some(last);
            }
        }
        _ => {}
    }
    let cb = view.bounds(container);
    let reference = move_bounds_outside(cb, cb, direction);
    if let Some(found) = scan_directional_level(view, container, reference, container, direction) {
        return Some(found);
    }
    if is_focus_fallback(view, container) {
        return Some(container);
    }
    None
}

/// Directional search: scan the bounding container, wrapping on `Cycle`,
/// stopping on `Contained`, and otherwise escalating with the container
/// itself as the new reference unit.
fn directional_search(
    view: &View,
    element: NodeId,
    direction: NavigationDirection,
) -> Option<NodeId> {
    let axis = NavigationAxis::Directional;
    let mut container = container_above(view, element, axis);
    if container == element {
        // Element is the root of its tree.
        return scan_directional_level(view, element, view.bounds(element), element, direction);
    }
    let mut reference = view.bounds(element);
    let mut exclude = element;
    let mut wraps = 0;
    loop {
        if let Some(found) = scan_directional_level(view, container, reference, exclude, direction)
        {
            return Some(found);
        }
        match axis_mode(view, container, axis) {
            NavigationMode::Cycle => {
                if wraps >= CYCLE_WRAP_LIMIT {
                    return None;
                }
                wraps += 1;
                reference = move_bounds_outside(reference, view.bounds(container), direction);
            }
            NavigationMode::Contained => return None,
            _ => {
                if view.nav_parent(container).is_none() {
                    return None;
                }
                reference = view.bounds(container);
                exclude = container;
                container = container_above(view, container, axis);
                wraps = 0;
            }
        }
    }
}
