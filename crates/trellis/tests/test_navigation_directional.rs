//! Integration tests for directional (arrow-key) focus navigation.

#[cfg(test)]
mod tests {
    use trellis::{
        ClassId, NavigationDirection, NavigationMode, NodeId, Rect, View,
        error::Result,
        navigation::predict_navigation,
    };

    const WIDGET: ClassId = ClassId("widget");

    /// Add a focusable stop with the given bounds.
    fn stop_at(view: &mut View, parent: NodeId, x: f32, y: f32) -> NodeId {
        let id = view.insert_child(parent, WIDGET).unwrap();
        view.set_bounds(id, Rect::new(x, y, 10.0, 10.0)).unwrap();
        id
    }

    /// Add a non-focusable container with the given bounds and mode on the
    /// directional axis.
    fn container_at(
        view: &mut View,
        parent: NodeId,
        bounds: Rect,
        mode: NavigationMode,
    ) -> NodeId {
        let id = view.insert_child(parent, WIDGET).unwrap();
        view.set_focusable(id, false).unwrap();
        view.set_bounds(id, bounds).unwrap();
        view.set_directional_navigation(id, mode).unwrap();
        id
    }

    fn new_view() -> (View, NodeId) {
        let mut view = View::new();
        let root = view.insert_root(WIDGET).unwrap();
        view.set_focusable(root, false).unwrap();
        view.set_bounds(root, Rect::new(0.0, 0.0, 300.0, 300.0))
            .unwrap();
        (view, root)
    }

    fn go(view: &View, from: NodeId, direction: NavigationDirection) -> Option<NodeId> {
        predict_navigation(view, from, direction, false)
    }

    #[test]
    fn moves_along_a_row() -> Result<()> {
        let (mut view, root) = new_view();
        let a = stop_at(&mut view, root, 0.0, 0.0);
        let b = stop_at(&mut view, root, 50.0, 0.0);
        let c = stop_at(&mut view, root, 100.0, 0.0);

        assert_eq!(go(&view, a, NavigationDirection::Right), Some(b));
        assert_eq!(go(&view, b, NavigationDirection::Right), Some(c));
        assert_eq!(go(&view, c, NavigationDirection::Right), None);
        assert_eq!(go(&view, c, NavigationDirection::Left), Some(b));
        Ok(())
    }

    #[test]
    fn moves_along_a_column() -> Result<()> {
        let (mut view, root) = new_view();
        let top = stop_at(&mut view, root, 0.0, 0.0);
        let bottom = stop_at(&mut view, root, 0.0, 80.0);

        assert_eq!(go(&view, top, NavigationDirection::Down), Some(bottom));
        assert_eq!(go(&view, bottom, NavigationDirection::Up), Some(top));
        assert_eq!(go(&view, top, NavigationDirection::Up), None);
        Ok(())
    }

    #[test]
    fn candidates_behind_the_motion_are_ineligible() -> Result<()> {
        let (mut view, root) = new_view();
        let mid = stop_at(&mut view, root, 50.0, 50.0);
        // Directly above: never a candidate for Left or Right.
        stop_at(&mut view, root, 50.0, 0.0);
        let left = stop_at(&mut view, root, 0.0, 50.0);

        assert_eq!(go(&view, mid, NavigationDirection::Right), None);
        assert_eq!(go(&view, mid, NavigationDirection::Left), Some(left));
        Ok(())
    }

    #[test]
    fn equal_edge_distance_breaks_tie_on_center_distance() -> Result<()> {
        let (mut view, root) = new_view();
        let from = stop_at(&mut view, root, 50.0, 50.0);
        // Same left edge, so the same primary score; the aligned one has
        // the nearer center.
        let aligned = stop_at(&mut view, root, 90.0, 50.0);
        let offset = stop_at(&mut view, root, 90.0, 120.0);

        assert_eq!(go(&view, from, NavigationDirection::Right), Some(aligned));
        assert_ne!(go(&view, from, NavigationDirection::Right), Some(offset));
        Ok(())
    }

    #[test]
    fn nearest_edge_wins_over_alignment() -> Result<()> {
        let (mut view, root) = new_view();
        let from = stop_at(&mut view, root, 0.0, 50.0);
        let near = stop_at(&mut view, root, 30.0, 90.0);
        stop_at(&mut view, root, 60.0, 50.0);

        assert_eq!(go(&view, from, NavigationDirection::Right), Some(near));
        Ok(())
    }

    #[test]
    fn cycle_container_wraps_to_the_far_side() -> Result<()> {
        let (mut view, root) = new_view();
        let c = container_at(
            &mut view,
            root,
            Rect::new(0.0, 0.0, 200.0, 50.0),
            NavigationMode::Cycle,
        );
        let first = stop_at(&mut view, c, 0.0, 0.0);
        let mid = stop_at(&mut view, c, 80.0, 0.0);
        let last = stop_at(&mut view, c, 160.0, 0.0);

        assert_eq!(go(&view, last, NavigationDirection::Right), Some(first));
        assert_eq!(go(&view, first, NavigationDirection::Left), Some(last));
        assert_eq!(go(&view, mid, NavigationDirection::Right), Some(last));
        Ok(())
    }

    #[test]
    fn contained_container_never_escapes() -> Result<()> {
        let (mut view, root) = new_view();
        let c = container_at(
            &mut view,
            root,
            Rect::new(0.0, 0.0, 100.0, 50.0),
            NavigationMode::Contained,
        );
        let inner = stop_at(&mut view, c, 50.0, 0.0);
        // A perfectly good candidate outside the container.
        stop_at(&mut view, root, 150.0, 0.0);

        assert_eq!(go(&view, inner, NavigationDirection::Right), None);
        Ok(())
    }

    #[test]
    fn entering_a_container_picks_the_near_edge() -> Result<()> {
        let (mut view, root) = new_view();
        let from = stop_at(&mut view, root, 0.0, 0.0);
        let c = container_at(
            &mut view,
            root,
            Rect::new(50.0, 0.0, 200.0, 50.0),
            NavigationMode::Local,
        );
        let near = stop_at(&mut view, c, 60.0, 0.0);
        stop_at(&mut view, c, 200.0, 0.0);

        assert_eq!(go(&view, from, NavigationDirection::Right), Some(near));
        Ok(())
    }

    #[test]
    fn entering_a_once_container_restores_last_focused() -> Result<()> {
        let (mut view, root) = new_view();
        let from = stop_at(&mut view, root, 0.0, 0.0);
        let c = container_at(
            &mut view,
            root,
            Rect::new(50.0, 0.0, 200.0, 50.0),
            NavigationMode::Once,
        );
        stop_at(&mut view, c, 60.0, 0.0);
        let remembered = stop_at(&mut view, c, 200.0, 0.0);
        view.set_focus(remembered)?;

        assert_eq!(go(&view, from, NavigationDirection::Right), Some(remembered));
        Ok(())
    }

    #[test]
    fn none_container_is_skipped() -> Result<()> {
        let (mut view, root) = new_view();
        let from = stop_at(&mut view, root, 0.0, 0.0);
        let c = container_at(
            &mut view,
            root,
            Rect::new(30.0, 0.0, 50.0, 50.0),
            NavigationMode::None,
        );
        stop_at(&mut view, c, 40.0, 0.0);
        let beyond = stop_at(&mut view, root, 120.0, 0.0);

        assert_eq!(go(&view, from, NavigationDirection::Right), Some(beyond));
        Ok(())
    }

    #[test]
    fn exhausted_local_container_escalates() -> Result<()> {
        let (mut view, root) = new_view();
        let c = container_at(
            &mut view,
            root,
            Rect::new(0.0, 0.0, 100.0, 50.0),
            NavigationMode::Local,
        );
        let inner = stop_at(&mut view, c, 80.0, 0.0);
        let outside = stop_at(&mut view, root, 150.0, 0.0);

        assert_eq!(go(&view, inner, NavigationDirection::Right), Some(outside));
        Ok(())
    }

    #[test]
    fn zero_sized_elements_are_ignored() -> Result<()> {
        let (mut view, root) = new_view();
        let from = stop_at(&mut view, root, 0.0, 0.0);
        let ghost = view.insert_child(root, WIDGET)?;
        view.set_bounds(ghost, Rect::new(30.0, 0.0, 0.0, 0.0))?;
        let real = stop_at(&mut view, root, 60.0, 0.0);

        assert_eq!(go(&view, from, NavigationDirection::Right), Some(real));
        Ok(())
    }
}
