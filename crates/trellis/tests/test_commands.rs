//! Integration tests for command bindings and input translation.

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use trellis::{
        ClassId, Command, CommandBinding, CommandId, CommandRegistry, InputBinding, NodeId,
        ParamValue, View,
        error::Result,
        event::key::{Ctrl, Key, KeyCode},
        gesture::InputGesture,
    };

    const WIDGET: ClassId = ClassId("widget");

    fn key(c: char) -> Key {
        Key::from(KeyCode::Char(c))
    }

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let c = Arc::new(AtomicUsize::new(0));
        (c.clone(), c)
    }

    /// A one-element view plus a fresh registry.
    fn setup() -> (View, NodeId, CommandRegistry) {
        let mut view = View::new();
        let root = view.insert_root(WIDGET).unwrap();
        (view, root, CommandRegistry::new())
    }

    #[test]
    fn last_added_input_binding_wins() -> Result<()> {
        let (mut view, root, registry) = setup();
        let (ran_a, ran_a2) = counter();
        let (ran_b, ran_b2) = counter();
        let cmd_a = Arc::new(Command::routed(CommandId("a")));
        let cmd_b = Arc::new(Command::routed(CommandId("b")));

        let gesture: InputGesture = "x".parse()?;
        view.input_bindings_mut(root)?
            .add(InputBinding::new(gesture, cmd_a.clone()));
        view.input_bindings_mut(root)?
            .add(InputBinding::new(gesture, cmd_b.clone()));
        view.command_bindings_mut(root)?
            .add(CommandBinding::new(cmd_a).on_executed(Arc::new(move |_, _| {
                ran_a2.fetch_add(1, Ordering::SeqCst);
            })));
        view.command_bindings_mut(root)?
            .add(CommandBinding::new(cmd_b).on_executed(Arc::new(move |_, _| {
                ran_b2.fetch_add(1, Ordering::SeqCst);
            })));

        assert!(registry.handle_key_down_translation(&view, root, key('x')));
        assert_eq!(ran_a.load(Ordering::SeqCst), 0);
        assert_eq!(ran_b.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn command_gestures_trigger_command_bindings() -> Result<()> {
        let (mut view, root, registry) = setup();
        let (ran, ran2) = counter();
        let cmd = Arc::new(Command::routed(CommandId("save")).with_gesture("Ctrl+s".parse::<InputGesture>()?));
        view.command_bindings_mut(root)?
            .add(CommandBinding::new(cmd).on_executed(Arc::new(move |_, _| {
                ran2.fetch_add(1, Ordering::SeqCst);
            })));

        assert!(registry.handle_key_down_translation(&view, root, Ctrl + 's'));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(!registry.handle_key_down_translation(&view, root, key('s')));
        Ok(())
    }

    #[test]
    fn noop_command_suppresses_nothing_and_runs_nothing() -> Result<()> {
        let (mut view, root, registry) = setup();
        view.input_bindings_mut(root)?
            .add(InputBinding::new("q".parse::<InputGesture>()?, Command::noop()));

        assert!(!registry.handle_key_down_translation(&view, root, key('q')));
        Ok(())
    }

    #[test]
    fn default_executable_rule_applies_through_dispatch() -> Result<()> {
        let (mut view, root, registry) = setup();
        let cmd = Arc::new(Command::routed(CommandId("go")));
        view.command_bindings_mut(root)?
            .add(CommandBinding::new(cmd.clone()).on_executed(Arc::new(|_, _| {})));

        let (can, _) = registry.raise_can_execute(&view, root, &cmd, &ParamValue::Null);
        assert!(can);
        Ok(())
    }

    #[test]
    fn denied_can_execute_blocks_execution() -> Result<()> {
        let (mut view, root, registry) = setup();
        let (ran, ran2) = counter();
        let cmd = Arc::new(Command::routed(CommandId("go")));
        view.command_bindings_mut(root)?.add(
            CommandBinding::new(cmd.clone())
                .on_can_execute(Arc::new(|_, data| {
                    data.set_can_execute(false);
                    data.set_handled(true);
                }))
                .on_executed(Arc::new(move |_, _| {
                    ran2.fetch_add(1, Ordering::SeqCst);
                })),
        );
        view.input_bindings_mut(root)?
            .add(InputBinding::new("g".parse::<InputGesture>()?, cmd));

        assert!(!registry.handle_key_down_translation(&view, root, key('g')));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn continue_routing_leaves_input_unhandled() -> Result<()> {
        let (mut view, root, registry) = setup();
        let (ran, ran2) = counter();
        let cmd = Arc::new(Command::routed(CommandId("peek")));
        view.command_bindings_mut(root)?.add(
            CommandBinding::new(cmd.clone())
                .on_can_execute(Arc::new(|_, data| {
                    data.set_can_execute(true);
                    data.set_continue_routing(true);
                    data.set_handled(true);
                }))
                .on_executed(Arc::new(move |_, _| {
                    ran2.fetch_add(1, Ordering::SeqCst);
                })),
        );
        view.input_bindings_mut(root)?
            .add(InputBinding::new("p".parse::<InputGesture>()?, cmd));

        // The command executes, but the input event keeps routing.
        assert!(!registry.handle_key_down_translation(&view, root, key('p')));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn input_binding_parameter_reaches_the_handler() -> Result<()> {
        let (mut view, root, registry) = setup();
        let seen = Arc::new(std::sync::Mutex::new(ParamValue::Null));
        let seen2 = seen.clone();
        let cmd = Arc::new(Command::routed(CommandId("page")));
        view.command_bindings_mut(root)?.add(
            CommandBinding::new(cmd.clone()).on_executed(Arc::new(move |_, data| {
                *seen2.lock().unwrap() = data.parameter().clone();
            })),
        );
        view.input_bindings_mut(root)?.add(
            InputBinding::new("PageDown".parse::<InputGesture>()?, cmd).with_parameter(3i64),
        );

        assert!(registry.handle_key_down_translation(&view, root, Key::from(KeyCode::PageDown)));
        assert_eq!(*seen.lock().unwrap(), ParamValue::Int(3));
        Ok(())
    }

    #[test]
    fn dispatch_recovers_after_a_panicking_handler() -> Result<()> {
        let (mut view, root, registry) = setup();
        let (ran, ran2) = counter();
        let boom = Arc::new(Command::routed(CommandId("boom")));
        let calm = Arc::new(Command::routed(CommandId("calm")));
        view.command_bindings_mut(root)?.add(
            CommandBinding::new(boom.clone()).on_executed(Arc::new(|_, _| panic!("handler failure"))),
        );
        view.command_bindings_mut(root)?.add(
            CommandBinding::new(calm.clone()).on_executed(Arc::new(move |_, _| {
                ran2.fetch_add(1, Ordering::SeqCst);
            })),
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            registry.raise_executed(&view, root, &boom, &ParamValue::Null);
        }));
        assert!(result.is_err());

        // Pooled records and the scratch list were released on unwind, so a
        // later raise starts from clean state.
        assert!(registry.raise_executed(&view, root, &calm, &ParamValue::Null));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        let (can, _) = registry.raise_can_execute(&view, root, &calm, &ParamValue::Null);
        assert!(can);
        Ok(())
    }

    #[test]
    fn mouse_wheel_and_gamepad_gestures_translate() -> Result<()> {
        use trellis::event::{
            gamepad::GamepadButton,
            key::Empty,
            mouse::{MouseButton, WheelDirection},
        };

        let (mut view, root, registry) = setup();
        let (ran, ran2) = counter();
        let cmd = Arc::new(Command::routed(CommandId("multi")));
        view.command_bindings_mut(root)?.add(
            CommandBinding::new(cmd.clone()).on_executed(Arc::new(move |_, _| {
                ran2.fetch_add(1, Ordering::SeqCst);
            })),
        );
        for gesture in ["LeftDoubleClick", "Ctrl+WheelUp", "GamepadA"] {
            view.input_bindings_mut(root)?
                .add(InputBinding::new(gesture.parse::<InputGesture>()?, cmd.clone()));
        }

        assert!(registry.handle_mouse_double_click_translation(
            &view,
            root,
            MouseButton::Left,
            Empty
        ));
        assert!(!registry.handle_mouse_click_translation(&view, root, MouseButton::Left, Empty));
        assert!(registry.handle_mouse_wheel_translation(&view, root, WheelDirection::Up, Ctrl));
        assert!(!registry.handle_mouse_wheel_translation(&view, root, WheelDirection::Up, Empty));
        assert!(registry.handle_gamepad_button_down_translation(&view, root, GamepadButton::A));
        assert!(!registry.handle_gamepad_button_down_translation(&view, root, GamepadButton::B));
        assert_eq!(ran.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[test]
    fn command_source_executes_against_its_target() -> Result<()> {
        let (mut view, root, registry) = setup();
        let button = view.insert_child(root, WIDGET)?;
        let (ran, ran2) = counter();
        let cmd = Arc::new(Command::routed(CommandId("submit")));
        view.command_bindings_mut(root)?.add(
            CommandBinding::new(cmd.clone()).on_executed(Arc::new(move |_, _| {
                ran2.fetch_add(1, Ordering::SeqCst);
            })),
        );
        view.set_command_source(button, cmd, ParamValue::Null, None)?;

        assert!(registry.check_can_execute_source(&view, button)?);
        assert!(registry.execute_source(&view, button)?);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn sourceless_element_cannot_execute() -> Result<()> {
        let (view, root, registry) = setup();
        assert!(!registry.check_can_execute_source(&view, root)?);
        assert!(!registry.execute_source(&view, root)?);
        Ok(())
    }

    #[test]
    fn source_queries_on_foreign_elements_are_errors() {
        let (view, _, registry) = setup();
        let mut other = View::new();
        let stranger = other.insert_root(WIDGET).unwrap();
        drop(other);
        // The stranger occupies the same arena slot as this view's root,
        // but ids from another view must never resolve here.
        assert!(!view.contains(stranger));
        assert!(registry.check_can_execute_source(&view, stranger).is_err());
        assert!(registry.execute_source(&view, stranger).is_err());
    }
}
