//! Runner facade tests: the update loop, callables, signals, and scripts

use std::sync::{Arc, Mutex};

use dialog_runtime::nodes::factory::decode_payload;
use dialog_runtime::{
    DialogError, DialogNode, DialogResult, DialogRunner, NodeBlueprint, NodeCommand, NodeCore,
    ScriptLoader, Speech,
};
use serde::Deserialize;
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn heard_texts(runner: &mut DialogRunner) -> Arc<Mutex<Vec<String>>> {
    let heard = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&heard);
    runner.subscribe_speech(move |speech| {
        sink.lock().unwrap().push(speech.text.clone());
    });
    heard
}

#[test]
fn test_update_walks_the_chain_in_order() {
    init_tracing();
    let mut runner = DialogRunner::default();
    let heard = heard_texts(&mut runner);

    runner
        .bootstrap([
            NodeBlueprint::new("entry", "greet", "start").with_payload(json!({ "next": "hello" })),
            NodeBlueprint::new("line", "greet", "hello").with_payload(
                json!({ "who": "guide", "text": "welcome in", "duration": 0.5, "next": "warn" }),
            ),
            NodeBlueprint::new("line", "greet", "warn").with_payload(
                json!({ "who": "guide", "text": "mind the step", "duration": 0.5 }),
            ),
        ])
        .unwrap();

    runner.start_conversation("greet").unwrap();
    assert!(heard.lock().unwrap().is_empty());

    // Entry hands off; the first line speaks
    runner.update(0.0).unwrap();
    assert_eq!(&*heard.lock().unwrap(), &["welcome in"]);

    // Not enough time for the line to run its course
    runner.update(0.3).unwrap();
    assert_eq!(heard.lock().unwrap().len(), 1);

    // Crossing the duration hands off to the second line
    runner.update(0.3).unwrap();
    assert_eq!(&*heard.lock().unwrap(), &["welcome in", "mind the step"]);

    // The last line ends the conversation softly; nothing stays on
    runner.update(0.3).unwrap();
    runner.update(0.3).unwrap();
    assert!(runner
        .nodes()
        .active_in_conversation("greet", runner.language())
        .is_none());
    assert!(runner.nodes().has_conversation("greet"));
}

#[test]
fn test_expression_roundtrip() {
    let mut runner = DialogRunner::default();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    runner.register_expression("HasKey", move |args: &[String]| {
        sink.lock().unwrap().push(args.to_vec());
        args.first().is_some_and(|door| door == "cellar")
    });

    assert!(runner
        .evaluate_expression("HasKey", &["cellar".to_string()])
        .unwrap());
    assert!(!runner
        .evaluate_expression("HasKey", &["attic".to_string()])
        .unwrap());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], ["cellar"]);
    assert_eq!(calls[1], ["attic"]);
}

#[test]
fn test_is_active_follows_conversation_state() {
    let mut runner = DialogRunner::default();
    runner
        .bootstrap([
            NodeBlueprint::new("entry", "greet", "start").with_payload(json!({ "next": "hello" })),
            NodeBlueprint::new("line", "greet", "hello")
                .with_payload(json!({ "who": "guide", "text": "welcome in", "duration": 1.0 })),
        ])
        .unwrap();

    let greet = ["greet".to_string()];
    assert!(!runner.evaluate_expression("IsActive", &greet).unwrap());

    runner.start_conversation("greet").unwrap();
    assert!(runner.evaluate_expression("IsActive", &greet).unwrap());

    runner.stop_conversation("greet").unwrap();
    assert!(!runner.evaluate_expression("IsActive", &greet).unwrap());

    // Without a conversation argument the check reads as false
    assert!(!runner.evaluate_expression("IsActive", &[]).unwrap());
}

#[test]
fn test_callable_listings_are_deterministic() {
    let mut runner = DialogRunner::default();
    runner.register_expression("HasKey", |_: &[String]| true);
    runner.register_expression("CanLeave", |_: &[String]| false);
    runner.register_function("OpenDoor", |_: &[String]| {});
    runner.register_function("CloseDoor", |_: &[String]| {});

    // Re-registration keeps the original position
    runner.register_expression("HasKey", |_: &[String]| false);

    assert_eq!(runner.expression_names(), "IsActive, HasKey, CanLeave");
    assert_eq!(runner.function_names(), "OpenDoor, CloseDoor");
}

#[test]
fn test_unregistered_callables_fail() {
    let mut runner = DialogRunner::default();

    assert!(matches!(
        runner.evaluate_expression("HasKey", &[]),
        Err(DialogError::UnregisteredCallable { name, .. }) if name == "HasKey"
    ));
    assert!(matches!(
        runner.call_function("OpenDoor", &[]),
        Err(DialogError::UnregisteredCallable { name, .. }) if name == "OpenDoor"
    ));
}

#[test]
fn test_function_invocation_passes_arguments() {
    let mut runner = DialogRunner::default();

    let opened = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&opened);
    runner.register_function("OpenDoor", move |args: &[String]| {
        sink.lock().unwrap().extend(args.iter().cloned());
    });

    runner
        .call_function("OpenDoor", &["cellar".to_string()])
        .unwrap();
    assert_eq!(&*opened.lock().unwrap(), &["cellar"]);
}

#[test]
fn test_focus_needs_exactly_one_subscriber() {
    init_tracing();
    let mut runner = DialogRunner::default();

    assert!(matches!(
        runner.focus_conversation("greet"),
        Err(DialogError::MissingRequiredSubscriber { .. })
    ));
    assert!(matches!(
        runner.defocus_conversation("greet"),
        Err(DialogError::MissingRequiredSubscriber { .. })
    ));

    let staged = Arc::new(Mutex::new(Vec::new()));

    let focus_sink = Arc::clone(&staged);
    runner.set_focus_subscriber(move |conversation: &str| {
        focus_sink.lock().unwrap().push(format!("focus:{conversation}"));
    });
    let defocus_sink = Arc::clone(&staged);
    runner.set_defocus_subscriber(move |conversation: &str| {
        defocus_sink.lock().unwrap().push(format!("defocus:{conversation}"));
    });

    runner.focus_conversation("greet").unwrap();
    runner.defocus_conversation("greet").unwrap();
    assert_eq!(&*staged.lock().unwrap(), &["focus:greet", "defocus:greet"]);
}

#[test]
fn test_speech_subscriptions_unsubscribe_by_handle() {
    let mut runner = DialogRunner::default();

    let heard = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&heard);
    let subscription = runner.subscribe_speech(move |_: &Speech| {
        *sink.lock().unwrap() += 1;
    });

    runner.emit_speech(&Speech::new("guide", "welcome in"));
    assert_eq!(*heard.lock().unwrap(), 1);

    assert!(runner.unsubscribe_speech(subscription));
    assert!(!runner.unsubscribe_speech(subscription));

    // Nobody listening is benign
    runner.emit_speech(&Speech::new("guide", "still there"));
    assert_eq!(*heard.lock().unwrap(), 1);
}

#[test]
fn test_event_subscriptions_unsubscribe_by_handle() {
    init_tracing();
    let mut runner = DialogRunner::default();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = runner.subscribe_events(move |name: &str| {
        sink.lock().unwrap().push(name.to_string());
    });

    runner.emit_event("door_opened").unwrap();
    assert_eq!(&*seen.lock().unwrap(), &["door_opened"]);

    assert!(runner.unsubscribe_events(subscription));
    assert!(!runner.unsubscribe_events(subscription));

    runner.emit_event("door_opened").unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

struct OneLineLoader;

impl ScriptLoader for OneLineLoader {
    fn load(
        &self,
        source: &str,
        conversation: &str,
        runner: &mut DialogRunner,
    ) -> DialogResult<()> {
        runner.bootstrap([
            NodeBlueprint::new("entry", conversation, "start")
                .with_payload(json!({ "next": "say" })),
            NodeBlueprint::new("line", conversation, "say")
                .with_payload(json!({ "who": "script", "text": source })),
        ])?;
        Ok(())
    }
}

struct RejectingLoader;

impl ScriptLoader for RejectingLoader {
    fn load(
        &self,
        _source: &str,
        _conversation: &str,
        _runner: &mut DialogRunner,
    ) -> DialogResult<()> {
        Err(DialogError::ScriptRejected {
            reason: "unbalanced braces".to_string(),
        })
    }
}

#[test]
fn test_run_string_as_function() {
    init_tracing();
    let mut runner = DialogRunner::default();
    let heard = heard_texts(&mut runner);

    runner
        .run_string_as_function(&OneLineLoader, "say hello")
        .unwrap();
    runner.update(0.0).unwrap();
    assert_eq!(&*heard.lock().unwrap(), &["say hello"]);

    // A second run replaces the previous command conversation
    runner
        .run_string_as_function(&OneLineLoader, "say goodbye")
        .unwrap();
    runner.update(0.0).unwrap();
    assert_eq!(&*heard.lock().unwrap(), &["say hello", "say goodbye"]);
}

#[test]
fn test_rejected_script_surfaces_the_loader_error() {
    let mut runner = DialogRunner::default();

    assert!(matches!(
        runner.run_string_as_function(&RejectingLoader, "<garbage>"),
        Err(DialogError::ScriptRejected { .. })
    ));
}

#[test]
fn test_language_switch_rescopes_activity() {
    let mut runner = DialogRunner::default();
    runner
        .bootstrap([
            NodeBlueprint::new("entry", "greet", "start"),
            NodeBlueprint::new("entry", "greet", "start").with_language("de"),
        ])
        .unwrap();

    runner.start_conversation("greet").unwrap();

    // Active in English, quiet in German as far as IsActive is concerned
    let greet = ["greet".to_string()];
    assert!(runner.evaluate_expression("IsActive", &greet).unwrap());
    runner.set_language("de");
    assert!(!runner.evaluate_expression("IsActive", &greet).unwrap());

    // Nothing is on in German, so a German start goes through
    runner.start_conversation("greet").unwrap();
    assert!(runner.evaluate_expression("IsActive", &greet).unwrap());

    // Each language guards its own activity
    assert!(matches!(
        runner.start_conversation("greet"),
        Err(DialogError::AlreadyRunning { .. })
    ));
    runner.set_language("en");
    assert!(matches!(
        runner.start_conversation("greet"),
        Err(DialogError::AlreadyRunning { .. })
    ));

    // Stop clears every language, after which a start goes through again
    runner.stop_conversation("greet").unwrap();
    runner.start_conversation("greet").unwrap();
}

#[derive(Debug, Default, Deserialize)]
struct CuePayload {
    #[serde(default)]
    event: String,
}

/// Fires its event on the first tick, then ends the conversation
struct CueNode {
    core: NodeCore,
    event: String,
}

impl DialogNode for CueNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "cue"
    }

    fn activate(&mut self) -> Vec<NodeCommand> {
        self.core.is_on = true;
        Vec::new()
    }

    fn tick(&mut self, _dt: f32) -> Vec<NodeCommand> {
        self.core.is_on = false;
        vec![
            NodeCommand::RaiseEvent(self.event.clone()),
            NodeCommand::EndConversation,
        ]
    }
}

fn build_cue(core: NodeCore, payload: &Value) -> DialogResult<Box<dyn DialogNode>> {
    let payload: CuePayload = decode_payload("cue", payload)?;
    Ok(Box::new(CueNode {
        core,
        event: payload.event,
    }))
}

#[test]
fn test_host_registered_kind_runs_like_a_builtin() {
    init_tracing();
    let mut runner = DialogRunner::default();
    let heard = heard_texts(&mut runner);

    let raised = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&raised);
    runner.subscribe_events(move |name: &str| {
        sink.lock().unwrap().push(name.to_string());
    });

    runner.register_node_kind("cue", build_cue);
    let rows = runner
        .bootstrap([
            NodeBlueprint::new("entry", "show", "start").with_payload(json!({ "next": "finale" })),
            NodeBlueprint::new("cue", "show", "finale")
                .with_payload(json!({ "event": "fireworks" })),
            NodeBlueprint::new("listen", "crowd", "watcher")
                .with_payload(json!({ "event": "fireworks", "then": "gasp", "armed": true })),
            NodeBlueprint::new("line", "crowd", "gasp")
                .with_payload(json!({ "who": "crowd", "text": "ooh" })),
        ])
        .unwrap();
    assert_eq!(runner.nodes().node_by_row(rows[1]).unwrap().kind(), "cue");

    // The cue fires its event, which the armed listener picks up
    runner.start_conversation("show").unwrap();
    runner.update(0.0).unwrap();

    assert_eq!(&*raised.lock().unwrap(), &["fireworks"]);
    assert_eq!(&*heard.lock().unwrap(), &["ooh"]);
}
