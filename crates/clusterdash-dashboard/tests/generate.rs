mod common;

use std::sync::Arc;

use clusterdash_dashboard::{GenerateViewModel, InteractionPhase, ParameterUpdate};

use common::FakeBackend;

fn generator(fake: &Arc<FakeBackend>) -> GenerateViewModel {
    let vm = GenerateViewModel::new(fake.clone());
    vm.select_target(None, "mistral");
    vm
}

#[tokio::test]
async fn test_stream_fragments_are_appended() {
    let fake = FakeBackend::new();
    fake.script_generate(["Hel", "lo"]);
    let vm = generator(&fake);

    assert!(vm.generate("say hello").await);

    let state = vm.state().snapshot();
    assert_eq!(state.output, "Hello");
    assert_eq!(state.prompt, "say hello");
    assert_eq!(state.phase, InteractionPhase::Idle);

    let requests = fake.generate_requests.lock().unwrap();
    assert_eq!(requests[0].prompt, "say hello");
    assert_eq!(requests[0].model, "mistral");
    assert!(requests[0].stream);
    assert!(requests[0].parameters.is_none());
}

#[tokio::test]
async fn test_new_prompt_replaces_output() {
    let fake = FakeBackend::new();
    fake.script_generate(["first"]);
    let vm = generator(&fake);
    assert!(vm.generate("one").await);

    fake.script_generate(["sec", "ond"]);
    assert!(vm.generate("two").await);

    assert_eq!(vm.state().read(|s| s.output.clone()), "second");
}

#[tokio::test]
async fn test_non_streaming_sets_output() {
    let fake = FakeBackend::new();
    *fake.generate_reply.lock().unwrap() = "Once upon a time".to_string();
    let vm = generator(&fake);
    vm.set_streaming(false);
    vm.update_parameters(ParameterUpdate::top_p(0.8));

    assert!(vm.generate("tell a story").await);

    assert_eq!(vm.state().read(|s| s.output.clone()), "Once upon a time");
    let requests = fake.generate_requests.lock().unwrap();
    assert!(!requests[0].stream);
    assert_eq!(requests[0].parameters.as_ref().unwrap().top_p, Some(0.8));
}

#[tokio::test]
async fn test_failure_sets_error() {
    let fake = FakeBackend::new();
    fake.fail_with("no such model");
    let vm = generator(&fake);

    assert!(vm.generate("hi").await);

    let state = vm.state().snapshot();
    assert!(state.error.unwrap().contains("no such model"));
    assert!(state.output.is_empty());
    assert_eq!(state.phase, InteractionPhase::Idle);
}

#[tokio::test]
async fn test_generate_rejected_while_streaming() {
    let fake = FakeBackend::new();
    fake.script_generate(["Hel"]);
    let gate = fake.hold_streams();
    let vm = Arc::new(generator(&fake));

    let running = tokio::spawn({
        let vm = vm.clone();
        async move { vm.generate("one").await }
    });
    vm.state()
        .subscribe()
        .wait_for(|s| s.output == "Hel")
        .await
        .unwrap();

    assert!(!vm.generate("two").await);
    assert!(!vm.clear_output());

    gate.notify_one();
    assert!(running.await.unwrap());
    assert_eq!(fake.generate_requests.lock().unwrap().len(), 1);
    assert!(vm.clear_output());
    assert!(vm.state().read(|s| s.output.is_empty()));
}

#[tokio::test]
async fn test_cancel_keeps_generated_text() {
    let fake = FakeBackend::new();
    fake.script_generate(["Hel"]);
    let _gate = fake.hold_streams();
    let vm = Arc::new(generator(&fake));

    let running = tokio::spawn({
        let vm = vm.clone();
        async move { vm.generate("say hello").await }
    });
    vm.state()
        .subscribe()
        .wait_for(|s| s.output == "Hel")
        .await
        .unwrap();

    vm.cancel();
    assert!(running.await.unwrap());

    let state = vm.state().snapshot();
    assert_eq!(state.output, "Hel");
    assert_eq!(state.phase, InteractionPhase::Idle);
    assert!(state.error.is_none());

    fake.script_generate(["again"]);
    *fake.hold.lock().unwrap() = None;
    assert!(vm.generate("once more").await);
    assert_eq!(vm.state().read(|s| s.output.clone()), "again");
}

#[tokio::test]
async fn test_dispose_stops_stream_and_later_prompts() {
    let fake = FakeBackend::new();
    fake.script_generate(["Hel"]);
    let _gate = fake.hold_streams();
    let vm = Arc::new(generator(&fake));

    let running = tokio::spawn({
        let vm = vm.clone();
        async move { vm.generate("say hello").await }
    });
    vm.state()
        .subscribe()
        .wait_for(|s| s.phase == InteractionPhase::Streaming)
        .await
        .unwrap();

    vm.dispose();
    assert!(running.await.unwrap());

    assert_eq!(vm.state().read(|s| s.phase), InteractionPhase::Idle);
    assert!(!vm.generate("after dispose").await);
    assert_eq!(fake.generate_requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_without_model_sets_error() {
    let fake = FakeBackend::new();
    let vm = GenerateViewModel::new(fake.clone());

    assert!(!vm.generate("hi").await);
    assert!(vm.state().read(|s| s.error.is_some()));
    assert!(fake.generate_requests.lock().unwrap().is_empty());
}
