use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use helpline::config::{Config, DatasetSettings};
use helpline::{
    CallError, CompletionClient, Helpline, Message, NUM_EXAMPLES, Role, SAMPLE_SEED,
    StartupError, ValidationWarning, app,
};

/// Replies from a script and records every transcript it was shown
#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, CallError>>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<String, CallError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Vec<Message>> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, transcript: &[Message]) -> Result<String, CallError> {
        self.seen.lock().expect("seen lock").push(transcript.to_vec());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Ok("I'm listening.".to_string()))
    }
}

fn write_dataset(dir: &Path, rows: usize) -> DatasetSettings {
    let path = dir.join("empathetic_dialogues.csv");
    let mut csv = String::from("empathetic_dialogues,labels\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "\"Customer: I have been struggling, day {i}\nAgent:\",\"That sounds really hard ({i}).\"\n"
        ));
    }
    fs::write(&path, csv).expect("write dataset");

    DatasetSettings {
        path,
        ..DatasetSettings::default()
    }
}

fn helpline(client: Arc<ScriptedClient>) -> Helpline {
    Helpline::from_parts("You are a mental health helpline assistant.", client)
}

#[tokio::test]
async fn anxious_message_grows_transcript_by_two() {
    let client = ScriptedClient::new(vec![Ok("I'm sorry you're feeling anxious.".to_string())]);
    let helpline = helpline(client.clone());
    let mut session = helpline.new_session();

    let turn = session.submit("I feel anxious today").await.unwrap();
    assert_eq!(turn.reply, Ok("I'm sorry you're feeling anxious.".to_string()));

    let all = session.transcript().all();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].role, Role::System);
    assert_eq!(all[0].content, helpline.primer());
    assert_eq!((all[1].role, all[1].content.as_str()), (Role::User, "I feel anxious today"));
    assert_eq!(
        (all[2].role, all[2].content.as_str()),
        (Role::Assistant, "I'm sorry you're feeling anxious.")
    );

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[0][0].role, Role::System);
    assert_eq!(calls[0][1].content, "I feel anxious today");
}

#[tokio::test]
async fn transport_failure_becomes_the_assistant_entry() {
    let failure = CallError::Transport("connection reset by peer".to_string());
    let client = ScriptedClient::new(vec![Err(failure.clone())]);
    let mut session = helpline(client).new_session();

    let turn = session.submit("hello?").await.unwrap();
    assert_eq!(turn.reply, Err(failure.clone()));

    let all = session.transcript().all();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].role, Role::Assistant);
    assert_eq!(
        all[2].content,
        "Error calling OpenAI API: request failed: connection reset by peer"
    );

    // The session keeps going after a failure.
    session.submit("are you there?").await.unwrap();
    assert_eq!(session.transcript().len(), 5);
    assert_eq!(session.transcript().all()[4].content, "I'm listening.");
}

#[tokio::test]
async fn blank_input_never_reaches_the_service() {
    let client = ScriptedClient::new(vec![]);
    let mut session = helpline(client.clone()).new_session();

    for input in ["", "   ", "\n\t"] {
        assert_eq!(session.submit(input).await, Err(ValidationWarning::EmptyMessage));
    }
    assert_eq!(session.transcript().len(), 1);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn history_alternates_and_is_sent_in_full() {
    let client = ScriptedClient::new(vec![]);
    let mut session = helpline(client.clone()).new_session();

    for i in 0..3 {
        session.submit(&format!("message {i}")).await.unwrap();
    }

    let roles: Vec<_> = session.transcript().all().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
        ]
    );

    let lens: Vec<_> = client.calls().iter().map(Vec::len).collect();
    assert_eq!(lens, vec![2, 4, 6]);
}

#[tokio::test]
async fn clear_after_three_exchanges_keeps_only_primer() {
    let client = ScriptedClient::new(vec![]);
    let helpline = helpline(client);
    let mut session = helpline.new_session();
    for text in ["one", "two", "three"] {
        session.submit(text).await.unwrap();
    }
    assert_eq!(session.transcript().len(), 7);

    session.clear();
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.transcript().all()[0].role, Role::System);
    assert_eq!(session.transcript().primer(), helpline.primer());
}

#[tokio::test]
async fn sessions_do_not_share_transcripts() {
    let helpline = helpline(ScriptedClient::new(vec![]));
    let mut first = helpline.new_session();
    let second = helpline.new_session();

    first.submit("only in the first session").await.unwrap();
    assert_eq!(first.transcript().len(), 3);
    assert_eq!(second.transcript().len(), 1);
    assert_ne!(first.id(), second.id());
}

#[test]
fn primer_from_exactly_num_examples_rows_includes_all_of_them() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_dataset(dir.path(), NUM_EXAMPLES);

    let primer = app::load_primer(&settings).unwrap();
    assert_eq!(primer.matches("Agent's response:").count(), NUM_EXAMPLES);
    for i in 0..NUM_EXAMPLES {
        assert!(primer.contains(&format!("That sounds really hard ({i}).")));
    }
    assert_eq!(primer, app::load_primer(&settings).unwrap());
}

#[test]
fn fifty_rows_is_a_sample_size_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_dataset(dir.path(), 50);

    let err = app::load_primer(&settings).unwrap_err();
    assert!(matches!(
        err,
        StartupError::SampleSize {
            available: 50,
            requested: 100
        }
    ));
    assert_eq!(settings.seed, SAMPLE_SEED);
}

#[test]
fn bootstrap_requires_a_credential_before_anything_else() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        dataset: write_dataset(dir.path(), NUM_EXAMPLES),
        api_key: None,
        home: dir.path().to_path_buf(),
        ..Config::default()
    };

    assert!(matches!(
        Helpline::bootstrap(&config),
        Err(StartupError::Config(_))
    ));
}

#[test]
fn bootstrap_with_credential_and_dataset_builds_primer() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        dataset: write_dataset(dir.path(), 120),
        api_key: Some("sk-test".to_string()),
        home: dir.path().to_path_buf(),
        ..Config::default()
    };

    let helpline = Helpline::bootstrap(&config).unwrap();
    assert!(helpline.primer().starts_with("You are a mental health helpline assistant."));
    assert_eq!(helpline.primer().matches("Agent's response:").count(), NUM_EXAMPLES);

    let session = helpline.new_session();
    assert_eq!(session.transcript().primer(), helpline.primer());
}

#[test]
fn missing_dataset_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        dataset: DatasetSettings {
            path: dir.path().join("missing.csv"),
            ..DatasetSettings::default()
        },
        api_key: Some("sk-test".to_string()),
        home: dir.path().to_path_buf(),
        ..Config::default()
    };

    assert!(matches!(
        Helpline::bootstrap(&config),
        Err(StartupError::Dataset { .. })
    ));
}
