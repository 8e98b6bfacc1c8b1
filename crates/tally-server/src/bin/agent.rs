//! Tally check-in agent worker.
//!
//! Drives one voice check-in session end to end: greeting, conversation,
//! transcript recording, then classification and task reconciliation when
//! the conversation ends.
//!
//! Audio transport is supplied by the deployment; this worker reads the
//! participant's utterances from stdin (one per line) so the full loop —
//! including TTS rendering of agent replies, the durable transcript, and
//! the extraction pipeline — runs without a live audio stack. A missing
//! TTS engine degrades to text-only output rather than ending the session.

use std::io::BufRead;
use std::sync::Arc;
use tally_extract::{LanguageModel, OpenAiCompatClient, TranscriptClassifier};
use tally_server::config;
use tally_types::voice::VoiceProfile;
use tally_types::Speaker;
use tally_voice::{CheckinSession, SttService, TtsService, CHECKIN_SYSTEM_PROMPT};
use tracing_subscriber::EnvFilter;

/// The line that ends the conversation, per the agent script.
const SIGN_OFF: &str = "Thank you for your time";

#[tokio::main]
async fn main() {
    let Some(email) = std::env::args().nth(1) else {
        eprintln!("usage: tally-agent <participant-email> [config-path]");
        std::process::exit(2);
    };
    let config_path = std::env::args().nth(2);

    let config = config::load_config(config_path.as_deref().or(Some("config.toml")))
        .expect("failed to load configuration");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pool = tally_db::create_pool(
        &config.database.path,
        tally_db::DbSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            max_connections: config.database.max_connections,
        },
    )
    .expect("failed to create database pool");
    {
        let conn = pool.get().expect("failed to get database connection");
        tally_db::run_migrations(&conn).expect("failed to run database migrations");
    }

    // The participant must already have an account; tasks reconcile
    // against their project.
    let participant = {
        let conn = pool.get().expect("failed to get database connection");
        match tally_server::users::find_user_by_email(&conn, &email) {
            Ok(Some(credentials)) => credentials.user,
            Ok(None) => {
                eprintln!("no account found for {email}");
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("failed to look up {email}: {e}");
                std::process::exit(1);
            }
        }
    };

    let llm: Arc<dyn LanguageModel> = Arc::new(
        OpenAiCompatClient::new(config.llm.clone())
            .expect("failed to build language model client"),
    );
    let classifier = TranscriptClassifier::new(llm.clone());

    let stt = Arc::new(SttService::new(
        &config.voice.stt_model,
        &config.voice.stt_binary,
    ));
    let tts = Arc::new(TtsService::new(
        &config.voice.voices_dir,
        &config.voice.tts_binary,
    ));
    tts.add_profile(VoiceProfile::default()).await;

    let session = CheckinSession::start(
        &participant.username,
        &config.voice.transcript_dir,
        stt,
        tts,
        "default",
    )
    .expect("failed to start check-in session");

    match session.greet().await {
        Ok(audio) => tracing::info!(bytes = audio.len(), "rendered greeting audio"),
        Err(e) => tracing::warn!(error = %e, "TTS unavailable, continuing text-only"),
    }
    println!("Bot: {}", tally_voice::CHECKIN_GREETING);

    let recorder = session.recorder();
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed, ending session");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        if let Err(e) = recorder.record(Speaker::User, &line) {
            tracing::warn!(error = %e, "failed to record utterance");
        }

        let prompt = format!(
            "{CHECKIN_SYSTEM_PROMPT}\n\nConversation so far:\n{}\n\nReply with the Bot's next line only.",
            session.transcript_text()
        );
        let reply = match llm.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "language model call failed, skipping reply");
                continue;
            }
        };

        match session.say(reply.trim()).await {
            Ok(audio) => tracing::info!(bytes = audio.len(), "rendered reply audio"),
            Err(e) => tracing::warn!(error = %e, "TTS unavailable for reply"),
        }
        println!("Bot: {}", reply.trim());

        if reply.contains(SIGN_OFF) {
            break;
        }
    }

    // Conversation over: extract task updates and apply them.
    let dialogue = session.transcript_text();
    let extraction = classifier.classify(&dialogue).await;
    tracing::info!(
        completed = extraction.completed_tasks.len(),
        new = extraction.new_tasks.len(),
        "classified session transcript"
    );

    let user_id = participant.id;
    let result = tokio::task::spawn_blocking(move || {
        let conn = pool.get().expect("failed to get database connection");
        tally_tasks::reconcile_tasks(
            &conn,
            user_id,
            &extraction.completed_tasks,
            &extraction.new_tasks,
        )
    })
    .await
    .expect("reconcile task panicked");

    match result {
        Ok(summary) => {
            println!(
                "Session complete: {} task(s) marked done, {} recorded as done, {} new task(s) added.",
                summary.marked_completed, summary.created_completed, summary.created_new
            );
            println!("Transcript saved to {}", session.transcript_path().display());
        }
        Err(e) => {
            eprintln!("could not apply task updates: {e}");
            std::process::exit(1);
        }
    }
}
