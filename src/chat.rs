use anyhow::Result;
use chrono::{DateTime, Local};
use std::future::Future;
use tokio::task::JoinHandle;

/// First message of every session, present before any user input.
pub const GREETING: &str = "Hello! I'm your AI Biology Tutor. Ask me anything about biology - from basic cell structure to complex genetic processes. How can I help you learn today?";

/// Shown in place of a reply when the backend call fails for any reason.
pub const FALLBACK_REPLY: &str = "I apologize, but I'm having trouble connecting right now. Please try again in a moment!";

pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "What is the difference between mitosis and meiosis?",
    "How does photosynthesis work?",
    "Explain the structure of DNA",
    "What happens during cellular respiration?",
];

const TUTOR_PERSONA: &str = "You are CellMate, an expert AI biology tutor. Your goal is to help students understand biology concepts clearly and engagingly.\n\n\
Guidelines:\n\
- Provide clear, accurate explanations appropriate for high school to college level biology\n\
- Use analogies and examples to make complex concepts understandable\n\
- Break down complex processes into step-by-step explanations\n\
- Encourage curiosity and deeper learning\n\
- If asked about non-biology topics, gently redirect to biology-related aspects\n\
- Be encouraging and supportive in your teaching approach\n\n\
Student question: ";

/// Fixed persona preamble followed by the literal student question.
pub fn tutor_prompt(question: &str) -> String {
    let mut prompt = String::with_capacity(TUTOR_PERSONA.len() + question.len());
    prompt.push_str(TUTOR_PERSONA);
    prompt.push_str(question);
    prompt
}

/// The single call the chat session needs from a text-generation backend.
///
/// `GeminiClient` is the production implementation; tests inject fakes.
pub trait TextGenerator: Clone + Send + Sync + 'static {
    fn generate(&self, prompt: String) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

/// One chat turn. Immutable once appended.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub author: Author,
    pub sent_at: DateTime<Local>,
}

/// Conversation log plus the single-flight request state.
///
/// Messages are append-only and every accepted submission yields exactly one
/// assistant message, real or fallback.
pub struct ChatSession<G: TextGenerator> {
    client: G,
    messages: Vec<Message>,
    pending: bool,
    reply_task: Option<JoinHandle<Result<String>>>,
    next_id: u64,
}

impl<G: TextGenerator> ChatSession<G> {
    pub fn new(client: G) -> Self {
        let mut session = Self {
            client,
            messages: Vec::new(),
            pending: false,
            reply_task: None,
            next_id: 0,
        };
        session.push_message(Author::Assistant, GREETING.to_string());
        session
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True while a generation request is in flight.
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Submit one user turn. Returns false (and does nothing) for
    /// empty/whitespace input or while a previous turn is still pending.
    pub fn submit(&mut self, text: &str) -> bool {
        let question = text.trim();
        if question.is_empty() || self.pending {
            return false;
        }

        self.push_message(Author::User, question.to_string());
        self.pending = true;

        let client = self.client.clone();
        let prompt = tutor_prompt(question);
        self.reply_task = Some(tokio::spawn(async move { client.generate(prompt).await }));
        true
    }

    /// Drain the reply task if it has finished. Called from the event loop;
    /// appends the assistant message and clears the pending flag on every
    /// completion path.
    pub async fn poll_reply(&mut self) {
        if !self
            .reply_task
            .as_ref()
            .is_some_and(|task| task.is_finished())
        {
            return;
        }
        let Some(task) = self.reply_task.take() else {
            return;
        };

        let reply = match task.await {
            Ok(Ok(text)) => text,
            Ok(Err(cause)) => {
                tracing::warn!(kind = "generation-failure", %cause, "backend call failed");
                FALLBACK_REPLY.to_string()
            }
            Err(cause) => {
                tracing::warn!(kind = "generation-failure", %cause, "reply task panicked");
                FALLBACK_REPLY.to_string()
            }
        };

        self.push_message(Author::Assistant, reply);
        self.pending = false;
    }

    fn push_message(&mut self, author: Author, text: String) {
        self.messages.push(Message {
            id: self.next_id,
            text,
            author,
            sent_at: Local::now(),
        });
        self.next_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[derive(Clone)]
    struct CannedGenerator {
        reply: Option<&'static str>,
        calls: Arc<AtomicUsize>,
        gate: Option<Arc<Notify>>,
    }

    impl CannedGenerator {
        fn ok(reply: &'static str) -> Self {
            Self {
                reply: Some(reply),
                calls: Arc::new(AtomicUsize::new(0)),
                gate: None,
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: Arc::new(AtomicUsize::new(0)),
                gate: None,
            }
        }

        fn gated(reply: &'static str, gate: Arc<Notify>) -> Self {
            Self {
                reply: Some(reply),
                calls: Arc::new(AtomicUsize::new(0)),
                gate: Some(gate),
            }
        }
    }

    impl TextGenerator for CannedGenerator {
        fn generate(&self, _prompt: String) -> impl Future<Output = Result<String>> + Send {
            let this = self.clone();
            async move {
                this.calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &this.gate {
                    gate.notified().await;
                }
                match this.reply {
                    Some(text) => Ok(text.to_string()),
                    None => Err(anyhow::anyhow!("connection refused")),
                }
            }
        }
    }

    async fn settle<G: TextGenerator>(session: &mut ChatSession<G>) {
        while session.pending() {
            tokio::task::yield_now().await;
            session.poll_reply().await;
        }
    }

    #[test]
    fn session_starts_with_greeting() {
        let session = ChatSession::new(CannedGenerator::ok("hi"));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].author, Author::Assistant);
        assert_eq!(session.messages()[0].text, GREETING);
        assert!(!session.pending());
    }

    #[tokio::test]
    async fn submit_yields_one_user_and_one_assistant_turn() {
        let gen = CannedGenerator::ok("Photosynthesis converts light...");
        let mut session = ChatSession::new(gen.clone());

        assert!(session.submit("How does photosynthesis work?"));
        assert!(session.pending());
        settle(&mut session).await;

        let msgs = session.messages();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1].author, Author::User);
        assert_eq!(msgs[1].text, "How does photosynthesis work?");
        assert_eq!(msgs[2].author, Author::Assistant);
        assert_eq!(msgs[2].text, "Photosynthesis converts light...");
        assert!(!session.pending());
        assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let mut session = ChatSession::new(CannedGenerator::ok("hi"));
        assert!(!session.submit(""));
        assert!(!session.submit("   \t  "));
        assert_eq!(session.messages().len(), 1);
        assert!(!session.pending());
    }

    #[tokio::test]
    async fn submission_text_is_trimmed() {
        let mut session = ChatSession::new(CannedGenerator::ok("sure"));
        assert!(session.submit("  what is a ribosome?  "));
        assert_eq!(session.messages()[1].text, "what is a ribosome?");
        settle(&mut session).await;
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_ignored() {
        let gate = Arc::new(Notify::new());
        let gen = CannedGenerator::gated("first answer", gate.clone());
        let mut session = ChatSession::new(gen.clone());

        assert!(session.submit("first question"));
        assert!(session.pending());
        assert!(!session.submit("second question"));
        assert_eq!(session.messages().len(), 2);

        gate.notify_one();
        settle(&mut session).await;

        assert_eq!(session.messages().len(), 3);
        assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
        assert!(!session.pending());
    }

    #[tokio::test]
    async fn failure_substitutes_fallback_reply() {
        let mut session = ChatSession::new(CannedGenerator::failing());
        assert!(session.submit("why is the sky blue?"));
        settle(&mut session).await;

        let last = session.messages().last().unwrap();
        assert_eq!(last.author, Author::Assistant);
        assert_eq!(last.text, FALLBACK_REPLY);
        assert!(!session.pending());
    }

    #[tokio::test]
    async fn can_submit_again_after_failure() {
        let mut session = ChatSession::new(CannedGenerator::failing());
        session.submit("one");
        settle(&mut session).await;
        assert!(session.submit("two"));
        settle(&mut session).await;
        assert_eq!(session.messages().len(), 5);
    }

    #[test]
    fn prompt_embeds_question_verbatim() {
        let prompt = tutor_prompt("What is DNA?");
        assert!(prompt.starts_with("You are CellMate"));
        assert!(prompt.ends_with("Student question: What is DNA?"));
    }
}
