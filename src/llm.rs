use anyhow::{anyhow, Result};
use async_trait::async_trait;
use awful_aj::{api::ask, config::AwfulJadeConfig, template::ChatTemplate};
use tracing::{debug, info};

/// Anything that turns a filled prompt into a completion.
#[async_trait(?Send)]
pub trait Llm {
    async fn complete(&self, user: &str) -> Result<String>;
}

/// OpenAI-compatible chat endpoint reached through awful_aj. The template
/// supplies the system prompt; the filled prompt goes in as the user message.
pub struct AwfulJadeLlm {
    cfg: AwfulJadeConfig,
    tpl: ChatTemplate,
}

impl AwfulJadeLlm {
    pub fn new(cfg: AwfulJadeConfig, tpl: ChatTemplate) -> Self {
        Self { cfg, tpl }
    }
}

#[async_trait(?Send)]
impl Llm for AwfulJadeLlm {
    async fn complete(&self, user: &str) -> Result<String> {
        let start = std::time::Instant::now();
        debug!("Chat request - user_message={} chars", user.chars().count());

        // awful_aj reports Box<dyn Error>, which is neither Send nor Sync
        let reply = ask(&self.cfg, user.to_string(), &self.tpl, None, None, false)
            .await
            .map_err(|e| anyhow!("chat completion failed: {}", e))?;

        info!(
            "Chat reply received - duration={:.2}s, reply={} chars",
            start.elapsed().as_secs_f32(),
            reply.chars().count()
        );
        Ok(reply)
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays scripted replies in order and records every prompt it saw.
    /// An `Err` entry makes that call fail.
    #[derive(Default)]
    pub struct ScriptedLlm {
        replies: RefCell<VecDeque<Result<String, String>>>,
        pub prompts: RefCell<Vec<String>>,
    }

    impl ScriptedLlm {
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = Result<S, S>>,
            S: Into<String>,
        {
            Self {
                replies: RefCell::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(Into::into).map_err(Into::into))
                        .collect(),
                ),
                prompts: RefCell::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.borrow().len()
        }
    }

    #[async_trait(?Send)]
    impl Llm for ScriptedLlm {
        async fn complete(&self, user: &str) -> Result<String> {
            self.prompts.borrow_mut().push(user.to_string());
            match self.replies.borrow_mut().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(e)) => Err(anyhow!(e)),
                None => Err(anyhow!("no scripted reply left")),
            }
        }
    }
}
