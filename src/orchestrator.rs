use anyhow::Result;
use tracing::{debug, info};

use crate::llm::Llm;
use crate::prompts::{user_new_post, user_subject};

/// Ask for one subject line. The reply is returned as-is, extra lines included.
pub async fn generate_subject(llm: &dyn Llm, context: &str) -> Result<String> {
    let start = std::time::Instant::now();
    debug!("Generating subject - context_length={} chars", context.chars().count());

    let subject = llm.complete(&user_subject(context)).await?;

    info!(
        "Subject generation completed - duration={:.2}s, lines={}",
        start.elapsed().as_secs_f32(),
        subject.lines().count()
    );
    Ok(subject)
}

/// Write a new post on `subject` in the voice of the posts in `context`.
pub async fn generate_post(llm: &dyn Llm, subject: &str, context: &str) -> Result<String> {
    let start = std::time::Instant::now();
    debug!(
        "Generating post - subject={:?}, context_length={} chars",
        subject,
        context.chars().count()
    );

    let post = llm.complete(&user_new_post(subject, context)).await?;

    info!(
        "Post generation completed - duration={:.2}s, post_length={} chars",
        start.elapsed().as_secs_f32(),
        post.chars().count()
    );
    Ok(post)
}
