// src/render.rs
use crate::models::{Post, SessionState};
use crate::session::View;

pub const TITLE: &str = "Solar Writer ✍";

pub fn render_intro() -> String {
    let mut out = String::new();
    out.push_str("This app generates new facebook posts based on your previous facebook posts.\n");
    out.push_str("Only three steps are needed:\n");
    out.push_str("1. Enter your facebook URL.        fetch [url]\n");
    out.push_str("2. Generate a post subject.        subject | subject set <text>\n");
    out.push_str("3. Generate a new post.            post | post edit\n");
    out.push_str("Then `download` saves new_post.txt. `show`, `help`, `quit`.\n");
    out
}

fn counter(v: Option<i64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn render_post(i: usize, p: &Post) -> String {
    let mut out = format!(
        "#{} likes={} comments={} shares={}\n",
        i + 1,
        counter(p.likes),
        counter(p.comments),
        counter(p.shares)
    );
    match p.text.as_deref() {
        Some(text) => {
            for line in text.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
        None => out.push_str("    (no text)\n"),
    }
    out
}

pub fn render_posts(posts: &[Post]) -> String {
    posts
        .iter()
        .enumerate()
        .map(|(i, p)| render_post(i, p))
        .collect()
}

/// Everything currently on screen, derived from state only.
pub fn render_view(state: &SessionState) -> String {
    let view = View::of(state);
    let mut out = String::new();

    match &view.posts_panel {
        Some(title) => {
            out.push_str(&format!("## {}\n", title));
            out.push_str(&render_posts(&state.posts));
        }
        None => out.push_str("No posts yet. Use `fetch [url]`.\n"),
    }

    if let Some(label) = view.subject_form {
        out.push_str(&format!("\n## Proposed Subject  [subject: {}]\n", label));
        out.push_str(&format!("{}\n", state.suggested_subject));
    } else if !state.suggested_subject.is_empty() {
        out.push_str(&format!("\n## Proposed Subject\n{}\n", state.suggested_subject));
    }

    if view.post_form {
        out.push_str("\n## New Post  [post: Generate New Post]\n");
        if view.post_area {
            out.push_str(&format!("{}\n", state.new_post));
        }
    }

    if view.download {
        out.push_str("\n[download: Download New Post]\n");
    }
    out
}
