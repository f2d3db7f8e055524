//! Session controller: explicit actions, pure state transitions, and a view
//! derived from state.
//!
//! The caller owns [`SessionState`] and hands it to [`Controller::dispatch`]
//! together with one [`Action`]. The controller performs whatever external
//! call the action needs and folds the result in with [`apply`]. Updates that
//! were applied before a failing call stay applied.

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::budget::{assemble_context, SizeBasis, MAX_CONTEXT_LENGTH};
use crate::export::Export;
use crate::fetch::{PostSource, DEFAULT_RESULTS_LIMIT};
use crate::llm::Llm;
use crate::models::{Post, SessionState};
use crate::orchestrator::{generate_post, generate_subject};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Fetch { url: String },
    GenerateSubject,
    GeneratePost,
    EditSubject(String),
    EditPost(String),
    Download,
    Show,
}

/// A single state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    PostsFetched(Vec<Post>),
    PostCleared,
    SubjectSet(String),
    PostSet(String),
}

/// Fold one update into the state. Fetching replaces the posts and leaves the
/// subject and post alone.
pub fn apply(mut state: SessionState, update: Update) -> SessionState {
    match update {
        Update::PostsFetched(posts) => state.posts = posts,
        Update::PostCleared => state.new_post.clear(),
        Update::SubjectSet(subject) => state.suggested_subject = subject,
        Update::PostSet(post) => state.new_post = post,
    }
    state
}

fn apply_in_place(state: &mut SessionState, update: Update) {
    *state = apply(std::mem::take(state), update);
}

/// Which controls are on screen for a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub posts_panel: Option<String>,
    pub subject_form: Option<&'static str>,
    pub post_form: bool,
    pub post_area: bool,
    pub download: bool,
}

impl View {
    pub fn of(state: &SessionState) -> Self {
        let has_posts = !state.posts.is_empty();
        let has_subject = !state.suggested_subject.is_empty();
        let has_post = !state.new_post.is_empty();

        View {
            posts_panel: has_posts
                .then(|| format!("Previous Facebook Posts ({})", state.posts.len())),
            subject_form: has_posts.then_some(if has_subject {
                "Regenerate Post Subject"
            } else {
                "Generate Post Subject"
            }),
            post_form: has_subject,
            post_area: has_subject && has_post,
            download: has_subject && has_post,
        }
    }
}

/// What a dispatched action produced, for the surface to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Fetched(usize),
    Subject(String),
    Post(String),
    Edited,
    Download(Export),
    View(View),
}

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub results_limit: usize,
    pub max_context: usize,
    pub basis: SizeBasis,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            results_limit: DEFAULT_RESULTS_LIMIT,
            max_context: MAX_CONTEXT_LENGTH,
            basis: SizeBasis::Serialized,
        }
    }
}

pub struct Controller<'a> {
    source: &'a dyn PostSource,
    llm: &'a dyn Llm,
    settings: Settings,
}

impl<'a> Controller<'a> {
    pub fn new(source: &'a dyn PostSource, llm: &'a dyn Llm, settings: Settings) -> Self {
        Self { source, llm, settings }
    }

    pub fn context(&self, state: &SessionState) -> String {
        assemble_context(&state.posts, self.settings.max_context, self.settings.basis)
    }

    pub async fn dispatch(&self, state: &mut SessionState, action: Action) -> Result<Reply> {
        debug!("Dispatching action - {:?}", action);
        let view = View::of(state);

        match action {
            Action::Fetch { url } => {
                let posts = self.source.fetch_posts(&url, self.settings.results_limit).await?;
                let n = posts.len();
                apply_in_place(state, Update::PostsFetched(posts));
                info!("Session posts replaced - posts={}", n);
                Ok(Reply::Fetched(n))
            }
            Action::GenerateSubject => {
                if view.subject_form.is_none() {
                    bail!("No posts yet: fetch posts before generating a subject");
                }
                let context = self.context(state);
                apply_in_place(state, Update::PostCleared);
                let subject = generate_subject(self.llm, &context).await?;
                apply_in_place(state, Update::SubjectSet(subject.clone()));
                Ok(Reply::Subject(subject))
            }
            Action::GeneratePost => {
                if !view.post_form {
                    bail!("No subject yet: generate or enter a subject first");
                }
                let context = self.context(state);
                let post = generate_post(self.llm, &state.suggested_subject, &context).await?;
                apply_in_place(state, Update::PostSet(post.clone()));
                Ok(Reply::Post(post))
            }
            Action::EditSubject(subject) => {
                apply_in_place(state, Update::SubjectSet(subject));
                Ok(Reply::Edited)
            }
            Action::EditPost(post) => {
                apply_in_place(state, Update::PostSet(post));
                Ok(Reply::Edited)
            }
            Action::Download => {
                if !view.download {
                    bail!("Nothing to download: generate a post first");
                }
                Ok(Reply::Download(Export::new_post(&state.new_post)))
            }
            Action::Show => Ok(Reply::View(view)),
        }
    }
}
