use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::api::{ApiError, CommentRecord, Id, NewComment, ReviewStore, SubmissionQuery, User};

use super::*;

/// Which submission file a code view shows. Either the submission and file are
/// known up front, or the assignment and student are used to find the
/// student's current submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewTarget {
    pub assignment: Option<Id>,
    pub student: Option<Id>,
    pub submission: Option<Id>,
    pub file: Option<Id>,
}

/// What the code pane shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CodeState {
    /// Nothing has been loaded yet.
    #[default]
    Empty,
    Loaded(CodeBuffer),
    /// The viewer holds an active personal extension and may only see their
    /// own code.
    Restricted,
    /// The student has no current submission, or it has no file.
    Missing,
    Failed,
}

/// The result of fetching one view from the collaborator.
#[derive(Clone, Debug, Default)]
pub struct LoadedView {
    pub submission: Option<Id>,
    pub file: Option<Id>,
    pub code: CodeState,
    pub records: Vec<CommentRecord>,
}

impl LoadedView {
    fn without_code(code: CodeState) -> Self {
        LoadedView {
            code,
            ..LoadedView::default()
        }
    }
}

/// Issued when a load starts. Results are committed only if no newer load
/// has started since.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    target: ViewTarget,
}

impl LoadTicket {
    pub fn target(&self) -> &ViewTarget {
        &self.target
    }
}

/// Where a comment sits in the thread list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Located {
    Root(usize),
    Reply(usize, usize),
}

/// The state of one rendered code view.
#[derive(Debug)]
pub struct ReviewSession {
    view: u64,
    access: Access,
    target: ViewTarget,
    submission: Option<Id>,
    file: Option<Id>,
    code: CodeState,
    threads: Vec<Thread>,

    selection: Option<Capture>,
    show_add_button: bool,
    comment_box: bool,
    selected_text: String,

    reply_to: Option<Id>,
    editing: Option<Id>,
    active: Option<Id>,

    card_heights: HashMap<Id, u32>,
    generation: u64,

    peers: Vec<User>,
    names: HashMap<Id, String>,
}

impl ReviewSession {
    pub fn new(viewer: &User) -> Self {
        ReviewSession {
            view: 0,
            access: Access::new(viewer.id, Role::from(viewer), None),
            target: ViewTarget::default(),
            submission: None,
            file: None,
            code: CodeState::Empty,
            threads: Vec::new(),
            selection: None,
            show_add_button: false,
            comment_box: false,
            selected_text: String::new(),
            reply_to: None,
            editing: None,
            active: None,
            card_heights: HashMap::new(),
            generation: 0,
            peers: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Identifies this view to the page script.
    pub fn view(&self) -> u64 {
        self.view
    }

    pub fn access(&self) -> &Access {
        &self.access
    }

    pub fn set_commenting_deadline(&mut self, deadline: Option<DateTime<Utc>>) {
        self.access.commenting_deadline = deadline;
    }

    pub fn target(&self) -> &ViewTarget {
        &self.target
    }

    pub fn submission(&self) -> Option<Id> {
        self.submission
    }

    pub fn file(&self) -> Option<Id> {
        self.file
    }

    pub fn code(&self) -> &CodeState {
        &self.code
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn selection(&self) -> Option<&Capture> {
        self.selection.as_ref()
    }

    /// Position of the "add comment" control, if it is showing.
    pub fn add_button(&self) -> Option<ButtonPosition> {
        if !self.show_add_button || self.comment_box {
            return None;
        }
        self.selection.as_ref().map(|s| s.button)
    }

    /// Position of the open comment box, if any.
    pub fn comment_box(&self) -> Option<ButtonPosition> {
        if !self.comment_box {
            return None;
        }
        self.selection.as_ref().map(|s| s.button)
    }

    pub fn selected_text(&self) -> &str {
        &self.selected_text
    }

    pub fn reply_to(&self) -> Option<Id> {
        self.reply_to
    }

    pub fn editing(&self) -> Option<Id> {
        self.editing
    }

    pub fn active(&self) -> Option<Id> {
        self.active
    }

    pub fn set_active(&mut self, comment: Option<Id>) {
        self.active = comment;
    }

    /// Sets the students whose code can be switched to, and the display
    /// names used for comment authors.
    pub fn set_people(&mut self, peers: Vec<User>, names: HashMap<Id, String>) {
        self.peers = peers;
        self.names = names;
    }

    pub fn peers(&self) -> &[User] {
        &self.peers
    }

    pub fn name_of(&self, user: Id) -> String {
        match self.names.get(&user) {
            Some(name) => name.clone(),
            None => format!("User {user}"),
        }
    }

    pub fn card_height(&self, comment: Id) -> Option<u32> {
        self.card_heights.get(&comment).copied()
    }

    /// Stores card heights measured by the browser for the next layout.
    pub fn record_heights(&mut self, heights: HashMap<Id, u32>) {
        self.card_heights.extend(heights);
    }

    /// Positions every thread's card beside the code.
    pub fn cards(&self, layout: &CardLayout) -> Vec<PlacedCard<'_>> {
        layout.place(&self.threads, &self.card_heights)
    }

    /// Segments of source line `index`, or nothing if no code is loaded.
    pub fn segments(&self, index: usize) -> Vec<Segment<'_>> {
        let CodeState::Loaded(buffer) = &self.code else {
            return Vec::new();
        };
        match buffer.line(index) {
            Some(line) => line_segments(line, index, &self.threads, self.active),
            None => Vec::new(),
        }
    }

    // Loading.

    /// Starts loading `target`. Any load already in flight becomes stale.
    pub fn begin_load(&mut self, target: ViewTarget) -> LoadTicket {
        self.generation += 1;
        self.target = target.clone();
        LoadTicket {
            generation: self.generation,
            target,
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Replaces the view with a finished load. Returns `false` and changes
    /// nothing if a newer load was started after `ticket` was issued.
    pub fn commit_load(&mut self, ticket: LoadTicket, view: LoadedView) -> bool {
        if !self.is_current(&ticket) {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "Discarding stale view load"
            );
            return false;
        }

        self.submission = view.submission;
        self.file = view.file;
        self.code = view.code;
        self.threads = match view.file {
            Some(file) => build_threads(view.records, file),
            None => Vec::new(),
        };

        self.clear_selection();
        self.reply_to = None;
        self.editing = None;
        self.card_heights.clear();
        if let Some(active) = self.active {
            if self.locate(active).is_none() {
                self.active = None;
            }
        }
        true
    }

    // Selection and the comment box.

    /// Records a finished mouse selection. Returns where to show the "add
    /// comment" control, or `None` if it should be hidden.
    ///
    /// Selections made while the comment box is open are ignored.
    pub fn capture_selection(&mut self, raw: &RawSelection, now: DateTime<Utc>) -> Option<ButtonPosition> {
        if self.comment_box {
            return None;
        }
        let CodeState::Loaded(buffer) = &self.code else {
            self.clear_selection();
            return None;
        };

        match buffer.capture(raw) {
            Some(capture) => {
                let show = self.access.can_comment(now);
                let button = capture.button;
                self.selection = Some(capture);
                self.show_add_button = show;
                show.then_some(button)
            }
            None => {
                self.clear_selection();
                None
            }
        }
    }

    /// Opens the comment box for the current selection.
    pub fn open_comment_box(&mut self) -> bool {
        let Some(selection) = self.selection.as_ref().filter(|_| self.show_add_button) else {
            return false;
        };
        self.selected_text = selection.text.clone();
        self.comment_box = true;
        true
    }

    pub fn cancel_comment(&mut self) {
        self.clear_selection();
    }

    fn clear_selection(&mut self) {
        self.selection = None;
        self.show_add_button = false;
        self.comment_box = false;
        self.selected_text.clear();
    }

    // Comment actions.

    /// Submits a root comment on the current selection. Empty text or an
    /// empty selection aborts silently. The selection is cleared after any
    /// attempt that reaches the collaborator.
    pub async fn submit_comment(&mut self, store: &dyn ReviewStore, text: &str, now: DateTime<Utc>) -> Option<Id> {
        let text = text.trim();
        let anchor = self.selection.as_ref()?.anchor;
        if text.is_empty() || self.selected_text.trim().is_empty() {
            return None;
        }
        let (Some(submission), Some(file)) = (self.submission, self.file) else {
            return None;
        };
        if !self.access.can_comment(now) {
            tracing::warn!(viewer = self.access.viewer, "Comment rejected after deadline");
            return None;
        }

        let new = NewComment {
            submission,
            submission_file: file,
            user: self.access.viewer,
            comment: text.to_owned(),
            start_line: anchor.start_line,
            end_line: anchor.end_line,
            start_offset: anchor.start_offset,
            end_offset: anchor.end_offset,
            parent: None,
        };

        let created = match store.create_comment(&new).await {
            Ok(record) => {
                let comment = Comment {
                    parent: None,
                    ..Comment::from(record)
                };
                let id = comment.id;
                tracing::info!(comment = id, file, "Comment added");
                self.threads.push(Thread::new(comment));
                Some(id)
            }
            Err(err) => {
                tracing::error!("Failed to submit comment: {err}");
                None
            }
        };

        self.clear_selection();
        created
    }

    /// Opens the reply box under a root comment.
    pub fn open_reply(&mut self, parent: Id, now: DateTime<Utc>) -> bool {
        if !self.access.can_reply(now) || !matches!(self.locate(parent), Some(Located::Root(_))) {
            return false;
        }
        self.reply_to = Some(parent);
        true
    }

    pub fn cancel_reply(&mut self) {
        self.reply_to = None;
    }

    /// Replies to a root comment. Replies carry a zeroed anchor and cannot
    /// themselves be replied to.
    pub async fn submit_reply(
        &mut self,
        store: &dyn ReviewStore,
        parent: Id,
        text: &str,
        now: DateTime<Utc>,
    ) -> Option<Id> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let Some(Located::Root(index)) = self.locate(parent) else {
            return None;
        };
        let (Some(submission), Some(file)) = (self.submission, self.file) else {
            return None;
        };
        if !self.access.can_reply(now) {
            tracing::warn!(viewer = self.access.viewer, "Reply rejected after deadline");
            return None;
        }

        let new = NewComment {
            submission,
            submission_file: file,
            user: self.access.viewer,
            comment: text.to_owned(),
            start_line: Anchor::ZERO.start_line,
            end_line: Anchor::ZERO.end_line,
            start_offset: Anchor::ZERO.start_offset,
            end_offset: Anchor::ZERO.end_offset,
            parent: Some(parent),
        };

        let created = match store.create_comment(&new).await {
            Ok(record) => {
                let reply = Comment::from(record);
                let id = reply.id;
                tracing::info!(comment = id, parent, "Reply added");
                self.threads[index].replies.push(reply);
                Some(id)
            }
            Err(err) => {
                tracing::error!("Failed to submit reply: {err}");
                None
            }
        };

        self.reply_to = None;
        created
    }

    /// Opens the edit box for a comment the viewer wrote.
    pub fn open_edit(&mut self, id: Id, now: DateTime<Utc>) -> bool {
        let Some(comment) = self.locate(id).map(|at| self.comment_at(at)) else {
            return false;
        };
        if !self.access.can_edit(comment.user, now) {
            return false;
        }
        self.editing = Some(id);
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Replaces a comment's text. Only the author may edit.
    pub async fn submit_edit(&mut self, store: &dyn ReviewStore, id: Id, text: &str, now: DateTime<Utc>) -> bool {
        self.editing = None;

        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let Some(at) = self.locate(id) else {
            return false;
        };
        if !self.access.can_edit(self.comment_at(at).user, now) {
            tracing::warn!(viewer = self.access.viewer, comment = id, "Edit rejected");
            return false;
        }

        match store.update_comment(id, text).await {
            Ok(_) => {
                self.comment_at_mut(at).text = text.to_owned();
                true
            }
            Err(err) => {
                tracing::error!("Failed to edit comment {id}: {err}");
                false
            }
        }
    }

    /// Deletes a comment. A root with replies keeps its place and replies and
    /// only has its text replaced; anything else is removed outright.
    pub async fn delete(&mut self, store: &dyn ReviewStore, id: Id, now: DateTime<Utc>) -> bool {
        let Some(at) = self.locate(id) else {
            return false;
        };
        if !self.access.can_delete(self.comment_at(at).user, now) {
            tracing::warn!(viewer = self.access.viewer, comment = id, "Delete rejected");
            return false;
        }

        let soft = matches!(at, Located::Root(index) if self.threads[index].has_replies());
        let result = if soft {
            store.update_comment(id, REMOVED_TEXT).await.map(|_| ())
        } else {
            store.delete_comment(id).await
        };
        if let Err(err) = result {
            tracing::error!("Failed to delete comment {id}: {err}");
            return false;
        }

        match at {
            Located::Root(index) if soft => {
                self.threads[index].comment.text = REMOVED_TEXT.to_owned();
            }
            Located::Root(index) => {
                self.threads.remove(index);
            }
            Located::Reply(thread, reply) => {
                self.threads[thread].replies.remove(reply);
            }
        }
        if self.active == Some(id) && !soft {
            self.active = None;
        }
        tracing::info!(comment = id, soft, "Comment deleted");
        true
    }

    fn locate(&self, id: Id) -> Option<Located> {
        for (t, thread) in self.threads.iter().enumerate() {
            if thread.id() == id {
                return Some(Located::Root(t));
            }
            if let Some(r) = thread.replies.iter().position(|r| r.id == id) {
                return Some(Located::Reply(t, r));
            }
        }
        None
    }

    fn comment_at(&self, at: Located) -> &Comment {
        match at {
            Located::Root(t) => &self.threads[t].comment,
            Located::Reply(t, r) => &self.threads[t].replies[r],
        }
    }

    fn comment_at_mut(&mut self, at: Located) -> &mut Comment {
        match at {
            Located::Root(t) => &mut self.threads[t].comment,
            Located::Reply(t, r) => &mut self.threads[t].replies[r],
        }
    }
}

/// Fetches everything a code view needs. Failures are logged and turned into
/// a [`CodeState`]; comments that fail to load are simply left out.
pub async fn fetch_view(store: &dyn ReviewStore, viewer: Id, target: &ViewTarget) -> LoadedView {
    if let (Some(submission), Some(file)) = (target.submission, target.file) {
        return LoadedView {
            submission: Some(submission),
            file: Some(file),
            code: fetch_code(store, file).await,
            records: fetch_comments(store, submission).await,
        };
    }

    let (Some(assignment), Some(student)) = (target.assignment, target.student) else {
        return LoadedView::without_code(CodeState::Missing);
    };
    let query = SubmissionQuery {
        student: Some(student),
        current: true,
        requester: Some(viewer),
    };
    let submissions = match store.submissions(assignment, &query).await {
        Ok(submissions) => submissions,
        Err(ApiError::Restricted) => return LoadedView::without_code(CodeState::Restricted),
        Err(err) => {
            tracing::error!("Failed to load submission of student {student}: {err}");
            return LoadedView::without_code(CodeState::Failed);
        }
    };

    let Some(submission) = submissions.into_iter().next() else {
        return LoadedView::without_code(CodeState::Missing);
    };
    let Some(file) = submission.files.first().map(|f| f.id) else {
        return LoadedView {
            submission: Some(submission.id),
            ..LoadedView::without_code(CodeState::Missing)
        };
    };

    LoadedView {
        submission: Some(submission.id),
        file: Some(file),
        code: fetch_code(store, file).await,
        records: fetch_comments(store, submission.id).await,
    }
}

async fn fetch_code(store: &dyn ReviewStore, file: Id) -> CodeState {
    match store.file(file).await {
        Ok(file) => CodeState::Loaded(CodeBuffer::new(&file.content)),
        Err(err) => {
            tracing::error!("Failed to load file {file}: {err}");
            CodeState::Failed
        }
    }
}

async fn fetch_comments(store: &dyn ReviewStore, submission: Id) -> Vec<CommentRecord> {
    match store.submission(submission).await {
        Ok(submission) => submission.comments,
        Err(err) => {
            tracing::error!("Failed to load comments of submission {submission}: {err}");
            Vec::new()
        }
    }
}

/// Loads `target` into `session` without holding the session lock across
/// network calls. Returns `false` if a newer load overtook this one.
pub async fn load(session: &Mutex<ReviewSession>, store: &dyn ReviewStore, target: ViewTarget) -> bool {
    let (ticket, viewer) = {
        let mut session = session.lock().await;
        (session.begin_load(target), session.access.viewer)
    };
    let view = fetch_view(store, viewer, ticket.target()).await;
    session.lock().await.commit_load(ticket, view)
}

/// Code views kept per user; opening another drops the oldest.
pub const MAX_VIEWS_PER_USER: usize = 8;

/// One review session per rendered code view, keyed by viewer and view id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<(Id, u64), Arc<Mutex<ReviewSession>>>>,
    next_view: AtomicU64,
}

impl SessionRegistry {
    /// Starts a fresh session for a newly rendered code view.
    pub async fn open(&self, viewer: &User) -> Arc<Mutex<ReviewSession>> {
        let view = self.next_view.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Arc::new(Mutex::new(ReviewSession {
            view,
            ..ReviewSession::new(viewer)
        }));

        let mut sessions = self.sessions.lock().await;
        sessions.insert((viewer.id, view), session.clone());

        let mut views: Vec<u64> = sessions
            .keys()
            .filter(|(user, _)| *user == viewer.id)
            .map(|(_, view)| *view)
            .collect();
        if views.len() > MAX_VIEWS_PER_USER {
            views.sort_unstable();
            for old in &views[..views.len() - MAX_VIEWS_PER_USER] {
                sessions.remove(&(viewer.id, *old));
            }
        }
        session
    }

    pub async fn session(&self, viewer: Id, view: u64) -> Option<Arc<Mutex<ReviewSession>>> {
        self.sessions.lock().await.get(&(viewer, view)).cloned()
    }

    /// Drops every view of `viewer`.
    pub async fn close_all(&self, viewer: Id) {
        self.sessions.lock().await.retain(|(user, _), _| *user != viewer);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::api::{ApiResult, Submission, SubmissionFile};

    const SOURCE: &str = "use std::io;\n\nfn main() {\n    let total = 0;\n}\n";

    /// An in-memory collaborator holding one submission with one file.
    struct FakeStore {
        comments: std::sync::Mutex<Vec<CommentRecord>>,
        next_id: AtomicU64,
        fail: AtomicBool,
        restricted: AtomicBool,
        calls: AtomicU64,
    }

    impl FakeStore {
        fn new(comments: Vec<CommentRecord>) -> Self {
            FakeStore {
                comments: std::sync::Mutex::new(comments),
                next_id: AtomicU64::new(100),
                fail: AtomicBool::new(false),
                restricted: AtomicBool::new(false),
                calls: AtomicU64::new(0),
            }
        }

        fn failing(&self) -> ApiResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    body: "boom".to_owned(),
                });
            }
            Ok(())
        }

        fn submission_record(&self) -> Submission {
            Submission {
                id: 1,
                assignment: 3,
                user: 20,
                submitted_at: None,
                is_current: true,
                comments: self.comments.lock().unwrap().clone(),
                files: vec![SubmissionFile {
                    id: 7,
                    name: "main.rs".to_owned(),
                    submission: 1,
                    content: SOURCE.to_owned(),
                }],
            }
        }
    }

    #[async_trait]
    impl ReviewStore for FakeStore {
        async fn submissions(&self, _: Id, _: &SubmissionQuery) -> ApiResult<Vec<Submission>> {
            if self.restricted.load(Ordering::SeqCst) {
                return Err(ApiError::Restricted);
            }
            self.failing()?;
            Ok(vec![self.submission_record()])
        }

        async fn submission(&self, _: Id) -> ApiResult<Submission> {
            self.failing()?;
            Ok(self.submission_record())
        }

        async fn file(&self, _: Id) -> ApiResult<SubmissionFile> {
            self.failing()?;
            Ok(self.submission_record().files.remove(0))
        }

        async fn create_comment(&self, comment: &NewComment) -> ApiResult<CommentRecord> {
            self.failing()?;
            let record = CommentRecord {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                submission: comment.submission,
                submission_file: Some(comment.submission_file),
                user: comment.user,
                comment: comment.comment.clone(),
                start_line: comment.start_line,
                end_line: comment.end_line,
                start_offset: comment.start_offset,
                end_offset: comment.end_offset,
                parent: comment.parent,
                created_at: Some(Utc::now()),
                top_offset: None,
            };
            self.comments.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn update_comment(&self, id: Id, text: &str) -> ApiResult<CommentRecord> {
            self.failing()?;
            let mut comments = self.comments.lock().unwrap();
            let record = comments
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(ApiError::NotFound)?;
            record.comment = text.to_owned();
            Ok(record.clone())
        }

        async fn delete_comment(&self, id: Id) -> ApiResult<()> {
            self.failing()?;
            self.comments.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
    }

    fn student(id: Id) -> User {
        User {
            id,
            name: format!("Student {id}"),
            email: format!("s{id}@union.edu"),
            is_teacher: false,
        }
    }

    fn comment(id: Id, user: Id, parent: Option<Id>, line: usize) -> CommentRecord {
        CommentRecord {
            id,
            submission: 1,
            submission_file: Some(7),
            user,
            comment: format!("comment {id}"),
            start_line: line,
            end_line: line,
            start_offset: 0,
            end_offset: 3,
            parent,
            created_at: None,
            top_offset: None,
        }
    }

    fn open_target() -> ViewTarget {
        ViewTarget {
            assignment: Some(3),
            student: Some(20),
            submission: Some(1),
            file: Some(7),
        }
    }

    async fn loaded_session(store: &FakeStore, viewer: &User) -> Mutex<ReviewSession> {
        let session = Mutex::new(ReviewSession::new(viewer));
        session
            .lock()
            .await
            .set_commenting_deadline(Some(now() + chrono::Duration::days(1)));
        assert!(load(&session, store, open_target()).await);
        session
    }

    fn select(line: usize, start: usize, end: usize) -> RawSelection {
        let at = |offset| Endpoint::Code(Point { line, offset });
        RawSelection {
            anchor: at(start),
            start: at(start),
            end: at(end),
            rect: Rect::default(),
            block: Rect::default(),
        }
    }

    #[tokio::test]
    async fn submitted_anchor_survives_reload() {
        let store = FakeStore::new(Vec::new());
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;

        assert!(s.capture_selection(&select(3, 0, 5), now()).is_some());
        assert!(s.open_comment_box());
        assert_eq!(s.selected_text(), "    l");
        let id = s.submit_comment(&store, "  needs a type  ", now()).await.unwrap();

        assert_eq!(s.threads().len(), 1);
        assert_eq!(s.threads()[0].comment.text, "needs a type");
        assert!(s.selection().is_none());
        assert!(s.comment_box().is_none());
        drop(s);

        assert!(load(&session, &store, open_target()).await);
        let s = session.lock().await;
        let thread = &s.threads()[0];
        assert_eq!(thread.id(), id);
        assert_eq!(thread.comment.anchor, Anchor::new(3, 3, 0, 5));
    }

    #[tokio::test]
    async fn empty_text_or_selection_aborts_silently() {
        let store = FakeStore::new(Vec::new());
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;
        let calls = store.calls.load(Ordering::SeqCst);

        // No selection at all.
        assert!(s.submit_comment(&store, "hello", now()).await.is_none());

        s.capture_selection(&select(0, 0, 3), now());
        s.open_comment_box();
        assert!(s.submit_comment(&store, "   ", now()).await.is_none());
        // The box stays open after an empty attempt.
        assert!(s.comment_box().is_some());

        assert_eq!(store.calls.load(Ordering::SeqCst), calls);
        assert!(s.threads().is_empty());
    }

    #[tokio::test]
    async fn failed_submit_leaves_threads_unchanged() {
        let store = FakeStore::new(vec![comment(1, 9, None, 0)]);
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;

        s.capture_selection(&select(2, 0, 2), now());
        s.open_comment_box();
        store.fail.store(true, Ordering::SeqCst);
        assert!(s.submit_comment(&store, "hello", now()).await.is_none());

        assert_eq!(s.threads().len(), 1);
        assert!(s.selection().is_none());
    }

    #[tokio::test]
    async fn students_past_deadline_get_no_affordance() {
        let store = FakeStore::new(Vec::new());
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;
        let later = now() + chrono::Duration::days(2);

        assert!(s.capture_selection(&select(0, 0, 3), later).is_none());
        assert!(s.add_button().is_none());
        assert!(!s.open_comment_box());
    }

    #[tokio::test]
    async fn outside_selection_hides_affordance() {
        let store = FakeStore::new(Vec::new());
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;

        assert!(s.capture_selection(&select(0, 0, 3), now()).is_some());
        let mut outside = select(0, 0, 3);
        outside.anchor = Endpoint::Outside;
        assert!(s.capture_selection(&outside, now()).is_none());
        assert!(s.add_button().is_none());
        assert!(s.selection().is_none());
    }

    #[tokio::test]
    async fn replies_append_to_their_root() {
        let store = FakeStore::new(vec![comment(1, 9, None, 0), comment(2, 9, Some(1), 0)]);
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;

        assert!(s.open_reply(1, now()));
        let id = s.submit_reply(&store, 1, "agreed", now()).await.unwrap();
        assert!(s.reply_to().is_none());

        let replies: Vec<_> = s.threads()[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(replies, vec![2, id]);
        assert_eq!(s.threads()[0].replies[1].anchor, Anchor::ZERO);

        // Replies cannot be replied to.
        assert!(!s.open_reply(2, now()));
        assert!(s.submit_reply(&store, 2, "nested", now()).await.is_none());
    }

    #[tokio::test]
    async fn delete_with_replies_is_soft() {
        let store = FakeStore::new(vec![
            comment(1, 5, None, 0),
            comment(2, 9, Some(1), 0),
            comment(3, 5, None, 2),
        ]);
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;

        assert!(s.delete(&store, 1, now()).await);
        assert_eq!(s.threads().len(), 2);
        assert_eq!(s.threads()[0].comment.text, REMOVED_TEXT);
        assert_eq!(s.threads()[0].replies.len(), 1);
        assert_eq!(s.threads()[0].replies[0].text, "comment 2");

        assert!(s.delete(&store, 3, now()).await);
        assert_eq!(s.threads().len(), 1);
        assert!(store.comments.lock().unwrap().iter().all(|c| c.id != 3));
    }

    #[tokio::test]
    async fn deleting_a_reply_removes_only_it() {
        let store = FakeStore::new(vec![comment(1, 9, None, 0), comment(2, 5, Some(1), 0)]);
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;

        assert!(s.delete(&store, 2, now()).await);
        assert_eq!(s.threads().len(), 1);
        assert!(s.threads()[0].replies.is_empty());
    }

    #[tokio::test]
    async fn only_authors_edit() {
        let store = FakeStore::new(vec![comment(1, 9, None, 0), comment(2, 5, None, 1)]);
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;

        assert!(!s.open_edit(1, now()));
        assert!(!s.submit_edit(&store, 1, "mine now", now()).await);
        assert_eq!(s.threads()[0].comment.text, "comment 1");

        assert!(s.open_edit(2, now()));
        assert!(s.submit_edit(&store, 2, " fixed ", now()).await);
        assert_eq!(s.threads()[1].comment.text, "fixed");
        assert!(s.editing().is_none());
    }

    #[tokio::test]
    async fn others_cannot_delete_but_instructors_can() {
        let store = FakeStore::new(vec![comment(1, 9, None, 0)]);
        let session = loaded_session(&store, &student(5)).await;
        assert!(!session.lock().await.delete(&store, 1, now()).await);

        let instructor = User {
            is_teacher: true,
            ..student(1)
        };
        let session = loaded_session(&store, &instructor).await;
        let mut s = session.lock().await;
        assert!(s.delete(&store, 1, now() + chrono::Duration::days(30)).await);
        assert!(s.threads().is_empty());
    }

    #[tokio::test]
    async fn stale_load_is_discarded() {
        let store = FakeStore::new(vec![comment(1, 9, None, 0)]);
        let mut session = ReviewSession::new(&student(5));

        let first = session.begin_load(ViewTarget {
            student: Some(20),
            ..open_target()
        });
        let second = session.begin_load(ViewTarget {
            student: Some(21),
            ..open_target()
        });

        let newer = fetch_view(&store, 5, second.target()).await;
        assert!(session.commit_load(second, newer));

        let older = LoadedView {
            submission: Some(99),
            file: Some(98),
            code: CodeState::Loaded(CodeBuffer::new("stale")),
            records: Vec::new(),
        };
        assert!(!session.commit_load(first, older));

        assert_eq!(session.target().student, Some(21));
        assert_eq!(session.file(), Some(7));
        assert_eq!(session.threads().len(), 1);
    }

    #[tokio::test]
    async fn restricted_submission_is_its_own_state() {
        let store = FakeStore::new(Vec::new());
        store.restricted.store(true, Ordering::SeqCst);
        let session = Mutex::new(ReviewSession::new(&student(5)));
        let target = ViewTarget {
            assignment: Some(3),
            student: Some(20),
            ..ViewTarget::default()
        };
        assert!(load(&session, &store, target).await);
        assert_eq!(session.lock().await.code(), &CodeState::Restricted);
    }

    #[tokio::test]
    async fn current_submission_found_by_student() {
        let store = FakeStore::new(vec![comment(1, 9, None, 2)]);
        let view = fetch_view(
            &store,
            5,
            &ViewTarget {
                assignment: Some(3),
                student: Some(20),
                ..ViewTarget::default()
            },
        )
        .await;
        assert_eq!(view.submission, Some(1));
        assert_eq!(view.file, Some(7));
        assert_eq!(view.records.len(), 1);
        assert!(matches!(view.code, CodeState::Loaded(ref b) if b.line_count() == 6));
    }

    #[tokio::test]
    async fn highlight_follows_active_comment() {
        let store = FakeStore::new(vec![comment(1, 9, None, 0)]);
        let session = loaded_session(&store, &student(5)).await;
        let mut s = session.lock().await;
        s.set_active(Some(1));
        assert_eq!(
            s.segments(0)[0],
            Segment::Highlight {
                comment: 1,
                text: "use",
                active: true
            }
        );
    }

    #[test]
    fn unknown_authors_get_placeholder_names() {
        let mut session = ReviewSession::new(&student(5));
        session.set_people(vec![student(6)], HashMap::from([(6, "Ada".to_owned())]));
        assert_eq!(session.name_of(6), "Ada");
        assert_eq!(session.name_of(7), "User 7");
        assert_eq!(session.peers().len(), 1);
    }

    #[tokio::test]
    async fn each_view_gets_its_own_session() {
        let registry = SessionRegistry::default();
        let first = registry.open(&student(5)).await;
        let second = registry.open(&student(5)).await;
        let first_view = first.lock().await.view();
        let second_view = second.lock().await.view();
        assert_ne!(first_view, second_view);

        let found = registry.session(5, first_view).await.unwrap();
        assert!(Arc::ptr_eq(&found, &first));
        assert!(registry.session(6, first_view).await.is_none());
    }

    #[tokio::test]
    async fn views_do_not_share_files() {
        let store = FakeStore::new(Vec::new());
        let registry = SessionRegistry::default();
        let viewer = student(5);
        let first = registry.open(&viewer).await;
        let second = registry.open(&viewer).await;

        assert!(load(&first, &store, open_target()).await);
        {
            let mut other = second.lock().await;
            let ticket = other.begin_load(ViewTarget::default());
            other.commit_load(ticket, LoadedView {
                submission: Some(2),
                file: Some(8),
                code: CodeState::Loaded(CodeBuffer::new("other\nfile\n")),
                records: Vec::new(),
            });
        }

        let mut session = first.lock().await;
        session.set_commenting_deadline(Some(now() + chrono::Duration::hours(1)));
        assert!(session.capture_selection(&select(3, 0, 5), now()).is_some());
        assert!(session.open_comment_box());
        let id = session.submit_comment(&store, "meant for file 7", now()).await;
        assert!(id.is_some());

        let stored = store.comments.lock().unwrap()[0].clone();
        assert_eq!(stored.submission_file, Some(7));
        assert_eq!(stored.submission, 1);
    }

    #[tokio::test]
    async fn old_views_expire_and_logout_drops_all() {
        let registry = SessionRegistry::default();
        let oldest = registry.open(&student(5)).await.lock().await.view();
        for _ in 0..MAX_VIEWS_PER_USER {
            registry.open(&student(5)).await;
        }
        let other = registry.open(&student(6)).await.lock().await.view();
        assert!(registry.session(5, oldest).await.is_none());
        assert!(registry.session(5, oldest + 1).await.is_some());

        registry.close_all(5).await;
        assert!(registry.session(5, oldest + 1).await.is_none());
        assert!(registry.session(6, other).await.is_some());
    }
}
