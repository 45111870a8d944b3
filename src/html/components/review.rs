//! The `#review` panel: the code, its highlights, and the comment cards.
//!
//! The panel is rendered whole after every review action and swapped into
//! the page by `review.js`.

use super::*;

pub fn panel(session: &ReviewSession, now: DateTime<Utc>) -> Markup {
    let can_comment = if session.access().can_comment(now) { "true" } else { "false" };
    html! {
        #review data-view=(session.view()) data-can-comment=(can_comment) {
            (peer_nav(session))
            @match session.code() {
                CodeState::Empty | CodeState::Missing => {
                    p.no-code { "No code available." }
                }
                CodeState::Restricted => {
                    p.restricted { (RESTRICTED_TEXT) }
                }
                CodeState::Failed => {
                    p.error { "The submission could not be loaded." }
                }
                CodeState::Loaded(buffer) => {
                    (code_view(session, buffer, now))
                }
            }
        }
    }
}

fn peer_nav(session: &ReviewSession) -> Markup {
    let current = session.target().student;
    html! {
        @if !session.peers().is_empty() {
            nav #peers {
                @for peer in session.peers() {
                    button.peer.current[current == Some(peer.id)] type="button" data-student=(peer.id) {
                        (peer.name)
                    }
                }
            }
        }
    }
}

fn code_view(session: &ReviewSession, buffer: &CodeBuffer, now: DateTime<Utc>) -> Markup {
    let cards = session.cards(&CardLayout::default());

    html! {
        .code-view {
            .code-pane {
                pre #code-block {
                    @for index in 0..buffer.line_count() {
                        .line style={"height: " (LINE_HEIGHT) "px"} {
                            span.line-number { (index + 1) }
                            span.line-text data-line=(index) {
                                @for segment in session.segments(index) {
                                    (segment_html(segment))
                                }
                            }
                        }
                    }
                }
                @if let Some(at) = session.add_button() {
                    button #add-comment type="button" style=(format!("left: {}px; top: {}px", at.x, at.y)) {
                        "+ Comment"
                    }
                }
                @if let Some(at) = session.comment_box() {
                    form #comment-box style=(format!("left: {}px; top: {}px", at.x, at.box_top())) {
                        blockquote.selected { (session.selected_text()) }
                        textarea name="text" placeholder="Add a comment…" autofocus {}
                        button type="submit" { "Submit" }
                        button.cancel type="button" { "Cancel" }
                    }
                }
            }
            .cards {
                @for card in cards {
                    (card_html(session, card, now))
                }
            }
        }
    }
}

fn segment_html(segment: Segment) -> Markup {
    match segment {
        Segment::Plain(text) => html! { (text) },
        Segment::Highlight {
            comment,
            text,
            active,
        } => html! {
            mark.highlight.active[active] data-comment=(comment) { (text) }
        },
    }
}

fn card_html(session: &ReviewSession, card: PlacedCard, now: DateTime<Utc>) -> Markup {
    let thread = card.thread;
    let id = thread.id();

    html! {
        .card.active[session.active() == Some(id)]
            data-comment=(id)
            data-height=[session.card_height(id)]
            style={"top: " (card.top) "px"} {
            p.lines { (line_span(&thread.comment.anchor)) }
            (comment_html(session, &thread.comment, !thread.replies.is_empty(), now))
            @for reply in &thread.replies {
                .reply {
                    (comment_html(session, reply, false, now))
                }
            }
            @if session.reply_to() == Some(id) {
                form.reply-box data-parent=(id) {
                    textarea name="text" placeholder="Reply…" autofocus {}
                    button type="submit" { "Reply" }
                    button.cancel-reply type="button" { "Cancel" }
                }
            } @else if session.access().can_reply(now) {
                button.open-reply type="button" data-comment=(id) { "Reply" }
            }
        }
    }
}

/// A removed root keeps its Delete control once its replies are gone, so the
/// placeholder itself can be cleared.
fn comment_html(session: &ReviewSession, comment: &Comment, has_replies: bool, now: DateTime<Utc>) -> Markup {
    let access = session.access();
    let removed = comment.text == REMOVED_TEXT;
    let can_edit = !removed && access.can_edit(comment.user, now);
    let can_delete = (!removed || !has_replies) && access.can_delete(comment.user, now);

    html! {
        .comment.removed[removed] data-comment=(comment.id) {
            .info {
                @match session.target().assignment.filter(|_| access.is_instructor()) {
                    Some(assignment) => {
                        a.author href={"/students/" (comment.user) "/comments?assignment=" (assignment)} {
                            (session.name_of(comment.user))
                        }
                    }
                    None => {
                        span.author { (session.name_of(comment.user)) }
                    }
                }
                @if let Some(at) = &comment.created_at {
                    span.date { (timestamp(at)) }
                }
            }
            @if session.editing() == Some(comment.id) {
                form.edit-box data-comment=(comment.id) {
                    textarea name="text" autofocus { (comment.text) }
                    button type="submit" { "Save" }
                    button.cancel-edit type="button" { "Cancel" }
                }
            } @else {
                p.text { (comment.text) }
            }
            @if can_edit || can_delete {
                .user-controls {
                    @if can_edit {
                        button.edit type="button" data-comment=(comment.id) { "Edit" }
                    }
                    @if can_delete {
                        button.remove type="button" data-comment=(comment.id) { "Delete" }
                    }
                }
            }
        }
    }
}
