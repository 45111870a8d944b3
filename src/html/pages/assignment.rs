use super::*;

/// Whether one group member has a current submission.
pub struct MemberStatus {
    pub user: User,
    pub submission: Option<Submission>,
}

pub struct GroupStatus {
    pub group: Id,
    pub members: Vec<MemberStatus>,
}

/// Everything the assignment page shows.
pub struct AssignmentView<'a> {
    pub assignment: &'a Assignment,
    /// The deadline that applies to the viewer after extensions.
    pub deadline: DateTime<Utc>,
    pub extensions: &'a [Extension],
    pub roster: &'a [User],
    pub groups: &'a [GroupStatus],
    pub my_group: Option<Id>,
    /// Only loaded for instructors.
    pub stats: Option<AssignmentStats>,
    pub notice: Option<&'a str>,
}

pub fn assignment(user: &User, view: &AssignmentView, now: DateTime<Utc>) -> Markup {
    let assignment = view.assignment;
    let open = now < view.deadline;

    let body = html! {
        h2 { (assignment.name) }
        (notice(view.notice))
        @if !assignment.description.is_empty() {
            p.description { (assignment.description) }
        }
        dl.dates {
            dt { "Released" }
            dd { (timestamp(&assignment.release_date)) }
            dt { "Submissions close" }
            dd {
                (timestamp(&view.deadline))
                @if view.deadline != assignment.submission_deadline {
                    span.extended { " (extended)" }
                }
            }
            dt { "Commenting closes" }
            dd { (timestamp(&assignment.commenting_deadline)) }
        }

        @if !user.is_teacher {
            .actions {
                @if open {
                    a.button href={"/assignments/" (assignment.id) "/submit"} { "Submit code" }
                }
                @if view.my_group.is_some() {
                    a.button href={"/assignments/" (assignment.id) "/group"} { "Your group" }
                    a.button href={"/review?assignment=" (assignment.id) "&student=" (user.id)} { "Review code" }
                } @else {
                    p.empty { "You have not been placed in a group yet." }
                }
            }
        }

        @if let Some(stats) = view.stats {
            (activity(stats))
        }

        @if user.is_teacher {
            (submission_status(assignment, view.groups))
            (group_form(assignment))
            (extensions(assignment, view.extensions, view.roster))
            form #delete-assignment method="post" action={"/assignments/" (assignment.id) "/delete"} {
                button.danger type="submit" { "Delete assignment" }
            }
        }
    };
    wrappers::universal(wrappers::standard(body, user), None, &assignment.name)
}

fn activity(stats: AssignmentStats) -> Markup {
    html! {
        .stats {
            .stat {
                span.number { (stats.submissions) }
                span.label { "Submissions" }
            }
            .stat {
                span.number { (stats.commenters) }
                span.label { "Students have commented" }
            }
            .stat {
                span.number { (stats.comments) }
                span.label { "Total comments" }
            }
        }
    }
}

fn submission_status(assignment: &Assignment, groups: &[GroupStatus]) -> Markup {
    html! {
        h3 { "Submissions" }
        @if groups.is_empty() {
            p.empty { "No groups yet." }
        }
        @for (number, group) in groups.iter().enumerate() {
            section.group {
                h4 {
                    a href={"/assignments/" (assignment.id) "/group?group=" (group.group)} {
                        "Group " (number + 1)
                    }
                }
                table {
                    @for member in &group.members {
                        tr {
                            td { (member.user.name) }
                            @match &member.submission {
                                Some(submission) => {
                                    td.submitted {
                                        "Submitted "
                                        @if let Some(at) = &submission.submitted_at {
                                            (timestamp(at))
                                        }
                                    }
                                    td {
                                        a href={"/review?assignment=" (assignment.id) "&student=" (member.user.id)} { "View" }
                                    }
                                }
                                None => {
                                    td.missing { "Not submitted" }
                                    td {}
                                }
                            }
                            td {
                                a href={"/students/" (member.user.id) "/comments?assignment=" (assignment.id)} { "Comments" }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn group_form(assignment: &Assignment) -> Markup {
    html! {
        form #create-group method="post" action={"/assignments/" (assignment.id) "/groups"} {
            label for="group-students" { "New group: student emails, one per line" }
            textarea #group-students name="students" rows="3" {}
            button type="submit" { "Create group" }
        }
    }
}

fn extensions(assignment: &Assignment, extensions: &[Extension], roster: &[User]) -> Markup {
    let name = |id: Id| {
        roster
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("User {id}"))
    };

    html! {
        h3 { "Extensions" }
        @if extensions.is_empty() {
            p.empty { "No extensions." }
        } @else {
            ul.extensions {
                @for extension in extensions {
                    li {
                        @match extension.user {
                            Some(user) => { (name(user)) }
                            None => { b { "Whole class" } }
                        }
                        ": " (timestamp(&extension.extended_submission_deadline))
                    }
                }
            }
        }
        form #extend method="post" action={"/assignments/" (assignment.id) "/extensions"} {
            label {
                "New deadline (UTC)"
                input name="extended_deadline" type="datetime-local"
                    min=(datetime_input(&assignment.submission_deadline)) required;
            }
            label { input name="all" type="checkbox" value="true"; " Whole class" }
            label for="extend-students" { "Or student emails, one per line" }
            textarea #extend-students name="students" rows="3" {}
            button type="submit" { "Extend" }
        }
        form #remove-extensions method="post" action={"/assignments/" (assignment.id) "/extensions/remove"} {
            label { input name="all" type="checkbox" value="true"; " All extensions" }
            label for="remove-students" { "Or student emails, one per line" }
            textarea #remove-students name="students" rows="3" {}
            button type="submit" { "Remove extensions" }
        }
    }
}

/// The upload form, filled with the current file if there is one.
pub fn upload(
    user: &User,
    assignment: &Assignment,
    deadline: DateTime<Utc>,
    existing: Option<&SubmissionFile>,
    notice_text: Option<&str>,
) -> Markup {
    let name = existing.map(|f| f.name.as_str()).unwrap_or_default();
    let content = existing.map(|f| f.content.as_str()).unwrap_or_default();

    let body = html! {
        h2 { "Submit: " (assignment.name) }
        p { "Due " (timestamp(&deadline)) }
        (notice(notice_text))
        @if existing.is_some() {
            p.hint { "Submitting again replaces your current file." }
        }
        form #upload method="post" action={"/assignments/" (assignment.id) "/submit"} {
            label { "File name" input name="name" type="text" placeholder="main.py" value=(name) required; }
            label for="content" { "Code" }
            textarea #content name="content" rows="24" spellcheck="false" required { (content) }
            button type="submit" { "Submit" }
        }
        a href={"/assignments/" (assignment.id)} { "Back to the assignment" }
    };
    wrappers::universal(wrappers::standard(body, user), None, "Submit")
}

/// One member's submission on the group page, with who has commented on it.
pub struct MemberSubmission {
    pub author: User,
    pub submission: Submission,
    pub commenters: Vec<String>,
}

pub fn group(user: &User, assignment: &Assignment, members: &[User], submissions: &[MemberSubmission]) -> Markup {
    let body = html! {
        h2 { (assignment.name) ": group" }
        ul.members {
            @for member in members {
                li { (member.name) }
            }
        }
        h3 { "Submissions" }
        @if submissions.is_empty() {
            p.empty { "Nobody in this group has submitted yet." }
        }
        @for entry in submissions {
            section.submission {
                h4 { (entry.author.name) }
                @if let Some(at) = &entry.submission.submitted_at {
                    p.date { (timestamp(at)) }
                }
                @if entry.commenters.is_empty() {
                    p.empty { "No comments yet." }
                } @else {
                    p.commenters { "Comments from " (entry.commenters.join(", ")) }
                }
                a.button href={"/review?assignment=" (assignment.id) "&student=" (entry.author.id)} { "View code" }
            }
        }
    };
    wrappers::universal(wrappers::standard(body, user), None, "Group")
}
