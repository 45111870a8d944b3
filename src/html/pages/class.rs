use super::*;

pub fn class(
    user: &User,
    class: &Class,
    roster: &[User],
    assignments: &[Assignment],
    notice_text: Option<&str>,
) -> Markup {
    let body = html! {
        h2 { (class.code) " · " (class.name) }
        p.term { (class.term) " " (class.year) ", " (class.start_date.to_string()) " to " (class.end_date.to_string()) }
        (notice(notice_text))

        h3 { "Assignments" }
        @if assignments.is_empty() {
            p.empty { "No assignments." }
        } @else {
            ul.assignments {
                @for assignment in assignments {
                    li {
                        a href={"/assignments/" (assignment.id)} { (assignment.name) }
                        span.deadline { "Due " (timestamp(&assignment.submission_deadline)) }
                    }
                }
            }
        }

        @if user.is_teacher {
            h3 { "Enrolled students" }
            @if roster.is_empty() {
                p.empty { "No students enrolled." }
            }
            ul.roster {
                @for student in roster {
                    li {
                        span.name { (student.name) }
                        span.email { (student.email) }
                        form.inline method="post" action={"/classes/" (class.id) "/roster/remove"} {
                            input type="hidden" name="email" value=(student.email);
                            button type="submit" { "Remove" }
                        }
                    }
                }
            }
            form #add-students method="post" action={"/classes/" (class.id) "/roster"} {
                label for="students" { "Add students by email, one per line" }
                textarea #students name="students" rows="4" {}
                button type="submit" { "Add" }
            }
            form #delete-class method="post" action={"/classes/" (class.id) "/delete"} {
                button.danger type="submit" { "Delete class" }
            }
        }
    };
    wrappers::universal(wrappers::standard(body, user), None, &class.name)
}
