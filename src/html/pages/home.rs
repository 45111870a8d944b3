use super::*;

/// A class and its assignments as shown on the home page.
pub struct ClassSummary {
    pub class: Class,
    pub assignments: Vec<Assignment>,
}

pub fn home(user: &User, classes: &[ClassSummary], notice_text: Option<&str>) -> Markup {
    let body = html! {
        h2 { "Your classes" }
        (notice(notice_text))
        @if classes.is_empty() {
            p.empty { "You are not in any classes yet." }
        }
        @for summary in classes {
            (class_summary(summary))
        }
        @if user.is_teacher {
            (create_class_form())
            @if !classes.is_empty() {
                (create_assignment_form(classes))
            }
        }
    };
    wrappers::universal(wrappers::standard(body, user), None, "Home")
}

fn class_summary(summary: &ClassSummary) -> Markup {
    let class = &summary.class;
    html! {
        section.class {
            h3 {
                a href={"/classes/" (class.id)} { (class.code) " · " (class.name) }
            }
            p.term { (class.term) " " (class.year) }
            @if summary.assignments.is_empty() {
                p.empty { "No assignments." }
            } @else {
                ul.assignments {
                    @for assignment in &summary.assignments {
                        li {
                            a href={"/assignments/" (assignment.id)} { (assignment.name) }
                            span.deadline { "Due " (timestamp(&assignment.submission_deadline)) }
                        }
                    }
                }
            }
        }
    }
}

fn create_class_form() -> Markup {
    html! {
        form.create #create-class method="post" action="/classes" {
            h3 { "New class" }
            label { "Code" input name="code" type="text" required; }
            label { "Name" input name="name" type="text" required; }
            label { "Term" input name="term" type="text" placeholder="Fall" required; }
            label { "Year" input name="year" type="number" min="2000" max="2100" required; }
            label { "Starts" input name="start_date" type="date" required; }
            label { "Ends" input name="end_date" type="date" required; }
            button type="submit" { "Create class" }
        }
    }
}

fn create_assignment_form(classes: &[ClassSummary]) -> Markup {
    html! {
        form.create #create-assignment method="post" action="/assignments" {
            h3 { "New assignment" }
            label {
                "Class"
                select name="course" {
                    @for summary in classes {
                        option value=(summary.class.id) { (summary.class.code) }
                    }
                }
            }
            label { "Name" input name="name" type="text" required; }
            label { "Description" textarea name="description" {} }
            label { "Released" input name="release_date" type="datetime-local" required; }
            label { "Submissions close" input name="submission_deadline" type="datetime-local" required; }
            label { "Commenting closes" input name="commenting_deadline" type="datetime-local" required; }
            p.hint { "Times are in UTC." }
            button type="submit" { "Create assignment" }
        }
    }
}
