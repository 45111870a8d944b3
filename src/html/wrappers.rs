use maud::DOCTYPE;

use super::*;

pub(super) fn standard(body: Markup, user: &User) -> Markup {
    html! {
        header #topbar {
            a.brand href="/home" { "Peer Review" }
            span.viewer {
                (user.name)
                @if user.is_teacher {
                    span.role { "Instructor" }
                }
            }
            form.logout method="post" action="/logout" {
                button type="submit" { "LOG OUT" }
            }
        }
        main {
            (body)
        }
    }
}

pub(super) fn universal(body: Markup, script: Option<&'static str>, title: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en-us" {
            head {
                title { "Peer Review | " (title) }
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                link type="text/css" rel="stylesheet" href="/style/main.css";
            }
            body {
                (body)
                @if let Some(script) = script {
                    script type="module" src={"/script/" (script) ".js"} {};
                }
            }
        }
    }
}
