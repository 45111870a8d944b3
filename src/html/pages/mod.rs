use super::components::*;
use super::*;

pub mod assignment;
pub mod class;
pub mod home;
pub mod review;

pub fn login(error: Option<&str>) -> Markup {
    let login = html! {
        #login {
            h1 { "Peer Review" }
            p { b { "Sign in with your college email address." } }
            form method="post" action="/login" {
                label for="email" { "EMAIL" }
                input #email name="email" type="email" autocomplete="email" required;
                button type="submit" #login-button { "LOGIN" }
            }
            @if let Some(error) = error {
                p #error-msg { (error) }
            }
        }
    };
    wrappers::universal(login, None, "Login")
}

/// A page that could not be built, with the reason in place of its content.
pub fn error(user: &User, title: &str, message: &str) -> Markup {
    let body = html! {
        h2 { (title) }
        p.error { (message) }
        a href="/home" { "Back to your classes" }
    };
    wrappers::universal(wrappers::standard(body, user), None, title)
}
