use super::*;

#[derive(Deserialize)]
pub struct Credentials {
    email: String,
}

pub async fn login_page(headers: HeaderMap, State(state): State<AppState>) -> Response {
    if get_user(&headers, &state).await.is_ok() {
        return Redirect::to("/home").into_response();
    }
    html::pages::login(None).into_response()
}

/// Signs a user in by email address. There is no password; the collaborator
/// only confirms that the address belongs to a known user.
pub async fn login(State(state): State<AppState>, Form(credentials): Form<Credentials>) -> Response {
    let (emails, _) = parse_emails(&credentials.email);
    let [email] = emails.as_slice() else {
        return (
            StatusCode::BAD_REQUEST,
            html::pages::login(Some("Enter a valid email address.")),
        )
            .into_response();
    };

    match state.api.user_by_email(email).await {
        Ok(user) => {
            tracing::info!(user = user.id, "Signed in");
            let cookie = format!("{USER_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", user.id);
            ([(header::SET_COOKIE, cookie)], Redirect::to("/home")).into_response()
        }
        Err(ApiError::NotFound) => (
            StatusCode::UNAUTHORIZED,
            html::pages::login(Some("No account uses that address.")),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Login lookup failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                html::pages::login(Some("Signing in is unavailable right now.")),
            )
                .into_response()
        }
    }
}

pub async fn logout(headers: HeaderMap, State(state): State<AppState>) -> Response {
    if let Some(id) = get_cookie(&headers, USER_COOKIE).and_then(|id| id.parse::<Id>().ok()) {
        state.sessions.close_all(id).await;
    }
    let cookie = format!("{USER_COOKIE}=; Path=/; Max-Age=0");
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// Get the signed-in user from the request.
///
/// Returns an error wrapping the login page if nobody is signed in or the
/// cookie names an unknown user.
pub(super) async fn get_user(headers: &HeaderMap, state: &AppState) -> Result<User, Markup> {
    let Some(id) = get_cookie(headers, USER_COOKIE).and_then(|id| id.parse::<Id>().ok()) else {
        return Err(html::pages::login(None));
    };

    match state.api.user(id).await {
        Ok(user) => Ok(user),
        Err(ApiError::NotFound) => Err(html::pages::login(None)),
        Err(err) => {
            tracing::error!("Failed to look up user {id}: {err}");
            Err(html::pages::login(Some("Signing in is unavailable right now.")))
        }
    }
}
