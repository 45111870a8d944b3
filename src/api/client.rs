use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::models::{RosterChange, RosterResponse};
use super::*;

/// Client for the collaborator's REST API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ApiClient {
            http,
            base: base.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}/{path}", self.base))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(ApiError::from_status(status, &body));
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    // Users.

    /// Plain lookup by address. There is no credential check.
    pub async fn user_by_email(&self, email: &str) -> ApiResult<User> {
        self.send(self.request(Method::GET, "users/").query(&[("email", email)]))
            .await
    }

    pub async fn users(&self) -> ApiResult<Vec<User>> {
        self.get("users/").await
    }

    pub async fn user(&self, id: Id) -> ApiResult<User> {
        self.get(&format!("users/{id}/")).await
    }

    // Classes.

    pub async fn classes_for(&self, user: &User) -> ApiResult<Vec<Class>> {
        let key = if user.is_teacher { "teacher" } else { "student" };
        let request = self
            .request(Method::GET, "classes/")
            .query(&[(key, user.id.to_string())]);
        self.send(request).await
    }

    pub async fn class(&self, id: Id) -> ApiResult<Class> {
        self.get(&format!("classes/{id}/")).await
    }

    pub async fn create_class(&self, class: &NewClass) -> ApiResult<Class> {
        self.post("classes/", class).await
    }

    pub async fn delete_class(&self, id: Id) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("classes/{id}/")))
            .await
    }

    pub async fn class_assignments(&self, class: Id) -> ApiResult<Vec<Assignment>> {
        self.get(&format!("classes/{class}/assignments/")).await
    }

    pub async fn roster(&self, class: Id) -> ApiResult<Vec<User>> {
        self.get(&format!("classes/{class}/roster/")).await
    }

    pub async fn roster_add(&self, class: Id, email: &str) -> ApiResult<RosterOutcome> {
        self.change_roster(class, &RosterChange::Add { student: email })
            .await
    }

    pub async fn roster_add_many(&self, class: Id, emails: &[String]) -> ApiResult<RosterOutcome> {
        self.change_roster(class, &RosterChange::AddMany { students: emails })
            .await
    }

    pub async fn roster_remove(&self, class: Id, email: &str) -> ApiResult<RosterOutcome> {
        let change = RosterChange::Remove {
            student: email,
            action: "remove",
        };
        self.change_roster(class, &change).await
    }

    async fn change_roster(&self, class: Id, change: &RosterChange<'_>) -> ApiResult<RosterOutcome> {
        let response: RosterResponse = self
            .patch(&format!("classes/{class}/roster/"), change)
            .await?;
        Ok(response.into())
    }

    // Assignments.

    pub async fn assignment(&self, id: Id) -> ApiResult<Assignment> {
        self.get(&format!("assignments/{id}/")).await
    }

    pub async fn create_assignment(&self, assignment: &NewAssignment) -> ApiResult<Assignment> {
        self.post("assignments/", assignment).await
    }

    pub async fn delete_assignment(&self, id: Id) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("assignments/{id}/")))
            .await
    }

    /// Groups of an assignment, optionally only the one containing `student`.
    pub async fn groups(&self, assignment: Id, student: Option<Id>) -> ApiResult<Vec<Group>> {
        let mut request = self.request(Method::GET, &format!("assignments/{assignment}/groups/"));
        if let Some(student) = student {
            request = request.query(&[("student", student.to_string())]);
        }
        self.send(request).await
    }

    /// Creates a group from student addresses and returns every group of the
    /// assignment.
    pub async fn create_group(&self, assignment: Id, emails: &[String]) -> ApiResult<Vec<Group>> {
        let body = serde_json::json!({ "students": emails });
        self.post(&format!("assignments/{assignment}/groups/"), &body)
            .await
    }

    pub async fn group(&self, id: Id) -> ApiResult<Group> {
        self.get(&format!("groups/{id}/")).await
    }

    pub async fn extensions(&self, assignment: Id) -> ApiResult<Vec<Extension>> {
        self.get(&format!("assignments/{assignment}/extensions/"))
            .await
    }

    pub async fn create_extension(
        &self,
        assignment: Id,
        request: &ExtensionRequest,
    ) -> ApiResult<Vec<Extension>> {
        self.post(&format!("assignments/{assignment}/extensions/"), request)
            .await
    }

    pub async fn delete_extensions(&self, assignment: Id, removal: &ExtensionRemoval) -> ApiResult<()> {
        let request = self
            .request(Method::DELETE, &format!("assignments/{assignment}/extensions/"))
            .json(removal);
        self.send_empty(request).await
    }

    // Submissions and files.

    pub async fn create_submission(&self, submission: &NewSubmission) -> ApiResult<Submission> {
        self.post("submit/", submission).await
    }

    pub async fn create_file(&self, file: &NewFile) -> ApiResult<SubmissionFile> {
        self.post("addfile/", file).await
    }

    pub async fn update_file(&self, id: Id, file: &NewFile) -> ApiResult<SubmissionFile> {
        let request = self
            .request(Method::PUT, &format!("addfile/{id}/"))
            .json(file);
        self.send(request).await
    }
}

#[async_trait]
impl ReviewStore for ApiClient {
    async fn submissions(
        &self,
        assignment: Id,
        query: &SubmissionQuery,
    ) -> ApiResult<Vec<Submission>> {
        let request = self
            .request(Method::GET, &format!("assignments/{assignment}/submissions/"))
            .query(&query.pairs());
        self.send(request).await
    }

    async fn submission(&self, id: Id) -> ApiResult<Submission> {
        self.get(&format!("submit/{id}/")).await
    }

    async fn file(&self, id: Id) -> ApiResult<SubmissionFile> {
        self.get(&format!("addfile/{id}/")).await
    }

    async fn create_comment(&self, comment: &NewComment) -> ApiResult<CommentRecord> {
        self.post("addcomment/", comment).await
    }

    async fn update_comment(&self, id: Id, text: &str) -> ApiResult<CommentRecord> {
        let patch = CommentPatch {
            comment: text.to_owned(),
        };
        self.patch(&format!("addcomment/{id}/"), &patch).await
    }

    async fn delete_comment(&self, id: Id) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("addcomment/{id}/")))
            .await
    }
}
