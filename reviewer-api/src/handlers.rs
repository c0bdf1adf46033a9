//! Request handlers

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{
    CreatePrRequest, MergePrRequest, PrResponse, ReassignRequest, ReassignResponse,
    ReviewsResponse, SetIsActiveRequest, StatsResponse, TeamDto, TeamQuery, TeamResponse,
    UserQuery, UserResponse,
};
use crate::error::ApiError;
use crate::routes::AppState;

type ApiResult<T> = Result<T, ApiError>;

pub(crate) async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<TeamDto>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let Json(req) = payload?;

    let members: Vec<_> = req
        .members
        .into_iter()
        .map(|m| m.into_user(&req.team_name))
        .collect();

    let team = state.teams.create_team(&req.team_name, &members).await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse { team: team.into() }),
    ))
}

pub(crate) async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> ApiResult<Json<TeamDto>> {
    let Query(query) = query?;
    let team = state.teams.get_team(&query.team_name).await?;
    Ok(Json(team.into()))
}

pub(crate) async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(req) = payload?;
    let user = state.users.set_active(&req.user_id, req.is_active).await?;
    Ok(Json(UserResponse { user: user.into() }))
}

pub(crate) async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<ReviewsResponse>> {
    let Query(query) = query?;
    let prs = state.users.get_reviews(&query.user_id).await?;

    Ok(Json(ReviewsResponse {
        user_id: query.user_id,
        pull_requests: prs.into_iter().map(Into::into).collect(),
    }))
}

pub(crate) async fn create_pr(
    State(state): State<AppState>,
    payload: Result<Json<CreatePrRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PrResponse>)> {
    let Json(req) = payload?;
    let pr = state
        .prs
        .create_pr(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;

    Ok((StatusCode::CREATED, Json(PrResponse { pr: pr.into() })))
}

pub(crate) async fn merge_pr(
    State(state): State<AppState>,
    payload: Result<Json<MergePrRequest>, JsonRejection>,
) -> ApiResult<Json<PrResponse>> {
    let Json(req) = payload?;
    let pr = state.prs.merge(&req.pull_request_id).await?;
    Ok(Json(PrResponse { pr: pr.into() }))
}

pub(crate) async fn reassign(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> ApiResult<Json<ReassignResponse>> {
    let Json(req) = payload?;
    let (pr, replaced_by) = state
        .prs
        .reassign(&req.pull_request_id, &req.old_user_id)
        .await?;

    Ok(Json(ReassignResponse {
        pr: pr.into(),
        replaced_by,
    }))
}

pub(crate) async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let counts = state.prs.stats_by_status().await?;
    Ok(Json(counts.into()))
}
