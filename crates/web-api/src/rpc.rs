//! Query/mutation adapter.
//!
//! One endpoint, operation-dispatched: images travel as already-stored
//! references, and every feed or user operation requires a credential.
//! Listing requires one too, unlike the REST surface. That asymmetry is
//! policy, not an accident.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::{
    CreatePostRequest, DeletePostRequest, ImageInput, LoginRequest, SignupRequest,
    UpdatePostRequest,
};
use domain::PostId;

use crate::{auth::LoginResponse, error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/rpc", post(dispatch))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum RpcRequest {
    CreateUser {
        email: String,
        name: String,
        password: String,
    },
    Login {
        email: String,
        password: String,
    },
    Posts {
        page: Option<u32>,
    },
    Post {
        id: Uuid,
    },
    CreatePost {
        title: String,
        content: String,
        image_url: String,
    },
    UpdatePost {
        id: Uuid,
        title: String,
        content: String,
        image_url: Option<String>,
    },
    DeletePost {
        id: Uuid,
    },
    User,
    UpdateStatus {
        status: String,
    },
}

#[derive(Debug, Serialize)]
struct DeletedBody {
    post_id: PostId,
}

async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RpcRequest>,
) -> Result<Response, ApiError> {
    match request {
        RpcRequest::CreateUser {
            email,
            name,
            password,
        } => {
            let dto = state
                .auth_service
                .signup(SignupRequest {
                    email,
                    name,
                    password,
                })
                .await?;
            Ok((StatusCode::CREATED, Json(dto)).into_response())
        }
        RpcRequest::Login { email, password } => {
            let dto = state
                .auth_service
                .login(LoginRequest { email, password })
                .await?;
            let user_id = Uuid::from(dto.id);
            let token = state.jwt_service.generate_token(user_id, &dto.email)?;
            Ok(Json(LoginResponse { token, user_id }).into_response())
        }
        RpcRequest::Posts { page } => {
            state.jwt_service.require_user(&headers)?;
            let feed = state.feed_service.list_posts(page).await?;
            Ok(Json(feed).into_response())
        }
        RpcRequest::Post { id } => {
            state.jwt_service.require_user(&headers)?;
            let dto = state.feed_service.get_post(id).await?;
            Ok(Json(dto).into_response())
        }
        RpcRequest::CreatePost {
            title,
            content,
            image_url,
        } => {
            let user_id = state.jwt_service.require_user(&headers)?;
            let dto = state
                .feed_service
                .create_post(CreatePostRequest {
                    creator_id: user_id,
                    title,
                    content,
                    image: ImageInput::Reference(image_url),
                })
                .await?;
            Ok((StatusCode::CREATED, Json(dto)).into_response())
        }
        RpcRequest::UpdatePost {
            id,
            title,
            content,
            image_url,
        } => {
            let user_id = state.jwt_service.require_user(&headers)?;
            let image = match image_url {
                Some(reference) => ImageInput::Reference(reference),
                None => ImageInput::Missing,
            };
            let dto = state
                .feed_service
                .update_post(UpdatePostRequest {
                    caller_id: user_id,
                    post_id: id,
                    title,
                    content,
                    image,
                })
                .await?;
            Ok(Json(dto).into_response())
        }
        RpcRequest::DeletePost { id } => {
            let user_id = state.jwt_service.require_user(&headers)?;
            let deleted = state
                .feed_service
                .delete_post(DeletePostRequest {
                    caller_id: user_id,
                    post_id: id,
                })
                .await?;
            Ok(Json(DeletedBody { post_id: deleted }).into_response())
        }
        RpcRequest::User => {
            let user_id = state.jwt_service.require_user(&headers)?;
            let dto = state.feed_service.current_user(user_id).await?;
            Ok(Json(dto).into_response())
        }
        RpcRequest::UpdateStatus { status } => {
            let user_id = state.jwt_service.require_user(&headers)?;
            let dto = state.feed_service.update_status(user_id, status).await?;
            Ok(Json(dto).into_response())
        }
    }
}
