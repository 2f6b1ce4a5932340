use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Multipart, Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use uuid::Uuid;

use application::{
    CreatePostRequest, DeletePostRequest, FeedPage, ImageInput, PostDto, UpdatePostRequest,
    UploadedImage, UserDto,
};
use application::services::{LoginRequest, SignupRequest};
use domain::PostId;

use crate::{auth::LoginResponse, error::ApiError, rpc, state::AppState};

#[derive(Debug, Deserialize)]
struct SignupPayload {
    email: String,
    name: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: String,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: String,
}

#[derive(Debug, Serialize)]
struct DeletedBody {
    post_id: PostId,
}

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.assets_dir);
    Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/status", get(get_status).put(put_status))
        .route("/feed/posts", get(list_posts).post(create_post))
        .route(
            "/feed/posts/{post_id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/ws", get(websocket_upgrade))
        .nest_service("/images", assets)
        .merge(rpc::routes())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let dto = state
        .auth_service
        .signup(SignupRequest {
            email: payload.email,
            name: payload.name,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let dto = state
        .auth_service
        .login(LoginRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    let user_id = Uuid::from(dto.id);
    let token = state.jwt_service.generate_token(user_id, &dto.email)?;
    Ok(Json(LoginResponse { token, user_id }))
}

async fn get_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusBody>, ApiError> {
    let user_id = state.jwt_service.require_user(&headers)?;
    let dto = state.feed_service.current_user(user_id).await?;
    Ok(Json(StatusBody { status: dto.status }))
}

async fn put_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    let user_id = state.jwt_service.require_user(&headers)?;
    let dto = state
        .feed_service
        .update_status(user_id, payload.status)
        .await?;
    Ok(Json(StatusBody { status: dto.status }))
}

/// Listing is public on the REST surface; the RPC surface requires a token.
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedPage>, ApiError> {
    let page = state.feed_service.list_posts(query.page).await?;
    Ok(Json(page))
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostDto>), ApiError> {
    let user_id = state.jwt_service.require_user(&headers)?;
    let form = read_post_form(multipart).await?;

    let dto = state
        .feed_service
        .create_post(CreatePostRequest {
            creator_id: user_id,
            title: form.title,
            content: form.content,
            image: form.image,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostDto>, ApiError> {
    let dto = state.feed_service.get_post(post_id).await?;
    Ok(Json(dto))
}

async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<PostDto>, ApiError> {
    let user_id = state.jwt_service.require_user(&headers)?;
    let form = read_post_form(multipart).await?;

    let dto = state
        .feed_service
        .update_post(UpdatePostRequest {
            caller_id: user_id,
            post_id,
            title: form.title,
            content: form.content,
            image: form.image,
        })
        .await?;

    Ok(Json(dto))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<DeletedBody>, ApiError> {
    let user_id = state.jwt_service.require_user(&headers)?;
    let deleted = state
        .feed_service
        .delete_post(DeletePostRequest {
            caller_id: user_id,
            post_id,
        })
        .await?;

    Ok(Json(DeletedBody { post_id: deleted }))
}

struct PostForm {
    title: String,
    content: String,
    image: ImageInput,
}

/// Pull `title`, `content` and the `image` field out of a multipart body.
/// The `image` field doubles: with a filename it is a fresh upload, as plain
/// text it names an already-stored reference to keep.
async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, ApiError> {
    let mut title = String::new();
    let mut content = String::new();
    let mut upload: Option<UploadedImage> = None;
    let mut reference: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?
    {
        match field.name() {
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|err| ApiError::bad_request(err.to_string()))?;
            }
            Some("content") => {
                content = field
                    .text()
                    .await
                    .map_err(|err| ApiError::bad_request(err.to_string()))?;
            }
            Some("image") => {
                if let Some(file_name) = field.file_name().map(ToOwned::to_owned) {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_owned();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|err| ApiError::bad_request(err.to_string()))?;
                    upload = Some(UploadedImage {
                        original_name: file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                } else {
                    let text = field
                        .text()
                        .await
                        .map_err(|err| ApiError::bad_request(err.to_string()))?;
                    if !text.trim().is_empty() {
                        reference = Some(text);
                    }
                }
            }
            _ => {}
        }
    }

    let image = match (upload, reference) {
        (Some(upload), _) => ImageInput::Upload(upload),
        (None, Some(reference)) => ImageInput::Reference(reference),
        (None, None) => ImageInput::Missing,
    };

    Ok(PostForm {
        title,
        content,
        image,
    })
}

async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| websocket_handler(socket, state))
}

/// Every connected client gets every feed event, in publish order. There is
/// no replay: events published before the upgrade are gone.
async fn websocket_handler(socket: WebSocket, state: AppState) {
    let mut receiver = state.broadcaster.subscribe();
    let (mut sender, mut incoming) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize feed event");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = incoming.next().await {
            if matches!(message, WsMessage::Close(_)) {
                break;
            }
        }
    });

    let _ = tokio::join!(send_task, recv_task);
}
