use std::sync::Arc;

use ipsentinel_common::api::CookieSecurityScheme;
use ipsentinel_common::IpSentinelError;
use ipsentinel_core::users;
use ipsentinel_db_entities::User;
use poem::web::Data;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Object)]
struct UserDataRequest {
    username: String,
}

#[derive(ApiResponse)]
enum GetUsersResponse {
    #[oai(status = 200)]
    Ok(Json<Vec<User::Model>>),
}

#[derive(ApiResponse)]
enum CreateUserResponse {
    #[oai(status = 201)]
    Created(Json<User::Model>),

    #[oai(status = 400)]
    BadRequest(Json<String>),

    #[oai(status = 409)]
    Conflict(Json<String>),
}

pub struct ListApi;

#[OpenApi]
impl ListApi {
    #[oai(path = "/users", method = "get", operation_id = "get_users")]
    async fn api_get_all_users(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        search: Query<Option<String>>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<GetUsersResponse, IpSentinelError> {
        let db = db.lock().await;
        let users = users::list(&*db, search.as_deref()).await?;
        Ok(GetUsersResponse::Ok(Json(users)))
    }

    #[oai(path = "/users", method = "post", operation_id = "create_user")]
    async fn api_create_user(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        body: Json<UserDataRequest>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<CreateUserResponse, IpSentinelError> {
        let db = db.lock().await;

        match users::create(&*db, &body.username).await {
            Ok(user) => Ok(CreateUserResponse::Created(Json(user))),
            Err(error @ IpSentinelError::EmptyUsername) => {
                Ok(CreateUserResponse::BadRequest(Json(error.to_string())))
            }
            Err(error @ IpSentinelError::UsernameTaken(_)) => {
                Ok(CreateUserResponse::Conflict(Json(error.to_string())))
            }
            Err(error) => Err(error),
        }
    }
}

#[derive(ApiResponse)]
enum GetUserResponse {
    #[oai(status = 200)]
    Ok(Json<User::Model>),
    #[oai(status = 404)]
    NotFound,
}

#[derive(ApiResponse)]
enum UpdateUserResponse {
    #[oai(status = 200)]
    Ok(Json<User::Model>),
    #[oai(status = 404)]
    NotFound,
    #[oai(status = 400)]
    BadRequest(Json<String>),
    #[oai(status = 409)]
    Conflict(Json<String>),
}

#[derive(ApiResponse)]
enum DeleteUserResponse {
    #[oai(status = 204)]
    Deleted,

    #[oai(status = 404)]
    NotFound,
}

pub struct DetailApi;

#[OpenApi]
impl DetailApi {
    #[oai(path = "/users/:id", method = "get", operation_id = "get_user")]
    async fn api_get_user(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        id: Path<Uuid>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<GetUserResponse, IpSentinelError> {
        let db = db.lock().await;

        let Some(user) = users::get(&*db, id.0).await? else {
            return Ok(GetUserResponse::NotFound);
        };

        Ok(GetUserResponse::Ok(Json(user)))
    }

    #[oai(path = "/users/:id", method = "put", operation_id = "update_user")]
    async fn api_update_user(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        body: Json<UserDataRequest>,
        id: Path<Uuid>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<UpdateUserResponse, IpSentinelError> {
        let db = db.lock().await;

        match users::rename(&*db, id.0, &body.username).await {
            Ok(Some(user)) => Ok(UpdateUserResponse::Ok(Json(user))),
            Ok(None) => Ok(UpdateUserResponse::NotFound),
            Err(error @ IpSentinelError::EmptyUsername) => {
                Ok(UpdateUserResponse::BadRequest(Json(error.to_string())))
            }
            Err(error @ IpSentinelError::UsernameTaken(_)) => {
                Ok(UpdateUserResponse::Conflict(Json(error.to_string())))
            }
            Err(error) => Err(error),
        }
    }

    #[oai(path = "/users/:id", method = "delete", operation_id = "delete_user")]
    async fn api_delete_user(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        id: Path<Uuid>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<DeleteUserResponse, IpSentinelError> {
        let db = db.lock().await;

        if users::delete(&db, id.0).await? {
            Ok(DeleteUserResponse::Deleted)
        } else {
            Ok(DeleteUserResponse::NotFound)
        }
    }
}
