use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::AuthUser,
        repo::{Profile, Role},
    },
    error::AppError,
    rooms::{
        dto::{RoomCard, RoomDetails, RoomFilters, RoomForm},
        repo,
        service::{self, UploadItem},
    },
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(search_rooms))
        .route("/rooms/:id", get(get_room))
}

pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/:id", put(update_room).delete(delete_room))
        .route("/my/rooms", get(my_rooms))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

// --- handlers ---

/// Open search. Zero matches is an empty list, not an error; "nothing
/// listed" and "nothing matched" differ only by count.
#[instrument(skip(state))]
pub async fn search_rooms(
    State(state): State<AppState>,
    Query(filters): Query<RoomFilters>,
) -> Result<Json<Vec<RoomCard>>, AppError> {
    let rooms = repo::search(&state.db, &filters).await?;
    Ok(Json(rooms.into_iter().map(RoomCard::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomDetails>, AppError> {
    let room = repo::get_with_owner(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("room"))?;
    Ok(Json(room.into()))
}

/// POST /rooms (multipart): the listing fields plus zero or more image
/// files under `images`/`images[]`.
#[instrument(skip(state, mp))]
pub async fn create_room(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, HeaderMap, Json<repo::Room>), AppError> {
    let profile = Profile::find(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    if profile.role != Role::Owner {
        return Err(AppError::Forbidden("Only owners can post listings"));
    }

    let mut fields = FormFields::default();
    let mut files: Vec<UploadItem> = Vec::new();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid form data: {}", e)))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        if name == "images" || name == "images[]" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("invalid form data: {}", e)))?;
            files.push(UploadItem {
                bytes,
                content_type,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("invalid form data: {}", e)))?;
            fields.set(&name, value);
        }
    }

    let form = fields.into_form()?;
    let room = service::create_room_with_images(&state, user_id, form, files).await?;

    info!(room_id = %room.id, owner_id = %user_id, images = room.images.len(), "room listed");
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::LOCATION,
        format!("/api/v1/rooms/{}", room.id)
            .parse()
            .expect("valid header value"),
    );
    Ok((StatusCode::CREATED, headers, Json(room)))
}

/// One update of the mutable fields; images are never touched by edit.
#[instrument(skip(state, form))]
pub async fn update_room(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(form): Json<RoomForm>,
) -> Result<Json<repo::Room>, AppError> {
    let room = repo::update(&state.db, id, user_id, &form)
        .await?
        .ok_or(AppError::NotFound("room"))?;
    info!(room_id = %room.id, owner_id = %user_id, "room updated");
    Ok(Json(room))
}

#[instrument(skip(state))]
pub async fn delete_room(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !repo::delete(&state.db, id, user_id).await? {
        return Err(AppError::NotFound("room"));
    }
    info!(room_id = %id, owner_id = %user_id, "room deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Data source for the owner dashboard: the actor's own listings, newest
/// first.
#[instrument(skip(state))]
pub async fn my_rooms(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<RoomCard>>, AppError> {
    let rooms = repo::list_by_owner(&state.db, user_id).await?;
    Ok(Json(rooms.into_iter().map(RoomCard::from).collect()))
}

/// Text fields collected from the multipart stream before validation.
#[derive(Debug, Default)]
struct FormFields {
    title: Option<String>,
    description: Option<String>,
    address: Option<String>,
    location: Option<String>,
    price: Option<String>,
    property_type: Option<String>,
    tenant_preference: Option<String>,
    contact_number: Option<String>,
}

impl FormFields {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = Some(value),
            "description" => self.description = Some(value),
            "address" => self.address = Some(value),
            "location" => self.location = Some(value),
            "price" => self.price = Some(value),
            "property_type" => self.property_type = Some(value),
            "tenant_preference" => self.tenant_preference = Some(value),
            "contact_number" => self.contact_number = Some(value),
            // Unknown parts are ignored, like unknown query params.
            _ => {}
        }
    }

    /// Required-field enforcement lives at this boundary; price is coerced
    /// to a float with no range check (a negative price passes through).
    fn into_form(self) -> Result<RoomForm, AppError> {
        let price = required(self.price, "price")?
            .parse::<f64>()
            .map_err(|_| AppError::Validation("price must be a number".into()))?;
        let property_type = required(self.property_type, "property_type")?
            .parse()
            .map_err(AppError::Validation)?;
        let tenant_preference = required(self.tenant_preference, "tenant_preference")?
            .parse()
            .map_err(AppError::Validation)?;
        Ok(RoomForm {
            title: required(self.title, "title")?,
            description: self.description.unwrap_or_default(),
            address: required(self.address, "address")?,
            location: required(self.location, "location")?,
            price,
            property_type,
            tenant_preference,
            contact_number: required(self.contact_number, "contact_number")?,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}
