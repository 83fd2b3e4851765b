use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::rooms::dto::{PropertyType, RoomFilters, RoomForm, TenantPreference};

/// Listing row. `images` is an ordered list of public URLs; empty, never
/// NULL. `created_at` is immutable after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: String,
    pub price: f64,
    pub property_type: PropertyType,
    pub tenant_preference: TenantPreference,
    pub contact_number: String,
    pub images: Vec<String>,
    pub created_at: OffsetDateTime,
}

/// Listing joined with its owning profile's contact fields.
#[derive(Debug, Clone, FromRow)]
pub struct RoomWithOwner {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: String,
    pub price: f64,
    pub property_type: PropertyType,
    pub tenant_preference: TenantPreference,
    pub contact_number: String,
    pub images: Vec<String>,
    pub created_at: OffsetDateTime,
    pub owner_name: String,
    pub owner_email: String,
}

/// One compound SELECT applying every supplied filter conjunctively; absent
/// parameters impose no constraint. All matches are returned, newest first.
pub async fn search(db: &PgPool, filters: &RoomFilters) -> anyhow::Result<Vec<Room>> {
    let rows = sqlx::query_as::<_, Room>(
        r#"
        SELECT id, owner_id, title, description, address, location, price,
               property_type, tenant_preference, contact_number, images, created_at
        FROM rooms
        WHERE ($1::text IS NULL OR title ILIKE $1 OR location ILIKE $1)
          AND ($2::double precision IS NULL OR price >= $2)
          AND ($3::double precision IS NULL OR price <= $3)
          AND ($4::property_type IS NULL OR property_type = $4)
          AND ($5::tenant_preference IS NULL OR tenant_preference = $5)
        ORDER BY created_at DESC
        "#,
    )
    .bind(filters.like_pattern())
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(filters.property_type)
    .bind(filters.preference)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_with_owner(db: &PgPool, id: Uuid) -> anyhow::Result<Option<RoomWithOwner>> {
    let row = sqlx::query_as::<_, RoomWithOwner>(
        r#"
        SELECT r.id, r.owner_id, r.title, r.description, r.address, r.location,
               r.price, r.property_type, r.tenant_preference, r.contact_number,
               r.images, r.created_at,
               p.full_name AS owner_name, p.email AS owner_email
        FROM rooms r
        JOIN profiles p ON p.id = r.owner_id
        WHERE r.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<Room>> {
    let rows = sqlx::query_as::<_, Room>(
        r#"
        SELECT id, owner_id, title, description, address, location, price,
               property_type, tenant_preference, contact_number, images, created_at
        FROM rooms
        WHERE owner_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert(
    db: &PgPool,
    owner_id: Uuid,
    form: &RoomForm,
    images: &[String],
) -> anyhow::Result<Room> {
    let room = sqlx::query_as::<_, Room>(
        r#"
        INSERT INTO rooms (owner_id, title, description, address, location, price,
                           property_type, tenant_preference, contact_number, images)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, owner_id, title, description, address, location, price,
                  property_type, tenant_preference, contact_number, images, created_at
        "#,
    )
    .bind(owner_id)
    .bind(&form.title)
    .bind(&form.description)
    .bind(&form.address)
    .bind(&form.location)
    .bind(form.price)
    .bind(form.property_type)
    .bind(form.tenant_preference)
    .bind(&form.contact_number)
    .bind(images)
    .fetch_one(db)
    .await?;
    Ok(room)
}

/// Owner-scoped update of the mutable fields; images and created_at are left
/// untouched. A non-owner's submission matches zero rows and returns None.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    form: &RoomForm,
) -> anyhow::Result<Option<Room>> {
    let room = sqlx::query_as::<_, Room>(
        r#"
        UPDATE rooms
        SET title = $3, description = $4, address = $5, location = $6,
            price = $7, property_type = $8, tenant_preference = $9,
            contact_number = $10
        WHERE id = $1 AND owner_id = $2
        RETURNING id, owner_id, title, description, address, location, price,
                  property_type, tenant_preference, contact_number, images, created_at
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(&form.title)
    .bind(&form.description)
    .bind(&form.address)
    .bind(&form.location)
    .bind(form.price)
    .bind(form.property_type)
    .bind(form.tenant_preference)
    .bind(&form.contact_number)
    .fetch_optional(db)
    .await?;
    Ok(room)
}

/// Owner-scoped delete; false when no row matched (absent or not ours).
pub async fn delete(db: &PgPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM rooms
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
