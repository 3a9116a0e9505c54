use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::*;
use super::store::{constraints, DisplayNumberOwner, NewRegistration, Store};

const USER_COLUMNS: &str = "id, email, name, plan_id, plan_type, role, created_at";
const PLAN_COLUMNS: &str = "plan_id, label, price, currency, features, is_active, is_featured";
const INVOICE_COLUMNS: &str = "user_id, company_name, address, zip_code, city, country, vat_number";
const PARTICIPANT_COLUMNS: &str =
    "user_id, slug, short_description, long_description, is_sticky, status, year, display_number, image_path";
const MAP_INFO_COLUMNS: &str = "id, user_id, address, latitude, longitude, no_address";
const HUB_COLUMNS: &str = "id, name, description, hub_host, display_number, created_at";
const EVENT_COLUMNS: &str = "id, organizer_id, co_organizers, title, description, day, event_type, \
     start_time, end_time, rsvp, rsvp_message, rsvp_link, image_path, created_at";
const ROUTE_COLUMNS: &str = "id, name, description, zone, created_at";

/// Lock key serialising display number claims across both owning tables.
const DISPLAY_NUMBER_LOCK: &str = "glue.display_number";

/// Postgres-backed store. Every multi-table write runs in one transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn owners_of(conn: &mut PgConnection, display_number: &str) -> Result<Vec<DisplayNumberOwner>, DatabaseError> {
    let rows: Vec<(String, Uuid)> = sqlx::query_as(
        "SELECT 'participant', user_id FROM participant_details WHERE display_number = $1
         UNION ALL
         SELECT 'hub', id FROM hubs WHERE display_number = $1",
    )
    .bind(display_number)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(kind, id)| match kind.as_str() {
            "hub" => DisplayNumberOwner::Hub(id),
            _ => DisplayNumberOwner::Participant(id),
        })
        .collect())
}

/// Take the display number lock for the rest of the transaction and fail if
/// anyone other than `claimant` already holds `display_number`.
async fn claim_display_number(
    conn: &mut PgConnection,
    display_number: Option<&str>,
    claimant: DisplayNumberOwner,
) -> Result<(), DatabaseError> {
    let Some(value) = display_number else {
        return Ok(());
    };

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(DISPLAY_NUMBER_LOCK)
        .execute(&mut *conn)
        .await?;

    let owners = owners_of(conn, value).await?;
    if owners.iter().any(|owner| *owner != claimant) {
        return Err(DatabaseError::conflict(constraints::DISPLAY_NUMBER));
    }
    Ok(())
}

async fn insert_participant_row(conn: &mut PgConnection, d: &ParticipantDetails) -> Result<ParticipantDetails, DatabaseError> {
    let sql = format!(
        "INSERT INTO participant_details ({PARTICIPANT_COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {PARTICIPANT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ParticipantDetails>(&sql)
        .bind(d.user_id)
        .bind(&d.slug)
        .bind(&d.short_description)
        .bind(&d.long_description)
        .bind(d.is_sticky)
        .bind(d.status)
        .bind(d.year)
        .bind(&d.display_number)
        .bind(&d.image_path)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

async fn insert_map_info_row(conn: &mut PgConnection, m: &MapInfo) -> Result<MapInfo, DatabaseError> {
    let sql = format!(
        "INSERT INTO map_info ({MAP_INFO_COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (id) DO UPDATE SET
             user_id = EXCLUDED.user_id,
             address = EXCLUDED.address,
             latitude = EXCLUDED.latitude,
             longitude = EXCLUDED.longitude,
             no_address = EXCLUDED.no_address
         RETURNING {MAP_INFO_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MapInfo>(&sql)
        .bind(m.id)
        .bind(m.user_id)
        .bind(&m.address)
        .bind(m.latitude)
        .bind(m.longitude)
        .bind(m.no_address)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

async fn write_hub_participants(conn: &mut PgConnection, hub_id: Uuid, participants: &[Uuid]) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM hub_participants WHERE hub_id = $1")
        .bind(hub_id)
        .execute(&mut *conn)
        .await?;
    for user_id in participants {
        sqlx::query("INSERT INTO hub_participants (hub_id, user_id) VALUES ($1, $2)")
            .bind(hub_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn write_route_dots(conn: &mut PgConnection, route_id: Uuid, dots: &[RouteDot]) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM route_dots WHERE route_id = $1")
        .bind(route_id)
        .execute(&mut *conn)
        .await?;
    for dot in dots {
        sqlx::query("INSERT INTO route_dots (route_id, map_info_id, step) VALUES ($1, $2, $3)")
            .bind(route_id)
            .bind(dot.map_info_id)
            .bind(dot.step)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn not_found(what: &str) -> DatabaseError {
    DatabaseError::NotFound(format!("{} not found", what))
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<AuthIdentity>, DatabaseError> {
        let identity = sqlx::query_as::<_, AuthIdentity>(
            "SELECT id, email, password_hash, salt, created_at FROM auth_identities WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity)
    }

    async fn insert_registration(&self, r: &NewRegistration) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO auth_identities (id, email, password_hash, salt, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(r.identity.id)
        .bind(&r.identity.email)
        .bind(&r.identity.password_hash)
        .bind(&r.identity.salt)
        .bind(r.identity.created_at)
        .execute(&mut *tx)
        .await?;

        let sql = format!("INSERT INTO user_info ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)");
        sqlx::query(&sql)
            .bind(r.user.id)
            .bind(&r.user.email)
            .bind(&r.user.name)
            .bind(&r.user.plan_id)
            .bind(r.user.plan_type)
            .bind(r.user.role)
            .bind(r.user.created_at)
            .execute(&mut *tx)
            .await?;

        if let Some(invoice) = &r.invoice {
            let sql = format!("INSERT INTO invoice_data ({INVOICE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)");
            sqlx::query(&sql)
                .bind(invoice.user_id)
                .bind(&invoice.company_name)
                .bind(&invoice.address)
                .bind(&invoice.zip_code)
                .bind(&invoice.city)
                .bind(&invoice.country)
                .bind(&invoice.vat_number)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(details) = &r.participant {
            claim_display_number(
                &mut tx,
                details.display_number.as_deref(),
                DisplayNumberOwner::Participant(details.user_id),
            )
            .await?;
            insert_participant_row(&mut tx, details).await?;
        }

        if let Some(map_info) = &r.map_info {
            insert_map_info_row(&mut tx, map_info).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<UserInfo>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM user_info WHERE id = $1");
        Ok(sqlx::query_as::<_, UserInfo>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list_users(&self, plan_type: Option<PlanType>) -> Result<Vec<UserInfo>, DatabaseError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM user_info WHERE ($1::text IS NULL OR plan_type = $1) ORDER BY created_at"
        );
        Ok(sqlx::query_as::<_, UserInfo>(&sql)
            .bind(plan_type.map(|p| p.as_str()))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserInfo>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM user_info WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, UserInfo>(&sql).bind(ids).fetch_all(&self.pool).await?)
    }

    async fn update_user(&self, user: &UserInfo) -> Result<UserInfo, DatabaseError> {
        let sql = format!(
            "UPDATE user_info SET name = $2, plan_id = $3, plan_type = $4, role = $5 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserInfo>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.plan_id)
            .bind(user.plan_type)
            .bind(user.role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("User"))
    }

    async fn delete_user(&self, id: Uuid) -> Result<Vec<String>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut files: Vec<String> = sqlx::query_scalar(
            "SELECT image_path FROM participant_details WHERE user_id = $1 AND image_path IS NOT NULL
             UNION ALL
             SELECT image_path FROM events WHERE organizer_id = $1 AND image_path IS NOT NULL",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("UPDATE events SET co_organizers = array_remove(co_organizers, $1) WHERE $1 = ANY(co_organizers)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM auth_identities WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(not_found("User"));
        }

        tx.commit().await?;
        files.sort();
        files.dedup();
        Ok(files)
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, DatabaseError> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM plans
             ORDER BY substring(plan_id FROM '^planId-([0-9]+)$')::numeric NULLS FIRST, plan_id");
        Ok(sqlx::query_as::<_, Plan>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, DatabaseError> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE plan_id = $1");
        Ok(sqlx::query_as::<_, Plan>(&sql).bind(plan_id).fetch_optional(&self.pool).await?)
    }

    async fn insert_plan(&self, plan: &Plan) -> Result<Plan, DatabaseError> {
        let sql = format!("INSERT INTO plans ({PLAN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PLAN_COLUMNS}");
        Ok(sqlx::query_as::<_, Plan>(&sql)
            .bind(&plan.plan_id)
            .bind(&plan.label)
            .bind(plan.price)
            .bind(&plan.currency)
            .bind(&plan.features)
            .bind(plan.is_active)
            .bind(plan.is_featured)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_plan(&self, plan: &Plan) -> Result<Plan, DatabaseError> {
        let sql = format!(
            "UPDATE plans SET label = $2, price = $3, currency = $4, features = $5, is_active = $6, is_featured = $7
             WHERE plan_id = $1 RETURNING {PLAN_COLUMNS}"
        );
        sqlx::query_as::<_, Plan>(&sql)
            .bind(&plan.plan_id)
            .bind(&plan.label)
            .bind(plan.price)
            .bind(&plan.currency)
            .bind(&plan.features)
            .bind(plan.is_active)
            .bind(plan.is_featured)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Plan"))
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM plans WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Plan"));
        }
        Ok(())
    }

    async fn get_invoice(&self, user_id: Uuid) -> Result<Option<InvoiceData>, DatabaseError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoice_data WHERE user_id = $1");
        Ok(sqlx::query_as::<_, InvoiceData>(&sql).bind(user_id).fetch_optional(&self.pool).await?)
    }

    async fn upsert_invoice(&self, invoice: &InvoiceData) -> Result<InvoiceData, DatabaseError> {
        let sql = format!(
            "INSERT INTO invoice_data ({INVOICE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (user_id) DO UPDATE SET
                 company_name = EXCLUDED.company_name,
                 address = EXCLUDED.address,
                 zip_code = EXCLUDED.zip_code,
                 city = EXCLUDED.city,
                 country = EXCLUDED.country,
                 vat_number = EXCLUDED.vat_number
             RETURNING {INVOICE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, InvoiceData>(&sql)
            .bind(invoice.user_id)
            .bind(&invoice.company_name)
            .bind(&invoice.address)
            .bind(&invoice.zip_code)
            .bind(&invoice.city)
            .bind(&invoice.country)
            .bind(&invoice.vat_number)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_participant(&self, user_id: Uuid) -> Result<Option<ParticipantDetails>, DatabaseError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participant_details WHERE user_id = $1");
        Ok(sqlx::query_as::<_, ParticipantDetails>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_participant_by_slug(&self, slug: &str) -> Result<Option<ParticipantDetails>, DatabaseError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participant_details WHERE slug = $1");
        Ok(sqlx::query_as::<_, ParticipantDetails>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_participants(&self) -> Result<Vec<ParticipantDetails>, DatabaseError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participant_details ORDER BY year DESC, slug");
        Ok(sqlx::query_as::<_, ParticipantDetails>(&sql).fetch_all(&self.pool).await?)
    }

    async fn insert_participant(&self, details: &ParticipantDetails) -> Result<ParticipantDetails, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        claim_display_number(
            &mut tx,
            details.display_number.as_deref(),
            DisplayNumberOwner::Participant(details.user_id),
        )
        .await?;
        let row = insert_participant_row(&mut tx, details).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn update_participant(&self, d: &ParticipantDetails) -> Result<ParticipantDetails, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        claim_display_number(&mut tx, d.display_number.as_deref(), DisplayNumberOwner::Participant(d.user_id)).await?;

        let sql = format!(
            "UPDATE participant_details SET
                 slug = $2, short_description = $3, long_description = $4, is_sticky = $5,
                 status = $6, year = $7, display_number = $8, image_path = $9
             WHERE user_id = $1
             RETURNING {PARTICIPANT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ParticipantDetails>(&sql)
            .bind(d.user_id)
            .bind(&d.slug)
            .bind(&d.short_description)
            .bind(&d.long_description)
            .bind(d.is_sticky)
            .bind(d.status)
            .bind(d.year)
            .bind(&d.display_number)
            .bind(&d.image_path)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Participant"))?;

        tx.commit().await?;
        Ok(row)
    }

    async fn get_hours(&self, user_id: Uuid) -> Result<Vec<OpeningHours>, DatabaseError> {
        Ok(sqlx::query_as::<_, OpeningHours>(
            "SELECT user_id, position, day, opens_at, closes_at FROM opening_hours WHERE user_id = $1 ORDER BY position",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn replace_hours(&self, user_id: Uuid, hours: &[OpeningHours]) -> Result<Vec<OpeningHours>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM opening_hours WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for slot in hours {
            sqlx::query(
                "INSERT INTO opening_hours (user_id, position, day, opens_at, closes_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(user_id)
            .bind(slot.position)
            .bind(&slot.day)
            .bind(&slot.opens_at)
            .bind(&slot.closes_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        self.get_hours(user_id).await
    }

    async fn display_number_owners(&self, display_number: &str) -> Result<Vec<DisplayNumberOwner>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        owners_of(&mut conn, display_number).await
    }

    async fn get_map_info_for_user(&self, user_id: Uuid) -> Result<Option<MapInfo>, DatabaseError> {
        let sql = format!("SELECT {MAP_INFO_COLUMNS} FROM map_info WHERE user_id = $1");
        Ok(sqlx::query_as::<_, MapInfo>(&sql).bind(user_id).fetch_optional(&self.pool).await?)
    }

    async fn list_map_infos(&self) -> Result<Vec<MapInfo>, DatabaseError> {
        let sql = format!("SELECT {MAP_INFO_COLUMNS} FROM map_info");
        Ok(sqlx::query_as::<_, MapInfo>(&sql).fetch_all(&self.pool).await?)
    }

    async fn map_infos_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MapInfo>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {MAP_INFO_COLUMNS} FROM map_info WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, MapInfo>(&sql).bind(ids).fetch_all(&self.pool).await?)
    }

    async fn upsert_map_info(&self, map_info: &MapInfo) -> Result<MapInfo, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        insert_map_info_row(&mut conn, map_info).await
    }

    async fn list_hubs(&self) -> Result<Vec<Hub>, DatabaseError> {
        let sql = format!("SELECT {HUB_COLUMNS} FROM hubs ORDER BY name");
        Ok(sqlx::query_as::<_, Hub>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_hub(&self, id: Uuid) -> Result<Option<Hub>, DatabaseError> {
        let sql = format!("SELECT {HUB_COLUMNS} FROM hubs WHERE id = $1");
        Ok(sqlx::query_as::<_, Hub>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn hub_participants(&self, hub_ids: &[Uuid]) -> Result<Vec<HubParticipant>, DatabaseError> {
        if hub_ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(sqlx::query_as::<_, HubParticipant>(
            "SELECT hub_id, user_id FROM hub_participants WHERE hub_id = ANY($1)",
        )
        .bind(hub_ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_hub(&self, hub: &Hub, participants: &[Uuid]) -> Result<Hub, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        claim_display_number(&mut tx, hub.display_number.as_deref(), DisplayNumberOwner::Hub(hub.id)).await?;

        let sql = format!(
            "INSERT INTO hubs ({HUB_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {HUB_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Hub>(&sql)
            .bind(hub.id)
            .bind(&hub.name)
            .bind(&hub.description)
            .bind(hub.hub_host)
            .bind(&hub.display_number)
            .bind(hub.created_at)
            .fetch_one(&mut *tx)
            .await?;
        write_hub_participants(&mut tx, hub.id, participants).await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn update_hub(&self, hub: &Hub, participants: &[Uuid]) -> Result<Hub, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        claim_display_number(&mut tx, hub.display_number.as_deref(), DisplayNumberOwner::Hub(hub.id)).await?;

        let sql = format!(
            "UPDATE hubs SET name = $2, description = $3, hub_host = $4, display_number = $5
             WHERE id = $1 RETURNING {HUB_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Hub>(&sql)
            .bind(hub.id)
            .bind(&hub.name)
            .bind(&hub.description)
            .bind(hub.hub_host)
            .bind(&hub.display_number)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Hub"))?;
        write_hub_participants(&mut tx, hub.id, participants).await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn delete_hub(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM hubs WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Hub"));
        }
        Ok(())
    }

    async fn list_events(&self, organizer: Option<Uuid>) -> Result<Vec<Event>, DatabaseError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE ($1::uuid IS NULL OR organizer_id = $1 OR $1 = ANY(co_organizers))
             ORDER BY day, start_time NULLS LAST, title"
        );
        Ok(sqlx::query_as::<_, Event>(&sql).bind(organizer).fetch_all(&self.pool).await?)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, DatabaseError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        Ok(sqlx::query_as::<_, Event>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert_event(&self, e: &Event) -> Result<Event, DatabaseError> {
        let sql = format!(
            "INSERT INTO events ({EVENT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {EVENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(e.id)
            .bind(e.organizer_id)
            .bind(&e.co_organizers)
            .bind(&e.title)
            .bind(&e.description)
            .bind(&e.day)
            .bind(&e.event_type)
            .bind(&e.start_time)
            .bind(&e.end_time)
            .bind(e.rsvp)
            .bind(&e.rsvp_message)
            .bind(&e.rsvp_link)
            .bind(&e.image_path)
            .bind(e.created_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_event(&self, e: &Event) -> Result<Event, DatabaseError> {
        let sql = format!(
            "UPDATE events SET
                 organizer_id = $2, co_organizers = $3, title = $4, description = $5, day = $6,
                 event_type = $7, start_time = $8, end_time = $9, rsvp = $10, rsvp_message = $11,
                 rsvp_link = $12, image_path = $13
             WHERE id = $1
             RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(e.id)
            .bind(e.organizer_id)
            .bind(&e.co_organizers)
            .bind(&e.title)
            .bind(&e.description)
            .bind(&e.day)
            .bind(&e.event_type)
            .bind(&e.start_time)
            .bind(&e.end_time)
            .bind(e.rsvp)
            .bind(&e.rsvp_message)
            .bind(&e.rsvp_link)
            .bind(&e.image_path)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Event"))
    }

    async fn delete_event(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Event"));
        }
        Ok(())
    }

    async fn list_routes(&self) -> Result<Vec<Route>, DatabaseError> {
        let sql = format!("SELECT {ROUTE_COLUMNS} FROM routes ORDER BY zone, name");
        Ok(sqlx::query_as::<_, Route>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_route(&self, id: Uuid) -> Result<Option<Route>, DatabaseError> {
        let sql = format!("SELECT {ROUTE_COLUMNS} FROM routes WHERE id = $1");
        Ok(sqlx::query_as::<_, Route>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn route_dots(&self, route_ids: &[Uuid]) -> Result<Vec<RouteDot>, DatabaseError> {
        if route_ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(sqlx::query_as::<_, RouteDot>(
            "SELECT route_id, map_info_id, step FROM route_dots WHERE route_id = ANY($1) ORDER BY route_id, step",
        )
        .bind(route_ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_route(&self, route: &Route, dots: &[RouteDot]) -> Result<Route, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("INSERT INTO routes ({ROUTE_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {ROUTE_COLUMNS}");
        let row = sqlx::query_as::<_, Route>(&sql)
            .bind(route.id)
            .bind(&route.name)
            .bind(&route.description)
            .bind(route.zone)
            .bind(route.created_at)
            .fetch_one(&mut *tx)
            .await?;
        write_route_dots(&mut tx, route.id, dots).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn update_route(&self, route: &Route, dots: &[RouteDot]) -> Result<Route, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "UPDATE routes SET name = $2, description = $3, zone = $4 WHERE id = $1 RETURNING {ROUTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Route>(&sql)
            .bind(route.id)
            .bind(&route.name)
            .bind(&route.description)
            .bind(route.zone)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Route"))?;
        write_route_dots(&mut tx, route.id, dots).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn delete_route(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Route"));
        }
        Ok(())
    }

    async fn get_section(&self, section: &str) -> Result<Option<ContentSection>, DatabaseError> {
        Ok(sqlx::query_as::<_, ContentSection>(
            "SELECT section, header, updated_at FROM content_sections WHERE section = $1",
        )
        .bind(section)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_items(&self, section: &str) -> Result<Vec<ContentItem>, DatabaseError> {
        Ok(sqlx::query_as::<_, ContentItem>(
            "SELECT id, section, position, data, image_path FROM content_items WHERE section = $1 ORDER BY position",
        )
        .bind(section)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn save_section(
        &self,
        section: &ContentSection,
        items: Option<&[ContentItem]>,
    ) -> Result<(ContentSection, Vec<ContentItem>), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, ContentSection>(
            "INSERT INTO content_sections (section, header, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT (section) DO UPDATE SET header = EXCLUDED.header, updated_at = EXCLUDED.updated_at
             RETURNING section, header, updated_at",
        )
        .bind(&section.section)
        .bind(&section.header)
        .bind(section.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(items) = items {
            sqlx::query("DELETE FROM content_items WHERE section = $1")
                .bind(&section.section)
                .execute(&mut *tx)
                .await?;
            for item in items {
                sqlx::query(
                    "INSERT INTO content_items (id, section, position, data, image_path) VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(item.id)
                .bind(&section.section)
                .bind(item.position)
                .bind(&item.data)
                .bind(&item.image_path)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        let items = self.list_items(&section.section).await?;
        Ok((saved, items))
    }
}
