use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::*;

/// Constraint names shared by the Postgres schema and the memory store, so
/// services can react to a specific conflict regardless of backend.
pub mod constraints {
    pub const IDENTITY_EMAIL: &str = "auth_identities_email_key";
    pub const PARTICIPANT_SLUG: &str = "participant_details_slug_key";
    pub const PLAN_ID: &str = "plans_pkey";
    pub const MAP_INFO_USER: &str = "map_info_user_id_key";
    /// Display numbers are unique across participants and hubs together.
    pub const DISPLAY_NUMBER: &str = "display_number";
}

/// All rows written by one registration, committed as a unit.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub identity: AuthIdentity,
    pub user: UserInfo,
    pub invoice: Option<InvoiceData>,
    pub participant: Option<ParticipantDetails>,
    pub map_info: Option<MapInfo>,
}

/// Current holder of a display number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "entity_type", content = "entity_id", rename_all = "lowercase")]
pub enum DisplayNumberOwner {
    Participant(Uuid),
    Hub(Uuid),
}

/// Persistence seam used by every service.
///
/// Methods that touch several tables are atomic: either every row is written
/// or none is.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Identities and profiles
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<AuthIdentity>, DatabaseError>;
    async fn insert_registration(&self, registration: &NewRegistration) -> Result<(), DatabaseError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<UserInfo>, DatabaseError>;
    async fn list_users(&self, plan_type: Option<PlanType>) -> Result<Vec<UserInfo>, DatabaseError>;
    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserInfo>, DatabaseError>;
    async fn update_user(&self, user: &UserInfo) -> Result<UserInfo, DatabaseError>;
    /// Removes the identity and everything it owns, and drops the user from
    /// other events' co-organizers. Returns stored file paths that referenced
    /// the user so the caller can clean them up.
    async fn delete_user(&self, id: Uuid) -> Result<Vec<String>, DatabaseError>;

    // Plans
    /// In `Plan::list_order`.
    async fn list_plans(&self) -> Result<Vec<Plan>, DatabaseError>;
    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, DatabaseError>;
    async fn insert_plan(&self, plan: &Plan) -> Result<Plan, DatabaseError>;
    async fn update_plan(&self, plan: &Plan) -> Result<Plan, DatabaseError>;
    async fn delete_plan(&self, plan_id: &str) -> Result<(), DatabaseError>;

    // Invoices
    async fn get_invoice(&self, user_id: Uuid) -> Result<Option<InvoiceData>, DatabaseError>;
    async fn upsert_invoice(&self, invoice: &InvoiceData) -> Result<InvoiceData, DatabaseError>;

    // Participants
    async fn get_participant(&self, user_id: Uuid) -> Result<Option<ParticipantDetails>, DatabaseError>;
    async fn find_participant_by_slug(&self, slug: &str) -> Result<Option<ParticipantDetails>, DatabaseError>;
    async fn list_participants(&self) -> Result<Vec<ParticipantDetails>, DatabaseError>;
    async fn insert_participant(&self, details: &ParticipantDetails) -> Result<ParticipantDetails, DatabaseError>;
    async fn update_participant(&self, details: &ParticipantDetails) -> Result<ParticipantDetails, DatabaseError>;
    async fn get_hours(&self, user_id: Uuid) -> Result<Vec<OpeningHours>, DatabaseError>;
    async fn replace_hours(&self, user_id: Uuid, hours: &[OpeningHours]) -> Result<Vec<OpeningHours>, DatabaseError>;
    async fn display_number_owners(&self, display_number: &str) -> Result<Vec<DisplayNumberOwner>, DatabaseError>;

    // Map points
    async fn get_map_info_for_user(&self, user_id: Uuid) -> Result<Option<MapInfo>, DatabaseError>;
    async fn list_map_infos(&self) -> Result<Vec<MapInfo>, DatabaseError>;
    async fn map_infos_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MapInfo>, DatabaseError>;
    /// Insert, or replace the row with the same id.
    async fn upsert_map_info(&self, map_info: &MapInfo) -> Result<MapInfo, DatabaseError>;

    // Hubs
    async fn list_hubs(&self) -> Result<Vec<Hub>, DatabaseError>;
    async fn get_hub(&self, id: Uuid) -> Result<Option<Hub>, DatabaseError>;
    async fn hub_participants(&self, hub_ids: &[Uuid]) -> Result<Vec<HubParticipant>, DatabaseError>;
    async fn insert_hub(&self, hub: &Hub, participants: &[Uuid]) -> Result<Hub, DatabaseError>;
    async fn update_hub(&self, hub: &Hub, participants: &[Uuid]) -> Result<Hub, DatabaseError>;
    async fn delete_hub(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Events
    async fn list_events(&self, organizer: Option<Uuid>) -> Result<Vec<Event>, DatabaseError>;
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, DatabaseError>;
    async fn insert_event(&self, event: &Event) -> Result<Event, DatabaseError>;
    async fn update_event(&self, event: &Event) -> Result<Event, DatabaseError>;
    async fn delete_event(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Routes
    async fn list_routes(&self) -> Result<Vec<Route>, DatabaseError>;
    async fn get_route(&self, id: Uuid) -> Result<Option<Route>, DatabaseError>;
    async fn route_dots(&self, route_ids: &[Uuid]) -> Result<Vec<RouteDot>, DatabaseError>;
    async fn insert_route(&self, route: &Route, dots: &[RouteDot]) -> Result<Route, DatabaseError>;
    async fn update_route(&self, route: &Route, dots: &[RouteDot]) -> Result<Route, DatabaseError>;
    async fn delete_route(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Site content
    async fn get_section(&self, section: &str) -> Result<Option<ContentSection>, DatabaseError>;
    async fn list_items(&self, section: &str) -> Result<Vec<ContentItem>, DatabaseError>;
    /// Upsert the header and, when `items` is given, replace the item list
    /// wholesale, as one unit.
    async fn save_section(
        &self,
        section: &ContentSection,
        items: Option<&[ContentItem]>,
    ) -> Result<(ContentSection, Vec<ContentItem>), DatabaseError>;
}
